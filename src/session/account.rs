//! Account and server information.

use std::collections::BTreeMap;

use reqwest::Method;
use serde::Deserialize;

use crate::api::Params;
use crate::api::client::parse_servers;
use crate::error::Result;
use crate::session::Session;

/// The API server answering the current connection (`currentserver`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerInfo {
    pub hostname: String,
    #[serde(rename = "binhostname")]
    pub bin_hostname: String,
    pub ip: String,
    #[serde(rename = "ipbin")]
    pub ip_bin: String,
    #[serde(rename = "ipv6")]
    pub ip_v6: Option<String>,
}

/// Account details of the authenticated user (`userinfo`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserInfo {
    #[serde(rename = "userid")]
    pub user_id: u64,
    pub email: String,
    #[serde(rename = "emailverified")]
    pub email_verified: bool,
    pub language: Option<String>,
    pub currency: Option<String>,
    /// Storage quota in bytes.
    pub quota: u64,
    #[serde(rename = "usedquota")]
    pub used_quota: u64,
    #[serde(rename = "publiclinkquota")]
    pub public_link_quota: Option<u64>,
    pub registered: Option<String>,
    pub premium: bool,
    #[serde(rename = "premiumlifetime")]
    pub premium_lifetime: bool,
    #[serde(rename = "premiumexpires")]
    pub premium_expires: Option<String>,
    pub business: bool,
    pub plan: Option<u32>,
    #[serde(rename = "haspassword")]
    pub has_password: bool,
    #[serde(rename = "cryptosetup")]
    pub crypto_setup: bool,
}

impl UserInfo {
    /// Bytes left before the quota is reached.
    pub fn free_quota(&self) -> u64 {
        self.quota.saturating_sub(self.used_quota)
    }
}

impl Session {
    /// Server currently answering requests.
    pub async fn current_server(&self) -> Result<ServerInfo> {
        self.api
            .send_no_auth(Method::GET, "currentserver", Params::new())
            .await?
            .into_typed()
    }

    /// Best API server URLs for this client's location.
    pub async fn get_api_server(&self, binary: bool) -> Result<Vec<String>> {
        let response = self
            .api
            .send_no_auth(Method::GET, "getapiserver", Params::new())
            .await?;
        parse_servers(&response, binary)
    }

    /// Client IP as seen by the server.
    pub async fn get_ip(&self) -> Result<String> {
        let response = self
            .api
            .send_no_auth(Method::GET, "getip", Params::new())
            .await?;
        Ok(response.str("ip")?.to_string())
    }

    /// Fetch a fresh authentication digest.
    pub async fn get_digest(&self) -> Result<String> {
        self.api.get_digest().await
    }

    pub async fn user_info(&self) -> Result<UserInfo> {
        self.api
            .request(Method::GET, "userinfo", Params::new())
            .await?
            .into_typed()
    }

    /// Languages supported by the server, keyed by language code.
    pub async fn supported_languages(&self) -> Result<BTreeMap<String, String>> {
        let mut response = self
            .api
            .send_no_auth(Method::GET, "supportedlanguages", Params::new())
            .await?;
        response.parse("languages")
    }

    /// Set the language of the authenticated user.
    pub async fn set_language(&self, language: &str) -> Result<()> {
        self.api
            .request(
                Method::GET,
                "setlanguage",
                Params::new().with("language", language),
            )
            .await?;
        Ok(())
    }
}
