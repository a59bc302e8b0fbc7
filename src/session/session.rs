//! Session management and authentication.
//!
//! This module holds the session state, opening of remote files, and logout.

use reqwest::Method;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiErrorCode, Params};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::fs::{FileRef, FolderRef, OpenFlags, RemoteFile};

/// Number of attempts made by [`Session::shutdown`].
const LOGOUT_ATTEMPTS: u32 = 3;

/// A pCloud session.
///
/// Authentication is lazy: the first request that needs it logs in with a
/// password digest and the returned token is reused afterwards. Clones share
/// the token and the server list.
#[derive(Debug, Clone)]
pub struct Session {
    pub(crate) api: ApiClient,
    pub(crate) config: ClientConfig,
}

impl Session {
    /// Create a session from configuration. No request is sent.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let api = ApiClient::new(&config)?;
        Ok(Self { api, config })
    }

    /// Create a session for `username` and authenticate right away.
    ///
    /// # Example
    /// ```no_run
    /// use pcloudlib::Session;
    ///
    /// # async fn example() -> pcloudlib::Result<()> {
    /// let session = Session::login("user@example.com", "password").await?;
    /// let info = session.user_info().await?;
    /// println!("Logged in as: {}", info.email);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn login(username: &str, password: &str) -> Result<Self> {
        let session = Self::new(ClientConfig::default().with_credentials(username, password))?;
        session.user_info().await?;
        info!("logged in as {}", username);
        Ok(session)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Whether an auth token is cached.
    pub fn is_authenticated(&self) -> bool {
        self.api.is_authenticated()
    }

    /// Log out.
    ///
    /// Returns `true` when there was nothing to log out, or when the server no
    /// longer considers the token valid. Otherwise returns the server's verdict.
    /// The cached token is dropped only once the server has let go of it.
    pub async fn logout(&self) -> Result<bool> {
        if !self.api.is_authenticated() {
            return Ok(true);
        }
        let deleted = match self.api.request(Method::GET, "logout", Params::new()).await {
            Ok(response) => response.bool("auth_deleted")?,
            Err(e) if e.api_code().is_some_and(is_logged_out_code) => true,
            Err(e) => return Err(e),
        };
        if deleted {
            self.api.clear_auth();
        }
        Ok(deleted)
    }

    /// Log out with a bounded number of attempts, never failing.
    ///
    /// An attempt fails when the request fails or the server keeps the token.
    pub async fn shutdown(&self) {
        let mut last_error = None;
        for attempt in 1..=LOGOUT_ATTEMPTS {
            match self.logout().await {
                Ok(true) => {
                    info!("logged out");
                    return;
                }
                Ok(false) => debug!(attempt, "server kept the auth token"),
                Err(e) => {
                    debug!(attempt, "logout failed: {}", e);
                    last_error = Some(e);
                }
            }
        }
        match last_error {
            Some(e) => warn!("Could not log out: {}", e),
            None => warn!("Could not log out"),
        }
    }

    /// Open an existing file.
    ///
    /// `APPEND` is added unless `TRUNC` is requested, in which case `WRITE` is added.
    pub async fn open_file(&self, file: &FileRef, flags: OpenFlags) -> Result<RemoteFile> {
        RemoteFile::open(&self.api, file.params(), open_flags(flags)).await
    }

    /// Create a file called `name` in `folder`. Fails if the file exists.
    pub async fn create_file(
        &self,
        folder: &FolderRef,
        name: &str,
        flags: OpenFlags,
    ) -> Result<RemoteFile> {
        RemoteFile::open(&self.api, folder.child_params(name), create_flags(flags)).await
    }
}

pub(crate) fn open_flags(flags: OpenFlags) -> OpenFlags {
    if flags.contains(OpenFlags::TRUNC) {
        flags | OpenFlags::WRITE
    } else {
        flags | OpenFlags::APPEND
    }
}

pub(crate) fn create_flags(flags: OpenFlags) -> OpenFlags {
    flags | OpenFlags::CREAT | OpenFlags::EXCL | OpenFlags::WRITE
}

fn is_logged_out_code(code: u32) -> bool {
    matches!(
        ApiErrorCode::from(code),
        ApiErrorCode::LoginRequired | ApiErrorCode::LoginFailed | ApiErrorCode::TooManyLogins
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::api::fake::{FakeApi, Reply};

    #[test]
    fn test_open_flags() {
        assert_eq!(open_flags(OpenFlags::NONE), OpenFlags::APPEND);
        assert_eq!(
            open_flags(OpenFlags::WRITE),
            OpenFlags::WRITE | OpenFlags::APPEND
        );
        assert_eq!(
            open_flags(OpenFlags::TRUNC),
            OpenFlags::TRUNC | OpenFlags::WRITE
        );
        assert!(!open_flags(OpenFlags::TRUNC).contains(OpenFlags::APPEND));
    }

    #[test]
    fn test_create_flags() {
        let flags = create_flags(OpenFlags::NONE);
        assert!(flags.contains(OpenFlags::CREAT | OpenFlags::EXCL | OpenFlags::WRITE));
        assert!(create_flags(OpenFlags::TRUNC).contains(OpenFlags::TRUNC));
    }

    #[test]
    fn test_logged_out_codes() {
        for code in [1000, 2000, 4000] {
            assert!(is_logged_out_code(code));
        }
        assert!(!is_logged_out_code(2009));
        assert!(!is_logged_out_code(9999));
    }

    #[tokio::test]
    async fn test_logout_without_token_is_a_no_op() {
        let session = Session::new(ClientConfig::default()).unwrap();
        assert!(!session.is_authenticated());
        assert!(session.logout().await.unwrap());
        session.shutdown().await;
    }

    async fn logged_in(api: &FakeApi) -> Session {
        let session = api.session(4);
        session.user_info().await.unwrap();
        assert!(session.is_authenticated());
        session
    }

    #[tokio::test]
    async fn test_shutdown_retries_while_token_is_kept() {
        let api = FakeApi::start(|call| match call.endpoint.as_str() {
            "logout" => Reply::Json(json!({"auth_deleted": false})),
            _ => Reply::Json(json!({})),
        })
        .await;
        let session = logged_in(&api).await;

        session.shutdown().await;
        assert_eq!(api.endpoints(), ["userinfo", "logout", "logout", "logout"]);
        assert!(session.is_authenticated());
        assert!(api.find("logout").iter().all(|call| call.param("auth") == Some("TOKEN")));
    }

    #[tokio::test]
    async fn test_shutdown_stops_once_logged_out() {
        let api = FakeApi::start(|call| match call.endpoint.as_str() {
            "logout" => Reply::Json(json!({"auth_deleted": true})),
            _ => Reply::Json(json!({})),
        })
        .await;
        let session = logged_in(&api).await;

        session.shutdown().await;
        assert_eq!(api.endpoints(), ["userinfo", "logout"]);
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_logout_of_expired_token() {
        let api = FakeApi::start(|call| match call.endpoint.as_str() {
            "logout" => Reply::Json(json!({"result": 2000, "error": "Log in failed."})),
            _ => Reply::Json(json!({})),
        })
        .await;
        let session = logged_in(&api).await;

        assert!(session.logout().await.unwrap());
        assert!(!session.is_authenticated());
    }
}
