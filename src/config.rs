//! Client configuration.

use std::time::Duration;

use serde::Deserialize;

/// Default pCloud API server, used when none is configured and discovery fails.
pub const DEFAULT_SERVER: &str = "https://eapi.pcloud.com/";

/// Default size of the blocks moved by one transfer step.
pub const DEFAULT_BLOCK_SIZE: usize = 524_288;

/// Settings for a [`Session`](crate::Session).
///
/// # Example
/// ```
/// use pcloudlib::ClientConfig;
///
/// let config = ClientConfig::default()
///     .with_credentials("user@example.com", "password")
///     .with_block_size(64 * 1024);
/// assert_eq!(config.block_size, 65536);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Preferred API server URL. Skips server discovery when set.
    pub hostname: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Proxy URL (e.g., "http://proxy:8080" or "socks5://proxy:1080")
    pub proxy: Option<String>,
    /// Per-request transport timeout. Transfers themselves have no deadline.
    #[serde(with = "optional_secs")]
    pub timeout: Option<Duration>,
    /// Bytes moved per transfer step.
    pub block_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            hostname: None,
            username: None,
            password: None,
            proxy: None,
            timeout: None,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

impl ClientConfig {
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Override the transfer block size. Zero is clamped to one byte.
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    /// Initial server list: the configured host followed by the default server.
    ///
    /// Empty when no host is configured, which triggers discovery.
    pub(crate) fn initial_servers(&self) -> Vec<String> {
        match &self.hostname {
            Some(host) => vec![with_trailing_slash(host), DEFAULT_SERVER.to_string()],
            None => Vec::new(),
        }
    }
}

pub(crate) fn with_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    }
}

mod optional_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<f64>::deserialize(deserializer)?.map(Duration::from_secs_f64))
    }
}
