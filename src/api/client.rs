//! pCloud API client with request/response handling.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use reqwest::Method;
use sha1::{Digest, Sha1};
use tracing::debug;

use super::{ApiResponse, Params};
use crate::config::{ClientConfig, DEFAULT_SERVER};
use crate::error::{PCloudError, Result};
use crate::http::{Body, HttpClient, Payload};

/// pCloud API client.
///
/// Cheap to clone: clones share the server list and the cached auth token.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

/// HTTP connection pinned to one API server.
#[derive(Debug, Clone)]
pub struct Connection {
    http: HttpClient,
    server: String,
}

impl Connection {
    pub fn server(&self) -> &str {
        &self.server
    }
}

struct Inner {
    http: HttpClient,
    proxy: Option<String>,
    timeout: Option<Duration>,
    servers: Mutex<Vec<String>>,
    auth_token: Mutex<Option<String>>,
    username: Option<String>,
    password: Option<String>,
}

impl ApiClient {
    /// Create a new API client from configuration.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = HttpClient::with_options(config.proxy.as_deref(), config.timeout)?;
        Ok(Self {
            inner: Arc::new(Inner {
                http,
                proxy: config.proxy.clone(),
                timeout: config.timeout,
                servers: Mutex::new(config.initial_servers()),
                auth_token: Mutex::new(None),
                username: config.username.clone(),
                password: config.password.clone(),
            }),
        })
    }

    /// Open a dedicated connection to the current server.
    ///
    /// A file descriptor only exists on the server that opened it, so every
    /// request on the descriptor goes through the same connection.
    pub async fn new_connection(&self) -> Result<Connection> {
        let http = HttpClient::with_options(self.inner.proxy.as_deref(), self.inner.timeout)?;
        let server = self
            .servers()
            .await
            .into_iter()
            .next()
            .ok_or_else(|| PCloudError::Custom("No API server".to_string()))?;
        Ok(Connection { http, server })
    }

    /// Whether an auth token is cached.
    pub fn is_authenticated(&self) -> bool {
        lock(&self.inner.auth_token).is_some()
    }

    /// Forget the cached auth token.
    pub fn clear_auth(&self) {
        lock(&self.inner.auth_token).take();
    }

    /// Current server list, running discovery on first use.
    pub async fn servers(&self) -> Vec<String> {
        {
            let mut servers = lock(&self.inner.servers);
            if !servers.is_empty() {
                return servers.clone();
            }
            *servers = vec![DEFAULT_SERVER.to_string()];
        }

        let discovered = self.discover_servers().await;
        let mut servers = lock(&self.inner.servers);
        match discovered {
            Ok(mut hosts) => {
                hosts.push(DEFAULT_SERVER.to_string());
                debug!(?hosts, "discovered api servers");
                *servers = hosts;
            }
            Err(e) => debug!("server discovery failed, using default: {}", e),
        }
        servers.clone()
    }

    async fn discover_servers(&self) -> Result<Vec<String>> {
        let url = format!("{}getapiserver", DEFAULT_SERVER);
        let response = self
            .inner
            .http
            .send(Method::GET, &url, &Params::new(), None)
            .await?
            .into_json()?
            .check()?;
        parse_servers(&response, false)
    }

    /// Send a request that needs no authentication. The response must be JSON.
    pub async fn send_no_auth(
        &self,
        method: Method,
        endpoint: &str,
        params: Params,
    ) -> Result<ApiResponse> {
        self.send(None, method, endpoint, &params, None)
            .await?
            .into_json()?
            .check()
    }

    /// Send an authenticated request and require a JSON response.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        params: Params,
    ) -> Result<ApiResponse> {
        self.send_auth(None, method, endpoint, params, None)
            .await?
            .into_json()
    }

    /// Send an authenticated request.
    ///
    /// Uses the cached auth token when there is one, otherwise logs in with
    /// a password digest and caches the token returned by the server.
    /// `conn` pins the request to a descriptor's dedicated connection.
    pub async fn send_auth(
        &self,
        conn: Option<&Connection>,
        method: Method,
        endpoint: &str,
        mut params: Params,
        body: Option<Body>,
    ) -> Result<Payload> {
        let token = lock(&self.inner.auth_token).clone();
        match token {
            Some(token) => {
                params.set("auth", token);
            }
            None => {
                let username = self
                    .inner
                    .username
                    .as_deref()
                    .ok_or(PCloudError::MissingCredentials("username"))?;
                let password = self
                    .inner
                    .password
                    .as_deref()
                    .ok_or(PCloudError::MissingCredentials("password"))?;

                let digest = self.get_digest().await?;
                params
                    .set("username", username)
                    .set("passworddigest", password_digest(username, password, &digest))
                    .set("digest", digest)
                    .set("getauth", 1)
                    .set("logout", 1);
            }
        }

        match self.send(conn, method, endpoint, &params, body).await? {
            Payload::Json(mut response) => {
                if let Some(auth) = response.take("auth") {
                    if let Some(auth) = auth.as_str() {
                        debug!("acquired auth token");
                        *lock(&self.inner.auth_token) = Some(auth.to_string());
                    }
                }
                Ok(Payload::Json(response.check()?))
            }
            binary => Ok(binary),
        }
    }

    /// Fetch a fresh authentication digest.
    pub async fn get_digest(&self) -> Result<String> {
        let response = self
            .send_no_auth(Method::GET, "getdigest", Params::new())
            .await?;
        Ok(response.str("digest")?.to_string())
    }

    async fn send(
        &self,
        conn: Option<&Connection>,
        method: Method,
        endpoint: &str,
        params: &Params,
        body: Option<Body>,
    ) -> Result<Payload> {
        if let Some(conn) = conn {
            debug!(endpoint, server = %conn.server, "api request on pinned connection");
            let url = format!("{}{}", conn.server, endpoint);
            return conn.http.send(method, &url, params, body).await;
        }

        let servers = self.servers().await;
        debug!(endpoint, server = %servers[0], "api request");
        // Bodies cannot be replayed on another server.
        if body.is_some() {
            let url = format!("{}{}", servers[0], endpoint);
            return self.inner.http.send(method, &url, params, body).await;
        }

        let mut last_error = None;
        for server in &servers {
            let url = format!("{}{}", server, endpoint);
            match self.inner.http.send(method.clone(), &url, params, None).await {
                Err(PCloudError::RequestError(e)) if e.is_connect() => {
                    debug!(%server, "connection failed, trying next server");
                    last_error = Some(PCloudError::RequestError(e));
                }
                other => return other,
            }
        }
        Err(last_error.unwrap_or_else(|| PCloudError::Custom("No API server".to_string())))
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("servers", &*lock(&self.inner.servers))
            .field("username", &self.inner.username)
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
impl ApiClient {
    pub(crate) fn replace_servers(&self, servers: Vec<String>) {
        *lock(&self.inner.servers) = servers;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Password digest: `sha1(password + sha1(lowercase(username)) + digest)`, hex encoded.
pub(crate) fn password_digest(username: &str, password: &str, digest: &str) -> String {
    let username_hash = hex::encode(Sha1::digest(username.to_lowercase().as_bytes()));

    let mut hasher = Sha1::new();
    hasher.update(password.as_bytes());
    hasher.update(username_hash.as_bytes());
    hasher.update(digest.as_bytes());
    hex::encode(hasher.finalize())
}

/// Turn a `getapiserver` response into server URLs.
pub(crate) fn parse_servers(response: &ApiResponse, binary: bool) -> Result<Vec<String>> {
    let key = if binary { "binapi" } else { "api" };
    let hosts = response
        .get(key)
        .and_then(|v| v.as_array())
        .ok_or_else(|| PCloudError::InvalidResponse(format!("missing '{}'", key)))?;
    Ok(hosts
        .iter()
        .filter_map(|h| h.as_str())
        .map(|h| format!("https://{}/", h))
        .collect())
}
