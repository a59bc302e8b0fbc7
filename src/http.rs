//! HTTP client wrapper for pCloud API requests.

use std::time::Duration;

use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::Form;
use reqwest::{Client, Method};

use crate::api::{ApiResponse, Params};
use crate::error::{PCloudError, Result};

/// Request body for an API call.
#[derive(Debug)]
pub enum Body {
    /// Raw bytes (file writes).
    Raw(Bytes),
    /// Multipart form (file uploads).
    Multipart(Form),
}

/// Decoded response: JSON for control calls, raw bytes for file reads.
#[derive(Debug)]
pub enum Payload {
    Json(ApiResponse),
    Binary(Bytes),
}

impl Payload {
    /// Expect a JSON response.
    pub fn into_json(self) -> Result<ApiResponse> {
        match self {
            Payload::Json(r) => Ok(r),
            Payload::Binary(_) => Err(PCloudError::UnexpectedContentType(
                "application/octet-stream".to_string(),
            )),
        }
    }

    /// Expect a binary response.
    pub fn into_binary(self) -> Result<Bytes> {
        match self {
            Payload::Binary(b) => Ok(b),
            Payload::Json(r) => match r.check() {
                Ok(_) => Err(PCloudError::UnexpectedContentType(
                    "application/json".to_string(),
                )),
                Err(e) => Err(e),
            },
        }
    }
}

/// HTTP client for making requests to pCloud servers.
///
/// Cloning shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client.
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Create a client with an optional proxy and timeout.
    pub fn with_options(proxy: Option<&str>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(proxy) = proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| PCloudError::Custom(format!("Invalid proxy: {}", e)))?;
            builder = builder.proxy(proxy);
        }
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| PCloudError::Custom(format!("Failed to build client: {}", e)))?;
        Ok(Self { client })
    }

    /// Send one request and decode the response by content type.
    pub async fn send(
        &self,
        method: Method,
        url: &str,
        params: &Params,
        body: Option<Body>,
    ) -> Result<Payload> {
        let mut request = self.client.request(method, url).query(params.as_slice());
        request = match body {
            Some(Body::Raw(bytes)) => request.body(bytes),
            Some(Body::Multipart(form)) => request.multipart(form),
            None => request,
        };

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(PCloudError::HttpError(response.status().as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        decode(&content_type, response.bytes().await?)
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

fn decode(content_type: &str, body: Bytes) -> Result<Payload> {
    if content_type.starts_with("application/json") {
        let value = serde_json::from_slice(&body)?;
        Ok(Payload::Json(ApiResponse::from_value(value)?))
    } else if content_type == "application/octet-stream" {
        Ok(Payload::Binary(body))
    } else {
        Err(PCloudError::UnexpectedContentType(content_type.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let _client = HttpClient::new();
        let _default = HttpClient::default();
    }

    #[test]
    fn test_proxy_creation() {
        let client = HttpClient::with_options(Some("http://127.0.0.1:8080"), None);
        assert!(client.is_ok());
    }

    #[test]
    fn test_proxy_invalid() {
        let res = HttpClient::with_options(Some(":::::::"), None);
        assert!(res.is_err());
    }

    #[test]
    fn test_decode_json() {
        let body = Bytes::from_static(br#"{"result":0,"fd":7}"#);
        let payload = decode("application/json; charset=utf-8", body).unwrap();
        let json = payload.into_json().unwrap();
        assert_eq!(json.u64("fd").unwrap(), 7);
    }

    #[test]
    fn test_decode_binary() {
        let body = Bytes::from_static(b"\x00\x01");
        let payload = decode("application/octet-stream", body).unwrap();
        assert_eq!(payload.into_binary().unwrap().as_ref(), b"\x00\x01");
    }

    #[test]
    fn test_decode_unexpected_type() {
        let err = decode("text/html", Bytes::new()).unwrap_err();
        assert!(matches!(err, PCloudError::UnexpectedContentType(t) if t == "text/html"));
    }

    #[test]
    fn test_binary_expected_but_error_json() {
        let body = Bytes::from_static(br#"{"result":1007}"#);
        let payload = decode("application/json", body).unwrap();
        let err = payload.into_binary().unwrap_err();
        assert_eq!(err.api_code(), Some(1007));
    }
}
