//! In-process stand-in for the pCloud HTTP API, for tests.
//!
//! Every connection carries one request and is closed after the reply.
//! `getdigest` is answered here; any request carrying `getauth=1` gets an
//! `auth` token added to its JSON reply.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use crate::config::ClientConfig;
use crate::session::Session;

/// One request received by [`FakeApi`].
#[derive(Debug, Clone)]
pub(crate) struct Call {
    pub endpoint: String,
    pub params: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl Call {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn param_u64(&self, name: &str) -> u64 {
        self.param(name).and_then(|v| v.parse().ok()).unwrap_or_default()
    }
}

pub(crate) enum Reply {
    Json(Value),
    Binary(Vec<u8>),
}

type Handler = dyn Fn(&Call) -> Reply + Send + Sync;

pub(crate) struct FakeApi {
    url: String,
    calls: Arc<Mutex<Vec<Call>>>,
    task: JoinHandle<()>,
}

impl FakeApi {
    pub async fn start<F>(handler: F) -> Self
    where
        F: Fn(&Call) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        let calls = Arc::new(Mutex::new(Vec::new()));
        let handler: Arc<Handler> = Arc::new(handler);

        let recorded = calls.clone();
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let handler = handler.clone();
                let recorded = recorded.clone();
                tokio::spawn(async move {
                    let _ = serve(stream, &*handler, &recorded).await;
                });
            }
        });

        Self { url, calls, task }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// A session with credentials, pointed at this server.
    pub fn session(&self, block_size: usize) -> Session {
        let config = ClientConfig::default()
            .with_hostname(self.url())
            .with_credentials("me@example.com", "secret")
            .with_block_size(block_size);
        Session::new(config).unwrap()
    }

    /// Requests received so far, leaving out digest fetches.
    pub fn calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.endpoint != "getdigest")
            .cloned()
            .collect()
    }

    pub fn endpoints(&self) -> Vec<String> {
        self.calls().into_iter().map(|call| call.endpoint).collect()
    }

    pub fn find(&self, endpoint: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| call.endpoint == endpoint)
            .collect()
    }
}

impl Drop for FakeApi {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(
    mut stream: TcpStream,
    handler: &Handler,
    calls: &Mutex<Vec<Call>>,
) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let target = head.split_whitespace().nth(1).unwrap_or("/").to_string();
    let length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < head_end + length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let end = buf.len().min(head_end + length);

    let url = reqwest::Url::parse(&format!("http://fake{}", target)).unwrap();
    let call = Call {
        endpoint: url.path().trim_start_matches('/').to_string(),
        params: url.query_pairs().into_owned().collect(),
        body: buf[head_end..end].to_vec(),
    };
    calls.lock().unwrap().push(call.clone());

    let (content_type, payload) = match respond(handler, &call) {
        Reply::Json(value) => ("application/json; charset=utf-8", value.to_string().into_bytes()),
        Reply::Binary(data) => ("application/octet-stream", data),
    };
    let head = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        content_type,
        payload.len()
    );
    stream.write_all(head.as_bytes()).await?;
    stream.write_all(&payload).await?;
    stream.shutdown().await
}

fn respond(handler: &Handler, call: &Call) -> Reply {
    if call.endpoint == "getdigest" {
        return Reply::Json(json!({"result": 0, "digest": "DIGEST"}));
    }
    match handler(call) {
        Reply::Json(mut value) => {
            if let Some(object) = value.as_object_mut() {
                object.entry("result").or_insert(json!(0));
                if call.param("getauth") == Some("1") {
                    object.insert("auth".to_string(), json!("TOKEN"));
                }
            }
            Reply::Json(value)
        }
        binary => binary,
    }
}
