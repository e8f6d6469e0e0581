use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use spadesk_api::{
    ApiRequest, ApiResponse, DurableStorage, Method, Notifier, Severity, SpaError, Transport,
    TransportError,
};

/// In-process storage. Survives nothing; meant for tests and one-shot tools.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries
            .lock()
            .map(|guard| guard.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl DurableStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, SpaError> {
        let guard = self
            .entries
            .lock()
            .map_err(|_| SpaError::Storage("memory storage poisoned".to_string()))?;
        Ok(guard.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SpaError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|_| SpaError::Storage("memory storage poisoned".to_string()))?;
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SpaError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|_| SpaError::Storage("memory storage poisoned".to_string()))?;
        guard.remove(key);
        Ok(())
    }
}

/// Routes user-facing notifications into the log.
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Error => tracing::error!(target: "spadesk::notify", "{message}"),
            Severity::Info | Severity::Success => {
                tracing::info!(target: "spadesk::notify", "{message}");
            }
        }
    }
}

/// JSON-over-HTTP transport. Paths are appended to `base_url`.
pub struct ReqwestTransport {
    base_url: String,
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SpaError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SpaError::Config(format!("failed to build http client: {e}")))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut req = self
            .http
            .request(method, self.url_for(&request.path))
            .header(reqwest::header::ACCEPT, "application/json");
        if !request.query.is_empty() {
            req = req.query(&request.query);
        }
        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            req = req.json(body);
        }

        let resp = req.send().await.map_err(|e| TransportError::NoResponse {
            message: e.to_string(),
        })?;

        let status = resp.status().as_u16();
        // A body cut off mid-read is as good as no response.
        let text = resp.text().await.map_err(|e| TransportError::NoResponse {
            message: e.to_string(),
        })?;
        let response = ApiResponse {
            status,
            body: parse_body(text),
        };

        if response.is_success() {
            Ok(response)
        } else {
            Err(TransportError::Status(response))
        }
    }
}

// Non-JSON bodies are kept verbatim as a string.
fn parse_body(text: String) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}
