use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type TenantId = String;
pub type SubjectId = String;

pub const STORAGE_KEY_TOKEN: &str = "token";
pub const STORAGE_KEY_USER: &str = "user";
pub const STORAGE_KEY_ROLE: &str = "role";

/// Shown when a failure carries no server-provided text.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Something went wrong";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

/// A logical request before it reaches the transport.
///
/// `path` is relative to the configured API root (e.g. `/bookings/my`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    #[serde(default)]
    pub query: BTreeMap<String, String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: BTreeMap::new(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Raw transport outcome before classification.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportError {
    /// The request never reached a server.
    NoResponse { message: String },
    /// A server answered with a failure status.
    Status(ApiResponse),
}

/// Privilege tiers. Closed set; see [`Role::from_claim`] for lenient decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Customer,
    SpaAdmin,
    MasterAdmin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Customer, Role::SpaAdmin, Role::MasterAdmin];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Customer => "Customer",
            Role::SpaAdmin => "SpaAdmin",
            Role::MasterAdmin => "MasterAdmin",
        }
    }

    /// Lenient decoding for token claims: anything that is not a canonical
    /// spelling becomes [`Role::Customer`], never an elevated role.
    pub fn from_claim(raw: &str) -> (Role, Option<SpaError>) {
        match raw.parse() {
            Ok(role) => (role, None),
            Err(e) => (Role::Customer, Some(e)),
        }
    }
}

impl FromStr for Role {
    type Err = SpaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| SpaError::Decode(format!("unrecognized role {s:?}")))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity attributes derived from a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Claims {
    pub role: Role,
    pub subject_id: SubjectId,
    pub tenant_id: Option<TenantId>,
    pub expires_at: Option<i64>,
}

impl Claims {
    pub fn is_expired(&self, now_unix: i64) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now_unix)
    }
}

/// The `user` object returned by the identity provider. Unknown fields are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// What a successful login hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub role: Role,
    pub display_name: String,
    pub subject_id: SubjectId,
}

#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub user: UserProfile,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetTicket {
    /// Only returned by non-production deployments.
    #[serde(default)]
    pub reset_token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SpaError {
    #[error("network error: {message}")]
    Network { message: String },
    #[error("unauthorized")]
    Unauthorized { body: Value },
    #[error("http error {status}")]
    Http { status: u16, body: Value },
    #[error("authentication failed: {message}")]
    AuthenticationFailed { message: String },
    #[error("decode error: {0}")]
    Decode(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("config error: {0}")]
    Config(String),
}

impl SpaError {
    pub fn status(&self) -> Option<u16> {
        match self {
            SpaError::Unauthorized { .. } => Some(401),
            SpaError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn body(&self) -> Option<&Value> {
        match self {
            SpaError::Unauthorized { body } | SpaError::Http { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Text fit for a toast: the server's own words when it sent any.
    pub fn user_message(&self) -> String {
        match self {
            SpaError::AuthenticationFailed { message } | SpaError::Validation(message) => {
                message.clone()
            }
            _ => self
                .body()
                .and_then(extract_message)
                .unwrap_or(DEFAULT_FAILURE_MESSAGE)
                .to_string(),
        }
    }
}

/// The body's `message`, else its `error`, when either is a non-empty string.
pub fn extract_message(body: &Value) -> Option<&str> {
    ["message", "error"]
        .into_iter()
        .filter_map(|key| body.get(key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// Persistent key/value medium that survives restarts.
pub trait DurableStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, SpaError>;
    fn set(&self, key: &str, value: &str) -> Result<(), SpaError>;
    fn remove(&self, key: &str) -> Result<(), SpaError>;
}

pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, SpaError>;
    async fn request_password_reset(&self, email: &str) -> Result<ResetTicket, SpaError>;
    async fn reset_password(
        &self,
        email: &str,
        reset_token: &str,
        new_password: &str,
    ) -> Result<(), SpaError>;
}
