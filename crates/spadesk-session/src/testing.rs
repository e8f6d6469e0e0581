use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use jsonwebtoken::{EncodingKey, Header};
use serde_json::Value;
use spadesk_api::{
    ApiRequest, ApiResponse, Credentials, IdentityProvider, LoginResponse, Navigator, Notifier,
    ResetTicket, Severity, SpaError, Transport, TransportError, UserProfile,
};
use spadesk_auth::TokenStore;
use spadesk_connectors::MemoryStorage;

use crate::SessionManager;

pub(crate) fn mint(role: &str) -> String {
    jsonwebtoken::encode(
        &Header::default(),
        &serde_json::json!({"id": 5, "role": role, "spaId": "7", "exp": i64::MAX}),
        &EncodingKey::from_secret(b"test-secret"),
    )
    .unwrap()
}

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    pub messages: Mutex<Vec<(String, Severity)>>,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        self.messages
            .lock()
            .unwrap()
            .push((message.to_string(), severity));
    }
}

#[derive(Default)]
pub(crate) struct RecordingNavigator {
    pub paths: Mutex<Vec<String>>,
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        self.paths.lock().unwrap().push(path.to_string());
    }
}

/// Replays scripted outcomes and keeps every request it was handed.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    pub sent: Mutex<Vec<ApiRequest>>,
    script: Mutex<VecDeque<Result<ApiResponse, TransportError>>>,
}

impl ScriptedTransport {
    pub fn push_ok(&self, status: u16, body: Value) {
        self.script
            .lock()
            .unwrap()
            .push_back(Ok(ApiResponse { status, body }));
    }

    pub fn push_status(&self, status: u16, body: Value) {
        self.script
            .lock()
            .unwrap()
            .push_back(Err(TransportError::Status(ApiResponse { status, body })));
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        self.sent.lock().unwrap().push(request);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(ApiResponse {
                status: 200,
                body: Value::Null,
            }))
    }
}

pub(crate) fn session() -> (Arc<SessionManager>, Arc<RecordingNavigator>) {
    let navigator = Arc::new(RecordingNavigator::default());
    let store = TokenStore::open(Arc::new(MemoryStorage::new()));
    (
        Arc::new(SessionManager::new(store, navigator.clone())),
        navigator,
    )
}

pub(crate) struct FakeProvider {
    pub outcome: Result<LoginResponse, SpaError>,
}

impl FakeProvider {
    pub fn accepting(role: &str) -> Self {
        Self {
            outcome: Ok(LoginResponse {
                token: mint(role),
                user: UserProfile {
                    full_name: Some("Ana Ortiz".to_string()),
                    ..UserProfile::default()
                },
            }),
        }
    }

    pub fn failing(err: SpaError) -> Self {
        Self { outcome: Err(err) }
    }
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    async fn login(&self, _credentials: &Credentials) -> Result<LoginResponse, SpaError> {
        self.outcome.clone()
    }

    async fn request_password_reset(&self, _email: &str) -> Result<ResetTicket, SpaError> {
        Ok(ResetTicket::default())
    }

    async fn reset_password(
        &self,
        _email: &str,
        _reset_token: &str,
        _new_password: &str,
    ) -> Result<(), SpaError> {
        Ok(())
    }
}

pub(crate) fn creds() -> Credentials {
    Credentials::new("ana@example.com", "secret1")
}

pub(crate) async fn logged_in(role: &str) -> (Arc<SessionManager>, Arc<RecordingNavigator>) {
    let (session, navigator) = session();
    session
        .login(&FakeProvider::accepting(role), &creds())
        .await
        .unwrap();
    (session, navigator)
}
