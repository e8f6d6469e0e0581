use std::sync::Arc;

use serde_json::Value;
use spadesk_api::{
    Claims, Credentials, Identity, IdentityProvider, Navigator, Role, SpaError, UserProfile,
};
use spadesk_auth::{PUBLIC_HOME, TokenStore};

use crate::response::extract_message;

pub const DEFAULT_LOGIN_FAILURE: &str = "Login failed. Please check your credentials.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated,
}

/// Owns the session for the lifetime of the application.
///
/// Build one at startup and share it by `Arc`. Every query is derived from the
/// [`TokenStore`] at call time, so there is no separate state to drift.
pub struct SessionManager {
    store: TokenStore,
    navigator: Arc<dyn Navigator>,
}

impl SessionManager {
    pub fn new(store: TokenStore, navigator: Arc<dyn Navigator>) -> Self {
        Self { store, navigator }
    }

    /// Authenticate through `provider` and store the issued token.
    ///
    /// A rejected login surfaces as [`SpaError::AuthenticationFailed`] carrying
    /// the provider's message. The session is left untouched on failure.
    pub async fn login(
        &self,
        provider: &dyn IdentityProvider,
        credentials: &Credentials,
    ) -> Result<Identity, SpaError> {
        let response = provider
            .login(credentials)
            .await
            .map_err(into_login_failure)?;

        let claims = self.store.set(&response.token, &response.user)?;
        let display_name = display_name(&response.user, &claims);

        tracing::info!(role = %claims.role, subject = %claims.subject_id, "logged in");
        Ok(Identity {
            role: claims.role,
            display_name,
            subject_id: claims.subject_id,
        })
    }

    /// Clear the session and hard-navigate to the public home.
    pub fn logout(&self) {
        if self.store.clear() {
            tracing::info!("logged out");
        }
        self.navigator.navigate(PUBLIC_HOME);
    }

    /// Clear the session without navigating. Returns `false` when there was no
    /// session to clear.
    pub fn invalidate(&self) -> bool {
        let cleared = self.store.clear();
        if cleared {
            tracing::info!("session invalidated");
        }
        cleared
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.decode().is_some()
    }

    pub fn state(&self) -> SessionState {
        if self.is_authenticated() {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        }
    }

    pub fn current_role(&self) -> Option<Role> {
        self.store.decode().map(|c| c.role)
    }

    pub fn claims(&self) -> Option<Claims> {
        self.store.decode()
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.store.user()
    }

    pub fn token(&self) -> Option<String> {
        self.store.get()
    }
}

fn into_login_failure(err: SpaError) -> SpaError {
    match err {
        SpaError::Unauthorized { ref body } => rejected(body),
        SpaError::Http { status, ref body } if (400..500).contains(&status) => rejected(body),
        other => other,
    }
}

// Login screens read `error` before `message`.
fn rejected(body: &Value) -> SpaError {
    let message = body
        .get("error")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .or_else(|| extract_message(body))
        .unwrap_or(DEFAULT_LOGIN_FAILURE);
    SpaError::AuthenticationFailed {
        message: message.to_string(),
    }
}

fn display_name(user: &UserProfile, claims: &Claims) -> String {
    user.full_name
        .clone()
        .or_else(|| user.email.clone())
        .unwrap_or_else(|| claims.subject_id.clone())
}
