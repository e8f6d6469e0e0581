//! Identity provider over the same decorated client as every other call.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use spadesk_api::{
    ApiRequest, Credentials, IdentityProvider, LoginResponse, Method, ResetTicket, SpaError,
};

use crate::client::ApiClient;

pub const MIN_PASSWORD_LEN: usize = 6;

/// A new password that has been confirmed and meets the length rule.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordReset {
    new_password: String,
}

impl PasswordReset {
    pub fn new(new_password: &str, confirm: &str) -> Result<Self, SpaError> {
        if new_password != confirm {
            return Err(SpaError::Validation("Passwords do not match!".to_string()));
        }
        check_length(new_password)?;
        Ok(Self {
            new_password: new_password.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.new_password
    }
}

impl std::fmt::Debug for PasswordReset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordReset(<redacted>)")
    }
}

fn check_length(password: &str) -> Result<(), SpaError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(SpaError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long!"
        )));
    }
    Ok(())
}

fn parse<T: DeserializeOwned>(what: &str, body: Value) -> Result<T, SpaError> {
    serde_json::from_value(body).map_err(|e| SpaError::Decode(format!("{what} response: {e}")))
}

pub struct HttpIdentityProvider {
    client: Arc<ApiClient>,
}

impl HttpIdentityProvider {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Self-service spa onboarding. The payload is passed through as-is.
    pub async fn register_spa(&self, payload: Value) -> Result<Value, SpaError> {
        self.client.post("/auth/spa/register", payload).await
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, SpaError> {
        let body = json!({
            "email": credentials.email,
            "password": credentials.password,
        });
        // The login screen words its own failure; see `SpaContext::login`.
        let request = ApiRequest::new(Method::Post, "/auth/login").with_body(body);
        let response = self.client.send_quietly(request).await?;
        parse("login", response.body)
    }

    async fn request_password_reset(&self, email: &str) -> Result<ResetTicket, SpaError> {
        let body = self
            .client
            .post("/auth/forgot-password", json!({ "email": email }))
            .await?;
        if body.is_null() {
            return Ok(ResetTicket::default());
        }
        parse("forgot-password", body)
    }

    async fn reset_password(
        &self,
        email: &str,
        reset_token: &str,
        new_password: &str,
    ) -> Result<(), SpaError> {
        check_length(new_password)?;
        let body = json!({
            "email": email,
            "resetToken": reset_token,
            "newPassword": new_password,
        });
        self.client.post("/auth/reset-password", body).await?;
        tracing::info!("password reset accepted");
        Ok(())
    }
}
