//! Composition root: one place that wires storage, session, tenancy and the
//! decorated client together.

use std::sync::Arc;

use spadesk_api::{
    Credentials, DurableStorage, Identity, IdentityProvider, Navigator, Notifier, ResetTicket,
    Role, Severity, SpaError, Transport,
};
use spadesk_auth::{
    AccessDecision, LOGIN_PATH, TenantConfig, TenantResolver, TokenStore, gate, landing_path_for,
};
use spadesk_core::{ClientConfig, validate_config};

use crate::client::ApiClient;
use crate::identity::{HttpIdentityProvider, PasswordReset};
use crate::request::RequestPipeline;
use crate::response::ResponsePipeline;
use crate::session::SessionManager;
use crate::storefront::StorefrontApi;

pub struct SpaContext {
    session: Arc<SessionManager>,
    tenants: Arc<TenantResolver>,
    client: Arc<ApiClient>,
    identity: HttpIdentityProvider,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
}

impl SpaContext {
    pub fn from_config(
        config: &ClientConfig,
        storage: Arc<dyn DurableStorage>,
        transport: Arc<dyn Transport>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, SpaError> {
        validate_config(config)?;

        let tenants = Arc::new(TenantResolver::new(TenantConfig {
            default_tenant: config.default_tenant.clone(),
            param_name: config.tenant_param.clone(),
            exempt_prefixes: config.exempt_prefixes.clone(),
        }));
        let session = Arc::new(SessionManager::new(
            TokenStore::open(storage),
            navigator.clone(),
        ));
        let client = Arc::new(ApiClient::new(
            transport,
            RequestPipeline::standard(session.clone(), tenants.clone()),
            ResponsePipeline::standard(session.clone(), notifier.clone()),
        ));
        let identity = HttpIdentityProvider::new(client.clone());

        tracing::debug!(
            api_url = %config.api_url,
            authenticated = session.is_authenticated(),
            "client context ready"
        );
        Ok(Self {
            session,
            tenants,
            client,
            identity,
            notifier,
            navigator,
        })
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn tenants(&self) -> &Arc<TenantResolver> {
        &self.tenants
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    pub fn identity(&self) -> &HttpIdentityProvider {
        &self.identity
    }

    pub fn storefront(&self) -> StorefrontApi {
        StorefrontApi::new(self.client.clone())
    }

    /// Log in, greet the user and move to the role's landing page.
    ///
    /// The login request is sent quietly, so every failure is reported here
    /// once, in the login screen's own words.
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, SpaError> {
        let credentials = Credentials::new(email, password);
        let identity = self
            .session
            .login(&self.identity, &credentials)
            .await
            .inspect_err(|e| self.notifier.notify(&e.user_message(), Severity::Error))?;

        self.notifier.notify(
            &format!("Welcome back, {}!", identity.display_name),
            Severity::Success,
        );
        self.navigator.navigate(landing_path_for(identity.role));
        Ok(identity)
    }

    pub fn logout(&self) {
        self.session.logout();
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<ResetTicket, SpaError> {
        let ticket = self.identity.request_password_reset(email).await?;
        self.notifier.notify("Reset code sent to your email", Severity::Info);
        Ok(ticket)
    }

    /// Complete a reset and send the user back to the login screen.
    pub async fn reset_password(
        &self,
        email: &str,
        reset_token: &str,
        new_password: &str,
        confirm: &str,
    ) -> Result<(), SpaError> {
        let reset =
            PasswordReset::new(new_password, confirm).inspect_err(|e| self.report_local(e))?;
        self.identity
            .reset_password(email, reset_token, reset.as_str())
            .await?;
        self.notifier.notify(
            "Password reset successfully! You can now login.",
            Severity::Success,
        );
        self.navigator.navigate(LOGIN_PATH);
        Ok(())
    }

    /// Gate a protected screen against the current session.
    pub fn gate(&self, allowed: &[Role]) -> AccessDecision {
        gate(self.session.current_role(), allowed)
    }

    // Transport failures were already reported by the response pipeline.
    fn report_local(&self, err: &SpaError) {
        if matches!(
            err,
            SpaError::Decode(_) | SpaError::Validation(_) | SpaError::Storage(_)
        ) {
            self.notifier.notify(&err.user_message(), Severity::Error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingNavigator, RecordingNotifier, ScriptedTransport, mint};
    use serde_json::json;
    use spadesk_api::STORAGE_KEY_TOKEN;
    use spadesk_connectors::MemoryStorage;

    struct Harness {
        ctx: SpaContext,
        storage: Arc<MemoryStorage>,
        transport: Arc<ScriptedTransport>,
        notifier: Arc<RecordingNotifier>,
        navigator: Arc<RecordingNavigator>,
    }

    fn harness(config: &ClientConfig, storage: Arc<MemoryStorage>) -> Harness {
        let transport = Arc::new(ScriptedTransport::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let navigator = Arc::new(RecordingNavigator::default());
        let ctx = SpaContext::from_config(
            config,
            storage.clone(),
            transport.clone(),
            notifier.clone(),
            navigator.clone(),
        )
        .unwrap();
        Harness {
            ctx,
            storage,
            transport,
            notifier,
            navigator,
        }
    }

    fn tenant_config(tenant: Option<&str>) -> ClientConfig {
        ClientConfig {
            default_tenant: tenant.map(ToString::to_string),
            ..ClientConfig::default()
        }
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = ClientConfig {
            api_url: String::new(),
            ..ClientConfig::default()
        };
        let built = SpaContext::from_config(
            &config,
            Arc::new(MemoryStorage::new()),
            Arc::new(ScriptedTransport::default()),
            Arc::new(RecordingNotifier::default()),
            Arc::new(RecordingNavigator::default()),
        );
        assert!(matches!(built, Err(SpaError::Config(_))));
    }

    #[tokio::test]
    async fn master_admin_login_lands_on_platform_root() {
        let h = harness(&tenant_config(Some("7")), Arc::new(MemoryStorage::new()));
        h.transport.push_ok(
            200,
            json!({"token": mint("MasterAdmin"), "user": {"fullName": "Ana Ortiz"}}),
        );

        let identity = h.ctx.login("ana@example.com", "secret1").await.unwrap();

        assert_eq!(identity.role, Role::MasterAdmin);
        assert_eq!(*h.navigator.paths.lock().unwrap(), vec!["/master-admin"]);
        assert_eq!(
            *h.notifier.messages.lock().unwrap(),
            vec![("Welcome back, Ana Ortiz!".to_string(), Severity::Success)]
        );
        assert!(h.transport.sent.lock().unwrap()[0].query.is_empty());
        assert_eq!(h.ctx.gate(&[Role::MasterAdmin]), AccessDecision::Allow);
    }

    #[tokio::test]
    async fn failed_login_is_reported_once() {
        let h = harness(&tenant_config(None), Arc::new(MemoryStorage::new()));
        h.transport
            .push_status(401, json!({"message": "Invalid email or password"}));

        let err = h.ctx.login("ana@example.com", "nope").await.unwrap_err();

        assert!(matches!(err, SpaError::AuthenticationFailed { .. }));
        assert_eq!(h.notifier.messages.lock().unwrap().len(), 1);
        assert!(h.navigator.paths.lock().unwrap().is_empty());
        assert_eq!(
            h.ctx.gate(&[Role::Customer]),
            AccessDecision::RedirectToLogin("/login")
        );
    }

    #[tokio::test]
    async fn failed_login_uses_login_wording() {
        let h = harness(&tenant_config(None), Arc::new(MemoryStorage::new()));
        h.transport.push_status(
            400,
            json!({"message": "Bad request", "error": "Invalid email or password"}),
        );
        h.transport.push_status(401, json!({}));

        let first = h.ctx.login("ana@example.com", "nope").await.unwrap_err();
        let second = h.ctx.login("ana@example.com", "nope").await.unwrap_err();

        assert_eq!(
            first,
            SpaError::AuthenticationFailed {
                message: "Invalid email or password".to_string()
            }
        );
        assert_eq!(
            second,
            SpaError::AuthenticationFailed {
                message: crate::DEFAULT_LOGIN_FAILURE.to_string()
            }
        );
        assert_eq!(
            *h.notifier.messages.lock().unwrap(),
            vec![
                ("Invalid email or password".to_string(), Severity::Error),
                (crate::DEFAULT_LOGIN_FAILURE.to_string(), Severity::Error),
            ]
        );
    }

    #[tokio::test]
    async fn login_server_error_is_reported_once() {
        let h = harness(&tenant_config(None), Arc::new(MemoryStorage::new()));
        h.transport.push_status(503, json!({"message": "Maintenance"}));

        let err = h.ctx.login("ana@example.com", "secret1").await.unwrap_err();

        assert_eq!(err.status(), Some(503));
        assert_eq!(
            *h.notifier.messages.lock().unwrap(),
            vec![("Maintenance".to_string(), Severity::Error)]
        );
    }

    #[test]
    fn stored_session_is_picked_up_at_startup() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(STORAGE_KEY_TOKEN, &mint("SpaAdmin")).unwrap();

        let h = harness(&tenant_config(Some("7")), storage);
        assert_eq!(h.ctx.session().current_role(), Some(Role::SpaAdmin));
        assert_eq!(
            h.ctx.gate(&[Role::MasterAdmin]),
            AccessDecision::RedirectHome("/")
        );
    }

    #[tokio::test]
    async fn logout_clears_storage() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(STORAGE_KEY_TOKEN, &mint("Customer")).unwrap();
        let h = harness(&tenant_config(None), storage);

        h.ctx.logout();

        assert!(h.storage.keys().is_empty());
        assert_eq!(*h.navigator.paths.lock().unwrap(), vec!["/"]);
    }

    #[tokio::test]
    async fn mismatched_reset_is_reported_locally() {
        let h = harness(&tenant_config(None), Arc::new(MemoryStorage::new()));

        let err = h
            .ctx
            .reset_password("ana@example.com", "481516", "secret1", "secret2")
            .await
            .unwrap_err();

        assert!(matches!(err, SpaError::Validation(_)));
        assert!(h.transport.sent.lock().unwrap().is_empty());
        assert_eq!(
            *h.notifier.messages.lock().unwrap(),
            vec![("Passwords do not match!".to_string(), Severity::Error)]
        );
    }

    #[tokio::test]
    async fn completed_reset_returns_to_login() {
        let h = harness(&tenant_config(None), Arc::new(MemoryStorage::new()));

        h.ctx
            .reset_password("ana@example.com", "481516", "secret1", "secret1")
            .await
            .unwrap();

        assert_eq!(*h.navigator.paths.lock().unwrap(), vec!["/login"]);
        assert_eq!(h.transport.sent.lock().unwrap()[0].path, "/auth/reset-password");
    }

    #[tokio::test]
    async fn configured_tenant_param_name_is_used() {
        let config = ClientConfig {
            tenant_param: "tenantId".to_string(),
            ..tenant_config(Some("9"))
        };
        let h = harness(&config, Arc::new(MemoryStorage::new()));

        h.ctx.storefront().list_services().await.unwrap();

        let sent = h.transport.sent.lock().unwrap();
        assert_eq!(sent[0].query_param("tenantId"), Some("9"));
        assert!(sent[0].query_param("spaId").is_none());
    }
}
