//! Outbound request decoration.

use std::sync::Arc;

use spadesk_api::ApiRequest;
use spadesk_auth::TenantResolver;

use crate::SessionManager;

/// One outbound transformation. Stages must not block and must not fail: a
/// stage that has nothing to add returns the request unchanged.
pub trait RequestStage: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply(&self, request: ApiRequest) -> ApiRequest;
}

/// Adds `Authorization: Bearer <token>` while a session is held.
pub struct BearerStage {
    session: Arc<SessionManager>,
}

impl BearerStage {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self { session }
    }
}

impl RequestStage for BearerStage {
    fn name(&self) -> &'static str {
        "bearer"
    }

    fn apply(&self, mut request: ApiRequest) -> ApiRequest {
        if let Some(token) = self.session.token() {
            request
                .headers
                .retain(|name, _| !name.eq_ignore_ascii_case("authorization"));
            request
                .headers
                .insert("Authorization".to_string(), format!("Bearer {token}"));
        }
        request
    }
}

/// Adds the resolved tenant id as a query parameter on tenant-scoped paths.
pub struct TenantStage {
    resolver: Arc<TenantResolver>,
}

impl TenantStage {
    pub fn new(resolver: Arc<TenantResolver>) -> Self {
        Self { resolver }
    }
}

impl RequestStage for TenantStage {
    fn name(&self) -> &'static str {
        "tenant"
    }

    fn apply(&self, mut request: ApiRequest) -> ApiRequest {
        let ctx = self.resolver.resolve(&request.path);
        if let Some(tenant) = ctx.tenant_id {
            tracing::debug!(
                tenant = %tenant,
                source = ?ctx.source,
                path = %request.path,
                "adding tenant to request"
            );
            request
                .query
                .insert(self.resolver.config().param_name.clone(), tenant);
        }
        request
    }
}

/// Ordered list of [`RequestStage`]s applied to every outbound request.
#[derive(Default)]
pub struct RequestPipeline {
    stages: Vec<Box<dyn RequestStage>>,
}

impl RequestPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bearer credential, then tenant. The two are independent.
    pub fn standard(session: Arc<SessionManager>, resolver: Arc<TenantResolver>) -> Self {
        Self::new()
            .with_stage(BearerStage::new(session))
            .with_stage(TenantStage::new(resolver))
    }

    #[must_use]
    pub fn with_stage(mut self, stage: impl RequestStage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn decorate(&self, request: ApiRequest) -> ApiRequest {
        self.stages
            .iter()
            .fold(request, |request, stage| stage.apply(request))
    }
}
