//! Tenant resolution for outbound requests.

use std::borrow::Cow;
use std::sync::{PoisonError, RwLock};

/// Where a tenant decision came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantSource {
    /// The explicit parameter of the current request context (e.g. `?spaId=`).
    ExplicitParam,
    /// The configured deployment default.
    EnvironmentDefault,
    /// No tenant could be resolved, or the target is exempt.
    None,
}

/// Tenant resolution configuration.
#[derive(Debug, Clone)]
pub struct TenantConfig {
    /// Tenant used when the request context carries none.
    pub default_tenant: Option<String>,

    /// Name of the tenant parameter in query strings.
    pub param_name: String,

    /// Leading path segments that never receive a tenant, e.g. `auth` or
    /// `master-admin`. Multi-segment prefixes use `/` (`api/auth`).
    pub exempt_prefixes: Vec<String>,
}

impl Default for TenantConfig {
    fn default() -> Self {
        Self {
            default_tenant: None,
            param_name: "spaId".to_string(),
            exempt_prefixes: vec!["auth".to_string(), "master-admin".to_string()],
        }
    }
}

/// Result of resolving a tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    /// Resolved tenant id.
    pub tenant_id: Option<String>,
    /// Source used.
    pub source: TenantSource,
}

impl TenantContext {
    fn none() -> Self {
        Self {
            tenant_id: None,
            source: TenantSource::None,
        }
    }

    /// True if a tenant was resolved.
    pub fn is_some(&self) -> bool {
        self.tenant_id.is_some()
    }
}

/// Decides, per request, which spa a call targets.
///
/// Nothing is cached between calls: the explicit parameter can change at any
/// time through [`TenantResolver::set_explicit`].
#[derive(Debug)]
pub struct TenantResolver {
    cfg: TenantConfig,
    explicit: RwLock<Option<String>>,
}

impl TenantResolver {
    pub fn new(cfg: TenantConfig) -> Self {
        Self {
            cfg,
            explicit: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &TenantConfig {
        &self.cfg
    }

    /// Replace the explicit tenant of the current context. Empty or malformed
    /// ids clear it.
    pub fn set_explicit(&self, tenant: Option<String>) {
        let tenant = tenant.and_then(|t| sanitize(&t));
        *self.explicit.write().unwrap_or_else(PoisonError::into_inner) = tenant;
    }

    /// Take the explicit tenant from a raw query string such as `?spaId=7&x=1`.
    /// The value is form-decoded. A query without the parameter clears it.
    pub fn set_explicit_from_query(&self, query: &str) {
        let value = query
            .trim_start_matches('?')
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(k, _)| *k == self.cfg.param_name)
            .and_then(|(_, v)| form_decode(v));
        self.set_explicit(value);
    }

    pub fn explicit(&self) -> Option<String> {
        self.explicit
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// True if `target` is identity-provider or platform-wide and must not carry
    /// a tenant.
    pub fn is_exempt(&self, target: &str) -> bool {
        let path = target.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        self.cfg.exempt_prefixes.iter().any(|prefix| {
            let prefix: Vec<&str> = prefix.split('/').filter(|s| !s.is_empty()).collect();
            !prefix.is_empty() && segments.starts_with(&prefix)
        })
    }

    /// Resolve the tenant for `target`: explicit parameter, then configured
    /// default, then none.
    pub fn resolve(&self, target: &str) -> TenantContext {
        if self.is_exempt(target) {
            return TenantContext::none();
        }

        if let Some(tenant) = self.explicit() {
            return TenantContext {
                tenant_id: Some(tenant),
                source: TenantSource::ExplicitParam,
            };
        }

        match self.cfg.default_tenant.as_deref().and_then(sanitize) {
            Some(tenant) => TenantContext {
                tenant_id: Some(tenant),
                source: TenantSource::EnvironmentDefault,
            },
            None => TenantContext::none(),
        }
    }
}

fn form_decode(raw: &str) -> Option<String> {
    urlencoding::decode(&raw.replace('+', " "))
        .ok()
        .map(Cow::into_owned)
}

fn sanitize(raw: &str) -> Option<String> {
    let tenant = raw.trim();
    if tenant.is_empty() {
        return None;
    }

    // Basic sanity: [A-Za-z0-9_-]
    if tenant
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        Some(tenant.to_string())
    } else {
        tracing::warn!(tenant, "ignoring malformed tenant id");
        None
    }
}
