//! Role-based landing and access decisions.

use spadesk_api::Role;

pub const PLATFORM_ADMIN_ROOT: &str = "/master-admin";
pub const TENANT_ADMIN_DASHBOARD: &str = "/admin/dashboard";
pub const PUBLIC_HOME: &str = "/";
pub const LOGIN_PATH: &str = "/login";

/// Where a user lands right after logging in.
pub fn landing_path_for(role: Role) -> &'static str {
    match role {
        Role::MasterAdmin => PLATFORM_ADMIN_ROOT,
        Role::SpaAdmin => TENANT_ADMIN_DASHBOARD,
        Role::Customer => PUBLIC_HOME,
    }
}

/// Same as [`landing_path_for`] for a raw role string; unrecognized spellings
/// land where customers do.
pub fn landing_path_for_claim(raw: &str) -> &'static str {
    landing_path_for(Role::from_claim(raw).0)
}

/// An empty allow-list admits every authenticated role.
pub fn is_authorized(role: Role, allowed: &[Role]) -> bool {
    allowed.is_empty() || allowed.contains(&role)
}

/// Outcome of gating a protected screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    RedirectToLogin(&'static str),
    RedirectHome(&'static str),
}

pub fn gate(role: Option<Role>, allowed: &[Role]) -> AccessDecision {
    match role {
        None => AccessDecision::RedirectToLogin(LOGIN_PATH),
        Some(role) if !is_authorized(role, allowed) => AccessDecision::RedirectHome(PUBLIC_HOME),
        Some(_) => AccessDecision::Allow,
    }
}
