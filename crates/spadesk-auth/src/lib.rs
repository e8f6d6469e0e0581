//! spadesk-auth
//!
//! Client-side session primitives for the spa storefront and admin console.
//!
//! - **Decoding bearer tokens** into [`Claims`](spadesk_api::Claims) for routing and display
//! - **Holding the session token** durably ([`TokenStore`])
//! - **Resolving the tenant** (spa) a request targets ([`TenantResolver`])
//! - **Mapping roles** to landing pages and access decisions
//!
//! Nothing here is a security boundary. Tokens are decoded without signature
//! verification, and every privileged endpoint re-validates the bearer token on
//! the server. The client role only decides what to render.
//!
//! ## Quick start
//! ```no_run
//! use std::sync::Arc;
//! use spadesk_auth::{TenantConfig, TenantResolver, TokenStore, landing_path_for};
//! # fn demo(storage: Arc<dyn spadesk_api::DurableStorage>) {
//! let store = TokenStore::open(storage);
//! let resolver = TenantResolver::new(TenantConfig::default());
//!
//! if let Some(claims) = store.decode() {
//!     println!("landing at {}", landing_path_for(claims.role));
//! }
//! let tenant = resolver.resolve("/bookings/my");
//! println!("tenant={:?}", tenant.tenant_id);
//! # }
//! ```

#![forbid(unsafe_code)]

mod jwt;
mod role;
mod tenant;
mod token;

pub use jwt::decode_claims;
pub use role::{
    AccessDecision, LOGIN_PATH, PLATFORM_ADMIN_ROOT, PUBLIC_HOME, TENANT_ADMIN_DASHBOARD, gate,
    is_authorized, landing_path_for, landing_path_for_claim,
};
pub use tenant::{TenantConfig, TenantContext, TenantResolver, TenantSource};
pub use token::TokenStore;

/// Crate result type.
pub type Result<T> = std::result::Result<T, spadesk_api::SpaError>;
