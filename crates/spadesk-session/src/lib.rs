//! spadesk-session
//!
//! The session-aware HTTP layer: every outbound call is decorated with the
//! bearer credential and the resolved tenant, and every failure is classified,
//! acted on (a 401 drops the session) and reported exactly once.
//!
//! Build a [`SpaContext`] at startup and hand out its pieces by reference.

#![forbid(unsafe_code)]

mod client;
mod context;
mod identity;
pub mod request;
pub mod response;
mod session;
mod storefront;

#[cfg(test)]
mod testing;

pub use client::ApiClient;
pub use context::SpaContext;
pub use identity::{HttpIdentityProvider, MIN_PASSWORD_LEN, PasswordReset};
pub use request::{BearerStage, RequestPipeline, RequestStage, TenantStage};
pub use response::{
    InvalidateOnUnauthorized, NotifyOnFailure, ResponsePipeline, ResponseStage, classify,
    failure_message,
};
pub use session::{DEFAULT_LOGIN_FAILURE, SessionManager, SessionState};
pub use storefront::StorefrontApi;
