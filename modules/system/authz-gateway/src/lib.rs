#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Authorization enforcement for PageGate routers.
//!
//! This crate wires the `pagegate-authz` decision pipeline into an axum
//! router. The [`AuthzGateway`] owns the resolver and policy engine and
//! attaches a middleware that rejects unauthorized requests with a bare
//! `401 Unauthorized` before the inner handler runs.

pub mod config;
pub mod gateway;
pub mod middleware;
pub mod session;

pub use config::AuthzGatewayConfig;
pub use gateway::AuthzGateway;
pub use middleware::{AuthzState, authz_middleware};
pub use session::{CookieSessionSource, Session, SessionStateSource};
