//! The enforcement middleware itself.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use http::StatusCode;
use pagegate_authz::{Decision, PolicyEngine, RpcDispatch, TargetResolver};

use crate::session::SessionStateSource;

/// Shared state behind the enforcement middleware.
#[derive(Clone)]
pub struct AuthzState {
    pub resolver: Arc<TargetResolver>,
    pub policy: PolicyEngine,
    pub session: Arc<dyn SessionStateSource>,
}

/// Resolve the request's target, consult the policy engine, and either
/// run the inner handler or reject with a bare `401`.
///
/// Legacy adapters may attach an [`RpcDispatch`] extension upstream; it
/// is only consulted when the registry cannot identify an RPC endpoint
/// by path.
pub async fn authz_middleware(
    State(state): State<AuthzState>,
    req: Request,
    next: Next,
) -> Response {
    let dispatch = req.extensions().get::<RpcDispatch>().cloned();
    let target = state
        .resolver
        .resolve(req.method(), req.uri(), dispatch.as_ref());
    let auth = state.session.authentication_state(&req);

    match state.policy.decide(target.as_ref(), auth) {
        Decision::Allow => next.run(req).await,
        Decision::Deny => {
            tracing::debug!(
                method = %req.method(),
                path = req.uri().path(),
                is_authenticated = auth.is_authenticated,
                has_session_token = auth.has_session_token,
                "request denied"
            );
            deny_response()
        }
    }
}

/// The fixed rejection: status only, nothing written to the body.
fn deny_response() -> Response {
    let mut response = Response::new(axum::body::Body::empty());
    *response.status_mut() = StatusCode::UNAUTHORIZED;
    response
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn deny_response_is_bare_401() {
        let response = deny_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(http::header::CONTENT_TYPE).is_none());
    }
}
