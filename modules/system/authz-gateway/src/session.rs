//! Session inspection for the enforcement point.
//!
//! The gateway never authenticates anyone itself. It reads the outcome of
//! the host's session layer: a [`Session`] request extension plus the
//! presence of the configured session cookie.

use axum::extract::Request;
use http::HeaderMap;
use http::header::COOKIE;
use pagegate_authz::AuthenticationState;

/// Outcome of the host's session layer, inserted as a request extension
/// before the gateway middleware runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Session {
    /// Whether the session layer established a user identity.
    pub authenticated: bool,
}

/// Source of the authentication facts the policy engine consumes.
pub trait SessionStateSource: Send + Sync {
    fn authentication_state(&self, req: &Request) -> AuthenticationState;
}

/// Default source: authenticated iff the [`Session`] extension says so,
/// token-holding iff the configured cookie is present on the request.
///
/// Cookie presence is checked independently of the extension so a stale
/// in-process identity without its cookie (or a bare cookie the session
/// layer rejected) still fails the conjunction.
pub struct CookieSessionSource {
    cookie_name: String,
}

impl CookieSessionSource {
    #[must_use]
    pub fn new(cookie_name: impl Into<String>) -> Self {
        Self {
            cookie_name: cookie_name.into(),
        }
    }
}

impl SessionStateSource for CookieSessionSource {
    fn authentication_state(&self, req: &Request) -> AuthenticationState {
        let is_authenticated = req
            .extensions()
            .get::<Session>()
            .is_some_and(|session| session.authenticated);
        AuthenticationState {
            is_authenticated,
            has_session_token: has_cookie(req.headers(), &self.cookie_name),
        }
    }
}

fn has_cookie(headers: &HeaderMap, name: &str) -> bool {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .any(|pair| {
            pair.split_once('=')
                .is_some_and(|(cookie_name, _)| cookie_name.trim() == name)
        })
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request(cookie: Option<&str>, session: Option<Session>) -> Request {
        let mut builder = http::Request::builder().uri("/");
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        let mut req = builder.body(Body::empty()).unwrap();
        if let Some(session) = session {
            req.extensions_mut().insert(session);
        }
        req
    }

    #[test]
    fn both_facts_present() {
        let source = CookieSessionSource::new("pg_session");
        let req = request(
            Some("pg_session=abc123"),
            Some(Session {
                authenticated: true,
            }),
        );
        let state = source.authentication_state(&req);
        assert!(state.is_authenticated);
        assert!(state.has_session_token);
    }

    #[test]
    fn cookie_without_session_extension() {
        let source = CookieSessionSource::new("pg_session");
        let req = request(Some("pg_session=abc123"), None);
        let state = source.authentication_state(&req);
        assert!(!state.is_authenticated);
        assert!(state.has_session_token);
    }

    #[test]
    fn session_extension_without_cookie() {
        let source = CookieSessionSource::new("pg_session");
        let req = request(
            None,
            Some(Session {
                authenticated: true,
            }),
        );
        let state = source.authentication_state(&req);
        assert!(state.is_authenticated);
        assert!(!state.has_session_token);
    }

    #[test]
    fn cookie_name_must_match_exactly() {
        let source = CookieSessionSource::new("pg_session");
        let req = request(Some("pg_session_old=abc; other=1"), None);
        assert!(!source.authentication_state(&req).has_session_token);
    }

    #[test]
    fn cookie_found_among_several() {
        let source = CookieSessionSource::new("pg_session");
        let req = request(Some("theme=dark; pg_session=abc123; lang=en"), None);
        assert!(source.authentication_state(&req).has_session_token);
    }

    #[test]
    fn unauthenticated_session_extension_is_not_identity() {
        let source = CookieSessionSource::new("pg_session");
        let req = request(
            Some("pg_session=abc123"),
            Some(Session {
                authenticated: false,
            }),
        );
        assert!(!source.authentication_state(&req).is_authenticated);
    }
}
