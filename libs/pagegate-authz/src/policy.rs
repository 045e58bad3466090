//! Policy decision engine: gate a resolved target on the annotation store
//! and the request's session state.

use std::sync::Arc;

use crate::annotations::AnnotationStore;
use crate::resolver::ResolvedTarget;

/// Snapshot of the current request's session, obtained once from the
/// host's authentication collaborator.
///
/// Both flags must be true for the request to count as authenticated; a
/// partially-authenticated state is treated as unauthenticated. The
/// conjunction is a policy rule enforced here, not an incidental check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticationState {
    /// Whether the host considers the session authenticated.
    pub is_authenticated: bool,
    /// Whether the expected session token accompanied the request.
    pub has_session_token: bool,
}

impl AuthenticationState {
    /// A fully authenticated session (both flags set).
    #[must_use]
    pub const fn authenticated() -> Self {
        Self {
            is_authenticated: true,
            has_session_token: true,
        }
    }

    /// No session at all.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            is_authenticated: false,
            has_session_token: false,
        }
    }

    #[must_use]
    pub const fn is_fully_authenticated(self) -> bool {
        self.is_authenticated && self.has_session_token
    }
}

/// Outcome of a policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Let the request proceed unchanged.
    Allow,
    /// Reject the request before the handler runs.
    Deny,
}

/// Evaluates resolved targets against the annotation store.
#[derive(Clone)]
pub struct PolicyEngine {
    store: Arc<AnnotationStore>,
}

impl PolicyEngine {
    #[must_use]
    pub fn new(store: Arc<AnnotationStore>) -> Self {
        Self { store }
    }

    /// Decide whether the request may proceed.
    ///
    /// Markers are OR-ed across the whole resolution chain, and the
    /// operation marker is checked independently against the most-derived
    /// identity. The first check that demands authentication against a
    /// not-fully-authenticated session denies immediately, without
    /// probing deeper layers. An unresolved target is implicitly allowed:
    /// no marker can be attributed to an unknown type.
    #[must_use]
    pub fn decide(&self, target: Option<&ResolvedTarget>, auth: AuthenticationState) -> Decision {
        let Some(target) = target else {
            return Decision::Allow;
        };

        for identity in target.chain() {
            if self.store.requires_authentication(identity) && !auth.is_fully_authenticated() {
                return Decision::Deny;
            }
        }

        if let Some(operation) = target.operation() {
            if self
                .store
                .operation_requires_authentication(target.handler(), operation)
                && !auth.is_fully_authenticated()
            {
                return Decision::Deny;
            }
        }

        Decision::Allow
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::registry::HandlerRegistry;

    fn engine(build: impl FnOnce(crate::AnnotationStoreBuilder) -> crate::AnnotationStoreBuilder) -> PolicyEngine {
        let registry = HandlerRegistry::builder().build().unwrap();
        let store = build(AnnotationStore::builder()).build(&registry);
        PolicyEngine::new(Arc::new(store))
    }

    #[test]
    fn unmarked_chain_allows_regardless_of_state() {
        let engine = engine(|b| b);
        let target = ResolvedTarget::new("pages::Public");
        for auth in [
            AuthenticationState::anonymous(),
            AuthenticationState::authenticated(),
        ] {
            assert_eq!(engine.decide(Some(&target), auth), Decision::Allow);
        }
    }

    #[test]
    fn marked_handler_denies_unauthenticated() {
        let engine = engine(|b| b.require_authentication("pages::Admin"));
        let target = ResolvedTarget::new("pages::Admin");
        assert_eq!(
            engine.decide(Some(&target), AuthenticationState::anonymous()),
            Decision::Deny
        );
        assert_eq!(
            engine.decide(Some(&target), AuthenticationState::authenticated()),
            Decision::Allow
        );
    }

    #[test]
    fn marked_ancestor_denies_through_the_chain() {
        let engine = engine(|b| b.require_authentication("templates::Secure"));
        let target = ResolvedTarget::new("pages::Plain").with_ancestor("templates::Secure");
        assert_eq!(
            engine.decide(Some(&target), AuthenticationState::anonymous()),
            Decision::Deny
        );
        assert_eq!(
            engine.decide(Some(&target), AuthenticationState::authenticated()),
            Decision::Allow
        );
    }

    #[test]
    fn authenticated_flag_without_token_denies() {
        let engine = engine(|b| b.require_authentication("pages::Admin"));
        let target = ResolvedTarget::new("pages::Admin");
        let partial = AuthenticationState {
            is_authenticated: true,
            has_session_token: false,
        };
        assert_eq!(engine.decide(Some(&target), partial), Decision::Deny);
    }

    #[test]
    fn token_without_authenticated_flag_denies() {
        let engine = engine(|b| b.require_authentication("pages::Admin"));
        let target = ResolvedTarget::new("pages::Admin");
        let partial = AuthenticationState {
            is_authenticated: false,
            has_session_token: true,
        };
        assert_eq!(engine.decide(Some(&target), partial), Decision::Deny);
    }

    #[test]
    fn marked_operation_denies_unauthenticated() {
        let engine = engine(|b| b.require_authentication_for("pages::Profile", "UpdateEmail"));
        let target = ResolvedTarget::new("pages::Profile").with_operation("UpdateEmail".into());
        assert_eq!(
            engine.decide(Some(&target), AuthenticationState::anonymous()),
            Decision::Deny
        );
        assert_eq!(
            engine.decide(Some(&target), AuthenticationState::authenticated()),
            Decision::Allow
        );
    }

    #[test]
    fn operation_marker_on_other_type_does_not_apply() {
        let engine = engine(|b| b.require_authentication_for("pages::Other", "UpdateEmail"));
        let target = ResolvedTarget::new("pages::Profile").with_operation("UpdateEmail".into());
        assert_eq!(
            engine.decide(Some(&target), AuthenticationState::anonymous()),
            Decision::Allow
        );
    }

    #[test]
    fn unresolved_target_is_implicitly_allowed() {
        let engine = engine(|b| b.require_authentication("pages::Admin"));
        assert_eq!(
            engine.decide(None, AuthenticationState::anonymous()),
            Decision::Allow
        );
    }
}
