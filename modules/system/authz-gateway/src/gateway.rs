//! Wiring between configuration, the decision pipeline, and a router.

use std::sync::Arc;

use axum::Router;
use axum::middleware::from_fn_with_state;
use pagegate_authz::{
    AnnotationStore, HandlerRegistry, HandlerRegistryBuilder, MarkupInspector, PolicyEngine,
    ResolverOptions, TargetResolver,
};

use crate::config::AuthzGatewayConfig;
use crate::middleware::{AuthzState, authz_middleware};
use crate::session::{CookieSessionSource, SessionStateSource};

/// Owns the resolver and policy engine and knows how to attach the
/// enforcement point to a router.
pub struct AuthzGateway {
    config: AuthzGatewayConfig,
    state: AuthzState,
}

impl AuthzGateway {
    /// Build a gateway with the default cookie-based session source.
    #[must_use]
    pub fn new(
        config: AuthzGatewayConfig,
        registry: Arc<HandlerRegistry>,
        store: AnnotationStore,
        markup: Arc<dyn MarkupInspector>,
    ) -> Self {
        let session = Arc::new(CookieSessionSource::new(config.session_cookie.clone()));
        Self::with_session_source(config, registry, store, markup, session)
    }

    /// Build a gateway with a custom session source.
    #[must_use]
    pub fn with_session_source(
        config: AuthzGatewayConfig,
        registry: Arc<HandlerRegistry>,
        store: AnnotationStore,
        markup: Arc<dyn MarkupInspector>,
        session: Arc<dyn SessionStateSource>,
    ) -> Self {
        let options = ResolverOptions {
            rpc_path_marker: config.rpc_path_marker.clone(),
            template_skip_markers: config.template_skip_markers.clone(),
        };
        let resolver = Arc::new(TargetResolver::new(registry, markup, options));
        let policy = PolicyEngine::new(Arc::new(store));
        Self {
            config,
            state: AuthzState {
                resolver,
                policy,
                session,
            },
        }
    }

    /// Registry builder preconfigured from this config's path matching
    /// settings. Hosts populate it at startup and hand the built registry
    /// back to [`AuthzGateway::new`].
    #[must_use]
    pub fn registry_builder(config: &AuthzGatewayConfig) -> HandlerRegistryBuilder {
        HandlerRegistry::builder().case_insensitive(config.case_insensitive_paths)
    }

    /// Attach the enforcement middleware to `router`.
    ///
    /// When enforcement is disabled this is a pass-through and a warning
    /// is logged once at startup.
    #[must_use]
    pub fn apply(&self, router: Router) -> Router {
        if !self.config.enforcement_enabled {
            tracing::warn!(
                "authorization enforcement is DISABLED; all requests proceed unchecked"
            );
            return router;
        }
        tracing::info!(
            rpc_path_marker = %self.config.rpc_path_marker,
            session_cookie = %self.config.session_cookie,
            "authorization enforcement attached"
        );
        router.layer(from_fn_with_state(self.state.clone(), authz_middleware))
    }
}
