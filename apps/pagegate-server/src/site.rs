//! The sample site hosted by the server binary.
//!
//! Everything the gateway needs to know about the site is declared here
//! once, at startup: routed pages, their markup locations, declared
//! operations, template locations, and RPC service locations.

use std::sync::Arc;

use anyhow::Result;
use authz_gateway::{AuthzGateway, Session};
use axum::body::Body;
use axum::extract::Path;
use axum::middleware::{Next, from_fn};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use http::Request;
use pagegate_authz::{AnnotationStore, FsMarkupInspector};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;

/// Header the demo session layer accepts in place of a real identity
/// ticket. A production host replaces [`session_layer`] with its own
/// session validation.
const DEMO_IDENTITY_HEADER: &str = "x-demo-user";

pub fn build_app(config: &AppConfig) -> Result<Router> {
    let registry = Arc::new(
        AuthzGateway::registry_builder(&config.authorization)
            .register_page("/", "pages::Home", None)
            .register_page("/account", "pages::Account", Some("/account.pg"))
            .register_operation("pages::Account", "UpdateEmail")
            .register_location("/shared/member.tpl", "templates::Member")
            .register_location("/services/account.asmx", "services::Account")
            .build()?,
    );

    let store = AnnotationStore::builder()
        .require_authentication("templates::Member")
        .require_authentication("services::Account")
        .require_authentication_for("pages::Account", "UpdateEmail")
        .build(&registry);

    let markup = Arc::new(FsMarkupInspector::new(&config.server.site_root));
    let gateway = AuthzGateway::new(config.authorization.clone(), registry, store, markup);

    let router = Router::new()
        .route("/", get(home))
        .route("/account", get(account))
        .route("/account/{op}", post(account_operation))
        .route("/services/account.asmx/{op}", post(account_service));

    Ok(gateway
        .apply(router)
        .layer(from_fn(session_layer))
        .layer(TraceLayer::new_for_http()))
}

/// Demo session layer: a request carrying the demo identity header is
/// treated as an authenticated session.
async fn session_layer(mut req: Request<Body>, next: Next) -> Response {
    if req.headers().contains_key(DEMO_IDENTITY_HEADER) {
        req.extensions_mut().insert(Session {
            authenticated: true,
        });
    }
    next.run(req).await
}

async fn home() -> &'static str {
    "PageGate sample site\n"
}

async fn account() -> &'static str {
    "account overview\n"
}

async fn account_operation(Path(operation): Path<String>) -> Json<serde_json::Value> {
    Json(json!({ "operation": operation, "status": "done" }))
}

async fn account_service(Path(operation): Path<String>) -> Json<serde_json::Value> {
    Json(json!({ "service": "account", "operation": operation }))
}
