//! Configuration for the authorization gateway.

use serde::{Deserialize, Serialize};

/// Tunables for the enforcement point and target resolution.
///
/// All fields have defaults so an empty config section yields a fully
/// enforcing gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AuthzGatewayConfig {
    /// Deployment-wide switch. When `false` the middleware is never
    /// attached and every request proceeds unchecked.
    pub enforcement_enabled: bool,

    /// Match request paths against registered routes without regard to
    /// case. Applies to the registry built via
    /// [`AuthzGateway::registry_builder`](crate::AuthzGateway::registry_builder).
    pub case_insensitive_paths: bool,

    /// Substring that marks an RPC-style endpoint path. Everything before
    /// the marker names the service, the first segment after it names the
    /// operation.
    pub rpc_path_marker: String,

    /// Requests whose path-and-query contains any of these markers skip
    /// template chain resolution entirely.
    pub template_skip_markers: Vec<String>,

    /// Name of the session cookie whose presence counts as holding a
    /// session token.
    pub session_cookie: String,
}

impl Default for AuthzGatewayConfig {
    fn default() -> Self {
        Self {
            enforcement_enabled: true,
            case_insensitive_paths: true,
            rpc_path_marker: ".asmx/".to_owned(),
            template_skip_markers: vec![".axd?".to_owned()],
            session_cookie: "pg_session".to_owned(),
        }
    }
}
