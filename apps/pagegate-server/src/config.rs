//! Layered application configuration.
//!
//! Precedence, lowest to highest: built-in defaults, YAML file,
//! `PAGEGATE__*` environment variables.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use authz_gateway::AuthzGatewayConfig;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    pub bind_addr: SocketAddr,
    /// Root directory page markup is read from.
    pub site_root: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8087)),
            site_root: PathBuf::from("site"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LoggingConfig {
    /// Default tracing filter, overridden by `RUST_LOG` when set.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub authorization: AuthzGatewayConfig,
}

impl AppConfig {
    /// Load configuration, merging the optional YAML file and
    /// `PAGEGATE__SECTION__FIELD` environment variables over defaults.
    ///
    /// # Errors
    /// Returns an error when the file or environment contains values that
    /// do not deserialize into the config schema.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::prefixed("PAGEGATE__").split("__"))
            .extract()
            .context("invalid configuration")
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn defaults_without_a_file() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.server.bind_addr.port(), 8087);
        assert!(config.authorization.enforcement_enabled);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn yaml_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::with_suffix(".yaml").unwrap();
        writeln!(
            file,
            "server:\n  bind_addr: 127.0.0.1:9090\nauthorization:\n  enforcement_enabled: false\n"
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.server.bind_addr.port(), 9090);
        assert!(!config.authorization.enforcement_enabled);
        // Untouched sections keep their defaults.
        assert_eq!(config.authorization.session_cookie, "pg_session");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut file = tempfile::NamedTempFile::with_suffix(".yaml").unwrap();
        writeln!(file, "no_such_section:\n  value: 1\n").unwrap();
        assert!(AppConfig::load(Some(file.path())).is_err());
    }
}
