//! Configuration types for Bastion.
//!
//! A single YAML document configures every checkpoint:
//!
//! ```yaml
//! idor:
//!   tenant_column: tenant_id
//!   protected_tables: [orders, invoices]
//!   sql_dialect: postgres
//! routes:
//!   param_matchers:
//!     - name: order_ref
//!       pattern: "ord-{digits}"
//!   known_routes: ["/api/orders/:id"]
//! rate_limiting:
//!   tiers:
//!     - window_ms: 60000
//!       max_requests: 100
//!   endpoints:
//!     - method: POST
//!       route: /api/login
//!       tiers: [{ window_ms: 60000, max_requests: 5 }]
//! blocking:
//!   bypassed_ips: ["10.0.0.1"]
//!   blocked_user_ids: ["666"]
//!   blocked_user_agents:
//!     - pattern: "GPTBot|ClaudeBot"
//!       description: AI crawlers
//! ```
//!
//! Every section is optional. An empty document yields a configuration that
//! allows everything.

pub mod blocking;
pub mod idor;
pub mod rate_limit;
pub mod routes;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub use crate::error::ConfigError;
pub use blocking::{BlockedUserAgent, BlockingConfig};
pub use idor::{IdorConfig, SqlDialectKind};
pub use rate_limit::{EndpointRateLimit, RateLimitTier, RateLimitingConfig};
pub use routes::{ParamMatcherConfig, RoutesConfig};

/// Complete Bastion configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BastionConfig {
    /// Tenant isolation policy. No policy means no statement is ever checked.
    #[serde(default)]
    pub idor: Option<IdorConfig>,

    /// Route normalization.
    #[serde(default)]
    pub routes: RoutesConfig,

    /// Request rate limiting.
    #[serde(default)]
    pub rate_limiting: RateLimitingConfig,

    /// IP, user and user-agent lists.
    #[serde(default)]
    pub blocking: BlockingConfig,
}

impl BastionConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        // serde_yaml rejects an empty document, treat it as "all defaults"
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Check the value-level rules serde cannot express.
    ///
    /// Pattern syntax and policy identifiers are validated by the components
    /// that compile them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rate_limiting.validate()?;
        self.blocking.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const FULL: &str = r#"
idor:
  tenant_column: org_id
  protected_tables: [orders, Invoices]
  sql_dialect: mysql
routes:
  param_matchers:
    - name: order_ref
      pattern: "ord-{digits}"
  known_routes: ["/api/orders/:id"]
rate_limiting:
  tiers:
    - window_ms: 60000
      max_requests: 100
  endpoints:
    - route: /api/login
      tiers:
        - window_ms: 1000
          max_requests: 5
blocking:
  bypassed_ips: ["10.0.0.1"]
  blocked_user_agents:
    - pattern: "GPTBot"
      description: AI crawlers
"#;

    #[test]
    fn test_parse_full_config() {
        let config = BastionConfig::from_yaml(FULL).unwrap();

        let idor = config.idor.as_ref().unwrap();
        assert_eq!(idor.tenant_column, "org_id");
        assert_eq!(idor.protected_tables, vec!["orders", "Invoices"]);
        assert_eq!(idor.sql_dialect, SqlDialectKind::MySql);

        assert_eq!(config.routes.param_matchers[0].name, "order_ref");
        assert_eq!(config.routes.known_routes, vec!["/api/orders/:id"]);

        assert_eq!(config.rate_limiting.tiers, vec![RateLimitTier::new(60_000, 100)]);
        let endpoint = &config.rate_limiting.endpoints[0];
        assert_eq!(endpoint.method, "*");
        assert!(endpoint.route_regex().unwrap().is_match("/api/login"));

        assert_eq!(config.blocking.bypassed_ips, vec!["10.0.0.1"]);
        assert_eq!(config.blocking.blocked_user_agents[0].description, "AI crawlers");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_document_is_default() {
        let config = BastionConfig::from_yaml("").unwrap();
        assert!(config.idor.is_none());
        assert!(config.rate_limiting.tiers.is_empty());
        assert!(config.routes.param_matchers.is_empty());
    }

    #[test]
    fn test_idor_defaults() {
        let config = BastionConfig::from_yaml("idor:\n  protected_tables: [orders]\n").unwrap();
        let idor = config.idor.unwrap();
        assert_eq!(idor.tenant_column, "tenant_id");
        assert_eq!(idor.sql_dialect, SqlDialectKind::Generic);
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let config = BastionConfig::from_yaml(
            "rate_limiting:\n  tiers:\n    - window_ms: 0\n      max_requests: 5\n",
        )
        .unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidRateLimit(_))));
    }

    #[test]
    fn test_invalid_yaml() {
        let result = BastionConfig::from_yaml("rate_limiting: [not, a, map");
        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FULL.as_bytes()).unwrap();

        let config = BastionConfig::from_file(file.path()).unwrap();
        assert_eq!(config.idor.unwrap().tenant_column, "org_id");
    }

    #[test]
    fn test_missing_file() {
        let result = BastionConfig::from_file("/nonexistent/bastion.yaml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
