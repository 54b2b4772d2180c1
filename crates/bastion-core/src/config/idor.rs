//! Tenant isolation policy configuration.

use serde::{Deserialize, Serialize};

/// SQL dialect used to parse intercepted statements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialectKind {
    #[default]
    Generic,
    MySql,
    #[serde(alias = "postgresql")]
    Postgres,
    Sqlite,
}

impl std::fmt::Display for SqlDialectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Generic => "generic",
            Self::MySql => "mysql",
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        };
        f.write_str(name)
    }
}

/// Declares which tables must always be filtered by the tenant column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdorConfig {
    /// Column holding the tenant identifier in every protected table.
    #[serde(default = "default_tenant_column")]
    pub tenant_column: String,

    /// Tables subject to tenant checks. Matched case-insensitively.
    #[serde(default)]
    pub protected_tables: Vec<String>,

    #[serde(default)]
    pub sql_dialect: SqlDialectKind,
}

impl Default for IdorConfig {
    fn default() -> Self {
        Self {
            tenant_column: default_tenant_column(),
            protected_tables: Vec::new(),
            sql_dialect: SqlDialectKind::default(),
        }
    }
}

fn default_tenant_column() -> String {
    "tenant_id".to_string()
}
