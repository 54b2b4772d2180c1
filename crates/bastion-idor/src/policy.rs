//! Tenant isolation policy and its process-wide store.

use std::collections::BTreeSet;
use std::sync::Arc;

use bastion_core::{ConfigError, IdorConfig};
use parking_lot::RwLock;

/// Which tables must be filtered by which tenant column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdorPolicy {
    tenant_column: String,
    protected_tables: BTreeSet<String>,
}

impl IdorPolicy {
    pub fn new<I, S>(tenant_column: &str, tables: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tenant_column = tenant_column.trim();
        if !is_identifier(tenant_column) {
            return Err(ConfigError::InvalidPolicy(format!(
                "tenant column '{tenant_column}' is not a valid column name"
            )));
        }

        let mut protected_tables = BTreeSet::new();
        for table in tables {
            let table = table.as_ref().trim();
            if table.is_empty() {
                return Err(ConfigError::InvalidPolicy(
                    "protected table names cannot be empty".to_string(),
                ));
            }
            // Statements are matched on the bare table name
            let name = table.rsplit('.').next().unwrap_or(table);
            protected_tables.insert(name.to_lowercase());
        }

        Ok(Self {
            tenant_column: tenant_column.to_lowercase(),
            protected_tables,
        })
    }

    pub fn from_config(config: &IdorConfig) -> Result<Self, ConfigError> {
        Self::new(&config.tenant_column, &config.protected_tables)
    }

    pub fn tenant_column(&self) -> &str {
        &self.tenant_column
    }

    pub fn protected_tables(&self) -> impl ExactSizeIterator<Item = &str> {
        self.protected_tables.iter().map(String::as_str)
    }

    pub fn has_protected_tables(&self) -> bool {
        !self.protected_tables.is_empty()
    }

    /// Case-insensitive membership test.
    pub fn is_protected(&self, table: &str) -> bool {
        self.protected_tables.contains(&table.to_lowercase())
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Holds the active policy.
///
/// Readers get an `Arc` snapshot, so a redeclaration never changes the policy
/// under a check that is already running.
#[derive(Debug, Default)]
pub struct IdorPolicyStore {
    current: RwLock<Option<Arc<IdorPolicy>>>,
}

impl IdorPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the active policy.
    ///
    /// Returns `false` when an identical policy was already active.
    pub fn declare(&self, policy: IdorPolicy) -> bool {
        let mut current = self.current.write();
        if current.as_deref() == Some(&policy) {
            tracing::debug!(
                tenant_column = %policy.tenant_column,
                "IDOR policy already declared, ignoring"
            );
            return false;
        }
        tracing::info!(
            tenant_column = %policy.tenant_column,
            tables = ?policy.protected_tables,
            "Declared IDOR policy"
        );
        *current = Some(Arc::new(policy));
        true
    }

    pub fn current(&self) -> Option<Arc<IdorPolicy>> {
        self.current.read().clone()
    }

    pub fn clear(&self) {
        *self.current.write() = None;
    }
}
