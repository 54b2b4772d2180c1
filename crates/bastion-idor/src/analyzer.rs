//! Tenant isolation checks.
//!
//! Every statement touching a protected table must be scoped to the tenant of
//! the current request:
//!
//! - `SELECT`/`UPDATE`/`DELETE` need `tenant_column = <tenant id>` in the
//!   top-level `WHERE` conjunction.
//! - `INSERT` needs the tenant column in its column list, with the tenant id
//!   as value in every row.
//!
//! Values may be literals or placeholders resolved against the bound
//! parameters. Anything that cannot be verified blocks.

use bastion_core::{Decision, DecisionMetadata, DecisionType, RequestContext, SqlDialectKind, Trigger};

use crate::bindings::BoundParameters;
use crate::parser::{SqlAnalyzer, StatementKind, StatementModel, TableRef};
use crate::policy::IdorPolicy;

const MISSING_TENANT_ID: &str = "set_tenant_id was not called for this request. \
     Every request must have a tenant ID when IDOR protection is enabled.";

/// Why a statement failed the tenant check.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Violation {
    table: String,
    description: String,
}

impl Violation {
    fn new(table: &TableRef, description: String) -> Self {
        Self {
            table: table.name.clone(),
            description,
        }
    }
}

/// Decides whether statements stay within the current tenant.
#[derive(Debug, Clone, Copy, Default)]
pub struct TenantIsolationAnalyzer {
    parser: SqlAnalyzer,
}

impl TenantIsolationAnalyzer {
    pub fn new(dialect: SqlDialectKind) -> Self {
        Self {
            parser: SqlAnalyzer::new(dialect),
        }
    }

    pub fn parser(&self) -> &SqlAnalyzer {
        &self.parser
    }

    /// Check a single statement model.
    pub fn check(
        &self,
        statement: &StatementModel,
        bound: &BoundParameters,
        ctx: &RequestContext,
        policy: &IdorPolicy,
    ) -> Decision {
        match evaluate(statement, bound, ctx, policy) {
            Ok(()) => Decision::allow(),
            Err(violation) => {
                tracing::info!(
                    table = %violation.table,
                    column = %policy.tenant_column(),
                    tenant_id = ?ctx.tenant_id(),
                    "Blocked statement: {}",
                    violation.description
                );
                Decision::tenant_violation(
                    violation.table,
                    policy.tenant_column(),
                    violation.description,
                )
            }
        }
    }

    /// Check several models; the first violation wins.
    pub fn check_all(
        &self,
        statements: &[StatementModel],
        bound: &BoundParameters,
        ctx: &RequestContext,
        policy: &IdorPolicy,
    ) -> Decision {
        statements
            .iter()
            .map(|statement| self.check(statement, bound, ctx, policy))
            .find(Decision::is_blocked)
            .unwrap_or_default()
    }

    /// Parse and check raw SQL. SQL that cannot be parsed blocks.
    pub fn check_sql(
        &self,
        sql: &str,
        bound: &BoundParameters,
        ctx: &RequestContext,
        policy: &IdorPolicy,
    ) -> Decision {
        if ctx.idor_bypassed() || !policy.has_protected_tables() {
            return Decision::allow();
        }
        match self.parser.analyze(sql) {
            Ok(models) => self.check_all(&models, bound, ctx, policy),
            Err(err) => {
                tracing::warn!(error = %err, "Failed to analyze SQL query, blocking");
                Decision {
                    block: true,
                    kind: DecisionType::TenantViolation,
                    trigger: Trigger::Tenant,
                    metadata: DecisionMetadata {
                        column: Some(policy.tenant_column().to_string()),
                        description: Some(format!("failed to analyze SQL query: {err}")),
                        ..DecisionMetadata::default()
                    },
                }
            }
        }
    }
}

fn evaluate(
    statement: &StatementModel,
    bound: &BoundParameters,
    ctx: &RequestContext,
    policy: &IdorPolicy,
) -> Result<(), Violation> {
    if ctx.idor_bypassed() {
        tracing::debug!("IDOR protection disabled for this scope, skipping check");
        return Ok(());
    }
    if !policy.has_protected_tables() || !statement.kind.is_checked() {
        return Ok(());
    }

    let protected: Vec<&TableRef> = statement
        .tables
        .iter()
        .filter(|table| policy.is_protected(&table.name))
        .collect();
    let Some(first) = protected.first() else {
        return Ok(());
    };
    let Some(tenant_id) = ctx.tenant_id() else {
        return Err(Violation::new(first, MISSING_TENANT_ID.to_string()));
    };

    let column = policy.tenant_column();
    for table in protected {
        match statement.kind {
            StatementKind::Insert => check_insert(statement, table, column, tenant_id, bound)?,
            _ => check_filters(statement, table, column, tenant_id, bound)?,
        }
    }
    Ok(())
}

fn check_filters(
    statement: &StatementModel,
    table: &TableRef,
    column: &str,
    tenant_id: &str,
    bound: &BoundParameters,
) -> Result<(), Violation> {
    let mut filtered = false;
    for value in statement.predicates_for(table, column) {
        filtered = true;
        let resolved = bound.resolve(value).map_err(|err| {
            Violation::new(
                table,
                format!(
                    "query on table '{}' filters '{column}' but {err}",
                    table.name
                ),
            )
        })?;
        if resolved != tenant_id {
            return Err(Violation::new(
                table,
                format!(
                    "query on table '{}' filters '{column}' with value '{resolved}' but tenant ID is '{tenant_id}'",
                    table.name
                ),
            ));
        }
    }

    if !filtered {
        return Err(Violation::new(
            table,
            format!(
                "query on table '{}' is missing a filter on column '{column}'",
                table.name
            ),
        ));
    }
    Ok(())
}

fn check_insert(
    statement: &StatementModel,
    table: &TableRef,
    column: &str,
    tenant_id: &str,
    bound: &BoundParameters,
) -> Result<(), Violation> {
    let Some(index) = statement.insert_column_index(column) else {
        return Err(Violation::new(
            table,
            format!(
                "INSERT on table '{}' is missing column '{column}'",
                table.name
            ),
        ));
    };
    if statement.insert_from_query {
        return Err(Violation::new(
            table,
            format!(
                "INSERT on table '{}' takes its rows from a query, the value of column '{column}' cannot be verified",
                table.name
            ),
        ));
    }

    for row in &statement.insert_rows {
        let Some(Some(value)) = row.get(index) else {
            return Err(Violation::new(
                table,
                format!(
                    "INSERT on table '{}' sets '{column}' to an expression that cannot be verified",
                    table.name
                ),
            ));
        };
        let resolved = bound.resolve(value).map_err(|err| {
            Violation::new(
                table,
                format!(
                    "INSERT on table '{}' sets '{column}' but {err}",
                    table.name
                ),
            )
        })?;
        if resolved != tenant_id {
            return Err(Violation::new(
                table,
                format!(
                    "INSERT on table '{}' sets '{column}' to '{resolved}' but tenant ID is '{tenant_id}'",
                    table.name
                ),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{ValueRef, WherePredicate};

    fn policy() -> IdorPolicy {
        IdorPolicy::new("tenant_id", ["orders", "invoices"]).unwrap()
    }

    fn ctx(tenant: &str) -> RequestContext {
        let mut ctx = RequestContext::new("127.0.0.1", "test");
        ctx.set_tenant_id(tenant);
        ctx
    }

    fn check(sql: &str, bound: &BoundParameters, ctx: &RequestContext) -> Decision {
        TenantIsolationAnalyzer::default().check_sql(sql, bound, ctx, &policy())
    }

    fn description(decision: &Decision) -> &str {
        decision.metadata.description.as_deref().unwrap_or_default()
    }

    #[test]
    fn test_unprotected_table_always_allowed() {
        let none = BoundParameters::new();
        let decision = check("SELECT * FROM users", &none, &ctx("A"));
        assert!(!decision.is_blocked());

        let decision = check("DELETE FROM users", &none, &RequestContext::default());
        assert!(!decision.is_blocked());
    }

    #[test]
    fn test_literal_filter() {
        let none = BoundParameters::new();
        assert!(!check("SELECT * FROM orders WHERE tenant_id = 'A'", &none, &ctx("A")).is_blocked());

        let decision = check("SELECT * FROM orders WHERE tenant_id = 'B'", &none, &ctx("A"));
        assert!(decision.is_blocked());
        assert_eq!(decision.kind, DecisionType::TenantViolation);
        assert_eq!(decision.metadata.table.as_deref(), Some("orders"));
        assert_eq!(
            description(&decision),
            "query on table 'orders' filters 'tenant_id' with value 'B' but tenant ID is 'A'"
        );
    }

    #[test]
    fn test_numeric_tenant_literal() {
        let none = BoundParameters::new();
        let decision = check("SELECT * FROM orders WHERE tenant_id = 42", &none, &ctx("42"));
        assert!(!decision.is_blocked());
    }

    #[test]
    fn test_missing_filter() {
        let decision = check("SELECT * FROM orders", &BoundParameters::new(), &ctx("A"));
        assert_eq!(
            description(&decision),
            "query on table 'orders' is missing a filter on column 'tenant_id'"
        );
        assert_eq!(decision.metadata.column.as_deref(), Some("tenant_id"));
    }

    #[test]
    fn test_missing_tenant_id() {
        let decision = check(
            "SELECT * FROM orders WHERE tenant_id = 'A'",
            &BoundParameters::new(),
            &RequestContext::default(),
        );
        assert!(decision.is_blocked());
        assert_eq!(description(&decision), MISSING_TENANT_ID);
    }

    #[test]
    fn test_positional_and_named_binds() {
        let sql = "UPDATE orders SET name = ? WHERE tenant_id = ?";
        let allowed = BoundParameters::from_positional(["x", "A"]);
        assert!(!check(sql, &allowed, &ctx("A")).is_blocked());
        let denied = BoundParameters::from_positional(["x", "B"]);
        assert!(check(sql, &denied, &ctx("A")).is_blocked());

        let sql = "DELETE FROM orders WHERE tenant_id = :tenant";
        let named = BoundParameters::from_named([("tenant", "A")]);
        assert!(!check(sql, &named, &ctx("A")).is_blocked());
    }

    #[test]
    fn test_unresolved_placeholder_blocks() {
        let decision = check(
            "SELECT * FROM orders WHERE tenant_id = $1",
            &BoundParameters::new(),
            &ctx("A"),
        );
        assert!(decision.is_blocked());
        assert_eq!(
            description(&decision),
            "query on table 'orders' filters 'tenant_id' but no value bound for placeholder ?1"
        );
    }

    #[test]
    fn test_deferred_bind() {
        let mut bound = BoundParameters::new();
        let slot = bound.bind_deferred_positional(1);
        let sql = "SELECT * FROM orders WHERE tenant_id = ?";

        slot.set("A");
        assert!(!check(sql, &bound, &ctx("A")).is_blocked());
        slot.set("B");
        assert!(check(sql, &bound, &ctx("A")).is_blocked());
    }

    #[test]
    fn test_or_filter_blocks() {
        let decision = check(
            "SELECT * FROM orders WHERE tenant_id = 'A' OR 1 = 1",
            &BoundParameters::new(),
            &ctx("A"),
        );
        assert!(decision.is_blocked());
    }

    #[test]
    fn test_every_protected_table_needs_filter() {
        let none = BoundParameters::new();
        let sql = "SELECT * FROM orders o JOIN invoices i ON i.order_id = o.id \
                   WHERE o.tenant_id = 'A'";
        let decision = check(sql, &none, &ctx("A"));
        assert_eq!(decision.metadata.table.as_deref(), Some("invoices"));

        let sql = "SELECT * FROM orders o JOIN invoices i ON i.order_id = o.id \
                   WHERE o.tenant_id = 'A' AND i.tenant_id = 'A'";
        assert!(!check(sql, &none, &ctx("A")).is_blocked());

        let sql = "SELECT * FROM orders o JOIN users u ON u.id = o.user_id WHERE o.tenant_id = 'A'";
        assert!(!check(sql, &none, &ctx("A")).is_blocked());
    }

    #[test]
    fn test_union_branch_without_filter() {
        let decision = check(
            "SELECT id FROM orders WHERE tenant_id = 'A' UNION SELECT id FROM invoices",
            &BoundParameters::new(),
            &ctx("A"),
        );
        assert_eq!(decision.metadata.table.as_deref(), Some("invoices"));
    }

    #[test]
    fn test_subquery_without_filter() {
        let decision = check(
            "SELECT * FROM users WHERE id IN (SELECT user_id FROM orders)",
            &BoundParameters::new(),
            &ctx("A"),
        );
        assert_eq!(decision.metadata.table.as_deref(), Some("orders"));
    }

    #[test]
    fn test_insert() {
        let none = BoundParameters::new();
        assert!(
            !check(
                "INSERT INTO orders (name, tenant_id) VALUES ('a', 'A'), ('b', 'A')",
                &none,
                &ctx("A")
            )
            .is_blocked()
        );

        let decision = check(
            "INSERT INTO orders (name, tenant_id) VALUES ('a', 'A'), ('b', 'B')",
            &none,
            &ctx("A"),
        );
        assert_eq!(
            description(&decision),
            "INSERT on table 'orders' sets 'tenant_id' to 'B' but tenant ID is 'A'"
        );

        let decision = check("INSERT INTO orders (name) VALUES ('a')", &none, &ctx("A"));
        assert_eq!(
            description(&decision),
            "INSERT on table 'orders' is missing column 'tenant_id'"
        );

        let bound = BoundParameters::from_positional(["a", "A"]);
        assert!(
            !check(
                "INSERT INTO orders (name, tenant_id) VALUES (?, ?)",
                &bound,
                &ctx("A")
            )
            .is_blocked()
        );
    }

    #[test]
    fn test_insert_select_blocks() {
        let decision = check(
            "INSERT INTO orders (name, tenant_id) SELECT name, tenant_id FROM drafts",
            &BoundParameters::new(),
            &ctx("A"),
        );
        assert!(decision.is_blocked());
    }

    #[test]
    fn test_ddl_and_transactions_allowed() {
        let none = BoundParameters::new();
        let no_tenant = RequestContext::default();
        for sql in [
            "CREATE TABLE orders (id INT, tenant_id TEXT)",
            "ALTER TABLE orders ADD COLUMN note TEXT",
            "DROP TABLE orders",
            "TRUNCATE TABLE orders",
            "BEGIN",
            "COMMIT",
            "ROLLBACK",
        ] {
            assert!(!check(sql, &none, &no_tenant).is_blocked(), "{sql} should be allowed");
        }
    }

    #[test]
    fn test_parse_failure_blocks() {
        let decision = check("SELEC * FORM orders", &BoundParameters::new(), &ctx("A"));
        assert!(decision.is_blocked());
        assert!(description(&decision).starts_with("failed to analyze SQL query"));
    }

    #[test]
    fn test_idor_disabled_scope() {
        let mut ctx = ctx("A");
        let sql = "SELECT * FROM orders";
        let none = BoundParameters::new();

        let inside = ctx.with_idor_disabled(|ctx| check(sql, &none, ctx));
        assert!(!inside.is_blocked());
        assert!(check(sql, &none, &ctx).is_blocked());
    }

    #[test]
    fn test_model_built_by_hand() {
        let mut model = StatementModel::new(StatementKind::Delete);
        model.tables.push(TableRef::new("orders", None));
        model.where_predicates.push(WherePredicate {
            qualifier: None,
            column: "tenant_id".to_string(),
            value: ValueRef::Named("t".to_string()),
        });
        let analyzer = TenantIsolationAnalyzer::default();

        let bound = BoundParameters::from_named([("t", "A")]);
        assert!(!analyzer.check(&model, &bound, &ctx("A"), &policy()).is_blocked());

        let bound = BoundParameters::from_named([("t", "B")]);
        assert!(analyzer.check(&model, &bound, &ctx("A"), &policy()).is_blocked());
    }
}
