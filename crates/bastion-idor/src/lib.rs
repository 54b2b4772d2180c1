//! # bastion-idor
//!
//! Tenant isolation (IDOR) checks for outgoing SQL statements.
//!
//! ## How it works
//!
//! 1. [`SqlAnalyzer`] parses SQL into [`StatementModel`]s: statement kind,
//!    tables, `WHERE` equalities and `INSERT` values.
//! 2. [`BoundParameters`] collects the values bound to placeholders.
//! 3. [`TenantIsolationAnalyzer`] verifies that every protected table is
//!    scoped to the tenant of the [`RequestContext`](bastion_core::RequestContext).
//!
//! ## Supported Statements
//!
//! | Statement | Requirement on a protected table |
//! |-----------|----------------------------------|
//! | `SELECT`  | `WHERE tenant_column = <tenant>` |
//! | `UPDATE`  | `WHERE tenant_column = <tenant>` |
//! | `DELETE`  | `WHERE tenant_column = <tenant>` |
//! | `INSERT`  | tenant column listed, every row set to `<tenant>` |
//! | `JOIN`    | every joined protected table filtered (qualified) |
//! | DDL, `BEGIN`/`COMMIT`/`ROLLBACK` | none |
//!
//! ## Example
//!
//! ```text
//! Policy:  tenant_id on [orders]
//! Tenant:  "A"
//!
//! UPDATE orders SET name = ? WHERE tenant_id = ?   with ["x", "A"]  -> allow
//! UPDATE orders SET name = ? WHERE tenant_id = ?   with ["x", "B"]  -> block
//! SELECT * FROM orders                                              -> block
//! SELECT * FROM users                                               -> allow
//! ```

pub mod analyzer;
pub mod bindings;
pub mod error;
pub mod parser;
pub mod policy;

pub use analyzer::TenantIsolationAnalyzer;
pub use bindings::{BoundParameters, DeferredSlot, ParamValue};
pub use error::IdorError;
pub use parser::{
    InsertRow, SqlAnalyzer, StatementKind, StatementModel, TableRef, ValueRef, WherePredicate,
};
pub use policy::{IdorPolicy, IdorPolicyStore};
