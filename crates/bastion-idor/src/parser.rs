//! SQL parsing into the minimal statement model used for tenant checks.
//!
//! Only the structure the tenant check needs is extracted: statement kind,
//! referenced tables, equality predicates of the top-level `WHERE`
//! conjunction and the column/value lists of `INSERT`.

use std::fmt;

use bastion_core::SqlDialectKind;
use sqlparser::ast::{
    BinaryOperator, Expr, FromTable, Insert, ObjectName, Query, Select, SelectItem, SetExpr,
    Statement, TableFactor, TableWithJoins, UnaryOperator, Value,
};
use sqlparser::dialect::{Dialect, GenericDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect};
use sqlparser::parser::Parser;
use sqlparser::tokenizer::{Token, Tokenizer};

use crate::error::IdorError;

/// Types of SQL statements, as far as tenant checks are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Ddl,
    TransactionControl,
    /// `SET`, `SHOW`, `EXPLAIN` and the like.
    Other,
}

impl StatementKind {
    /// Whether statements of this kind carry row-level data to verify.
    pub fn is_checked(self) -> bool {
        matches!(self, Self::Select | Self::Insert | Self::Update | Self::Delete)
    }
}

/// A table referenced by a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    /// Lower-cased table name without schema prefix.
    pub name: String,
    pub alias: Option<String>,
}

impl TableRef {
    pub fn new(name: impl Into<String>, alias: Option<String>) -> Self {
        Self {
            name: name.into(),
            alias,
        }
    }

    /// Whether a column qualifier (`o` in `o.tenant_id`) refers to this table.
    pub fn answers_to(&self, qualifier: &str) -> bool {
        match &self.alias {
            Some(alias) => alias == qualifier,
            None => self.name == qualifier,
        }
    }
}

/// The value side of an equality predicate or an INSERT cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueRef {
    Literal(String),
    /// 1-based position of a `?`, `?N` or `$N` placeholder.
    Positional(usize),
    /// Name of a `:name` placeholder, without the prefix.
    Named(String),
}

impl ValueRef {
    /// Interpret a placeholder token as produced by the tokenizer.
    pub fn from_placeholder(placeholder: &str) -> Option<Self> {
        let mut chars = placeholder.chars();
        let prefix = chars.next()?;
        let rest = chars.as_str();
        if rest.is_empty() {
            return None;
        }
        match prefix {
            '?' | '$' if rest.bytes().all(|b| b.is_ascii_digit()) => rest
                .parse::<usize>()
                .ok()
                .filter(|index| *index > 0)
                .map(Self::Positional),
            ':' | '@' | '$' => Some(Self::Named(rest.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for ValueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => write!(f, "'{value}'"),
            Self::Positional(index) => write!(f, "?{index}"),
            Self::Named(name) => write!(f, ":{name}"),
        }
    }
}

/// `[qualifier.]column = value` taken from the top-level `WHERE` conjunction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WherePredicate {
    pub qualifier: Option<String>,
    pub column: String,
    pub value: ValueRef,
}

/// One `VALUES` row. `None` marks a cell that is not a literal or placeholder.
pub type InsertRow = Vec<Option<ValueRef>>;

/// Minimal model of one statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementModel {
    pub kind: StatementKind,
    pub tables: Vec<TableRef>,
    pub where_predicates: Vec<WherePredicate>,
    pub insert_columns: Vec<String>,
    pub insert_rows: Vec<InsertRow>,
    /// `INSERT ... SELECT`: the inserted values come from a query.
    pub insert_from_query: bool,
}

impl StatementModel {
    pub fn new(kind: StatementKind) -> Self {
        Self {
            kind,
            tables: Vec::new(),
            where_predicates: Vec::new(),
            insert_columns: Vec::new(),
            insert_rows: Vec::new(),
            insert_from_query: false,
        }
    }

    /// Values compared against `column` for `table`.
    ///
    /// Unqualified predicates only count when the statement references a
    /// single table, otherwise it is ambiguous which table they filter.
    pub fn predicates_for<'a>(
        &'a self,
        table: &'a TableRef,
        column: &'a str,
    ) -> impl Iterator<Item = &'a ValueRef> + 'a {
        let single_table = self.tables.len() == 1;
        self.where_predicates
            .iter()
            .filter(move |p| p.column == column)
            .filter(move |p| match &p.qualifier {
                Some(qualifier) => table.answers_to(qualifier),
                None => single_table,
            })
            .map(|p| &p.value)
    }

    /// Position of `column` in the INSERT column list.
    pub fn insert_column_index(&self, column: &str) -> Option<usize> {
        self.insert_columns.iter().position(|c| c == column)
    }
}

/// Parses SQL text into [`StatementModel`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlAnalyzer {
    dialect: SqlDialectKind,
}

impl SqlAnalyzer {
    pub fn new(dialect: SqlDialectKind) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> SqlDialectKind {
        self.dialect
    }

    fn sql_dialect(&self) -> Box<dyn Dialect> {
        match self.dialect {
            SqlDialectKind::Generic => Box::new(GenericDialect),
            SqlDialectKind::MySql => Box::new(MySqlDialect {}),
            SqlDialectKind::Postgres => Box::new(PostgreSqlDialect {}),
            SqlDialectKind::Sqlite => Box::new(SQLiteDialect {}),
        }
    }

    /// Parse a SQL string into statement models.
    ///
    /// A single statement can yield several models: every `UNION` branch,
    /// derived table, CTE and subquery is modelled separately and checked on
    /// its own.
    pub fn analyze(&self, sql: &str) -> Result<Vec<StatementModel>, IdorError> {
        let dialect = self.sql_dialect();
        let tokens = Tokenizer::new(dialect.as_ref(), sql)
            .tokenize()
            .map_err(|e| IdorError::ParseError(e.to_string()))?;
        let statements = Parser::new(dialect.as_ref())
            .with_tokens(number_placeholders(tokens))
            .parse_statements()
            .map_err(|e| IdorError::ParseError(e.to_string()))?;

        let mut models = Vec::new();
        for statement in &statements {
            self.visit_statement(statement, &mut models)?;
        }
        Ok(models)
    }

    fn visit_statement(
        &self,
        stmt: &Statement,
        models: &mut Vec<StatementModel>,
    ) -> Result<(), IdorError> {
        match stmt {
            Statement::Query(query) => self.visit_query(query, models),
            Statement::Insert(insert) => self.visit_insert(insert, models),
            Statement::Update {
                table,
                from,
                selection,
                ..
            } => {
                let mut model = StatementModel::new(StatementKind::Update);
                let mut nested = Vec::new();
                self.visit_table_with_joins(table, &mut model.tables, &mut nested);
                if let Some(from) = from {
                    self.visit_table_with_joins(from, &mut model.tables, &mut nested);
                }
                if let Some(selection) = selection {
                    collect_predicates(selection, &mut model.where_predicates);
                    self.visit_subqueries(selection, &mut nested);
                }
                models.push(model);
                models.append(&mut nested);
            }
            Statement::Delete(delete) => {
                let mut model = StatementModel::new(StatementKind::Delete);
                let mut nested = Vec::new();
                let from = match &delete.from {
                    FromTable::WithFromKeyword(tables) | FromTable::WithoutKeyword(tables) => tables,
                };
                for table_with_joins in from.iter().chain(delete.using.iter().flatten()) {
                    self.visit_table_with_joins(table_with_joins, &mut model.tables, &mut nested);
                }
                if let Some(selection) = &delete.selection {
                    collect_predicates(selection, &mut model.where_predicates);
                    self.visit_subqueries(selection, &mut nested);
                }
                models.push(model);
                models.append(&mut nested);
            }
            Statement::Merge { .. } => {
                return Err(IdorError::UnsupportedStatement("MERGE".to_string()));
            }
            Statement::Copy { .. } => {
                return Err(IdorError::UnsupportedStatement("COPY".to_string()));
            }
            _ if is_ddl(stmt) => models.push(StatementModel::new(StatementKind::Ddl)),
            _ if is_transaction_control(stmt) => {
                models.push(StatementModel::new(StatementKind::TransactionControl))
            }
            _ => models.push(StatementModel::new(StatementKind::Other)),
        }
        Ok(())
    }

    fn visit_query(&self, query: &Query, models: &mut Vec<StatementModel>) {
        if let Some(with) = &query.with {
            for cte in &with.cte_tables {
                self.visit_query(&cte.query, models);
            }
        }
        self.visit_set_expr(&query.body, models);
    }

    fn visit_set_expr(&self, body: &SetExpr, models: &mut Vec<StatementModel>) {
        match body {
            SetExpr::Select(select) => self.visit_select(select, models),
            SetExpr::Query(query) => self.visit_query(query, models),
            SetExpr::SetOperation { left, right, .. } => {
                self.visit_set_expr(left, models);
                self.visit_set_expr(right, models);
            }
            _ => {}
        }
    }

    fn visit_select(&self, select: &Select, models: &mut Vec<StatementModel>) {
        let mut model = StatementModel::new(StatementKind::Select);
        let mut nested = Vec::new();
        for table_with_joins in &select.from {
            self.visit_table_with_joins(table_with_joins, &mut model.tables, &mut nested);
        }
        if let Some(selection) = &select.selection {
            collect_predicates(selection, &mut model.where_predicates);
            self.visit_subqueries(selection, &mut nested);
        }
        for item in &select.projection {
            if let SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } = item {
                self.visit_subqueries(expr, &mut nested);
            }
        }
        models.push(model);
        models.append(&mut nested);
    }

    fn visit_insert(&self, insert: &Insert, models: &mut Vec<StatementModel>) {
        let mut model = StatementModel::new(StatementKind::Insert);
        let mut nested = Vec::new();
        model.tables.push(TableRef::new(
            table_name(&insert.table_name),
            insert.table_alias.as_ref().map(|a| a.value.to_lowercase()),
        ));
        model.insert_columns = insert
            .columns
            .iter()
            .map(|c| c.value.to_lowercase())
            .collect();

        if let Some(source) = insert.source.as_deref() {
            match source.body.as_ref() {
                SetExpr::Values(values) => {
                    model.insert_rows = values
                        .rows
                        .iter()
                        .map(|row| row.iter().map(value_ref).collect())
                        .collect();
                }
                _ => {
                    model.insert_from_query = true;
                    self.visit_query(source, &mut nested);
                }
            }
        }

        models.push(model);
        models.append(&mut nested);
    }

    fn visit_table_with_joins(
        &self,
        table_with_joins: &TableWithJoins,
        tables: &mut Vec<TableRef>,
        nested: &mut Vec<StatementModel>,
    ) {
        self.visit_table_factor(&table_with_joins.relation, tables, nested);
        for join in &table_with_joins.joins {
            self.visit_table_factor(&join.relation, tables, nested);
        }
    }

    fn visit_table_factor(
        &self,
        table_factor: &TableFactor,
        tables: &mut Vec<TableRef>,
        nested: &mut Vec<StatementModel>,
    ) {
        match table_factor {
            TableFactor::Table { name, alias, .. } => tables.push(TableRef::new(
                table_name(name),
                alias.as_ref().map(|a| a.name.value.to_lowercase()),
            )),
            TableFactor::Derived { subquery, .. } => self.visit_query(subquery, nested),
            TableFactor::NestedJoin {
                table_with_joins, ..
            } => self.visit_table_with_joins(table_with_joins, tables, nested),
            _ => {}
        }
    }

    /// Collect models for every subquery nested anywhere in `expr`.
    fn visit_subqueries(&self, expr: &Expr, nested: &mut Vec<StatementModel>) {
        match expr {
            Expr::Subquery(query) | Expr::Exists { subquery: query, .. } => {
                self.visit_query(query, nested)
            }
            Expr::InSubquery { expr, subquery, .. } => {
                self.visit_subqueries(expr, nested);
                self.visit_query(subquery, nested);
            }
            Expr::BinaryOp { left, right, .. } => {
                self.visit_subqueries(left, nested);
                self.visit_subqueries(right, nested);
            }
            Expr::UnaryOp { expr, .. }
            | Expr::Nested(expr)
            | Expr::IsNull(expr)
            | Expr::IsNotNull(expr)
            | Expr::Cast { expr, .. } => self.visit_subqueries(expr, nested),
            Expr::InList { expr, list, .. } => {
                self.visit_subqueries(expr, nested);
                for item in list {
                    self.visit_subqueries(item, nested);
                }
            }
            Expr::Between {
                expr, low, high, ..
            } => {
                self.visit_subqueries(expr, nested);
                self.visit_subqueries(low, nested);
                self.visit_subqueries(high, nested);
            }
            _ => {}
        }
    }
}

/// Number bare `?` markers 1-based in textual order so that positions match
/// the order in which a driver binds them.
fn number_placeholders(tokens: Vec<Token>) -> Vec<Token> {
    let mut next = 0;
    tokens
        .into_iter()
        .map(|token| match token {
            Token::Placeholder(p) if p == "?" => {
                next += 1;
                Token::Placeholder(format!("?{next}"))
            }
            other => other,
        })
        .collect()
}

fn table_name(name: &ObjectName) -> String {
    name.0
        .last()
        .map(|ident| ident.value.to_lowercase())
        .unwrap_or_default()
}

/// Walk the `AND` chain of a `WHERE` clause and collect its equalities.
/// Anything under `OR` or `NOT` is ignored.
fn collect_predicates(expr: &Expr, predicates: &mut Vec<WherePredicate>) {
    match expr {
        Expr::BinaryOp {
            left,
            op: BinaryOperator::And,
            right,
        } => {
            collect_predicates(left, predicates);
            collect_predicates(right, predicates);
        }
        Expr::Nested(inner) => collect_predicates(inner, predicates),
        Expr::BinaryOp {
            left,
            op: BinaryOperator::Eq,
            right,
        } => {
            if let Some(predicate) = equality(left, right).or_else(|| equality(right, left)) {
                predicates.push(predicate);
            }
        }
        _ => {}
    }
}

fn equality(column: &Expr, value: &Expr) -> Option<WherePredicate> {
    let (qualifier, column) = column_ref(column)?;
    let value = value_ref(value)?;
    Some(WherePredicate {
        qualifier,
        column,
        value,
    })
}

fn column_ref(expr: &Expr) -> Option<(Option<String>, String)> {
    match expr {
        Expr::Identifier(ident) => Some((None, ident.value.to_lowercase())),
        Expr::CompoundIdentifier(parts) => {
            let (column, rest) = parts.split_last()?;
            Some((
                rest.last().map(|q| q.value.to_lowercase()),
                column.value.to_lowercase(),
            ))
        }
        Expr::Nested(inner) => column_ref(inner),
        _ => None,
    }
}

fn value_ref(expr: &Expr) -> Option<ValueRef> {
    match expr {
        Expr::Value(value) => match value {
            Value::Number(n, _) => Some(ValueRef::Literal(n.clone())),
            Value::SingleQuotedString(s)
            | Value::DoubleQuotedString(s)
            | Value::NationalStringLiteral(s)
            | Value::EscapedStringLiteral(s) => Some(ValueRef::Literal(s.clone())),
            Value::Boolean(b) => Some(ValueRef::Literal(b.to_string())),
            Value::Placeholder(p) => ValueRef::from_placeholder(p),
            // NULL never equals a tenant id
            _ => None,
        },
        Expr::Nested(inner) | Expr::Cast { expr: inner, .. } => value_ref(inner),
        Expr::UnaryOp {
            op: UnaryOperator::Minus,
            expr,
        } => match value_ref(expr)? {
            ValueRef::Literal(v) => Some(ValueRef::Literal(format!("-{v}"))),
            _ => None,
        },
        _ => None,
    }
}

fn is_ddl(stmt: &Statement) -> bool {
    matches!(
        stmt,
        Statement::CreateTable { .. }
            | Statement::AlterTable { .. }
            | Statement::Drop { .. }
            | Statement::Truncate { .. }
            | Statement::CreateIndex { .. }
            | Statement::AlterIndex { .. }
            | Statement::CreateView { .. }
            | Statement::AlterView { .. }
            | Statement::CreateSchema { .. }
            | Statement::CreateDatabase { .. }
            | Statement::CreateSequence { .. }
            | Statement::DropFunction { .. }
    )
}

fn is_transaction_control(stmt: &Statement) -> bool {
    matches!(
        stmt,
        Statement::StartTransaction { .. }
            | Statement::SetTransaction { .. }
            | Statement::Commit { .. }
            | Statement::Rollback { .. }
            | Statement::Savepoint { .. }
            | Statement::ReleaseSavepoint { .. }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn analyze(sql: &str) -> Vec<StatementModel> {
        SqlAnalyzer::default().analyze(sql).unwrap()
    }

    fn single(sql: &str) -> StatementModel {
        let mut models = analyze(sql);
        assert_eq!(models.len(), 1, "expected one model for {sql}");
        models.remove(0)
    }

    #[test]
    fn test_select_with_literal_filter() {
        let model = single("SELECT * FROM Orders WHERE tenant_id = 'A' AND status = 1");
        assert_eq!(model.kind, StatementKind::Select);
        assert_eq!(model.tables, vec![TableRef::new("orders", None)]);
        assert_eq!(
            model.where_predicates,
            vec![
                WherePredicate {
                    qualifier: None,
                    column: "tenant_id".to_string(),
                    value: ValueRef::Literal("A".to_string()),
                },
                WherePredicate {
                    qualifier: None,
                    column: "status".to_string(),
                    value: ValueRef::Literal("1".to_string()),
                },
            ]
        );
    }

    #[test]
    fn test_bare_placeholders_numbered_in_order() {
        let model = single("UPDATE orders SET name = ? WHERE tenant_id = ?");
        assert_eq!(model.kind, StatementKind::Update);
        let table = &model.tables[0];
        let values: Vec<_> = model.predicates_for(table, "tenant_id").collect();
        assert_eq!(values, vec![&ValueRef::Positional(2)]);
    }

    #[test]
    fn test_dollar_and_named_placeholders() {
        let model = single("DELETE FROM orders WHERE id = $2 AND tenant_id = $1");
        assert_eq!(model.kind, StatementKind::Delete);
        assert_eq!(model.where_predicates[1].value, ValueRef::Positional(1));

        let model = single("SELECT * FROM orders WHERE tenant_id = :tenant");
        assert_eq!(
            model.where_predicates[0].value,
            ValueRef::Named("tenant".to_string())
        );
    }

    #[test]
    fn test_reversed_operands() {
        let model = single("SELECT * FROM orders WHERE 'A' = tenant_id");
        assert_eq!(model.where_predicates[0].column, "tenant_id");
        assert_eq!(
            model.where_predicates[0].value,
            ValueRef::Literal("A".to_string())
        );
    }

    #[test]
    fn test_or_predicates_ignored() {
        let model = single("SELECT * FROM orders WHERE tenant_id = 'A' OR id = 5");
        assert!(model.where_predicates.is_empty());

        let model = single("SELECT * FROM orders WHERE (tenant_id = 'A') AND (id = 5 OR id = 6)");
        assert_eq!(model.where_predicates.len(), 1);
    }

    #[test]
    fn test_qualified_predicates_and_aliases() {
        let model = single(
            "SELECT o.id FROM public.orders AS o JOIN customers c ON c.id = o.customer_id \
             WHERE o.tenant_id = ?",
        );
        assert_eq!(
            model.tables,
            vec![
                TableRef::new("orders", Some("o".to_string())),
                TableRef::new("customers", Some("c".to_string())),
            ]
        );
        let orders = &model.tables[0];
        let customers = &model.tables[1];
        assert_eq!(model.predicates_for(orders, "tenant_id").count(), 1);
        assert_eq!(model.predicates_for(customers, "tenant_id").count(), 0);
    }

    #[test]
    fn test_unqualified_predicate_ambiguous_with_joins() {
        let model = single(
            "SELECT * FROM orders JOIN invoices ON invoices.order_id = orders.id WHERE tenant_id = 'A'",
        );
        for table in &model.tables {
            assert_eq!(model.predicates_for(table, "tenant_id").count(), 0);
        }
    }

    #[test]
    fn test_insert_rows() {
        let model = single("INSERT INTO orders (name, tenant_id) VALUES ('a', ?), ('b', 'A')");
        assert_eq!(model.kind, StatementKind::Insert);
        assert_eq!(model.insert_columns, vec!["name", "tenant_id"]);
        assert_eq!(model.insert_column_index("tenant_id"), Some(1));
        assert_eq!(
            model.insert_rows,
            vec![
                vec![
                    Some(ValueRef::Literal("a".to_string())),
                    Some(ValueRef::Positional(1)),
                ],
                vec![
                    Some(ValueRef::Literal("b".to_string())),
                    Some(ValueRef::Literal("A".to_string())),
                ],
            ]
        );
        assert!(!model.insert_from_query);
    }

    #[test]
    fn test_insert_select() {
        let models = analyze("INSERT INTO orders (name, tenant_id) SELECT name, tenant_id FROM drafts");
        assert_eq!(models.len(), 2);
        assert!(models[0].insert_from_query);
        assert_eq!(models[1].kind, StatementKind::Select);
        assert_eq!(models[1].tables, vec![TableRef::new("drafts", None)]);
    }

    #[test]
    fn test_union_and_subqueries_modelled_separately() {
        let models = analyze(
            "SELECT id FROM orders WHERE tenant_id = 'A' UNION SELECT id FROM invoices",
        );
        assert_eq!(models.len(), 2);
        assert_eq!(models[1].tables, vec![TableRef::new("invoices", None)]);
        assert!(models[1].where_predicates.is_empty());

        let models = analyze(
            "SELECT * FROM (SELECT * FROM orders) AS x WHERE x.id IN (SELECT order_id FROM invoices)",
        );
        let tables: Vec<_> = models
            .iter()
            .flat_map(|m| m.tables.iter().map(|t| t.name.as_str()))
            .collect();
        assert_eq!(tables, vec!["orders", "invoices"]);
    }

    #[test]
    fn test_ddl_and_transaction_control() {
        assert_eq!(
            single("CREATE TABLE orders (id INT, tenant_id TEXT)").kind,
            StatementKind::Ddl
        );
        assert_eq!(single("DROP TABLE orders").kind, StatementKind::Ddl);
        assert_eq!(single("TRUNCATE TABLE orders").kind, StatementKind::Ddl);
        assert_eq!(single("BEGIN").kind, StatementKind::TransactionControl);
        assert_eq!(single("COMMIT").kind, StatementKind::TransactionControl);
        assert_eq!(single("ROLLBACK").kind, StatementKind::TransactionControl);
    }

    #[test]
    fn test_multiple_statements() {
        let models = analyze("BEGIN; UPDATE orders SET a = 1 WHERE tenant_id = 'A'; COMMIT");
        let kinds: Vec<_> = models.iter().map(|m| m.kind).collect();
        assert_eq!(
            kinds,
            vec![
                StatementKind::TransactionControl,
                StatementKind::Update,
                StatementKind::TransactionControl,
            ]
        );
    }

    #[test]
    fn test_null_and_expressions_are_not_values() {
        let model = single("SELECT * FROM orders WHERE tenant_id = NULL AND id = other_id");
        assert!(model.where_predicates.is_empty());
    }

    #[test]
    fn test_parse_error() {
        let result = SqlAnalyzer::default().analyze("SELEC * FORM orders");
        assert!(matches!(result, Err(IdorError::ParseError(_))));
    }

    #[test]
    fn test_placeholder_forms() {
        assert_eq!(ValueRef::from_placeholder("?3"), Some(ValueRef::Positional(3)));
        assert_eq!(ValueRef::from_placeholder("$1"), Some(ValueRef::Positional(1)));
        assert_eq!(
            ValueRef::from_placeholder(":tid"),
            Some(ValueRef::Named("tid".to_string()))
        );
        assert_eq!(
            ValueRef::from_placeholder("@tid"),
            Some(ValueRef::Named("tid".to_string()))
        );
        assert_eq!(ValueRef::from_placeholder("?"), None);
        assert_eq!(ValueRef::from_placeholder("$0"), None);
    }

    #[test]
    fn test_mysql_dialect() {
        let analyzer = SqlAnalyzer::new(SqlDialectKind::MySql);
        let models = analyzer
            .analyze("SELECT * FROM `orders` WHERE `tenant_id` = \"A\"")
            .unwrap();
        assert_eq!(models[0].tables, vec![TableRef::new("orders", None)]);
        assert_eq!(
            models[0].where_predicates[0].value,
            ValueRef::Literal("A".to_string())
        );
    }
}
