//! Row counting strategies.
//!
//! EXACT counts are always a `COUNT` aggregate. APPROX counts read vendor
//! statistics: an `EXPLAIN` estimate, `ALL_TABLES.NUM_ROWS` or
//! `sys.partitions`. Dialects declare which combinations they support and
//! refuse the rest with `MigrateError::UnsupportedRowCount` before any SQL
//! runs.

use std::fmt;
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use crate::core::schema::TableRef;
use crate::core::session::{Row, Session};
use crate::core::{Identifier, SqlValue};
use crate::error::{MigrateError, Result};

/// Count semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowCountType {
    /// A real `COUNT` aggregate.
    Exact,
    /// A statistics-based estimate.
    Approx,
}

impl fmt::Display for RowCountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowCountType::Exact => write!(f, "EXACT"),
            RowCountType::Approx => write!(f, "APPROX"),
        }
    }
}

/// What to count: a table, optionally non-null values of a column, optionally
/// filtered.
#[derive(Debug, Clone, PartialEq)]
pub struct RowCountRequest {
    pub table: TableRef,
    pub column: Option<Identifier>,
    pub filter: Option<String>,
    pub kind: RowCountType,
}

impl RowCountRequest {
    pub fn new(table: TableRef, kind: RowCountType) -> Self {
        Self {
            table,
            column: None,
            filter: None,
            kind,
        }
    }

    pub fn column(mut self, column: Identifier) -> Self {
        self.column = Some(column);
        self
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }
}

/// A prepared counting statement and the logic to read its result.
#[async_trait]
pub trait RowCountHandler: Send + Sync + fmt::Debug {
    fn row_count_type(&self) -> RowCountType;

    fn row_count_query(&self) -> &str;

    fn parameters(&self) -> Vec<SqlValue> {
        Vec::new()
    }

    /// Extract the count from one result row, `None` if this row has none.
    fn read_row_count(&self, row: &Row) -> Option<i64>;

    /// Run the statement and return the first count found. `None` means the
    /// server had no figure (e.g. statistics never gathered).
    async fn row_count(&self, session: &mut dyn Session) -> Result<Option<i64>> {
        let mut rows = session
            .query(self.row_count_query(), &self.parameters())
            .await
            .map_err(|e| MigrateError::query(e, format!("counting rows: {}", self.row_count_query())))?;
        while let Some(row) = rows.next().await? {
            if let Some(count) = self.read_row_count(&row) {
                debug!("{} row count {}", self.row_count_type(), count);
                return Ok(Some(count));
            }
        }
        Ok(None)
    }
}

/// Append `WHERE (filter) [AND column IS NOT NULL]`. Blank filters are
/// ignored.
fn with_conditions(mut sql: String, filter: Option<&str>, not_null: Option<&str>) -> String {
    let mut conditions = Vec::with_capacity(2);
    if let Some(filter) = filter.map(str::trim).filter(|f| !f.is_empty()) {
        conditions.push(format!("({})", filter));
    }
    if let Some(column) = not_null {
        conditions.push(format!("{} IS NOT NULL", column));
    }
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    sql
}

/// `SELECT COUNT(*|column) FROM table [WHERE filter]`.
#[derive(Debug, Clone)]
pub struct ExactRowCountHandler {
    sql: String,
}

impl ExactRowCountHandler {
    /// `table` and `column` must already be rendered as identifiers.
    pub fn new(table: String, column: Option<String>, filter: Option<String>) -> Self {
        let target = column.as_deref().unwrap_or("*");
        let sql = with_conditions(
            format!("SELECT COUNT({}) FROM {}", target, table),
            filter.as_deref(),
            None,
        );
        Self { sql }
    }
}

#[async_trait]
impl RowCountHandler for ExactRowCountHandler {
    fn row_count_type(&self) -> RowCountType {
        RowCountType::Exact
    }

    fn row_count_query(&self) -> &str {
        &self.sql
    }

    fn read_row_count(&self, row: &Row) -> Option<i64> {
        row.value_at(0).and_then(SqlValue::as_i64)
    }
}

/// Estimate taken from an `EXPLAIN` plan.
///
/// MySQL returns a tabular plan with a `rows` column; PostgreSQL returns plan
/// text whose first line carries `rows=N`.
#[derive(Debug, Clone)]
pub struct ExplainRowCountHandler {
    sql: String,
    format: ExplainFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExplainFormat {
    RowsColumn,
    PlanText,
}

impl ExplainRowCountHandler {
    /// MySQL `EXPLAIN`: the estimate is the `rows` column.
    pub fn mysql(table: String, column: Option<String>, filter: Option<String>) -> Self {
        Self {
            sql: Self::explain(table, column, filter),
            format: ExplainFormat::RowsColumn,
        }
    }

    /// PostgreSQL `EXPLAIN`: the estimate is `rows=N` in the plan text.
    pub fn postgres(table: String, column: Option<String>, filter: Option<String>) -> Self {
        Self {
            sql: Self::explain(table, column, filter),
            format: ExplainFormat::PlanText,
        }
    }

    fn explain(table: String, column: Option<String>, filter: Option<String>) -> String {
        let projection = column.as_deref().unwrap_or("*");
        with_conditions(
            format!("EXPLAIN SELECT {} FROM {}", projection, table),
            filter.as_deref(),
            column.as_deref(),
        )
    }
}

/// Parse the `rows=N` estimate out of a PostgreSQL plan line.
pub fn parse_plan_rows(plan: &str) -> Option<i64> {
    static ROWS_RE: OnceLock<Regex> = OnceLock::new();
    let re = ROWS_RE.get_or_init(|| Regex::new(r"rows=(\d+)").expect("valid plan rows regex"));
    re.captures(plan)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[async_trait]
impl RowCountHandler for ExplainRowCountHandler {
    fn row_count_type(&self) -> RowCountType {
        RowCountType::Approx
    }

    fn row_count_query(&self) -> &str {
        &self.sql
    }

    fn read_row_count(&self, row: &Row) -> Option<i64> {
        match self.format {
            ExplainFormat::RowsColumn => row.int("rows"),
            ExplainFormat::PlanText => row
                .value_at(0)
                .and_then(SqlValue::to_text)
                .and_then(|plan| parse_plan_rows(&plan)),
        }
    }
}

/// Estimate read from a statistics catalog with bound name parameters.
#[derive(Debug, Clone)]
pub struct CatalogRowCountHandler {
    sql: String,
    params: Vec<SqlValue>,
}

impl CatalogRowCountHandler {
    /// Oracle: `ALL_TABLES.NUM_ROWS` by owner and table name.
    pub fn oracle(table: &TableRef) -> Self {
        let mut sql = String::from("SELECT NUM_ROWS FROM ALL_TABLES WHERE TABLE_NAME = ?");
        let mut params = vec![SqlValue::from(table.table.value())];
        if !table.schema.is_empty() {
            sql.push_str(" AND OWNER = ?");
            params.push(SqlValue::from(table.schema.value()));
        }
        Self { sql, params }
    }

    /// SQL Server: heap or clustered index partition row totals.
    pub fn sql_server(qualified_name: String) -> Self {
        Self {
            sql: "SELECT SUM(p.rows) AS NUM_ROWS FROM sys.partitions p \
                  WHERE p.object_id = OBJECT_ID(?) AND p.index_id IN (0, 1)"
                .to_string(),
            params: vec![SqlValue::Text(qualified_name)],
        }
    }
}

#[async_trait]
impl RowCountHandler for CatalogRowCountHandler {
    fn row_count_type(&self) -> RowCountType {
        RowCountType::Approx
    }

    fn row_count_query(&self) -> &str {
        &self.sql
    }

    fn parameters(&self) -> Vec<SqlValue> {
        self.params.clone()
    }

    fn read_row_count(&self, row: &Row) -> Option<i64> {
        row.value_at(0).and_then(SqlValue::as_i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn row(columns: &[&str], values: Vec<SqlValue>) -> Row {
        let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        Row::new(Arc::from(columns), values)
    }

    #[test]
    fn test_exact_count_query() {
        let handler = ExactRowCountHandler::new("sales.orders".into(), None, None);
        assert_eq!(handler.row_count_query(), "SELECT COUNT(*) FROM sales.orders");

        let filtered = ExactRowCountHandler::new(
            "sales.orders".into(),
            Some("shipped_at".into()),
            Some("total > 10".into()),
        );
        assert_eq!(
            filtered.row_count_query(),
            "SELECT COUNT(shipped_at) FROM sales.orders WHERE (total > 10)"
        );
        assert_eq!(filtered.read_row_count(&row(&["COUNT"], vec![SqlValue::Int(42)])), Some(42));
    }

    #[test]
    fn test_postgres_plan_parsing() {
        assert_eq!(
            parse_plan_rows("Seq Scan on orders  (cost=0.00..35.50 rows=2550 width=4)"),
            Some(2550)
        );
        assert_eq!(parse_plan_rows("Result  (cost=0.00..0.01)"), None);

        let handler = ExplainRowCountHandler::postgres("orders".into(), None, Some("id > 3".into()));
        assert_eq!(handler.row_count_query(), "EXPLAIN SELECT * FROM orders WHERE (id > 3)");
        let plan = row(
            &["QUERY PLAN"],
            vec![SqlValue::Text("Seq Scan on orders  (cost=0.00..1.10 rows=7 width=4)".into())],
        );
        assert_eq!(handler.read_row_count(&plan), Some(7));
    }

    #[test]
    fn test_mysql_explain_reads_rows_column() {
        let handler = ExplainRowCountHandler::mysql("`shop`.`orders`".into(), Some("`note`".into()), None);
        assert_eq!(
            handler.row_count_query(),
            "EXPLAIN SELECT `note` FROM `shop`.`orders` WHERE `note` IS NOT NULL"
        );
        let explain = row(&["id", "table", "rows"], vec![SqlValue::Int(1), "orders".into(), SqlValue::Int(120)]);
        assert_eq!(handler.read_row_count(&explain), Some(120));
    }

    #[test]
    fn test_filter_grouped_before_not_null_condition() {
        let handler = ExplainRowCountHandler::postgres(
            "t".into(),
            Some("c".into()),
            Some("a = 1 OR b = 2".into()),
        );
        assert_eq!(
            handler.row_count_query(),
            "EXPLAIN SELECT c FROM t WHERE (a = 1 OR b = 2) AND c IS NOT NULL"
        );

        let exact = ExactRowCountHandler::new("t".into(), None, Some("a = 1 OR b = 2".into()));
        assert_eq!(exact.row_count_query(), "SELECT COUNT(*) FROM t WHERE (a = 1 OR b = 2)");
    }

    #[test]
    fn test_blank_filter_ignored() {
        let handler = ExplainRowCountHandler::mysql("t".into(), Some("c".into()), Some("  ".into()));
        assert_eq!(handler.row_count_query(), "EXPLAIN SELECT c FROM t WHERE c IS NOT NULL");

        let exact = ExactRowCountHandler::new("t".into(), None, Some(String::new()));
        assert_eq!(exact.row_count_query(), "SELECT COUNT(*) FROM t");
    }

    #[test]
    fn test_oracle_statistics_query() {
        let table = TableRef::new(Identifier::EMPTY, Identifier::new("HR"), Identifier::new("EMPLOYEES"));
        let handler = CatalogRowCountHandler::oracle(&table);
        assert_eq!(
            handler.row_count_query(),
            "SELECT NUM_ROWS FROM ALL_TABLES WHERE TABLE_NAME = ? AND OWNER = ?"
        );
        assert_eq!(
            handler.parameters(),
            vec![SqlValue::Text("EMPLOYEES".into()), SqlValue::Text("HR".into())]
        );
        assert_eq!(handler.read_row_count(&row(&["NUM_ROWS"], vec![SqlValue::Null])), None);
    }
}
