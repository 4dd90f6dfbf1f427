//! Scoped catalog query building.

use crate::core::session::{RowSet, Session};
use crate::core::SqlValue;
use crate::error::{MigrateError, Result};

use super::scope::InspectionScope;

/// Builds a `SELECT` over a vendor catalog view with scope filters.
///
/// Filters containing `%` or `_` become `LIKE ?` conditions, anything else an
/// exact `= ?`. Bind values are collected in condition order.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    select: String,
    from: String,
    conditions: Vec<String>,
    params: Vec<SqlValue>,
    order_by: Vec<String>,
}

impl QueryBuilder {
    pub fn new(select: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            select: select.into(),
            from: from.into(),
            conditions: Vec::new(),
            params: Vec::new(),
            order_by: Vec::new(),
        }
    }

    /// Add a name filter on `column`; `None` adds nothing.
    pub fn filter(mut self, column: &str, value: Option<&str>) -> Self {
        if let Some(value) = value {
            let op = if InspectionScope::has_wildcards(value) {
                "LIKE"
            } else {
                "="
            };
            self.conditions.push(format!("{} {} ?", column, op));
            self.params.push(SqlValue::from(value));
        }
        self
    }

    /// Add a literal condition.
    pub fn condition(mut self, condition: impl Into<String>) -> Self {
        self.conditions.push(condition.into());
        self
    }

    /// Add a condition with its own bind values.
    pub fn condition_with(mut self, condition: impl Into<String>, params: Vec<SqlValue>) -> Self {
        self.conditions.push(condition.into());
        self.params.extend(params);
        self
    }

    pub fn order_by(mut self, column: impl Into<String>) -> Self {
        self.order_by.push(column.into());
        self
    }

    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }

    pub fn sql(&self) -> String {
        let mut sql = format!("SELECT {} FROM {}", self.select, self.from);
        if !self.conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.conditions.join(" AND "));
        }
        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by.join(", "));
        }
        sql
    }

    /// Run the query on `session`.
    pub async fn execute(&self, session: &mut dyn Session) -> Result<RowSet> {
        let sql = self.sql();
        session
            .query(&sql, &self.params)
            .await
            .map_err(|e| MigrateError::query(e, sql))
    }
}
