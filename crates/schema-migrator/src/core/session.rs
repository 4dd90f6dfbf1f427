//! The session collaborator: connectivity is supplied by the host application.
//!
//! This crate never opens connections itself. Inspectors and translators talk
//! to a live database only through the [`Session`] trait, which exposes the
//! catalog metadata requests a JDBC-style driver offers plus plain statement
//! execution. Results come back as [`RowSet`]s over an abstract [`Cursor`].
//!
//! # Cursor lifetime
//!
//! Forward-only cursors left open block further statements on some servers, so
//! a [`RowSet`] closes its cursor when dropped. Every exit path of an inspector
//! (success, `?` propagation, early return) therefore releases the cursor. Close
//! failures during drop are logged and swallowed so they never mask the error
//! that caused the early exit.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::Result;

use super::database_info::{DatabaseInfo, DriverInfo};
use super::value::SqlValue;

/// A catalog metadata request, mirroring the driver-level metadata calls.
///
/// `*_pattern` fields accept `%` and `_` wildcards; `None` means "do not
/// narrow". Rows returned for each request use the JDBC field names listed on
/// the variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaDataRequest {
    /// Rows: `TABLE_CAT`.
    Catalogs,

    /// Rows: `TABLE_SCHEM`, `TABLE_CATALOG`.
    Schemas {
        catalog: Option<String>,
        schema_pattern: Option<String>,
    },

    /// Rows: `TABLE_CAT`, `TABLE_SCHEM`, `TABLE_NAME`, `TABLE_TYPE`, `REMARKS`.
    Tables {
        catalog: Option<String>,
        schema_pattern: Option<String>,
        table_pattern: Option<String>,
        types: Vec<String>,
    },

    /// Rows: `TABLE_CAT`, `TABLE_SCHEM`, `TABLE_NAME`, `COLUMN_NAME`,
    /// `DATA_TYPE`, `TYPE_NAME`, `COLUMN_SIZE`, `DECIMAL_DIGITS`, `NULLABLE`,
    /// `REMARKS`, `COLUMN_DEF`, `ORDINAL_POSITION` and optionally
    /// `IS_AUTOINCREMENT`.
    Columns {
        catalog: Option<String>,
        schema_pattern: Option<String>,
        table_pattern: Option<String>,
        column_pattern: Option<String>,
    },

    /// Rows: `TABLE_CAT`, `TABLE_SCHEM`, `TABLE_NAME`, `NON_UNIQUE`,
    /// `INDEX_NAME`, `TYPE`, `ORDINAL_POSITION`, `COLUMN_NAME`, `ASC_OR_DESC`,
    /// `FILTER_CONDITION`.
    IndexInfo {
        catalog: Option<String>,
        schema: Option<String>,
        table: Option<String>,
        unique: bool,
        approximate: bool,
    },

    /// Rows: `TABLE_CAT`, `TABLE_SCHEM`, `TABLE_NAME`, `COLUMN_NAME`,
    /// `KEY_SEQ`, `PK_NAME`.
    PrimaryKeys {
        catalog: Option<String>,
        schema: Option<String>,
        table: Option<String>,
    },

    /// Rows: `PKTABLE_CAT`, `PKTABLE_SCHEM`, `PKTABLE_NAME`, `PKCOLUMN_NAME`,
    /// `FKTABLE_CAT`, `FKTABLE_SCHEM`, `FKTABLE_NAME`, `FKCOLUMN_NAME`,
    /// `KEY_SEQ`, `UPDATE_RULE`, `DELETE_RULE`, `FK_NAME`, `PK_NAME`,
    /// `DEFERRABILITY`.
    ImportedKeys {
        catalog: Option<String>,
        schema: Option<String>,
        table: Option<String>,
    },
}

impl MetaDataRequest {
    /// Short name used in error context and logs.
    pub fn name(&self) -> &'static str {
        match self {
            MetaDataRequest::Catalogs => "catalogs",
            MetaDataRequest::Schemas { .. } => "schemas",
            MetaDataRequest::Tables { .. } => "tables",
            MetaDataRequest::Columns { .. } => "columns",
            MetaDataRequest::IndexInfo { .. } => "index info",
            MetaDataRequest::PrimaryKeys { .. } => "primary keys",
            MetaDataRequest::ImportedKeys { .. } => "imported keys",
        }
    }
}

/// A live database session.
///
/// Implementations wrap a single connection. The inspection and translation
/// layers use one session sequentially and never share it between tasks.
#[async_trait]
pub trait Session: Send {
    /// Product name and version of the connected server.
    fn database_info(&self) -> &DatabaseInfo;

    /// Name and version of the driver in use.
    fn driver_info(&self) -> &DriverInfo;

    /// The currently active catalog, if the server has the notion.
    async fn catalog(&mut self) -> Result<Option<String>>;

    /// Switch the active catalog.
    async fn set_catalog(&mut self, catalog: &str) -> Result<()>;

    /// Issue a catalog metadata request.
    async fn metadata(&mut self, request: &MetaDataRequest) -> Result<RowSet>;

    /// Execute a query with positional `?` parameters.
    async fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<RowSet>;

    /// Commit the current transaction.
    async fn commit(&mut self) -> Result<()>;
}

/// A forward-only result cursor.
#[async_trait]
pub trait Cursor: Send {
    /// Column labels in projection order.
    fn columns(&self) -> &[String];

    /// Advance to the next row, `None` once exhausted.
    async fn next(&mut self) -> Result<Option<Row>>;

    /// Release the cursor. Called at most once.
    fn close(&mut self) -> Result<()>;
}

/// One result row with case-insensitive access by column label.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<SqlValue>,
}

impl Row {
    pub fn new(columns: Arc<[String]>, values: Vec<SqlValue>) -> Self {
        Self { columns, values }
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.eq_ignore_ascii_case(name))
    }

    /// Whether the row carries the given column at all.
    pub fn has_column(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Raw value of a column; `None` when the column is absent.
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.index_of(name).and_then(|i| self.values.get(i))
    }

    /// Raw value by zero-based position.
    pub fn value_at(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    pub fn string(&self, name: &str) -> Option<String> {
        self.get(name).and_then(SqlValue::to_text)
    }

    /// Text value with surrounding whitespace removed; blank becomes `None`.
    pub fn trimmed(&self, name: &str) -> Option<String> {
        self.string(name)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(SqlValue::as_i64)
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(SqlValue::as_bool)
    }

    pub fn decimal(&self, name: &str) -> Option<Decimal> {
        self.get(name).and_then(SqlValue::as_decimal)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Owned result set that closes its cursor on drop.
pub struct RowSet {
    cursor: Box<dyn Cursor>,
    closed: bool,
}

impl RowSet {
    pub fn new(cursor: Box<dyn Cursor>) -> Self {
        Self {
            cursor,
            closed: false,
        }
    }

    /// Result set over rows already held in memory.
    pub fn from_rows<S: Into<String>>(columns: Vec<S>, rows: Vec<Vec<SqlValue>>) -> Self {
        Self::new(Box::new(MemoryCursor::new(columns, rows)))
    }

    /// Empty result set with the given columns.
    pub fn empty<S: Into<String>>(columns: Vec<S>) -> Self {
        Self::from_rows(columns, Vec::new())
    }

    pub fn columns(&self) -> &[String] {
        self.cursor.columns()
    }

    /// Probe the projection for an optional column.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns().iter().any(|c| c.eq_ignore_ascii_case(name))
    }

    pub async fn next(&mut self) -> Result<Option<Row>> {
        if self.closed {
            return Ok(None);
        }
        self.cursor.next().await
    }

    /// Drain the remaining rows and close the cursor.
    pub async fn collect(mut self) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        while let Some(row) = self.next().await? {
            rows.push(row);
        }
        self.close()?;
        Ok(rows)
    }

    /// Close the cursor, reporting a close failure to the caller.
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        self.cursor.close()
    }
}

impl Drop for RowSet {
    fn drop(&mut self) {
        if !self.closed {
            self.closed = true;
            if let Err(e) = self.cursor.close() {
                debug!("Ignoring cursor close failure: {}", e);
            }
        }
    }
}

impl fmt::Debug for RowSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowSet")
            .field("columns", &self.columns())
            .field("closed", &self.closed)
            .finish()
    }
}

/// Cursor over pre-fetched rows.
#[derive(Debug)]
pub struct MemoryCursor {
    columns: Arc<[String]>,
    column_names: Vec<String>,
    rows: VecDeque<Vec<SqlValue>>,
}

impl MemoryCursor {
    pub fn new<S: Into<String>>(columns: Vec<S>, rows: Vec<Vec<SqlValue>>) -> Self {
        let column_names: Vec<String> = columns.into_iter().map(Into::into).collect();
        Self {
            columns: column_names.clone().into(),
            column_names,
            rows: rows.into(),
        }
    }
}

#[async_trait]
impl Cursor for MemoryCursor {
    fn columns(&self) -> &[String] {
        &self.column_names
    }

    async fn next(&mut self) -> Result<Option<Row>> {
        Ok(self
            .rows
            .pop_front()
            .map(|values| Row::new(Arc::clone(&self.columns), values)))
    }

    fn close(&mut self) -> Result<()> {
        self.rows.clear();
        Ok(())
    }
}
