//! In-memory session shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use schema_migrator::core::{Cursor, MemoryCursor};
use schema_migrator::{
    DatabaseInfo, DriverInfo, MetaDataRequest, MigrateError, Result, Row, RowSet, Session,
    SqlValue,
};

type Rows = (Vec<&'static str>, Vec<Vec<SqlValue>>);

/// Cursor over canned rows that counts closes and can fail after a number
/// of rows.
pub struct TrackedCursor {
    inner: MemoryCursor,
    remaining: Option<usize>,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl Cursor for TrackedCursor {
    fn columns(&self) -> &[String] {
        self.inner.columns()
    }

    async fn next(&mut self) -> Result<Option<Row>> {
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return Err(MigrateError::query("connection reset", "fetching next row"));
            }
            *remaining -= 1;
        }
        self.inner.next().await
    }

    fn close(&mut self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.inner.close()
    }
}

/// Session answering metadata requests by request name and queries by a SQL
/// fragment.
pub struct MemorySession {
    pub info: DatabaseInfo,
    pub driver: DriverInfo,
    metadata: HashMap<&'static str, Rows>,
    queries: Vec<(&'static str, Rows)>,
    /// Requests whose cursor fails after this many rows.
    failing: HashMap<&'static str, usize>,
    pub current_catalog: Option<String>,
    pub denied_catalogs: Vec<&'static str>,
    pub requests: Vec<MetaDataRequest>,
    pub executed: Vec<String>,
    pub commits: usize,
    pub opened: usize,
    pub closes: Arc<AtomicUsize>,
}

impl MemorySession {
    pub fn new(info: DatabaseInfo) -> Self {
        Self {
            info,
            driver: DriverInfo::new("memory", "1.0"),
            metadata: HashMap::new(),
            queries: Vec::new(),
            failing: HashMap::new(),
            current_catalog: None,
            denied_catalogs: Vec::new(),
            requests: Vec::new(),
            executed: Vec::new(),
            commits: 0,
            opened: 0,
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn metadata(mut self, request: &'static str, columns: Vec<&'static str>, rows: Vec<Vec<SqlValue>>) -> Self {
        self.metadata.insert(request, (columns, rows));
        self
    }

    pub fn query(mut self, fragment: &'static str, columns: Vec<&'static str>, rows: Vec<Vec<SqlValue>>) -> Self {
        self.queries.push((fragment, (columns, rows)));
        self
    }

    pub fn fail_after(mut self, request: &'static str, rows: usize) -> Self {
        self.failing.insert(request, rows);
        self
    }

    pub fn catalog(mut self, catalog: &str) -> Self {
        self.current_catalog = Some(catalog.to_string());
        self
    }

    pub fn deny_catalog(mut self, catalog: &'static str) -> Self {
        self.denied_catalogs.push(catalog);
        self
    }

    pub fn closed(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    fn open(&mut self, key: &'static str, rows: Option<Rows>) -> RowSet {
        let (columns, rows) = rows.unwrap_or_default();
        self.opened += 1;
        RowSet::new(Box::new(TrackedCursor {
            inner: MemoryCursor::new(columns, rows),
            remaining: self.failing.get(key).copied(),
            closes: Arc::clone(&self.closes),
        }))
    }
}

#[async_trait]
impl Session for MemorySession {
    fn database_info(&self) -> &DatabaseInfo {
        &self.info
    }

    fn driver_info(&self) -> &DriverInfo {
        &self.driver
    }

    async fn catalog(&mut self) -> Result<Option<String>> {
        Ok(self.current_catalog.clone())
    }

    async fn set_catalog(&mut self, catalog: &str) -> Result<()> {
        if self.denied_catalogs.iter().any(|c| *c == catalog) {
            return Err(MigrateError::CatalogSwitch {
                catalog: catalog.to_string(),
                message: "permission denied".to_string(),
            });
        }
        self.current_catalog = Some(catalog.to_string());
        Ok(())
    }

    async fn metadata(&mut self, request: &MetaDataRequest) -> Result<RowSet> {
        self.requests.push(request.clone());
        let name = request.name();
        let rows = self.metadata.get(name).cloned();
        Ok(self.open(name, rows))
    }

    async fn query(&mut self, sql: &str, _params: &[SqlValue]) -> Result<RowSet> {
        self.executed.push(sql.to_string());
        let found = self
            .queries
            .iter()
            .find(|(fragment, _)| sql.contains(fragment))
            .map(|(fragment, rows)| (*fragment, rows.clone()));
        match found {
            Some((fragment, rows)) => Ok(self.open(fragment, Some(rows))),
            None => Err(MigrateError::query("relation does not exist", sql)),
        }
    }

    async fn commit(&mut self) -> Result<()> {
        self.commits += 1;
        Ok(())
    }
}

pub fn text(value: &str) -> SqlValue {
    SqlValue::from(value)
}
