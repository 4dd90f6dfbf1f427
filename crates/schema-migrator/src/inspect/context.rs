//! Inspection context and accumulated results.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use super::MetaDataType;
use crate::core::schema::{Database, TableRef};
use crate::core::session::Session;
use crate::core::DatabaseInfo;
use crate::dialect::Dialect;
use crate::error::Result;

/// Schema graph built by one inspection pass.
#[derive(Debug, Clone, Serialize)]
pub struct InspectionResults {
    database: Database,
    inspected: BTreeSet<MetaDataType>,
}

impl InspectionResults {
    pub fn new(database: Database) -> Self {
        Self {
            database,
            inspected: BTreeSet::new(),
        }
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn database_mut(&mut self) -> &mut Database {
        &mut self.database
    }

    pub fn into_database(self) -> Database {
        self.database
    }

    pub fn mark_inspected(&mut self, object_type: MetaDataType) {
        self.inspected.insert(object_type);
    }

    pub fn is_inspected(&self, object_type: MetaDataType) -> bool {
        self.inspected.contains(&object_type)
    }

    /// Object types inspected so far, in execution order.
    pub fn inspected_types(&self) -> impl Iterator<Item = MetaDataType> + '_ {
        self.inspected.iter().copied()
    }

    /// References to every table found so far.
    pub fn table_refs(&self) -> Vec<TableRef> {
        self.database
            .tables()
            .map(|t| t.table_ref().clone())
            .collect()
    }

    /// Pretty-printed JSON dump of the graph.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// State shared by the inspectors of one pass: the session, the dialect of
/// the inspected database and the results accumulated so far.
pub struct InspectionContext<'a> {
    session: &'a mut dyn Session,
    dialect: Arc<dyn Dialect>,
    results: InspectionResults,
}

impl<'a> InspectionContext<'a> {
    pub fn new(session: &'a mut dyn Session, dialect: Arc<dyn Dialect>, results: InspectionResults) -> Self {
        Self {
            session,
            dialect,
            results,
        }
    }

    pub fn session(&mut self) -> &mut (dyn Session + 'a) {
        &mut *self.session
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    pub fn database_info(&self) -> &DatabaseInfo {
        self.session.database_info()
    }

    pub fn results(&self) -> &InspectionResults {
        &self.results
    }

    pub fn results_mut(&mut self) -> &mut InspectionResults {
        &mut self.results
    }

    pub fn database_mut(&mut self) -> &mut Database {
        self.results.database_mut()
    }

    /// Commit the session and hand back the results.
    pub async fn release(self) -> Result<InspectionResults> {
        self.session.commit().await?;
        Ok(self.results)
    }
}

impl fmt::Debug for InspectionContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InspectionContext")
            .field("database", self.session.database_info())
            .field("dialect", &self.dialect.name())
            .field("inspected", &self.results.inspected)
            .finish()
    }
}

/// Make `catalog` the active catalog.
///
/// A failed switch is logged and reported as `false` so the caller can skip
/// that catalog and carry on with the rest.
pub async fn switch_catalog(context: &mut InspectionContext<'_>, catalog: &str) -> Result<bool> {
    match context.session().set_catalog(catalog).await {
        Ok(()) => {
            debug!("Switched to catalog {}", catalog);
            Ok(true)
        }
        Err(e) => {
            warn!("Skipping catalog {}: cannot switch to it: {}", catalog, e);
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DriverInfo, Identifier};

    #[test]
    fn test_results_track_types_and_tables() {
        let database = Database::new(DatabaseInfo::mysql(), DriverInfo::new("test", "1.0"), "mysql");
        let mut results = InspectionResults::new(database);
        let table = TableRef::new(Identifier::new("shop"), Identifier::EMPTY, Identifier::new("orders"));
        results.database_mut().table_or_create(&table);
        results.mark_inspected(MetaDataType::Column);
        results.mark_inspected(MetaDataType::Table);

        assert_eq!(results.table_refs(), vec![table]);
        assert_eq!(
            results.inspected_types().collect::<Vec<_>>(),
            vec![MetaDataType::Table, MetaDataType::Column]
        );

        let json = results.to_json().unwrap();
        assert!(json.contains("\"orders\""));
        assert!(json.contains("\"column\""));
    }
}
