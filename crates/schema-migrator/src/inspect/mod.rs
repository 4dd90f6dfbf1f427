//! Schema inspection.
//!
//! An [`InspectionManager`] runs one [`Inspector`] per requested
//! [`MetaDataType`] against a live [`Session`](crate::core::Session), merging
//! everything found into a shared [`InspectionResults`] graph. Inspectors are
//! resolved per database version so vendor implementations can replace the
//! generic catalog-metadata ones.
//!
//! ```rust,ignore
//! let manager = InspectionManager::with_builtins();
//! let scope = InspectionScope::new().schema("sales").table("order%");
//! let results = manager
//!     .inspect(&mut session, &scope, &[MetaDataType::Table, MetaDataType::Column])
//!     .await?;
//! println!("{}", results.to_json()?);
//! ```

pub mod context;
pub mod generic;
pub mod manager;
pub mod query;
pub mod scope;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use context::{switch_catalog, InspectionContext, InspectionResults};
pub use manager::{InspectionManager, InspectorResolver};
pub use query::QueryBuilder;
pub use scope::InspectionScope;

/// Kinds of schema objects, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetaDataType {
    Catalog,
    Schema,
    Table,
    Column,
    PrimaryKey,
    Index,
    ForeignKey,
    Check,
    Sequence,
    AutoIncrement,
    Trigger,
}

impl MetaDataType {
    /// Every type in execution order.
    pub const ALL: [MetaDataType; 11] = [
        MetaDataType::Catalog,
        MetaDataType::Schema,
        MetaDataType::Table,
        MetaDataType::Column,
        MetaDataType::PrimaryKey,
        MetaDataType::Index,
        MetaDataType::ForeignKey,
        MetaDataType::Check,
        MetaDataType::Sequence,
        MetaDataType::AutoIncrement,
        MetaDataType::Trigger,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MetaDataType::Catalog => "catalog",
            MetaDataType::Schema => "schema",
            MetaDataType::Table => "table",
            MetaDataType::Column => "column",
            MetaDataType::PrimaryKey => "primary key",
            MetaDataType::Index => "index",
            MetaDataType::ForeignKey => "foreign key",
            MetaDataType::Check => "check",
            MetaDataType::Sequence => "sequence",
            MetaDataType::AutoIncrement => "auto increment",
            MetaDataType::Trigger => "trigger",
        }
    }
}

impl fmt::Display for MetaDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reads one kind of schema object into the inspection results.
#[async_trait]
pub trait Inspector: Send + Sync + fmt::Debug {
    /// The object type this inspector produces.
    fn object_type(&self) -> MetaDataType;

    /// Whether [`Inspector::inspect_scope`] can serve `scope` directly.
    /// When it cannot, the manager calls [`Inspector::inspect`] instead.
    fn supports(&self, _context: &InspectionContext<'_>, _scope: &InspectionScope) -> bool {
        true
    }

    /// Inspect without narrowing by scope.
    ///
    /// The default runs [`Inspector::inspect_scope`] once per table already
    /// present in the results, which suits every per-table object type.
    async fn inspect(&self, context: &mut InspectionContext<'_>) -> Result<()> {
        for table in context.results().table_refs() {
            self.inspect_scope(context, &InspectionScope::for_table(&table))
                .await?;
        }
        Ok(())
    }

    /// Inspect the objects within `scope`.
    async fn inspect_scope(
        &self,
        context: &mut InspectionContext<'_>,
        scope: &InspectionScope,
    ) -> Result<()>;
}
