//! Core abstractions shared by inspection, dialects and translation.
//!
//! - [`identifier`]: normalized object names and quoting helpers
//! - [`value`]: SQL values in rows and bind parameters
//! - [`session`]: the session/cursor collaborator supplied by the host
//! - [`database_info`]: product and driver identification
//! - [`resolver`]: version-keyed service registry
//! - [`schema`] and [`constraint`]: the inspected schema graph
//! - [`script`]: SQL fragments carried by the model

pub mod constraint;
pub mod database_info;
pub mod identifier;
pub mod resolver;
pub mod schema;
pub mod script;
pub mod session;
pub mod value;

// Re-export commonly used types for convenience
pub use constraint::{
    Check, Deferrability, ForeignKey, Index, IndexColumn, KeyColumn, PrimaryKey, Reference,
    ReferenceAction, Sequence, SortOrder, Trigger, TriggerEvent, TriggerTime,
};
pub use database_info::{DatabaseInfo, DriverInfo};
pub use identifier::Identifier;
pub use resolver::ServiceResolver;
pub use schema::{Catalog, Column, Database, ObjectMap, Schema, Table, TableRef};
pub use script::Script;
pub use session::{Cursor, MemoryCursor, MetaDataRequest, Row, RowSet, Session};
pub use value::SqlValue;
