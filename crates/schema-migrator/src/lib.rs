//! # schema-migrator
//!
//! Schema inspection and SQL dialect translation core for database
//! migrations.
//!
//! This library reads a relational schema through an abstract [`Session`]
//! and produces a normalized [`Database`] graph, then renders vendor-specific
//! SQL for a target database:
//!
//! - **Version-keyed resolution** of dialects and inspectors by product name,
//!   version and major/minor numbers
//! - **Inspectors** for catalogs, schemas, tables, columns, keys, indexes,
//!   checks, sequences, auto-increment columns and triggers
//! - **Dialects** for MySQL, PostgreSQL, SQL Server, Oracle and NuoDB: type
//!   names, quoting, DDL fragments, pagination and row counting
//! - **Translators** rewriting defaults and literals read from one vendor
//!   into another's syntax
//!
//! ## Example
//!
//! ```rust,ignore
//! use schema_migrator::{Config, InspectionManager};
//!
//! let config = Config::load("inspect.yaml")?;
//! let manager = InspectionManager::with_builtins();
//! let results = manager
//!     .inspect(&mut session, &config.inspection.scope(), &config.inspection.object_types)
//!     .await?;
//! println!("{}", results.to_json()?);
//! ```

pub mod config;
pub mod core;
pub mod dialect;
pub mod drivers;
pub mod error;
pub mod inspect;
pub mod translate;

// Re-exports for convenient access
pub use crate::config::{Config, InspectionConfig, TranslationConfig, ZeroDateTimeBehavior};
pub use crate::core::{
    Database, DatabaseInfo, DriverInfo, Identifier, MetaDataRequest, Row, RowSet, Script,
    ServiceResolver, Session, SqlValue, TableRef,
};
pub use crate::dialect::{Dialect, QueryLimit, RowCountRequest, RowCountType};
pub use crate::drivers::dialect_resolver;
pub use crate::error::{MigrateError, Result};
pub use crate::inspect::{
    InspectionContext, InspectionManager, InspectionResults, InspectionScope, Inspector,
    MetaDataType,
};
pub use crate::translate::{TranslationContext, TranslationManager, Translator};
