//! PostgreSQL support.
//!
//! This module provides PostgreSQL-specific implementations:
//!
//! - [`PostgresDialect`]: SQL syntax strategy for PostgreSQL
//! - [`PostgresCheckInspector`] and [`PostgresAutoIncrementInspector`] over
//!   `pg_catalog`
//! - cast stripping for defaults read from PostgreSQL

mod dialect;
mod inspectors;
mod translators;

pub use dialect::PostgresDialect;
pub use inspectors::{PostgresAutoIncrementInspector, PostgresCheckInspector};
pub use translators::{cast_translator, null_cast_translator};

use crate::core::DatabaseInfo;
use crate::inspect::InspectionManager;

/// Spellings of "now" in PostgreSQL defaults.
pub const CURRENT_TIMESTAMP_ALIASES: &[&str] = &[
    "now()",
    "CURRENT_TIMESTAMP",
    "CURRENT_TIMESTAMP()",
    "LOCALTIMESTAMP",
    "transaction_timestamp()",
    "statement_timestamp()",
    "clock_timestamp()",
];

pub fn register_inspectors(manager: &mut InspectionManager) {
    manager.register(DatabaseInfo::postgresql(), PostgresCheckInspector);
    manager.register(DatabaseInfo::postgresql(), PostgresAutoIncrementInspector);
}
