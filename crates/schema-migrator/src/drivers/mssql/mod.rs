//! Microsoft SQL Server support.
//!
//! This module provides MSSQL-specific implementations:
//!
//! - [`MssqlDialect`]: SQL syntax strategy for SQL Server, with a legacy
//!   variant for 2005/2008
//! - [`MssqlCheckInspector`] and [`MssqlIdentityInspector`] over the `sys`
//!   catalog views, visiting every catalog in scope
//! - [`ParenthesizedDefaultTranslator`] for defaults read from SQL Server

mod dialect;
mod inspectors;
mod translators;

pub use dialect::MssqlDialect;
pub use inspectors::{MssqlCheckInspector, MssqlIdentityInspector};
pub use translators::ParenthesizedDefaultTranslator;

use crate::core::DatabaseInfo;
use crate::inspect::InspectionManager;

/// Spellings of "now" in SQL Server defaults.
pub const CURRENT_TIMESTAMP_ALIASES: &[&str] = &["getdate()", "CURRENT_TIMESTAMP", "sysdatetime()"];

pub fn register_inspectors(manager: &mut InspectionManager) {
    manager.register(DatabaseInfo::mssql_server(), MssqlCheckInspector);
    manager.register(DatabaseInfo::mssql_server(), MssqlIdentityInspector);
}
