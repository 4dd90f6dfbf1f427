//! Oracle support.
//!
//! - [`OracleDialect`]: upper-case folding, owner-qualified names, `ROWNUM`
//!   pagination and `ALL_TABLES` statistics for estimates
//! - [`OracleCheckInspector`] and [`OracleSequenceInspector`] over the `ALL_*`
//!   dictionary views

mod dialect;
mod inspectors;

pub use dialect::OracleDialect;
pub use inspectors::{OracleCheckInspector, OracleSequenceInspector};

use crate::core::DatabaseInfo;
use crate::inspect::InspectionManager;

/// Spellings of "now" in Oracle defaults.
pub const CURRENT_TIMESTAMP_ALIASES: &[&str] =
    &["SYSDATE", "SYSTIMESTAMP", "CURRENT_TIMESTAMP", "LOCALTIMESTAMP"];

pub fn register_inspectors(manager: &mut InspectionManager) {
    manager.register(DatabaseInfo::oracle(), OracleCheckInspector);
    manager.register(DatabaseInfo::oracle(), OracleSequenceInspector);
}
