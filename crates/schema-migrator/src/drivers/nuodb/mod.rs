//! NuoDB support.
//!
//! - [`NuoDbDialect`]: upper-case folding, `LIMIT/OFFSET` paging, NuoDB
//!   sequence and trigger syntax
//! - [`NuoDbCheckInspector`] and [`NuoDbSequenceInspector`] over the `SYSTEM`
//!   schema

mod dialect;
mod inspectors;

pub use dialect::NuoDbDialect;
pub use inspectors::{is_table_check_name, NuoDbCheckInspector, NuoDbSequenceInspector};

use crate::core::DatabaseInfo;
use crate::inspect::InspectionManager;

/// Spellings of "now" in NuoDB defaults.
pub const CURRENT_TIMESTAMP_ALIASES: &[&str] = &["NOW()", "CURRENT_TIMESTAMP"];

pub fn register_inspectors(manager: &mut InspectionManager) {
    manager.register(DatabaseInfo::nuodb(), NuoDbCheckInspector);
    manager.register(DatabaseInfo::nuodb(), NuoDbSequenceInspector);
}
