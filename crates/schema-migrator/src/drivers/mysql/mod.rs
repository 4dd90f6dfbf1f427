//! MySQL support.
//!
//! This module provides MySQL-specific implementations for:
//! - [`MySqlDialect`]: SQL syntax strategy
//! - Inspectors over `INFORMATION_SCHEMA` for columns (enum values and
//!   `auto_increment`), next auto-increment values, triggers and, on 8.x,
//!   check constraints
//! - [`ZeroDateTimeTranslator`] and [`ImplicitDefaultTranslator`] for
//!   defaults read from MySQL
//!
//! # Supported Versions
//!
//! - MySQL 5.7+, 8.0+
//! - MariaDB reports itself as MySQL and is served by the same dialect

mod dialect;
mod inspectors;
mod translators;

pub use dialect::MySqlDialect;
pub use inspectors::{
    parse_enum_values, type_code, MySqlAutoIncrementInspector, MySqlCheckInspector,
    MySqlColumnInspector, MySqlTriggerInspector,
};
pub use translators::{is_strict_mode, ImplicitDefaultTranslator, ZeroDateTimeTranslator};

use crate::core::DatabaseInfo;
use crate::inspect::InspectionManager;

/// Spellings of "now" in MySQL defaults.
pub const CURRENT_TIMESTAMP_ALIASES: &[&str] = &[
    "CURRENT_TIMESTAMP",
    "CURRENT_TIMESTAMP()",
    "NOW()",
    "LOCALTIME",
    "LOCALTIME()",
    "LOCALTIMESTAMP",
    "LOCALTIMESTAMP()",
];

/// Majors with `INFORMATION_SCHEMA.CHECK_CONSTRAINTS`.
const CHECK_CONSTRAINT_MAJOR_VERSIONS: [i32; 2] = [8, 9];

pub fn register_inspectors(manager: &mut InspectionManager) {
    manager.register(DatabaseInfo::mysql(), MySqlColumnInspector);
    manager.register(DatabaseInfo::mysql(), MySqlAutoIncrementInspector);
    manager.register(DatabaseInfo::mysql(), MySqlTriggerInspector);
    for major in CHECK_CONSTRAINT_MAJOR_VERSIONS {
        manager.register(DatabaseInfo::mysql().major_version(major), MySqlCheckInspector);
    }
}
