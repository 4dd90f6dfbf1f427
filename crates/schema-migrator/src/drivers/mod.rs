//! Built-in vendor support.
//!
//! Each vendor module provides:
//!
//! - a [`Dialect`] with the vendor's quoting, type names, DDL fragments and
//!   pagination/counting strategies
//! - inspectors for objects the generic catalog metadata misses or reports
//!   poorly (checks, sequences, identity columns, triggers)
//! - translators for scripts read from that vendor
//!
//! Vendors:
//!
//! - [`mysql`]: MySQL
//! - [`postgres`]: PostgreSQL
//! - [`mssql`]: Microsoft SQL Server (a legacy dialect for 2005/2008)
//! - [`oracle`]: Oracle
//! - [`nuodb`]: NuoDB
//!
//! # Adding New Databases
//!
//! 1. Create a module under `drivers/` with a `Dialect` built on
//!    [`DialectBase`](crate::dialect::DialectBase)
//! 2. Register it in [`dialect_resolver`] under its `DatabaseInfo` key
//! 3. Register vendor inspectors in [`register_inspectors`]
//! 4. Add its current-timestamp aliases and script translators to
//!    [`register_translators`] so other targets can read its defaults

pub mod mssql;
pub mod mysql;
pub mod nuodb;
pub mod oracle;
pub mod postgres;

use std::sync::Arc;

use crate::core::constraint::Sequence;
use crate::core::session::Row;
use crate::core::{DatabaseInfo, Identifier, ServiceResolver};
use crate::dialect::{Dialect, GenericDialect};
use crate::inspect::generic::{
    CatalogInspector, ColumnInspector, ForeignKeyInspector, IndexInspector, PrimaryKeyInspector,
    SchemaInspector, TableInspector,
};
use crate::inspect::InspectionManager;
use crate::translate::{
    BitLiteralTranslator, BooleanLiterals, CurrentTimestampTranslator, HexLiteralTranslator,
    TranslationManager,
};

pub use mssql::MssqlDialect;
pub use mysql::MySqlDialect;
pub use nuodb::NuoDbDialect;
pub use oracle::OracleDialect;
pub use postgres::PostgresDialect;

/// SQL Server majors served by the legacy dialect (2005, 2008/2008 R2).
pub const LEGACY_MSSQL_MAJOR_VERSIONS: [i32; 2] = [9, 10];

/// Current-timestamp aliasing runs ahead of the other translators so
/// `(getdate())` is not mistaken for a parenthesized literal.
const CURRENT_TIMESTAMP_PRIORITY: i32 = 10;

/// Dialect registry for every built-in vendor, falling back to the generic
/// SQL:2003 dialect.
pub fn dialect_resolver() -> ServiceResolver<dyn Dialect> {
    let mut dialects: ServiceResolver<dyn Dialect> = ServiceResolver::new("dialect");
    dialects.register(DatabaseInfo::mysql(), |_| -> Arc<dyn Dialect> {
        Arc::new(MySqlDialect::new())
    });
    dialects.register(DatabaseInfo::postgresql(), |_| -> Arc<dyn Dialect> {
        Arc::new(PostgresDialect::new())
    });
    dialects.register(DatabaseInfo::mssql_server(), |_| -> Arc<dyn Dialect> {
        Arc::new(MssqlDialect::new())
    });
    for major in LEGACY_MSSQL_MAJOR_VERSIONS {
        dialects.register(
            DatabaseInfo::mssql_server().major_version(major),
            |_| -> Arc<dyn Dialect> { Arc::new(MssqlDialect::legacy()) },
        );
    }
    dialects.register(DatabaseInfo::oracle(), |_| -> Arc<dyn Dialect> {
        Arc::new(OracleDialect::new())
    });
    dialects.register(DatabaseInfo::nuodb(), |_| -> Arc<dyn Dialect> {
        Arc::new(NuoDbDialect::new())
    });
    dialects.set_default(|info| -> Arc<dyn Dialect> { Arc::new(GenericDialect::new(info.clone())) });
    dialects
}

/// Register the generic inspectors as defaults and every vendor inspector
/// under its database key.
pub fn register_inspectors(manager: &mut InspectionManager) {
    manager.register_generic(CatalogInspector);
    manager.register_generic(SchemaInspector);
    manager.register_generic(TableInspector);
    manager.register_generic(ColumnInspector);
    manager.register_generic(PrimaryKeyInspector);
    manager.register_generic(IndexInspector);
    manager.register_generic(ForeignKeyInspector);

    mysql::register_inspectors(manager);
    postgres::register_inspectors(manager);
    mssql::register_inspectors(manager);
    oracle::register_inspectors(manager);
    nuodb::register_inspectors(manager);
}

/// Register the translators a `target` dialect applies to scripts read from
/// every other built-in vendor.
///
/// `now` is the target's spelling of the current timestamp and `booleans`
/// its boolean constants.
pub fn register_translators(
    translations: &mut TranslationManager,
    target: &DatabaseInfo,
    now: &str,
    booleans: &BooleanLiterals,
) {
    let sources = [
        (DatabaseInfo::mysql(), mysql::CURRENT_TIMESTAMP_ALIASES),
        (DatabaseInfo::postgresql(), postgres::CURRENT_TIMESTAMP_ALIASES),
        (DatabaseInfo::mssql_server(), mssql::CURRENT_TIMESTAMP_ALIASES),
        (DatabaseInfo::oracle(), oracle::CURRENT_TIMESTAMP_ALIASES),
        (DatabaseInfo::nuodb(), nuodb::CURRENT_TIMESTAMP_ALIASES),
    ];
    for (source, aliases) in sources {
        if source.matches(target) {
            continue;
        }
        translations.register_with_priority(
            CurrentTimestampTranslator::new(source, aliases.iter().copied(), now),
            CURRENT_TIMESTAMP_PRIORITY,
        );
    }

    if !DatabaseInfo::mysql().matches(target) {
        translations
            .register(BitLiteralTranslator::mysql(booleans.clone()))
            .register(HexLiteralTranslator::mysql(booleans.clone()))
            .register(mysql::ZeroDateTimeTranslator::new())
            .register(mysql::ImplicitDefaultTranslator::new());
    }
    if !DatabaseInfo::postgresql().matches(target) {
        translations
            .register(BitLiteralTranslator::postgres(booleans.clone()))
            .register(postgres::null_cast_translator())
            .register(postgres::cast_translator());
    }
    if !DatabaseInfo::mssql_server().matches(target) {
        translations.register(mssql::ParenthesizedDefaultTranslator::new());
    }
}

/// Sequence attributes from a row carrying `START_VALUE`, `INCREMENT_BY`,
/// `MIN_VALUE`, `MAX_VALUE`, `CACHE_SIZE`, `CYCLE` and `LAST_VALUE`; absent
/// fields stay unset.
pub(crate) fn read_sequence(name: Identifier, row: &Row) -> Sequence {
    let mut sequence = Sequence::new(name);
    fill_sequence(&mut sequence, row);
    sequence
}

pub(crate) fn fill_sequence(sequence: &mut Sequence, row: &Row) {
    sequence.start_with = row.decimal("START_VALUE").or(sequence.start_with);
    sequence.increment_by = row.decimal("INCREMENT_BY").or(sequence.increment_by);
    sequence.min_value = row.decimal("MIN_VALUE").or(sequence.min_value);
    sequence.max_value = row.decimal("MAX_VALUE").or(sequence.max_value);
    sequence.last_value = row.decimal("LAST_VALUE").or(sequence.last_value);
    sequence.cache = row.int("CACHE_SIZE").or(sequence.cache);
    if let Some(cycle) = row.boolean("CYCLE") {
        sequence.cycle = cycle;
    }
}

/// Check clause text as stored, without a leading `CHECK` keyword, a
/// trailing `NOT VALID` or wrapping parentheses.
pub(crate) fn check_clause(definition: &str) -> String {
    let mut text = definition.trim();
    if let Some(rest) = strip_prefix_ignore_case(text, "CHECK") {
        if rest.starts_with(|c: char| c.is_whitespace() || c == '(') {
            text = rest.trim_start();
        }
    }
    if let Some(rest) = strip_suffix_ignore_case(text, "NOT VALID") {
        text = rest.trim_end();
    }
    crate::translate::current_timestamp::strip_enclosing_parens(text).to_string()
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &text[prefix.len()..])
}

fn strip_suffix_ignore_case<'a>(text: &'a str, suffix: &str) -> Option<&'a str> {
    let at = text.len().checked_sub(suffix.len())?;
    let tail = text.get(at..)?;
    tail.eq_ignore_ascii_case(suffix).then(|| &text[..at])
}
