//! NuoDB SQL dialect.

use rust_decimal::Decimal;

use crate::core::constraint::Trigger;
use crate::core::schema::TableRef;
use crate::core::DatabaseInfo;
use crate::dialect::types::{self, TypeDesc};
use crate::dialect::{
    Dialect, DialectBase, IdentifierNormalizer, LimitHandler, LimitOffsetHandler, QueryLimit,
};
use crate::error::{MigrateError, Result};
use crate::translate::BooleanLiterals;

const RESERVED_WORDS: &[&str] = &[
    "BREAK", "CONTAINING", "ENUM", "FOR_UPDATE", "GENERATED", "IF", "KEY",
    "LIMIT", "NEXT_VALUE", "OFFSET", "RECORD_BATCHING", "STARTING", "VAR",
];

/// NuoDB dialect.
///
/// Sequences only take a `QUANTUM SIZE`; triggers use NuoDB's own
/// `FOR table ... END_TRIGGER` form.
#[derive(Debug)]
pub struct NuoDbDialect {
    base: DialectBase,
}

impl NuoDbDialect {
    pub fn new() -> Self {
        let info = DatabaseInfo::nuodb();
        let mut base = DialectBase::new("nuodb", info.clone())
            .with_normalizer(IdentifierNormalizer::Upper);
        base.keywords.extend(RESERVED_WORDS.iter().copied());

        base.type_names
            .default_map()
            .insert(types::BIT, "BOOLEAN")
            .insert(types::BOOLEAN, "BOOLEAN")
            .insert(types::DOUBLE, "DOUBLE")
            .insert(types::FLOAT, "DOUBLE")
            .insert(types::NCHAR, "CHAR({N})")
            .insert(types::NVARCHAR, "VARCHAR({N})")
            .insert(types::LONGNVARCHAR, "CLOB")
            .insert(types::NCLOB, "CLOB")
            .insert(types::SQLXML, "CLOB")
            .insert(types::TIMESTAMP_WITH_TIMEZONE, "TIMESTAMP");

        base.type_aliases
            .name("STRING", TypeDesc::new(types::LONGVARCHAR, "CLOB"))
            .name("ENUM", TypeDesc::new(types::VARCHAR, "VARCHAR"));

        crate::drivers::register_translators(
            &mut base.translations,
            &info,
            "NOW()",
            &BooleanLiterals::keywords(),
        );
        Self { base }
    }
}

impl Default for NuoDbDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl Dialect for NuoDbDialect {
    fn base(&self) -> &DialectBase {
        &self.base
    }

    fn supports_catalogs(&self) -> bool {
        false
    }

    fn sequence_increment_by(&self, _increment_by: Option<Decimal>) -> Option<String> {
        None
    }

    fn sequence_min_value(&self, _min_value: Option<Decimal>) -> Option<String> {
        None
    }

    fn sequence_max_value(&self, _max_value: Option<Decimal>) -> Option<String> {
        None
    }

    fn sequence_cycle(&self, _cycle: bool) -> Option<String> {
        None
    }

    fn sequence_cache(&self, cache: Option<i64>) -> Option<String> {
        cache.map(|c| format!("QUANTUM SIZE {}", c))
    }

    fn trigger_active(&self, active: bool) -> Option<String> {
        Some(if active { "ACTIVE" } else { "INACTIVE" }.to_string())
    }

    fn create_trigger(&self, trigger: &Trigger, table: &TableRef) -> Result<String> {
        if !self.supports_triggers() {
            return Err(MigrateError::Unsupported(format!(
                "{} does not support triggers",
                self.name()
            )));
        }
        let mut sql = format!(
            "CREATE TRIGGER {} FOR {} {}",
            self.identifier(trigger.name.value())?,
            self.qualified_name(table)?,
            self.trigger_time_event(trigger)
        );
        if let Some(active) = self.trigger_active(trigger.active) {
            sql.push(' ');
            sql.push_str(&active);
        }
        sql.push_str(" AS ");
        sql.push_str(&self.trigger_body(trigger));
        sql.push_str(" END_TRIGGER");
        Ok(sql)
    }

    fn limit_handler(&self, query: &str, limit: QueryLimit) -> Box<dyn LimitHandler> {
        Box::new(LimitOffsetHandler::new(query, limit))
    }
}
