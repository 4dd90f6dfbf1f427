//! Vendor SQL dialects.
//!
//! A [`Dialect`] answers every vendor-specific question the inspection and
//! DDL layers ask: how identifiers are quoted, which type name to emit for a
//! source column, how sequence/trigger/constraint fragments read, how a query
//! is paginated and how rows are counted. Default methods implement generic
//! SQL:2003 behaviour; vendor dialects in `drivers::*` override what differs.
//!
//! Shared data (keywords, type templates, aliases, identifier policy and the
//! translation manager) lives in a composed [`DialectBase`] built once by each
//! dialect's constructor.
//!
//! # Usage
//!
//! ```rust,ignore
//! let dialects = drivers::dialect_resolver();
//! let target = dialects.resolve(&DatabaseInfo::postgresql())?;
//! let type_name = target.column_type_name(&source_info, &column);
//! let quoted = target.identifier("Order")?;
//! ```

pub mod keywords;
pub mod limit;
pub mod rowcount;
pub mod types;

use std::fmt;

use regex::Regex;
use rust_decimal::Decimal;

use crate::core::constraint::{Check, Deferrability, ReferenceAction, Sequence, Trigger};
use crate::core::identifier::quote_with;
use crate::core::schema::{Column, TableRef};
use crate::core::{DatabaseInfo, Identifier};
use crate::error::{MigrateError, Result};
use crate::translate::TranslationManager;

pub use keywords::KeywordSet;
pub use limit::{
    LimitHandler, LimitOffsetHandler, MySqlLimitHandler, OffsetFetchHandler, OracleLimitHandler,
    QueryLimit, TopLimitHandler,
};
pub use rowcount::{ExactRowCountHandler, RowCountHandler, RowCountRequest, RowCountType};
pub use types::{TypeAliases, TypeDesc, TypeNameMap, TypeNames, TypeOptions};

/// Case folding applied to unquoted identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierNormalizer {
    /// Keep the name as reported.
    None,
    /// Fold to upper case (Oracle, NuoDB).
    Upper,
    /// Fold to lower case (PostgreSQL).
    Lower,
}

impl IdentifierNormalizer {
    pub fn normalize(&self, name: &str) -> String {
        match self {
            IdentifierNormalizer::None => name.to_string(),
            IdentifierNormalizer::Upper => name.to_uppercase(),
            IdentifierNormalizer::Lower => name.to_lowercase(),
        }
    }
}

/// When identifiers are quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierQuoting {
    /// Only names that would not survive unquoted.
    Minimal,
    /// Every identifier.
    Always,
}

/// Data shared by all dialect implementations.
#[derive(Debug)]
pub struct DialectBase {
    pub name: String,
    pub database_info: DatabaseInfo,
    pub keywords: KeywordSet,
    /// Names matching this pattern may appear unquoted.
    pub identifier_pattern: Regex,
    pub normalizer: IdentifierNormalizer,
    pub quoting: IdentifierQuoting,
    pub type_names: TypeNames,
    pub type_aliases: TypeAliases,
    pub translations: TranslationManager,
}

impl DialectBase {
    /// SQL:2003 defaults: reserved words, `[A-Za-z][A-Za-z0-9_]*` identifiers,
    /// no case folding, minimal quoting and the standard type templates.
    pub fn new(name: impl Into<String>, database_info: DatabaseInfo) -> Self {
        Self {
            name: name.into(),
            database_info,
            keywords: KeywordSet::sql2003(),
            identifier_pattern: standard_identifier_pattern().clone(),
            normalizer: IdentifierNormalizer::None,
            quoting: IdentifierQuoting::Minimal,
            type_names: TypeNames::new(types::sql2003_type_names()),
            type_aliases: TypeAliases::new(),
            translations: TranslationManager::new(),
        }
    }

    pub fn with_normalizer(mut self, normalizer: IdentifierNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_quoting(mut self, quoting: IdentifierQuoting) -> Self {
        self.quoting = quoting;
        self
    }

    pub fn with_identifier_pattern(mut self, pattern: Regex) -> Self {
        self.identifier_pattern = pattern;
        self
    }
}

fn standard_identifier_pattern() -> &'static Regex {
    static PATTERN: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("valid identifier regex")
    })
}

fn has_mixed_case(name: &str) -> bool {
    name.chars().any(char::is_uppercase) && name.chars().any(char::is_lowercase)
}

/// Vendor SQL generation strategy.
///
/// Every method has a generic default; implementors provide [`Dialect::base`]
/// and override what their vendor does differently.
pub trait Dialect: Send + Sync + fmt::Debug {
    /// Shared dialect data.
    fn base(&self) -> &DialectBase;

    /// Dialect identifier (e.g. "mysql", "postgres").
    fn name(&self) -> &str {
        &self.base().name
    }

    /// The database product this dialect generates SQL for.
    fn database_info(&self) -> &DatabaseInfo {
        &self.base().database_info
    }

    // ===== Capabilities =====

    fn supports_catalogs(&self) -> bool {
        true
    }

    fn supports_schemas(&self) -> bool {
        true
    }

    fn supports_sequences(&self) -> bool {
        true
    }

    fn supports_triggers(&self) -> bool {
        true
    }

    /// Whether check constraints can be declared inline on a column.
    fn supports_column_check(&self) -> bool {
        true
    }

    // ===== Identifiers =====

    fn open_quote(&self) -> char {
        '"'
    }

    fn close_quote(&self) -> char {
        '"'
    }

    fn is_sql_keyword(&self, name: &str) -> bool {
        self.base().keywords.contains(name)
    }

    /// Whether the name may appear unquoted.
    fn is_allowed_identifier(&self, name: &str) -> bool {
        self.base().identifier_pattern.is_match(name)
    }

    /// Whether the name has to be quoted: not allowed unquoted, a reserved
    /// word, or mixed case on a vendor that folds case.
    fn is_quoting_identifier(&self, name: &str) -> bool {
        if self.base().quoting == IdentifierQuoting::Always {
            return true;
        }
        !self.is_allowed_identifier(name)
            || self.is_sql_keyword(name)
            || (self.base().normalizer != IdentifierNormalizer::None && has_mixed_case(name))
    }

    fn normalize_identifier(&self, name: &str) -> String {
        self.base().normalizer.normalize(name)
    }

    /// Quote unconditionally.
    fn quote(&self, name: &str) -> Result<String> {
        quote_with(name, self.open_quote(), self.close_quote())
    }

    /// Render a name as it should appear in generated SQL: quoted when
    /// required, otherwise normalized.
    fn identifier(&self, name: &str) -> Result<String> {
        if self.is_quoting_identifier(name) {
            self.quote(name)
        } else {
            crate::core::identifier::validate_identifier(name)?;
            Ok(self.normalize_identifier(name))
        }
    }

    /// Qualified table name using the parts this dialect supports.
    fn qualified_name(&self, table: &TableRef) -> Result<String> {
        let mut parts = Vec::with_capacity(3);
        if self.supports_catalogs() && !table.catalog.is_empty() {
            parts.push(self.identifier(table.catalog.value())?);
        }
        if self.supports_schemas() && !table.schema.is_empty() {
            parts.push(self.identifier(table.schema.value())?);
        }
        parts.push(self.identifier(table.table.value())?);
        Ok(parts.join("."))
    }

    // ===== Types =====

    /// Target type name for a type reported by `source`.
    fn type_name(&self, source: &DatabaseInfo, desc: &TypeDesc, options: &TypeOptions) -> Option<String> {
        self.base().type_names.type_name(source, desc, options)
    }

    /// Target type name for an inspected column.
    fn column_type_name(&self, source: &DatabaseInfo, column: &Column) -> Option<String> {
        self.type_name(
            source,
            &TypeDesc::of_column(column),
            &TypeOptions::of_column(column),
        )
    }

    /// Canonical descriptor for a driver-reported type.
    fn type_alias(&self, desc: &TypeDesc) -> TypeDesc {
        self.base().type_aliases.resolve(desc)
    }

    // ===== Sequences =====

    fn sequence_start_with(&self, start_with: Option<Decimal>) -> Option<String> {
        start_with.map(|v| format!("START WITH {}", v))
    }

    fn sequence_increment_by(&self, increment_by: Option<Decimal>) -> Option<String> {
        increment_by.map(|v| format!("INCREMENT BY {}", v))
    }

    fn sequence_min_value(&self, min_value: Option<Decimal>) -> Option<String> {
        min_value.map(|v| format!("MINVALUE {}", v))
    }

    fn sequence_max_value(&self, max_value: Option<Decimal>) -> Option<String> {
        max_value.map(|v| format!("MAXVALUE {}", v))
    }

    fn sequence_cycle(&self, cycle: bool) -> Option<String> {
        Some(if cycle { "CYCLE" } else { "NO CYCLE" }.to_string())
    }

    fn sequence_cache(&self, cache: Option<i64>) -> Option<String> {
        cache.filter(|c| *c > 1).map(|c| format!("CACHE {}", c))
    }

    /// `CREATE SEQUENCE` with every clause the dialect emits for it.
    fn create_sequence(&self, sequence: &Sequence) -> Result<String> {
        if !self.supports_sequences() {
            return Err(MigrateError::Unsupported(format!(
                "{} does not support sequences",
                self.name()
            )));
        }
        let mut sql = format!("CREATE SEQUENCE {}", self.identifier(sequence.name.value())?);
        let clauses = [
            self.sequence_start_with(sequence.start_with),
            self.sequence_increment_by(sequence.increment_by),
            self.sequence_min_value(sequence.min_value),
            self.sequence_max_value(sequence.max_value),
            self.sequence_cycle(sequence.cycle),
            self.sequence_cache(sequence.cache),
        ];
        for clause in clauses.into_iter().flatten() {
            sql.push(' ');
            sql.push_str(&clause);
        }
        Ok(sql)
    }

    // ===== Triggers =====

    fn trigger_time_event(&self, trigger: &Trigger) -> String {
        format!("{} {}", trigger.time.sql(), trigger.event.sql())
    }

    fn trigger_for_each_row(&self) -> Option<String> {
        Some("FOR EACH ROW".to_string())
    }

    fn trigger_active(&self, _active: bool) -> Option<String> {
        None
    }

    fn trigger_body(&self, trigger: &Trigger) -> String {
        trigger.body.trim().to_string()
    }

    /// `CREATE TRIGGER` for a row-level trigger on `table`.
    fn create_trigger(&self, trigger: &Trigger, table: &TableRef) -> Result<String> {
        if !self.supports_triggers() {
            return Err(MigrateError::Unsupported(format!(
                "{} does not support triggers",
                self.name()
            )));
        }
        let mut sql = format!(
            "CREATE TRIGGER {} {} ON {}",
            self.identifier(trigger.name.value())?,
            self.trigger_time_event(trigger),
            self.qualified_name(table)?
        );
        for clause in [self.trigger_for_each_row(), self.trigger_active(trigger.active)]
            .into_iter()
            .flatten()
        {
            sql.push(' ');
            sql.push_str(&clause);
        }
        sql.push(' ');
        sql.push_str(&self.trigger_body(trigger));
        Ok(sql)
    }

    // ===== Constraints =====

    fn check_clause(&self, check: &Check) -> Result<String> {
        match &check.name {
            Some(name) => Ok(format!(
                "CONSTRAINT {} CHECK ({})",
                self.identifier(name.value())?,
                check.clause.trim()
            )),
            None => Ok(format!("CHECK ({})", check.clause.trim())),
        }
    }

    /// Rule keyword for `ON DELETE`; `None` omits the clause.
    fn reference_action(&self, action: ReferenceAction) -> Option<String> {
        Some(action.sql().to_string())
    }

    /// Rule keyword for `ON UPDATE`; `None` omits the clause.
    fn update_action(&self, action: ReferenceAction) -> Option<String> {
        self.reference_action(action)
    }

    fn deferrability(&self, deferrability: Deferrability) -> Option<String> {
        let clause = match deferrability {
            Deferrability::InitiallyDeferred => "DEFERRABLE INITIALLY DEFERRED",
            Deferrability::InitiallyImmediate => "DEFERRABLE INITIALLY IMMEDIATE",
            Deferrability::NotDeferrable => "NOT DEFERRABLE",
        };
        Some(clause.to_string())
    }

    // ===== Pagination and counting =====

    /// Pagination strategy for `query`.
    fn limit_handler(&self, query: &str, limit: QueryLimit) -> Box<dyn LimitHandler> {
        Box::new(OffsetFetchHandler::new(query, limit))
    }

    /// Whether a row count of `kind` is available with/without a column and
    /// a filter.
    fn supports_row_count(&self, _column: bool, _filter: bool, kind: RowCountType) -> bool {
        kind == RowCountType::Exact
    }

    /// Counting strategy for a table.
    ///
    /// # Errors
    ///
    /// `MigrateError::UnsupportedRowCount` when the combination is not
    /// supported; the check happens before any SQL is built.
    fn row_count_handler(&self, request: &RowCountRequest) -> Result<Box<dyn RowCountHandler>> {
        if !self.supports_row_count(request.column.is_some(), request.filter.is_some(), request.kind) {
            return Err(MigrateError::UnsupportedRowCount {
                dialect: self.name().to_string(),
                table: request.table.qualified_name(),
                count_type: request.kind.to_string(),
                column: request.column.is_some(),
                filter: request.filter.is_some(),
            });
        }
        match request.kind {
            RowCountType::Exact => {
                let column = request
                    .column
                    .as_ref()
                    .map(|c: &Identifier| self.identifier(c.value()))
                    .transpose()?;
                Ok(Box::new(ExactRowCountHandler::new(
                    self.qualified_name(&request.table)?,
                    column,
                    request.filter.clone(),
                )))
            }
            RowCountType::Approx => self.approx_row_count_handler(request),
        }
    }

    /// Statistics-based counting; only called for supported combinations.
    fn approx_row_count_handler(&self, request: &RowCountRequest) -> Result<Box<dyn RowCountHandler>> {
        Err(MigrateError::Unsupported(format!(
            "{} has no approximate row count for {}",
            self.name(),
            request.table
        )))
    }

    // ===== Translation =====

    /// Translators rewriting scripts from other vendors into this dialect.
    fn translation_manager(&self) -> &TranslationManager {
        &self.base().translations
    }
}

/// The generic SQL:2003 dialect used when no vendor dialect matches.
#[derive(Debug)]
pub struct GenericDialect {
    base: DialectBase,
}

impl GenericDialect {
    pub fn new(database_info: DatabaseInfo) -> Self {
        Self {
            base: DialectBase::new("generic", database_info),
        }
    }
}

impl Dialect for GenericDialect {
    fn base(&self) -> &DialectBase {
        &self.base
    }
}
