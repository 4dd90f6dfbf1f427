//! PostgreSQL SQL dialect.
//!
//! Unquoted names fold to lower case, so mixed-case names are quoted. There
//! are no catalogs in qualified names (one database per connection).

use crate::core::DatabaseInfo;
use crate::dialect::rowcount::ExplainRowCountHandler;
use crate::dialect::types::{self, TypeDesc};
use crate::dialect::{
    Dialect, DialectBase, IdentifierNormalizer, LimitHandler, LimitOffsetHandler, QueryLimit,
    RowCountHandler, RowCountRequest, RowCountType,
};
use crate::error::Result;
use crate::translate::BooleanLiterals;

/// Reserved in PostgreSQL but not in SQL:2003.
const RESERVED_WORDS: &[&str] = &[
    "ANALYSE", "ANALYZE", "CONCURRENTLY", "FREEZE", "ILIKE", "ISNULL", "LIMIT",
    "NOTNULL", "OFFSET", "PLACING", "RETURNING", "VARIADIC", "VERBOSE",
];

/// PostgreSQL dialect, 9.x and later.
#[derive(Debug)]
pub struct PostgresDialect {
    base: DialectBase,
}

impl PostgresDialect {
    pub fn new() -> Self {
        let info = DatabaseInfo::postgresql();
        let mut base = DialectBase::new("postgres", info.clone())
            .with_normalizer(IdentifierNormalizer::Lower);
        base.keywords.extend(RESERVED_WORDS.iter().copied());

        base.type_names
            .default_map()
            .insert(types::BIT, "BIT({N})")
            .insert(types::TINYINT, "SMALLINT")
            .insert(types::DOUBLE, "DOUBLE PRECISION")
            .insert(types::FLOAT, "DOUBLE PRECISION")
            .insert(types::NCHAR, "CHAR({N})")
            .insert(types::NVARCHAR, "VARCHAR({N})")
            .insert(types::LONGVARCHAR, "TEXT")
            .insert(types::LONGNVARCHAR, "TEXT")
            .insert(types::CLOB, "TEXT")
            .insert(types::NCLOB, "TEXT")
            .insert(types::SQLXML, "XML")
            .insert(types::BINARY, "BYTEA")
            .insert(types::VARBINARY, "BYTEA")
            .insert(types::LONGVARBINARY, "BYTEA")
            .insert(types::BLOB, "BYTEA")
            .insert(types::TIME, "TIME({S})")
            .insert(types::TIMESTAMP, "TIMESTAMP({S})")
            .insert(types::TIMESTAMP_WITH_TIMEZONE, "TIMESTAMP({S}) WITH TIME ZONE");
        base.type_names
            .source_map(DatabaseInfo::mysql())
            .insert_named(types::LONGVARCHAR, "JSON", "JSONB")
            .insert_named(types::TINYINT, "TINYINT UNSIGNED", "SMALLINT");

        base.type_aliases
            .name("int2", TypeDesc::new(types::SMALLINT, "SMALLINT"))
            .name("int4", TypeDesc::new(types::INTEGER, "INTEGER"))
            .name("int8", TypeDesc::new(types::BIGINT, "BIGINT"))
            .name("serial", TypeDesc::new(types::INTEGER, "INTEGER"))
            .name("bigserial", TypeDesc::new(types::BIGINT, "BIGINT"))
            .code_name(types::BIT, "bool", TypeDesc::new(types::BOOLEAN, "BOOLEAN"));

        crate::drivers::register_translators(
            &mut base.translations,
            &info,
            "CURRENT_TIMESTAMP",
            &BooleanLiterals::keywords(),
        );
        Self { base }
    }
}

impl Default for PostgresDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl Dialect for PostgresDialect {
    fn base(&self) -> &DialectBase {
        &self.base
    }

    fn supports_catalogs(&self) -> bool {
        false
    }

    fn limit_handler(&self, query: &str, limit: QueryLimit) -> Box<dyn LimitHandler> {
        Box::new(LimitOffsetHandler::new(query, limit))
    }

    fn supports_row_count(&self, _column: bool, _filter: bool, _kind: RowCountType) -> bool {
        true
    }

    fn approx_row_count_handler(&self, request: &RowCountRequest) -> Result<Box<dyn RowCountHandler>> {
        let column = request
            .column
            .as_ref()
            .map(|c| self.identifier(c.value()))
            .transpose()?;
        Ok(Box::new(ExplainRowCountHandler::postgres(
            self.qualified_name(&request.table)?,
            column,
            request.filter.clone(),
        )))
    }
}
