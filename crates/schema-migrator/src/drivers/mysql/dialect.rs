//! MySQL SQL dialect.
//!
//! MySQL has catalogs (databases) but no schemas, quotes with backticks and
//! paginates with `LIMIT offset, count`. Row estimates come from `EXPLAIN`,
//! which accepts a projected column and a filter.

use std::sync::OnceLock;

use regex::Regex;

use crate::core::constraint::Deferrability;
use crate::core::DatabaseInfo;
use crate::dialect::rowcount::ExplainRowCountHandler;
use crate::dialect::types::{self, TypeDesc};
use crate::dialect::{
    Dialect, DialectBase, LimitHandler, MySqlLimitHandler, QueryLimit, RowCountHandler,
    RowCountRequest, RowCountType,
};
use crate::error::Result;
use crate::translate::BooleanLiterals;

/// Reserved words on top of SQL:2003.
const RESERVED_WORDS: &[&str] = &[
    "ACCESSIBLE", "ANALYZE", "CHANGE", "DATABASE", "DATABASES", "DAY_HOUR",
    "DAY_MINUTE", "DAY_SECOND", "DELAYED", "DISTINCTROW", "DIV", "DUAL",
    "ENCLOSED", "ESCAPED", "EXPLAIN", "FORCE", "FULLTEXT", "HIGH_PRIORITY",
    "HOUR_MINUTE", "HOUR_SECOND", "IGNORE", "INDEX", "INFILE", "KEY", "KEYS",
    "KILL", "LIMIT", "LINEAR", "LINES", "LOAD", "LOCK", "LONG", "LONGBLOB",
    "LONGTEXT", "LOW_PRIORITY", "MEDIUMBLOB", "MEDIUMINT", "MEDIUMTEXT",
    "MOD", "OPTIMIZE", "OPTIONALLY", "OUTFILE", "PURGE", "REGEXP", "RENAME",
    "REPLACE", "RLIKE", "SCHEMAS", "SEPARATOR", "SHOW", "SPATIAL",
    "SQL_BIG_RESULT", "SQL_CALC_FOUND_ROWS", "SQL_SMALL_RESULT", "STARTING",
    "STRAIGHT_JOIN", "TERMINATED", "TINYBLOB", "TINYINT", "TINYTEXT", "UNLOCK",
    "UNSIGNED", "USAGE", "USE", "XOR", "YEAR_MONTH", "ZEROFILL",
];

/// MySQL allows `$` in unquoted names.
fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*$").expect("valid mysql identifier regex")
    })
}

/// MySQL dialect, 5.x and 8.x.
#[derive(Debug)]
pub struct MySqlDialect {
    base: DialectBase,
}

impl MySqlDialect {
    pub fn new() -> Self {
        let info = DatabaseInfo::mysql();
        let mut base = DialectBase::new("mysql", info.clone())
            .with_identifier_pattern(identifier_pattern().clone());
        base.keywords.extend(RESERVED_WORDS.iter().copied());

        base.type_names
            .default_map()
            .insert(types::BIT, "BIT({N})")
            .insert(types::BOOLEAN, "TINYINT(1)")
            .insert(types::TINYINT, "TINYINT")
            .insert(types::DOUBLE, "DOUBLE")
            .insert(types::NCHAR, "CHAR({N})")
            .insert(types::NVARCHAR, "VARCHAR({N})")
            .insert(types::LONGVARCHAR, "LONGTEXT")
            .insert(types::LONGNVARCHAR, "LONGTEXT")
            .insert(types::CLOB, "LONGTEXT")
            .insert(types::NCLOB, "LONGTEXT")
            .insert(types::SQLXML, "LONGTEXT")
            .insert(types::LONGVARBINARY, "LONGBLOB")
            .insert(types::BLOB, "LONGBLOB")
            .insert(types::TIME, "TIME({S})")
            .insert(types::TIMESTAMP, "DATETIME({S})")
            .insert(types::TIMESTAMP_WITH_TIMEZONE, "DATETIME({S})");

        // Unsigned integers widen to the next signed type
        base.type_aliases
            .name("TINYINT UNSIGNED", TypeDesc::new(types::SMALLINT, "SMALLINT"))
            .name("SMALLINT UNSIGNED", TypeDesc::new(types::INTEGER, "INTEGER"))
            .name("MEDIUMINT", TypeDesc::new(types::INTEGER, "INTEGER"))
            .name("MEDIUMINT UNSIGNED", TypeDesc::new(types::INTEGER, "INTEGER"))
            .name("INT UNSIGNED", TypeDesc::new(types::BIGINT, "BIGINT"))
            .name("BIGINT UNSIGNED", TypeDesc::new(types::DECIMAL, "DECIMAL"))
            .code_name(types::DATE, "YEAR", TypeDesc::new(types::SMALLINT, "YEAR"));

        crate::drivers::register_translators(
            &mut base.translations,
            &info,
            "CURRENT_TIMESTAMP",
            &BooleanLiterals::keywords(),
        );
        Self { base }
    }
}

impl Default for MySqlDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl Dialect for MySqlDialect {
    fn base(&self) -> &DialectBase {
        &self.base
    }

    fn supports_schemas(&self) -> bool {
        false
    }

    fn supports_sequences(&self) -> bool {
        false
    }

    fn open_quote(&self) -> char {
        '`'
    }

    fn close_quote(&self) -> char {
        '`'
    }

    fn deferrability(&self, _deferrability: Deferrability) -> Option<String> {
        None
    }

    fn limit_handler(&self, query: &str, limit: QueryLimit) -> Box<dyn LimitHandler> {
        Box::new(MySqlLimitHandler::new(query, limit))
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
        Ok(Box::new(ExplainRowCountHandler::mysql(
            self.qualified_name(&request.table)?,
            column,
            request.filter.clone(),
        )))
    }
}
