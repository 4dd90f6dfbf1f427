//! Oracle SQL dialect.
//!
//! Unquoted names fold to upper case; tables are qualified by owner (schema)
//! only. Pagination wraps the query in `ROWNUM` filters and row estimates
//! come from optimizer statistics in `ALL_TABLES`.

use std::sync::OnceLock;

use regex::Regex;

use crate::core::constraint::{Deferrability, ReferenceAction};
use crate::core::DatabaseInfo;
use crate::dialect::rowcount::CatalogRowCountHandler;
use crate::dialect::types::{self, TypeDesc};
use crate::dialect::{
    Dialect, DialectBase, IdentifierNormalizer, LimitHandler, OracleLimitHandler, QueryLimit,
    RowCountHandler, RowCountRequest, RowCountType,
};
use crate::error::Result;
use crate::translate::BooleanLiterals;

const RESERVED_WORDS: &[&str] = &[
    "ACCESS", "AUDIT", "CLUSTER", "COMMENT", "COMPRESS", "EXCLUSIVE", "FILE",
    "IDENTIFIED", "INCREMENT", "INDEX", "INITIAL", "LOCK", "LONG", "MAXEXTENTS",
    "MINUS", "MLSLABEL", "MODE", "MODIFY", "NOAUDIT", "NOCOMPRESS", "NOWAIT",
    "NUMBER", "OFFLINE", "ONLINE", "PCTFREE", "PRIOR", "RAW", "RENAME",
    "RESOURCE", "ROWID", "ROWNUM", "SESSION", "SHARE", "SIZE", "SUCCESSFUL",
    "SYNONYM", "SYSDATE", "UID", "VALIDATE", "VARCHAR2",
];

/// Oracle also allows `$` and `#` after the first character.
fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z][A-Za-z0-9_$#]*$").expect("valid oracle identifier regex")
    })
}

/// Oracle dialect, 10g and later.
#[derive(Debug)]
pub struct OracleDialect {
    base: DialectBase,
}

impl OracleDialect {
    pub fn new() -> Self {
        let info = DatabaseInfo::oracle();
        let mut base = DialectBase::new("oracle", info.clone())
            .with_normalizer(IdentifierNormalizer::Upper)
            .with_identifier_pattern(identifier_pattern().clone());
        base.keywords.extend(RESERVED_WORDS.iter().copied());

        base.type_names
            .default_map()
            .insert(types::BIT, "NUMBER(1)")
            .insert(types::BOOLEAN, "NUMBER(1)")
            .insert(types::TINYINT, "NUMBER(3)")
            .insert(types::SMALLINT, "NUMBER(5)")
            .insert(types::INTEGER, "NUMBER(10)")
            .insert(types::BIGINT, "NUMBER(19)")
            .insert(types::NUMERIC, "NUMBER({P},{S})")
            .insert(types::DECIMAL, "NUMBER({P},{S})")
            .insert(types::REAL, "BINARY_FLOAT")
            .insert(types::FLOAT, "BINARY_DOUBLE")
            .insert(types::DOUBLE, "BINARY_DOUBLE")
            .insert(types::VARCHAR, "VARCHAR2({N})")
            .insert(types::NCHAR, "NCHAR({N})")
            .insert(types::NVARCHAR, "NVARCHAR2({N})")
            .insert(types::LONGVARCHAR, "CLOB")
            .insert(types::CLOB, "CLOB")
            .insert(types::LONGNVARCHAR, "NCLOB")
            .insert(types::NCLOB, "NCLOB")
            .insert(types::BINARY, "RAW({N})")
            .insert(types::VARBINARY, "RAW({N})")
            .insert(types::LONGVARBINARY, "BLOB")
            .insert(types::BLOB, "BLOB")
            .insert(types::SQLXML, "XMLTYPE")
            .insert(types::TIME, "DATE")
            .insert(types::TIMESTAMP, "TIMESTAMP({S})")
            .insert(types::TIMESTAMP_WITH_TIMEZONE, "TIMESTAMP({S}) WITH TIME ZONE");

        base.type_aliases
            .name("VARCHAR2", TypeDesc::new(types::VARCHAR, "VARCHAR2"))
            .name("NVARCHAR2", TypeDesc::new(types::NVARCHAR, "NVARCHAR2"))
            .name("BINARY_FLOAT", TypeDesc::new(types::REAL, "BINARY_FLOAT"))
            .name("BINARY_DOUBLE", TypeDesc::new(types::DOUBLE, "BINARY_DOUBLE"))
            .name("XMLTYPE", TypeDesc::new(types::SQLXML, "XMLTYPE"))
            .code_name(types::OTHER, "ROWID", TypeDesc::new(types::ROWID, "ROWID"));

        crate::drivers::register_translators(
            &mut base.translations,
            &info,
            "SYSTIMESTAMP",
            &BooleanLiterals::numeric(),
        );
        Self { base }
    }
}

impl Default for OracleDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl Dialect for OracleDialect {
    fn base(&self) -> &DialectBase {
        &self.base
    }

    fn supports_catalogs(&self) -> bool {
        false
    }

    fn sequence_cycle(&self, cycle: bool) -> Option<String> {
        Some(if cycle { "CYCLE" } else { "NOCYCLE" }.to_string())
    }

    fn sequence_cache(&self, cache: Option<i64>) -> Option<String> {
        match cache {
            Some(cache) if cache > 1 => Some(format!("CACHE {}", cache)),
            Some(_) => Some("NOCACHE".to_string()),
            None => None,
        }
    }

    fn trigger_active(&self, active: bool) -> Option<String> {
        (!active).then(|| "DISABLE".to_string())
    }

    /// Oracle only knows `CASCADE` and `SET NULL`; the rest is its default.
    fn reference_action(&self, action: ReferenceAction) -> Option<String> {
        match action {
            ReferenceAction::Cascade | ReferenceAction::SetNull => Some(action.sql().to_string()),
            _ => None,
        }
    }

    /// No `ON UPDATE` clause at all.
    fn update_action(&self, _action: ReferenceAction) -> Option<String> {
        None
    }

    fn deferrability(&self, deferrability: Deferrability) -> Option<String> {
        match deferrability {
            Deferrability::InitiallyDeferred => Some("DEFERRABLE INITIALLY DEFERRED".to_string()),
            Deferrability::InitiallyImmediate => Some("DEFERRABLE INITIALLY IMMEDIATE".to_string()),
            Deferrability::NotDeferrable => None,
        }
    }

    fn limit_handler(&self, query: &str, limit: QueryLimit) -> Box<dyn LimitHandler> {
        Box::new(OracleLimitHandler::new(query, limit))
    }

    fn supports_row_count(&self, column: bool, filter: bool, kind: RowCountType) -> bool {
        match kind {
            RowCountType::Exact => true,
            RowCountType::Approx => !column && !filter,
        }
    }

    fn approx_row_count_handler(&self, request: &RowCountRequest) -> Result<Box<dyn RowCountHandler>> {
        Ok(Box::new(CatalogRowCountHandler::oracle(&request.table)))
    }
}
