//! Rules for defaults read from PostgreSQL, which reports literal defaults
//! with an explicit cast (`'open'::character varying`, `NULL::text`).

use std::sync::OnceLock;

use regex::Regex;

use crate::core::DatabaseInfo;
use crate::translate::PatternTranslator;

fn cast_literal() -> &'static Regex {
    static CAST_RE: OnceLock<Regex> = OnceLock::new();
    CAST_RE.get_or_init(|| {
        Regex::new(r#"(?is)^'((?:[^']|'')*)'::[\w\s\."]+(?:\[\])?(?:\(\d+(?:,\s*\d+)?\))?$"#)
            .expect("valid cast literal regex")
    })
}

fn null_cast() -> &'static Regex {
    static NULL_CAST_RE: OnceLock<Regex> = OnceLock::new();
    NULL_CAST_RE.get_or_init(|| {
        Regex::new(r#"(?i)^NULL::[\w\s\."]+(?:\(\d+(?:,\s*\d+)?\))?$"#).expect("valid null cast regex")
    })
}

/// `'value'::type` becomes the bare value.
pub fn cast_translator() -> PatternTranslator {
    PatternTranslator::new(DatabaseInfo::postgresql()).rule(cast_literal(), "$1")
}

/// `NULL::type` becomes the `NULL` keyword.
pub fn null_cast_translator() -> PatternTranslator {
    PatternTranslator::new(DatabaseInfo::postgresql())
        .literal(true)
        .rule(null_cast(), "NULL")
}
