//! Defaults read from SQL Server come wrapped in parentheses: `((0))`,
//! `(N'open')`, `(getdate())`.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;

use crate::core::DatabaseInfo;
use crate::error::Result;
use crate::translate::current_timestamp::strip_enclosing_parens;
use crate::translate::{Script, TranslationContext, Translator};

fn string_literal() -> &'static Regex {
    static STRING_RE: OnceLock<Regex> = OnceLock::new();
    STRING_RE.get_or_init(|| {
        Regex::new(r"(?s)^N?'((?:[^']|'')*)'$").expect("valid string literal regex")
    })
}

fn number_literal() -> &'static Regex {
    static NUMBER_RE: OnceLock<Regex> = OnceLock::new();
    NUMBER_RE.get_or_init(|| {
        Regex::new(r"^[-+]?\d+(?:\.\d+)?(?:[eE][-+]?\d+)?$").expect("valid number literal regex")
    })
}

/// Unwraps parenthesized string and numeric defaults; anything else (function
/// calls, expressions) is left to other translators.
#[derive(Debug, Clone)]
pub struct ParenthesizedDefaultTranslator {
    source: DatabaseInfo,
}

impl ParenthesizedDefaultTranslator {
    pub fn new() -> Self {
        Self {
            source: DatabaseInfo::mssql_server(),
        }
    }

    /// The bare value of a wrapped literal.
    pub fn unwrap_default(text: &str) -> Option<String> {
        let inner = strip_enclosing_parens(text);
        if let Some(caps) = string_literal().captures(inner) {
            return caps.get(1).map(|m| m.as_str().replace("''", "'"));
        }
        number_literal()
            .is_match(inner)
            .then(|| inner.to_string())
    }
}

impl Default for ParenthesizedDefaultTranslator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Translator for ParenthesizedDefaultTranslator {
    fn source(&self) -> &DatabaseInfo {
        &self.source
    }

    fn supports(&self, script: Option<&Script>, context: &TranslationContext<'_>) -> bool {
        self.source.matches(context.source()) && script.is_some()
    }

    async fn translate(
        &self,
        script: Option<&Script>,
        _context: &mut TranslationContext<'_>,
    ) -> Result<Option<Script>> {
        Ok(script
            .and_then(|s| Self::unwrap_default(s.text()))
            .map(Script::new))
    }
}
