//! Current date/time function aliasing.

use std::collections::HashSet;
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;

use super::{Script, TranslationContext, Translator};
use crate::core::DatabaseInfo;
use crate::error::Result;

/// Maps a source vendor's spellings of "now" to one target literal.
///
/// The whole script has to be one of the aliases, compared case-insensitively
/// after trimming, dropping enclosing parentheses (`(getdate())`) and
/// ignoring a fractional seconds precision (`CURRENT_TIMESTAMP(6)`).
#[derive(Debug, Clone)]
pub struct CurrentTimestampTranslator {
    source: DatabaseInfo,
    aliases: HashSet<String>,
    canonical: String,
}

impl CurrentTimestampTranslator {
    pub fn new<I, S>(source: DatabaseInfo, aliases: I, canonical: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            source,
            aliases: aliases.into_iter().map(|a| normalize(a.as_ref())).collect(),
            canonical: canonical.into(),
        }
    }

    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    pub fn is_alias(&self, text: &str) -> bool {
        self.aliases.contains(&normalize(text))
    }
}

fn normalize(text: &str) -> String {
    static PRECISION_RE: OnceLock<Regex> = OnceLock::new();
    let re = PRECISION_RE
        .get_or_init(|| Regex::new(r"\(\s*\d*\s*\)$").expect("valid precision regex"));
    let text = strip_enclosing_parens(text).to_uppercase();
    re.replace(&text, "()").into_owned()
}

/// Remove parentheses wrapping the whole text, repeatedly.
pub(crate) fn strip_enclosing_parens(text: &str) -> &str {
    let mut text = text.trim();
    while text.starts_with('(') && text.ends_with(')') && encloses(text) {
        text = text[1..text.len() - 1].trim();
    }
    text
}

fn encloses(text: &str) -> bool {
    let mut depth = 0i32;
    let last = text.len() - 1;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 && i != last {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

#[async_trait]
impl Translator for CurrentTimestampTranslator {
    fn source(&self) -> &DatabaseInfo {
        &self.source
    }

    fn supports(&self, script: Option<&Script>, context: &TranslationContext<'_>) -> bool {
        self.source.matches(context.source()) && script.is_some_and(|s| self.is_alias(s.text()))
    }

    async fn translate(
        &self,
        script: Option<&Script>,
        _context: &mut TranslationContext<'_>,
    ) -> Result<Option<Script>> {
        Ok(script
            .filter(|s| self.is_alias(s.text()))
            .map(|_| Script::literal(self.canonical.as_str())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mysql_to_nuodb() -> CurrentTimestampTranslator {
        CurrentTimestampTranslator::new(
            DatabaseInfo::mysql(),
            ["NOW()", "CURRENT_TIMESTAMP", "CURRENT_TIMESTAMP()", "LOCALTIME", "LOCALTIMESTAMP"],
            "CURRENT_TIMESTAMP",
        )
    }

    #[tokio::test]
    async fn test_aliases_normalize_to_canonical_literal() {
        let translator = mysql_to_nuodb();
        let mut ctx = TranslationContext::new(DatabaseInfo::mysql(), DatabaseInfo::nuodb());
        for text in ["NOW()", "now()", "CURRENT_TIMESTAMP", "localtime", " LocalTime "] {
            let script = Script::new(text);
            assert!(translator.supports(Some(&script), &ctx), "{}", text);
            let result = translator.translate(Some(&script), &mut ctx).await.unwrap();
            assert_eq!(result, Some(Script::literal("CURRENT_TIMESTAMP")), "{}", text);
        }
    }

    #[test]
    fn test_precision_and_parentheses() {
        let translator = mysql_to_nuodb();
        assert!(translator.is_alias("CURRENT_TIMESTAMP(6)"));
        assert!(translator.is_alias("(now())"));
        assert!(!translator.is_alias("NOW() + 1"));
        assert!(!translator.is_alias("DATE(NOW())"));
    }

    #[test]
    fn test_strip_enclosing_parens() {
        assert_eq!(strip_enclosing_parens("((0))"), "0");
        assert_eq!(strip_enclosing_parens("(getdate())"), "getdate()");
        assert_eq!(strip_enclosing_parens("(a)+(b)"), "(a)+(b)");
    }

    #[test]
    fn test_wrong_source_not_supported() {
        let ctx = TranslationContext::new(DatabaseInfo::oracle(), DatabaseInfo::nuodb());
        let script = Script::new("NOW()");
        assert!(!mysql_to_nuodb().supports(Some(&script), &ctx));
    }
}
