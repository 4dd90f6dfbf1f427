//! Regex-driven script rewriting.

use async_trait::async_trait;
use regex::Regex;

use super::{Script, TranslationContext, Translator};
use crate::core::DatabaseInfo;
use crate::error::Result;

/// Rewrites scripts whose whole text matches one of its patterns.
///
/// Patterns are tried in insertion order and matched case-insensitively
/// against the trimmed script. Replacements may refer to capture groups as
/// `$1` or `${name}`.
#[derive(Debug, Clone)]
pub struct PatternTranslator {
    source: DatabaseInfo,
    patterns: Vec<(Regex, String)>,
    literal: bool,
}

impl PatternTranslator {
    pub fn new(source: DatabaseInfo) -> Self {
        Self {
            source,
            patterns: Vec::new(),
            literal: false,
        }
    }

    /// Whether produced scripts are emitted verbatim.
    pub fn literal(mut self, literal: bool) -> Self {
        self.literal = literal;
        self
    }

    /// Add a pattern; it must match the whole script.
    pub fn pattern(mut self, pattern: &str, replacement: impl Into<String>) -> Result<Self> {
        self.add_pattern(pattern, replacement)?;
        Ok(self)
    }

    pub fn add_pattern(&mut self, pattern: &str, replacement: impl Into<String>) -> Result<&mut Self> {
        let regex = Regex::new(&format!("(?is)^(?:{})$", pattern))?;
        self.patterns.push((regex, replacement.into()));
        Ok(self)
    }

    /// Add an already compiled pattern. It is used as is, so anchoring and
    /// flags are up to the caller.
    pub fn rule(mut self, regex: &Regex, replacement: impl Into<String>) -> Self {
        self.patterns.push((regex.clone(), replacement.into()));
        self
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Rewrite `text` with the first matching pattern.
    pub fn rewrite(&self, text: &str) -> Option<String> {
        let text = text.trim();
        self.patterns.iter().find_map(|(regex, replacement)| {
            regex.captures(text).map(|caps| {
                let mut out = String::new();
                caps.expand(replacement, &mut out);
                out
            })
        })
    }
}

#[async_trait]
impl Translator for PatternTranslator {
    fn source(&self) -> &DatabaseInfo {
        &self.source
    }

    async fn translate(
        &self,
        script: Option<&Script>,
        _context: &mut TranslationContext<'_>,
    ) -> Result<Option<Script>> {
        Ok(script
            .and_then(|s| self.rewrite(s.text()))
            .map(|text| Script {
                text,
                literal: self.literal,
            }))
    }
}
