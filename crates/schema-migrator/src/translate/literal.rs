//! Bit and hexadecimal literal translation.
//!
//! MySQL writes `BIT` defaults as `b'0101'` and binary constants as `x'1A'`
//! or `0x1A`; PostgreSQL reports `B'0101'` with an optional cast. Target
//! vendors get a decimal number instead, or a boolean literal for one-bit
//! and boolean columns.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;

use super::{Script, TranslationContext, Translator};
use crate::core::schema::Column;
use crate::core::DatabaseInfo;
use crate::dialect::types;
use crate::error::Result;

/// How the target spells boolean constants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BooleanLiterals {
    pub true_literal: String,
    pub false_literal: String,
}

impl BooleanLiterals {
    /// `TRUE` / `FALSE`.
    pub fn keywords() -> Self {
        Self {
            true_literal: "TRUE".to_string(),
            false_literal: "FALSE".to_string(),
        }
    }

    /// `1` / `0`, for vendors without a boolean type.
    pub fn numeric() -> Self {
        Self {
            true_literal: "1".to_string(),
            false_literal: "0".to_string(),
        }
    }

    fn of(&self, value: bool) -> &str {
        if value {
            &self.true_literal
        } else {
            &self.false_literal
        }
    }
}

/// Column types a bit or hex literal can be converted for.
fn is_eligible(column: &Column) -> bool {
    types::is_integer(column.type_code)
        || matches!(
            column.type_code,
            types::BIT | types::BOOLEAN | types::NUMERIC | types::DECIMAL
        )
}

fn is_boolean(column: &Column) -> bool {
    column.type_code == types::BOOLEAN
        || (column.type_code == types::BIT && column.size.unwrap_or(1) <= 1)
}

fn convert(value: u128, column: &Column, booleans: &BooleanLiterals) -> Script {
    if is_boolean(column) {
        Script::literal(booleans.of(value != 0))
    } else {
        Script::new(value.to_string())
    }
}

fn digits(regex: &Regex, text: &str) -> Option<String> {
    let caps = regex.captures(text.trim())?;
    caps.iter()
        .skip(1)
        .flatten()
        .next()
        .map(|m| m.as_str().to_string())
}

fn parse_radix(digits: &str, radix: u32) -> Option<u128> {
    if digits.is_empty() {
        return Some(0);
    }
    u128::from_str_radix(digits, radix).ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BitSyntax {
    MySql,
    Postgres,
}

/// `b'0101'` (MySQL also `0b0101`; PostgreSQL `B'0101'::bit(4)`).
#[derive(Debug, Clone)]
pub struct BitLiteralTranslator {
    source: DatabaseInfo,
    syntax: BitSyntax,
    booleans: BooleanLiterals,
}

impl BitLiteralTranslator {
    pub fn mysql(booleans: BooleanLiterals) -> Self {
        Self {
            source: DatabaseInfo::mysql(),
            syntax: BitSyntax::MySql,
            booleans,
        }
    }

    pub fn postgres(booleans: BooleanLiterals) -> Self {
        Self {
            source: DatabaseInfo::postgresql(),
            syntax: BitSyntax::Postgres,
            booleans,
        }
    }

    fn regex(&self) -> &'static Regex {
        static MYSQL_RE: OnceLock<Regex> = OnceLock::new();
        static POSTGRES_RE: OnceLock<Regex> = OnceLock::new();
        match self.syntax {
            BitSyntax::MySql => MYSQL_RE.get_or_init(|| {
                Regex::new(r"(?i)^(?:b'([01]*)'|0b([01]+))$").expect("valid bit literal regex")
            }),
            BitSyntax::Postgres => POSTGRES_RE.get_or_init(|| {
                Regex::new(r#"(?i)^b'([01]*)'(?:::[\w\s"]+(?:\(\d+\))?)?$"#)
                    .expect("valid bit literal regex")
            }),
        }
    }

    /// Numeric value of a bit literal, `None` if `text` is not one.
    pub fn value(&self, text: &str) -> Option<u128> {
        digits(self.regex(), text).and_then(|d| parse_radix(&d, 2))
    }
}

#[async_trait]
impl Translator for BitLiteralTranslator {
    fn source(&self) -> &DatabaseInfo {
        &self.source
    }

    fn supports(&self, script: Option<&Script>, context: &TranslationContext<'_>) -> bool {
        self.source.matches(context.source())
            && script.is_some()
            && context.column().is_some_and(is_eligible)
    }

    async fn translate(
        &self,
        script: Option<&Script>,
        context: &mut TranslationContext<'_>,
    ) -> Result<Option<Script>> {
        let (Some(script), Some(column)) = (script, context.column()) else {
            return Ok(None);
        };
        Ok(self
            .value(script.text())
            .map(|value| convert(value, column, &self.booleans)))
    }
}

/// `x'1A'` and `0x1A`.
#[derive(Debug, Clone)]
pub struct HexLiteralTranslator {
    source: DatabaseInfo,
    booleans: BooleanLiterals,
}

impl HexLiteralTranslator {
    pub fn mysql(booleans: BooleanLiterals) -> Self {
        Self {
            source: DatabaseInfo::mysql(),
            booleans,
        }
    }

    /// Numeric value of a hex literal, `None` if `text` is not one.
    pub fn value(&self, text: &str) -> Option<u128> {
        static HEX_RE: OnceLock<Regex> = OnceLock::new();
        let re = HEX_RE.get_or_init(|| {
            Regex::new(r"(?i)^(?:x'([0-9a-f]*)'|0x([0-9a-f]+))$").expect("valid hex literal regex")
        });
        digits(re, text).and_then(|d| parse_radix(&d, 16))
    }
}

#[async_trait]
impl Translator for HexLiteralTranslator {
    fn source(&self) -> &DatabaseInfo {
        &self.source
    }

    fn supports(&self, script: Option<&Script>, context: &TranslationContext<'_>) -> bool {
        self.source.matches(context.source())
            && script.is_some()
            && context.column().is_some_and(is_eligible)
    }

    async fn translate(
        &self,
        script: Option<&Script>,
        context: &mut TranslationContext<'_>,
    ) -> Result<Option<Script>> {
        let (Some(script), Some(column)) = (script, context.column()) else {
            return Ok(None);
        };
        Ok(self
            .value(script.text())
            .map(|value| convert(value, column, &self.booleans)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::TableRef;
    use crate::core::Identifier;

    fn column(type_code: i32, size: Option<i64>) -> Column {
        let table = TableRef::new(Identifier::EMPTY, Identifier::EMPTY, Identifier::new("flags"));
        let mut column = Column::new(table, Identifier::new("f"), 1);
        column.type_code = type_code;
        column.size = size;
        column
    }

    async fn run(translator: &dyn Translator, text: &str, column: &Column) -> Option<Script> {
        let mut ctx = TranslationContext::new(translator.source().clone(), DatabaseInfo::nuodb())
            .with_column(column);
        let script = Script::new(text);
        if !translator.supports(Some(&script), &ctx) {
            return None;
        }
        translator.translate(Some(&script), &mut ctx).await.unwrap()
    }

    #[tokio::test]
    async fn test_bit_literal_to_decimal() {
        let translator = BitLiteralTranslator::mysql(BooleanLiterals::keywords());
        let bits = column(types::BIT, Some(8));
        assert_eq!(run(&translator, "b'0101'", &bits).await, Some(Script::new("5")));
        assert_eq!(run(&translator, "0b11", &bits).await, Some(Script::new("3")));
        assert_eq!(run(&translator, "b''", &bits).await, Some(Script::new("0")));
        assert_eq!(run(&translator, "b'012'", &bits).await, None);
    }

    #[tokio::test]
    async fn test_single_bit_becomes_boolean() {
        let translator = BitLiteralTranslator::mysql(BooleanLiterals::numeric());
        let flag = column(types::BIT, Some(1));
        assert_eq!(run(&translator, "b'1'", &flag).await, Some(Script::literal("1")));
        assert_eq!(run(&translator, "b'0'", &flag).await, Some(Script::literal("0")));
    }

    #[tokio::test]
    async fn test_ineligible_column_type() {
        let translator = BitLiteralTranslator::mysql(BooleanLiterals::keywords());
        let text = column(types::VARCHAR, Some(10));
        assert_eq!(run(&translator, "b'1'", &text).await, None);
    }

    #[tokio::test]
    async fn test_postgres_bit_with_cast() {
        let translator = BitLiteralTranslator::postgres(BooleanLiterals::keywords());
        assert_eq!(translator.value(r#"B'101'::"bit""#), Some(5));
        assert_eq!(translator.value("B'11'::bit varying(8)"), Some(3));
        let flag = column(types::BOOLEAN, None);
        assert_eq!(run(&translator, "B'1'", &flag).await, Some(Script::literal("TRUE")));
    }

    #[tokio::test]
    async fn test_hex_literals() {
        let translator = HexLiteralTranslator::mysql(BooleanLiterals::keywords());
        let number = column(types::BIGINT, None);
        assert_eq!(run(&translator, "x'1A'", &number).await, Some(Script::new("26")));
        assert_eq!(run(&translator, "0xff", &number).await, Some(Script::new("255")));
        assert_eq!(run(&translator, "0xZZ", &number).await, None);
    }
}
