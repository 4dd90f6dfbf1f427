//! MySQL-specific default value translation.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use crate::config::ZeroDateTimeBehavior;
use crate::core::schema::Column;
use crate::core::{DatabaseInfo, SqlValue};
use crate::dialect::types;
use crate::error::{MigrateError, Result};
use crate::translate::{
    Script, TranslationContext, Translator, CHECK_SQL_MODE, SQL_MODE, USE_EXPLICIT_DEFAULTS,
};

fn zero_date_time() -> &'static Regex {
    static ZERO_RE: OnceLock<Regex> = OnceLock::new();
    ZERO_RE.get_or_init(|| {
        Regex::new(r"^0000-00-00( 00:00:00(\.0+)?)?$").expect("valid zero date-time regex")
    })
}

/// Handles MySQL's `0000-00-00` dates, which no other vendor accepts.
#[derive(Debug, Clone)]
pub struct ZeroDateTimeTranslator {
    source: DatabaseInfo,
}

impl ZeroDateTimeTranslator {
    pub fn new() -> Self {
        Self {
            source: DatabaseInfo::mysql(),
        }
    }

    pub fn is_zero(text: &str) -> bool {
        zero_date_time().is_match(text.trim())
    }
}

impl Default for ZeroDateTimeTranslator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Translator for ZeroDateTimeTranslator {
    fn source(&self) -> &DatabaseInfo {
        &self.source
    }

    fn supports(&self, script: Option<&Script>, context: &TranslationContext<'_>) -> bool {
        self.source.matches(context.source())
            && script.is_some_and(|s| Self::is_zero(s.text()))
            && context
                .column()
                .map_or(true, |c| types::is_temporal(c.type_code))
    }

    async fn translate(
        &self,
        script: Option<&Script>,
        context: &mut TranslationContext<'_>,
    ) -> Result<Option<Script>> {
        let Some(script) = script else {
            return Ok(None);
        };
        let text = script.text().trim();
        let column = context.column();
        match context.zero_date_time_behavior() {
            ZeroDateTimeBehavior::Round => {
                let with_time = text.len() > "0000-00-00".len()
                    || column.is_some_and(|c| c.type_code == types::TIMESTAMP);
                let rounded = if with_time {
                    "0001-01-01 00:00:00"
                } else {
                    "0001-01-01"
                };
                Ok(Some(Script::new(rounded)))
            }
            ZeroDateTimeBehavior::ConvertToNull => {
                if column.map_or(true, |c| c.nullable) {
                    Ok(Some(Script::literal("NULL")))
                } else {
                    // NOT NULL columns keep the value, quoted
                    Ok(Some(Script::literal(format!("'{}'", text))))
                }
            }
            ZeroDateTimeBehavior::Exception => Err(MigrateError::translation(format!(
                "zero date-time '{}'{} cannot be translated",
                text,
                column
                    .map(|c| format!(" in column {}", c.name))
                    .unwrap_or_default()
            ))),
        }
    }
}

/// Materializes the implicit default MySQL applies to `NOT NULL` columns
/// without an explicit one, unless the server runs in strict mode.
#[derive(Debug, Clone)]
pub struct ImplicitDefaultTranslator {
    source: DatabaseInfo,
}

impl ImplicitDefaultTranslator {
    pub fn new() -> Self {
        Self {
            source: DatabaseInfo::mysql(),
        }
    }

    /// Value MySQL uses for `column` in non-strict mode.
    pub fn implicit_default(column: &Column) -> Option<Script> {
        if let Some(first) = column.enum_values.first() {
            return Some(Script::new(first.clone()));
        }
        let is_year = column
            .type_name
            .as_deref()
            .is_some_and(|name| name.eq_ignore_ascii_case("YEAR"));
        let value = match column.type_code {
            _ if is_year => "0000",
            code if types::is_numeric(code) => "0",
            code if types::is_character(code) => "",
            types::DATE => "0000-00-00",
            types::TIMESTAMP => "0000-00-00 00:00:00",
            types::TIME => "00:00:00",
            _ => return None,
        };
        Some(Script::new(value))
    }
}

impl Default for ImplicitDefaultTranslator {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether a `sql_mode` value enables strict mode.
pub fn is_strict_mode(sql_mode: &str) -> bool {
    sql_mode
        .split(',')
        .map(str::trim)
        .any(|mode| mode.eq_ignore_ascii_case("STRICT_TRANS_TABLES") || mode.eq_ignore_ascii_case("STRICT_ALL_TABLES"))
}

/// Server SQL mode, read once per context and cached in its state. Without a
/// session the mode is unknown and treated as empty.
async fn sql_mode(context: &mut TranslationContext<'_>) -> Result<String> {
    if let Some(mode) = context.state(SQL_MODE).and_then(SqlValue::as_str) {
        return Ok(mode.to_string());
    }
    let mut mode = String::new();
    if let Some(session) = context.session() {
        let mut rows = session
            .query(
                "SELECT @@GLOBAL.SQL_MODE AS GLOBAL_MODE, @@SESSION.SQL_MODE AS SESSION_MODE",
                &[],
            )
            .await?;
        if let Some(row) = rows.next().await? {
            mode = row
                .string("SESSION_MODE")
                .or_else(|| row.string("GLOBAL_MODE"))
                .unwrap_or_default();
        }
        debug!("MySQL SQL mode is '{}'", mode);
    }
    context.set_state(SQL_MODE, mode.as_str());
    Ok(mode)
}

#[async_trait]
impl Translator for ImplicitDefaultTranslator {
    fn source(&self) -> &DatabaseInfo {
        &self.source
    }

    fn supports(&self, script: Option<&Script>, context: &TranslationContext<'_>) -> bool {
        self.source.matches(context.source())
            && script.is_none()
            && context.flag(USE_EXPLICIT_DEFAULTS, false)
            && context
                .column()
                .is_some_and(|c| !c.nullable && !c.auto_increment)
    }

    async fn translate(
        &self,
        _script: Option<&Script>,
        context: &mut TranslationContext<'_>,
    ) -> Result<Option<Script>> {
        let Some(column) = context.column() else {
            return Ok(None);
        };
        if context.flag(CHECK_SQL_MODE, true) && is_strict_mode(&sql_mode(context).await?) {
            return Ok(None);
        }
        Ok(Self::implicit_default(column))
    }
}
