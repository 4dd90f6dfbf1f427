//! Script translation between vendors.
//!
//! A [`TranslationManager`] owns the [`Translator`]s a target dialect applies
//! to scripts read from another vendor: column defaults, trigger bodies and
//! literals. Translators are tried in priority order and the first one that
//! produces a script wins; a translator that supports a script but returns
//! `None` simply passes it on.
//!
//! ```rust,ignore
//! let mut context = TranslationContext::new(DatabaseInfo::mysql(), DatabaseInfo::postgresql())
//!     .with_column(&column)
//!     .with_config(&config.translation);
//! let default = dialect
//!     .translation_manager()
//!     .translate(column.default_value.as_ref(), &mut context)
//!     .await?;
//! ```

pub mod current_timestamp;
pub mod literal;
pub mod pattern;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::config::{TranslationConfig, ZeroDateTimeBehavior};
use crate::core::constraint::Trigger;
use crate::core::schema::Column;
use crate::core::session::Session;
use crate::core::{DatabaseInfo, SqlValue};
use crate::error::Result;

pub use crate::core::Script;
pub use current_timestamp::CurrentTimestampTranslator;
pub use literal::{BitLiteralTranslator, BooleanLiterals, HexLiteralTranslator};
pub use pattern::PatternTranslator;

/// State key: zero date-time behavior (`round`, `convert_to_null`, `exception`).
pub const ZERO_DATE_TIME_BEHAVIOR: &str = "zero_date_time_behavior";
/// State key: materialize implicit defaults.
pub const USE_EXPLICIT_DEFAULTS: &str = "use_explicit_defaults";
/// State key: consult the server SQL mode before materializing defaults.
pub const CHECK_SQL_MODE: &str = "check_sql_mode";
/// State key: cached server SQL mode.
pub const SQL_MODE: &str = "sql_mode";

/// Everything a translator may look at besides the script itself.
pub struct TranslationContext<'a> {
    source: DatabaseInfo,
    target: DatabaseInfo,
    column: Option<&'a Column>,
    trigger: Option<&'a Trigger>,
    session: Option<&'a mut dyn Session>,
    state: HashMap<String, SqlValue>,
}

impl<'a> TranslationContext<'a> {
    pub fn new(source: DatabaseInfo, target: DatabaseInfo) -> Self {
        Self {
            source,
            target,
            column: None,
            trigger: None,
            session: None,
            state: HashMap::new(),
        }
    }

    /// The column whose default is being translated.
    pub fn with_column(mut self, column: &'a Column) -> Self {
        self.column = Some(column);
        self
    }

    /// The trigger whose body is being translated.
    pub fn with_trigger(mut self, trigger: &'a Trigger) -> Self {
        self.trigger = Some(trigger);
        self
    }

    /// Session on the source database, for translators that need to ask it
    /// something (e.g. the SQL mode).
    pub fn with_session(mut self, session: &'a mut dyn Session) -> Self {
        self.session = Some(session);
        self
    }

    /// Seed the carried state from configuration.
    pub fn with_config(mut self, config: &TranslationConfig) -> Self {
        self.set_state(
            ZERO_DATE_TIME_BEHAVIOR,
            config.zero_date_time_behavior.as_str(),
        );
        self.set_state(USE_EXPLICIT_DEFAULTS, config.use_explicit_defaults);
        self.set_state(CHECK_SQL_MODE, config.check_sql_mode);
        self
    }

    pub fn source(&self) -> &DatabaseInfo {
        &self.source
    }

    pub fn target(&self) -> &DatabaseInfo {
        &self.target
    }

    pub fn column(&self) -> Option<&'a Column> {
        self.column
    }

    pub fn trigger(&self) -> Option<&'a Trigger> {
        self.trigger
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&mut self) -> Option<&mut (dyn Session + 'a)> {
        self.session.as_deref_mut()
    }

    pub fn state(&self, key: &str) -> Option<&SqlValue> {
        self.state.get(key)
    }

    pub fn set_state(&mut self, key: impl Into<String>, value: impl Into<SqlValue>) {
        self.state.insert(key.into(), value.into());
    }

    /// Boolean state value, `default` when unset or not a boolean.
    pub fn flag(&self, key: &str, default: bool) -> bool {
        self.state(key).and_then(SqlValue::as_bool).unwrap_or(default)
    }

    /// Configured zero date-time behavior; unset or unknown values mean
    /// `Exception`.
    pub fn zero_date_time_behavior(&self) -> ZeroDateTimeBehavior {
        self.state(ZERO_DATE_TIME_BEHAVIOR)
            .and_then(SqlValue::as_str)
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }
}

impl fmt::Debug for TranslationContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationContext")
            .field("source", &self.source)
            .field("target", &self.target)
            .field("column", &self.column.map(|c| c.name.value()))
            .field("trigger", &self.trigger.map(|t| t.name.value()))
            .field("session", &self.session.is_some())
            .field("state", &self.state)
            .finish()
    }
}

/// A rule rewriting scripts from one source vendor.
#[async_trait]
pub trait Translator: Send + Sync + fmt::Debug {
    /// The source databases this translator reads scripts from.
    fn source(&self) -> &DatabaseInfo;

    /// Cheap, side-effect free applicability check.
    fn supports(&self, _script: Option<&Script>, context: &TranslationContext<'_>) -> bool {
        self.source().matches(context.source())
    }

    /// Translated script, or `None` when this rule does not apply.
    async fn translate(
        &self,
        script: Option<&Script>,
        context: &mut TranslationContext<'_>,
    ) -> Result<Option<Script>>;
}

#[derive(Debug, Clone)]
struct Registration {
    translator: Arc<dyn Translator>,
    priority: i32,
}

/// Priority-ordered translators of one target dialect.
#[derive(Debug, Clone, Default)]
pub struct TranslationManager {
    translators: Vec<Registration>,
}

impl TranslationManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register with priority 0.
    pub fn register(&mut self, translator: impl Translator + 'static) -> &mut Self {
        self.register_with_priority(translator, 0)
    }

    /// Register a translator; higher priorities run first, equal priorities
    /// in registration order.
    pub fn register_with_priority(
        &mut self,
        translator: impl Translator + 'static,
        priority: i32,
    ) -> &mut Self {
        let index = self
            .translators
            .iter()
            .position(|r| r.priority < priority)
            .unwrap_or(self.translators.len());
        self.translators.insert(
            index,
            Registration {
                translator: Arc::new(translator),
                priority,
            },
        );
        self
    }

    pub fn len(&self) -> usize {
        self.translators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.translators.is_empty()
    }

    /// Translators in the order they are tried.
    pub fn translators(&self) -> impl Iterator<Item = &Arc<dyn Translator>> {
        self.translators.iter().map(|r| &r.translator)
    }

    /// First non-`None` translation among supporting translators.
    pub async fn translate(
        &self,
        script: Option<&Script>,
        context: &mut TranslationContext<'_>,
    ) -> Result<Option<Script>> {
        for registration in &self.translators {
            let translator = &registration.translator;
            if !translator.supports(script, context) {
                continue;
            }
            if let Some(translated) = translator.translate(script, context).await? {
                debug!(
                    "Translated {:?} from {} to {:?} using {:?}",
                    script.map(Script::text),
                    context.source(),
                    translated.text(),
                    translator
                );
                return Ok(Some(translated));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::TableRef;
    use crate::core::Identifier;

    #[derive(Debug)]
    struct Fixed {
        source: DatabaseInfo,
        result: Option<&'static str>,
    }

    #[async_trait]
    impl Translator for Fixed {
        fn source(&self) -> &DatabaseInfo {
            &self.source
        }

        async fn translate(
            &self,
            _script: Option<&Script>,
            _context: &mut TranslationContext<'_>,
        ) -> Result<Option<Script>> {
            Ok(self.result.map(Script::new))
        }
    }

    fn fixed(result: Option<&'static str>) -> Fixed {
        Fixed {
            source: DatabaseInfo::mysql(),
            result,
        }
    }

    fn context<'a>() -> TranslationContext<'a> {
        TranslationContext::new(DatabaseInfo::mysql(), DatabaseInfo::postgresql())
    }

    #[tokio::test]
    async fn test_higher_priority_wins() {
        let mut manager = TranslationManager::new();
        manager.register(fixed(Some("low")));
        manager.register_with_priority(fixed(Some("high")), 10);

        let script = Script::new("x");
        let result = manager.translate(Some(&script), &mut context()).await.unwrap();
        assert_eq!(result.unwrap().text(), "high");
    }

    #[tokio::test]
    async fn test_none_falls_through_to_lower_priority() {
        let mut manager = TranslationManager::new();
        manager.register_with_priority(fixed(None), 10);
        manager.register(fixed(Some("fallback")));

        let script = Script::new("x");
        let result = manager.translate(Some(&script), &mut context()).await.unwrap();
        assert_eq!(result.unwrap().text(), "fallback");
    }

    #[tokio::test]
    async fn test_equal_priority_keeps_registration_order() {
        let mut manager = TranslationManager::new();
        manager.register(fixed(Some("first")));
        manager.register(fixed(Some("second")));

        let result = manager.translate(None, &mut context()).await.unwrap();
        assert_eq!(result.unwrap().text(), "first");
    }

    #[tokio::test]
    async fn test_other_source_not_supported() {
        let mut manager = TranslationManager::new();
        manager.register(Fixed {
            source: DatabaseInfo::oracle(),
            result: Some("oracle"),
        });

        let script = Script::new("x");
        let result = manager.translate(Some(&script), &mut context()).await.unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_context_state_from_config() {
        let config = TranslationConfig {
            zero_date_time_behavior: ZeroDateTimeBehavior::Round,
            use_explicit_defaults: true,
            check_sql_mode: false,
        };
        let table = TableRef::new(Identifier::EMPTY, Identifier::EMPTY, Identifier::new("t"));
        let column = Column::new(table, Identifier::new("c"), 1);
        let ctx = context().with_column(&column).with_config(&config);

        assert_eq!(ctx.zero_date_time_behavior(), ZeroDateTimeBehavior::Round);
        assert!(ctx.flag(USE_EXPLICIT_DEFAULTS, false));
        assert!(!ctx.flag(CHECK_SQL_MODE, true));
        assert_eq!(ctx.column().map(|c| c.name.value()), Some("c"));
        assert!(!ctx.has_session());
    }

    #[test]
    fn test_default_behavior_is_exception() {
        assert_eq!(
            context().zero_date_time_behavior(),
            ZeroDateTimeBehavior::Exception
        );
    }
}
