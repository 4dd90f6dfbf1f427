//! SQL fragments carried by the model and rewritten by translators.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A SQL fragment such as a column default, a trigger body or a literal.
///
/// A *literal* script is final SQL emitted verbatim (`CURRENT_TIMESTAMP`,
/// `NULL`, an already quoted `'abc'`). A non-literal script is a raw value the
/// DDL emitter still has to quote according to the column type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Script {
    pub text: String,
    #[serde(default)]
    pub literal: bool,
}

impl Script {
    /// A raw value to be quoted by the consumer.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            literal: false,
        }
    }

    /// Final SQL to emit verbatim.
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            literal: true,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_literal(&self) -> bool {
        self.literal
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for Script {
    fn from(text: &str) -> Self {
        Script::new(text)
    }
}
