//! Normalized object names and identifier validation.
//!
//! Every catalog, schema, table, column, index and constraint in the schema
//! model is keyed by an [`Identifier`]. Catalog metadata frequently reports the
//! same object with different letter case (a foreign key row saying `ORDERS`
//! for a table listed as `orders`), so identifiers compare ignoring ASCII
//! case.
//!
//! Identifiers coming from catalogs end up spliced into generated SQL, so the
//! quoting helpers here validate before escaping.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Serialize, Serializer};

use crate::error::{MigrateError, Result};

/// Maximum identifier length (conservative limit across databases).
/// - PostgreSQL: 63 bytes
/// - SQL Server: 128 characters
/// - MySQL: 64 characters
/// - NuoDB: 128 characters
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// A normalized object name.
///
/// Equality and hashing ignore ASCII case for every identifier, so the
/// relation stays transitive inside maps. Case sensitivity is carried as
/// metadata for rendering: a case-sensitive name keeps its exact spelling.
#[derive(Debug, Clone, Eq)]
pub struct Identifier {
    value: String,
    case_sensitive: bool,
}

impl Identifier {
    /// The absent catalog or schema.
    pub const EMPTY: Identifier = Identifier {
        value: String::new(),
        case_sensitive: false,
    };

    /// Create a case-insensitive identifier.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            case_sensitive: false,
        }
    }

    /// Create an identifier whose spelling must be preserved when rendered.
    pub fn case_sensitive(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            case_sensitive: true,
        }
    }

    /// Build from an optional catalog value, mapping `None` and `""` to [`Identifier::EMPTY`].
    pub fn from_optional(value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.is_empty() => Self::new(v),
            _ => Self::EMPTY,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// `None` for the empty identifier, the name otherwise.
    pub fn as_option(&self) -> Option<&str> {
        if self.is_empty() {
            None
        } else {
            Some(&self.value)
        }
    }
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        self.value.eq_ignore_ascii_case(&other.value)
    }
}

impl Hash for Identifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.value.bytes() {
            state.write_u8(b.to_ascii_lowercase());
        }
        state.write_u8(0xff);
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.value)
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Identifier::new(value)
    }
}

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Identifier::new(value)
    }
}

impl Default for Identifier {
    fn default() -> Self {
        Identifier::EMPTY
    }
}

/// Validate an identifier before it is spliced into SQL.
///
/// Rejects:
/// - Empty identifiers
/// - Identifiers containing null bytes (injection vector)
/// - Identifiers exceeding maximum length
///
/// # Errors
///
/// Returns `MigrateError::Config` for invalid identifiers with a descriptive message.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(MigrateError::Config(
            "Identifier cannot be empty".to_string(),
        ));
    }

    if name.contains('\0') {
        return Err(MigrateError::Config(format!(
            "SECURITY: Identifier contains null byte (possible injection attempt): {:?}",
            name
        )));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(MigrateError::Config(format!(
            "SECURITY: Identifier exceeds maximum length of {} bytes (got {} bytes): {:?}",
            MAX_IDENTIFIER_LENGTH,
            name.len(),
            name
        )));
    }

    Ok(())
}

/// Wrap a name in the given delimiters, doubling any embedded closing delimiter.
///
/// ```ignore
/// assert_eq!(quote_with("a\"b", '"', '"')?, "\"a\"\"b\"");
/// assert_eq!(quote_with("t]x", '[', ']')?, "[t]]x]");
/// ```
pub fn quote_with(name: &str, open: char, close: char) -> Result<String> {
    validate_identifier(name)?;
    let mut doubled = String::with_capacity(2);
    doubled.push(close);
    doubled.push(close);
    let escaped = name.replace(close, &doubled);
    Ok(format!("{}{}{}", open, escaped, close))
}

/// Join the non-empty parts of a qualified name with dots.
pub fn qualify<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}
