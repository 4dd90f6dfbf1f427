//! SQL values exchanged with the session collaborator.
//!
//! Catalog rows and bind parameters are both expressed as [`SqlValue`]s. Drivers
//! report metadata columns with inconsistent types (a `NULLABLE` flag may come
//! back as an integer, a string or a boolean), so the accessors here coerce
//! leniently instead of failing.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single SQL value in a row or a bind parameter list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    /// SQL NULL.
    Null,

    /// Boolean value.
    Bool(bool),

    /// Any integer value (all widths are widened to 64 bits).
    Int(i64),

    /// Exact numeric beyond the 64-bit range (sequence bounds, NUMBER columns).
    Decimal(Decimal),

    /// Floating point value.
    Float(f64),

    /// Text value.
    Text(String),

    /// Binary value.
    Bytes(Vec<u8>),

    /// Date without time component.
    Date(NaiveDate),

    /// Time without date component.
    Time(NaiveTime),

    /// Timestamp without timezone.
    DateTime(NaiveDateTime),
}

impl SqlValue {
    /// Check if this value is NULL.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Borrow the text content, if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Render the value as a string (NULL yields `None`).
    pub fn to_text(&self) -> Option<String> {
        match self {
            SqlValue::Null => None,
            SqlValue::Text(s) => Some(s.clone()),
            SqlValue::Bytes(b) => Some(String::from_utf8_lossy(b).into_owned()),
            other => Some(other.to_string()),
        }
    }

    /// Coerce to a 64-bit integer.
    ///
    /// Text is parsed after trimming; decimals and floats are truncated only
    /// when they carry no fractional part.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int(v) => Some(*v),
            SqlValue::Bool(v) => Some(i64::from(*v)),
            SqlValue::Decimal(d) if d.fract().is_zero() => d.to_i64(),
            SqlValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            SqlValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Coerce to an exact decimal.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            SqlValue::Int(v) => Some(Decimal::from(*v)),
            SqlValue::Decimal(d) => Some(*d),
            SqlValue::Float(f) => Decimal::try_from(*f).ok(),
            SqlValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Coerce to a boolean.
    ///
    /// Accepts the spellings catalogs use for flags: `YES`/`NO`, `Y`/`N`,
    /// `TRUE`/`FALSE`, `1`/`0` and non-zero integers.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SqlValue::Bool(v) => Some(*v),
            SqlValue::Int(v) => Some(*v != 0),
            SqlValue::Decimal(d) => Some(!d.is_zero()),
            SqlValue::Text(s) => match s.trim().to_ascii_uppercase().as_str() {
                "YES" | "Y" | "TRUE" | "T" | "1" => Some(true),
                "NO" | "N" | "FALSE" | "F" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Bool(v) => write!(f, "{}", v),
            SqlValue::Int(v) => write!(f, "{}", v),
            SqlValue::Decimal(v) => write!(f, "{}", v),
            SqlValue::Float(v) => write!(f, "{}", v),
            SqlValue::Text(v) => write!(f, "{}", v),
            SqlValue::Bytes(v) => write!(f, "{}", String::from_utf8_lossy(v)),
            SqlValue::Date(v) => write!(f, "{}", v),
            SqlValue::Time(v) => write!(f, "{}", v),
            SqlValue::DateTime(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(i64::from(v))
    }
}

impl From<u64> for SqlValue {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(v) => SqlValue::Int(v),
            Err(_) => SqlValue::Decimal(Decimal::from(v)),
        }
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<Decimal> for SqlValue {
    fn from(v: Decimal) -> Self {
        SqlValue::Decimal(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_i64_coercions() {
        assert_eq!(SqlValue::Int(7).as_i64(), Some(7));
        assert_eq!(SqlValue::Text(" 42 ".into()).as_i64(), Some(42));
        assert_eq!(SqlValue::Decimal(Decimal::new(30, 1)).as_i64(), Some(3));
        assert_eq!(SqlValue::Decimal(Decimal::new(35, 1)).as_i64(), None);
        assert_eq!(SqlValue::Null.as_i64(), None);
    }

    #[test]
    fn test_as_bool_catalog_spellings() {
        assert_eq!(SqlValue::Text("YES".into()).as_bool(), Some(true));
        assert_eq!(SqlValue::Text("no".into()).as_bool(), Some(false));
        assert_eq!(SqlValue::Text("Y".into()).as_bool(), Some(true));
        assert_eq!(SqlValue::Int(0).as_bool(), Some(false));
        assert_eq!(SqlValue::Text("maybe".into()).as_bool(), None);
    }

    #[test]
    fn test_large_unsigned_becomes_decimal() {
        let value = SqlValue::from(u64::MAX);
        assert!(matches!(value, SqlValue::Decimal(_)));
        assert_eq!(value.to_text().as_deref(), Some("18446744073709551615"));
    }

    #[test]
    fn test_option_into_value() {
        let none: Option<&str> = None;
        assert!(SqlValue::from(none).is_null());
        assert_eq!(SqlValue::from(Some("x")), SqlValue::Text("x".into()));
    }
}
