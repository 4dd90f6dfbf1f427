//! Generic type codes, type-name templates and type aliases.
//!
//! Columns carry the driver-level generic type code (the JDBC `java.sql.Types`
//! numbering) plus the vendor type name. A dialect renders a target type name
//! from that pair through [`TypeNames`], and canonicalizes vendor quirks
//! through [`TypeAliases`].

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::core::schema::Column;
use crate::core::DatabaseInfo;

pub const BIT: i32 = -7;
pub const TINYINT: i32 = -6;
pub const SMALLINT: i32 = 5;
pub const INTEGER: i32 = 4;
pub const BIGINT: i32 = -5;
pub const FLOAT: i32 = 6;
pub const REAL: i32 = 7;
pub const DOUBLE: i32 = 8;
pub const NUMERIC: i32 = 2;
pub const DECIMAL: i32 = 3;
pub const CHAR: i32 = 1;
pub const VARCHAR: i32 = 12;
pub const LONGVARCHAR: i32 = -1;
pub const DATE: i32 = 91;
pub const TIME: i32 = 92;
pub const TIMESTAMP: i32 = 93;
pub const BINARY: i32 = -2;
pub const VARBINARY: i32 = -3;
pub const LONGVARBINARY: i32 = -4;
pub const NULL: i32 = 0;
pub const OTHER: i32 = 1111;
pub const BLOB: i32 = 2004;
pub const CLOB: i32 = 2005;
pub const BOOLEAN: i32 = 16;
pub const ROWID: i32 = -8;
pub const NCHAR: i32 = -15;
pub const NVARCHAR: i32 = -9;
pub const LONGNVARCHAR: i32 = -16;
pub const NCLOB: i32 = 2011;
pub const SQLXML: i32 = 2009;
pub const TIME_WITH_TIMEZONE: i32 = 2013;
pub const TIMESTAMP_WITH_TIMEZONE: i32 = 2014;

/// Standard name of a generic type code.
pub fn type_code_name(code: i32) -> Option<&'static str> {
    let name = match code {
        BIT => "BIT",
        TINYINT => "TINYINT",
        SMALLINT => "SMALLINT",
        INTEGER => "INTEGER",
        BIGINT => "BIGINT",
        FLOAT => "FLOAT",
        REAL => "REAL",
        DOUBLE => "DOUBLE",
        NUMERIC => "NUMERIC",
        DECIMAL => "DECIMAL",
        CHAR => "CHAR",
        VARCHAR => "VARCHAR",
        LONGVARCHAR => "LONGVARCHAR",
        DATE => "DATE",
        TIME => "TIME",
        TIMESTAMP => "TIMESTAMP",
        BINARY => "BINARY",
        VARBINARY => "VARBINARY",
        LONGVARBINARY => "LONGVARBINARY",
        NULL => "NULL",
        OTHER => "OTHER",
        BLOB => "BLOB",
        CLOB => "CLOB",
        BOOLEAN => "BOOLEAN",
        ROWID => "ROWID",
        NCHAR => "NCHAR",
        NVARCHAR => "NVARCHAR",
        LONGNVARCHAR => "LONGNVARCHAR",
        NCLOB => "NCLOB",
        SQLXML => "SQLXML",
        TIME_WITH_TIMEZONE => "TIME_WITH_TIMEZONE",
        TIMESTAMP_WITH_TIMEZONE => "TIMESTAMP_WITH_TIMEZONE",
        _ => return None,
    };
    Some(name)
}

/// Integer-like codes.
pub fn is_integer(code: i32) -> bool {
    matches!(code, TINYINT | SMALLINT | INTEGER | BIGINT)
}

/// Exact and approximate numeric codes, integers included.
pub fn is_numeric(code: i32) -> bool {
    is_integer(code) || matches!(code, FLOAT | REAL | DOUBLE | NUMERIC | DECIMAL | BIT | BOOLEAN)
}

pub fn is_character(code: i32) -> bool {
    matches!(
        code,
        CHAR | VARCHAR | LONGVARCHAR | NCHAR | NVARCHAR | LONGNVARCHAR | CLOB | NCLOB
    )
}

pub fn is_temporal(code: i32) -> bool {
    matches!(
        code,
        DATE | TIME | TIMESTAMP | TIME_WITH_TIMEZONE | TIMESTAMP_WITH_TIMEZONE
    )
}

/// A (type code, type name) pair as reported by a driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDesc {
    pub code: i32,
    pub name: Option<String>,
}

impl TypeDesc {
    pub fn new(code: i32, name: impl Into<String>) -> Self {
        Self {
            code,
            name: Some(name.into()),
        }
    }

    pub fn code(code: i32) -> Self {
        Self { code, name: None }
    }

    pub fn of_column(column: &Column) -> Self {
        Self {
            code: column.type_code,
            name: column.type_name.clone(),
        }
    }

    fn has_name(&self, name: &str) -> bool {
        self.name
            .as_deref()
            .is_some_and(|n| n.eq_ignore_ascii_case(name))
    }
}

/// Size, precision and scale substituted into `{N}`, `{P}` and `{S}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeOptions {
    pub size: Option<i64>,
    pub precision: Option<i32>,
    pub scale: Option<i32>,
}

impl TypeOptions {
    pub fn size(size: i64) -> Self {
        Self {
            size: Some(size),
            ..Default::default()
        }
    }

    pub fn precision_scale(precision: i32, scale: i32) -> Self {
        Self {
            size: None,
            precision: Some(precision),
            scale: Some(scale),
        }
    }

    pub fn of_column(column: &Column) -> Self {
        Self {
            size: column.size,
            precision: column.precision,
            scale: column.scale,
        }
    }
}

/// Substitute `{N}`, `{P}` and `{S}` placeholders.
///
/// A parenthesized group referring to an absent option is dropped, so
/// `VARCHAR({N})` without a size renders as `VARCHAR`.
pub fn render_template(template: &str, options: &TypeOptions) -> String {
    static GROUP_RE: OnceLock<Regex> = OnceLock::new();
    let group = GROUP_RE.get_or_init(|| {
        Regex::new(r"\s*\(([^()]*)\)").expect("valid type template group regex")
    });

    let substitute = |text: &str| -> Option<String> {
        let mut out = text.to_string();
        for (placeholder, value) in [
            ("{N}", options.size.map(|v| v.to_string())),
            ("{P}", options.precision.map(|v| v.to_string())),
            ("{S}", options.scale.map(|v| v.to_string())),
        ] {
            if out.contains(placeholder) {
                out = out.replace(placeholder, &value?);
            }
        }
        Some(out)
    };

    let pruned = group.replace_all(template, |caps: &regex::Captures<'_>| {
        let whole = &caps[0];
        match substitute(whole) {
            Some(rendered) => rendered,
            None => String::new(),
        }
    });
    substitute(&pruned).unwrap_or_else(|| pruned.into_owned())
}

/// Templates keyed by type code, optionally narrowed by type name.
#[derive(Debug, Clone, Default)]
pub struct TypeNameMap {
    named: Vec<(i32, String, String)>,
    by_code: HashMap<i32, String>,
}

impl TypeNameMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Template for a code regardless of the reported name.
    pub fn insert(&mut self, code: i32, template: impl Into<String>) -> &mut Self {
        self.by_code.insert(code, template.into());
        self
    }

    /// Template for a specific (code, name) pair.
    pub fn insert_named(&mut self, code: i32, name: impl Into<String>, template: impl Into<String>) -> &mut Self {
        self.named.push((code, name.into(), template.into()));
        self
    }

    /// Try (code, name) first, then the code alone.
    pub fn lookup(&self, desc: &TypeDesc) -> Option<&str> {
        self.named
            .iter()
            .find(|(code, name, _)| *code == desc.code && desc.has_name(name))
            .map(|(_, _, template)| template.as_str())
            .or_else(|| self.by_code.get(&desc.code).map(String::as_str))
    }

    pub fn is_empty(&self) -> bool {
        self.named.is_empty() && self.by_code.is_empty()
    }
}

/// Default template map plus overrides for specific source databases.
#[derive(Debug, Clone, Default)]
pub struct TypeNames {
    default: TypeNameMap,
    per_source: Vec<(DatabaseInfo, TypeNameMap)>,
}

impl TypeNames {
    pub fn new(default: TypeNameMap) -> Self {
        Self {
            default,
            per_source: Vec::new(),
        }
    }

    pub fn default_map(&mut self) -> &mut TypeNameMap {
        &mut self.default
    }

    /// Overrides used when columns come from a matching source database.
    pub fn source_map(&mut self, source: DatabaseInfo) -> &mut TypeNameMap {
        let at = match self.per_source.iter().position(|(key, _)| key == &source) {
            Some(at) => at,
            None => {
                self.per_source.push((source, TypeNameMap::new()));
                self.per_source.len() - 1
            }
        };
        &mut self.per_source[at].1
    }

    /// Render the target type name for a source column type.
    ///
    /// The most specific matching source map is consulted first, then the
    /// default map; each tries (code, name) before the code alone.
    pub fn type_name(&self, source: &DatabaseInfo, desc: &TypeDesc, options: &TypeOptions) -> Option<String> {
        let source_map = self
            .per_source
            .iter()
            .filter(|(key, _)| key.matches(source))
            .max_by_key(|(key, _)| key.specificity())
            .map(|(_, map)| map);

        source_map
            .and_then(|map| map.lookup(desc))
            .or_else(|| self.default.lookup(desc))
            .map(|template| render_template(template, options))
    }
}

/// One scored alias rule: code and/or name to a canonical descriptor.
#[derive(Debug, Clone)]
struct AliasRule {
    code: Option<i32>,
    name: Option<String>,
    alias: TypeDesc,
}

impl AliasRule {
    /// `None` when a set criterion fails; otherwise code match scores 1 and
    /// name match scores 2.
    fn score(&self, desc: &TypeDesc) -> Option<u8> {
        let mut score = 0;
        if let Some(code) = self.code {
            if code != desc.code {
                return None;
            }
            score += 1;
        }
        if let Some(name) = &self.name {
            if !desc.has_name(name) {
                return None;
            }
            score += 2;
        }
        Some(score)
    }
}

/// Ranked matchers mapping driver-reported types to canonical descriptors.
#[derive(Debug, Clone, Default)]
pub struct TypeAliases {
    rules: Vec<AliasRule>,
}

impl TypeAliases {
    pub fn new() -> Self {
        Self::default()
    }

    /// Alias a type code (any name).
    pub fn code(&mut self, code: i32, alias: TypeDesc) -> &mut Self {
        self.rules.push(AliasRule {
            code: Some(code),
            name: None,
            alias,
        });
        self
    }

    /// Alias a type name (any code).
    pub fn name(&mut self, name: impl Into<String>, alias: TypeDesc) -> &mut Self {
        self.rules.push(AliasRule {
            code: None,
            name: Some(name.into()),
            alias,
        });
        self
    }

    /// Alias an exact (code, name) pair.
    pub fn code_name(&mut self, code: i32, name: impl Into<String>, alias: TypeDesc) -> &mut Self {
        self.rules.push(AliasRule {
            code: Some(code),
            name: Some(name.into()),
            alias,
        });
        self
    }

    /// Highest scoring rule wins; earlier declarations win ties. Unmatched
    /// descriptors are returned unchanged.
    pub fn resolve(&self, desc: &TypeDesc) -> TypeDesc {
        let mut best: Option<(u8, &AliasRule)> = None;
        for rule in &self.rules {
            if let Some(score) = rule.score(desc) {
                if best.map_or(true, |(top, _)| score > top) {
                    best = Some((score, rule));
                }
            }
        }
        match best {
            Some((_, rule)) => rule.alias.clone(),
            None => desc.clone(),
        }
    }
}

/// Default SQL:2003 type templates.
pub fn sql2003_type_names() -> TypeNameMap {
    let mut map = TypeNameMap::new();
    map.insert(BIT, "BIT")
        .insert(BOOLEAN, "BOOLEAN")
        .insert(TINYINT, "SMALLINT")
        .insert(SMALLINT, "SMALLINT")
        .insert(INTEGER, "INTEGER")
        .insert(BIGINT, "BIGINT")
        .insert(REAL, "REAL")
        .insert(FLOAT, "FLOAT")
        .insert(DOUBLE, "DOUBLE PRECISION")
        .insert(NUMERIC, "NUMERIC({P},{S})")
        .insert(DECIMAL, "DECIMAL({P},{S})")
        .insert(CHAR, "CHAR({N})")
        .insert(VARCHAR, "VARCHAR({N})")
        .insert(LONGVARCHAR, "CLOB")
        .insert(NCHAR, "NCHAR({N})")
        .insert(NVARCHAR, "NVARCHAR({N})")
        .insert(LONGNVARCHAR, "NCLOB")
        .insert(DATE, "DATE")
        .insert(TIME, "TIME")
        .insert(TIMESTAMP, "TIMESTAMP")
        .insert(TIME_WITH_TIMEZONE, "TIME WITH TIME ZONE")
        .insert(TIMESTAMP_WITH_TIMEZONE, "TIMESTAMP WITH TIME ZONE")
        .insert(BINARY, "BINARY({N})")
        .insert(VARBINARY, "VARBINARY({N})")
        .insert(LONGVARBINARY, "BLOB")
        .insert(BLOB, "BLOB")
        .insert(CLOB, "CLOB")
        .insert(NCLOB, "NCLOB")
        .insert(SQLXML, "XML");
    map
}
