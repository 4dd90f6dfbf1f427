//! Inspection scope: which catalogs, schemas and tables to look at.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::schema::TableRef;

/// Filters narrowing an inspection.
///
/// Each filter is either an exact name or a SQL `LIKE` pattern (`%` and `_`
/// wildcards). `None` means "any".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionScope {
    pub catalog: Option<String>,
    pub schema: Option<String>,
    pub table: Option<String>,
    /// Table types to list; empty means all types.
    #[serde(default)]
    pub table_types: Vec<String>,
}

impl InspectionScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scope pinned to one table.
    pub fn for_table(table: &TableRef) -> Self {
        Self {
            catalog: table.catalog.as_option().map(str::to_string),
            schema: table.schema.as_option().map(str::to_string),
            table: Some(table.table.value().to_string()),
            table_types: Vec::new(),
        }
    }

    pub fn catalog(mut self, catalog: impl Into<String>) -> Self {
        self.catalog = Some(catalog.into());
        self
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn table_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.table_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Whether the text contains `LIKE` wildcards.
    pub fn has_wildcards(text: &str) -> bool {
        text.contains('%') || text.contains('_')
    }

    /// A single table is named exactly: the table is given and neither it
    /// nor the given catalog or schema carries wildcards.
    pub fn is_table_pinned(&self) -> bool {
        let exact = |part: &Option<String>| part.as_deref().map_or(true, |p| !Self::has_wildcards(p));
        self.table.is_some() && exact(&self.table) && exact(&self.catalog) && exact(&self.schema)
    }

    /// Whether a table type passes the type filter.
    pub fn includes_table_type(&self, table_type: &str) -> bool {
        self.table_types.is_empty()
            || self
                .table_types
                .iter()
                .any(|t| t.eq_ignore_ascii_case(table_type))
    }
}

/// Case-insensitive SQL `LIKE` match; `None` matches anything.
pub fn like_matches(pattern: Option<&str>, text: &str) -> bool {
    let Some(pattern) = pattern else {
        return true;
    };
    if !InspectionScope::has_wildcards(pattern) {
        return pattern.eq_ignore_ascii_case(text);
    }
    let mut expr = String::from("(?is)^");
    for c in pattern.chars() {
        match c {
            '%' => expr.push_str(".*"),
            '_' => expr.push('.'),
            other => expr.push_str(&regex::escape(&other.to_string())),
        }
    }
    expr.push('$');
    Regex::new(&expr).map_or(false, |re| re.is_match(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Identifier;

    #[test]
    fn test_pinned_scope() {
        assert!(InspectionScope::new().schema("sales").table("orders").is_table_pinned());
        assert!(!InspectionScope::new().schema("sales").is_table_pinned());
        assert!(!InspectionScope::new().table("ord%").is_table_pinned());
        assert!(!InspectionScope::new().schema("s%").table("orders").is_table_pinned());
    }

    #[test]
    fn test_for_table_skips_empty_parts() {
        let table = TableRef::new(Identifier::EMPTY, Identifier::new("hr"), Identifier::new("staff"));
        let scope = InspectionScope::for_table(&table);
        assert_eq!(scope.catalog, None);
        assert_eq!(scope.schema.as_deref(), Some("hr"));
        assert_eq!(scope.table.as_deref(), Some("staff"));
    }

    #[test]
    fn test_like_matches() {
        assert!(like_matches(None, "anything"));
        assert!(like_matches(Some("ord%"), "ORDERS"));
        assert!(like_matches(Some("t_1"), "tx1"));
        assert!(!like_matches(Some("t_1"), "tx12"));
        assert!(like_matches(Some("a.b"), "A.B"));
        assert!(!like_matches(Some("a.b"), "axb"));
    }

    #[test]
    fn test_table_type_filter() {
        let scope = InspectionScope::new().table_types(["TABLE", "VIEW"]);
        assert!(scope.includes_table_type("view"));
        assert!(!scope.includes_table_type("SYSTEM TABLE"));
        assert!(InspectionScope::new().includes_table_type("anything"));
    }
}
