//! Indexes, keys, checks, triggers and sequences.
//!
//! Composite objects keep their column lists ordered by position no matter in
//! which order catalog rows arrive.

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use super::identifier::Identifier;
use super::schema::TableRef;

/// Column sort order within an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Parse the `ASC_OR_DESC` metadata field (`A`, `D` or null).
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "A" | "ASC" => Some(SortOrder::Asc),
            "D" | "DESC" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

/// A column of an index at a 1-based position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexColumn {
    pub column: Identifier,
    pub position: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
}

/// An index on a table.
#[derive(Debug, Clone, Serialize)]
pub struct Index {
    #[serde(skip)]
    pub table: TableRef,
    pub name: Identifier,
    pub unique: bool,
    columns: Vec<IndexColumn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

impl Index {
    pub fn new(table: TableRef, name: Identifier) -> Self {
        Self {
            table,
            name,
            unique: false,
            columns: Vec::new(),
            filter_condition: None,
            expression: None,
        }
    }

    /// Add or reposition a column, keeping the list ordered by position.
    pub fn add_column(&mut self, column: Identifier, position: i32, sort_order: Option<SortOrder>) {
        self.columns.retain(|c| c.column != column);
        let at = self
            .columns
            .iter()
            .position(|c| c.position > position)
            .unwrap_or(self.columns.len());
        self.columns.insert(
            at,
            IndexColumn {
                column,
                position,
                sort_order,
            },
        );
    }

    pub fn columns(&self) -> &[IndexColumn] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.column.value()).collect()
    }
}

/// A column of a primary key at its 1-based key sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyColumn {
    pub column: Identifier,
    pub position: i32,
}

/// A table's primary key.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PrimaryKey {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Identifier>,
    columns: Vec<KeyColumn>,
}

impl PrimaryKey {
    pub fn new(name: Option<Identifier>) -> Self {
        Self {
            name,
            columns: Vec::new(),
        }
    }

    /// Add or reposition a column, keeping the list ordered by key sequence.
    pub fn add_column(&mut self, column: Identifier, position: i32) {
        self.columns.retain(|c| c.column != column);
        let at = self
            .columns
            .iter()
            .position(|c| c.position > position)
            .unwrap_or(self.columns.len());
        self.columns.insert(at, KeyColumn { column, position });
    }

    pub fn columns(&self) -> &[KeyColumn] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.column.value()).collect()
    }

    pub fn contains(&self, column: &Identifier) -> bool {
        self.columns.iter().any(|c| &c.column == column)
    }
}

/// Foreign key update/delete rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReferenceAction {
    Cascade,
    Restrict,
    SetNull,
    NoAction,
    SetDefault,
}

impl ReferenceAction {
    /// Map the `UPDATE_RULE`/`DELETE_RULE` metadata codes.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(ReferenceAction::Cascade),
            1 => Some(ReferenceAction::Restrict),
            2 => Some(ReferenceAction::SetNull),
            3 => Some(ReferenceAction::NoAction),
            4 => Some(ReferenceAction::SetDefault),
            _ => None,
        }
    }

    /// Parse the textual rule used by `INFORMATION_SCHEMA` views.
    pub fn from_rule(rule: &str) -> Option<Self> {
        match rule.trim().to_ascii_uppercase().as_str() {
            "CASCADE" => Some(ReferenceAction::Cascade),
            "RESTRICT" => Some(ReferenceAction::Restrict),
            "SET NULL" | "SET_NULL" => Some(ReferenceAction::SetNull),
            "NO ACTION" | "NO_ACTION" => Some(ReferenceAction::NoAction),
            "SET DEFAULT" | "SET_DEFAULT" => Some(ReferenceAction::SetDefault),
            _ => None,
        }
    }

    pub fn sql(&self) -> &'static str {
        match self {
            ReferenceAction::Cascade => "CASCADE",
            ReferenceAction::Restrict => "RESTRICT",
            ReferenceAction::SetNull => "SET NULL",
            ReferenceAction::NoAction => "NO ACTION",
            ReferenceAction::SetDefault => "SET DEFAULT",
        }
    }
}

impl fmt::Display for ReferenceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql())
    }
}

/// Foreign key constraint timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Deferrability {
    InitiallyDeferred,
    InitiallyImmediate,
    NotDeferrable,
}

impl Deferrability {
    /// Map the `DEFERRABILITY` metadata codes.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            5 => Some(Deferrability::InitiallyDeferred),
            6 => Some(Deferrability::InitiallyImmediate),
            7 => Some(Deferrability::NotDeferrable),
            _ => None,
        }
    }
}

/// One source column → target column pair of a foreign key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reference {
    pub source_column: Identifier,
    pub target_column: Identifier,
    pub position: i32,
}

/// A foreign key, owned by its source table.
#[derive(Debug, Clone, Serialize)]
pub struct ForeignKey {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Identifier>,
    #[serde(skip)]
    pub source: TableRef,
    pub target: TableRef,
    references: Vec<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_action: Option<ReferenceAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_action: Option<ReferenceAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deferrability: Option<Deferrability>,
}

impl ForeignKey {
    pub fn new(name: Option<Identifier>, source: TableRef, target: TableRef) -> Self {
        Self {
            name,
            source,
            target,
            references: Vec::new(),
            update_action: None,
            delete_action: None,
            deferrability: None,
        }
    }

    /// Add a column pair, keeping references ordered by key sequence.
    pub fn add_reference(&mut self, source_column: Identifier, target_column: Identifier, position: i32) {
        self.references.retain(|r| r.position != position);
        let at = self
            .references
            .iter()
            .position(|r| r.position > position)
            .unwrap_or(self.references.len());
        self.references.insert(
            at,
            Reference {
                source_column,
                target_column,
                position,
            },
        );
    }

    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    pub fn source_columns(&self) -> Vec<&Identifier> {
        self.references.iter().map(|r| &r.source_column).collect()
    }

    /// Whether two keys describe the same constraint: equal names when both
    /// are named, otherwise the same target and source columns.
    pub fn same_identity(&self, other: &ForeignKey) -> bool {
        match (&self.name, &other.name) {
            (Some(a), Some(b)) => a == b,
            _ => self.target == other.target && self.source_columns() == other.source_columns(),
        }
    }

    /// Fold another definition of the same key into this one.
    pub fn merge(&mut self, other: ForeignKey) {
        if self.name.is_none() {
            self.name = other.name;
        }
        for reference in other.references {
            self.add_reference(reference.source_column, reference.target_column, reference.position);
        }
        self.update_action = self.update_action.or(other.update_action);
        self.delete_action = self.delete_action.or(other.delete_action);
        self.deferrability = self.deferrability.or(other.deferrability);
    }
}

/// A check constraint on a table or a column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Check {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Identifier>,
    pub clause: String,
}

impl Check {
    pub fn new(name: Option<Identifier>, clause: impl Into<String>) -> Self {
        Self {
            name,
            clause: clause.into(),
        }
    }

    /// Named checks are identified by name, unnamed ones by clause.
    pub fn same_identity(&self, other: &Check) -> bool {
        match (&self.name, &other.name) {
            (Some(a), Some(b)) => a == b,
            _ => self.clause.trim() == other.clause.trim(),
        }
    }
}

/// Whether a check clause is a nullability artifact (`... IS NOT NULL`).
///
/// Catalogs such as Oracle's report `NOT NULL` columns as check constraints;
/// those never become checks in the model.
pub fn is_not_null_check(clause: &str) -> bool {
    let trimmed = clause.trim_end();
    let suffix = "IS NOT NULL";
    trimmed.len() >= suffix.len()
        && trimmed.is_char_boundary(trimmed.len() - suffix.len())
        && trimmed[trimmed.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}

/// When a trigger fires relative to the statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TriggerTime {
    Before,
    After,
}

impl TriggerTime {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_uppercase().as_str() {
            "BEFORE" => Some(TriggerTime::Before),
            "AFTER" => Some(TriggerTime::After),
            _ => None,
        }
    }

    pub fn sql(&self) -> &'static str {
        match self {
            TriggerTime::Before => "BEFORE",
            TriggerTime::After => "AFTER",
        }
    }
}

/// The statement kind a trigger reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TriggerEvent {
    Insert,
    Update,
    Delete,
}

impl TriggerEvent {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_uppercase().as_str() {
            "INSERT" => Some(TriggerEvent::Insert),
            "UPDATE" => Some(TriggerEvent::Update),
            "DELETE" => Some(TriggerEvent::Delete),
            _ => None,
        }
    }

    pub fn sql(&self) -> &'static str {
        match self {
            TriggerEvent::Insert => "INSERT",
            TriggerEvent::Update => "UPDATE",
            TriggerEvent::Delete => "DELETE",
        }
    }
}

/// A row-level trigger attached to a table, optionally scoped to one column.
#[derive(Debug, Clone, Serialize)]
pub struct Trigger {
    #[serde(skip)]
    pub table: TableRef,
    pub name: Identifier,
    pub time: TriggerTime,
    pub event: TriggerEvent,
    pub body: String,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<Identifier>,
}

/// A sequence, stand-alone in a schema or backing an auto-increment column.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Sequence {
    pub name: Identifier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_with: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_value: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub increment_by: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_value: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<i64>,
    pub cycle: bool,
}

impl Sequence {
    pub fn new(name: Identifier) -> Self {
        Self {
            name,
            ..Default::default()
        }
    }
}
