//! The inspected schema graph.
//!
//! A [`Database`] owns catalogs, which own schemas, which own tables and
//! sequences. Children are stored in [`ObjectMap`]s indexed by [`Identifier`],
//! so every `*_or_create` accessor is idempotent: asking twice for the same
//! name yields the same slot, and whatever the second caller sets merges into
//! what the first caller left there. Objects refer back to their owning table
//! through a [`TableRef`] key instead of a pointer.

use std::collections::HashMap;
use std::fmt;

use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;

use super::constraint::{is_not_null_check, Check, ForeignKey, Index, PrimaryKey, Sequence, Trigger};
use super::database_info::{DatabaseInfo, DriverInfo};
use super::identifier::{qualify, Identifier};
use super::script::Script;

/// Insertion-ordered container indexed by identifier.
#[derive(Debug, Clone)]
pub struct ObjectMap<T> {
    items: Vec<T>,
    index: HashMap<Identifier, usize>,
}

impl<T> Default for ObjectMap<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T> ObjectMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &Identifier) -> Option<&T> {
        self.index.get(id).map(|&i| &self.items[i])
    }

    pub fn get_mut(&mut self, id: &Identifier) -> Option<&mut T> {
        match self.index.get(id) {
            Some(&i) => self.items.get_mut(i),
            None => None,
        }
    }

    /// Return the existing entry or insert the one built by `create`.
    pub fn get_or_insert_with(&mut self, id: &Identifier, create: impl FnOnce() -> T) -> &mut T {
        let slot = match self.index.get(id) {
            Some(&i) => i,
            None => {
                self.items.push(create());
                let i = self.items.len() - 1;
                self.index.insert(id.clone(), i);
                i
            }
        };
        &mut self.items[slot]
    }

    pub fn contains(&self, id: &Identifier) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Serialize> Serialize for ObjectMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.items.len()))?;
        for item in &self.items {
            seq.serialize_element(item)?;
        }
        seq.end()
    }
}

/// Non-owning link to a table: its catalog, schema and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
pub struct TableRef {
    pub catalog: Identifier,
    pub schema: Identifier,
    pub table: Identifier,
}

impl TableRef {
    pub fn new(catalog: Identifier, schema: Identifier, table: Identifier) -> Self {
        Self {
            catalog,
            schema,
            table,
        }
    }

    /// Dotted name skipping an empty catalog or schema.
    pub fn qualified_name(&self) -> String {
        qualify([self.catalog.value(), self.schema.value(), self.table.value()])
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())
    }
}

/// Root of the inspected graph.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Database {
    pub info: DatabaseInfo,
    pub driver: DriverInfo,
    /// Name of the dialect resolved for this database.
    pub dialect: String,
    catalogs: ObjectMap<Catalog>,
}

impl Database {
    pub fn new(info: DatabaseInfo, driver: DriverInfo, dialect: impl Into<String>) -> Self {
        Self {
            info,
            driver,
            dialect: dialect.into(),
            catalogs: ObjectMap::new(),
        }
    }

    pub fn catalog(&self, name: &Identifier) -> Option<&Catalog> {
        self.catalogs.get(name)
    }

    /// Get-or-create a catalog. [`Identifier::EMPTY`] stands for "no catalog".
    pub fn catalog_or_create(&mut self, name: &Identifier) -> &mut Catalog {
        self.catalogs
            .get_or_insert_with(name, || Catalog::new(name.clone()))
    }

    pub fn catalogs(&self) -> impl Iterator<Item = &Catalog> {
        self.catalogs.iter()
    }

    pub fn schema(&self, catalog: &Identifier, schema: &Identifier) -> Option<&Schema> {
        self.catalog(catalog).and_then(|c| c.schema(schema))
    }

    pub fn schema_or_create(&mut self, catalog: &Identifier, schema: &Identifier) -> &mut Schema {
        self.catalog_or_create(catalog).schema_or_create(schema)
    }

    pub fn table(&self, table: &TableRef) -> Option<&Table> {
        self.schema(&table.catalog, &table.schema)
            .and_then(|s| s.table(&table.table))
    }

    pub fn table_mut(&mut self, table: &TableRef) -> Option<&mut Table> {
        self.catalogs
            .get_mut(&table.catalog)
            .and_then(|c| c.schemas.get_mut(&table.schema))
            .and_then(|s| s.tables.get_mut(&table.table))
    }

    /// Get-or-create the whole catalog → schema → table chain.
    pub fn table_or_create(&mut self, table: &TableRef) -> &mut Table {
        self.schema_or_create(&table.catalog, &table.schema)
            .table_or_create(&table.table)
    }

    /// Every table in catalog, schema and insertion order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.catalogs
            .iter()
            .flat_map(|c| c.schemas())
            .flat_map(|s| s.tables())
    }

    pub fn tables_mut(&mut self) -> impl Iterator<Item = &mut Table> {
        self.catalogs
            .iter_mut()
            .flat_map(|c| c.schemas.iter_mut())
            .flat_map(|s| s.tables.iter_mut())
    }

    /// Resolve a table by a possibly partial qualified name.
    ///
    /// An omitted catalog or schema matches any; the first table in
    /// catalog/schema order wins.
    pub fn find_table(&self, catalog: Option<&str>, schema: Option<&str>, table: &str) -> Option<&Table> {
        let table = Identifier::new(table);
        let catalog = catalog.map(Identifier::new);
        let schema = schema.map(Identifier::new);
        self.catalogs
            .iter()
            .filter(|c| catalog.as_ref().map_or(true, |id| &c.name == id))
            .flat_map(|c| c.schemas())
            .filter(|s| schema.as_ref().map_or(true, |id| &s.name == id))
            .find_map(|s| s.table(&table))
    }
}

/// A catalog (database on MySQL/SQL Server).
#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    pub name: Identifier,
    schemas: ObjectMap<Schema>,
}

impl Catalog {
    pub fn new(name: Identifier) -> Self {
        Self {
            name,
            schemas: ObjectMap::new(),
        }
    }

    pub fn schema(&self, name: &Identifier) -> Option<&Schema> {
        self.schemas.get(name)
    }

    /// Get-or-create a schema. [`Identifier::EMPTY`] stands for "no schema".
    pub fn schema_or_create(&mut self, name: &Identifier) -> &mut Schema {
        let catalog = self.name.clone();
        self.schemas
            .get_or_insert_with(name, || Schema::new(catalog, name.clone()))
    }

    pub fn schemas(&self) -> impl Iterator<Item = &Schema> {
        self.schemas.iter()
    }
}

/// A schema holding tables and stand-alone sequences.
#[derive(Debug, Clone, Serialize)]
pub struct Schema {
    #[serde(skip)]
    pub catalog: Identifier,
    pub name: Identifier,
    tables: ObjectMap<Table>,
    sequences: ObjectMap<Sequence>,
}

impl Schema {
    pub fn new(catalog: Identifier, name: Identifier) -> Self {
        Self {
            catalog,
            name,
            tables: ObjectMap::new(),
            sequences: ObjectMap::new(),
        }
    }

    pub fn table(&self, name: &Identifier) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn table_or_create(&mut self, name: &Identifier) -> &mut Table {
        let table = TableRef::new(self.catalog.clone(), self.name.clone(), name.clone());
        self.tables.get_or_insert_with(name, || Table::new(table))
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter()
    }

    pub fn sequence(&self, name: &Identifier) -> Option<&Sequence> {
        self.sequences.get(name)
    }

    pub fn sequence_or_create(&mut self, name: &Identifier) -> &mut Sequence {
        self.sequences
            .get_or_insert_with(name, || Sequence::new(name.clone()))
    }

    pub fn sequences(&self) -> impl Iterator<Item = &Sequence> {
        self.sequences.iter()
    }
}

/// A table or view with everything inspectors attach to it.
#[derive(Debug, Clone, Serialize)]
pub struct Table {
    #[serde(skip)]
    pub reference: TableRef,
    pub name: Identifier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    columns: ObjectMap<Column>,
    indexes: ObjectMap<Index>,
    #[serde(skip_serializing_if = "Option::is_none")]
    primary_key: Option<PrimaryKey>,
    foreign_keys: Vec<ForeignKey>,
    checks: Vec<Check>,
    triggers: Vec<Trigger>,
}

impl Table {
    pub fn new(reference: TableRef) -> Self {
        Self {
            name: reference.table.clone(),
            reference,
            table_type: None,
            comment: None,
            columns: ObjectMap::new(),
            indexes: ObjectMap::new(),
            primary_key: None,
            foreign_keys: Vec::new(),
            checks: Vec::new(),
            triggers: Vec::new(),
        }
    }

    pub fn table_ref(&self) -> &TableRef {
        &self.reference
    }

    pub fn qualified_name(&self) -> String {
        self.reference.qualified_name()
    }

    pub fn column(&self, name: &Identifier) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn column_mut(&mut self, name: &Identifier) -> Option<&mut Column> {
        self.columns.get_mut(name)
    }

    /// Get-or-create a column. New columns take the next ordinal position
    /// until an inspector sets the reported one.
    pub fn column_or_create(&mut self, name: &Identifier) -> &mut Column {
        let table = self.reference.clone();
        let next = self.columns.len() as i32 + 1;
        self.columns
            .get_or_insert_with(name, || Column::new(table, name.clone(), next))
    }

    /// Columns in ordinal position order.
    pub fn columns(&self) -> Vec<&Column> {
        let mut columns: Vec<&Column> = self.columns.iter().collect();
        columns.sort_by_key(|c| c.position);
        columns
    }

    pub fn columns_mut(&mut self) -> impl Iterator<Item = &mut Column> {
        self.columns.iter_mut()
    }

    pub fn index(&self, name: &Identifier) -> Option<&Index> {
        self.indexes.get(name)
    }

    pub fn index_or_create(&mut self, name: &Identifier) -> &mut Index {
        let table = self.reference.clone();
        self.indexes
            .get_or_insert_with(name, || Index::new(table, name.clone()))
    }

    pub fn indexes(&self) -> impl Iterator<Item = &Index> {
        self.indexes.iter()
    }

    pub fn primary_key(&self) -> Option<&PrimaryKey> {
        self.primary_key.as_ref()
    }

    /// Get-or-create the primary key, adopting a name once one is reported.
    pub fn primary_key_or_create(&mut self, name: Option<Identifier>) -> &mut PrimaryKey {
        let pk = self.primary_key.get_or_insert_with(PrimaryKey::default);
        if pk.name.is_none() {
            pk.name = name;
        }
        pk
    }

    /// Add a foreign key, merging into an existing one with the same identity.
    pub fn add_foreign_key(&mut self, foreign_key: ForeignKey) -> &mut ForeignKey {
        let at = match self
            .foreign_keys
            .iter()
            .position(|fk| fk.same_identity(&foreign_key))
        {
            Some(at) => {
                self.foreign_keys[at].merge(foreign_key);
                at
            }
            None => {
                self.foreign_keys.push(foreign_key);
                self.foreign_keys.len() - 1
            }
        };
        &mut self.foreign_keys[at]
    }

    pub fn foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys
    }

    /// Add a table-level check unless one with the same identity exists.
    /// Nullability artifacts (`... IS NOT NULL`) are never added.
    pub fn add_check(&mut self, check: Check) -> bool {
        if is_not_null_check(&check.clause) || self.checks.iter().any(|c| c.same_identity(&check)) {
            return false;
        }
        self.checks.push(check);
        true
    }

    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    /// Add a trigger, replacing one with the same name.
    pub fn add_trigger(&mut self, trigger: Trigger) {
        match self.triggers.iter_mut().find(|t| t.name == trigger.name) {
            Some(existing) => *existing = trigger,
            None => self.triggers.push(trigger),
        }
    }

    pub fn triggers(&self) -> &[Trigger] {
        &self.triggers
    }
}

/// A table column.
#[derive(Debug, Clone, Serialize)]
pub struct Column {
    #[serde(skip)]
    pub table: TableRef,
    pub name: Identifier,
    /// Generic type code (see `dialect::types`).
    pub type_code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precision: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<i32>,
    pub nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Script>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub position: i32,
    pub auto_increment: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<Sequence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check: Option<Check>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
}

impl Column {
    pub fn new(table: TableRef, name: Identifier, position: i32) -> Self {
        Self {
            table,
            name,
            type_code: 0,
            type_name: None,
            size: None,
            precision: None,
            scale: None,
            nullable: true,
            default_value: None,
            comment: None,
            position,
            auto_increment: false,
            sequence: None,
            check: None,
            enum_values: Vec::new(),
        }
    }

    /// Whether a default value was declared.
    pub fn has_default(&self) -> bool {
        self.default_value.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orders_ref() -> TableRef {
        TableRef::new(Identifier::new("shop"), Identifier::EMPTY, Identifier::new("orders"))
    }

    #[test]
    fn test_table_or_create_is_idempotent() {
        let mut db = Database::default();
        let first: *const Table = db.table_or_create(&orders_ref());
        db.table_or_create(&orders_ref()).comment = Some("customer orders".into());

        let upper = TableRef::new(Identifier::new("SHOP"), Identifier::EMPTY, Identifier::new("ORDERS"));
        let second: *const Table = db.table_or_create(&upper);
        assert_eq!(first, second);
        assert_eq!(db.tables().count(), 1);
        assert_eq!(
            db.table(&orders_ref()).unwrap().comment.as_deref(),
            Some("customer orders")
        );
    }

    #[test]
    fn test_column_or_create_merges_attributes() {
        let mut db = Database::default();
        let table = db.table_or_create(&orders_ref());
        {
            let column = table.column_or_create(&Identifier::new("total"));
            column.type_name = Some("DECIMAL".into());
            column.precision = Some(10);
        }
        let first: *const Column = table.column_or_create(&Identifier::new("total"));
        let column = table.column_or_create(&Identifier::new("TOTAL"));
        column.comment = Some("gross".into());
        let second: *const Column = column;
        assert_eq!(first, second);

        let column = table.column(&Identifier::new("total")).unwrap();
        assert_eq!(column.type_name.as_deref(), Some("DECIMAL"));
        assert_eq!(column.precision, Some(10));
        assert_eq!(column.comment.as_deref(), Some("gross"));
    }

    #[test]
    fn test_columns_in_position_order() {
        let mut table = Table::new(orders_ref());
        table.column_or_create(&Identifier::new("b")).position = 2;
        table.column_or_create(&Identifier::new("c")).position = 3;
        table.column_or_create(&Identifier::new("a")).position = 1;
        let names: Vec<&str> = table.columns().iter().map(|c| c.name.value()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_catalog_and_schema_idempotent() {
        let mut db = Database::default();
        let catalog: *const Catalog = db.catalog_or_create(&Identifier::new("hr"));
        let again: *const Catalog = db.catalog_or_create(&Identifier::new("HR"));
        assert_eq!(catalog, again);

        let schema: *const Schema = db.schema_or_create(&Identifier::new("hr"), &Identifier::new("dbo"));
        let again: *const Schema = db.schema_or_create(&Identifier::new("hr"), &Identifier::new("dbo"));
        assert_eq!(schema, again);
        assert_eq!(db.catalogs().count(), 1);
    }

    #[test]
    fn test_find_table_with_partial_name() {
        let mut db = Database::default();
        db.table_or_create(&TableRef::new(
            Identifier::EMPTY,
            Identifier::new("public"),
            Identifier::new("users"),
        ));
        assert!(db.find_table(None, Some("PUBLIC"), "Users").is_some());
        assert!(db.find_table(None, None, "users").is_some());
        assert!(db.find_table(None, Some("other"), "users").is_none());
    }

    #[test]
    fn test_duplicate_checks_ignored() {
        let mut table = Table::new(orders_ref());
        assert!(table.add_check(Check::new(Some(Identifier::new("ck_total")), "total > 0")));
        assert!(!table.add_check(Check::new(Some(Identifier::new("CK_TOTAL")), "total > 0")));
        assert_eq!(table.checks().len(), 1);
    }

    #[test]
    fn test_not_null_clause_never_a_check() {
        let mut table = Table::new(orders_ref());
        assert!(!table.add_check(Check::new(None, "\"CUSTOMER_ID\" is not null  ")));
        assert!(!table.add_check(Check::new(Some(Identifier::new("SYS_C0011")), "total IS NOT NULL")));
        assert!(table.add_check(Check::new(None, "total IS NOT NULL OR discount > 0")));
        assert_eq!(table.checks().len(), 1);
    }

    #[test]
    fn test_serializes_to_json() {
        let mut db = Database::new(DatabaseInfo::mysql(), DriverInfo::default(), "mysql");
        db.table_or_create(&orders_ref())
            .column_or_create(&Identifier::new("id"))
            .auto_increment = true;
        let json = serde_json::to_string(&db).unwrap();
        assert!(json.contains("\"orders\""));
        assert!(json.contains("\"auto_increment\":true"));
    }
}
