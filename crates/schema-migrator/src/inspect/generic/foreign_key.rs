use async_trait::async_trait;
use tracing::debug;

use super::{metadata, table_ref};
use crate::core::constraint::{Deferrability, ForeignKey, ReferenceAction};
use crate::core::schema::TableRef;
use crate::core::session::{MetaDataRequest, Row};
use crate::core::Identifier;
use crate::error::Result;
use crate::inspect::context::InspectionContext;
use crate::inspect::scope::InspectionScope;
use crate::inspect::{Inspector, MetaDataType};

/// One column pair of a foreign key as reported by the catalog.
#[derive(Debug, Clone)]
pub struct KeyRow {
    pub name: Option<Identifier>,
    pub source: TableRef,
    pub target: TableRef,
    pub source_column: Identifier,
    pub target_column: Identifier,
    pub key_seq: i64,
    pub update_action: Option<ReferenceAction>,
    pub delete_action: Option<ReferenceAction>,
    pub deferrability: Option<Deferrability>,
}

impl KeyRow {
    /// Read an imported-keys row; `None` when a table or column is missing.
    pub fn from_row(row: &Row) -> Option<Self> {
        Some(Self {
            name: row.trimmed("FK_NAME").map(Identifier::new),
            source: table_ref(row, "FKTABLE_CAT", "FKTABLE_SCHEM", "FKTABLE_NAME")?,
            target: table_ref(row, "PKTABLE_CAT", "PKTABLE_SCHEM", "PKTABLE_NAME")?,
            source_column: Identifier::new(row.trimmed("FKCOLUMN_NAME")?),
            target_column: Identifier::new(row.trimmed("PKCOLUMN_NAME")?),
            key_seq: row.int("KEY_SEQ").unwrap_or(1),
            update_action: row.int("UPDATE_RULE").and_then(ReferenceAction::from_code),
            delete_action: row.int("DELETE_RULE").and_then(ReferenceAction::from_code),
            deferrability: row.int("DEFERRABILITY").and_then(Deferrability::from_code),
        })
    }
}

/// Folds ordered key rows into foreign keys.
///
/// A new key starts when the constraint name changes, when unnamed rows
/// switch source or target table, or when the key sequence restarts. Once a
/// zero sequence is seen every later sequence is shifted to start at 1.
#[derive(Debug, Default)]
pub struct ForeignKeyGrouper {
    current: Option<ForeignKey>,
    zero_based: bool,
    keys: Vec<ForeignKey>,
}

impl ForeignKeyGrouper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, row: KeyRow) {
        if row.key_seq == 0 {
            self.zero_based = true;
        }
        let position = (if self.zero_based { row.key_seq + 1 } else { row.key_seq }) as i32;

        let boundary = match &self.current {
            None => true,
            Some(fk) => {
                let renamed = match (&fk.name, &row.name) {
                    (Some(a), Some(b)) => a != b,
                    (None, None) => false,
                    _ => true,
                };
                renamed
                    || fk.source != row.source
                    || fk.target != row.target
                    || (position == 1 && !fk.references().is_empty())
            }
        };
        if boundary {
            if let Some(done) = self.current.take() {
                self.keys.push(done);
            }
            let mut fk = ForeignKey::new(row.name, row.source, row.target);
            fk.update_action = row.update_action;
            fk.delete_action = row.delete_action;
            fk.deferrability = row.deferrability;
            self.current = Some(fk);
        }
        if let Some(fk) = self.current.as_mut() {
            fk.add_reference(row.source_column, row.target_column, position);
        }
    }

    pub fn finish(mut self) -> Vec<ForeignKey> {
        if let Some(done) = self.current.take() {
            self.keys.push(done);
        }
        self.keys
    }
}

/// Reads the foreign keys declared by one table at a time.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForeignKeyInspector;

#[async_trait]
impl Inspector for ForeignKeyInspector {
    fn object_type(&self) -> MetaDataType {
        MetaDataType::ForeignKey
    }

    fn supports(&self, _context: &InspectionContext<'_>, scope: &InspectionScope) -> bool {
        scope.is_table_pinned()
    }

    async fn inspect_scope(&self, context: &mut InspectionContext<'_>, scope: &InspectionScope) -> Result<()> {
        let request = MetaDataRequest::ImportedKeys {
            catalog: scope.catalog.clone(),
            schema: scope.schema.clone(),
            table: scope.table.clone(),
        };
        let mut rows = metadata(context, request).await?;
        let mut grouper = ForeignKeyGrouper::new();
        while let Some(row) = rows.next().await? {
            if let Some(key_row) = KeyRow::from_row(&row) {
                grouper.add(key_row);
            }
        }

        let keys = grouper.finish();
        debug!("Read {} foreign keys", keys.len());
        for fk in keys {
            let source = fk.source.clone();
            context.database_mut().table_or_create(&source).add_foreign_key(fk);
        }
        Ok(())
    }
}
