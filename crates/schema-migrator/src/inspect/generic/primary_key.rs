use async_trait::async_trait;
use tracing::debug;

use super::{metadata, table_ref};
use crate::core::session::MetaDataRequest;
use crate::core::Identifier;
use crate::error::Result;
use crate::inspect::context::InspectionContext;
use crate::inspect::scope::InspectionScope;
use crate::inspect::{Inspector, MetaDataType};

/// Reads the primary key of one table at a time.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrimaryKeyInspector;

#[async_trait]
impl Inspector for PrimaryKeyInspector {
    fn object_type(&self) -> MetaDataType {
        MetaDataType::PrimaryKey
    }

    fn supports(&self, _context: &InspectionContext<'_>, scope: &InspectionScope) -> bool {
        scope.is_table_pinned()
    }

    async fn inspect_scope(&self, context: &mut InspectionContext<'_>, scope: &InspectionScope) -> Result<()> {
        let request = MetaDataRequest::PrimaryKeys {
            catalog: scope.catalog.clone(),
            schema: scope.schema.clone(),
            table: scope.table.clone(),
        };
        let mut rows = metadata(context, request).await?;
        let mut count = 0;
        while let Some(row) = rows.next().await? {
            let (Some(reference), Some(column)) = (
                table_ref(&row, "TABLE_CAT", "TABLE_SCHEM", "TABLE_NAME"),
                row.trimmed("COLUMN_NAME"),
            ) else {
                continue;
            };
            let name = row.trimmed("PK_NAME").map(Identifier::new);
            let primary_key = context
                .database_mut()
                .table_or_create(&reference)
                .primary_key_or_create(name);
            let position = row
                .int("KEY_SEQ")
                .unwrap_or(primary_key.columns().len() as i64 + 1);
            primary_key.add_column(Identifier::new(column), position as i32);
            count += 1;
        }
        debug!("Read {} primary key columns", count);
        Ok(())
    }
}
