use async_trait::async_trait;
use tracing::debug;

use super::{metadata, table_ref};
use crate::core::session::MetaDataRequest;
use crate::error::Result;
use crate::inspect::context::InspectionContext;
use crate::inspect::scope::InspectionScope;
use crate::inspect::{Inspector, MetaDataType};

/// Lists tables of the requested types.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableInspector;

#[async_trait]
impl Inspector for TableInspector {
    fn object_type(&self) -> MetaDataType {
        MetaDataType::Table
    }

    async fn inspect(&self, context: &mut InspectionContext<'_>) -> Result<()> {
        self.inspect_scope(context, &InspectionScope::default()).await
    }

    async fn inspect_scope(&self, context: &mut InspectionContext<'_>, scope: &InspectionScope) -> Result<()> {
        let request = MetaDataRequest::Tables {
            catalog: scope.catalog.clone(),
            schema_pattern: scope.schema.clone(),
            table_pattern: scope.table.clone(),
            types: scope.table_types.clone(),
        };
        let mut rows = metadata(context, request).await?;
        let mut count = 0;
        while let Some(row) = rows.next().await? {
            let Some(reference) = table_ref(&row, "TABLE_CAT", "TABLE_SCHEM", "TABLE_NAME") else {
                continue;
            };
            let table = context.database_mut().table_or_create(&reference);
            if let Some(table_type) = row.trimmed("TABLE_TYPE") {
                table.table_type = Some(table_type);
            }
            if let Some(comment) = row.trimmed("REMARKS") {
                table.comment = Some(comment);
            }
            count += 1;
        }
        debug!("Found {} tables", count);
        Ok(())
    }
}
