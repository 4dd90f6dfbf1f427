use async_trait::async_trait;
use tracing::debug;

use super::{metadata, table_ref};
use crate::core::constraint::SortOrder;
use crate::core::session::MetaDataRequest;
use crate::core::Identifier;
use crate::error::Result;
use crate::inspect::context::InspectionContext;
use crate::inspect::scope::InspectionScope;
use crate::inspect::{Inspector, MetaDataType};

/// `TYPE` of the statistics row some drivers mix into index info.
const TABLE_INDEX_STATISTIC: i64 = 0;

/// Reads indexes of one table at a time.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexInspector;

#[async_trait]
impl Inspector for IndexInspector {
    fn object_type(&self) -> MetaDataType {
        MetaDataType::Index
    }

    /// Index metadata is only available for an exactly named table.
    fn supports(&self, _context: &InspectionContext<'_>, scope: &InspectionScope) -> bool {
        scope.is_table_pinned()
    }

    async fn inspect_scope(&self, context: &mut InspectionContext<'_>, scope: &InspectionScope) -> Result<()> {
        let request = MetaDataRequest::IndexInfo {
            catalog: scope.catalog.clone(),
            schema: scope.schema.clone(),
            table: scope.table.clone(),
            unique: false,
            approximate: true,
        };
        let mut rows = metadata(context, request).await?;
        let mut count = 0;
        while let Some(row) = rows.next().await? {
            if row.int("TYPE") == Some(TABLE_INDEX_STATISTIC) {
                continue;
            }
            let (Some(reference), Some(name)) = (
                table_ref(&row, "TABLE_CAT", "TABLE_SCHEM", "TABLE_NAME"),
                row.trimmed("INDEX_NAME"),
            ) else {
                continue;
            };

            let index = context
                .database_mut()
                .table_or_create(&reference)
                .index_or_create(&Identifier::new(name));
            if let Some(non_unique) = row.boolean("NON_UNIQUE") {
                index.unique = !non_unique;
            }
            if let Some(filter) = row.trimmed("FILTER_CONDITION") {
                index.filter_condition = Some(filter);
            }
            if let Some(column) = row.trimmed("COLUMN_NAME") {
                let position = row.int("ORDINAL_POSITION").unwrap_or(index.columns().len() as i64 + 1);
                let sort_order = row.trimmed("ASC_OR_DESC").and_then(|c| SortOrder::from_code(&c));
                index.add_column(Identifier::new(column), position as i32, sort_order);
            }
            count += 1;
        }
        debug!("Read {} index columns", count);
        Ok(())
    }
}
