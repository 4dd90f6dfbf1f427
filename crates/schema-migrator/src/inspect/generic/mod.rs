//! Generic inspectors built on catalog metadata requests.
//!
//! These work on any session whose [`MetaDataRequest`] rows carry the
//! standard field names (`TABLE_CAT`, `TABLE_SCHEM`, `TABLE_NAME`, ...).
//! Vendor inspectors in `drivers::*` replace them where catalog views give
//! more detail.

mod column;
mod foreign_key;
mod index;
mod primary_key;
mod table;

use async_trait::async_trait;
use tracing::debug;

pub use column::ColumnInspector;
pub use foreign_key::{ForeignKeyGrouper, ForeignKeyInspector, KeyRow};
pub use index::IndexInspector;
pub use primary_key::PrimaryKeyInspector;
pub use table::TableInspector;

use super::context::InspectionContext;
use super::scope::{like_matches, InspectionScope};
use super::{Inspector, MetaDataType};
use crate::core::schema::TableRef;
use crate::core::session::{MetaDataRequest, Row, RowSet};
use crate::core::Identifier;
use crate::error::{MigrateError, Result};

/// Table reference read from three row fields; `None` without a table name.
pub fn table_ref(row: &Row, catalog: &str, schema: &str, table: &str) -> Option<TableRef> {
    let name = row.trimmed(table)?;
    Some(TableRef::new(
        Identifier::from_optional(row.trimmed(catalog).as_deref()),
        Identifier::from_optional(row.trimmed(schema).as_deref()),
        Identifier::new(name),
    ))
}

/// Issue a metadata request, tagging failures with the request name.
pub async fn metadata(context: &mut InspectionContext<'_>, request: MetaDataRequest) -> Result<RowSet> {
    context
        .session()
        .metadata(&request)
        .await
        .map_err(|e| MigrateError::query(e, format!("reading {} metadata", request.name())))
}

/// Lists catalogs.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogInspector;

#[async_trait]
impl Inspector for CatalogInspector {
    fn object_type(&self) -> MetaDataType {
        MetaDataType::Catalog
    }

    async fn inspect(&self, context: &mut InspectionContext<'_>) -> Result<()> {
        self.inspect_scope(context, &InspectionScope::default()).await
    }

    async fn inspect_scope(&self, context: &mut InspectionContext<'_>, scope: &InspectionScope) -> Result<()> {
        if !context.dialect().supports_catalogs() {
            context.database_mut().catalog_or_create(&Identifier::EMPTY);
            return Ok(());
        }

        let mut rows = metadata(context, MetaDataRequest::Catalogs).await?;
        let mut count = 0;
        while let Some(row) = rows.next().await? {
            let Some(name) = row.trimmed("TABLE_CAT") else {
                continue;
            };
            if like_matches(scope.catalog.as_deref(), &name) {
                context.database_mut().catalog_or_create(&Identifier::new(name));
                count += 1;
            }
        }
        debug!("Found {} catalogs", count);
        Ok(())
    }
}

/// Lists schemas.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaInspector;

#[async_trait]
impl Inspector for SchemaInspector {
    fn object_type(&self) -> MetaDataType {
        MetaDataType::Schema
    }

    async fn inspect(&self, context: &mut InspectionContext<'_>) -> Result<()> {
        self.inspect_scope(context, &InspectionScope::default()).await
    }

    async fn inspect_scope(&self, context: &mut InspectionContext<'_>, scope: &InspectionScope) -> Result<()> {
        if !context.dialect().supports_schemas() {
            return Ok(());
        }

        let request = MetaDataRequest::Schemas {
            catalog: scope.catalog.clone(),
            schema_pattern: scope.schema.clone(),
        };
        let mut rows = metadata(context, request).await?;
        let mut count = 0;
        while let Some(row) = rows.next().await? {
            let Some(schema) = row.trimmed("TABLE_SCHEM") else {
                continue;
            };
            let catalog = Identifier::from_optional(row.trimmed("TABLE_CATALOG").as_deref());
            context
                .database_mut()
                .schema_or_create(&catalog, &Identifier::new(schema));
            count += 1;
        }
        debug!("Found {} schemas", count);
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::core::SqlValue;

    #[tokio::test]
    async fn test_catalogs_filtered_by_pattern() {
        let mut session = CannedSession::new().rows(
            "catalogs",
            vec!["TABLE_CAT"],
            vec![vec![text("shop")], vec![text("shop_archive")], vec![text("hr")]],
        );
        let mut ctx = context(&mut session);
        let scope = InspectionScope::new().catalog("shop%");
        CatalogInspector.inspect_scope(&mut ctx, &scope).await.unwrap();

        let names: Vec<_> = ctx
            .results()
            .database()
            .catalogs()
            .map(|c| c.name.value().to_string())
            .collect();
        assert_eq!(names, vec!["shop", "shop_archive"]);
    }

    #[tokio::test]
    async fn test_schemas_under_catalog() {
        let mut session = CannedSession::new().rows(
            "schemas",
            vec!["TABLE_SCHEM", "TABLE_CATALOG"],
            vec![
                vec![text("sales"), text("shop")],
                vec![text("hr"), SqlValue::Null],
            ],
        );
        let mut ctx = context(&mut session);
        SchemaInspector.inspect(&mut ctx).await.unwrap();

        let database = ctx.results().database();
        assert!(database.schema(&Identifier::new("SHOP"), &Identifier::new("sales")).is_some());
        assert!(database.schema(&Identifier::EMPTY, &Identifier::new("hr")).is_some());
    }

    #[test]
    fn test_table_ref_from_row() {
        let row = Row::new(
            std::sync::Arc::from(vec!["TABLE_CAT".to_string(), "TABLE_SCHEM".to_string(), "TABLE_NAME".to_string()]),
            vec![SqlValue::Null, text(" sales "), text("orders")],
        );
        let table = table_ref(&row, "TABLE_CAT", "TABLE_SCHEM", "TABLE_NAME").unwrap();
        assert!(table.catalog.is_empty());
        assert_eq!(table.schema.value(), "sales");
        assert_eq!(table.table.value(), "orders");
    }
}
