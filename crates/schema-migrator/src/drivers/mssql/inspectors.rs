//! SQL Server inspectors over the `sys` catalog views.
//!
//! Catalog views only cover the current database, so both inspectors switch
//! to each catalog in turn and switch back to the original one afterwards.
//! Catalogs the session cannot switch to are skipped with a warning.

use async_trait::async_trait;
use tracing::debug;

use crate::core::constraint::{is_not_null_check, Check};
use crate::core::schema::TableRef;
use crate::core::session::Row;
use crate::core::Identifier;
use crate::drivers::{check_clause, read_sequence};
use crate::error::Result;
use crate::inspect::scope::like_matches;
use crate::inspect::{
    switch_catalog, InspectionContext, InspectionScope, Inspector, MetaDataType, QueryBuilder,
};

/// Work done inside one catalog.
#[async_trait]
trait PerCatalog: Send + Sync {
    async fn inspect_catalog(
        &self,
        context: &mut InspectionContext<'_>,
        catalog: &Identifier,
        scope: &InspectionScope,
    ) -> Result<()>;
}

/// Catalogs to visit: the scope's catalog when named exactly, else the
/// matching catalogs already in the results, else the current one.
async fn catalogs(context: &mut InspectionContext<'_>, scope: &InspectionScope) -> Result<Vec<String>> {
    if let Some(catalog) = scope
        .catalog
        .as_deref()
        .filter(|c| !InspectionScope::has_wildcards(c))
    {
        return Ok(vec![catalog.to_string()]);
    }
    let known: Vec<String> = context
        .results()
        .database()
        .catalogs()
        .filter(|c| !c.name.is_empty() && like_matches(scope.catalog.as_deref(), c.name.value()))
        .map(|c| c.name.value().to_string())
        .collect();
    if !known.is_empty() {
        return Ok(known);
    }
    Ok(context.session().catalog().await?.into_iter().collect())
}

async fn across_catalogs<T: PerCatalog>(
    inspector: &T,
    context: &mut InspectionContext<'_>,
    scope: &InspectionScope,
) -> Result<()> {
    let original = context.session().catalog().await?;
    let mut switched = false;
    let mut result = Ok(());
    for catalog in catalogs(context, scope).await? {
        if original.as_deref() != Some(catalog.as_str()) {
            if !switch_catalog(context, &catalog).await? {
                continue;
            }
            switched = true;
        }
        if let Err(e) = inspector
            .inspect_catalog(context, &Identifier::new(catalog), scope)
            .await
        {
            result = Err(e);
            break;
        }
    }
    if switched {
        if let Some(original) = original {
            switch_catalog(context, &original).await?;
        }
    }
    result
}

fn table_ref(catalog: &Identifier, row: &Row) -> Option<TableRef> {
    Some(TableRef::new(
        catalog.clone(),
        Identifier::new(row.trimmed("TABLE_SCHEMA")?),
        Identifier::new(row.trimmed("TABLE_NAME")?),
    ))
}

/// Check constraints from `sys.check_constraints`. Constraints bound to a
/// single column become that column's check.
#[derive(Debug, Clone, Copy, Default)]
pub struct MssqlCheckInspector;

#[async_trait]
impl PerCatalog for MssqlCheckInspector {
    async fn inspect_catalog(
        &self,
        context: &mut InspectionContext<'_>,
        catalog: &Identifier,
        scope: &InspectionScope,
    ) -> Result<()> {
        let query = QueryBuilder::new(
            "s.name AS TABLE_SCHEMA, t.name AS TABLE_NAME, cc.name AS CONSTRAINT_NAME, \
             cc.definition AS CHECK_CLAUSE, c.name AS COLUMN_NAME",
            "sys.check_constraints cc \
             JOIN sys.tables t ON t.object_id = cc.parent_object_id \
             JOIN sys.schemas s ON s.schema_id = t.schema_id \
             LEFT JOIN sys.columns c ON c.object_id = cc.parent_object_id \
             AND c.column_id = cc.parent_column_id",
        )
        .filter("s.name", scope.schema.as_deref())
        .filter("t.name", scope.table.as_deref())
        .order_by("s.name")
        .order_by("t.name")
        .order_by("cc.name");

        let mut rows = query.execute(context.session()).await?;
        let mut count = 0;
        while let Some(row) = rows.next().await? {
            let (Some(reference), Some(definition)) = (table_ref(catalog, &row), row.string("CHECK_CLAUSE")) else {
                continue;
            };
            let check = Check::new(
                row.trimmed("CONSTRAINT_NAME").map(Identifier::new),
                check_clause(&definition),
            );
            if is_not_null_check(&check.clause) {
                continue;
            }
            let table = context.database_mut().table_or_create(&reference);
            let column = row
                .trimmed("COLUMN_NAME")
                .map(Identifier::new)
                .filter(|name| table.column(name).is_some());
            match column.and_then(|name| table.column_mut(&name)) {
                Some(column) => column.check = Some(check),
                None => {
                    table.add_check(check);
                }
            }
            count += 1;
        }
        debug!("Read {} SQL Server check constraints in {}", count, catalog);
        Ok(())
    }
}

#[async_trait]
impl Inspector for MssqlCheckInspector {
    fn object_type(&self) -> MetaDataType {
        MetaDataType::Check
    }

    async fn inspect(&self, context: &mut InspectionContext<'_>) -> Result<()> {
        across_catalogs(self, context, &InspectionScope::default()).await
    }

    async fn inspect_scope(&self, context: &mut InspectionContext<'_>, scope: &InspectionScope) -> Result<()> {
        across_catalogs(self, context, scope).await
    }
}

/// Identity columns from `sys.identity_columns`, recorded as auto-increment
/// columns with seed, increment and last value.
#[derive(Debug, Clone, Copy, Default)]
pub struct MssqlIdentityInspector;

#[async_trait]
impl PerCatalog for MssqlIdentityInspector {
    async fn inspect_catalog(
        &self,
        context: &mut InspectionContext<'_>,
        catalog: &Identifier,
        scope: &InspectionScope,
    ) -> Result<()> {
        let query = QueryBuilder::new(
            "s.name AS TABLE_SCHEMA, t.name AS TABLE_NAME, ic.name AS COLUMN_NAME, \
             ic.seed_value AS START_VALUE, ic.increment_value AS INCREMENT_BY, \
             ic.last_value AS LAST_VALUE",
            "sys.identity_columns ic \
             JOIN sys.tables t ON t.object_id = ic.object_id \
             JOIN sys.schemas s ON s.schema_id = t.schema_id",
        )
        .filter("s.name", scope.schema.as_deref())
        .filter("t.name", scope.table.as_deref());

        let mut rows = query.execute(context.session()).await?;
        let mut count = 0;
        while let Some(row) = rows.next().await? {
            let (Some(reference), Some(name)) = (table_ref(catalog, &row), row.trimmed("COLUMN_NAME")) else {
                continue;
            };
            let table = context.database_mut().table_or_create(&reference);
            let sequence_name = Identifier::new(format!("{}_{}_seq", table.name.value(), name));
            let column = table.column_or_create(&Identifier::new(name));
            column.auto_increment = true;
            column.sequence = Some(read_sequence(sequence_name, &row));
            count += 1;
        }
        debug!("Read {} SQL Server identity columns in {}", count, catalog);
        Ok(())
    }
}

#[async_trait]
impl Inspector for MssqlIdentityInspector {
    fn object_type(&self) -> MetaDataType {
        MetaDataType::AutoIncrement
    }

    async fn inspect(&self, context: &mut InspectionContext<'_>) -> Result<()> {
        across_catalogs(self, context, &InspectionScope::default()).await
    }

    async fn inspect_scope(&self, context: &mut InspectionContext<'_>, scope: &InspectionScope) -> Result<()> {
        across_catalogs(self, context, scope).await
    }
}
