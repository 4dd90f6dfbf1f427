use async_trait::async_trait;
use tracing::debug;

use super::{metadata, table_ref};
use crate::core::session::{MetaDataRequest, Row};
use crate::core::{Identifier, Script};
use crate::dialect::types::{self, TypeDesc};
use crate::error::Result;
use crate::inspect::context::InspectionContext;
use crate::inspect::scope::InspectionScope;
use crate::inspect::{Inspector, MetaDataType};

/// `NULLABLE` value meaning the column rejects nulls.
const COLUMN_NO_NULLS: i64 = 0;

/// Reads columns with their types, defaults and nullability.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnInspector;

#[async_trait]
impl Inspector for ColumnInspector {
    fn object_type(&self) -> MetaDataType {
        MetaDataType::Column
    }

    async fn inspect_scope(&self, context: &mut InspectionContext<'_>, scope: &InspectionScope) -> Result<()> {
        let request = MetaDataRequest::Columns {
            catalog: scope.catalog.clone(),
            schema_pattern: scope.schema.clone(),
            table_pattern: scope.table.clone(),
            column_pattern: None,
        };
        let mut rows = metadata(context, request).await?;
        // Older drivers do not report IS_AUTOINCREMENT at all
        let has_auto_increment = rows.has_column("IS_AUTOINCREMENT");

        let mut count = 0;
        while let Some(row) = rows.next().await? {
            if read_column(context, &row, has_auto_increment) {
                count += 1;
            }
        }
        debug!("Read {} columns", count);
        Ok(())
    }
}

fn read_column(context: &mut InspectionContext<'_>, row: &Row, has_auto_increment: bool) -> bool {
    let (Some(reference), Some(name)) = (
        table_ref(row, "TABLE_CAT", "TABLE_SCHEM", "TABLE_NAME"),
        row.trimmed("COLUMN_NAME"),
    ) else {
        return false;
    };

    let reported = TypeDesc {
        code: row.int("DATA_TYPE").unwrap_or(0) as i32,
        name: row.trimmed("TYPE_NAME"),
    };
    let canonical = context.dialect().type_alias(&reported);

    let column = context
        .database_mut()
        .table_or_create(&reference)
        .column_or_create(&Identifier::new(name));
    column.type_code = canonical.code;
    column.type_name = reported.name;

    let size = row.int("COLUMN_SIZE");
    let digits = row.int("DECIMAL_DIGITS").map(|d| d as i32);
    if matches!(column.type_code, types::NUMERIC | types::DECIMAL) {
        column.precision = size.map(|s| s as i32);
        column.scale = digits;
    } else {
        column.size = size;
        column.scale = digits.filter(|_| types::is_temporal(column.type_code));
    }

    if let Some(nullable) = row.int("NULLABLE") {
        column.nullable = nullable != COLUMN_NO_NULLS;
    } else if let Some(nullable) = row.boolean("IS_NULLABLE") {
        column.nullable = nullable;
    }
    if let Some(position) = row.int("ORDINAL_POSITION") {
        column.position = position as i32;
    }
    if let Some(comment) = row.trimmed("REMARKS") {
        column.comment = Some(comment);
    }
    if let Some(default) = row.string("COLUMN_DEF") {
        column.default_value = Some(Script::new(default));
    }
    if has_auto_increment {
        column.auto_increment = row.boolean("IS_AUTOINCREMENT").unwrap_or(false);
    }
    true
}
