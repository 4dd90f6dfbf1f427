//! NuoDB inspectors over the `SYSTEM` schema.
//!
//! `SYSTEM.TABLECONSTRAINTS` lists every check of a table, including the ones
//! declared on a column. Column checks also appear in `SYSTEM.FIELDS`, so
//! table checks are limited to the names NuoDB generates for table-level
//! declarations (`<table>$constraint<N>`) and each check lands exactly once.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use crate::core::constraint::{is_not_null_check, Check};
use crate::core::schema::TableRef;
use crate::core::session::Row;
use crate::core::Identifier;
use crate::drivers::{check_clause, fill_sequence};
use crate::error::Result;
use crate::inspect::{InspectionContext, InspectionScope, Inspector, MetaDataType, QueryBuilder};

fn generated_name() -> &'static Regex {
    static NAME_RE: OnceLock<Regex> = OnceLock::new();
    NAME_RE.get_or_init(|| {
        Regex::new(r"(?i)^(.+)\$constraint\d+$").expect("valid constraint name regex")
    })
}

/// Whether `name` is the generated name of a table-level check on `table`.
pub fn is_table_check_name(table: &str, name: &str) -> bool {
    generated_name()
        .captures(name)
        .and_then(|caps| caps.get(1))
        .is_some_and(|m| m.as_str().eq_ignore_ascii_case(table))
}

fn table_ref(row: &Row) -> Option<TableRef> {
    Some(TableRef::new(
        Identifier::EMPTY,
        Identifier::new(row.trimmed("TABLE_SCHEMA")?),
        Identifier::new(row.trimmed("TABLE_NAME")?),
    ))
}

/// Table checks from `SYSTEM.TABLECONSTRAINTS`, column checks from
/// `SYSTEM.FIELDS`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NuoDbCheckInspector;

impl NuoDbCheckInspector {
    async fn table_checks(&self, context: &mut InspectionContext<'_>, scope: &InspectionScope) -> Result<usize> {
        let query = QueryBuilder::new(
            "SCHEMA AS TABLE_SCHEMA, TABLENAME AS TABLE_NAME, CONSTRAINTNAME AS CONSTRAINT_NAME, \
             CONSTRAINTTEXT AS CHECK_CLAUSE",
            "SYSTEM.TABLECONSTRAINTS",
        )
        .filter("SCHEMA", scope.schema.as_deref())
        .filter("TABLENAME", scope.table.as_deref())
        .order_by("SCHEMA")
        .order_by("TABLENAME")
        .order_by("CONSTRAINTNAME");

        let mut rows = query.execute(context.session()).await?;
        let mut count = 0;
        while let Some(row) = rows.next().await? {
            let (Some(reference), Some(name), Some(text)) = (
                table_ref(&row),
                row.trimmed("CONSTRAINT_NAME"),
                row.string("CHECK_CLAUSE"),
            ) else {
                continue;
            };
            if !is_table_check_name(reference.table.value(), &name) {
                continue;
            }
            let check = Check::new(Some(Identifier::new(name)), check_clause(&text));
            if context.database_mut().table_or_create(&reference).add_check(check) {
                count += 1;
            }
        }
        Ok(count)
    }

    async fn column_checks(&self, context: &mut InspectionContext<'_>, scope: &InspectionScope) -> Result<usize> {
        let query = QueryBuilder::new(
            "SCHEMA AS TABLE_SCHEMA, TABLENAME AS TABLE_NAME, FIELD AS COLUMN_NAME, \
             CONSTRAINTNAME AS CONSTRAINT_NAME, CONSTRAINTTEXT AS CHECK_CLAUSE",
            "SYSTEM.FIELDS",
        )
        .condition("CONSTRAINTTEXT IS NOT NULL")
        .filter("SCHEMA", scope.schema.as_deref())
        .filter("TABLENAME", scope.table.as_deref())
        .order_by("SCHEMA")
        .order_by("TABLENAME")
        .order_by("FIELDID");

        let mut rows = query.execute(context.session()).await?;
        let mut count = 0;
        while let Some(row) = rows.next().await? {
            let (Some(reference), Some(column), Some(text)) = (
                table_ref(&row),
                row.trimmed("COLUMN_NAME"),
                row.string("CHECK_CLAUSE"),
            ) else {
                continue;
            };
            let check = Check::new(
                row.trimmed("CONSTRAINT_NAME").map(Identifier::new),
                check_clause(&text),
            );
            if is_not_null_check(&check.clause) {
                continue;
            }
            context
                .database_mut()
                .table_or_create(&reference)
                .column_or_create(&Identifier::new(column))
                .check = Some(check);
            count += 1;
        }
        Ok(count)
    }
}

#[async_trait]
impl Inspector for NuoDbCheckInspector {
    fn object_type(&self) -> MetaDataType {
        MetaDataType::Check
    }

    async fn inspect_scope(&self, context: &mut InspectionContext<'_>, scope: &InspectionScope) -> Result<()> {
        let tables = self.table_checks(context, scope).await?;
        let columns = self.column_checks(context, scope).await?;
        debug!("Read {} NuoDB table checks and {} column checks", tables, columns);
        Ok(())
    }
}

/// Sequences from `SYSTEM.SEQUENCES`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NuoDbSequenceInspector;

#[async_trait]
impl Inspector for NuoDbSequenceInspector {
    fn object_type(&self) -> MetaDataType {
        MetaDataType::Sequence
    }

    async fn inspect(&self, context: &mut InspectionContext<'_>) -> Result<()> {
        self.inspect_scope(context, &InspectionScope::default()).await
    }

    async fn inspect_scope(&self, context: &mut InspectionContext<'_>, scope: &InspectionScope) -> Result<()> {
        let query = QueryBuilder::new(
            "SCHEMA AS SEQUENCE_SCHEMA, SEQUENCENAME AS SEQUENCE_NAME, BASEVALUE AS START_VALUE",
            "SYSTEM.SEQUENCES",
        )
        .filter("SCHEMA", scope.schema.as_deref())
        .order_by("SCHEMA")
        .order_by("SEQUENCENAME");

        let mut rows = query.execute(context.session()).await?;
        let mut count = 0;
        while let Some(row) = rows.next().await? {
            let (Some(schema), Some(name)) = (row.trimmed("SEQUENCE_SCHEMA"), row.trimmed("SEQUENCE_NAME")) else {
                continue;
            };
            let sequence = context
                .database_mut()
                .schema_or_create(&Identifier::EMPTY, &Identifier::new(schema))
                .sequence_or_create(&Identifier::new(name));
            fill_sequence(sequence, &row);
            count += 1;
        }
        debug!("Read {} NuoDB sequences", count);
        Ok(())
    }
}
