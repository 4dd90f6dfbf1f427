//! PostgreSQL inspectors reading `pg_catalog`.

use async_trait::async_trait;
use tracing::debug;

use crate::core::constraint::Check;
use crate::core::schema::TableRef;
use crate::core::session::Row;
use crate::core::Identifier;
use crate::drivers::{check_clause, read_sequence};
use crate::error::Result;
use crate::inspect::{InspectionContext, InspectionScope, Inspector, MetaDataType, QueryBuilder};

/// PostgreSQL has no catalog part in table references.
fn table_ref(row: &Row) -> Option<TableRef> {
    Some(TableRef::new(
        Identifier::EMPTY,
        Identifier::new(row.trimmed("TABLE_SCHEMA")?),
        Identifier::new(row.trimmed("TABLE_NAME")?),
    ))
}

/// Check constraints from `pg_constraint`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresCheckInspector;

#[async_trait]
impl Inspector for PostgresCheckInspector {
    fn object_type(&self) -> MetaDataType {
        MetaDataType::Check
    }

    async fn inspect_scope(&self, context: &mut InspectionContext<'_>, scope: &InspectionScope) -> Result<()> {
        let query = QueryBuilder::new(
            "n.nspname AS TABLE_SCHEMA, c.relname AS TABLE_NAME, con.conname AS CONSTRAINT_NAME, \
             pg_get_constraintdef(con.oid) AS CHECK_CLAUSE",
            "pg_constraint con \
             JOIN pg_class c ON c.oid = con.conrelid \
             JOIN pg_namespace n ON n.oid = c.relnamespace",
        )
        .condition("con.contype = 'c'")
        .filter("n.nspname", scope.schema.as_deref())
        .filter("c.relname", scope.table.as_deref())
        .order_by("n.nspname")
        .order_by("c.relname")
        .order_by("con.conname");

        let mut rows = query.execute(context.session()).await?;
        let mut count = 0;
        while let Some(row) = rows.next().await? {
            let (Some(reference), Some(definition)) = (table_ref(&row), row.string("CHECK_CLAUSE")) else {
                continue;
            };
            let check = Check::new(
                row.trimmed("CONSTRAINT_NAME").map(Identifier::new),
                check_clause(&definition),
            );
            if context.database_mut().table_or_create(&reference).add_check(check) {
                count += 1;
            }
        }
        debug!("Read {} PostgreSQL check constraints", count);
        Ok(())
    }
}

/// Serial and identity columns with the state of their owned sequence.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresAutoIncrementInspector;

#[async_trait]
impl Inspector for PostgresAutoIncrementInspector {
    fn object_type(&self) -> MetaDataType {
        MetaDataType::AutoIncrement
    }

    async fn inspect_scope(&self, context: &mut InspectionContext<'_>, scope: &InspectionScope) -> Result<()> {
        let query = QueryBuilder::new(
            "n.nspname AS TABLE_SCHEMA, c.relname AS TABLE_NAME, a.attname AS COLUMN_NAME, \
             s.sequencename AS SEQUENCE_NAME, s.start_value AS START_VALUE, \
             s.increment_by AS INCREMENT_BY, s.min_value AS MIN_VALUE, s.max_value AS MAX_VALUE, \
             s.cache_size AS CACHE_SIZE, s.cycle AS CYCLE, s.last_value AS LAST_VALUE",
            "pg_attribute a \
             JOIN pg_class c ON c.oid = a.attrelid \
             JOIN pg_namespace n ON n.oid = c.relnamespace \
             JOIN pg_sequences s ON pg_get_serial_sequence(\
             quote_ident(n.nspname) || '.' || quote_ident(c.relname), a.attname) \
             = quote_ident(s.schemaname) || '.' || quote_ident(s.sequencename)",
        )
        .condition("a.attnum > 0 AND NOT a.attisdropped")
        .filter("n.nspname", scope.schema.as_deref())
        .filter("c.relname", scope.table.as_deref());

        let mut rows = query.execute(context.session()).await?;
        let mut count = 0;
        while let Some(row) = rows.next().await? {
            let (Some(reference), Some(column_name), Some(sequence)) = (
                table_ref(&row),
                row.trimmed("COLUMN_NAME"),
                row.trimmed("SEQUENCE_NAME"),
            ) else {
                continue;
            };
            let Some(column) = context
                .database_mut()
                .table_mut(&reference)
                .and_then(|t| t.column_mut(&Identifier::new(column_name)))
            else {
                continue;
            };
            column.auto_increment = true;
            column.sequence = Some(read_sequence(Identifier::new(sequence), &row));
            count += 1;
        }
        debug!("Read {} PostgreSQL auto-increment columns", count);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use super::*;
    use crate::core::{DatabaseInfo, SqlValue};
    use crate::drivers::PostgresDialect;
    use crate::inspect::generic::testing::*;

    fn session() -> CannedSession {
        CannedSession::new().info(DatabaseInfo::with_version("PostgreSQL", "16.2", 16, 2))
    }

    fn orders() -> TableRef {
        TableRef::new(Identifier::EMPTY, Identifier::new("sales"), Identifier::new("orders"))
    }

    #[tokio::test]
    async fn test_checks_unwrapped_from_definition() {
        let mut session = session().query_rows(
            "pg_constraint",
            vec!["TABLE_SCHEMA", "TABLE_NAME", "CONSTRAINT_NAME", "CHECK_CLAUSE"],
            vec![
                vec![text("sales"), text("orders"), text("orders_total_check"), text("CHECK ((total >= (0)::numeric))")],
                vec![text("sales"), text("orders"), text("orders_qty_check"), text("CHECK ((qty > 0)) NOT VALID")],
            ],
        );
        let mut ctx = context_with(&mut session, Arc::new(PostgresDialect::new()));
        PostgresCheckInspector
            .inspect_scope(&mut ctx, &InspectionScope::new().schema("sales"))
            .await
            .unwrap();

        let table = ctx.results().database().table(&orders()).unwrap();
        let clauses: Vec<_> = table.checks().iter().map(|c| c.clause.as_str()).collect();
        assert_eq!(clauses, vec!["total >= (0)::numeric", "qty > 0"]);

        drop(ctx);
        let (sql, params) = &session.executed[0];
        assert!(sql.contains("con.contype = 'c' AND n.nspname = ?"));
        assert_eq!(params, &vec![text("sales")]);
    }

    #[tokio::test]
    async fn test_serial_columns_get_sequences() {
        let mut session = session().query_rows(
            "pg_sequences",
            vec![
                "TABLE_SCHEMA",
                "TABLE_NAME",
                "COLUMN_NAME",
                "SEQUENCE_NAME",
                "START_VALUE",
                "INCREMENT_BY",
                "MIN_VALUE",
                "MAX_VALUE",
                "CACHE_SIZE",
                "CYCLE",
                "LAST_VALUE",
            ],
            vec![vec![
                text("sales"),
                text("orders"),
                text("id"),
                text("orders_id_seq"),
                SqlValue::Int(1),
                SqlValue::Int(1),
                SqlValue::Int(1),
                SqlValue::Int(i64::MAX),
                SqlValue::Int(1),
                SqlValue::Bool(false),
                SqlValue::Int(57),
            ]],
        );
        let mut ctx = context_with(&mut session, Arc::new(PostgresDialect::new()));
        ctx.database_mut()
            .table_or_create(&orders())
            .column_or_create(&Identifier::new("id"));
        PostgresAutoIncrementInspector.inspect(&mut ctx).await.unwrap();

        let column = ctx
            .results()
            .database()
            .table(&orders())
            .and_then(|t| t.column(&Identifier::new("id")))
            .unwrap();
        assert!(column.auto_increment);
        let sequence = column.sequence.as_ref().unwrap();
        assert_eq!(sequence.name.value(), "orders_id_seq");
        assert_eq!(sequence.last_value, Some(Decimal::from(57)));
        assert_eq!(sequence.max_value, Some(Decimal::from(i64::MAX)));
        assert!(!sequence.cycle);
    }
}
