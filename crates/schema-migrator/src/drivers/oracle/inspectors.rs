//! Oracle inspectors over the `ALL_*` dictionary views.

use async_trait::async_trait;
use tracing::debug;

use crate::core::constraint::Check;
use crate::core::schema::TableRef;
use crate::core::Identifier;
use crate::drivers::{check_clause, fill_sequence};
use crate::error::Result;
use crate::inspect::{InspectionContext, InspectionScope, Inspector, MetaDataType, QueryBuilder};

/// Check constraints from `ALL_CONSTRAINTS`.
///
/// Oracle records `NOT NULL` columns as system-named checks; those are left
/// out.
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleCheckInspector;

#[async_trait]
impl Inspector for OracleCheckInspector {
    fn object_type(&self) -> MetaDataType {
        MetaDataType::Check
    }

    async fn inspect_scope(&self, context: &mut InspectionContext<'_>, scope: &InspectionScope) -> Result<()> {
        let query = QueryBuilder::new(
            "c.OWNER AS TABLE_SCHEMA, c.TABLE_NAME AS TABLE_NAME, \
             c.CONSTRAINT_NAME AS CONSTRAINT_NAME, c.SEARCH_CONDITION AS CHECK_CLAUSE",
            "ALL_CONSTRAINTS c",
        )
        .condition("c.CONSTRAINT_TYPE = 'C'")
        .filter("c.OWNER", scope.schema.as_deref())
        .filter("c.TABLE_NAME", scope.table.as_deref())
        .order_by("c.OWNER")
        .order_by("c.TABLE_NAME")
        .order_by("c.CONSTRAINT_NAME");

        let mut rows = query.execute(context.session()).await?;
        let mut count = 0;
        while let Some(row) = rows.next().await? {
            let (Some(owner), Some(table), Some(condition)) = (
                row.trimmed("TABLE_SCHEMA"),
                row.trimmed("TABLE_NAME"),
                row.string("CHECK_CLAUSE"),
            ) else {
                continue;
            };
            let reference = TableRef::new(Identifier::EMPTY, Identifier::new(owner), Identifier::new(table));
            let check = Check::new(
                row.trimmed("CONSTRAINT_NAME").map(Identifier::new),
                check_clause(&condition),
            );
            if context.database_mut().table_or_create(&reference).add_check(check) {
                count += 1;
            }
        }
        debug!("Read {} Oracle check constraints", count);
        Ok(())
    }
}

/// Standalone sequences from `ALL_SEQUENCES`, stored under their owner.
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleSequenceInspector;

#[async_trait]
impl Inspector for OracleSequenceInspector {
    fn object_type(&self) -> MetaDataType {
        MetaDataType::Sequence
    }

    /// Sequences are not per table.
    async fn inspect(&self, context: &mut InspectionContext<'_>) -> Result<()> {
        self.inspect_scope(context, &InspectionScope::default()).await
    }

    async fn inspect_scope(&self, context: &mut InspectionContext<'_>, scope: &InspectionScope) -> Result<()> {
        let query = QueryBuilder::new(
            "SEQUENCE_OWNER, SEQUENCE_NAME, MIN_VALUE, MAX_VALUE, INCREMENT_BY, \
             CYCLE_FLAG AS CYCLE, CACHE_SIZE, LAST_NUMBER AS LAST_VALUE",
            "ALL_SEQUENCES",
        )
        .filter("SEQUENCE_OWNER", scope.schema.as_deref())
        .order_by("SEQUENCE_OWNER")
        .order_by("SEQUENCE_NAME");

        let mut rows = query.execute(context.session()).await?;
        let mut count = 0;
        while let Some(row) = rows.next().await? {
            let (Some(owner), Some(name)) = (row.trimmed("SEQUENCE_OWNER"), row.trimmed("SEQUENCE_NAME")) else {
                continue;
            };
            let sequence = context
                .database_mut()
                .schema_or_create(&Identifier::EMPTY, &Identifier::new(owner))
                .sequence_or_create(&Identifier::new(name));
            fill_sequence(sequence, &row);
            count += 1;
        }
        debug!("Read {} Oracle sequences", count);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use super::*;
    use crate::core::{DatabaseInfo, SqlValue};
    use crate::drivers::OracleDialect;
    use crate::inspect::generic::testing::*;

    fn session() -> CannedSession {
        CannedSession::new().info(DatabaseInfo::with_version("Oracle", "19.0.0.0.0", 19, 0))
    }

    #[tokio::test]
    async fn test_checks_skip_not_null_conditions() {
        let mut session = session().query_rows(
            "ALL_CONSTRAINTS",
            vec!["TABLE_SCHEMA", "TABLE_NAME", "CONSTRAINT_NAME", "CHECK_CLAUSE"],
            vec![
                vec![text("SALES"), text("ORDERS"), text("SYS_C0012"), text("\"ID\" IS NOT NULL")],
                vec![text("SALES"), text("ORDERS"), text("CK_TOTAL"), text("total >= 0")],
            ],
        );
        let mut ctx = context_with(&mut session, Arc::new(OracleDialect::new()));
        OracleCheckInspector
            .inspect_scope(&mut ctx, &InspectionScope::new().schema("SALES").table("ORD%"))
            .await
            .unwrap();

        let reference = TableRef::new(Identifier::EMPTY, Identifier::new("SALES"), Identifier::new("ORDERS"));
        let table = ctx.results().database().table(&reference).unwrap();
        assert_eq!(table.checks().len(), 1);
        assert_eq!(table.checks()[0].clause, "total >= 0");

        drop(ctx);
        let (sql, params) = &session.executed[0];
        assert!(sql.contains("c.CONSTRAINT_TYPE = 'C' AND c.OWNER = ? AND c.TABLE_NAME LIKE ?"));
        assert_eq!(params, &vec![text("SALES"), text("ORD%")]);
    }

    #[tokio::test]
    async fn test_sequences_stored_under_owner() {
        let mut session = session().query_rows(
            "ALL_SEQUENCES",
            vec![
                "SEQUENCE_OWNER",
                "SEQUENCE_NAME",
                "MIN_VALUE",
                "MAX_VALUE",
                "INCREMENT_BY",
                "CYCLE",
                "CACHE_SIZE",
                "LAST_VALUE",
            ],
            vec![vec![
                text("SALES"),
                text("ORDER_SEQ"),
                SqlValue::Int(1),
                SqlValue::Decimal("9999999999999999999999999999".parse().unwrap()),
                SqlValue::Int(1),
                text("N"),
                SqlValue::Int(20),
                SqlValue::Int(1041),
            ]],
        );
        let mut ctx = context_with(&mut session, Arc::new(OracleDialect::new()));
        OracleSequenceInspector.inspect(&mut ctx).await.unwrap();

        let schema = ctx
            .results()
            .database()
            .schema(&Identifier::EMPTY, &Identifier::new("SALES"))
            .unwrap();
        let sequence = schema.sequence(&Identifier::new("ORDER_SEQ")).unwrap();
        assert_eq!(sequence.last_value, Some(Decimal::from(1041)));
        assert_eq!(sequence.cache, Some(20));
        assert!(!sequence.cycle);
        assert_eq!(sequence.start_with, None);

        drop(ctx);
        assert_eq!(session.executed.len(), 1);
        assert!(session.executed[0].1.is_empty());
    }
}
