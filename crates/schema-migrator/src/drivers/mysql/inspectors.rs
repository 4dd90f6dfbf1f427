//! MySQL inspectors reading `INFORMATION_SCHEMA`.
//!
//! MySQL reports databases as catalogs, so every `TABLE_SCHEMA` column here
//! becomes the catalog part of a [`TableRef`] and the schema stays empty.

use async_trait::async_trait;
use tracing::debug;

use crate::core::constraint::{Check, Sequence, Trigger, TriggerEvent, TriggerTime};
use crate::core::schema::TableRef;
use crate::core::session::Row;
use crate::core::{Identifier, Script};
use crate::dialect::types::{self, TypeDesc};
use crate::error::Result;
use crate::inspect::{InspectionContext, InspectionScope, Inspector, MetaDataType, QueryBuilder};

fn table_ref(row: &Row, schema: &str, table: &str) -> Option<TableRef> {
    Some(TableRef::new(
        Identifier::new(row.trimmed(schema)?),
        Identifier::EMPTY,
        Identifier::new(row.trimmed(table)?),
    ))
}

/// Type code for an `INFORMATION_SCHEMA.COLUMNS.DATA_TYPE` value.
pub fn type_code(data_type: &str) -> i32 {
    match data_type.to_ascii_lowercase().as_str() {
        "bit" => types::BIT,
        "tinyint" => types::TINYINT,
        "smallint" => types::SMALLINT,
        "mediumint" | "int" | "integer" => types::INTEGER,
        "bigint" => types::BIGINT,
        "decimal" | "numeric" => types::DECIMAL,
        "float" => types::REAL,
        "double" | "real" => types::DOUBLE,
        "char" | "enum" | "set" => types::CHAR,
        "varchar" => types::VARCHAR,
        "tinytext" | "text" | "mediumtext" | "longtext" | "json" => types::LONGVARCHAR,
        "binary" => types::BINARY,
        "varbinary" => types::VARBINARY,
        "tinyblob" | "blob" | "mediumblob" | "longblob" => types::LONGVARBINARY,
        "date" | "year" => types::DATE,
        "time" => types::TIME,
        "datetime" | "timestamp" => types::TIMESTAMP,
        _ => types::OTHER,
    }
}

/// Values of an `enum('a','b')` or `set(...)` column type.
pub fn parse_enum_values(column_type: &str) -> Vec<String> {
    let lower = column_type.trim_start().to_ascii_lowercase();
    if !(lower.starts_with("enum(") || lower.starts_with("set(")) {
        return Vec::new();
    }
    let Some(open) = column_type.find('(') else {
        return Vec::new();
    };
    let body = &column_type[open + 1..];

    let mut values = Vec::new();
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\'' {
            continue;
        }
        let mut value = String::new();
        while let Some(c) = chars.next() {
            if c == '\'' {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    value.push('\'');
                } else {
                    break;
                }
            } else {
                value.push(c);
            }
        }
        values.push(value);
    }
    values
}

/// Columns from `INFORMATION_SCHEMA.COLUMNS`, including enum values and the
/// `auto_increment` extra the driver metadata leaves out.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlColumnInspector;

#[async_trait]
impl Inspector for MySqlColumnInspector {
    fn object_type(&self) -> MetaDataType {
        MetaDataType::Column
    }

    async fn inspect_scope(&self, context: &mut InspectionContext<'_>, scope: &InspectionScope) -> Result<()> {
        let query = QueryBuilder::new(
            "TABLE_SCHEMA, TABLE_NAME, COLUMN_NAME, DATA_TYPE, COLUMN_TYPE, \
             CHARACTER_MAXIMUM_LENGTH, NUMERIC_PRECISION, NUMERIC_SCALE, DATETIME_PRECISION, \
             IS_NULLABLE, COLUMN_DEFAULT, COLUMN_COMMENT, ORDINAL_POSITION, EXTRA",
            "INFORMATION_SCHEMA.COLUMNS",
        )
        .filter("TABLE_SCHEMA", scope.catalog.as_deref())
        .filter("TABLE_NAME", scope.table.as_deref())
        .order_by("TABLE_SCHEMA")
        .order_by("TABLE_NAME")
        .order_by("ORDINAL_POSITION");

        let mut rows = query.execute(context.session()).await?;
        let mut count = 0;
        while let Some(row) = rows.next().await? {
            if read_column(context, &row) {
                count += 1;
            }
        }
        debug!("Read {} MySQL columns", count);
        Ok(())
    }
}

fn read_column(context: &mut InspectionContext<'_>, row: &Row) -> bool {
    let (Some(reference), Some(name), Some(data_type)) = (
        table_ref(row, "TABLE_SCHEMA", "TABLE_NAME"),
        row.trimmed("COLUMN_NAME"),
        row.trimmed("DATA_TYPE"),
    ) else {
        return false;
    };
    let column_type = row.trimmed("COLUMN_TYPE").unwrap_or_else(|| data_type.clone());
    let mut type_name = data_type.to_ascii_uppercase();
    if column_type.to_ascii_lowercase().contains("unsigned") {
        type_name.push_str(" UNSIGNED");
    }
    let canonical = context
        .dialect()
        .type_alias(&TypeDesc::new(type_code(&data_type), type_name.clone()));
    let extra = row.trimmed("EXTRA").unwrap_or_default().to_ascii_lowercase();

    let column = context
        .database_mut()
        .table_or_create(&reference)
        .column_or_create(&Identifier::new(name));
    column.type_code = canonical.code;
    column.type_name = Some(type_name);
    match column.type_code {
        types::DECIMAL | types::NUMERIC => {
            column.precision = row.int("NUMERIC_PRECISION").map(|p| p as i32);
            column.scale = row.int("NUMERIC_SCALE").map(|s| s as i32);
        }
        // Bit width is reported as the numeric precision
        types::BIT => column.size = row.int("NUMERIC_PRECISION"),
        code if types::is_temporal(code) => {
            column.scale = row.int("DATETIME_PRECISION").map(|s| s as i32);
        }
        _ => column.size = row.int("CHARACTER_MAXIMUM_LENGTH"),
    }
    column.nullable = row.boolean("IS_NULLABLE").unwrap_or(true);
    column.default_value = row.string("COLUMN_DEFAULT").map(Script::new);
    column.comment = row.trimmed("COLUMN_COMMENT").filter(|c| !c.is_empty());
    if let Some(position) = row.int("ORDINAL_POSITION") {
        column.position = position as i32;
    }
    column.auto_increment = extra.contains("auto_increment");
    column.enum_values = parse_enum_values(&column_type);
    true
}

/// Next `AUTO_INCREMENT` value of each table, recorded as the sequence of its
/// auto-increment column.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlAutoIncrementInspector;

#[async_trait]
impl Inspector for MySqlAutoIncrementInspector {
    fn object_type(&self) -> MetaDataType {
        MetaDataType::AutoIncrement
    }

    async fn inspect_scope(&self, context: &mut InspectionContext<'_>, scope: &InspectionScope) -> Result<()> {
        let query = QueryBuilder::new(
            "TABLE_SCHEMA, TABLE_NAME, AUTO_INCREMENT",
            "INFORMATION_SCHEMA.TABLES",
        )
        .filter("TABLE_SCHEMA", scope.catalog.as_deref())
        .filter("TABLE_NAME", scope.table.as_deref())
        .condition("AUTO_INCREMENT IS NOT NULL");

        let mut rows = query.execute(context.session()).await?;
        let mut count = 0;
        while let Some(row) = rows.next().await? {
            let (Some(reference), Some(next)) = (
                table_ref(&row, "TABLE_SCHEMA", "TABLE_NAME"),
                row.decimal("AUTO_INCREMENT"),
            ) else {
                continue;
            };
            // Only tables already read with their columns
            let Some(table) = context.database_mut().table_mut(&reference) else {
                continue;
            };
            let table_name = table.name.value().to_string();
            for column in table.columns_mut().filter(|c| c.auto_increment) {
                let mut sequence = Sequence::new(Identifier::new(format!(
                    "{}_{}_seq",
                    table_name,
                    column.name.value()
                )));
                sequence.last_value = Some(next);
                column.sequence = Some(sequence);
                count += 1;
            }
        }
        debug!("Read {} MySQL auto-increment values", count);
        Ok(())
    }
}

/// Row-level triggers from `INFORMATION_SCHEMA.TRIGGERS`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlTriggerInspector;

#[async_trait]
impl Inspector for MySqlTriggerInspector {
    fn object_type(&self) -> MetaDataType {
        MetaDataType::Trigger
    }

    async fn inspect_scope(&self, context: &mut InspectionContext<'_>, scope: &InspectionScope) -> Result<()> {
        let query = QueryBuilder::new(
            "EVENT_OBJECT_SCHEMA, EVENT_OBJECT_TABLE, TRIGGER_NAME, ACTION_TIMING, \
             EVENT_MANIPULATION, ACTION_STATEMENT",
            "INFORMATION_SCHEMA.TRIGGERS",
        )
        .filter("EVENT_OBJECT_SCHEMA", scope.catalog.as_deref())
        .filter("EVENT_OBJECT_TABLE", scope.table.as_deref())
        .order_by("EVENT_OBJECT_SCHEMA")
        .order_by("EVENT_OBJECT_TABLE")
        .order_by("ACTION_ORDER");

        let mut rows = query.execute(context.session()).await?;
        let mut count = 0;
        while let Some(row) = rows.next().await? {
            let Some(reference) = table_ref(&row, "EVENT_OBJECT_SCHEMA", "EVENT_OBJECT_TABLE") else {
                continue;
            };
            let (Some(name), Some(time), Some(event)) = (
                row.trimmed("TRIGGER_NAME"),
                row.trimmed("ACTION_TIMING").and_then(|t| TriggerTime::parse(&t)),
                row.trimmed("EVENT_MANIPULATION").and_then(|e| TriggerEvent::parse(&e)),
            ) else {
                continue;
            };
            let trigger = Trigger {
                table: reference.clone(),
                name: Identifier::new(name),
                time,
                event,
                body: row.string("ACTION_STATEMENT").unwrap_or_default(),
                active: true,
                column: None,
            };
            context.database_mut().table_or_create(&reference).add_trigger(trigger);
            count += 1;
        }
        debug!("Read {} MySQL triggers", count);
        Ok(())
    }
}

/// Check constraints from `INFORMATION_SCHEMA.CHECK_CONSTRAINTS` (MySQL 8).
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlCheckInspector;

#[async_trait]
impl Inspector for MySqlCheckInspector {
    fn object_type(&self) -> MetaDataType {
        MetaDataType::Check
    }

    async fn inspect_scope(&self, context: &mut InspectionContext<'_>, scope: &InspectionScope) -> Result<()> {
        let query = QueryBuilder::new(
            "tc.TABLE_SCHEMA, tc.TABLE_NAME, cc.CONSTRAINT_NAME, cc.CHECK_CLAUSE",
            "INFORMATION_SCHEMA.TABLE_CONSTRAINTS tc \
             JOIN INFORMATION_SCHEMA.CHECK_CONSTRAINTS cc \
             ON cc.CONSTRAINT_SCHEMA = tc.CONSTRAINT_SCHEMA \
             AND cc.CONSTRAINT_NAME = tc.CONSTRAINT_NAME",
        )
        .condition("tc.CONSTRAINT_TYPE = 'CHECK'")
        .filter("tc.TABLE_SCHEMA", scope.catalog.as_deref())
        .filter("tc.TABLE_NAME", scope.table.as_deref());

        let mut rows = query.execute(context.session()).await?;
        let mut count = 0;
        while let Some(row) = rows.next().await? {
            let (Some(reference), Some(clause)) = (
                table_ref(&row, "TABLE_SCHEMA", "TABLE_NAME"),
                row.string("CHECK_CLAUSE"),
            ) else {
                continue;
            };
            let check = Check::new(
                row.trimmed("CONSTRAINT_NAME").map(Identifier::new),
                crate::drivers::check_clause(&clause),
            );
            if context.database_mut().table_or_create(&reference).add_check(check) {
                count += 1;
            }
        }
        debug!("Read {} MySQL check constraints", count);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::core::{DatabaseInfo, SqlValue};
    use crate::dialect::Dialect;
    use crate::drivers::MySqlDialect;
    use crate::inspect::generic::testing::*;
    use rust_decimal::Decimal;

    fn mysql_session() -> CannedSession {
        CannedSession::new().info(DatabaseInfo::with_version("MySQL", "8.0.36", 8, 0))
    }

    fn dialect() -> Arc<dyn Dialect> {
        Arc::new(MySqlDialect::new())
    }

    const COLUMNS: [&str; 14] = [
        "TABLE_SCHEMA",
        "TABLE_NAME",
        "COLUMN_NAME",
        "DATA_TYPE",
        "COLUMN_TYPE",
        "CHARACTER_MAXIMUM_LENGTH",
        "NUMERIC_PRECISION",
        "NUMERIC_SCALE",
        "DATETIME_PRECISION",
        "IS_NULLABLE",
        "COLUMN_DEFAULT",
        "COLUMN_COMMENT",
        "ORDINAL_POSITION",
        "EXTRA",
    ];

    #[allow(clippy::too_many_arguments)]
    fn column_row(
        name: &str,
        data_type: &str,
        column_type: &str,
        length: Option<i64>,
        precision: Option<i64>,
        nullable: &str,
        default: Option<&str>,
        position: i64,
        extra: &str,
    ) -> Vec<SqlValue> {
        vec![
            text("shop"),
            text("orders"),
            text(name),
            text(data_type),
            text(column_type),
            SqlValue::from(length),
            SqlValue::from(precision),
            SqlValue::Null,
            SqlValue::Null,
            text(nullable),
            SqlValue::from(default),
            text(""),
            SqlValue::Int(position),
            text(extra),
        ]
    }

    #[test]
    fn test_parse_enum_values() {
        assert_eq!(parse_enum_values("enum('new','paid','it''s')"), vec!["new", "paid", "it's"]);
        assert_eq!(parse_enum_values("SET('a','b,c')"), vec!["a", "b,c"]);
        assert!(parse_enum_values("varchar(20)").is_empty());
        assert_eq!(type_code("LONGTEXT"), types::LONGVARCHAR);
        assert_eq!(type_code("geometry"), types::OTHER);
    }

    #[tokio::test]
    async fn test_columns_from_information_schema() {
        let mut session = mysql_session().query_rows(
            "INFORMATION_SCHEMA.COLUMNS",
            COLUMNS.to_vec(),
            vec![
                column_row("id", "int", "int unsigned", None, Some(10), "NO", None, 1, "auto_increment"),
                column_row("status", "enum", "enum('new','paid')", Some(4), None, "NO", Some("new"), 2, ""),
                column_row("flags", "bit", "bit(3)", None, Some(3), "YES", Some("b'101'"), 3, ""),
            ],
        );
        let scope = InspectionScope::new().catalog("shop").table("orders");
        let mut ctx = context_with(&mut session, dialect());
        MySqlColumnInspector.inspect_scope(&mut ctx, &scope).await.unwrap();

        let table = ctx.results().database().find_table(Some("shop"), None, "orders").unwrap();
        let id = table.column(&Identifier::new("id")).unwrap();
        assert!(id.auto_increment);
        assert!(!id.nullable);
        assert_eq!(id.type_code, types::BIGINT);
        assert_eq!(id.type_name.as_deref(), Some("INT UNSIGNED"));

        let status = table.column(&Identifier::new("status")).unwrap();
        assert_eq!(status.enum_values, vec!["new", "paid"]);
        assert_eq!(status.default_value, Some(Script::new("new")));
        assert_eq!(status.size, Some(4));

        let flags = table.column(&Identifier::new("flags")).unwrap();
        assert_eq!(flags.size, Some(3));
        assert!(flags.nullable);

        drop(ctx);
        let (sql, params) = &session.executed[0];
        assert!(sql.contains("WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?"));
        assert_eq!(params, &vec![text("shop"), text("orders")]);
    }

    #[tokio::test]
    async fn test_auto_increment_sets_sequence_last_value() {
        let mut session = mysql_session().query_rows(
            "INFORMATION_SCHEMA.TABLES",
            vec!["TABLE_SCHEMA", "TABLE_NAME", "AUTO_INCREMENT"],
            vec![
                vec![text("shop"), text("orders"), SqlValue::Int(1042)],
                vec![text("shop"), text("unknown"), SqlValue::Int(7)],
            ],
        );
        let mut ctx = context_with(&mut session, dialect());
        let orders = TableRef::new(Identifier::new("shop"), Identifier::EMPTY, Identifier::new("orders"));
        {
            let table = ctx.database_mut().table_or_create(&orders);
            table.column_or_create(&Identifier::new("id")).auto_increment = true;
            table.column_or_create(&Identifier::new("note"));
        }
        MySqlAutoIncrementInspector.inspect(&mut ctx).await.unwrap();

        let database = ctx.results().database();
        let table = database.table(&orders).unwrap();
        let sequence = table.column(&Identifier::new("id")).unwrap().sequence.as_ref().unwrap();
        assert_eq!(sequence.last_value, Some(Decimal::from(1042)));
        assert_eq!(sequence.name.value(), "orders_id_seq");
        assert!(table.column(&Identifier::new("note")).unwrap().sequence.is_none());
        assert!(database.find_table(Some("shop"), None, "unknown").is_none());
    }

    #[tokio::test]
    async fn test_triggers_and_checks() {
        let mut session = mysql_session()
            .query_rows(
                "INFORMATION_SCHEMA.TRIGGERS",
                vec![
                    "EVENT_OBJECT_SCHEMA",
                    "EVENT_OBJECT_TABLE",
                    "TRIGGER_NAME",
                    "ACTION_TIMING",
                    "EVENT_MANIPULATION",
                    "ACTION_STATEMENT",
                ],
                vec![vec![
                    text("shop"),
                    text("orders"),
                    text("orders_bi"),
                    text("BEFORE"),
                    text("INSERT"),
                    text("SET NEW.created = NOW()"),
                ]],
            )
            .query_rows(
                "INFORMATION_SCHEMA.CHECK_CONSTRAINTS",
                vec!["TABLE_SCHEMA", "TABLE_NAME", "CONSTRAINT_NAME", "CHECK_CLAUSE"],
                vec![
                    vec![text("shop"), text("orders"), text("orders_chk_1"), text("(`total` >= 0)")],
                    vec![text("shop"), text("orders"), text("orders_chk_2"), text("`id` IS NOT NULL")],
                ],
            );
        let scope = InspectionScope::new().catalog("shop");
        let mut ctx = context_with(&mut session, dialect());
        MySqlTriggerInspector.inspect_scope(&mut ctx, &scope).await.unwrap();
        MySqlCheckInspector.inspect_scope(&mut ctx, &scope).await.unwrap();

        let table = ctx.results().database().find_table(Some("shop"), None, "orders").unwrap();
        let trigger = &table.triggers()[0];
        assert_eq!(trigger.time, TriggerTime::Before);
        assert_eq!(trigger.event, TriggerEvent::Insert);
        assert_eq!(trigger.body, "SET NEW.created = NOW()");

        assert_eq!(table.checks().len(), 1);
        assert_eq!(table.checks()[0].clause, "`total` >= 0");
    }
}
