//! End-to-end inspection through the manager against an in-memory session.

mod common;

use std::sync::Arc;

use common::{text, MemorySession};
use schema_migrator::{
    dialect_resolver, Config, DatabaseInfo, Identifier, InspectionManager, InspectionScope,
    MetaDataRequest, MetaDataType, MigrateError, ServiceResolver, SqlValue, TableRef,
};

fn postgres() -> DatabaseInfo {
    DatabaseInfo::with_version("PostgreSQL", "16.2", 16, 2)
}

fn table_columns() -> Vec<&'static str> {
    vec!["TABLE_CAT", "TABLE_SCHEM", "TABLE_NAME", "TABLE_TYPE", "REMARKS"]
}

fn orders_table() -> Vec<Vec<SqlValue>> {
    vec![vec![SqlValue::Null, text("sales"), text("orders"), text("TABLE"), text("Customer orders")]]
}

fn postgres_session() -> MemorySession {
    MemorySession::new(postgres())
        .metadata(
            "schemas",
            vec!["TABLE_SCHEM", "TABLE_CATALOG"],
            vec![vec![text("sales"), SqlValue::Null]],
        )
        .metadata("tables", table_columns(), orders_table())
        .metadata(
            "columns",
            vec![
                "TABLE_CAT",
                "TABLE_SCHEM",
                "TABLE_NAME",
                "COLUMN_NAME",
                "DATA_TYPE",
                "TYPE_NAME",
                "COLUMN_SIZE",
                "DECIMAL_DIGITS",
                "NULLABLE",
                "COLUMN_DEF",
                "ORDINAL_POSITION",
            ],
            vec![
                vec![
                    SqlValue::Null,
                    text("sales"),
                    text("orders"),
                    text("id"),
                    SqlValue::Int(4),
                    text("int4"),
                    SqlValue::Int(10),
                    SqlValue::Int(0),
                    SqlValue::Int(0),
                    text("nextval('sales.orders_id_seq'::regclass)"),
                    SqlValue::Int(1),
                ],
                vec![
                    SqlValue::Null,
                    text("sales"),
                    text("orders"),
                    text("total"),
                    SqlValue::Int(2),
                    text("numeric"),
                    SqlValue::Int(12),
                    SqlValue::Int(2),
                    SqlValue::Int(1),
                    SqlValue::Null,
                    SqlValue::Int(2),
                ],
            ],
        )
        .metadata(
            "primary keys",
            vec!["TABLE_CAT", "TABLE_SCHEM", "TABLE_NAME", "COLUMN_NAME", "KEY_SEQ", "PK_NAME"],
            vec![vec![
                SqlValue::Null,
                text("sales"),
                text("orders"),
                text("id"),
                SqlValue::Int(1),
                text("orders_pkey"),
            ]],
        )
        .query(
            "pg_constraint",
            vec!["TABLE_SCHEMA", "TABLE_NAME", "CONSTRAINT_NAME", "CHECK_CLAUSE"],
            vec![
                vec![text("sales"), text("orders"), text("orders_total_check"), text("CHECK ((total >= 0))")],
                vec![text("sales"), text("orders"), text("orders_id_not_null"), text("CHECK (id IS NOT NULL)")],
            ],
        )
        .query(
            "pg_sequences",
            vec![
                "TABLE_SCHEMA",
                "TABLE_NAME",
                "COLUMN_NAME",
                "SEQUENCE_NAME",
                "START_VALUE",
                "INCREMENT_BY",
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
                SqlValue::Bool(false),
                SqlValue::Int(41),
            ]],
        )
}

fn orders() -> TableRef {
    TableRef::new(Identifier::EMPTY, Identifier::new("sales"), Identifier::new("orders"))
}

// =============================================================================
// Resolution
// =============================================================================

#[test]
fn test_most_specific_registration_wins() {
    let mut resolver: ServiceResolver<String> = ServiceResolver::new("greeting");
    resolver.register(DatabaseInfo::new("X"), |_| Arc::new("product".to_string()));
    resolver.register(DatabaseInfo::new("X").product_version("9.0"), |_| {
        Arc::new("version".to_string())
    });
    resolver.register(DatabaseInfo::with_version("X", "9.0", 9, 2), |_| {
        Arc::new("exact".to_string())
    });

    let resolve = |info: DatabaseInfo| resolver.resolve(&info).map(|s| s.as_str().to_string());
    assert_eq!(resolve(DatabaseInfo::with_version("X", "9.0", 9, 2)).unwrap(), "exact");
    assert_eq!(resolve(DatabaseInfo::with_version("X", "9.0", 9, 3)).unwrap(), "version");
    assert_eq!(resolve(DatabaseInfo::with_version("x", "10.1", 10, 1)).unwrap(), "product");
    assert!(matches!(
        resolve(DatabaseInfo::new("Y")),
        Err(MigrateError::NoService { .. })
    ));
}

#[test]
fn test_supported_types_follow_registrations() {
    let manager = InspectionManager::with_builtins();
    let types = manager.supported_types(&postgres());
    assert!(types.contains(&MetaDataType::Check));
    assert!(types.contains(&MetaDataType::AutoIncrement));
    assert!(!types.contains(&MetaDataType::Trigger));

    let nuodb = manager.supported_types(&DatabaseInfo::with_version("NuoDB", "4.2", 4, 2));
    assert!(nuodb.contains(&MetaDataType::Sequence));
}

// =============================================================================
// Full passes
// =============================================================================

#[tokio::test]
async fn test_inspect_all_postgres() {
    let manager = InspectionManager::with_builtins();
    let mut session = postgres_session();
    let results = manager
        .inspect_all(&mut session, &InspectionScope::new().schema("sales"))
        .await
        .unwrap();

    let database = results.database();
    assert_eq!(database.dialect, "postgres");
    let table = database.table(&orders()).unwrap();
    assert_eq!(table.comment.as_deref(), Some("Customer orders"));
    assert_eq!(table.columns().len(), 2);

    let pk = table.primary_key().unwrap();
    assert_eq!(pk.name, Some(Identifier::new("orders_pkey")));

    assert_eq!(table.checks().len(), 1);
    assert_eq!(table.checks()[0].clause, "total >= 0");

    let id = table.column(&Identifier::new("id")).unwrap();
    assert!(!id.nullable);
    assert!(id.auto_increment);
    assert_eq!(
        id.sequence.as_ref().map(|s| s.name.value()),
        Some("orders_id_seq")
    );

    assert!(results.is_inspected(MetaDataType::ForeignKey));
    assert!(!results.is_inspected(MetaDataType::Trigger));

    assert_eq!(session.commits, 1);
    assert_eq!(session.closed(), session.opened);
}

#[tokio::test]
async fn test_results_serialize_to_json() {
    let manager = InspectionManager::with_builtins();
    let mut session = postgres_session();
    let results = manager
        .inspect(
            &mut session,
            &InspectionScope::new().schema("sales"),
            &[MetaDataType::Table, MetaDataType::Column],
        )
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&results.to_json().unwrap()).unwrap();
    assert!(json.to_string().contains("orders"));
}

#[tokio::test]
async fn test_config_scope_drives_requests() {
    let config = Config::from_yaml(
        r#"
inspection:
  schema: sales
  table: "ord%"
  object_types: [table]
"#,
    )
    .unwrap();

    let manager = InspectionManager::with_builtins();
    let mut session = MemorySession::new(postgres()).metadata("tables", table_columns(), orders_table());
    manager
        .inspect(&mut session, &config.inspection.scope(), &config.inspection.object_types)
        .await
        .unwrap();

    assert_eq!(
        session.requests,
        vec![MetaDataRequest::Tables {
            catalog: None,
            schema_pattern: Some("sales".into()),
            table_pattern: Some("ord%".into()),
            types: vec!["TABLE".into()],
        }]
    );
}

#[tokio::test]
async fn test_nuodb_sequences_ignore_table_scope() {
    let nuodb = DatabaseInfo::with_version("NuoDB", "4.2", 4, 2);
    let mut session = MemorySession::new(nuodb).query(
        "SYSTEM.SEQUENCES",
        vec!["SEQUENCE_SCHEMA", "SEQUENCE_NAME", "START_VALUE"],
        vec![vec![text("SALES"), text("ORDER_SEQ"), SqlValue::Int(100)]],
    );
    let results = InspectionManager::with_builtins()
        .inspect(&mut session, &InspectionScope::new(), &[MetaDataType::Sequence])
        .await
        .unwrap();

    let schema = results
        .database()
        .schema(&Identifier::EMPTY, &Identifier::new("SALES"))
        .unwrap();
    assert!(schema.sequence(&Identifier::new("ORDER_SEQ")).is_some());
}

// =============================================================================
// Failure paths
// =============================================================================

#[tokio::test]
async fn test_missing_inspector_is_no_service() {
    let manager = InspectionManager::new(dialect_resolver());
    let mut session = MemorySession::new(postgres());
    let err = manager
        .inspect(&mut session, &InspectionScope::new(), &[MetaDataType::Table])
        .await
        .unwrap_err();
    assert!(matches!(err, MigrateError::NoService { .. }));
    assert_eq!(session.commits, 1);
}

#[tokio::test]
async fn test_cursor_closed_and_session_committed_on_failure() {
    let manager = InspectionManager::with_builtins();
    let mut session = MemorySession::new(postgres())
        .metadata(
            "tables",
            table_columns(),
            vec![
                vec![SqlValue::Null, text("sales"), text("orders"), text("TABLE"), SqlValue::Null],
                vec![SqlValue::Null, text("sales"), text("lines"), text("TABLE"), SqlValue::Null],
            ],
        )
        .fail_after("tables", 1);

    let err = manager
        .inspect(&mut session, &InspectionScope::new(), &[MetaDataType::Table])
        .await
        .unwrap_err();
    assert!(matches!(err, MigrateError::Query { .. }));
    assert_eq!(session.opened, 1);
    assert_eq!(session.closed(), 1);
    assert_eq!(session.commits, 1);
}

#[tokio::test]
async fn test_failed_vendor_query_stops_the_pass() {
    let manager = InspectionManager::with_builtins();
    // No pg_constraint answer: the check query fails
    let mut session = MemorySession::new(postgres()).metadata("tables", table_columns(), orders_table());
    let err = manager
        .inspect(
            &mut session,
            &InspectionScope::new().schema("sales"),
            &[MetaDataType::Table, MetaDataType::Check],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, MigrateError::Query { .. }));
    assert_eq!(session.executed.len(), 1);
    assert!(session.executed[0].contains("pg_constraint"));
    assert_eq!(session.closed(), session.opened);
    assert_eq!(session.commits, 1);
}
