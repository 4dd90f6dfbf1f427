//! Dialect resolution, pagination and row counting across the built-in
//! vendors.

mod common;

use std::sync::Arc;

use common::MemorySession;
use schema_migrator::dialect::types::{self, TypeDesc};
use schema_migrator::dialect::{LimitHandler, RowCountHandler, TypeOptions};
use schema_migrator::{
    dialect_resolver, DatabaseInfo, Dialect, Identifier, MigrateError, QueryLimit,
    RowCountRequest, RowCountType, SqlValue, TableRef,
};

const QUERY: &str = "SELECT id FROM orders ORDER BY id";

fn dialect(info: DatabaseInfo) -> Arc<dyn Dialect> {
    dialect_resolver().resolve(&info).unwrap()
}

fn mysql() -> DatabaseInfo {
    DatabaseInfo::with_version("MySQL", "8.0.36", 8, 0)
}

fn postgres() -> DatabaseInfo {
    DatabaseInfo::with_version("PostgreSQL", "16.2", 16, 2)
}

fn sql_server() -> DatabaseInfo {
    DatabaseInfo::with_version("Microsoft SQL Server", "16.00.1000", 16, 0)
}

fn oracle() -> DatabaseInfo {
    DatabaseInfo::with_version("Oracle", "19.0.0.0.0", 19, 0)
}

fn nuodb() -> DatabaseInfo {
    DatabaseInfo::with_version("NuoDB", "4.2", 4, 2)
}

fn table(schema: &str, name: &str) -> TableRef {
    TableRef::new(Identifier::EMPTY, Identifier::new(schema), Identifier::new(name))
}

// =============================================================================
// Pagination
// =============================================================================

#[test]
fn test_limit_query_per_vendor() {
    let limit = QueryLimit::with_offset(20, 40);
    let cases = [
        (mysql(), "SELECT id FROM orders ORDER BY id LIMIT 40, 20"),
        (postgres(), "SELECT id FROM orders ORDER BY id LIMIT 20 OFFSET 40"),
        (nuodb(), "SELECT id FROM orders ORDER BY id LIMIT 20 OFFSET 40"),
        (
            sql_server(),
            "SELECT id FROM orders ORDER BY id OFFSET 40 ROWS FETCH NEXT 20 ROWS ONLY",
        ),
        (
            oracle(),
            "SELECT * FROM (SELECT Q_.*, ROWNUM RN_ FROM (SELECT id FROM orders ORDER BY id) Q_ \
             WHERE ROWNUM <= 60) WHERE RN_ > 40",
        ),
        (
            DatabaseInfo::new("Acme"),
            "SELECT id FROM orders ORDER BY id OFFSET 40 ROWS FETCH NEXT 20 ROWS ONLY",
        ),
    ];
    for (info, expected) in cases {
        let handler = dialect(info.clone()).limit_handler(QUERY, limit);
        assert_eq!(handler.limit_query(false), expected, "{}", info);
    }
}

#[test]
fn test_limit_query_is_deterministic() {
    let limit = QueryLimit::with_offset(10, 5);
    for info in [mysql(), postgres(), sql_server(), oracle(), nuodb()] {
        let dialect = dialect(info.clone());
        let first = dialect.limit_handler(QUERY, limit);
        let second = dialect.limit_handler(QUERY, limit);
        assert_eq!(first.limit_query(true), second.limit_query(true), "{}", info);
        assert_eq!(
            first.bind_parameters(&[], true),
            second.bind_parameters(&[], true),
            "{}",
            info
        );
    }
}

#[test]
fn test_legacy_sql_server_binds_top_first() {
    let legacy = dialect(DatabaseInfo::with_version("Microsoft SQL Server", "10.50.1600", 10, 50));
    let handler = legacy.limit_handler("SELECT id FROM orders WHERE status = ?", QueryLimit::new(25));
    assert_eq!(
        handler.limit_query(true),
        "SELECT TOP (?) id FROM orders WHERE status = ?"
    );
    assert_eq!(
        handler.bind_parameters(&[SqlValue::from("open")], true),
        vec![SqlValue::Int(25), SqlValue::from("open")]
    );
}

#[test]
fn test_parameter_order_follows_placeholders() {
    let query_params = [SqlValue::from("open")];
    let limit = QueryLimit::with_offset(10, 30);

    let mysql = dialect(mysql()).limit_handler("SELECT id FROM orders WHERE status = ?", limit);
    assert_eq!(
        mysql.bind_parameters(&query_params, true),
        vec![SqlValue::from("open"), SqlValue::Int(30), SqlValue::Int(10)]
    );

    let oracle = dialect(oracle()).limit_handler("SELECT id FROM orders WHERE status = ?", limit);
    assert_eq!(
        oracle.bind_parameters(&query_params, true),
        vec![SqlValue::from("open"), SqlValue::Int(40), SqlValue::Int(30)]
    );
}

// =============================================================================
// Row counts
// =============================================================================

#[test]
fn test_exact_count_with_column_and_filter() {
    let request = RowCountRequest::new(table("sales", "orders"), RowCountType::Exact)
        .column(Identifier::new("total"))
        .filter("status = 'open'");
    let handler = dialect(postgres()).row_count_handler(&request).unwrap();
    assert_eq!(
        handler.row_count_query(),
        "SELECT COUNT(total) FROM sales.orders WHERE (status = 'open')"
    );
}

#[test]
fn test_approx_with_filter_rejected_before_sql() {
    let request = RowCountRequest::new(table("SALES", "ORDERS"), RowCountType::Approx)
        .filter("STATUS = 'OPEN'");
    for info in [oracle(), sql_server(), nuodb(), DatabaseInfo::new("Acme")] {
        let err = dialect(info.clone()).row_count_handler(&request).unwrap_err();
        match err {
            MigrateError::UnsupportedRowCount {
                count_type, filter, column, ..
            } => {
                assert_eq!(count_type, RowCountType::Approx.to_string());
                assert!(filter);
                assert!(!column);
            }
            other => panic!("{}: expected unsupported row count, got {:?}", info, other),
        }
    }
}

#[test]
fn test_approx_counts_supported_with_filter_on_explain_vendors() {
    let request = RowCountRequest::new(table("sales", "orders"), RowCountType::Approx)
        .filter("status = 'open'");
    let handler = dialect(postgres()).row_count_handler(&request).unwrap();
    assert_eq!(handler.row_count_type(), RowCountType::Approx);
    assert_eq!(
        handler.row_count_query(),
        "EXPLAIN SELECT * FROM sales.orders WHERE (status = 'open')"
    );
}

#[tokio::test]
async fn test_oracle_statistics_count_through_session() {
    let request = RowCountRequest::new(table("SALES", "ORDERS"), RowCountType::Approx);
    let handler = dialect(oracle()).row_count_handler(&request).unwrap();
    assert_eq!(
        handler.parameters(),
        vec![SqlValue::from("ORDERS"), SqlValue::from("SALES")]
    );

    let mut session = MemorySession::new(oracle()).query(
        "ALL_TABLES",
        vec!["NUM_ROWS"],
        vec![vec![SqlValue::Int(1200)]],
    );
    assert_eq!(handler.row_count(&mut session).await.unwrap(), Some(1200));
    assert_eq!(session.closed(), session.opened);
}

#[tokio::test]
async fn test_count_without_statistics_is_none() {
    let request = RowCountRequest::new(table("SALES", "ORDERS"), RowCountType::Approx);
    let handler = dialect(oracle()).row_count_handler(&request).unwrap();
    let mut session = MemorySession::new(oracle()).query(
        "ALL_TABLES",
        vec!["NUM_ROWS"],
        vec![vec![SqlValue::Null]],
    );
    assert_eq!(handler.row_count(&mut session).await.unwrap(), None);
}

// =============================================================================
// Types and identifiers
// =============================================================================

#[test]
fn test_type_templates_substitute_options() {
    let source = DatabaseInfo::mysql();
    let varchar = TypeDesc::code(types::VARCHAR);
    let decimal = TypeDesc::code(types::DECIMAL);
    let size = TypeOptions::size(120);
    let money = TypeOptions::precision_scale(12, 2);

    assert_eq!(
        dialect(postgres()).type_name(&source, &varchar, &size).as_deref(),
        Some("VARCHAR(120)")
    );
    assert_eq!(
        dialect(oracle()).type_name(&source, &varchar, &size).as_deref(),
        Some("VARCHAR2(120)")
    );
    assert_eq!(
        dialect(oracle()).type_name(&source, &decimal, &money).as_deref(),
        Some("NUMBER(12,2)")
    );
    assert_eq!(
        dialect(DatabaseInfo::new("Acme"))
            .type_name(&source, &decimal, &TypeOptions::default())
            .as_deref(),
        Some("DECIMAL")
    );
}

#[test]
fn test_identifier_quoting_per_vendor() {
    let orders = TableRef::new(Identifier::new("shop"), Identifier::new("dbo"), Identifier::new("order"));
    assert_eq!(dialect(sql_server()).qualified_name(&orders).unwrap(), "shop.dbo.[order]");
    assert_eq!(dialect(postgres()).qualified_name(&orders).unwrap(), "dbo.\"order\"");
    assert_eq!(dialect(oracle()).qualified_name(&orders).unwrap(), "DBO.\"order\"");

    let mysql_orders = TableRef::new(Identifier::new("shop"), Identifier::EMPTY, Identifier::new("key"));
    assert_eq!(dialect(mysql()).qualified_name(&mysql_orders).unwrap(), "shop.`key`");
}
