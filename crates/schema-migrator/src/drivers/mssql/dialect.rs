//! Microsoft SQL Server dialect.
//!
//! Bracket quoting, catalogs and schemas in qualified names, `OFFSET/FETCH`
//! pagination. SQL Server 2005/2008 get a legacy variant without sequences,
//! without the 2008+ temporal types and with `TOP`/`ROW_NUMBER()` paging.

use crate::core::constraint::{Deferrability, ReferenceAction, Trigger, TriggerTime};
use crate::core::schema::TableRef;
use crate::core::DatabaseInfo;
use crate::dialect::rowcount::CatalogRowCountHandler;
use crate::dialect::types::{self, TypeDesc};
use crate::dialect::{
    Dialect, DialectBase, LimitHandler, OffsetFetchHandler, QueryLimit, RowCountHandler,
    RowCountRequest, RowCountType, TopLimitHandler,
};
use crate::error::{MigrateError, Result};
use crate::translate::BooleanLiterals;

/// T-SQL reserved words outside SQL:2003.
const RESERVED_WORDS: &[&str] = &[
    "BACKUP", "BREAK", "BROWSE", "BULK", "CHECKPOINT", "CLUSTERED", "COMPUTE",
    "CONTAINSTABLE", "DBCC", "DENY", "DISK", "DISTRIBUTED", "DUMP", "ERRLVL",
    "EXIT", "FILE", "FILLFACTOR", "FREETEXT", "FREETEXTTABLE", "HOLDLOCK",
    "IDENTITY_INSERT", "IDENTITYCOL", "KILL", "LINENO", "LOAD", "NOCHECK",
    "NONCLUSTERED", "OFF", "OFFSETS", "OPENDATASOURCE", "OPENQUERY",
    "OPENROWSET", "OPENXML", "PERCENT", "PIVOT", "PLAN", "PRINT", "PROC",
    "RAISERROR", "READTEXT", "RECONFIGURE", "REPLICATION", "RESTORE", "REVERT",
    "ROWCOUNT", "ROWGUIDCOL", "RULE", "SAVE", "SECURITYAUDIT", "SETUSER",
    "SHUTDOWN", "STATISTICS", "TEXTSIZE", "TOP", "TRAN", "TRUNCATE", "TSEQUAL",
    "UNPIVOT", "UPDATETEXT", "USE", "WAITFOR", "WRITETEXT",
];

/// SQL Server dialect.
#[derive(Debug)]
pub struct MssqlDialect {
    base: DialectBase,
    legacy: bool,
}

impl MssqlDialect {
    /// SQL Server 2012 and later.
    pub fn new() -> Self {
        Self::build(false)
    }

    /// SQL Server 2005 and 2008.
    pub fn legacy() -> Self {
        Self::build(true)
    }

    fn build(legacy: bool) -> Self {
        let info = DatabaseInfo::mssql_server();
        let mut base = DialectBase::new("mssql", info.clone());
        base.keywords.extend(RESERVED_WORDS.iter().copied());

        let (time, timestamp, timestamp_tz) = if legacy {
            ("DATETIME", "DATETIME", "DATETIME")
        } else {
            ("TIME({S})", "DATETIME2({S})", "DATETIMEOFFSET({S})")
        };
        base.type_names
            .default_map()
            .insert(types::BIT, "BIT")
            .insert(types::BOOLEAN, "BIT")
            .insert(types::TINYINT, "TINYINT")
            .insert(types::DOUBLE, "FLOAT")
            .insert(types::FLOAT, "FLOAT")
            .insert(types::NCHAR, "NCHAR({N})")
            .insert(types::NVARCHAR, "NVARCHAR({N})")
            .insert(types::LONGVARCHAR, "VARCHAR(MAX)")
            .insert(types::CLOB, "VARCHAR(MAX)")
            .insert(types::LONGNVARCHAR, "NVARCHAR(MAX)")
            .insert(types::NCLOB, "NVARCHAR(MAX)")
            .insert(types::SQLXML, "XML")
            .insert(types::BINARY, "BINARY({N})")
            .insert(types::VARBINARY, "VARBINARY({N})")
            .insert(types::LONGVARBINARY, "VARBINARY(MAX)")
            .insert(types::BLOB, "VARBINARY(MAX)")
            .insert(types::TIME, time)
            .insert(types::TIMESTAMP, timestamp)
            .insert(types::TIMESTAMP_WITH_TIMEZONE, timestamp_tz);

        base.type_aliases
            .name("uniqueidentifier", TypeDesc::new(types::CHAR, "CHAR"))
            .name("money", TypeDesc::new(types::DECIMAL, "DECIMAL"))
            .name("smallmoney", TypeDesc::new(types::DECIMAL, "DECIMAL"))
            .name("datetimeoffset", TypeDesc::new(types::TIMESTAMP_WITH_TIMEZONE, "DATETIMEOFFSET"))
            .code_name(types::LONGVARCHAR, "ntext", TypeDesc::new(types::LONGNVARCHAR, "NTEXT"));

        crate::drivers::register_translators(
            &mut base.translations,
            &info,
            "GETDATE()",
            &BooleanLiterals::numeric(),
        );
        Self { base, legacy }
    }

    pub fn is_legacy(&self) -> bool {
        self.legacy
    }
}

impl Default for MssqlDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl Dialect for MssqlDialect {
    fn base(&self) -> &DialectBase {
        &self.base
    }

    fn supports_sequences(&self) -> bool {
        !self.legacy
    }

    fn open_quote(&self) -> char {
        '['
    }

    fn close_quote(&self) -> char {
        ']'
    }

    fn trigger_for_each_row(&self) -> Option<String> {
        None
    }

    /// Statement-level `AFTER` triggers only.
    fn create_trigger(&self, trigger: &Trigger, table: &TableRef) -> Result<String> {
        if trigger.time == TriggerTime::Before {
            return Err(MigrateError::Unsupported(format!(
                "{} has no BEFORE triggers ({})",
                self.name(),
                trigger.name
            )));
        }
        Ok(format!(
            "CREATE TRIGGER {} ON {} AFTER {} AS {}",
            self.identifier(trigger.name.value())?,
            self.qualified_name(table)?,
            trigger.event.sql(),
            self.trigger_body(trigger)
        ))
    }

    fn reference_action(&self, action: ReferenceAction) -> Option<String> {
        match action {
            ReferenceAction::Restrict => None,
            other => Some(other.sql().to_string()),
        }
    }

    fn deferrability(&self, _deferrability: Deferrability) -> Option<String> {
        None
    }

    fn limit_handler(&self, query: &str, limit: QueryLimit) -> Box<dyn LimitHandler> {
        if self.legacy {
            Box::new(TopLimitHandler::new(query, limit))
        } else {
            Box::new(OffsetFetchHandler::sql_server(query, limit))
        }
    }

    /// Partition statistics count whole tables only.
    fn supports_row_count(&self, column: bool, filter: bool, kind: RowCountType) -> bool {
        match kind {
            RowCountType::Exact => true,
            RowCountType::Approx => !column && !filter,
        }
    }

    fn approx_row_count_handler(&self, request: &RowCountRequest) -> Result<Box<dyn RowCountHandler>> {
        Ok(Box::new(CatalogRowCountHandler::sql_server(
            self.qualified_name(&request.table)?,
        )))
    }
}
