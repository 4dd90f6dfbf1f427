//! Pagination strategies.
//!
//! A [`LimitHandler`] rewrites one query for one `(count, offset)` request.
//! Vendors differ in syntax and also in where the limit parameters bind
//! relative to the query's own parameters: `TOP (?)` precedes everything in
//! the statement, `LIMIT ?` follows it. [`LimitHandler::bind_parameters`]
//! returns the full parameter list in statement order.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::core::SqlValue;

/// Requested row count and optional offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryLimit {
    pub count: i64,
    pub offset: Option<i64>,
}

impl QueryLimit {
    pub fn new(count: i64) -> Self {
        Self {
            count,
            offset: None,
        }
    }

    pub fn with_offset(count: i64, offset: i64) -> Self {
        Self {
            count,
            offset: Some(offset),
        }
    }

    /// Offset, treating zero and negative values as absent.
    pub fn offset(&self) -> Option<i64> {
        self.offset.filter(|o| *o > 0)
    }
}

/// Vendor pagination for a single query.
pub trait LimitHandler: Send + Sync + fmt::Debug {
    /// The query being paginated.
    fn query(&self) -> &str;

    fn limit(&self) -> &QueryLimit;

    /// Paginated query; with `parameterized` the count/offset become `?`.
    fn limit_query(&self, parameterized: bool) -> String;

    /// Limit parameters bound ahead of the query's own parameters.
    fn parameters_before(&self) -> Vec<SqlValue> {
        Vec::new()
    }

    /// Limit parameters bound after the query's own parameters.
    fn parameters_after(&self) -> Vec<SqlValue> {
        Vec::new()
    }

    /// Every bind value of the paginated statement, in statement order.
    fn bind_parameters(&self, query_params: &[SqlValue], parameterized: bool) -> Vec<SqlValue> {
        if !parameterized {
            return query_params.to_vec();
        }
        let mut params = self.parameters_before();
        params.extend_from_slice(query_params);
        params.extend(self.parameters_after());
        params
    }
}

fn has_order_by(query: &str) -> bool {
    static ORDER_BY_RE: OnceLock<Regex> = OnceLock::new();
    ORDER_BY_RE
        .get_or_init(|| Regex::new(r"(?i)\border\s+by\b").expect("valid order by regex"))
        .is_match(query)
}

fn value_or_placeholder(value: i64, parameterized: bool) -> String {
    if parameterized {
        "?".to_string()
    } else {
        value.to_string()
    }
}

/// `LIMIT count OFFSET offset` (PostgreSQL, NuoDB).
#[derive(Debug, Clone)]
pub struct LimitOffsetHandler {
    query: String,
    limit: QueryLimit,
}

impl LimitOffsetHandler {
    pub fn new(query: impl Into<String>, limit: QueryLimit) -> Self {
        Self {
            query: query.into(),
            limit,
        }
    }
}

impl LimitHandler for LimitOffsetHandler {
    fn query(&self) -> &str {
        &self.query
    }

    fn limit(&self) -> &QueryLimit {
        &self.limit
    }

    fn limit_query(&self, parameterized: bool) -> String {
        let mut sql = format!(
            "{} LIMIT {}",
            self.query.trim_end(),
            value_or_placeholder(self.limit.count, parameterized)
        );
        if let Some(offset) = self.limit.offset() {
            sql.push_str(" OFFSET ");
            sql.push_str(&value_or_placeholder(offset, parameterized));
        }
        sql
    }

    fn parameters_after(&self) -> Vec<SqlValue> {
        let mut params = vec![SqlValue::Int(self.limit.count)];
        if let Some(offset) = self.limit.offset() {
            params.push(SqlValue::Int(offset));
        }
        params
    }
}

/// `LIMIT offset, count` (MySQL).
#[derive(Debug, Clone)]
pub struct MySqlLimitHandler {
    query: String,
    limit: QueryLimit,
}

impl MySqlLimitHandler {
    pub fn new(query: impl Into<String>, limit: QueryLimit) -> Self {
        Self {
            query: query.into(),
            limit,
        }
    }
}

impl LimitHandler for MySqlLimitHandler {
    fn query(&self) -> &str {
        &self.query
    }

    fn limit(&self) -> &QueryLimit {
        &self.limit
    }

    fn limit_query(&self, parameterized: bool) -> String {
        let count = value_or_placeholder(self.limit.count, parameterized);
        match self.limit.offset() {
            Some(offset) => format!(
                "{} LIMIT {}, {}",
                self.query.trim_end(),
                value_or_placeholder(offset, parameterized),
                count
            ),
            None => format!("{} LIMIT {}", self.query.trim_end(), count),
        }
    }

    fn parameters_after(&self) -> Vec<SqlValue> {
        match self.limit.offset() {
            Some(offset) => vec![SqlValue::Int(offset), SqlValue::Int(self.limit.count)],
            None => vec![SqlValue::Int(self.limit.count)],
        }
    }
}

/// `OFFSET n ROWS FETCH NEXT m ROWS ONLY` (SQL:2008, SQL Server 2012+).
///
/// SQL Server only accepts `OFFSET` after an `ORDER BY`; with
/// `require_order_by` a neutral `ORDER BY (SELECT 0)` is appended to
/// unordered queries and `OFFSET 0 ROWS` is always emitted.
#[derive(Debug, Clone)]
pub struct OffsetFetchHandler {
    query: String,
    limit: QueryLimit,
    require_order_by: bool,
}

impl OffsetFetchHandler {
    pub fn new(query: impl Into<String>, limit: QueryLimit) -> Self {
        Self {
            query: query.into(),
            limit,
            require_order_by: false,
        }
    }

    pub fn sql_server(query: impl Into<String>, limit: QueryLimit) -> Self {
        Self {
            require_order_by: true,
            ..Self::new(query, limit)
        }
    }
}

impl LimitHandler for OffsetFetchHandler {
    fn query(&self) -> &str {
        &self.query
    }

    fn limit(&self) -> &QueryLimit {
        &self.limit
    }

    fn limit_query(&self, parameterized: bool) -> String {
        let mut sql = self.query.trim_end().to_string();
        if self.require_order_by && !has_order_by(&sql) {
            sql.push_str(" ORDER BY (SELECT 0)");
        }
        let count = value_or_placeholder(self.limit.count, parameterized);
        match self.limit.offset() {
            Some(offset) => sql.push_str(&format!(
                " OFFSET {} ROWS FETCH NEXT {} ROWS ONLY",
                value_or_placeholder(offset, parameterized),
                count
            )),
            None if self.require_order_by => {
                sql.push_str(&format!(" OFFSET 0 ROWS FETCH NEXT {} ROWS ONLY", count))
            }
            None => sql.push_str(&format!(" FETCH FIRST {} ROWS ONLY", count)),
        }
        sql
    }

    fn parameters_after(&self) -> Vec<SqlValue> {
        match self.limit.offset() {
            Some(offset) => vec![SqlValue::Int(offset), SqlValue::Int(self.limit.count)],
            None => vec![SqlValue::Int(self.limit.count)],
        }
    }
}

/// A token of a SQL statement seen outside literals and comments.
#[derive(Debug, Clone, Copy)]
enum SqlToken<'a> {
    Word {
        start: usize,
        end: usize,
        depth: usize,
        text: &'a str,
    },
    Placeholder(usize),
}

/// Walk the words and `?` placeholders of a statement, skipping quoted text
/// and comments. `depth` is the parenthesis nesting of each word.
fn scan_sql<'a>(sql: &'a str, mut visit: impl FnMut(SqlToken<'a>)) {
    let bytes = sql.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'\'' | b'"' | b'[') => {
                let close = if quote == b'[' { b']' } else { quote };
                i += 1;
                while i < bytes.len() && bytes[i] != close {
                    i += 1;
                }
                i += 1;
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i < bytes.len() && !(bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/')) {
                    i += 1;
                }
                i += 2;
            }
            b'(' => {
                depth += 1;
                i += 1;
            }
            b')' => {
                depth = depth.saturating_sub(1);
                i += 1;
            }
            b'?' => {
                visit(SqlToken::Placeholder(i));
                i += 1;
            }
            b if b.is_ascii_alphabetic() || b == b'_' => {
                let start = i;
                while i < bytes.len()
                    && (bytes[i].is_ascii_alphanumeric() || matches!(bytes[i], b'_' | b'$' | b'#' | b'@'))
                {
                    i += 1;
                }
                visit(SqlToken::Word {
                    start,
                    end: i,
                    depth,
                    text: &sql[start..i],
                });
            }
            _ => i += 1,
        }
    }
}

/// Where `TOP` goes in a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TopPlacement {
    /// Right after the body's `SELECT [ALL | DISTINCT]`, at this byte offset.
    Insert(usize),
    /// The body starting at this byte offset is wrapped in
    /// `SELECT TOP (n) * FROM (...)`. Used for set operations and for
    /// statements without a top-level `SELECT`.
    Wrap(usize),
}

impl TopPlacement {
    fn offset(self) -> usize {
        match self {
            TopPlacement::Insert(at) | TopPlacement::Wrap(at) => at,
        }
    }
}

/// The statement body is the first top-level `SELECT`, which skips a
/// leading `WITH` list and comments.
fn top_placement(query: &str) -> TopPlacement {
    let mut body = None;
    let mut insert_at = 0;
    let mut after_select = false;
    let mut set_operation = false;
    scan_sql(query, |token| {
        let SqlToken::Word {
            start,
            end,
            depth,
            text,
        } = token
        else {
            after_select = false;
            return;
        };
        if body.is_none() {
            if depth == 0 && text.eq_ignore_ascii_case("select") {
                body = Some(start);
                insert_at = end;
                after_select = true;
            }
            return;
        }
        if after_select && (text.eq_ignore_ascii_case("all") || text.eq_ignore_ascii_case("distinct")) {
            insert_at = end;
        } else if depth == 0
            && ["union", "except", "intersect"]
                .iter()
                .any(|op| text.eq_ignore_ascii_case(op))
        {
            set_operation = true;
        }
        after_select = false;
    });
    match body {
        Some(start) if set_operation => TopPlacement::Wrap(start),
        Some(_) => TopPlacement::Insert(insert_at),
        None => TopPlacement::Wrap(0),
    }
}

fn placeholders_before(query: &str, offset: usize) -> usize {
    let mut count = 0;
    scan_sql(query, |token| {
        if let SqlToken::Placeholder(at) = token {
            if at < offset {
                count += 1;
            }
        }
    });
    count
}

/// `SELECT TOP (n)` with `ROW_NUMBER()` windowing for offsets
/// (SQL Server 2005/2008).
///
/// `TOP` goes into the statement body after any `WITH` list, so its
/// parameter binds after the placeholders of the common table expressions
/// and before the rest. The offset parameter of the window predicate binds
/// last.
#[derive(Debug, Clone)]
pub struct TopLimitHandler {
    query: String,
    limit: QueryLimit,
}

impl TopLimitHandler {
    pub fn new(query: impl Into<String>, limit: QueryLimit) -> Self {
        Self {
            query: query.into(),
            limit,
        }
    }

    fn with_top(&self, top: &str) -> String {
        let query = self.query.trim_end();
        match top_placement(query) {
            TopPlacement::Insert(at) => format!("{} TOP ({}){}", &query[..at], top, &query[at..]),
            TopPlacement::Wrap(at) => format!(
                "{}SELECT TOP ({}) * FROM ({}) AS T_",
                &query[..at],
                top,
                &query[at..]
            ),
        }
    }

    fn top_count(&self) -> i64 {
        self.limit.count.saturating_add(self.limit.offset().unwrap_or(0))
    }

    /// Query placeholders that precede the `TOP` parameter.
    fn leading_placeholders(&self) -> usize {
        let query = self.query.trim_end();
        placeholders_before(query, top_placement(query).offset())
    }
}

impl LimitHandler for TopLimitHandler {
    fn query(&self) -> &str {
        &self.query
    }

    fn limit(&self) -> &QueryLimit {
        &self.limit
    }

    fn limit_query(&self, parameterized: bool) -> String {
        let top = value_or_placeholder(self.top_count(), parameterized);
        let inner = self.with_top(&top);
        match self.limit.offset() {
            Some(offset) => format!(
                "SELECT * FROM (SELECT Q_.*, ROW_NUMBER() OVER (ORDER BY (SELECT 0)) AS RN_ \
                 FROM ({}) AS Q_) AS P_ WHERE RN_ > {}",
                inner,
                value_or_placeholder(offset, parameterized)
            ),
            None => inner,
        }
    }

    /// The `TOP` value when no query placeholder precedes it; otherwise it
    /// binds mid-statement and only [`LimitHandler::bind_parameters`] places it.
    fn parameters_before(&self) -> Vec<SqlValue> {
        if self.leading_placeholders() == 0 {
            vec![SqlValue::Int(self.top_count())]
        } else {
            Vec::new()
        }
    }

    fn parameters_after(&self) -> Vec<SqlValue> {
        self.limit
            .offset()
            .map(|offset| vec![SqlValue::Int(offset)])
            .unwrap_or_default()
    }

    fn bind_parameters(&self, query_params: &[SqlValue], parameterized: bool) -> Vec<SqlValue> {
        if !parameterized {
            return query_params.to_vec();
        }
        let split = self.leading_placeholders().min(query_params.len());
        let mut params = query_params[..split].to_vec();
        params.push(SqlValue::Int(self.top_count()));
        params.extend_from_slice(&query_params[split..]);
        params.extend(self.parameters_after());
        params
    }
}

/// `ROWNUM` wrapping (Oracle before 12c `FETCH` support).
///
/// Binds `offset + count` for the outer bound, then `offset`.
#[derive(Debug, Clone)]
pub struct OracleLimitHandler {
    query: String,
    limit: QueryLimit,
}

impl OracleLimitHandler {
    pub fn new(query: impl Into<String>, limit: QueryLimit) -> Self {
        Self {
            query: query.into(),
            limit,
        }
    }
}

impl LimitHandler for OracleLimitHandler {
    fn query(&self) -> &str {
        &self.query
    }

    fn limit(&self) -> &QueryLimit {
        &self.limit
    }

    fn limit_query(&self, parameterized: bool) -> String {
        let query = self.query.trim_end();
        match self.limit.offset() {
            Some(offset) => format!(
                "SELECT * FROM (SELECT Q_.*, ROWNUM RN_ FROM ({}) Q_ WHERE ROWNUM <= {}) WHERE RN_ > {}",
                query,
                value_or_placeholder(offset.saturating_add(self.limit.count), parameterized),
                value_or_placeholder(offset, parameterized)
            ),
            None => format!(
                "SELECT * FROM ({}) WHERE ROWNUM <= {}",
                query,
                value_or_placeholder(self.limit.count, parameterized)
            ),
        }
    }

    fn parameters_after(&self) -> Vec<SqlValue> {
        match self.limit.offset() {
            Some(offset) => vec![
                SqlValue::Int(offset.saturating_add(self.limit.count)),
                SqlValue::Int(offset),
            ],
            None => vec![SqlValue::Int(self.limit.count)],
        }
    }
}
