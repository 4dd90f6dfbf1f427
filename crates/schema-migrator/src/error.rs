//! Error types for the inspection and translation library.

use thiserror::Error;

/// Main error type for inspection, dialect and translation operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// No dialect, inspector or translator registered for a database product.
    #[error("No {service} available for {database}")]
    NoService { service: String, database: String },

    /// The session could not switch its active catalog.
    #[error("Failed to switch to catalog {catalog}: {message}")]
    CatalogSwitch { catalog: String, message: String },

    /// Catalog or statement query failed, with context
    #[error("Query failed: {message}\n  Context: {context}")]
    Query { message: String, context: String },

    /// A capability the dialect does not offer was requested.
    #[error("Not supported: {0}")]
    Unsupported(String),

    /// Row count semantics the dialect cannot satisfy for this combination
    #[error(
        "{count_type} row count is not supported by {dialect} for table {table} \
         (column: {column}, filter: {filter})"
    )]
    UnsupportedRowCount {
        dialect: String,
        table: String,
        count_type: String,
        column: bool,
        filter: bool,
    },

    /// Translation policy violation (e.g. zero date-time with exception behavior)
    #[error("Translation failed: {0}")]
    Translation(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid regular expression in a pattern translator
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl MigrateError {
    /// Create a Query error with context about where it occurred
    pub fn query(message: impl ToString, context: impl Into<String>) -> Self {
        MigrateError::Query {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Create a NoService error
    pub fn no_service(service: impl Into<String>, database: impl ToString) -> Self {
        MigrateError::NoService {
            service: service.into(),
            database: database.to_string(),
        }
    }

    /// Create a Translation error
    pub fn translation(message: impl Into<String>) -> Self {
        MigrateError::Translation(message.into())
    }

    /// Whether this error reports a missing capability rather than a failure.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            MigrateError::Unsupported(_) | MigrateError::UnsupportedRowCount { .. }
        )
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
