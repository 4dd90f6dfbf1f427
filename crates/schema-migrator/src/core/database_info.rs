//! Database product and driver identification.
//!
//! A [`DatabaseInfo`] plays two roles: the live description reported by a
//! session, and a registration key in a service resolver where unset fields
//! act as wildcards.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Product name reported by MySQL servers.
pub const MYSQL: &str = "MySQL";
/// Product name reported by PostgreSQL servers.
pub const POSTGRESQL: &str = "PostgreSQL";
/// Product name reported by SQL Server.
pub const MSSQL_SERVER: &str = "Microsoft SQL Server";
/// Product name reported by Oracle servers.
pub const ORACLE: &str = "Oracle";
/// Product name reported by NuoDB.
pub const NUODB: &str = "NuoDB";

/// Database product, version string and numeric version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DatabaseInfo {
    pub product_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major_version: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minor_version: Option<i32>,
}

impl DatabaseInfo {
    /// Product-only key.
    pub fn new(product_name: impl Into<String>) -> Self {
        Self {
            product_name: product_name.into(),
            ..Default::default()
        }
    }

    /// Fully specified live description.
    pub fn with_version(
        product_name: impl Into<String>,
        product_version: impl Into<String>,
        major_version: i32,
        minor_version: i32,
    ) -> Self {
        Self {
            product_name: product_name.into(),
            product_version: Some(product_version.into()),
            major_version: Some(major_version),
            minor_version: Some(minor_version),
        }
    }

    pub fn product_version(mut self, version: impl Into<String>) -> Self {
        self.product_version = Some(version.into());
        self
    }

    pub fn major_version(mut self, major: i32) -> Self {
        self.major_version = Some(major);
        self
    }

    pub fn minor_version(mut self, minor: i32) -> Self {
        self.minor_version = Some(minor);
        self
    }

    pub fn mysql() -> Self {
        Self::new(MYSQL)
    }

    pub fn postgresql() -> Self {
        Self::new(POSTGRESQL)
    }

    pub fn mssql_server() -> Self {
        Self::new(MSSQL_SERVER)
    }

    pub fn oracle() -> Self {
        Self::new(ORACLE)
    }

    pub fn nuodb() -> Self {
        Self::new(NUODB)
    }

    /// Whether the product name matches, ignoring case.
    pub fn is_product(&self, product_name: &str) -> bool {
        self.product_name.eq_ignore_ascii_case(product_name)
    }

    /// Whether this registration key matches a live description.
    ///
    /// Every field set on the key must equal the live field; unset fields
    /// match anything.
    pub fn matches(&self, live: &DatabaseInfo) -> bool {
        if !live.is_product(&self.product_name) {
            return false;
        }
        if self.product_version.is_some() && self.product_version != live.product_version {
            return false;
        }
        if self.major_version.is_some() && self.major_version != live.major_version {
            return false;
        }
        if self.minor_version.is_some() && self.minor_version != live.minor_version {
            return false;
        }
        true
    }

    /// Number of fields set on this key, the product name included.
    pub fn specificity(&self) -> usize {
        1 + usize::from(self.product_version.is_some())
            + usize::from(self.major_version.is_some())
            + usize::from(self.minor_version.is_some())
    }
}

impl fmt::Display for DatabaseInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.product_name)?;
        if let Some(version) = &self.product_version {
            write!(f, " {}", version)?;
        }
        match (self.major_version, self.minor_version) {
            (Some(major), Some(minor)) => write!(f, " ({}.{})", major, minor),
            (Some(major), None) => write!(f, " ({})", major),
            _ => Ok(()),
        }
    }
}

/// Driver name and version reported by a session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DriverInfo {
    pub name: String,
    pub version: String,
    pub major_version: i32,
    pub minor_version: i32,
}

impl DriverInfo {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        let version = version.into();
        let mut parts = version.split('.').map(|p| p.trim().parse::<i32>().unwrap_or(0));
        let major_version = parts.next().unwrap_or(0);
        let minor_version = parts.next().unwrap_or(0);
        Self {
            name: name.into(),
            version,
            major_version,
            minor_version,
        }
    }
}
