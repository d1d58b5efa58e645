use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The SQL dialects a schema can be generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    Oracle,
    SqlServer,
    Sybase,
    PostgreSql,
    MySql,
    Db2,
    Derby,
    Hsqldb,
    Sqlite,
}

impl DialectKind {
    /// Every dialect, in a stable order.
    pub const ALL: [DialectKind; 9] = [
        Self::Oracle,
        Self::SqlServer,
        Self::Sybase,
        Self::PostgreSql,
        Self::MySql,
        Self::Db2,
        Self::Derby,
        Self::Hsqldb,
        Self::Sqlite,
    ];

    /// Lowercase identifier used on the command line and in file names.
    pub fn id(self) -> &'static str {
        match self {
            Self::Oracle => "oracle",
            Self::SqlServer => "sqlserver",
            Self::Sybase => "sybase",
            Self::PostgreSql => "postgresql",
            Self::MySql => "mysql",
            Self::Db2 => "db2",
            Self::Derby => "derby",
            Self::Hsqldb => "hsqldb",
            Self::Sqlite => "sqlite",
        }
    }

    /// Upper-case keyword used in `DBMS HINTS` blocks.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Oracle => "ORACLE",
            Self::SqlServer => "SQLSERVER",
            Self::Sybase => "SYBASE",
            Self::PostgreSql => "POSTGRESQL",
            Self::MySql => "MYSQL",
            Self::Db2 => "DB2",
            Self::Derby => "DERBY",
            Self::Hsqldb => "HSQLDB",
            Self::Sqlite => "SQLITE",
        }
    }

    /// Human-readable product name.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Oracle => "Oracle",
            Self::SqlServer => "Microsoft SQL Server",
            Self::Sybase => "Sybase ASE",
            Self::PostgreSql => "PostgreSQL",
            Self::MySql => "MySQL",
            Self::Db2 => "IBM Db2",
            Self::Derby => "Apache Derby",
            Self::Hsqldb => "HyperSQL",
            Self::Sqlite => "SQLite",
        }
    }

    /// Looks up a dialect by its hint keyword (exact, upper case).
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.keyword() == keyword)
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Error returned when a dialect identifier is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDialect(pub String);

impl fmt::Display for UnknownDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown dialect '{}'", self.0)
    }
}

impl std::error::Error for UnknownDialect {}

impl FromStr for DialectKind {
    type Err = UnknownDialect;

    /// Case-insensitive; accepts a few common aliases (`mssql`, `postgres`, `pg`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let kind = match lower.as_str() {
            "oracle" => Self::Oracle,
            "sqlserver" | "mssql" => Self::SqlServer,
            "sybase" => Self::Sybase,
            "postgresql" | "postgres" | "pg" => Self::PostgreSql,
            "mysql" => Self::MySql,
            "db2" => Self::Db2,
            "derby" => Self::Derby,
            "hsqldb" => Self::Hsqldb,
            "sqlite" => Self::Sqlite,
            _ => return Err(UnknownDialect(s.to_string())),
        };
        Ok(kind)
    }
}
