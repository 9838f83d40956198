use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UnknownDialect;
use crate::transpiler::sql::duckdb::DuckDbGenerator;
use crate::transpiler::sql::mysql::MysqlGenerator;
use crate::transpiler::sql::postgres::PostgresGenerator;
use crate::transpiler::sql::sqlite::SqliteGenerator;
use crate::transpiler::traits::SqlGenerator;

/// Supported SQL Dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Dialect {
    #[default]
    #[serde(rename = "postgresql", alias = "postgres", alias = "pg")]
    Postgres,
    #[serde(rename = "mysql")]
    MySQL,
    #[serde(rename = "sqlite")]
    SQLite,
    #[serde(rename = "duckdb")]
    DuckDB,
}

static POSTGRES: PostgresGenerator = PostgresGenerator;
static MYSQL: MysqlGenerator = MysqlGenerator;
static SQLITE: SqliteGenerator = SqliteGenerator;
static DUCKDB: DuckDbGenerator = DuckDbGenerator;

impl Dialect {
    pub const ALL: [Dialect; 4] = [
        Dialect::Postgres,
        Dialect::MySQL,
        Dialect::SQLite,
        Dialect::DuckDB,
    ];

    /// The dialect's capability record. These are stateless and shared.
    pub fn generator(&self) -> &'static dyn SqlGenerator {
        match self {
            Dialect::Postgres => &POSTGRES,
            Dialect::MySQL => &MYSQL,
            Dialect::SQLite => &SQLITE,
            Dialect::DuckDB => &DUCKDB,
        }
    }

    pub fn name(&self) -> &'static str {
        self.generator().name()
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = UnknownDialect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgresql" | "postgres" | "pg" => Ok(Dialect::Postgres),
            "mysql" => Ok(Dialect::MySQL),
            "sqlite" => Ok(Dialect::SQLite),
            "duckdb" => Ok(Dialect::DuckDB),
            _ => Err(UnknownDialect(s.to_string())),
        }
    }
}
