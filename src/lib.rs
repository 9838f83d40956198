//! # dplyr-sql
//!
//! Transpiles pipe-chained dplyr verbs into SQL for PostgreSQL, MySQL,
//! SQLite and DuckDB.
//!
//! ## Quick Example
//!
//! ```
//! use dplyr_sql::{Dialect, TranspileOptions, transpile};
//!
//! let sql = transpile(
//!     "mtcars %>% group_by(cyl) %>% summarise(avg_mpg = mean(mpg))",
//!     Dialect::Postgres,
//!     &TranspileOptions::default(),
//! )
//! .unwrap();
//! assert_eq!(sql, "SELECT cyl, AVG(mpg) AS avg_mpg FROM mtcars GROUP BY cyl");
//! ```
//!
//! ## Verbs
//!
//! | Verb        | SQL                                         |
//! |-------------|---------------------------------------------|
//! | `select`    | projection, `old AS new` for renames        |
//! | `filter`    | `WHERE`, or `HAVING` after summarise        |
//! | `mutate`    | `expr AS alias`, windows via `OVER`         |
//! | `arrange`   | `ORDER BY`                                  |
//! | `group_by`  | `GROUP BY` / window partitions              |
//! | `summarise` | aggregate projection                        |
//! | `rename`    | `old AS new`                                |
//! | `head`      | `LIMIT`                                     |
//! | `*_join`    | `JOIN ... USING/ON`, `EXISTS` for semi/anti |
//! | `union` etc | `UNION`, `UNION ALL`, `INTERSECT`, `EXCEPT` |
//!
//! Verb orders SQL cannot express in one `SELECT` are split into nested
//! subqueries or a `WITH` chain.

pub mod ast;
pub mod config;
pub mod error;
pub mod parser;
pub mod transpiler;

use tracing::debug;

pub use config::{Config, TranspileOptions};
pub use error::{TranspileError, TranspileResult};
pub use parser::parse;
pub use transpiler::{Dialect, ToSql};

pub mod prelude {
    pub use crate::ast::*;
    pub use crate::config::{Config, TranspileOptions};
    pub use crate::error::*;
    pub use crate::parser::parse;
    pub use crate::transpiler::{Dialect, ToSql};
    pub use crate::{Transpiler, transpile};
}

/// Transpile dplyr source text to a single SQL statement.
///
/// Pure: the same arguments always give the same SQL or the same error.
pub fn transpile(
    source: &str,
    dialect: Dialect,
    options: &TranspileOptions,
) -> TranspileResult<String> {
    if options.preserve_comments {
        debug!("preserve_comments set; comments are not carried into SQL");
    }
    let pipeline = parser::parse(source)?;
    transpiler::generate(&pipeline, dialect, options)
}

/// A dialect and options bundled for repeated use.
///
/// # Example
///
/// ```
/// use dplyr_sql::{Dialect, Transpiler};
///
/// let sqlite = Transpiler::new(Dialect::SQLite);
/// let sql = sqlite.transpile("mtcars %>% arrange(desc(mpg))").unwrap();
/// assert_eq!(sql, "SELECT * FROM mtcars ORDER BY mpg DESC");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Transpiler {
    pub dialect: Dialect,
    pub options: TranspileOptions,
}

impl Transpiler {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            options: TranspileOptions::default(),
        }
    }

    pub fn with_options(mut self, options: TranspileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.options.strict_mode = strict;
        self
    }

    pub fn transpile(&self, source: &str) -> TranspileResult<String> {
        transpile(source, self.dialect, &self.options)
    }
}
