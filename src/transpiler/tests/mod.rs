//! Transpiler test modules.
//!
//! Tests are organized by category:
//! - `core`: Single-level SELECT shapes for each verb
//! - `flush`: Verb orders that need subqueries or a WITH chain
//! - `dialects`: Quoting, functions and capabilities per dialect
//! - `errors`: Generation errors and strict mode
//! - `joins`: Joins and set operations


use crate::config::TranspileOptions;
use crate::error::TranspileResult;
use crate::transpiler::Dialect;

fn try_sql(source: &str, dialect: Dialect) -> TranspileResult<String> {
    crate::transpile(source, dialect, &TranspileOptions::default())
}

fn sql(source: &str) -> String {
    try_sql(source, Dialect::Postgres).unwrap()
}
