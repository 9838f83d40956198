//! SQL generation for parsed pipelines.
//!
//! Converts a [`Pipeline`] into a single SQL statement for one [`Dialect`].

pub mod builder;
pub mod dialect;
pub mod expr;
pub mod functions;
pub mod generator;
pub mod sql;
pub mod traits;

#[cfg(test)]
mod tests;

use tracing::debug;

use crate::ast::Pipeline;
use crate::config::TranspileOptions;
use crate::error::TranspileResult;
use generator::Generator;

pub use dialect::Dialect;
pub use traits::SqlGenerator;

/// Generate SQL for `pipeline`. The first failing verb aborts generation.
pub fn generate(
    pipeline: &Pipeline,
    dialect: Dialect,
    options: &TranspileOptions,
) -> TranspileResult<String> {
    let mut generator = Generator::new(&pipeline.source.name, dialect, options);
    for step in &pipeline.steps {
        generator.apply(step)?;
    }

    let stages = generator.stage_count();
    let sql = generator.finish();
    debug!(%dialect, verbs = pipeline.steps.len(), stages, bytes = sql.len(), "generated SQL");
    Ok(sql)
}

/// Trait for converting AST nodes to SQL.
pub trait ToSql {
    /// Convert using the default dialect and options.
    fn to_sql(&self) -> TranspileResult<String> {
        self.to_sql_with_dialect(Dialect::default())
    }

    fn to_sql_with_dialect(&self, dialect: Dialect) -> TranspileResult<String>;
}

impl ToSql for Pipeline {
    fn to_sql_with_dialect(&self, dialect: Dialect) -> TranspileResult<String> {
        generate(self, dialect, &TranspileOptions::default())
    }
}
