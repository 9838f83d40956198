use crate::transpiler::traits::{SqlGenerator, standard_aggregate};

/// SQLite Generator.
pub struct SqliteGenerator;

impl Default for SqliteGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl SqliteGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl SqlGenerator for SqliteGenerator {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    /// No sample variance or standard deviation without an extension.
    fn aggregate_function(&self, name: &str) -> Option<&'static str> {
        match name {
            "sd" | "var" => None,
            _ => standard_aggregate(name),
        }
    }
}
