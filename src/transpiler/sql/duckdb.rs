use crate::transpiler::traits::{SqlGenerator, standard_aggregate};

/// DuckDB Generator.
pub struct DuckDbGenerator;

impl Default for DuckDbGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl DuckDbGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl SqlGenerator for DuckDbGenerator {
    fn name(&self) -> &'static str {
        "duckdb"
    }

    fn aggregate_function(&self, name: &str) -> Option<&'static str> {
        match name {
            "median" => Some("MEDIAN"),
            "mode" => Some("MODE"),
            _ => standard_aggregate(name),
        }
    }

    fn star_exclude(&self, columns: &[&str]) -> Option<String> {
        let quoted: Vec<String> = columns.iter().map(|c| self.quote_identifier(c)).collect();
        Some(format!("* EXCLUDE ({})", quoted.join(", ")))
    }
}
