use crate::transpiler::traits::SqlGenerator;

/// PostgreSQL: double-quoted identifiers, unquoted names fold to lower case.
pub struct PostgresGenerator;

impl Default for PostgresGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl PostgresGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl SqlGenerator for PostgresGenerator {
    fn name(&self) -> &'static str {
        "postgresql"
    }

    fn is_case_sensitive(&self) -> bool {
        true
    }
}
