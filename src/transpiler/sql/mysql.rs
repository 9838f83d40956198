use crate::transpiler::traits::SqlGenerator;

/// MySQL Generator.
pub struct MysqlGenerator;

impl Default for MysqlGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl MysqlGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl SqlGenerator for MysqlGenerator {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn identifier_quote(&self) -> char {
        '`'
    }

    fn supports_full_join(&self) -> bool {
        false
    }

    // Backslash is an escape character inside MySQL string literals
    fn quote_string(&self, value: &str) -> String {
        format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
    }

    fn string_concat(&self, parts: &[&str]) -> String {
        format!("CONCAT({})", parts.join(", "))
    }
}
