//! Dialect capability trait and identifier quoting rules.

/// SQL reserved words that must be quoted when used as identifiers.
pub const RESERVED_WORDS: &[&str] = &[
    "all",
    "and",
    "as",
    "asc",
    "between",
    "by",
    "case",
    "check",
    "column",
    "create",
    "default",
    "delete",
    "desc",
    "distinct",
    "drop",
    "else",
    "end",
    "except",
    "exclude",
    "false",
    "from",
    "group",
    "having",
    "in",
    "index",
    "inner",
    "insert",
    "is",
    "join",
    "key",
    "left",
    "like",
    "limit",
    "not",
    "null",
    "offset",
    "on",
    "or",
    "order",
    "outer",
    "over",
    "partition",
    "primary",
    "references",
    "right",
    "select",
    "table",
    "then",
    "true",
    "union",
    "update",
    "user",
    "when",
    "where",
    "window",
    "with",
];

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Whether `name` must be quoted to survive as an identifier.
///
/// Case-sensitive dialects fold unquoted names to lower case, so any upper
/// case letter forces quoting there.
pub fn needs_quoting(name: &str, case_sensitive: bool) -> bool {
    RESERVED_WORDS.contains(&name.to_lowercase().as_str())
        || !is_plain_identifier(name)
        || (case_sensitive && name.chars().any(|c| c.is_ascii_uppercase()))
}

/// Aggregates every built-in dialect spells the same way.
pub fn standard_aggregate(name: &str) -> Option<&'static str> {
    match name {
        "mean" => Some("AVG"),
        "sum" => Some("SUM"),
        "min" => Some("MIN"),
        "max" => Some("MAX"),
        "n" | "n_distinct" => Some("COUNT"),
        "sd" => Some("STDDEV_SAMP"),
        "var" => Some("VAR_SAMP"),
        _ => None,
    }
}

/// Trait for dialect-specific SQL generation.
///
/// Implementations are stateless records; the generator never branches on
/// the dialect itself, only on these capabilities.
pub trait SqlGenerator: Send + Sync {
    /// Lower-case dialect name as accepted by `Dialect::from_str`.
    fn name(&self) -> &'static str;

    /// Character used to delimit identifiers.
    fn identifier_quote(&self) -> char {
        '"'
    }

    /// Whether unquoted identifiers are folded, so mixed case must be quoted.
    fn is_case_sensitive(&self) -> bool {
        false
    }

    fn supports_cte(&self) -> bool {
        true
    }

    fn supports_full_join(&self) -> bool {
        true
    }

    /// Quote an identifier (column or alias) only when it needs it.
    fn quote_identifier(&self, name: &str) -> String {
        if !needs_quoting(name, self.is_case_sensitive()) {
            return name.to_string();
        }
        let quote = self.identifier_quote();
        let doubled: String = [quote, quote].iter().collect();
        format!("{quote}{}{quote}", name.replace(quote, &doubled))
    }

    /// Quote a possibly schema-qualified table name part by part.
    fn quote_qualified(&self, name: &str) -> String {
        name.split('.')
            .map(|part| self.quote_identifier(part))
            .collect::<Vec<_>>()
            .join(".")
    }

    fn quote_string(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    /// Generate string concatenation expression (e.g. 'a' || 'b' vs CONCAT('a', 'b')).
    fn string_concat(&self, parts: &[&str]) -> String {
        parts.join(" || ")
    }

    /// Map a dplyr aggregate name to the SQL function name, if supported.
    fn aggregate_function(&self, name: &str) -> Option<&'static str> {
        standard_aggregate(name)
    }

    fn limit_clause(&self, n: u64) -> String {
        format!("LIMIT {}", n)
    }

    /// `*` minus some columns, if the dialect has syntax for it.
    fn star_exclude(&self, _columns: &[&str]) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_identifier() {
        assert!(is_plain_identifier("mpg"));
        assert!(is_plain_identifier("_x1"));
        assert!(!is_plain_identifier("1x"));
        assert!(!is_plain_identifier("Sepal.Length"));
        assert!(!is_plain_identifier("my col"));
        assert!(!is_plain_identifier(""));
    }

    #[test]
    fn test_needs_quoting() {
        assert!(needs_quoting("order", false));
        assert!(needs_quoting("Group", false));
        assert!(!needs_quoting("Mpg", false));
        assert!(needs_quoting("Mpg", true));
        assert!(!needs_quoting("mpg", true));
    }
}
