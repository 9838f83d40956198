//! Classification and naming of R functions.

/// dplyr summary functions. Whether a dialect can express one is decided by
/// `SqlGenerator::aggregate_function`.
pub const AGGREGATE_FUNCTIONS: &[&str] = &[
    "mean",
    "sum",
    "min",
    "max",
    "n",
    "n_distinct",
    "sd",
    "var",
    "median",
    "mode",
];

/// Functions that only make sense over an ordered, partitioned window.
pub const WINDOW_FUNCTIONS: &[&str] = &[
    "row_number",
    "min_rank",
    "dense_rank",
    "percent_rank",
    "cume_dist",
    "lag",
    "lead",
];

pub fn is_aggregate(name: &str) -> bool {
    AGGREGATE_FUNCTIONS.contains(&name)
}

pub fn is_window(name: &str) -> bool {
    WINDOW_FUNCTIONS.contains(&name)
}

/// Aggregates and window functions: anything that reads more than one row.
pub fn is_multi_row(name: &str) -> bool {
    is_aggregate(name) || is_window(name)
}

/// SQL name of a ranking window function; these order the window by their
/// argument rather than by the current `arrange` keys.
pub fn ranking_function(name: &str) -> Option<&'static str> {
    match name {
        "row_number" => Some("ROW_NUMBER"),
        "min_rank" => Some("RANK"),
        "dense_rank" => Some("DENSE_RANK"),
        "percent_rank" => Some("PERCENT_RANK"),
        "cume_dist" => Some("CUME_DIST"),
        _ => None,
    }
}

/// SQL name of an offset window function.
pub fn offset_function(name: &str) -> Option<&'static str> {
    match name {
        "lag" => Some("LAG"),
        "lead" => Some("LEAD"),
        _ => None,
    }
}

/// Scalar functions that map one-to-one onto a SQL function.
pub fn scalar_function(name: &str) -> Option<&'static str> {
    match name {
        "abs" => Some("ABS"),
        "round" => Some("ROUND"),
        "floor" => Some("FLOOR"),
        "ceiling" => Some("CEIL"),
        "sqrt" => Some("SQRT"),
        "exp" => Some("EXP"),
        "log" => Some("LN"),
        "log10" => Some("LOG10"),
        "tolower" => Some("LOWER"),
        "toupper" => Some("UPPER"),
        "nchar" => Some("LENGTH"),
        "trimws" => Some("TRIM"),
        "coalesce" => Some("COALESCE"),
        _ => None,
    }
}
