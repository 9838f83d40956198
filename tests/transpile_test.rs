use dplyr_sql::prelude::*;
use serde_json::json;

#[test]
fn test_comments_and_layout() {
    let source = r#"
        # cars with good mileage
        mtcars %>%
            filter(mpg > 25) %>%   # economy only
            select(mpg, cyl)
    "#;
    let sql = transpile(source, Dialect::SQLite, &TranspileOptions::default())
        .expect("Failed to transpile commented pipeline");
    assert_eq!(sql, "SELECT mpg, cyl FROM mtcars WHERE mpg > 25");
}

#[test]
fn test_preserve_comments_does_not_change_sql() {
    let source = "mtcars %>% head(3) # first rows";
    let options = TranspileOptions {
        preserve_comments: true,
        ..TranspileOptions::default()
    };
    assert_eq!(
        transpile(source, Dialect::Postgres, &options).unwrap(),
        transpile(source, Dialect::Postgres, &TranspileOptions::default()).unwrap()
    );
}

#[test]
fn test_transpiler_from_config() {
    let config = Config::from_toml_str(
        r#"
        dialect = "duckdb"

        [options]
        strict_mode = false
        "#,
    )
    .expect("Failed to parse config");
    let transpiler = config.transpiler();
    assert_eq!(transpiler.dialect, Dialect::DuckDB);
    assert_eq!(
        transpiler.transpile("mtcars %>% rename(miles = mpg)").unwrap(),
        "SELECT * EXCLUDE (mpg), mpg AS miles FROM mtcars"
    );
}

#[test]
fn test_dialect_from_str() {
    assert_eq!("postgresql".parse::<Dialect>().unwrap(), Dialect::Postgres);
    assert_eq!("DuckDB".parse::<Dialect>().unwrap(), Dialect::DuckDB);
    let err = "oracle".parse::<Dialect>().unwrap_err();
    assert_eq!(
        err.to_string(),
        "unknown SQL dialect 'oracle' (expected postgresql, mysql, sqlite or duckdb)"
    );
}

#[test]
fn test_error_positions_map_to_lines() {
    let source = "mtcars %>%\n  filter(mpg > 20) %>%\n  pivot_wider(cyl)";
    let err = Transpiler::new(Dialect::Postgres)
        .transpile(source)
        .unwrap_err();
    assert_eq!(err.position(), Some(36));
    assert_eq!(err.line_col(source), Some((3, 3)));
}

#[test]
fn test_errors_serialize() {
    let err = parse("select(mpg").unwrap_err();
    assert_eq!(
        serde_json::to_value(&err).unwrap(),
        json!({
            "Parse": {
                "kind": "UnexpectedToken",
                "expected": "table name",
                "found": { "kind": "Identifier", "text": "select", "position": 0 },
                "position": 0
            }
        })
    );

    let err = transpile(
        "mtcars %>% summarise(m = median(mpg))",
        Dialect::SQLite,
        &TranspileOptions::default(),
    )
    .unwrap_err();
    assert_eq!(
        serde_json::to_value(&err).unwrap(),
        json!({
            "Generation": {
                "kind": "UnsupportedAggregate",
                "dialect": "sqlite",
                "detail": "median"
            }
        })
    );
}

#[test]
fn test_pipeline_serializes() {
    let pipeline = parse("mtcars %>% head(2)").unwrap();
    let value = serde_json::to_value(&pipeline).unwrap();
    assert_eq!(value["source"]["name"], "mtcars");
    assert_eq!(value["steps"][0], json!({ "Head": { "n": 2 } }));
}

#[test]
fn test_concurrent_calls_agree() {
    let sources = [
        "mtcars %>% group_by(cyl) %>% summarise(avg_mpg = mean(mpg)) %>% arrange(desc(avg_mpg))",
        "mtcars %>% mutate(kpl = mpg * 0.425) %>% filter(kpl > 9) %>% head(5)",
        "mtcars %>% filter(hp > 100 & am == 1) %>% select(mpg, hp)",
    ];
    let expected: Vec<Vec<String>> = sources
        .iter()
        .map(|source| {
            Dialect::ALL
                .iter()
                .map(|dialect| Transpiler::new(*dialect).transpile(source).unwrap())
                .collect()
        })
        .collect();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for (source, expected) in sources.iter().zip(&expected) {
                    for (dialect, sql) in Dialect::ALL.iter().zip(expected) {
                        let actual = Transpiler::new(*dialect).transpile(source).unwrap();
                        assert_eq!(&actual, sql);
                    }
                }
            });
        }
    });
}
