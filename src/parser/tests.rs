use super::*;
use crate::ast::builders::*;
use crate::ast::*;
use crate::error::{LexErrorKind, ParseErrorKind};
use pretty_assertions::assert_eq;

fn steps(source: &str) -> Vec<VerbCall> {
    parse(source).unwrap().steps
}

fn parse_error(source: &str) -> (ParseErrorKind, String, Token) {
    match parse(source).unwrap_err() {
        TranspileError::Parse {
            kind,
            expected,
            found,
            ..
        } => (kind, expected, found),
        other => panic!("expected a parse error, got {other:?}"),
    }
}

// ========================================================================
// Pipelines
// ========================================================================

#[test]
fn test_lone_table() {
    let pipeline = parse("mtcars").unwrap();
    assert_eq!(pipeline.source, TableRef::new("mtcars", 0));
    assert!(pipeline.steps.is_empty());
}

#[test]
fn test_select_columns() {
    let pipeline = parse("mtcars %>% select(mpg, cyl)").unwrap();
    assert_eq!(
        pipeline,
        Pipeline::new("mtcars").then(VerbCall::Select {
            columns: vec!["mpg".into(), "cyl".into()],
        })
    );
}

#[test]
fn test_native_pipe_and_multiline() {
    let source = "mtcars |>\n  filter(mpg > 20) %>%\n  head(5)";
    assert_eq!(
        steps(source),
        vec![
            VerbCall::Filter {
                condition: gt(col("mpg"), num("20")),
            },
            VerbCall::Head { n: 5 },
        ]
    );
}

#[test]
fn test_table_position_after_leading_whitespace() {
    let pipeline = parse("  # cars\n  mtcars %>% head()").unwrap();
    assert_eq!(pipeline.source.position, 11);
}

// ========================================================================
// Verbs
// ========================================================================

#[test]
fn test_select_with_rename() {
    assert_eq!(
        steps("mtcars %>% select(miles = mpg, cyl)"),
        vec![VerbCall::Select {
            columns: vec![renamed("miles", "mpg"), "cyl".into()],
        }]
    );
}

#[test]
fn test_rename() {
    assert_eq!(
        steps("mtcars %>% rename(miles = mpg, cylinders = cyl)"),
        vec![VerbCall::Rename {
            columns: vec![
                ColumnAlias {
                    alias: "miles".to_string(),
                    source: "mpg".to_string(),
                },
                ColumnAlias {
                    alias: "cylinders".to_string(),
                    source: "cyl".to_string(),
                },
            ],
        }]
    );
}

#[test]
fn test_rename_requires_assignment() {
    let (kind, expected, found) = parse_error("mtcars %>% rename(mpg)");
    assert_eq!(kind, ParseErrorKind::UnexpectedToken);
    assert_eq!(expected, "=");
    assert_eq!(found, Token::new(TokenKind::Punctuation, ")", 21));
}

#[test]
fn test_mutate_assignments() {
    assert_eq!(
        steps("mtcars %>% mutate(kpl = mpg * 0.425, heavy = wt > 3.5)"),
        vec![VerbCall::Mutate {
            assignments: vec![
                assign("kpl", Expr::binary(col("mpg"), BinaryOp::Mul, num("0.425"))),
                assign("heavy", gt(col("wt"), num("3.5"))),
            ],
        }]
    );
}

#[test]
fn test_arrange_desc() {
    assert_eq!(
        steps("mtcars %>% arrange(cyl, desc(mpg))"),
        vec![VerbCall::Arrange {
            keys: vec![asc(col("cyl")), desc(col("mpg"))],
        }]
    );
}

#[test]
fn test_arrange_desc_of_expression() {
    assert_eq!(
        steps("mtcars %>% arrange(desc(hp / wt))"),
        vec![VerbCall::Arrange {
            keys: vec![desc(Expr::binary(col("hp"), BinaryOp::Div, col("wt")))],
        }]
    );
}

#[test]
fn test_group_by_and_summarize_spelling() {
    assert_eq!(
        steps("mtcars %>% group_by(cyl, gear) %>% summarize(n = n(), avg = mean(mpg, na.rm = TRUE))"),
        vec![
            VerbCall::GroupBy {
                columns: vec!["cyl".to_string(), "gear".to_string()],
            },
            VerbCall::Summarise {
                assignments: vec![
                    assign("n", call("n", vec![])),
                    assign("avg", call("mean", vec![col("mpg")])),
                ],
            },
        ]
    );
}

#[test]
fn test_head_forms() {
    assert_eq!(steps("t %>% head()"), vec![VerbCall::Head { n: 6 }]);
    assert_eq!(steps("t %>% head(10)"), vec![VerbCall::Head { n: 10 }]);
    assert_eq!(steps("t %>% head(n = 3)"), vec![VerbCall::Head { n: 3 }]);
}

#[test]
fn test_head_rejects_non_integer() {
    let (_, expected, found) = parse_error("t %>% head(2.5)");
    assert_eq!(expected, "non-negative integer row count");
    assert_eq!(found.text, "2.5");

    let (_, expected, _) = parse_error("t %>% head(x)");
    assert_eq!(expected, "non-negative integer row count");
}

#[test]
fn test_filter_commas_combine_with_and() {
    assert_eq!(
        steps("mtcars %>% filter(mpg > 20, cyl == 4)"),
        vec![VerbCall::Filter {
            condition: and(gt(col("mpg"), num("20")), eq(col("cyl"), num("4"))),
        }]
    );
}

#[test]
fn test_join_key_forms() {
    let join = |kind, by| VerbCall::Join {
        kind,
        table: "engines".to_string(),
        by,
    };
    assert_eq!(
        steps("cars %>% inner_join(engines, by = \"id\")"),
        vec![join(JoinKind::Inner, vec![JoinColumn::same("id")])]
    );
    assert_eq!(
        steps("cars %>% left_join(engines, id)"),
        vec![join(JoinKind::Left, vec![JoinColumn::same("id")])]
    );
    assert_eq!(
        steps("cars %>% full_join(engines, by = c(\"model\", \"engine_id\" = \"id\"))"),
        vec![join(
            JoinKind::Full,
            vec![JoinColumn::same("model"), key("engine_id", "id")]
        )]
    );
    assert_eq!(
        steps("cars %>% anti_join(engines, join_by(engine_id == id, year))"),
        vec![join(
            JoinKind::Anti,
            vec![key("engine_id", "id"), JoinColumn::same("year")]
        )]
    );
    assert_eq!(
        steps("cars %>% right_join(engines)"),
        vec![join(JoinKind::Right, Vec::new())]
    );
}

#[test]
fn test_join_rejects_empty_key() {
    let (_, expected, found) = parse_error("cars %>% semi_join(engines, by = \"\")");
    assert_eq!(expected, "join column");
    assert_eq!(found.kind, TokenKind::StringLiteral);

    let (_, expected, _) = parse_error("cars %>% semi_join(engines, by = c())");
    assert_eq!(expected, "join column");
}

#[test]
fn test_set_operations() {
    assert_eq!(
        steps("a %>% union(b) %>% setdiff(c) %>% union_all(d) %>% intersect(e)"),
        vec![
            VerbCall::SetOp { op: SetOperation::Union, table: "b".to_string() },
            VerbCall::SetOp { op: SetOperation::SetDiff, table: "c".to_string() },
            VerbCall::SetOp { op: SetOperation::UnionAll, table: "d".to_string() },
            VerbCall::SetOp { op: SetOperation::Intersect, table: "e".to_string() },
        ]
    );
    let (_, expected, _) = parse_error("a %>% union(b, c)");
    assert_eq!(expected, ")");
}

// ========================================================================
// Expressions
// ========================================================================

fn condition(source: &str) -> Expr {
    let mut steps = steps(&format!("t %>% filter({source})"));
    match steps.remove(0) {
        VerbCall::Filter { condition } => condition,
        other => panic!("expected filter, got {other:?}"),
    }
}

#[test]
fn test_logical_precedence() {
    assert_eq!(
        condition("a > 1 & b < 2 | !c"),
        or(
            and(gt(col("a"), num("1")), lt(col("b"), num("2"))),
            not(col("c"))
        )
    );
    assert_eq!(condition("a && b || c"), or(and(col("a"), col("b")), col("c")));
}

#[test]
fn test_not_binds_looser_than_comparison() {
    assert_eq!(condition("!x == 1"), not(eq(col("x"), num("1"))));
}

#[test]
fn test_arithmetic_precedence() {
    let neg_x = Expr::unary(UnaryOp::Neg, col("x"));
    assert_eq!(
        condition("-x * 2 + y / 3 > 0"),
        gt(
            Expr::binary(
                Expr::binary(neg_x, BinaryOp::Mul, num("2")),
                BinaryOp::Add,
                Expr::binary(col("y"), BinaryOp::Div, num("3")),
            ),
            num("0")
        )
    );
    assert_eq!(
        condition("a - b - c"),
        Expr::binary(
            Expr::binary(col("a"), BinaryOp::Sub, col("b")),
            BinaryOp::Sub,
            col("c")
        )
    );
}

#[test]
fn test_parentheses_override_precedence() {
    assert_eq!(
        condition("(a | b) & c"),
        and(or(col("a"), col("b")), col("c"))
    );
}

#[test]
fn test_literal_keywords() {
    assert_eq!(condition("am == TRUE"), eq(col("am"), boolean(true)));
    assert_eq!(condition("x != NA"), Expr::binary(col("x"), BinaryOp::Ne, null_na()));
    assert_eq!(condition("name == 'a b'"), eq(col("name"), text("a b")));
}

fn null_na() -> Expr {
    Expr::Literal(Literal::new("NA", LiteralKind::Null))
}

#[test]
fn test_backtick_and_dotted_names() {
    assert_eq!(
        condition("`my col` > Sepal.Length"),
        gt(col("my col"), col("Sepal.Length"))
    );
}

#[test]
fn test_nested_calls() {
    assert_eq!(
        condition("is.na(coalesce(x, 0))"),
        call("is.na", vec![call("coalesce", vec![col("x"), num("0")])])
    );
}

// ========================================================================
// Errors
// ========================================================================

#[test]
fn test_verb_without_table() {
    let err = parse("select(mpg").unwrap_err();
    assert_eq!(
        err,
        TranspileError::Parse {
            kind: ParseErrorKind::UnexpectedToken,
            expected: "table name".to_string(),
            found: Token::new(TokenKind::Identifier, "select", 0),
            position: 0,
        }
    );
}

#[test]
fn test_chained_comparison_rejected() {
    let (kind, expected, found) = parse_error("t %>% filter(a < b < c)");
    assert_eq!(kind, ParseErrorKind::UnexpectedToken);
    assert_eq!(expected, "& or | between comparisons");
    assert_eq!(found, Token::new(TokenKind::ComparisonOperator, "<", 19));
}

#[test]
fn test_unsupported_verb() {
    let err = parse("t %>% pivot_longer(x)").unwrap_err();
    assert_eq!(err.position(), Some(6));
    let (kind, _, found) = parse_error("t %>% pivot_longer(x)");
    assert_eq!(kind, ParseErrorKind::UnsupportedVerb);
    assert_eq!(found.text, "pivot_longer");
}

#[test]
fn test_trailing_tokens() {
    let (_, expected, found) = parse_error("t x");
    assert_eq!(expected, "%>% or end of input");
    assert_eq!(found, Token::new(TokenKind::Identifier, "x", 2));
}

#[test]
fn test_missing_close_paren() {
    let (_, expected, found) = parse_error("t %>% select(a");
    assert_eq!(expected, ", or )");
    assert_eq!(found.kind, TokenKind::EndOfInput);
}

#[test]
fn test_dangling_pipe() {
    let (_, expected, found) = parse_error("t %>%");
    assert_eq!(expected, "verb name");
    assert_eq!(found.kind, TokenKind::EndOfInput);
}

#[test]
fn test_empty_input() {
    let (_, expected, _) = parse_error("");
    assert_eq!(expected, "table name");
}

#[test]
fn test_lex_errors_surface_from_parse() {
    let err = parse("t %>% filter(x == 'a)").unwrap_err();
    assert_eq!(
        err,
        TranspileError::Lex {
            kind: LexErrorKind::UnterminatedString,
            position: 18,
        }
    );
}

#[test]
fn test_token_stream_must_be_terminated() {
    let mut tokens = tokenize("t %>% filter(x == 'a b')").unwrap();
    assert_eq!(
        parse_tokens(tokens.clone()).unwrap().steps,
        steps("t %>% filter(x == 'a b')")
    );

    tokens.pop();
    match parse_tokens(tokens).unwrap_err() {
        TranspileError::Parse {
            expected, found, position, ..
        } => {
            assert_eq!(expected, "end of input token");
            assert_eq!(found, Token::new(TokenKind::Punctuation, ")", 23));
            assert_eq!(position, 23);
        }
        other => panic!("expected a parse error, got {other:?}"),
    }

    let err = parse_tokens(Vec::new()).unwrap_err();
    assert_eq!(err.position(), Some(0));
}
