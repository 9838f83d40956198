//! Lexer: source text to positioned tokens.
//!
//! Individual token shapes are nom recognizers; [`tokenize`] drives them in a
//! single left-to-right pass and records the byte offset of every token.

use std::fmt;

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{escaped_transform, is_not, tag, take, take_while, take_while1},
    character::complete::{char, digit1, multispace1, not_line_ending, one_of, satisfy},
    combinator::{map, opt, recognize, value},
    multi::many0,
    sequence::{delimited, pair, tuple},
};
use serde::Serialize;
use tracing::trace;

use crate::error::{LexErrorKind, TranspileError, TranspileResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    Identifier,
    StringLiteral,
    NumberLiteral,
    /// `%>%` or `|>`
    PipeOperator,
    /// `(`, `)` or `,`
    Punctuation,
    ComparisonOperator,
    AssignOperator,
    /// `&`, `&&`, `|`, `||`
    LogicalOperator,
    ArithmeticOperator,
    NotOperator,
    EndOfInput,
}

/// A lexed token. `text` holds the decoded value: string literals are
/// unescaped and stripped of quotes, backtick names of backticks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, position: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            position,
        }
    }

    pub fn end_of_input(position: usize) -> Self {
        Self::new(TokenKind::EndOfInput, "", position)
    }

    /// True if this token has the given kind and text.
    pub fn is(&self, kind: TokenKind, text: &str) -> bool {
        self.kind == kind && self.text == text
    }

    pub fn is_punct(&self, text: &str) -> bool {
        self.is(TokenKind::Punctuation, text)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::EndOfInput => write!(f, "EndOfInput"),
            kind => write!(f, "{:?}({:?})", kind, self.text),
        }
    }
}

/// Whitespace and `#` comments.
fn trivia(input: &str) -> IResult<&str, ()> {
    value((), many0(alt((value((), multispace1), comment))))(input)
}

fn comment(input: &str) -> IResult<&str, ()> {
    value((), pair(char('#'), not_line_ending))(input)
}

fn pipe(input: &str) -> IResult<&str, (TokenKind, String)> {
    map(alt((tag("%>%"), tag("|>"))), |op: &str| {
        (TokenKind::PipeOperator, op.to_string())
    })(input)
}

fn quoted_with(quote: char) -> impl FnMut(&str) -> IResult<&str, String> {
    let stop = if quote == '"' { "\\\"" } else { "\\'" };
    move |input| {
        delimited(
            char(quote),
            map(
                opt(escaped_transform(
                    is_not(stop),
                    '\\',
                    alt((
                        value("\n", char('n')),
                        value("\t", char('t')),
                        value("\r", char('r')),
                        take(1usize),
                    )),
                )),
                Option::unwrap_or_default,
            ),
            char(quote),
        )(input)
    }
}

fn string_literal(input: &str) -> IResult<&str, (TokenKind, String)> {
    map(alt((quoted_with('"'), quoted_with('\''))), |s| {
        (TokenKind::StringLiteral, s)
    })(input)
}

fn backtick_name(input: &str) -> IResult<&str, (TokenKind, String)> {
    map(
        delimited(char('`'), take_while1(|c: char| c != '`'), char('`')),
        |name: &str| (TokenKind::Identifier, name.to_string()),
    )(input)
}

/// `12`, `3.5`, `.5`, `1e-3`.
fn number(input: &str) -> IResult<&str, (TokenKind, String)> {
    let mantissa = alt((
        recognize(pair(digit1, opt(pair(char('.'), digit1)))),
        recognize(pair(char('.'), digit1)),
    ));
    let exponent = opt(tuple((one_of("eE"), opt(one_of("+-")), digit1)));
    map(recognize(pair(mantissa, exponent)), |n: &str| {
        (TokenKind::NumberLiteral, n.to_string())
    })(input)
}

fn identifier(input: &str) -> IResult<&str, (TokenKind, String)> {
    map(
        recognize(pair(
            satisfy(|c: char| c.is_alphabetic() || c == '_' || c == '.'),
            take_while(|c: char| c.is_alphanumeric() || c == '_' || c == '.'),
        )),
        |name: &str| (TokenKind::Identifier, name.to_string()),
    )(input)
}

fn operator(input: &str) -> IResult<&str, (TokenKind, String)> {
    let comparison = map(
        alt((tag(">="), tag("<="), tag("=="), tag("!="), tag(">"), tag("<"))),
        |op: &str| (TokenKind::ComparisonOperator, op.to_string()),
    );
    let assign = map(tag("="), |op: &str| (TokenKind::AssignOperator, op.to_string()));
    let logical = map(
        alt((tag("&&"), tag("||"), tag("&"), tag("|"))),
        |op: &str| (TokenKind::LogicalOperator, op.to_string()),
    );
    let not = map(tag("!"), |op: &str| (TokenKind::NotOperator, op.to_string()));
    let arithmetic = map(recognize(one_of("+-*/")), |op: &str| {
        (TokenKind::ArithmeticOperator, op.to_string())
    });
    let punctuation = map(recognize(one_of("(),")), |p: &str| {
        (TokenKind::Punctuation, p.to_string())
    });
    alt((comparison, assign, logical, not, arithmetic, punctuation))(input)
}

fn token(input: &str) -> IResult<&str, (TokenKind, String)> {
    alt((pipe, string_literal, backtick_name, number, identifier, operator))(input)
}

/// Split `source` into tokens, ending with a single [`TokenKind::EndOfInput`].
pub fn tokenize(source: &str) -> TranspileResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut rest = source;

    loop {
        if let Ok((remaining, ())) = trivia(rest) {
            rest = remaining;
        }
        let position = source.len() - rest.len();
        let Some(first) = rest.chars().next() else {
            tokens.push(Token::end_of_input(position));
            break;
        };

        match token(rest) {
            Ok((remaining, (kind, text))) => {
                trace!(?kind, %text, position, "token");
                tokens.push(Token::new(kind, text, position));
                rest = remaining;
            }
            Err(_) => {
                let kind = match first {
                    '`' if rest.starts_with("``") => LexErrorKind::EmptyName,
                    '"' | '\'' | '`' => LexErrorKind::UnterminatedString,
                    c => LexErrorKind::InvalidCharacter(c),
                };
                return Err(TranspileError::lex(kind, position));
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<(TokenKind, String)> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| (t.kind, t.text))
            .collect()
    }

    #[test]
    fn test_pipeline_tokens() {
        use TokenKind::*;
        assert_eq!(
            kinds("mtcars %>% filter(mpg >= 20)"),
            vec![
                (Identifier, "mtcars".to_string()),
                (PipeOperator, "%>%".to_string()),
                (Identifier, "filter".to_string()),
                (Punctuation, "(".to_string()),
                (Identifier, "mpg".to_string()),
                (ComparisonOperator, ">=".to_string()),
                (NumberLiteral, "20".to_string()),
                (Punctuation, ")".to_string()),
                (EndOfInput, String::new()),
            ]
        );
    }

    #[test]
    fn test_positions_track_line_breaks() {
        let tokens = tokenize("df %>%\n  select(x)").unwrap();
        let positions: Vec<usize> = tokens.iter().map(|t| t.position).collect();
        assert_eq!(positions, vec![0, 3, 9, 15, 16, 17, 18]);
    }

    #[test]
    fn test_native_pipe_and_logical_ops() {
        use TokenKind::*;
        let toks = kinds("a |> b | c || d & e && f");
        let ops: Vec<_> = toks
            .iter()
            .filter(|(k, _)| *k != Identifier && *k != EndOfInput)
            .collect();
        assert_eq!(ops[0], &(PipeOperator, "|>".to_string()));
        assert_eq!(ops[1], &(LogicalOperator, "|".to_string()));
        assert_eq!(ops[2], &(LogicalOperator, "||".to_string()));
        assert_eq!(ops[3], &(LogicalOperator, "&".to_string()));
        assert_eq!(ops[4], &(LogicalOperator, "&&".to_string()));
    }

    #[test]
    fn test_assign_vs_equality() {
        use TokenKind::*;
        let toks = kinds("x = y == z != !w");
        assert_eq!(toks[1].0, AssignOperator);
        assert_eq!(toks[3].0, ComparisonOperator);
        assert_eq!(toks[5], (ComparisonOperator, "!=".to_string()));
        assert_eq!(toks[6].0, NotOperator);
    }

    #[test]
    fn test_numbers() {
        let toks = kinds("1 2.5 .5 1e10 3.2E-4");
        let nums: Vec<&str> = toks[..5].iter().map(|(_, t)| t.as_str()).collect();
        assert_eq!(nums, vec!["1", "2.5", ".5", "1e10", "3.2E-4"]);
        assert!(toks[..5].iter().all(|(k, _)| *k == TokenKind::NumberLiteral));
    }

    #[test]
    fn test_string_escapes() {
        let toks = kinds(r#""a\"b\n" 'it\'s' "\q" """#);
        assert_eq!(toks[0], (TokenKind::StringLiteral, "a\"b\n".to_string()));
        assert_eq!(toks[1], (TokenKind::StringLiteral, "it's".to_string()));
        assert_eq!(toks[2], (TokenKind::StringLiteral, "q".to_string()));
        assert_eq!(toks[3], (TokenKind::StringLiteral, String::new()));
    }

    #[test]
    fn test_backtick_and_dotted_identifiers() {
        let toks = kinds("`my col` is.na .x");
        assert_eq!(toks[0], (TokenKind::Identifier, "my col".to_string()));
        assert_eq!(toks[1], (TokenKind::Identifier, "is.na".to_string()));
        assert_eq!(toks[2], (TokenKind::Identifier, ".x".to_string()));
    }

    #[test]
    fn test_comments_are_skipped() {
        let tokens = tokenize("df # source table\n%>% head(1)").unwrap();
        assert_eq!(tokens[1].kind, TokenKind::PipeOperator);
        assert_eq!(tokens[1].position, 18);
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("df %>% filter(x == 'abc)").unwrap_err();
        assert_eq!(
            err,
            TranspileError::lex(LexErrorKind::UnterminatedString, 19)
        );
    }

    #[test]
    fn test_empty_backtick_name() {
        let err = tokenize("df %>% select(``)").unwrap_err();
        assert_eq!(err, TranspileError::lex(LexErrorKind::EmptyName, 14));
        let err = tokenize("df %>% select(`x)").unwrap_err();
        assert_eq!(err, TranspileError::lex(LexErrorKind::UnterminatedString, 14));
    }

    #[test]
    fn test_invalid_character() {
        let err = tokenize("df %>% select(x; y)").unwrap_err();
        assert_eq!(
            err,
            TranspileError::lex(LexErrorKind::InvalidCharacter(';'), 15)
        );
        let err = tokenize("df %% x").unwrap_err();
        assert_eq!(err, TranspileError::lex(LexErrorKind::InvalidCharacter('%'), 3));
    }

    #[test]
    fn test_token_display() {
        let tok = Token::new(TokenKind::Identifier, "select", 0);
        assert_eq!(tok.to_string(), "Identifier(\"select\")");
        assert_eq!(Token::end_of_input(3).to_string(), "EndOfInput");
    }
}
