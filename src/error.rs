//! Error types for dplyr-sql.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::parser::tokens::Token;
use crate::transpiler::Dialect;

/// What went wrong while scanning source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LexErrorKind {
    /// A character that starts no token (control characters, stray `%`, ...).
    InvalidCharacter(char),
    /// A quoted string or backtick name that reaches end of input.
    UnterminatedString,
    /// A pair of backticks with nothing between them.
    EmptyName,
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexErrorKind::InvalidCharacter(c) => write!(f, "invalid character {:?}", c),
            LexErrorKind::UnterminatedString => write!(f, "unterminated string literal"),
            LexErrorKind::EmptyName => write!(f, "empty backtick name"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseErrorKind {
    UnexpectedToken,
    /// An identifier after `%>%` that names no supported verb.
    UnsupportedVerb,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::UnexpectedToken => write!(f, "unexpected token"),
            ParseErrorKind::UnsupportedVerb => write!(f, "unsupported verb"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GenerationErrorKind {
    /// An aggregate the target dialect cannot express.
    UnsupportedAggregate,
    /// A verb or function usage with no SQL rendering in the target dialect.
    UnsupportedOperation,
    /// Strict mode: a reference to a column the current projection does not expose.
    UnknownColumn,
}

impl fmt::Display for GenerationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationErrorKind::UnsupportedAggregate => write!(f, "unsupported aggregate"),
            GenerationErrorKind::UnsupportedOperation => write!(f, "unsupported operation"),
            GenerationErrorKind::UnknownColumn => write!(f, "unknown column"),
        }
    }
}

/// The single error type returned by every stage of a transpile call.
///
/// `position` fields are byte offsets into the source text; use
/// [`TranspileError::line_col`] to turn them into line/column pairs.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum TranspileError {
    #[error("Lex error at position {position}: {kind}")]
    Lex { kind: LexErrorKind, position: usize },

    #[error("Parse error at position {position}: {kind}, expected {expected} but found {found}")]
    Parse {
        kind: ParseErrorKind,
        expected: String,
        found: Token,
        position: usize,
    },

    #[error("Generation error ({dialect}): {kind}: {detail}")]
    Generation {
        kind: GenerationErrorKind,
        dialect: Dialect,
        detail: String,
    },
}

impl TranspileError {
    pub fn lex(kind: LexErrorKind, position: usize) -> Self {
        Self::Lex { kind, position }
    }

    /// Create an unexpected-token error located at the offending token.
    pub fn unexpected(expected: impl Into<String>, found: Token) -> Self {
        Self::Parse {
            kind: ParseErrorKind::UnexpectedToken,
            expected: expected.into(),
            position: found.position,
            found,
        }
    }

    pub fn unsupported_verb(found: Token) -> Self {
        Self::Parse {
            kind: ParseErrorKind::UnsupportedVerb,
            expected: "a dplyr verb (select, filter, mutate, arrange, group_by, summarise, rename, head, a *_join or a set operation)"
                .to_string(),
            position: found.position,
            found,
        }
    }

    pub fn generation(kind: GenerationErrorKind, dialect: Dialect, detail: impl Into<String>) -> Self {
        Self::Generation {
            kind,
            dialect,
            detail: detail.into(),
        }
    }

    /// Source offset of the error, if it came from the lexer or parser.
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::Lex { position, .. } | Self::Parse { position, .. } => Some(*position),
            Self::Generation { .. } => None,
        }
    }

    /// 1-based line and column of the error within `source`.
    pub fn line_col(&self, source: &str) -> Option<(usize, usize)> {
        self.position().map(|offset| line_col(source, offset))
    }
}

/// Convert a byte offset into a 1-based (line, column) pair.
///
/// Columns count characters, not bytes. Offsets past the end clamp to the
/// position just after the last character.
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;
    for (index, c) in source.char_indices() {
        if index >= offset {
            break;
        }
        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}

/// A dialect name that names none of the built-in targets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown SQL dialect '{0}' (expected postgresql, mysql, sqlite or duckdb)")]
pub struct UnknownDialect(pub String);

/// Result type alias for transpilation.
pub type TranspileResult<T> = Result<T, TranspileError>;
