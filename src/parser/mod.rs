//! dplyr pipeline parser.
//!
//! Recursive descent over the token stream produced by [`tokens::tokenize`],
//! one token of lookahead, failing on the first mismatch.
//!
//! # Grammar
//!
//! ```text
//! mtcars %>% filter(mpg > 20) %>% group_by(cyl) %>% summarise(n = n())
//! ──┬───  ┬  ───────┬───────
//!   │     │         └── Verb call (recognized only right after a pipe)
//!   │     └── Pipe (%>% or |>)
//!   └── Table name
//! ```

pub mod grammar;
pub mod tokens;

#[cfg(test)]
mod tests;

use tracing::debug;

use crate::ast::Pipeline;
use crate::error::{TranspileError, TranspileResult};
use tokens::{Token, TokenKind};

pub use tokens::tokenize;

/// Parse a complete pipeline from source text.
pub fn parse(source: &str) -> TranspileResult<Pipeline> {
    let tokens = tokenize(source)?;
    parse_tokens(tokens)
}

/// Parse an already-tokenized pipeline.
///
/// `tokens` must end with the [`TokenKind::EndOfInput`] token that
/// [`tokenize`] emits; its position is the only record of where the source
/// ends.
pub fn parse_tokens(tokens: Vec<Token>) -> TranspileResult<Pipeline> {
    let token_count = tokens.len();
    let pipeline = Parser::new(tokens)?.parse_pipeline()?;
    debug!(
        tokens = token_count,
        verbs = pipeline.steps.len(),
        table = %pipeline.source.name,
        "parsed pipeline"
    );
    Ok(pipeline)
}

/// Token cursor shared by the grammar rules in [`grammar`].
pub struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> TranspileResult<Self> {
        match tokens.last() {
            Some(last) if last.kind == TokenKind::EndOfInput => Ok(Self { tokens, cursor: 0 }),
            Some(last) => Err(TranspileError::unexpected(
                "end of input token",
                last.clone(),
            )),
            None => Err(TranspileError::unexpected(
                "table name",
                Token::end_of_input(0),
            )),
        }
    }

    pub(crate) fn peek(&self) -> &Token {
        self.peek_nth(0)
    }

    /// Look `n` tokens past the cursor; clamps to the end-of-input token.
    pub(crate) fn peek_nth(&self, n: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.cursor + n).min(last)]
    }

    pub(crate) fn bump(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::EndOfInput {
            self.cursor += 1;
        }
        token
    }

    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    pub(crate) fn at_punct(&self, punct: &str) -> bool {
        self.peek().is_punct(punct)
    }

    pub(crate) fn eat_punct(&mut self, punct: &str) -> bool {
        if self.at_punct(punct) {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn expect_punct(&mut self, punct: &str, expected: &str) -> TranspileResult<Token> {
        if self.at_punct(punct) {
            Ok(self.bump())
        } else {
            self.unexpected(expected)
        }
    }

    pub(crate) fn expect_kind(&mut self, kind: TokenKind, expected: &str) -> TranspileResult<Token> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            self.unexpected(expected)
        }
    }

    pub(crate) fn expect_identifier(&mut self, expected: &str) -> TranspileResult<String> {
        self.expect_kind(TokenKind::Identifier, expected)
            .map(|token| token.text)
    }

    /// Fail at the current token.
    pub(crate) fn unexpected<T>(&self, expected: &str) -> TranspileResult<T> {
        Err(TranspileError::unexpected(expected, self.peek().clone()))
    }
}
