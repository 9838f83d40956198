pub mod expressions;
pub mod verbs;

use crate::ast::{Pipeline, TableRef};
use crate::error::TranspileResult;
use crate::parser::Parser;
use crate::parser::tokens::TokenKind;

impl Parser {
    /// `Pipeline := TableRef ("%>%" VerbCall)*`
    pub fn parse_pipeline(&mut self) -> TranspileResult<Pipeline> {
        let source = self.parse_table_ref()?;

        let mut steps = Vec::new();
        while self.at(TokenKind::PipeOperator) {
            self.bump();
            steps.push(self.parse_verb()?);
        }

        if !self.at(TokenKind::EndOfInput) {
            return self.unexpected("%>% or end of input");
        }
        Ok(Pipeline { source, steps })
    }

    /// The leading bare table name. A name followed by `(` is a verb call
    /// with no table in front of it and is rejected here.
    fn parse_table_ref(&mut self) -> TranspileResult<TableRef> {
        let token = self.peek();
        let is_bare_name = token.kind == TokenKind::Identifier
            && !token.text.is_empty()
            && token
                .text
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c == '.');
        if !is_bare_name || self.peek_nth(1).is_punct("(") {
            return self.unexpected("table name");
        }

        let token = self.bump();
        Ok(TableRef::new(token.text, token.position))
    }
}
