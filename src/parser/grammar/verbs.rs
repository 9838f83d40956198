//! Verb calls: the stages between pipes.

use crate::ast::{
    Assignment, BinaryOp, ColumnAlias, ColumnSpec, Expr, JoinColumn, JoinKind, OrderKey,
    SetOperation, VerbCall,
};
use crate::error::{TranspileError, TranspileResult};
use crate::parser::Parser;
use crate::parser::tokens::TokenKind;

/// Rows returned by `head()` with no argument, as in R.
const DEFAULT_HEAD_ROWS: u64 = 6;

impl Parser {
    /// Parse one verb after a pipe. Verb names are ordinary identifiers to the
    /// lexer; only this position gives them meaning.
    pub(crate) fn parse_verb(&mut self) -> TranspileResult<VerbCall> {
        if !self.at(TokenKind::Identifier) {
            return self.unexpected("verb name");
        }
        let verb = self.peek().clone();

        if let Some(kind) = JoinKind::from_verb(&verb.text) {
            self.bump();
            return self.parse_join(kind);
        }
        if let Some(op) = SetOperation::from_verb(&verb.text) {
            self.bump();
            self.expect_punct("(", "(")?;
            let table = self.expect_identifier("table name")?;
            self.expect_punct(")", ")")?;
            return Ok(VerbCall::SetOp { op, table });
        }

        let call = match verb.text.as_str() {
            "select" => {
                self.bump();
                VerbCall::Select {
                    columns: self.parse_arguments(Self::parse_column_spec)?,
                }
            }
            "filter" => {
                self.bump();
                // dplyr combines comma separated conditions with AND
                let conditions = self.parse_arguments(Self::parse_expr)?;
                let condition = conditions
                    .into_iter()
                    .reduce(|left, right| Expr::binary(left, BinaryOp::And, right))
                    .ok_or_else(|| TranspileError::unexpected("condition", verb.clone()))?;
                VerbCall::Filter { condition }
            }
            "mutate" => {
                self.bump();
                VerbCall::Mutate {
                    assignments: self.parse_arguments(Self::parse_assignment)?,
                }
            }
            "arrange" => {
                self.bump();
                VerbCall::Arrange {
                    keys: self.parse_arguments(Self::parse_order_key)?,
                }
            }
            "group_by" => {
                self.bump();
                VerbCall::GroupBy {
                    columns: self.parse_arguments(|p| p.expect_identifier("column name"))?,
                }
            }
            "summarise" | "summarize" => {
                self.bump();
                VerbCall::Summarise {
                    assignments: self.parse_arguments(Self::parse_assignment)?,
                }
            }
            "rename" => {
                self.bump();
                VerbCall::Rename {
                    columns: self.parse_arguments(Self::parse_column_alias)?,
                }
            }
            "head" => {
                self.bump();
                VerbCall::Head {
                    n: self.parse_head_rows()?,
                }
            }
            _ => return Err(TranspileError::unsupported_verb(verb)),
        };

        Ok(call)
    }

    /// `"(" item ("," item)* ")"`
    fn parse_arguments<T>(
        &mut self,
        mut item: impl FnMut(&mut Self) -> TranspileResult<T>,
    ) -> TranspileResult<Vec<T>> {
        self.expect_punct("(", "(")?;
        let mut items = vec![item(self)?];
        while self.eat_punct(",") {
            items.push(item(self)?);
        }
        self.expect_punct(")", ", or )")?;
        Ok(items)
    }

    /// `ColumnSpec := Identifier | Identifier "=" Identifier`
    fn parse_column_spec(&mut self) -> TranspileResult<ColumnSpec> {
        let name = self.expect_identifier("column name")?;
        if self.at(TokenKind::AssignOperator) {
            self.bump();
            let source = self.expect_identifier("column name")?;
            return Ok(ColumnSpec::renamed(name, source));
        }
        Ok(ColumnSpec::Column(name))
    }

    /// `new = old`, the only form `rename` accepts.
    fn parse_column_alias(&mut self) -> TranspileResult<ColumnAlias> {
        let alias = self.expect_identifier("new column name")?;
        self.expect_kind(TokenKind::AssignOperator, "=")?;
        let source = self.expect_identifier("column name")?;
        Ok(ColumnAlias { alias, source })
    }

    /// `Assignment := Identifier "=" Expr`
    fn parse_assignment(&mut self) -> TranspileResult<Assignment> {
        let alias = self.expect_identifier("column name")?;
        self.expect_kind(TokenKind::AssignOperator, "=")?;
        let expr = self.parse_expr()?;
        Ok(Assignment { alias, expr })
    }

    /// Exactly `desc(<expr>)` sorts descending; anything else is an
    /// ascending key.
    fn parse_order_key(&mut self) -> TranspileResult<OrderKey> {
        let expr = self.parse_expr()?;
        match expr {
            Expr::Call { name, mut args } if name == "desc" && args.len() == 1 => {
                Ok(OrderKey::desc(args.remove(0)))
            }
            expr => Ok(OrderKey::asc(expr)),
        }
    }

    /// `join(other)`, `join(other, keys)` or `join(other, by = keys)`.
    fn parse_join(&mut self, kind: JoinKind) -> TranspileResult<VerbCall> {
        self.expect_punct("(", "(")?;
        let table = self.expect_identifier("table name")?;

        let mut by = Vec::new();
        if self.eat_punct(",") {
            if self.peek().is(TokenKind::Identifier, "by")
                && self.peek_nth(1).kind == TokenKind::AssignOperator
            {
                self.bump();
                self.bump();
            }
            by = self.parse_join_keys()?;
        }

        self.expect_punct(")", ")")?;
        Ok(VerbCall::Join { kind, table, by })
    }

    /// `"id"`, `id`, `c("a", "x" = "y")` or `join_by(a, x == y)`.
    fn parse_join_keys(&mut self) -> TranspileResult<Vec<JoinColumn>> {
        let calls_function = self.peek_nth(1).is_punct("(");
        if self.peek().is(TokenKind::Identifier, "c") && calls_function {
            self.bump();
            return self.parse_arguments(Self::parse_named_key);
        }
        if self.peek().is(TokenKind::Identifier, "join_by") && calls_function {
            self.bump();
            return self.parse_arguments(Self::parse_key_equality);
        }
        Ok(vec![JoinColumn::same(self.parse_key_name()?)])
    }

    /// `"x"` or `"x" = "y"`, quoted or bare.
    fn parse_named_key(&mut self) -> TranspileResult<JoinColumn> {
        let left = self.parse_key_name()?;
        if self.at(TokenKind::AssignOperator) {
            self.bump();
            let right = self.parse_key_name()?;
            return Ok(JoinColumn::new(left, right));
        }
        Ok(JoinColumn::same(left))
    }

    fn parse_key_equality(&mut self) -> TranspileResult<JoinColumn> {
        let left = self.expect_identifier("column name")?;
        if self.peek().is(TokenKind::ComparisonOperator, "==") {
            self.bump();
            let right = self.expect_identifier("column name")?;
            return Ok(JoinColumn::new(left, right));
        }
        Ok(JoinColumn::same(left))
    }

    fn parse_key_name(&mut self) -> TranspileResult<String> {
        let token = self.peek();
        let is_name = matches!(token.kind, TokenKind::StringLiteral | TokenKind::Identifier)
            && !token.text.is_empty();
        if !is_name {
            return self.unexpected("join column");
        }
        Ok(self.bump().text)
    }

    /// `head()`, `head(10)` or `head(n = 10)`.
    fn parse_head_rows(&mut self) -> TranspileResult<u64> {
        self.expect_punct("(", "(")?;
        if self.eat_punct(")") {
            return Ok(DEFAULT_HEAD_ROWS);
        }

        if self.peek().is(TokenKind::Identifier, "n")
            && self.peek_nth(1).kind == TokenKind::AssignOperator
        {
            self.bump();
            self.bump();
        }

        let rows = match self.peek() {
            token if token.kind == TokenKind::NumberLiteral => token.text.parse::<u64>().ok(),
            _ => None,
        };
        let Some(rows) = rows else {
            return self.unexpected("non-negative integer row count");
        };
        self.bump();

        self.expect_punct(")", ")")?;
        Ok(rows)
    }
}
