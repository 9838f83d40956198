//! Expression parsing.
//!
//! Precedence, lowest to highest:
//! - `|` `||`
//! - `&` `&&`
//! - `!`
//! - comparisons (non-associative)
//! - `+` `-`
//! - `*` `/`
//! - unary `-`
//! - literals, identifiers, calls, parentheses

use crate::ast::{BinaryOp, Expr, Literal, LiteralKind, UnaryOp};
use crate::error::TranspileResult;
use crate::parser::Parser;
use crate::parser::tokens::TokenKind;

impl Parser {
    pub(crate) fn parse_expr(&mut self) -> TranspileResult<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> TranspileResult<Expr> {
        let mut left = self.parse_and()?;
        while self.at_logical(&["|", "||"]) {
            self.bump();
            let right = self.parse_and()?;
            left = Expr::binary(left, BinaryOp::Or, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> TranspileResult<Expr> {
        let mut left = self.parse_not()?;
        while self.at_logical(&["&", "&&"]) {
            self.bump();
            let right = self.parse_not()?;
            left = Expr::binary(left, BinaryOp::And, right);
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> TranspileResult<Expr> {
        if self.at(TokenKind::NotOperator) {
            self.bump();
            let operand = self.parse_not()?;
            return Ok(Expr::unary(UnaryOp::Not, operand));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> TranspileResult<Expr> {
        let left = self.parse_sum()?;
        let Some(op) = self.comparison_op() else {
            return Ok(left);
        };
        self.bump();
        let right = self.parse_sum()?;

        if self.comparison_op().is_some() {
            return self.unexpected("& or | between comparisons");
        }
        Ok(Expr::binary(left, op, right))
    }

    fn parse_sum(&mut self) -> TranspileResult<Expr> {
        let mut left = self.parse_product()?;
        loop {
            let op = match self.arithmetic_op() {
                Some(op @ (BinaryOp::Add | BinaryOp::Sub)) => op,
                _ => return Ok(left),
            };
            self.bump();
            let right = self.parse_product()?;
            left = Expr::binary(left, op, right);
        }
    }

    fn parse_product(&mut self) -> TranspileResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.arithmetic_op() {
                Some(op @ (BinaryOp::Mul | BinaryOp::Div)) => op,
                _ => return Ok(left),
            };
            self.bump();
            let right = self.parse_unary()?;
            left = Expr::binary(left, op, right);
        }
    }

    fn parse_unary(&mut self) -> TranspileResult<Expr> {
        if self.peek().is(TokenKind::ArithmeticOperator, "-") {
            self.bump();
            let operand = self.parse_unary()?;
            return Ok(Expr::unary(UnaryOp::Neg, operand));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> TranspileResult<Expr> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::NumberLiteral => {
                self.bump();
                Ok(Expr::Literal(Literal::new(token.text, LiteralKind::Number)))
            }
            TokenKind::StringLiteral => {
                self.bump();
                Ok(Expr::Literal(Literal::new(token.text, LiteralKind::String)))
            }
            TokenKind::Identifier if self.peek_nth(1).is_punct("(") => self.parse_call(),
            TokenKind::Identifier => {
                self.bump();
                let expr = match token.text.as_str() {
                    "TRUE" | "FALSE" => Expr::Literal(Literal::new(token.text, LiteralKind::Bool)),
                    "NA" | "NULL" => Expr::Literal(Literal::new(token.text, LiteralKind::Null)),
                    _ => Expr::Identifier(token.text),
                };
                Ok(expr)
            }
            TokenKind::Punctuation if token.text == "(" => {
                self.bump();
                let inner = self.parse_expr()?;
                self.expect_punct(")", ")")?;
                Ok(inner)
            }
            _ => self.unexpected("expression"),
        }
    }

    /// `Call := Identifier "(" (Arg ("," Arg)*)? ")"`
    fn parse_call(&mut self) -> TranspileResult<Expr> {
        let name = self.bump().text;
        self.expect_punct("(", "(")?;

        let mut args = Vec::new();
        if !self.eat_punct(")") {
            loop {
                if let Some(arg) = self.parse_call_argument()? {
                    args.push(arg);
                }
                if !self.eat_punct(",") {
                    break;
                }
            }
            self.expect_punct(")", ", or )")?;
        }
        Ok(Expr::Call { name, args })
    }

    /// A positional argument, or `na.rm = <expr>` which is dropped:
    /// SQL aggregates already skip NULLs.
    fn parse_call_argument(&mut self) -> TranspileResult<Option<Expr>> {
        if self.peek().is(TokenKind::Identifier, "na.rm")
            && self.peek_nth(1).kind == TokenKind::AssignOperator
        {
            self.bump();
            self.bump();
            self.parse_expr()?;
            return Ok(None);
        }
        self.parse_expr().map(Some)
    }

    fn at_logical(&self, ops: &[&str]) -> bool {
        let token = self.peek();
        token.kind == TokenKind::LogicalOperator && ops.contains(&token.text.as_str())
    }

    fn comparison_op(&self) -> Option<BinaryOp> {
        let token = self.peek();
        if token.kind != TokenKind::ComparisonOperator {
            return None;
        }
        BinaryOp::from_comparison(&token.text)
    }

    fn arithmetic_op(&self) -> Option<BinaryOp> {
        let token = self.peek();
        if token.kind != TokenKind::ArithmeticOperator {
            return None;
        }
        match token.text.as_str() {
            "+" => Some(BinaryOp::Add),
            "-" => Some(BinaryOp::Sub),
            "*" => Some(BinaryOp::Mul),
            "/" => Some(BinaryOp::Div),
            _ => None,
        }
    }
}
