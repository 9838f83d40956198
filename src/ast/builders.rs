//! Shorthand constructors for AST nodes, mostly for building pipelines by
//! hand in tests and embedding code.

use crate::ast::{
    Assignment, BinaryOp, ColumnSpec, Expr, JoinColumn, Literal, LiteralKind, OrderKey, UnaryOp,
};

/// Column reference
pub fn col(name: &str) -> Expr {
    Expr::Identifier(name.to_string())
}

pub fn num(raw: &str) -> Expr {
    Expr::Literal(Literal::new(raw, LiteralKind::Number))
}

pub fn text(value: &str) -> Expr {
    Expr::Literal(Literal::new(value, LiteralKind::String))
}

pub fn boolean(value: bool) -> Expr {
    Expr::Literal(Literal::new(
        if value { "TRUE" } else { "FALSE" },
        LiteralKind::Bool,
    ))
}

pub fn null() -> Expr {
    Expr::Literal(Literal::new("NULL", LiteralKind::Null))
}

pub fn call(name: &str, args: Vec<Expr>) -> Expr {
    Expr::Call {
        name: name.to_string(),
        args,
    }
}

pub fn eq(left: Expr, right: Expr) -> Expr {
    Expr::binary(left, BinaryOp::Eq, right)
}

pub fn gt(left: Expr, right: Expr) -> Expr {
    Expr::binary(left, BinaryOp::Gt, right)
}

pub fn lt(left: Expr, right: Expr) -> Expr {
    Expr::binary(left, BinaryOp::Lt, right)
}

pub fn and(left: Expr, right: Expr) -> Expr {
    Expr::binary(left, BinaryOp::And, right)
}

pub fn or(left: Expr, right: Expr) -> Expr {
    Expr::binary(left, BinaryOp::Or, right)
}

pub fn not(operand: Expr) -> Expr {
    Expr::unary(UnaryOp::Not, operand)
}

/// `alias = expr` inside `mutate` or `summarise`
pub fn assign(alias: &str, expr: Expr) -> Assignment {
    Assignment::new(alias, expr)
}

/// `new = old` inside `select` or `rename`
pub fn renamed(alias: &str, source: &str) -> ColumnSpec {
    ColumnSpec::renamed(alias, source)
}

pub fn asc(expr: Expr) -> OrderKey {
    OrderKey::asc(expr)
}

pub fn desc(expr: Expr) -> OrderKey {
    OrderKey::desc(expr)
}

/// `by = c("left" = "right")` key pair
pub fn key(left: &str, right: &str) -> JoinColumn {
    JoinColumn::new(left, right)
}
