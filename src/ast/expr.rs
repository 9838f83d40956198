use std::fmt;

use serde::{Deserialize, Serialize};

/// Binary operators, ordered loosely from lowest to highest binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    /// `|` or `||`
    Or,
    /// `&` or `&&`
    And,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn from_comparison(op: &str) -> Option<Self> {
        match op {
            "==" => Some(Self::Eq),
            "!=" => Some(Self::Ne),
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Le),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Ge),
            _ => None,
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Gt | Self::Ge
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, Self::And | Self::Or)
    }
}

/// R spelling, used when printing an expression back as source.
impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            BinaryOp::Or => "|",
            BinaryOp::And => "&",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        };
        write!(f, "{}", op)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `!x`
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LiteralKind {
    String,
    Number,
    Bool,
    /// `NA` / `NULL`
    Null,
}

/// A literal keeps its source text; `kind` is inferred by the lexer/parser.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Literal {
    pub raw: String,
    pub kind: LiteralKind,
}

impl Literal {
    pub fn new(raw: impl Into<String>, kind: LiteralKind) -> Self {
        Self {
            raw: raw.into(),
            kind,
        }
    }
}

/// An expression inside a verb's argument list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expr {
    /// A column reference
    Identifier(String),
    Literal(Literal),
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    Unary { op: UnaryOp, operand: Box<Expr> },
    /// A function call such as `mean(x)` or `n()`
    Call { name: String, args: Vec<Expr> },
}

impl Expr {
    pub fn binary(left: Expr, op: BinaryOp, right: Expr) -> Self {
        Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    /// Column names referenced anywhere in this expression, in first-seen order.
    pub fn identifiers(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_identifiers(&mut out);
        out
    }

    fn collect_identifiers<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Identifier(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            Expr::Literal(_) => {}
            Expr::Binary { left, right, .. } => {
                left.collect_identifiers(out);
                right.collect_identifiers(out);
            }
            Expr::Unary { operand, .. } => operand.collect_identifiers(out),
            Expr::Call { args, .. } => {
                for arg in args {
                    arg.collect_identifiers(out);
                }
            }
        }
    }

    pub fn references(&self, name: &str) -> bool {
        self.identifiers().contains(&name)
    }

    /// True if any call in this expression (including nested ones) matches `pred`.
    pub fn contains_call(&self, pred: &dyn Fn(&str) -> bool) -> bool {
        match self {
            Expr::Identifier(_) | Expr::Literal(_) => false,
            Expr::Binary { left, right, .. } => {
                left.contains_call(pred) || right.contains_call(pred)
            }
            Expr::Unary { operand, .. } => operand.contains_call(pred),
            Expr::Call { name, args } => {
                pred(name) || args.iter().any(|arg| arg.contains_call(pred))
            }
        }
    }

    /// Replace identifiers for which `lookup` returns an expression.
    pub fn substitute(&self, lookup: &dyn Fn(&str) -> Option<Expr>) -> Expr {
        match self {
            Expr::Identifier(name) => lookup(name).unwrap_or_else(|| self.clone()),
            Expr::Literal(_) => self.clone(),
            Expr::Binary { left, op, right } => {
                Expr::binary(left.substitute(lookup), *op, right.substitute(lookup))
            }
            Expr::Unary { op, operand } => Expr::unary(*op, operand.substitute(lookup)),
            Expr::Call { name, args } => Expr::Call {
                name: name.clone(),
                args: args.iter().map(|arg| arg.substitute(lookup)).collect(),
            },
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Identifier(name) => write!(f, "{}", name),
            Expr::Literal(lit) => match lit.kind {
                LiteralKind::String => write!(f, "{:?}", lit.raw),
                _ => write!(f, "{}", lit.raw),
            },
            Expr::Binary { left, op, right } => write!(f, "({} {} {})", left, op, right),
            Expr::Unary { op: UnaryOp::Neg, operand } => write!(f, "-{}", operand),
            Expr::Unary { op: UnaryOp::Not, operand } => write!(f, "!{}", operand),
            Expr::Call { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl From<&str> for Expr {
    fn from(name: &str) -> Self {
        Expr::Identifier(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builders::*;

    #[test]
    fn test_identifiers_deduplicated_in_order() {
        let expr = Expr::binary(
            gt(col("b"), num("1")),
            BinaryOp::And,
            Expr::binary(col("a"), BinaryOp::Lt, col("b")),
        );
        assert_eq!(expr.identifiers(), vec!["b", "a"]);
    }

    #[test]
    fn test_contains_call_sees_nested_args() {
        let expr = call("round", vec![call("mean", vec![col("x")])]);
        assert!(expr.contains_call(&|name| name == "mean"));
        assert!(!expr.contains_call(&|name| name == "sum"));
    }

    #[test]
    fn test_substitute() {
        let expr = gt(col("avg"), num("3"));
        let replaced = expr.substitute(&|name| {
            (name == "avg").then(|| call("mean", vec![col("x")]))
        });
        assert_eq!(replaced.to_string(), "(mean(x) > 3)");
    }
}
