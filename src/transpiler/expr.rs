//! Expression rendering.
//!
//! Parentheses are not carried in the AST; they are re-inserted from the
//! precedence table below wherever an operand binds weaker than its context.

use crate::ast::{BinaryOp, Expr, Literal, LiteralKind, UnaryOp};
use crate::error::{GenerationErrorKind, TranspileError, TranspileResult};
use crate::transpiler::Dialect;
use crate::transpiler::functions;
use crate::transpiler::traits::SqlGenerator;

/// Binding strength of rendered SQL, loosest first.
pub mod prec {
    pub const OR: u8 = 1;
    pub const AND: u8 = 2;
    pub const NOT: u8 = 3;
    pub const COMPARE: u8 = 4;
    pub const ADD: u8 = 5;
    pub const MUL: u8 = 6;
    pub const NEG: u8 = 7;
    pub const ATOM: u8 = 8;
}

pub fn binary_prec(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Or => prec::OR,
        BinaryOp::And => prec::AND,
        BinaryOp::Eq
        | BinaryOp::Ne
        | BinaryOp::Lt
        | BinaryOp::Le
        | BinaryOp::Gt
        | BinaryOp::Ge => prec::COMPARE,
        BinaryOp::Add | BinaryOp::Sub => prec::ADD,
        BinaryOp::Mul | BinaryOp::Div => prec::MUL,
    }
}

fn integer(expr: &Expr) -> Option<i64> {
    match expr {
        Expr::Literal(Literal {
            raw,
            kind: LiteralKind::Number,
        }) => raw.parse().ok(),
        _ => None,
    }
}

fn sql_operator(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Or => "OR",
        BinaryOp::And => "AND",
        BinaryOp::Eq => "=",
        BinaryOp::Ne => "!=",
        BinaryOp::Lt => "<",
        BinaryOp::Le => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::Ge => ">=",
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
    }
}

/// Where an expression ends up, which decides how multi-row functions render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// `WHERE` and `ORDER BY`: one row at a time, no aggregates or windows.
    Row,
    /// `mutate` projections: aggregates and window functions become `OVER (...)`.
    Projection,
    /// `summarise` and `HAVING`: aggregates collapse the group.
    Aggregate,
}

/// Rendered SQL plus the binding strength of its outermost operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub sql: String,
    pub prec: u8,
}

impl Rendered {
    pub fn new(sql: String, prec: u8) -> Self {
        Self { sql, prec }
    }

    pub fn atom(sql: String) -> Self {
        Self::new(sql, prec::ATOM)
    }

    /// The SQL text, parenthesized if it binds weaker than `min`.
    pub fn at_least(self, min: u8) -> String {
        if self.prec < min {
            format!("({})", self.sql)
        } else {
            self.sql
        }
    }
}

/// A rendered `ORDER BY` key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub sql: String,
    pub descending: bool,
}

impl OrderItem {
    pub fn to_sql(&self) -> String {
        let direction = if self.descending { "DESC" } else { "ASC" };
        format!("{} {}", self.sql, direction)
    }
}

#[derive(Clone, Copy)]
pub struct ExprRenderer<'a> {
    dialect: Dialect,
    sql: &'static dyn SqlGenerator,
    scope: Scope,
    partition: &'a [String],
    order: &'a [OrderItem],
}

impl<'a> ExprRenderer<'a> {
    pub fn new(dialect: Dialect, scope: Scope) -> Self {
        Self {
            dialect,
            sql: dialect.generator(),
            scope,
            partition: &[],
            order: &[],
        }
    }

    /// Window context for `mutate`: group keys partition, `arrange` keys order.
    pub fn with_window(mut self, partition: &'a [String], order: &'a [OrderItem]) -> Self {
        self.partition = partition;
        self.order = order;
        self
    }

    fn in_scope(self, scope: Scope) -> Self {
        Self { scope, ..self }
    }

    pub fn render_sql(&self, expr: &Expr) -> TranspileResult<String> {
        self.render(expr).map(|rendered| rendered.sql)
    }

    pub fn render(&self, expr: &Expr) -> TranspileResult<Rendered> {
        match expr {
            Expr::Identifier(name) => Ok(Rendered::atom(self.sql.quote_identifier(name))),
            Expr::Literal(lit) => Ok(Rendered::atom(self.literal(lit))),
            Expr::Binary { left, op, right } => self.binary(left, *op, right),
            Expr::Unary {
                op: UnaryOp::Not,
                operand,
            } => {
                if let Expr::Call { name, args } = operand.as_ref()
                    && name == "is.na"
                {
                    return self.is_null(name, args, true);
                }
                let inner = self.render(operand)?.at_least(prec::NOT);
                Ok(Rendered::new(format!("NOT {}", inner), prec::NOT))
            }
            Expr::Unary {
                op: UnaryOp::Neg,
                operand,
            } => {
                let inner = self.render(operand)?;
                // `--` would start a SQL comment
                let inner = if inner.sql.starts_with('-') {
                    format!("({})", inner.sql)
                } else {
                    inner.at_least(prec::NEG)
                };
                Ok(Rendered::new(format!("-{}", inner), prec::NEG))
            }
            Expr::Call { name, args } => self.call(name, args),
        }
    }

    fn literal(&self, lit: &Literal) -> String {
        match lit.kind {
            LiteralKind::String => self.sql.quote_string(&lit.raw),
            LiteralKind::Number => lit.raw.clone(),
            LiteralKind::Bool if lit.raw == "TRUE" => "TRUE".to_string(),
            LiteralKind::Bool => "FALSE".to_string(),
            LiteralKind::Null => "NULL".to_string(),
        }
    }

    fn binary(&self, left: &Expr, op: BinaryOp, right: &Expr) -> TranspileResult<Rendered> {
        let p = binary_prec(op);
        // comparisons do not associate; arithmetic associates to the left only
        let left_min = if op.is_comparison() { p + 1 } else { p };
        let right_min = if op.is_logical() { p } else { p + 1 };

        let left = self.render(left)?.at_least(left_min);
        let right = self.render(right)?.at_least(right_min);
        Ok(Rendered::new(
            format!("{} {} {}", left, sql_operator(op), right),
            p,
        ))
    }

    fn call(&self, name: &str, args: &[Expr]) -> TranspileResult<Rendered> {
        if functions::is_aggregate(name) {
            return self.aggregate(name, args);
        }
        if functions::is_window(name) {
            return self.window(name, args);
        }

        match name {
            "is.na" => return self.is_null(name, args, false),
            "ifelse" | "if_else" => return self.if_else(name, args),
            "paste" => return self.paste(args, Some(" ")),
            "paste0" => return self.paste(args, None),
            "substr" => return self.substr(name, args),
            _ => {}
        }

        if let Some(sql_name) = functions::scalar_function(name) {
            return Ok(Rendered::atom(format!("{}({})", sql_name, self.arguments(args)?)));
        }

        if self.scope == Scope::Aggregate {
            return Err(self.error(
                GenerationErrorKind::UnsupportedAggregate,
                format!("{}() is not an aggregate function", name),
            ));
        }
        Ok(Rendered::atom(format!("{}({})", name, self.arguments(args)?)))
    }

    fn aggregate(&self, name: &str, args: &[Expr]) -> TranspileResult<Rendered> {
        if self.scope == Scope::Row {
            return Err(self.error(
                GenerationErrorKind::UnsupportedOperation,
                format!("aggregate {}() cannot be used in a row-level condition", name),
            ));
        }
        let Some(sql_name) = self.sql.aggregate_function(name) else {
            return Err(self.error(
                GenerationErrorKind::UnsupportedAggregate,
                name.to_string(),
            ));
        };

        let inner = self.in_scope(Scope::Row);
        let call = match (name, args) {
            ("n", []) => format!("{}(*)", sql_name),
            ("n", _) => return Err(self.arity(name, "no arguments")),
            ("n_distinct", [_]) if self.scope == Scope::Projection => {
                return Err(self.error(
                    GenerationErrorKind::UnsupportedOperation,
                    "n_distinct() has no windowed form; summarise it and join back instead".to_string(),
                ));
            }
            ("n_distinct", [arg]) => format!("{}(DISTINCT {})", sql_name, inner.render_sql(arg)?),
            ("n_distinct", _) => return Err(self.arity(name, "exactly one argument")),
            (_, []) => return Err(self.arity(name, "at least one argument")),
            _ => format!("{}({})", sql_name, inner.arguments(args)?),
        };

        match self.scope {
            Scope::Projection => Ok(Rendered::atom(format!("{} {}", call, self.over(None)))),
            _ => Ok(Rendered::atom(call)),
        }
    }

    fn window(&self, name: &str, args: &[Expr]) -> TranspileResult<Rendered> {
        if self.scope != Scope::Projection {
            return Err(self.error(
                GenerationErrorKind::UnsupportedOperation,
                format!("window function {}() is only supported inside mutate", name),
            ));
        }
        let inner = self.in_scope(Scope::Row);

        if let Some(sql_name) = functions::ranking_function(name) {
            let order = match args {
                [] => self.arrange_order(),
                [Expr::Call { name: direction, args: keys }] if direction == "desc" && keys.len() == 1 => {
                    Some(format!("{} DESC", inner.render_sql(&keys[0])?))
                }
                [key] => Some(format!("{} ASC", inner.render_sql(key)?)),
                _ => return Err(self.arity(name, "at most one argument")),
            };
            return Ok(Rendered::atom(format!("{}() {}", sql_name, self.over(order))));
        }

        let Some(sql_name) = functions::offset_function(name) else {
            return Err(self.error(
                GenerationErrorKind::UnsupportedOperation,
                format!("{}() has no SQL window equivalent", name),
            ));
        };
        if args.is_empty() || args.len() > 3 {
            return Err(self.arity(name, "one to three arguments"));
        }
        Ok(Rendered::atom(format!(
            "{}({}) {}",
            sql_name,
            inner.arguments(args)?,
            self.over(self.arrange_order())
        )))
    }

    fn is_null(&self, name: &str, args: &[Expr], negated: bool) -> TranspileResult<Rendered> {
        let [arg] = args else {
            return Err(self.arity(name, "exactly one argument"));
        };
        let operand = self.render(arg)?.at_least(prec::ADD);
        let test = if negated { "IS NOT NULL" } else { "IS NULL" };
        Ok(Rendered::new(format!("{} {}", operand, test), prec::COMPARE))
    }

    fn if_else(&self, name: &str, args: &[Expr]) -> TranspileResult<Rendered> {
        let [condition, yes, no] = args else {
            return Err(self.arity(name, "exactly three arguments"));
        };
        Ok(Rendered::atom(format!(
            "CASE WHEN {} THEN {} ELSE {} END",
            self.render_sql(condition)?,
            self.render_sql(yes)?,
            self.render_sql(no)?
        )))
    }

    /// R's `substr(x, start, stop)` ends at a position; SQL's `SUBSTR` takes a
    /// length. Integer bounds fold to a constant.
    fn substr(&self, name: &str, args: &[Expr]) -> TranspileResult<Rendered> {
        let [string, start, stop] = args else {
            return Err(self.arity(name, "exactly three arguments"));
        };
        let length = match (integer(start), integer(stop)) {
            (Some(start), Some(stop)) => (stop - start + 1).max(0).to_string(),
            _ => {
                let one = Expr::Literal(Literal::new("1", LiteralKind::Number));
                let span = Expr::binary(stop.clone(), BinaryOp::Sub, start.clone());
                self.render_sql(&Expr::binary(span, BinaryOp::Add, one))?
            }
        };
        Ok(Rendered::atom(format!(
            "SUBSTR({}, {}, {})",
            self.render_sql(string)?,
            self.render_sql(start)?,
            length
        )))
    }

    /// `paste0(a, b)` concatenates directly; `paste(a, b)` puts `sep` between parts.
    fn paste(&self, args: &[Expr], sep: Option<&str>) -> TranspileResult<Rendered> {
        let separator = sep.map(|s| self.sql.quote_string(s));
        let mut parts = Vec::new();
        for (i, arg) in args.iter().enumerate() {
            if i > 0
                && let Some(separator) = &separator
            {
                parts.push(separator.clone());
            }
            parts.push(self.render(arg)?.at_least(prec::ATOM));
        }

        match parts.len() {
            0 => Ok(Rendered::atom(self.sql.quote_string(""))),
            1 => Ok(Rendered::atom(parts.remove(0))),
            _ => {
                let parts: Vec<&str> = parts.iter().map(String::as_str).collect();
                Ok(Rendered::new(self.sql.string_concat(&parts), prec::COMPARE))
            }
        }
    }

    fn arguments(&self, args: &[Expr]) -> TranspileResult<String> {
        let rendered = args
            .iter()
            .map(|arg| self.render_sql(arg))
            .collect::<TranspileResult<Vec<_>>>()?;
        Ok(rendered.join(", "))
    }

    fn arrange_order(&self) -> Option<String> {
        if self.order.is_empty() {
            return None;
        }
        let keys: Vec<String> = self.order.iter().map(OrderItem::to_sql).collect();
        Some(keys.join(", "))
    }

    fn over(&self, order: Option<String>) -> String {
        let mut clauses = Vec::new();
        if !self.partition.is_empty() {
            let keys: Vec<String> = self
                .partition
                .iter()
                .map(|key| self.sql.quote_identifier(key))
                .collect();
            clauses.push(format!("PARTITION BY {}", keys.join(", ")));
        }
        if let Some(order) = order {
            clauses.push(format!("ORDER BY {}", order));
        }
        format!("OVER ({})", clauses.join(" "))
    }

    fn arity(&self, name: &str, expected: &str) -> TranspileError {
        self.error(
            GenerationErrorKind::UnsupportedOperation,
            format!("{}() takes {}", name, expected),
        )
    }

    fn error(&self, kind: GenerationErrorKind, detail: String) -> TranspileError {
        TranspileError::generation(kind, self.dialect, detail)
    }
}
