//! Abstract syntax tree for dplyr pipelines.
//!
//! The parser builds a [`Pipeline`] bottom-up; the generator only reads it.

pub mod builders;
pub mod expr;
pub mod pipeline;

pub use self::expr::{BinaryOp, Expr, Literal, LiteralKind, UnaryOp};
pub use self::pipeline::{
    Assignment, ColumnAlias, ColumnSpec, JoinColumn, JoinKind, OrderKey, Pipeline, SetOperation,
    TableRef, VerbCall,
};
