use serde::{Deserialize, Serialize};

use crate::ast::Expr;

/// Root of a parsed program: a source table followed by verbs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
    pub source: TableRef,
    pub steps: Vec<VerbCall>,
}

impl Pipeline {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            source: TableRef::new(table, 0),
            steps: Vec::new(),
        }
    }

    /// Append a verb. Used when building pipelines programmatically.
    pub fn then(mut self, verb: VerbCall) -> Self {
        self.steps.push(verb);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRef {
    pub name: String,
    /// Byte offset of the name in the source text
    pub position: usize,
}

impl TableRef {
    pub fn new(name: impl Into<String>, position: usize) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }
}

/// One pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerbCall {
    Select { columns: Vec<ColumnSpec> },
    Filter { condition: Expr },
    Mutate { assignments: Vec<Assignment> },
    Arrange { keys: Vec<OrderKey> },
    GroupBy { columns: Vec<String> },
    Summarise { assignments: Vec<Assignment> },
    /// `rename(new = old, ...)`
    Rename { columns: Vec<ColumnAlias> },
    /// `head(n)`
    Head { n: u64 },
    /// `inner_join(other, by = ...)` and the other `*_join` verbs. An empty
    /// `by` matches on every column the two tables share.
    Join {
        kind: JoinKind,
        table: String,
        by: Vec<JoinColumn>,
    },
    /// `union(other)`, `union_all(other)`, `intersect(other)`, `setdiff(other)`
    SetOp { op: SetOperation, table: String },
}

impl VerbCall {
    /// The verb's dplyr name, for logs and error details.
    pub fn name(&self) -> &'static str {
        match self {
            VerbCall::Select { .. } => "select",
            VerbCall::Filter { .. } => "filter",
            VerbCall::Mutate { .. } => "mutate",
            VerbCall::Arrange { .. } => "arrange",
            VerbCall::GroupBy { .. } => "group_by",
            VerbCall::Summarise { .. } => "summarise",
            VerbCall::Rename { .. } => "rename",
            VerbCall::Head { .. } => "head",
            VerbCall::Join { kind, .. } => kind.verb(),
            VerbCall::SetOp { op, .. } => op.verb(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    /// Keep left rows that have a match, without adding columns
    Semi,
    /// Keep left rows that have no match
    Anti,
}

impl JoinKind {
    pub fn from_verb(name: &str) -> Option<Self> {
        match name {
            "inner_join" => Some(Self::Inner),
            "left_join" => Some(Self::Left),
            "right_join" => Some(Self::Right),
            "full_join" => Some(Self::Full),
            "semi_join" => Some(Self::Semi),
            "anti_join" => Some(Self::Anti),
            _ => None,
        }
    }

    pub fn verb(self) -> &'static str {
        match self {
            Self::Inner => "inner_join",
            Self::Left => "left_join",
            Self::Right => "right_join",
            Self::Full => "full_join",
            Self::Semi => "semi_join",
            Self::Anti => "anti_join",
        }
    }

    /// Semi and anti joins filter rows instead of combining tables.
    pub fn is_filtering(self) -> bool {
        matches!(self, Self::Semi | Self::Anti)
    }
}

/// One key pair of a join: `left` names the piped table's column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinColumn {
    pub left: String,
    pub right: String,
}

impl JoinColumn {
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }

    /// A key spelled the same on both sides.
    pub fn same(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            left: name.clone(),
            right: name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SetOperation {
    Union,
    UnionAll,
    Intersect,
    /// `setdiff`, rendered as `EXCEPT`
    SetDiff,
}

impl SetOperation {
    pub fn from_verb(name: &str) -> Option<Self> {
        match name {
            "union" => Some(Self::Union),
            "union_all" => Some(Self::UnionAll),
            "intersect" => Some(Self::Intersect),
            "setdiff" => Some(Self::SetDiff),
            _ => None,
        }
    }

    pub fn verb(self) -> &'static str {
        match self {
            Self::Union => "union",
            Self::UnionAll => "union_all",
            Self::Intersect => "intersect",
            Self::SetDiff => "setdiff",
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Union => "UNION",
            Self::UnionAll => "UNION ALL",
            Self::Intersect => "INTERSECT",
            Self::SetDiff => "EXCEPT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnAlias {
    pub alias: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnSpec {
    Column(String),
    /// `alias = source`
    Renamed(ColumnAlias),
}

impl ColumnSpec {
    pub fn column(name: impl Into<String>) -> Self {
        ColumnSpec::Column(name.into())
    }

    pub fn renamed(alias: impl Into<String>, source: impl Into<String>) -> Self {
        ColumnSpec::Renamed(ColumnAlias {
            alias: alias.into(),
            source: source.into(),
        })
    }

    /// Name of the column this spec produces.
    pub fn output_name(&self) -> &str {
        match self {
            ColumnSpec::Column(name) => name,
            ColumnSpec::Renamed(rename) => &rename.alias,
        }
    }

    /// Name of the column this spec reads.
    pub fn source_name(&self) -> &str {
        match self {
            ColumnSpec::Column(name) => name,
            ColumnSpec::Renamed(rename) => &rename.source,
        }
    }
}

impl From<&str> for ColumnSpec {
    fn from(name: &str) -> Self {
        ColumnSpec::column(name)
    }
}

/// `alias = expr` in `mutate` and `summarise`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub alias: String,
    pub expr: Expr,
}

impl Assignment {
    pub fn new(alias: impl Into<String>, expr: Expr) -> Self {
        Self {
            alias: alias.into(),
            expr,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderKey {
    pub expr: Expr,
    pub descending: bool,
}

impl OrderKey {
    pub fn asc(expr: Expr) -> Self {
        Self {
            expr,
            descending: false,
        }
    }

    pub fn desc(expr: Expr) -> Self {
        Self {
            expr,
            descending: true,
        }
    }
}
