//! Clause accumulation for a single `SELECT`.
//!
//! A [`QueryBuilder`] holds every clause of one query level as verbs are
//! applied. The generator seals it into a stage when a verb cannot be
//! expressed at the same level, and renders all stages at the end.

use std::collections::HashMap;

use crate::ast::{Assignment, Expr};
use crate::transpiler::expr::{OrderItem, Rendered, prec};
use crate::transpiler::functions;
use crate::transpiler::traits::SqlGenerator;

/// What a query level selects from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceExpr {
    /// The pipeline's base table
    Table(String),
    /// A sealed earlier stage, by index
    Stage(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectItem {
    /// `*`, minus columns moved elsewhere by a rename
    Star { except: Vec<String> },
    Column(String),
    /// `sql AS alias`
    Computed { sql: String, alias: String },
}

impl SelectItem {
    pub fn output_name(&self) -> Option<&str> {
        match self {
            SelectItem::Star { .. } => None,
            SelectItem::Column(name) => Some(name),
            SelectItem::Computed { alias, .. } => Some(alias),
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueryBuilder {
    pub source: SourceExpr,
    /// Output columns of the source when they are known (a stage with an
    /// explicit projection); `None` for base tables.
    pub source_columns: Option<Vec<String>>,
    /// Rendered `JOIN` clauses, in pipeline order.
    pub joins: Vec<String>,
    /// Empty means `*`.
    pub select_list: Vec<SelectItem>,
    pub where_conjuncts: Vec<Rendered>,
    /// dplyr grouping. Rendered as `GROUP BY` only once aggregations exist.
    pub group_keys: Vec<String>,
    pub aggregations: Vec<Assignment>,
    pub having_conjuncts: Vec<Rendered>,
    pub order_keys: Vec<OrderItem>,
    pub limit: Option<u64>,
    /// Columns introduced at this level by `mutate`, `rename` or a renaming
    /// `select`. SQL cannot reference these aliases from the same level.
    pub pending_computed: HashMap<String, Expr>,
    /// `UNION SELECT ... FROM other` and friends. A level that has one
    /// takes no further clauses.
    pub set_operation: Option<String>,
}

impl QueryBuilder {
    pub fn new(source: SourceExpr) -> Self {
        Self {
            source,
            source_columns: None,
            joins: Vec::new(),
            select_list: Vec::new(),
            where_conjuncts: Vec::new(),
            group_keys: Vec::new(),
            aggregations: Vec::new(),
            having_conjuncts: Vec::new(),
            order_keys: Vec::new(),
            limit: None,
            pending_computed: HashMap::new(),
            set_operation: None,
        }
    }

    /// True if nothing but joins has been applied, so another table can
    /// still be joined onto the `FROM` list.
    pub fn is_bare_source(&self) -> bool {
        self.select_list.is_empty()
            && self.where_conjuncts.is_empty()
            && self.aggregations.is_empty()
            && self.order_keys.is_empty()
            && self.limit.is_none()
            && self.set_operation.is_none()
    }

    pub fn has_star(&self) -> bool {
        self.select_list.is_empty()
            || self
                .select_list
                .iter()
                .any(|item| matches!(item, SelectItem::Star { .. }))
    }

    pub fn has_computed(&self) -> bool {
        self.select_list
            .iter()
            .any(|item| matches!(item, SelectItem::Computed { .. }))
    }

    /// Names this level outputs, or `None` if a `*` hides them.
    pub fn output_columns(&self) -> Option<Vec<String>> {
        let star = [SelectItem::Star { except: Vec::new() }];
        let items = if self.select_list.is_empty() {
            &star[..]
        } else {
            &self.select_list[..]
        };

        let mut columns: Vec<String> = Vec::new();
        for item in items {
            match item {
                SelectItem::Star { except } => {
                    let known = self.source_columns.as_ref()?;
                    columns.extend(known.iter().filter(|c| !except.contains(c)).cloned());
                }
                SelectItem::Column(name) | SelectItem::Computed { alias: name, .. } => {
                    if !columns.contains(name) {
                        columns.push(name.clone());
                    }
                }
            }
        }
        Some(columns)
    }

    pub fn item_mut(&mut self, name: &str) -> Option<&mut SelectItem> {
        self.select_list
            .iter_mut()
            .find(|item| item.output_name() == Some(name))
    }

    /// SQL of the computed item named `name`, if there is one.
    pub fn computed_sql(&self, name: &str) -> Option<&str> {
        self.select_list.iter().find_map(|item| match item {
            SelectItem::Computed { sql, alias } if alias == name => Some(sql.as_str()),
            _ => None,
        })
    }

    pub fn references_pending(&self, expr: &Expr) -> bool {
        expr.identifiers()
            .iter()
            .any(|name| self.pending_computed.contains_key(*name))
    }

    /// True if a pending column is a window or aggregate, whose value a
    /// same-level `WHERE` would change.
    pub fn has_multi_row_pending(&self) -> bool {
        self.pending_computed
            .values()
            .any(|expr| expr.contains_call(&functions::is_multi_row))
    }

    pub fn is_aggregation_alias(&self, name: &str) -> bool {
        self.aggregations.iter().any(|a| a.alias == name)
    }

    /// Replace aggregation aliases by the aggregate expressions they name.
    pub fn expand_aggregations(&self, expr: &Expr) -> Expr {
        expr.substitute(&|name| {
            self.aggregations
                .iter()
                .find(|a| a.alias == name)
                .map(|a| a.expr.clone())
        })
    }

    /// Render this level given its already-rendered `FROM` source.
    pub fn to_sql(&self, generator: &dyn SqlGenerator, from: &str) -> String {
        let mut sql = String::from("SELECT ");

        if self.select_list.is_empty() {
            sql.push('*');
        } else {
            let items: Vec<String> = self
                .select_list
                .iter()
                .map(|item| match item {
                    SelectItem::Star { except } if except.is_empty() => "*".to_string(),
                    SelectItem::Star { except } => {
                        let except: Vec<&str> = except.iter().map(String::as_str).collect();
                        generator
                            .star_exclude(&except)
                            .unwrap_or_else(|| "*".to_string())
                    }
                    SelectItem::Column(name) => generator.quote_identifier(name),
                    SelectItem::Computed { sql, alias } => {
                        format!("{} AS {}", sql, generator.quote_identifier(alias))
                    }
                })
                .collect();
            sql.push_str(&items.join(", "));
        }

        sql.push_str(" FROM ");
        sql.push_str(from);
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }

        if !self.where_conjuncts.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conjunction(&self.where_conjuncts));
        }

        if !self.aggregations.is_empty() && !self.group_keys.is_empty() {
            let keys: Vec<String> = self
                .group_keys
                .iter()
                .map(|key| generator.quote_identifier(key))
                .collect();
            sql.push_str(" GROUP BY ");
            sql.push_str(&keys.join(", "));
        }

        if !self.having_conjuncts.is_empty() {
            sql.push_str(" HAVING ");
            sql.push_str(&conjunction(&self.having_conjuncts));
        }

        if let Some(set_operation) = &self.set_operation {
            sql.push(' ');
            sql.push_str(set_operation);
        }

        if !self.order_keys.is_empty() {
            let keys: Vec<String> = self.order_keys.iter().map(OrderItem::to_sql).collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&keys.join(", "));
        }

        if let Some(n) = self.limit {
            sql.push(' ');
            sql.push_str(&generator.limit_clause(n));
        }

        sql
    }
}

/// Join conditions with `AND`, wrapping any `OR` so it stays grouped.
fn conjunction(conjuncts: &[Rendered]) -> String {
    if let [single] = conjuncts {
        return single.sql.clone();
    }
    conjuncts
        .iter()
        .map(|c| c.clone().at_least(prec::AND))
        .collect::<Vec<_>>()
        .join(" AND ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transpiler::Dialect;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_builder_selects_star() {
        let query = QueryBuilder::new(SourceExpr::Table("mtcars".to_string()));
        let generator = Dialect::Postgres.generator();
        assert_eq!(query.to_sql(generator, "mtcars"), "SELECT * FROM mtcars");
    }

    #[test]
    fn test_or_conjunct_is_wrapped() {
        let mut query = QueryBuilder::new(SourceExpr::Table("t".to_string()));
        query
            .where_conjuncts
            .push(Rendered::new("a = 1 OR b = 2".to_string(), prec::OR));
        query
            .where_conjuncts
            .push(Rendered::new("c > 3".to_string(), prec::COMPARE));
        let generator = Dialect::Postgres.generator();
        assert_eq!(
            query.to_sql(generator, "t"),
            "SELECT * FROM t WHERE (a = 1 OR b = 2) AND c > 3"
        );
    }

    #[test]
    fn test_joins_follow_from() {
        let mut query = QueryBuilder::new(SourceExpr::Table("a".to_string()));
        assert!(query.is_bare_source());
        query.joins.push("INNER JOIN b USING (id)".to_string());
        query
            .where_conjuncts
            .push(Rendered::new("x > 1".to_string(), prec::COMPARE));
        assert!(!query.is_bare_source());
        let generator = Dialect::Postgres.generator();
        assert_eq!(
            query.to_sql(generator, "a"),
            "SELECT * FROM a INNER JOIN b USING (id) WHERE x > 1"
        );
    }

    #[test]
    fn test_output_columns() {
        let mut query = QueryBuilder::new(SourceExpr::Stage(0));
        assert_eq!(query.output_columns(), None);

        query.source_columns = Some(vec!["a".to_string(), "b".to_string()]);
        query.select_list = vec![
            SelectItem::Star {
                except: vec!["b".to_string()],
            },
            SelectItem::Computed {
                sql: "b".to_string(),
                alias: "c".to_string(),
            },
        ];
        assert_eq!(
            query.output_columns(),
            Some(vec!["a".to_string(), "c".to_string()])
        );
    }
}
