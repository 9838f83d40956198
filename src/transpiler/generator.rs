//! Verb-by-verb SQL generation.
//!
//! Verbs are applied left to right to the current [`QueryBuilder`]. When a
//! verb cannot be expressed at the current level (it reads an alias defined
//! there, or must see the result of an aggregate, limit or window), the level
//! is flushed: sealed as a stage and replaced by a fresh level that selects
//! from it. Stages render as a derived table when there is one, and as a flat
//! `WITH` list when there are more and the dialect supports CTEs.

use std::collections::HashMap;

use tracing::debug;

use crate::ast::{
    Assignment, ColumnAlias, ColumnSpec, Expr, JoinColumn, JoinKind, OrderKey, SetOperation,
    VerbCall,
};
use crate::config::TranspileOptions;
use crate::error::{GenerationErrorKind, TranspileError, TranspileResult};
use crate::transpiler::Dialect;
use crate::transpiler::builder::{QueryBuilder, SelectItem, SourceExpr};
use crate::transpiler::expr::{ExprRenderer, OrderItem, Rendered, Scope, prec};
use crate::transpiler::functions;
use crate::transpiler::traits::SqlGenerator;

fn stage_name(index: usize) -> String {
    format!("q{:02}", index + 1)
}

pub struct Generator<'a> {
    dialect: Dialect,
    sql: &'static dyn SqlGenerator,
    options: &'a TranspileOptions,
    stages: Vec<QueryBuilder>,
    query: QueryBuilder,
}

impl<'a> Generator<'a> {
    pub fn new(table: &str, dialect: Dialect, options: &'a TranspileOptions) -> Self {
        Self {
            dialect,
            sql: dialect.generator(),
            options,
            stages: Vec::new(),
            query: QueryBuilder::new(SourceExpr::Table(table.to_string())),
        }
    }

    pub fn apply(&mut self, verb: &VerbCall) -> TranspileResult<()> {
        if self.query.set_operation.is_some() {
            self.flush(verb.name());
        }

        match verb {
            VerbCall::Select { columns } => self.select(columns),
            VerbCall::Filter { condition } => self.filter(condition),
            VerbCall::Mutate { assignments } => self.mutate(assignments),
            VerbCall::Arrange { keys } => self.arrange(keys),
            VerbCall::GroupBy { columns } => self.group_by(columns),
            VerbCall::Summarise { assignments } => self.summarise(assignments),
            VerbCall::Rename { columns } => self.rename(columns),
            VerbCall::Head { n } => {
                self.head(*n);
                Ok(())
            }
            VerbCall::Join { kind, table, by } => self.join(*kind, table, by),
            VerbCall::SetOp { op, table } => {
                self.set_operation(*op, table);
                Ok(())
            }
        }
    }

    /// Number of stages sealed so far.
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Render the final SQL.
    pub fn finish(self) -> String {
        let use_ctes = self.stages.len() >= 2 && self.sql.supports_cte();
        let body = self.render_level(&self.query, use_ctes);
        if !use_ctes {
            return body;
        }

        let definitions: Vec<String> = self
            .stages
            .iter()
            .enumerate()
            .map(|(i, stage)| format!("{} AS ({})", stage_name(i), self.render_level(stage, true)))
            .collect();
        format!("WITH {} {}", definitions.join(", "), body)
    }

    fn render_level(&self, query: &QueryBuilder, use_ctes: bool) -> String {
        let from = match &query.source {
            SourceExpr::Table(name) => self.sql.quote_qualified(name),
            SourceExpr::Stage(i) if use_ctes => stage_name(*i),
            SourceExpr::Stage(i) => format!(
                "({}) AS {}",
                self.render_level(&self.stages[*i], false),
                stage_name(*i)
            ),
        };
        query.to_sql(self.sql, &from)
    }

    /// Seal the current level and continue against it.
    ///
    /// dplyr grouping survives; a finalized `summarise` drops its last
    /// grouping column, as dplyr does.
    fn flush(&mut self, trigger: &str) {
        let index = self.stages.len();
        let mut next = QueryBuilder::new(SourceExpr::Stage(index));
        next.source_columns = self.query.output_columns();
        next.group_keys = self.query.group_keys.clone();
        if self.query.set_operation.is_some() {
            next.group_keys.clear();
        } else if !self.query.aggregations.is_empty() {
            next.group_keys.pop();
        }

        let sealed = std::mem::replace(&mut self.query, next);
        self.stages.push(sealed);
        debug!(stage = %stage_name(index), trigger, dialect = %self.dialect, "flushed query level");
    }

    fn renderer(&self, scope: Scope) -> ExprRenderer<'_> {
        ExprRenderer::new(self.dialect, scope)
            .with_window(&self.query.group_keys, &self.query.order_keys)
    }

    fn error(&self, kind: GenerationErrorKind, detail: String) -> TranspileError {
        TranspileError::generation(kind, self.dialect, detail)
    }

    /// Strict mode: every name must be an output column of the current level
    /// whenever that level's columns are known.
    fn check_columns<'n>(
        &self,
        verb: &str,
        names: impl IntoIterator<Item = &'n str>,
    ) -> TranspileResult<()> {
        if !self.options.strict_mode {
            return Ok(());
        }
        let Some(available) = self.query.output_columns() else {
            return Ok(());
        };
        for name in names {
            if !available.iter().any(|column| column == name) {
                return Err(self.error(
                    GenerationErrorKind::UnknownColumn,
                    format!(
                        "{}: column `{}` is not one of ({})",
                        verb,
                        name,
                        available.join(", ")
                    ),
                ));
            }
        }
        Ok(())
    }

    fn select(&mut self, columns: &[ColumnSpec]) -> TranspileResult<()> {
        self.check_columns("select", columns.iter().map(ColumnSpec::source_name))?;
        if !self.query.aggregations.is_empty() {
            self.flush("select");
        }

        let mut select_list = Vec::with_capacity(columns.len());
        let mut pending = HashMap::new();
        for spec in columns {
            let source = spec.source_name();
            let alias = spec.output_name();
            let computed = self.query.computed_sql(source).map(str::to_string);

            match (spec, computed) {
                (ColumnSpec::Column(name), None) => select_list.push(SelectItem::Column(name.clone())),
                (_, computed) => {
                    let sql = computed.unwrap_or_else(|| self.sql.quote_identifier(source));
                    let expr = self
                        .query
                        .pending_computed
                        .get(source)
                        .cloned()
                        .unwrap_or_else(|| Expr::Identifier(source.to_string()));
                    select_list.push(SelectItem::Computed {
                        sql,
                        alias: alias.to_string(),
                    });
                    pending.insert(alias.to_string(), expr);
                }
            }
        }

        self.query.select_list = select_list;
        self.query.pending_computed = pending;
        Ok(())
    }

    fn filter(&mut self, condition: &Expr) -> TranspileResult<()> {
        self.check_columns("filter", condition.identifiers())?;

        if !self.query.aggregations.is_empty() {
            let group_level = condition.identifiers().iter().all(|name| {
                self.query.is_aggregation_alias(name) || self.query.group_keys.iter().any(|k| k == name)
            }) && !condition.contains_call(&functions::is_multi_row);

            if group_level && self.query.limit.is_none() {
                let expanded = self.query.expand_aggregations(condition);
                let rendered = self.renderer(Scope::Aggregate).render(&expanded)?;
                self.query.having_conjuncts.push(rendered);
                return Ok(());
            }
            self.flush("filter");
        } else if self.query.limit.is_some()
            || self.query.references_pending(condition)
            || self.query.has_multi_row_pending()
        {
            self.flush("filter");
        }

        let rendered = self.renderer(Scope::Row).render(condition)?;
        self.query.where_conjuncts.push(rendered);
        Ok(())
    }

    fn mutate(&mut self, assignments: &[Assignment]) -> TranspileResult<()> {
        if !self.query.aggregations.is_empty() {
            self.flush("mutate");
        }

        for Assignment { alias, expr } in assignments {
            self.check_columns("mutate", expr.identifiers())?;

            let multi_row = expr.contains_call(&functions::is_multi_row);
            if self.query.references_pending(expr) || (multi_row && self.query.limit.is_some()) {
                self.flush("mutate");
            }

            let sql = self.renderer(Scope::Projection).render_sql(expr)?;
            let computed = SelectItem::Computed {
                sql,
                alias: alias.clone(),
            };

            if let Some(item) = self.query.item_mut(alias) {
                *item = computed;
            } else {
                if self.query.has_star() {
                    let shadows_source = expr.references(alias)
                        || self
                            .query
                            .source_columns
                            .as_ref()
                            .is_some_and(|columns| columns.contains(alias));
                    if shadows_source {
                        self.exclude_from_star("mutate", alias)?;
                    } else if self.query.select_list.is_empty() {
                        self.query.select_list.push(SelectItem::Star { except: Vec::new() });
                    }
                }
                self.query.select_list.push(computed);
            }
            self.query.pending_computed.insert(alias.clone(), expr.clone());
        }
        Ok(())
    }

    fn arrange(&mut self, keys: &[OrderKey]) -> TranspileResult<()> {
        self.check_columns("arrange", keys.iter().flat_map(|key| key.expr.identifiers()))?;

        // Output aliases are only visible to ORDER BY as bare names
        let reads_alias = keys.iter().any(|key| {
            !matches!(key.expr, Expr::Identifier(_)) && self.query.references_pending(&key.expr)
        });
        if !self.query.aggregations.is_empty() || self.query.limit.is_some() || reads_alias {
            self.flush("arrange");
        }

        let mut order = Vec::with_capacity(keys.len());
        for key in keys {
            let sql = match &key.expr {
                Expr::Identifier(name) => self.sql.quote_identifier(name),
                expr => self.renderer(Scope::Row).render_sql(expr)?,
            };
            order.push(OrderItem {
                sql,
                descending: key.descending,
            });
        }
        self.query.order_keys = order;
        Ok(())
    }

    fn group_by(&mut self, columns: &[String]) -> TranspileResult<()> {
        self.check_columns("group_by", columns.iter().map(String::as_str))?;
        if self.query.limit.is_some() || !self.query.aggregations.is_empty() || self.query.has_computed() {
            self.flush("group_by");
        }
        self.query.group_keys = columns.to_vec();
        Ok(())
    }

    fn summarise(&mut self, assignments: &[Assignment]) -> TranspileResult<()> {
        let reads_pending = assignments
            .iter()
            .any(|a| self.query.references_pending(&a.expr));
        if !self.query.aggregations.is_empty() || self.query.limit.is_some() || reads_pending {
            self.flush("summarise");
        }

        let mut select_list: Vec<SelectItem> = self
            .query
            .group_keys
            .iter()
            .map(|key| SelectItem::Column(key.clone()))
            .collect();
        let mut aggregations: Vec<Assignment> = Vec::with_capacity(assignments.len());

        for Assignment { alias, expr } in assignments {
            // later summaries may build on earlier ones in the same call
            let defined_here = |name: &str| aggregations.iter().any(|a| a.alias == name);
            self.check_columns(
                "summarise",
                expr.identifiers().into_iter().filter(|name| !defined_here(*name)),
            )?;

            let expr = expr.substitute(&|name| {
                aggregations
                    .iter()
                    .find(|a| a.alias == name)
                    .map(|a| a.expr.clone())
            });
            let sql = self.renderer(Scope::Aggregate).render_sql(&expr)?;

            select_list.retain(|item| item.output_name() != Some(alias.as_str()));
            aggregations.retain(|a| &a.alias != alias);
            select_list.push(SelectItem::Computed {
                sql,
                alias: alias.clone(),
            });
            aggregations.push(Assignment::new(alias.clone(), expr));
        }

        self.query.select_list = select_list;
        self.query.aggregations = aggregations;
        self.query.order_keys.clear();
        self.query.pending_computed.clear();
        Ok(())
    }

    fn rename(&mut self, columns: &[ColumnAlias]) -> TranspileResult<()> {
        self.check_columns("rename", columns.iter().map(|c| c.source.as_str()))?;
        if !self.query.aggregations.is_empty() {
            self.flush("rename");
        }

        let generator = self.sql;
        for ColumnAlias { alias, source } in columns {
            let expr = self
                .query
                .pending_computed
                .remove(source)
                .unwrap_or_else(|| Expr::Identifier(source.clone()));

            if let Some(item) = self.query.item_mut(source) {
                let sql = match item {
                    SelectItem::Computed { sql, .. } => sql.clone(),
                    _ => generator.quote_identifier(source),
                };
                *item = SelectItem::Computed {
                    sql,
                    alias: alias.clone(),
                };
            } else if self.query.has_star() {
                self.exclude_from_star("rename", source)?;
                self.query.select_list.push(SelectItem::Computed {
                    sql: generator.quote_identifier(source),
                    alias: alias.clone(),
                });
            } else {
                self.query.select_list.push(SelectItem::Computed {
                    sql: generator.quote_identifier(source),
                    alias: alias.clone(),
                });
            }
            self.query.pending_computed.insert(alias.clone(), expr);
        }
        Ok(())
    }

    /// Drop `column` from the `*` item so `verb` can emit it again, renamed
    /// or recomputed, without duplicating the output name.
    ///
    /// Dialects without `* EXCLUDE` get the star spelled out when the
    /// source's columns are known.
    fn exclude_from_star(&mut self, verb: &str, column: &str) -> TranspileResult<()> {
        if self.query.select_list.is_empty() {
            self.query.select_list.push(SelectItem::Star { except: Vec::new() });
        }

        let items = std::mem::take(&mut self.query.select_list);
        let mut select_list = Vec::with_capacity(items.len());
        for item in items {
            let SelectItem::Star { mut except } = item else {
                select_list.push(item);
                continue;
            };
            except.push(column.to_string());
            let excluded: Vec<&str> = except.iter().map(String::as_str).collect();

            if self.sql.star_exclude(&excluded).is_some() {
                select_list.push(SelectItem::Star { except });
            } else if let Some(known) = &self.query.source_columns {
                select_list.extend(
                    known
                        .iter()
                        .filter(|name| !except.contains(name))
                        .map(|name| SelectItem::Column(name.clone())),
                );
            } else {
                return Err(self.error(
                    GenerationErrorKind::UnsupportedOperation,
                    format!(
                        "{}: `{}` is only reachable through *, and {} cannot exclude columns from *; select the columns explicitly first",
                        verb, column, self.dialect
                    ),
                ));
            }
        }
        self.query.select_list = select_list;
        Ok(())
    }

    /// How the current level's columns are qualified inside join conditions.
    fn source_qualifier(&self) -> String {
        match &self.query.source {
            SourceExpr::Table(name) => self.sql.quote_qualified(name),
            SourceExpr::Stage(i) => stage_name(*i),
        }
    }

    fn join(&mut self, kind: JoinKind, table: &str, by: &[JoinColumn]) -> TranspileResult<()> {
        let verb = kind.verb();
        self.check_columns(verb, by.iter().map(|key| key.left.as_str()))?;

        if kind == JoinKind::Full && !self.sql.supports_full_join() {
            return Err(self.error(
                GenerationErrorKind::UnsupportedOperation,
                format!("{}: {} has no FULL JOIN", verb, self.dialect),
            ));
        }
        if by.is_empty() && kind.is_filtering() {
            return Err(self.error(
                GenerationErrorKind::UnsupportedOperation,
                format!("{}: name the key columns with `by`", verb),
            ));
        }

        let keys_pending = by
            .iter()
            .any(|key| self.query.pending_computed.contains_key(&key.left));
        let needs_flush = if kind.is_filtering() {
            !self.query.aggregations.is_empty()
                || self.query.limit.is_some()
                || keys_pending
                || self.query.has_multi_row_pending()
        } else {
            !self.query.is_bare_source()
        };
        if needs_flush {
            self.flush(verb);
        }

        if matches!(&self.query.source, SourceExpr::Table(name) if name == table) {
            return Err(self.error(
                GenerationErrorKind::UnsupportedOperation,
                format!("{}: `{}` cannot be joined to itself", verb, table),
            ));
        }

        let left = self.source_qualifier();
        let right = self.sql.quote_qualified(table);
        let key_matches = |outer: &str, inner: &str| -> Vec<String> {
            by.iter()
                .map(|key| {
                    format!(
                        "{}.{} = {}.{}",
                        outer,
                        self.sql.quote_identifier(&key.left),
                        inner,
                        self.sql.quote_identifier(&key.right)
                    )
                })
                .collect()
        };

        let keyword = match kind {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Full => "FULL JOIN",
            JoinKind::Semi | JoinKind::Anti => {
                let exists = format!(
                    "EXISTS (SELECT 1 FROM {} WHERE {})",
                    right,
                    key_matches(&left, &right).join(" AND ")
                );
                let condition = match kind {
                    JoinKind::Anti => Rendered::new(format!("NOT {}", exists), prec::NOT),
                    _ => Rendered::atom(exists),
                };
                self.query.where_conjuncts.push(condition);
                return Ok(());
            }
        };

        let clause = if by.is_empty() {
            format!("NATURAL {} {}", keyword, right)
        } else if by.iter().all(|key| key.left == key.right) {
            let columns: Vec<String> = by
                .iter()
                .map(|key| self.sql.quote_identifier(&key.left))
                .collect();
            format!("{} {} USING ({})", keyword, right, columns.join(", "))
        } else {
            format!(
                "{} {} ON {}",
                keyword,
                right,
                key_matches(&left, &right).join(" AND ")
            )
        };
        self.query.joins.push(clause);
        // the joined table's columns are not known
        self.query.source_columns = None;
        Ok(())
    }

    /// Combine the current level with every row of `table`. The other table
    /// is read with this level's column list when that list is known.
    fn set_operation(&mut self, op: SetOperation, table: &str) {
        if !self.query.order_keys.is_empty() || self.query.limit.is_some() {
            self.flush(op.verb());
        }

        let columns = match self.query.output_columns() {
            Some(columns) if !columns.is_empty() => columns
                .iter()
                .map(|column| self.sql.quote_identifier(column))
                .collect::<Vec<_>>()
                .join(", "),
            _ => "*".to_string(),
        };
        self.query.set_operation = Some(format!(
            "{} SELECT {} FROM {}",
            op.keyword(),
            columns,
            self.sql.quote_qualified(table)
        ));
    }

    fn head(&mut self, n: u64) {
        self.query.limit = Some(self.query.limit.map_or(n, |limit| limit.min(n)));
    }
}
