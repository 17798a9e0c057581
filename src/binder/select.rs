//! SELECT statement binding.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::catalog::{Catalog, Table};
use crate::error::{Clause, Result, SelbindError};
use crate::parser::ast::{ConditionSqlNode, InnerJoinSqlNode, SelectSqlNode};

use super::config::BinderConfig;
use super::expression::{display_name, Expression, FieldExpr};
use super::filter::{FilterBuilder, FilterStmt, PredicateBuilder};
use super::scope::TableMap;

/// One `INNER JOIN table ON predicate` step.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinStep {
    /// Joined table.
    pub table: Table,
    /// Predicate from this join's ON conditions.
    pub filter: FilterStmt,
}

/// A FROM entry: base table followed by its joins in application order.
#[derive(Debug, Clone)]
pub struct JoinTables {
    base: Table,
    joins: Vec<JoinStep>,
}

impl PartialEq for JoinTables {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.base, &other.base) && self.joins == other.joins
    }
}

impl JoinTables {
    /// Creates a chain with no joins.
    #[must_use]
    pub fn new(base: Table) -> Self {
        JoinTables {
            base,
            joins: Vec::new(),
        }
    }

    /// Appends a join step.
    pub fn push_join_table(&mut self, table: Table, filter: FilterStmt) {
        self.joins.push(JoinStep { table, filter });
    }

    /// Returns the base table.
    #[must_use]
    pub fn base(&self) -> &Table {
        &self.base
    }

    /// Returns the join steps, left to right.
    #[must_use]
    pub fn joins(&self) -> &[JoinStep] {
        &self.joins
    }
}

/// Fully bound SELECT statement, ready for plan generation.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStmt {
    join_tables: Vec<JoinTables>,
    projects: Vec<Expression>,
    filter: Option<FilterStmt>,
}

impl SelectStmt {
    /// Returns one join chain per FROM entry, in source order.
    #[must_use]
    pub fn join_tables(&self) -> &[JoinTables] {
        &self.join_tables
    }

    /// Returns the projection list, in source order.
    #[must_use]
    pub fn projects(&self) -> &[Expression] {
        &self.projects
    }

    /// Returns the WHERE predicate, if the statement has one.
    #[must_use]
    pub fn filter(&self) -> Option<&FilterStmt> {
        self.filter.as_ref()
    }

    /// Returns the display names of the projection list.
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.projects.iter().map(Expression::name).collect()
    }

    /// Consumes the statement, returning its parts.
    #[must_use]
    pub fn into_parts(self) -> (Vec<JoinTables>, Vec<Expression>, Option<FilterStmt>) {
        (self.join_tables, self.projects, self.filter)
    }
}

/// Binder for SELECT statements.
///
/// Holds no state between calls; each [`SelectBinder::bind`] owns its own
/// scope, so one binder can be shared by concurrent binds.
pub struct SelectBinder<'a> {
    /// Database the statement is bound against.
    db: &'a dyn Catalog,
    /// Binder configuration.
    config: BinderConfig,
    /// Builds join and WHERE predicates.
    predicates: &'a dyn PredicateBuilder,
}

impl<'a> SelectBinder<'a> {
    /// Creates a binder with default configuration.
    #[must_use]
    pub fn new(db: &'a dyn Catalog) -> Self {
        SelectBinder {
            db,
            config: BinderConfig::default(),
            predicates: &FilterBuilder,
        }
    }

    /// Sets the binder configuration.
    #[must_use]
    pub fn with_config(mut self, config: BinderConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the predicate builder.
    #[must_use]
    pub fn with_predicate_builder(mut self, predicates: &'a dyn PredicateBuilder) -> Self {
        self.predicates = predicates;
        self
    }

    /// Binds a parsed SELECT statement.
    ///
    /// Runs FROM/JOIN resolution, projection resolution and WHERE
    /// resolution in that order and stops at the first error. The raw node
    /// is not modified, so it can be bound again.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an unnamed database or empty relation
    /// name, `TableNotFound` for unknown relations, `FieldMissing` or
    /// `AmbiguousField` for projections that do not resolve,
    /// `MalformedJoinShape` when a FROM entry's join lists disagree, and any
    /// error raised by the predicate builder.
    pub fn bind(&self, select: &SelectSqlNode) -> Result<SelectStmt> {
        if self.db.name().is_empty() {
            warn!("invalid argument. database handle has no name");
            return Err(SelbindError::InvalidArgument(
                "database handle has no name".into(),
            ));
        }

        let mut table_map = TableMap::new();
        let join_tables = self.bind_from(&select.relations, &mut table_map)?;
        let projects = self.bind_projections(&select.project_exprs, &table_map)?;
        info!(
            tables = table_map.len(),
            projections = projects.len(),
            "bound FROM and SELECT clauses"
        );
        let filter = self.bind_where(&select.conditions, &table_map)?;

        Ok(SelectStmt {
            join_tables,
            projects,
            filter,
        })
    }

    /// Resolves a relation name and records it in `table_map`.
    fn resolve_table(&self, name: &str, clause: Clause, table_map: &mut TableMap) -> Result<Table> {
        if name.is_empty() {
            warn!("invalid argument. relation name is empty");
            return Err(SelbindError::InvalidArgument(format!(
                "empty relation name in {clause} clause"
            )));
        }

        let table = self.db.find_table(name).ok_or_else(|| {
            warn!(db = self.db.name(), table = name, "no such table");
            SelbindError::TableNotFound {
                table: name.to_string(),
                clause,
            }
        })?;

        table_map.insert(name, Arc::clone(&table));
        Ok(table)
    }

    fn bind_from(
        &self,
        relations: &[InnerJoinSqlNode],
        table_map: &mut TableMap,
    ) -> Result<Vec<JoinTables>> {
        for relation in relations {
            check_join_shape(relation)?;
        }

        let mut join_tables = Vec::with_capacity(relations.len());
        for relation in relations {
            let base = self.resolve_table(&relation.base_relation, Clause::From, table_map)?;
            let mut chain = JoinTables::new(Arc::clone(&base));

            for (join_relation, conditions) in relation.join_relations.iter().zip(&relation.conditions) {
                let table = self.resolve_table(join_relation, Clause::Join, table_map)?;
                let filter = self
                    .predicates
                    .build(self.db, Some(&base), table_map, conditions)
                    .map_err(|e| {
                        warn!(error = %e, "cannot construct join filter");
                        e.in_clause(Clause::Join)
                    })?;
                debug!(
                    base = %base.name,
                    table = %table.name,
                    conditions = conditions.len(),
                    "bound inner join"
                );
                chain.push_join_table(table, filter);
            }

            join_tables.push(chain);
        }
        Ok(join_tables)
    }

    fn bind_projections(&self, exprs: &[Expression], table_map: &TableMap) -> Result<Vec<Expression>> {
        let qualify = self.config.qualify(table_map.is_single_table());
        let mut projects = Vec::with_capacity(exprs.len());

        for expr in exprs {
            match expr {
                Expression::Wildcard(wildcard) => match wildcard.table_name() {
                    None => {
                        for table in table_map.tables() {
                            wildcard_fields(table, &mut projects, qualify);
                        }
                    }
                    Some(name) => {
                        let table = table_map.get(name).ok_or_else(|| {
                            warn!(table = name, "no such table in from list");
                            SelbindError::FieldMissing {
                                table: name.to_string(),
                                field: "*".to_string(),
                                clause: Clause::Select,
                            }
                        })?;
                        wildcard_fields(table, &mut projects, qualify);
                    }
                },
                Expression::Field(_)
                | Expression::Value { .. }
                | Expression::Arithmetic { .. }
                | Expression::Aggregate { .. } => {
                    let mut expr = expr.clone();
                    expr.resolve_against_schema(table_map, self.db, &self.config)
                        .map_err(|e| {
                            if e.is_internal() {
                                report_internal(&e);
                            } else {
                                warn!(error = %e, "cannot resolve projection");
                            }
                            e
                        })?;
                    projects.push(expr);
                }
            }
        }
        Ok(projects)
    }

    fn bind_where(
        &self,
        conditions: &[ConditionSqlNode],
        table_map: &TableMap,
    ) -> Result<Option<FilterStmt>> {
        if conditions.is_empty() {
            return Ok(None);
        }
        let filter = self
            .predicates
            .build(self.db, table_map.default_table(), table_map, conditions)
            .map_err(|e| {
                warn!(error = %e, "cannot construct filter stmt");
                e.in_clause(Clause::Where)
            })?;
        Ok(Some(filter))
    }
}

/// Binds `select` against `db` with the default configuration.
///
/// # Errors
///
/// See [`SelectBinder::bind`].
pub fn bind_select(db: &dyn Catalog, select: &SelectSqlNode) -> Result<SelectStmt> {
    SelectBinder::new(db).bind(select)
}

/// Appends one resolved field reference per visible user field of `table`.
fn wildcard_fields(table: &Table, projects: &mut Vec<Expression>, qualify: bool) {
    for field in table.visible_user_fields() {
        let mut expr = FieldExpr::resolved(table, field);
        expr.set_name(display_name(&table.name, &field.name, qualify));
        projects.push(Expression::Field(expr));
    }
}

fn check_join_shape(relation: &InnerJoinSqlNode) -> Result<()> {
    if relation.join_relations.len() == relation.conditions.len() {
        return Ok(());
    }
    let err = SelbindError::MalformedJoinShape {
        relation: relation.base_relation.clone(),
        join_relations: relation.join_relations.len(),
        condition_lists: relation.conditions.len(),
    };
    report_internal(&err);
    Err(err)
}

/// Internal errors mean the parser handed over a node it should not have.
fn report_internal(err: &SelbindError) {
    error!(error = %err, "binder received a malformed syntax tree");
}
