//! Predicate construction for WHERE and JOIN ... ON conditions.

use tracing::debug;

use crate::catalog::{Catalog, FieldMeta, Table};
use crate::error::{Clause, Result, SelbindError};
use crate::parser::ast::{CompOp, ConditionOperand, ConditionSqlNode, RelAttrSqlNode};
use crate::types::{DataType, Value};

use super::scope::TableMap;

/// Builds resolved predicates from raw condition fragments.
///
/// The binder calls this once per join and once for the WHERE clause.
/// Errors are returned to the caller as-is.
pub trait PredicateBuilder {
    /// Resolves `fragments` into a predicate.
    ///
    /// Unqualified attributes refer to `default_table`; qualified ones are
    /// looked up in `table_map`.
    ///
    /// # Errors
    ///
    /// Returns an error when an attribute cannot be resolved or the operands
    /// of a fragment cannot be compared.
    fn build(
        &self,
        db: &dyn Catalog,
        default_table: Option<&Table>,
        table_map: &TableMap,
        fragments: &[ConditionSqlNode],
    ) -> Result<FilterStmt>;
}

/// Conjunction of resolved comparisons.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterStmt {
    units: Vec<FilterUnit>,
}

impl FilterStmt {
    /// Creates a predicate from resolved units.
    #[must_use]
    pub fn new(units: Vec<FilterUnit>) -> Self {
        FilterStmt { units }
    }

    /// Returns the comparisons, in source order.
    #[must_use]
    pub fn units(&self) -> &[FilterUnit] {
        &self.units
    }

    /// Returns true if the predicate has no comparisons (always true).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Single resolved comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterUnit {
    pub left: FilterObj,
    pub op: CompOp,
    pub right: FilterObj,
}

/// Operand of a resolved comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterObj {
    /// Field of a table in scope.
    Field(FieldRef),
    /// Literal value.
    Value(Value),
}

impl FilterObj {
    fn data_type(&self) -> Option<DataType> {
        match self {
            FilterObj::Field(field) => Some(field.field.data_type),
            FilterObj::Value(value) => value.data_type(),
        }
    }

    fn describe(&self) -> String {
        match self {
            FilterObj::Field(field) => format!("{}.{}", field.table.name, field.field.name),
            FilterObj::Value(value) => value.to_string(),
        }
    }
}

/// Field resolved against a concrete table.
#[derive(Debug, Clone)]
pub struct FieldRef {
    pub table: Table,
    pub field: FieldMeta,
}

impl PartialEq for FieldRef {
    fn eq(&self, other: &Self) -> bool {
        std::sync::Arc::ptr_eq(&self.table, &other.table) && self.field == other.field
    }
}

/// Default predicate builder.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterBuilder;

impl PredicateBuilder for FilterBuilder {
    fn build(
        &self,
        db: &dyn Catalog,
        default_table: Option<&Table>,
        table_map: &TableMap,
        fragments: &[ConditionSqlNode],
    ) -> Result<FilterStmt> {
        let units = fragments
            .iter()
            .map(|fragment| build_unit(default_table, table_map, fragment))
            .collect::<Result<Vec<_>>>()?;
        debug!(db = db.name(), units = units.len(), "built filter");
        Ok(FilterStmt::new(units))
    }
}

fn build_unit(
    default_table: Option<&Table>,
    table_map: &TableMap,
    fragment: &ConditionSqlNode,
) -> Result<FilterUnit> {
    let left = build_obj(default_table, table_map, &fragment.left)?;
    let right = build_obj(default_table, table_map, &fragment.right)?;

    if let (Some(l), Some(r)) = (left.data_type(), right.data_type()) {
        if !l.is_comparable_with(r) {
            return Err(SelbindError::PredicateBuild {
                message: format!(
                    "cannot compare {} ({}) with {} ({})",
                    left.describe(),
                    l.name(),
                    right.describe(),
                    r.name()
                ),
                clause: Clause::Where,
            });
        }
    }

    debug!(
        left = %left.describe(),
        op = fragment.op.as_str(),
        right = %right.describe(),
        "resolved comparison"
    );
    Ok(FilterUnit {
        left,
        op: fragment.op,
        right,
    })
}

fn build_obj(
    default_table: Option<&Table>,
    table_map: &TableMap,
    operand: &ConditionOperand,
) -> Result<FilterObj> {
    match operand {
        ConditionOperand::Value(value) => Ok(FilterObj::Value(value.clone())),
        ConditionOperand::Attr(attr) => {
            resolve_attr(default_table, table_map, attr).map(FilterObj::Field)
        }
    }
}

fn resolve_attr(
    default_table: Option<&Table>,
    table_map: &TableMap,
    attr: &RelAttrSqlNode,
) -> Result<FieldRef> {
    let table = if attr.relation_name.is_empty() {
        default_table.ok_or_else(|| SelbindError::FieldMissing {
            table: String::new(),
            field: attr.attribute_name.clone(),
            clause: Clause::Where,
        })?
    } else {
        table_map
            .get(&attr.relation_name)
            .ok_or_else(|| SelbindError::TableNotFound {
                table: attr.relation_name.clone(),
                clause: Clause::Where,
            })?
    };

    let field = table
        .field_by_name(&attr.attribute_name)
        .ok_or_else(|| SelbindError::FieldMissing {
            table: table.name.clone(),
            field: attr.attribute_name.clone(),
            clause: Clause::Where,
        })?;

    Ok(FieldRef {
        table: table.clone(),
        field: field.clone(),
    })
}
