//! Projection expression nodes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{Catalog, FieldMeta, Table};
use crate::error::{Clause, Result, SelbindError};
use crate::types::{DataType, Value};

use super::config::{AmbiguityPolicy, BinderConfig};
use super::scope::TableMap;

/// Coarse expression kind, as seen by the projection resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprKind {
    Field,
    Star,
    Other,
}

/// Expression node in a projection list.
///
/// The parser produces these with unresolved names; the binder expands
/// wildcards and resolves field references in place.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Column reference (`t.c` or `c`).
    Field(FieldExpr),

    /// `*`, `*.*` or `t.*`.
    Wildcard(WildcardExpr),

    /// Literal value.
    Value { value: Value, name: Option<String> },

    /// Binary arithmetic.
    Arithmetic {
        op: ArithmeticOp,
        left: Box<Expression>,
        right: Box<Expression>,
        name: Option<String>,
    },

    /// Aggregation function call.
    Aggregate {
        function: AggregateFunction,
        arg: Box<Expression>,
        name: Option<String>,
    },
}

impl Expression {
    /// Creates a column expression from raw table and field text.
    ///
    /// `*`, `*.*` and `t.*` become wildcards; anything else is a field
    /// reference. An empty table part means unqualified.
    #[must_use]
    pub fn column(table_name: impl Into<String>, field_name: impl Into<String>) -> Self {
        let table_name = table_name.into();
        let field_name = field_name.into();
        if field_name == "*" {
            if table_name.is_empty() || table_name == "*" {
                return Expression::Wildcard(WildcardExpr::all());
            }
            return Expression::Wildcard(WildcardExpr::table(table_name));
        }
        Expression::Field(FieldExpr::new(table_name, field_name))
    }

    /// Creates an unqualified field reference.
    #[must_use]
    pub fn field(field_name: impl Into<String>) -> Self {
        Self::column(String::new(), field_name)
    }

    /// Creates a literal expression.
    #[must_use]
    pub fn value(value: Value) -> Self {
        Expression::Value { value, name: None }
    }

    /// Creates an arithmetic expression.
    #[must_use]
    pub fn arithmetic(left: Expression, op: ArithmeticOp, right: Expression) -> Self {
        Expression::Arithmetic {
            op,
            left: Box::new(left),
            right: Box::new(right),
            name: None,
        }
    }

    /// Creates an aggregate expression.
    #[must_use]
    pub fn aggregate(function: AggregateFunction, arg: Expression) -> Self {
        Expression::Aggregate {
            function,
            arg: Box::new(arg),
            name: None,
        }
    }

    /// Returns the kind of this expression.
    #[must_use]
    pub fn kind(&self) -> ExprKind {
        match self {
            Expression::Field(_) => ExprKind::Field,
            Expression::Wildcard(_) => ExprKind::Star,
            Expression::Value { .. }
            | Expression::Arithmetic { .. }
            | Expression::Aggregate { .. } => ExprKind::Other,
        }
    }

    /// Returns the field reference if this is one.
    #[must_use]
    pub fn as_field(&self) -> Option<&FieldExpr> {
        match self {
            Expression::Field(field) => Some(field),
            _ => None,
        }
    }

    /// Returns the output column name of this expression.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Expression::Field(field) => field.name().to_string(),
            Expression::Wildcard(wildcard) => wildcard.to_string(),
            Expression::Value { value, name } => {
                name.clone().unwrap_or_else(|| value.to_string())
            }
            Expression::Arithmetic {
                op,
                left,
                right,
                name,
            } => name
                .clone()
                .unwrap_or_else(|| format!("{}{}{}", left.name(), op.as_str(), right.name())),
            Expression::Aggregate {
                function,
                arg,
                name,
            } => name
                .clone()
                .unwrap_or_else(|| format!("{}({})", function.name(), arg.name())),
        }
    }

    /// Overrides the output column name.
    pub fn set_name(&mut self, new_name: impl Into<String>) {
        let new_name = new_name.into();
        match self {
            Expression::Field(field) => field.set_name(new_name),
            Expression::Wildcard(_) => {}
            Expression::Value { name, .. }
            | Expression::Arithmetic { name, .. }
            | Expression::Aggregate { name, .. } => *name = Some(new_name),
        }
    }

    /// Returns the result type, once every field below has been resolved.
    #[must_use]
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Expression::Field(field) => field.field().map(|f| f.data_type),
            Expression::Wildcard(_) => None,
            Expression::Value { value, .. } => value.data_type(),
            Expression::Arithmetic { op, left, right, .. } => {
                let (l, r) = (left.data_type()?, right.data_type()?);
                if *op != ArithmeticOp::Div && l == DataType::Int64 && r == DataType::Int64 {
                    Some(DataType::Int64)
                } else {
                    Some(DataType::Float64)
                }
            }
            Expression::Aggregate { function, arg, .. } => {
                Some(function.output_type(arg.data_type()))
            }
        }
    }

    /// Checks every field reference in this expression against the tables
    /// in scope, resolving it in place.
    ///
    /// # Errors
    ///
    /// Returns `FieldMissing` when a referenced table is not in scope or has
    /// no such field, or when a wildcard appears anywhere but as an aggregate
    /// argument. `AmbiguousField` when an unqualified name matches more
    /// than one table and the policy rejects that, and `MalformedExpression`
    /// for nodes the parser should never have produced.
    pub fn resolve_against_schema(
        &mut self,
        table_map: &TableMap,
        db: &dyn Catalog,
        config: &BinderConfig,
    ) -> Result<()> {
        match self {
            Expression::Field(field) => field.resolve(table_map, db, config),
            Expression::Wildcard(wildcard) => Err(SelbindError::FieldMissing {
                table: wildcard.table_name().unwrap_or_default().to_string(),
                field: "*".to_string(),
                clause: Clause::Select,
            }),
            Expression::Value { .. } => Ok(()),
            Expression::Arithmetic { left, right, .. } => {
                left.resolve_against_schema(table_map, db, config)?;
                right.resolve_against_schema(table_map, db, config)
            }
            Expression::Aggregate { function, arg, .. } => {
                if let Expression::Wildcard(wildcard) = arg.as_ref() {
                    return check_aggregate_wildcard(*function, wildcard, table_map);
                }
                arg.resolve_against_schema(table_map, db, config)
            }
        }
    }
}

impl From<FieldExpr> for Expression {
    fn from(field: FieldExpr) -> Self {
        Expression::Field(field)
    }
}

/// Reference to a table field.
#[derive(Debug, Clone)]
pub struct FieldExpr {
    table_name: String,
    field_name: String,
    name: Option<String>,
    table: Option<Table>,
    field: Option<FieldMeta>,
}

impl PartialEq for FieldExpr {
    fn eq(&self, other: &Self) -> bool {
        self.table_name == other.table_name
            && self.field_name == other.field_name
            && self.name == other.name
            && self.field == other.field
            && match (&self.table, &other.table) {
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            }
    }
}

impl FieldExpr {
    /// Creates an unresolved field reference. An empty table name means unqualified.
    #[must_use]
    pub fn new(table_name: impl Into<String>, field_name: impl Into<String>) -> Self {
        FieldExpr {
            table_name: table_name.into(),
            field_name: field_name.into(),
            name: None,
            table: None,
            field: None,
        }
    }

    /// Creates a field reference already resolved to `field` of `table`.
    #[must_use]
    pub fn resolved(table: &Table, field: &FieldMeta) -> Self {
        FieldExpr {
            table_name: table.name.clone(),
            field_name: field.name.clone(),
            name: None,
            table: Some(Arc::clone(table)),
            field: Some(field.clone()),
        }
    }

    /// Returns the table part as written (or the resolved table's name).
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Returns the field part.
    #[must_use]
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Returns the display name, falling back to the text as written.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.field_name)
    }

    /// Returns true once a display name has been assigned.
    #[must_use]
    pub fn has_name(&self) -> bool {
        self.name.is_some()
    }

    /// Sets the display name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    /// Returns the resolved table.
    #[must_use]
    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    /// Returns the resolved field metadata.
    #[must_use]
    pub fn field(&self) -> Option<&FieldMeta> {
        self.field.as_ref()
    }

    /// Returns true once the reference points at a concrete table field.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.table.is_some() && self.field.is_some()
    }

    fn resolve(&mut self, table_map: &TableMap, db: &dyn Catalog, config: &BinderConfig) -> Result<()> {
        if self.field_name.trim().is_empty() {
            return Err(SelbindError::MalformedExpression(
                "field reference with blank field name".into(),
            ));
        }
        if self.field_name == "*" {
            return Err(SelbindError::MalformedExpression(format!(
                "wildcard '{}.*' parsed as a field reference",
                self.table_name
            )));
        }

        let table = if self.table_name.is_empty() {
            self.find_unqualified(table_map, config.ambiguity)?
        } else {
            table_map.get(&self.table_name).cloned().ok_or_else(|| {
                if db.find_table(&self.table_name).is_some() {
                    debug!(
                        db = db.name(),
                        table = %self.table_name,
                        "table exists but is not in the FROM list"
                    );
                }
                SelbindError::FieldMissing {
                    table: self.table_name.clone(),
                    field: self.field_name.clone(),
                    clause: Clause::Select,
                }
            })?
        };

        let field = table
            .field_by_name(&self.field_name)
            .cloned()
            .ok_or_else(|| SelbindError::FieldMissing {
                table: table.name.clone(),
                field: self.field_name.clone(),
                clause: Clause::Select,
            })?;

        if !self.has_name() {
            let qualify = config.qualify(table_map.is_single_table());
            self.name = Some(display_name(&table.name, &field.name, qualify));
        }
        self.table_name.clone_from(&table.name);
        self.table = Some(table);
        self.field = Some(field);
        Ok(())
    }

    fn find_unqualified(&self, table_map: &TableMap, policy: AmbiguityPolicy) -> Result<Table> {
        let mut candidates: Vec<&Table> = Vec::new();
        for table in table_map.tables() {
            if table.field_by_name(&self.field_name).is_some()
                && !candidates.iter().any(|c| Arc::ptr_eq(c, table))
            {
                candidates.push(table);
            }
        }

        match (candidates.as_slice(), policy) {
            ([], _) => Err(SelbindError::FieldMissing {
                table: String::new(),
                field: self.field_name.clone(),
                clause: Clause::Select,
            }),
            ([only], _) | ([only, ..], AmbiguityPolicy::FirstMatch) => Ok(Arc::clone(only)),
            (many, AmbiguityPolicy::Reject) => Err(SelbindError::AmbiguousField {
                field: self.field_name.clone(),
                tables: many.iter().map(|t| t.name.clone()).collect(),
                clause: Clause::Select,
            }),
        }
    }
}

/// Only `COUNT(*)` and `COUNT(t.*)` with `t` in scope accept a wildcard argument.
fn check_aggregate_wildcard(
    function: AggregateFunction,
    wildcard: &WildcardExpr,
    table_map: &TableMap,
) -> Result<()> {
    let in_scope = wildcard
        .table_name()
        .map_or(true, |name| table_map.contains(name));
    if function == AggregateFunction::Count && in_scope {
        return Ok(());
    }
    Err(SelbindError::FieldMissing {
        table: wildcard.table_name().unwrap_or_default().to_string(),
        field: "*".to_string(),
        clause: Clause::Select,
    })
}

/// Wildcard projection. `table` is `None` for `*` and `*.*`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WildcardExpr {
    table: Option<String>,
}

impl WildcardExpr {
    /// Creates `*`.
    #[must_use]
    pub fn all() -> Self {
        WildcardExpr { table: None }
    }

    /// Creates `table.*`.
    #[must_use]
    pub fn table(table: impl Into<String>) -> Self {
        WildcardExpr {
            table: Some(table.into()),
        }
    }

    /// Returns the qualifying table name, if any.
    #[must_use]
    pub fn table_name(&self) -> Option<&str> {
        self.table.as_deref()
    }
}

impl std::fmt::Display for WildcardExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.table {
            Some(table) => write!(f, "{table}.*"),
            None => f.write_str("*"),
        }
    }
}

/// Builds the display name of a field: bare, or `table.field` when qualified.
#[must_use]
pub fn display_name(table: &str, field: &str, qualify: bool) -> String {
    if qualify {
        format!("{table}.{field}")
    } else {
        field.to_string()
    }
}

/// Arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithmeticOp {
    /// Returns the string representation of this operator.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ArithmeticOp::Add => "+",
            ArithmeticOp::Sub => "-",
            ArithmeticOp::Mul => "*",
            ArithmeticOp::Div => "/",
        }
    }
}

/// Aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFunction {
    /// Returns the name of this aggregate function.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
        }
    }

    /// Returns the output data type for this aggregate function given an input type.
    #[must_use]
    pub fn output_type(&self, input_type: Option<DataType>) -> DataType {
        match self {
            AggregateFunction::Count => DataType::Int64,
            AggregateFunction::Avg => DataType::Float64,
            AggregateFunction::Sum | AggregateFunction::Min | AggregateFunction::Max => {
                input_type.unwrap_or(DataType::Int64)
            }
        }
    }
}
