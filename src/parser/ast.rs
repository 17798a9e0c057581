//! Abstract Syntax Tree definitions for SELECT statements.
//!
//! Names in these nodes are unresolved text exactly as written in the query.

use crate::binder::Expression;
use crate::types::Value;

/// A parsed SELECT statement.
#[derive(Debug, Clone, Default)]
pub struct SelectSqlNode {
    /// Projection expressions in source order.
    pub project_exprs: Vec<Expression>,
    /// Top-level FROM entries in source order.
    pub relations: Vec<InnerJoinSqlNode>,
    /// WHERE condition fragments, implicitly AND-ed.
    pub conditions: Vec<ConditionSqlNode>,
}

impl SelectSqlNode {
    /// Creates an empty SELECT node.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a projection expression.
    #[must_use]
    pub fn project(mut self, expr: Expression) -> Self {
        self.project_exprs.push(expr);
        self
    }

    /// Appends a FROM entry.
    #[must_use]
    pub fn from(mut self, relation: InnerJoinSqlNode) -> Self {
        self.relations.push(relation);
        self
    }

    /// Appends a WHERE condition.
    #[must_use]
    pub fn filter(mut self, condition: ConditionSqlNode) -> Self {
        self.conditions.push(condition);
        self
    }
}

/// One FROM entry: a base relation followed by zero or more INNER JOINs.
///
/// `join_relations[i]` is joined using `conditions[i]`; the parser keeps the
/// two lists the same length.
#[derive(Debug, Clone, Default)]
pub struct InnerJoinSqlNode {
    /// Leftmost relation name.
    pub base_relation: String,
    /// Joined relation names in source order.
    pub join_relations: Vec<String>,
    /// ON condition fragments, one list per joined relation.
    pub conditions: Vec<Vec<ConditionSqlNode>>,
}

impl InnerJoinSqlNode {
    /// Creates a FROM entry without joins.
    #[must_use]
    pub fn new(base_relation: impl Into<String>) -> Self {
        InnerJoinSqlNode {
            base_relation: base_relation.into(),
            join_relations: Vec::new(),
            conditions: Vec::new(),
        }
    }

    /// Appends `INNER JOIN relation ON conditions`.
    #[must_use]
    pub fn join(mut self, relation: impl Into<String>, conditions: Vec<ConditionSqlNode>) -> Self {
        self.join_relations.push(relation.into());
        self.conditions.push(conditions);
        self
    }
}

/// Possibly qualified attribute reference (`t.c` or `c`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RelAttrSqlNode {
    /// Relation name, empty when unqualified.
    pub relation_name: String,
    /// Attribute name.
    pub attribute_name: String,
}

impl RelAttrSqlNode {
    /// Creates an unqualified attribute reference.
    #[must_use]
    pub fn new(attribute_name: impl Into<String>) -> Self {
        RelAttrSqlNode {
            relation_name: String::new(),
            attribute_name: attribute_name.into(),
        }
    }

    /// Creates a qualified attribute reference.
    #[must_use]
    pub fn qualified(relation_name: impl Into<String>, attribute_name: impl Into<String>) -> Self {
        RelAttrSqlNode {
            relation_name: relation_name.into(),
            attribute_name: attribute_name.into(),
        }
    }
}

/// One side of a comparison condition.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionOperand {
    /// Attribute reference.
    Attr(RelAttrSqlNode),
    /// Literal value.
    Value(Value),
}

/// Single comparison fragment (`left op right`).
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionSqlNode {
    pub left: ConditionOperand,
    pub op: CompOp,
    pub right: ConditionOperand,
}

impl ConditionSqlNode {
    /// Creates a condition fragment.
    #[must_use]
    pub fn new(left: ConditionOperand, op: CompOp, right: ConditionOperand) -> Self {
        ConditionSqlNode { left, op, right }
    }

    /// Creates an `attr op value` fragment.
    #[must_use]
    pub fn attr_value(attr: RelAttrSqlNode, op: CompOp, value: Value) -> Self {
        Self::new(ConditionOperand::Attr(attr), op, ConditionOperand::Value(value))
    }

    /// Creates an `attr op attr` fragment.
    #[must_use]
    pub fn attr_attr(left: RelAttrSqlNode, op: CompOp, right: RelAttrSqlNode) -> Self {
        Self::new(ConditionOperand::Attr(left), op, ConditionOperand::Attr(right))
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompOp {
    /// Returns the string representation of this operator.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            CompOp::Eq => "=",
            CompOp::Ne => "<>",
            CompOp::Lt => "<",
            CompOp::Le => "<=",
            CompOp::Gt => ">",
            CompOp::Ge => ">=",
        }
    }
}
