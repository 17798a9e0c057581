//! Binder module for semantic analysis of SELECT statements.
//!
//! The binder resolves a parsed SELECT node against the catalog:
//! - FROM relations and INNER JOIN chains, each join with its own predicate
//! - Projection expressions, expanding `*`, `*.*` and `t.*`
//! - The WHERE predicate
//!
//! The output is a [`SelectStmt`] ready for logical planning.

mod config;
mod expression;
mod filter;
mod scope;
mod select;

pub use config::{AmbiguityPolicy, BinderConfig};
pub use expression::{
    display_name, AggregateFunction, ArithmeticOp, ExprKind, Expression, FieldExpr, WildcardExpr,
};
pub use filter::{FieldRef, FilterBuilder, FilterObj, FilterStmt, FilterUnit, PredicateBuilder};
pub use scope::TableMap;
pub use select::{bind_select, JoinStep, JoinTables, SelectBinder, SelectStmt};
