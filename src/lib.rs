//! selbind - SELECT statement binder
//!
//! Turns a parsed SELECT node (unresolved table names, column and wildcard
//! expressions, raw join and filter conditions) into a resolved
//! [`SelectStmt`] referencing concrete catalog tables.
//!
//! ```
//! use selbind::binder::{bind_select, Expression};
//! use selbind::catalog::{Database, FieldMeta, TableMeta};
//! use selbind::parser::ast::{InnerJoinSqlNode, SelectSqlNode};
//! use selbind::types::DataType;
//!
//! let db = Database::new("sys");
//! db.create_table(TableMeta::new("t1", vec![FieldMeta::new("id", DataType::Int64)?])?)?;
//!
//! let select = SelectSqlNode::new()
//!     .project(Expression::column("", "*"))
//!     .from(InnerJoinSqlNode::new("t1"));
//! let stmt = bind_select(&db, &select)?;
//! assert_eq!(stmt.column_names(), vec!["id"]);
//! # Ok::<(), selbind::SelbindError>(())
//! ```

pub mod binder;
pub mod catalog;
pub mod error;
pub mod parser;
pub mod types;

pub use binder::{bind_select, SelectBinder, SelectStmt};
pub use error::{Clause, Result, SelbindError};
