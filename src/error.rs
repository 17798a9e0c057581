//! Error types for selbind operations.

use thiserror::Error;

/// Result type alias using [`SelbindError`].
pub type Result<T> = std::result::Result<T, SelbindError>;

/// Error types for catalog and binding operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelbindError {
    // ==================== Catalog Errors ====================
    /// Schema-related errors (duplicate table, duplicate field, etc.).
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// Catalog persistence errors.
    #[error("Catalog error: {0}")]
    CatalogError(String),

    // ==================== Bind Errors ====================
    /// Null or empty database handle, relation name or similar argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A relation named in the statement has no catalog entry.
    #[error("No such table '{table}' in {clause} clause")]
    TableNotFound { table: String, clause: Clause },

    /// A field or qualified wildcard cannot be resolved against the tables in scope.
    #[error("Field missing in {clause} clause: {}", qualified(.table, .field))]
    FieldMissing {
        table: String,
        field: String,
        clause: Clause,
    },

    /// An unqualified field name matches fields in more than one table.
    #[error("Ambiguous field '{field}' in {clause} clause, found in tables: {}", .tables.join(", "))]
    AmbiguousField {
        field: String,
        tables: Vec<String>,
        clause: Clause,
    },

    /// Predicate could not be built from condition fragments.
    #[error("Predicate error in {clause} clause: {message}")]
    PredicateBuild { message: String, clause: Clause },

    // ==================== Internal Errors ====================
    /// Join relation list and join condition list lengths disagree.
    #[error("Malformed join for relation '{relation}': {join_relations} join relations but {condition_lists} condition lists")]
    MalformedJoinShape {
        relation: String,
        join_relations: usize,
        condition_lists: usize,
    },

    /// Raw expression node is structurally invalid.
    #[error("Malformed expression: {0}")]
    MalformedExpression(String),
}

impl SelbindError {
    /// Returns true for errors that signal an upstream defect rather than bad user input.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            SelbindError::MalformedJoinShape { .. } | SelbindError::MalformedExpression(_)
        )
    }

    /// Returns the clause the error was detected in, if any.
    #[must_use]
    pub fn clause(&self) -> Option<Clause> {
        match self {
            SelbindError::TableNotFound { clause, .. }
            | SelbindError::FieldMissing { clause, .. }
            | SelbindError::AmbiguousField { clause, .. }
            | SelbindError::PredicateBuild { clause, .. } => Some(*clause),
            _ => None,
        }
    }

    /// Rebinds a clause-carrying error to `clause`.
    ///
    /// Collaborators such as the predicate builder do not know which clause
    /// they were invoked for; the binder stamps it on the way out.
    #[must_use]
    pub fn in_clause(self, clause: Clause) -> Self {
        match self {
            SelbindError::TableNotFound { table, .. } => {
                SelbindError::TableNotFound { table, clause }
            }
            SelbindError::FieldMissing { table, field, .. } => SelbindError::FieldMissing {
                table,
                field,
                clause,
            },
            SelbindError::AmbiguousField { field, tables, .. } => SelbindError::AmbiguousField {
                field,
                tables,
                clause,
            },
            SelbindError::PredicateBuild { message, .. } => {
                SelbindError::PredicateBuild { message, clause }
            }
            other => other,
        }
    }
}

/// Clause of a SELECT statement, used for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clause {
    From,
    Join,
    Select,
    Where,
}

impl std::fmt::Display for Clause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Clause::From => "FROM",
            Clause::Join => "JOIN",
            Clause::Select => "SELECT",
            Clause::Where => "WHERE",
        };
        f.write_str(name)
    }
}

fn qualified(table: &str, field: &str) -> String {
    if table.is_empty() {
        field.to_string()
    } else {
        format!("{table}.{field}")
    }
}
