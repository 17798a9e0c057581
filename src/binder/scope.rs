//! Table scope for name resolution.

use std::collections::HashMap;
use std::sync::Arc;

use crate::catalog::Table;

/// Relations resolved from a FROM clause.
///
/// Keeps both the name -> table map used for qualified lookups and the
/// ordered list of every resolved occurrence used for wildcard expansion
/// and unqualified lookups. Inserting a name twice keeps the last table.
#[derive(Debug, Clone, Default)]
pub struct TableMap {
    by_name: HashMap<String, Table>,
    tables: Vec<Table>,
}

impl TableMap {
    /// Creates an empty scope.
    #[must_use]
    pub fn new() -> Self {
        TableMap {
            by_name: HashMap::new(),
            tables: Vec::new(),
        }
    }

    /// Records a resolved relation occurrence.
    pub fn insert(&mut self, name: impl Into<String>, table: Table) {
        self.tables.push(Arc::clone(&table));
        self.by_name.insert(name.into(), table);
    }

    /// Looks up a relation by the name it was given in the FROM clause.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Table> {
        self.by_name.get(name)
    }

    /// Returns true if `name` is in scope.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Returns every resolved occurrence, in FROM order.
    #[must_use]
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Returns the number of resolved occurrences.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns true if nothing has been resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Returns true if exactly one relation occurrence is in scope.
    #[must_use]
    pub fn is_single_table(&self) -> bool {
        self.tables.len() == 1
    }

    /// Returns the table unqualified names default to, if there is exactly one.
    #[must_use]
    pub fn default_table(&self) -> Option<&Table> {
        match self.tables.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }
}
