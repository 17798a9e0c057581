//! In-memory database catalog.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SelbindError};

use super::schema::{Table, TableMeta};
use super::Catalog;

/// Named database holding table metadata.
///
/// Lookups take a shared lock, so any number of binds can resolve tables
/// concurrently while DDL is serialized behind the write lock.
#[derive(Debug)]
pub struct Database {
    name: String,
    state: RwLock<DatabaseState>,
}

#[derive(Debug, Default)]
struct DatabaseState {
    tables: HashMap<String, Table>,
    next_table_id: u32,
}

/// Serialized form of a database's metadata.
#[derive(Serialize, Deserialize)]
struct DatabaseSnapshot {
    name: String,
    tables: Vec<TableMeta>,
    next_table_id: u32,
}

impl Database {
    /// Creates a new empty database.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Database {
            name: name.into(),
            state: RwLock::new(DatabaseState::default()),
        }
    }

    /// Registers a new table and returns its handle.
    ///
    /// # Errors
    ///
    /// Returns an error if a table with the same name already exists.
    pub fn create_table(&self, mut meta: TableMeta) -> Result<Table> {
        let mut state = self.state.write();
        if state.tables.contains_key(&meta.name) {
            return Err(SelbindError::SchemaError(format!(
                "Table '{}' already exists",
                meta.name
            )));
        }
        meta.table_id = state.next_table_id;
        state.next_table_id += 1;

        let table = Arc::new(meta);
        state.tables.insert(table.name.clone(), Arc::clone(&table));
        Ok(table)
    }

    /// Removes a table. Handles already held by bound statements stay valid.
    ///
    /// # Errors
    ///
    /// Returns an error if the table does not exist.
    pub fn drop_table(&self, name: &str) -> Result<Table> {
        self.state
            .write()
            .tables
            .remove(name)
            .ok_or_else(|| SelbindError::SchemaError(format!("Table '{name}' does not exist")))
    }

    /// Returns all table names, sorted.
    #[must_use]
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.read().tables.keys().cloned().collect();
        names.sort();
        names
    }

    /// Serializes the database metadata to bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let state = self.state.read();
        let mut tables: Vec<TableMeta> = state.tables.values().map(|t| (**t).clone()).collect();
        tables.sort_by_key(|t| t.table_id);
        let snapshot = DatabaseSnapshot {
            name: self.name.clone(),
            tables,
            next_table_id: state.next_table_id,
        };
        bincode::serialize(&snapshot)
            .map_err(|e| SelbindError::CatalogError(format!("Failed to serialize catalog: {e}")))
    }

    /// Deserializes a database from bytes produced by [`Database::serialize`].
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails or a stored table does not
    /// pass schema validation.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        let snapshot: DatabaseSnapshot = bincode::deserialize(data).map_err(|e| {
            SelbindError::CatalogError(format!("Failed to deserialize catalog: {e}"))
        })?;
        let mut tables = HashMap::with_capacity(snapshot.tables.len());
        for meta in snapshot.tables {
            meta.validate().map_err(|e| {
                SelbindError::CatalogError(format!("Invalid table in catalog snapshot: {e}"))
            })?;
            if tables.contains_key(&meta.name) {
                return Err(SelbindError::CatalogError(format!(
                    "Duplicate table '{}' in catalog snapshot",
                    meta.name
                )));
            }
            tables.insert(meta.name.clone(), Arc::new(meta));
        }
        Ok(Database {
            name: snapshot.name,
            state: RwLock::new(DatabaseState {
                tables,
                next_table_id: snapshot.next_table_id,
            }),
        })
    }
}

impl Catalog for Database {
    fn name(&self) -> &str {
        &self.name
    }

    fn find_table(&self, name: &str) -> Option<Table> {
        self.state.read().tables.get(name).cloned()
    }
}
