//! Catalog for resolving table names to table metadata.

mod database;
mod schema;

pub use database::Database;
pub use schema::{FieldMeta, Table, TableMeta, SYS_FIELD_TRX};

/// Read-only access to the tables of one database.
///
/// Implementations must tolerate concurrent readers; the binder calls
/// `find_table` from whatever thread is binding a statement.
pub trait Catalog: Send + Sync {
    /// Returns the database name.
    fn name(&self) -> &str;

    /// Looks up a table by name.
    fn find_table(&self, name: &str) -> Option<Table>;
}
