//! Table and field metadata.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SelbindError};
use crate::types::DataType;

/// Name of the hidden transaction bookkeeping field every table carries.
pub const SYS_FIELD_TRX: &str = "__trx";

/// Shared handle to a table's metadata.
///
/// Handles are cheap to clone and are borrowed by bound statements for as
/// long as the statement lives.
pub type Table = Arc<TableMeta>;

/// Metadata for a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMeta {
    /// Field name.
    pub name: String,
    /// Field data type.
    pub data_type: DataType,
    /// Whether the field shows up in wildcard projections.
    pub visible: bool,
}

impl FieldMeta {
    /// Creates a visible field.
    ///
    /// # Errors
    ///
    /// Returns an error if the field name is empty.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(SelbindError::SchemaError("Field name cannot be empty".into()));
        }
        Ok(FieldMeta {
            name,
            data_type,
            visible: true,
        })
    }

    /// Marks the field as hidden from wildcard projections.
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Returns true if the field shows up in wildcard projections.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

/// Metadata for a table: name and ordered fields.
///
/// The first `sys_field_num` fields are owned by the storage layer and are
/// never expanded by wildcards, whatever their visibility flag says.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMeta {
    /// Internal table ID, assigned by the database.
    pub table_id: u32,
    /// Table name.
    pub name: String,
    fields: Vec<FieldMeta>,
    sys_field_num: usize,
}

impl TableMeta {
    /// Creates table metadata with the default system field prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails (empty name, no user fields,
    /// duplicate field names).
    pub fn new(name: impl Into<String>, user_fields: Vec<FieldMeta>) -> Result<Self> {
        let sys_fields = vec![FieldMeta {
            name: SYS_FIELD_TRX.to_string(),
            data_type: DataType::Int64,
            visible: false,
        }];
        Self::with_system_fields(name, sys_fields, user_fields)
    }

    /// Creates table metadata with an explicit system field prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails (empty name, no user fields,
    /// duplicate field names).
    pub fn with_system_fields(
        name: impl Into<String>,
        sys_fields: Vec<FieldMeta>,
        user_fields: Vec<FieldMeta>,
    ) -> Result<Self> {
        let sys_field_num = sys_fields.len();
        let mut fields = sys_fields;
        fields.extend(user_fields);
        let meta = TableMeta {
            table_id: 0, // Will be set by database
            name: name.into(),
            fields,
            sys_field_num,
        };
        meta.validate()?;
        Ok(meta)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(SelbindError::SchemaError("Table name cannot be empty".into()));
        }

        if self.sys_field_num > self.fields.len() {
            return Err(SelbindError::SchemaError(format!(
                "Table '{}' declares {} system fields but has {} fields",
                self.name,
                self.sys_field_num,
                self.fields.len()
            )));
        }

        if self.fields.len() == self.sys_field_num {
            return Err(SelbindError::SchemaError(format!(
                "Table '{}' must have at least one field",
                self.name
            )));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(SelbindError::SchemaError(format!(
                    "Duplicate field name '{}' in table '{}'",
                    field.name, self.name
                )));
            }
        }

        Ok(())
    }

    /// Returns the total number of fields, system fields included.
    #[must_use]
    pub fn field_num(&self) -> usize {
        self.fields.len()
    }

    /// Returns the number of leading system-owned fields.
    #[must_use]
    pub fn sys_field_num(&self) -> usize {
        self.sys_field_num
    }

    /// Returns all fields in catalog order, system fields first.
    #[must_use]
    pub fn fields(&self) -> &[FieldMeta] {
        &self.fields
    }

    /// Returns the field at `index`.
    #[must_use]
    pub fn field(&self, index: usize) -> Option<&FieldMeta> {
        self.fields.get(index)
    }

    /// Returns the fields following the system prefix.
    #[must_use]
    pub fn user_fields(&self) -> &[FieldMeta] {
        self.fields.get(self.sys_field_num..).unwrap_or_default()
    }

    /// Returns the user fields eligible for wildcard expansion.
    pub fn visible_user_fields(&self) -> impl Iterator<Item = &FieldMeta> {
        self.user_fields().iter().filter(|f| f.is_visible())
    }

    /// Finds a user field by name. System fields are not addressable.
    #[must_use]
    pub fn field_by_name(&self, name: &str) -> Option<&FieldMeta> {
        self.user_fields().iter().find(|f| f.name == name)
    }
}
