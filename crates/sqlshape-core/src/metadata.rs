//! Field metadata lookup for targets addressed by table name.
//!
//! Typed entities describe themselves through [`Entity`](crate::Entity);
//! dynamic table names go through a [`FieldSource`] supplied by the host.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{Error, MetadataError, MetadataErrorKind, Result};
use crate::field::Field;

/// Column metadata for one table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableFields {
    /// Columns in table order
    pub fields: Vec<Field>,
    /// Primary key column, if any
    pub primary: Option<Field>,
    /// Identity column, if any
    pub identity: Option<Field>,
}

impl TableFields {
    /// Create metadata from a column list.
    pub fn new(fields: Vec<Field>) -> Self {
        Self {
            fields,
            primary: None,
            identity: None,
        }
    }

    /// Set the primary key column.
    pub fn primary(mut self, field: impl Into<Field>) -> Self {
        self.primary = Some(field.into());
        self
    }

    /// Set the identity column.
    pub fn identity(mut self, field: impl Into<Field>) -> Self {
        self.identity = Some(field.into());
        self
    }
}

/// Source of field metadata for a table name.
///
/// Implementations memoize on their own; the core calls this on every
/// dispatch that needs a default field set.
pub trait FieldSource: Send + Sync {
    /// Metadata for `table`, or `None` when the table is unknown.
    fn table_fields(&self, table: &str) -> Result<Option<TableFields>>;

    /// Ordered field list, failing when the table is unknown or empty.
    fn get_fields(&self, table: &str) -> Result<Vec<Field>> {
        match self.table_fields(table)? {
            Some(meta) if !meta.fields.is_empty() => Ok(meta.fields),
            _ => Err(Error::Metadata(MetadataError {
                kind: MetadataErrorKind::FieldsNotFound,
                target: table.to_string(),
                message: "no fields are known for this table".to_string(),
            })),
        }
    }

    /// Primary key column, failing when none is declared.
    fn get_primary(&self, table: &str) -> Result<Field> {
        self.table_fields(table)?
            .and_then(|meta| meta.primary)
            .ok_or_else(|| {
                Error::Metadata(MetadataError {
                    kind: MetadataErrorKind::PrimaryKeyNotFound,
                    target: table.to_string(),
                    message: "table has no primary key".to_string(),
                })
            })
    }
}

/// In-memory [`FieldSource`] populated by the host at startup.
#[derive(Debug, Default)]
pub struct StaticFieldSource {
    tables: RwLock<HashMap<String, TableFields>>,
}

impl StaticFieldSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) metadata for a table. Lookups ignore case.
    pub fn register(&self, table: &str, meta: TableFields) {
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        tables.insert(table.to_ascii_lowercase(), meta);
    }

    /// Builder-style registration.
    pub fn with_table(self, table: &str, meta: TableFields) -> Self {
        self.register(table, meta);
        self
    }
}

impl FieldSource for StaticFieldSource {
    fn table_fields(&self, table: &str) -> Result<Option<TableFields>> {
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        Ok(tables.get(&table.to_ascii_lowercase()).cloned())
    }
}
