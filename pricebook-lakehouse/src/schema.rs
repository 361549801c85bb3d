//! Arrow schema definitions for all catalog Delta tables
//!
//! Each table has:
//! - An Arrow `Schema` for RecordBatch construction
//! - A list of Delta `StructField`s for table creation
//!
//! Delta has no unsigned integer type, so ids are `Long` on disk and `u64`
//! everywhere else. Conversion happens in the row codecs.

use std::sync::Arc;

use deltalake::arrow::array::{Array, Float64Array, Int64Array, RecordBatch, StringArray};
use deltalake::arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use deltalake::kernel::{DataType as DeltaDataType, PrimitiveType, StructField};

use crate::error::{CatalogError, Result};

// ─── Table Names (constants) ───

pub const TABLE_USERS: &str = "users";
pub const TABLE_ITEMS: &str = "items";
pub const TABLE_ID_SEQUENCES: &str = "id_sequences";

// ─── Users Table ───

/// Arrow schema for the `users` Delta table
pub fn users_arrow_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("username", DataType::Utf8, false),
        Field::new("password_hash", DataType::Utf8, false),
        Field::new("role", DataType::Utf8, false),
        Field::new("created_at", DataType::Utf8, false),
    ]))
}

/// Delta StructFields for `users` table creation
pub fn users_delta_fields() -> Vec<StructField> {
    vec![
        StructField::new("id", DeltaDataType::Primitive(PrimitiveType::Long), false),
        StructField::new("username", DeltaDataType::Primitive(PrimitiveType::String), false),
        StructField::new("password_hash", DeltaDataType::Primitive(PrimitiveType::String), false),
        StructField::new("role", DeltaDataType::Primitive(PrimitiveType::String), false),
        StructField::new("created_at", DeltaDataType::Primitive(PrimitiveType::String), false),
    ]
}

// ─── Items Table ───

/// Arrow schema for the `items` Delta table
pub fn items_arrow_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("name", DataType::Utf8, false),
        Field::new("price", DataType::Float64, false),
    ]))
}

/// Delta StructFields for `items` table creation
pub fn items_delta_fields() -> Vec<StructField> {
    vec![
        StructField::new("id", DeltaDataType::Primitive(PrimitiveType::Long), false),
        StructField::new("name", DeltaDataType::Primitive(PrimitiveType::String), false),
        StructField::new("price", DeltaDataType::Primitive(PrimitiveType::Double), false),
    ]
}

// ─── Id Sequences Table ───

/// Arrow schema for `id_sequences` (append-only high-water marks)
pub fn id_sequences_arrow_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("entity", DataType::Utf8, false),
        Field::new("last_id", DataType::Int64, false),
        Field::new("allocated_at", DataType::Utf8, false),
    ]))
}

/// Delta StructFields for `id_sequences` table creation
pub fn id_sequences_delta_fields() -> Vec<StructField> {
    vec![
        StructField::new("entity", DeltaDataType::Primitive(PrimitiveType::String), false),
        StructField::new("last_id", DeltaDataType::Primitive(PrimitiveType::Long), false),
        StructField::new("allocated_at", DeltaDataType::Primitive(PrimitiveType::String), false),
    ]
}

/// Table definition bundle for `DeltaStore::ensure_table`
pub struct TableDefinition {
    pub name: &'static str,
    pub delta_fields: Vec<StructField>,
}

/// Get all table definitions for catalog initialization
pub fn all_tables() -> Vec<TableDefinition> {
    vec![
        TableDefinition {
            name: TABLE_USERS,
            delta_fields: users_delta_fields(),
        },
        TableDefinition {
            name: TABLE_ITEMS,
            delta_fields: items_delta_fields(),
        },
        TableDefinition {
            name: TABLE_ID_SEQUENCES,
            delta_fields: id_sequences_delta_fields(),
        },
    ]
}

// ─── Column access ───

/// Typed read access to one batch of a named table
pub(crate) struct Columns<'a> {
    table: &'static str,
    batch: &'a RecordBatch,
}

impl<'a> Columns<'a> {
    pub(crate) fn new(table: &'static str, batch: &'a RecordBatch) -> Self {
        Self { table, batch }
    }

    fn column<T: Array + 'static>(&self, name: &str) -> Result<&'a T> {
        self.batch
            .column_by_name(name)
            .and_then(|c| c.as_any().downcast_ref::<T>())
            .ok_or_else(|| CatalogError::CorruptRow {
                table: self.table,
                detail: format!("missing or mistyped column `{name}`"),
            })
    }

    pub(crate) fn string(&self, name: &str) -> Result<&'a StringArray> {
        self.column::<StringArray>(name)
    }

    pub(crate) fn float(&self, name: &str) -> Result<&'a Float64Array> {
        self.column::<Float64Array>(name)
    }

    pub(crate) fn long(&self, name: &str) -> Result<&'a Int64Array> {
        self.column::<Int64Array>(name)
    }

    /// Read a `Long` id column as `u64`
    pub(crate) fn id(&self, name: &str, row: usize) -> Result<u64> {
        let raw = self.long(name)?.value(row);
        id_from_long(raw).ok_or_else(|| CatalogError::CorruptRow {
            table: self.table,
            detail: format!("negative id {raw}"),
        })
    }
}

/// Convert a stored `Long` to an id
pub(crate) fn id_from_long(raw: i64) -> Option<u64> {
    u64::try_from(raw).ok()
}

/// Convert an id to its stored `Long` form
pub(crate) fn id_to_long(id: u64) -> Result<i64> {
    i64::try_from(id).map_err(|_| CatalogError::Validation(format!("id {id} is out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arrow_and_delta_fields_agree() {
        let pairs = [
            (users_arrow_schema(), users_delta_fields()),
            (items_arrow_schema(), items_delta_fields()),
            (id_sequences_arrow_schema(), id_sequences_delta_fields()),
        ];
        for (arrow, delta) in pairs {
            let arrow_names: Vec<_> = arrow.fields().iter().map(|f| f.name().clone()).collect();
            let delta_names: Vec<_> = delta.iter().map(|f| f.name().to_string()).collect();
            assert_eq!(arrow_names, delta_names);
        }
    }

    #[test]
    fn test_id_conversion_bounds() {
        assert_eq!(id_from_long(7), Some(7));
        assert_eq!(id_from_long(-1), None);
        assert!(id_to_long(u64::MAX).is_err());
        assert_eq!(id_to_long(42).unwrap(), 42);
    }
}
