//! Monotonic id allocation backed by the append-only `id_sequences` table
//!
//! An [`IdSequence`] is owned by exactly one actor, so `next` takes
//! `&mut self` and allocation cannot interleave within the process. The
//! high-water mark is committed before the id is handed out: a caller whose
//! insert later fails leaves a gap, never a duplicate.

use std::sync::Arc;

use chrono::Utc;
use deltalake::arrow::array::{Array, ArrayRef, Int64Array, RecordBatch, StringArray};
use tracing::{debug, info};

use crate::error::{CatalogError, Result};
use crate::schema::{self, id_from_long, id_to_long};
use crate::store::DeltaStore;

/// Entities with their own id space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Users,
    Items,
}

impl Entity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Items => "items",
        }
    }

    fn high_water_sql(self) -> &'static str {
        match self {
            Self::Users => "SELECT MAX(last_id) AS last_id FROM t WHERE entity = 'users'",
            Self::Items => "SELECT MAX(last_id) AS last_id FROM t WHERE entity = 'items'",
        }
    }
}

/// Serialized id allocator for one entity
pub struct IdSequence {
    entity: Entity,
    last: u64,
    store: Arc<DeltaStore>,
}

impl IdSequence {
    /// Recover the high-water mark for `entity`
    pub async fn load(store: Arc<DeltaStore>, entity: Entity) -> Result<Self> {
        let batches = store
            .sql(schema::TABLE_ID_SEQUENCES, entity.high_water_sql())
            .await?;

        let mut last = 0;
        for batch in &batches {
            let Some(column) = batch.column_by_name("last_id") else {
                continue;
            };
            let values = column.as_any().downcast_ref::<Int64Array>().ok_or_else(|| {
                CatalogError::CorruptRow {
                    table: schema::TABLE_ID_SEQUENCES,
                    detail: "last_id is not a Long".into(),
                }
            })?;
            for i in 0..values.len() {
                if values.is_null(i) {
                    continue;
                }
                let raw = values.value(i);
                let id = id_from_long(raw).ok_or_else(|| CatalogError::CorruptRow {
                    table: schema::TABLE_ID_SEQUENCES,
                    detail: format!("negative last_id {raw}"),
                })?;
                last = last.max(id);
            }
        }

        info!(entity = entity.as_str(), last_id = last, "Id sequence loaded");
        Ok(Self { entity, last, store })
    }

    /// Last id handed out (0 when none yet)
    pub fn last(&self) -> u64 {
        self.last
    }

    /// Commit and return the next id
    pub async fn next(&mut self) -> Result<u64> {
        let candidate = self
            .last
            .checked_add(1)
            .ok_or_else(|| CatalogError::Internal(format!("{} id space exhausted", self.entity.as_str())))?;

        let now = Utc::now().to_rfc3339();
        let batch = RecordBatch::try_new(
            schema::id_sequences_arrow_schema(),
            vec![
                Arc::new(StringArray::from(vec![self.entity.as_str()])) as ArrayRef,
                Arc::new(Int64Array::from(vec![id_to_long(candidate)?])),
                Arc::new(StringArray::from(vec![now.as_str()])),
            ],
        )?;

        self.store.append(schema::TABLE_ID_SEQUENCES, batch).await?;
        self.last = candidate;

        debug!(entity = self.entity.as_str(), id = candidate, "Id allocated");
        Ok(candidate)
    }
}
