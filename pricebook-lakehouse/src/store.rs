//! DeltaStore — Core storage layer built on delta-rs
//!
//! Provides ACID appends, typed-predicate updates and deletes, and DataFusion
//! reads. All operations return `Result<T, CatalogError>` (railway programming).
//!
//! Predicates are DataFusion [`Expr`] values built with `col`/`lit`, never SQL
//! text assembled from caller input.
//!
//! # Example
//!
//! ```rust,no_run
//! use deltalake::datafusion::prelude::{col, lit};
//! use pricebook_lakehouse::{schema, CatalogConfig, DeltaStore};
//!
//! #[tokio::main]
//! async fn main() -> pricebook_lakehouse::Result<()> {
//!     let store = DeltaStore::new(CatalogConfig::new("/data/pricebook")).await?;
//!
//!     // Every item priced under 10, cheapest first
//!     let batches = store
//!         .select(
//!             schema::TABLE_ITEMS,
//!             Some(col("price").lt(lit(10.0))),
//!             vec![col("price").sort(true, false)],
//!             None,
//!         )
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use deltalake::arrow::array::RecordBatch;
use deltalake::datafusion::catalog::TableProvider;
use deltalake::datafusion::dataframe::DataFrame;
use deltalake::datafusion::logical_expr::{Expr, SortExpr};
use deltalake::datafusion::prelude::SessionContext;
use deltalake::kernel::StructField;
use deltalake::protocol::SaveMode;
use deltalake::writer::{DeltaWriter, RecordBatchWriter};
use deltalake::{open_table, DeltaTable};
use tracing::{debug, info};
use url::Url;

use crate::config::CatalogConfig;
use crate::error::{CatalogError, Result};
use crate::schema;

/// Rows skipped and fetched by a windowed read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub skip: usize,
    pub fetch: usize,
}

/// Core Delta Lake store — manages all tables under a base path
///
/// Thread-safe: can be shared across tokio tasks via `Arc<DeltaStore>`.
pub struct DeltaStore {
    config: CatalogConfig,
}

impl DeltaStore {
    /// Create a new DeltaStore and initialize all tables
    ///
    /// Creates the directory structure and Delta tables if they don't exist:
    /// ```text
    /// {base_path}/
    /// ├── users/
    /// ├── items/
    /// └── id_sequences/
    /// ```
    pub async fn new(config: CatalogConfig) -> Result<Self> {
        let store = Self { config };
        store.init_all_tables().await?;
        info!(
            path = %store.config.base_path.display(),
            "Catalog store initialized"
        );
        Ok(store)
    }

    /// Convert a table name to a `Url` pointing at the table directory
    fn table_url(&self, name: &str) -> Result<Url> {
        let path = self.config.table_path(name);
        let absolute = if path.is_absolute() {
            path
        } else {
            std::env::current_dir()?.join(path)
        };
        Url::from_directory_path(&absolute).map_err(|_| {
            CatalogError::Config(format!("Invalid table path: {}", absolute.display()))
        })
    }

    /// Initialize all Delta tables (idempotent)
    async fn init_all_tables(&self) -> Result<()> {
        for table_def in schema::all_tables() {
            self.ensure_table(table_def.name, table_def.delta_fields)
                .await?;
        }
        Ok(())
    }

    /// Create a Delta table if it doesn't exist
    pub async fn ensure_table(&self, name: &str, fields: Vec<StructField>) -> Result<()> {
        let url = self.table_url(name)?;
        let path = self.config.table_path(name);

        match open_table(url.clone()).await {
            Ok(table) => {
                debug!(table = name, version = ?table.version(), "Table already exists");
                Ok(())
            }
            Err(_) => {
                std::fs::create_dir_all(&path)?;

                let table = DeltaTable::try_from_url(url).await?;
                table
                    .create()
                    .with_table_name(name)
                    .with_save_mode(SaveMode::Ignore)
                    .with_columns(fields)
                    .await?;

                info!(table = name, "Created Delta table");
                Ok(())
            }
        }
    }

    async fn open(&self, table_name: &str) -> Result<DeltaTable> {
        let url = self.table_url(table_name)?;
        Ok(open_table(url).await?)
    }

    /// Register the current version of a table as `t` in a fresh session
    async fn frame(&self, table_name: &str) -> Result<(SessionContext, DataFrame)> {
        let table = self.open(table_name).await?;
        let provider: Arc<dyn TableProvider> = Arc::new(table);

        let ctx = SessionContext::new();
        ctx.register_table("t", provider)?;
        let df = ctx.table("t").await?;
        Ok((ctx, df))
    }

    // ─── Write Operations ───

    /// Append records to a table (ACID transaction)
    ///
    /// Returns the new table version after the write.
    pub async fn append(&self, table_name: &str, batch: RecordBatch) -> Result<i64> {
        let mut table = self.open(table_name).await?;

        let mut writer = RecordBatchWriter::for_table(&table)?;
        writer.write(batch).await?;
        let version = writer.flush_and_commit(&mut table).await?;

        debug!(table = table_name, version, "Appended records");
        Ok(version as i64)
    }

    /// Set columns to new values on every row matching `predicate`
    ///
    /// Returns the number of rows rewritten.
    pub async fn update(
        &self,
        table_name: &str,
        predicate: Expr,
        assignments: Vec<(&str, Expr)>,
    ) -> Result<usize> {
        let table = self.open(table_name).await?;

        let mut builder = table.update().with_predicate(predicate);
        for (column, value) in assignments {
            builder = builder.with_update(column, value);
        }
        let (result_table, metrics) = builder.await?;

        debug!(
            table = table_name,
            updated = metrics.num_updated_rows,
            version = ?result_table.version(),
            "Updated records"
        );
        Ok(metrics.num_updated_rows)
    }

    /// Delete rows matching `predicate`
    ///
    /// Returns the number of rows removed.
    pub async fn delete(&self, table_name: &str, predicate: Expr) -> Result<usize> {
        let table = self.open(table_name).await?;

        let (result_table, metrics) = table.delete().with_predicate(predicate).await?;

        debug!(
            table = table_name,
            deleted = metrics.num_deleted_rows,
            version = ?result_table.version(),
            "Deleted records"
        );
        Ok(metrics.num_deleted_rows)
    }

    // ─── Read Operations ───

    /// Read all rows from a table (current version)
    pub async fn scan(&self, table_name: &str) -> Result<Vec<RecordBatch>> {
        self.select(table_name, None, Vec::new(), None).await
    }

    /// Filter, order and window a table
    ///
    /// Uses DataFusion for predicate pushdown and efficient scanning.
    pub async fn select(
        &self,
        table_name: &str,
        filter: Option<Expr>,
        order: Vec<SortExpr>,
        window: Option<Window>,
    ) -> Result<Vec<RecordBatch>> {
        let (_ctx, mut df) = self.frame(table_name).await?;

        if let Some(predicate) = filter {
            df = df.filter(predicate)?;
        }
        if !order.is_empty() {
            df = df.sort(order)?;
        }
        if let Some(Window { skip, fetch }) = window {
            df = df.limit(skip, Some(fetch))?;
        }

        let batches = df.collect().await?;
        debug!(table = table_name, batches = batches.len(), "Select executed");
        Ok(batches)
    }

    /// Full SQL query over the table registered as `t`
    ///
    /// Only for statements fixed at compile time; caller input belongs in
    /// [`DeltaStore::select`] predicates.
    pub async fn sql(&self, table_name: &str, full_sql: &'static str) -> Result<Vec<RecordBatch>> {
        let (ctx, _) = self.frame(table_name).await?;
        let batches = ctx.sql(full_sql).await?.collect().await?;
        Ok(batches)
    }

    /// Get the current version of a table
    pub async fn version(&self, table_name: &str) -> Result<i64> {
        let table = self.open(table_name).await?;
        Ok(table.version().unwrap_or(0))
    }

    /// Get a reference to the config
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }
}

/// Total row count across batches
pub fn row_count(batches: &[RecordBatch]) -> usize {
    batches.iter().map(|b| b.num_rows()).sum()
}
