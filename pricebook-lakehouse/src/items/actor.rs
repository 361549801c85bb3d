//! ItemActor — Tokio actor owning the `items` table
//!
//! Mutations go through one mailbox, so id allocation and the following
//! insert are never interleaved with another create.

use std::sync::Arc;
use std::time::Duration;

use deltalake::arrow::array::{ArrayRef, Float64Array, Int64Array, RecordBatch, StringArray};
use deltalake::datafusion::logical_expr::{Expr, SortExpr};
use deltalake::datafusion::prelude::{col, lit};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::error::{CatalogError, Result};
use crate::schema::{self, id_to_long, Columns};
use crate::sequence::{Entity, IdSequence};
use crate::store::{row_count, DeltaStore, Window};

use super::search::{SearchPage, SearchQuery};
use super::types::{Item, ItemFields};

// ─── Actor Messages ───

enum ItemMsg {
    Create {
        fields: ItemFields,
        reply: oneshot::Sender<Result<Item>>,
    },
    Get {
        id: u64,
        reply: oneshot::Sender<Result<Item>>,
    },
    List {
        reply: oneshot::Sender<Result<Vec<Item>>>,
    },
    Search {
        query: SearchQuery,
        reply: oneshot::Sender<Result<SearchPage>>,
    },
    Update {
        id: u64,
        fields: ItemFields,
        reply: oneshot::Sender<Result<Item>>,
    },
    Delete {
        id: u64,
        reply: oneshot::Sender<Result<Item>>,
    },
}

// ─── Actor ───

pub struct ItemActor {
    store: Arc<DeltaStore>,
    ids: IdSequence,
    rx: mpsc::Receiver<ItemMsg>,
}

impl ItemActor {
    pub async fn spawn(store: Arc<DeltaStore>) -> Result<ItemHandle> {
        let config = store.config().clone();
        let ids = IdSequence::load(store.clone(), Entity::Items).await?;

        let (tx, rx) = mpsc::channel(config.mailbox_capacity);
        let actor = Self { store, ids, rx };

        tokio::spawn(actor.run());
        info!("ItemActor spawned");
        Ok(ItemHandle {
            tx,
            timeout: config.store_timeout,
        })
    }

    async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            match msg {
                ItemMsg::Create { fields, reply } => {
                    let _ = reply.send(self.handle_create(fields).await);
                }
                ItemMsg::Get { id, reply } => {
                    let _ = reply.send(self.handle_get(id).await);
                }
                ItemMsg::List { reply } => {
                    let _ = reply.send(self.handle_list().await);
                }
                ItemMsg::Search { query, reply } => {
                    let _ = reply.send(self.handle_search(query).await);
                }
                ItemMsg::Update { id, fields, reply } => {
                    let _ = reply.send(self.handle_update(id, fields).await);
                }
                ItemMsg::Delete { id, reply } => {
                    let _ = reply.send(self.handle_delete(id).await);
                }
            }
        }
        info!("ItemActor stopped");
    }

    // ─── Handler Implementations ───

    async fn handle_create(&mut self, fields: ItemFields) -> Result<Item> {
        let id = self.ids.next().await?;
        let item = fields.into_item(id);

        let batch = RecordBatch::try_new(
            schema::items_arrow_schema(),
            vec![
                Arc::new(Int64Array::from(vec![id_to_long(id)?])) as ArrayRef,
                Arc::new(StringArray::from(vec![item.name.as_str()])),
                Arc::new(Float64Array::from(vec![item.price])),
            ],
        )?;
        self.store.append(schema::TABLE_ITEMS, batch).await?;

        info!(item_id = id, name = %item.name, price = item.price, "Item created");
        Ok(item)
    }

    async fn handle_get(&self, id: u64) -> Result<Item> {
        self.query(Some(by_id(id)?), Vec::new(), None)
            .await?
            .into_iter()
            .next()
            .ok_or(CatalogError::ItemNotFound(id))
    }

    async fn handle_list(&self) -> Result<Vec<Item>> {
        self.query(None, vec![col("id").sort(true, false)], None).await
    }

    async fn handle_search(&self, query: SearchQuery) -> Result<SearchPage> {
        let items = self
            .query(Some(query.predicate()), query.ordering(), Some(query.window()?))
            .await?;
        debug!(found = items.len(), page = query.page, "Item search");
        Ok(SearchPage {
            items,
            page: query.page,
            limit: query.limit,
        })
    }

    async fn handle_update(&self, id: u64, fields: ItemFields) -> Result<Item> {
        let updated = self
            .store
            .update(
                schema::TABLE_ITEMS,
                by_id(id)?,
                vec![
                    ("name", lit(fields.name.clone())),
                    ("price", lit(fields.price)),
                ],
            )
            .await?;
        if updated == 0 {
            return Err(CatalogError::ItemNotFound(id));
        }

        info!(item_id = id, "Item updated");
        Ok(fields.into_item(id))
    }

    async fn handle_delete(&self, id: u64) -> Result<Item> {
        let item = self.handle_get(id).await?;
        let deleted = self.store.delete(schema::TABLE_ITEMS, by_id(id)?).await?;
        if deleted == 0 {
            return Err(CatalogError::ItemNotFound(id));
        }

        info!(item_id = id, "Item deleted");
        Ok(item)
    }

    // ─── Helpers ───

    async fn query(
        &self,
        filter: Option<Expr>,
        order: Vec<SortExpr>,
        window: Option<Window>,
    ) -> Result<Vec<Item>> {
        let batches = self
            .store
            .select(schema::TABLE_ITEMS, filter, order, window)
            .await?;
        let mut items = Vec::with_capacity(row_count(&batches));
        for batch in &batches {
            items.extend(items_from_batch(batch)?);
        }
        Ok(items)
    }
}

fn by_id(id: u64) -> Result<Expr> {
    Ok(col("id").eq(lit(id_to_long(id)?)))
}

fn items_from_batch(batch: &RecordBatch) -> Result<Vec<Item>> {
    let cols = Columns::new(schema::TABLE_ITEMS, batch);
    let name = cols.string("name")?;
    let price = cols.float("price")?;

    (0..batch.num_rows())
        .map(|i| {
            Ok(Item {
                id: cols.id("id", i)?,
                name: name.value(i).to_string(),
                price: price.value(i),
            })
        })
        .collect()
}

// ─── Handle ───

/// Cloneable client of the ItemActor; every call is bounded by the store timeout
#[derive(Clone)]
pub struct ItemHandle {
    tx: mpsc::Sender<ItemMsg>,
    timeout: Duration,
}

impl ItemHandle {
    async fn call<T>(
        &self,
        operation: &'static str,
        build: impl FnOnce(oneshot::Sender<Result<T>>) -> ItemMsg,
    ) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        let msg = build(reply);
        let round_trip = async {
            self.tx
                .send(msg)
                .await
                .map_err(|_| CatalogError::ActorUnavailable("ItemActor".into()))?;
            rx.await
                .map_err(|_| CatalogError::ActorUnavailable("ItemActor dropped".into()))?
        };
        tokio::time::timeout(self.timeout, round_trip)
            .await
            .map_err(|_| CatalogError::Timeout { operation })?
    }

    pub async fn create(&self, fields: ItemFields) -> Result<Item> {
        fields.validate()?;
        self.call("item insert", |reply| ItemMsg::Create { fields, reply })
            .await
    }

    pub async fn get(&self, id: u64) -> Result<Item> {
        self.call("item lookup", |reply| ItemMsg::Get { id, reply }).await
    }

    /// All items in ascending id order
    pub async fn list(&self) -> Result<Vec<Item>> {
        self.call("item list", |reply| ItemMsg::List { reply }).await
    }

    pub async fn search(&self, query: SearchQuery) -> Result<SearchPage> {
        self.call("item search", |reply| ItemMsg::Search { query, reply })
            .await
    }

    pub async fn update(&self, id: u64, fields: ItemFields) -> Result<Item> {
        fields.validate()?;
        self.call("item update", |reply| ItemMsg::Update { id, fields, reply })
            .await
    }

    /// Remove an item, returning it as it was before removal
    pub async fn delete(&self, id: u64) -> Result<Item> {
        self.call("item delete", |reply| ItemMsg::Delete { id, reply })
            .await
    }
}
