//! Item Service: store mutation first, then the change event
//!
//! A mutation that committed is never rolled back. If the event cannot be
//! published afterwards the call still fails with `EventPublish`, even though
//! the durable state has changed; callers retrying a create will get a
//! second item.

use std::sync::Arc;
use std::time::Duration;

use tracing::error;

use crate::error::{CatalogError, Result};
use crate::events::EventSink;

use super::actor::ItemHandle;
use super::search::{SearchPage, SearchQuery};
use super::types::{Item, ItemAction, ItemEvent, ItemFields};

#[derive(Clone)]
pub struct ItemService {
    items: ItemHandle,
    events: Arc<dyn EventSink>,
    publish_timeout: Duration,
}

impl ItemService {
    pub fn new(items: ItemHandle, events: Arc<dyn EventSink>, publish_timeout: Duration) -> Self {
        Self {
            items,
            events,
            publish_timeout,
        }
    }

    pub async fn create(&self, fields: ItemFields) -> Result<Item> {
        let item = self.items.create(fields).await?;
        self.announce(ItemAction::Created, &item).await?;
        Ok(item)
    }

    pub async fn get(&self, id: u64) -> Result<Item> {
        self.items.get(id).await
    }

    pub async fn list(&self) -> Result<Vec<Item>> {
        self.items.list().await
    }

    pub async fn search(&self, query: SearchQuery) -> Result<SearchPage> {
        self.items.search(query).await
    }

    pub async fn update(&self, id: u64, fields: ItemFields) -> Result<Item> {
        let item = self.items.update(id, fields).await?;
        self.announce(ItemAction::Updated, &item).await?;
        Ok(item)
    }

    pub async fn delete(&self, id: u64) -> Result<Item> {
        let item = self.items.delete(id).await?;
        self.announce(ItemAction::Deleted, &item).await?;
        Ok(item)
    }

    async fn announce(&self, action: ItemAction, item: &Item) -> Result<()> {
        let event = ItemEvent::new(action, item.clone());
        let outcome = tokio::time::timeout(self.publish_timeout, self.events.publish(&event))
            .await
            .unwrap_or(Err(CatalogError::Timeout {
                operation: "event publish",
            }));

        if let Err(err) = &outcome {
            error!(
                sink = self.events.name(),
                %action,
                item_id = item.id,
                error = %err,
                "Item event not published; store change stands"
            );
        }
        outcome
    }
}
