//! In-process sink backed by a Tokio mpsc channel

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::items::ItemEvent;

use super::{publish_failed, EventSink};

/// Forwards events to a receiver in the same process
///
/// Publishing fails once the receiver is dropped.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<ItemEvent>,
}

impl ChannelSink {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<ItemEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn publish(&self, event: &ItemEvent) -> Result<()> {
        self.tx
            .send(event.clone())
            .await
            .map_err(|_| publish_failed(self.name(), "receiver closed"))
    }

    fn name(&self) -> &'static str {
        "channel"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;
    use crate::items::{Item, ItemAction};

    fn event() -> ItemEvent {
        ItemEvent::new(
            ItemAction::Updated,
            Item {
                id: 4,
                name: "Lamp".into(),
                price: 30.0,
            },
        )
    }

    #[tokio::test]
    async fn test_delivers_in_order() {
        let (sink, mut rx) = ChannelSink::new(4);
        sink.publish(&event()).await.unwrap();
        let mut second = event();
        second.action = ItemAction::Deleted;
        sink.publish(&second).await.unwrap();

        assert_eq!(rx.recv().await.unwrap().action, ItemAction::Updated);
        assert_eq!(rx.recv().await.unwrap().action, ItemAction::Deleted);
    }

    #[tokio::test]
    async fn test_closed_receiver_is_publish_error() {
        let (sink, rx) = ChannelSink::new(1);
        drop(rx);
        let err = sink.publish(&event()).await.unwrap_err();
        assert!(matches!(err, CatalogError::EventPublish(_)));
    }
}
