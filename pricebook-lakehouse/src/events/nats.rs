//! NATS JetStream sink

use async_nats::jetstream::{self, stream};
use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::error::Result;
use crate::items::ItemEvent;

use super::{publish_failed, EventSink};

/// Publishes JSON events to one subject of a file-backed JetStream stream
pub struct NatsSink {
    jetstream: jetstream::Context,
    subject: String,
}

impl NatsSink {
    /// Connect and make sure `stream` exists and captures `subject`
    pub async fn connect(url: &str, stream_name: &str, subject: &str) -> Result<Self> {
        let client = async_nats::connect(url)
            .await
            .map_err(|e| publish_failed("nats connect", e))?;
        let jetstream = jetstream::new(client);

        jetstream
            .get_or_create_stream(stream::Config {
                name: stream_name.to_string(),
                subjects: vec![subject.to_string()],
                storage: stream::StorageType::File,
                ..Default::default()
            })
            .await
            .map_err(|e| publish_failed("nats stream", e))?;

        Ok(Self {
            jetstream,
            subject: subject.to_string(),
        })
    }
}

#[async_trait]
impl EventSink for NatsSink {
    async fn publish(&self, event: &ItemEvent) -> Result<()> {
        let payload = Bytes::from(event.to_json()?);

        let ack = self
            .jetstream
            .publish(self.subject.clone(), payload)
            .await
            .map_err(|e| publish_failed(self.name(), e))?;
        ack.await.map_err(|e| publish_failed(self.name(), e))?;

        debug!(subject = %self.subject, action = %event.action, item_id = event.item.id, "Item event published");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "nats"
    }
}
