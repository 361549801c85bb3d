//! Item change notifications
//!
//! Publication is fire-and-forget from the caller's point of view: nothing
//! consumes the stream inside this crate. Backends implement [`EventSink`].

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::error::{CatalogError, Result};
use crate::items::ItemEvent;

mod channel;
#[cfg(feature = "nats")]
mod nats;

pub use channel::ChannelSink;
#[cfg(feature = "nats")]
pub use nats::NatsSink;

pub const DEFAULT_NATS_URL: &str = "nats://localhost:4222";
pub const DEFAULT_STREAM: &str = "items_stream";
pub const DEFAULT_SUBJECT: &str = "items";

/// Destination for item events
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Publish one event; `Ok` means the backend accepted it
    async fn publish(&self, event: &ItemEvent) -> Result<()>;

    /// Backend name for logs
    fn name(&self) -> &'static str;
}

/// Sink used when no event stream is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledSink;

#[async_trait]
impl EventSink for DisabledSink {
    async fn publish(&self, _event: &ItemEvent) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Where item events go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventsConfig {
    /// `None` disables publication
    pub url: Option<String>,
    pub stream: String,
    pub subject: String,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            url: Some(DEFAULT_NATS_URL.to_string()),
            stream: DEFAULT_STREAM.to_string(),
            subject: DEFAULT_SUBJECT.to_string(),
        }
    }
}

impl EventsConfig {
    pub fn disabled() -> Self {
        Self {
            url: None,
            ..Self::default()
        }
    }

    /// Read `NATS_URL`, `NATS_STREAM` and `NATS_SUBJECT`; an empty URL disables events
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("NATS_URL") {
            config.url = Some(url).filter(|u| !u.trim().is_empty());
        }
        if let Ok(stream) = std::env::var("NATS_STREAM") {
            config.stream = stream;
        }
        if let Ok(subject) = std::env::var("NATS_SUBJECT") {
            config.subject = subject;
        }
        config
    }

    /// Build the sink this config describes
    pub async fn connect(&self) -> Result<Arc<dyn EventSink>> {
        let Some(url) = &self.url else {
            warn!("No event stream configured, item events are dropped");
            return Ok(Arc::new(DisabledSink));
        };

        #[cfg(feature = "nats")]
        {
            let sink = NatsSink::connect(url, &self.stream, &self.subject).await?;
            tracing::info!(url = %url, stream = %self.stream, subject = %self.subject, "Event stream connected");
            Ok(Arc::new(sink))
        }

        #[cfg(not(feature = "nats"))]
        {
            Err(CatalogError::Config(format!(
                "event stream {url} configured but built without the `nats` feature"
            )))
        }
    }
}

pub(crate) fn publish_failed(sink: &str, err: impl std::fmt::Display) -> CatalogError {
    CatalogError::EventPublish(format!("{sink}: {err}"))
}
