//! # Pricebook Lakehouse
//!
//! Catalog core for Pricebook: users and priced items stored in Delta Lake
//! tables via [delta-rs](https://github.com/delta-io/delta-rs), Argon2id
//! password hashing, HS256 bearer tokens, a role gate and item change events.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────┐
//! │           pricebook-lakehouse             │
//! ├──────────────┬──────────────┬─────────────┤
//! │  AuthActor   │  ItemService │ AccessGate  │
//! │  (users,     │  ItemActor → │ (token →    │
//! │   hashing)   │  EventSink   │  role check)│
//! ├──────────────┴──────────────┴─────────────┤
//! │      DeltaStore  +  IdSequence            │
//! │  (ACID writes, typed-predicate queries)   │
//! ├───────────────────────────────────────────┤
//! │          Delta Lake (delta-rs)            │
//! └───────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pricebook_lakehouse::{Catalog, CatalogConfig, EventsConfig, ItemFields, Role};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CatalogConfig::new("/data/pricebook").with_jwt_secret("s3cret");
//!     let catalog = Catalog::open(config, &EventsConfig::disabled()).await?;
//!
//!     let (_admin, token) = catalog
//!         .auth
//!         .register("root".into(), "hunter2".into(), Role::Admin)
//!         .await?;
//!     let principal = catalog.gate.authenticate(Some(&format!("Bearer {token}")))?;
//!     assert!(principal.role.is_admin());
//!
//!     let item = catalog.items.create(ItemFields::new("Widget", 9.99)).await?;
//!     assert_eq!(item.id, 1);
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

pub mod auth;
pub mod config;
pub mod error;
pub mod events;
pub mod items;
pub mod schema;
pub mod sequence;
pub mod store;

// Re-exports for convenience
pub use auth::{AccessGate, AuthActor, AuthHandle, Operation, Principal, Role, TokenIssuer, UserRecord};
pub use config::{CatalogConfig, HashCost};
pub use error::{AuthFailure, CatalogError, Result};
pub use events::{ChannelSink, DisabledSink, EventSink, EventsConfig};
pub use items::{Item, ItemAction, ItemEvent, ItemFields, ItemService, SearchPage, SearchParams, SearchQuery};
pub use store::DeltaStore;

#[cfg(feature = "nats")]
pub use events::NatsSink;

/// Every catalog component wired to one store
#[derive(Clone)]
pub struct Catalog {
    pub auth: AuthHandle,
    pub items: ItemService,
    pub gate: AccessGate,
}

impl Catalog {
    /// Open the store and start both actors, publishing to the configured stream
    pub async fn open(config: CatalogConfig, events: &EventsConfig) -> Result<Self> {
        let sink = events.connect().await?;
        Self::open_with_sink(config, sink).await
    }

    /// Same as [`Catalog::open`] with an already-built sink
    pub async fn open_with_sink(config: CatalogConfig, sink: Arc<dyn EventSink>) -> Result<Self> {
        config.validate()?;
        let issuer = Arc::new(TokenIssuer::new(
            config.jwt_secret.as_bytes(),
            config.token_ttl_hours,
        ));
        let publish_timeout = config.publish_timeout;
        let store = Arc::new(DeltaStore::new(config).await?);

        let auth = AuthActor::spawn_with_store(store.clone(), issuer.clone()).await?;
        let items = items::ItemActor::spawn(store).await?;

        Ok(Self {
            auth,
            items: ItemService::new(items, sink, publish_timeout),
            gate: AccessGate::new(issuer),
        })
    }
}
