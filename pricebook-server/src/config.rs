//! Server configuration from the environment

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use pricebook_lakehouse::{CatalogConfig, EventsConfig};
use tracing::info;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_STORE_PATH: &str = "./data/lakehouse";
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

/// Everything the binary needs, read once at startup
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub cors_origin: String,
    pub catalog: CatalogConfig,
    pub events: EventsConfig,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr = var_or("PRICEBOOK_BIND_ADDR", DEFAULT_BIND_ADDR);
        let bind_addr = bind_addr
            .parse()
            .with_context(|| format!("PRICEBOOK_BIND_ADDR is not a socket address: {bind_addr}"))?;

        let store_path = PathBuf::from(var_or("PRICEBOOK_STORE_PATH", DEFAULT_STORE_PATH));
        let catalog = CatalogConfig::from_env(store_path)?;

        Ok(Self {
            bind_addr,
            cors_origin: var_or("PRICEBOOK_CORS_ORIGIN", DEFAULT_CORS_ORIGIN),
            catalog,
            events: EventsConfig::from_env(),
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    })
}
