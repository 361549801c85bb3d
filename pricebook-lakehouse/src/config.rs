//! Configuration for the Pricebook catalog

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::warn;

use crate::error::{CatalogError, Result};

const DEV_JWT_SECRET: &str = "pricebook-default-secret-change-me";

/// Argon2 cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes
    pub iterations: u32,
    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for HashCost {
    /// OWASP baseline for Argon2id (19 MiB, 2 passes, 1 lane)
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// Catalog configuration
///
/// Loaded once at startup and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Root path for all Delta tables
    pub base_path: PathBuf,

    /// HMAC secret for token signing
    pub jwt_secret: String,

    /// Token validity window in hours
    pub token_ttl_hours: u32,

    /// Password hashing cost
    pub hash_cost: HashCost,

    /// Upper bound on one store round trip
    pub store_timeout: Duration,

    /// Upper bound on one event publish
    pub publish_timeout: Duration,

    /// Actor mailbox capacity
    pub mailbox_capacity: usize,
}

impl CatalogConfig {
    /// Create config with sensible defaults
    ///
    /// # Arguments
    /// * `base_path` - Root directory for Delta tables.
    ///   Structure created:
    ///   ```text
    ///   base_path/
    ///   ├── users/          (Delta table)
    ///   ├── items/          (Delta table)
    ///   └── id_sequences/   (Delta table, append-only)
    ///   ```
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_hours: 24,
            hash_cost: HashCost::default(),
            store_timeout: Duration::from_secs(10),
            publish_timeout: Duration::from_secs(5),
            mailbox_capacity: 256,
        }
    }

    /// Read overrides from `PRICEBOOK_JWT_SECRET` and `PRICEBOOK_TOKEN_TTL_HOURS`
    pub fn from_env(base_path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::new(base_path);

        match std::env::var("PRICEBOOK_JWT_SECRET") {
            Ok(secret) => config.jwt_secret = secret,
            Err(_) => warn!("PRICEBOOK_JWT_SECRET not set, using the development secret"),
        }

        if let Ok(raw) = std::env::var("PRICEBOOK_TOKEN_TTL_HOURS") {
            config.token_ttl_hours = raw.parse().map_err(|_| {
                CatalogError::Config(format!("PRICEBOOK_TOKEN_TTL_HOURS is not a number: {raw}"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Override JWT secret
    pub fn with_jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.jwt_secret = secret.into();
        self
    }

    /// Override token validity window
    pub fn with_token_ttl_hours(mut self, hours: u32) -> Self {
        self.token_ttl_hours = hours;
        self
    }

    /// Override password hashing cost
    pub fn with_hash_cost(mut self, cost: HashCost) -> Self {
        self.hash_cost = cost;
        self
    }

    /// Override store timeout
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Override publish timeout
    pub fn with_publish_timeout(mut self, timeout: Duration) -> Self {
        self.publish_timeout = timeout;
        self
    }

    /// Reject settings that cannot produce a working catalog
    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.is_empty() {
            return Err(CatalogError::Config("JWT secret must not be empty".into()));
        }
        if self.token_ttl_hours == 0 {
            return Err(CatalogError::Config("token TTL must be at least one hour".into()));
        }
        if self.mailbox_capacity == 0 {
            return Err(CatalogError::Config("mailbox capacity must be positive".into()));
        }
        Ok(())
    }

    /// Get path for a specific table
    pub fn table_path(&self, table_name: &str) -> PathBuf {
        self.base_path.join(table_name)
    }
}
