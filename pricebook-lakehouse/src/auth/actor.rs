//! AuthActor — Tokio actor owning the `users` table
//!
//! Writes are processed sequentially via an mpsc channel, so the username
//! uniqueness check, id allocation and insert form one step. Password
//! hashing and verification run in the calling task on the blocking pool,
//! keeping the actor free for other requests.
//!
//! # Usage
//!
//! ```rust,no_run
//! use pricebook_lakehouse::auth::{AuthActor, Role};
//! use pricebook_lakehouse::CatalogConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CatalogConfig::new("/data/pricebook")
//!         .with_jwt_secret("my-production-secret");
//!
//!     let handle = AuthActor::spawn(config).await?;
//!
//!     // Register → user + token
//!     let (user, _token) = handle
//!         .register("alice".into(), "SecureP@ss1".into(), Role::Admin)
//!         .await?;
//!
//!     // Login → token
//!     let (token, _) = handle.login("alice".into(), "SecureP@ss1".into()).await?;
//!     assert!(!token.is_empty());
//!     assert_eq!(user.role, Role::Admin);
//!
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use deltalake::arrow::array::{ArrayRef, Int64Array, RecordBatch, StringArray};
use deltalake::datafusion::logical_expr::Expr;
use deltalake::datafusion::prelude::{col, lit};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::config::CatalogConfig;
use crate::error::{CatalogError, Result};
use crate::schema::{self, id_to_long, Columns};
use crate::sequence::{Entity, IdSequence};
use crate::store::DeltaStore;

use super::password::CredentialHasher;
use super::token::TokenIssuer;
use super::types::{Role, UserRecord};

const MAX_USERNAME_CHARS: usize = 64;
const MAX_PASSWORD_BYTES: usize = 1024;

// ─── Actor Messages ───

enum AuthMsg {
    Insert {
        username: String,
        password_hash: String,
        role: Role,
        reply: oneshot::Sender<Result<UserRecord>>,
    },
    FindByUsername {
        username: String,
        reply: oneshot::Sender<Result<Option<UserRecord>>>,
    },
    GetUser {
        user_id: u64,
        reply: oneshot::Sender<Result<UserRecord>>,
    },
    DeleteUser {
        user_id: u64,
        reply: oneshot::Sender<Result<()>>,
    },
}

// ─── Actor ───

/// Authentication actor; serializes all access to the `users` table
pub struct AuthActor {
    store: Arc<DeltaStore>,
    ids: IdSequence,
    rx: mpsc::Receiver<AuthMsg>,
}

impl AuthActor {
    /// Open the store under `config` and spawn the actor on it
    pub async fn spawn(config: CatalogConfig) -> Result<AuthHandle> {
        config.validate()?;
        let issuer = Arc::new(TokenIssuer::new(
            config.jwt_secret.as_bytes(),
            config.token_ttl_hours,
        ));
        let store = Arc::new(DeltaStore::new(config).await?);
        Self::spawn_with_store(store, issuer).await
    }

    /// Spawn with an existing DeltaStore (for sharing with the item actor)
    pub async fn spawn_with_store(
        store: Arc<DeltaStore>,
        issuer: Arc<TokenIssuer>,
    ) -> Result<AuthHandle> {
        let config = store.config().clone();
        let hasher = CredentialHasher::new(config.hash_cost)?;
        let ids = IdSequence::load(store.clone(), Entity::Users).await?;

        let (tx, rx) = mpsc::channel(config.mailbox_capacity);
        let actor = Self { store, ids, rx };

        tokio::spawn(actor.run());
        info!("AuthActor spawned");
        Ok(AuthHandle {
            tx,
            hasher,
            issuer,
            timeout: config.store_timeout,
        })
    }

    /// Main event loop
    async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            match msg {
                AuthMsg::Insert { username, password_hash, role, reply } => {
                    let _ = reply.send(self.handle_insert(username, password_hash, role).await);
                }
                AuthMsg::FindByUsername { username, reply } => {
                    let _ = reply.send(self.handle_find_by_username(&username).await);
                }
                AuthMsg::GetUser { user_id, reply } => {
                    let _ = reply.send(self.handle_get_user(user_id).await);
                }
                AuthMsg::DeleteUser { user_id, reply } => {
                    let _ = reply.send(self.handle_delete_user(user_id).await);
                }
            }
        }
        info!("AuthActor stopped");
    }

    // ─── Handler Implementations ───

    async fn handle_insert(
        &mut self,
        username: String,
        password_hash: String,
        role: Role,
    ) -> Result<UserRecord> {
        if self.handle_find_by_username(&username).await?.is_some() {
            return Err(CatalogError::UserAlreadyExists(username));
        }

        let id = self.ids.next().await?;
        let now = Utc::now().to_rfc3339();

        let batch = RecordBatch::try_new(
            schema::users_arrow_schema(),
            vec![
                Arc::new(Int64Array::from(vec![id_to_long(id)?])) as ArrayRef,
                Arc::new(StringArray::from(vec![username.as_str()])),
                Arc::new(StringArray::from(vec![password_hash.as_str()])),
                Arc::new(StringArray::from(vec![role.as_str()])),
                Arc::new(StringArray::from(vec![now.as_str()])),
            ],
        )?;

        self.store.append(schema::TABLE_USERS, batch).await?;
        info!(user_id = id, username = %username, role = %role, "User registered");

        Ok(UserRecord {
            id,
            username,
            password_hash,
            role,
            created_at: now,
        })
    }

    async fn handle_find_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        let users = self
            .query_users(col("username").eq(lit(username.to_string())))
            .await?;
        Ok(users.into_iter().next())
    }

    async fn handle_get_user(&self, user_id: u64) -> Result<UserRecord> {
        let users = self.query_users(col("id").eq(lit(id_to_long(user_id)?))).await?;
        users
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::UserNotFound(user_id.to_string()))
    }

    async fn handle_delete_user(&self, user_id: u64) -> Result<()> {
        let deleted = self
            .store
            .delete(schema::TABLE_USERS, col("id").eq(lit(id_to_long(user_id)?)))
            .await?;
        if deleted == 0 {
            return Err(CatalogError::UserNotFound(user_id.to_string()));
        }
        info!(user_id, "User deleted");
        Ok(())
    }

    // ─── Helpers ───

    async fn query_users(&self, predicate: Expr) -> Result<Vec<UserRecord>> {
        let batches = self
            .store
            .select(schema::TABLE_USERS, Some(predicate), Vec::new(), None)
            .await?;
        let mut users = Vec::new();
        for batch in &batches {
            users.extend(users_from_batch(batch)?);
        }
        Ok(users)
    }
}

fn users_from_batch(batch: &RecordBatch) -> Result<Vec<UserRecord>> {
    let cols = Columns::new(schema::TABLE_USERS, batch);
    let username = cols.string("username")?;
    let password_hash = cols.string("password_hash")?;
    let role = cols.string("role")?;
    let created_at = cols.string("created_at")?;

    (0..batch.num_rows())
        .map(|i| {
            Ok(UserRecord {
                id: cols.id("id", i)?,
                username: username.value(i).to_string(),
                password_hash: password_hash.value(i).to_string(),
                role: Role::parse(role.value(i)),
                created_at: created_at.value(i).to_string(),
            })
        })
        .collect()
}

// ─── Handle (client-facing API) ───

/// Thread-safe handle to communicate with the AuthActor
#[derive(Clone)]
pub struct AuthHandle {
    tx: mpsc::Sender<AuthMsg>,
    hasher: CredentialHasher,
    issuer: Arc<TokenIssuer>,
    timeout: Duration,
}

impl AuthHandle {
    /// Send one request and wait for the reply, bounded by the store timeout
    async fn call<T>(
        &self,
        operation: &'static str,
        build: impl FnOnce(oneshot::Sender<Result<T>>) -> AuthMsg,
    ) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        let msg = build(reply);
        let round_trip = async {
            self.tx
                .send(msg)
                .await
                .map_err(|_| CatalogError::ActorUnavailable("AuthActor".into()))?;
            rx.await
                .map_err(|_| CatalogError::ActorUnavailable("AuthActor dropped".into()))?
        };
        tokio::time::timeout(self.timeout, round_trip)
            .await
            .map_err(|_| CatalogError::Timeout { operation })?
    }

    /// The issuer tokens are minted with
    pub fn issuer(&self) -> Arc<TokenIssuer> {
        self.issuer.clone()
    }

    /// Create a user and issue its first token
    pub async fn register(
        &self,
        username: String,
        password: String,
        role: Role,
    ) -> Result<(UserRecord, String)> {
        validate_credentials(&username, &password)?;

        let password_hash = self.hasher.hash_blocking(password).await?;
        let user = self
            .call("user insert", |reply| AuthMsg::Insert {
                username,
                password_hash,
                role,
                reply,
            })
            .await?;

        let token = self.issuer.issue(user.id, &user.role)?;
        Ok((user, token))
    }

    /// Check credentials and issue a token
    ///
    /// Unknown usernames and wrong passwords fail identically.
    pub async fn login(&self, username: String, password: String) -> Result<(String, UserRecord)> {
        if username.is_empty() || password.is_empty() {
            return Err(CatalogError::Validation("username and password are required".into()));
        }

        let found = self
            .call("user lookup", |reply| AuthMsg::FindByUsername {
                username: username.clone(),
                reply,
            })
            .await?;

        let Some(user) = found else {
            warn!(username = %username, "Login for unknown user");
            return Err(CatalogError::InvalidCredentials);
        };

        if !self
            .hasher
            .verify_blocking(password, user.password_hash.clone())
            .await
        {
            warn!(user_id = user.id, "Login with wrong password");
            return Err(CatalogError::InvalidCredentials);
        }

        let token = self.issuer.issue(user.id, &user.role)?;
        debug!(user_id = user.id, "Login successful");
        Ok((token, user))
    }

    pub async fn get_user(&self, user_id: u64) -> Result<UserRecord> {
        self.call("user lookup", |reply| AuthMsg::GetUser { user_id, reply })
            .await
    }

    pub async fn get_user_by_username(&self, username: String) -> Result<UserRecord> {
        self.call("user lookup", |reply| AuthMsg::FindByUsername {
            username: username.clone(),
            reply,
        })
        .await?
        .ok_or(CatalogError::UserNotFound(username))
    }

    /// Remove a user record; not reachable from the HTTP surface
    pub async fn delete_user(&self, user_id: u64) -> Result<()> {
        self.call("user delete", |reply| AuthMsg::DeleteUser { user_id, reply })
            .await
    }
}

fn validate_credentials(username: &str, password: &str) -> Result<()> {
    if username.trim().is_empty() {
        return Err(CatalogError::Validation("username must not be blank".into()));
    }
    if username.chars().count() > MAX_USERNAME_CHARS {
        return Err(CatalogError::Validation(format!(
            "username must be at most {MAX_USERNAME_CHARS} characters"
        )));
    }
    if username.chars().any(char::is_control) {
        return Err(CatalogError::Validation("username must not contain control characters".into()));
    }
    if password.is_empty() {
        return Err(CatalogError::Validation("password must not be empty".into()));
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(CatalogError::Validation(format!(
            "password must be at most {MAX_PASSWORD_BYTES} bytes"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_credentials() {
        assert!(validate_credentials("a", "p").is_ok());
        assert!(validate_credentials("", "p").is_err());
        assert!(validate_credentials("   ", "p").is_err());
        assert!(validate_credentials("a", "").is_err());
        assert!(validate_credentials("bad\nname", "p").is_err());
        assert!(validate_credentials(&"x".repeat(65), "p").is_err());
        assert!(validate_credentials(&"x".repeat(64), "p").is_ok());
    }
}
