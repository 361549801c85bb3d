//! Error types for pricebook-lakehouse — Railway Programming
//!
//! All operations return `Result<T, CatalogError>`.
//! No panics, no unwraps in production code paths.

use thiserror::Error;

use crate::auth::TokenError;

/// Why a request failed authentication.
///
/// Kept for server-side logging only; clients see a single generic message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    MissingCredential,
    MalformedHeader,
    Token(TokenError),
}

impl std::fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingCredential => f.write_str("no Authorization header"),
            Self::MalformedHeader => f.write_str("Authorization header is not a bearer credential"),
            Self::Token(err) => write!(f, "token rejected: {err}"),
        }
    }
}

/// Unified error type for all catalog operations
#[derive(Error, Debug)]
pub enum CatalogError {
    // ─── Request Errors ───

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Item not found: {0}")]
    ItemNotFound(u64),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("User already exists: {0}")]
    UserAlreadyExists(String),

    // ─── Auth Errors ───

    #[error("Unauthenticated: {0}")]
    Unauthenticated(AuthFailure),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Insufficient permissions: required={required}, have={actual}")]
    Forbidden { required: String, actual: String },

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    // ─── Storage Errors ───

    #[error("Delta table error: {0}")]
    DeltaTable(String),

    #[error("Arrow error: {0}")]
    Arrow(String),

    #[error("DataFusion error: {0}")]
    DataFusion(String),

    #[error("Corrupt row in {table}: {detail}")]
    CorruptRow { table: &'static str, detail: String },

    // ─── Event Errors ───

    #[error("Event publish failed: {0}")]
    EventPublish(String),

    // ─── Infrastructure Errors ───

    #[error("Timed out waiting for {operation}")]
    Timeout { operation: &'static str },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Actor unavailable: {0}")]
    ActorUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CatalogError {
    /// True for failures of the store or the actors fronting it.
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            Self::DeltaTable(_)
                | Self::Arrow(_)
                | Self::DataFusion(_)
                | Self::CorruptRow { .. }
                | Self::Io(_)
                | Self::ActorUnavailable(_)
        )
    }
}

impl From<deltalake::DeltaTableError> for CatalogError {
    fn from(err: deltalake::DeltaTableError) -> Self {
        CatalogError::DeltaTable(err.to_string())
    }
}

impl From<deltalake::arrow::error::ArrowError> for CatalogError {
    fn from(err: deltalake::arrow::error::ArrowError) -> Self {
        CatalogError::Arrow(err.to_string())
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Serialization(err.to_string())
    }
}

impl From<deltalake::datafusion::error::DataFusionError> for CatalogError {
    fn from(err: deltalake::datafusion::error::DataFusionError) -> Self {
        CatalogError::DataFusion(err.to_string())
    }
}

impl From<url::ParseError> for CatalogError {
    fn from(err: url::ParseError) -> Self {
        CatalogError::Config(format!("URL parse error: {err}"))
    }
}

impl From<TokenError> for CatalogError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Signing(msg) => CatalogError::Internal(format!("token signing: {msg}")),
            other => CatalogError::Unauthenticated(AuthFailure::Token(other)),
        }
    }
}

/// Result type alias for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;
