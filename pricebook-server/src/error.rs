use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pricebook_lakehouse::CatalogError;
use serde_json::json;
use tracing::{error, warn};

/// A request failure on its way to becoming an HTTP response
#[derive(Debug)]
pub enum ApiError {
    /// Body, path or query string did not parse
    MalformedRequest(String),
    Catalog(CatalogError),
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        Self::Catalog(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            Self::Catalog(err) => match err {
                CatalogError::Validation(_) | CatalogError::UserAlreadyExists(_) => {
                    StatusCode::BAD_REQUEST
                }
                CatalogError::Unauthenticated(_) | CatalogError::InvalidCredentials => {
                    StatusCode::UNAUTHORIZED
                }
                CatalogError::Forbidden { .. } => StatusCode::FORBIDDEN,
                CatalogError::ItemNotFound(_) | CatalogError::UserNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                CatalogError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Client-facing text; auth failures never say which check failed
    fn message(&self) -> String {
        match self {
            Self::MalformedRequest(detail) => detail.clone(),
            Self::Catalog(err) => match err {
                CatalogError::Validation(detail) => detail.clone(),
                CatalogError::UserAlreadyExists(_) => "Username already taken".into(),
                CatalogError::Unauthenticated(_) => "Unauthorized".into(),
                CatalogError::InvalidCredentials => "Invalid username or password".into(),
                CatalogError::Forbidden { .. } => "Forbidden".into(),
                CatalogError::ItemNotFound(_) => "Item not found".into(),
                CatalogError::UserNotFound(_) => "User not found".into(),
                CatalogError::Timeout { .. } => "Upstream timed out".into(),
                _ => "Internal server error".into(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Catalog(CatalogError::Unauthenticated(reason)) => {
                warn!(%reason, "Request unauthenticated");
            }
            Self::Catalog(err) if status.is_server_error() => {
                error!(error = %err, store = err.is_store_failure(), "Request failed");
            }
            _ => {}
        }

        (status, Json(json!({ "error": self.message() }))).into_response()
    }
}
