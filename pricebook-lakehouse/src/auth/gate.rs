//! Access Control Gate — authentication, then role authorization
//!
//! Every protected operation names its policy in one table
//! ([`Operation::policy`]). Reads are open to any authenticated caller;
//! mutations require `admin`.

use std::sync::Arc;

use tracing::warn;

use crate::error::{AuthFailure, CatalogError, Result};

use super::token::TokenIssuer;
use super::types::{Principal, Role};

/// Protected operations of the HTTP surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateItem,
    ListItems,
    GetItem,
    SearchItems,
    UpdateItem,
    DeleteItem,
}

/// Who may perform an operation once authenticated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    AnyAuthenticated,
    AdminOnly,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Self::CreateItem,
        Self::ListItems,
        Self::GetItem,
        Self::SearchItems,
        Self::UpdateItem,
        Self::DeleteItem,
    ];

    pub fn policy(self) -> Policy {
        match self {
            Self::ListItems | Self::GetItem | Self::SearchItems => Policy::AnyAuthenticated,
            Self::CreateItem | Self::UpdateItem | Self::DeleteItem => Policy::AdminOnly,
        }
    }
}

impl Policy {
    pub fn admits(self, role: &Role) -> bool {
        match self {
            Self::AnyAuthenticated => true,
            Self::AdminOnly => role.is_admin(),
        }
    }

    fn required(self) -> &'static str {
        match self {
            Self::AnyAuthenticated => "any",
            Self::AdminOnly => "admin",
        }
    }
}

/// Two-stage request check shared by every protected route
#[derive(Clone)]
pub struct AccessGate {
    issuer: Arc<TokenIssuer>,
}

impl AccessGate {
    pub fn new(issuer: Arc<TokenIssuer>) -> Self {
        Self { issuer }
    }

    /// Resolve the `Authorization` header value to a verified principal
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<Principal> {
        let header = authorization
            .ok_or(CatalogError::Unauthenticated(AuthFailure::MissingCredential))?;

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(CatalogError::Unauthenticated(AuthFailure::MalformedHeader))?;

        self.issuer.verify(token).map_err(|reason| {
            warn!(reason = %reason, "Bearer token rejected");
            CatalogError::Unauthenticated(AuthFailure::Token(reason))
        })
    }

    /// Check an authenticated principal against the operation's policy
    pub fn authorize(&self, principal: &Principal, operation: Operation) -> Result<()> {
        let policy = operation.policy();
        if policy.admits(&principal.role) {
            return Ok(());
        }
        warn!(
            user_id = principal.user_id,
            role = %principal.role,
            ?operation,
            "Operation forbidden for role"
        );
        Err(CatalogError::Forbidden {
            required: policy.required().to_string(),
            actual: principal.role.to_string(),
        })
    }

    /// Authenticate, then authorize, in that order
    pub fn admit(&self, authorization: Option<&str>, operation: Operation) -> Result<Principal> {
        let principal = self.authenticate(authorization)?;
        self.authorize(&principal, operation)?;
        Ok(principal)
    }
}
