//! Auth domain types — Role, UserRecord, Principal
//!
//! Serializable, cloneable, and cheap to pass around.

use serde::{Deserialize, Serialize};

/// User roles
///
/// Only `Admin` is distinguished by access control; `User` and any
/// `Custom` role are non-admin. A role round-trips as its exact string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    #[default]
    User,
    Custom(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
            Self::Custom(name) => name,
        }
    }

    /// Parse a stored or submitted role; matching is exact (case-sensitive)
    pub fn parse(s: &str) -> Self {
        match s {
            "admin" => Self::Admin,
            "user" => Self::User,
            other => Self::Custom(other.to_string()),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        match s.as_str() {
            "admin" => Self::Admin,
            "user" => Self::User,
            _ => Self::Custom(s),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Custom(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User record as stored in the Delta `users` table
///
/// `password_hash` is skipped on serialization so a record can be
/// returned to clients as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: u64,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    #[serde(skip_serializing, default)]
    pub created_at: String,
}

/// Verified identity carried by a bearer token
///
/// Reflects the role at issuance; it is not re-checked against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: u64,
    pub role: Role,
}
