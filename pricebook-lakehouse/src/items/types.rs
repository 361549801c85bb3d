//! Item domain types

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};

/// A priced catalog entry, as stored in the Delta `items` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: u64,
    pub name: String,
    pub price: f64,
}

/// Client-supplied item contents for create and update
///
/// Update is a full replacement, so both fields are always required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemFields {
    pub name: String,
    pub price: f64,
}

impl ItemFields {
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            price,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::Validation("name must not be blank".into()));
        }
        if !self.price.is_finite() {
            return Err(CatalogError::Validation("price must be a finite number".into()));
        }
        if self.price < 0.0 {
            return Err(CatalogError::Validation("price must not be negative".into()));
        }
        Ok(())
    }

    pub(crate) fn into_item(self, id: u64) -> Item {
        Item {
            id,
            name: self.name,
            price: self.price,
        }
    }
}

/// Kind of item change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemAction {
    Created,
    Updated,
    Deleted,
}

impl ItemAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for ItemAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification emitted after a successful item mutation
///
/// For `Deleted`, `item` is the state just before removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemEvent {
    pub action: ItemAction,
    pub item: Item,
}

impl ItemEvent {
    pub fn new(action: ItemAction, item: Item) -> Self {
        Self { action, item }
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}
