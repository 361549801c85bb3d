//! Items: the priced catalog, its search and its change events

pub mod actor;
pub mod search;
pub mod service;
pub mod types;

pub use actor::{ItemActor, ItemHandle};
pub use search::{SearchPage, SearchParams, SearchQuery, SortDirection, SortKey};
pub use service::ItemService;
pub use types::{Item, ItemAction, ItemEvent, ItemFields};
