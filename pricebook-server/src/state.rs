use pricebook_lakehouse::{AccessGate, AuthHandle, Catalog, ItemService};

/// Shared handler state; cheap to clone per request
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthHandle,
    pub items: ItemService,
    pub gate: AccessGate,
}

impl From<Catalog> for AppState {
    fn from(catalog: Catalog) -> Self {
        Self {
            auth: catalog.auth,
            items: catalog.items,
            gate: catalog.gate,
        }
    }
}
