//! Pricebook HTTP API
//!
//! An axum router over [`pricebook_lakehouse::Catalog`]: public `/register`,
//! `/login` and `/health`, and bearer-protected item routes.
//!
//! | Route | Access |
//! |---|---|
//! | `POST /items`, `PUT /items/:id`, `DELETE /items/:id` | admin |
//! | `GET /items`, `GET /items/:id`, `GET /items/search` | any authenticated user |

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
