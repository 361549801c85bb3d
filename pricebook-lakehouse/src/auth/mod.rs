//! Authentication: users, password hashing, bearer tokens and the role gate
//!
//! Users live in a Delta table owned by [`AuthActor`]; tokens are stateless.

pub mod actor;
pub mod gate;
pub mod password;
pub mod token;
pub mod types;

pub use actor::{AuthActor, AuthHandle};
pub use gate::{AccessGate, Operation, Policy};
pub use password::CredentialHasher;
pub use token::{TokenClaims, TokenError, TokenIssuer};
pub use types::{Principal, Role, UserRecord};
