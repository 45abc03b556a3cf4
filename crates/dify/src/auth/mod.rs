//! Authentication types and session management.
//!
//! All authenticated operations flow through a [`Session`], which owns the
//! credential store and decides how each transport is authorized.

mod credentials;
mod session;
mod store;
mod tokens;

pub use credentials::Credentials;
pub use session::Session;
pub use store::{CredentialStore, TokenSnapshot};
pub use tokens::{AccessToken, ApiKey, RefreshToken, TokenPair};
