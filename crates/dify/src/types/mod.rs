//! Validated value types shared across the client.

mod base_url;

pub use base_url::BaseUrl;
