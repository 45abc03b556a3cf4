//! HTTP plumbing: request descriptors, the shared client, and the wire types
//! of the session endpoints.

mod client;
pub(crate) mod endpoints;
mod request;

pub(crate) use client::{HttpClient, parse_error_response};
pub use endpoints::DatasetApiKey;
pub use request::{Api, RequestBody, RequestDescriptor, Transport};
