//! dify - Session-aware client for the Dify console and service APIs
//!
//! All operations flow through a [`Session`], which owns the console token
//! pair and the dataset API key. Console calls that come back 401 are
//! refreshed and replayed once; service calls authenticated with an API key
//! are never refreshed. Streaming workflow runs are decoded from
//! server-sent events into a [`Stream`](futures_util::Stream) of typed
//! chunks.
//!
//! # Example
//!
//! ```no_run
//! use dify::{ApiKey, BaseUrl, ClientConfig, Credentials, Session};
//! use dify::resources::WorkflowRunRequest;
//! use futures_util::StreamExt;
//!
//! # async fn example() -> Result<(), dify::Error> {
//! let config = ClientConfig::new(BaseUrl::new("https://dify.example.com")?);
//! let session = Session::connect(config, &Credentials::new("admin@example.com", "pw")).await?;
//!
//! let app_key = ApiKey::new("app-...");
//! let request = WorkflowRunRequest::new("user-1").with_input("query", "hello");
//! let mut chunks = session.run_workflow_streaming(&app_key, &request).await?;
//!
//! while let Some(chunk) = chunks.next().await {
//!     if let Some(text) = chunk?.text() {
//!         print!("{}", text);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod executor;
pub mod http;
pub mod resources;
pub mod sse;
pub mod types;

// Re-export primary types at crate root for convenience
pub use auth::{ApiKey, Credentials, Session, TokenPair, TokenSnapshot};
pub use config::ClientConfig;
pub use error::Error;
pub use http::DatasetApiKey;
pub use sse::SseStream;
pub use types::BaseUrl;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
