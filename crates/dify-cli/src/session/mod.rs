//! Persisted CLI session state.

pub mod storage;

use anyhow::{Context, Result};
use dify::Session;

/// Load the stored session or explain how to create one.
pub async fn require_session() -> Result<Session> {
    storage::load_session()
        .await
        .context("Failed to load session")?
        .context("No active session. Run 'dify login' first.")
}
