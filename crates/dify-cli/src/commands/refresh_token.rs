//! Refresh token command implementation.

use anyhow::{Context, Result};
use clap::Args;

use crate::output;
use crate::session::{require_session, storage};

#[derive(Args, Debug)]
pub struct RefreshTokenArgs {}

pub async fn run(_args: RefreshTokenArgs) -> Result<()> {
    let session = require_session().await?;

    output::progress("Refreshing session...");

    if let Err(e) = session.refresh().await {
        if e.is_auth_fatal() {
            output::warning("The refresh token was rejected; run 'dify login' again.");
        }
        return Err(e).context("Failed to refresh session");
    }

    // Save the updated session with new tokens
    storage::save_session(&session)
        .await
        .context("Failed to save refreshed session")?;

    output::success("Session refreshed successfully");
    output::field("Base URL", session.base_url().as_str());

    Ok(())
}
