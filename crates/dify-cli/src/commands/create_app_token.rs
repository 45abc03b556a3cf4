//! Create app token command implementation.

use anyhow::{Context, Result};
use clap::Args;

use crate::output;
use crate::session::{require_session, storage};

#[derive(Args, Debug)]
pub struct CreateAppTokenArgs {
    /// App id
    pub app_id: String,
}

pub async fn run(args: CreateAppTokenArgs) -> Result<()> {
    let session = require_session().await?;

    let result = session.create_app_access_token(&args.app_id).await;

    storage::save_session(&session)
        .await
        .context("Failed to save session")?;

    let key = result.context("Failed to create app access token")?;

    // The token is the command's output; it cannot be shown again
    println!("{}", key.token);
    output::success(&format!("Created app key {}", key.id));

    Ok(())
}
