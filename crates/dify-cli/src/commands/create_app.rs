//! Create app command implementation.

use anyhow::{Context, Result};
use clap::Args;

use crate::output;
use crate::session::{require_session, storage};

#[derive(Args, Debug)]
pub struct CreateAppArgs {
    /// App name
    pub name: String,
}

pub async fn run(args: CreateAppArgs) -> Result<()> {
    let session = require_session().await?;

    let result = session.create_chat_app(&args.name).await;

    storage::save_session(&session)
        .await
        .context("Failed to save session")?;

    let app = result.context("Failed to create app")?;

    println!("{}", app.id);
    output::success(&format!("Created {} app '{}'", app.mode, app.name));

    Ok(())
}
