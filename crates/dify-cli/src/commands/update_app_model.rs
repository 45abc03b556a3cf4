//! Update app model command implementation.

use anyhow::{Context, Result};
use clap::Args;

use dify::resources::{ModelConfig, ModelConfigUpdate};

use crate::output;
use crate::session::{require_session, storage};

#[derive(Args, Debug)]
pub struct UpdateAppModelArgs {
    /// App id
    pub app_id: String,

    /// Model provider (e.g., openai)
    #[arg(long)]
    pub provider: String,

    /// Model name (e.g., gpt-4o)
    #[arg(long)]
    pub model: String,

    /// Dataset to attach for retrieval
    #[arg(long)]
    pub dataset: Option<String>,

    /// System prompt
    #[arg(long)]
    pub prompt: Option<String>,
}

pub async fn run(args: UpdateAppModelArgs) -> Result<()> {
    let session = require_session().await?;

    let mut update = ModelConfigUpdate::new(ModelConfig::chat(&args.provider, &args.model));
    if let Some(dataset) = args.dataset {
        update = update.with_dataset(dataset);
    }
    if let Some(prompt) = args.prompt {
        update = update.with_pre_prompt(prompt);
    }

    let result = session.update_app_model_config(&args.app_id, &update).await;

    storage::save_session(&session)
        .await
        .context("Failed to save session")?;

    result.context("Failed to update app model config")?;

    output::success(&format!(
        "App {} now uses {}/{}",
        args.app_id, args.provider, args.model
    ));

    Ok(())
}
