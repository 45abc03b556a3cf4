//! Status command implementation.

use anyhow::Result;
use clap::Args;

use crate::output;
use crate::session::require_session;

#[derive(Args, Debug)]
pub struct StatusArgs {}

pub async fn run(_args: StatusArgs) -> Result<()> {
    let session = require_session().await?;
    let tokens = session.export_tokens().await;

    output::field("Base URL", session.base_url().as_str());
    output::field("Language", &session.config().language);
    output::field("Access token", &output::mask(tokens.access_token.as_str()));
    output::field(
        "Dataset API key",
        &tokens
            .api_key
            .map(|k| output::mask(k.as_str()))
            .unwrap_or_else(|| "(not provisioned)".to_string()),
    );

    Ok(())
}
