//! Dataset API key command implementation.

use anyhow::{Context, Result};
use clap::Args;

use crate::output;
use crate::session::{require_session, storage};

#[derive(Args, Debug)]
pub struct ApiKeyArgs {
    /// Provision the key again instead of using the cached one
    #[arg(long)]
    pub rotate: bool,

    /// Print the full key instead of a masked one
    #[arg(long)]
    pub reveal: bool,
}

pub async fn run(args: ApiKeyArgs) -> Result<()> {
    let session = require_session().await?;

    let key = if args.rotate {
        session
            .rotate_api_key()
            .await
            .context("Failed to rotate dataset API key")?
    } else {
        session
            .ensure_api_key()
            .await
            .context("Failed to get dataset API key")?
    };

    storage::save_session(&session)
        .await
        .context("Failed to save session")?;

    if args.reveal {
        println!("{}", key.as_str());
    } else {
        output::field("Dataset API key", &output::mask(key.as_str()));
    }

    Ok(())
}
