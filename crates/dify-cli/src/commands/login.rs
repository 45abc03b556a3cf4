//! Login command implementation.

use anyhow::{Context, Result};
use clap::Args;

use dify::{BaseUrl, ClientConfig, Credentials, Session};

use crate::cli::ConnectArgs;
use crate::output;
use crate::session::storage;

#[derive(Args, Debug)]
pub struct LoginArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,

    /// Log in only; provision the dataset API key on first use instead
    #[arg(long)]
    pub skip_api_key: bool,
}

pub async fn run(args: LoginArgs) -> Result<()> {
    let base_url = BaseUrl::new(&args.connect.base_url).context("Invalid base URL")?;
    let config = ClientConfig::new(base_url).with_language(&args.connect.language);
    let credentials = Credentials::new(&args.connect.email, &args.connect.password);

    output::progress("Logging in...");

    let session = if args.skip_api_key {
        Session::login(config, &credentials).await
    } else {
        Session::connect(config, &credentials).await
    }
    .context("Failed to login")?;

    // Save session
    storage::save_session(&session)
        .await
        .context("Failed to save session")?;

    output::success("Logged in successfully");
    output::field("Base URL", session.base_url().as_str());
    output::field("Email", credentials.email());

    Ok(())
}
