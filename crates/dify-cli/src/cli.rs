//! CLI argument definitions.

use clap::{Args, Parser};

use crate::commands::Commands;

/// Dify CLI tool for console and service API exploration.
#[derive(Parser, Debug)]
#[command(name = "dify")]
#[command(author, version = env!("DIFY_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Connection options shared by commands that talk to a deployment
/// without a stored session.
#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// Deployment root URL (a trailing /v1 or /console/api is stripped)
    #[arg(long, env = "DIFY_BASE_URL")]
    pub base_url: String,

    /// Console account email
    #[arg(long, env = "DIFY_EMAIL")]
    pub email: String,

    /// Console account password
    #[arg(long, env = "DIFY_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Interface language sent at login
    #[arg(long, default_value = dify::config::DEFAULT_LANGUAGE)]
    pub language: String,
}
