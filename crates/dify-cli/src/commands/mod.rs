//! Subcommand implementations.

mod api_key;
mod create_app;
mod create_app_token;
mod create_dataset;
mod login;
mod logout;
mod refresh_token;
mod run_workflow;
mod status;
mod update_app_model;
mod upload_document;

use anyhow::Result;
use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in to the console and store the session
    Login(login::LoginArgs),

    /// Forget the stored session
    Logout(logout::LogoutArgs),

    /// Display the stored session
    Status(status::StatusArgs),

    /// Exchange the refresh token for a new token pair
    RefreshToken(refresh_token::RefreshTokenArgs),

    /// Show or rotate the dataset API key
    ApiKey(api_key::ApiKeyArgs),

    /// Create an empty dataset (knowledge base)
    CreateDataset(create_dataset::CreateDatasetArgs),

    /// Upload a file into a dataset
    UploadDocument(upload_document::UploadDocumentArgs),

    /// Create a chat app
    CreateApp(create_app::CreateAppArgs),

    /// Set the model (and optional dataset) of an app
    UpdateAppModel(update_app_model::UpdateAppModelArgs),

    /// Create a service API key for an app
    CreateAppToken(create_app_token::CreateAppTokenArgs),

    /// Run a workflow app
    RunWorkflow(run_workflow::RunWorkflowArgs),
}

pub async fn handle(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Login(args) => login::run(args).await,
        Commands::Logout(args) => logout::run(args).await,
        Commands::Status(args) => status::run(args).await,
        Commands::RefreshToken(args) => refresh_token::run(args).await,
        Commands::ApiKey(args) => api_key::run(args).await,
        Commands::CreateDataset(args) => create_dataset::run(args).await,
        Commands::UploadDocument(args) => upload_document::run(args).await,
        Commands::CreateApp(args) => create_app::run(args).await,
        Commands::UpdateAppModel(args) => update_app_model::run(args).await,
        Commands::CreateAppToken(args) => create_app_token::run(args).await,
        Commands::RunWorkflow(args) => run_workflow::run(args).await,
    }
}
