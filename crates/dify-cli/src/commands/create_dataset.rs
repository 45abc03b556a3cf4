//! Create dataset command implementation.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use dify::resources::{CreateDatasetRequest, DatasetPermission, IndexingTechnique};

use crate::output;
use crate::session::{require_session, storage};

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Indexing {
    HighQuality,
    Economy,
}

#[derive(Args, Debug)]
pub struct CreateDatasetArgs {
    /// Dataset name
    pub name: String,

    /// Dataset description
    #[arg(long)]
    pub description: Option<String>,

    /// Indexing technique
    #[arg(long, value_enum)]
    pub indexing: Option<Indexing>,

    /// Share with all team members instead of only yourself
    #[arg(long)]
    pub shared: bool,
}

pub async fn run(args: CreateDatasetArgs) -> Result<()> {
    let session = require_session().await?;

    let mut request = CreateDatasetRequest::new(&args.name);
    if let Some(description) = args.description {
        request = request.with_description(description);
    }
    if let Some(indexing) = args.indexing {
        request = request.with_indexing_technique(match indexing {
            Indexing::HighQuality => IndexingTechnique::HighQuality,
            Indexing::Economy => IndexingTechnique::Economy,
        });
    }
    if args.shared {
        request = request.with_permission(DatasetPermission::AllTeamMembers);
    }

    let result = session.create_empty_dataset(&request).await;

    // Provisioning the API key may have refreshed tokens
    storage::save_session(&session)
        .await
        .context("Failed to save session")?;

    let dataset = result.context("Failed to create dataset")?;

    println!("{}", dataset.id);
    output::success(&format!("Created dataset '{}'", dataset.name));

    Ok(())
}
