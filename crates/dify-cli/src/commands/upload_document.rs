//! Upload document command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use dify::resources::{DocumentUpload, IndexingTechnique};

use crate::output;
use crate::session::{require_session, storage};

#[derive(Args, Debug)]
pub struct UploadDocumentArgs {
    /// Target dataset id
    pub dataset_id: String,

    /// File to upload
    pub file: PathBuf,

    /// Use economy indexing instead of high quality
    #[arg(long)]
    pub economy: bool,
}

pub async fn run(args: UploadDocumentArgs) -> Result<()> {
    let session = require_session().await?;

    let mut upload = DocumentUpload::default();
    if args.economy {
        upload.indexing_technique = IndexingTechnique::Economy;
    }

    output::progress(&format!("Uploading {}...", args.file.display()));

    let result = session
        .create_document_by_file(&args.dataset_id, &args.file, &upload)
        .await;

    storage::save_session(&session)
        .await
        .context("Failed to save session")?;

    let uploaded = result.context("Failed to upload document")?;

    println!("{}", uploaded.document.id);
    output::success(&format!(
        "Uploaded '{}' (batch {})",
        uploaded.document.name, uploaded.batch
    ));

    Ok(())
}
