//! Document upload into a dataset.

use std::path::Path;

use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::Result;
use crate::auth::Session;
use crate::error::{InvalidInputError, ResultExt};
use crate::http::{RequestDescriptor, Transport};

use super::datasets::IndexingTechnique;

/// How uploaded text is segmented.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ProcessRule {
    /// Let the backend pick segmentation and cleaning rules.
    Automatic,
    /// Caller-provided rules, passed through as-is.
    Custom { rules: serde_json::Value },
}

/// The `data` side-channel of a file upload.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentUpload {
    pub indexing_technique: IndexingTechnique,
    pub process_rule: ProcessRule,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_form: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_language: Option<String>,
}

impl Default for DocumentUpload {
    fn default() -> Self {
        Self {
            indexing_technique: IndexingTechnique::HighQuality,
            process_rule: ProcessRule::Automatic,
            doc_form: None,
            doc_language: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub position: Option<u32>,
    #[serde(default)]
    pub data_source_type: Option<String>,
    #[serde(default)]
    pub indexing_status: Option<String>,
    #[serde(default)]
    pub display_status: Option<String>,
    #[serde(default)]
    pub word_count: Option<u64>,
    #[serde(default)]
    pub created_at: Option<i64>,
}

/// Result of an upload: the new document and the indexing batch it joined.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedDocument {
    pub document: Document,
    pub batch: String,
}

impl Session {
    /// Upload a local file as a new document.
    #[instrument(skip(self, path, upload), fields(path = %path.as_ref().display()))]
    pub async fn create_document_by_file(
        &self,
        dataset_id: &str,
        path: impl AsRef<Path>,
        upload: &DocumentUpload,
    ) -> Result<UploadedDocument> {
        let path = path.as_ref();
        let unreadable = |reason: String| InvalidInputError::Upload {
            path: path.display().to_string(),
            reason,
        };

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| unreadable("path has no file name".into()))
            .during("create document by file")?
            .to_string();
        let contents = tokio::fs::read(path)
            .await
            .map_err(|e| unreadable(e.to_string()))
            .during("create document by file")?;

        self.create_document_by_bytes(dataset_id, &file_name, contents, upload)
            .await
    }

    /// Upload in-memory content as a new document named `file_name`.
    #[instrument(skip(self, contents, upload), fields(size = contents.len()))]
    pub async fn create_document_by_bytes(
        &self,
        dataset_id: &str,
        file_name: &str,
        contents: Vec<u8>,
        upload: &DocumentUpload,
    ) -> Result<UploadedDocument> {
        self.ensure_api_key().await.during("create document by file")?;

        let data = serde_json::to_string(upload).map_err(|e| InvalidInputError::Other {
            message: format!("cannot encode upload options: {}", e),
        })
        .during("create document by file")?;
        let path = format!("datasets/{}/document/create-by-file", dataset_id);

        let uploaded: UploadedDocument = self
            .execute_json(|| {
                let file = Part::bytes(contents.clone()).file_name(file_name.to_string());
                let form = Form::new().text("data", data.clone()).part("file", file);
                Ok(RequestDescriptor::post(Transport::DatasetApiKey, path.as_str()).multipart(form))
            })
            .await
            .during("create document by file")?;

        debug!(id = %uploaded.document.id, batch = %uploaded.batch, "Document uploaded");
        Ok(uploaded)
    }
}
