//! REST resources reachable from a [`Session`](crate::Session).
//!
//! Each resource is a thin request/response mapping over the session's
//! executor. Console resources (apps) use the rotating session token;
//! dataset resources use the dataset API key; workflow runs use an app key
//! supplied by the caller.

mod apps;
mod datasets;
mod documents;
mod workflows;

use serde::Deserialize;

use crate::Result;
use crate::error::ApplicationError;
use crate::http::endpoints::RESULT_SUCCESS;

pub use apps::{
    AgentModeConfig, App, AppApiKey, DatasetConfigs, FileUploadConfig, ImageUploadConfig,
    ModelConfig, ModelConfigUpdate, RerankingModelConfig, SensitiveWordAvoidanceConfig, Toggle,
};
pub use datasets::{
    CreateDatasetRequest, Dataset, DatasetPermission, DatasetProvider, IndexingTechnique,
    RerankingModel, RetrievalModel, SearchMethod,
};
pub use documents::{Document, DocumentUpload, ProcessRule, UploadedDocument};
pub use workflows::{
    WorkflowChunk, WorkflowEvent, WorkflowRun, WorkflowRunData, WorkflowRunRequest,
};

/// Body of console calls that only report `{"result": "..."}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ResultBody {
    pub result: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl ResultBody {
    /// Turn a non-success marker into an [`ApplicationError`].
    pub(crate) fn into_result(self) -> Result<()> {
        if self.result == RESULT_SUCCESS {
            Ok(())
        } else {
            Err(ApplicationError {
                result: self.result,
                message: self.message,
            }
            .into())
        }
    }
}
