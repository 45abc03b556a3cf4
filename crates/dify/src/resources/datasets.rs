//! Knowledge base (dataset) creation over the service API.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::Result;
use crate::auth::Session;
use crate::error::ResultExt;
use crate::http::{RequestDescriptor, Transport};

const DATASETS: &str = "datasets";

/// How documents in a dataset are indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexingTechnique {
    HighQuality,
    Economy,
}

/// Who can see a dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetPermission {
    #[default]
    OnlyMe,
    AllTeamMembers,
    PartialMembers,
}

/// Where a dataset's content lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetProvider {
    /// Uploaded documents.
    #[default]
    Vendor,
    /// An external knowledge API.
    External,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMethod {
    HybridSearch,
    SemanticSearch,
    FullTextSearch,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RerankingModel {
    pub reranking_provider_name: String,
    pub reranking_model_name: String,
}

/// Retrieval settings of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalModel {
    pub search_method: SearchMethod,
    pub reranking_enable: bool,
    pub reranking_model: RerankingModel,
    pub top_k: u32,
    pub score_threshold_enabled: bool,
    pub score_threshold: f64,
}

/// Request body for creating an empty dataset.
///
/// Only `name` is required; unset fields are left to the backend defaults.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateDatasetRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexing_technique: Option<IndexingTechnique>,
    pub permission: DatasetPermission,
    pub provider: DatasetProvider,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_knowledge_api_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_knowledge_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_model_provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retrieval_model: Option<RetrievalModel>,
}

impl CreateDatasetRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_indexing_technique(mut self, technique: IndexingTechnique) -> Self {
        self.indexing_technique = Some(technique);
        self
    }

    pub fn with_permission(mut self, permission: DatasetPermission) -> Self {
        self.permission = permission;
        self
    }
}

/// A dataset as returned by the service API.
#[derive(Debug, Clone, Deserialize)]
pub struct Dataset {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub permission: Option<String>,
    #[serde(default)]
    pub data_source_type: Option<String>,
    #[serde(default)]
    pub indexing_technique: Option<String>,
    #[serde(default)]
    pub app_count: u64,
    #[serde(default)]
    pub document_count: u64,
    #[serde(default)]
    pub word_count: u64,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub embedding_model: Option<String>,
    #[serde(default)]
    pub embedding_model_provider: Option<String>,
}

impl Session {
    /// Create an empty dataset.
    ///
    /// Provisions the dataset API key first if the session has none.
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_empty_dataset(&self, request: &CreateDatasetRequest) -> Result<Dataset> {
        self.ensure_api_key().await.during("create dataset")?;

        let dataset: Dataset = self
            .execute_json(|| RequestDescriptor::post(Transport::DatasetApiKey, DATASETS).json(request))
            .await
            .during("create dataset")?;

        debug!(id = %dataset.id, "Dataset created");
        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_request_leaves_optional_fields_out() {
        let body = serde_json::to_value(CreateDatasetRequest::new("handbook")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "name": "handbook",
                "permission": "only_me",
                "provider": "vendor",
            })
        );
    }

    #[test]
    fn enums_use_wire_names() {
        let request = CreateDatasetRequest::new("kb")
            .with_indexing_technique(IndexingTechnique::HighQuality)
            .with_permission(DatasetPermission::AllTeamMembers);
        let body = serde_json::to_value(request).unwrap();
        assert_eq!(body["indexing_technique"], "high_quality");
        assert_eq!(body["permission"], "all_team_members");

        let method = serde_json::to_value(SearchMethod::FullTextSearch).unwrap();
        assert_eq!(method, "full_text_search");
    }
}
