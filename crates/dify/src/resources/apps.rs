//! Console app management: creation, model configuration and app keys.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

use crate::Result;
use crate::auth::{ApiKey, Session};
use crate::error::ResultExt;
use crate::http::{RequestDescriptor, Transport};

use super::ResultBody;

const APPS: &str = "apps";

const DEFAULT_ICON_TYPE: &str = "emoji";
const DEFAULT_ICON: &str = "🤖";
const DEFAULT_ICON_BACKGROUND: &str = "#FFEAD5";
const DEFAULT_DESCRIPTION: &str = "Created by dify-rs";
const CHAT_MODE: &str = "chat";

const DEFAULT_PRE_PROMPT: &str = "根据用户提问进行回答";

#[derive(Debug, Serialize)]
struct CreateAppBody<'a> {
    name: &'a str,
    icon_type: &'a str,
    icon: &'a str,
    icon_background: &'a str,
    mode: &'a str,
    description: &'a str,
}

/// An app as returned by the console.
#[derive(Debug, Clone, Deserialize)]
pub struct App {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub mode: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub icon_background: Option<String>,
    #[serde(default)]
    pub enable_site: bool,
    #[serde(default)]
    pub enable_api: bool,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub updated_at: Option<i64>,
}

/// An app's service API key.
#[derive(Clone, Deserialize)]
pub struct AppApiKey {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub token: String,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub last_used_at: Option<i64>,
}

impl AppApiKey {
    /// The key as a credential for [`Transport::App`].
    pub fn api_key(&self) -> ApiKey {
        ApiKey::new(self.token.as_str())
    }
}

impl std::fmt::Debug for AppApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppApiKey")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// The model an app talks to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub provider: String,
    pub name: String,
    /// Usually `chat`.
    pub mode: String,
    #[serde(default)]
    pub completion_params: Map<String, Value>,
}

impl ModelConfig {
    pub fn chat(provider: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            name: name.into(),
            mode: CHAT_MODE.to_string(),
            completion_params: Map::new(),
        }
    }
}

/// A feature switch with no further settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Toggle {
    pub enabled: bool,
}

impl Toggle {
    pub const ON: Toggle = Toggle { enabled: true };
    pub const OFF: Toggle = Toggle { enabled: false };
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SensitiveWordAvoidanceConfig {
    pub enabled: bool,
    #[serde(rename = "type")]
    pub kind: String,
    pub configs: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageUploadConfig {
    pub detail: String,
    pub enabled: bool,
    pub number_limits: u32,
    pub transfer_methods: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileUploadConfig {
    pub image: ImageUploadConfig,
    pub enabled: bool,
    pub allowed_file_types: Vec<String>,
    pub allowed_file_extensions: Vec<String>,
    pub allowed_file_upload_methods: Vec<String>,
    pub number_limits: u32,
}

impl Default for FileUploadConfig {
    fn default() -> Self {
        let methods = || vec!["remote_url".to_string(), "local_file".to_string()];
        Self {
            image: ImageUploadConfig {
                detail: "high".into(),
                enabled: false,
                number_limits: 3,
                transfer_methods: methods(),
            },
            enabled: false,
            allowed_file_types: Vec::new(),
            allowed_file_extensions: [
                ".JPG", ".JPEG", ".PNG", ".GIF", ".WEBP", ".SVG", ".MP4", ".MOV", ".MPEG", ".WEBM",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            allowed_file_upload_methods: methods(),
            number_limits: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentModeConfig {
    pub enabled: bool,
    pub max_iteration: u32,
    pub strategy: String,
    pub tools: Vec<Value>,
}

impl Default for AgentModeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_iteration: 5,
            strategy: "function_call".into(),
            tools: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RerankingModelConfig {
    pub reranking_provider_name: String,
    pub reranking_model_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct DatasetRef {
    dataset: DatasetRefInner,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct DatasetRefInner {
    enabled: bool,
    id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
struct DatasetList {
    datasets: Vec<DatasetRef>,
}

/// Retrieval settings for the datasets attached to an app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetConfigs {
    pub retrieval_model: String,
    pub top_k: u32,
    pub reranking_mode: String,
    pub reranking_model: RerankingModelConfig,
    pub reranking_enable: bool,
    datasets: DatasetList,
}

impl Default for DatasetConfigs {
    fn default() -> Self {
        Self {
            retrieval_model: "multiple".into(),
            top_k: 4,
            reranking_mode: "reranking_model".into(),
            reranking_model: RerankingModelConfig::default(),
            reranking_enable: false,
            datasets: DatasetList::default(),
        }
    }
}

impl DatasetConfigs {
    /// Attach a dataset to the app.
    pub fn with_dataset(mut self, id: impl Into<String>) -> Self {
        self.datasets.datasets.push(DatasetRef {
            dataset: DatasetRefInner {
                enabled: true,
                id: id.into(),
            },
        });
        self
    }

    /// Ids of the attached datasets.
    pub fn dataset_ids(&self) -> impl Iterator<Item = &str> {
        self.datasets.datasets.iter().map(|d| d.dataset.id.as_str())
    }
}

/// Full model configuration of a chat app.
///
/// [`ModelConfigUpdate::new`] fills every block with the defaults of a
/// simple-prompt chat app; adjust fields before sending.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelConfigUpdate {
    pub pre_prompt: String,
    pub prompt_type: String,
    pub chat_prompt_config: Map<String, Value>,
    pub completion_prompt_config: Map<String, Value>,
    pub user_input_form: Vec<Value>,
    pub dataset_query_variable: String,
    pub more_like_this: Toggle,
    pub opening_statement: String,
    pub suggested_questions: Vec<String>,
    pub sensitive_word_avoidance: SensitiveWordAvoidanceConfig,
    pub speech_to_text: Toggle,
    pub text_to_speech: Toggle,
    pub file_upload: FileUploadConfig,
    pub suggested_questions_after_answer: Toggle,
    pub retriever_resource: Toggle,
    pub agent_mode: AgentModeConfig,
    pub model: ModelConfig,
    pub dataset_configs: DatasetConfigs,
}

impl ModelConfigUpdate {
    pub fn new(model: ModelConfig) -> Self {
        Self {
            pre_prompt: DEFAULT_PRE_PROMPT.into(),
            prompt_type: "simple".into(),
            chat_prompt_config: Map::new(),
            completion_prompt_config: Map::new(),
            user_input_form: Vec::new(),
            dataset_query_variable: String::new(),
            more_like_this: Toggle::OFF,
            opening_statement: String::new(),
            suggested_questions: Vec::new(),
            sensitive_word_avoidance: SensitiveWordAvoidanceConfig::default(),
            speech_to_text: Toggle::OFF,
            text_to_speech: Toggle::OFF,
            file_upload: FileUploadConfig::default(),
            suggested_questions_after_answer: Toggle::OFF,
            retriever_resource: Toggle::ON,
            agent_mode: AgentModeConfig::default(),
            model,
            dataset_configs: DatasetConfigs::default(),
        }
    }

    pub fn with_pre_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.pre_prompt = prompt.into();
        self
    }

    pub fn with_dataset(mut self, dataset_id: impl Into<String>) -> Self {
        self.dataset_configs = self.dataset_configs.with_dataset(dataset_id);
        self
    }
}

impl Session {
    /// Create a chat app with the standard icon and description.
    #[instrument(skip(self))]
    pub async fn create_chat_app(&self, name: &str) -> Result<App> {
        let body = CreateAppBody {
            name,
            icon_type: DEFAULT_ICON_TYPE,
            icon: DEFAULT_ICON,
            icon_background: DEFAULT_ICON_BACKGROUND,
            mode: CHAT_MODE,
            description: DEFAULT_DESCRIPTION,
        };

        let app: App = self
            .execute_json(|| RequestDescriptor::post(Transport::Console, APPS).json(&body))
            .await
            .during("create chat app")?;

        info!(id = %app.id, "Created chat app");
        Ok(app)
    }

    /// Replace an app's model configuration.
    ///
    /// A 2xx answer whose `result` is not `success` is reported as an
    /// [`ApplicationError`](crate::error::ApplicationError).
    #[instrument(skip(self, update), fields(model = %update.model.name))]
    pub async fn update_app_model_config(&self, app_id: &str, update: &ModelConfigUpdate) -> Result<()> {
        let path = format!("{}/{}/model-config", APPS, app_id);

        let body: ResultBody = self
            .execute_json(|| RequestDescriptor::post(Transport::Console, path.as_str()).json(update))
            .await
            .during("update app model config")?;

        body.into_result().during("update app model config")?;
        debug!("App model config updated");
        Ok(())
    }

    /// Create a service API key for an app.
    #[instrument(skip(self))]
    pub async fn create_app_access_token(&self, app_id: &str) -> Result<AppApiKey> {
        let path = format!("{}/{}/api-keys", APPS, app_id);

        let key: AppApiKey = self
            .execute_json(|| Ok(RequestDescriptor::post(Transport::Console, path.as_str())))
            .await
            .during("create app access token")?;

        info!(id = %key.id, "Created app API key");
        Ok(key)
    }
}
