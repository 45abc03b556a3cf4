//! Endpoint paths and wire types for the session lifecycle.

use serde::{Deserialize, Serialize};

// ============================================================================
// Endpoint Paths
// ============================================================================

/// POST, console: exchange email/password for a token pair.
pub const LOGIN: &str = "login";

/// POST, console: exchange a refresh token for a new token pair.
pub const REFRESH_TOKEN: &str = "refresh-token";

/// GET lists, POST creates, console: dataset API keys.
pub const DATASET_API_KEYS: &str = "datasets/api-keys";

/// Literal `result` marker of a successful console call.
pub const RESULT_SUCCESS: &str = "success";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for the login endpoint.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub language: &'a str,
    pub remember_me: bool,
}

/// Request body for the refresh endpoint.
#[derive(Debug, Serialize)]
pub struct RefreshTokenRequest<'a> {
    pub refresh_token: &'a str,
}

/// Response shared by login and refresh.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub result: String,
    /// The token pair on success. Rejections may carry a plain string
    /// here, so it is only interpreted once `result` has been checked.
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TokenData {
    pub access_token: String,
    pub refresh_token: String,
}

/// Error body returned with HTTP error statuses.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    pub status: Option<u16>,
}

/// A dataset API key as listed or created by the console.
#[derive(Clone, Serialize, Deserialize)]
pub struct DatasetApiKey {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub token: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub last_used_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl std::fmt::Debug for DatasetApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetApiKey")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("token", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .field("last_used_at", &self.last_used_at)
            .finish()
    }
}

/// Response from listing dataset API keys.
#[derive(Debug, Deserialize)]
pub struct DatasetApiKeyList {
    #[serde(default)]
    pub data: Vec<DatasetApiKey>,
}
