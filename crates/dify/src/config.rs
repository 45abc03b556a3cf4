//! Client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::BaseUrl;

/// Language sent with the console login request.
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Default per-request timeout for non-streaming calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default connect timeout, applied to streaming calls as well.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default capacity of the channel between an SSE decoder and its consumer.
pub const DEFAULT_STREAM_BUFFER: usize = 32;

/// Configuration for a [`Session`](crate::Session).
///
/// Deserializable so an embedding application can keep it in its own config
/// file; durations are given in whole seconds.
///
/// ```
/// use dify::{BaseUrl, ClientConfig};
///
/// let config = ClientConfig::new(BaseUrl::new("https://dify.example.com").unwrap())
///     .with_language("zh-Hans");
/// assert_eq!(config.language, "zh-Hans");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Deployment root; console and service paths hang off it.
    pub base_url: BaseUrl,

    /// Interface language reported at login.
    #[serde(default = "default_language")]
    pub language: String,

    /// Ask the backend for a long-lived refresh token.
    #[serde(default = "default_remember_me")]
    pub remember_me: bool,

    /// Total timeout for non-streaming requests.
    #[serde(default = "default_timeout", with = "duration_secs")]
    pub timeout: Duration,

    /// Connect timeout for every request.
    #[serde(default = "default_connect_timeout", with = "duration_secs")]
    pub connect_timeout: Duration,

    /// User agent header.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Bounded channel capacity for streamed messages.
    #[serde(default = "default_stream_buffer")]
    pub stream_buffer: usize,
}

impl ClientConfig {
    /// Configuration with defaults for everything but the base URL.
    pub fn new(base_url: BaseUrl) -> Self {
        Self {
            base_url,
            language: default_language(),
            remember_me: default_remember_me(),
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            user_agent: default_user_agent(),
            stream_buffer: DEFAULT_STREAM_BUFFER,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_stream_buffer(mut self, capacity: usize) -> Self {
        self.stream_buffer = capacity.max(1);
        self
    }
}

impl From<BaseUrl> for ClientConfig {
    fn from(base_url: BaseUrl) -> Self {
        Self::new(base_url)
    }
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_remember_me() -> bool {
    true
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn default_connect_timeout() -> Duration {
    DEFAULT_CONNECT_TIMEOUT
}

fn default_user_agent() -> String {
    concat!("dify-rs/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_stream_buffer() -> usize {
    DEFAULT_STREAM_BUFFER
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
