//! Session management for authenticated Dify operations.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use crate::Result;
use crate::config::ClientConfig;
use crate::error::{AuthError, Error, ResultExt};
use crate::executor::{Authenticator, Bearer, Executor};
use crate::http::endpoints::{
    DATASET_API_KEYS, DatasetApiKeyList, LOGIN, LoginRequest, REFRESH_TOKEN, RESULT_SUCCESS,
    RefreshTokenRequest, TokenData, TokenResponse,
};
use crate::http::{DatasetApiKey, RequestDescriptor, Transport, parse_error_response};
use crate::types::BaseUrl;

use super::credentials::Credentials;
use super::store::{CredentialStore, TokenSnapshot};
use super::tokens::{ApiKey, TokenPair};

/// An authenticated connection to one Dify deployment.
///
/// All console and dataset operations go through a `Session`. Sessions are
/// obtained via [`Session::login()`] or [`Session::connect()`], or restored
/// with [`Session::from_persisted()`].
///
/// # Thread Safety
///
/// Sessions are cheap to clone (they use internal `Arc`) and are safe to
/// share across tasks. Clones share one credential store, so a refresh
/// performed by one clone is seen by all of them, and concurrent 401s are
/// answered by a single refresh round-trip.
///
/// # Example
///
/// ```no_run
/// use dify::{BaseUrl, ClientConfig, Credentials, Session};
/// use dify::resources::CreateDatasetRequest;
///
/// # async fn example() -> Result<(), dify::Error> {
/// let config = ClientConfig::new(BaseUrl::new("https://dify.example.com")?);
/// let credentials = Credentials::new("admin@example.com", "password");
/// let session = Session::connect(config, &credentials).await?;
///
/// let dataset = session
///     .create_empty_dataset(&CreateDatasetRequest::new("handbook"))
///     .await?;
/// println!("created dataset {}", dataset.id);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    config: ClientConfig,
    executor: Executor,
    store: CredentialStore,
}

/// Outcome of a login or refresh exchange that reached the backend.
enum TokenExchange {
    Issued(TokenPair),
    Rejected(String),
}

impl Session {
    /// Log in with email and password.
    ///
    /// Login is never replayed: a rejection is final and reported as
    /// [`AuthError::LoginRejected`].
    #[instrument(skip(config, credentials), fields(base_url = %config.base_url, email = %credentials.email()))]
    pub async fn login(config: ClientConfig, credentials: &Credentials) -> Result<Self> {
        info!("Logging in");

        let executor = Executor::new(&config)?;
        let pair = login_exchange(&executor, &config, credentials)
            .await
            .during("login")?;

        debug!("Login succeeded");
        Ok(Self::assemble(config, executor, CredentialStore::new(pair, None)))
    }

    /// Log in and provision the dataset API key in one step.
    pub async fn connect(config: ClientConfig, credentials: &Credentials) -> Result<Self> {
        let session = Self::login(config, credentials).await?;
        session.ensure_api_key().await?;
        Ok(session)
    }

    /// Restore a session from persisted tokens without logging in.
    ///
    /// The tokens are not validated; an expired access token is refreshed on
    /// the first console call.
    pub fn from_persisted(
        config: ClientConfig,
        tokens: TokenPair,
        api_key: Option<ApiKey>,
    ) -> Result<Self> {
        let executor = Executor::new(&config)?;
        Ok(Self::assemble(
            config,
            executor,
            CredentialStore::new(tokens, api_key),
        ))
    }

    fn assemble(config: ClientConfig, executor: Executor, store: CredentialStore) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                config,
                executor,
                store,
            }),
        }
    }

    /// Exchange the refresh token for a new token pair.
    ///
    /// Always performs the round-trip. On rejection the stored pair is left
    /// untouched and [`AuthError::RefreshRejected`] is returned; the caller
    /// must log in again.
    #[instrument(skip(self), fields(base_url = %self.inner.config.base_url))]
    pub async fn refresh(&self) -> Result<()> {
        let _gate = self.inner.store.lock_refresh().await;
        self.refresh_locked().await.during("refresh")
    }

    /// Refresh unless the pair of `generation` has already been replaced.
    async fn refresh_if_stale(&self, generation: Option<u64>) -> Result<()> {
        let _gate = self.inner.store.lock_refresh().await;

        if let Some(generation) = generation {
            let current = self.inner.store.generation().await;
            if current != generation {
                debug!(generation, current, "Token already refreshed by a concurrent call");
                return Ok(());
            }
        }

        self.refresh_locked().await
    }

    /// Must be called with the refresh gate held.
    async fn refresh_locked(&self) -> Result<()> {
        info!("Refreshing console session");

        let refresh_token = self.inner.store.refresh_token().await;
        if refresh_token.as_str().is_empty() {
            return Err(AuthError::NotAuthenticated.into());
        }

        let request = RequestDescriptor::post(Transport::Anonymous, REFRESH_TOKEN).json(
            &RefreshTokenRequest {
                refresh_token: refresh_token.as_str(),
            },
        )?;
        let response = self.inner.executor.send_anonymous(request).await?;

        match read_token_exchange(response).await? {
            TokenExchange::Issued(pair) => {
                let generation = self.inner.store.replace_tokens(pair).await;
                debug!(generation, "Session refreshed");
                Ok(())
            }
            TokenExchange::Rejected(reason) => {
                warn!(%reason, "Refresh token rejected");
                Err(AuthError::RefreshRejected { reason }.into())
            }
        }
    }

    /// Return the dataset API key, provisioning it on first use.
    ///
    /// Lists the account's keys and reuses the first one; creates a key only
    /// when none exist. Concurrent callers share one provisioning round.
    #[instrument(skip(self))]
    pub async fn ensure_api_key(&self) -> Result<ApiKey> {
        if let Some(key) = self.inner.store.api_key().await {
            return Ok(key);
        }

        let _gate = self.inner.store.lock_api_key().await;
        if let Some(key) = self.inner.store.api_key().await {
            return Ok(key);
        }

        let key = self
            .get_or_create_api_key()
            .await
            .during("ensure dataset API key")?;
        self.inner.store.set_api_key(key.clone()).await;
        Ok(key)
    }

    /// Forget the cached dataset API key and provision it again.
    #[instrument(skip(self))]
    pub async fn rotate_api_key(&self) -> Result<ApiKey> {
        info!("Rotating dataset API key");

        let _gate = self.inner.store.lock_api_key().await;
        let key = self
            .get_or_create_api_key()
            .await
            .during("rotate dataset API key")?;
        self.inner.store.set_api_key(key.clone()).await;
        Ok(key)
    }

    /// List the dataset API keys of the account.
    #[instrument(skip(self))]
    pub async fn list_api_keys(&self) -> Result<Vec<DatasetApiKey>> {
        let listed: DatasetApiKeyList = self
            .execute_json(|| Ok(RequestDescriptor::get(Transport::Console, DATASET_API_KEYS)))
            .await
            .during("list dataset API keys")?;
        Ok(listed.data)
    }

    async fn get_or_create_api_key(&self) -> Result<ApiKey> {
        let listed: DatasetApiKeyList = self
            .execute_json(|| Ok(RequestDescriptor::get(Transport::Console, DATASET_API_KEYS)))
            .await?;

        if let Some(existing) = listed.data.into_iter().next() {
            debug!(id = %existing.id, "Reusing existing dataset API key");
            return Ok(ApiKey::new(existing.token));
        }

        let created: DatasetApiKey = self
            .execute_json(|| Ok(RequestDescriptor::post(Transport::Console, DATASET_API_KEYS)))
            .await?;

        info!(id = %created.id, "Created dataset API key");
        Ok(ApiKey::new(created.token))
    }

    /// Run a call through the retrying executor with this session's
    /// credentials.
    pub async fn execute<F>(&self, build: F) -> Result<reqwest::Response>
    where
        F: Fn() -> Result<RequestDescriptor> + Send + Sync,
    {
        self.inner.executor.execute(self, build).await
    }

    /// Like [`execute`](Self::execute), decoding the JSON body.
    pub async fn execute_json<R, F>(&self, build: F) -> Result<R>
    where
        R: DeserializeOwned,
        F: Fn() -> Result<RequestDescriptor> + Send + Sync,
    {
        self.inner.executor.execute_json(self, build).await
    }

    /// Copy the current credentials out for persistence.
    ///
    /// # Security
    ///
    /// The snapshot holds live secrets. Store it with restricted permissions.
    pub async fn export_tokens(&self) -> TokenSnapshot {
        self.inner.store.snapshot().await
    }

    /// Returns the deployment this session talks to.
    pub fn base_url(&self) -> &BaseUrl {
        &self.inner.config.base_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &CredentialStore {
        &self.inner.store
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.inner.config.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Authenticator for Session {
    async fn authorize(&self, transport: &Transport) -> Result<Bearer> {
        match transport {
            Transport::Anonymous => Ok(Bearer::none()),
            Transport::Console => {
                let (token, generation) = self.inner.store.access_token().await;
                Ok(Bearer::versioned(token.as_str(), generation))
            }
            Transport::DatasetApiKey => match self.inner.store.api_key().await {
                Some(key) => Ok(Bearer::fixed(key.as_str())),
                None => Err(AuthError::MissingApiKey.into()),
            },
            Transport::App(key) => Ok(Bearer::fixed(key.as_str())),
        }
    }

    async fn renew(&self, expired: &Bearer) -> Result<()> {
        self.refresh_if_stale(expired.generation()).await
    }
}

async fn login_exchange(
    executor: &Executor,
    config: &ClientConfig,
    credentials: &Credentials,
) -> Result<TokenPair> {
    let request = RequestDescriptor::post(Transport::Anonymous, LOGIN).json(&LoginRequest {
        email: credentials.email(),
        password: credentials.password(),
        language: &config.language,
        remember_me: config.remember_me,
    })?;
    let response = executor.send_anonymous(request).await?;

    match read_token_exchange(response).await? {
        TokenExchange::Issued(pair) => Ok(pair),
        TokenExchange::Rejected(reason) => {
            warn!(%reason, "Login rejected");
            Err(AuthError::LoginRejected { reason }.into())
        }
    }
}

/// Classify a login or refresh response.
///
/// An error status or a `result` other than success is a rejection; only a
/// body that cannot be decoded at all is reported as an error.
async fn read_token_exchange(response: reqwest::Response) -> Result<TokenExchange> {
    if !response.status().is_success() {
        let error = parse_error_response(response).await;
        return Ok(TokenExchange::Rejected(error.to_string()));
    }

    let body: TokenResponse = response.json().await?;
    if body.result != RESULT_SUCCESS {
        let reason = body
            .message
            .or_else(|| body.data.as_ref().and_then(|d| d.as_str()).map(str::to_string))
            .unwrap_or_else(|| format!("result '{}'", body.result));
        return Ok(TokenExchange::Rejected(reason));
    }

    let data: TokenData = body
        .data
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| Error::Decode {
            message: format!("malformed token pair: {}", e),
        })?
        .ok_or_else(|| Error::Decode {
            message: "token pair missing from successful response".to_string(),
        })?;
    Ok(TokenExchange::Issued(TokenPair::new(
        data.access_token,
        data.refresh_token,
    )))
}
