//! Retrying request executor.
//!
//! Every call goes out at most twice: once with the current token and, when
//! a console-session request comes back 401, once more after the session
//! has been refreshed. Transport failures and every other error status are
//! returned as-is.

use std::fmt;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::config::ClientConfig;
use crate::Result;
use crate::http::{HttpClient, RequestDescriptor, Transport};

/// A bearer credential resolved for one attempt.
///
/// `generation` is set for console tokens and identifies which token pair
/// the attempt was sent with.
#[derive(Clone, PartialEq, Eq)]
pub struct Bearer {
    token: Option<String>,
    generation: Option<u64>,
}

impl Bearer {
    /// No authorization header.
    pub fn none() -> Self {
        Self {
            token: None,
            generation: None,
        }
    }

    /// A static token that is never refreshed.
    pub fn fixed(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            generation: None,
        }
    }

    /// A refreshable token of the given generation.
    pub fn versioned(token: impl Into<String>, generation: u64) -> Self {
        Self {
            token: Some(token.into()),
            generation: Some(generation),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn generation(&self) -> Option<u64> {
        self.generation
    }
}

impl fmt::Debug for Bearer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bearer")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("generation", &self.generation)
            .finish()
    }
}

/// Supplies tokens to the executor and renews an expired console session.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Resolve the bearer for a transport at the moment of sending.
    async fn authorize(&self, transport: &Transport) -> Result<Bearer>;

    /// Renew the console session after `expired` was answered with a 401.
    ///
    /// Implementations may skip the round-trip when the token has already
    /// been replaced since `expired` was issued.
    async fn renew(&self, expired: &Bearer) -> Result<()>;
}

/// Issues requests and replays a console request once after a refresh.
#[derive(Debug, Clone)]
pub struct Executor {
    http: HttpClient,
}

impl Executor {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(config)?,
        })
    }

    /// Run one logical call.
    ///
    /// `build` is invoked before every attempt so headers pick up the token
    /// current at that time and bodies are constructed fresh. Returns the
    /// response of a 2xx status; any other status becomes an
    /// [`ApiError`](crate::error::ApiError).
    #[instrument(skip_all)]
    pub async fn execute<A, F>(&self, auth: &A, build: F) -> Result<reqwest::Response>
    where
        A: Authenticator + ?Sized,
        F: Fn() -> Result<RequestDescriptor> + Send + Sync,
    {
        let (response, bearer, refreshable) = self.attempt(auth, &build).await?;

        if response.status() != StatusCode::UNAUTHORIZED || !refreshable {
            return self.http.check_status(response).await;
        }

        debug!("console token rejected, refreshing before replay");
        drop(response);

        if let Err(e) = auth.renew(&bearer).await {
            warn!(error = %e, "refresh after 401 failed");
            return Err(e.during("refresh console access token"));
        }

        let (response, _, _) = self.attempt(auth, &build).await?;
        self.http.check_status(response).await
    }

    /// Run one logical call and decode the JSON body.
    pub async fn execute_json<A, F, R>(&self, auth: &A, build: F) -> Result<R>
    where
        A: Authenticator + ?Sized,
        F: Fn() -> Result<RequestDescriptor> + Send + Sync,
        R: DeserializeOwned,
    {
        let response = self.execute(auth, build).await?;
        self.http.decode(response).await
    }

    /// Send a request without any authorization or retry.
    pub async fn send_anonymous(&self, request: RequestDescriptor) -> Result<reqwest::Response> {
        self.http.send(request, None).await
    }

    async fn attempt<A, F>(&self, auth: &A, build: &F) -> Result<(reqwest::Response, Bearer, bool)>
    where
        A: Authenticator + ?Sized,
        F: Fn() -> Result<RequestDescriptor> + Send + Sync,
    {
        let request = build()?;
        let refreshable = request.transport.is_refreshable();
        let bearer = auth.authorize(&request.transport).await?;
        let response = self.http.send(request, bearer.token()).await?;
        Ok((response, bearer, refreshable))
    }
}
