//! HTTP client implementation.

use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, trace};

use crate::config::ClientConfig;
use crate::error::{ApiError, Error, InvalidInputError, TransportError};
use crate::types::BaseUrl;

use super::endpoints::ErrorBody;
use super::request::{Api, RequestBody, RequestDescriptor};

/// HTTP client shared by every transport of a session.
///
/// Sends one descriptor at a time and classifies the response; it knows
/// nothing about retries.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base: BaseUrl,
    timeout: Duration,
}

impl HttpClient {
    /// Create a new client for the configured deployment.
    pub fn new(config: &ClientConfig) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(TransportError::from)?;

        Ok(Self {
            client,
            base: config.base_url.clone(),
            timeout: config.timeout,
        })
    }

    fn url_for(&self, request: &RequestDescriptor) -> String {
        match request.transport.api() {
            Api::Console => self.base.console_url(&request.path),
            Api::Service => self.base.service_url(&request.path),
        }
    }

    /// Send a request with an optional bearer token.
    ///
    /// Only transport failures are errors here; the caller classifies the
    /// status code.
    #[instrument(skip_all, fields(method = %request.method, path = %request.path))]
    pub async fn send(
        &self,
        request: RequestDescriptor,
        bearer: Option<&str>,
    ) -> Result<reqwest::Response, Error> {
        let url = self.url_for(&request);
        debug!(%url, transport = ?request.transport.api(), "sending request");

        let mut builder = self.client.request(request.method, &url);

        if let Some(token) = bearer {
            builder = builder.header(AUTHORIZATION, bearer_header(token)?);
        }

        if request.streaming {
            builder = builder.header(ACCEPT, HeaderValue::from_static("text/event-stream"));
        } else {
            builder = builder.timeout(self.timeout);
        }

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(form) => builder.multipart(form),
        };

        let response = builder.send().await.map_err(TransportError::from)?;
        trace!(status = %response.status(), "response");
        Ok(response)
    }

    /// Pass a success response through, or turn an error status into an
    /// [`ApiError`].
    pub async fn check_status(&self, response: reqwest::Response) -> Result<reqwest::Response, Error> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Error::Api(parse_error_response(response).await))
        }
    }

    /// Decode a success response body as JSON.
    pub async fn decode<R: DeserializeOwned>(&self, response: reqwest::Response) -> Result<R, Error> {
        Ok(response.json::<R>().await?)
    }
}

fn bearer_header(token: &str) -> Result<HeaderValue, Error> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|_| InvalidInputError::Header {
            name: "authorization",
        })?;
    value.set_sensitive(true);
    Ok(value)
}

/// Parse a backend error response.
pub(crate) async fn parse_error_response(response: reqwest::Response) -> ApiError {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();

    match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => ApiError::new(
            status,
            body.code.unwrap_or_else(|| ApiError::UNKNOWN_CODE.to_string()),
            body.message.unwrap_or_default(),
        ),
        Err(_) => {
            let message = if text.trim().is_empty() {
                "An unknown error occurred".to_string()
            } else {
                text.trim().chars().take(512).collect()
            };
            ApiError::new(status, ApiError::UNKNOWN_CODE, message)
        }
    }
}
