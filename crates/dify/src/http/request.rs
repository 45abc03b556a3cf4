//! Request descriptors consumed by the executor.

use reqwest::Method;
use reqwest::multipart::Form;
use serde::Serialize;

use crate::auth::ApiKey;
use crate::error::{Error, InvalidInputError};

/// Which API surface a request path is relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Api {
    /// `/console/api`
    Console,
    /// `/v1`
    Service,
}

/// The trust domain a request is sent in, which decides its bearer token and
/// whether an expired token may be refreshed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    /// Unauthenticated console call (login, refresh).
    Anonymous,
    /// Interactive console session; bearer is the rotating access token.
    Console,
    /// Service API with the session's long-lived dataset API key.
    DatasetApiKey,
    /// Service API with an app's own key, supplied by the caller.
    App(ApiKey),
}

impl Transport {
    /// The API surface this transport talks to.
    pub fn api(&self) -> Api {
        match self {
            Transport::Anonymous | Transport::Console => Api::Console,
            Transport::DatasetApiKey | Transport::App(_) => Api::Service,
        }
    }

    /// Only the console session can be renewed after a 401.
    pub fn is_refreshable(&self) -> bool {
        matches!(self, Transport::Console)
    }
}

/// Body of an outbound request.
#[derive(Debug, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(Form),
}

/// One outbound call.
///
/// Descriptors are consumed when sent. The executor asks its builder for a
/// fresh one before every attempt, since a multipart body cannot be replayed.
#[derive(Debug)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    pub transport: Transport,
    pub body: RequestBody,
    /// Streaming responses are exempt from the total request timeout.
    pub streaming: bool,
}

impl RequestDescriptor {
    pub fn new(method: Method, transport: Transport, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            transport,
            body: RequestBody::Empty,
            streaming: false,
        }
    }

    pub fn get(transport: Transport, path: impl Into<String>) -> Self {
        Self::new(Method::GET, transport, path)
    }

    pub fn post(transport: Transport, path: impl Into<String>) -> Self {
        Self::new(Method::POST, transport, path)
    }

    /// Attach a JSON body.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, Error> {
        let value = serde_json::to_value(body).map_err(|e| InvalidInputError::Other {
            message: format!("cannot encode request body: {}", e),
        })?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    /// Attach a multipart body.
    pub fn multipart(mut self, form: Form) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    /// Mark the response as a long-lived stream.
    pub fn streaming(mut self) -> Self {
        self.streaming = true;
        self
    }
}
