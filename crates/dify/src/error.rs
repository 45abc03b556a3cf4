//! Error types for the dify client.
//!
//! This module provides a unified error type with explicit variants for
//! transport, authentication, backend response, application-level and input
//! validation errors. Public operations wrap their failures in
//! [`Error::Operation`] so a caller can see which step failed; use
//! [`Error::root`] to inspect the underlying cause.

use std::fmt;
use thiserror::Error;

/// The unified error type for dify operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (DNS, TLS, connection, timeout, body read).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Authentication errors (rejected credentials, rejected refresh token).
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// The backend answered with an HTTP error status.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// The backend answered 2xx but reported a failure in the body.
    #[error("application error: {0}")]
    Application(#[from] ApplicationError),

    /// Input validation errors (base URL, header values, upload files).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// A successful response body could not be decoded.
    #[error("failed to decode response: {message}")]
    Decode { message: String },

    /// An error annotated with the operation that produced it.
    #[error("{operation}: {source}")]
    Operation {
        operation: &'static str,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wrap this error with the name of the failing operation.
    pub fn during(self, operation: &'static str) -> Self {
        Error::Operation {
            operation,
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, skipping operation annotations.
    pub fn root(&self) -> &Error {
        let mut current = self;
        while let Error::Operation { source, .. } = current {
            current = source;
        }
        current
    }

    /// Returns true if the session can no longer be used and the caller has
    /// to log in again.
    pub fn is_auth_fatal(&self) -> bool {
        matches!(
            self.root(),
            Error::Auth(AuthError::LoginRejected { .. })
                | Error::Auth(AuthError::RefreshRejected { .. })
                | Error::Auth(AuthError::NotAuthenticated)
        )
    }

    /// Returns the HTTP status of a response-level error, if any.
    pub fn status(&self) -> Option<u16> {
        match self.root() {
            Error::Api(api) => Some(api.status),
            _ => None,
        }
    }
}

/// Annotate a result's error with an operation name.
pub(crate) trait ResultExt<T> {
    fn during(self, operation: &'static str) -> Result<T, Error>;
}

impl<T, E: Into<Error>> ResultExt<T> for Result<T, E> {
    fn during(self, operation: &'static str) -> Result<T, Error> {
        self.map_err(|e| Into::<Error>::into(e).during(operation))
    }
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out: {message}")]
    Timeout { message: String },

    /// Reading a response body failed midway.
    #[error("body read failed: {message}")]
    Body { message: String },

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout {
                message: err.to_string(),
            }
        } else if err.is_connect() {
            TransportError::Connection {
                message: err.to_string(),
            }
        } else if err.is_body() {
            TransportError::Body {
                message: err.to_string(),
            }
        } else {
            TransportError::Http {
                message: err.to_string(),
            }
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Error::Decode {
                message: err.to_string(),
            }
        } else {
            Error::Transport(TransportError::from(err))
        }
    }
}

/// Authentication-related errors.
///
/// Every variant but [`AuthError::MissingApiKey`] is fatal for the session:
/// nothing is retried and the caller has to log in again.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The login endpoint rejected the credentials.
    #[error("login rejected: {reason}")]
    LoginRejected { reason: String },

    /// The refresh token was rejected.
    #[error("refresh token rejected: {reason}")]
    RefreshRejected { reason: String },

    /// The session holds no refresh token.
    #[error("not authenticated")]
    NotAuthenticated,

    /// A service call needs the dataset API key before one was provisioned.
    #[error("no dataset API key provisioned")]
    MissingApiKey,
}

/// An HTTP error response from the backend.
///
/// Dify error bodies look like `{"code": "...", "message": "...", "status": 400}`.
/// When the body cannot be parsed the code falls back to `unknown_error`.
#[derive(Debug)]
pub struct ApiError {
    /// HTTP status code.
    pub status: u16,
    /// Backend error code.
    pub code: String,
    /// Error message from the backend.
    pub message: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {} [{}]", self.status, self.code)?;
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// Code used when the error body is missing or not JSON.
    pub const UNKNOWN_CODE: &'static str = "unknown_error";

    /// Create a new API error.
    pub fn new(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Check if this is an authentication expiry.
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}

/// A 2xx response whose body reports a failure.
#[derive(Debug)]
pub struct ApplicationError {
    /// The `result` marker returned by the backend.
    pub result: String,
    /// Optional message from the backend.
    pub message: Option<String>,
}

impl fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "result '{}'", self.result)?;
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApplicationError {}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid base URL format.
    #[error("invalid base URL '{value}': {reason}")]
    BaseUrl { value: String, reason: String },

    /// A token contains characters that cannot go into a header.
    #[error("invalid header value for {name}")]
    Header { name: &'static str },

    /// A file to upload could not be read.
    #[error("cannot read upload '{path}': {reason}")]
    Upload { path: String, reason: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_skips_operation_layers() {
        let err = Error::from(AuthError::RefreshRejected {
            reason: "expired".into(),
        })
        .during("refresh")
        .during("create chat app");

        assert!(matches!(
            err.root(),
            Error::Auth(AuthError::RefreshRejected { .. })
        ));
        assert!(err.is_auth_fatal());
        assert_eq!(
            err.to_string(),
            "create chat app: refresh: authentication error: refresh token rejected: expired"
        );
    }

    #[test]
    fn api_errors_are_not_fatal() {
        let err = Error::from(ApiError::new(401, "unauthorized", "bad key")).during("create dataset");
        assert!(!err.is_auth_fatal());
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn application_error_display() {
        let err = ApplicationError {
            result: "fail".into(),
            message: Some("quota exceeded".into()),
        };
        assert_eq!(err.to_string(), "result 'fail': quota exceeded");

        let bare = ApplicationError {
            result: "fail".into(),
            message: None,
        };
        assert_eq!(bare.to_string(), "result 'fail'");
    }
}
