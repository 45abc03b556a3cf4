//! Backend base URL type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::error::{Error, InvalidInputError};

/// Path prefix of the console (session) API.
const CONSOLE_PREFIX: &str = "console/api";

/// Path prefix of the service (API key) API.
const SERVICE_PREFIX: &str = "v1";

/// A validated Dify deployment root URL.
///
/// The same root serves two APIs: the console API under `/console/api`,
/// authenticated with the interactive session, and the service API under
/// `/v1`, authenticated with static keys. Self-hosted deployments commonly
/// run on plain HTTP inside a LAN, so both `http` and `https` are accepted.
///
/// A root that was copied from a service URL (ending in `/v1`) is normalized
/// back to the deployment root.
///
/// # Example
///
/// ```
/// use dify::BaseUrl;
///
/// let base = BaseUrl::new("http://192.168.50.21:88/v1").unwrap();
/// assert_eq!(base.console_url("login"), "http://192.168.50.21:88/console/api/login");
/// assert_eq!(base.service_url("datasets"), "http://192.168.50.21:88/v1/datasets");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BaseUrl(Url);

impl BaseUrl {
    /// Create a new base URL from a string, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not valid or doesn't meet requirements.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref();
        let mut url = Url::parse(s).map_err(|e| InvalidInputError::BaseUrl {
            value: s.to_string(),
            reason: e.to_string(),
        })?;

        Self::validate(&url, s)?;

        let path = url.path().trim_end_matches('/');
        let path = path
            .strip_suffix(&format!("/{SERVICE_PREFIX}"))
            .or_else(|| path.strip_suffix(&format!("/{CONSOLE_PREFIX}")))
            .unwrap_or(path)
            .to_string();
        url.set_path(&path);
        url.set_query(None);
        url.set_fragment(None);

        Ok(Self(url))
    }

    /// Returns the console API URL for a path relative to `/console/api`.
    pub fn console_url(&self, path: &str) -> String {
        self.join(CONSOLE_PREFIX, path)
    }

    /// Returns the service API URL for a path relative to `/v1`.
    pub fn service_url(&self, path: &str) -> String {
        self.join(SERVICE_PREFIX, path)
    }

    fn join(&self, prefix: &str, path: &str) -> String {
        // The URL crate always adds a trailing slash to root paths.
        let base = self.0.as_str().trim_end_matches('/');
        format!("{}/{}/{}", base, prefix, path.trim_start_matches('/'))
    }

    /// Returns the base URL as a string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the inner URL.
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Returns the host string.
    pub fn host(&self) -> Option<&str> {
        self.0.host_str()
    }

    fn validate(url: &Url, original: &str) -> Result<(), Error> {
        if url.cannot_be_a_base() {
            return Err(InvalidInputError::BaseUrl {
                value: original.to_string(),
                reason: "must be an absolute URL".to_string(),
            }
            .into());
        }

        if !matches!(url.scheme(), "http" | "https") {
            return Err(InvalidInputError::BaseUrl {
                value: original.to_string(),
                reason: "must use HTTP or HTTPS".to_string(),
            }
            .into());
        }

        if url.host_str().is_none() {
            return Err(InvalidInputError::BaseUrl {
                value: original.to_string(),
                reason: "must have a host".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BaseUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for BaseUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.0.as_str())
    }
}

impl<'de> Deserialize<'de> for BaseUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        BaseUrl::new(&s).map_err(serde::de::Error::custom)
    }
}

impl AsRef<str> for BaseUrl {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_http_lan_address() {
        let base = BaseUrl::new("http://192.168.50.21:88").unwrap();
        assert_eq!(base.host(), Some("192.168.50.21"));
    }

    #[test]
    fn console_and_service_urls() {
        let base = BaseUrl::new("https://dify.example.com").unwrap();
        assert_eq!(
            base.console_url("refresh-token"),
            "https://dify.example.com/console/api/refresh-token"
        );
        assert_eq!(
            base.service_url("/workflows/run"),
            "https://dify.example.com/v1/workflows/run"
        );
    }

    #[test]
    fn strips_service_and_console_suffixes() {
        let from_service = BaseUrl::new("https://dify.example.com/v1/").unwrap();
        let from_console = BaseUrl::new("https://dify.example.com/console/api").unwrap();
        assert_eq!(
            from_service.console_url("login"),
            "https://dify.example.com/console/api/login"
        );
        assert_eq!(from_service, from_console);
    }

    #[test]
    fn keeps_deployment_sub_path() {
        let base = BaseUrl::new("https://example.com/dify").unwrap();
        assert_eq!(base.service_url("datasets"), "https://example.com/dify/v1/datasets");
    }

    #[test]
    fn rejects_other_schemes() {
        assert!(BaseUrl::new("ftp://dify.example.com").is_err());
    }

    #[test]
    fn rejects_relative_url() {
        assert!(BaseUrl::new("/console/api").is_err());
    }
}
