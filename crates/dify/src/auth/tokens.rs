//! Bearer credential types.

use std::fmt;

macro_rules! secret_token {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw token value.
            pub fn new(token: impl Into<String>) -> Self {
                Self(token.into())
            }

            /// Returns the raw token value.
            ///
            /// # Security
            ///
            /// Use only for authorization headers, refresh requests and
            /// persistence. Never log the returned value.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&"[REDACTED]").finish()
            }
        }
    };
}

secret_token! {
    /// Short-lived bearer token for the console transport.
    AccessToken
}

secret_token! {
    /// Token used solely to mint a new access/refresh pair.
    RefreshToken
}

secret_token! {
    /// Long-lived dataset API key for the service transport.
    ///
    /// Never refreshed automatically; replaced only by an explicit rotation.
    ApiKey
}

/// An access token together with the refresh token issued alongside it.
///
/// The pair is always replaced as a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access: AccessToken,
    pub refresh: RefreshToken,
}

impl TokenPair {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: AccessToken::new(access),
            refresh: RefreshToken::new(refresh),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_token_hides_value_in_debug() {
        let token = AccessToken::new("eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...");
        let debug = format!("{:?}", token);
        assert!(!debug.contains("eyJ"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn token_pair_hides_both_values() {
        let pair = TokenPair::new("access-value", "refresh-value");
        let debug = format!("{:?}", pair);
        assert!(!debug.contains("access-value"));
        assert!(!debug.contains("refresh-value"));
    }

    #[test]
    fn api_key_hides_value_in_debug() {
        let key = ApiKey::new("dataset-22i7BMiiZaobMzRTLffm3mDX");
        assert_eq!(format!("{:?}", key), "ApiKey(\"[REDACTED]\")");
    }
}
