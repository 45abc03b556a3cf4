//! In-memory credential store shared by every call on a session.

use tokio::sync::{Mutex, MutexGuard, RwLock};

use super::tokens::{AccessToken, ApiKey, RefreshToken, TokenPair};

/// Holds the session's token pair and cached dataset API key.
///
/// Readers always see a complete pair: the access and refresh tokens live
/// behind one lock and are swapped together. Every swap bumps a generation
/// counter, which lets the executor tell whether a 401 it observed was
/// produced by a token that has since been replaced.
///
/// The store is mutated only by [`Session`](super::Session).
#[derive(Debug)]
pub struct CredentialStore {
    tokens: RwLock<TokenState>,
    api_key: RwLock<Option<ApiKey>>,
    refresh_gate: Mutex<()>,
    api_key_gate: Mutex<()>,
}

#[derive(Debug)]
struct TokenState {
    pair: TokenPair,
    generation: u64,
}

/// A point-in-time copy of the store, for persistence.
#[derive(Debug, Clone)]
pub struct TokenSnapshot {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub api_key: Option<ApiKey>,
    pub generation: u64,
}

impl CredentialStore {
    pub fn new(pair: TokenPair, api_key: Option<ApiKey>) -> Self {
        Self {
            tokens: RwLock::new(TokenState {
                pair,
                generation: 1,
            }),
            api_key: RwLock::new(api_key),
            refresh_gate: Mutex::new(()),
            api_key_gate: Mutex::new(()),
        }
    }

    /// Returns the current access token and its generation.
    pub async fn access_token(&self) -> (AccessToken, u64) {
        let state = self.tokens.read().await;
        (state.pair.access.clone(), state.generation)
    }

    /// Returns the current refresh token.
    pub async fn refresh_token(&self) -> RefreshToken {
        self.tokens.read().await.pair.refresh.clone()
    }

    /// Returns the generation of the current token pair.
    pub async fn generation(&self) -> u64 {
        self.tokens.read().await.generation
    }

    /// Returns the cached dataset API key, if one was provisioned.
    pub async fn api_key(&self) -> Option<ApiKey> {
        self.api_key.read().await.clone()
    }

    /// Copy every credential out of the store.
    pub async fn snapshot(&self) -> TokenSnapshot {
        let (pair, generation) = {
            let state = self.tokens.read().await;
            (state.pair.clone(), state.generation)
        };
        TokenSnapshot {
            access_token: pair.access,
            refresh_token: pair.refresh,
            api_key: self.api_key().await,
            generation,
        }
    }

    /// Swap in a new token pair and return the new generation.
    pub(crate) async fn replace_tokens(&self, pair: TokenPair) -> u64 {
        let mut state = self.tokens.write().await;
        state.pair = pair;
        state.generation += 1;
        state.generation
    }

    pub(crate) async fn set_api_key(&self, key: ApiKey) {
        *self.api_key.write().await = Some(key);
    }

    /// Serialises refreshes. Held across the refresh round-trip.
    pub(crate) async fn lock_refresh(&self) -> MutexGuard<'_, ()> {
        self.refresh_gate.lock().await
    }

    /// Serialises API key provisioning so concurrent callers create at most one key.
    pub(crate) async fn lock_api_key(&self) -> MutexGuard<'_, ()> {
        self.api_key_gate.lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replace_bumps_generation_and_swaps_pair() {
        let store = CredentialStore::new(TokenPair::new("a1", "r1"), None);
        let (access, generation) = store.access_token().await;
        assert_eq!(access.as_str(), "a1");
        assert_eq!(generation, 1);

        let next = store.replace_tokens(TokenPair::new("a2", "r2")).await;
        assert_eq!(next, 2);

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.access_token.as_str(), "a2");
        assert_eq!(snapshot.refresh_token.as_str(), "r2");
        assert_eq!(snapshot.generation, 2);
    }

    #[tokio::test]
    async fn api_key_starts_empty_until_set() {
        let store = CredentialStore::new(TokenPair::new("a", "r"), None);
        assert!(store.api_key().await.is_none());

        store.set_api_key(ApiKey::new("dataset-key")).await;
        assert_eq!(store.api_key().await.unwrap().as_str(), "dataset-key");
    }
}
