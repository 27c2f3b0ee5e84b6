//! In-process bearer token cache.
//!
//! Holds at most one token per client. The cache is populated on demand by
//! the credential provider and cleared only by an explicit
//! [`TokenCache::invalidate`]; there is no expiry tracking.
//!
//! Writers are serialized through [`TokenCache::write_guard`] so a single
//! token exchange is in flight at a time. Readers never wait on an exchange
//! that is not holding the inner lock.

use crate::types::AccessToken;
use tokio::sync::{Mutex, MutexGuard, RwLock};

#[derive(Debug, Default)]
pub struct TokenCache {
    token: RwLock<Option<AccessToken>>,
    writer: Mutex<()>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current token, if one has been cached
    pub async fn get(&self) -> Option<AccessToken> {
        self.token.read().await.clone()
    }

    /// Replace the cached token
    pub async fn set(&self, token: AccessToken) {
        *self.token.write().await = Some(token);
    }

    /// Drop the cached token so the next request performs a new exchange
    pub async fn invalidate(&self) {
        *self.token.write().await = None;
    }

    /// Acquire the single-writer guard.
    ///
    /// Hold it across check-fetch-store so concurrent callers with an empty
    /// cache perform one exchange between them.
    pub async fn write_guard(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().await
    }
}
