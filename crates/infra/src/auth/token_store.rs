//! Token persistence

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use stagesync_domain::{AccessToken, Result};

/// Storage for per-account calendar tokens
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<Option<AccessToken>>;

    async fn put(&self, user_id: &str, token: AccessToken) -> Result<()>;

    /// Returns whether a token was stored.
    async fn remove(&self, user_id: &str) -> Result<bool>;
}

/// Process-local token store
#[derive(Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<HashMap<String, AccessToken>>,
}

impl MemoryTokenStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored tokens.
    pub fn len(&self) -> usize {
        self.tokens.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.read().is_empty()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self, user_id: &str) -> Result<Option<AccessToken>> {
        Ok(self.tokens.read().get(user_id).cloned())
    }

    async fn put(&self, user_id: &str, token: AccessToken) -> Result<()> {
        self.tokens.write().insert(user_id.to_string(), token);
        Ok(())
    }

    async fn remove(&self, user_id: &str) -> Result<bool> {
        Ok(self.tokens.write().remove(user_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(value: &str) -> AccessToken {
        AccessToken { access_token: value.into(), refresh_token: None, expires_at: None }
    }

    #[tokio::test]
    async fn put_replaces_previous_token() {
        let store = MemoryTokenStore::new();
        store.put("band", token("first")).await.unwrap();
        store.put("band", token("second")).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("band").await.unwrap().unwrap().access_token, "second");
    }

    #[tokio::test]
    async fn remove_reports_whether_anything_was_stored() {
        let store = MemoryTokenStore::new();
        store.put("band", token("t")).await.unwrap();

        assert!(store.remove("band").await.unwrap());
        assert!(!store.remove("band").await.unwrap());
        assert!(store.is_empty());
    }
}
