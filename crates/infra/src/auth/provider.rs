//! OAuth-backed credential provider
//!
//! Serves stored tokens to the sync engine and refreshes them against the
//! token endpoint once they are expired or close to expiry.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use reqwest::Method;
use serde::Deserialize;
use stagesync_core::{Clock, CredentialProvider, SystemClock};
use stagesync_domain::{AccessToken, OAuthSettings, Result, StageSyncError};
use tracing::{debug, info, instrument, warn};

use super::token_store::TokenStore;
use crate::http::HttpClient;

/// Token endpoint response for `grant_type=refresh_token`
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    /// Some providers rotate the refresh token.
    #[serde(default)]
    refresh_token: Option<String>,
}

/// [`CredentialProvider`] backed by a [`TokenStore`] and the token endpoint
pub struct OAuthCredentialProvider {
    store: Arc<dyn TokenStore>,
    http: HttpClient,
    settings: OAuthSettings,
    clock: Arc<dyn Clock>,
}

impl OAuthCredentialProvider {
    /// Create a provider with the system clock
    pub fn new(store: Arc<dyn TokenStore>, http: HttpClient, settings: OAuthSettings) -> Self {
        Self { store, http, settings, clock: Arc::new(SystemClock) }
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Store a token obtained from the authorization-code flow.
    #[instrument(skip(self, token))]
    pub async fn connect(&self, user_id: &str, token: AccessToken) -> Result<()> {
        if token.access_token.trim().is_empty() {
            return Err(StageSyncError::InvalidInput("access token is empty".into()));
        }
        self.store.put(user_id, token).await?;
        info!("calendar account connected");
        Ok(())
    }

    /// Forget the account's token. Returns whether one was stored.
    #[instrument(skip(self))]
    pub async fn disconnect(&self, user_id: &str) -> Result<bool> {
        let removed = self.store.remove(user_id).await?;
        if removed {
            info!("calendar account disconnected");
        }
        Ok(removed)
    }

    /// Exchange `refresh_token` for a new access token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AccessToken> {
        let mut form = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.settings.client_id.as_str()),
        ];
        if let Some(secret) = self.settings.client_secret.as_deref() {
            form.push(("client_secret", secret));
        }

        let request = self.http.request(Method::POST, &self.settings.token_endpoint).form(&form);
        let response: RefreshResponse = self.http.send_json(request).await.map_err(|err| {
            match err {
                // A rejected grant is an auth problem regardless of the status code used.
                StageSyncError::InvalidInput(msg) => StageSyncError::Auth(msg),
                other => other,
            }
        })?;

        let now = self.clock.now();
        Ok(AccessToken {
            access_token: response.access_token,
            refresh_token: response.refresh_token.or_else(|| Some(refresh_token.to_string())),
            expires_at: response.expires_in.map(|secs| now + Duration::seconds(secs)),
        })
    }

    fn refresh_skew(&self) -> Duration {
        Duration::seconds(self.settings.refresh_threshold_seconds.max(0))
    }
}

#[async_trait]
impl CredentialProvider for OAuthCredentialProvider {
    #[instrument(skip(self))]
    async fn get_valid_token(&self, user_id: &str) -> Result<Option<AccessToken>> {
        let Some(token) = self.store.get(user_id).await? else {
            return Ok(None);
        };

        let now = self.clock.now();
        if !token.expires_within(now, self.refresh_skew()) {
            return Ok(Some(token));
        }

        let Some(refresh_token) = token.refresh_token.clone() else {
            if token.is_expired(now) {
                debug!("token expired and no refresh token stored");
                return Ok(None);
            }
            return Ok(Some(token));
        };

        match self.refresh(&refresh_token).await {
            Ok(fresh) => {
                self.store.put(user_id, fresh.clone()).await?;
                debug!(expires_at = ?fresh.expires_at, "access token refreshed");
                Ok(Some(fresh))
            }
            Err(err) if !token.is_expired(now) => {
                warn!(error = %err, "token refresh failed; using current token until it expires");
                Ok(Some(token))
            }
            Err(err) => {
                warn!(error = %err, "token refresh failed");
                Ok(None)
            }
        }
    }

    async fn is_connected(&self, user_id: &str) -> Result<bool> {
        Ok(self.store.get(user_id).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration as StdDuration;

    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::auth::MemoryTokenStore;

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn provider(server: &MockServer, store: Arc<MemoryTokenStore>) -> OAuthCredentialProvider {
        let http = HttpClient::builder()
            .max_attempts(1)
            .base_backoff(StdDuration::from_millis(1))
            .build()
            .unwrap();
        let settings = OAuthSettings {
            token_endpoint: format!("{}/token", server.uri()),
            client_id: "client-123".into(),
            client_secret: Some("shh".into()),
            refresh_threshold_seconds: 300,
        };
        OAuthCredentialProvider::new(store, http, settings).with_clock(Arc::new(FixedClock(now())))
    }

    fn token(expires_in_secs: i64, refresh: Option<&str>) -> AccessToken {
        AccessToken {
            access_token: "old-access".into(),
            refresh_token: refresh.map(str::to_string),
            expires_at: Some(now() + Duration::seconds(expires_in_secs)),
        }
    }

    #[tokio::test]
    async fn fresh_token_is_returned_without_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("POST")).respond_with(ResponseTemplate::new(500)).expect(0).mount(&server).await;

        let store = Arc::new(MemoryTokenStore::new());
        store.put("band", token(3600, Some("r"))).await.unwrap();

        let got = provider(&server, store).get_valid_token("band").await.unwrap().unwrap();
        assert_eq!(got.access_token, "old-access");
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_and_persisted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=refresh-1"))
            .and(body_string_contains("client_secret=shh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "new-access",
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryTokenStore::new());
        store.put("band", token(-60, Some("refresh-1"))).await.unwrap();

        let got = provider(&server, store.clone()).get_valid_token("band").await.unwrap().unwrap();
        assert_eq!(got.access_token, "new-access");
        assert_eq!(got.refresh_token.as_deref(), Some("refresh-1"));
        assert_eq!(got.expires_at, Some(now() + Duration::seconds(3599)));

        let stored = store.get("band").await.unwrap().unwrap();
        assert_eq!(stored.access_token, "new-access");
    }

    #[tokio::test]
    async fn token_near_expiry_is_refreshed_early() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "new-access",
                "expires_in": 3600,
                "refresh_token": "rotated"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryTokenStore::new());
        store.put("band", token(120, Some("refresh-1"))).await.unwrap();

        let got = provider(&server, store).get_valid_token("band").await.unwrap().unwrap();
        assert_eq!(got.refresh_token.as_deref(), Some("rotated"));
    }

    #[tokio::test]
    async fn failed_refresh_of_expired_token_yields_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Token has been expired or revoked."
            })))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryTokenStore::new());
        store.put("band", token(-60, Some("revoked"))).await.unwrap();
        let provider = provider(&server, store);

        assert!(provider.get_valid_token("band").await.unwrap().is_none());
        let err = provider.refresh("revoked").await.unwrap_err();
        assert!(matches!(err, StageSyncError::Auth(ref msg) if msg.contains("invalid_grant")));
    }

    #[tokio::test]
    async fn failed_early_refresh_keeps_current_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST")).respond_with(ResponseTemplate::new(503)).mount(&server).await;

        let store = Arc::new(MemoryTokenStore::new());
        store.put("band", token(120, Some("refresh-1"))).await.unwrap();

        let got = provider(&server, store).get_valid_token("band").await.unwrap().unwrap();
        assert_eq!(got.access_token, "old-access");
    }

    #[tokio::test]
    async fn expired_token_without_refresh_token_yields_none() {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryTokenStore::new());
        store.put("band", token(-1, None)).await.unwrap();

        let provider = provider(&server, store);
        assert!(provider.get_valid_token("band").await.unwrap().is_none());
        assert!(provider.is_connected("band").await.unwrap());
    }

    #[tokio::test]
    async fn connect_and_disconnect_round_the_store() {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryTokenStore::new());
        let provider = provider(&server, store);

        assert!(!provider.is_connected("venue").await.unwrap());
        provider.connect("venue", token(3600, None)).await.unwrap();
        assert!(provider.is_connected("venue").await.unwrap());

        assert!(provider.disconnect("venue").await.unwrap());
        assert!(!provider.disconnect("venue").await.unwrap());
        assert!(provider.get_valid_token("venue").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn connect_rejects_empty_tokens() {
        let server = MockServer::start().await;
        let provider = provider(&server, Arc::new(MemoryTokenStore::new()));
        let mut empty = token(3600, None);
        empty.access_token = "  ".into();

        assert!(matches!(
            provider.connect("venue", empty).await,
            Err(StageSyncError::InvalidInput(_))
        ));
    }
}
