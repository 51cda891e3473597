use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::domain::model::AccessToken;
use crate::domain::ports::CacheStore;
use crate::utils::error::{GatewayError, Result};

pub const TOKEN_CACHE_KEY: &str = "amadeus_access_token";

/// Lifetime assumed when the provider omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 1800;

#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub expiry_margin: Duration,
}

/// Owns the current bearer credential and its expiry instant.
///
/// Expiry is checked lazily on each `token()` call; there is no background
/// refresh timer. The check-then-refresh section runs under one mutex, so N
/// concurrent callers observing a stale token produce exactly one upstream
/// refresh and share its outcome.
pub struct TokenManager {
    client: Client,
    cache: Arc<dyn CacheStore>,
    settings: TokenSettings,
    current: Mutex<Option<AccessToken>>,
}

#[derive(Debug, Deserialize)]
struct TokenGrant {
    access_token: String,
    expires_in: Option<u64>,
}

impl TokenManager {
    /// Restores a previously cached token when it is still usable under the
    /// margin, otherwise refreshes eagerly so the manager never starts in an
    /// invalid state.
    pub async fn new(
        client: Client,
        cache: Arc<dyn CacheStore>,
        settings: TokenSettings,
    ) -> Result<Self> {
        let manager = Self {
            client,
            cache,
            settings,
            current: Mutex::new(None),
        };

        match manager.load_cached().await {
            Some(token) => {
                tracing::info!("using cached access token");
                *manager.current.lock().await = Some(token);
            }
            None => {
                tracing::info!("no valid cached token found, fetching a new one");
                manager.refresh().await?;
            }
        }

        Ok(manager)
    }

    async fn load_cached(&self) -> Option<AccessToken> {
        let value = self.cache.get(TOKEN_CACHE_KEY).await?;
        let token: AccessToken = serde_json::from_value(value).ok()?;
        token
            .is_usable(self.settings.expiry_margin, Utc::now())
            .then_some(token)
    }

    /// Returns a credential valid for at least the configured safety margin,
    /// refreshing first when the held token is missing or near expiry.
    pub async fn token(&self) -> Result<AccessToken> {
        let mut current = self.current.lock().await;

        if let Some(token) = current.as_ref() {
            if token.is_usable(self.settings.expiry_margin, Utc::now()) {
                return Ok(token.clone());
            }
        }

        tracing::info!("access token missing or near expiry, refreshing");
        let token = self.fetch_token().await?;
        *current = Some(token.clone());
        Ok(token)
    }

    /// Unconditionally fetches a new token, replacing the held one. Fails
    /// fast with an auth error; refresh is never retried.
    pub async fn refresh(&self) -> Result<AccessToken> {
        let mut current = self.current.lock().await;
        let token = self.fetch_token().await?;
        *current = Some(token.clone());
        Ok(token)
    }

    async fn fetch_token(&self) -> Result<AccessToken> {
        tracing::debug!("requesting access token from {}", self.settings.token_url);

        let response = self
            .client
            .post(&self.settings.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.settings.client_id.as_str()),
                ("client_secret", self.settings.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| GatewayError::Auth {
                status: None,
                message: format!("token endpoint unreachable: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::error!("token request failed with status {}: {}", status, message);
            return Err(GatewayError::Auth {
                status: Some(status.as_u16()),
                message,
            });
        }

        let grant: TokenGrant = response.json().await.map_err(|e| GatewayError::Auth {
            status: None,
            message: format!("malformed token response: {}", e),
        })?;

        let expires_in = grant.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
        let token = AccessToken {
            value: grant.access_token,
            expires_at: Utc::now() + chrono::Duration::seconds(expires_in as i64),
        };

        self.cache
            .set(
                TOKEN_CACHE_KEY,
                serde_json::to_value(&token)?,
                Duration::from_secs(expires_in),
            )
            .await;

        tracing::info!("fetched new access token, expires in {}s", expires_in);
        Ok(token)
    }
}
