use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use crate::core::retry::RetryPolicy;
use crate::core::token::TokenManager;
use crate::domain::model::{Offer, OfferQuery, OffersResponse};
use crate::domain::ports::CacheStore;
use crate::utils::error::{GatewayError, Result};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub offers_url: String,
    pub currency: String,
    pub cache_ttl: Duration,
}

/// Produces the raw offer list for a query, consulting the cache when
/// permitted and calling upstream under the retry policy otherwise.
pub struct OfferFetcher {
    client: Client,
    cache: Arc<dyn CacheStore>,
    tokens: Arc<TokenManager>,
    retry: RetryPolicy,
    settings: FetchSettings,
}

impl OfferFetcher {
    pub fn new(
        client: Client,
        cache: Arc<dyn CacheStore>,
        tokens: Arc<TokenManager>,
        retry: RetryPolicy,
        settings: FetchSettings,
    ) -> Self {
        Self {
            client,
            cache,
            tokens,
            retry,
            settings,
        }
    }

    /// Bypass (`no_cache`) skips the cache read and also forces a fresh
    /// token even when the held one is still valid. The two concerns are
    /// logically independent, but the service this replaces coupled them,
    /// so the coupling is kept until product intent says otherwise.
    pub async fn fetch(&self, query: &OfferQuery) -> Result<Vec<Offer>> {
        let cache_key = query.cache_key();

        if query.no_cache {
            tracing::info!("cache bypass requested, forcing token refresh");
            self.tokens.refresh().await?;
        } else if let Some(value) = self.cache.get(&cache_key).await {
            match serde_json::from_value::<Vec<Offer>>(value) {
                Ok(offers) => {
                    tracing::debug!("returning cached flight offers for {}", cache_key);
                    return Ok(offers);
                }
                Err(e) => {
                    tracing::warn!("discarding undecodable cache entry {}: {}", cache_key, e);
                }
            }
        }

        let offers = self
            .retry
            .run(|| self.fetch_upstream(query), GatewayError::is_transient)
            .await?;

        self.cache
            .set(
                &cache_key,
                serde_json::to_value(&offers)?,
                self.settings.cache_ttl,
            )
            .await;

        Ok(offers)
    }

    async fn fetch_upstream(&self, query: &OfferQuery) -> Result<Vec<Offer>> {
        let token = self.tokens.token().await?;

        tracing::debug!(
            "requesting flight offers from {} for {}",
            self.settings.offers_url,
            query.cache_key()
        );

        let response = self
            .client
            .get(&self.settings.offers_url)
            .bearer_auth(&token.value)
            .query(&[
                ("originLocationCode", query.origin.clone()),
                ("destinationLocationCode", query.destination.clone()),
                ("departureDate", query.departure_date.to_string()),
                ("adults", query.adults.to_string()),
                ("max", query.max_results.to_string()),
                ("currencyCode", self.settings.currency.clone()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::error!("offer request failed with status {}: {}", status, message);
            return Err(GatewayError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: OffersResponse = response.json().await?;
        Ok(parsed.data)
    }
}
