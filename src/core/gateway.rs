use reqwest::Client;
use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::core::cheapest::{format_price, select_cheapest, SelectError};
use crate::core::offers::OfferFetcher;
use crate::core::token::TokenManager;
use crate::domain::model::{CheapestResult, OfferQuery};
use crate::domain::ports::CacheStore;
use crate::utils::error::{GatewayError, Result};

/// Composition root wiring the token manager, offer fetcher and cheapest
/// selection behind one public operation.
pub struct FareGateway {
    fetcher: OfferFetcher,
}

impl FareGateway {
    /// Builds the HTTP client (with the configured per-request timeout) and
    /// the token manager, which initializes its credential eagerly. Fails
    /// when the identity provider rejects the credentials at startup.
    pub async fn new(config: &GatewayConfig, cache: Arc<dyn CacheStore>) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;

        let tokens = Arc::new(
            TokenManager::new(client.clone(), Arc::clone(&cache), config.token_settings()).await?,
        );

        let fetcher = OfferFetcher::new(
            client,
            cache,
            tokens,
            config.retry_policy(),
            config.fetch_settings(),
        );

        Ok(Self { fetcher })
    }

    /// Fetches the offer list for the query and reduces it to the cheapest
    /// offer. Pure orchestration: caching and retries live in the fetcher,
    /// and an empty result maps to `GatewayError::NoOffers`.
    pub async fn fetch_cheapest_offer(&self, query: &OfferQuery) -> Result<CheapestResult> {
        let offers = self.fetcher.fetch(query).await?;

        let cheapest = select_cheapest(&offers).map_err(|e| match e {
            SelectError::EmptyOfferSet => GatewayError::NoOffers,
            SelectError::InvalidPrice(total) => GatewayError::Processing {
                message: format!("offer carries unparseable price total '{}'", total),
            },
        })?;

        Ok(CheapestResult {
            origin: query.origin.clone(),
            destination: query.destination.clone(),
            departure_date: query.departure_date,
            price: format_price(cheapest),
        })
    }
}
