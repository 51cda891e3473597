use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::utils::error::{GatewayError, Result};
use crate::utils::validation::{validate_location_code, Validate};

/// A flight-offer query as received from the boundary layer.
///
/// Immutable once constructed; `no_cache` controls cache bypass and is
/// deliberately excluded from the cache key, since two queries that differ
/// only in bypass behavior ask for the same data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferQuery {
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub adults: u32,
    pub max_results: u32,
    pub no_cache: bool,
}

impl OfferQuery {
    /// Deterministic cache key over the identity-carrying fields.
    pub fn cache_key(&self) -> String {
        format!(
            "flight_offers_{}_{}_{}_{}_{}",
            self.origin, self.destination, self.departure_date, self.adults, self.max_results
        )
    }
}

impl Validate for OfferQuery {
    fn validate(&self) -> Result<()> {
        validate_location_code("origin", &self.origin)?;
        validate_location_code("destination", &self.destination)?;

        if self.adults < 1 {
            return Err(GatewayError::InvalidQuery {
                field: "adults".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        if self.max_results < 1 {
            return Err(GatewayError::InvalidQuery {
                field: "max_results".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

/// Price block of an upstream offer. `total` stays a string on the wire and
/// is only parsed at comparison time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub total: String,
    pub currency: String,
}

/// A single priced offer. Fields other than `price` are not interpreted by
/// the gateway and round-trip through the cache untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub price: Price,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Offer {
    pub fn total_amount(&self) -> Option<f64> {
        self.price.total.parse().ok()
    }
}

/// Upstream offer-search response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct OffersResponse {
    #[serde(default)]
    pub data: Vec<Offer>,
}

/// Bearer credential held by the token manager. Replaced wholesale on
/// refresh; `expires_at` is always derived from the provider-reported
/// lifetime, never guessed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// A token is usable while `now` is still at least `margin` ahead of
    /// expiry.
    pub fn is_usable(&self, margin: Duration, now: DateTime<Utc>) -> bool {
        match chrono::Duration::from_std(margin) {
            Ok(margin) => now + margin < self.expires_at,
            Err(_) => false,
        }
    }
}

/// The only artifact returned to the boundary: the cheapest offer, with the
/// price formatted as `"<amount> <currency>"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheapestResult {
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub price: String,
}
