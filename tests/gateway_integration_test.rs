use anyhow::Result;
use chrono::NaiveDate;
use httpmock::prelude::*;
use std::sync::Arc;

use fare_gateway::config::{AmadeusConfig, GatewayConfig, RetryConfig};
use fare_gateway::{CacheStore, FareGateway, GatewayError, MemoryCache, OfferQuery};

fn gateway_config(server: &MockServer) -> GatewayConfig {
    GatewayConfig {
        amadeus: AmadeusConfig {
            token_url: server.url("/v1/security/oauth2/token"),
            offers_url: server.url("/v2/shopping/flight-offers"),
            client_id: "test-client".to_string(),
            client_secret: "test-secret".to_string(),
            currency: None,
            request_timeout_seconds: Some(5),
            token_expiry_margin_seconds: None,
        },
        // Millisecond backoff keeps the exhausted-retry scenario fast
        retry: Some(RetryConfig {
            max_attempts: Some(5),
            initial_wait_ms: Some(1),
            max_wait_ms: Some(4),
        }),
        cache: None,
    }
}

fn query() -> OfferQuery {
    OfferQuery {
        origin: "DEL".to_string(),
        destination: "BOM".to_string(),
        departure_date: NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
        adults: 1,
        max_results: 5,
        no_cache: false,
    }
}

fn token_mock(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(POST)
            .path("/v1/security/oauth2/token")
            .body_contains("grant_type=client_credentials");
        then.status(200).json_body(serde_json::json!({
            "access_token": "integration-token",
            "token_type": "Bearer",
            "expires_in": 1799
        }));
    })
}

#[tokio::test]
async fn test_cheapest_offer_with_cache_and_bypass() -> Result<()> {
    let server = MockServer::start();
    let token = token_mock(&server);
    let offers = server.mock(|when, then| {
        when.method(GET)
            .path("/v2/shopping/flight-offers")
            .query_param("originLocationCode", "DEL")
            .query_param("destinationLocationCode", "BOM")
            .query_param("departureDate", "2024-12-01")
            .query_param("adults", "1")
            .query_param("max", "5")
            .query_param("currencyCode", "INR")
            .header("authorization", "Bearer integration-token");
        then.status(200).json_body(serde_json::json!({
            "data": [
                {"id": "1", "price": {"total": "120.00", "currency": "INR"}},
                {"id": "2", "price": {"total": "95.50", "currency": "INR"}},
                {"id": "3", "price": {"total": "200.00", "currency": "INR"}}
            ]
        }));
    });

    let cache: Arc<dyn CacheStore> = Arc::new(MemoryCache::new());
    let gateway = FareGateway::new(&gateway_config(&server), cache).await?;

    // Cache miss: one token fetch (eager, at construction) and one offer call
    let result = gateway.fetch_cheapest_offer(&query()).await?;
    assert_eq!(result.origin, "DEL");
    assert_eq!(result.destination, "BOM");
    assert_eq!(
        result.departure_date,
        NaiveDate::from_ymd_opt(2024, 12, 1).unwrap()
    );
    assert_eq!(result.price, "95.50 INR");
    token.assert_hits(1);
    offers.assert_hits(1);

    // Cache hit: zero further upstream calls
    let cached = gateway.fetch_cheapest_offer(&query()).await?;
    assert_eq!(cached, result);
    token.assert_hits(1);
    offers.assert_hits(1);

    // Bypass: skips the cached offers and forces a token refresh
    let mut bypass = query();
    bypass.no_cache = true;
    let fresh = gateway.fetch_cheapest_offer(&bypass).await?;
    assert_eq!(fresh.price, "95.50 INR");
    token.assert_hits(2);
    offers.assert_hits(2);

    Ok(())
}

#[tokio::test]
async fn test_empty_offer_set_maps_to_no_offers() -> Result<()> {
    let server = MockServer::start();
    token_mock(&server);
    server.mock(|when, then| {
        when.method(GET).path("/v2/shopping/flight-offers");
        then.status(200).json_body(serde_json::json!({"data": []}));
    });

    let cache: Arc<dyn CacheStore> = Arc::new(MemoryCache::new());
    let gateway = FareGateway::new(&gateway_config(&server), cache).await?;

    let err = gateway.fetch_cheapest_offer(&query()).await.unwrap_err();
    assert!(matches!(err, GatewayError::NoOffers));

    Ok(())
}

#[tokio::test]
async fn test_missing_data_array_maps_to_no_offers() -> Result<()> {
    let server = MockServer::start();
    token_mock(&server);
    server.mock(|when, then| {
        when.method(GET).path("/v2/shopping/flight-offers");
        then.status(200)
            .json_body(serde_json::json!({"meta": {"count": 0}}));
    });

    let cache: Arc<dyn CacheStore> = Arc::new(MemoryCache::new());
    let gateway = FareGateway::new(&gateway_config(&server), cache).await?;

    let err = gateway.fetch_cheapest_offer(&query()).await.unwrap_err();
    assert!(matches!(err, GatewayError::NoOffers));

    Ok(())
}

#[tokio::test]
async fn test_persistent_upstream_failure_exhausts_retry_budget() -> Result<()> {
    let server = MockServer::start();
    let token = token_mock(&server);
    let offers = server.mock(|when, then| {
        when.method(GET).path("/v2/shopping/flight-offers");
        then.status(503).body("service unavailable");
    });

    let cache: Arc<dyn CacheStore> = Arc::new(MemoryCache::new());
    let gateway = FareGateway::new(&gateway_config(&server), cache).await?;

    let err = gateway.fetch_cheapest_offer(&query()).await.unwrap_err();
    match err {
        GatewayError::Upstream { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "service unavailable");
        }
        other => panic!("expected upstream error, got {}", other),
    }

    // Exactly the configured attempt budget, and no blind token retries
    offers.assert_hits(5);
    token.assert_hits(1);

    // A failed fetch must not populate the cache
    assert!(gateway.fetch_cheapest_offer(&query()).await.is_err());
    offers.assert_hits(10);

    Ok(())
}

#[tokio::test]
async fn test_rejected_credentials_fail_gateway_construction() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/security/oauth2/token");
        then.status(401).json_body(serde_json::json!({
            "error": "invalid_client",
            "error_description": "Client authentication failed"
        }));
    });

    let cache: Arc<dyn CacheStore> = Arc::new(MemoryCache::new());
    let result = FareGateway::new(&gateway_config(&server), cache).await;

    match result {
        Err(GatewayError::Auth { status, message }) => {
            assert_eq!(status, Some(401));
            assert!(message.contains("invalid_client"));
        }
        _ => panic!("expected auth error at construction"),
    }
}

#[tokio::test]
async fn test_second_gateway_reuses_cached_token() -> Result<()> {
    let server = MockServer::start();
    let token = token_mock(&server);
    server.mock(|when, then| {
        when.method(GET).path("/v2/shopping/flight-offers");
        then.status(200).json_body(serde_json::json!({
            "data": [{"price": {"total": "77.00", "currency": "INR"}}]
        }));
    });

    let cache: Arc<dyn CacheStore> = Arc::new(MemoryCache::new());
    let config = gateway_config(&server);

    let _first = FareGateway::new(&config, Arc::clone(&cache)).await?;
    token.assert_hits(1);

    // The second instance restores the grant from the shared cache
    let second = FareGateway::new(&config, cache).await?;
    token.assert_hits(1);

    let result = second.fetch_cheapest_offer(&query()).await?;
    assert_eq!(result.price, "77.00 INR");
    token.assert_hits(1);

    Ok(())
}

#[tokio::test]
async fn test_unparseable_price_surfaces_processing_error() -> Result<()> {
    let server = MockServer::start();
    token_mock(&server);
    server.mock(|when, then| {
        when.method(GET).path("/v2/shopping/flight-offers");
        then.status(200).json_body(serde_json::json!({
            "data": [{"price": {"total": "free", "currency": "INR"}}]
        }));
    });

    let cache: Arc<dyn CacheStore> = Arc::new(MemoryCache::new());
    let gateway = FareGateway::new(&gateway_config(&server), cache).await?;

    let err = gateway.fetch_cheapest_offer(&query()).await.unwrap_err();
    match err {
        GatewayError::Processing { message } => assert!(message.contains("free")),
        other => panic!("expected processing error, got {}", other),
    }

    Ok(())
}
