use chrono::{TimeZone, Utc};
use httpmock::prelude::*;
use shipquote::adapters::{HttpRateSource, HttpTrackingProvider};
use shipquote::config::{RateSourceKind, TrackingProviderKind};
use shipquote::core::zone::{ZoneResolver, ZoneTable};
use shipquote::domain::model::{
    Carrier, CarrierCatalog, PackageInfo, ServiceTier, ShipmentStatus, Zone,
};
use shipquote::domain::ports::TrackingProvider;
use shipquote::utils::clock::FixedClock;
use shipquote::{InMemoryShipmentStore, RateEngine, ShippingConfig, ShippingEngine, ShippingError};
use std::sync::Arc;
use std::time::Duration;

fn carrier(id: &str, name: &str) -> Carrier {
    Carrier {
        id: id.to_string(),
        name: name.to_string(),
        services: vec![ServiceTier {
            service_type: "standard".to_string(),
            name: format!("{} Standard", name),
            delivery_days: 3,
            base_cost: 100.0,
        }],
    }
}

fn package() -> PackageInfo {
    PackageInfo {
        weight: 2.0,
        length: 30.0,
        width: 20.0,
        height: 15.0,
        declared_value: 800.0,
    }
}

fn http_engine(server: &MockServer) -> RateEngine {
    let catalog = Arc::new(CarrierCatalog::new(vec![
        carrier("dhl", "DHL"),
        carrier("fedex", "FedEx"),
        carrier("estafeta", "Estafeta"),
    ]));
    let source = HttpRateSource::new(server.base_url(), Duration::from_secs(2)).unwrap();
    let table = ZoneTable::new().with_prefixes(Zone::METRO, ["03"]);

    RateEngine::new(catalog, ZoneResolver::new(table), Arc::new(source)).with_clock(Arc::new(
        FixedClock::new(Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap()),
    ))
}

#[tokio::test]
async fn test_http_rates_partial_failure() {
    let server = MockServer::start();

    let dhl_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/carriers/dhl/rates")
            .json_body_partial(r#"{"carrier": "dhl", "zone": 1}"#);
        then.status(200).json_body(serde_json::json!([
            {
                "service_type": "express",
                "service_name": "DHL Express",
                "delivery_days": 1,
                "price": 410.5
            },
            {
                "service_type": "economy",
                "service_name": "DHL Economy",
                "delivery_days": 3,
                "price": 220.0
            }
        ]));
    });

    let fedex_mock = server.mock(|when, then| {
        when.method(POST).path("/carriers/fedex/rates");
        then.status(500).body("internal error");
    });

    let estafeta_mock = server.mock(|when, then| {
        when.method(POST).path("/carriers/estafeta/rates");
        then.status(200).json_body(serde_json::json!([
            {
                "service_type": "terrestre",
                "service_name": "Estafeta Terrestre",
                "delivery_days": 5,
                "price": 180.0
            }
        ]));
    });

    let engine = http_engine(&server);
    let quote = engine.quote("03100", &package()).await;

    dhl_mock.assert();
    fedex_mock.assert();
    estafeta_mock.assert();

    let prices: Vec<f64> = quote.offers.iter().map(|o| o.price).collect();
    assert_eq!(prices, vec![180.0, 220.0, 410.5]);
    assert!(quote.is_partial());
    assert_eq!(quote.unavailable.len(), 1);
    assert_eq!(quote.unavailable[0].carrier, "fedex");
    assert!(quote.unavailable[0].message.contains("500"));
}

#[tokio::test]
async fn test_http_rates_malformed_body_marks_carrier_unavailable() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST).path("/carriers/dhl/rates");
        then.status(200).body("<html>maintenance</html>");
    });
    server.mock(|when, then| {
        when.method(POST).path("/carriers/fedex/rates");
        then.status(200).json_body(serde_json::json!([
            {
                "service_type": "ground",
                "service_name": "FedEx Ground",
                "delivery_days": 4,
                "price": -10.0
            }
        ]));
    });
    server.mock(|when, then| {
        when.method(POST).path("/carriers/estafeta/rates");
        then.status(200).json_body(serde_json::json!([
            {
                "service_type": "terrestre",
                "service_name": "Estafeta Terrestre",
                "delivery_days": 5,
                "price": 99.9
            }
        ]));
    });

    let quote = http_engine(&server).quote("03100", &package()).await;

    assert_eq!(quote.offers.len(), 1);
    assert_eq!(quote.offers[0].carrier, "estafeta");

    let mut failed: Vec<&str> = quote.unavailable.iter().map(|f| f.carrier.as_str()).collect();
    failed.sort();
    assert_eq!(failed, vec!["dhl", "fedex"]);
}

#[tokio::test]
async fn test_http_tracking_found_and_not_found() {
    let server = MockServer::start();

    let found_mock = server.mock(|when, then| {
        when.method(GET).path("/tracking/DHL123MX");
        then.status(200).json_body(serde_json::json!({
            "trackingNumber": "DHL123MX",
            "carrier": "dhl",
            "carrierName": "DHL",
            "status": "out_for_delivery",
            "statusLabel": "En reparto",
            "estimatedDelivery": "2026-10-20",
            "events": [
                {
                    "date": "2026-10-19",
                    "time": "07:20",
                    "status": "out_for_delivery",
                    "description": "En ruta",
                    "location": "Monterrey"
                }
            ]
        }));
    });

    let missing_mock = server.mock(|when, then| {
        when.method(GET).path("/tracking/NOPE");
        then.status(404);
    });

    let provider = HttpTrackingProvider::new(server.base_url(), Duration::from_secs(2)).unwrap();

    let info = provider.track("DHL123MX").await.unwrap().unwrap();
    assert_eq!(info.status, ShipmentStatus::OutForDelivery);
    assert_eq!(info.events.len(), 1);
    found_mock.assert();

    assert!(provider.track("NOPE").await.unwrap().is_none());
    missing_mock.assert();
}

#[tokio::test]
async fn test_http_tracking_server_error_is_upstream_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/tracking/DHL1MX");
        then.status(503);
    });

    let provider = HttpTrackingProvider::new(server.base_url(), Duration::from_secs(2)).unwrap();
    let err = provider.track("DHL1MX").await.unwrap_err();

    assert!(matches!(err, ShippingError::UpstreamError { .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_config_selects_http_providers() {
    let server = MockServer::start();
    let tracking_mock = server.mock(|when, then| {
        when.method(GET).path("/tracking/ESTAFETA42MX");
        then.status(404);
    });
    let rates_mock = server.mock(|when, then| {
        when.method(POST).path_contains("/rates");
        then.status(200).json_body(serde_json::json!([]));
    });

    let mut config = ShippingConfig::builtin().unwrap();
    config.rates.source = RateSourceKind::Http;
    config.rates.endpoint = Some(server.base_url());
    config.tracking.provider = TrackingProviderKind::Http;
    config.tracking.endpoint = Some(server.base_url());

    let engine = ShippingEngine::from_config(
        &config,
        InMemoryShipmentStore::new(),
        Arc::new(FixedClock::new(Utc::now())),
    )
    .unwrap();

    // 外部追蹤服務不認識的號碼不應走模擬器
    assert!(engine.track("ESTAFETA42MX").await.unwrap().is_none());
    tracking_mock.assert();

    let quote = engine
        .quote(&shipquote::QuoteRequest {
            destination_postal_code: "03100".to_string(),
            weight: 1.0,
            declared_value: 0.0,
            length: None,
            width: None,
            height: None,
        })
        .await
        .unwrap();
    assert!(quote.offers.is_empty());
    assert!(!quote.is_partial());
    rates_mock.assert_hits(3);
}

#[test]
fn test_http_config_without_endpoint_is_rejected() {
    let mut config = ShippingConfig::builtin().unwrap();
    config.rates.source = RateSourceKind::Http;

    let result = ShippingEngine::from_config(
        &config,
        InMemoryShipmentStore::new(),
        Arc::new(FixedClock::new(Utc::now())),
    );
    assert!(matches!(result, Err(ShippingError::MissingConfigError { .. })));
}
