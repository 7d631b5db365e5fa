// Adapters layer: concrete implementations of the domain ports (http, storage),
// chosen from configuration.

pub mod http;
pub mod store;

use crate::config::{RateSourceKind, ShippingConfig, TrackingProviderKind};
use crate::core::rates::TableRateSource;
use crate::core::tracking::SimulatedTrackingProvider;
use crate::domain::model::CarrierCatalog;
use crate::domain::ports::{CarrierRateSource, TrackingProvider};
use crate::utils::clock::Clock;
use crate::utils::error::{Result, ShippingError};
use std::sync::Arc;

pub use http::{HttpRateSource, HttpTrackingProvider};
pub use store::{InMemoryShipmentStore, JsonFileShipmentStore};

fn required_endpoint<'a>(field: &str, endpoint: &'a Option<String>) -> Result<&'a str> {
    endpoint
        .as_deref()
        .ok_or_else(|| ShippingError::MissingConfigError {
            field: field.to_string(),
        })
}

pub fn rate_source_from_config(config: &ShippingConfig) -> Result<Arc<dyn CarrierRateSource>> {
    Ok(match config.rates.source {
        RateSourceKind::Table => Arc::new(TableRateSource::new(config.simulated_latency())),
        RateSourceKind::Http => {
            let endpoint = required_endpoint("rates.endpoint", &config.rates.endpoint)?;
            Arc::new(HttpRateSource::new(endpoint, config.carrier_timeout())?)
        }
    })
}

pub fn tracking_provider_from_config(
    config: &ShippingConfig,
    catalog: Arc<CarrierCatalog>,
    clock: Arc<dyn Clock>,
) -> Result<Arc<dyn TrackingProvider>> {
    Ok(match config.tracking.provider {
        TrackingProviderKind::Simulated => {
            Arc::new(SimulatedTrackingProvider::from_config(config, catalog, clock))
        }
        TrackingProviderKind::Http => {
            let endpoint = required_endpoint("tracking.endpoint", &config.tracking.endpoint)?;
            Arc::new(HttpTrackingProvider::new(endpoint, config.tracking_timeout())?)
        }
    })
}
