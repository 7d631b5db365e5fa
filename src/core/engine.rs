use crate::adapters::{rate_source_from_config, tracking_provider_from_config};
use crate::config::ShippingConfig;
use crate::core::rates::{Quote, RateEngine};
use crate::core::shipment::ShipmentFactory;
use crate::domain::model::{Address, PackageInfo, TrackingInfo};
use crate::domain::ports::{ShipmentStore, TrackingProvider};
use crate::domain::requests::{CreateShipmentRequest, QuoteRequest, ShipmentReceipt};
use crate::utils::clock::Clock;
use crate::utils::error::{Result, ShippingError};
use crate::utils::validation::{validate_non_empty_string, Validate};
use std::sync::Arc;

/// Quote → ship → track, wired from one configuration.
pub struct ShippingEngine<S: ShipmentStore> {
    rates: RateEngine,
    shipments: ShipmentFactory<S>,
    tracking: Arc<dyn TrackingProvider>,
}

impl<S: ShipmentStore> ShippingEngine<S> {
    pub fn new(
        rates: RateEngine,
        shipments: ShipmentFactory<S>,
        tracking: Arc<dyn TrackingProvider>,
    ) -> Self {
        Self {
            rates,
            shipments,
            tracking,
        }
    }

    pub fn from_config(config: &ShippingConfig, store: S, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;

        let catalog = Arc::new(config.catalog());
        let source = rate_source_from_config(config)?;
        let tracking = tracking_provider_from_config(config, catalog.clone(), clock.clone())?;

        tracing::debug!(
            "Engine ready: {} carriers, {:?} rates, {:?} tracking",
            catalog.carriers().len(),
            config.rates.source,
            config.tracking.provider
        );

        Ok(Self::new(
            RateEngine::from_config(config, catalog.clone(), source.clone(), clock.clone()),
            ShipmentFactory::from_config(config, store, catalog, source, clock),
            tracking,
        ))
    }

    pub fn rates(&self) -> &RateEngine {
        &self.rates
    }

    pub fn shipments(&self) -> &ShipmentFactory<S> {
        &self.shipments
    }

    pub async fn quote(&self, request: &QuoteRequest) -> Result<Quote> {
        self.rates.quote_request(request).await
    }

    pub async fn create_shipment(
        &self,
        request: &CreateShipmentRequest,
        origin: &Address,
        destination: &Address,
        package: &PackageInfo,
    ) -> Result<ShipmentReceipt> {
        self.shipments
            .create(request, origin, destination, package)
            .await
    }

    /// `Ok(None)` is a normal outcome for unknown numbers, not an error.
    pub async fn track(&self, tracking_number: &str) -> Result<Option<TrackingInfo>> {
        validate_non_empty_string("trackingNumber", tracking_number)?;

        let info = self.tracking.track(tracking_number.trim()).await?;
        match &info {
            Some(info) => tracing::debug!(
                "Tracking {}: {} ({} events)",
                info.tracking_number,
                info.status,
                info.events.len()
            ),
            None => tracing::debug!("Tracking number {} not found", tracking_number),
        }
        Ok(info)
    }
}

/// Quotes `request` and books one of the offers: the one whose id starts with
/// `carrier:service_type` when `service` is given, else the cheapest.
pub async fn quote_and_ship<S: ShipmentStore>(
    engine: &ShippingEngine<S>,
    order_id: &str,
    request: &QuoteRequest,
    service: Option<&str>,
    origin: &Address,
    destination: &Address,
) -> Result<ShipmentReceipt> {
    let quote = engine.quote(request).await?;
    let offer = match service {
        Some(service) => {
            let prefix = format!("{}:", service);
            quote
                .offers
                .iter()
                .find(|o| o.id.starts_with(&prefix))
                .ok_or_else(|| {
                    ShippingError::stale_offer(service, "not offered for this destination")
                })?
        }
        None => quote.cheapest().ok_or_else(|| ShippingError::UpstreamError {
            carrier: "all".to_string(),
            message: "no carrier returned rates".to_string(),
        })?,
    };

    let create = CreateShipmentRequest {
        order_id: order_id.to_string(),
        selected_rate_id: offer.id.clone(),
        carrier: Some(offer.carrier.clone()),
        service_name: Some(offer.service_name.clone()),
        service_type: Some(offer.service_type.clone()),
        shipping_cost: offer.price,
    };
    let package = request.to_package(engine.rates().default_dimensions());

    engine
        .create_shipment(&create, origin, destination, &package)
        .await
}
