use crate::config::ShippingConfig;
use crate::core::tracking_number::TrackingNumberGenerator;
use crate::core::zone::ZoneResolver;
use crate::domain::model::{Address, CarrierCatalog, PackageInfo, Shipment, ShipmentStatus};
use crate::domain::ports::{CarrierRateSource, ShipmentStore};
use crate::domain::requests::{CreateShipmentRequest, ShipmentReceipt};
use crate::utils::clock::Clock;
use crate::utils::error::{Result, ShippingError};
use crate::utils::validation::{validate_positive_number, validate_postal_code, Validate};
use std::sync::Arc;
use uuid::Uuid;

/// Quoted and current prices may differ by rounding only.
const PRICE_TOLERANCE: f64 = 0.005;

/// Splits `carrier:service_type:token` into carrier id and service type.
pub fn parse_offer_id(offer_id: &str) -> Option<(&str, &str)> {
    let mut parts = offer_id.splitn(3, ':');
    let carrier = parts.next().filter(|p| !p.is_empty())?;
    let service_type = parts.next().filter(|p| !p.is_empty())?;
    parts.next().filter(|p| !p.is_empty())?;
    Some((carrier, service_type))
}

pub struct ShipmentFactory<S: ShipmentStore> {
    store: S,
    catalog: Arc<CarrierCatalog>,
    resolver: ZoneResolver,
    source: Arc<dyn CarrierRateSource>,
    generator: TrackingNumberGenerator,
    label_base_url: String,
    clock: Arc<dyn Clock>,
}

impl<S: ShipmentStore> ShipmentFactory<S> {
    pub fn new(
        store: S,
        catalog: Arc<CarrierCatalog>,
        resolver: ZoneResolver,
        source: Arc<dyn CarrierRateSource>,
        generator: TrackingNumberGenerator,
        label_base_url: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            catalog,
            resolver,
            source,
            generator,
            label_base_url: label_base_url.into(),
            clock,
        }
    }

    pub fn from_config(
        config: &ShippingConfig,
        store: S,
        catalog: Arc<CarrierCatalog>,
        source: Arc<dyn CarrierRateSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::new(
            store,
            catalog,
            ZoneResolver::new(config.zone_table()),
            source,
            TrackingNumberGenerator::new(config.engine.country_suffix.clone()),
            config.labels.base_url.clone(),
            clock,
        )
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn label_url(&self, tracking_number: &str) -> String {
        format!(
            "{}/{}.pdf",
            self.label_base_url.trim_end_matches('/'),
            tracking_number
        )
    }

    /// Books the selected offer. Everything is checked before the single store write,
    /// so a failed call never leaves a partial shipment behind.
    pub async fn create(
        &self,
        request: &CreateShipmentRequest,
        origin: &Address,
        destination: &Address,
        package: &PackageInfo,
    ) -> Result<ShipmentReceipt> {
        request.validate()?;
        validate_postal_code("destination.postalCode", &destination.postal_code)?;
        validate_positive_number("weight", package.weight)?;
        validate_positive_number("length", package.length)?;
        validate_positive_number("width", package.width)?;
        validate_positive_number("height", package.height)?;

        let (carrier_id, service_type) = parse_offer_id(&request.selected_rate_id).ok_or_else(
            || {
                ShippingError::validation(
                    "selectedRateId",
                    &request.selected_rate_id,
                    "Expected carrier:service:token",
                )
            },
        )?;

        // 請求中的承運商/服務必須與選擇的報價一致
        if let Some(carrier) = request.carrier.as_deref() {
            if carrier != carrier_id {
                return Err(ShippingError::validation(
                    "carrier",
                    carrier,
                    format!("Selected rate belongs to carrier '{}'", carrier_id),
                ));
            }
        }
        if let Some(requested_type) = request.service_type.as_deref() {
            if requested_type != service_type {
                return Err(ShippingError::validation(
                    "serviceType",
                    requested_type,
                    format!("Selected rate is for service '{}'", service_type),
                ));
            }
        }

        let (carrier, tier) = self
            .catalog
            .service(carrier_id, service_type)
            .ok_or_else(|| {
                ShippingError::stale_offer(
                    &request.selected_rate_id,
                    format!(
                        "service '{}' of carrier '{}' is no longer offered",
                        service_type, carrier_id
                    ),
                )
            })?;

        // 以目前的報價來源重新計價，客戶端送來的金額不可直接採用
        let zone = self.resolver.resolve(&destination.postal_code);
        let current = self
            .source
            .rates(carrier, zone, package)
            .await?
            .into_iter()
            .find(|rate| rate.service_type == tier.service_type)
            .ok_or_else(|| {
                ShippingError::stale_offer(
                    &request.selected_rate_id,
                    format!("carrier '{}' no longer prices '{}'", carrier_id, service_type),
                )
            })?;
        if (current.price - request.shipping_cost).abs() > PRICE_TOLERANCE {
            return Err(ShippingError::stale_offer(
                &request.selected_rate_id,
                format!(
                    "quoted price {:.2} no longer matches current price {:.2}",
                    request.shipping_cost, current.price
                ),
            ));
        }

        let now = self.clock.now();
        let tracking_number = self.generator.generate(&carrier.id, now);
        let shipment = Shipment {
            id: Uuid::new_v4(),
            label_url: self.label_url(&tracking_number),
            tracking_number,
            carrier: carrier.id.clone(),
            service_type: tier.service_type.clone(),
            service_name: tier.name.clone(),
            status: ShipmentStatus::LabelCreated,
            order_id: request.order_id.clone(),
            shipping_cost: current.price,
            origin: origin.clone(),
            destination: destination.clone(),
            package: *package,
            created_at: now,
            estimated_delivery: now + chrono::Duration::days(i64::from(tier.delivery_days)),
        };

        self.store.insert_for_order(&shipment).await?;

        tracing::info!(
            "🚚 Created shipment {} ({}) for order {}",
            shipment.id,
            shipment.tracking_number,
            shipment.order_id
        );

        Ok(ShipmentReceipt {
            shipment_id: shipment.id,
            tracking_number: shipment.tracking_number,
            label_url: shipment.label_url,
            carrier: shipment.carrier,
            service_name: shipment.service_name,
            estimated_delivery: shipment.estimated_delivery,
        })
    }

    pub async fn find_by_order(&self, order_id: &str) -> Result<Option<Shipment>> {
        self.store.find_by_order(order_id).await
    }

    pub async fn find_by_tracking(&self, tracking_number: &str) -> Result<Option<Shipment>> {
        self.store.find_by_tracking(tracking_number).await
    }
}
