use crate::domain::model::{Carrier, CarrierRate, PackageInfo, Shipment, TrackingInfo, Zone};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Shipment persistence. `insert_for_order` is the only write and must be atomic:
/// either the order gains exactly one shipment or nothing is written.
pub trait ShipmentStore: Send + Sync {
    fn insert_for_order(
        &self,
        shipment: &Shipment,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    fn find_by_order(
        &self,
        order_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Shipment>>> + Send;

    fn find_by_tracking(
        &self,
        tracking_number: &str,
    ) -> impl std::future::Future<Output = Result<Option<Shipment>>> + Send;
}

/// Prices every service of one carrier for a destination zone and package.
#[async_trait]
pub trait CarrierRateSource: Send + Sync {
    async fn rates(
        &self,
        carrier: &Carrier,
        zone: Zone,
        package: &PackageInfo,
    ) -> Result<Vec<CarrierRate>>;
}

/// Tracking lookups. `Ok(None)` means the carrier has no such shipment.
#[async_trait]
pub trait TrackingProvider: Send + Sync {
    async fn track(&self, tracking_number: &str) -> Result<Option<TrackingInfo>>;
}
