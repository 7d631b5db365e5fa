pub mod engine;
pub mod rates;
pub mod shipment;
pub mod tracking;
pub mod tracking_number;
pub mod zone;

pub use crate::domain::model::{
    Address, Carrier, CarrierCatalog, PackageInfo, RateOffer, ServiceTier, Shipment,
    ShipmentStatus, TrackingEvent, TrackingInfo, Zone,
};
pub use crate::domain::ports::{CarrierRateSource, ShipmentStore, TrackingProvider};
pub use crate::utils::error::Result;
