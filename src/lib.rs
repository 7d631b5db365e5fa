pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{InMemoryShipmentStore, JsonFileShipmentStore};
pub use config::ShippingConfig;
pub use core::{
    engine::ShippingEngine,
    rates::{Quote, RateEngine},
    shipment::ShipmentFactory,
    tracking::SimulatedTrackingProvider,
    zone::ZoneResolver,
};
pub use domain::requests::{CreateShipmentRequest, QuoteRequest, ShipmentReceipt};
pub use utils::error::{Result, ShippingError};
