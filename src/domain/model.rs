use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 體積重除數 (cm³ / kg)
pub const VOLUMETRIC_DIVISOR: f64 = 5000.0;

/// Coarse distance tier of a destination, 1 (metro) to 4 (remote).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Zone(u8);

impl Zone {
    pub const METRO: Zone = Zone(1);
    pub const SECONDARY: Zone = Zone(2);
    pub const DEFAULT: Zone = Zone(3);
    pub const REMOTE: Zone = Zone(4);

    pub fn new(number: u8) -> Option<Self> {
        (1..=4).contains(&number).then_some(Zone(number))
    }

    pub fn number(self) -> u8 {
        self.0
    }

    /// 1.0, 1.25, 1.5, 1.75
    pub fn multiplier(self) -> f64 {
        1.0 + f64::from(self.0 - 1) * 0.25
    }

    pub fn label(self) -> String {
        format!("Zona {}", self.0)
    }
}

impl TryFrom<u8> for Zone {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Zone::new(value).ok_or_else(|| format!("zone must be between 1 and 4, got {}", value))
    }
}

impl From<Zone> for u8 {
    fn from(zone: Zone) -> u8 {
        zone.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceTier {
    pub service_type: String,
    pub name: String,
    pub delivery_days: u32,
    /// Cost per chargeable kilogram.
    pub base_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Carrier {
    pub id: String,
    pub name: String,
    pub services: Vec<ServiceTier>,
}

impl Carrier {
    pub fn service(&self, service_type: &str) -> Option<&ServiceTier> {
        self.services.iter().find(|s| s.service_type == service_type)
    }
}

/// Immutable carrier reference data, shared behind an `Arc`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CarrierCatalog {
    carriers: Vec<Carrier>,
}

impl CarrierCatalog {
    pub fn new(carriers: Vec<Carrier>) -> Self {
        Self { carriers }
    }

    pub fn carriers(&self) -> &[Carrier] {
        &self.carriers
    }

    pub fn is_empty(&self) -> bool {
        self.carriers.is_empty()
    }

    pub fn carrier(&self, id: &str) -> Option<&Carrier> {
        self.carriers.iter().find(|c| c.id == id)
    }

    pub fn service(
        &self,
        carrier_id: &str,
        service_type: &str,
    ) -> Option<(&Carrier, &ServiceTier)> {
        let carrier = self.carrier(carrier_id)?;
        carrier.service(service_type).map(|tier| (carrier, tier))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageInfo {
    pub weight: f64,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub declared_value: f64,
}

impl PackageInfo {
    pub fn volumetric_weight(&self) -> f64 {
        self.length * self.width * self.height / VOLUMETRIC_DIVISOR
    }

    pub fn chargeable_weight(&self) -> f64 {
        self.weight.max(self.volumetric_weight())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateOffer {
    pub id: String,
    pub carrier: String,
    pub carrier_name: String,
    pub service_type: String,
    pub service_name: String,
    pub delivery_days: u32,
    pub estimated_delivery: NaiveDate,
    pub price: f64,
    pub currency: String,
    pub zone: String,
}

/// One priced service as answered by a rate source, before it becomes a [`RateOffer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierRate {
    pub service_type: String,
    pub service_name: String,
    pub delivery_days: u32,
    pub price: f64,
}

/// Persisted shipment status vocabulary. Admin screens filter on these exact strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    Pending,
    LabelCreated,
    PickedUp,
    InTransit,
    OutForDelivery,
    Delivered,
    Exception,
    Returned,
}

impl ShipmentStatus {
    pub const ALL: [ShipmentStatus; 8] = [
        ShipmentStatus::Pending,
        ShipmentStatus::LabelCreated,
        ShipmentStatus::PickedUp,
        ShipmentStatus::InTransit,
        ShipmentStatus::OutForDelivery,
        ShipmentStatus::Delivered,
        ShipmentStatus::Exception,
        ShipmentStatus::Returned,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ShipmentStatus::Pending => "pending",
            ShipmentStatus::LabelCreated => "label_created",
            ShipmentStatus::PickedUp => "picked_up",
            ShipmentStatus::InTransit => "in_transit",
            ShipmentStatus::OutForDelivery => "out_for_delivery",
            ShipmentStatus::Delivered => "delivered",
            ShipmentStatus::Exception => "exception",
            ShipmentStatus::Returned => "returned",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ShipmentStatus::Pending => "Pendiente",
            ShipmentStatus::LabelCreated => "Guía generada",
            ShipmentStatus::PickedUp => "Recolectado",
            ShipmentStatus::InTransit => "En tránsito",
            ShipmentStatus::OutForDelivery => "En reparto",
            ShipmentStatus::Delivered => "Entregado",
            ShipmentStatus::Exception => "Incidencia",
            ShipmentStatus::Returned => "Devuelto",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            ShipmentStatus::Pending => "gray",
            ShipmentStatus::LabelCreated => "blue",
            ShipmentStatus::PickedUp => "indigo",
            ShipmentStatus::InTransit => "yellow",
            ShipmentStatus::OutForDelivery => "orange",
            ShipmentStatus::Delivered => "green",
            ShipmentStatus::Exception => "red",
            ShipmentStatus::Returned => "purple",
        }
    }

    pub fn is_failure(self) -> bool {
        matches!(self, ShipmentStatus::Exception | ShipmentStatus::Returned)
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    pub id: Uuid,
    pub tracking_number: String,
    pub carrier: String,
    pub service_type: String,
    pub service_name: String,
    pub status: ShipmentStatus,
    pub label_url: String,
    pub order_id: String,
    pub shipping_cost: f64,
    pub origin: Address,
    pub destination: Address,
    pub package: PackageInfo,
    pub created_at: DateTime<Utc>,
    pub estimated_delivery: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingEvent {
    pub date: String,
    pub time: String,
    pub status: ShipmentStatus,
    pub description: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingInfo {
    pub tracking_number: String,
    pub carrier: String,
    pub carrier_name: String,
    pub status: ShipmentStatus,
    pub status_label: String,
    pub estimated_delivery: String,
    /// Most recent first.
    pub events: Vec<TrackingEvent>,
}
