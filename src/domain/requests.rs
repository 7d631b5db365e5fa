use crate::domain::model::PackageInfo;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_non_empty_string, validate_non_negative_number, validate_positive_number,
    validate_postal_code, Validate,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Quote request as received from the storefront checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub destination_postal_code: String,
    pub weight: f64,
    #[serde(default)]
    pub declared_value: f64,
    pub length: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl QuoteRequest {
    /// 未提供尺寸時使用預設包裹尺寸 (cm)
    pub fn to_package(&self, default_dimensions: [f64; 3]) -> PackageInfo {
        PackageInfo {
            weight: self.weight,
            length: self.length.unwrap_or(default_dimensions[0]),
            width: self.width.unwrap_or(default_dimensions[1]),
            height: self.height.unwrap_or(default_dimensions[2]),
            declared_value: self.declared_value,
        }
    }
}

impl Validate for QuoteRequest {
    fn validate(&self) -> Result<()> {
        validate_postal_code("destinationPostalCode", &self.destination_postal_code)?;
        validate_positive_number("weight", self.weight)?;
        validate_non_negative_number("declaredValue", self.declared_value)?;

        for (field, value) in [
            ("length", self.length),
            ("width", self.width),
            ("height", self.height),
        ] {
            if let Some(v) = value {
                validate_positive_number(field, v)?;
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShipmentRequest {
    pub order_id: String,
    pub selected_rate_id: String,
    #[serde(default)]
    pub carrier: Option<String>,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub service_type: Option<String>,
    pub shipping_cost: f64,
}

impl Validate for CreateShipmentRequest {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("orderId", &self.order_id)?;
        validate_non_empty_string("selectedRateId", &self.selected_rate_id)?;
        validate_non_negative_number("shippingCost", self.shipping_cost)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentReceipt {
    pub shipment_id: Uuid,
    pub tracking_number: String,
    pub label_url: String,
    pub carrier: String,
    pub service_name: String,
    pub estimated_delivery: DateTime<Utc>,
}
