//! HTTP-backed carrier adapters.
//!
//! Contract expected from the upstream aggregator:
//!
//! - `POST {endpoint}/carriers/{carrier}/rates` with a [`RateQuery`] body answers a JSON
//!   array of `{ service_type, service_name, delivery_days, price }`.
//! - `GET {endpoint}/tracking/{number}` answers a camelCase `TrackingInfo`, or 404 when
//!   the carrier has no such shipment.

use crate::domain::model::{Carrier, CarrierRate, PackageInfo, TrackingInfo, Zone};
use crate::domain::ports::{CarrierRateSource, TrackingProvider};
use crate::utils::error::{Result, ShippingError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;
use url::Url;

fn build_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder().timeout(timeout).build()?)
}

fn endpoint_url(field: &str, endpoint: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(endpoint).map_err(|e| {
        ShippingError::validation(field, endpoint, format!("Invalid URL format: {}", e))
    })?;
    url.path_segments_mut()
        .map_err(|_| ShippingError::validation(field, endpoint, "URL cannot be a base"))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// 逾時轉成可重試的 CarrierTimeout，其餘保留原始 reqwest 錯誤
fn map_request_error(carrier: &str, timeout: Duration, e: reqwest::Error) -> ShippingError {
    if e.is_timeout() {
        ShippingError::CarrierTimeout {
            carrier: carrier.to_string(),
            seconds: timeout.as_secs(),
        }
    } else {
        ShippingError::ApiError(e)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateQuery<'a> {
    pub carrier: &'a str,
    pub zone: u8,
    pub chargeable_weight: f64,
    pub package: &'a PackageInfo,
}

pub struct HttpRateSource {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpRateSource {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint: endpoint.into(),
            timeout,
        })
    }
}

#[async_trait]
impl CarrierRateSource for HttpRateSource {
    async fn rates(
        &self,
        carrier: &Carrier,
        zone: Zone,
        package: &PackageInfo,
    ) -> Result<Vec<CarrierRate>> {
        let segments = ["carriers", carrier.id.as_str(), "rates"];
        let url = endpoint_url("rates.endpoint", &self.endpoint, &segments)?;
        let query = RateQuery {
            carrier: &carrier.id,
            zone: zone.number(),
            chargeable_weight: package.chargeable_weight(),
            package,
        };

        tracing::debug!("Requesting rates from: {}", url);
        let response = self
            .client
            .post(url)
            .json(&query)
            .send()
            .await
            .map_err(|e| map_request_error(&carrier.id, self.timeout, e))?;

        let status = response.status();
        tracing::debug!("Rate response status for {}: {}", carrier.id, status);

        if !status.is_success() {
            return Err(ShippingError::UpstreamError {
                carrier: carrier.id.clone(),
                message: format!("HTTP {}", status),
            });
        }

        response
            .json::<Vec<CarrierRate>>()
            .await
            .map_err(|e| ShippingError::UpstreamError {
                carrier: carrier.id.clone(),
                message: format!("malformed rate response: {}", e),
            })
    }
}

pub struct HttpTrackingProvider {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpTrackingProvider {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint: endpoint.into(),
            timeout,
        })
    }
}

#[async_trait]
impl TrackingProvider for HttpTrackingProvider {
    async fn track(&self, tracking_number: &str) -> Result<Option<TrackingInfo>> {
        let url =
            endpoint_url("tracking.endpoint", &self.endpoint, &["tracking", tracking_number])?;

        tracing::debug!("Requesting tracking from: {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| map_request_error("tracking", self.timeout, e))?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                tracing::debug!("Tracking number {} not found upstream", tracking_number);
                Ok(None)
            }
            status if status.is_success() => {
                let info = response.json::<TrackingInfo>().await.map_err(|e| {
                    ShippingError::UpstreamError {
                        carrier: "tracking".to_string(),
                        message: format!("malformed tracking response: {}", e),
                    }
                })?;
                Ok(Some(info))
            }
            status => Err(ShippingError::UpstreamError {
                carrier: "tracking".to_string(),
                message: format!("HTTP {}", status),
            }),
        }
    }
}
