use crate::config::ShippingConfig;
use crate::core::tracking_number::unique_token;
use crate::core::zone::ZoneResolver;
use crate::domain::model::{
    Carrier, CarrierCatalog, CarrierRate, PackageInfo, RateOffer, ServiceTier, Zone,
};
use crate::domain::ports::CarrierRateSource;
use crate::domain::requests::QuoteRequest;
use crate::utils::clock::{Clock, SystemClock};
use crate::utils::error::{Result, ShippingError};
use crate::utils::validation::Validate;
use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// price = round2(base_cost × zone multiplier × max(1, chargeable weight))
pub fn price_for(tier: &ServiceTier, zone: Zone, package: &PackageInfo) -> f64 {
    round2(tier.base_cost * zone.multiplier() * package.chargeable_weight().max(1.0))
}

/// Prices services straight from the catalog. The fixed latency stands in for the
/// round trip to a carrier and is bounded by configuration.
#[derive(Debug, Clone, Default)]
pub struct TableRateSource {
    latency: Duration,
}

impl TableRateSource {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl CarrierRateSource for TableRateSource {
    async fn rates(
        &self,
        carrier: &Carrier,
        zone: Zone,
        package: &PackageInfo,
    ) -> Result<Vec<CarrierRate>> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        Ok(carrier
            .services
            .iter()
            .map(|tier| CarrierRate {
                service_type: tier.service_type.clone(),
                service_name: tier.name.clone(),
                delivery_days: tier.delivery_days,
                price: price_for(tier, zone, package),
            })
            .collect())
    }
}

/// A carrier that could not be priced in this quote.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarrierFailure {
    pub carrier: String,
    pub retryable: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub zone: Zone,
    /// Ascending by price.
    pub offers: Vec<RateOffer>,
    pub unavailable: Vec<CarrierFailure>,
}

impl Quote {
    pub fn is_partial(&self) -> bool {
        !self.unavailable.is_empty()
    }

    pub fn cheapest(&self) -> Option<&RateOffer> {
        self.offers.first()
    }
}

pub struct RateEngine {
    catalog: Arc<CarrierCatalog>,
    resolver: ZoneResolver,
    source: Arc<dyn CarrierRateSource>,
    clock: Arc<dyn Clock>,
    currency: String,
    carrier_timeout: Duration,
    default_dimensions: [f64; 3],
}

impl RateEngine {
    pub fn new(
        catalog: Arc<CarrierCatalog>,
        resolver: ZoneResolver,
        source: Arc<dyn CarrierRateSource>,
    ) -> Self {
        Self {
            catalog,
            resolver,
            source,
            clock: Arc::new(SystemClock),
            currency: "MXN".to_string(),
            carrier_timeout: Duration::from_secs(5),
            default_dimensions: [30.0, 20.0, 15.0],
        }
    }

    pub fn from_config(
        config: &ShippingConfig,
        catalog: Arc<CarrierCatalog>,
        source: Arc<dyn CarrierRateSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            catalog,
            resolver: ZoneResolver::new(config.zone_table()),
            source,
            clock,
            currency: config.engine.currency.clone(),
            carrier_timeout: config.carrier_timeout(),
            default_dimensions: config.engine.default_dimensions_cm,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_carrier_timeout(mut self, timeout: Duration) -> Self {
        self.carrier_timeout = timeout;
        self
    }

    pub fn resolver(&self) -> &ZoneResolver {
        &self.resolver
    }

    pub fn default_dimensions(&self) -> [f64; 3] {
        self.default_dimensions
    }

    /// Validates a request at the boundary, fills in default dimensions and quotes it.
    pub async fn quote_request(&self, request: &QuoteRequest) -> Result<Quote> {
        request.validate()?;
        let package = request.to_package(self.default_dimensions);
        Ok(self.quote(&request.destination_postal_code, &package).await)
    }

    /// Prices every carrier × service combination. A carrier that fails or times out
    /// is reported in [`Quote::unavailable`] and the other carriers' offers are kept.
    pub async fn quote(&self, destination_postal_code: &str, package: &PackageInfo) -> Quote {
        let zone = self.resolver.resolve(destination_postal_code);
        let now = self.clock.now();
        let today = now.date_naive();

        tracing::debug!(
            "Quoting {} for {} ({}), chargeable weight {:.2}kg",
            destination_postal_code,
            zone.label(),
            zone.multiplier(),
            package.chargeable_weight()
        );

        let calls = self.catalog.carriers().iter().map(|carrier| async move {
            let call = self.source.rates(carrier, zone, package);
            let result = match tokio::time::timeout(self.carrier_timeout, call).await {
                Ok(result) => result,
                Err(_) => Err(ShippingError::CarrierTimeout {
                    carrier: carrier.id.clone(),
                    seconds: self.carrier_timeout.as_secs(),
                }),
            };
            (carrier, result)
        });

        let mut offers = Vec::new();
        let mut unavailable = Vec::new();

        for (carrier, result) in join_all(calls).await {
            let rates = result.and_then(|rates| check_rates(carrier, rates));
            match rates {
                Ok(rates) => {
                    for rate in rates {
                        let token = unique_token(now);
                        let days = chrono::Days::new(u64::from(rate.delivery_days));
                        offers.push(RateOffer {
                            id: format!("{}:{}:{}", carrier.id, rate.service_type, token),
                            carrier: carrier.id.clone(),
                            carrier_name: carrier.name.clone(),
                            service_type: rate.service_type,
                            service_name: rate.service_name,
                            delivery_days: rate.delivery_days,
                            estimated_delivery: today + days,
                            price: rate.price,
                            currency: self.currency.clone(),
                            zone: zone.label(),
                        });
                    }
                }
                Err(e) => {
                    tracing::warn!("⚠️ Carrier {} unavailable: {}", carrier.id, e);
                    unavailable.push(CarrierFailure {
                        carrier: carrier.id.clone(),
                        retryable: e.is_retryable(),
                        message: e.to_string(),
                    });
                }
            }
        }

        offers.sort_by(|a, b| {
            a.price
                .total_cmp(&b.price)
                .then(a.delivery_days.cmp(&b.delivery_days))
                .then_with(|| a.carrier.cmp(&b.carrier))
                .then_with(|| a.service_type.cmp(&b.service_type))
        });

        tracing::info!(
            "📦 {} offers for {} ({} carriers unavailable)",
            offers.len(),
            zone.label(),
            unavailable.len()
        );

        Quote {
            zone,
            offers,
            unavailable,
        }
    }
}

/// 上游回傳的價格必須是有限的非負數
fn check_rates(carrier: &Carrier, rates: Vec<CarrierRate>) -> Result<Vec<CarrierRate>> {
    if let Some(bad) = rates
        .iter()
        .find(|r| !r.price.is_finite() || r.price < 0.0 || r.service_type.contains(':'))
    {
        return Err(ShippingError::UpstreamError {
            carrier: carrier.id.clone(),
            message: format!("malformed rate for service '{}'", bad.service_type),
        });
    }
    Ok(rates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::zone::ZoneTable;
    use crate::utils::clock::FixedClock;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn tier(service_type: &str, days: u32, base_cost: f64) -> ServiceTier {
        ServiceTier {
            service_type: service_type.to_string(),
            name: service_type.to_uppercase(),
            delivery_days: days,
            base_cost,
        }
    }

    fn catalog() -> Arc<CarrierCatalog> {
        Arc::new(CarrierCatalog::new(vec![
            Carrier {
                id: "dhl".to_string(),
                name: "DHL".to_string(),
                services: vec![tier("economy", 3, 150.0), tier("express", 1, 280.0)],
            },
            Carrier {
                id: "estafeta".to_string(),
                name: "Estafeta".to_string(),
                services: vec![tier("terrestre", 5, 95.0)],
            },
        ]))
    }

    fn engine(source: Arc<dyn CarrierRateSource>) -> RateEngine {
        let table = ZoneTable::new().with_prefixes(Zone::METRO, ["03"]);
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap());
        RateEngine::new(catalog(), ZoneResolver::new(table), source)
            .with_clock(Arc::new(clock))
            .with_carrier_timeout(Duration::from_millis(200))
    }

    fn package(weight: f64, dims: [f64; 3]) -> PackageInfo {
        PackageInfo {
            weight,
            length: dims[0],
            width: dims[1],
            height: dims[2],
            declared_value: 1000.0,
        }
    }

    struct FailingSource {
        failing: &'static str,
        hang: bool,
    }

    #[async_trait]
    impl CarrierRateSource for FailingSource {
        async fn rates(
            &self,
            carrier: &Carrier,
            zone: Zone,
            package: &PackageInfo,
        ) -> Result<Vec<CarrierRate>> {
            if carrier.id == self.failing {
                if self.hang {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                }
                return Err(ShippingError::UpstreamError {
                    carrier: carrier.id.clone(),
                    message: "503".to_string(),
                });
            }
            TableRateSource::default().rates(carrier, zone, package).await
        }
    }

    #[test]
    fn test_price_formula() {
        let economy = tier("economy", 3, 150.0);
        let bulky = package(2.0, [100.0, 30.0, 30.0]);
        assert_eq!(price_for(&economy, Zone::METRO, &bulky), 2700.0);

        let light = package(0.3, [10.0, 10.0, 10.0]);
        assert_eq!(price_for(&economy, Zone::DEFAULT, &light), 225.0);
        assert_eq!(price_for(&tier("x", 1, 101.0), Zone::SECONDARY, &light), 126.25);
        assert_eq!(round2(10.0 / 3.0), 3.33);
    }

    #[tokio::test]
    async fn test_quote_enumerates_and_sorts() {
        let engine = engine(Arc::new(TableRateSource::default()));
        let quote = engine.quote("03100", &package(2.0, [30.0, 20.0, 15.0])).await;

        assert_eq!(quote.zone, Zone::METRO);
        assert_eq!(quote.offers.len(), 3);
        assert!(!quote.is_partial());

        let prices: Vec<f64> = quote.offers.iter().map(|o| o.price).collect();
        assert_eq!(prices, vec![190.0, 300.0, 560.0]);

        let cheapest = quote.cheapest().unwrap();
        assert_eq!(cheapest.carrier, "estafeta");
        assert_eq!(cheapest.zone, "Zona 1");
        assert_eq!(cheapest.currency, "MXN");
        assert_eq!(
            cheapest.estimated_delivery,
            NaiveDate::from_ymd_opt(2026, 10, 24).unwrap()
        );
        assert!(cheapest.id.starts_with("estafeta:terrestre:"));
    }

    #[tokio::test]
    async fn test_failing_carrier_is_isolated() {
        let engine = engine(Arc::new(FailingSource {
            failing: "dhl",
            hang: false,
        }));
        let quote = engine.quote("03100", &package(1.0, [10.0, 10.0, 10.0])).await;

        assert_eq!(quote.offers.len(), 1);
        assert_eq!(quote.offers[0].carrier, "estafeta");
        assert!(quote.is_partial());
        assert_eq!(quote.unavailable[0].carrier, "dhl");
        assert!(quote.unavailable[0].retryable);
    }

    #[tokio::test]
    async fn test_slow_carrier_times_out_as_retryable() {
        let engine = engine(Arc::new(FailingSource {
            failing: "estafeta",
            hang: true,
        }));
        let quote = engine.quote("03100", &package(1.0, [10.0, 10.0, 10.0])).await;

        assert_eq!(quote.offers.len(), 2);
        assert_eq!(quote.unavailable.len(), 1);
        assert!(quote.unavailable[0].retryable);
        assert!(quote.unavailable[0].message.contains("did not answer"));
    }

    #[tokio::test]
    async fn test_quote_request_validates_at_boundary() {
        let engine = engine(Arc::new(TableRateSource::default()));
        let request = QuoteRequest {
            destination_postal_code: "03100".to_string(),
            weight: -1.0,
            declared_value: 0.0,
            length: None,
            width: None,
            height: None,
        };

        let err = engine.quote_request(&request).await.unwrap_err();
        assert!(matches!(err, ShippingError::ValidationError { .. }));
    }
}
