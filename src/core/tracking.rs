use crate::config::ShippingConfig;
use crate::core::tracking_number::TrackingNumberGenerator;
use crate::domain::model::{Carrier, CarrierCatalog, ShipmentStatus, TrackingEvent, TrackingInfo};
use crate::domain::ports::TrackingProvider;
use crate::utils::clock::Clock;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use std::sync::Arc;

/// Index of `delivered` in [`STAGES`]; also the largest simulated day count.
const LAST_STAGE: u64 = 4;

/// 2020-01-01T00:00:00Z. Older decoded timestamps are not ours.
const EARLIEST_PLAUSIBLE_SECS: i64 = 1_577_836_800;

struct Stage {
    status: ShipmentStatus,
    time: &'static str,
    description: &'static str,
    location: &'static str,
}

static STAGES: [Stage; 5] = [
    Stage {
        status: ShipmentStatus::LabelCreated,
        time: "09:15",
        description: "Guía generada, en espera de recolección",
        location: "Almacén del remitente",
    },
    Stage {
        status: ShipmentStatus::PickedUp,
        time: "14:30",
        description: "Paquete recolectado por el transportista",
        location: "Centro de distribución de origen",
    },
    Stage {
        status: ShipmentStatus::InTransit,
        time: "08:45",
        description: "En tránsito hacia la ciudad de destino",
        location: "Centro de operaciones nacional",
    },
    Stage {
        status: ShipmentStatus::OutForDelivery,
        time: "07:20",
        description: "El paquete salió a ruta de entrega",
        location: "Oficina local de destino",
    },
    Stage {
        status: ShipmentStatus::Delivered,
        time: "13:05",
        description: "Paquete entregado al destinatario",
        location: "Domicilio del destinatario",
    },
];

static EXCEPTION: Stage = Stage {
    status: ShipmentStatus::Exception,
    time: "11:40",
    description: "No fue posible entregar: destinatario ausente",
    location: "Oficina local de destino",
};

static RETURNED: Stage = Stage {
    status: ShipmentStatus::Returned,
    time: "16:10",
    description: "Paquete devuelto al remitente",
    location: "Centro de distribución de origen",
};

/// Deterministic stand-in for a carrier tracking API.
///
/// Numbers generated by this process decode their own creation time, so a fresh
/// shipment reports `label_created`. Any other number derives 0..=4 elapsed days
/// from its trailing character.
pub struct SimulatedTrackingProvider {
    catalog: Arc<CarrierCatalog>,
    generator: TrackingNumberGenerator,
    clock: Arc<dyn Clock>,
    incident_every: u32,
}

impl SimulatedTrackingProvider {
    pub fn new(
        catalog: Arc<CarrierCatalog>,
        generator: TrackingNumberGenerator,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            catalog,
            generator,
            clock,
            incident_every: 0,
        }
    }

    pub fn from_config(
        config: &ShippingConfig,
        catalog: Arc<CarrierCatalog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::new(
            catalog,
            TrackingNumberGenerator::new(config.engine.country_suffix.clone()),
            clock,
        )
        .with_incident_every(config.tracking.incident_every)
    }

    /// Roughly one number in `n` goes through `exception`/`returned`. 0 disables it.
    pub fn with_incident_every(mut self, n: u32) -> Self {
        self.incident_every = n;
        self
    }

    /// Longest carrier id prefixing the number, else the first carrier of the catalog.
    fn guess_carrier(&self, tracking_number: &str) -> Option<&Carrier> {
        let upper = tracking_number.to_uppercase();
        self.catalog
            .carriers()
            .iter()
            .filter(|c| upper.starts_with(&c.id.to_uppercase()))
            .max_by_key(|c| c.id.len())
            .or_else(|| self.catalog.carriers().first())
    }

    pub fn days_elapsed(&self, tracking_number: &str, carrier: &Carrier) -> u64 {
        let now = self.clock.now();

        if let Some(created) = self.generator.decode_created_at(tracking_number, &carrier.id) {
            if created.timestamp() >= EARLIEST_PLAUSIBLE_SECS
                && created <= now + chrono::Duration::days(1)
            {
                let days = (now.date_naive() - created.date_naive()).num_days();
                return days.clamp(0, LAST_STAGE as i64) as u64;
            }
        }

        tracking_number
            .chars()
            .last()
            .map(|c| u64::from(u32::from(c)) % (LAST_STAGE + 1))
            .unwrap_or(0)
    }

    fn has_incident(&self, tracking_number: &str) -> bool {
        if self.incident_every == 0 {
            return false;
        }
        let checksum = tracking_number
            .bytes()
            .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(u32::from(b)));
        checksum % self.incident_every == 0
    }

    fn event(stage: &Stage, date: NaiveDate) -> TrackingEvent {
        TrackingEvent {
            date: date.format("%Y-%m-%d").to_string(),
            time: stage.time.to_string(),
            status: stage.status,
            description: stage.description.to_string(),
            location: stage.location.to_string(),
        }
    }

    pub fn simulate(&self, tracking_number: &str) -> Option<TrackingInfo> {
        let tracking_number = tracking_number.trim().to_uppercase();
        if tracking_number.is_empty() {
            return None;
        }
        let carrier = self.guess_carrier(&tracking_number)?;

        let today = self.clock.today();
        let elapsed = self.days_elapsed(&tracking_number, carrier);
        let incident = self.has_incident(&tracking_number) && elapsed >= 3;

        let mut events: Vec<TrackingEvent> = (0..=elapsed)
            .map(|day| {
                let stage = match day {
                    3 if incident => &EXCEPTION,
                    4 if incident => &RETURNED,
                    _ => &STAGES[day as usize],
                };
                Self::event(stage, today - Days::new(elapsed - day))
            })
            .collect();

        let status = events
            .last()
            .map(|e| e.status)
            .unwrap_or(ShipmentStatus::LabelCreated);

        let estimated_delivery = match status {
            ShipmentStatus::Delivered | ShipmentStatus::Exception | ShipmentStatus::Returned => {
                status.label().to_string()
            }
            _ => (today + Days::new(LAST_STAGE - elapsed))
                .format("%Y-%m-%d")
                .to_string(),
        };

        events.reverse();

        Some(TrackingInfo {
            tracking_number,
            carrier: carrier.id.clone(),
            carrier_name: carrier.name.clone(),
            status,
            status_label: status.label().to_string(),
            estimated_delivery,
            events,
        })
    }
}

#[async_trait]
impl TrackingProvider for SimulatedTrackingProvider {
    async fn track(&self, tracking_number: &str) -> Result<Option<TrackingInfo>> {
        Ok(self.simulate(tracking_number))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ServiceTier;
    use crate::core::tracking_number::to_base36;
    use crate::utils::clock::FixedClock;
    use chrono::{DateTime, TimeZone, Utc};

    fn catalog() -> Arc<CarrierCatalog> {
        let tier = ServiceTier {
            service_type: "economy".to_string(),
            name: "Economy".to_string(),
            delivery_days: 3,
            base_cost: 150.0,
        };
        Arc::new(CarrierCatalog::new(vec![
            Carrier {
                id: "estafeta".to_string(),
                name: "Estafeta".to_string(),
                services: vec![tier.clone()],
            },
            Carrier {
                id: "dhl".to_string(),
                name: "DHL".to_string(),
                services: vec![tier],
            },
        ]))
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 18, 0, 0).unwrap()
    }

    fn provider(clock: FixedClock) -> SimulatedTrackingProvider {
        SimulatedTrackingProvider::new(
            catalog(),
            TrackingNumberGenerator::new("MX"),
            Arc::new(clock),
        )
    }

    #[test]
    fn test_trailing_character_drives_elapsed_days() {
        let p = provider(FixedClock::new(now()));
        let catalog = catalog();
        let carrier = &catalog.carriers()[0];
        // '0' = 48, '1' = 49, 'E' = 69
        assert_eq!(p.days_elapsed("ABC0", carrier), 3);
        assert_eq!(p.days_elapsed("ABC1", carrier), 4);
        assert_eq!(p.days_elapsed("ABCE", carrier), 4);
        assert_eq!(p.days_elapsed("ABC7", carrier), 0);
    }

    #[test]
    fn test_generated_number_counts_days_since_creation() {
        let clock = FixedClock::new(now());
        let p = provider(clock.clone());
        let number = TrackingNumberGenerator::new("MX").generate("dhl", now());

        let info = p.simulate(&number).unwrap();
        assert_eq!(info.carrier, "dhl");
        assert_eq!(info.status, ShipmentStatus::LabelCreated);
        assert_eq!(info.events.len(), 1);
        assert_eq!(info.estimated_delivery, "2026-10-23");

        clock.advance(chrono::Duration::days(2));
        let info = p.simulate(&number).unwrap();
        assert_eq!(info.status, ShipmentStatus::InTransit);
        assert_eq!(info.events.len(), 3);
        assert_eq!(info.events[0].date, "2026-10-21");
        assert_eq!(info.events[2].date, "2026-10-19");

        clock.advance(chrono::Duration::days(30));
        let info = p.simulate(&number).unwrap();
        assert_eq!(info.status, ShipmentStatus::Delivered);
        assert_eq!(info.events.len(), 5);
    }

    #[test]
    fn test_unknown_prefix_falls_back_to_first_carrier() {
        let p = provider(FixedClock::new(now()));
        let info = p.simulate("1z999aa10123456787").unwrap();
        assert_eq!(info.carrier, "estafeta");
        assert_eq!(info.carrier_name, "Estafeta");
        assert_eq!(info.tracking_number, "1Z999AA10123456787");
    }

    #[test]
    fn test_incident_branch_reaches_failure_states() {
        let p = provider(FixedClock::new(now())).with_incident_every(1);

        // trailing '0' -> day 3
        let info = p.simulate("XYZ0").unwrap();
        assert_eq!(info.status, ShipmentStatus::Exception);
        assert_eq!(info.estimated_delivery, "Incidencia");
        assert_eq!(info.events.len(), 4);

        // trailing '1' -> day 4
        let info = p.simulate("XYZ1").unwrap();
        assert_eq!(info.status, ShipmentStatus::Returned);
        assert_eq!(info.events[0].status, ShipmentStatus::Returned);
        assert_eq!(info.events[1].status, ShipmentStatus::Exception);
        assert!(info.events.iter().all(|e| e.status != ShipmentStatus::Delivered));
    }

    #[test]
    fn test_incident_never_applies_before_out_for_delivery() {
        let p = provider(FixedClock::new(now())).with_incident_every(1);
        let info = p.simulate("XYZ7").unwrap();
        assert_eq!(info.status, ShipmentStatus::LabelCreated);
    }

    #[test]
    fn test_empty_number_or_catalog_is_not_found() {
        let p = provider(FixedClock::new(now()));
        assert!(p.simulate("   ").is_none());

        let empty = SimulatedTrackingProvider::new(
            Arc::new(CarrierCatalog::default()),
            TrackingNumberGenerator::new("MX"),
            Arc::new(FixedClock::new(now())),
        );
        assert!(empty.simulate("DHL123").is_none());
    }

    #[test]
    fn test_provider_port_wraps_simulation() {
        let p = provider(FixedClock::new(now()));
        let info = tokio_test::block_on(p.track("dhl1230")).unwrap().unwrap();
        assert_eq!(info.carrier, "dhl");
        assert_eq!(info.status, ShipmentStatus::OutForDelivery);
        assert_eq!(info.status_label, ShipmentStatus::OutForDelivery.label());
    }

    #[test]
    fn test_pre_2020_timestamp_is_not_treated_as_ours() {
        let p = provider(FixedClock::new(now()));
        let catalog = catalog();
        let dhl = catalog.carrier("dhl").unwrap();

        let old_millis = Utc.with_ymd_and_hms(2019, 6, 1, 0, 0, 0).unwrap().timestamp_millis();
        let old = format!("DHL{}00MX", to_base36(old_millis as u64));
        // 'X' = 88 -> 3
        assert_eq!(p.days_elapsed(&old, dhl), 3);

        let recent_millis = Utc.with_ymd_and_hms(2026, 10, 18, 8, 0, 0).unwrap().timestamp_millis();
        let recent = format!("DHL{}00MX", to_base36(recent_millis as u64));
        assert_eq!(p.days_elapsed(&recent, dhl), 1);
    }
}
