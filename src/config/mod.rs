#[cfg(feature = "cli")]
pub mod cli;

use crate::core::zone::ZoneTable;
use crate::domain::model::{Address, Carrier, CarrierCatalog, Zone};
use crate::utils::error::{Result, ShippingError};
use crate::utils::validation::{
    validate_identifiers, validate_non_empty_string, validate_positive_number, validate_range,
    validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

const BUILTIN_CONFIG: &str = include_str!("../../shipping.toml");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingConfig {
    pub engine: EngineConfig,
    pub labels: LabelConfig,
    /// Default sender address for shipments created from the CLI.
    #[serde(default)]
    pub origin: Address,
    pub zones: ZoneConfig,
    #[serde(default)]
    pub rates: RateSourceConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub carriers: Vec<Carrier>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub currency: String,
    pub country_suffix: String,
    #[serde(default)]
    pub simulated_latency_ms: u64,
    #[serde(default = "default_carrier_timeout")]
    pub carrier_timeout_seconds: u64,
    #[serde(default = "default_dimensions")]
    pub default_dimensions_cm: [f64; 3],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZoneConfig {
    #[serde(default)]
    pub metro: Vec<String>,
    #[serde(default)]
    pub secondary: Vec<String>,
    #[serde(default)]
    pub remote: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateSourceKind {
    #[default]
    Table,
    Http,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RateSourceConfig {
    #[serde(default)]
    pub source: RateSourceKind,
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingProviderKind {
    #[default]
    Simulated,
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    #[serde(default)]
    pub provider: TrackingProviderKind,
    pub endpoint: Option<String>,
    #[serde(default = "default_tracking_timeout")]
    pub timeout_seconds: u64,
    /// 模擬器每 n 個追蹤號碼約有一個會走異常流程，0 表示停用
    #[serde(default)]
    pub incident_every: u32,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            provider: TrackingProviderKind::Simulated,
            endpoint: None,
            timeout_seconds: default_tracking_timeout(),
            incident_every: 0,
        }
    }
}

fn default_carrier_timeout() -> u64 {
    5
}

fn default_tracking_timeout() -> u64 {
    10
}

fn default_dimensions() -> [f64; 3] {
    [30.0, 20.0, 15.0]
}

impl ShippingConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| ShippingError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// The configuration bundled with the crate (`shipping.toml`).
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_CONFIG)
    }

    /// 替換環境變數 (例如 ${LABELS_URL})，找不到的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        use std::sync::OnceLock;

        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn catalog(&self) -> CarrierCatalog {
        CarrierCatalog::new(self.carriers.clone())
    }

    pub fn zone_table(&self) -> ZoneTable {
        ZoneTable::new()
            .with_prefixes(Zone::METRO, self.zones.metro.iter().map(String::as_str))
            .with_prefixes(Zone::SECONDARY, self.zones.secondary.iter().map(String::as_str))
            .with_prefixes(Zone::REMOTE, self.zones.remote.iter().map(String::as_str))
    }

    pub fn carrier_timeout(&self) -> Duration {
        Duration::from_secs(self.engine.carrier_timeout_seconds)
    }

    pub fn simulated_latency(&self) -> Duration {
        Duration::from_millis(self.engine.simulated_latency_ms)
    }

    pub fn tracking_timeout(&self) -> Duration {
        Duration::from_secs(self.tracking.timeout_seconds)
    }

    fn validate_zones(&self) -> Result<()> {
        let mut seen = HashSet::new();
        let groups = [
            ("zones.metro", &self.zones.metro),
            ("zones.secondary", &self.zones.secondary),
            ("zones.remote", &self.zones.remote),
        ];

        for (field, prefixes) in groups {
            for prefix in prefixes {
                if prefix.chars().count() != 2 {
                    return Err(ShippingError::validation(
                        field,
                        prefix,
                        "Postal prefixes must be exactly two characters",
                    ));
                }
                if !seen.insert(prefix.as_str()) {
                    return Err(ShippingError::validation(
                        field,
                        prefix,
                        "Prefix is mapped to more than one zone",
                    ));
                }
            }
        }
        Ok(())
    }

    fn validate_carriers(&self) -> Result<()> {
        validate_identifiers("carriers.id", self.carriers.iter().map(|c| c.id.as_str()))?;

        for carrier in &self.carriers {
            validate_non_empty_string("carriers.name", &carrier.name)?;
            if carrier.services.is_empty() {
                return Err(ShippingError::validation(
                    "carriers.services",
                    &carrier.id,
                    "Carrier must offer at least one service",
                ));
            }
            validate_identifiers(
                "carriers.services.service_type",
                carrier.services.iter().map(|s| s.service_type.as_str()),
            )?;
            for tier in &carrier.services {
                validate_positive_number("carriers.services.base_cost", tier.base_cost)?;
                validate_range("carriers.services.delivery_days", tier.delivery_days, 1, 30)?;
            }
        }
        Ok(())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("engine.currency", &self.engine.currency)?;

        if self.engine.country_suffix.is_empty()
            || !self
                .engine
                .country_suffix
                .chars()
                .all(|c| c.is_ascii_uppercase())
        {
            return Err(ShippingError::validation(
                "engine.country_suffix",
                &self.engine.country_suffix,
                "Suffix must be uppercase ASCII letters",
            ));
        }

        validate_range(
            "engine.carrier_timeout_seconds",
            self.engine.carrier_timeout_seconds,
            1,
            120,
        )?;
        validate_range("engine.simulated_latency_ms", self.engine.simulated_latency_ms, 0, 5_000)?;
        // 模擬延遲若超過承運商逾時，每一家都會逾時，報價永遠是空的
        if self.rates.source == RateSourceKind::Table
            && self.simulated_latency() >= self.carrier_timeout()
        {
            return Err(ShippingError::ConfigValidationError {
                field: "engine.simulated_latency_ms".to_string(),
                message: format!(
                    "Simulated latency ({}ms) must be below the carrier timeout ({}s)",
                    self.engine.simulated_latency_ms, self.engine.carrier_timeout_seconds
                ),
            });
        }
        for value in self.engine.default_dimensions_cm {
            validate_positive_number("engine.default_dimensions_cm", value)?;
        }

        validate_url("labels.base_url", &self.labels.base_url)?;
        self.validate_zones()?;
        self.validate_carriers()?;

        if self.rates.source == RateSourceKind::Http {
            let endpoint = self.rates.endpoint.as_deref().ok_or_else(|| {
                ShippingError::MissingConfigError {
                    field: "rates.endpoint".to_string(),
                }
            })?;
            validate_url("rates.endpoint", endpoint)?;
        }

        if self.tracking.provider == TrackingProviderKind::Http {
            let endpoint = self.tracking.endpoint.as_deref().ok_or_else(|| {
                ShippingError::MissingConfigError {
                    field: "tracking.endpoint".to_string(),
                }
            })?;
            validate_url("tracking.endpoint", endpoint)?;
            validate_range("tracking.timeout_seconds", self.tracking.timeout_seconds, 1, 120)?;
        }

        Ok(())
    }
}

impl Validate for ShippingConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
