use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShippingError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    ValidationError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Stale offer '{offer_id}': {reason}")]
    StaleOffer { offer_id: String, reason: String },

    #[error("Order '{order_id}' already has a shipment")]
    OrderAlreadyShipped { order_id: String },

    #[error("Carrier '{carrier}' did not answer within {seconds}s")]
    CarrierTimeout { carrier: String, seconds: u64 },

    #[error("Carrier '{carrier}' failed: {message}")]
    UpstreamError { carrier: String, message: String },
}

pub type Result<T> = std::result::Result<T, ShippingError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    StaleReference,
    Conflict,
    Upstream,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ShippingError {
    pub fn validation(field: &str, value: impl ToString, reason: impl Into<String>) -> Self {
        ShippingError::ValidationError {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn stale_offer(offer_id: &str, reason: impl Into<String>) -> Self {
        ShippingError::StaleOffer {
            offer_id: offer_id.to_string(),
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ShippingError::ValidationError { .. } => ErrorCategory::Validation,
            ShippingError::StaleOffer { .. } => ErrorCategory::StaleReference,
            ShippingError::OrderAlreadyShipped { .. } => ErrorCategory::Conflict,
            ShippingError::ApiError(_)
            | ShippingError::CarrierTimeout { .. }
            | ShippingError::UpstreamError { .. } => ErrorCategory::Upstream,
            ShippingError::MissingConfigError { .. }
            | ShippingError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            ShippingError::IoError(_) | ShippingError::SerializationError(_) => {
                ErrorCategory::System
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Validation | ErrorCategory::Conflict => ErrorSeverity::Low,
            ErrorCategory::Upstream => ErrorSeverity::Medium,
            ErrorCategory::StaleReference | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 逾時與上游暫時性錯誤可以重試，不應視為「沒有運費」
    pub fn is_retryable(&self) -> bool {
        match self {
            ShippingError::CarrierTimeout { .. } => true,
            ShippingError::ApiError(e) => e.is_timeout() || e.is_connect(),
            ShippingError::UpstreamError { .. } => true,
            _ => false,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Validation => {
                "Check the weight, dimensions and postal code of the request"
            }
            ErrorCategory::StaleReference => {
                "Request a fresh quote and select one of the new offers"
            }
            ErrorCategory::Conflict => {
                "Look up the existing shipment for this order instead of creating another"
            }
            ErrorCategory::Upstream => {
                "Retry the request; the carrier may be temporarily unavailable"
            }
            ErrorCategory::Configuration => "Fix the configuration file and restart",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ShippingError::ValidationError { field, reason, .. } => {
                format!("Invalid {}: {}", field, reason)
            }
            ShippingError::StaleOffer { .. } => {
                "The selected shipping option is no longer available".to_string()
            }
            ShippingError::OrderAlreadyShipped { order_id } => {
                format!("Order {} already has a shipment", order_id)
            }
            ShippingError::CarrierTimeout { carrier, .. }
            | ShippingError::UpstreamError { carrier, .. } => {
                format!("Carrier {} is not responding right now", carrier)
            }
            other => other.to_string(),
        }
    }
}
