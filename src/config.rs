use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// `ADMIN_TOKEN` used when the variable is unset.
pub const DEFAULT_ADMIN_TOKEN: &str = "changeme";

/// Longest trip the pricing engine accepts, in kilometres.
pub const MAX_DISTANCE_KM: f64 = 3000.0;

/// Upper bounds for configured amounts, in whole shillings.
pub const MAX_RATE_PER_KM: i64 = 1_000_000;
pub const MAX_FLAT_FEE: i64 = 100_000_000;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    pub twilio_whatsapp_number: String,
    pub operations_phone: String,
    pub pricing_config_path: PathBuf,
    pub booking_code_prefix: String,
    pub conversation_ttl_hours: i64,
    pub utc_offset_hours: i32,
    pub payment_mobile_number: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "transitdesk.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| DEFAULT_ADMIN_TOKEN.to_string()),
            twilio_account_sid: env::var("TWILIO_ACCOUNT_SID").unwrap_or_default(),
            twilio_auth_token: env::var("TWILIO_AUTH_TOKEN").unwrap_or_default(),
            twilio_whatsapp_number: env::var("TWILIO_WHATSAPP_NUMBER").unwrap_or_default(),
            operations_phone: env::var("OPERATIONS_PHONE").unwrap_or_default(),
            pricing_config_path: env::var("PRICING_CONFIG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("config/pricing.json")),
            booking_code_prefix: env::var("BOOKING_CODE_PREFIX")
                .unwrap_or_else(|_| "MNZ".to_string()),
            conversation_ttl_hours: env::var("CONVERSATION_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(24),
            utc_offset_hours: env::var("UTC_OFFSET_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
            payment_mobile_number: env::var("PAYMENT_MOBILE_NUMBER").unwrap_or_default(),
        }
    }

    pub fn uses_default_admin_token(&self) -> bool {
        self.admin_token == DEFAULT_ADMIN_TOKEN
    }

    pub fn has_twilio_credentials(&self) -> bool {
        !self.twilio_account_sid.is_empty()
            && !self.twilio_auth_token.is_empty()
            && !self.twilio_whatsapp_number.is_empty()
    }
}

/// Return allowance applied to routes outside the corridor catalog.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CustomReturnPolicy {
    /// No return allowance for custom routes.
    None,
    /// `min(DEFAULT_RETURN_ALLOWANCE, base distance fee / 2)`.
    #[default]
    HalfDistanceCapped,
}

/// Pricing parameters. Amounts are whole shillings, as in the config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct PricingConfig {
    pub rate_per_km: i64,
    pub per_diem_rate: i64,
    pub platform_commission_default: f64,
    pub waiting_fee_per_hour: i64,
    pub free_waiting_hours: f64,
    pub after_hours_surcharge: i64,
    pub default_return_allowance: i64,
    pub custom_route_return_policy: CustomReturnPolicy,
    pub custom_route_default_km: f64,
    pub corridor_allowances: BTreeMap<String, i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            rate_per_km: 1500,
            per_diem_rate: 50_000,
            platform_commission_default: 0.18,
            waiting_fee_per_hour: 15_000,
            free_waiting_hours: 2.0,
            after_hours_surcharge: 25_000,
            default_return_allowance: 50_000,
            custom_route_return_policy: CustomReturnPolicy::HalfDistanceCapped,
            custom_route_default_km: 100.0,
            corridor_allowances: BTreeMap::new(),
            last_updated: None,
            updated_by: None,
        }
    }
}

impl PricingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.rate_per_km <= 0 {
            return invalid("RATE_PER_KM must be a positive number");
        }
        if self.rate_per_km > MAX_RATE_PER_KM {
            return invalid("RATE_PER_KM must not exceed 1,000,000");
        }
        let fees = [
            self.per_diem_rate,
            self.waiting_fee_per_hour,
            self.after_hours_surcharge,
            self.default_return_allowance,
        ];
        if fees.iter().any(|fee| *fee < 0) {
            return invalid("fees and allowances must not be negative");
        }
        if fees.iter().any(|fee| *fee > MAX_FLAT_FEE) {
            return invalid("fees and allowances must not exceed 100,000,000");
        }
        if !(0.0..=1.0).contains(&self.platform_commission_default) {
            return invalid("PLATFORM_COMMISSION_DEFAULT must be between 0 and 1");
        }
        if !self.free_waiting_hours.is_finite() || self.free_waiting_hours < 0.0 {
            return invalid("FREE_WAITING_HOURS must not be negative");
        }
        if !(self.custom_route_default_km > 0.0 && self.custom_route_default_km <= MAX_DISTANCE_KM) {
            return invalid("CUSTOM_ROUTE_DEFAULT_KM must be between 0 and 3000");
        }
        if let Some((key, _)) = self
            .corridor_allowances
            .iter()
            .find(|(_, v)| !(0..=MAX_FLAT_FEE).contains(*v))
        {
            return Err(ConfigError::Invalid(format!(
                "allowance for corridor {key} must be between 0 and 100,000,000"
            )));
        }
        Ok(())
    }
}

/// Where pricing parameters are read from and written back to.
pub trait PricingConfigSource: Send + Sync {
    fn load(&self) -> Result<PricingConfig, ConfigError>;
    fn store(&self, config: &PricingConfig) -> Result<(), ConfigError>;
}

/// JSON file source. A missing file yields the built-in defaults.
#[derive(Debug, Clone)]
pub struct FilePricingSource {
    path: PathBuf,
}

impl FilePricingSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PricingConfigSource for FilePricingSource {
    fn load(&self) -> Result<PricingConfig, ConfigError> {
        if !self.path.exists() {
            tracing::warn!(path = %self.path.display(), "pricing config not found, using defaults");
            return Ok(PricingConfig::default());
        }

        let raw = fs::read_to_string(&self.path)?;
        let config: PricingConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    fn store(&self, config: &PricingConfig) -> Result<(), ConfigError> {
        config.validate()?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(config)?)?;
        Ok(())
    }
}

/// Source held in memory, for embedding and tests.
#[derive(Debug, Default)]
pub struct InMemoryPricingSource {
    config: Mutex<PricingConfig>,
}

impl InMemoryPricingSource {
    pub fn new(config: PricingConfig) -> Self {
        Self {
            config: Mutex::new(config),
        }
    }
}

impl PricingConfigSource for InMemoryPricingSource {
    fn load(&self) -> Result<PricingConfig, ConfigError> {
        let config = self
            .config
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        config.validate()?;
        Ok(config)
    }

    fn store(&self, config: &PricingConfig) -> Result<(), ConfigError> {
        config.validate()?;
        *self.config.lock().unwrap_or_else(PoisonError::into_inner) = config.clone();
        Ok(())
    }
}
