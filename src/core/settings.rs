use serde::{Deserialize, Serialize};

use crate::core::currencies::common::{CountryCode, CurrencyCode};
use crate::core::pricing::{default_tiers, PricingTier};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Development
    }
}

#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub environment: Environment,
    pub log_file: Option<String>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencySettings {
    /// Currency prices are authored in
    pub base_currency: CurrencyCode,
    pub geolocation_url: String,
    pub rates_url: String,
    pub rates_time_to_live_secs: u64,
    pub geolocation_timeout_ms: u64,
    pub fallback_country: CountryCode,
    /// Replaces the system timezone, e.g. "Asia/Dubai"
    pub timezone: Option<String>,
    /// Replaces the system locale, e.g. "en-AE"
    pub locale: Option<String>,
}

impl Default for CurrencySettings {
    fn default() -> Self {
        Self {
            base_currency: "AED".into(),
            geolocation_url: "https://ipapi.co/json/".to_owned(),
            rates_url: "https://api.exchangerate-api.com/v4/latest".to_owned(),
            rates_time_to_live_secs: 3600,
            geolocation_timeout_ms: 3000,
            fallback_country: "US".into(),
            timezone: None,
            locale: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingSettings {
    pub tiers: Vec<PricingTier>,
}

impl Default for PricingSettings {
    fn default() -> Self {
        Self {
            tiers: default_tiers(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub logging: LoggingSettings,
    pub currency: CurrencySettings,
    pub pricing: PricingSettings,
}
