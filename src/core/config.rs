use std::fs::read_to_string;
use std::path::Path;

use anyhow::{Context, Result};

use crate::core::settings::AppSettings;

pub static CONFIG_PATH: &str = "config.toml";

/// `None` when there is no settings file at `config_path`
pub fn try_load_settings(config_path: &str) -> Result<Option<AppSettings>> {
    if !Path::new(config_path).exists() {
        return Ok(None);
    }

    let settings = read_to_string(config_path)
        .with_context(|| format!("Unable load settings file: {}", config_path))?;
    parse_settings(&settings).map(Some)
}

pub fn parse_settings(settings: &str) -> Result<AppSettings> {
    toml::from_str(settings).context("Unable parse toml settings")
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use crate::core::currencies::common::{CountryCode, CurrencyCode};
    use crate::core::pricing::{PricingTier, TierPrice};
    use crate::core::settings::Environment;

    #[test]
    fn empty_file_gives_defaults() {
        let settings = parse_settings("").expect("in test");

        assert_eq!(settings, AppSettings::default());
        assert_eq!(settings.currency.base_currency, CurrencyCode::from("AED"));
        assert_eq!(settings.currency.rates_time_to_live_secs, 3600);
        assert_eq!(settings.currency.geolocation_timeout_ms, 3000);
        assert_eq!(settings.pricing.tiers.len(), 4);
    }

    #[test]
    fn partial_settings_keep_other_defaults() {
        let settings = parse_settings(
            r#"
            [logging]
            environment = "production"

            [currency]
            rates_url = "http://localhost:8080/latest"
            timezone = "Asia/Dubai"

            [[pricing.tiers]]
            id = "starter"
            name = "Starter"
            price = 10
            price_annual = 100
            period = "month"
            "#,
        )
        .expect("in test");

        assert_eq!(settings.logging.environment, Environment::Production);
        assert_eq!(settings.currency.rates_url, "http://localhost:8080/latest");
        assert_eq!(settings.currency.timezone.as_deref(), Some("Asia/Dubai"));
        assert_eq!(settings.currency.fallback_country, CountryCode::from("US"));
        assert_eq!(
            settings.pricing.tiers,
            vec![PricingTier::fixed("starter", "Starter", dec!(10), dec!(100))]
        );
        assert_eq!(
            settings.pricing.tiers[0].price_annual,
            TierPrice::Fixed(dec!(100))
        );
    }

    #[test]
    fn malformed_settings_fail() {
        let error = parse_settings("[currency]\nrates_time_to_live_secs = \"soon\"")
            .expect_err("in test");

        assert!(format!("{:#}", error).contains("Unable parse toml settings"));
    }

    #[test]
    fn missing_file() {
        let settings = try_load_settings("definitely/not/here/config.toml").expect("in test");

        assert!(settings.is_none());
    }
}
