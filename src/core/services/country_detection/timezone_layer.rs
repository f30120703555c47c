use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::core::currencies::common::CountryCode;
use crate::core::diagnostics::CurrencyFailure;

use super::detection_layer::DetectionLayer;

pub const TIMEZONE_LAYER: &str = "timezone";

/// Designated Eurozone country for European timezones without an explicit rule
pub const EUROZONE_DEFAULT_COUNTRY: &str = "FR";

/// Lowercase substrings of IANA timezone names, first matching rule wins.
/// The home market gets several spellings so it doesn't silently fall through.
const TIMEZONE_RULES: &[(&[&str], &str)] = &[
    (&["asia/dubai", "dubai", "abu_dhabi", "abu dhabi", "abudhabi"], "AE"),
    (&["asia/kolkata", "kolkata", "calcutta"], "IN"),
    (&["shanghai", "beijing"], "CN"),
    (&["toronto", "vancouver", "canada/"], "CA"),
    (&["america/", "us/"], "US"),
    (&["london"], "GB"),
    (&["australia", "sydney", "melbourne"], "AU"),
    (&["singapore"], "SG"),
    (&["tokyo", "japan"], "JP"),
];

const EUROPEAN_RULES: &[(&[&str], &str)] = &[
    (&["paris", "france"], "FR"),
    (&["berlin", "germany"], "DE"),
    (&["rome", "italy"], "IT"),
    (&["madrid", "spain"], "ES"),
    (&["amsterdam", "netherlands"], "NL"),
    (&["brussels", "belgium"], "BE"),
    (&["vienna", "austria"], "AT"),
    (&["lisbon", "portugal"], "PT"),
    (&["dublin", "ireland"], "IE"),
    (&["athens", "greece"], "GR"),
    (&["helsinki", "finland"], "FI"),
];

fn first_match(timezone: &str, rules: &[(&[&str], &'static str)]) -> Option<&'static str> {
    rules
        .iter()
        .find(|(patterns, _)| patterns.iter().any(|pattern| timezone.contains(*pattern)))
        .map(|(_, country)| *country)
}

pub fn country_from_timezone(timezone: &str) -> Option<CountryCode> {
    let timezone = timezone.trim().to_lowercase();
    if timezone.is_empty() {
        return None;
    }

    first_match(&timezone, TIMEZONE_RULES)
        .or_else(|| {
            timezone.contains("europe/").then(|| {
                first_match(&timezone, EUROPEAN_RULES).unwrap_or(EUROZONE_DEFAULT_COUNTRY)
            })
        })
        .map(CountryCode::from)
}

pub trait SystemTimezone: Send + Sync {
    /// IANA name, e.g. `Asia/Dubai`
    fn system_timezone(&self) -> Result<String>;
}

const ZONEINFO_DIR: &str = "zoneinfo/";

/// IANA name carried by a `TZ` value: either the name itself (`Asia/Dubai`, `:Asia/Dubai`)
/// or a path inside a zoneinfo database. Other paths (`:/etc/localtime`) and POSIX rules
/// (`<+04>-4`) don't name a zone.
pub fn timezone_from_tz_variable(value: &str) -> Option<String> {
    let value = value.trim().trim_start_matches(':');

    let name = match value.rfind(ZONEINFO_DIR) {
        Some(position) => &value[position + ZONEINFO_DIR.len()..],
        None if value.starts_with('/') || value.starts_with('.') => return None,
        None => value,
    };

    let is_iana_name = !name.is_empty()
        && !name.starts_with('/')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '_' | '-' | '+'));

    is_iana_name.then(|| name.to_owned())
}

/// `TZ` environment variable when it names a zone, otherwise the OS configuration
#[derive(Debug, Default, Clone, Copy)]
pub struct IanaTimezone;

impl SystemTimezone for IanaTimezone {
    fn system_timezone(&self) -> Result<String> {
        if let Ok(tz) = std::env::var("TZ") {
            match timezone_from_tz_variable(&tz) {
                Some(timezone) => return Ok(timezone),
                None => log::debug!("TZ={} doesn't name a timezone, asking the OS", tz),
            }
        }

        iana_time_zone::get_timezone().context("Unable to read system timezone")
    }
}

/// Timezone configured explicitly instead of read from the host
#[derive(Debug, Clone, Default)]
pub struct FixedTimezone(pub Option<String>);

impl SystemTimezone for FixedTimezone {
    fn system_timezone(&self) -> Result<String> {
        self.0.clone().context("Timezone is not available")
    }
}

pub struct TimezoneLayer {
    timezone: Box<dyn SystemTimezone>,
}

impl TimezoneLayer {
    pub fn new(timezone: Box<dyn SystemTimezone>) -> Self {
        Self { timezone }
    }
}

#[async_trait]
impl DetectionLayer for TimezoneLayer {
    fn name(&self) -> &'static str {
        TIMEZONE_LAYER
    }

    async fn detect(&self) -> Result<Option<CountryCode>, CurrencyFailure> {
        let timezone = self
            .timezone
            .system_timezone()
            .map_err(|error| {
                CurrencyFailure::detection_layer(TIMEZONE_LAYER, format!("{:#}", error))
            })?;
        log::debug!("Timezone detected: {}", timezone);

        let country = country_from_timezone(&timezone);
        match &country {
            Some(country) => log::info!("Country {} detected from timezone {}", country, timezone),
            None => log::debug!("Timezone {} doesn't match any country rule", timezone),
        }

        Ok(country)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("Asia/Dubai", Some("AE"))]
    #[case("asia/dubai", Some("AE"))]
    #[case("Asia/Abu_Dhabi", Some("AE"))]
    #[case("Asia/Kolkata", Some("IN"))]
    #[case("Asia/Calcutta", Some("IN"))]
    #[case("Asia/Shanghai", Some("CN"))]
    #[case("America/New_York", Some("US"))]
    #[case("America/Los_Angeles", Some("US"))]
    #[case("US/Pacific", Some("US"))]
    #[case("America/Toronto", Some("CA"))]
    #[case("Canada/Eastern", Some("CA"))]
    #[case("Europe/London", Some("GB"))]
    #[case("Europe/Berlin", Some("DE"))]
    #[case("Europe/Helsinki", Some("FI"))]
    #[case("Europe/Lisbon", Some("PT"))]
    #[case("Europe/Warsaw", Some("FR"))]
    #[case("Australia/Sydney", Some("AU"))]
    #[case("Asia/Singapore", Some("SG"))]
    #[case("Asia/Tokyo", Some("JP"))]
    #[case("Asia/Kabul", None)]
    #[case("Africa/Lagos", None)]
    #[case("UTC", None)]
    #[case("", None)]
    fn timezone_rules(#[case] timezone: &str, #[case] expected: Option<&str>) {
        assert_eq!(
            country_from_timezone(timezone),
            expected.map(CountryCode::from)
        );
    }

    #[rstest]
    #[case("Asia/Dubai", Some("Asia/Dubai"))]
    #[case(":Asia/Dubai", Some("Asia/Dubai"))]
    #[case("America/Argentina/Buenos_Aires", Some("America/Argentina/Buenos_Aires"))]
    #[case("Etc/GMT+4", Some("Etc/GMT+4"))]
    #[case("UTC", Some("UTC"))]
    #[case(":/usr/share/zoneinfo/Asia/Kolkata", Some("Asia/Kolkata"))]
    #[case("/usr/share/zoneinfo/Europe/Paris", Some("Europe/Paris"))]
    #[case(":/etc/localtime", None)]
    #[case("/etc/localtime", None)]
    #[case("./localtime", None)]
    #[case("<+04>-4", None)]
    #[case("/usr/share/zoneinfo/", None)]
    #[case(":", None)]
    #[case("", None)]
    fn tz_variable(#[case] value: &str, #[case] expected: Option<&str>) {
        assert_eq!(timezone_from_tz_variable(value).as_deref(), expected);
    }

    #[tokio::test]
    async fn unreadable_timezone_is_layer_failure() {
        let layer = TimezoneLayer::new(Box::new(FixedTimezone(None)));

        let result = layer.detect().await;

        assert!(matches!(
            result,
            Err(CurrencyFailure::DetectionLayer {
                layer: TIMEZONE_LAYER,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn unmatched_timezone_is_inconclusive() {
        let layer = TimezoneLayer::new(Box::new(FixedTimezone(Some("Etc/UTC".into()))));

        assert_eq!(layer.detect().await, Ok(None));
    }
}
