use std::sync::Arc;

use async_trait::async_trait;

use crate::core::currencies::common::CountryCode;
use crate::core::currencies::registry::CurrencyRegistry;
use crate::core::diagnostics::CurrencyFailure;

use super::detection_layer::DetectionLayer;

pub const LOCALE_LAYER: &str = "locale";

/// Substrings which identify the home market even without a region subtag
const HOME_MARKET_MARKERS: &[(&str, &str)] = &[("uae", "AE"), ("emirates", "AE")];

/// Strips encoding (`.UTF-8`) and variant (`@euro`) suffixes and uses `-` as separator.
/// `C` and `POSIX` carry no information and yield `None`.
pub fn normalize_locale_tag(raw: &str) -> Option<String> {
    let stripped = raw.trim().split(['.', '@']).next().unwrap_or_default().trim();
    if stripped.is_empty() || stripped == "C" || stripped == "POSIX" {
        return None;
    }

    Some(stripped.replace('_', "-"))
}

/// Region subtag of a normalized tag: `en-IN` -> `IN`, `zh-Hans-CN` -> `CN`, `es-419` -> `None`
pub fn region_subtag(tag: &str) -> Option<CountryCode> {
    let mut subtags = tag.split('-').skip(1).peekable();

    if let Some(script) = subtags.peek() {
        if script.len() == 4 && script.chars().all(|c| c.is_ascii_alphabetic()) {
            let _ = subtags.next();
        }
    }

    subtags.next().and_then(CountryCode::parse_alpha2)
}

/// Region subtag first, then home market substrings
pub fn country_from_locale(raw: &str, registry: &CurrencyRegistry) -> Option<CountryCode> {
    let tag = normalize_locale_tag(raw)?;

    if let Some(region) = region_subtag(&tag) {
        if registry.contains(region.as_str()) {
            return Some(region);
        }
        log::debug!("Locale region {} has no currency mapping", region);
    }

    let lowercase = tag.to_lowercase();
    HOME_MARKET_MARKERS
        .iter()
        .find(|(marker, _)| lowercase.contains(*marker))
        .map(|(_, country)| CountryCode::from(*country))
}

pub trait SystemLocale: Send + Sync {
    /// Raw locale string, e.g. `en_US.UTF-8` or `ar-AE`
    fn system_locale(&self) -> Option<String>;
}

/// System locale provider backed by `sys-locale`
#[derive(Debug, Default, Clone, Copy)]
pub struct SysLocale;

impl SystemLocale for SysLocale {
    fn system_locale(&self) -> Option<String> {
        sys_locale::get_locale()
    }
}

/// Locale configured explicitly instead of read from the host
#[derive(Debug, Clone, Default)]
pub struct FixedLocale(pub Option<String>);

impl SystemLocale for FixedLocale {
    fn system_locale(&self) -> Option<String> {
        self.0.clone()
    }
}

pub struct LocaleLayer {
    locale: Box<dyn SystemLocale>,
    registry: Arc<CurrencyRegistry>,
}

impl LocaleLayer {
    pub fn new(locale: Box<dyn SystemLocale>, registry: Arc<CurrencyRegistry>) -> Self {
        Self { locale, registry }
    }
}

#[async_trait]
impl DetectionLayer for LocaleLayer {
    fn name(&self) -> &'static str {
        LOCALE_LAYER
    }

    async fn detect(&self) -> Result<Option<CountryCode>, CurrencyFailure> {
        let locale = self.locale.system_locale().ok_or_else(|| {
            CurrencyFailure::detection_layer(LOCALE_LAYER, "system locale is not available")
        })?;
        log::debug!("System locale: {}", locale);

        let country = country_from_locale(&locale, &self.registry);
        if let Some(country) = &country {
            log::info!("Country {} detected from locale {}", country, locale);
        }

        Ok(country)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use crate::core::diagnostics::RecordingDiagnostics;

    fn registry() -> Arc<CurrencyRegistry> {
        Arc::new(CurrencyRegistry::new(Arc::new(RecordingDiagnostics::new())))
    }

    #[rstest]
    #[case("en_US.UTF-8", Some("en-US"))]
    #[case("de_DE@euro", Some("de-DE"))]
    #[case(" ar-AE ", Some("ar-AE"))]
    #[case("C", None)]
    #[case("POSIX", None)]
    #[case("", None)]
    fn normalize(#[case] raw: &str, #[case] expected: Option<&str>) {
        assert_eq!(normalize_locale_tag(raw).as_deref(), expected);
    }

    #[rstest]
    #[case("en-IN", Some("IN"))]
    #[case("zh-Hans-CN", Some("CN"))]
    #[case("sr-Latn", None)]
    #[case("es-419", None)]
    #[case("en", None)]
    fn region(#[case] tag: &str, #[case] expected: Option<&str>) {
        assert_eq!(region_subtag(tag), expected.map(CountryCode::from));
    }

    #[rstest]
    #[case("ar-AE", Some("AE"))]
    #[case("en_AE.UTF-8", Some("AE"))]
    #[case("hi-IN", Some("IN"))]
    #[case("en-IN", Some("IN"))]
    #[case("zh-CN", Some("CN"))]
    #[case("en-GB", Some("GB"))]
    #[case("fr-CA", Some("CA"))]
    #[case("ar-uae", Some("AE"))]
    #[case("sw-KE", None)]
    #[case("fi", None)]
    #[case("en", None)]
    #[case("C.UTF-8", None)]
    fn locale_rules(#[case] raw: &str, #[case] expected: Option<&str>) {
        let registry = registry();

        assert_eq!(
            country_from_locale(raw, &registry),
            expected.map(CountryCode::from)
        );
    }

    #[tokio::test]
    async fn missing_locale_is_layer_failure() {
        let layer = LocaleLayer::new(Box::new(FixedLocale(None)), registry());

        let result = layer.detect().await;

        assert_eq!(
            result,
            Err(CurrencyFailure::DetectionLayer {
                layer: LOCALE_LAYER,
                reason: "system locale is not available".into(),
            })
        );
    }
}
