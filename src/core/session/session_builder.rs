use std::sync::Arc;
use std::time::Duration;

use crate::core::currencies::registry::CurrencyRegistry;
use crate::core::diagnostics::{DiagnosticSink, LogDiagnostics};
use crate::core::services::country_detection::country_detector::CountryDetector;
use crate::core::services::country_detection::detection_layer::DetectionLayer;
use crate::core::services::country_detection::geolocation_layer::{
    GeolocationLayer, GeolocationSource, HttpGeolocationSource,
};
use crate::core::services::country_detection::locale_layer::{
    FixedLocale, LocaleLayer, SysLocale, SystemLocale,
};
use crate::core::services::country_detection::timezone_layer::{
    FixedTimezone, IanaTimezone, SystemTimezone, TimezoneLayer,
};
use crate::core::services::exchange_rates::exchange_rate_provider::{
    ExchangeRateProvider, GetExchangeRates, DEFAULT_RATES_TIME_TO_LIVE_MS,
};
use crate::core::services::exchange_rates::exchange_rate_source::{
    ExchangeRateSource, HttpExchangeRateSource,
};
use crate::core::services::price_converter::PriceConverter;
use crate::core::settings::CurrencySettings;

use super::currency_session::CurrencySession;

/// Wires a [`CurrencySession`] from settings.
/// Every host-facing source can be replaced before `build`.
pub struct CurrencySessionBuilder {
    settings: CurrencySettings,
    diagnostics: Arc<dyn DiagnosticSink>,
    geolocation_source: Option<Arc<dyn GeolocationSource>>,
    timezone: Option<Box<dyn SystemTimezone>>,
    locale: Option<Box<dyn SystemLocale>>,
    rates: Option<Arc<dyn GetExchangeRates>>,
}

impl CurrencySessionBuilder {
    pub fn new(settings: CurrencySettings) -> Self {
        Self {
            settings,
            diagnostics: Arc::new(LogDiagnostics),
            geolocation_source: None,
            timezone: None,
            locale: None,
            rates: None,
        }
    }

    pub fn diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn geolocation_source(mut self, source: Arc<dyn GeolocationSource>) -> Self {
        self.geolocation_source = Some(source);
        self
    }

    pub fn timezone(mut self, timezone: Box<dyn SystemTimezone>) -> Self {
        self.timezone = Some(timezone);
        self
    }

    pub fn locale(mut self, locale: Box<dyn SystemLocale>) -> Self {
        self.locale = Some(locale);
        self
    }

    /// Sessions built with the same rates share one cache
    pub fn rates(mut self, rates: Arc<dyn GetExchangeRates>) -> Self {
        self.rates = Some(rates);
        self
    }

    /// Rates provider for the settings, to be shared between sessions through [`Self::rates`]
    pub fn rates_provider(
        settings: &CurrencySettings,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Arc<ExchangeRateProvider> {
        let source: Arc<dyn ExchangeRateSource> =
            Arc::new(HttpExchangeRateSource::new(settings.rates_url.clone()));
        let time_to_live = i64::try_from(settings.rates_time_to_live_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or_else(|| chrono::Duration::milliseconds(DEFAULT_RATES_TIME_TO_LIVE_MS));

        Arc::new(ExchangeRateProvider::new(
            settings.base_currency.clone(),
            source,
            time_to_live,
            diagnostics,
        ))
    }

    pub fn build(self) -> CurrencySession {
        let settings = self.settings;
        let diagnostics = self.diagnostics;
        let registry = Arc::new(CurrencyRegistry::new(diagnostics.clone()));

        let geolocation_source: Arc<dyn GeolocationSource> = match self.geolocation_source {
            Some(source) => source,
            None => Arc::new(HttpGeolocationSource::new(settings.geolocation_url.clone())),
        };
        let timezone: Box<dyn SystemTimezone> = match (self.timezone, &settings.timezone) {
            (Some(timezone), _) => timezone,
            (None, Some(timezone)) => Box::new(FixedTimezone(Some(timezone.clone()))),
            (None, None) => Box::new(IanaTimezone),
        };
        let locale: Box<dyn SystemLocale> = match (self.locale, &settings.locale) {
            (Some(locale), _) => locale,
            (None, Some(locale)) => Box::new(FixedLocale(Some(locale.clone()))),
            (None, None) => Box::new(SysLocale),
        };

        let layers: Vec<Box<dyn DetectionLayer>> = vec![
            Box::new(GeolocationLayer::new(
                geolocation_source,
                Duration::from_millis(settings.geolocation_timeout_ms),
                registry.clone(),
            )),
            Box::new(TimezoneLayer::new(timezone)),
            Box::new(LocaleLayer::new(locale, registry.clone())),
        ];
        let detector = CountryDetector::new(
            layers,
            settings.fallback_country.clone(),
            diagnostics.clone(),
        );

        let rates = match self.rates {
            Some(rates) => rates,
            None => Self::rates_provider(&settings, diagnostics.clone()),
        };
        if rates.base_currency_code() != settings.base_currency {
            log::warn!(
                "Rates provider base currency {} differs from configured {}",
                rates.base_currency_code(),
                settings.base_currency
            );
        }
        let converter = PriceConverter::new(rates, diagnostics.clone());

        CurrencySession::new(registry, detector, converter, diagnostics)
    }
}
