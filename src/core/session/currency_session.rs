use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::Level;
use parking_lot::Mutex;
use rust_decimal::{Decimal, RoundingStrategy};
use scopeguard::ScopeGuard;
use tokio::task::JoinHandle;

use crate::core::currencies::common::{parse_amount, Amount, CurrencyCode};
use crate::core::currencies::registry::{CurrencyDescriptor, CurrencyRegistry};
use crate::core::diagnostics::{CurrencyFailure, DiagnosticSink};
use crate::core::pricing::{
    monthly_equivalent, LocalizedTier, PricingTier, TierPrice, ANNUAL_SAVINGS_PERCENT,
};
use crate::core::services::country_detection::country_detector::CountryDetector;
use crate::core::services::price_converter::PriceConverter;
use crate::core::services::price_formatter::format_price;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SessionPhase {
    /// Base currency is shown while detection runs
    Initializing,
    Detected,
    ManuallyOverridden,
}

struct SessionState {
    currency: CurrencyDescriptor,
    is_loading: bool,
    phase: SessionPhase,
}

/// Currency chosen for the current visitor, shared by every price on the page
pub struct CurrencySession {
    registry: Arc<CurrencyRegistry>,
    detector: CountryDetector,
    converter: PriceConverter,
    base_currency: CurrencyDescriptor,
    state: Mutex<SessionState>,
    activated: AtomicBool,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl CurrencySession {
    pub fn new(
        registry: Arc<CurrencyRegistry>,
        detector: CountryDetector,
        converter: PriceConverter,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Self {
        let base_currency_code = converter.base_currency_code();
        let base_currency = registry
            .descriptor_for_currency(&base_currency_code)
            .unwrap_or_else(|| {
                log::warn!(
                    "Base currency {} is unknown, showing USD until detection completes",
                    base_currency_code
                );
                registry.usd()
            });

        Self {
            registry,
            detector,
            converter,
            base_currency: base_currency.clone(),
            state: Mutex::new(SessionState {
                currency: base_currency,
                is_loading: true,
                phase: SessionPhase::Initializing,
            }),
            activated: AtomicBool::new(false),
            diagnostics,
        }
    }

    /// Runs detection once per session. Calls made while it runs or after it completed
    /// return immediately. If the future is dropped before detection completes, the next
    /// call runs it again.
    pub async fn activate(&self) {
        if self.activated.swap(true, Ordering::SeqCst) {
            return;
        }

        let activation_guard = scopeguard::guard(&self.activated, |activated| {
            log::debug!("Currency detection was interrupted");
            activated.store(false, Ordering::SeqCst);
        });
        let country = self.detector.detect_country().await;
        let _ = ScopeGuard::into_inner(activation_guard);

        let detected = self.registry.descriptor_for(country.as_str());

        let mut state = self.state.lock();
        state.is_loading = false;
        if state.phase == SessionPhase::ManuallyOverridden {
            log::info!(
                "Detected currency {} ignored, {} was chosen manually",
                detected.code,
                state.currency.code
            );
            return;
        }

        log::info!("Currency {} detected for country {}", detected.code, country);
        state.currency = detected;
        state.phase = SessionPhase::Detected;
    }

    pub fn spawn_activation(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move { self.activate().await })
    }

    pub fn currency(&self) -> CurrencyDescriptor {
        self.state.lock().currency.clone()
    }

    pub fn currency_code(&self) -> CurrencyCode {
        self.state.lock().currency.code.clone()
    }

    pub fn currency_symbol(&self) -> String {
        self.state.lock().currency.symbol.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().is_loading
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.lock().phase
    }

    /// Explicit user choice. Takes effect immediately and is kept even if detection finishes later.
    pub fn set_country(&self, country_code: &str) {
        let currency = self.registry.descriptor_for(country_code);
        log::info!(
            "Currency {} chosen manually for country {}",
            currency.code,
            country_code
        );

        let mut state = self.state.lock();
        state.currency = currency;
        state.phase = SessionPhase::ManuallyOverridden;
    }

    /// Converts an amount in base currency into the current currency, unrounded
    pub async fn convert(&self, amount: Amount) -> Amount {
        let currency_code = self.currency_code();
        self.converter.convert(amount, &currency_code).await
    }

    pub async fn convert_str(&self, raw_amount: &str) -> Amount {
        let amount = self.parse_or_zero(raw_amount);
        self.convert(amount).await
    }

    /// Formats an amount already in the current currency
    pub fn format(&self, amount: Amount, show_code: bool) -> String {
        format_price(amount, &self.currency(), show_code)
    }

    pub fn format_str(&self, raw_amount: &str, show_code: bool) -> String {
        let amount = self.parse_or_zero(raw_amount);
        self.format(amount, show_code)
    }

    /// While detection runs prices stay in base currency,
    /// afterwards they are converted and rounded to whole units
    pub async fn localize_tier(&self, tier: &PricingTier) -> LocalizedTier {
        let (currency, is_loading) = {
            let state = self.state.lock();
            (state.currency.clone(), state.is_loading)
        };
        let currency = if is_loading {
            self.base_currency.clone()
        } else {
            currency
        };

        let monthly = self.localize_amount(&tier.price, &currency, is_loading).await;
        let annual = self
            .localize_amount(&tier.price_annual, &currency, is_loading)
            .await;
        let annual_per_month = annual.map(monthly_equivalent);
        let annual_savings_percent = match (monthly, annual_per_month) {
            (Some(monthly), Some(equivalent)) if equivalent < monthly => {
                Some(ANNUAL_SAVINGS_PERCENT)
            }
            _ => None,
        };

        LocalizedTier {
            id: tier.id.clone(),
            name: tier.name.clone(),
            price: display_price(&tier.price, monthly, &currency),
            price_annual: display_price(&tier.price_annual, annual, &currency),
            monthly_equivalent: annual_per_month
                .map(|per_month| format_price(per_month, &currency, false)),
            annual_savings_percent,
            period: tier.period.clone(),
        }
    }

    /// `None` for custom prices
    async fn localize_amount(
        &self,
        price: &TierPrice,
        currency: &CurrencyDescriptor,
        is_loading: bool,
    ) -> Option<Amount> {
        let amount = match price {
            TierPrice::Fixed(amount) => *amount,
            TierPrice::Custom(_) => return None,
        };
        if is_loading {
            return Some(amount);
        }

        let converted = self.converter.convert(amount, &currency.code).await;
        Some(converted.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
    }

    fn parse_or_zero(&self, raw_amount: &str) -> Amount {
        parse_amount(raw_amount).unwrap_or_else(|| {
            self.diagnostics.emit(
                Level::Warn,
                &CurrencyFailure::MalformedNumericInput(raw_amount.to_owned()),
            );
            Decimal::ZERO
        })
    }
}

fn display_price(
    price: &TierPrice,
    amount: Option<Amount>,
    currency: &CurrencyDescriptor,
) -> String {
    match (price, amount) {
        (TierPrice::Fixed(_), Some(amount)) => format_price(amount, currency, false),
        (TierPrice::Fixed(amount), None) => format_price(*amount, currency, false),
        (TierPrice::Custom(label), _) => label.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tokio::sync::Notify;

    use crate::core::currencies::common::CountryCode;
    use crate::core::diagnostics::RecordingDiagnostics;
    use crate::core::services::country_detection::detection_layer::{
        DetectionLayer, MockDetectionLayer,
    };
    use crate::core::services::exchange_rates::exchange_rate_provider::MockGetExchangeRates;
    use crate::core::services::exchange_rates::exchange_rate_table::ExchangeRateTable;
    use crate::hashmap;

    fn rates() -> MockGetExchangeRates {
        let table = ExchangeRateTable::new(
            "AED".into(),
            hashmap![
                CurrencyCode::from("USD") => dec!(0.27),
                CurrencyCode::from("INR") => dec!(22.5),
                CurrencyCode::from("JPY") => dec!(41.5)
            ],
        );
        let mut rates = MockGetExchangeRates::new();
        rates.expect_base_currency_code().returning(|| "AED".into());
        rates.expect_get_rates().returning(move || table.clone());
        rates
    }

    fn layer_detecting(country: &'static str) -> Box<dyn DetectionLayer> {
        let mut layer = MockDetectionLayer::new();
        layer.expect_name().return_const("mock");
        layer
            .expect_detect()
            .returning(move || Ok(Some(CountryCode::from(country))));
        Box::new(layer)
    }

    fn session_with(
        layers: Vec<Box<dyn DetectionLayer>>,
    ) -> (CurrencySession, Arc<RecordingDiagnostics>) {
        let diagnostics = Arc::new(RecordingDiagnostics::new());
        let registry = Arc::new(CurrencyRegistry::new(diagnostics.clone()));
        let detector = CountryDetector::new(layers, "US".into(), diagnostics.clone());
        let converter = PriceConverter::new(Arc::new(rates()), diagnostics.clone());

        (
            CurrencySession::new(registry, detector, converter, diagnostics.clone()),
            diagnostics,
        )
    }

    fn professional_tier() -> PricingTier {
        PricingTier::fixed("professional", "Professional", dec!(150), dec!(1440))
    }

    /// Resolves only after `release` is notified
    struct GatedLayer {
        release: Arc<Notify>,
        country: &'static str,
    }

    #[async_trait]
    impl DetectionLayer for GatedLayer {
        fn name(&self) -> &'static str {
            "gated"
        }

        async fn detect(&self) -> Result<Option<CountryCode>, CurrencyFailure> {
            self.release.notified().await;
            Ok(Some(CountryCode::from(self.country)))
        }
    }

    #[tokio::test]
    async fn starts_with_base_currency_and_loading() {
        let (session, _) = session_with(vec![layer_detecting("IN")]);

        assert_eq!(session.currency_code(), CurrencyCode::from("AED"));
        assert_eq!(session.currency_symbol(), "د.إ");
        assert!(session.is_loading());
        assert_eq!(session.phase(), SessionPhase::Initializing);
    }

    #[tokio::test]
    async fn activation_applies_detected_currency() {
        let (session, _) = session_with(vec![layer_detecting("IN")]);

        session.activate().await;

        assert_eq!(session.currency_code(), CurrencyCode::from("INR"));
        assert!(!session.is_loading());
        assert_eq!(session.phase(), SessionPhase::Detected);
    }

    #[tokio::test]
    async fn activation_runs_once() {
        let mut layer = MockDetectionLayer::new();
        layer.expect_name().return_const("mock");
        layer
            .expect_detect()
            .times(1)
            .returning(|| Ok(Some(CountryCode::from("JP"))));
        let (session, _) = session_with(vec![Box::new(layer)]);

        session.activate().await;
        session.activate().await;

        assert_eq!(session.currency_code(), CurrencyCode::from("JPY"));
    }

    #[tokio::test]
    async fn unknown_detected_country_resolves_to_usd() {
        let (session, diagnostics) = session_with(vec![layer_detecting("ZZ")]);

        session.activate().await;

        assert_eq!(session.currency_code(), CurrencyCode::from("USD"));
        assert_eq!(diagnostics.failures().len(), 1);
    }

    #[tokio::test]
    async fn manual_choice_wins_over_late_detection() {
        let release = Arc::new(Notify::new());
        let (session, _) = session_with(vec![Box::new(GatedLayer {
            release: release.clone(),
            country: "GB",
        })]);
        let session = Arc::new(session);

        let activation = session.clone().spawn_activation();
        tokio::task::yield_now().await;

        session.set_country("IN");
        assert_eq!(session.currency_code(), CurrencyCode::from("INR"));
        assert!(session.is_loading());
        assert_eq!(session.phase(), SessionPhase::ManuallyOverridden);

        release.notify_one();
        activation.await.expect("in test");

        assert_eq!(session.currency_code(), CurrencyCode::from("INR"));
        assert!(!session.is_loading());
        assert_eq!(session.phase(), SessionPhase::ManuallyOverridden);
    }

    #[tokio::test(start_paused = true)]
    async fn interrupted_activation_can_be_retried() {
        let release = Arc::new(Notify::new());
        let (session, _) = session_with(vec![Box::new(GatedLayer {
            release: release.clone(),
            country: "GB",
        })]);

        let interrupted =
            tokio::time::timeout(std::time::Duration::from_secs(1), session.activate()).await;

        assert!(interrupted.is_err());
        assert!(session.is_loading());
        assert_eq!(session.phase(), SessionPhase::Initializing);

        release.notify_one();
        session.activate().await;

        assert_eq!(session.currency_code(), CurrencyCode::from("GBP"));
        assert!(!session.is_loading());
        assert_eq!(session.phase(), SessionPhase::Detected);
    }

    #[tokio::test]
    async fn manual_choice_after_detection() {
        let (session, _) = session_with(vec![layer_detecting("IN")]);
        session.activate().await;

        session.set_country("JP");

        assert_eq!(session.currency_code(), CurrencyCode::from("JPY"));
        assert_eq!(session.format(dec!(6225.75), false), "¥6,226");
    }

    #[tokio::test]
    async fn convert_uses_current_currency() {
        let (session, _) = session_with(vec![layer_detecting("US")]);

        assert_eq!(session.convert(dec!(150)).await, dec!(150));

        session.activate().await;

        assert_eq!(session.convert(dec!(150)).await, dec!(40.5));
        assert_eq!(session.format(dec!(41), false), "$41");
        assert_eq!(session.format(dec!(1234.5), true), "USD 1,234.5");
    }

    #[tokio::test]
    async fn malformed_input_is_zero() {
        let (session, diagnostics) = session_with(vec![layer_detecting("US")]);
        session.activate().await;

        assert_eq!(session.convert_str("abc").await, dec!(0));
        assert_eq!(session.format_str("", false), "$0");
        assert_eq!(session.format_str("1234.5", false), "$1,234.5");
        assert_eq!(
            diagnostics.failures(),
            vec![
                CurrencyFailure::MalformedNumericInput("abc".into()),
                CurrencyFailure::MalformedNumericInput("".into()),
            ]
        );
    }

    #[tokio::test]
    async fn tiers_in_base_currency_while_loading() {
        let (session, _) = session_with(vec![layer_detecting("US")]);

        let tier = session.localize_tier(&professional_tier()).await;

        assert_eq!(tier.price, "150 د.إ");
        assert_eq!(tier.price_annual, "1,440 د.إ");
        assert_eq!(tier.monthly_equivalent.as_deref(), Some("120 د.إ"));
        assert_eq!(tier.annual_savings_percent, Some(ANNUAL_SAVINGS_PERCENT));
    }

    #[tokio::test]
    async fn tiers_rounded_in_detected_currency() {
        let (session, _) = session_with(vec![layer_detecting("US")]);
        session.activate().await;

        let professional = session.localize_tier(&professional_tier()).await;
        let enterprise = session
            .localize_tier(&PricingTier::custom("enterprise", "Enterprise", "Custom"))
            .await;

        // 150 * 0.27 = 40.5, 1440 * 0.27 = 388.8
        assert_eq!(professional.price, "$41");
        assert_eq!(professional.price_annual, "$389");
        assert_eq!(professional.period, "month");
        assert_eq!(enterprise.price, "Custom");
        assert_eq!(enterprise.price_annual, "Custom");
        assert_eq!(enterprise.monthly_equivalent, None);
        assert_eq!(enterprise.annual_savings_percent, None);
    }

    #[tokio::test]
    async fn annual_billing_monthly_equivalent() {
        let (session, _) = session_with(vec![layer_detecting("US")]);
        session.activate().await;

        let professional = session.localize_tier(&professional_tier()).await;
        let free = session
            .localize_tier(&PricingTier::fixed("free", "Free", dec!(0), dec!(0)))
            .await;

        // 1440 * 0.27 = 388.8 -> 389 a year -> 32.42 a month
        assert_eq!(professional.monthly_equivalent.as_deref(), Some("$32"));
        assert_eq!(professional.price, "$41");
        assert_eq!(professional.annual_savings_percent, Some(20));
        assert_eq!(free.monthly_equivalent.as_deref(), Some("$0"));
        assert_eq!(free.annual_savings_percent, None);
    }
}
