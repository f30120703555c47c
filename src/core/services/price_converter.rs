use std::sync::Arc;

use log::Level;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::core::currencies::common::{Amount, CurrencyCode, Rate};
use crate::core::diagnostics::{CurrencyFailure, DiagnosticSink, LookupKind};
use crate::core::services::exchange_rates::exchange_rate_provider::GetExchangeRates;
use crate::core::services::exchange_rates::exchange_rate_table::ExchangeRateTable;

/// Used when even the USD rate is unavailable
pub const FALLBACK_USD_RATE: Rate = dec!(0.27);

pub struct PriceConverter {
    rates: Arc<dyn GetExchangeRates>,
    usd_currency_code: CurrencyCode,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl PriceConverter {
    pub fn new(rates: Arc<dyn GetExchangeRates>, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            rates,
            usd_currency_code: CurrencyCode::from("USD"),
            diagnostics,
        }
    }

    pub fn base_currency_code(&self) -> CurrencyCode {
        self.rates.base_currency_code()
    }

    fn usable_rate(table: &ExchangeRateTable, currency_code: &CurrencyCode) -> Option<Rate> {
        table
            .get(currency_code)
            .filter(|rate| rate.is_sign_positive() && !rate.is_zero())
    }

    fn usd_rate(&self, table: &ExchangeRateTable) -> Rate {
        Self::usable_rate(table, &self.usd_currency_code).unwrap_or(FALLBACK_USD_RATE)
    }

    /// Converts an amount in base currency. No rounding: it is up to the caller.
    pub async fn convert(&self, amount: Amount, target_currency_code: &CurrencyCode) -> Amount {
        if target_currency_code == &self.base_currency_code() {
            return amount;
        }

        let table = self.rates.get_rates().await;
        let rate = match Self::usable_rate(&table, target_currency_code) {
            Some(rate) => rate,
            None => {
                self.diagnostics.emit(
                    Level::Warn,
                    &CurrencyFailure::unsupported(LookupKind::Currency, target_currency_code),
                );
                self.usd_rate(&table)
            }
        };

        amount
            .checked_mul(rate)
            .or_else(|| {
                log::warn!(
                    "Overflow converting {} {} with rate {}, retrying with USD rate",
                    amount,
                    target_currency_code,
                    rate
                );
                amount.checked_mul(self.usd_rate(&table))
            })
            .or_else(|| amount.checked_mul(FALLBACK_USD_RATE))
            .unwrap_or(Decimal::ZERO)
    }
}
