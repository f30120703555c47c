use std::sync::Arc;

use async_trait::async_trait;
use log::Level;
#[cfg(test)]
use mockall::automock;
use mockall_double::double;
use parking_lot::Mutex;

#[double]
use crate::core::misc::time_manager::time_manager;

use crate::core::currencies::common::{CurrencyCode, DateTime};
use crate::core::diagnostics::{CurrencyFailure, DiagnosticSink};

use super::exchange_rate_source::ExchangeRateSource;
use super::exchange_rate_table::ExchangeRateTable;

pub const DEFAULT_RATES_TIME_TO_LIVE_MS: i64 = 3_600_000;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait GetExchangeRates: Send + Sync {
    fn base_currency_code(&self) -> CurrencyCode;

    /// Never fails: degrades to cached or built-in rates
    async fn get_rates(&self) -> ExchangeRateTable;
}

struct CachedRates {
    table: ExchangeRateTable,
    fetched_at: DateTime,
}

/// Owns the process-wide rates cache. Construct once and share through `Arc`.
pub struct ExchangeRateProvider {
    base_currency_code: CurrencyCode,
    source: Arc<dyn ExchangeRateSource>,
    time_to_live: chrono::Duration,
    cache: Mutex<Option<CachedRates>>,
    // collapses concurrent refreshes of an expired cache into one request
    refresh_guard: tokio::sync::Mutex<()>,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl ExchangeRateProvider {
    pub fn new(
        base_currency_code: CurrencyCode,
        source: Arc<dyn ExchangeRateSource>,
        time_to_live: chrono::Duration,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            base_currency_code,
            source,
            time_to_live,
            cache: Mutex::new(None),
            refresh_guard: tokio::sync::Mutex::new(()),
            diagnostics,
        }
    }

    fn fresh_rates(&self, now: DateTime) -> Option<ExchangeRateTable> {
        self.cache
            .lock()
            .as_ref()
            .filter(|cached| now - cached.fetched_at < self.time_to_live)
            .map(|cached| cached.table.clone())
    }

    fn cached_or_fallback(&self) -> ExchangeRateTable {
        match self.cache.lock().as_ref() {
            Some(cached) => {
                log::warn!(
                    "Using expired exchange rates fetched at {}",
                    cached.fetched_at
                );
                cached.table.clone()
            }
            None => {
                log::warn!("No cached exchange rates, using built-in fallback rates");
                ExchangeRateTable::fallback(self.base_currency_code.clone())
            }
        }
    }
}

#[async_trait]
impl GetExchangeRates for ExchangeRateProvider {
    fn base_currency_code(&self) -> CurrencyCode {
        self.base_currency_code.clone()
    }

    async fn get_rates(&self) -> ExchangeRateTable {
        if let Some(table) = self.fresh_rates(time_manager::now()) {
            return table;
        }

        let _refresh_guard = self.refresh_guard.lock().await;

        let now = time_manager::now();
        if let Some(table) = self.fresh_rates(now) {
            return table;
        }

        match self.source.fetch_rates(&self.base_currency_code).await {
            Ok(table) => {
                log::info!(
                    "Fetched {} exchange rates for base currency {}",
                    table.len(),
                    self.base_currency_code
                );
                *self.cache.lock() = Some(CachedRates {
                    table: table.clone(),
                    fetched_at: now,
                });
                table
            }
            Err(error) => {
                self.diagnostics.emit(
                    Level::Error,
                    &CurrencyFailure::RateFetch(format!("{:#}", error)),
                );
                self.cached_or_fallback()
            }
        }
    }
}
