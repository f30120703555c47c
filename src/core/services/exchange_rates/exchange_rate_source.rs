use anyhow::{bail, Result};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::core::connectivity::rest_client::{build_uri, HttpParams, RestClient};
use crate::core::currencies::common::CurrencyCode;

use super::exchange_rate_table::ExchangeRateTable;

/// Remote origin of exchange rates relative to a base currency
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ExchangeRateSource: Send + Sync {
    async fn fetch_rates(&self, base_currency_code: &CurrencyCode) -> Result<ExchangeRateTable>;
}

/// `GET {rates_url}/{BASE}` on an exchangerate-api.com compatible service
pub struct HttpExchangeRateSource {
    rest_client: RestClient,
    rates_url: String,
}

impl HttpExchangeRateSource {
    pub fn new(rates_url: impl Into<String>) -> Self {
        Self {
            rest_client: RestClient::new(),
            rates_url: rates_url.into(),
        }
    }
}

#[async_trait]
impl ExchangeRateSource for HttpExchangeRateSource {
    async fn fetch_rates(&self, base_currency_code: &CurrencyCode) -> Result<ExchangeRateTable> {
        let uri = build_uri(
            &self.rates_url,
            base_currency_code.as_str(),
            &HttpParams::new(),
        )?;

        log::trace!("Requesting exchange rates from {}", uri);
        let outcome = self.rest_client.get(uri).await?;
        if !outcome.is_success() {
            bail!(
                "Exchange rate service returned status {}: {}",
                outcome.status,
                outcome.content
            );
        }

        ExchangeRateTable::from_response(base_currency_code.clone(), &outcome.content)
    }
}
