use std::collections::HashMap;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use crate::core::currencies::common::{CurrencyCode, Rate};
use crate::hashmap;

/// "1 unit of base currency = rate units of the currency"
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeRateTable {
    base_currency_code: CurrencyCode,
    rates: HashMap<CurrencyCode, Rate>,
}

impl ExchangeRateTable {
    pub fn new(base_currency_code: CurrencyCode, rates: HashMap<CurrencyCode, Rate>) -> Self {
        Self {
            base_currency_code,
            rates,
        }
    }

    /// Approximate rates used when the remote service has never answered
    pub fn fallback(base_currency_code: CurrencyCode) -> Self {
        let mut rates = hashmap![
            CurrencyCode::from("USD") => dec!(0.27),
            CurrencyCode::from("GBP") => dec!(0.21),
            CurrencyCode::from("EUR") => dec!(0.25),
            CurrencyCode::from("CAD") => dec!(0.37),
            CurrencyCode::from("AUD") => dec!(0.41),
            CurrencyCode::from("INR") => dec!(22.5),
            CurrencyCode::from("SGD") => dec!(0.37),
            CurrencyCode::from("JPY") => dec!(41.5),
            CurrencyCode::from("CNY") => dec!(1.95),
            CurrencyCode::from("SAR") => dec!(1.02),
            CurrencyCode::from("KWD") => dec!(0.083),
            CurrencyCode::from("QAR") => dec!(0.98),
            CurrencyCode::from("BHD") => dec!(0.10),
            CurrencyCode::from("OMR") => dec!(0.10),
            CurrencyCode::from("AED") => dec!(1)
        ];
        let _ = rates.insert(base_currency_code.clone(), Decimal::ONE);

        Self::new(base_currency_code, rates)
    }

    /// Parses `{ "rates": { "USD": 0.27, ... } }`. Entries which aren't numbers are skipped.
    pub fn from_response(base_currency_code: CurrencyCode, content: &str) -> Result<Self> {
        let body: Value =
            serde_json::from_str(content).context("Unable to parse exchange rates response")?;

        let rates = match body.get("rates") {
            Some(Value::Object(rates)) => rates,
            Some(_) => bail!("Field 'rates' is not an object in {}", content),
            None => bail!("Field 'rates' is missing in {}", content),
        };

        let rates = rates
            .iter()
            .filter_map(|(code, value)| {
                let rate = match value {
                    Value::Number(number) => Decimal::from_str(&number.to_string())
                        .or_else(|_| Decimal::from_scientific(&number.to_string()))
                        .ok(),
                    _ => None,
                };
                if rate.is_none() {
                    log::warn!("Skipping exchange rate {} with value {}", code, value);
                }
                rate.map(|rate| (CurrencyCode::from(code.as_str()), rate))
            })
            .collect();

        Ok(Self::new(base_currency_code, rates))
    }

    /// Base currency always has rate 1 even if the table doesn't store it
    pub fn get(&self, currency_code: &CurrencyCode) -> Option<Rate> {
        if currency_code == &self.base_currency_code {
            return Some(Decimal::ONE);
        }

        self.rates.get(currency_code).cloned()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}
