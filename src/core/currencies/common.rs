use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smallstr::SmallString;

use chrono::Utc;

pub type DateTime = chrono::DateTime<Utc>;

pub type Amount = Decimal;
pub type Rate = Decimal;

type String4 = SmallString<[u8; 4]>;

/// ISO 4217 currency code, e.g. `AED`
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(String4);

impl CurrencyCode {
    #[inline]
    pub fn new(currency_code: String4) -> Self {
        CurrencyCode(currency_code)
    }

    /// Extracts a string slice containing the entire string.
    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Three ASCII uppercase letters
    pub fn is_iso(&self) -> bool {
        self.0.len() == 3 && self.0.chars().all(|c| c.is_ascii_uppercase())
    }
}

impl From<&str> for CurrencyCode {
    fn from(value: &str) -> Self {
        CurrencyCode(String4::from(value))
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// ISO 3166-1 alpha-2 country code, e.g. `AE`.
/// Values coming from outside (geolocation, locale) are not guaranteed to be known by the registry.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountryCode(String4);

impl CountryCode {
    #[inline]
    pub fn new(country_code: String4) -> Self {
        CountryCode(country_code)
    }

    /// Extracts a string slice containing the entire string.
    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Accepts exactly two ASCII letters and uppercases them
    pub fn parse_alpha2(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.len() != 2 || !value.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }

        Some(CountryCode::from(value.to_ascii_uppercase().as_str()))
    }
}

impl From<&str> for CountryCode {
    fn from(value: &str) -> Self {
        CountryCode(String4::from(value))
    }
}

impl Display for CountryCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Accepts plain (`1234.5`) and scientific (`1.2345e3`) notation, surrounding whitespace ignored
pub fn parse_amount(raw: &str) -> Option<Amount> {
    let raw = raw.trim();
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}
