use std::collections::HashMap;
use std::sync::Arc;

use itertools::Itertools;
use log::Level;
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::core::currencies::common::{CountryCode, CurrencyCode};
use crate::core::diagnostics::{CurrencyFailure, DiagnosticSink, LookupKind};

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct CurrencyDescriptor {
    pub code: CurrencyCode,
    pub symbol: String,
    pub display_name: String,
    pub country_name: String,
}

impl CurrencyDescriptor {
    pub fn new(code: &str, symbol: &str, display_name: &str, country_name: &str) -> Self {
        Self {
            code: code.into(),
            symbol: symbol.to_owned(),
            display_name: display_name.to_owned(),
            country_name: country_name.to_owned(),
        }
    }
}

pub const USD_COUNTRY: &str = "US";

// country, currency code, symbol, currency name, country name
const COUNTRY_CURRENCIES: &[(&str, &str, &str, &str, &str)] = &[
    ("AE", "AED", "د.إ", "UAE Dirham", "UAE"),
    ("US", "USD", "$", "US Dollar", "United States"),
    ("GB", "GBP", "£", "British Pound", "United Kingdom"),
    ("FR", "EUR", "€", "Euro", "France"),
    ("DE", "EUR", "€", "Euro", "Germany"),
    ("IT", "EUR", "€", "Euro", "Italy"),
    ("ES", "EUR", "€", "Euro", "Spain"),
    ("NL", "EUR", "€", "Euro", "Netherlands"),
    ("BE", "EUR", "€", "Euro", "Belgium"),
    ("AT", "EUR", "€", "Euro", "Austria"),
    ("PT", "EUR", "€", "Euro", "Portugal"),
    ("IE", "EUR", "€", "Euro", "Ireland"),
    ("GR", "EUR", "€", "Euro", "Greece"),
    ("FI", "EUR", "€", "Euro", "Finland"),
    ("EU", "EUR", "€", "Euro", "European Union"),
    ("CA", "CAD", "C$", "Canadian Dollar", "Canada"),
    ("AU", "AUD", "A$", "Australian Dollar", "Australia"),
    ("IN", "INR", "₹", "Indian Rupee", "India"),
    ("SG", "SGD", "S$", "Singapore Dollar", "Singapore"),
    ("JP", "JPY", "¥", "Japanese Yen", "Japan"),
    ("CN", "CNY", "¥", "Chinese Yuan", "China"),
    ("SA", "SAR", "ر.س", "Saudi Riyal", "Saudi Arabia"),
    ("KW", "KWD", "د.ك", "Kuwaiti Dinar", "Kuwait"),
    ("QA", "QAR", "ر.ق", "Qatari Riyal", "Qatar"),
    ("BH", "BHD", ".د.ب", "Bahraini Dinar", "Bahrain"),
    ("OM", "OMR", "ر.ع.", "Omani Rial", "Oman"),
    ("ZA", "ZAR", "R", "South African Rand", "South Africa"),
    ("NG", "NGN", "₦", "Nigerian Naira", "Nigeria"),
    ("EG", "EGP", "E£", "Egyptian Pound", "Egypt"),
    ("TR", "TRY", "₺", "Turkish Lira", "Turkey"),
    ("BR", "BRL", "R$", "Brazilian Real", "Brazil"),
    ("MX", "MXN", "$", "Mexican Peso", "Mexico"),
    ("PK", "PKR", "₨", "Pakistani Rupee", "Pakistan"),
    ("BD", "BDT", "৳", "Bangladeshi Taka", "Bangladesh"),
    ("PH", "PHP", "₱", "Philippine Peso", "Philippines"),
    ("ID", "IDR", "Rp", "Indonesian Rupiah", "Indonesia"),
    ("MY", "MYR", "RM", "Malaysian Ringgit", "Malaysia"),
    ("TH", "THB", "฿", "Thai Baht", "Thailand"),
    ("VN", "VND", "₫", "Vietnamese Dong", "Vietnam"),
];

/// Countries offered by the manual currency selector, in display order
const SELECTABLE_COUNTRIES: &[&str] = &[
    "US", "IN", "CN", "GB", "FR", "CA", "AU", "SG", "JP", "SA", "KW", "QA",
];

static DESCRIPTORS_BY_COUNTRY: Lazy<HashMap<CountryCode, CurrencyDescriptor>> = Lazy::new(|| {
    COUNTRY_CURRENCIES
        .iter()
        .map(|&(country, code, symbol, name, country_name)| {
            (
                CountryCode::from(country),
                CurrencyDescriptor::new(code, symbol, name, country_name),
            )
        })
        .collect()
});

/// Static country -> currency mapping. Lookups never fail: unknown countries resolve to USD.
pub struct CurrencyRegistry {
    descriptors: &'static HashMap<CountryCode, CurrencyDescriptor>,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl CurrencyRegistry {
    pub fn new(diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            descriptors: &*DESCRIPTORS_BY_COUNTRY,
            diagnostics,
        }
    }

    pub fn contains(&self, country_code: &str) -> bool {
        self.descriptors.contains_key(&CountryCode::from(country_code))
    }

    pub fn usd(&self) -> CurrencyDescriptor {
        self.descriptors
            .get(&CountryCode::from(USD_COUNTRY))
            .cloned()
            .unwrap_or_else(|| CurrencyDescriptor::new("USD", "$", "US Dollar", "United States"))
    }

    pub fn descriptor_for(&self, country_code: &str) -> CurrencyDescriptor {
        match self.descriptors.get(&CountryCode::from(country_code)) {
            Some(descriptor) => descriptor.clone(),
            None => {
                self.diagnostics.emit(
                    Level::Warn,
                    &CurrencyFailure::unsupported(LookupKind::Country, country_code),
                );
                self.usd()
            }
        }
    }

    /// First descriptor in table order which uses `currency_code`
    pub fn descriptor_for_currency(
        &self,
        currency_code: &CurrencyCode,
    ) -> Option<CurrencyDescriptor> {
        COUNTRY_CURRENCIES
            .iter()
            .find(|(_, code, ..)| *code == currency_code.as_str())
            .and_then(|(country, ..)| self.descriptors.get(&CountryCode::from(*country)))
            .cloned()
    }

    pub fn selectable_countries(&self) -> Vec<(CountryCode, CurrencyDescriptor)> {
        SELECTABLE_COUNTRIES
            .iter()
            .filter_map(|&country| {
                let country = CountryCode::from(country);
                self.descriptors
                    .get(&country)
                    .map(|descriptor| (country.clone(), descriptor.clone()))
            })
            .collect_vec()
    }

    pub fn supported_countries(&self) -> Vec<CountryCode> {
        COUNTRY_CURRENCIES
            .iter()
            .map(|(country, ..)| CountryCode::from(*country))
            .collect_vec()
    }
}
