pub mod country_detection;
pub mod exchange_rates;
pub mod price_converter;
pub mod price_formatter;
