pub mod exchange_rate_provider;
pub mod exchange_rate_source;
pub mod exchange_rate_table;
