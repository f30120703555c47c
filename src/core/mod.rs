pub mod config;
pub mod connectivity;
pub mod currencies;
pub mod diagnostics;
pub mod logger;
pub(crate) mod misc;
pub mod pricing;
pub mod services;
pub mod session;
pub mod settings;
