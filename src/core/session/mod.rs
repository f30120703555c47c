pub mod currency_session;
pub mod session_builder;
