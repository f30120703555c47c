pub mod common;
pub mod registry;
