#[cfg(test)]
use mockall::automock;
/// If you'll use this mod in some tests, mocks object should be created.
/// Automock doesn't support default implementation.
/// NOTE: you need to avoid using mock objects in a parallel way
/// https://docs.rs/mockall/0.11/mockall/#static-methods
#[cfg_attr(test, automock)]
pub(crate) mod time_manager {

    use crate::core::currencies::common::DateTime;

    /// Return current date in UTC
    pub(crate) fn now() -> DateTime {
        chrono::Utc::now()
    }
}
