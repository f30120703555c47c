use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::core::currencies::common::CountryCode;
use crate::core::diagnostics::CurrencyFailure;

/// One strategy of the country detection chain
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DetectionLayer: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Ok(None)` means the layer worked but found nothing conclusive
    async fn detect(&self) -> Result<Option<CountryCode>, CurrencyFailure>;
}
