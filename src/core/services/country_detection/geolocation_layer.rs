use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use hyper::Uri;
#[cfg(test)]
use mockall::automock;
use serde::Deserialize;

use crate::core::connectivity::rest_client::RestClient;
use crate::core::currencies::common::CountryCode;
use crate::core::currencies::registry::CurrencyRegistry;
use crate::core::diagnostics::CurrencyFailure;

use super::detection_layer::DetectionLayer;

pub const GEOLOCATION_LAYER: &str = "geolocation";

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Geolocation {
    pub country_code: CountryCode,
    pub country_name: Option<String>,
}

#[derive(Deserialize)]
struct GeolocationResponse {
    country_code: Option<String>,
    country_name: Option<String>,
}

impl Geolocation {
    /// Parses ipapi.co compatible payload:
    /// `{ "country_code": "AE", "country_name": "United Arab Emirates", ... }`
    pub fn from_response(content: &str) -> Result<Self> {
        let response: GeolocationResponse =
            serde_json::from_str(content).context("Unable to parse geolocation response")?;

        let raw_code = response
            .country_code
            .with_context(|| format!("Field 'country_code' is missing in {}", content))?;
        let country_code = CountryCode::parse_alpha2(&raw_code)
            .with_context(|| format!("Invalid country code {:?}", raw_code))?;

        Ok(Self {
            country_code,
            country_name: response.country_name,
        })
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait GeolocationSource: Send + Sync {
    async fn locate(&self) -> Result<Geolocation>;
}

pub struct HttpGeolocationSource {
    rest_client: RestClient,
    url: String,
}

impl HttpGeolocationSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            rest_client: RestClient::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl GeolocationSource for HttpGeolocationSource {
    async fn locate(&self) -> Result<Geolocation> {
        let uri: Uri = self
            .url
            .as_str()
            .try_into()
            .with_context(|| format!("Invalid geolocation url {}", self.url))?;

        let outcome = self.rest_client.get(uri).await?;
        if !outcome.is_success() {
            bail!("Geolocation service returned status {}", outcome.status);
        }

        Geolocation::from_response(&outcome.content)
    }
}

/// IP geolocation bounded by a hard timeout
pub struct GeolocationLayer {
    source: Arc<dyn GeolocationSource>,
    timeout: Duration,
    registry: Arc<CurrencyRegistry>,
}

impl GeolocationLayer {
    pub fn new(
        source: Arc<dyn GeolocationSource>,
        timeout: Duration,
        registry: Arc<CurrencyRegistry>,
    ) -> Self {
        Self {
            source,
            timeout,
            registry,
        }
    }
}

#[async_trait]
impl DetectionLayer for GeolocationLayer {
    fn name(&self) -> &'static str {
        GEOLOCATION_LAYER
    }

    async fn detect(&self) -> Result<Option<CountryCode>, CurrencyFailure> {
        let geolocation = tokio::time::timeout(self.timeout, self.source.locate())
            .await
            .map_err(|_| {
                CurrencyFailure::detection_layer(
                    GEOLOCATION_LAYER,
                    format!("timed out after {} ms", self.timeout.as_millis()),
                )
            })?
            .map_err(|error| {
                CurrencyFailure::detection_layer(GEOLOCATION_LAYER, format!("{:#}", error))
            })?;

        log::info!(
            "IP geolocation detected country {} ({})",
            geolocation.country_code,
            geolocation.country_name.as_deref().unwrap_or("Unknown")
        );
        if !self.registry.contains(geolocation.country_code.as_str()) {
            // still conclusive: the registry resolves unknown countries to USD
            log::warn!(
                "Country {} has no currency mapping, USD will be used",
                geolocation.country_code
            );
        }

        Ok(Some(geolocation.country_code))
    }
}
