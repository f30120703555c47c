use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use log::Level;

use crate::core::currencies::common::CountryCode;
use crate::core::currencies::registry::USD_COUNTRY;
use crate::core::diagnostics::{CurrencyFailure, DiagnosticSink};

use super::detection_layer::DetectionLayer;

/// Runs detection layers in order and takes the first conclusive answer.
/// Detection is total: when every layer fails the fallback country is returned.
pub struct CountryDetector {
    layers: Vec<Box<dyn DetectionLayer>>,
    fallback_country: CountryCode,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl CountryDetector {
    pub fn new(
        layers: Vec<Box<dyn DetectionLayer>>,
        fallback_country: CountryCode,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Self {
        let fallback_country = CountryCode::parse_alpha2(fallback_country.as_str())
            .unwrap_or_else(|| {
                log::warn!(
                    "Invalid fallback country {:?}, using {}",
                    fallback_country.as_str(),
                    USD_COUNTRY
                );
                CountryCode::from(USD_COUNTRY)
            });

        Self {
            layers,
            fallback_country,
            diagnostics,
        }
    }

    pub fn fallback_country(&self) -> &CountryCode {
        &self.fallback_country
    }

    pub async fn detect_country(&self) -> CountryCode {
        for layer in &self.layers {
            let layer_name = layer.name();
            let outcome = AssertUnwindSafe(async { layer.detect().await })
                .catch_unwind()
                .await;

            match outcome {
                Ok(Ok(Some(country))) => {
                    log::info!("Country {} detected by {} layer", country, layer_name);
                    return country;
                }
                Ok(Ok(None)) => log::debug!("{} layer is inconclusive", layer_name),
                Ok(Err(failure)) => self.diagnostics.emit(Level::Warn, &failure),
                Err(panic) => self.diagnostics.emit(
                    Level::Error,
                    &CurrencyFailure::detection_layer(
                        layer_name,
                        format!("panicked: {}", panic_message(panic.as_ref())),
                    ),
                ),
            }
        }

        log::info!(
            "All detection layers failed, using fallback country {}",
            self.fallback_country
        );
        self.fallback_country.clone()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    match panic.downcast_ref::<&'static str>() {
        Some(message) => message,
        None => match panic.downcast_ref::<String>() {
            Some(message) => message.as_str(),
            None => "without message",
        },
    }
}
