use std::fmt::{self, Display, Formatter};

use log::Level;
use parking_lot::Mutex;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum LookupKind {
    Country,
    Currency,
}

impl Display for LookupKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LookupKind::Country => write!(f, "country"),
            LookupKind::Currency => write!(f, "currency"),
        }
    }
}

/// Every failure of the currency subsystem is recoverable:
/// it is reported and a degraded result is used instead
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum CurrencyFailure {
    #[error("{layer} detection layer failed: {reason}")]
    DetectionLayer { layer: &'static str, reason: String },

    #[error("Failed to fetch exchange rates: {0}")]
    RateFetch(String),

    #[error("Unsupported {kind} code {code}, falling back to USD")]
    UnsupportedLookup { kind: LookupKind, code: String },

    #[error("Malformed numeric input {0:?}, treating as 0")]
    MalformedNumericInput(String),
}

impl CurrencyFailure {
    pub fn detection_layer(layer: &'static str, reason: impl Display) -> Self {
        CurrencyFailure::DetectionLayer {
            layer,
            reason: reason.to_string(),
        }
    }

    pub fn unsupported(kind: LookupKind, code: impl Display) -> Self {
        CurrencyFailure::UnsupportedLookup {
            kind,
            code: code.to_string(),
        }
    }
}

pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, level: Level, failure: &CurrencyFailure);
}

/// Forwards diagnostics to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl DiagnosticSink for LogDiagnostics {
    fn emit(&self, level: Level, failure: &CurrencyFailure) {
        log::log!(level, "{}", failure);
    }
}

/// Keeps every emitted diagnostic in memory so callers can inspect them later
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    records: Mutex<Vec<(Level, CurrencyFailure)>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(Level, CurrencyFailure)> {
        self.records.lock().clone()
    }

    pub fn failures(&self) -> Vec<CurrencyFailure> {
        self.records
            .lock()
            .iter()
            .map(|(_, failure)| failure.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl DiagnosticSink for RecordingDiagnostics {
    fn emit(&self, level: Level, failure: &CurrencyFailure) {
        self.records.lock().push((level, failure.clone()));
    }
}
