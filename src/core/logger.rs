use std::env;
use std::sync::Once;

use chrono::Utc;
use log::LevelFilter;

use crate::core::settings::{Environment, LoggingSettings};

pub static NO_LOGS_ENV: &str = "LOCALIZED_PRICES_NO_LOGS";

const CRATE_TARGETS: &[&str] = &["localized_prices", "localized_prices_lib"];

pub fn init_logger(settings: &LoggingSettings) {
    if env::var(NO_LOGS_ENV).is_ok() {
        return;
    }

    static INIT_LOGGER: Once = Once::new();

    INIT_LOGGER.call_once(|| {
        let (default_level, crate_level) = match settings.environment {
            Environment::Development => (LevelFilter::Warn, LevelFilter::Trace),
            Environment::Production => (LevelFilter::Error, LevelFilter::Error),
        };

        let stdout = CRATE_TARGETS
            .iter()
            .fold(fern::Dispatch::new().level(default_level), |dispatch, target| {
                dispatch.level_for(*target, crate_level)
            })
            .chain(std::io::stdout());

        let mut dispatch = fern::Dispatch::new()
            .format(|out, message, record| {
                out.finish(format_args!(
                    "[{}][{}][{}] {}",
                    Utc::now().format("%Y-%m-%d %H:%M:%S,%3f"),
                    record.level(),
                    record.target(),
                    message
                ))
            })
            .chain(stdout);

        if let Some(log_file) = &settings.log_file {
            match std::fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(log_file)
            {
                Ok(file) => {
                    dispatch =
                        dispatch.chain(fern::Dispatch::new().level(LevelFilter::Warn).chain(file))
                }
                Err(error) => eprintln!("Unable to open log file {}: {}", log_file, error),
            }
        }

        if let Err(error) = dispatch.apply() {
            eprintln!("Unable to set up logger: {}", error);
        }
    })
}
