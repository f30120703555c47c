use std::sync::Arc;

use anyhow::{bail, Context, Result};
use localized_prices_lib::core::config::{try_load_settings, CONFIG_PATH};
use localized_prices_lib::core::logger::init_logger;
use localized_prices_lib::core::session::session_builder::CurrencySessionBuilder;

struct CliArgs {
    config_path: String,
    country: Option<String>,
}

fn parse_args() -> Result<CliArgs> {
    let mut config_path = None;
    let mut country = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--country" => {
                country = Some(args.next().context("Missing value for --country")?);
            }
            _ if arg.starts_with("--") => bail!("Unknown argument {}", arg),
            _ if config_path.is_none() => config_path = Some(arg),
            _ => bail!("Unexpected argument {}", arg),
        }
    }

    Ok(CliArgs {
        config_path: config_path.unwrap_or_else(|| CONFIG_PATH.to_owned()),
        country,
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = parse_args()?;

    let loaded_settings = try_load_settings(&args.config_path)?;
    let settings = loaded_settings.clone().unwrap_or_default();
    init_logger(&settings.logging);
    if loaded_settings.is_none() {
        log::warn!(
            "Settings file {} not found, using default settings",
            args.config_path
        );
    }

    let session = Arc::new(CurrencySessionBuilder::new(settings.currency.clone()).build());

    let activation = session.clone().spawn_activation();
    if let Some(country) = &args.country {
        session.set_country(country);
    }
    activation
        .await
        .context("Currency detection task failed")?;

    let currency = session.currency();
    println!(
        "Prices in {} ({}, {})",
        currency.display_name, currency.code, currency.country_name
    );
    for tier in &settings.pricing.tiers {
        let localized = session.localize_tier(tier).await;
        let period = if localized.period.is_empty() {
            String::new()
        } else {
            format!(" / {}", localized.period)
        };
        let annual = match (&localized.monthly_equivalent, localized.annual_savings_percent) {
            (Some(per_month), Some(savings)) => format!(
                "{} ({} / month billed annually, save {}%)",
                localized.price_annual, per_month, savings
            ),
            (Some(per_month), None) => format!(
                "{} ({} / month billed annually)",
                localized.price_annual, per_month
            ),
            (None, _) => localized.price_annual.clone(),
        };
        println!(
            "{:<14} {}{}  annual: {}",
            localized.name, localized.price, period, annual
        );
    }

    Ok(())
}
