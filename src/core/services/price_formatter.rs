use rust_decimal::RoundingStrategy;

use crate::core::currencies::common::{Amount, CurrencyCode};
use crate::core::currencies::registry::CurrencyDescriptor;

/// Currencies written with the symbol after the amount
const SYMBOL_AFTER_AMOUNT: &[&str] = &["SAR", "QAR", "OMR", "KWD", "BHD", "AED"];

const DEFAULT_FRACTION_DIGITS: u32 = 2;

pub fn max_fraction_digits(currency_code: &CurrencyCode) -> u32 {
    match currency_code.as_str() {
        "JPY" => 0,
        _ => DEFAULT_FRACTION_DIGITS,
    }
}

/// en-US style: `,` groups thousands, trailing fraction zeros are dropped,
/// midpoint rounds away from zero
pub fn format_number(amount: Amount, max_fraction_digits: u32) -> String {
    let rounded = amount
        .round_dp_with_strategy(max_fraction_digits, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    if rounded.is_zero() {
        return "0".to_owned();
    }

    let digits = rounded.abs().to_string();
    let (integer_part, fraction_part) = match digits.split_once('.') {
        Some((integer_part, fraction_part)) => (integer_part, Some(fraction_part)),
        None => (digits.as_str(), None),
    };

    let mut formatted = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded.is_sign_negative() {
        formatted.push('-');
    }
    formatted.push_str(&group_thousands(integer_part));
    if let Some(fraction_part) = fraction_part {
        formatted.push('.');
        formatted.push_str(fraction_part);
    }

    formatted
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    grouped
}

pub fn format_price(amount: Amount, currency: &CurrencyDescriptor, show_code: bool) -> String {
    let formatted = format_number(amount, max_fraction_digits(&currency.code));

    if show_code || currency.symbol.is_empty() {
        return format!("{} {}", currency.code, formatted);
    }

    if SYMBOL_AFTER_AMOUNT.contains(&currency.code.as_str()) {
        format!("{} {}", formatted, currency.symbol)
    } else {
        format!("{}{}", currency.symbol, formatted)
    }
}
