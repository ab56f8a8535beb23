use std::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Money is represented as integer cents so totals and discounts stay exact.
/// A dish priced 28 yuan is stored as 2800.
pub type Cents = i64;

/// Format cents as a human-readable currency string.
/// Example: 1680 -> "16.80", -5 -> "-0.05"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.abs();
    format!("{}{}.{:02}", sign, abs_cents / 100, abs_cents % 100)
}

/// Parse a non-negative decimal amount into cents.
/// Example: "16.8" -> 1680, "2" -> 200, ".5" -> 50
pub fn parse_amount(input: &str) -> Result<Cents, ParseAmountError> {
    let input = input.trim();
    if input.is_empty() || input.starts_with('-') || input.starts_with('+') {
        return Err(ParseAmountError::InvalidFormat);
    }

    let (units_str, decimals_str) = match input.split_once('.') {
        Some((units, decimals)) => (units, decimals),
        None => (input, ""),
    };

    if units_str.is_empty() && decimals_str.is_empty() {
        return Err(ParseAmountError::InvalidFormat);
    }
    if !units_str.chars().all(|c| c.is_ascii_digit())
        || !decimals_str.chars().all(|c| c.is_ascii_digit())
    {
        return Err(ParseAmountError::InvalidFormat);
    }
    if decimals_str.len() > 2 {
        return Err(ParseAmountError::TooManyDecimals);
    }

    let units: i64 = if units_str.is_empty() {
        0
    } else {
        units_str
            .parse()
            .map_err(|_| ParseAmountError::InvalidFormat)?
    };
    let decimal_cents: i64 = match decimals_str.len() {
        0 => 0,
        // "5" after the point means 50 cents
        1 => decimals_str.parse::<i64>().map_err(|_| ParseAmountError::InvalidFormat)? * 10,
        _ => decimals_str
            .parse()
            .map_err(|_| ParseAmountError::InvalidFormat)?,
    };

    units
        .checked_mul(100)
        .and_then(|c| c.checked_add(decimal_cents))
        .ok_or(ParseAmountError::InvalidFormat)
}

/// Parse a menu price. Prices must be strictly positive.
pub fn parse_price(input: &str) -> Result<Cents, ParseAmountError> {
    let cents = parse_amount(input)?;
    if cents <= 0 {
        return Err(ParseAmountError::NotPositive);
    }
    Ok(cents)
}

/// Multiply an amount by a decimal factor, rounding half up to the nearest cent.
/// Returns `None` when the result does not fit in `Cents`.
pub fn scale_cents(amount: Cents, factor: Decimal) -> Option<Cents> {
    Decimal::from(amount)
        .checked_mul(factor)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseAmountError {
    InvalidFormat,
    TooManyDecimals,
    NotPositive,
}

impl fmt::Display for ParseAmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseAmountError::InvalidFormat => write!(f, "invalid money format"),
            ParseAmountError::TooManyDecimals => {
                write!(f, "amounts have at most two decimal places")
            }
            ParseAmountError::NotPositive => write!(f, "amount must be greater than zero"),
        }
    }
}

impl std::error::Error for ParseAmountError {}
