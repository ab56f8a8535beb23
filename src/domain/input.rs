//! Turning free text typed at the counter into typed values.

use rust_decimal::Decimal;

use super::{Discount, OrderError};

/// Parse a dish quantity. Only positive whole numbers are accepted.
pub fn parse_quantity(input: &str) -> Result<u32, OrderError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(OrderError::InvalidQuantity("quantity is required".into()));
    }
    if !input.chars().all(|c| c.is_ascii_digit()) {
        return Err(OrderError::InvalidQuantity(format!(
            "'{}' is not a positive whole number",
            input
        )));
    }
    match input.parse::<u32>() {
        Ok(0) => Err(OrderError::InvalidQuantity(
            "quantity must be greater than 0".into(),
        )),
        Ok(quantity) => Ok(quantity),
        Err(_) => Err(OrderError::InvalidQuantity(format!("'{}' is too large", input))),
    }
}

/// Parse a discount factor: a ratio like `0.8`, or a percentage like `80%`.
pub fn parse_discount(input: &str) -> Result<Discount, OrderError> {
    let input = input.trim();
    let (number, scale) = match input.strip_suffix('%') {
        Some(percent) => (percent.trim(), Decimal::ONE_HUNDRED),
        None => (input, Decimal::ONE),
    };

    let value: Decimal = number
        .parse()
        .map_err(|_| OrderError::InvalidDiscount(format!("'{}' is not a number", input)))?;

    Discount::from_decimal(value / scale)
}
