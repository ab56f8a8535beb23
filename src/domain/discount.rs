use std::fmt;

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};

use super::{Cents, OrderError, scale_cents};

/// A multiplicative discount factor in (0, 1].
/// A factor of 0.8 means the guest pays 80%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Discount(Decimal);

impl Discount {
    /// Full price.
    pub const NONE: Discount = Discount(Decimal::ONE);

    pub fn from_decimal(factor: Decimal) -> Result<Self, OrderError> {
        if factor <= Decimal::ZERO || factor > Decimal::ONE {
            return Err(OrderError::InvalidDiscount(format!(
                "{} must lie in (0, 1]",
                factor
            )));
        }
        Ok(Self(factor.normalize()))
    }

    /// Build a discount from a ratio such as `0.8`.
    /// Zero is rejected so an order can never settle for free.
    pub fn from_ratio(ratio: f64) -> Result<Self, OrderError> {
        check_ratio(ratio)?;
        match Decimal::from_f64(ratio) {
            Some(factor) if !factor.is_zero() => Self::from_decimal(factor),
            _ => Err(OrderError::InvalidDiscount(format!(
                "{} is below the smallest representable factor",
                ratio
            ))),
        }
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }

    /// Apply the factor to a total, rounded half up to whole cents.
    pub fn apply(&self, total: Cents) -> Cents {
        // A factor of at most 1 cannot push a total out of range.
        scale_cents(total, self.0).unwrap_or(total)
    }
}

impl Default for Discount {
    fn default() -> Self {
        Self::NONE
    }
}

impl TryFrom<Decimal> for Discount {
    type Error = OrderError;

    fn try_from(factor: Decimal) -> Result<Self, Self::Error> {
        Self::from_decimal(factor)
    }
}

impl From<Discount> for Decimal {
    fn from(discount: Discount) -> Self {
        discount.0
    }
}

impl fmt::Display for Discount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Keep at least one decimal: "1.0", "0.8", "0.75"
        if self.0.scale() == 0 {
            write!(f, "{}.0", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

fn check_ratio(ratio: f64) -> Result<(), OrderError> {
    if !ratio.is_finite() || ratio <= 0.0 || ratio > 1.0 {
        return Err(OrderError::InvalidDiscount(format!(
            "{} must lie in (0, 1]",
            ratio
        )));
    }
    Ok(())
}

/// Apply a discount ratio to a total.
///
/// Returns `total * discount` rounded half up to two decimal places of
/// currency, or `InvalidDiscount` when the ratio is outside (0, 1].
pub fn apply_discount(total: Cents, discount: f64) -> Result<Cents, OrderError> {
    check_ratio(discount)?;
    // Factors too small for a decimal scale of 28 are zero for any total.
    let factor = Decimal::from_f64(discount).unwrap_or(Decimal::ZERO);
    scale_cents(total, factor).ok_or_else(|| {
        OrderError::InvalidDiscount(format!("{} cannot be applied to {}", discount, total))
    })
}
