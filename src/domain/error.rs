use thiserror::Error;

use super::Cents;

/// Recoverable failures of order-ledger operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("Item is not on the menu: {0}")]
    InvalidItem(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Item is not in the order: {0}")]
    ItemNotInOrder(String),

    #[error("Invalid discount: {0}")]
    InvalidDiscount(String),

    #[error("Order is empty")]
    EmptyOrder,
}

/// Reasons a menu cannot become a catalog.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Menu has no items")]
    Empty,

    #[error("Menu item {position} has a blank name")]
    BlankName { position: usize },

    #[error("Menu item listed twice: {0}")]
    DuplicateItem(String),

    #[error("Menu item '{name}' has a non-positive price ({price_cents} cents)")]
    NonPositivePrice { name: String, price_cents: Cents },
}
