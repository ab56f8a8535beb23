use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Catalog, Cents, Discount, OrderError, Receipt, ReceiptLine};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderState {
    Empty,
    NonEmpty,
}

/// Outcome of returning dishes from the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Decremented { remaining: u32 },
    /// The requested amount met or exceeded what was ordered; the entry is gone.
    Removed,
}

/// A snapshot of one order entry, priced from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub name: String,
    pub unit_price_cents: Cents,
    pub quantity: u32,
    pub subtotal_cents: Cents,
}

/// One dish in the order, priced when it was first added.
#[derive(Debug, Clone)]
struct OrderEntry {
    name: String,
    unit_price_cents: Cents,
    quantity: u32,
}

impl OrderEntry {
    fn subtotal(&self) -> Option<Cents> {
        self.unit_price_cents.checked_mul(self.quantity as Cents)
    }
}

/// The order for the current table: dish name -> quantity.
///
/// Every entry names a dish in the catalog and holds a positive quantity;
/// entries keep the order in which dishes were first added. Every subtotal
/// and the order total fit in `Cents`.
#[derive(Debug, Clone)]
pub struct OrderLedger {
    catalog: Arc<Catalog>,
    entries: Vec<OrderEntry>,
    customer: Option<String>,
}

impl OrderLedger {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            entries: Vec::new(),
            customer: None,
        }
    }

    pub fn state(&self) -> OrderState {
        if self.entries.is_empty() {
            OrderState::Empty
        } else {
            OrderState::NonEmpty
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn customer(&self) -> Option<&str> {
        self.customer.as_deref()
    }

    /// Record the guest's name for the bill. Blank names clear it.
    pub fn set_customer(&mut self, customer: Option<String>) {
        self.customer = customer
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());
    }

    pub fn quantity_of(&self, name: &str) -> Option<u32> {
        self.position(name).map(|i| self.entries[i].quantity)
    }

    /// Add `quantity` of a dish. Returns the dish's new quantity.
    ///
    /// Fails with `InvalidQuantity` when the quantity, the dish's subtotal or
    /// the order total would overflow.
    pub fn add_item(&mut self, name: &str, quantity: u32) -> Result<u32, OrderError> {
        let unit_price_cents = self
            .catalog
            .price_of(name)
            .ok_or_else(|| OrderError::InvalidItem(name.to_string()))?;
        if quantity == 0 {
            return Err(OrderError::InvalidQuantity(
                "quantity must be greater than 0".into(),
            ));
        }

        let overflow = || {
            OrderError::InvalidQuantity(format!(
                "{} more {} would overflow the order",
                quantity, name
            ))
        };

        let mut updated = self.entries.clone();
        let updated_quantity = match self.position(name) {
            Some(i) => {
                let entry = &mut updated[i];
                entry.quantity = entry.quantity.checked_add(quantity).ok_or_else(overflow)?;
                entry.quantity
            }
            None => {
                updated.push(OrderEntry {
                    name: name.to_string(),
                    unit_price_cents,
                    quantity,
                });
                quantity
            }
        };
        checked_total(&updated).ok_or_else(overflow)?;

        self.entries = updated;
        Ok(updated_quantity)
    }

    /// Return `quantity` of a dish. Asking for at least what was ordered
    /// removes the entry.
    pub fn remove_item(&mut self, name: &str, quantity: u32) -> Result<Removal, OrderError> {
        let i = self
            .position(name)
            .ok_or_else(|| OrderError::ItemNotInOrder(name.to_string()))?;
        if quantity == 0 {
            return Err(OrderError::InvalidQuantity(
                "quantity must be greater than 0".into(),
            ));
        }

        let current = self.entries[i].quantity;
        if quantity >= current {
            self.entries.remove(i);
            Ok(Removal::Removed)
        } else {
            let remaining = current - quantity;
            self.entries[i].quantity = remaining;
            Ok(Removal::Decremented { remaining })
        }
    }

    /// Empty the order and forget the customer.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.customer = None;
    }

    pub fn lines(&self) -> Vec<OrderLine> {
        self.entries
            .iter()
            .map(|entry| OrderLine {
                name: entry.name.clone(),
                unit_price_cents: entry.unit_price_cents,
                quantity: entry.quantity,
                subtotal_cents: entry.unit_price_cents * entry.quantity as Cents,
            })
            .collect()
    }

    /// Sum of unit price times quantity over all entries.
    pub fn compute_total(&self) -> Cents {
        self.entries
            .iter()
            .map(|entry| entry.unit_price_cents * entry.quantity as Cents)
            .sum()
    }

    /// Price the order into a receipt without changing it.
    pub fn preview(&self, discount: Discount, at: DateTime<Utc>) -> Result<Receipt, OrderError> {
        if self.is_empty() {
            return Err(OrderError::EmptyOrder);
        }
        let lines = self
            .lines()
            .into_iter()
            .map(|line| ReceiptLine {
                name: line.name,
                unit_price_cents: line.unit_price_cents,
                quantity: line.quantity,
                subtotal_cents: line.subtotal_cents,
            })
            .collect();
        Ok(Receipt::new(lines, discount, at).with_customer(self.customer.clone()))
    }

    /// Settle the order: issue a receipt, then reset to empty.
    pub fn checkout(&mut self, discount: Discount) -> Result<Receipt, OrderError> {
        let receipt = self.preview(discount, Utc::now())?;
        self.clear();
        Ok(receipt)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.name == name)
    }
}

fn checked_total(entries: &[OrderEntry]) -> Option<Cents> {
    entries
        .iter()
        .try_fold(0 as Cents, |total, entry| total.checked_add(entry.subtotal()?))
}
