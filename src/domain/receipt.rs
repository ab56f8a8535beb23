use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, Discount};

pub type ReceiptId = Uuid;

/// One dish on a settled bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub name: String,
    pub unit_price_cents: Cents,
    pub quantity: u32,
    pub subtotal_cents: Cents,
}

/// The settlement of one order. Receipts are immutable once issued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub id: ReceiptId,
    /// Monotonically increasing bill number, assigned when the receipt is stored
    pub number: i64,
    pub customer: Option<String>,
    /// Lines in the order the dishes were first added
    pub lines: Vec<ReceiptLine>,
    pub total_cents: Cents,
    pub discount: Discount,
    /// Amount payable after the discount
    pub final_cents: Cents,
    pub settled_at: DateTime<Utc>,
}

impl Receipt {
    /// Issue a receipt for the given lines. The number is assigned by the receipt book.
    pub fn new(lines: Vec<ReceiptLine>, discount: Discount, settled_at: DateTime<Utc>) -> Self {
        let total_cents = lines.iter().map(|line| line.subtotal_cents).sum();
        Self {
            id: Uuid::new_v4(),
            number: 0,
            customer: None,
            lines,
            total_cents,
            discount,
            final_cents: discount.apply(total_cents),
            settled_at,
        }
    }

    pub fn with_customer(mut self, customer: Option<String>) -> Self {
        self.customer = customer;
        self
    }

    /// How much the discount took off the bill.
    pub fn discount_cents(&self) -> Cents {
        self.total_cents - self.final_cents
    }

    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| line.quantity as u64).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSales {
    pub name: String,
    pub quantity: u64,
    pub revenue_cents: Cents,
}

/// Totals over a set of receipts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesSummary {
    pub receipt_count: usize,
    pub gross_cents: Cents,
    pub discount_cents: Cents,
    pub net_cents: Cents,
    /// Sorted by revenue, highest first
    pub items: Vec<ItemSales>,
}

/// Aggregate receipts into a sales summary.
/// Item revenue is counted before discount, since discounts apply to whole bills.
pub fn summarize_sales(receipts: &[Receipt]) -> SalesSummary {
    let mut items: HashMap<&str, ItemSales> = HashMap::new();
    let mut summary = SalesSummary {
        receipt_count: receipts.len(),
        ..Default::default()
    };

    for receipt in receipts {
        summary.gross_cents += receipt.total_cents;
        summary.net_cents += receipt.final_cents;

        for line in &receipt.lines {
            let entry = items.entry(&line.name).or_insert_with(|| ItemSales {
                name: line.name.clone(),
                quantity: 0,
                revenue_cents: 0,
            });
            entry.quantity += line.quantity as u64;
            entry.revenue_cents += line.subtotal_cents;
        }
    }
    summary.discount_cents = summary.gross_cents - summary.net_cents;

    summary.items = items.into_values().collect();
    summary.items.sort_by(|a, b| {
        b.revenue_cents
            .cmp(&a.revenue_cents)
            .then_with(|| a.name.cmp(&b.name))
    });

    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(name: &str, price: Cents, quantity: u32) -> ReceiptLine {
        ReceiptLine {
            name: name.into(),
            unit_price_cents: price,
            quantity,
            subtotal_cents: price * quantity as Cents,
        }
    }

    #[test]
    fn test_receipt_totals() {
        let discount = Discount::from_ratio(0.8).unwrap();
        let receipt = Receipt::new(
            vec![line("rice", 200, 3), line("soup", 1500, 1)],
            discount,
            Utc::now(),
        );

        assert_eq!(receipt.total_cents, 2100);
        assert_eq!(receipt.final_cents, 1680);
        assert_eq!(receipt.discount_cents(), 420);
        assert_eq!(receipt.item_count(), 4);
        assert_eq!(receipt.number, 0);
    }

    #[test]
    fn test_summarize_empty() {
        assert_eq!(summarize_sales(&[]), SalesSummary::default());
    }

    #[test]
    fn test_summarize_sales() {
        let receipts = vec![
            Receipt::new(
                vec![line("rice", 200, 3), line("soup", 1500, 1)],
                Discount::from_ratio(0.8).unwrap(),
                Utc::now(),
            ),
            Receipt::new(vec![line("rice", 200, 2)], Discount::NONE, Utc::now()),
            Receipt::new(vec![line("salad", 500, 1)], Discount::NONE, Utc::now()),
        ];

        let summary = summarize_sales(&receipts);

        assert_eq!(summary.receipt_count, 3);
        assert_eq!(summary.gross_cents, 2100 + 400 + 500);
        assert_eq!(summary.net_cents, 1680 + 400 + 500);
        assert_eq!(summary.discount_cents, 420);

        let names: Vec<_> = summary.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["soup", "rice", "salad"]);
        assert_eq!(summary.items[1].quantity, 5);
        assert_eq!(summary.items[1].revenue_cents, 1000);
    }
}
