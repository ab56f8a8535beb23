use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Cents, OrderLine, SalesSummary};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesReport {
    pub from_date: DateTime<Utc>,
    pub to_date: DateTime<Utc>,
    #[serde(flatten)]
    pub summary: SalesSummary,
    /// Net takings per receipt, rounded down to the cent
    pub average_bill_cents: Cents,
}

impl SalesReport {
    pub fn new(from_date: DateTime<Utc>, to_date: DateTime<Utc>, summary: SalesSummary) -> Self {
        let average_bill_cents = if summary.receipt_count == 0 {
            0
        } else {
            summary.net_cents / summary.receipt_count as Cents
        };
        Self {
            from_date,
            to_date,
            summary,
            average_bill_cents,
        }
    }
}

/// Read-only view of the order in progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub customer: Option<String>,
    pub lines: Vec<OrderLine>,
    pub total_cents: Cents,
}
