use anyhow::Result;
use std::io::Write;

use crate::application::CounterService;
use crate::domain::{format_cents, Receipt};

/// Exporter for writing the receipt book out as CSV or JSON
pub struct Exporter<'a> {
    service: &'a CounterService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a CounterService) -> Self {
        Self { service }
    }

    /// Export receipts to CSV, one row per receipt line. Returns the number of receipts.
    pub async fn export_receipts_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let receipts = self.service.list_all_receipts().await?;
        write_receipts_csv(&receipts, writer)?;
        Ok(receipts.len())
    }

    /// Export receipts as a JSON array. Returns the number of receipts.
    pub async fn export_receipts_json<W: Write>(&self, writer: W) -> Result<usize> {
        let receipts = self.service.list_all_receipts().await?;
        serde_json::to_writer_pretty(writer, &receipts)?;
        Ok(receipts.len())
    }
}

/// Write receipts as CSV rows.
pub fn write_receipts_csv<W: Write>(receipts: &[Receipt], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record([
        "number",
        "settled_at",
        "customer",
        "item",
        "unit_price",
        "quantity",
        "subtotal",
        "total",
        "discount",
        "final",
    ])?;

    for receipt in receipts {
        for line in &receipt.lines {
            csv_writer.write_record([
                receipt.number.to_string(),
                receipt.settled_at.to_rfc3339(),
                receipt.customer.clone().unwrap_or_default(),
                line.name.clone(),
                format_cents(line.unit_price_cents),
                line.quantity.to_string(),
                format_cents(line.subtotal_cents),
                format_cents(receipt.total_cents),
                receipt.discount.to_string(),
                format_cents(receipt.final_cents),
            ])?;
        }
    }

    csv_writer.flush()?;
    Ok(())
}
