use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::{Discount, Receipt, ReceiptId, ReceiptLine};

use super::MIGRATION_001_INITIAL;

/// Receipt book: persists settled receipts and hands out bill numbers.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        tracing::info!(database = database_url, "receipt book initialized");
        Ok(repo)
    }

    /// Store a settled receipt and its lines.
    /// Assigns the next bill number to `receipt.number`.
    pub async fn save_receipt(&self, receipt: &mut Receipt) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let row = sqlx::query(
            r#"
            UPDATE sequence_counter
            SET value = value + 1
            WHERE name = 'receipt_number'
            RETURNING value
            "#,
        )
        .fetch_one(&mut *tx)
        .await
        .context("Failed to get next receipt number")?;
        let number: i64 = row.get("value");

        sqlx::query(
            r#"
            INSERT INTO receipts (id, number, customer, total_cents, discount, final_cents, settled_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(receipt.id.to_string())
        .bind(number)
        .bind(&receipt.customer)
        .bind(receipt.total_cents)
        .bind(receipt.discount.as_decimal().to_string())
        .bind(receipt.final_cents)
        .bind(format_timestamp(receipt.settled_at))
        .execute(&mut *tx)
        .await
        .context("Failed to save receipt")?;

        for (position, line) in receipt.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO receipt_lines (receipt_id, position, name, unit_price_cents, quantity, subtotal_cents)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(receipt.id.to_string())
            .bind(position as i64)
            .bind(&line.name)
            .bind(line.unit_price_cents)
            .bind(line.quantity as i64)
            .bind(line.subtotal_cents)
            .execute(&mut *tx)
            .await
            .context("Failed to save receipt line")?;
        }

        tx.commit().await.context("Failed to commit receipt")?;
        receipt.number = number;

        tracing::debug!(number, id = %receipt.id, "receipt stored");
        Ok(())
    }

    /// Get a receipt by its bill number.
    pub async fn get_receipt_by_number(&self, number: i64) -> Result<Option<Receipt>> {
        let row = sqlx::query(
            r#"
            SELECT id, number, customer, total_cents, discount, final_cents, settled_at
            FROM receipts
            WHERE number = ?
            "#,
        )
        .bind(number)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch receipt")?;

        match row {
            Some(row) => Ok(Some(self.load_receipt(&row).await?)),
            None => Ok(None),
        }
    }

    /// List receipts, newest first.
    pub async fn list_receipts(&self, limit: Option<usize>) -> Result<Vec<Receipt>> {
        let mut query = String::from(
            "SELECT id, number, customer, total_cents, discount, final_cents, settled_at FROM receipts ORDER BY number DESC",
        );
        if let Some(lim) = limit {
            query.push_str(&format!(" LIMIT {}", lim));
        }

        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list receipts")?;

        let mut receipts = Vec::with_capacity(rows.len());
        for row in &rows {
            receipts.push(self.load_receipt(row).await?);
        }
        Ok(receipts)
    }

    /// List receipts settled within `[from, to]`, oldest first.
    pub async fn list_receipts_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Receipt>> {
        let rows = sqlx::query(
            r#"
            SELECT id, number, customer, total_cents, discount, final_cents, settled_at
            FROM receipts
            WHERE settled_at >= ? AND settled_at <= ?
            ORDER BY number
            "#,
        )
        .bind(format_timestamp(from))
        .bind(format_timestamp(to))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list receipts in range")?;

        let mut receipts = Vec::with_capacity(rows.len());
        for row in &rows {
            receipts.push(self.load_receipt(row).await?);
        }
        Ok(receipts)
    }

    pub async fn count_receipts(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM receipts")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count receipts")?;
        Ok(row.get("count"))
    }

    async fn load_receipt(&self, row: &sqlx::sqlite::SqliteRow) -> Result<Receipt> {
        let id_str: String = row.get("id");
        let id = Uuid::parse_str(&id_str).context("Invalid receipt ID")?;
        let lines = self.load_lines(id).await?;
        Self::row_to_receipt(row, id, lines)
    }

    async fn load_lines(&self, receipt_id: ReceiptId) -> Result<Vec<ReceiptLine>> {
        let rows = sqlx::query(
            r#"
            SELECT name, unit_price_cents, quantity, subtotal_cents
            FROM receipt_lines
            WHERE receipt_id = ?
            ORDER BY position
            "#,
        )
        .bind(receipt_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch receipt lines")?;

        rows.iter()
            .map(|row| {
                let quantity: i64 = row.get("quantity");
                Ok(ReceiptLine {
                    name: row.get("name"),
                    unit_price_cents: row.get("unit_price_cents"),
                    quantity: u32::try_from(quantity).context("Invalid line quantity")?,
                    subtotal_cents: row.get("subtotal_cents"),
                })
            })
            .collect()
    }

    fn row_to_receipt(
        row: &sqlx::sqlite::SqliteRow,
        id: ReceiptId,
        lines: Vec<ReceiptLine>,
    ) -> Result<Receipt> {
        let discount_str: String = row.get("discount");
        let settled_at_str: String = row.get("settled_at");

        let discount = discount_str
            .parse::<Decimal>()
            .ok()
            .and_then(|factor| Discount::from_decimal(factor).ok())
            .ok_or_else(|| anyhow::anyhow!("Invalid stored discount: {}", discount_str))?;

        Ok(Receipt {
            id,
            number: row.get("number"),
            customer: row.get("customer"),
            lines,
            total_cents: row.get("total_cents"),
            discount,
            final_cents: row.get("final_cents"),
            settled_at: DateTime::parse_from_rfc3339(&settled_at_str)
                .context("Invalid settled_at timestamp")?
                .with_timezone(&Utc),
        })
    }
}

/// Fixed-width UTC timestamps so range queries can compare text.
fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}
