use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::domain::{
    parse_discount, summarize_sales, Catalog, Cents, Discount, OrderError, OrderLedger, Receipt,
    Removal,
};
use crate::storage::Repository;

use super::{AppError, OrderSnapshot, SalesReport};

/// Application service for one counter: the menu, the order in progress and
/// the receipt book. This is the primary interface for any client (CLI, API, etc.).
pub struct CounterService {
    catalog: Arc<Catalog>,
    order: OrderLedger,
    repo: Repository,
}

/// Result of settling an order
pub struct SettlementResult {
    pub receipt: Receipt,
    /// Set when the requested discount was rejected and full price was charged
    pub discount_warning: Option<OrderError>,
}

impl CounterService {
    /// Create a new counter service over the given menu and receipt book.
    pub fn new(catalog: Arc<Catalog>, repo: Repository) -> Self {
        let order = OrderLedger::new(Arc::clone(&catalog));
        Self {
            catalog,
            order,
            repo,
        }
    }

    /// Initialize a new receipt database at the given path.
    pub async fn init(database_path: &str, catalog: Arc<Catalog>) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(catalog, repo))
    }

    /// Connect to an existing receipt database.
    pub async fn connect(database_path: &str, catalog: Arc<Catalog>) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(catalog, repo))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    // ========================
    // Order operations
    // ========================

    /// Add dishes by exact name. Returns the dish's new quantity.
    pub fn add_item(&mut self, name: &str, quantity: u32) -> Result<u32, AppError> {
        let total = self.order.add_item(name, quantity)?;
        tracing::debug!(dish = name, quantity, total, "added to order");
        Ok(total)
    }

    /// Add dishes by menu number or name. Returns the resolved name and new quantity.
    pub fn add_by_token(&mut self, token: &str, quantity: u32) -> Result<(String, u32), AppError> {
        let name = self
            .catalog
            .resolve(token)
            .map(|item| item.name.clone())
            .ok_or_else(|| OrderError::InvalidItem(token.trim().to_string()))?;
        let total = self.add_item(&name, quantity)?;
        Ok((name, total))
    }

    /// Return dishes by exact name.
    pub fn remove_item(&mut self, name: &str, quantity: u32) -> Result<Removal, AppError> {
        let removal = self.order.remove_item(name, quantity)?;
        tracing::debug!(dish = name, quantity, ?removal, "returned from order");
        Ok(removal)
    }

    /// Return dishes by menu number or name.
    pub fn remove_by_token(
        &mut self,
        token: &str,
        quantity: u32,
    ) -> Result<(String, Removal), AppError> {
        let name = self
            .catalog
            .resolve(token)
            .map(|item| item.name.clone())
            .ok_or_else(|| OrderError::ItemNotInOrder(token.trim().to_string()))?;
        let removal = self.remove_item(&name, quantity)?;
        Ok((name, removal))
    }

    pub fn clear_order(&mut self) {
        self.order.clear();
        tracing::debug!("order cleared");
    }

    pub fn set_customer(&mut self, customer: Option<String>) {
        self.order.set_customer(customer);
    }

    pub fn is_order_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn order_total(&self) -> Cents {
        self.order.compute_total()
    }

    pub fn order_snapshot(&self) -> OrderSnapshot {
        OrderSnapshot {
            customer: self.order.customer().map(str::to_string),
            lines: self.order.lines(),
            total_cents: self.order.compute_total(),
        }
    }

    // ========================
    // Settlement
    // ========================

    /// Price the current order without settling it.
    pub fn quote(&self, raw_discount: Option<&str>) -> Result<SettlementResult, AppError> {
        if self.order.is_empty() {
            return Err(OrderError::EmptyOrder.into());
        }
        let (discount, discount_warning) = resolve_discount(raw_discount);
        let receipt = self.order.preview(discount, Utc::now())?;
        Ok(SettlementResult {
            receipt,
            discount_warning,
        })
    }

    /// Settle the current order and store the receipt.
    ///
    /// An unusable discount never aborts the settlement: full price is charged
    /// and the rejection is returned as `discount_warning`. If the receipt cannot
    /// be stored the order is restored unchanged.
    pub async fn settle(&mut self, raw_discount: Option<&str>) -> Result<SettlementResult, AppError> {
        if self.order.is_empty() {
            return Err(OrderError::EmptyOrder.into());
        }
        let (discount, discount_warning) = resolve_discount(raw_discount);

        let pending = self.order.clone();
        let mut receipt = self.order.checkout(discount)?;

        if let Err(e) = self.repo.save_receipt(&mut receipt).await {
            self.order = pending;
            return Err(e.into());
        }

        tracing::info!(
            number = receipt.number,
            total = receipt.total_cents,
            discount = %receipt.discount,
            payable = receipt.final_cents,
            "order settled"
        );

        Ok(SettlementResult {
            receipt,
            discount_warning,
        })
    }

    // ========================
    // Receipt book
    // ========================

    /// List stored receipts, newest first.
    pub async fn list_receipts(&self, limit: Option<usize>) -> Result<Vec<Receipt>, AppError> {
        Ok(self.repo.list_receipts(limit).await?)
    }

    pub async fn receipt_count(&self) -> Result<i64, AppError> {
        Ok(self.repo.count_receipts().await?)
    }

    pub async fn get_receipt(&self, number: i64) -> Result<Receipt, AppError> {
        self.repo
            .get_receipt_by_number(number)
            .await?
            .ok_or(AppError::ReceiptNotFound(number))
    }

    /// Every stored receipt, oldest first.
    pub async fn list_all_receipts(&self) -> Result<Vec<Receipt>, AppError> {
        let mut receipts = self.repo.list_receipts(None).await?;
        receipts.reverse();
        Ok(receipts)
    }

    /// Sales over receipts settled within `[from, to]`.
    pub async fn sales_report(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<SalesReport, AppError> {
        if from > to {
            return Err(AppError::InvalidDateRange {
                from: from.to_rfc3339(),
                to: to.to_rfc3339(),
            });
        }
        let receipts = self.repo.list_receipts_between(from, to).await?;
        Ok(SalesReport::new(from, to, summarize_sales(&receipts)))
    }
}

/// Parse the requested discount, falling back to full price on bad input.
fn resolve_discount(raw: Option<&str>) -> (Discount, Option<OrderError>) {
    let Some(text) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return (Discount::NONE, None);
    };
    match parse_discount(text) {
        Ok(discount) => (discount, None),
        Err(e) => {
            tracing::warn!(input = text, error = %e, "discount rejected, charging full price");
            (Discount::NONE, Some(e))
        }
    }
}
