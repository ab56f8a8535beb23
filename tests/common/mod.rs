// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use tally::application::CounterService;
use tally::domain::{Catalog, MenuItem};
use tempfile::TempDir;

/// The two-dish menu used in most scenarios: rice 2.00, soup 15.00
pub fn rice_and_soup() -> Arc<Catalog> {
    Arc::new(
        Catalog::new(vec![MenuItem::new("rice", 200), MenuItem::new("soup", 1500)])
            .expect("valid menu"),
    )
}

/// Helper to create a test service with a temporary receipt database
pub async fn test_service() -> Result<(CounterService, TempDir)> {
    test_service_with(rice_and_soup()).await
}

pub async fn test_service_with(catalog: Arc<Catalog>) -> Result<(CounterService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = CounterService::init(db_path.to_str().unwrap(), catalog).await?;
    Ok((service, temp_dir))
}

/// Settle a one-dish order at full price
pub async fn settle_one(service: &mut CounterService, dish: &str, quantity: u32) -> Result<i64> {
    service.add_item(dish, quantity)?;
    let result = service.settle(None).await?;
    Ok(result.receipt.number)
}
