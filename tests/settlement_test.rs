mod common;

use std::sync::Arc;

use anyhow::Result;
use common::{rice_and_soup, settle_one, test_service, test_service_with};
use tally::application::AppError;
use tally::domain::{Catalog, OrderError, Removal};

#[tokio::test]
async fn test_settle_with_discount() -> Result<()> {
    let (mut service, _temp) = test_service().await?;

    service.add_item("rice", 3)?;
    service.add_item("soup", 1)?;
    assert_eq!(service.order_total(), 2100);

    let result = service.settle(Some("0.8")).await?;

    assert!(result.discount_warning.is_none());
    assert_eq!(result.receipt.number, 1);
    assert_eq!(result.receipt.total_cents, 2100);
    assert_eq!(result.receipt.final_cents, 1680);
    assert_eq!(result.receipt.discount.to_string(), "0.8");

    // Lines keep the order dishes were added in
    let names: Vec<_> = result.receipt.lines.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["rice", "soup"]);
    assert_eq!(result.receipt.lines[0].subtotal_cents, 600);

    // The order is reset after settlement
    let snapshot = service.order_snapshot();
    assert!(snapshot.lines.is_empty());
    assert_eq!(snapshot.total_cents, 0);

    Ok(())
}

#[tokio::test]
async fn test_settle_without_discount_charges_full_price() -> Result<()> {
    let (mut service, _temp) = test_service().await?;

    service.add_item("soup", 2)?;
    let result = service.settle(None).await?;

    assert_eq!(result.receipt.final_cents, 3000);
    assert!(result.receipt.discount.is_none());
    assert!(result.discount_warning.is_none());

    Ok(())
}

#[tokio::test]
async fn test_invalid_discount_falls_back_to_full_price() -> Result<()> {
    let (mut service, _temp) = test_service().await?;

    for raw in ["0", "1.5", "abc", "-0.2"] {
        service.add_item("rice", 3)?;
        service.add_item("soup", 1)?;

        let result = service.settle(Some(raw)).await?;

        assert_eq!(result.receipt.final_cents, 2100, "discount '{}'", raw);
        assert!(result.receipt.discount.is_none());
        assert!(matches!(
            result.discount_warning,
            Some(OrderError::InvalidDiscount(_))
        ));
    }

    assert_eq!(service.list_receipts(None).await?.len(), 4);
    Ok(())
}

#[tokio::test]
async fn test_settle_empty_order_fails() -> Result<()> {
    let (mut service, _temp) = test_service().await?;

    let result = service.settle(Some("0.8")).await;
    assert!(matches!(
        result,
        Err(AppError::Order(OrderError::EmptyOrder))
    ));

    // Nothing was stored and no bill number was used
    assert!(service.list_receipts(None).await?.is_empty());
    assert_eq!(settle_one(&mut service, "rice", 1).await?, 1);

    Ok(())
}

#[tokio::test]
async fn test_remove_more_than_ordered_empties_entry() -> Result<()> {
    let (mut service, _temp) = test_service().await?;

    service.add_item("rice", 2)?;
    assert_eq!(service.remove_item("rice", 5)?, Removal::Removed);
    assert_eq!(service.order_total(), 0);

    let result = service.settle(None).await;
    assert!(matches!(
        result,
        Err(AppError::Order(OrderError::EmptyOrder))
    ));

    Ok(())
}

#[tokio::test]
async fn test_ledger_errors_surface_through_service() -> Result<()> {
    let (mut service, _temp) = test_service().await?;

    assert!(matches!(
        service.add_item("noodles", 1),
        Err(AppError::Order(OrderError::InvalidItem(_)))
    ));
    assert!(matches!(
        service.add_item("rice", 0),
        Err(AppError::Order(OrderError::InvalidQuantity(_)))
    ));
    assert!(matches!(
        service.remove_item("soup", 1),
        Err(AppError::Order(OrderError::ItemNotInOrder(_)))
    ));
    assert!(service.order_snapshot().lines.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_quote_does_not_settle() -> Result<()> {
    let (mut service, _temp) = test_service().await?;

    service.add_item("soup", 1)?;
    let quote = service.quote(Some("50%"))?;

    assert_eq!(quote.receipt.final_cents, 750);
    assert_eq!(quote.receipt.number, 0);
    assert_eq!(service.order_total(), 1500);
    assert!(service.list_receipts(None).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_add_and_remove_by_menu_number() -> Result<()> {
    let (mut service, _temp) = test_service_with(Arc::new(Catalog::default_menu())).await?;

    // 4 is rice, 6 is soup on the built-in menu
    assert_eq!(service.add_by_token("4", 3)?, ("rice".to_string(), 3));
    assert_eq!(service.add_by_token("soup", 1)?, ("soup".to_string(), 1));
    assert_eq!(
        service.remove_by_token("6", 1)?,
        ("soup".to_string(), Removal::Removed)
    );
    assert!(matches!(
        service.add_by_token("99", 1),
        Err(AppError::Order(OrderError::InvalidItem(_)))
    ));

    assert_eq!(service.order_total(), 600);
    Ok(())
}

#[tokio::test]
async fn test_customer_name_is_printed_once() -> Result<()> {
    let (mut service, _temp) = test_service_with(rice_and_soup()).await?;

    service.set_customer(Some("Ms. Li".into()));
    service.add_item("rice", 1)?;
    let first = service.settle(None).await?;
    assert_eq!(first.receipt.customer.as_deref(), Some("Ms. Li"));

    // Settlement resets the customer along with the order
    service.add_item("rice", 1)?;
    let second = service.settle(None).await?;
    assert_eq!(second.receipt.customer, None);

    Ok(())
}

#[tokio::test]
async fn test_clear_order() -> Result<()> {
    let (mut service, _temp) = test_service().await?;

    service.add_item("rice", 3)?;
    service.clear_order();

    assert!(service.order_snapshot().lines.is_empty());
    assert!(matches!(
        service.quote(None),
        Err(AppError::Order(OrderError::EmptyOrder))
    ));

    Ok(())
}

#[tokio::test]
async fn test_failed_save_restores_the_order() -> Result<()> {
    let (mut service, temp) = test_service().await?;

    service.set_customer(Some("Table 2".into()));
    service.add_item("rice", 3)?;
    service.add_item("soup", 1)?;

    // Take the receipts table away behind the service's back
    let db_url = format!("sqlite:{}", temp.path().join("test.db").display());
    let pool = sqlx::SqlitePool::connect(&db_url).await?;
    sqlx::query("DROP TABLE receipts").execute(&pool).await?;

    let result = service.settle(Some("0.8")).await;
    assert!(matches!(result, Err(AppError::Database(_))));

    let snapshot = service.order_snapshot();
    assert_eq!(snapshot.customer.as_deref(), Some("Table 2"));
    let lines: Vec<_> = snapshot
        .lines
        .iter()
        .map(|l| (l.name.as_str(), l.quantity))
        .collect();
    assert_eq!(lines, vec![("rice", 3), ("soup", 1)]);
    assert_eq!(snapshot.total_cents, 2100);

    let counter: i64 =
        sqlx::query_scalar("SELECT value FROM sequence_counter WHERE name = 'receipt_number'")
            .fetch_one(&pool)
            .await?;
    assert_eq!(counter, 0);

    // Once the table is back the same order settles as receipt #1
    sqlx::query(tally::storage::MIGRATION_001_INITIAL)
        .execute(&pool)
        .await?;
    let result = service.settle(Some("0.8")).await?;
    assert_eq!(result.receipt.number, 1);
    assert_eq!(result.receipt.final_cents, 1680);
    assert_eq!(result.receipt.customer.as_deref(), Some("Table 2"));

    Ok(())
}

#[tokio::test]
async fn test_order_emptiness() -> Result<()> {
    let (mut service, _temp) = test_service().await?;

    assert!(service.is_order_empty());
    service.add_item("soup", 1)?;
    assert!(!service.is_order_empty());
    service.remove_item("soup", 1)?;
    assert!(service.is_order_empty());

    Ok(())
}
