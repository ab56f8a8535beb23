mod common;

use std::io::Cursor;

use anyhow::Result;
use common::test_service;
use tally::application::CounterService;
use tally::cli::Session;

/// Feed a script to a session and return everything it printed.
async fn run_script(service: &mut CounterService, script: &str) -> Result<String> {
    let mut output = Vec::new();
    Session::new(service, Cursor::new(script.as_bytes()), &mut output)
        .run()
        .await?;
    Ok(String::from_utf8(output)?)
}

#[tokio::test]
async fn test_session_takes_and_settles_an_order() -> Result<()> {
    let (mut service, _temp) = test_service().await?;

    let output = run_script(
        &mut service,
        "add rice 3\nadd soup\norder\ncheckout 0.8\nquit\n",
    )
    .await?;

    assert!(output.starts_with("Welcome to the counter."));
    assert!(output.contains("Added rice x3 (now 3)"));
    assert!(output.contains("Added soup x1 (now 1)"));
    assert!(output.contains("21.00"));
    assert!(output.contains("Receipt #1"));
    assert!(output.contains("Paid 16.80. Thank you!"));
    assert!(output.trim_end().ends_with("Goodbye."));

    let stored = service.get_receipt(1).await?;
    assert_eq!(stored.final_cents, 1680);
    Ok(())
}

#[tokio::test]
async fn test_session_recovers_from_bad_input() -> Result<()> {
    let (mut service, _temp) = test_service().await?;

    let output = run_script(
        &mut service,
        "add rice zero1\nadd noodles 2\nremove soup\ncheckout\ndance\nadd rice 2\nremove rice 5\norder\nq\n",
    )
    .await?;

    assert_eq!(output.matches("Please try again.").count(), 4);
    assert!(output.contains("Unknown command 'dance'"));
    assert!(output.contains("Removed rice from the order"));
    assert!(output.contains("The order is empty."));
    assert!(service.list_receipts(None).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_session_warns_on_rejected_discount() -> Result<()> {
    let (mut service, _temp) = test_service().await?;

    let output = run_script(&mut service, "add soup 2\ncheckout 1.5\n").await?;

    assert!(output.contains("Warning: "));
    assert!(output.contains("Charging full price."));
    assert!(output.contains("Paid 30.00. Thank you!"));
    Ok(())
}

#[tokio::test]
async fn test_session_ends_at_end_of_input() -> Result<()> {
    let (mut service, _temp) = test_service().await?;

    let output = run_script(&mut service, "add soup\nremove soup 1\n").await?;

    assert!(output.contains("Removed soup from the order"));
    assert!(!output.contains("Goodbye."));
    Ok(())
}

#[tokio::test]
async fn test_quitting_discards_unsettled_order() -> Result<()> {
    let (mut service, _temp) = test_service().await?;

    let output = run_script(&mut service, "customer Table 4\nadd rice\nquit\n").await?;

    assert!(output.contains("Customer: Table 4"));
    assert!(output.contains("Leaving with an unsettled order"));
    assert!(service.list_receipts(None).await?.is_empty());
    Ok(())
}
