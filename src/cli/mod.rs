use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

mod session;

pub use session::*;

use crate::application::{CounterService, OrderSnapshot, SalesReport};
use crate::domain::{format_cents, parse_quantity, Catalog, MenuItem, Receipt};
use crate::io::{load_catalog, Exporter};

/// Tally - restaurant counter order entry and settlement
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Take orders, return dishes and settle bills at a restaurant counter")]
#[command(version)]
pub struct Cli {
    /// Receipt database file path
    #[arg(short, long, default_value = "tally.db")]
    pub database: String,

    /// Menu file (.json or .csv); the built-in menu is used when omitted
    #[arg(short, long)]
    pub menu: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new receipt database
    Init,

    /// Show the numbered menu
    Menu {
        /// Only show dishes whose name contains this text
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Settle an order in one go
    Checkout {
        /// Dish and quantity as NAME=QTY (or menu number, e.g. 4=2); repeatable
        #[arg(short, long = "item", required = true)]
        items: Vec<String>,

        /// Discount factor in (0, 1], e.g. "0.8" or "80%"
        #[arg(long)]
        discount: Option<String>,

        /// Customer name printed on the bill
        #[arg(short, long)]
        customer: Option<String>,
    },

    /// Run an interactive counter session
    Session,

    /// Receipt book commands
    #[command(subcommand)]
    Receipts(ReceiptCommands),

    /// Sales report over settled receipts
    Report {
        /// Start date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        from: Option<String>,

        /// End date, inclusive (YYYY-MM-DD, defaults to now)
        #[arg(long)]
        to: Option<String>,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Export receipts to CSV or JSON
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Format: csv, json
        #[arg(short, long, default_value = "csv")]
        format: String,
    },
}

#[derive(Subcommand)]
pub enum ReceiptCommands {
    /// List settled receipts, newest first
    List {
        /// Maximum number of receipts to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show one receipt in full
    Show {
        /// Receipt number
        number: i64,
    },
}

impl Cli {
    fn load_catalog(&self) -> Result<Catalog> {
        match &self.menu {
            Some(path) => load_catalog(path),
            None => Ok(Catalog::default_menu()),
        }
    }

    pub async fn run(self) -> Result<()> {
        let catalog = Arc::new(self.load_catalog()?);

        match self.command {
            Commands::Init => {
                CounterService::init(&self.database, catalog).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Menu { search } => {
                let mut out = io::stdout().lock();
                write_menu(&mut out, &catalog, search.as_deref())?;
            }

            Commands::Checkout {
                items,
                discount,
                customer,
            } => {
                let mut service = CounterService::init(&self.database, catalog).await?;
                run_checkout_command(&mut service, &items, discount.as_deref(), customer).await?;
            }

            Commands::Session => {
                let mut service = CounterService::init(&self.database, catalog).await?;
                let stdin = io::stdin();
                let mut session = Session::new(&mut service, stdin.lock(), io::stdout());
                session.run().await?;
            }

            Commands::Receipts(cmd) => {
                let service = CounterService::connect(&self.database, catalog).await?;
                run_receipts_command(&service, cmd).await?;
            }

            Commands::Report { from, to, format } => {
                let service = CounterService::connect(&self.database, catalog).await?;
                let (from_date, to_date) = parse_date_range(from, to)?;
                let report = service.sales_report(from_date, to_date).await?;
                match format.as_str() {
                    "json" => println!("{}", serde_json::to_string_pretty(&report)?),
                    "table" => write_report(&mut io::stdout().lock(), &report)?,
                    other => bail!("Invalid format '{}'. Valid formats: table, json", other),
                }
            }

            Commands::Export { output, format } => {
                let service = CounterService::connect(&self.database, catalog).await?;
                run_export_command(&service, output.as_deref(), &format).await?;
            }
        }

        Ok(())
    }
}

async fn run_checkout_command(
    service: &mut CounterService,
    items: &[String],
    discount: Option<&str>,
    customer: Option<String>,
) -> Result<()> {
    service.set_customer(customer);

    for entry in items {
        let (token, quantity) = match entry.rsplit_once('=') {
            Some((token, quantity)) => (token, quantity),
            None => (entry.as_str(), "1"),
        };
        let quantity =
            parse_quantity(quantity).with_context(|| format!("Invalid item '{}'", entry))?;
        service
            .add_by_token(token, quantity)
            .with_context(|| format!("Invalid item '{}'", entry))?;
    }

    let result = service.settle(discount).await?;
    if let Some(warning) = &result.discount_warning {
        eprintln!("Warning: {}. Charging full price.", warning);
    }

    let mut out = io::stdout().lock();
    write_receipt(&mut out, &result.receipt)?;
    Ok(())
}

async fn run_receipts_command(service: &CounterService, cmd: ReceiptCommands) -> Result<()> {
    match cmd {
        ReceiptCommands::List { limit } => {
            let receipts = service.list_receipts(limit).await?;
            if receipts.is_empty() {
                println!("No receipts found.");
                return Ok(());
            }

            println!(
                "{:>6}  {:<16}  {:<20}  {:>5}  {:>10}  {:>8}  {:>10}",
                "NUMBER", "SETTLED", "CUSTOMER", "ITEMS", "TOTAL", "DISCOUNT", "PAID"
            );
            println!("{}", "-".repeat(90));
            for receipt in &receipts {
                println!(
                    "{:>6}  {:<16}  {:<20}  {:>5}  {:>10}  {:>8}  {:>10}",
                    receipt.number,
                    receipt.settled_at.format("%Y-%m-%d %H:%M").to_string(),
                    truncate(receipt.customer.as_deref().unwrap_or("-"), 20),
                    receipt.item_count(),
                    format_cents(receipt.total_cents),
                    receipt.discount.to_string(),
                    format_cents(receipt.final_cents)
                );
            }

            let total = service.receipt_count().await?;
            if (receipts.len() as i64) < total {
                println!("\nShowing {} of {} receipts.", receipts.len(), total);
            }
        }

        ReceiptCommands::Show { number } => {
            let receipt = service.get_receipt(number).await?;
            write_receipt(&mut io::stdout().lock(), &receipt)?;
        }
    }
    Ok(())
}

async fn run_export_command(
    service: &CounterService,
    output: Option<&str>,
    format: &str,
) -> Result<()> {
    use std::fs::File;

    let exporter = Exporter::new(service);

    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(io::stdout()),
    };

    let count = match format {
        "csv" => exporter.export_receipts_csv(writer).await?,
        "json" => exporter.export_receipts_json(writer).await?,
        other => bail!("Invalid export format '{}'. Valid formats: csv, json", other),
    };

    if output.is_some() {
        eprintln!("Exported {} receipts", count);
    }
    Ok(())
}

/// Print the menu with its numbers, optionally filtered by a search text.
pub fn write_menu<W: Write + ?Sized>(
    out: &mut W,
    catalog: &Catalog,
    query: Option<&str>,
) -> io::Result<()> {
    let matches: Vec<(usize, &MenuItem)> = match query {
        Some(query) => catalog
            .search(query)
            .into_iter()
            .filter_map(|item| {
                catalog
                    .items()
                    .iter()
                    .position(|candidate| candidate.name == item.name)
                    .map(|i| (i + 1, item))
            })
            .collect(),
        None => catalog.items().iter().enumerate().map(|(i, item)| (i + 1, item)).collect(),
    };

    if matches.is_empty() {
        return writeln!(out, "No dishes match '{}'.", query.unwrap_or_default());
    }

    writeln!(out, "{:>3}  {:<24}  {:>10}", "#", "DISH", "PRICE")?;
    writeln!(out, "{}", "-".repeat(41))?;
    for (number, item) in matches {
        writeln!(
            out,
            "{:>3}  {:<24}  {:>10}",
            number,
            truncate(&item.name, 24),
            format_cents(item.price_cents)
        )?;
    }
    Ok(())
}

/// Print the order in progress.
pub fn write_order<W: Write + ?Sized>(out: &mut W, order: &OrderSnapshot) -> io::Result<()> {
    if order.lines.is_empty() {
        return writeln!(out, "The order is empty.");
    }

    if let Some(customer) = &order.customer {
        writeln!(out, "Customer: {}", customer)?;
    }
    writeln!(
        out,
        "{:<24}  {:>10}  {:>5}  {:>10}",
        "DISH", "PRICE", "QTY", "SUBTOTAL"
    )?;
    writeln!(out, "{}", "-".repeat(55))?;
    for line in &order.lines {
        writeln!(
            out,
            "{:<24}  {:>10}  {:>5}  {:>10}",
            truncate(&line.name, 24),
            format_cents(line.unit_price_cents),
            line.quantity,
            format_cents(line.subtotal_cents)
        )?;
    }
    writeln!(out, "{}", "-".repeat(55))?;
    writeln!(out, "{:<24}  {:>29}", "TOTAL", format_cents(order.total_cents))
}

/// Print a settled bill.
pub fn write_receipt<W: Write + ?Sized>(out: &mut W, receipt: &Receipt) -> io::Result<()> {
    if receipt.number > 0 {
        writeln!(out, "Receipt #{}", receipt.number)?;
    } else {
        writeln!(out, "Quote")?;
    }
    writeln!(
        out,
        "Settled: {}",
        receipt.settled_at.format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    if let Some(customer) = &receipt.customer {
        writeln!(out, "Customer: {}", customer)?;
    }
    writeln!(out)?;

    for line in &receipt.lines {
        writeln!(
            out,
            "{:<24}  {:>10} x {:<4} {:>10}",
            truncate(&line.name, 24),
            format_cents(line.unit_price_cents),
            line.quantity,
            format_cents(line.subtotal_cents)
        )?;
    }

    writeln!(out, "{}", "-".repeat(55))?;
    writeln!(out, "{:<24}  {:>29}", "Total", format_cents(receipt.total_cents))?;
    if !receipt.discount.is_none() {
        writeln!(
            out,
            "{:<24}  {:>29}",
            format!("Discount (x{})", receipt.discount),
            format!("-{}", format_cents(receipt.discount_cents()))
        )?;
    }
    writeln!(out, "{:<24}  {:>29}", "Amount due", format_cents(receipt.final_cents))
}

fn write_report<W: Write + ?Sized>(out: &mut W, report: &SalesReport) -> io::Result<()> {
    let summary = &report.summary;

    writeln!(out, "Sales Report")?;
    writeln!(
        out,
        "Period: {} to {}",
        report.from_date.format("%Y-%m-%d %H:%M"),
        report.to_date.format("%Y-%m-%d %H:%M")
    )?;
    writeln!(out)?;
    writeln!(out, "Receipts:      {:>12}", summary.receipt_count)?;
    writeln!(out, "Gross:         {:>12}", format_cents(summary.gross_cents))?;
    writeln!(out, "Discounts:     {:>12}", format_cents(summary.discount_cents))?;
    writeln!(out, "Net:           {:>12}", format_cents(summary.net_cents))?;
    writeln!(out, "Average bill:  {:>12}", format_cents(report.average_bill_cents))?;

    if summary.items.is_empty() {
        return Ok(());
    }

    writeln!(out)?;
    writeln!(out, "{:<24}  {:>8}  {:>12}", "DISH", "QTY", "REVENUE")?;
    writeln!(out, "{}", "-".repeat(48))?;
    for item in &summary.items {
        writeln!(
            out,
            "{:<24}  {:>8}  {:>12}",
            truncate(&item.name, 24),
            item.quantity,
            format_cents(item.revenue_cents)
        )?;
    }
    Ok(())
}

fn parse_date_range(
    from: Option<String>,
    to: Option<String>,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let now = Utc::now();

    // Default from_date is the start of today
    let from_date = match from {
        Some(date_str) => start_of_day(parse_date(&date_str)?),
        None => start_of_day(now.date_naive()),
    };

    // An explicit end date covers that whole day
    let to_date = match to {
        Some(date_str) => {
            let next_day = parse_date(&date_str)?
                .succ_opt()
                .ok_or_else(|| anyhow::anyhow!("Invalid date"))?;
            start_of_day(next_day) - chrono::Duration::microseconds(1)
        }
        None => now,
    };

    Ok((from_date, to_date))
}

fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").context("Date must be in YYYY-MM-DD format")
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{parse_discount, ReceiptLine};

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate("soup", 10), "soup");
        assert_eq!(truncate("seafood platter", 10), "seafood...");
        assert_eq!(truncate("鱼子酱鹅肝脆皮鸭卷", 6), "鱼子酱...");
    }

    #[test]
    fn test_parse_date_range_makes_end_inclusive() {
        let (from, to) =
            parse_date_range(Some("2024-03-01".into()), Some("2024-03-01".into())).unwrap();
        assert_eq!(from.to_rfc3339(), "2024-03-01T00:00:00+00:00");
        assert_eq!(to.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-03-01 23:59:59");
        assert!(parse_date_range(Some("03/01/2024".into()), None).is_err());
    }

    #[test]
    fn test_write_menu_with_search_keeps_numbers() {
        let catalog = Catalog::default_menu();
        let mut out = Vec::new();
        write_menu(&mut out, &catalog, Some("SOUP")).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("  6  soup"));
        assert!(!text.contains("rice"));
    }

    #[test]
    fn test_write_menu_without_matches() {
        let catalog = Catalog::default_menu();
        let mut out = Vec::new();
        write_menu(&mut out, &catalog, Some("ramen")).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "No dishes match 'ramen'.\n");
    }

    #[test]
    fn test_write_receipt_shows_discount() {
        let mut receipt = Receipt::new(
            vec![ReceiptLine {
                name: "soup".into(),
                unit_price_cents: 1500,
                quantity: 2,
                subtotal_cents: 3000,
            }],
            parse_discount("0.8").unwrap(),
            Utc::now(),
        );
        receipt.number = 3;

        let mut out = Vec::new();
        write_receipt(&mut out, &receipt).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("Receipt #3\n"));
        assert!(text.contains("Discount (x0.8)"));
        assert!(text.contains("-6.00"));
        assert!(text.trim_end().ends_with("24.00"));
    }
}
