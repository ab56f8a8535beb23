use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::domain::{parse_price, Catalog, MenuItem};

#[derive(Debug, Deserialize)]
struct MenuRow {
    name: String,
    price: String,
}

#[derive(Debug, Deserialize)]
struct JsonMenuEntry {
    name: String,
    price: Value,
}

/// Load a menu file, choosing the format from the extension (`.json` or `.csv`).
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let file =
        File::open(path).with_context(|| format!("Failed to open menu file: {}", path.display()))?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let catalog = match extension.as_deref() {
        Some("json") => parse_catalog_json(file),
        Some("csv") => parse_catalog_csv(file),
        _ => bail!(
            "Unsupported menu file '{}'. Expected a .json or .csv file",
            path.display()
        ),
    }
    .with_context(|| format!("Failed to load menu from {}", path.display()))?;

    tracing::info!(path = %path.display(), items = catalog.len(), "menu loaded");
    Ok(catalog)
}

/// Parse a CSV menu with a `name,price` header.
pub fn parse_catalog_csv<R: Read>(reader: R) -> Result<Catalog> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut items = Vec::new();

    for (row_num, result) in csv_reader.deserialize::<MenuRow>().enumerate() {
        let line = row_num + 2; // +2 for header and 0-indexing
        let row = result.with_context(|| format!("Line {}: malformed menu row", line))?;
        let price_cents = parse_price(&row.price)
            .map_err(|e| anyhow::anyhow!("Line {}: invalid price '{}': {}", line, row.price, e))?;
        items.push(MenuItem::new(row.name, price_cents));
    }

    Ok(Catalog::new(items)?)
}

/// Parse a JSON menu.
///
/// Accepts either an array of `{"name": ..., "price": ...}` entries, which keeps
/// menu order, or an object of `"name": price` pairs, which is ordered by name.
/// Prices may be numbers or decimal strings.
pub fn parse_catalog_json<R: Read>(reader: R) -> Result<Catalog> {
    let document: Value = serde_json::from_reader(reader).context("Invalid JSON")?;

    let entries: Vec<(String, Value)> = match document {
        Value::Array(values) => values
            .into_iter()
            .enumerate()
            .map(|(i, value)| {
                serde_json::from_value::<JsonMenuEntry>(value)
                    .map(|entry| (entry.name, entry.price))
                    .with_context(|| format!("Entry {}: expected {{\"name\", \"price\"}}", i + 1))
            })
            .collect::<Result<_>>()?,
        Value::Object(map) => map.into_iter().collect(),
        _ => bail!("Menu must be a JSON array or object"),
    };

    let mut items = Vec::with_capacity(entries.len());
    for (name, price) in entries {
        let text = match &price {
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.clone(),
            other => bail!("Item '{}': price must be a number, got {}", name, other),
        };
        let price_cents = parse_price(&text)
            .map_err(|e| anyhow::anyhow!("Item '{}': invalid price '{}': {}", name, text, e))?;
        items.push(MenuItem::new(name, price_cents));
    }

    Ok(Catalog::new(items)?)
}
