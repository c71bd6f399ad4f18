/// Invoice example: the full session flow a form front end would drive.
///
/// Reads an invoice description (header fields, raw item rows and an
/// optional renderer config) from JSON, feeds the rows through the same
/// validation a form would, and exports the PDF.
///
/// Run with:
///   cargo run --example generate_invoice -p invoice-demos
///   cargo run --example generate_invoice -p invoice-demos -- input.json out.pdf
///
/// Defaults to demos/data/sample_invoice.json and writes
/// demos/output/invoice.pdf. Set RUST_LOG=debug to see ledger events.
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use invoice_core::{InvoiceConfig, InvoiceSession};
use serde::Deserialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// One row as typed into the form: price and quantity are raw text.
#[derive(Debug, Deserialize)]
struct ItemInput {
    name: String,
    unit_price: String,
    quantity: String,
}

#[derive(Debug, Deserialize)]
struct InvoiceInput {
    company_name: String,
    #[serde(default)]
    customer_name: String,
    issue_date: NaiveDate,
    #[serde(default)]
    invoice_number: Option<String>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    logo: Option<PathBuf>,
    items: Vec<ItemInput>,
    #[serde(default)]
    config: InvoiceConfig,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();

    let mut args = env::args().skip(1);
    let input = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("demos/data/sample_invoice.json"));
    let output = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("demos/output/invoice.pdf"));

    let text = fs::read_to_string(&input)
        .with_context(|| format!("reading {}", input.display()))?;
    let invoice: InvoiceInput = serde_json::from_str(&text)
        .with_context(|| format!("parsing {}", input.display()))?;

    let mut session = InvoiceSession::new(invoice.issue_date, &invoice.config)?;
    {
        let header = session.header_mut();
        header.company_name = invoice.company_name;
        header.customer_name = invoice.customer_name;
        header.invoice_number = invoice.invoice_number;
        header.notes = invoice.notes;
    }
    if let Some(logo) = &invoice.logo {
        let logo = resolve(&input, logo);
        match session.attach_logo(&logo) {
            Ok(preview) => info!(
                width = preview.width,
                height = preview.height,
                "logo preview"
            ),
            Err(err) => warn!(error = %err, "logo skipped"),
        }
    }

    for row in &invoice.items {
        // A rejected row is reported and skipped, as a form would.
        if let Err(err) = session
            .ledger_mut()
            .add_item_from_input(&row.name, &row.unit_price, &row.quantity)
        {
            warn!(item = %row.name, error = %err, "item rejected");
        }
    }

    let totals = session.ledger().totals();
    info!(
        items = session.ledger().len(),
        subtotal = %totals.subtotal,
        tax = %totals.tax_amount,
        total = %totals.grand_total,
        "ledger ready"
    );

    if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let receipt = session.export(&output)?;
    println!(
        "Written: {} ({} bytes)",
        receipt.path.display(),
        receipt.bytes_written
    );
    Ok(())
}

/// Logo paths in the JSON are relative to the JSON file.
fn resolve(input: &Path, logo: &Path) -> PathBuf {
    if logo.is_absolute() {
        return logo.to_path_buf();
    }
    input
        .parent()
        .map_or_else(|| logo.to_path_buf(), |dir| dir.join(logo))
}
