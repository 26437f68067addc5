//! Cart demo - entry point
//!
//! Adds one line per `--product` to the current cart, concurrently, and
//! prints count and slow-signal events as JSON lines.

use anyhow::Result;
use clap::Parser;
use commerce_core::{AddCartLine, CoreError};
use commerce_demo::{DemoApp, DemoConfig};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

/// Add lines to the current cart
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via COMMERCE_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Product to add; repeat for several lines
    #[arg(short, long = "product", required = true)]
    products: Vec<Uuid>,

    /// Quantity for each line
    #[arg(short, long, default_value = "1")]
    qty: Decimal,

    /// Unit of measure for each line
    #[arg(short, long)]
    uom: Option<String>,

    /// Notes attached to each line
    #[arg(short, long)]
    notes: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    commerce_telemetry::init_logging()?;

    info!("Starting cart demo v{}", env!("CARGO_PKG_VERSION"));

    let config_path = DemoConfig::resolve_path(args.config);
    info!(config_path = %config_path, "Loading configuration");
    let config = DemoConfig::load(&config_path)?;

    let lines: Vec<AddCartLine> = args
        .products
        .iter()
        .map(|product_id| {
            let mut line = AddCartLine::new(*product_id, args.qty);
            if let Some(uom) = &args.uom {
                line = line.with_unit_of_measure(uom.clone());
            }
            if let Some(notes) = &args.notes {
                line = line.with_notes(notes.clone());
            }
            line.validate()?;
            Ok(line)
        })
        .collect::<Result<_, CoreError>>()?;

    let app = DemoApp::new(&config)?;
    let summary = app.run(lines).await;

    println!(
        "completed={} failed={} canceled={} rejected={}",
        summary.completed, summary.failed, summary.canceled, summary.rejected
    );

    Ok(())
}
