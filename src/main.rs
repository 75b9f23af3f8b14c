//! Command-line interface for wafer-metrology
//!
//! # Usage Examples
//!
//! ```bash
//! # Create (or recreate) the metrology table
//! wafer-metrology init --backend sqlite --sqlite-path fab.db --replace
//!
//! # Simulate 5 wafers x 10 steps for a lot, load them and print the analysis
//! wafer-metrology simulate --backend sqlite --sqlite-path fab.db \
//!   --lot-id LOT_A_2025 --wafers 5 --steps 10 --seed 42
//!
//! # Analyze a lot already in PostgreSQL
//! METROLOGY_POSTGRESQL_CONNECTION_STRING="host=localhost user=postgres password=postgres dbname=fab" \
//!   wafer-metrology analyze --backend postgresql --schema metrology --lot-id LOT_A_2025
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use metrology_analyze::{LotAggregator, LotReport};
use wafer_metrology::connect::connect_warehouse;
use wafer_metrology::render::{render_load_summary, render_report};
use wafer_metrology::{prepare_table, run_lot, AnalyzeArgs, InitArgs, LotPlan, SimulateArgs};

#[derive(Parser)]
#[command(name = "wafer-metrology")]
#[command(about = "Simulate wafer metrology, bulk-load it into a warehouse and report per-step lot statistics")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the wafer_metrology table
    Init(InitArgs),

    /// Generate, load and analyze one lot
    Simulate(SimulateArgs),

    /// Analyze a lot that is already loaded
    Analyze(AnalyzeArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init(args) => run_init(args).await,
        Commands::Simulate(args) => run_simulate(args).await,
        Commands::Analyze(args) => run_analyze(args).await,
    }
}

async fn run_init(args: InitArgs) -> anyhow::Result<()> {
    let warehouse = connect_warehouse(&args.warehouse).await?;
    prepare_table(warehouse.as_ref(), args.replace)
        .await
        .context("Failed to create table")?;
    println!("Table 'wafer_metrology' ready");
    Ok(())
}

async fn run_simulate(args: SimulateArgs) -> anyhow::Result<()> {
    let warehouse = connect_warehouse(&args.warehouse).await?;
    prepare_table(warehouse.as_ref(), args.replace)
        .await
        .context("Failed to create table")?;

    let plan = LotPlan {
        lot_id: args.lot_id,
        wafer_count: args.wafers,
        step_count: args.steps,
        seed: args.seed,
        concurrency: args.concurrency,
        max_attempts: args.max_attempts,
    };

    let mut outcome = run_lot(warehouse.as_ref(), &plan)
        .await
        .with_context(|| format!("Failed to process lot '{}'", plan.lot_id))?;
    println!("{}", render_load_summary(&outcome));

    for failure in &outcome.failed {
        tracing::error!(
            "Wafer '{}' not ingested after {} attempts: {}",
            failure.wafer_id,
            failure.attempts,
            failure.error
        );
    }

    match outcome.analysis.take() {
        Some(rows) => {
            let report = LotReport::new(plan.lot_id, rows);
            println!("{}", render_report(&report, args.format)?);
            Ok(())
        }
        None => Err(anyhow::anyhow!(
            "Lot '{}' is incomplete; analysis skipped. Failed wafers: {}",
            plan.lot_id,
            outcome.failed_wafer_ids().join(", ")
        )),
    }
}

async fn run_analyze(args: AnalyzeArgs) -> anyhow::Result<()> {
    let warehouse = connect_warehouse(&args.warehouse).await?;
    let rows = LotAggregator::new(warehouse.as_ref())
        .analyze(&args.lot_id)
        .await
        .with_context(|| format!("Failed to analyze lot '{}'", args.lot_id))?;

    let report = LotReport::new(args.lot_id, rows);
    println!("{}", render_report(&report, args.format)?);
    Ok(())
}
