//! Touchline - production-line touch-sensor test engine CLI
//!
//! The `touchline` command drives the test engine without the plant
//! orchestration UI, against the built-in simulated sensor.
//!
//! ## Commands
//!
//! - `check`: Load a limits file and tabulate per-test limit resolution
//! - `run`: Execute a campaign plan and emit the report and summary

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use touchline_campaign::{
    render_report, Campaign, CampaignEvent, CampaignPlan, CampaignSummary, write_summary_json,
};
use touchline_core::{resolve_all, LimitsDigest, LimitsDoc, CAMPAIGN_ORDER};
use touchline_hal::{DeviceGeometry, ScriptedSensor, SensorLink};

#[derive(Parser)]
#[command(name = "touchline")]
#[command(author = "Touchline Engineering")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Capacitive-touch production test engine", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a limits file and report per-test limit resolution
    Check {
        /// Path to the plant limits file (.ini)
        #[arg(short, long)]
        limits: PathBuf,

        /// Device row count
        #[arg(long)]
        rows: usize,

        /// Device column count
        #[arg(long)]
        cols: usize,
    },

    /// Execute a campaign plan against the simulated sensor
    Run {
        /// Path to the campaign plan (TOML)
        #[arg(short, long)]
        plan: PathBuf,

        /// Device row count
        #[arg(long)]
        rows: usize,

        /// Device column count
        #[arg(long)]
        cols: usize,

        /// Write the text report here instead of stdout
        #[arg(long)]
        report: Option<PathBuf>,

        /// Write the machine-readable summary here (JSON)
        #[arg(long)]
        summary: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    touchline_core::init_tracing(cli.json, cli.verbose);

    match cli.command {
        Commands::Check { limits, rows, cols } => cmd_check(&limits, rows, cols).await,
        Commands::Run {
            plan,
            rows,
            cols,
            report,
            summary,
        } => cmd_run(&plan, rows, cols, report.as_deref(), summary.as_deref()).await,
    }
}

async fn cmd_check(limits: &std::path::Path, rows: usize, cols: usize) -> Result<()> {
    let sensor = ScriptedSensor::permissive(DeviceGeometry::new(rows, cols));
    let geometry = sensor.geometry().await.context("sensor geometry")?;

    let doc = LimitsDoc::load(limits, geometry)
        .with_context(|| format!("loading limits file {}", limits.display()))?;
    info!(keys = doc.len(), "limits file parsed");

    let items = resolve_all(&doc, geometry, &sensor, &CAMPAIGN_ORDER).await;

    println!("{:<24} {:<10} faults", "test", "limits");
    for item in &items {
        let status = if item.has_valid_limit { "ok" } else { "INVALID" };
        let faults = item.faults.join("; ");
        println!("{:<24} {:<10} {}", item.kind.name(), status, faults);
    }
    Ok(())
}

async fn cmd_run(
    plan_path: &std::path::Path,
    rows: usize,
    cols: usize,
    report_path: Option<&std::path::Path>,
    summary_path: Option<&std::path::Path>,
) -> Result<()> {
    let plan = CampaignPlan::load(plan_path)
        .with_context(|| format!("loading campaign plan {}", plan_path.display()))?;
    plan.validate().context("invalid campaign plan")?;

    let sensor: Arc<dyn SensorLink> =
        Arc::new(ScriptedSensor::permissive(DeviceGeometry::new(rows, cols)));
    let geometry = sensor.geometry().await.context("sensor geometry")?;

    let raw = std::fs::read(&plan.limits_file)
        .with_context(|| format!("reading limits file {}", plan.limits_file.display()))?;
    let digest = LimitsDigest::from_bytes(&raw);
    let doc = LimitsDoc::load(&plan.limits_file, geometry)
        .with_context(|| format!("loading limits file {}", plan.limits_file.display()))?;
    info!(limits = %digest.short(), "limits file loaded");

    let items = resolve_all(&doc, geometry, sensor.as_ref(), &plan.enabled()).await;

    let (events_tx, mut events_rx) = tokio::sync::mpsc::unbounded_channel();
    let campaign = Campaign::new(geometry, items).with_events(events_tx);
    let worker = tokio::spawn(campaign.run(Arc::clone(&sensor)));

    // The campaign worker owns execution; this side only renders progress.
    while let Some(event) = events_rx.recv().await {
        match event {
            CampaignEvent::Started { campaign_id, items } => {
                info!(campaign_id, items, "campaign started");
            }
            CampaignEvent::ItemStarted { kind } => info!(test = %kind, "running"),
            CampaignEvent::ItemFinished { kind, passed } => {
                info!(test = %kind, passed, "finished");
            }
            CampaignEvent::Finished { passed } => info!(passed, "campaign finished"),
        }
    }

    let result = worker.await.context("campaign worker")?;
    let summary = CampaignSummary::new(&plan.name, &digest, geometry, &result);
    let report = render_report(&summary, &result.records);

    match report_path {
        Some(path) => {
            std::fs::write(path, &report)
                .with_context(|| format!("writing report {}", path.display()))?;
            info!(path = %path.display(), "report written");
        }
        None => println!("{report}"),
    }
    if let Some(path) = summary_path {
        write_summary_json(path, &summary)
            .with_context(|| format!("writing summary {}", path.display()))?;
        info!(path = %path.display(), "summary written");
    }

    if !result.passed {
        std::process::exit(1);
    }
    Ok(())
}
