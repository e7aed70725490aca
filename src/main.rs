//! runmean - multi-level CSV averaging for benchmark runs
//!
//! A CLI tool that aggregates per-trial metric CSVs from a navigation
//! benchmark into scenario averages, run averages and cross-run
//! comparison tables, then writes a summary report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (missing inputs, schema mismatch, IO failure)

mod aggregate;
mod cli;
mod config;
mod discover;
mod error;
mod report;
mod table;

use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use config::Config;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        match handle_init_config() {
            Ok(()) => std::process::exit(0),
            Err(e) => {
                eprintln!("\n❌ Error: {}", e);
                std::process::exit(1);
            }
        }
    }

    // Initialize logging
    init_logging(&args);

    info!("runmean v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    // Run the aggregation
    match run_aggregation(args) {
        Ok(()) => {}
        Err(e) => {
            error!("Aggregation failed: {}", e);
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .runmean.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(".runmean.toml");

    if path.exists() {
        anyhow::bail!(".runmean.toml already exists. Remove it first or edit it manually.");
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .runmean.toml")?;

    println!("✅ Created .runmean.toml with default settings.");
    println!("   Edit it to customize the root, scenarios, metrics, and report.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the complete aggregation workflow.
fn run_aggregation(args: Args) -> Result<()> {
    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let root = PathBuf::from(&config.general.root);
    let pipeline_config = aggregate::PipelineConfig::from(&config.pipeline);

    // Handle --dry-run: discover runs and exit
    if args.dry_run {
        return handle_dry_run(&root, &pipeline_config);
    }

    println!("📊 Aggregating runs under: {}", root.display());
    println!("   Scenarios: {}", pipeline_config.scenarios.join(", "));
    println!("   Metrics:   {}", pipeline_config.metrics.join(", "));
    println!();

    let summary = aggregate::run_pipeline(&root, &pipeline_config, !args.quiet)
        .with_context(|| format!("Aggregation of {} failed", root.display()))?;

    // Generate and save the report
    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&summary)?,
        OutputFormat::Markdown => report::generate_markdown_report(&summary, &config.report),
    };

    let output_path = PathBuf::from(&config.general.output);
    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    // Print summary
    println!("\n📊 Aggregation Summary:");
    println!("   Runs:           {}", summary.runs.len());
    println!("   Scenarios:      {}", summary.scenarios.len());
    println!("   Tables written: {}", summary.tables_written);
    println!("   Duration:       {:.1}s", summary.duration_seconds);
    println!(
        "\n✅ Aggregation complete! Report saved to: {}",
        output_path.display()
    );

    Ok(())
}

/// Handle --dry-run: discover runs, print what would be aggregated, exit.
fn handle_dry_run(root: &Path, config: &aggregate::PipelineConfig) -> Result<()> {
    println!("\n🔍 Dry run: discovering runs (no writes)...\n");

    let exclude = [config.cross_run_dir.clone()];
    let runs = discover::discover_runs(root, &config.scenarios, &exclude)?;

    if runs.is_empty() {
        println!("   No run directories found under {}.", root.display());
    } else {
        for run in &runs {
            println!("   📁 {} ({} trial files)", run.name, run.trial_count());
            for scenario in &run.scenarios {
                println!(
                    "      {} - {} trials",
                    scenario.scenario,
                    scenario.trials.len()
                );
            }
        }
        println!("\n   Total: {} runs", runs.len());
    }

    println!("\n✅ Dry run complete. No files were written.");
    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from .runmean.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
