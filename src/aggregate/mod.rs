//! Three-level averaging pipeline.
//!
//! Level 1 (trial -> scenario): element-wise mean of all trial tables for
//! one (run, scenario) pair, written to `<run>/Averages/<scenario>.csv`.
//! Level 2 (scenario -> run): column means of the persisted scenario
//! average over the configured metric columns, written to
//! `<run>/RunAverage/<scenario>.csv` as a single row.
//! Level 3 (run -> experiment): per scenario, the single-row run averages
//! of all runs concatenated in run order, written to
//! `<root>/AllRuns/<scenario>.csv` for the chart renderer.
//!
//! Everything is strictly sequential and write-once; the first error
//! aborts the whole batch.

use crate::discover::{self, RunLayout};
use crate::error::{AggregateError, Result};
use crate::table::Table;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Pipeline configuration: scenario/metric lists and output directory names.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Scenario directory names, in the order runs execute them.
    pub scenarios: Vec<String>,
    /// Metric columns reduced in the run-average step.
    pub metrics: Vec<String>,
    /// Per-run output directory for scenario averages.
    pub averages_dir: String,
    /// Per-run output directory for single-row run averages.
    pub run_average_dir: String,
    /// Root-level output directory for cross-run views.
    pub cross_run_dir: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            scenarios: vec![
                "straightLine",
                "smallObstacle",
                "oppositeMultipleAgents",
                "oppositeCircleAgents",
                "oppositeAgents",
                "narrowCoridorsOppositeNoNavmeshScenario",
                "narrowCoridorOpposite",
                "cornerSingle",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            metrics: vec![
                "PathLength",
                "PathDuration",
                "CollisionCount",
                "FramesInCollision",
                "PathJerk",
                "GaTimes",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            averages_dir: "Averages".to_string(),
            run_average_dir: "RunAverage".to_string(),
            cross_run_dir: "AllRuns".to_string(),
        }
    }
}

impl From<&crate::config::PipelineSection> for PipelineConfig {
    fn from(section: &crate::config::PipelineSection) -> Self {
        Self {
            scenarios: section.scenarios.clone(),
            metrics: section.metrics.clone(),
            averages_dir: section.averages_dir.clone(),
            run_average_dir: section.run_average_dir.clone(),
            cross_run_dir: section.cross_run_dir.clone(),
        }
    }
}

/// Cross-run comparison table for one scenario: one row per run.
#[derive(Debug, Clone, Serialize)]
pub struct CrossRunView {
    /// Scenario name.
    pub scenario: String,
    /// Concatenated run averages, row order = run enumeration order.
    pub table: Table,
}

/// Result of a completed pipeline invocation, consumed by the report.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineSummary {
    /// Root directory that was aggregated.
    pub root: PathBuf,
    /// Run names in enumeration order.
    pub runs: Vec<String>,
    /// Scenario names in configured order.
    pub scenarios: Vec<String>,
    /// Total number of CSV tables written.
    pub tables_written: usize,
    /// Wall-clock duration of the aggregation in seconds.
    pub duration_seconds: f64,
    /// Cross-run views, one per scenario.
    pub cross_run: Vec<CrossRunView>,
}

/// Create a directory and its parents if absent. Idempotent.
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)?;
    Ok(())
}

/// Compute the scenario average table for one (run, scenario) pair.
///
/// Loads every trial file, requires identical schema and row counts, takes
/// the element-wise mean and appends the `iteration` (0-based row index)
/// and `run_id` (run name) columns.
pub fn scenario_average(trials: &[PathBuf], run_name: &str) -> Result<Table> {
    let mut tables: Vec<Table> = Vec::with_capacity(trials.len());
    for path in trials {
        let table = Table::read_csv(path)?;
        if let Some(first) = tables.first() {
            check_aligned(first, &table, path)?;
        }
        tables.push(table);
    }

    let mut mean = Table::mean_of(&tables)?;
    let iteration: Vec<f64> = (0..mean.n_rows()).map(|i| i as f64).collect();
    mean.push_numeric("iteration", iteration)?;
    mean.push_text("run_id", vec![run_name.to_string(); mean.n_rows()])?;
    Ok(mean)
}

/// Reduce a scenario average table to a single-row run average.
///
/// Only the configured metric columns are reduced; `iteration` and
/// `run_id` are dropped and a fresh `run_id` column is appended.
pub fn run_average(scenario_avg: &Table, metrics: &[String], run_name: &str) -> Result<Table> {
    let mut row = scenario_avg.column_means(metrics)?;
    row.push_text("run_id", vec![run_name.to_string()])?;
    Ok(row)
}

/// Check a trial table against the first one loaded for the scenario.
fn check_aligned(reference: &Table, table: &Table, path: &Path) -> Result<()> {
    if table.column_names() != reference.column_names() {
        return Err(AggregateError::SchemaMismatch(format!(
            "{}: columns {:?} differ from the first trial's {:?}",
            path.display(),
            table.column_names(),
            reference.column_names()
        )));
    }
    if table.n_rows() != reference.n_rows() {
        return Err(AggregateError::SchemaMismatch(format!(
            "{}: {} rows, but the first trial has {}",
            path.display(),
            table.n_rows(),
            reference.n_rows()
        )));
    }
    Ok(())
}

/// Run the full three-level pipeline for every run under `root`.
///
/// Discovery is completed (and validated) before the first write, so a
/// missing (run, scenario) input aborts with no output produced at all.
pub fn run_pipeline(
    root: &Path,
    config: &PipelineConfig,
    show_progress: bool,
) -> Result<PipelineSummary> {
    let start = Instant::now();

    let exclude = [config.cross_run_dir.clone()];
    let runs = discover::discover_runs(root, &config.scenarios, &exclude)?;
    if runs.is_empty() {
        return Err(AggregateError::MissingInput {
            path: root.to_path_buf(),
        });
    }

    info!(
        "Aggregating {} runs x {} scenarios under {}",
        runs.len(),
        config.scenarios.len(),
        root.display()
    );

    let progress = make_progress_bar(show_progress, (runs.len() * config.scenarios.len()) as u64);

    let mut run_averages: Vec<Vec<Table>> = vec![Vec::new(); config.scenarios.len()];
    let mut tables_written = 0;

    for run in &runs {
        tables_written += aggregate_run(run, config, &mut run_averages, &progress)?;
    }

    // Level 3: cross-run views, one per scenario, row order = run order.
    let cross_dir = root.join(&config.cross_run_dir);
    ensure_dir(&cross_dir)?;

    let mut cross_run = Vec::with_capacity(config.scenarios.len());
    for (scenario, tables) in config.scenarios.iter().zip(&run_averages) {
        let view = Table::concat(tables)?;
        let path = cross_dir.join(format!("{}.csv", scenario));
        view.write_csv(&path)?;
        tables_written += 1;
        debug!("Wrote cross-run view: {}", path.display());
        cross_run.push(CrossRunView {
            scenario: scenario.clone(),
            table: view,
        });
    }

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    Ok(PipelineSummary {
        root: root.to_path_buf(),
        runs: runs.into_iter().map(|r| r.name).collect(),
        scenarios: config.scenarios.clone(),
        tables_written,
        duration_seconds: start.elapsed().as_secs_f64(),
        cross_run,
    })
}

/// Levels 1 and 2 for a single run. Returns the number of tables written.
fn aggregate_run(
    run: &RunLayout,
    config: &PipelineConfig,
    run_averages: &mut [Vec<Table>],
    progress: &Option<ProgressBar>,
) -> Result<usize> {
    let averages_dir = run.path.join(&config.averages_dir);
    let run_average_dir = run.path.join(&config.run_average_dir);
    ensure_dir(&averages_dir)?;
    ensure_dir(&run_average_dir)?;

    let mut written = 0;
    for (si, scenario) in run.scenarios.iter().enumerate() {
        let average = scenario_average(&scenario.trials, &run.name)?;
        let average_path = averages_dir.join(format!("{}.csv", scenario.scenario));
        average.write_csv(&average_path)?;
        written += 1;
        debug!(
            "Wrote scenario average ({} trials): {}",
            scenario.trials.len(),
            average_path.display()
        );

        // The run average is computed from the persisted table, not the
        // in-memory one, so it reflects exactly what the renderer sees.
        let persisted = Table::read_csv(&average_path)?;
        let reduced = run_average(&persisted, &config.metrics, &run.name)?;
        let reduced_path = run_average_dir.join(format!("{}.csv", scenario.scenario));
        reduced.write_csv(&reduced_path)?;
        written += 1;
        debug!("Wrote run average: {}", reduced_path.display());

        run_averages[si].push(reduced);
        if let Some(pb) = progress {
            pb.inc(1);
        }
    }

    info!("Run '{}' aggregated ({} tables)", run.name, written);
    Ok(written)
}

fn make_progress_bar(show_progress: bool, total: u64) -> Option<ProgressBar> {
    if !show_progress {
        return None;
    }
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap()
            .progress_chars("#>-"),
    );
    Some(pb)
}
