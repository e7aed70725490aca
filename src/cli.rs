//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// runmean - multi-level CSV averaging for benchmark runs
///
/// Aggregate per-trial metric CSVs from a navigation benchmark into
/// scenario averages, run averages and cross-run comparison tables,
/// plus a Markdown/JSON summary report.
///
/// Examples:
///   runmean
///   runmean --root Runs --output report.md
///   runmean --scenarios straightLine,cornerSingle --format json
///   runmean --dry-run
///   runmean --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Root directory containing one subdirectory per run
    ///
    /// Defaults to "Runs" (or the value from .runmean.toml).
    #[arg(short, long, value_name = "DIR", env = "RUNMEAN_ROOT")]
    pub root: Option<PathBuf>,

    /// Output file path for the summary report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .runmean.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Scenario names to aggregate (comma-separated)
    ///
    /// Example: --scenarios straightLine,smallObstacle
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub scenarios: Option<Vec<String>>,

    /// Metric columns for the run-average step (comma-separated)
    ///
    /// Example: --metrics PathLength,PathDuration
    #[arg(long, value_name = "COLUMNS", value_delimiter = ',')]
    pub metrics: Option<Vec<String>>,

    /// Report format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output, no progress bar)
    #[arg(short, long)]
    pub quiet: bool,

    /// Dry run: discover runs and trial files without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .runmean.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the summary report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if let Some(ref scenarios) = self.scenarios {
            if scenarios.iter().all(|s| s.trim().is_empty()) {
                return Err("Scenario list must not be empty".to_string());
            }
        }

        if let Some(ref metrics) = self.metrics {
            if metrics.iter().all(|m| m.trim().is_empty()) {
                return Err("Metric list must not be empty".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        // Validate root directory if provided
        if let Some(ref root) = self.root {
            if !root.exists() {
                return Err(format!("Root directory does not exist: {}", root.display()));
            }
            if !root.is_dir() {
                return Err(format!("Root path is not a directory: {}", root.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            root: None,
            output: None,
            config: None,
            scenarios: None,
            metrics: None,
            format: OutputFormat::Markdown,
            verbose: false,
            quiet: false,
            dry_run: false,
            init_config: false,
        }
    }

    #[test]
    fn test_validation_defaults_ok() {
        let args = make_args();
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_empty_scenario_list() {
        let mut args = make_args();
        args.scenarios = Some(vec!["".to_string()]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_missing_root() {
        let mut args = make_args();
        args.root = Some(PathBuf::from("does/not/exist"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_init_config_skips_validation() {
        let mut args = make_args();
        args.root = Some(PathBuf::from("does/not/exist"));
        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
