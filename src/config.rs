//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.runmean.toml` files. The scenario and metric lists live here rather
//! than as module constants so the pipeline stays parameterizable.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Pipeline settings.
    #[serde(default)]
    pub pipeline: PipelineSection,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Root directory containing run subdirectories.
    #[serde(default = "default_root")]
    pub root: String,

    /// Default report output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_root() -> String {
    "Runs".to_string()
}

fn default_output() -> String {
    "runmean_report.md".to_string()
}

/// Aggregation pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSection {
    /// Scenario directory names, in execution order.
    #[serde(default = "default_scenarios")]
    pub scenarios: Vec<String>,

    /// Metric columns reduced in the run-average step.
    #[serde(default = "default_metrics")]
    pub metrics: Vec<String>,

    /// Per-run output directory for scenario averages.
    #[serde(default = "default_averages_dir")]
    pub averages_dir: String,

    /// Per-run output directory for run averages.
    #[serde(default = "default_run_average_dir")]
    pub run_average_dir: String,

    /// Root-level output directory for cross-run views.
    #[serde(default = "default_cross_run_dir")]
    pub cross_run_dir: String,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            scenarios: default_scenarios(),
            metrics: default_metrics(),
            averages_dir: default_averages_dir(),
            run_average_dir: default_run_average_dir(),
            cross_run_dir: default_cross_run_dir(),
        }
    }
}

fn default_scenarios() -> Vec<String> {
    vec![
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
    .collect()
}

fn default_metrics() -> Vec<String> {
    vec![
        "PathLength",
        "PathDuration",
        "CollisionCount",
        "FramesInCollision",
        "PathJerk",
        "GaTimes",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_averages_dir() -> String {
    "Averages".to_string()
}

fn default_run_average_dir() -> String {
    "RunAverage".to_string()
}

fn default_cross_run_dir() -> String {
    "AllRuns".to_string()
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Include per-scenario cross-run tables in the Markdown report.
    #[serde(default = "default_true")]
    pub include_tables: bool,

    /// Maximum rows rendered per table in the Markdown report.
    #[serde(default = "default_max_table_rows")]
    pub max_table_rows: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            include_tables: true,
            max_table_rows: default_max_table_rows(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_table_rows() -> usize {
    50
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(".runmean.toml");

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref root) = args.root {
            self.general.root = root.to_string_lossy().to_string();
        }
        if let Some(ref output) = args.output {
            self.general.output = output.to_string_lossy().to_string();
        }

        if let Some(ref scenarios) = args.scenarios {
            self.pipeline.scenarios = scenarios.clone();
        }
        if let Some(ref metrics) = args.metrics {
            self.pipeline.metrics = metrics.clone();
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.root, "Runs");
        assert_eq!(config.pipeline.scenarios.len(), 8);
        assert_eq!(config.pipeline.scenarios[0], "straightLine");
        assert!(config.pipeline.metrics.contains(&"PathLength".to_string()));
        assert_eq!(config.pipeline.cross_run_dir, "AllRuns");
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
root = "Experiments"
output = "custom_report.md"
verbose = true

[pipeline]
scenarios = ["straightLine", "cornerSingle"]
metrics = ["PathLength"]

[report]
max_table_rows = 10
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.root, "Experiments");
        assert_eq!(config.general.output, "custom_report.md");
        assert!(config.general.verbose);
        assert_eq!(
            config.pipeline.scenarios,
            vec!["straightLine", "cornerSingle"]
        );
        assert_eq!(config.pipeline.metrics, vec!["PathLength"]);
        // Unspecified keys keep their defaults.
        assert_eq!(config.pipeline.averages_dir, "Averages");
        assert_eq!(config.report.max_table_rows, 10);
        assert!(config.report.include_tables);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[pipeline]"));
        assert!(toml_str.contains("[report]"));
        assert!(toml_str.contains("straightLine"));
    }
}
