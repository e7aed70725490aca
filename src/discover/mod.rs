//! Run and trial discovery.
//!
//! This module enumerates the input directory tree: immediate
//! subdirectories of the root are runs, and each run is expected to hold
//! one subdirectory per configured scenario containing the trial CSVs.
//! Discovery is complete before any aggregation starts, so a missing
//! scenario aborts the batch before a single output file is written.

use crate::error::{AggregateError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Trial files for one (run, scenario) pair. Always non-empty.
#[derive(Debug, Clone)]
pub struct ScenarioTrials {
    /// Scenario name (subdirectory name under the run).
    pub scenario: String,
    /// Trial CSV paths, sorted by file name.
    pub trials: Vec<PathBuf>,
}

/// One run directory with its trial files per scenario.
#[derive(Debug, Clone)]
pub struct RunLayout {
    /// Run name (subdirectory name under the root).
    pub name: String,
    /// Absolute or root-relative path of the run directory.
    pub path: PathBuf,
    /// Scenarios in configured order.
    pub scenarios: Vec<ScenarioTrials>,
}

impl RunLayout {
    /// Total number of trial files across all scenarios.
    pub fn trial_count(&self) -> usize {
        self.scenarios.iter().map(|s| s.trials.len()).sum()
    }
}

/// Enumerate all runs under `root` and their per-scenario trial files.
///
/// Runs are sorted by name so enumeration order (and therefore cross-run
/// row order downstream) is deterministic. Hidden directories and names
/// listed in `exclude` (output directories such as `AllRuns`) are skipped.
pub fn discover_runs(
    root: &Path,
    scenarios: &[String],
    exclude: &[String],
) -> Result<Vec<RunLayout>> {
    let mut run_dirs: Vec<(String, PathBuf)> = Vec::new();

    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') || exclude.iter().any(|e| *e == name) {
            debug!("Skipping directory: {}", name);
            continue;
        }
        run_dirs.push((name, path));
    }
    run_dirs.sort_by(|a, b| a.0.cmp(&b.0));

    let mut runs = Vec::with_capacity(run_dirs.len());
    for (name, path) in run_dirs {
        let mut layouts = Vec::with_capacity(scenarios.len());
        for scenario in scenarios {
            let scenario_dir = path.join(scenario);
            let trials = csv_files_in(&scenario_dir)?;
            layouts.push(ScenarioTrials {
                scenario: scenario.clone(),
                trials,
            });
        }
        let total: usize = layouts.iter().map(|s| s.trials.len()).sum();
        debug!("Discovered run '{}' with {} trial files", name, total);
        runs.push(RunLayout {
            name,
            path,
            scenarios: layouts,
        });
    }

    Ok(runs)
}

/// List the `.csv` files in a scenario directory, sorted by file name.
///
/// A missing directory or an empty file set is a `MissingInput` error;
/// partial output is considered worse than an explicit abort.
fn csv_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(AggregateError::MissingInput {
            path: dir.to_path_buf(),
        });
    }

    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("csv")
        })
        .collect();

    if files.is_empty() {
        return Err(AggregateError::MissingInput {
            path: dir.to_path_buf(),
        });
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        fs::write(path, "PathLength\n1\n").unwrap();
    }

    fn scenario_list(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_discover_runs_sorted_with_trials() {
        let dir = tempfile::tempdir().unwrap();
        for run in ["runB", "runA"] {
            let scenario_dir = dir.path().join(run).join("straightLine");
            fs::create_dir_all(&scenario_dir).unwrap();
            touch(&scenario_dir.join("out1.csv"));
            touch(&scenario_dir.join("out0.csv"));
        }

        let runs =
            discover_runs(dir.path(), &scenario_list(&["straightLine"]), &[]).unwrap();

        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].name, "runA");
        assert_eq!(runs[1].name, "runB");

        let trials = &runs[0].scenarios[0].trials;
        assert_eq!(trials.len(), 2);
        assert!(trials[0].ends_with("out0.csv"));
        assert!(trials[1].ends_with("out1.csv"));
    }

    #[test]
    fn test_missing_scenario_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("run1")).unwrap();

        let err =
            discover_runs(dir.path(), &scenario_list(&["straightLine"]), &[]).unwrap_err();
        assert!(matches!(err, AggregateError::MissingInput { .. }));
    }

    #[test]
    fn test_empty_scenario_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let scenario_dir = dir.path().join("run1").join("straightLine");
        fs::create_dir_all(&scenario_dir).unwrap();
        fs::write(scenario_dir.join("notes.txt"), "not a trial").unwrap();

        let err =
            discover_runs(dir.path(), &scenario_list(&["straightLine"]), &[]).unwrap_err();
        match err {
            AggregateError::MissingInput { path } => {
                assert!(path.ends_with("straightLine"));
            }
            other => panic!("expected MissingInput, got {:?}", other),
        }
    }

    #[test]
    fn test_excluded_directories_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let scenario_dir = dir.path().join("run1").join("straightLine");
        fs::create_dir_all(&scenario_dir).unwrap();
        touch(&scenario_dir.join("out0.csv"));
        // Output directory from a previous invocation must not be taken for a run.
        fs::create_dir_all(dir.path().join("AllRuns")).unwrap();
        fs::create_dir_all(dir.path().join(".cache")).unwrap();

        let runs = discover_runs(
            dir.path(),
            &scenario_list(&["straightLine"]),
            &["AllRuns".to_string()],
        )
        .unwrap();

        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].name, "run1");
        assert_eq!(runs[0].trial_count(), 1);
    }

    #[test]
    fn test_missing_root_is_io_error() {
        let err = discover_runs(
            Path::new("does/not/exist"),
            &scenario_list(&["straightLine"]),
            &[],
        )
        .unwrap_err();
        assert!(matches!(err, AggregateError::Io(_)));
    }
}
