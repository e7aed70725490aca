//! Markdown and JSON report generation.
//!
//! This module generates the aggregation summary report from a completed
//! pipeline run.

use crate::aggregate::{CrossRunView, PipelineSummary};
use crate::config::ReportConfig;
use crate::table::{ColumnData, Table};
use anyhow::Result;
use chrono::Utc;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(summary: &PipelineSummary, config: &ReportConfig) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# Runmean Report\n\n");

    // Metadata section
    output.push_str(&generate_metadata_section(summary));

    // Cross-run comparison tables
    if config.include_tables {
        output.push_str(&generate_cross_run_section(
            &summary.cross_run,
            config.max_table_rows,
        ));
    }

    // Footer
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(summary: &PipelineSummary) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Root:** `{}`\n", summary.root.display()));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Runs:** {} ({})\n",
        summary.runs.len(),
        summary.runs.join(", ")
    ));
    section.push_str(&format!("- **Scenarios:** {}\n", summary.scenarios.len()));
    section.push_str(&format!(
        "- **Tables Written:** {}\n",
        summary.tables_written
    ));
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n",
        summary.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the cross-run comparison section, one table per scenario.
fn generate_cross_run_section(views: &[CrossRunView], max_rows: usize) -> String {
    let mut section = String::new();

    section.push_str("## Cross-Run Averages\n\n");
    section.push_str(
        "One row per run; every metric is the mean over all iterations of that run's scenario average.\n\n",
    );

    for view in views {
        section.push_str(&format!("### {}\n\n", view.scenario));
        section.push_str(&render_table(&view.table, max_rows));
        section.push('\n');
    }

    section
}

/// Render a table as a Markdown table, truncated to `max_rows` rows.
fn render_table(table: &Table, max_rows: usize) -> String {
    let mut out = String::new();

    let names = table.column_names();
    out.push_str(&format!("| {} |\n", names.join(" | ")));
    out.push_str(&format!("|{}\n", "---:|".repeat(names.len())));

    let rows = table.n_rows().min(max_rows);
    for row in 0..rows {
        let cells: Vec<String> = table
            .columns()
            .iter()
            .map(|c| match &c.data {
                ColumnData::Numeric(v) => format!("{:.4}", v[row]),
                ColumnData::Text(v) => v[row].clone(),
            })
            .collect();
        out.push_str(&format!("| {} |\n", cells.join(" | ")));
    }

    if table.n_rows() > max_rows {
        out.push_str(&format!(
            "\n*{} of {} rows shown.*\n",
            max_rows,
            table.n_rows()
        ));
    }

    out
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Report generated by runmean*\n");

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(summary: &PipelineSummary) -> Result<String> {
    let report = serde_json::json!({
        "generated_at": Utc::now(),
        "summary": summary,
    });
    serde_json::to_string_pretty(&report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn create_test_summary() -> PipelineSummary {
        let mut table = Table::new();
        table.push_numeric("PathLength", vec![17.5, 21.25]).unwrap();
        table
            .push_text("run_id", vec!["runA".into(), "runB".into()])
            .unwrap();

        PipelineSummary {
            root: PathBuf::from("Runs"),
            runs: vec!["runA".to_string(), "runB".to_string()],
            scenarios: vec!["straightLine".to_string()],
            tables_written: 5,
            duration_seconds: 0.3,
            cross_run: vec![CrossRunView {
                scenario: "straightLine".to_string(),
                table,
            }],
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let summary = create_test_summary();
        let markdown = generate_markdown_report(&summary, &ReportConfig::default());

        assert!(markdown.contains("# Runmean Report"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Cross-Run Averages"));
        assert!(markdown.contains("### straightLine"));
        assert!(markdown.contains("runA"));
        assert!(markdown.contains("17.5000"));
    }

    #[test]
    fn test_tables_can_be_disabled() {
        let summary = create_test_summary();
        let config = ReportConfig {
            include_tables: false,
            ..ReportConfig::default()
        };

        let markdown = generate_markdown_report(&summary, &config);
        assert!(!markdown.contains("## Cross-Run Averages"));
    }

    #[test]
    fn test_render_table_truncation() {
        let mut table = Table::new();
        table.push_numeric("PathLength", vec![1.0, 2.0, 3.0]).unwrap();

        let rendered = render_table(&table, 2);
        assert!(rendered.contains("2 of 3 rows shown"));
        assert!(!rendered.contains("3.0000"));
    }

    #[test]
    fn test_generate_json_report() {
        let summary = create_test_summary();
        let json = generate_json_report(&summary).unwrap();

        assert!(json.contains("\"generated_at\""));
        assert!(json.contains("\"runs\""));
        assert!(json.contains("\"cross_run\""));
        assert!(json.contains("\"straightLine\""));
        assert!(json.contains("\"run_id\""));
    }
}
