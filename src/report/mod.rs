//! Summary report generation.
//!
//! This module renders the pipeline summary into a Markdown or JSON
//! report for the operator; the CSV tables themselves are the chart
//! renderer's input and are written by the aggregation pipeline.

pub mod generator;

pub use generator::{generate_json_report, generate_markdown_report};
