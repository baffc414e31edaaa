use crate::engine::StageCounts;
use colored::Colorize;
use comfy_table::{Cell, Table};
use serde::Serialize;
use serde_json::json;

/// Summary of one filtering run
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RunReport {
    /// Records ingested from the input file
    pub ingested: usize,
    /// Records dropped during ingestion under the skip policy
    pub skipped_malformed: usize,
    /// Surviving count after each active filter stage
    pub stages: StageCounts,
    /// Records written to the output file
    pub written: usize,
    pub elapsed_seconds: f64,
}

/// Renders the run summary as a stage-by-stage table.
pub fn format_report_text(report: &RunReport) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Stage", "Records"]);
    table.add_row(vec![Cell::new("Ingested"), Cell::new(report.ingested)]);
    if report.skipped_malformed > 0 {
        table.add_row(vec![
            Cell::new("Skipped (malformed)"),
            Cell::new(report.skipped_malformed),
        ]);
    }
    if let Some(count) = report.stages.after_time_range {
        table.add_row(vec![Cell::new("After time range"), Cell::new(count)]);
    }
    if let Some(count) = report.stages.after_start_keyword {
        table.add_row(vec![Cell::new("After start keyword"), Cell::new(count)]);
    }
    if let Some(count) = report.stages.after_search_keywords {
        table.add_row(vec![Cell::new("After keyword search"), Cell::new(count)]);
    }
    table.add_row(vec![Cell::new("Written"), Cell::new(report.written)]);

    format!(
        "{}\n{table}\nExecution time: {:.3} seconds\n",
        "Run summary".bold(),
        report.elapsed_seconds
    )
}

/// Renders the run summary as pretty-printed JSON.
pub fn format_report_json(report: &RunReport) -> String {
    serde_json::to_string_pretty(&json!({ "run": report }))
        .unwrap_or_else(|_| "{\"run\":{\"error\":\"failed to serialize run summary\"}}".into())
}
