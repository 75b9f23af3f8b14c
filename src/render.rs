//! Report rendering for the CLI.

use crate::args::OutputFormat;
use crate::pipeline::LotOutcome;
use metrology_analyze::LotReport;
use tabled::settings::Style;
use tabled::Tabled;

#[derive(Tabled)]
struct StepLine {
    #[tabled(rename = "PROCESS_STEP")]
    process_step: String,
    #[tabled(rename = "AVG_DEFECTS")]
    avg_defects: String,
    #[tabled(rename = "AVG_LINE_WIDTH")]
    avg_line_width: String,
}

/// Render a lot report in the requested format.
pub fn render_report(report: &LotReport, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Table => Ok(render_table(report)),
    }
}

fn render_table(report: &LotReport) -> String {
    if report.is_empty() {
        return format!("No metrology records for lot '{}'", report.lot_id);
    }

    let lines: Vec<StepLine> = report
        .rows
        .iter()
        .map(|row| StepLine {
            process_step: row.process_step.clone(),
            avg_defects: format!("{:.3}", row.avg_defects),
            avg_line_width: format!("{:.4}", row.avg_line_width),
        })
        .collect();

    let mut table = tabled::Table::new(lines);
    table.with(Style::psql());
    format!("Analysis for lot '{}'\n{table}", report.lot_id)
}

/// One-line summary of a lot load.
pub fn render_load_summary(outcome: &LotOutcome) -> String {
    let mut summary = format!(
        "Ingested {} records from {} wafers into lot '{}' ({} batches, {:.2} rows/sec)",
        outcome.metrics.rows_inserted,
        outcome.ingested.len(),
        outcome.lot_id,
        outcome.metrics.batch_count,
        outcome.metrics.rows_per_second()
    );
    if !outcome.is_complete() {
        summary.push_str(&format!(
            "; failed wafers: {}",
            outcome.failed_wafer_ids().join(", ")
        ));
    }
    summary
}
