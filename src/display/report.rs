//! Report display formatting

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::models::Report;

#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Reporter")]
    reporter: String,
    #[tabled(rename = "Reason")]
    reason: String,
    #[tabled(rename = "Filed")]
    filed: String,
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

/// Format a list of reports as a table
pub fn format_report_list(reports: &[Report]) -> String {
    if reports.is_empty() {
        return "No reports found.\n".to_string();
    }

    let rows = reports.iter().map(|r| ReportRow {
        id: r.id.as_uuid().to_string(),
        status: r.status.to_string(),
        reporter: r.reporter.to_string(),
        reason: truncate(&r.reason, 40),
        filed: r.created_at.format("%Y-%m-%d %H:%M").to_string(),
    });
    let mut table = Table::new(rows);
    table.with(Style::psql());
    format!("{}\n", table)
}

/// Format a single report's details
pub fn format_report_details(report: &Report) -> String {
    let mut output = String::new();
    output.push_str(&format!("Report: {}\n", report.id));
    output.push_str(&format!("  ID:        {}\n", report.id.as_uuid()));
    output.push_str(&format!("  Status:    {}\n", report.status));
    output.push_str(&format!("  Reporter:  {}\n", report.reporter));
    output.push_str(&format!("  Reason:    {}\n", report.reason));
    if let Some(artifact) = &report.artifact {
        output.push_str(&format!("  Artifact:  {}\n", artifact.display()));
    }
    if let Some(by) = &report.resolved_by {
        output.push_str(&format!("  Moved by:  {}\n", by));
    }
    if let Some(at) = report.resolved_at {
        output.push_str(&format!("  Moved at:  {}\n", at.format("%Y-%m-%d %H:%M:%S")));
    }
    if let Some(notes) = &report.notes {
        output.push_str(&format!("  Notes:     {}\n", notes));
    }
    output
}
