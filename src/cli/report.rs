//! Report CLI commands
//!
//! Filing abuse reports and moving them through moderation.

use std::path::PathBuf;

use clap::Subcommand;

use crate::display::report::{format_report_details, format_report_list};
use crate::error::{StoreError, StoreResult};
use crate::events::EventSink;
use crate::models::ReportStatus;
use crate::services::ReportService;
use crate::storage::{ArtifactStore, Storage};

use super::{parse_report, parse_user};

/// Report subcommands
#[derive(Subcommand)]
pub enum ReportCommands {
    /// File a new report
    File {
        /// User ID of the reporter
        reporter: String,
        /// Why the content is being reported
        reason: String,
        /// Stored artifact the report is about, relative to the artifacts directory
        #[arg(short, long)]
        artifact: Option<PathBuf>,
    },
    /// List reports
    List {
        /// Only show reports in this status
        #[arg(short, long)]
        status: Option<String>,
    },
    /// Show report details
    Show {
        /// Report ID
        id: String,
    },
    /// Mark a report as reviewed
    Review {
        /// Report ID
        id: String,
        /// Moderator name
        #[arg(long)]
        by: String,
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Resolve a report and delete its artifact
    Resolve {
        /// Report ID
        id: String,
        /// Moderator name
        #[arg(long)]
        by: String,
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Dismiss a report
    Dismiss {
        /// Report ID
        id: String,
        /// Moderator name
        #[arg(long)]
        by: String,
        #[arg(short, long)]
        notes: Option<String>,
    },
}

/// Handle a report command
pub fn handle_report_command(
    storage: &Storage,
    artifacts: &dyn ArtifactStore,
    events: &dyn EventSink,
    cmd: ReportCommands,
) -> StoreResult<()> {
    let service = ReportService::new(storage, artifacts, events);

    match cmd {
        ReportCommands::File {
            reporter,
            reason,
            artifact,
        } => {
            let report = service.file(parse_user(&reporter)?, &reason, artifact)?;
            println!("Filed report: {}", report.id);
            println!("  ID: {}", report.id.as_uuid());
        }

        ReportCommands::List { status } => {
            let status = status
                .map(|s| {
                    ReportStatus::parse(&s).ok_or_else(|| {
                        StoreError::Validation(format!(
                            "Invalid status: '{}'. Valid statuses: pending, reviewed, resolved, dismissed",
                            s
                        ))
                    })
                })
                .transpose()?;
            let reports = service.list(status)?;
            print!("{}", format_report_list(&reports));
        }

        ReportCommands::Show { id } => {
            let id = parse_report(&id)?;
            let report = service
                .get(id)?
                .ok_or_else(|| StoreError::report_not_found(id.to_string()))?;
            print!("{}", format_report_details(&report));
        }

        ReportCommands::Review { id, by, notes } => {
            let outcome = service.review(parse_report(&id)?, &by, notes)?;
            println!(
                "Report {}: {} -> {}",
                outcome.entity_id, outcome.old_status, outcome.new_status
            );
        }

        ReportCommands::Resolve { id, by, notes } => {
            let outcome = service.resolve(parse_report(&id)?, &by, notes)?;
            println!(
                "Report {}: {} -> {}",
                outcome.entity_id, outcome.old_status, outcome.new_status
            );
        }

        ReportCommands::Dismiss { id, by, notes } => {
            let outcome = service.dismiss(parse_report(&id)?, &by, notes)?;
            println!(
                "Report {}: {} -> {}",
                outcome.entity_id, outcome.old_status, outcome.new_status
            );
        }
    }

    Ok(())
}
