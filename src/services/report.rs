//! Report service
//!
//! Files abuse reports and moves them through review. Resolving a report
//! deletes its artifact; the report only becomes `resolved` if every file of
//! the artifact is gone.

use std::path::PathBuf;

use tracing::info;

use crate::error::{StoreError, StoreResult};
use crate::events::{DomainEvent, EventSink};
use crate::models::{Report, ReportId, ReportStatus, TransitionAudit, UserId};
use crate::storage::{ArtifactStore, Persistence, Storage};

use super::transition::{TransitionCoordinator, TransitionOutcome};

/// Service for abuse report management
pub struct ReportService<'a> {
    storage: &'a Storage,
    artifacts: &'a dyn ArtifactStore,
    events: &'a dyn EventSink,
}

impl<'a> ReportService<'a> {
    /// Create a new report service
    pub fn new(
        storage: &'a Storage,
        artifacts: &'a dyn ArtifactStore,
        events: &'a dyn EventSink,
    ) -> Self {
        Self {
            storage,
            artifacts,
            events,
        }
    }

    fn coordinator(&self) -> TransitionCoordinator<'a, Report> {
        TransitionCoordinator::new(self.storage.reports.table(), self.storage, self.events)
    }

    /// File a new pending report
    pub fn file(
        &self,
        reporter: UserId,
        reason: &str,
        artifact: Option<PathBuf>,
    ) -> StoreResult<Report> {
        if !self.storage.accounts.exists(reporter)? {
            return Err(StoreError::account_not_found(reporter.to_string()));
        }

        let report = Report::new(reporter, reason.trim(), artifact);
        report.validate().map_err(StoreError::Validation)?;

        if !self.storage.reports.insert(report.clone())? {
            return Err(StoreError::Duplicate {
                entity_type: "Report",
                identifier: report.id.to_string(),
            });
        }
        self.storage.commit()?;

        info!(report_id = %report.id, reporter = %reporter, "Report filed");
        self.events.emit(&DomainEvent::ReportFiled {
            report_id: report.id,
            reporter,
        });
        Ok(report)
    }

    /// Get a report by ID
    pub fn get(&self, id: ReportId) -> StoreResult<Option<Report>> {
        self.storage.reports.get(id)
    }

    /// List reports, newest first, optionally by status
    pub fn list(&self, status: Option<ReportStatus>) -> StoreResult<Vec<Report>> {
        match status {
            Some(status) => self.storage.reports.get_by_status(status),
            None => self.storage.reports.get_all(),
        }
    }

    /// Mark a report as looked at
    pub fn review(
        &self,
        id: ReportId,
        actor: &str,
        notes: Option<String>,
    ) -> StoreResult<TransitionOutcome<Report>> {
        self.move_to(id, ReportStatus::Reviewed, actor, notes)
    }

    /// Close a report without acting on it
    pub fn dismiss(
        &self,
        id: ReportId,
        actor: &str,
        notes: Option<String>,
    ) -> StoreResult<TransitionOutcome<Report>> {
        self.move_to(id, ReportStatus::Dismissed, actor, notes)
    }

    /// Resolve a report, deleting its artifact
    pub fn resolve(
        &self,
        id: ReportId,
        actor: &str,
        notes: Option<String>,
    ) -> StoreResult<TransitionOutcome<Report>> {
        self.move_to(id, ReportStatus::Resolved, actor, notes)
    }

    fn move_to(
        &self,
        id: ReportId,
        target: ReportStatus,
        actor: &str,
        notes: Option<String>,
    ) -> StoreResult<TransitionOutcome<Report>> {
        let actor = actor.trim();
        if actor.is_empty() {
            return Err(StoreError::Validation("actor cannot be empty".into()));
        }

        let audit = TransitionAudit::now(actor, notes);
        self.coordinator().transition(id, target, audit, |report| {
            self.artifacts
                .delete(&report.artifact_files())
                .into_result()
                .map(|_| ())
        })
    }
}
