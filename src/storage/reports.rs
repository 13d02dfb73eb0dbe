//! Report repository
//!
//! Status changes are not made here; they go through the transition
//! coordinator, which works on the underlying row table directly.

use crate::error::StoreResult;
use crate::models::{Report, ReportId, ReportStatus};

use super::table::RowTable;

/// Repository for abuse reports
pub struct ReportRepository {
    pub(crate) table: RowTable<ReportId, Report>,
}

impl ReportRepository {
    pub fn new() -> Self {
        Self {
            table: RowTable::new("reports"),
        }
    }

    /// Replace contents with previously persisted reports
    pub fn load(&self, reports: Vec<Report>) -> StoreResult<()> {
        self.table.load(reports.into_iter().map(|r| (r.id, r)))
    }

    /// The row table, for status transitions
    pub fn table(&self) -> &RowTable<ReportId, Report> {
        &self.table
    }

    /// Get a report by ID
    pub fn get(&self, id: ReportId) -> StoreResult<Option<Report>> {
        self.table.get(id)
    }

    /// Insert a newly filed report
    pub fn insert(&self, report: Report) -> StoreResult<bool> {
        self.table.insert_new(report.id, report)
    }

    /// All reports, newest first
    pub fn get_all(&self) -> StoreResult<Vec<Report>> {
        let mut reports = self.table.snapshot()?;
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reports)
    }

    /// Reports in a given status, newest first
    pub fn get_by_status(&self, status: ReportStatus) -> StoreResult<Vec<Report>> {
        Ok(self
            .get_all()?
            .into_iter()
            .filter(|r| r.status == status)
            .collect())
    }

    /// Count reports
    pub fn count(&self) -> StoreResult<usize> {
        self.table.len()
    }
}

impl Default for ReportRepository {
    fn default() -> Self {
        Self::new()
    }
}
