//! Abuse report model
//!
//! Reports move `pending -> reviewed -> resolved | dismissed`. Resolving a
//! report removes the reported artifact, so `resolved` always means the
//! artifact is gone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

use super::ids::{ReportId, UserId};
use super::lifecycle::{TransitionAudit, Transitionable};

/// Report status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    /// Filed, not yet looked at
    #[default]
    Pending,
    /// A moderator has looked at it
    Reviewed,
    /// Upheld; the artifact has been removed
    Resolved,
    /// Rejected; the artifact stays
    Dismissed,
}

impl ReportStatus {
    /// Terminal statuses have no outgoing transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::Dismissed)
    }

    /// Parse status from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "reviewed" => Some(Self::Reviewed),
            "resolved" => Some(Self::Resolved),
            "dismissed" => Some(Self::Dismissed),
            _ => None,
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Reviewed => write!(f, "reviewed"),
            Self::Resolved => write!(f, "resolved"),
            Self::Dismissed => write!(f, "dismissed"),
        }
    }
}

/// An abuse report against a stored artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Unique identifier
    pub id: ReportId,

    /// Who filed it
    pub reporter: UserId,

    /// Free-form reason given by the reporter
    pub reason: String,

    /// Current status
    pub status: ReportStatus,

    /// Stored file the report is about, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<PathBuf>,

    /// Moderator who last moved the report
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<String>,

    /// When the report was last moved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,

    /// Moderator notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// When the report was filed
    pub created_at: DateTime<Utc>,
}

impl Report {
    /// File a new pending report
    pub fn new(reporter: UserId, reason: impl Into<String>, artifact: Option<PathBuf>) -> Self {
        Self {
            id: ReportId::new(),
            reporter,
            reason: reason.into(),
            status: ReportStatus::Pending,
            artifact,
            resolved_by: None,
            resolved_at: None,
            notes: None,
            created_at: Utc::now(),
        }
    }

    /// Metadata sidecar stored next to the artifact
    pub fn metadata_path(artifact: &Path) -> PathBuf {
        let mut name = artifact.as_os_str().to_owned();
        name.push(".meta.json");
        PathBuf::from(name)
    }

    /// A non-empty relative path with no `..`, root or drive components
    pub fn is_confined(path: &Path) -> bool {
        path.components().any(|c| matches!(c, Component::Normal(_)))
            && path
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
    }

    /// Every file that has to go when the report is resolved
    pub fn artifact_files(&self) -> Vec<PathBuf> {
        match &self.artifact {
            Some(path) => vec![path.clone(), Self::metadata_path(path)],
            None => Vec::new(),
        }
    }

    /// Validate the report
    pub fn validate(&self) -> Result<(), String> {
        if self.reason.trim().is_empty() {
            return Err("report reason cannot be empty".into());
        }
        if let Some(artifact) = &self.artifact {
            if !Self::is_confined(artifact) {
                return Err(format!(
                    "artifact must be a path inside the artifacts directory: {}",
                    artifact.display()
                ));
            }
        }
        Ok(())
    }
}

impl Transitionable for Report {
    type Id = ReportId;
    type Status = ReportStatus;

    const ENTITY_NAME: &'static str = "Report";

    fn id(&self) -> ReportId {
        self.id
    }

    fn status(&self) -> ReportStatus {
        self.status
    }

    fn can_transition(from: ReportStatus, to: ReportStatus) -> bool {
        use ReportStatus::*;
        matches!(
            (from, to),
            (Pending, Reviewed)
                | (Pending, Resolved)
                | (Pending, Dismissed)
                | (Reviewed, Resolved)
                | (Reviewed, Dismissed)
        )
    }

    fn requires_side_effect(to: ReportStatus) -> bool {
        to == ReportStatus::Resolved
    }

    fn apply_transition(&mut self, to: ReportStatus, audit: &TransitionAudit) {
        self.status = to;
        self.resolved_by = Some(audit.actor.clone());
        self.resolved_at = Some(audit.at);
        if audit.notes.is_some() {
            self.notes.clone_from(&audit.notes);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses_have_no_exits() {
        for from in [ReportStatus::Resolved, ReportStatus::Dismissed] {
            assert!(from.is_terminal());
            for to in [
                ReportStatus::Pending,
                ReportStatus::Reviewed,
                ReportStatus::Resolved,
                ReportStatus::Dismissed,
            ] {
                assert!(!Report::can_transition(from, to));
            }
        }
    }

    #[test]
    fn test_review_cannot_go_back() {
        assert!(Report::can_transition(
            ReportStatus::Pending,
            ReportStatus::Reviewed
        ));
        assert!(!Report::can_transition(
            ReportStatus::Reviewed,
            ReportStatus::Pending
        ));
        assert!(!Report::can_transition(
            ReportStatus::Reviewed,
            ReportStatus::Reviewed
        ));
    }

    #[test]
    fn test_only_resolve_needs_side_effect() {
        assert!(Report::requires_side_effect(ReportStatus::Resolved));
        assert!(!Report::requires_side_effect(ReportStatus::Dismissed));
        assert!(!Report::requires_side_effect(ReportStatus::Reviewed));
    }

    #[test]
    fn test_artifact_files_include_metadata() {
        let report = Report::new(
            UserId::new(),
            "malware",
            Some(PathBuf::from("files/payload.bin")),
        );
        assert_eq!(
            report.artifact_files(),
            vec![
                PathBuf::from("files/payload.bin"),
                PathBuf::from("files/payload.bin.meta.json"),
            ]
        );

        let bare = Report::new(UserId::new(), "spam", None);
        assert!(bare.artifact_files().is_empty());
    }

    #[test]
    fn test_validate_artifact_stays_inside_directory() {
        let with = |path: &str| Report::new(UserId::new(), "malware", Some(PathBuf::from(path)));

        assert!(with("upload.bin").validate().is_ok());
        assert!(with("./2024/upload.bin").validate().is_ok());

        assert!(with("/etc/passwd").validate().is_err());
        assert!(with("../state.json").validate().is_err());
        assert!(with("nested/../../config.json").validate().is_err());
        assert!(with("").validate().is_err());
        assert!(with(".").validate().is_err());
    }

    #[test]
    fn test_apply_transition_stamps_audit_fields() {
        let mut report = Report::new(UserId::new(), "spam", None);
        let audit = TransitionAudit::now("mod-anna", Some("confirmed".into()));
        report.apply_transition(ReportStatus::Dismissed, &audit);

        assert_eq!(report.status, ReportStatus::Dismissed);
        assert_eq!(report.resolved_by.as_deref(), Some("mod-anna"));
        assert_eq!(report.notes.as_deref(), Some("confirmed"));
        assert!(report.resolved_at.is_some());
    }
}
