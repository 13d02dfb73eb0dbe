//! Domain events
//!
//! Services report what they committed through an [`EventSink`] handed to
//! them at construction. Sinks are fire-and-forget: a sink that fails must
//! not undo or fail the operation that produced the event.

use std::sync::Mutex;

use serde::Serialize;
use tracing::warn;

use crate::audit::{AuditEntry, AuditLogger};
use crate::models::{Credits, ReportId, ResourceKind, UserId};

/// Something that was committed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    AccountCreated {
        user_id: UserId,
        balance: Credits,
    },
    CreditsGranted {
        user_id: UserId,
        amount: Credits,
        balance: Credits,
    },
    AccountDeleted {
        user_id: UserId,
        balance: Credits,
    },
    Purchased {
        user_id: UserId,
        item_id: String,
        price: Credits,
        remaining_balance: Credits,
        resource: ResourceKind,
        new_current: u64,
    },
    ReportFiled {
        report_id: ReportId,
        reporter: UserId,
    },
    Transitioned {
        entity_type: &'static str,
        entity_id: String,
        old_status: String,
        new_status: String,
        actor: String,
    },
}

/// Receives committed domain events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &DomainEvent);
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &DomainEvent) {}
}

/// Writes events to the audit log
pub struct AuditSink {
    logger: AuditLogger,
}

impl AuditSink {
    pub fn new(logger: AuditLogger) -> Self {
        Self { logger }
    }

    pub fn logger(&self) -> &AuditLogger {
        &self.logger
    }
}

impl EventSink for AuditSink {
    fn emit(&self, event: &DomainEvent) {
        let entry = AuditEntry::from_event(event);
        if let Err(e) = self.logger.log(&entry) {
            warn!(error = %e, entity_id = %entry.entity_id, "Audit write failed");
        }
    }
}

/// Keeps events in memory, for inspection
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<DomainEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies of every event received so far
    pub fn events(&self) -> Vec<DomainEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &DomainEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{EntityType, Operation};
    use tempfile::TempDir;

    #[test]
    fn test_audit_sink_writes_entry() {
        let temp_dir = TempDir::new().unwrap();
        let sink = AuditSink::new(AuditLogger::new(temp_dir.path().join("audit.log")));
        let user_id = UserId::new();

        sink.emit(&DomainEvent::Purchased {
            user_id,
            item_id: "memory-1g".into(),
            price: Credits::new(500),
            remaining_balance: Credits::new(0),
            resource: ResourceKind::Memory,
            new_current: 1024,
        });

        let entries = sink.logger().read_all().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].operation, Operation::Purchase);
        assert_eq!(entries[0].entity_type, EntityType::Account);
        assert_eq!(entries[0].entity_id, user_id.as_uuid().to_string());
    }

    #[test]
    fn test_audit_sink_failure_is_swallowed() {
        let temp_dir = TempDir::new().unwrap();
        // The log path is a directory, so every append fails.
        let sink = AuditSink::new(AuditLogger::new(temp_dir.path().to_path_buf()));
        sink.emit(&DomainEvent::ReportFiled {
            report_id: ReportId::new(),
            reporter: UserId::new(),
        });
    }

    #[test]
    fn test_recording_sink() {
        let sink = RecordingSink::new();
        let user_id = UserId::new();
        sink.emit(&DomainEvent::AccountCreated {
            user_id,
            balance: Credits::new(10),
        });
        assert_eq!(
            sink.events(),
            vec![DomainEvent::AccountCreated {
                user_id,
                balance: Credits::new(10)
            }]
        );
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let json = serde_json::to_value(DomainEvent::Transitioned {
            entity_type: "Report",
            entity_id: "rpt-1".into(),
            old_status: "pending".into(),
            new_status: "resolved".into(),
            actor: "mod".into(),
        })
        .unwrap();
        assert_eq!(json["event"], "transitioned");
        assert_eq!(json["new_status"], "resolved");
    }
}
