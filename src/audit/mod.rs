//! Audit logging for the credit store
//!
//! Committed domain events are recorded in an append-only JSONL log.
//!
//! - `AuditEntry`: one log line; built from a `DomainEvent` with
//!   `AuditEntry::from_event`.
//! - `AuditLogger`: appends entries and reads them back.
//!
//! The usual way in is `events::AuditSink`, which services receive as their
//! `EventSink`.

mod entry;
mod logger;

pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
