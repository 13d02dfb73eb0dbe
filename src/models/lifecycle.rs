//! Status machines for entities whose transitions may carry side effects

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

/// Who made a status change, when, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionAudit {
    pub actor: String,
    pub at: DateTime<Utc>,
    pub notes: Option<String>,
}

impl TransitionAudit {
    /// Audit fields stamped with the current time
    pub fn now(actor: impl Into<String>, notes: Option<String>) -> Self {
        Self {
            actor: actor.into(),
            at: Utc::now(),
            notes,
        }
    }
}

/// An entity driven through a fixed status machine
pub trait Transitionable: Clone {
    type Id: Copy + Eq + Hash + fmt::Display + fmt::Debug;
    type Status: Copy + Eq + fmt::Display + fmt::Debug;

    /// Entity name used in events and errors, e.g. "Report"
    const ENTITY_NAME: &'static str;

    fn id(&self) -> Self::Id;

    fn status(&self) -> Self::Status;

    /// Whether `from -> to` is an edge of the machine
    fn can_transition(from: Self::Status, to: Self::Status) -> bool;

    /// Whether entering `to` must be coupled to an external side effect
    fn requires_side_effect(to: Self::Status) -> bool;

    /// Write the new status and audit fields
    fn apply_transition(&mut self, to: Self::Status, audit: &TransitionAudit);
}
