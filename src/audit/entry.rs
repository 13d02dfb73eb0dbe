//! Audit entry data structures
//!
//! Defines the structure of audit log entries and how domain events map
//! onto them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::events::DomainEvent;

/// Types of operations that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
    /// Credits spent on a store item
    Purchase,
    /// Status change of a transitionable entity
    Transition,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "CREATE"),
            Operation::Update => write!(f, "UPDATE"),
            Operation::Delete => write!(f, "DELETE"),
            Operation::Purchase => write!(f, "PURCHASE"),
            Operation::Transition => write!(f, "TRANSITION"),
        }
    }
}

/// Types of entities that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Account,
    Quota,
    Report,
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityType::Account => write!(f, "Account"),
            EntityType::Quota => write!(f, "Quota"),
            EntityType::Report => write!(f, "Report"),
        }
    }
}

impl EntityType {
    fn from_name(name: &str) -> Self {
        match name {
            "Account" => Self::Account,
            "Quota" => Self::Quota,
            _ => Self::Report,
        }
    }
}

/// A single audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the operation occurred (UTC)
    pub timestamp: DateTime<Utc>,

    pub operation: Operation,

    pub entity_type: EntityType,

    /// Full ID of the affected entity
    pub entity_id: String,

    /// Short human-readable label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<serde_json::Value>,

    /// Human-readable change summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_summary: Option<String>,
}

impl AuditEntry {
    fn new(operation: Operation, entity_type: EntityType, entity_id: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            operation,
            entity_type,
            entity_id: entity_id.into(),
            entity_name: None,
            before: None,
            after: None,
            diff_summary: None,
        }
    }

    /// Build the entry recorded for a domain event
    pub fn from_event(event: &DomainEvent) -> Self {
        let payload = serde_json::to_value(event).ok();
        match event {
            DomainEvent::AccountCreated { user_id, .. } => Self {
                entity_name: Some(user_id.to_string()),
                after: payload,
                ..Self::new(Operation::Create, EntityType::Account, user_id.as_uuid().to_string())
            },
            DomainEvent::CreditsGranted {
                user_id,
                amount,
                balance,
            } => Self {
                entity_name: Some(user_id.to_string()),
                after: payload,
                diff_summary: Some(format!("balance +{} -> {}", amount, balance)),
                ..Self::new(Operation::Update, EntityType::Account, user_id.as_uuid().to_string())
            },
            DomainEvent::AccountDeleted { user_id, .. } => Self {
                entity_name: Some(user_id.to_string()),
                before: payload,
                ..Self::new(Operation::Delete, EntityType::Account, user_id.as_uuid().to_string())
            },
            DomainEvent::Purchased {
                user_id,
                item_id,
                price,
                remaining_balance,
                resource,
                new_current,
            } => Self {
                entity_name: Some(item_id.clone()),
                after: payload,
                diff_summary: Some(format!(
                    "balance -{} -> {}, {} -> {}",
                    price, remaining_balance, resource, new_current
                )),
                ..Self::new(
                    Operation::Purchase,
                    EntityType::Account,
                    user_id.as_uuid().to_string(),
                )
            },
            DomainEvent::ReportFiled { report_id, .. } => Self {
                entity_name: Some(report_id.to_string()),
                after: payload,
                ..Self::new(Operation::Create, EntityType::Report, report_id.as_uuid().to_string())
            },
            DomainEvent::Transitioned {
                entity_type,
                entity_id,
                old_status,
                new_status,
                actor,
            } => Self {
                entity_name: Some(actor.clone()),
                after: payload,
                diff_summary: Some(format!("status: {} -> {}", old_status, new_status)),
                ..Self::new(
                    Operation::Transition,
                    EntityType::from_name(entity_type),
                    entity_id.clone(),
                )
            },
        }
    }

    /// Format the entry for human-readable output
    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] {} {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.operation,
            self.entity_type,
            self.entity_id
        );

        if let Some(name) = &self.entity_name {
            output.push_str(&format!(" ({})", name));
        }

        if let Some(diff) = &self.diff_summary {
            output.push_str(&format!("\n  Changes: {}", diff));
        }

        output
    }
}
