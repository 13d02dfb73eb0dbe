//! Custom error types for the credit store
//!
//! This module defines the error hierarchy for the store using thiserror.
//! Validation outcomes (unknown or blocked items, quota and balance denials)
//! are ordinary variants: callers match on them to render a message.

use thiserror::Error;

use crate::models::{Credits, ResourceKind};

/// The main error type for credit store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Purchase item is not in the catalog
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// Purchase item exists but has been blocked by an administrator
    #[error("Item is blocked: {0}")]
    ItemBlocked(String),

    /// The purchase would push a quota past its configured maximum
    #[error("Resource limit exceeded for {resource}: current {current}, requested {requested}, max {max}")]
    ResourceLimitExceeded {
        resource: ResourceKind,
        current: u64,
        requested: u64,
        max: u64,
    },

    /// The account cannot cover the price
    #[error("Insufficient balance: need {required}, have {available}")]
    InsufficientBalance {
        required: Credits,
        available: Credits,
    },

    /// Optimistic ledger retries were exhausted
    #[error("Concurrency conflict: gave up after {attempts} attempts")]
    ConcurrencyConflict { attempts: u32 },

    /// A transition side effect failed; the transition was rolled back
    #[error("Side effect failed: {reason}")]
    SideEffectFailed { reason: String },

    /// The requested status change is not part of the state machine
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// Transaction layer errors (poisoned locks, snapshot writes)
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Duplicate entity errors
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    /// Validation errors for input values
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),
}

impl StoreError {
    /// Create a "not found" error for accounts
    pub fn account_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Account",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for reports
    pub fn report_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Report",
            identifier: identifier.into(),
        }
    }

    /// Wrap a poisoned lock or similar transaction layer failure
    pub fn lock_poisoned(what: &str) -> Self {
        Self::Persistence(format!("{} lock poisoned", what))
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is an expected, caller-recoverable validation outcome
    ///
    /// These never leave any mutation behind.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ItemNotFound(_)
                | Self::ItemBlocked(_)
                | Self::ResourceLimitExceeded { .. }
                | Self::InsufficientBalance { .. }
                | Self::InvalidTransition { .. }
                | Self::Validation(_)
        )
    }

    /// Check if retrying the whole call later might succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict { .. })
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<serde_yaml::Error> for StoreError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type alias for credit store operations
pub type StoreResult<T> = Result<T, StoreError>;
