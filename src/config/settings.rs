//! Store settings
//!
//! Persisted as `config.json`. Every field has a serde default so older or
//! hand-written files keep loading.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::paths::StorePaths;
use crate::error::StoreError;

/// How the ledger makes balance writes atomic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LedgerStrategy {
    /// Hold the account row lock across read-modify-write
    #[default]
    Pessimistic,
    /// Compare-and-swap on the row version, retrying on conflict
    Optimistic,
}

impl LedgerStrategy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pessimistic" | "lock" => Some(Self::Pessimistic),
            "optimistic" | "cas" => Some(Self::Optimistic),
            _ => None,
        }
    }
}

impl fmt::Display for LedgerStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pessimistic => write!(f, "pessimistic"),
            Self::Optimistic => write!(f, "optimistic"),
        }
    }
}

/// Bounded retry for optimistic ledger writes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Backoff before the first retry, doubled each time
    pub base_backoff_ms: u64,
    /// Backoff ceiling
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_backoff_ms: 2,
            max_backoff_ms: 50,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (0-based)
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u64.checked_shl(retry.min(20)).unwrap_or(u64::MAX);
        let ms = self
            .base_backoff_ms
            .saturating_mul(factor)
            .min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }

    /// Total attempts including the first
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    #[serde(default)]
    pub ledger_strategy: LedgerStrategy,

    #[serde(default)]
    pub retry: RetryPolicy,

    /// Write domain events to the audit log
    #[serde(default = "default_audit_enabled")]
    pub audit_enabled: bool,
}

fn default_schema_version() -> u32 {
    1
}

fn default_audit_enabled() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            ledger_strategy: LedgerStrategy::default(),
            retry: RetryPolicy::default(),
            audit_enabled: default_audit_enabled(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or defaults if the file doesn't exist
    pub fn load_or_create(paths: &StorePaths) -> Result<Self, StoreError> {
        let settings_path = paths.settings_file();
        if !settings_path.exists() {
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(&settings_path)
            .map_err(|e| StoreError::Io(format!("Failed to read settings file: {}", e)))?;
        serde_json::from_str(&contents)
            .map_err(|e| StoreError::Config(format!("Failed to parse settings file: {}", e)))
    }

    /// Save settings to disk
    pub fn save(&self, paths: &StorePaths) -> Result<(), StoreError> {
        paths.ensure_directories()?;
        crate::storage::write_json_atomic(paths.settings_file(), self)
    }
}
