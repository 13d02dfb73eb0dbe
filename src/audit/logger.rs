//! Audit logger for the append-only audit log
//!
//! Each entry is one JSON line, written with a single append and flushed
//! immediately. Appends from concurrent callers are serialized.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::{StoreError, StoreResult};

use super::entry::AuditEntry;

/// Handles writing audit entries to the audit log file (JSONL)
pub struct AuditLogger {
    log_path: PathBuf,
    append: Mutex<()>,
}

impl AuditLogger {
    /// Create a new AuditLogger that writes to the specified path
    pub fn new(log_path: PathBuf) -> Self {
        Self {
            log_path,
            append: Mutex::new(()),
        }
    }

    /// Append an entry
    pub fn log(&self, entry: &AuditEntry) -> StoreResult<()> {
        let mut line = serde_json::to_string(entry)
            .map_err(|e| StoreError::Json(format!("Failed to serialize audit entry: {}", e)))?;
        line.push('\n');

        let _append = self
            .append
            .lock()
            .map_err(|_| StoreError::lock_poisoned("audit log"))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| StoreError::Io(format!("Failed to open audit log: {}", e)))?;

        file.write_all(line.as_bytes())
            .map_err(|e| StoreError::Io(format!("Failed to write audit entry: {}", e)))?;
        file.flush()
            .map_err(|e| StoreError::Io(format!("Failed to flush audit log: {}", e)))?;

        Ok(())
    }

    /// Read all audit entries, oldest first
    pub fn read_all(&self) -> StoreResult<Vec<AuditEntry>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.log_path)
            .map_err(|e| StoreError::Io(format!("Failed to open audit log: {}", e)))?;

        let mut entries = Vec::new();
        for (line_num, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| {
                StoreError::Io(format!(
                    "Failed to read audit log line {}: {}",
                    line_num + 1,
                    e
                ))
            })?;
            if line.trim().is_empty() {
                continue;
            }

            let entry: AuditEntry = serde_json::from_str(&line).map_err(|e| {
                StoreError::Json(format!(
                    "Failed to parse audit entry at line {}: {}",
                    line_num + 1,
                    e
                ))
            })?;
            entries.push(entry);
        }

        Ok(entries)
    }

    /// Read the most recent N entries
    pub fn read_recent(&self, count: usize) -> StoreResult<Vec<AuditEntry>> {
        let all_entries = self.read_all()?;
        let start = all_entries.len().saturating_sub(count);
        Ok(all_entries[start..].to_vec())
    }

    /// Number of entries in the log
    pub fn entry_count(&self) -> StoreResult<usize> {
        Ok(self.read_all()?.len())
    }

    pub fn path(&self) -> &PathBuf {
        &self.log_path
    }
}
