//! Audit log CLI command

use crate::audit::AuditLogger;
use crate::error::StoreResult;

/// Print the most recent audit entries, oldest first
pub fn handle_audit_command(logger: &AuditLogger, limit: usize) -> StoreResult<()> {
    let entries = logger.read_recent(limit)?;
    if entries.is_empty() {
        println!("No audit entries.");
        return Ok(());
    }

    for entry in &entries {
        println!("{}", entry.format_human_readable());
    }
    Ok(())
}
