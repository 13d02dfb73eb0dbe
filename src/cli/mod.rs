//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod account;
pub mod audit;
pub mod report;
pub mod store;

pub use account::{handle_account_command, AccountCommands};
pub use audit::handle_audit_command;
pub use report::{handle_report_command, ReportCommands};
pub use store::{handle_store_command, StoreCommands};

use crate::error::{StoreError, StoreResult};
use crate::models::{Credits, InvalidId, ReportId, UserId};

pub(crate) fn parse_user(s: &str) -> StoreResult<UserId> {
    s.trim()
        .parse()
        .map_err(|e: InvalidId| StoreError::Validation(e.to_string()))
}

pub(crate) fn parse_report(s: &str) -> StoreResult<ReportId> {
    s.trim()
        .parse()
        .map_err(|e: InvalidId| StoreError::Validation(e.to_string()))
}

pub(crate) fn parse_credits(s: &str) -> StoreResult<Credits> {
    Credits::parse(s).map_err(|e| StoreError::Validation(e.to_string()))
}
