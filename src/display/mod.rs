//! Display formatting for terminal output
//!
//! Turns models into the text the CLI prints: tables for lists, aligned
//! key/value blocks for single entities.

pub mod account;
pub mod report;
pub mod store;

pub use account::{format_account_details, format_account_list};
pub use report::{format_report_details, format_report_list};
pub use store::{format_item_list, format_receipt};
