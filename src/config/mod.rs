//! Configuration module for the credit store
//!
//! - XDG-compliant path resolution
//! - Settings persistence (ledger strategy, retry policy)
//! - The item catalog, which is the store's `ConfigProvider`

pub mod catalog;
pub mod paths;
pub mod settings;

pub use catalog::{Catalog, ConfigProvider};
pub use paths::StorePaths;
pub use settings::{LedgerStrategy, RetryPolicy, Settings};
