//! credit-store - credit store and report resolution core
//!
//! Users hold credit balances and spend them on catalog items that raise
//! resource quotas (memory, disk, server slots, ...). Moderators move abuse
//! reports through review, and resolving a report deletes the reported
//! artifact in the same step as the status change.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Paths, settings and the item catalog
//! - `error`: Custom error types
//! - `models`: Core data models (accounts, quotas, items, reports)
//! - `storage`: Row-locked tables persisted as one JSON snapshot
//! - `services`: Ledger, quota enforcement, purchases and transitions
//! - `events`: Domain events and the sinks that receive them
//! - `audit`: Audit logging system
//! - `cli`, `display`: The `credit-store` command line
//!
//! # Example
//!
//! ```rust,ignore
//! use credit_store::config::{catalog::Catalog, paths::StorePaths};
//! use credit_store::events::NullSink;
//! use credit_store::services::PurchaseService;
//! use credit_store::storage::Storage;
//!
//! let paths = StorePaths::new()?;
//! let storage = Storage::new(paths.clone())?;
//! storage.load_all()?;
//! let catalog = Catalog::load(paths.catalog_file())?;
//! let receipt = PurchaseService::new(&storage, &catalog, &NullSink).purchase(user, "memory-1g")?;
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{StoreError, StoreResult};
