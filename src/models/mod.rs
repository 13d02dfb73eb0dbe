//! Core data models for the credit store
//!
//! This module contains the data structures of the store domain: credit
//! accounts, resource quotas, catalog items and abuse reports.

pub mod account;
pub mod credits;
pub mod ids;
pub mod item;
pub mod lifecycle;
pub mod quota;
pub mod report;

pub use account::Account;
pub use credits::Credits;
pub use ids::{InvalidId, ReportId, UserId};
pub use item::{EffectKind, PurchaseItem};
pub use lifecycle::{TransitionAudit, Transitionable};
pub use quota::{Quota, QuotaKey, ResourceKind};
pub use report::{Report, ReportStatus};
