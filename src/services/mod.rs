//! Service layer for the credit store
//!
//! Services hold the business rules on top of the storage layer: the
//! ledger and quota ports, the purchase workflow, status transitions with
//! side effects, and account and report management.

pub mod account;
pub mod ledger;
pub mod purchase;
pub mod quota;
pub mod report;
pub mod transition;

pub use account::{AccountService, AccountSummary};
pub use ledger::{Ledger, Reservation, ReservationGuard, ReserveOutcome};
pub use purchase::{PurchaseReceipt, PurchaseService};
pub use quota::{QuotaDecision, QuotaDenial, QuotaEnforcer, QuotaStore};
pub use report::ReportService;
pub use transition::{TransitionCoordinator, TransitionOutcome};
