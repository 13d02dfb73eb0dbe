//! Purchase service
//!
//! Spends credits on a catalog item and applies its effect, all or nothing:
//!
//! 1. resolve the item (unknown or blocked items stop here)
//! 2. check the quota (no funds are touched on denial)
//! 3. reserve the price
//! 4. raise the quota, re-checked under its row lock, and persist
//! 5. if step 4 fails, give the reservation back before returning
//!
//! Steps 3 and 4 run inside a storage mutation, so a snapshot written by a
//! concurrent commit holds either both changes or neither.
//!
//! Purchases are not idempotent: calling twice buys twice.

use tracing::{debug, info, warn};

use crate::config::catalog::ConfigProvider;
use crate::error::{StoreError, StoreResult};
use crate::events::{DomainEvent, EventSink};
use crate::models::{Credits, EffectKind, QuotaKey, ResourceKind, UserId};
use crate::storage::{Persistence, Storage};

use super::ledger::{Ledger, ReservationGuard, ReserveOutcome};
use super::quota::{QuotaDecision, QuotaEnforcer, QuotaStore};

/// What a successful purchase did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseReceipt {
    pub user_id: UserId,
    pub item_id: String,
    pub price: Credits,
    pub remaining_balance: Credits,
    pub resource: ResourceKind,
    /// Quota value after the increment
    pub new_current: u64,
}

/// Service for buying store items
pub struct PurchaseService<'a> {
    config: &'a dyn ConfigProvider,
    ledger: &'a dyn Ledger,
    quotas: &'a dyn QuotaStore,
    persistence: &'a dyn Persistence,
    events: &'a dyn EventSink,
}

impl<'a> PurchaseService<'a> {
    /// Create a purchase service over the store's own tables
    pub fn new(
        storage: &'a Storage,
        config: &'a dyn ConfigProvider,
        events: &'a dyn EventSink,
    ) -> Self {
        Self {
            config,
            ledger: &storage.accounts,
            quotas: &storage.quotas,
            persistence: storage,
            events,
        }
    }

    /// Create a purchase service from individual ports
    pub fn with_ports(
        config: &'a dyn ConfigProvider,
        ledger: &'a dyn Ledger,
        quotas: &'a dyn QuotaStore,
        persistence: &'a dyn Persistence,
        events: &'a dyn EventSink,
    ) -> Self {
        Self {
            config,
            ledger,
            quotas,
            persistence,
            events,
        }
    }

    /// Buy `item_id` for `user_id`
    pub fn purchase(&self, user_id: UserId, item_id: &str) -> StoreResult<PurchaseReceipt> {
        debug!(user_id = %user_id, item_id, "Purchase requested");

        let item = self
            .config
            .get_item(item_id)
            .ok_or_else(|| StoreError::ItemNotFound(item_id.to_string()))?;
        if item.blocked {
            return Err(StoreError::ItemBlocked(item_id.to_string()));
        }

        let EffectKind::IncrementQuota { resource, amount } = item.effect;
        let key = QuotaKey::new(user_id, resource);
        let max = self.config.get_max(resource);

        // Fails with NotFound before anything else is read for unknown users.
        self.ledger.balance(user_id)?;

        let current = self.quotas.current(key)?;
        if let QuotaDecision::Denied(reason) = QuotaEnforcer::check_increment(current, amount, max)
        {
            warn!(user_id = %user_id, item_id, %resource, current, amount, max, ?reason, "Quota denied");
            return Err(StoreError::ResourceLimitExceeded {
                resource,
                current,
                requested: amount,
                max,
            });
        }

        // Reserve and increment form one change; no snapshot may see half of it.
        let mutation = self.persistence.begin_mutation()?;
        let reservation = match self.ledger.reserve(user_id, item.price)? {
            ReserveOutcome::Reserved(reservation) => reservation,
            ReserveOutcome::Denied {
                required,
                available,
            } => {
                warn!(user_id = %user_id, item_id, %required, %available, "Insufficient balance");
                return Err(StoreError::InsufficientBalance {
                    required,
                    available,
                });
            }
        };
        let guard = ReservationGuard::new(self.ledger, reservation);

        let new_current = match self.quotas.increment(key, amount, max) {
            Ok(value) => value,
            Err(e) => {
                warn!(user_id = %user_id, item_id, error = %e, "Quota increment failed, releasing funds");
                guard.release()?;
                return Err(e);
            }
        };
        drop(mutation);

        if let Err(e) = self.persistence.commit() {
            warn!(user_id = %user_id, item_id, error = %e, "Commit failed, rolling back purchase");
            {
                let _mutation = self.persistence.begin_mutation()?;
                self.quotas.revert_increment(key, amount)?;
                guard.release()?;
            }
            // Another caller's commit may have recorded the purchase meanwhile.
            if let Err(retry) = self.persistence.commit() {
                warn!(user_id = %user_id, item_id, error = %retry, "Commit after rollback failed");
            }
            return Err(e);
        }

        let reservation = guard.confirm();
        info!(
            user_id = %user_id,
            item_id,
            price = %item.price,
            remaining = %reservation.remaining,
            %resource,
            new_current,
            "Purchase committed"
        );

        let receipt = PurchaseReceipt {
            user_id,
            item_id: item.id,
            price: item.price,
            remaining_balance: reservation.remaining,
            resource,
            new_current,
        };
        self.events.emit(&DomainEvent::Purchased {
            user_id,
            item_id: receipt.item_id.clone(),
            price: receipt.price,
            remaining_balance: receipt.remaining_balance,
            resource,
            new_current,
        });
        Ok(receipt)
    }
}
