//! Quota enforcement
//!
//! [`QuotaEnforcer::check_increment`] is a pure decision over three numbers.
//! [`QuotaStore`] is where a quota actually moves; implementations must
//! repeat the check under the row lock, since another purchase may have
//! raised the same quota after the caller's first check.

use crate::error::{StoreError, StoreResult};
use crate::models::{Quota, QuotaKey};
use crate::storage::QuotaRepository;

/// Why an increment was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDenial {
    /// The quota is already at (or above) its ceiling
    AtMax,
    /// The increment would pass the ceiling
    WouldExceedMax,
}

/// Outcome of a quota check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    Allowed,
    Denied(QuotaDenial),
}

impl QuotaDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Validates quota increments against configured ceilings
pub struct QuotaEnforcer;

impl QuotaEnforcer {
    /// Decide whether `current + delta` stays within `max`
    ///
    /// Total over all inputs; the sum is computed without overflow.
    pub fn check_increment(current: u64, delta: u64, max: u64) -> QuotaDecision {
        if current >= max {
            return QuotaDecision::Denied(QuotaDenial::AtMax);
        }
        match current.checked_add(delta) {
            Some(next) if next <= max => QuotaDecision::Allowed,
            _ => QuotaDecision::Denied(QuotaDenial::WouldExceedMax),
        }
    }
}

/// Durable quota counters
pub trait QuotaStore: Send + Sync {
    /// Current value, zero if never raised
    fn current(&self, key: QuotaKey) -> StoreResult<u64>;

    /// Raise by `delta`, re-checking against `max` under the row lock
    ///
    /// Returns the new value or `ResourceLimitExceeded`.
    fn increment(&self, key: QuotaKey, delta: u64, max: u64) -> StoreResult<u64>;

    /// Take back an increment that could not be made durable
    fn revert_increment(&self, key: QuotaKey, delta: u64) -> StoreResult<u64>;
}

impl QuotaStore for QuotaRepository {
    fn current(&self, key: QuotaKey) -> StoreResult<u64> {
        QuotaRepository::current(self, key)
    }

    fn increment(&self, key: QuotaKey, delta: u64, max: u64) -> StoreResult<u64> {
        self.table.ensure(key, || Quota {
            user_id: key.user_id,
            resource: key.resource,
            current: 0,
        })?;

        self.table
            .transact(key, |quota| {
                match QuotaEnforcer::check_increment(quota.current, delta, max) {
                    QuotaDecision::Allowed => {
                        quota.current += delta;
                        Ok(quota.current)
                    }
                    QuotaDecision::Denied(_) => Err(StoreError::ResourceLimitExceeded {
                        resource: key.resource,
                        current: quota.current,
                        requested: delta,
                        max,
                    }),
                }
            })?
            .ok_or_else(|| StoreError::account_not_found(key.user_id.to_string()))
    }

    fn revert_increment(&self, key: QuotaKey, delta: u64) -> StoreResult<u64> {
        self.table
            .transact(key, |quota| {
                quota.current = quota.current.saturating_sub(delta);
                Ok(quota.current)
            })?
            .ok_or_else(|| StoreError::account_not_found(key.user_id.to_string()))
    }
}
