//! Balance ledger
//!
//! All balance writes go through the [`Ledger`] port. The account
//! repository implements it with one of two strategies, chosen in settings:
//!
//! - **Pessimistic**: the account row's lock is held for the whole
//!   read-check-write. Callers on the same user queue on that lock.
//! - **Optimistic**: the balance and row version are read, the new balance
//!   is computed without holding the lock, and the write is a
//!   compare-and-swap on the version. A lost race retries with exponential
//!   backoff and gives up with `ConcurrencyConflict`.
//!
//! Either way every operation on one user's balance takes effect at a
//! single point under that row's lock, so concurrent calls behave as if run
//! one at a time. Different users never share a lock.

use std::thread;

use tracing::{debug, error, warn};

use crate::config::settings::LedgerStrategy;
use crate::error::{StoreError, StoreResult};
use crate::models::{Credits, UserId};
use crate::storage::AccountRepository;

/// Funds taken from a balance, pending the rest of an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub user_id: UserId,
    pub amount: Credits,
    /// Balance right after the reservation
    pub remaining: Credits,
}

/// Result of a reservation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReserveOutcome {
    Reserved(Reservation),
    /// Nothing was taken
    Denied { required: Credits, available: Credits },
}

/// Atomic balance operations for one account at a time
pub trait Ledger: Send + Sync {
    /// Current balance
    fn balance(&self, user_id: UserId) -> StoreResult<Credits>;

    /// Take `amount` if and only if the balance covers it
    fn reserve(&self, user_id: UserId, amount: Credits) -> StoreResult<ReserveOutcome>;

    /// Give back exactly what a reservation took
    ///
    /// Each reservation must be released at most once.
    fn release(&self, reservation: &Reservation) -> StoreResult<Credits>;

    /// Add credits to a balance
    fn credit(&self, user_id: UserId, amount: Credits) -> StoreResult<Credits>;
}

enum BalanceChange<T> {
    Set(Credits, T),
    Keep(T),
}

impl AccountRepository {
    fn update_balance<T, F>(&self, user_id: UserId, plan: F) -> StoreResult<T>
    where
        F: Fn(Credits) -> StoreResult<BalanceChange<T>>,
    {
        match self.strategy {
            LedgerStrategy::Pessimistic => self.update_locked(user_id, plan),
            LedgerStrategy::Optimistic => self.update_cas(user_id, plan),
        }
    }

    fn update_locked<T, F>(&self, user_id: UserId, plan: F) -> StoreResult<T>
    where
        F: Fn(Credits) -> StoreResult<BalanceChange<T>>,
    {
        self.table
            .transact(user_id, |account| match plan(account.balance)? {
                BalanceChange::Set(balance, out) => {
                    account.set_balance(balance);
                    Ok(out)
                }
                BalanceChange::Keep(out) => Ok(out),
            })?
            .ok_or_else(|| StoreError::account_not_found(user_id.to_string()))
    }

    fn update_cas<T, F>(&self, user_id: UserId, plan: F) -> StoreResult<T>
    where
        F: Fn(Credits) -> StoreResult<BalanceChange<T>>,
    {
        let attempts = self.retry.max_attempts();
        for attempt in 0..attempts {
            let seen = self
                .table
                .get(user_id)?
                .ok_or_else(|| StoreError::account_not_found(user_id.to_string()))?;

            let (balance, out) = match plan(seen.balance)? {
                BalanceChange::Keep(out) => return Ok(out),
                BalanceChange::Set(balance, out) => (balance, out),
            };

            let swapped = self
                .table
                .transact(user_id, |account| {
                    if account.version != seen.version {
                        return Ok(false);
                    }
                    account.set_balance(balance);
                    Ok(true)
                })?
                .ok_or_else(|| StoreError::account_not_found(user_id.to_string()))?;

            if swapped {
                return Ok(out);
            }

            debug!(user_id = %user_id, attempt = attempt + 1, "Balance version conflict");
            if attempt + 1 < attempts {
                thread::sleep(self.retry.backoff(attempt));
            }
        }

        warn!(user_id = %user_id, attempts, "Balance retries exhausted");
        Err(StoreError::ConcurrencyConflict { attempts })
    }
}

impl Ledger for AccountRepository {
    fn balance(&self, user_id: UserId) -> StoreResult<Credits> {
        self.get(user_id)?
            .map(|a| a.balance)
            .ok_or_else(|| StoreError::account_not_found(user_id.to_string()))
    }

    fn reserve(&self, user_id: UserId, amount: Credits) -> StoreResult<ReserveOutcome> {
        self.update_balance(user_id, |balance| {
            Ok(match balance.checked_sub(amount) {
                Some(remaining) => BalanceChange::Set(
                    remaining,
                    ReserveOutcome::Reserved(Reservation {
                        user_id,
                        amount,
                        remaining,
                    }),
                ),
                None => BalanceChange::Keep(ReserveOutcome::Denied {
                    required: amount,
                    available: balance,
                }),
            })
        })
    }

    fn release(&self, reservation: &Reservation) -> StoreResult<Credits> {
        self.credit(reservation.user_id, reservation.amount)
    }

    fn credit(&self, user_id: UserId, amount: Credits) -> StoreResult<Credits> {
        self.update_balance(user_id, |balance| {
            let next = balance.checked_add(amount).ok_or_else(|| {
                StoreError::Validation(format!(
                    "crediting {} would overflow balance {}",
                    amount, balance
                ))
            })?;
            Ok(BalanceChange::Set(next, next))
        })
    }
}

/// Releases a reservation unless it is confirmed
///
/// Dropping the guard without calling [`confirm`](Self::confirm) gives the
/// funds back, so an early return or a panic between reserving and
/// committing cannot strand credits.
pub struct ReservationGuard<'a> {
    ledger: &'a dyn Ledger,
    reservation: Reservation,
    armed: bool,
}

impl<'a> ReservationGuard<'a> {
    pub fn new(ledger: &'a dyn Ledger, reservation: Reservation) -> Self {
        Self {
            ledger,
            reservation,
            armed: true,
        }
    }

    pub fn reservation(&self) -> &Reservation {
        &self.reservation
    }

    /// Keep the funds taken; the guard will not release them
    pub fn confirm(mut self) -> Reservation {
        self.armed = false;
        self.reservation.clone()
    }

    /// Give the funds back now, reporting failure to the caller
    pub fn release(mut self) -> StoreResult<Credits> {
        self.armed = false;
        self.ledger.release(&self.reservation)
    }
}

impl Drop for ReservationGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match self.ledger.release(&self.reservation) {
            Ok(balance) => warn!(
                user_id = %self.reservation.user_id,
                amount = %self.reservation.amount,
                %balance,
                "Reservation released on drop"
            ),
            Err(e) => error!(
                user_id = %self.reservation.user_id,
                amount = %self.reservation.amount,
                error = %e,
                "Failed to release reservation"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::RetryPolicy;
    use crate::models::Account;

    fn repo_with(strategy: LedgerStrategy, balance: u64) -> (AccountRepository, UserId) {
        let repo = AccountRepository::new(strategy, RetryPolicy::default());
        let user_id = UserId::new();
        repo.insert(Account::with_balance(user_id, Credits::new(balance)))
            .unwrap();
        (repo, user_id)
    }

    fn both() -> [LedgerStrategy; 2] {
        [LedgerStrategy::Pessimistic, LedgerStrategy::Optimistic]
    }

    #[test]
    fn test_reserve_exact_balance() {
        for strategy in both() {
            let (repo, user) = repo_with(strategy, 500);
            let outcome = repo.reserve(user, Credits::new(500)).unwrap();
            match outcome {
                ReserveOutcome::Reserved(r) => assert_eq!(r.remaining, Credits::zero()),
                other => panic!("expected reservation, got {:?}", other),
            }
            assert_eq!(repo.balance(user).unwrap(), Credits::zero());
        }
    }

    #[test]
    fn test_denied_leaves_balance() {
        for strategy in both() {
            let (repo, user) = repo_with(strategy, 499);
            let outcome = repo.reserve(user, Credits::new(500)).unwrap();
            assert_eq!(
                outcome,
                ReserveOutcome::Denied {
                    required: Credits::new(500),
                    available: Credits::new(499),
                }
            );
            let account = repo.get(user).unwrap().unwrap();
            assert_eq!(account.balance, Credits::new(499));
            assert_eq!(account.version, 0);
        }
    }

    #[test]
    fn test_release_restores_exact_amount() {
        for strategy in both() {
            let (repo, user) = repo_with(strategy, 800);
            let ReserveOutcome::Reserved(r) = repo.reserve(user, Credits::new(300)).unwrap() else {
                panic!("expected reservation");
            };
            assert_eq!(repo.release(&r).unwrap(), Credits::new(800));
        }
    }

    #[test]
    fn test_unknown_account() {
        for strategy in both() {
            let (repo, _) = repo_with(strategy, 1);
            let err = repo.reserve(UserId::new(), Credits::new(1)).unwrap_err();
            assert!(err.is_not_found());
        }
    }

    #[test]
    fn test_credit_overflow_is_rejected() {
        let (repo, user) = repo_with(LedgerStrategy::Pessimistic, u64::MAX);
        let err = repo.credit(user, Credits::new(1)).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(repo.balance(user).unwrap(), Credits::new(u64::MAX));
    }

    #[test]
    fn test_optimistic_gives_up_after_retries() {
        let repo = AccountRepository::new(
            LedgerStrategy::Optimistic,
            RetryPolicy {
                max_retries: 2,
                base_backoff_ms: 0,
                max_backoff_ms: 0,
            },
        );
        let user = UserId::new();
        repo.insert(Account::with_balance(user, Credits::new(100)))
            .unwrap();

        // Every plan evaluation races with a write that bumps the version.
        let err = repo
            .update_balance(user, |balance| {
                repo.table
                    .transact(user, |account| {
                        account.set_balance(account.balance);
                        Ok(())
                    })
                    .unwrap();
                Ok(BalanceChange::Set(balance, ()))
            })
            .unwrap_err();

        assert!(matches!(err, StoreError::ConcurrencyConflict { attempts: 3 }));
        assert_eq!(repo.balance(user).unwrap(), Credits::new(100));
    }

    #[test]
    fn test_concurrent_reserves_are_linearizable() {
        for strategy in both() {
            let repo = AccountRepository::new(
                strategy,
                RetryPolicy {
                    max_retries: 1_000,
                    base_backoff_ms: 0,
                    max_backoff_ms: 1,
                },
            );
            let user = UserId::new();
            repo.insert(Account::with_balance(user, Credits::new(1_000)))
                .unwrap();

            let reserved: u64 = std::thread::scope(|s| {
                let handles: Vec<_> = (0..32)
                    .map(|_| {
                        s.spawn(|| match repo.reserve(user, Credits::new(70)).unwrap() {
                            ReserveOutcome::Reserved(r) => r.amount.amount(),
                            ReserveOutcome::Denied { .. } => 0,
                        })
                    })
                    .collect();
                handles.into_iter().map(|h| h.join().unwrap()).sum()
            });

            // 1000 / 70 = 14 reservations fit.
            assert_eq!(reserved, 14 * 70);
            assert_eq!(
                repo.balance(user).unwrap(),
                Credits::new(1_000 - reserved)
            );
        }
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let (repo, user) = repo_with(LedgerStrategy::Pessimistic, 100);
        let ReserveOutcome::Reserved(r) = repo.reserve(user, Credits::new(60)).unwrap() else {
            panic!("expected reservation");
        };
        {
            let _guard = ReservationGuard::new(&repo, r);
            assert_eq!(repo.balance(user).unwrap(), Credits::new(40));
        }
        assert_eq!(repo.balance(user).unwrap(), Credits::new(100));
    }

    #[test]
    fn test_guard_confirm_keeps_funds() {
        let (repo, user) = repo_with(LedgerStrategy::Pessimistic, 100);
        let ReserveOutcome::Reserved(r) = repo.reserve(user, Credits::new(60)).unwrap() else {
            panic!("expected reservation");
        };
        let guard = ReservationGuard::new(&repo, r);
        let confirmed = guard.confirm();
        assert_eq!(confirmed.remaining, Credits::new(40));
        assert_eq!(repo.balance(user).unwrap(), Credits::new(40));
    }
}
