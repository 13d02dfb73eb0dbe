//! Account repository
//!
//! Holds credit accounts keyed by user. Balance changes go through the
//! ledger (see `services::ledger`); this repository only creates, reads and
//! deletes rows.

use crate::config::settings::{LedgerStrategy, RetryPolicy};
use crate::error::StoreResult;
use crate::models::{Account, UserId};

use super::table::RowTable;

/// Repository for credit accounts
pub struct AccountRepository {
    pub(crate) table: RowTable<UserId, Account>,
    pub(crate) strategy: LedgerStrategy,
    pub(crate) retry: RetryPolicy,
}

impl AccountRepository {
    /// Create an empty repository
    pub fn new(strategy: LedgerStrategy, retry: RetryPolicy) -> Self {
        Self {
            table: RowTable::new("accounts"),
            strategy,
            retry,
        }
    }

    /// Replace contents with previously persisted accounts
    pub fn load(&self, accounts: Vec<Account>) -> StoreResult<()> {
        self.table
            .load(accounts.into_iter().map(|a| (a.user_id, a)))
    }

    /// Which ledger strategy balance writes use
    pub fn strategy(&self) -> LedgerStrategy {
        self.strategy
    }

    /// Get an account by user
    pub fn get(&self, user_id: UserId) -> StoreResult<Option<Account>> {
        self.table.get(user_id)
    }

    /// Insert a new account; returns `false` if the user already has one
    pub fn insert(&self, account: Account) -> StoreResult<bool> {
        self.table.insert_new(account.user_id, account)
    }

    /// Delete an account
    pub fn delete(&self, user_id: UserId) -> StoreResult<Option<Account>> {
        self.table.remove(user_id)
    }

    /// Check if a user has an account
    pub fn exists(&self, user_id: UserId) -> StoreResult<bool> {
        self.table.contains(user_id)
    }

    /// All accounts, oldest first
    pub fn get_all(&self) -> StoreResult<Vec<Account>> {
        let mut accounts = self.table.snapshot()?;
        accounts.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then(a.user_id.as_uuid().cmp(b.user_id.as_uuid()))
        });
        Ok(accounts)
    }

    /// Count accounts
    pub fn count(&self) -> StoreResult<usize> {
        self.table.len()
    }
}
