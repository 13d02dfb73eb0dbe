//! Account service
//!
//! Opens and closes credit accounts and grants credits. Balance arithmetic
//! goes through the ledger so that grants serialize with purchases.

use tracing::{error, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::events::{DomainEvent, EventSink};
use crate::models::{Account, Credits, Quota, UserId};
use crate::storage::{Persistence, Storage};

use super::ledger::{Ledger, ReserveOutcome};

/// An account together with the quotas it has bought
#[derive(Debug, Clone)]
pub struct AccountSummary {
    pub account: Account,
    pub quotas: Vec<Quota>,
}

/// Service for account management
pub struct AccountService<'a> {
    storage: &'a Storage,
    events: &'a dyn EventSink,
}

impl<'a> AccountService<'a> {
    /// Create a new account service
    pub fn new(storage: &'a Storage, events: &'a dyn EventSink) -> Self {
        Self { storage, events }
    }

    /// Open an account for a new user with an opening balance
    pub fn create(&self, balance: Credits) -> StoreResult<Account> {
        self.create_for(UserId::new(), balance)
    }

    /// Open an account for a given user
    pub fn create_for(&self, user_id: UserId, balance: Credits) -> StoreResult<Account> {
        let account = Account::with_balance(user_id, balance);
        if !self.storage.accounts.insert(account.clone())? {
            return Err(StoreError::Duplicate {
                entity_type: "Account",
                identifier: user_id.to_string(),
            });
        }
        self.storage.commit()?;

        info!(user_id = %user_id, %balance, "Account created");
        self.events.emit(&DomainEvent::AccountCreated { user_id, balance });
        Ok(account)
    }

    /// Get an account by user
    pub fn get(&self, user_id: UserId) -> StoreResult<Option<Account>> {
        self.storage.accounts.get(user_id)
    }

    /// Get an account and its quotas
    pub fn summary(&self, user_id: UserId) -> StoreResult<AccountSummary> {
        let account = self
            .storage
            .accounts
            .get(user_id)?
            .ok_or_else(|| StoreError::account_not_found(user_id.to_string()))?;
        let quotas = self.storage.quotas.for_user(user_id)?;
        Ok(AccountSummary { account, quotas })
    }

    /// All accounts, oldest first
    pub fn list(&self) -> StoreResult<Vec<Account>> {
        self.storage.accounts.get_all()
    }

    /// Add credits to an account
    pub fn grant(&self, user_id: UserId, amount: Credits) -> StoreResult<Credits> {
        if amount.is_zero() {
            return Err(StoreError::Validation(
                "grant amount must be positive".into(),
            ));
        }

        let balance = self.storage.accounts.credit(user_id, amount)?;
        if let Err(e) = self.storage.commit() {
            warn!(user_id = %user_id, %amount, error = %e, "Commit failed, undoing grant");
            self.undo_credit(user_id, amount)?;
            return Err(e);
        }

        info!(user_id = %user_id, %amount, %balance, "Credits granted");
        self.events.emit(&DomainEvent::CreditsGranted {
            user_id,
            amount,
            balance,
        });
        Ok(balance)
    }

    /// Take back an in-memory credit that never reached disk
    fn undo_credit(&self, user_id: UserId, amount: Credits) -> StoreResult<()> {
        match self.storage.accounts.reserve(user_id, amount)? {
            ReserveOutcome::Reserved(_) => Ok(()),
            ReserveOutcome::Denied {
                required,
                available,
            } => {
                error!(
                    user_id = %user_id,
                    %required,
                    %available,
                    "Grant could not be undone, credits already spent"
                );
                Err(StoreError::Persistence(format!(
                    "grant of {} to {} was not saved and could not be undone ({} left)",
                    required, user_id, available
                )))
            }
        }
    }

    /// Close an account, dropping its quotas
    pub fn delete(&self, user_id: UserId) -> StoreResult<Account> {
        let (account, quotas) = {
            let _mutation = self.storage.begin_mutation()?;
            let account = self
                .storage
                .accounts
                .delete(user_id)?
                .ok_or_else(|| StoreError::account_not_found(user_id.to_string()))?;
            let quotas = self.storage.quotas.for_user(user_id)?;
            self.storage.quotas.delete_user(user_id)?;
            (account, quotas)
        };

        if let Err(e) = self.storage.commit() {
            warn!(user_id = %user_id, error = %e, "Commit failed, restoring account");
            let _mutation = self.storage.begin_mutation()?;
            if !self.storage.accounts.insert(account)? {
                warn!(user_id = %user_id, "Account was recreated before it could be restored");
            }
            self.storage.quotas.restore(quotas)?;
            return Err(e);
        }

        let quotas = quotas.len();
        info!(user_id = %user_id, quotas, "Account deleted");
        self.events.emit(&DomainEvent::AccountDeleted {
            user_id,
            balance: account.balance,
        });
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::StorePaths;
    use crate::events::{NullSink, RecordingSink};
    use crate::models::{QuotaKey, ResourceKind};
    use crate::services::quota::QuotaStore;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = StorePaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        (temp_dir, storage)
    }

    /// Make every following commit fail by putting a directory where the
    /// state file goes
    fn block_commits(storage: &Storage) -> std::path::PathBuf {
        let state = storage.paths().state_file();
        let _ = fs::remove_file(&state);
        fs::create_dir_all(state.join("occupied")).unwrap();
        state
    }

    #[test]
    fn test_create_and_get() {
        let (_temp_dir, storage) = create_test_storage();
        let sink = RecordingSink::new();
        let service = AccountService::new(&storage, &sink);

        let account = service.create(Credits::new(100)).unwrap();

        let fetched = service.get(account.user_id).unwrap().unwrap();
        assert_eq!(fetched.balance, Credits::new(100));
        assert!(storage.is_initialized());
        assert_eq!(
            sink.events(),
            vec![DomainEvent::AccountCreated {
                user_id: account.user_id,
                balance: Credits::new(100),
            }]
        );
    }

    #[test]
    fn test_create_duplicate() {
        let (_temp_dir, storage) = create_test_storage();
        let service = AccountService::new(&storage, &NullSink);
        let user = UserId::new();

        service.create_for(user, Credits::zero()).unwrap();
        let err = service.create_for(user, Credits::new(5)).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { .. }));
        assert_eq!(service.list().unwrap().len(), 1);
    }

    #[test]
    fn test_grant() {
        let (_temp_dir, storage) = create_test_storage();
        let service = AccountService::new(&storage, &NullSink);
        let account = service.create(Credits::new(10)).unwrap();

        assert_eq!(
            service.grant(account.user_id, Credits::new(15)).unwrap(),
            Credits::new(25)
        );
        assert!(service
            .grant(account.user_id, Credits::zero())
            .unwrap_err()
            .is_validation());
        assert!(service
            .grant(UserId::new(), Credits::new(1))
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_delete_drops_quotas() {
        let (_temp_dir, storage) = create_test_storage();
        let service = AccountService::new(&storage, &NullSink);
        let account = service.create(Credits::new(10)).unwrap();
        let key = QuotaKey::new(account.user_id, ResourceKind::Servers);
        QuotaStore::increment(&storage.quotas, key, 1, 5).unwrap();

        assert_eq!(service.summary(account.user_id).unwrap().quotas.len(), 1);
        let deleted = service.delete(account.user_id).unwrap();

        assert_eq!(deleted.balance, Credits::new(10));
        assert!(service.get(account.user_id).unwrap().is_none());
        assert_eq!(storage.quotas.current(key).unwrap(), 0);
        assert!(service.delete(account.user_id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_grant_rolled_back_when_commit_fails() {
        let (_temp_dir, storage) = create_test_storage();
        let sink = RecordingSink::new();
        let service = AccountService::new(&storage, &sink);
        let account = service.create(Credits::new(10)).unwrap();
        let state = block_commits(&storage);

        assert!(service.grant(account.user_id, Credits::new(15)).is_err());
        assert_eq!(
            storage.accounts.balance(account.user_id).unwrap(),
            Credits::new(10)
        );
        // Only the creation event.
        assert_eq!(sink.events().len(), 1);

        fs::remove_dir_all(&state).unwrap();
        assert_eq!(
            service.grant(account.user_id, Credits::new(15)).unwrap(),
            Credits::new(25)
        );
    }

    #[test]
    fn test_undo_of_spent_credit_is_an_error() {
        let (_temp_dir, storage) = create_test_storage();
        let service = AccountService::new(&storage, &NullSink);
        let account = service.create(Credits::new(10)).unwrap();

        let err = service
            .undo_credit(account.user_id, Credits::new(50))
            .unwrap_err();

        assert!(matches!(err, StoreError::Persistence(_)));
        assert_eq!(
            storage.accounts.balance(account.user_id).unwrap(),
            Credits::new(10)
        );
        service
            .undo_credit(account.user_id, Credits::new(4))
            .unwrap();
        assert_eq!(
            storage.accounts.balance(account.user_id).unwrap(),
            Credits::new(6)
        );
    }

    #[test]
    fn test_delete_restored_when_commit_fails() {
        let (_temp_dir, storage) = create_test_storage();
        let service = AccountService::new(&storage, &NullSink);
        let account = service.create(Credits::new(10)).unwrap();
        let key = QuotaKey::new(account.user_id, ResourceKind::Servers);
        QuotaStore::increment(&storage.quotas, key, 2, 5).unwrap();
        let state = block_commits(&storage);

        assert!(service.delete(account.user_id).is_err());

        let summary = service.summary(account.user_id).unwrap();
        assert_eq!(summary.account.balance, Credits::new(10));
        assert_eq!(storage.quotas.current(key).unwrap(), 2);

        fs::remove_dir_all(&state).unwrap();
        service.delete(account.user_id).unwrap();
        assert!(service.get(account.user_id).unwrap().is_none());
    }
}
