//! Account model
//!
//! A user's spendable credit balance. Only the ledger writes `balance` and
//! `version`; everything else reads copies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::credits::Credits;
use super::ids::UserId;

/// A user's credit account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Owning user
    pub user_id: UserId,

    /// Spendable credits, never negative
    pub balance: Credits,

    /// Bumped on every balance write
    #[serde(default)]
    pub version: u64,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the balance last changed
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account with a zero balance
    pub fn new(user_id: UserId) -> Self {
        Self::with_balance(user_id, Credits::zero())
    }

    /// Create a new account with an opening balance
    pub fn with_balance(user_id: UserId, balance: Credits) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            balance,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the balance, bumping the version
    pub(crate) fn set_balance(&mut self, balance: Credits) {
        self.balance = balance;
        self.version += 1;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_account() {
        let account = Account::new(UserId::new());
        assert!(account.balance.is_zero());
        assert_eq!(account.version, 0);
    }

    #[test]
    fn test_set_balance_bumps_version() {
        let mut account = Account::with_balance(UserId::new(), Credits::new(100));
        account.set_balance(Credits::new(40));
        account.set_balance(Credits::new(90));
        assert_eq!(account.balance, Credits::new(90));
        assert_eq!(account.version, 2);
    }
}
