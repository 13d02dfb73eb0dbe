//! Quota repository
//!
//! One row per (user, resource). A missing row reads as zero; rows are
//! created lazily the first time a quota is raised.

use crate::error::StoreResult;
use crate::models::{Quota, QuotaKey, UserId};

use super::table::RowTable;

/// Repository for quota counters
pub struct QuotaRepository {
    pub(crate) table: RowTable<QuotaKey, Quota>,
}

impl QuotaRepository {
    pub fn new() -> Self {
        Self {
            table: RowTable::new("quotas"),
        }
    }

    /// Replace contents with previously persisted quotas
    pub fn load(&self, quotas: Vec<Quota>) -> StoreResult<()> {
        self.table.load(quotas.into_iter().map(|q| (q.key(), q)))
    }

    /// Current value of a quota, zero if never raised
    pub fn current(&self, key: QuotaKey) -> StoreResult<u64> {
        Ok(self.table.get(key)?.map(|q| q.current).unwrap_or(0))
    }

    /// All quotas held by a user, in resource order
    pub fn for_user(&self, user_id: UserId) -> StoreResult<Vec<Quota>> {
        let mut quotas: Vec<Quota> = self
            .table
            .snapshot()?
            .into_iter()
            .filter(|q| q.user_id == user_id)
            .collect();
        quotas.sort_by_key(|q| q.resource);
        Ok(quotas)
    }

    /// Drop every quota row of a user
    pub fn delete_user(&self, user_id: UserId) -> StoreResult<usize> {
        let keys = self.table.keys_where(|k| k.user_id == user_id)?;
        let mut removed = 0;
        for key in keys {
            if self.table.remove(key)?.is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Put back rows taken out by `delete_user`; rows present again are left alone
    pub fn restore(&self, quotas: Vec<Quota>) -> StoreResult<usize> {
        let mut restored = 0;
        for quota in quotas {
            if self.table.insert_new(quota.key(), quota)? {
                restored += 1;
            }
        }
        Ok(restored)
    }

    /// All quota rows
    pub fn get_all(&self) -> StoreResult<Vec<Quota>> {
        self.table.snapshot()
    }
}

impl Default for QuotaRepository {
    fn default() -> Self {
        Self::new()
    }
}
