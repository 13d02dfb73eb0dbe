//! Storage layer for the credit store
//!
//! Accounts, quotas and reports live in in-memory row tables with per-row
//! locks. [`Storage::commit`] writes all three to a single JSON snapshot, so
//! a ledger debit and the quota increment it paid for reach disk together.

pub mod accounts;
pub mod artifacts;
pub mod file_io;
pub mod init;
pub mod quotas;
pub mod reports;
pub mod table;

pub use accounts::AccountRepository;
pub use artifacts::{ArtifactStore, DeletionReport, FileOutcome, FsArtifactStore};
pub use file_io::{read_json, write_json_atomic};
pub use init::initialize_storage;
pub use quotas::QuotaRepository;
pub use reports::ReportRepository;
pub use table::RowTable;

use std::sync::{Mutex, RwLock, RwLockReadGuard};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::paths::StorePaths;
use crate::config::settings::Settings;
use crate::error::{StoreError, StoreResult};
use crate::models::{Account, Quota, Report};

/// Current snapshot layout version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Everything persisted to `state.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateSnapshot {
    #[serde(default)]
    pub schema_version: u32,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub quotas: Vec<Quota>,
    #[serde(default)]
    pub reports: Vec<Report>,
}

/// Held while a change spanning several rows is in progress
///
/// Snapshots wait until every outstanding guard is dropped, so a commit
/// never records half of such a change.
pub struct MutationGuard<'a> {
    _shared: Option<RwLockReadGuard<'a, ()>>,
}

impl MutationGuard<'_> {
    /// A guard that blocks nothing
    pub fn detached() -> Self {
        Self { _shared: None }
    }
}

/// Makes in-memory changes durable
pub trait Persistence: Send + Sync {
    /// Mark the start of a multi-row change
    ///
    /// The guard must be dropped before calling [`commit`](Self::commit).
    fn begin_mutation(&self) -> StoreResult<MutationGuard<'_>> {
        Ok(MutationGuard::detached())
    }

    fn commit(&self) -> StoreResult<()>;
}

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: StorePaths,
    pub accounts: AccountRepository,
    pub quotas: QuotaRepository,
    pub reports: ReportRepository,
    flush: Mutex<()>,
    mutations: RwLock<()>,
}

impl Storage {
    /// Create a new Storage instance with default settings
    pub fn new(paths: StorePaths) -> StoreResult<Self> {
        Self::with_settings(paths, &Settings::default())
    }

    /// Create a new Storage instance
    pub fn with_settings(paths: StorePaths, settings: &Settings) -> StoreResult<Self> {
        paths.ensure_directories()?;

        Ok(Self {
            accounts: AccountRepository::new(settings.ledger_strategy, settings.retry.clone()),
            quotas: QuotaRepository::new(),
            reports: ReportRepository::new(),
            flush: Mutex::new(()),
            mutations: RwLock::new(()),
            paths,
        })
    }

    /// Get the paths configuration
    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    /// Load all data from disk
    pub fn load_all(&self) -> StoreResult<()> {
        let snapshot: StateSnapshot = read_json(self.paths.state_file())?;
        if snapshot.schema_version > SNAPSHOT_VERSION {
            return Err(StoreError::Persistence(format!(
                "state file version {} is newer than supported version {}",
                snapshot.schema_version, SNAPSHOT_VERSION
            )));
        }

        debug!(
            accounts = snapshot.accounts.len(),
            quotas = snapshot.quotas.len(),
            reports = snapshot.reports.len(),
            "Loaded state"
        );
        self.accounts.load(snapshot.accounts)?;
        self.quotas.load(snapshot.quotas)?;
        self.reports.load(snapshot.reports)?;
        Ok(())
    }

    /// Copy every table into one snapshot
    pub fn snapshot(&self) -> StoreResult<StateSnapshot> {
        Ok(StateSnapshot {
            schema_version: SNAPSHOT_VERSION,
            accounts: self.accounts.get_all()?,
            quotas: self.quotas.get_all()?,
            reports: self.reports.get_all()?,
        })
    }

    /// Check if storage has been initialized
    pub fn is_initialized(&self) -> bool {
        self.paths.state_file().exists()
    }
}

impl Persistence for Storage {
    fn begin_mutation(&self) -> StoreResult<MutationGuard<'_>> {
        let shared = self
            .mutations
            .read()
            .map_err(|_| StoreError::lock_poisoned("mutations"))?;
        Ok(MutationGuard {
            _shared: Some(shared),
        })
    }

    /// Write the current state to disk
    ///
    /// Must not be called while holding a row lock or a [`MutationGuard`]:
    /// the snapshot waits for open mutations and locks every row in turn.
    fn commit(&self) -> StoreResult<()> {
        let _flush = self
            .flush
            .lock()
            .map_err(|_| StoreError::lock_poisoned("flush"))?;

        let snapshot = {
            let _quiet = self
                .mutations
                .write()
                .map_err(|_| StoreError::lock_poisoned("mutations"))?;
            self.snapshot()?
        };
        write_json_atomic(self.paths.state_file(), &snapshot)
    }
}
