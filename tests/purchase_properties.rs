//! Whole-store properties under concurrent use
//!
//! Credits are conserved, quotas never pass their ceiling, and a report is
//! only ever resolved once its artifact is gone.

use std::collections::BTreeMap;
use std::fs;

use credit_store::config::catalog::Catalog;
use credit_store::config::paths::StorePaths;
use credit_store::config::settings::{LedgerStrategy, RetryPolicy, Settings};
use credit_store::events::NullSink;
use credit_store::models::{Credits, PurchaseItem, QuotaKey, ReportStatus, ResourceKind};
use credit_store::services::{AccountService, PurchaseService, ReportService};
use credit_store::storage::{FsArtifactStore, Storage};
use credit_store::StoreError;
use tempfile::TempDir;

fn catalog() -> Catalog {
    Catalog {
        resources: BTreeMap::from([(ResourceKind::Memory, 8 * 1024), (ResourceKind::Servers, 3)]),
        items: vec![
            PurchaseItem::quota("memory-1g", Credits::new(70), ResourceKind::Memory, 1024),
            PurchaseItem::quota("server-slot", Credits::new(110), ResourceKind::Servers, 1),
        ],
    }
}

fn storage(temp_dir: &TempDir, strategy: LedgerStrategy) -> Storage {
    let paths = StorePaths::with_base_dir(temp_dir.path().to_path_buf());
    let settings = Settings {
        ledger_strategy: strategy,
        retry: RetryPolicy {
            max_retries: 64,
            ..RetryPolicy::default()
        },
        ..Settings::default()
    };
    Storage::with_settings(paths, &settings).unwrap()
}

fn run_concurrent_purchases(strategy: LedgerStrategy) {
    let temp_dir = TempDir::new().unwrap();
    let storage = storage(&temp_dir, strategy);
    let catalog = catalog();
    let accounts = AccountService::new(&storage, &NullSink);
    let user = accounts.create(Credits::new(1000)).unwrap().user_id;
    let service = PurchaseService::new(&storage, &catalog, &NullSink);

    let spent: u64 = std::thread::scope(|s| {
        let handles: Vec<_> = (0..24)
            .map(|i| {
                let item = if i % 3 == 0 { "server-slot" } else { "memory-1g" };
                let service = &service;
                s.spawn(move || match service.purchase(user, item) {
                    Ok(receipt) => receipt.price.amount(),
                    Err(StoreError::InsufficientBalance { .. })
                    | Err(StoreError::ResourceLimitExceeded { .. })
                    | Err(StoreError::ConcurrencyConflict { .. }) => 0,
                    Err(e) => panic!("unexpected error {}", e),
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).sum()
    });

    let balance = accounts.get(user).unwrap().unwrap().balance;
    assert_eq!(balance.amount() + spent, 1000);

    let memory = storage
        .quotas
        .current(QuotaKey::new(user, ResourceKind::Memory))
        .unwrap();
    let servers = storage
        .quotas
        .current(QuotaKey::new(user, ResourceKind::Servers))
        .unwrap();
    assert!(memory <= 8 * 1024);
    assert!(servers <= 3);
    // Every credit spent bought exactly one quota step.
    assert_eq!(spent, memory / 1024 * 70 + servers * 110);

    // What is on disk matches memory.
    let reloaded = Storage::new(StorePaths::with_base_dir(temp_dir.path().to_path_buf())).unwrap();
    reloaded.load_all().unwrap();
    assert_eq!(reloaded.accounts.get(user).unwrap().unwrap().balance, balance);
}

#[test]
fn concurrent_purchases_conserve_credits_pessimistic() {
    run_concurrent_purchases(LedgerStrategy::Pessimistic);
}

#[test]
fn concurrent_purchases_conserve_credits_optimistic() {
    run_concurrent_purchases(LedgerStrategy::Optimistic);
}

#[test]
fn users_do_not_affect_each_other() {
    let temp_dir = TempDir::new().unwrap();
    let storage = storage(&temp_dir, LedgerStrategy::Pessimistic);
    let catalog = catalog();
    let accounts = AccountService::new(&storage, &NullSink);
    let rich = accounts.create(Credits::new(10_000)).unwrap().user_id;
    let poor = accounts.create(Credits::new(10)).unwrap().user_id;
    let service = PurchaseService::new(&storage, &catalog, &NullSink);

    service.purchase(rich, "server-slot").unwrap();
    assert!(service.purchase(poor, "server-slot").is_err());

    assert_eq!(
        storage
            .quotas
            .current(QuotaKey::new(poor, ResourceKind::Servers))
            .unwrap(),
        0
    );
    let account = accounts.get(poor).unwrap().unwrap();
    assert_eq!(account.balance, Credits::new(10));
    assert_eq!(account.version, 0);
}

#[test]
fn resolved_reports_have_no_artifact() {
    let temp_dir = TempDir::new().unwrap();
    let storage = storage(&temp_dir, LedgerStrategy::Pessimistic);
    let artifacts = FsArtifactStore::new(storage.paths().artifacts_dir());
    let reporter = AccountService::new(&storage, &NullSink)
        .create(Credits::zero())
        .unwrap()
        .user_id;
    let reports = ReportService::new(&storage, &artifacts, &NullSink);

    let dir = storage.paths().artifacts_dir();
    let mut ids = Vec::new();
    for i in 0..6 {
        let name = format!("file-{}.bin", i);
        fs::write(dir.join(&name), b"x").unwrap();
        ids.push(
            reports
                .file(reporter, "abuse", Some(name.into()))
                .unwrap()
                .id,
        );
    }

    std::thread::scope(|s| {
        for (i, id) in ids.iter().enumerate() {
            let reports = &reports;
            s.spawn(move || {
                if i % 2 == 0 {
                    reports.resolve(*id, "mod", None).unwrap();
                } else {
                    reports.dismiss(*id, "mod", None).unwrap();
                }
            });
        }
    });

    for report in reports.list(None).unwrap() {
        let path = dir.join(report.artifact.as_ref().unwrap());
        match report.status {
            ReportStatus::Resolved => assert!(!path.exists()),
            ReportStatus::Dismissed => assert!(path.exists()),
            other => panic!("unexpected status {}", other),
        }
    }
}
