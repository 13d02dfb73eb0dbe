//! Store catalog
//!
//! The catalog defines what can be bought and how far each resource may be
//! raised. It is read from `catalog.yaml`:
//!
//! ```yaml
//! resources:
//!   memory: 16384
//! items:
//!   - id: memory-1g
//!     name: 1 GiB memory
//!     price: 500
//!     effect:
//!       kind: increment_quota
//!       resource: memory
//!       amount: 1024
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::models::{Credits, PurchaseItem, ResourceKind};
use crate::storage::file_io::{read_yaml, write_yaml_atomic};

/// Read-only source of store configuration
pub trait ConfigProvider: Send + Sync {
    /// Look up an item by id
    fn get_item(&self, item_id: &str) -> Option<PurchaseItem>;

    /// Configured ceiling for a resource
    fn get_max(&self, resource: ResourceKind) -> u64;
}

/// Item catalog and resource ceilings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Resources without an entry have a ceiling of zero
    #[serde(default)]
    pub resources: BTreeMap<ResourceKind, u64>,

    #[serde(default)]
    pub items: Vec<PurchaseItem>,
}

impl Catalog {
    /// Load and validate a catalog file
    pub fn load(path: impl AsRef<Path>) -> StoreResult<Self> {
        let catalog: Catalog = read_yaml(path)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Parse and validate catalog YAML
    pub fn from_yaml(yaml: &str) -> StoreResult<Self> {
        let catalog: Catalog = serde_yaml::from_str(yaml)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Save the catalog
    pub fn save(&self, path: impl AsRef<Path>) -> StoreResult<()> {
        write_yaml_atomic(path, self)
    }

    /// Check item ids are unique and every item adds something
    pub fn validate(&self) -> StoreResult<()> {
        let mut seen = HashSet::new();
        for item in &self.items {
            item.validate().map_err(StoreError::Config)?;
            if !seen.insert(item.id.as_str()) {
                return Err(StoreError::Config(format!(
                    "duplicate item id '{}'",
                    item.id
                )));
            }
        }
        Ok(())
    }

    /// Starter catalog written by `init`
    pub fn default_catalog() -> Self {
        let resources = BTreeMap::from([
            (ResourceKind::Memory, 16_384),
            (ResourceKind::Disk, 102_400),
            (ResourceKind::Cpu, 400),
            (ResourceKind::Servers, 5),
            (ResourceKind::Databases, 10),
            (ResourceKind::Backups, 10),
            (ResourceKind::Allocations, 10),
        ]);

        let named = |id: &str, name: &str, price: u64, resource, amount| {
            let mut item = PurchaseItem::quota(id, Credits::new(price), resource, amount);
            item.name = name.to_string();
            item
        };

        let items = vec![
            named("memory-1g", "1 GiB memory", 500, ResourceKind::Memory, 1024),
            named("disk-5g", "5 GiB disk", 300, ResourceKind::Disk, 5120),
            named("cpu-50", "50% CPU", 400, ResourceKind::Cpu, 50),
            named("server-slot", "Server slot", 1000, ResourceKind::Servers, 1),
            named("database-slot", "Database slot", 200, ResourceKind::Databases, 1),
            named("backup-slot", "Backup slot", 150, ResourceKind::Backups, 1),
            named("allocation-slot", "Extra port", 100, ResourceKind::Allocations, 1),
        ];

        Self { resources, items }
    }
}

impl ConfigProvider for Catalog {
    fn get_item(&self, item_id: &str) -> Option<PurchaseItem> {
        self.items.iter().find(|i| i.id == item_id).cloned()
    }

    fn get_max(&self, resource: ResourceKind) -> u64 {
        self.resources.get(&resource).copied().unwrap_or(0)
    }
}
