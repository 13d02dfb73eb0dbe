//! Quota model
//!
//! Per-user, per-resource counters raised by store purchases. The ceiling for
//! each resource comes from the catalog, not from the row.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::UserId;

/// Kinds of hosting resources a user can buy more of
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Memory limit, in MiB
    Memory,
    /// Disk limit, in MiB
    Disk,
    /// CPU limit, in percent of one core
    Cpu,
    /// Number of servers
    Servers,
    /// Number of databases
    Databases,
    /// Number of backups
    Backups,
    /// Number of port allocations
    Allocations,
}

impl ResourceKind {
    /// All resource kinds, in display order
    pub fn all() -> &'static [ResourceKind] {
        &[
            Self::Memory,
            Self::Disk,
            Self::Cpu,
            Self::Servers,
            Self::Databases,
            Self::Backups,
            Self::Allocations,
        ]
    }

    /// Parse a resource kind from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "ram" => Some(Self::Memory),
            "disk" | "storage" => Some(Self::Disk),
            "cpu" => Some(Self::Cpu),
            "servers" | "server" => Some(Self::Servers),
            "databases" | "database" => Some(Self::Databases),
            "backups" | "backup" => Some(Self::Backups),
            "allocations" | "allocation" | "ports" => Some(Self::Allocations),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Memory => "memory",
            Self::Disk => "disk",
            Self::Cpu => "cpu",
            Self::Servers => "servers",
            Self::Databases => "databases",
            Self::Backups => "backups",
            Self::Allocations => "allocations",
        };
        f.write_str(name)
    }
}

/// Row key for a quota counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuotaKey {
    pub user_id: UserId,
    pub resource: ResourceKind,
}

impl QuotaKey {
    pub fn new(user_id: UserId, resource: ResourceKind) -> Self {
        Self { user_id, resource }
    }
}

impl fmt::Display for QuotaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.user_id, self.resource)
    }
}

/// A quota counter as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quota {
    pub user_id: UserId,
    pub resource: ResourceKind,
    pub current: u64,
}

impl Quota {
    pub fn key(&self) -> QuotaKey {
        QuotaKey::new(self.user_id, self.resource)
    }
}
