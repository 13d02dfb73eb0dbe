//! Store item model
//!
//! Items are defined in the catalog and are read-only to the store. What an
//! item does when bought is plain data, so purchases can be validated without
//! running anything.

use serde::{Deserialize, Serialize};

use super::credits::Credits;
use super::quota::ResourceKind;

/// The effect applied to a user when an item is bought
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EffectKind {
    /// Raise the user's quota for `resource` by `amount`
    IncrementQuota { resource: ResourceKind, amount: u64 },
}

impl EffectKind {
    /// The resource this effect touches
    pub fn resource(&self) -> ResourceKind {
        match self {
            Self::IncrementQuota { resource, .. } => *resource,
        }
    }

    /// The quantity this effect adds
    pub fn amount(&self) -> u64 {
        match self {
            Self::IncrementQuota { amount, .. } => *amount,
        }
    }
}

/// An item that can be bought with credits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseItem {
    /// Catalog slug, e.g. "memory-1g"
    pub id: String,

    /// Human-readable name
    #[serde(default)]
    pub name: String,

    /// Price in credits
    pub price: Credits,

    /// What buying it does
    pub effect: EffectKind,

    /// Blocked items are listed but cannot be bought
    #[serde(default)]
    pub blocked: bool,
}

impl PurchaseItem {
    /// Create an item that raises a quota
    pub fn quota(
        id: impl Into<String>,
        price: Credits,
        resource: ResourceKind,
        amount: u64,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            price,
            effect: EffectKind::IncrementQuota { resource, amount },
            blocked: false,
        }
    }

    /// Check the item definition
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("item id cannot be empty".into());
        }
        if self.effect.amount() == 0 {
            return Err(format!("item '{}' must add a positive amount", self.id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_serialization() {
        let effect = EffectKind::IncrementQuota {
            resource: ResourceKind::Disk,
            amount: 1024,
        };
        let json = serde_json::to_value(effect).unwrap();
        assert_eq!(json["kind"], "increment_quota");
        assert_eq!(json["resource"], "disk");
        assert_eq!(json["amount"], 1024);
    }

    #[test]
    fn test_validate_rejects_zero_amount() {
        let item = PurchaseItem::quota("nothing", Credits::new(10), ResourceKind::Cpu, 0);
        assert!(item.validate().is_err());

        let item = PurchaseItem::quota("cpu-50", Credits::new(10), ResourceKind::Cpu, 50);
        assert!(item.validate().is_ok());
    }
}
