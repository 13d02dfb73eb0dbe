//! Identifier newtypes
//!
//! Users and reports are both keyed by a v4 UUID. Each gets its own type so
//! the two cannot be swapped, and each prints with a short tag (`usr-1a2b3c4d`)
//! that the CLI also accepts back.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// An identifier string that names no UUID
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {kind} ID: '{input}'")]
pub struct InvalidId {
    pub kind: &'static str,
    pub input: String,
}

macro_rules! uuid_key {
    ($(#[$meta:meta])* $name:ident, kind = $kind:literal, tag = $tag:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub const TAG: &'static str = $tag;

            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let simple = self.0.simple().to_string();
                write!(f, "{}{}", Self::TAG, &simple[..8])
            }
        }

        impl FromStr for $name {
            type Err = InvalidId;

            /// Full UUID, with or without the tag
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let bare = s.strip_prefix(Self::TAG).unwrap_or(s);
                Uuid::parse_str(bare).map(Self).map_err(|_| InvalidId {
                    kind: $kind,
                    input: s.to_string(),
                })
            }
        }
    };
}

uuid_key!(
    /// Owner of a credit account
    UserId, kind = "user", tag = "usr-"
);
uuid_key!(
    /// An abuse report
    ReportId, kind = "report", tag = "rpt-"
);
