//! Path management for the credit store
//!
//! ## Path Resolution Order
//!
//! 1. `CREDIT_STORE_DATA_DIR` environment variable (if set)
//! 2. `$XDG_CONFIG_HOME/credit-store`
//! 3. The platform config directory (`~/.config/credit-store` on Linux)

use std::path::PathBuf;

use directories::BaseDirs;

use crate::error::StoreError;

/// Environment variable overriding the base directory
pub const DATA_DIR_ENV: &str = "CREDIT_STORE_DATA_DIR";

/// Manages all paths used by the credit store
#[derive(Debug, Clone)]
pub struct StorePaths {
    base_dir: PathBuf,
}

impl StorePaths {
    /// Resolve paths from the environment
    ///
    /// # Errors
    ///
    /// Returns an error if no config directory can be determined.
    pub fn new() -> Result<Self, StoreError> {
        let base_dir = if let Ok(custom) = std::env::var(DATA_DIR_ENV) {
            PathBuf::from(custom)
        } else {
            resolve_default_path()?
        };

        Ok(Self { base_dir })
    }

    /// Create StorePaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Directory holding the state snapshot
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Root for relative artifact paths
    pub fn artifacts_dir(&self) -> PathBuf {
        self.base_dir.join("artifacts")
    }

    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    pub fn catalog_file(&self) -> PathBuf {
        self.base_dir.join("catalog.yaml")
    }

    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    pub fn state_file(&self) -> PathBuf {
        self.data_dir().join("state.json")
    }

    /// Ensure the base, data and artifact directories exist
    pub fn ensure_directories(&self) -> Result<(), StoreError> {
        for dir in [self.base_dir.clone(), self.data_dir(), self.artifacts_dir()] {
            std::fs::create_dir_all(&dir).map_err(|e| {
                StoreError::Io(format!("Failed to create {}: {}", dir.display(), e))
            })?;
        }
        Ok(())
    }
}

fn resolve_default_path() -> Result<PathBuf, StoreError> {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg).join("credit-store"));
    }
    let dirs = BaseDirs::new()
        .ok_or_else(|| StoreError::Config("Could not determine home directory".into()))?;
    Ok(dirs.config_dir().join("credit-store"))
}
