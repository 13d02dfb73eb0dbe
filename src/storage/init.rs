//! Storage initialization
//!
//! Handles first-run setup: directories, a starter catalog and an empty
//! state snapshot.

use crate::config::catalog::Catalog;
use crate::config::paths::StorePaths;
use crate::error::StoreError;

use super::file_io::write_json_atomic;
use super::{StateSnapshot, SNAPSHOT_VERSION};

/// Initialize storage for a fresh installation
///
/// Existing files are left alone, so running it twice is harmless.
pub fn initialize_storage(paths: &StorePaths) -> Result<(), StoreError> {
    paths.ensure_directories()?;

    if !paths.catalog_file().exists() {
        Catalog::default_catalog().save(paths.catalog_file())?;
    }

    if !paths.state_file().exists() {
        let empty = StateSnapshot {
            schema_version: SNAPSHOT_VERSION,
            ..Default::default()
        };
        write_json_atomic(paths.state_file(), &empty)?;
    }

    Ok(())
}

/// Check if storage needs initialization
pub fn needs_initialization(paths: &StorePaths) -> bool {
    !paths.state_file().exists() || !paths.catalog_file().exists()
}
