//! File I/O helpers with atomic replacement
//!
//! Persisted files are only ever replaced whole: content goes to a sibling
//! temp file, is synced, then renamed over the target. A failed write leaves
//! the previous file in place.

use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{StoreError, StoreResult};

/// Read JSON from a file, returning a default value if the file doesn't exist
pub fn read_json<T, P>(path: P) -> StoreResult<T>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if !path.exists() {
        return Ok(T::default());
    }

    let file = File::open(path).map_err(|e| {
        StoreError::Persistence(format!("Failed to open {}: {}", path.display(), e))
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        StoreError::Persistence(format!("Failed to parse {}: {}", path.display(), e))
    })
}

/// Read YAML from a file that must exist
pub fn read_yaml<T, P>(path: P) -> StoreResult<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .map_err(|e| StoreError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    serde_yaml::from_str(&contents)
        .map_err(|e| StoreError::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Write JSON to a file atomically
pub fn write_json_atomic<T, P>(path: P, data: &T) -> StoreResult<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let bytes = serde_json::to_vec_pretty(data)
        .map_err(|e| StoreError::Persistence(format!("Failed to serialize data: {}", e)))?;
    write_atomic(path.as_ref(), &bytes)
}

/// Write YAML to a file atomically
pub fn write_yaml_atomic<T, P>(path: P, data: &T) -> StoreResult<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let text = serde_yaml::to_string(data)
        .map_err(|e| StoreError::Config(format!("Failed to serialize data: {}", e)))?;
    write_atomic(path.as_ref(), text.as_bytes())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".{}.tmp", std::process::id()));
    PathBuf::from(name)
}

/// Replace `path` with `bytes` via temp file, sync and rename
///
/// Callers writing the same path from several threads must serialize those
/// writes themselves; the temp name is unique per process, not per thread.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            StoreError::Persistence(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    let temp_path = temp_path_for(path);
    let result = (|| -> std::io::Result<()> {
        let mut file = File::create(&temp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&temp_path, path)
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&temp_path);
        return Err(StoreError::Persistence(format!(
            "Failed to write {}: {}",
            path.display(),
            e
        )));
    }
    Ok(())
}
