//! Artifact store
//!
//! Reported artifacts are plain files outside the state snapshot. Deletion
//! runs in two phases: every file is first renamed to a `.deleting`
//! tombstone, and only when all of them moved are the tombstones removed.
//! If any file cannot be moved the others are renamed back, so a failed
//! deletion leaves the artifact in place.

use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, error, warn};

use crate::error::{StoreError, StoreResult};
use crate::models::Report;

/// What happened to one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// The file existed and was removed
    Deleted,
    /// The file was already gone
    Absent,
    /// Left in place because another file of the same deletion failed
    Kept(String),
    /// Removal failed
    Failed(String),
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Deleted | Self::Absent)
    }
}

impl fmt::Display for FileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deleted => write!(f, "deleted"),
            Self::Absent => write!(f, "absent"),
            Self::Kept(reason) => write!(f, "kept: {}", reason),
            Self::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Per-file result of a deletion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionReport {
    pub files: Vec<(PathBuf, FileOutcome)>,
}

impl DeletionReport {
    /// True only if every file is gone
    pub fn is_complete(&self) -> bool {
        self.files.iter().all(|(_, outcome)| outcome.is_success())
    }

    /// Files that are still there, or whose state is unknown
    pub fn failures(&self) -> Vec<&(PathBuf, FileOutcome)> {
        self.files
            .iter()
            .filter(|(_, outcome)| !outcome.is_success())
            .collect()
    }

    /// Partial success counts as failure
    pub fn into_result(self) -> StoreResult<Self> {
        if self.is_complete() {
            return Ok(self);
        }
        let reason = self
            .failures()
            .iter()
            .map(|(path, outcome)| format!("{}: {}", path.display(), outcome))
            .collect::<Vec<_>>()
            .join("; ");
        Err(StoreError::SideEffectFailed {
            reason: format!("could not delete artifact ({})", reason),
        })
    }
}

/// Removes stored artifacts
pub trait ArtifactStore: Send + Sync {
    /// Delete every path as one unit, reporting each one
    fn delete(&self, paths: &[PathBuf]) -> DeletionReport;
}

/// Artifact store backed by the local filesystem
///
/// Paths are relative to `root` and may not leave it.
pub struct FsArtifactStore {
    root: PathBuf,
}

/// Where a file stands between the two phases
enum Staged {
    Moved { target: PathBuf, tombstone: PathBuf },
    Settled(FileOutcome),
}

impl FsArtifactStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Resolve a stored path against the root; `None` if it would escape it
    pub fn resolve(&self, path: &Path) -> Option<PathBuf> {
        Report::is_confined(path).then(|| self.root.join(path))
    }

    fn tombstone(target: &Path) -> PathBuf {
        let mut name: OsString = target.as_os_str().to_owned();
        name.push(".deleting");
        PathBuf::from(name)
    }

    fn move_aside(target: PathBuf) -> Staged {
        match fs::symlink_metadata(&target) {
            Err(e) if e.kind() == ErrorKind::NotFound => Staged::Settled(FileOutcome::Absent),
            Err(e) => Staged::Settled(FileOutcome::Failed(e.to_string())),
            Ok(meta) if meta.is_dir() => {
                Staged::Settled(FileOutcome::Failed("is a directory".into()))
            }
            Ok(_) => {
                let tombstone = Self::tombstone(&target);
                match fs::rename(&target, &tombstone) {
                    Ok(()) => Staged::Moved { target, tombstone },
                    Err(e) => Staged::Settled(FileOutcome::Failed(e.to_string())),
                }
            }
        }
    }

    fn put_back(target: &Path, tombstone: &Path) -> FileOutcome {
        match fs::rename(tombstone, target) {
            Ok(()) => FileOutcome::Kept("restored after another file failed".into()),
            Err(e) => {
                error!(
                    path = %target.display(),
                    tombstone = %tombstone.display(),
                    error = %e,
                    "Could not restore artifact file"
                );
                FileOutcome::Failed(format!(
                    "left at {} and could not be restored: {}",
                    tombstone.display(),
                    e
                ))
            }
        }
    }

    fn finish(target: &Path, tombstone: &Path) -> FileOutcome {
        if let Err(e) = fs::remove_file(tombstone) {
            // The artifact path is already free; only the tombstone lingers.
            warn!(path = %target.display(), error = %e, "Tombstone left behind");
        }
        FileOutcome::Deleted
    }
}

impl ArtifactStore for FsArtifactStore {
    fn delete(&self, paths: &[PathBuf]) -> DeletionReport {
        let resolved: Vec<Option<PathBuf>> = paths.iter().map(|p| self.resolve(p)).collect();

        // Refuse the whole deletion before touching anything.
        if resolved.iter().any(Option::is_none) {
            let files = paths
                .iter()
                .zip(resolved)
                .map(|(path, target)| {
                    let outcome = match target {
                        Some(_) => FileOutcome::Kept("not attempted".into()),
                        None => FileOutcome::Failed("outside the artifacts directory".into()),
                    };
                    (path.clone(), outcome)
                })
                .collect();
            warn!(root = %self.root.display(), "Refused to delete paths outside the artifacts directory");
            return DeletionReport { files };
        }

        let staged: Vec<Staged> = resolved
            .into_iter()
            .flatten()
            .map(Self::move_aside)
            .collect();
        let all_moved = staged
            .iter()
            .all(|s| !matches!(s, Staged::Settled(FileOutcome::Failed(_))));

        let files = paths
            .iter()
            .zip(staged)
            .map(|(path, staged)| {
                let outcome = match staged {
                    Staged::Settled(outcome) => outcome,
                    Staged::Moved { target, tombstone } if all_moved => {
                        Self::finish(&target, &tombstone)
                    }
                    Staged::Moved { target, tombstone } => Self::put_back(&target, &tombstone),
                };
                debug!(path = %path.display(), %outcome, "Artifact delete");
                (path.clone(), outcome)
            })
            .collect();
        DeletionReport { files }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_delete_existing_and_absent() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsArtifactStore::new(temp_dir.path().to_path_buf());
        fs::write(temp_dir.path().join("a.bin"), b"x").unwrap();

        let report = store.delete(&[PathBuf::from("a.bin"), PathBuf::from("a.bin.meta.json")]);

        assert_eq!(report.files[0].1, FileOutcome::Deleted);
        assert_eq!(report.files[1].1, FileOutcome::Absent);
        assert!(report.is_complete());
        assert!(!temp_dir.path().join("a.bin").exists());
        assert!(!temp_dir.path().join("a.bin.deleting").exists());
    }

    #[test]
    fn test_partial_failure_restores_other_files() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsArtifactStore::new(temp_dir.path().to_path_buf());
        fs::write(temp_dir.path().join("a.bin"), b"x").unwrap();
        fs::create_dir(temp_dir.path().join("a.bin.meta.json")).unwrap();

        let report = store.delete(&[PathBuf::from("a.bin"), PathBuf::from("a.bin.meta.json")]);

        assert!(!report.is_complete());
        assert!(matches!(report.files[0].1, FileOutcome::Kept(_)));
        assert!(matches!(report.files[1].1, FileOutcome::Failed(_)));
        assert_eq!(fs::read(temp_dir.path().join("a.bin")).unwrap(), b"x");
        assert!(!temp_dir.path().join("a.bin.deleting").exists());

        let err = report.into_result().unwrap_err();
        assert!(matches!(err, StoreError::SideEffectFailed { .. }));
        assert!(err.to_string().contains("a.bin.meta.json"));
    }

    #[test]
    fn test_resolve_stays_inside_root() {
        let store = FsArtifactStore::new(PathBuf::from("/srv/artifacts"));

        assert_eq!(
            store.resolve(Path::new("a.bin")),
            Some(PathBuf::from("/srv/artifacts/a.bin"))
        );
        assert_eq!(store.resolve(Path::new("/etc/passwd")), None);
        assert_eq!(store.resolve(Path::new("../data/state.json")), None);
        assert_eq!(store.resolve(Path::new("")), None);
    }

    #[test]
    fn test_escaping_path_deletes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("artifacts");
        fs::create_dir(&root).unwrap();
        fs::write(root.join("a.bin"), b"x").unwrap();
        let outside = temp_dir.path().join("state.json");
        fs::write(&outside, b"{}").unwrap();
        let store = FsArtifactStore::new(root.clone());

        let report = store.delete(&[PathBuf::from("a.bin"), PathBuf::from("../state.json")]);
        let absolute = store.delete(&[outside.clone()]);

        assert!(!report.is_complete());
        assert!(!absolute.is_complete());
        assert!(root.join("a.bin").exists());
        assert!(outside.exists());
    }
}
