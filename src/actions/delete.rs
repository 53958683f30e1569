//! Deletion of files marked in a resolved table.
//!
//! # Overview
//!
//! [`delete_marked`] walks a record set and removes every file whose delete
//! flag is set:
//! - Move to system trash (default, recoverable)
//! - Permanent deletion (with explicit flag)
//! - Dry run (report only, nothing touched)
//!
//! Flags are honored as given. A group in which every member is marked is
//! still deleted in full; it is only reported with a warning.
//!
//! # Example
//!
//! ```no_run
//! use dupesift::actions::delete::{delete_marked, DeleteConfig};
//! use dupesift::output::load_table;
//! use std::path::Path;
//!
//! let records = load_table(Path::new("file_list.csv")).unwrap();
//! let report = delete_marked(&records, &DeleteConfig::trash().with_dry_run(true));
//! println!("{}", report.summary());
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::duplicates::{derive_statuses, GroupStatus};
use crate::record::FileRecord;

/// Error type for deletion operations.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed { path: PathBuf, message: String },

    /// Permanent delete operation failed.
    #[error("permanent delete failed for {path}: {message}")]
    PermanentDeleteFailed { path: PathBuf, message: String },

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    /// Get the path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::TrashFailed { path: p, .. }
            | Self::PermanentDeleteFailed { path: p, .. }
            | Self::Io { path: p, .. } => p,
        }
    }

    fn from_metadata(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }
}

/// Configuration for deletion operations.
#[derive(Debug, Clone, Default)]
pub struct DeleteConfig {
    /// Use permanent deletion instead of trash.
    pub permanent: bool,
    /// Report what would happen without touching the filesystem.
    pub dry_run: bool,
}

impl DeleteConfig {
    /// Create config for trash deletion.
    #[must_use]
    pub fn trash() -> Self {
        Self::default()
    }

    /// Create config for permanent deletion.
    #[must_use]
    pub fn permanent() -> Self {
        Self {
            permanent: true,
            ..Self::default()
        }
    }

    /// Enable/disable dry run.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Outcome of [`delete_marked`].
#[derive(Debug, Clone, Default)]
pub struct DeletionReport {
    /// Paths removed (or, in a dry run, that would be removed).
    pub deleted: Vec<String>,
    /// Marked paths that no longer exist.
    pub not_found: Vec<String>,
    /// Marked paths that could not be removed, with the reason.
    pub errors: Vec<(String, String)>,
    /// Records left alone because they were not marked.
    pub skipped_unmarked: usize,
    /// Bytes freed by the removed files.
    pub bytes_freed: u64,
    /// Groups whose members were all marked.
    pub fully_marked_groups: Vec<u32>,
    /// Whether this was a dry run.
    pub dry_run: bool,
}

impl DeletionReport {
    /// Check if every marked file was removed or already gone.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.errors.is_empty()
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        let verb = if self.dry_run {
            "Would delete"
        } else {
            "Deleted"
        };
        format!(
            "{} {} file(s), {} not found, {} error(s), freed {}",
            verb,
            self.deleted.len(),
            self.not_found.len(),
            self.errors.len(),
            bytesize::ByteSize::b(self.bytes_freed)
        )
    }
}

/// Move a single file to the system trash. Returns its size.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `PermissionDenied` if its metadata cannot be read
/// - `TrashFailed` if the trash operation fails
pub fn delete_to_trash(path: &Path) -> Result<u64, DeleteError> {
    let size = fs::metadata(path)
        .map_err(|e| DeleteError::from_metadata(path, e))?
        .len();

    trash::delete(path).map_err(|e| DeleteError::TrashFailed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    log::debug!("Moved to trash: {} ({} bytes)", path.display(), size);
    Ok(size)
}

/// Permanently delete a single file. Returns its size.
///
/// **WARNING**: This operation cannot be undone.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `PermissionDenied` if its metadata cannot be read
/// - `PermanentDeleteFailed` if the delete operation fails
pub fn permanent_delete(path: &Path) -> Result<u64, DeleteError> {
    let size = fs::metadata(path)
        .map_err(|e| DeleteError::from_metadata(path, e))?
        .len();

    fs::remove_file(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => DeleteError::NotFound(path.to_path_buf()),
        _ => DeleteError::PermanentDeleteFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        },
    })?;

    log::debug!("Permanently deleted: {} ({} bytes)", path.display(), size);
    Ok(size)
}

/// Ids of groups in which every member is marked for deletion.
#[must_use]
pub fn fully_marked_groups(records: &[FileRecord]) -> Vec<u32> {
    derive_statuses(records)
        .into_iter()
        .filter(|(_, status)| *status == GroupStatus::AllToBeDeleted)
        .map(|(id, _)| id)
        .collect()
}

/// Delete every record whose delete flag is set.
///
/// Records are processed in order. A missing file is counted under
/// `not_found` and any other failure under `errors`; neither stops the run.
pub fn delete_marked(records: &[FileRecord], config: &DeleteConfig) -> DeletionReport {
    let mut report = DeletionReport {
        dry_run: config.dry_run,
        fully_marked_groups: fully_marked_groups(records),
        ..DeletionReport::default()
    };

    for id in &report.fully_marked_groups {
        log::warn!("Every file in group {} is marked for deletion", id);
    }

    for record in records {
        if !record.marked_for_deletion {
            report.skipped_unmarked += 1;
            continue;
        }

        let path = Path::new(&record.full_path);
        let result = if config.dry_run {
            fs::metadata(path)
                .map(|m| m.len())
                .map_err(|e| DeleteError::from_metadata(path, e))
        } else if config.permanent {
            permanent_delete(path)
        } else {
            delete_to_trash(path)
        };

        match result {
            Ok(size) => {
                report.bytes_freed += size;
                report.deleted.push(record.full_path.clone());
            }
            Err(DeleteError::NotFound(_)) => {
                log::warn!("File not found (cannot delete): {}", record.full_path);
                report.not_found.push(record.full_path.clone());
            }
            Err(e) => {
                log::warn!("Failed to delete {}: {}", record.full_path, e);
                report.errors.push((record.full_path.clone(), e.to_string()));
            }
        }
    }

    log::debug!("{}", report.summary());
    report
}
