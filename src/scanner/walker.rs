//! Directory walker producing file records.
//!
//! # Overview
//!
//! [`Walker`] traverses a root directory with `walkdir`, sorted by file name
//! so the same tree always yields the same record order. Every regular file
//! becomes a [`FileRecord`]; metadata failures degrade to unknown size and
//! time instead of dropping the file.
//!
//! # Example
//!
//! ```no_run
//! use dupesift::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/Pictures"), WalkerConfig::default());
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(record) => println!("{} in {}", record.name, record.directory),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use walkdir::{DirEntry, WalkDir};

use crate::record::{FileRecord, RecordIssue};

use super::{ScanError, WalkerConfig};

/// Directory walker for file discovery.
#[derive(Debug)]
pub struct Walker {
    root: PathBuf,
    config: WalkerConfig,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given root.
    #[must_use]
    pub fn new(root: &Path, config: WalkerConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            config,
            shutdown_flag: None,
        }
    }

    /// Stop yielding entries once `flag` is set.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Walk the tree, yielding one record per regular file.
    ///
    /// Unreadable directories and entries are yielded as errors; the walk
    /// continues past them.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileRecord, ScanError>> + '_ {
        let skip_hidden = self.config.skip_hidden;
        WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |e| !(skip_hidden && e.depth() > 0 && is_hidden(e)))
            .take_while(move |_| !self.is_shutdown_requested())
            .filter_map(move |entry| match entry {
                Ok(entry) if entry.file_type().is_file() => Some(Ok(self.to_record(&entry))),
                Ok(_) => None,
                Err(e) => Some(Err(self.to_error(e))),
            })
    }

    /// Build a record for a discovered file.
    fn to_record(&self, entry: &DirEntry) -> FileRecord {
        let path = entry.path();
        let directory = relative_directory(&self.root, path.parent().unwrap_or(&self.root));
        let record = FileRecord::new(path.to_string_lossy(), directory);

        match entry.metadata() {
            Ok(meta) => {
                let record = record.with_size(meta.len());
                match meta.modified() {
                    Ok(time) => record.with_modified(time),
                    Err(e) => record.with_issue(RecordIssue::MetadataUnavailable(e.to_string())),
                }
            }
            Err(e) => {
                log::debug!("Metadata unavailable for {}: {}", path.display(), e);
                record.with_issue(RecordIssue::MetadataUnavailable(e.to_string()))
            }
        }
    }

    fn to_error(&self, err: walkdir::Error) -> ScanError {
        let path = err
            .path()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        match err.into_io_error() {
            Some(io) if io.kind() == std::io::ErrorKind::PermissionDenied => {
                ScanError::PermissionDenied(path)
            }
            Some(io) => ScanError::Io { path, source: io },
            None => ScanError::Io {
                path,
                source: std::io::Error::other("filesystem loop detected"),
            },
        }
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

/// Directory of a file relative to the scan root: `./` or `./sub/dir`.
#[must_use]
pub fn relative_directory(root: &Path, dir: &Path) -> String {
    match dir.strip_prefix(root) {
        Ok(rel) if rel.as_os_str().is_empty() => "./".to_string(),
        Ok(rel) => {
            let parts: Vec<String> = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            format!("./{}", parts.join("/"))
        }
        Err(_) => dir.to_string_lossy().into_owned(),
    }
}
