//! Scanner module: directory traversal and fingerprinting.
//!
//! This module builds the record set the clustering engine consumes:
//! - Sorted directory walking with `walkdir` ([`walker`])
//! - Media classification by extension ([`MediaKind`])
//! - Perceptual fingerprints with `image_hasher` ([`perceptual`])
//!
//! Fingerprints are computed in parallel but written back by index, so the
//! record order is always the walk order.
//!
//! # Example
//!
//! ```no_run
//! use dupesift::scanner::{ScanConfig, Scanner};
//! use std::path::Path;
//!
//! let scanner = Scanner::new(ScanConfig::default());
//! let outcome = scanner.scan(Path::new("/home/user/Pictures")).unwrap();
//! println!("{} records, {} warnings", outcome.records.len(), outcome.warnings());
//! ```

pub mod perceptual;
pub mod walker;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use crate::progress::{ProgressCallback, PHASE_FINGERPRINTING, PHASE_WALKING};
use crate::record::{FileRecord, RecordIssue};

pub use perceptual::{PerceptualAlgorithm, PerceptualError, PerceptualHasher};
pub use walker::Walker;

/// Image extensions eligible for fingerprinting.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];
/// Video extensions recognized as media.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "webm"];

/// Media classification by file extension (case-insensitive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// Still image
    Image,
    /// Video container
    Video,
    /// Anything else; never fingerprinted
    Other,
}

impl MediaKind {
    /// Classify a path by its extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return Self::Other;
        };
        let ext = ext.to_ascii_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Self::Image
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Self::Video
        } else {
            Self::Other
        }
    }

    /// Whether the file is an image or a video.
    #[must_use]
    pub fn is_media(self) -> bool {
        !matches!(self, Self::Other)
    }
}

/// Configuration for directory walking.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Follow symbolic links during traversal.
    pub follow_symlinks: bool,
    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,
}

/// Configuration for a full scan.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Walk options
    pub walker: WalkerConfig,
    /// Fingerprint algorithm
    pub algorithm: PerceptualAlgorithm,
    /// Worker threads for fingerprinting
    pub io_threads: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            walker: WalkerConfig::default(),
            algorithm: PerceptualAlgorithm::default(),
            io_threads: 4,
        }
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The fingerprint thread pool could not be created.
    #[error("Failed to build thread pool: {0}")]
    ThreadPool(String),

    /// The scan was interrupted by the user.
    #[error("Scan interrupted")]
    Interrupted,
}

/// Result of a scan: records in walk order plus walk problems.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Records in walk order
    pub records: Vec<FileRecord>,
    /// Directories or entries that could not be read
    pub walk_errors: Vec<ScanError>,
}

impl ScanOutcome {
    /// Records carrying an issue.
    pub fn issues(&self) -> impl Iterator<Item = (&FileRecord, &RecordIssue)> {
        self.records
            .iter()
            .filter_map(|r| r.issue.as_ref().map(|issue| (r, issue)))
    }

    /// Number of non-fatal problems (record issues plus walk errors).
    #[must_use]
    pub fn warnings(&self) -> usize {
        self.issues().count() + self.walk_errors.len()
    }
}

/// Walks a directory and fingerprints its media files.
pub struct Scanner {
    config: ScanConfig,
    hasher: PerceptualHasher,
    shutdown_flag: Option<Arc<AtomicBool>>,
    progress: Option<Arc<dyn ProgressCallback>>,
}

impl Scanner {
    /// Create a scanner.
    #[must_use]
    pub fn new(config: ScanConfig) -> Self {
        let hasher = PerceptualHasher::new(config.algorithm);
        Self {
            config,
            hasher,
            shutdown_flag: None,
            progress: None,
        }
    }

    /// Abort the scan when `flag` is set.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Report progress to `callback`.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Scan `root`.
    ///
    /// # Errors
    ///
    /// Fails only if the root is missing or not a directory, the thread
    /// pool cannot be built, or the scan is interrupted. Per-file problems
    /// are attached to the records instead.
    pub fn scan(&self, root: &Path) -> Result<ScanOutcome, ScanError> {
        if !root.exists() {
            return Err(ScanError::NotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(ScanError::NotADirectory(root.to_path_buf()));
        }

        let mut outcome = self.walk(root);
        if self.is_shutdown_requested() {
            return Err(ScanError::Interrupted);
        }

        self.fingerprint_all(&mut outcome.records)?;
        if self.is_shutdown_requested() {
            return Err(ScanError::Interrupted);
        }

        log::debug!(
            "Scanned {}: {} files, {} fingerprinted, {} warning(s)",
            root.display(),
            outcome.records.len(),
            outcome.records.iter().filter(|r| r.has_fingerprint()).count(),
            outcome.warnings()
        );
        Ok(outcome)
    }

    fn walk(&self, root: &Path) -> ScanOutcome {
        let mut walker = Walker::new(root, self.config.walker.clone());
        if let Some(flag) = &self.shutdown_flag {
            walker = walker.with_shutdown_flag(Arc::clone(flag));
        }

        if let Some(p) = &self.progress {
            p.on_phase_start(PHASE_WALKING, 0);
        }

        let mut outcome = ScanOutcome::default();
        for entry in walker.walk() {
            match entry {
                Ok(record) => {
                    outcome.records.push(record);
                    if let Some(p) = &self.progress {
                        let last = &outcome.records[outcome.records.len() - 1];
                        p.on_progress(outcome.records.len(), &last.full_path);
                    }
                }
                Err(e) => {
                    log::debug!("Walk error: {}", e);
                    outcome.walk_errors.push(e);
                }
            }
        }

        if let Some(p) = &self.progress {
            p.on_phase_end(PHASE_WALKING);
        }
        outcome
    }

    /// Fingerprint every media record in place.
    fn fingerprint_all(&self, records: &mut [FileRecord]) -> Result<(), ScanError> {
        let targets: Vec<(usize, String)> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| MediaKind::from_path(Path::new(&r.full_path)).is_media())
            .map(|(i, r)| (i, r.full_path.clone()))
            .collect();

        if targets.is_empty() {
            return Ok(());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.io_threads.max(1))
            .build()
            .map_err(|e| ScanError::ThreadPool(e.to_string()))?;

        if let Some(p) = &self.progress {
            p.on_phase_start(PHASE_FINGERPRINTING, targets.len());
        }

        let done = AtomicUsize::new(0);
        let results: Vec<(usize, Result<_, PerceptualError>)> = pool.install(|| {
            targets
                .par_iter()
                .filter(|_| !self.is_shutdown_requested())
                .map(|(idx, path)| {
                    let result = self.hasher.fingerprint(path);
                    let n = done.fetch_add(1, Ordering::Relaxed) + 1;
                    if let Some(p) = &self.progress {
                        p.on_progress(n, path);
                    }
                    (*idx, result)
                })
                .collect()
        });

        if let Some(p) = &self.progress {
            p.on_phase_end(PHASE_FINGERPRINTING);
        }

        for (idx, result) in results {
            let record = &mut records[idx];
            match result {
                Ok(fp) => record.fingerprint = Some(fp),
                Err(e) => {
                    log::debug!("No fingerprint for {}: {}", record.full_path, e);
                    if record.issue.is_none() {
                        record.issue = Some(RecordIssue::from(e));
                    }
                }
            }
        }
        Ok(())
    }
}
