//! File records and perceptual fingerprints.
//!
//! A [`FileRecord`] is one entry per discovered file. The scanner fills in
//! metadata and an optional [`Fingerprint`]; the clustering engine assigns a
//! `group_id`; after that only `marked_for_deletion` changes.
//!
//! # Example
//!
//! ```
//! use dupesift::record::{FileRecord, Fingerprint};
//!
//! let record = FileRecord::new("/photos/trip/a.jpg", "./trip")
//!     .with_size(2048)
//!     .with_fingerprint(Fingerprint::from_u64(0xFF00));
//!
//! assert_eq!(record.name, "a.jpg");
//! assert!(record.has_fingerprint());
//! assert!(record.group_id.is_none());
//! ```

use std::fmt;
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Local, NaiveDateTime};
use image_hasher::ImageHash;
use serde::{Deserialize, Serialize};

/// Placeholder written for metadata that could not be read.
pub const UNKNOWN_SENTINEL: &str = "N/A";

/// Format of the `Last Modified` column.
pub const MODIFIED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Fixed-width perceptual descriptor of a media file.
///
/// Fingerprints are opaque byte strings. How far apart two of them are is
/// decided by a [`FingerprintMetric`]; [`HammingMetric`] is the default.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(Box<[u8]>);

impl Fingerprint {
    /// Build a fingerprint from raw hash bytes.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(bytes.into())
    }

    /// Build a 64-bit fingerprint, the width of the default 8x8 hashes.
    #[must_use]
    pub fn from_u64(bits: u64) -> Self {
        Self(bits.to_be_bytes().into())
    }

    /// Raw bytes of the fingerprint.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Width of the fingerprint in bits.
    #[must_use]
    pub fn bit_width(&self) -> u32 {
        bits_in(self.0.len())
    }
}

/// Bit count of `len` bytes, saturating at `u32::MAX`.
fn bits_in(len: usize) -> u32 {
    u32::try_from(len).map_or(u32::MAX, |bytes| bytes.saturating_mul(8))
}

impl From<ImageHash> for Fingerprint {
    fn from(hash: ImageHash) -> Self {
        Self::from_bytes(hash.as_bytes())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0.iter() {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Distance between two fingerprints; smaller means more similar.
pub trait FingerprintMetric {
    /// Non-negative distance between `a` and `b`.
    fn distance(&self, a: &Fingerprint, b: &Fingerprint) -> u32;
}

/// Hamming distance over the fingerprint bits.
///
/// Fingerprints of different widths come from different hash configurations
/// and are never considered similar: their distance is the wider bit width.
#[derive(Default, Clone, Copy, Debug)]
pub struct HammingMetric;

impl FingerprintMetric for HammingMetric {
    fn distance(&self, a: &Fingerprint, b: &Fingerprint) -> u32 {
        if a.0.len() != b.0.len() {
            return a.bit_width().max(b.bit_width());
        }
        a.0.iter()
            .zip(b.0.iter())
            .map(|(x, y)| (x ^ y).count_ones())
            .sum()
    }
}

impl<F> FingerprintMetric for F
where
    F: Fn(&Fingerprint, &Fingerprint) -> u32,
{
    fn distance(&self, a: &Fingerprint, b: &Fingerprint) -> u32 {
        self(a, b)
    }
}

/// File size, or unknown when metadata could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileSize {
    /// Size in bytes.
    Known(u64),
    /// Metadata was unavailable.
    #[default]
    Unknown,
}

impl FileSize {
    /// Size in bytes, if known.
    #[must_use]
    pub fn bytes(self) -> Option<u64> {
        match self {
            Self::Known(n) => Some(n),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for FileSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(n) => write!(f, "{}", n),
            Self::Unknown => f.write_str(UNKNOWN_SENTINEL),
        }
    }
}

/// Last-modified timestamp in local time, or unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modified {
    /// Local wall-clock time of the last modification.
    Known(NaiveDateTime),
    /// Metadata was unavailable.
    #[default]
    Unknown,
}

impl From<SystemTime> for Modified {
    fn from(time: SystemTime) -> Self {
        let local: DateTime<Local> = time.into();
        Self::Known(local.naive_local())
    }
}

impl fmt::Display for Modified {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(t) => write!(f, "{}", t.format(MODIFIED_FORMAT)),
            Self::Unknown => f.write_str(UNKNOWN_SENTINEL),
        }
    }
}

/// Per-record failure classification.
///
/// Issues are warnings: the record stays in the set, it just cannot take
/// part in clustering (fingerprint issues) or lacks metadata.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum RecordIssue {
    /// The media file could not be decoded or hashed.
    #[error("fingerprint failed: {0}")]
    FingerprintFailed(String),

    /// Media type recognized but not decodable by the hasher (e.g. video).
    #[error("unsupported media: {0}")]
    UnsupportedMedia(String),

    /// The file vanished or became inaccessible after discovery.
    #[error("metadata unavailable: {0}")]
    MetadataUnavailable(String),
}

/// One entry per discovered file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// File name without directory.
    pub name: String,
    /// Directory relative to the scan root (`./` for the root itself).
    pub directory: String,
    /// Full path; unique key within a record set.
    pub full_path: String,
    /// Size in bytes.
    pub size: FileSize,
    /// Last modification time.
    pub modified: Modified,
    /// Perceptual fingerprint, absent for non-media files or failures.
    pub fingerprint: Option<Fingerprint>,
    /// Duplicate group, `None` for singletons.
    pub group_id: Option<u32>,
    /// Whether the file is slated for removal.
    pub marked_for_deletion: bool,
    /// Warning recorded while building this record.
    pub issue: Option<RecordIssue>,
}

impl FileRecord {
    /// Create a record with unknown metadata and no fingerprint.
    ///
    /// The file name is taken from the last component of `full_path`.
    #[must_use]
    pub fn new(full_path: impl Into<String>, directory: impl Into<String>) -> Self {
        let full_path = full_path.into();
        let name = Path::new(&full_path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| full_path.clone());
        Self {
            name,
            directory: directory.into(),
            full_path,
            size: FileSize::Unknown,
            modified: Modified::Unknown,
            fingerprint: None,
            group_id: None,
            marked_for_deletion: false,
            issue: None,
        }
    }

    /// Set a known size.
    #[must_use]
    pub fn with_size(mut self, bytes: u64) -> Self {
        self.size = FileSize::Known(bytes);
        self
    }

    /// Set a known modification time.
    #[must_use]
    pub fn with_modified(mut self, modified: impl Into<Modified>) -> Self {
        self.modified = modified.into();
        self
    }

    /// Attach a fingerprint.
    #[must_use]
    pub fn with_fingerprint(mut self, fingerprint: Fingerprint) -> Self {
        self.fingerprint = Some(fingerprint);
        self
    }

    /// Attach an issue.
    #[must_use]
    pub fn with_issue(mut self, issue: RecordIssue) -> Self {
        self.issue = Some(issue);
        self
    }

    /// Whether the record carries a usable fingerprint.
    #[must_use]
    pub fn has_fingerprint(&self) -> bool {
        self.fingerprint.is_some()
    }

    /// Whether the record belongs to a duplicate group.
    #[must_use]
    pub fn is_grouped(&self) -> bool {
        self.group_id.is_some()
    }
}

impl From<NaiveDateTime> for Modified {
    fn from(t: NaiveDateTime) -> Self {
        Self::Known(t)
    }
}
