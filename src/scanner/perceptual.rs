//! Perceptual image hashing for similarity detection.
//!
//! [`PerceptualHasher`] turns an image file into a [`Fingerprint`] that stays
//! stable under resizing and recompression. Videos are recognized but not
//! decoded; they are reported as unsupported rather than hashed.

use std::path::Path;

use clap::ValueEnum;
use image_hasher::{HashAlg, HasherConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::{Fingerprint, RecordIssue};

use super::MediaKind;

/// Supported perceptual hashing algorithms.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum PerceptualAlgorithm {
    /// aHash (Average Hash) - mean-based, fast; the classic choice for photo dumps.
    #[default]
    Ahash,
    /// dHash (Difference Hash) - gradient-based, very fast and effective.
    Dhash,
    /// pHash (Perceptual Hash) - DCT-based, most resilient to transformations.
    Phash,
}

impl PerceptualAlgorithm {
    /// Default similarity threshold (exclusive Hamming distance bound).
    pub fn default_threshold(&self) -> u32 {
        match self {
            Self::Ahash => 5,
            Self::Dhash => 2,
            Self::Phash => 10,
        }
    }
}

impl std::fmt::Display for PerceptualAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ahash => write!(f, "aHash"),
            Self::Dhash => write!(f, "dHash"),
            Self::Phash => write!(f, "pHash"),
        }
    }
}

/// Errors that can occur during perceptual hashing.
#[derive(Debug, Error)]
pub enum PerceptualError {
    /// Failed to open or decode the image.
    #[error("Failed to load image {0}: {1}")]
    LoadError(String, #[source] image::ImageError),

    /// Media format not supported for hashing.
    #[error("Unsupported media format: {0}")]
    UnsupportedFormat(String),
}

impl From<PerceptualError> for RecordIssue {
    fn from(err: PerceptualError) -> Self {
        match err {
            PerceptualError::UnsupportedFormat(ext) => RecordIssue::UnsupportedMedia(ext),
            PerceptualError::LoadError(_, source) => {
                RecordIssue::FingerprintFailed(source.to_string())
            }
        }
    }
}

/// Computes perceptual fingerprints for media files.
pub struct PerceptualHasher {
    hasher: image_hasher::Hasher,
    algorithm: PerceptualAlgorithm,
}

impl PerceptualHasher {
    /// Create a new `PerceptualHasher` with the given algorithm.
    pub fn new(algorithm: PerceptualAlgorithm) -> Self {
        let config = match algorithm {
            PerceptualAlgorithm::Ahash => HasherConfig::new().hash_alg(HashAlg::Mean),
            PerceptualAlgorithm::Dhash => HasherConfig::new().hash_alg(HashAlg::Gradient),
            PerceptualAlgorithm::Phash => HasherConfig::new().hash_alg(HashAlg::Median).preproc_dct(),
        };

        Self {
            hasher: config.to_hasher(),
            algorithm,
        }
    }

    /// Fingerprint the file at `path`.
    ///
    /// # Errors
    ///
    /// - `UnsupportedFormat` for videos and non-media files
    /// - `LoadError` if the image cannot be opened or decoded
    pub fn fingerprint<P: AsRef<Path>>(&self, path: P) -> Result<Fingerprint, PerceptualError> {
        let path = path.as_ref();
        match MediaKind::from_path(path) {
            MediaKind::Image => {}
            MediaKind::Video | MediaKind::Other => {
                let ext = path
                    .extension()
                    .map(|e| e.to_string_lossy().to_lowercase())
                    .unwrap_or_default();
                return Err(PerceptualError::UnsupportedFormat(ext));
            }
        }

        let img = image::open(path)
            .map_err(|e| PerceptualError::LoadError(path.display().to_string(), e))?;

        Ok(Fingerprint::from(self.hasher.hash_image(&img)))
    }

    /// Get the algorithm used by this hasher.
    pub fn algorithm(&self) -> PerceptualAlgorithm {
        self.algorithm
    }
}

impl Default for PerceptualHasher {
    fn default() -> Self {
        Self::new(PerceptualAlgorithm::default())
    }
}
