//! Near-duplicate clustering and resolution.
//!
//! This module provides functionality for:
//! - Greedy first-fit clustering over fingerprint distance
//! - Group status derivation from keep/delete flags
//! - Folder-priority resolution (one keeper per group)
//! - Manual toggling of single records
//!
//! Everything here is pure, in-memory work over a record set; nothing reads
//! or writes the filesystem.

pub mod cluster;
pub mod groups;
pub mod marking;
pub mod priority;
pub mod status;

pub use cluster::{cluster, cluster_with_metric, ClusterSummary};
pub use groups::{collect_groups, DuplicateGroup, GroupingStats};
pub use marking::set_marked;
pub use priority::{apply_priority, priority_rank, PriorityOutcome};
pub use status::{derive_statuses, GroupStatus};

/// Errors for structurally invalid record sets.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// Two records share the same full path.
    #[error("duplicate file path in record set: {0}")]
    DuplicatePath(String),

    /// No record has the requested path.
    #[error("no record for path: {0}")]
    UnknownPath(String),
}
