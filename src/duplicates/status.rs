//! Group status derivation.
//!
//! A group's status depends only on its size and how many members are still
//! kept, so it can be recomputed after every flag change.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::record::FileRecord;

use super::groups::collect_groups;

/// Human-facing summary of a group's keep/delete flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupStatus {
    /// Exactly one member is kept (or the group has a single member).
    OnlyOneFile,
    /// Every member is marked for deletion.
    AllToBeDeleted,
    /// Two or more members are still kept.
    MultipleDuplicates,
}

impl GroupStatus {
    /// Status for a group of `size` members with `remaining` kept.
    #[must_use]
    pub fn from_counts(size: usize, remaining: usize) -> Self {
        match (size, remaining) {
            (0..=1, _) => Self::OnlyOneFile,
            (_, 0) => Self::AllToBeDeleted,
            (_, 1) => Self::OnlyOneFile,
            _ => Self::MultipleDuplicates,
        }
    }

    /// Label shown to users and written to reports.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::OnlyOneFile => "Only 1 file",
            Self::AllToBeDeleted => "All to be Deleted",
            Self::MultipleDuplicates => "Multiple Duplicates",
        }
    }

    /// Whether the group still needs a decision.
    #[must_use]
    pub fn needs_attention(self) -> bool {
        !matches!(self, Self::OnlyOneFile)
    }
}

impl fmt::Display for GroupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for GroupStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Derive the status of every group in the record set.
///
/// Records without a `group_id` are ignored.
#[must_use]
pub fn derive_statuses(records: &[FileRecord]) -> BTreeMap<u32, GroupStatus> {
    collect_groups(records)
        .into_iter()
        .map(|group| {
            let status = GroupStatus::from_counts(group.len(), group.remaining(records));
            (group.id, status)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_table() {
        assert_eq!(GroupStatus::from_counts(1, 1), GroupStatus::OnlyOneFile);
        assert_eq!(GroupStatus::from_counts(1, 0), GroupStatus::OnlyOneFile);
        assert_eq!(GroupStatus::from_counts(2, 0), GroupStatus::AllToBeDeleted);
        assert_eq!(GroupStatus::from_counts(3, 1), GroupStatus::OnlyOneFile);
        assert_eq!(GroupStatus::from_counts(2, 2), GroupStatus::MultipleDuplicates);
        assert_eq!(GroupStatus::from_counts(5, 3), GroupStatus::MultipleDuplicates);
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(GroupStatus::OnlyOneFile.to_string(), "Only 1 file");
        assert_eq!(GroupStatus::AllToBeDeleted.to_string(), "All to be Deleted");
        assert_eq!(
            GroupStatus::MultipleDuplicates.to_string(),
            "Multiple Duplicates"
        );
    }

    #[test]
    fn test_status_serializes_as_label() {
        let json = serde_json::to_string(&GroupStatus::AllToBeDeleted).unwrap();
        assert_eq!(json, "\"All to be Deleted\"");
    }

    #[test]
    fn test_derive_statuses_ignores_singletons() {
        let mut a = FileRecord::new("/a", "./");
        let mut b = FileRecord::new("/b", "./");
        let c = FileRecord::new("/c", "./");
        a.group_id = Some(4);
        b.group_id = Some(4);
        b.marked_for_deletion = true;

        let statuses = derive_statuses(&[a, b, c]);
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[&4], GroupStatus::OnlyOneFile);
    }

    #[test]
    fn test_single_member_group_supported() {
        let mut a = FileRecord::new("/a", "./");
        a.group_id = Some(1);
        a.marked_for_deletion = true;
        assert_eq!(derive_statuses(&[a])[&1], GroupStatus::OnlyOneFile);
    }
}
