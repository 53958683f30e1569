//! Duplicate group views over a record set.
//!
//! Groups are not stored anywhere: they are materialized from the records'
//! `group_id`s whenever status or priority logic needs them, and dropped
//! afterwards.

use std::collections::BTreeMap;

use crate::record::FileRecord;

/// Records sharing a `group_id`, addressed by index into the record set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// Group identifier
    pub id: u32,
    /// Indices of the members, in record-set order
    pub members: Vec<usize>,
}

impl DuplicateGroup {
    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Members not marked for deletion.
    #[must_use]
    pub fn remaining(&self, records: &[FileRecord]) -> usize {
        self.members
            .iter()
            .filter(|&&i| !records[i].marked_for_deletion)
            .count()
    }

    /// Members marked for deletion.
    #[must_use]
    pub fn marked(&self, records: &[FileRecord]) -> usize {
        self.len() - self.remaining(records)
    }

    /// Bytes freed by removing the marked members (unknown sizes count as 0).
    #[must_use]
    pub fn reclaimable_bytes(&self, records: &[FileRecord]) -> u64 {
        self.members
            .iter()
            .map(|&i| &records[i])
            .filter(|r| r.marked_for_deletion)
            .filter_map(|r| r.size.bytes())
            .sum()
    }

    /// Borrow the member records.
    pub fn records<'a>(&'a self, records: &'a [FileRecord]) -> impl Iterator<Item = &'a FileRecord> {
        self.members.iter().map(move |&i| &records[i])
    }
}

/// Materialize all duplicate groups, ordered by ascending id.
///
/// Records without a `group_id` are skipped. A group id carried by a single
/// record still yields a (size 1) group.
#[must_use]
pub fn collect_groups(records: &[FileRecord]) -> Vec<DuplicateGroup> {
    let mut by_id: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (idx, record) in records.iter().enumerate() {
        if let Some(id) = record.group_id {
            by_id.entry(id).or_default().push(idx);
        }
    }

    by_id
        .into_iter()
        .map(|(id, members)| DuplicateGroup { id, members })
        .collect()
}

/// Statistics over the groups of a record set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Total number of records
    pub total_records: usize,
    /// Number of duplicate groups
    pub groups: usize,
    /// Records belonging to a group
    pub grouped_records: usize,
    /// Records marked for deletion (grouped or not)
    pub marked_records: usize,
    /// Bytes freed by deleting every marked record with a known size
    pub reclaimable_bytes: u64,
}

impl GroupingStats {
    /// Compute statistics for a record set.
    #[must_use]
    pub fn from_records(records: &[FileRecord]) -> Self {
        let groups = collect_groups(records);
        let marked: Vec<&FileRecord> = records.iter().filter(|r| r.marked_for_deletion).collect();
        Self {
            total_records: records.len(),
            groups: groups.len(),
            grouped_records: groups.iter().map(DuplicateGroup::len).sum(),
            marked_records: marked.len(),
            reclaimable_bytes: marked.iter().filter_map(|r| r.size.bytes()).sum(),
        }
    }
}
