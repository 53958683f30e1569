//! Folder-priority resolution.
//!
//! For each duplicate group, members are ranked by the position of their
//! directory in the caller's priority list (unlisted directories rank last),
//! ties broken by `full_path`. The best-ranked member is kept and all others
//! are marked for deletion. Singletons are never touched.
//!
//! With an empty priority list every member ties on the first key, so the
//! lexicographically smallest path is kept.
//!
//! # Example
//!
//! ```
//! use dupesift::duplicates::apply_priority;
//! use dupesift::record::FileRecord;
//!
//! let mut records = vec![
//!     FileRecord::new("/p1/a.jpg", "/p1"),
//!     FileRecord::new("/p2/b.jpg", "/p2"),
//! ];
//! for r in &mut records {
//!     r.group_id = Some(1);
//! }
//!
//! apply_priority(&mut records, &["/p2".to_string()]);
//!
//! assert!(records[0].marked_for_deletion);
//! assert!(!records[1].marked_for_deletion);
//! ```

use crate::record::FileRecord;

use super::groups::collect_groups;

/// What a priority pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriorityOutcome {
    /// Number of groups resolved
    pub groups_resolved: usize,
    /// Number of records whose deletion flag flipped
    pub records_changed: usize,
}

/// Rank of `directory` in `priority`; unlisted directories rank `priority.len()`.
#[must_use]
pub fn priority_rank<S: AsRef<str>>(directory: &str, priority: &[S]) -> usize {
    priority
        .iter()
        .position(|p| p.as_ref() == directory)
        .unwrap_or(priority.len())
}

/// Keep one member per group according to `priority`, mark the rest.
///
/// Running it twice with the same list changes nothing the second time.
pub fn apply_priority<S: AsRef<str>>(records: &mut [FileRecord], priority: &[S]) -> PriorityOutcome {
    let mut outcome = PriorityOutcome::default();

    for group in collect_groups(records) {
        let Some(&keep) = group.members.iter().min_by(|&&a, &&b| {
            let (ra, rb) = (&records[a], &records[b]);
            priority_rank(&ra.directory, priority)
                .cmp(&priority_rank(&rb.directory, priority))
                .then_with(|| ra.full_path.cmp(&rb.full_path))
        }) else {
            continue;
        };

        for &member in &group.members {
            let delete = member != keep;
            let record = &mut records[member];
            if record.marked_for_deletion != delete {
                record.marked_for_deletion = delete;
                outcome.records_changed += 1;
            }
        }

        log::debug!(
            "Group {}: keeping {} ({} marked)",
            group.id,
            records[keep].full_path,
            group.len() - 1
        );
        outcome.groups_resolved += 1;
    }

    outcome
}
