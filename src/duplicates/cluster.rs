//! Greedy first-fit clustering over fingerprint distance.
//!
//! # Overview
//!
//! Records are scanned once, in input order. Each fingerprinted record joins
//! the first *representative* (in creation order) whose fingerprint is
//! strictly closer than the threshold, otherwise it starts a new one.
//! Representatives with two or more members become duplicate groups and get
//! dense 1-based ids in creation order.
//!
//! The result is deterministic for a fixed input order and threshold, but it
//! is not invariant under permutation: when `A~B`, `B~C` and `A` is not near
//! `C`, the walk order decides which of them end up together.
//!
//! Cost is O(n·k) distance evaluations with k representatives so far.
//!
//! # Example
//!
//! ```
//! use dupesift::duplicates::cluster;
//! use dupesift::record::{FileRecord, Fingerprint};
//!
//! let records = vec![
//!     FileRecord::new("/a/1.jpg", "./a").with_fingerprint(Fingerprint::from_u64(0b0000)),
//!     FileRecord::new("/a/2.txt", "./a"),
//!     FileRecord::new("/b/1.jpg", "./b").with_fingerprint(Fingerprint::from_u64(0b0001)),
//! ];
//!
//! let (clustered, summary) = cluster(records, 5).unwrap();
//!
//! assert_eq!(summary.groups, 1);
//! // Grouped records come first, then singletons.
//! assert_eq!(clustered[0].full_path, "/a/1.jpg");
//! assert_eq!(clustered[1].full_path, "/b/1.jpg");
//! assert_eq!(clustered[2].group_id, None);
//! ```

use std::collections::HashSet;

use crate::record::{FileRecord, Fingerprint, FingerprintMetric, HammingMetric};

use super::EngineError;

/// A cluster seed: the fingerprint of its first member plus member indices.
#[derive(Debug, Clone)]
struct Representative {
    fingerprint: Fingerprint,
    members: Vec<usize>,
}

/// Statistics from a clustering run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterSummary {
    /// Number of records supplied
    pub total_records: usize,
    /// Records that carried a fingerprint
    pub fingerprinted: usize,
    /// Records without a fingerprint (never clustered)
    pub unfingerprinted: usize,
    /// Number of duplicate groups formed
    pub groups: usize,
    /// Records assigned to a duplicate group
    pub grouped_records: usize,
    /// Records left without a group
    pub singletons: usize,
}

/// Cluster records with the default Hamming metric.
///
/// See [`cluster_with_metric`].
///
/// # Errors
///
/// Returns [`EngineError::DuplicatePath`] if two records share a `full_path`.
pub fn cluster(
    records: Vec<FileRecord>,
    threshold: u32,
) -> Result<(Vec<FileRecord>, ClusterSummary), EngineError> {
    cluster_with_metric(records, threshold, &HammingMetric)
}

/// Cluster records into near-duplicate groups.
///
/// Any `group_id` already present on the input is discarded. The output holds
/// every input record exactly once: grouped records first, then singletons,
/// each block in input order.
///
/// A threshold of 0 never matches anything, since no distance is strictly
/// below zero.
///
/// # Errors
///
/// Returns [`EngineError::DuplicatePath`] if two records share a `full_path`.
pub fn cluster_with_metric<M: FingerprintMetric + ?Sized>(
    mut records: Vec<FileRecord>,
    threshold: u32,
    metric: &M,
) -> Result<(Vec<FileRecord>, ClusterSummary), EngineError> {
    ensure_unique_paths(&records)?;

    let mut summary = ClusterSummary {
        total_records: records.len(),
        ..ClusterSummary::default()
    };
    let mut representatives: Vec<Representative> = Vec::new();

    for (idx, record) in records.iter_mut().enumerate() {
        record.group_id = None;

        let Some(fingerprint) = record.fingerprint.as_ref() else {
            summary.unfingerprinted += 1;
            log::trace!("Not clustering {} (no fingerprint)", record.full_path);
            continue;
        };
        summary.fingerprinted += 1;

        let existing = representatives
            .iter_mut()
            .find(|rep| metric.distance(&rep.fingerprint, fingerprint) < threshold);

        match existing {
            Some(rep) => rep.members.push(idx),
            None => representatives.push(Representative {
                fingerprint: fingerprint.clone(),
                members: vec![idx],
            }),
        }
    }

    let mut next_id = 1u32;
    for rep in representatives.iter().filter(|rep| rep.members.len() > 1) {
        for &member in &rep.members {
            records[member].group_id = Some(next_id);
        }
        log::debug!(
            "Group {}: {} members (seed {})",
            next_id,
            rep.members.len(),
            rep.fingerprint
        );
        summary.groups += 1;
        summary.grouped_records += rep.members.len();
        next_id += 1;
    }
    summary.singletons = summary.total_records - summary.grouped_records;

    let (mut ordered, singletons): (Vec<FileRecord>, Vec<FileRecord>) =
        records.into_iter().partition(FileRecord::is_grouped);
    ordered.extend(singletons);

    log::debug!(
        "Clustered {} records ({} fingerprinted) into {} group(s), {} singleton(s)",
        summary.total_records,
        summary.fingerprinted,
        summary.groups,
        summary.singletons
    );

    Ok((ordered, summary))
}

/// Reject record sets whose keys are not unique.
pub(crate) fn ensure_unique_paths(records: &[FileRecord]) -> Result<(), EngineError> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.full_path.as_str()) {
            return Err(EngineError::DuplicatePath(record.full_path.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordIssue;

    fn media(path: &str, bits: u64) -> FileRecord {
        FileRecord::new(path, "./").with_fingerprint(Fingerprint::from_u64(bits))
    }

    fn paths(records: &[FileRecord]) -> Vec<&str> {
        records.iter().map(|r| r.full_path.as_str()).collect()
    }

    #[test]
    fn test_cluster_empty_input() {
        let (records, summary) = cluster(Vec::new(), 5).unwrap();
        assert!(records.is_empty());
        assert_eq!(summary, ClusterSummary::default());
    }

    #[test]
    fn test_cluster_groups_before_singletons() {
        let records = vec![
            media("/s1.jpg", 0xFFFF_0000),
            media("/g1.jpg", 0),
            FileRecord::new("/notes.txt", "./"),
            media("/g2.jpg", 0b11),
        ];
        let (out, summary) = cluster(records, 5).unwrap();

        assert_eq!(paths(&out), vec!["/g1.jpg", "/g2.jpg", "/s1.jpg", "/notes.txt"]);
        assert_eq!(out[0].group_id, Some(1));
        assert_eq!(out[1].group_id, Some(1));
        assert_eq!(out[2].group_id, None);
        assert_eq!(summary.groups, 1);
        assert_eq!(summary.grouped_records, 2);
        assert_eq!(summary.singletons, 2);
        assert_eq!(summary.unfingerprinted, 1);
    }

    #[test]
    fn test_threshold_is_strict() {
        // Distance exactly equal to the threshold does not match.
        let records = vec![media("/a.jpg", 0), media("/b.jpg", 0b11111)];
        let (out, _) = cluster(records.clone(), 5).unwrap();
        assert!(out.iter().all(|r| r.group_id.is_none()));

        let (out, _) = cluster(records, 6).unwrap();
        assert!(out.iter().all(|r| r.group_id == Some(1)));
    }

    #[test]
    fn test_threshold_zero_disables_clustering() {
        let records = vec![media("/a.jpg", 7), media("/b.jpg", 7)];
        let (out, summary) = cluster(records, 0).unwrap();
        assert_eq!(summary.groups, 0);
        assert!(out.iter().all(|r| r.group_id.is_none()));
    }

    #[test]
    fn test_first_fit_joins_earliest_representative() {
        // c is within range of both seeds; it joins the first created one.
        let records = vec![
            media("/a.jpg", 0b0000_0000),
            media("/b.jpg", 0b1111_0000),
            media("/c.jpg", 0b0011_0000),
            media("/d.jpg", 0b1111_1000),
        ];
        let (out, _) = cluster(records, 3).unwrap();

        let group_of = |p: &str| out.iter().find(|r| r.full_path == p).unwrap().group_id;
        assert_eq!(group_of("/a.jpg"), Some(1));
        assert_eq!(group_of("/c.jpg"), Some(1));
        assert_eq!(group_of("/b.jpg"), Some(2));
        assert_eq!(group_of("/d.jpg"), Some(2));
    }

    #[test]
    fn test_order_dependence_across_permutations() {
        // a~b and b~c but not a~c.
        let a = media("/a.jpg", 0b0000);
        let b = media("/b.jpg", 0b0011);
        let c = media("/c.jpg", 0b1111);

        let (out, _) = cluster(vec![a.clone(), b.clone(), c.clone()], 3).unwrap();
        assert_eq!(paths(&out), vec!["/a.jpg", "/b.jpg", "/c.jpg"]);
        assert_eq!(out[2].group_id, None);

        let (out, _) = cluster(vec![b, a, c], 3).unwrap();
        assert_eq!(out.iter().filter(|r| r.group_id == Some(1)).count(), 3);
    }

    #[test]
    fn test_ids_dense_in_creation_order() {
        let records = vec![
            media("/lonely.jpg", u64::MAX),
            media("/x1.jpg", 0xFF00),
            media("/y1.jpg", 0),
            media("/x2.jpg", 0xFF00),
            media("/y2.jpg", 0),
        ];
        let (out, summary) = cluster(records, 2).unwrap();
        assert_eq!(summary.groups, 2);
        assert_eq!(
            out.iter().map(|r| r.group_id).collect::<Vec<_>>(),
            vec![Some(1), Some(2), Some(1), Some(2), None]
        );
    }

    #[test]
    fn test_stale_group_ids_are_cleared() {
        let mut stale = media("/a.jpg", 0);
        stale.group_id = Some(9);
        let (out, _) = cluster(vec![stale], 5).unwrap();
        assert_eq!(out[0].group_id, None);
    }

    #[test]
    fn test_failed_fingerprint_never_grouped() {
        let failed = FileRecord::new("/broken.jpg", "./")
            .with_size(10)
            .with_issue(RecordIssue::FingerprintFailed("truncated".into()));
        let records = vec![media("/a.jpg", 0), media("/b.jpg", 0), failed];
        let (out, summary) = cluster(records, 5).unwrap();
        assert_eq!(out[2].full_path, "/broken.jpg");
        assert_eq!(out[2].group_id, None);
        assert_eq!(summary.unfingerprinted, 1);
    }

    #[test]
    fn test_duplicate_path_rejected() {
        let records = vec![media("/a.jpg", 0), media("/a.jpg", 1)];
        let err = cluster(records, 5).unwrap_err();
        assert_eq!(err, EngineError::DuplicatePath("/a.jpg".to_string()));
    }

    #[test]
    fn test_custom_metric() {
        let always_near = |_: &Fingerprint, _: &Fingerprint| 0u32;
        let records = vec![media("/a.jpg", 0), media("/b.jpg", u64::MAX)];
        let (out, _) = cluster_with_metric(records, 1, &always_near).unwrap();
        assert!(out.iter().all(|r| r.group_id == Some(1)));
    }
}
