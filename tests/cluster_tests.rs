use dupesift::duplicates::{cluster, cluster_with_metric, EngineError};
use dupesift::record::{FileRecord, Fingerprint, RecordIssue};

fn fp_record(path: &str, dir: &str, bits: u64) -> FileRecord {
    FileRecord::new(path, dir).with_fingerprint(Fingerprint::from_u64(bits))
}

fn paths(records: &[FileRecord]) -> Vec<&str> {
    records.iter().map(|r| r.full_path.as_str()).collect()
}

fn groups(records: &[FileRecord]) -> Vec<Option<u32>> {
    records.iter().map(|r| r.group_id).collect()
}

#[test]
fn test_empty_input() {
    let (records, summary) = cluster(Vec::new(), 5).unwrap();
    assert!(records.is_empty());
    assert_eq!(summary.groups, 0);
    assert_eq!(summary.total_records, 0);
}

#[test]
fn test_mutually_near_records_form_one_group() {
    let records = vec![
        fp_record("/p1/a.jpg", "/p1", 0b000),
        fp_record("/p2/b.jpg", "/p2", 0b001),
        fp_record("/p1/c.jpg", "/p1", 0b011),
    ];
    let (out, summary) = cluster(records, 5).unwrap();

    assert_eq!(summary.groups, 1);
    assert_eq!(summary.grouped_records, 3);
    assert_eq!(groups(&out), vec![Some(1), Some(1), Some(1)]);
}

#[test]
fn test_threshold_is_exclusive() {
    // Distance 5 with threshold 5 does not match.
    let records = vec![
        fp_record("/a.jpg", "./", 0),
        fp_record("/b.jpg", "./", 0b1_1111),
    ];
    let (out, summary) = cluster(records.clone(), 5).unwrap();
    assert_eq!(summary.groups, 0);
    assert!(out.iter().all(|r| r.group_id.is_none()));

    let (_, summary) = cluster(records, 6).unwrap();
    assert_eq!(summary.groups, 1);
}

#[test]
fn test_threshold_zero_never_groups() {
    let records = vec![
        fp_record("/a.jpg", "./", 42),
        fp_record("/b.jpg", "./", 42),
    ];
    let (out, summary) = cluster(records, 0).unwrap();
    assert_eq!(summary.groups, 0);
    assert_eq!(summary.singletons, 2);
    assert!(out.iter().all(|r| r.group_id.is_none()));
}

#[test]
fn test_grouped_block_precedes_singletons_in_input_order() {
    let records = vec![
        fp_record("/s1.jpg", "./", 0xFFFF_0000),
        fp_record("/g1.jpg", "./", 0),
        FileRecord::new("/notes.txt", "./"),
        fp_record("/h1.jpg", "./", u64::MAX),
        fp_record("/g2.jpg", "./", 1),
        fp_record("/h2.jpg", "./", u64::MAX - 1),
    ];
    let (out, summary) = cluster(records, 5).unwrap();

    assert_eq!(
        paths(&out),
        vec!["/g1.jpg", "/h1.jpg", "/g2.jpg", "/h2.jpg", "/s1.jpg", "/notes.txt"]
    );
    assert_eq!(
        groups(&out),
        vec![Some(1), Some(2), Some(1), Some(2), None, None]
    );
    assert_eq!(summary.groups, 2);
    assert_eq!(summary.singletons, 2);
    assert_eq!(summary.unfingerprinted, 1);
}

#[test]
fn test_group_ids_are_dense_and_skip_singleton_representatives() {
    // The first representative stays alone; ids still start at 1.
    let records = vec![
        fp_record("/lonely.jpg", "./", 0xFFFF_FFFF_0000_0000),
        fp_record("/a.jpg", "./", 0),
        fp_record("/b.jpg", "./", 0),
        fp_record("/c.jpg", "./", 0x0000_0000_FFFF_FFFF),
        fp_record("/d.jpg", "./", 0x0000_0000_FFFF_FFFF),
    ];
    let (out, _) = cluster(records, 3).unwrap();

    let mut ids: Vec<u32> = out.iter().filter_map(|r| r.group_id).collect();
    ids.dedup();
    assert_eq!(ids, vec![1, 2]);
}

#[test]
fn test_first_fit_is_order_dependent() {
    // A~B and B~C, but A is not near C.
    let a = || fp_record("/a.jpg", "./", 0b0000);
    let b = || fp_record("/b.jpg", "./", 0b0011);
    let c = || fp_record("/c.jpg", "./", 0b1111);

    let (out, _) = cluster(vec![a(), b(), c()], 3).unwrap();
    assert_eq!(paths(&out), vec!["/a.jpg", "/b.jpg", "/c.jpg"]);
    assert_eq!(groups(&out), vec![Some(1), Some(1), None]);

    let (out, _) = cluster(vec![b(), a(), c()], 3).unwrap();
    assert_eq!(groups(&out), vec![Some(1), Some(1), Some(1)]);

    // Same order, same result.
    let (again, _) = cluster(vec![a(), b(), c()], 3).unwrap();
    assert_eq!(groups(&again), vec![Some(1), Some(1), None]);
}

#[test]
fn test_record_without_fingerprint_never_joins() {
    let failed = FileRecord::new("/p/broken.jpg", "/p")
        .with_size(100)
        .with_issue(RecordIssue::FingerprintFailed("truncated".into()));
    let records = vec![
        fp_record("/p/a.jpg", "/p", 7).with_size(100),
        failed,
        fp_record("/p/b.jpg", "/p", 7).with_size(100),
    ];
    let (out, _) = cluster(records, 5).unwrap();

    let broken = out.iter().find(|r| r.full_path == "/p/broken.jpg").unwrap();
    assert_eq!(broken.group_id, None);
    assert!(broken.issue.is_some());
    assert_eq!(out.len(), 3);
}

#[test]
fn test_stale_group_ids_are_cleared() {
    let mut stale = FileRecord::new("/x.txt", "./");
    stale.group_id = Some(9);
    let (out, _) = cluster(vec![stale], 5).unwrap();
    assert_eq!(out[0].group_id, None);
}

#[test]
fn test_duplicate_path_is_rejected() {
    let records = vec![
        fp_record("/same.jpg", "./", 0),
        fp_record("/same.jpg", "./", 1),
    ];
    assert_eq!(
        cluster(records, 5).unwrap_err(),
        EngineError::DuplicatePath("/same.jpg".to_string())
    );
}

#[test]
fn test_custom_metric() {
    // Compare only the first byte.
    let first_byte =
        |a: &Fingerprint, b: &Fingerprint| u32::from(a.as_bytes()[0].abs_diff(b.as_bytes()[0]));
    let records = vec![
        FileRecord::new("/a", "./").with_fingerprint(Fingerprint::from_bytes(&[10, 0])),
        FileRecord::new("/b", "./").with_fingerprint(Fingerprint::from_bytes(&[12, 255])),
    ];
    let (out, summary) = cluster_with_metric(records, 3, &first_byte).unwrap();
    assert_eq!(summary.groups, 1);
    assert!(out.iter().all(|r| r.group_id == Some(1)));
}

#[test]
fn test_mismatched_widths_never_group() {
    let records = vec![
        FileRecord::new("/a", "./").with_fingerprint(Fingerprint::from_bytes(&[0; 8])),
        FileRecord::new("/b", "./").with_fingerprint(Fingerprint::from_bytes(&[0; 16])),
    ];
    let (_, summary) = cluster(records, 64).unwrap();
    assert_eq!(summary.groups, 0);
}
