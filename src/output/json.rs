//! JSON report of a resolved record set.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "file_list": [
//!     {
//!       "name": "a.jpg",
//!       "directory": "./trip",
//!       "path": "/photos/trip/a.jpg",
//!       "size": 2048,
//!       "modified": "2024-01-02 03:04:05",
//!       "group": 1,
//!       "delete": "No"
//!     }
//!   ],
//!   "group_statuses": { "1": "Only 1 file" },
//!   "summary": {
//!     "total_records": 10,
//!     "groups": 1,
//!     "grouped_records": 2,
//!     "marked_records": 1,
//!     "reclaimable_bytes": 2048
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::io::Write;

use serde::Serialize;

use crate::duplicates::{derive_statuses, GroupStatus, GroupingStats};
use crate::record::{FileRecord, Modified};

use super::table::delete_label;

/// A single record in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRecord {
    /// File name
    pub name: String,
    /// Directory relative to the scan root
    pub directory: String,
    /// Full path
    pub path: String,
    /// Size in bytes, `null` when unknown
    pub size: Option<u64>,
    /// Last modified time, `null` when unknown
    pub modified: Option<String>,
    /// Duplicate group, `null` for singletons
    pub group: Option<u32>,
    /// `Yes` or `No`
    pub delete: &'static str,
    /// Warning recorded for this file, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,
}

impl From<&FileRecord> for JsonRecord {
    fn from(record: &FileRecord) -> Self {
        Self {
            name: record.name.clone(),
            directory: record.directory.clone(),
            path: record.full_path.clone(),
            size: record.size.bytes(),
            modified: match record.modified {
                Modified::Known(_) => Some(record.modified.to_string()),
                Modified::Unknown => None,
            },
            group: record.group_id,
            delete: delete_label(record.marked_for_deletion),
            issue: record.issue.as_ref().map(ToString::to_string),
        }
    }
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Total number of records
    pub total_records: usize,
    /// Number of duplicate groups
    pub groups: usize,
    /// Records belonging to a group
    pub grouped_records: usize,
    /// Records marked for deletion
    pub marked_records: usize,
    /// Bytes freed by deleting marked records
    pub reclaimable_bytes: u64,
}

impl From<GroupingStats> for JsonSummary {
    fn from(stats: GroupingStats) -> Self {
        Self {
            total_records: stats.total_records,
            groups: stats.groups,
            grouped_records: stats.grouped_records,
            marked_records: stats.marked_records,
            reclaimable_bytes: stats.reclaimable_bytes,
        }
    }
}

/// Complete JSON report.
#[derive(Debug, Clone, Serialize)]
pub struct JsonReport {
    /// Records in table order
    pub file_list: Vec<JsonRecord>,
    /// Status per group id
    pub group_statuses: BTreeMap<u32, GroupStatus>,
    /// Summary statistics
    pub summary: JsonSummary,
}

impl JsonReport {
    /// Build a report for a record set.
    #[must_use]
    pub fn new(records: &[FileRecord]) -> Self {
        Self {
            file_list: records.iter().map(JsonRecord::from).collect(),
            group_statuses: derive_statuses(records),
            summary: GroupingStats::from_records(records).into(),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordIssue;

    fn sample() -> Vec<FileRecord> {
        let mut a = FileRecord::new("/p/a.jpg", "./p").with_size(100);
        let mut b = FileRecord::new("/p/b.jpg", "./p").with_size(300);
        a.group_id = Some(1);
        b.group_id = Some(1);
        b.marked_for_deletion = true;
        let c = FileRecord::new("/p/c.mp4", "./p")
            .with_issue(RecordIssue::UnsupportedMedia("mp4".into()));
        vec![a, b, c]
    }

    #[test]
    fn test_report_contents() {
        let report = JsonReport::new(&sample());
        assert_eq!(report.file_list.len(), 3);
        assert_eq!(report.group_statuses[&1], GroupStatus::OnlyOneFile);
        assert_eq!(report.summary.reclaimable_bytes, 300);
        assert_eq!(report.file_list[1].delete, "Yes");
    }

    #[test]
    fn test_json_shape() {
        let json = JsonReport::new(&sample()).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["group_statuses"]["1"], "Only 1 file");
        assert_eq!(value["file_list"][0]["size"], 100);
        assert!(value["file_list"][0]["modified"].is_null());
        assert!(value["file_list"][0].get("issue").is_none());
        assert_eq!(value["file_list"][2]["issue"], "unsupported media: mp4");
        assert!(value["file_list"][2]["group"].is_null());
    }

    #[test]
    fn test_write_to_pretty() {
        let mut buffer = Vec::new();
        JsonReport::new(&[]).write_to(&mut buffer, true).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains('\n'));
        assert!(text.ends_with("}\n"));
    }
}
