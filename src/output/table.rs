//! The persisted record table (CSV).
//!
//! One row per record, grouped rows first. An optional blank row separates
//! the grouped block from the singletons; readers skip it.
//!
//! # Columns
//!
//! - `File Name`: file name without directory
//! - `Directory Path`: directory relative to the scan root (`./`, `./sub`)
//! - `File Path`: full path, the record key
//! - `File Size (bytes)`: size, or `N/A` when unknown
//! - `Last Modified`: `YYYY-MM-DD HH:MM:SS` local time, or `N/A`
//! - `Duplicate Group`: group number, empty for singletons
//! - `Delete`: `Yes` or `No` (read case-insensitively)
//!
//! # Example
//!
//! ```
//! use dupesift::output::table::{read_table, TableOutput};
//! use dupesift::record::FileRecord;
//!
//! let records = vec![FileRecord::new("/pics/a.jpg", "./").with_size(10)];
//! let csv = TableOutput::new(&records).to_string().unwrap();
//! assert!(csv.starts_with("File Name,Directory Path,File Path"));
//!
//! let back = read_table(csv.as_bytes()).unwrap();
//! assert_eq!(back[0].full_path, "/pics/a.jpg");
//! ```

use std::collections::HashSet;
use std::fs::File;
use std::io;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::{FileRecord, FileSize, Modified, MODIFIED_FORMAT, UNKNOWN_SENTINEL};

/// Column headers, in order.
pub const HEADERS: [&str; 7] = [
    "File Name",
    "Directory Path",
    "File Path",
    "File Size (bytes)",
    "Last Modified",
    "Duplicate Group",
    "Delete",
];

/// Errors that can occur while reading or writing the table.
#[derive(Debug, Error)]
pub enum TableError {
    /// I/O error during reading or writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during CSV (de)serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The header row does not match the expected layout.
    #[error("unexpected table header: {0}")]
    Header(String),

    /// Two rows share the same `File Path`.
    #[error("row {row}: duplicate file path {path:?}")]
    DuplicatePath {
        /// 1-based line number of the repeated row
        row: u64,
        /// The repeated path
        path: String,
    },

    /// A cell could not be parsed.
    #[error("row {row}: invalid {column} value {value:?}")]
    Malformed {
        /// 1-based line number in the file
        row: u64,
        /// Column name
        column: &'static str,
        /// Offending cell text
        value: String,
    },
}

/// A single row of the table.
#[derive(Debug, Serialize, Deserialize)]
struct TableRow {
    #[serde(rename = "File Name")]
    name: String,
    #[serde(rename = "Directory Path")]
    directory: String,
    #[serde(rename = "File Path")]
    full_path: String,
    #[serde(rename = "File Size (bytes)")]
    size: String,
    #[serde(rename = "Last Modified")]
    modified: String,
    #[serde(rename = "Duplicate Group")]
    group: String,
    #[serde(rename = "Delete")]
    delete: String,
}

impl From<&FileRecord> for TableRow {
    fn from(record: &FileRecord) -> Self {
        Self {
            name: record.name.clone(),
            directory: record.directory.clone(),
            full_path: record.full_path.clone(),
            size: record.size.to_string(),
            modified: record.modified.to_string(),
            group: record.group_id.map(|g| g.to_string()).unwrap_or_default(),
            delete: delete_label(record.marked_for_deletion).to_string(),
        }
    }
}

impl TableRow {
    fn is_blank(&self) -> bool {
        [
            &self.name,
            &self.directory,
            &self.full_path,
            &self.size,
            &self.modified,
            &self.group,
            &self.delete,
        ]
        .iter()
        .all(|cell| cell.trim().is_empty())
    }

    fn into_record(self, row: u64) -> Result<FileRecord, TableError> {
        let malformed = |column: &'static str, value: &str| TableError::Malformed {
            row,
            column,
            value: value.to_string(),
        };

        let size = if is_unknown(&self.size) {
            FileSize::Unknown
        } else {
            self.size
                .trim()
                .parse()
                .map(FileSize::Known)
                .map_err(|_| malformed(HEADERS[3], &self.size))?
        };

        let modified = if is_unknown(&self.modified) {
            Modified::Unknown
        } else {
            NaiveDateTime::parse_from_str(self.modified.trim(), MODIFIED_FORMAT)
                .map(Modified::Known)
                .map_err(|_| malformed(HEADERS[4], &self.modified))?
        };

        let group_id = match self.group.trim() {
            "" => None,
            g => match g.parse::<u32>() {
                Ok(id) if id > 0 => Some(id),
                _ => return Err(malformed(HEADERS[5], &self.group)),
            },
        };

        Ok(FileRecord {
            name: self.name,
            directory: self.directory,
            full_path: self.full_path,
            size,
            modified,
            fingerprint: None,
            group_id,
            marked_for_deletion: self.delete.trim().eq_ignore_ascii_case("yes"),
            issue: None,
        })
    }
}

fn is_unknown(cell: &str) -> bool {
    let cell = cell.trim();
    cell.is_empty() || cell.eq_ignore_ascii_case(UNKNOWN_SENTINEL) || cell.eq_ignore_ascii_case("unknown")
}

/// `Yes`/`No` label for a deletion flag.
#[must_use]
pub fn delete_label(marked: bool) -> &'static str {
    if marked {
        "Yes"
    } else {
        "No"
    }
}

/// Table writer.
pub struct TableOutput<'a> {
    records: &'a [FileRecord],
    separator_row: bool,
}

impl<'a> TableOutput<'a> {
    /// Create a writer for `records`, in the order given.
    #[must_use]
    pub fn new(records: &'a [FileRecord]) -> Self {
        Self {
            records,
            separator_row: false,
        }
    }

    /// Insert a blank row between grouped records and singletons.
    #[must_use]
    pub fn with_separator_row(mut self, separator_row: bool) -> Self {
        self.separator_row = separator_row;
        self
    }

    /// Write the table to the given writer.
    ///
    /// # Errors
    ///
    /// Returns `TableError` if writing or serialization fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), TableError> {
        // Header written by hand so empty tables still carry it.
        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        csv_writer.write_record(HEADERS)?;

        let has_grouped = self.records.iter().any(FileRecord::is_grouped);
        let mut separated = false;

        for record in self.records {
            if self.separator_row && has_grouped && !separated && !record.is_grouped() {
                csv_writer.write_record([""; 7])?;
                separated = true;
            }
            csv_writer.serialize(TableRow::from(record))?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Generate the table as a string.
    ///
    /// # Errors
    ///
    /// Returns `TableError` if serialization fails.
    pub fn to_string(&self) -> Result<String, TableError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }

    /// Write the table to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns `TableError` if the file cannot be created or written.
    pub fn save(&self, path: &Path) -> Result<(), TableError> {
        let file = File::create(path)?;
        self.write_to(io::BufWriter::new(file))?;
        log::debug!("Wrote {} rows to {}", self.records.len(), path.display());
        Ok(())
    }
}

/// Read a table, skipping blank separator rows.
///
/// # Errors
///
/// Returns `TableError` on I/O or CSV errors, an unexpected header, a
/// repeated `File Path`, or an unparsable size, timestamp, or group cell.
pub fn read_table<R: io::Read>(reader: R) -> Result<Vec<FileRecord>, TableError> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(false).from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    if headers.iter().map(str::trim).ne(HEADERS.iter().copied()) {
        return Err(TableError::Header(headers.iter().collect::<Vec<_>>().join(",")));
    }

    let mut records = Vec::new();
    let mut seen = HashSet::new();
    for result in csv_reader.records() {
        let raw = result?;
        let line = raw.position().map_or(0, csv::Position::line);
        let row: TableRow = raw.deserialize(Some(&headers))?;
        if row.is_blank() {
            continue;
        }
        if !seen.insert(row.full_path.clone()) {
            return Err(TableError::DuplicatePath {
                row: line,
                path: row.full_path,
            });
        }
        records.push(row.into_record(line)?);
    }
    Ok(records)
}

/// Read the table stored at `path`.
///
/// # Errors
///
/// See [`read_table`].
pub fn load_table(path: &Path) -> Result<Vec<FileRecord>, TableError> {
    let file = File::open(path)?;
    let records = read_table(io::BufReader::new(file))?;
    log::debug!("Read {} rows from {}", records.len(), path.display());
    Ok(records)
}
