//! Manual keep/delete toggling of single records.

use crate::record::FileRecord;

use super::cluster::ensure_unique_paths;
use super::EngineError;

/// Set the deletion flag of the record at `full_path`.
///
/// Returns `true` if the flag changed.
///
/// # Errors
///
/// Returns [`EngineError::DuplicatePath`] if two records share a path, and
/// [`EngineError::UnknownPath`] if no record has that path.
pub fn set_marked(
    records: &mut [FileRecord],
    full_path: &str,
    delete: bool,
) -> Result<bool, EngineError> {
    ensure_unique_paths(records)?;
    let record = records
        .iter_mut()
        .find(|r| r.full_path == full_path)
        .ok_or_else(|| EngineError::UnknownPath(full_path.to_string()))?;

    let changed = record.marked_for_deletion != delete;
    record.marked_for_deletion = delete;
    if changed {
        log::debug!(
            "{} {}",
            if delete { "Marked" } else { "Unmarked" },
            full_path
        );
    }
    Ok(changed)
}
