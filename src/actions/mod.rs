//! File actions.
//!
//! The delete module removes the files a resolved table marks for deletion:
//! - Move to system trash (default, recoverable)
//! - Permanent deletion (requires explicit configuration)
//! - Dry run reporting
//!
//! ```no_run
//! use dupesift::actions::{delete_marked, DeleteConfig};
//! use dupesift::output::load_table;
//! use std::path::Path;
//!
//! let records = load_table(Path::new("file_list.csv")).unwrap();
//! let report = delete_marked(&records, &DeleteConfig::trash());
//! ```

pub mod delete;

pub use delete::{
    delete_marked, delete_to_trash, fully_marked_groups, permanent_delete, DeleteConfig,
    DeleteError, DeletionReport,
};
