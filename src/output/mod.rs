//! Output formats for record sets.
//!
//! - [`table`]: the persisted CSV table, read back for later resolution steps
//! - [`json`]: a resolution report for scripting

pub mod json;
pub mod table;

pub use json::JsonReport;
pub use table::{load_table, read_table, TableError, TableOutput};
