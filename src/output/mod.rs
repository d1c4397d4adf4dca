//! Output formatting module

pub mod formatter;
pub mod human;
pub mod json;

pub use formatter::{format_history, format_removals, format_result, OutputFormat};
pub use human::{format_changes_human, short_id};
