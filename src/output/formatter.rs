//! Output formatting

use crate::eval::EvalResult;
use crate::output::human::{format_history_human, format_removals_human, format_result_human};
use crate::output::json::{format_history_json, format_removals_json, format_result_json};
use crate::workspace::{RemovalOutcome, Workspace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

pub fn format_result(res: &EvalResult, format: &OutputFormat) -> String {
    match format {
        OutputFormat::Human => format_result_human(res),
        OutputFormat::Json => format_result_json(res),
    }
}

pub fn format_history(ws: &Workspace, format: &OutputFormat) -> String {
    match format {
        OutputFormat::Human => format_history_human(ws),
        OutputFormat::Json => format_history_json(ws),
    }
}

pub fn format_removals(outcomes: &[RemovalOutcome], format: &OutputFormat) -> String {
    match format {
        OutputFormat::Human => format_removals_human(outcomes),
        OutputFormat::Json => format_removals_json(outcomes),
    }
}
