//! Human-readable output formatting

use bytesize::ByteSize;
use console::style;

use crate::changes::prune_changes;
use crate::engine::{Change, ChangeKind};
use crate::eval::EvalResult;
use crate::workspace::{RemovalOutcome, Workspace};

pub fn format_result_human(res: &EvalResult) -> String {
    let mut output = format!(
        "Exit: {}\n\
         Took: {:.2?}\n\
         From: {}\n",
        res.code,
        res.duration,
        short_id(&res.image)
    );
    if let Some(ref image) = res.new_image {
        output.push_str(&format!("Committed: {}\n", short_id(image)));
    }
    output.push_str(&format!("Output: {}\n", ByteSize(res.log.len() as u64)));
    output.push_str(&format_changes_human(&res.changes));
    output
}

/// Pruned change list, one coloured line per entry
pub fn format_changes_human(changes: &[Change]) -> String {
    let mut output = String::from("Changes:\n");
    let pruned = prune_changes(changes);
    if pruned.is_empty() {
        output.push_str("<none>\n");
        return output;
    }

    for change in &pruned {
        let line = format!("{} {}", change.kind.symbol(), change.path);
        let styled = match change.kind {
            ChangeKind::Modified => style(line).yellow(),
            ChangeKind::Added => style(line).green(),
            ChangeKind::Removed => style(line).red(),
        };
        output.push_str(&format!("{}\n", styled));
    }
    output
}

/// History table. Live entries are numbered, the head is marked with `>`,
/// tombstoned entries get no number.
pub fn format_history_human(ws: &Workspace) -> String {
    if ws.history().is_empty() {
        return "No history".to_string();
    }

    let mut output = format!(
        "{:<5} {:<40} {:>5}  {}\n",
        "ITEM", "COMMAND", "EXIT", "CREATED IMAGE"
    );
    output.push_str(&"-".repeat(66));
    output.push('\n');

    let mut n = 1;
    for entry in ws.history() {
        let item = if entry.deleted {
            String::new()
        } else {
            let item = if entry.new_image.as_deref() == Some(ws.current_image()) {
                format!(">{}", n)
            } else {
                format!("{:>2}", n)
            };
            n += 1;
            item
        };

        output.push_str(&format!(
            "{:<5} {:<40} {:>5}  {}\n",
            item,
            truncate(&entry.command, 40),
            entry.code,
            entry.new_image.as_deref().map(short_id).unwrap_or("")
        ));
    }
    output
}

pub fn format_removals_human(outcomes: &[RemovalOutcome]) -> String {
    let mut output = String::new();
    for outcome in outcomes {
        match &outcome.error {
            Some(e) => output.push_str(&format!("{}\n", style(e).red())),
            None => output.push_str(&format!("Deleted: {}\n", short_id(&outcome.container_id))),
        }
    }
    output
}

/// First 12 hex digits of a full engine id; anything else unchanged
pub fn short_id(id: &str) -> &str {
    let hex = id.strip_prefix("sha256:").unwrap_or(id);
    if hex.len() == 64 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        &hex[..12]
    } else {
        id
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
