//! Change-set pruning
//!
//! Engines report a directory as modified whenever anything beneath it
//! changes. Those entries add nothing once the deeper change is listed, so
//! [`prune_changes`] drops them, along with the work mount itself.

use crate::engine::{Change, ChangeKind, WORK_MOUNT};

/// Reduce `changes` to its meaningful entries, keeping their order.
///
/// Walks the list backwards remembering the last kept path. Added and
/// removed entries are always kept; a modified entry is kept only when it is
/// not that path or one of its ancestors.
pub fn prune_changes(changes: &[Change]) -> Vec<Change> {
    let mut kept: Vec<Change> = Vec::new();
    let mut last_kept: Option<&str> = None;

    for change in changes.iter().rev() {
        if change.path == WORK_MOUNT {
            continue;
        }

        let redundant = change.kind == ChangeKind::Modified
            && last_kept.is_some_and(|last| is_ancestor_or_self(&change.path, last));
        if redundant {
            continue;
        }

        kept.push(change.clone());
        last_kept = Some(&change.path);
    }

    kept.reverse();
    kept
}

fn is_ancestor_or_self(dir: &str, path: &str) -> bool {
    match path.strip_prefix(dir) {
        Some("") => true,
        Some(rest) => rest.starts_with('/') || dir.ends_with('/'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(path: &str, kind: ChangeKind) -> Change {
        Change::new(path, kind)
    }

    #[test]
    fn test_prune_changes() {
        let changes = vec![
            change("/tmp", ChangeKind::Modified),
            change("/tmp/foo", ChangeKind::Added),
            change("/tmp/foo/banana", ChangeKind::Added),
            change("/tmp/bar", ChangeKind::Removed),
            change("/tmp/bar/banana", ChangeKind::Removed),
        ];

        let expected = vec![
            change("/tmp/foo", ChangeKind::Added),
            change("/tmp/foo/banana", ChangeKind::Added),
            change("/tmp/bar", ChangeKind::Removed),
            change("/tmp/bar/banana", ChangeKind::Removed),
        ];
        assert_eq!(prune_changes(&changes), expected);
    }

    #[test]
    fn test_prune_drops_work_mount() {
        let changes = vec![
            change("/work", ChangeKind::Modified),
            change("/etc/hosts", ChangeKind::Modified),
        ];
        assert_eq!(prune_changes(&changes), vec![change("/etc/hosts", ChangeKind::Modified)]);
    }

    #[test]
    fn test_prune_keeps_unrelated_modified_dirs() {
        let changes = vec![
            change("/etc", ChangeKind::Modified),
            change("/etc/apt", ChangeKind::Added),
            change("/var", ChangeKind::Modified),
        ];
        assert_eq!(
            prune_changes(&changes),
            vec![change("/etc/apt", ChangeKind::Added), change("/var", ChangeKind::Modified)]
        );
    }

    #[test]
    fn test_prune_sibling_with_shared_prefix_is_kept() {
        let changes = vec![
            change("/tmp", ChangeKind::Modified),
            change("/tmpfiles", ChangeKind::Added),
        ];
        assert_eq!(prune_changes(&changes), changes);
    }

    #[test]
    fn test_prune_root() {
        let changes = vec![
            change("/", ChangeKind::Modified),
            change("/root", ChangeKind::Modified),
            change("/root/.bash_history", ChangeKind::Added),
        ];
        assert_eq!(
            prune_changes(&changes),
            vec![change("/root/.bash_history", ChangeKind::Added)]
        );
    }

    #[test]
    fn test_prune_empty() {
        assert!(prune_changes(&[]).is_empty());
    }
}
