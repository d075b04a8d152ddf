use git2::{Commit, Patch, Repository};

use crate::models::DiffStats;

/// One contiguous run of changed lines inside a hunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    Insert { added: usize },
    Delete { removed: usize },
    Replace { removed: usize, added: usize },
}

impl Edit {
    fn from_counts(removed: usize, added: usize) -> Option<Self> {
        match (removed, added) {
            (0, 0) => None,
            (0, added) => Some(Edit::Insert { added }),
            (removed, 0) => Some(Edit::Delete { removed }),
            (removed, added) => Some(Edit::Replace { removed, added }),
        }
    }

    pub fn insertions(&self) -> usize {
        match *self {
            Edit::Insert { added } | Edit::Replace { added, .. } => added,
            Edit::Delete { .. } => 0,
        }
    }

    pub fn deletions(&self) -> usize {
        match *self {
            Edit::Delete { removed } | Edit::Replace { removed, .. } => removed,
            Edit::Insert { .. } => 0,
        }
    }
}

/// Splits the line origins of one hunk into edit regions.
///
/// Context lines close a region. End-of-file newline markers
/// (`=`, `>`, `<`) are not lines and are ignored.
pub fn classify_edits(origins: &[char]) -> Vec<Edit> {
    let mut edits = Vec::new();
    let (mut removed, mut added) = (0, 0);

    for origin in origins {
        match origin {
            '+' => added += 1,
            '-' => removed += 1,
            ' ' => {
                edits.extend(Edit::from_counts(removed, added));
                removed = 0;
                added = 0;
            }
            _ => {}
        }
    }
    edits.extend(Edit::from_counts(removed, added));

    edits
}

/// Diff statistics of `commit` against its first parent, or the empty tree
/// for a root commit.
///
/// Line counts are only computed when `detail` is set.
pub fn commit_stats(repo: &Repository, commit: &Commit, detail: bool) -> Result<DiffStats, git2::Error> {
    let tree = commit.tree()?;
    let parent_tree = if commit.parent_count() > 0 {
        Some(commit.parent(0)?.tree()?)
    } else {
        None
    };

    let diff = repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;

    let mut stats = DiffStats {
        files_changed: diff.deltas().len(),
        ..DiffStats::default()
    };

    if !detail {
        return Ok(stats);
    }

    for delta_idx in 0..diff.deltas().len() {
        let Some(patch) = Patch::from_diff(&diff, delta_idx)? else {
            continue;
        };

        for hunk_idx in 0..patch.num_hunks() {
            let origins = (0..patch.num_lines_in_hunk(hunk_idx)?)
                .map(|line_idx| patch.line_in_hunk(hunk_idx, line_idx).map(|line| line.origin()))
                .collect::<Result<Vec<char>, git2::Error>>()?;

            for edit in classify_edits(&origins) {
                tracing::trace!(commit = %commit.id(), hunk = hunk_idx, ?edit, "Classified edit");
                stats.insertions += edit.insertions();
                stats.deletions += edit.deletions();
            }
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_pure_insert_and_delete() {
        assert_eq!(classify_edits(&[' ', '+', '+', ' ']), vec![Edit::Insert { added: 2 }]);
        assert_eq!(classify_edits(&['-', ' ']), vec![Edit::Delete { removed: 1 }]);
    }

    #[test]
    fn classify_replace_counts_both_sides() {
        let edits = classify_edits(&[' ', '-', '-', '+', ' ', '+']);
        assert_eq!(
            edits,
            vec![Edit::Replace { removed: 2, added: 1 }, Edit::Insert { added: 1 }]
        );
        let insertions: usize = edits.iter().map(Edit::insertions).sum();
        let deletions: usize = edits.iter().map(Edit::deletions).sum();
        assert_eq!((insertions, deletions), (2, 2));
    }

    #[test]
    fn classify_ignores_eof_markers_and_context_only_hunks() {
        assert_eq!(classify_edits(&['-', '<', '+', '>']), vec![Edit::Replace { removed: 1, added: 1 }]);
        assert!(classify_edits(&[' ', ' ', '=']).is_empty());
        assert!(classify_edits(&[]).is_empty());
    }
}
