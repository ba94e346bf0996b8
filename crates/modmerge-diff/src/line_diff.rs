//! Line-level diff: classify each line of serialized component text.
//!
//! The default [`DiffMode::Lookahead`] walks both texts with two cursors and
//! a single line of lookahead. It is not an LCS diff: a multi-line insertion
//! or deletion can come out as a run of `Modified` lines. That is fine for
//! short, line-regular serialized records. [`DiffMode::Myers`] uses the
//! `similar` crate for callers diffing longer free-form text.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use similar::{ChangeTag, TextDiff};

/// Classification of one output line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiffType {
    Unchanged,
    Added,
    Removed,
    Modified,
}

impl DiffType {
    /// Single-character gutter marker used by [`LineDiff::render`].
    pub fn marker(self) -> char {
        match self {
            Self::Unchanged => ' ',
            Self::Added => '+',
            Self::Removed => '-',
            Self::Modified => '~',
        }
    }
}

/// Which algorithm produces the classification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffMode {
    /// Greedy two-cursor walk with one line of lookahead.
    #[default]
    Lookahead,
    /// Myers diff; never reports `Modified`.
    Myers,
}

/// A single classified line.
///
/// `line_number` is 1-based. It indexes the merged text for `Unchanged`,
/// `Added` and `Modified` lines, and the original text for `Removed` lines.
/// For `Modified`, `text` is the merged line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    pub kind: DiffType,
    pub text: String,
    pub line_number: usize,
}

impl DiffLine {
    fn new(kind: DiffType, text: &str, index: usize) -> Self {
        Self {
            kind,
            text: text.to_string(),
            line_number: index + 1,
        }
    }
}

/// The result of diffing an original text against a merged one.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDiff {
    pub lines: Vec<DiffLine>,
}

impl LineDiff {
    /// Returns `true` if every line is unchanged (including the empty diff).
    pub fn is_unchanged(&self) -> bool {
        self.lines.iter().all(|l| l.kind == DiffType::Unchanged)
    }

    /// Number of output lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns `true` if there are no lines at all.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn additions(&self) -> usize {
        self.count(DiffType::Added)
    }

    pub fn removals(&self) -> usize {
        self.count(DiffType::Removed)
    }

    pub fn modifications(&self) -> usize {
        self.count(DiffType::Modified)
    }

    fn count(&self, kind: DiffType) -> usize {
        self.lines.iter().filter(|l| l.kind == kind).count()
    }

    /// Plain-text rendering, one `"<marker> <text>"` line per entry.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            let _ = writeln!(out, "{} {}", line.kind.marker(), line.text);
        }
        out
    }
}

/// Diff with the chosen algorithm.
pub fn diff_with(mode: DiffMode, original: &str, merged: &str) -> LineDiff {
    match mode {
        DiffMode::Lookahead => diff_lines(original, merged),
        DiffMode::Myers => diff_lines_myers(original, merged),
    }
}

/// Greedy one-line-lookahead diff.
///
/// At each step: equal lines are `Unchanged`; if the original's current line
/// is the merged text's next line, the merged line is `Added`; if the merged
/// current line is the original's next line, the original line is
/// `Removed`; otherwise the pair is `Modified`. Leftover lines on either
/// side are `Added` or `Removed`.
pub fn diff_lines(original: &str, merged: &str) -> LineDiff {
    let old: Vec<&str> = original.lines().collect();
    let new: Vec<&str> = merged.lines().collect();

    let mut lines = Vec::with_capacity(old.len().max(new.len()));
    let (mut i, mut j) = (0usize, 0usize);

    while i < old.len() || j < new.len() {
        if i >= old.len() {
            lines.push(DiffLine::new(DiffType::Added, new[j], j));
            j += 1;
        } else if j >= new.len() {
            lines.push(DiffLine::new(DiffType::Removed, old[i], i));
            i += 1;
        } else if old[i] == new[j] {
            lines.push(DiffLine::new(DiffType::Unchanged, new[j], j));
            i += 1;
            j += 1;
        } else if j + 1 < new.len() && old[i] == new[j + 1] {
            lines.push(DiffLine::new(DiffType::Added, new[j], j));
            j += 1;
        } else if i + 1 < old.len() && new[j] == old[i + 1] {
            lines.push(DiffLine::new(DiffType::Removed, old[i], i));
            i += 1;
        } else {
            lines.push(DiffLine::new(DiffType::Modified, new[j], j));
            i += 1;
            j += 1;
        }
    }

    LineDiff { lines }
}

/// Myers diff over lines.
pub fn diff_lines_myers(original: &str, merged: &str) -> LineDiff {
    let old: Vec<&str> = original.lines().collect();
    let new: Vec<&str> = merged.lines().collect();
    let text_diff = TextDiff::from_slices(&old[..], &new[..]);

    let lines = text_diff
        .iter_all_changes()
        .map(|change| {
            let text = change.value();
            match change.tag() {
                ChangeTag::Equal => {
                    DiffLine::new(DiffType::Unchanged, text, change.new_index().unwrap_or(0))
                }
                ChangeTag::Insert => {
                    DiffLine::new(DiffType::Added, text, change.new_index().unwrap_or(0))
                }
                ChangeTag::Delete => {
                    DiffLine::new(DiffType::Removed, text, change.old_index().unwrap_or(0))
                }
            }
        })
        .collect();

    LineDiff { lines }
}
