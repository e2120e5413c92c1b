//! Restricting issues to modified lines.
//!
//! An [`EditScript`] describes how the file on disk differs from a reference
//! snapshot of it. Issues are kept only when their line falls in a changed
//! region. Filtering is fail-open: when no edit script can be computed the
//! issues are returned unfiltered.

use std::fs;
use std::ops::Range;
use std::path::Path;

use cxxlens_issue::Issue;
use serde::Serialize;
use similar::{DiffTag, TextDiff};
use tracing::{debug, warn};

/// Kind of one edit script entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Equal,
    Insert,
    Delete,
    Replace,
}

impl From<DiffTag> for ChangeKind {
    fn from(tag: DiffTag) -> Self {
        match tag {
            DiffTag::Equal => ChangeKind::Equal,
            DiffTag::Insert => ChangeKind::Insert,
            DiffTag::Delete => ChangeKind::Delete,
            DiffTag::Replace => ChangeKind::Replace,
        }
    }
}

/// One region of the edit script, as 0-based line index ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditEntry {
    /// Lines of the reference source.
    pub old: Range<usize>,
    /// Lines of the current source.
    pub new: Range<usize>,
    pub kind: ChangeKind,
}

impl EditEntry {
    pub fn new(old: Range<usize>, new: Range<usize>, kind: ChangeKind) -> Self {
        Self { old, new, kind }
    }

    /// Whether this entry marks the 0-based line `index` of the current source.
    fn covers(&self, index: usize) -> bool {
        match self.kind {
            ChangeKind::Equal => false,
            ChangeKind::Insert | ChangeKind::Replace => self.new.contains(&index),
            // Removed lines are attributed to the line that now sits where they were.
            ChangeKind::Delete => self.new.start == index,
        }
    }
}

/// Ordered edit script from a reference source to the current source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditScript {
    entries: Vec<EditEntry>,
}

/// Line endings are normalized and a final newline added so that a missing
/// trailing newline does not mark the last line as changed.
fn normalize(text: &str) -> String {
    let mut text = text.replace("\r\n", "\n");
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
    text
}

impl EditScript {
    pub fn new(entries: Vec<EditEntry>) -> Self {
        Self { entries }
    }

    /// Computes the line diff between `reference` and `current`.
    pub fn between(reference: &str, current: &str) -> Self {
        let (reference, current) = (normalize(reference), normalize(current));
        let diff = TextDiff::from_lines(reference.as_str(), current.as_str());

        let entries = diff
            .ops()
            .iter()
            .map(|op| {
                let (tag, old, new) = op.as_tag_tuple();
                EditEntry::new(old, new, tag.into())
            })
            .collect();

        Self { entries }
    }

    pub fn entries(&self) -> &[EditEntry] {
        &self.entries
    }

    /// Returns `true` if nothing differs.
    pub fn is_unchanged(&self) -> bool {
        self.entries.iter().all(|e| e.kind == ChangeKind::Equal)
    }

    /// Whether the 1-based `line` of the current source lies in a changed region.
    ///
    /// Line 0 (no location) is never changed.
    pub fn is_line_changed(&self, line: u32) -> bool {
        let Some(index) = (line as usize).checked_sub(1) else {
            return false;
        };
        self.entries.iter().any(|entry| entry.covers(index))
    }

    /// Drops issues outside changed regions.
    pub fn retain_changed(&self, issues: &mut Vec<Issue>) {
        issues.retain(|issue| self.is_line_changed(issue.line));
    }
}

/// What the modified-lines filter did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum DiffOutcome {
    /// Filtering was not asked for.
    NotRequested,
    /// Issues outside changed lines were dropped.
    Applied { kept: usize, dropped: usize },
    /// No edit script could be computed; issues were left untouched.
    Skipped { reason: String },
}

/// Keeps only issues on lines of `file` that differ from `reference`.
///
/// Fail-open: without a reference, or when the file cannot be read, `issues`
/// is left unchanged and the outcome says why.
pub fn filter_modified_lines(
    issues: &mut Vec<Issue>,
    file: &Path,
    reference: Option<&str>,
) -> DiffOutcome {
    let Some(reference) = reference else {
        warn!(
            "No reference source for {}, reporting all issues",
            file.display()
        );
        return DiffOutcome::Skipped {
            reason: "reference source unavailable".to_string(),
        };
    };

    let current = match fs::read(file) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            warn!(
                "Failed to read {} for diffing, reporting all issues: {}",
                file.display(),
                e
            );
            return DiffOutcome::Skipped {
                reason: format!("failed to read file: {}", e),
            };
        }
    };

    let script = EditScript::between(reference, &current);
    let before = issues.len();
    script.retain_changed(issues);
    let kept = issues.len();

    debug!(
        "Diff filter on {}: kept {} of {} issue(s)",
        file.display(),
        kept,
        before
    );

    DiffOutcome::Applied {
        kept,
        dropped: before - kept,
    }
}
