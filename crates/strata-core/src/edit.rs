//! Edit descriptors and edit classification.
//!
//! An [`EditDescriptor`] is the structured record of one applied edit, in character offsets and
//! `(row, column)` points. The input layer may hand one in, and every edit the document applies
//! is forwarded unchanged to incremental consumers (parsers, minimap summaries) together with a
//! monotonically increasing revision.

use crate::storage::BufferSnapshot;
use serde::{Deserialize, Serialize};

/// A `(row, column)` point, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    /// Zero-based line.
    pub row: usize,
    /// Zero-based column within the line.
    pub column: usize,
}

impl Point {
    /// Create a new point.
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

/// One edit: the range `[start_index, old_end_index)` was replaced by `inserted_text`, which
/// now occupies `[start_index, new_end_index)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditDescriptor {
    /// Start offset.
    pub start_index: usize,
    /// End of the replaced range, before the edit.
    pub old_end_index: usize,
    /// End of the inserted text, after the edit.
    pub new_end_index: usize,
    /// The inserted text.
    pub inserted_text: String,
    /// `start_index` as a point.
    pub start_position: Point,
    /// `old_end_index` as a point in the pre-edit document.
    pub old_end_position: Point,
    /// `new_end_index` as a point in the post-edit document.
    pub new_end_position: Point,
}

impl EditDescriptor {
    /// Number of characters removed.
    pub fn deleted_len(&self) -> usize {
        self.old_end_index.saturating_sub(self.start_index)
    }

    /// Number of characters inserted.
    pub fn inserted_len(&self) -> usize {
        self.new_end_index.saturating_sub(self.start_index)
    }
}

/// Which strategy applied an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditPath {
    /// Nothing was deleted or inserted.
    Noop,
    /// A single `'\n'` was inserted.
    NewlineInsert,
    /// A single non-newline character was inserted.
    CharInsert,
    /// A single non-newline character was deleted.
    CharDelete,
    /// The touched line range was rebuilt incrementally.
    General,
    /// The line index was rebuilt from scratch after an inconsistency.
    Rebuild,
}

impl EditPath {
    /// Whether the edit used one of the O(1) keystroke paths.
    pub fn is_fast(self) -> bool {
        matches!(
            self,
            EditPath::NewlineInsert | EditPath::CharInsert | EditPath::CharDelete
        )
    }
}

/// A keystroke-sized edit that bypasses the general path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FastEdit {
    Newline,
    InsertChar(char),
    DeleteChar(char),
}

/// Pick a fast path, checked in order: newline insert, char insert, char delete.
pub(crate) fn classify(deleted: &str, inserted: &str) -> Option<FastEdit> {
    match (single_char(deleted), single_char(inserted)) {
        _ if !deleted.is_empty() && !inserted.is_empty() => None,
        (None, Some('\n')) if deleted.is_empty() => Some(FastEdit::Newline),
        (None, Some(ch)) if deleted.is_empty() => Some(FastEdit::InsertChar(ch)),
        (Some(ch), None) if inserted.is_empty() && ch != '\n' => Some(FastEdit::DeleteChar(ch)),
        _ => None,
    }
}

fn single_char(text: &str) -> Option<char> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Some(ch),
        _ => None,
    }
}

/// Owned message for a background parser: a complete snapshot plus the edits since the last
/// request. Stale results are discarded by comparing `revision`.
#[derive(Debug, Clone)]
pub struct ParseRequest {
    /// Document revision the snapshot belongs to.
    pub revision: u64,
    /// Immutable document text.
    pub snapshot: BufferSnapshot,
    /// Edits applied since the previous request, oldest first.
    pub edits: Vec<EditDescriptor>,
    /// The edit history since the previous request is incomplete; `edits` must be ignored and
    /// the snapshot parsed from scratch.
    pub full_reparse: bool,
}
