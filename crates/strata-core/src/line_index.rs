//! Logical line index.
//!
//! Maintains two parallel arrays: the character offset at which every line starts, and a
//! stable [`LineId`] per line. Offsets shift as text is edited; ids only change for lines that
//! are actually created or removed, so a windowed renderer keyed by id does not thrash.
//!
//! Edits are applied in two tiers:
//!
//! - **Fast paths** for a single inserted newline, a single inserted character and a single
//!   deleted (non-newline) character. Each locates the line by binary search and shifts the
//!   following starts by one.
//! - **General path** for everything else. Only the touched line range is rebuilt; ids outside
//!   it are preserved, and ids inside it are reused before new ones are allocated.
//!
//! The general path verifies its own bookkeeping. On any mismatch it reports an
//! [`IndexMismatch`] and the caller falls back to [`LineIndex::reset_from_text`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Stable identity of a logical line.
///
/// An id denotes "this logical line", not "this index": the index may shift while the id stays
/// the same, until the line is deleted or merged into another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LineId(u64);

impl LineId {
    /// Get the underlying numeric id.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Result of a general-path edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineChange {
    /// First line touched by the edit.
    pub start_line: usize,
    /// Lines removed by the edit (newlines deleted).
    pub lines_removed: usize,
    /// Lines added by the edit (newlines inserted).
    pub lines_added: usize,
    /// Ids (after the edit) whose text changed, starting with `start_line`.
    pub touched: Vec<LineId>,
    /// Ids that no longer exist.
    pub dropped: Vec<LineId>,
}

impl LineChange {
    /// Net change in line count.
    pub fn line_delta(&self) -> isize {
        self.lines_added as isize - self.lines_removed as isize
    }
}

/// The general path found the index inconsistent with the edit it was asked to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexMismatch {
    /// `starts` and `ids` have different lengths.
    UnalignedArrays {
        /// Length of the line-start array.
        starts: usize,
        /// Length of the id array.
        ids: usize,
    },
    /// The deleted text's newline count disagrees with the lines the range spans.
    DeletedLines {
        /// Newlines found in the deleted text.
        newlines: usize,
        /// Line boundaries spanned by the deleted range.
        spanned: usize,
    },
    /// Line count after the edit is not `previous + delta`.
    LineCount {
        /// Expected line count.
        expected: usize,
        /// Actual line count.
        actual: usize,
    },
    /// Line starts are no longer strictly increasing from zero.
    Ordering,
}

/// Line-start offsets plus stable line ids.
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<usize>,
    ids: Vec<LineId>,
    next_id: u64,
    pending_reset: bool,
    // Id -> line, built on the first lookup after the id order changed.
    lines_by_id: OnceLock<HashMap<LineId, usize>>,
}

impl Default for LineIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl LineIndex {
    /// Index of an empty document: a single empty line.
    pub fn new() -> Self {
        let mut index = Self {
            starts: Vec::new(),
            ids: Vec::new(),
            next_id: 0,
            pending_reset: false,
            lines_by_id: OnceLock::new(),
        };
        index.rebuild("");
        index
    }

    /// Build an index from text.
    pub fn from_text(text: &str) -> Self {
        let mut index = Self::new();
        index.rebuild(text);
        index
    }

    /// Rescan `text`, assigning a fresh id to every line.
    ///
    /// Used on load; ids handed out earlier are never reused.
    pub fn rebuild(&mut self, text: &str) {
        self.lines_by_id.take();
        self.starts.clear();
        self.starts.push(0);
        for (offset, ch) in text.chars().enumerate() {
            if ch == '\n' {
                self.starts.push(offset + 1);
            }
        }

        let count = self.starts.len();
        self.ids.clear();
        self.ids.reserve(count);
        for _ in 0..count {
            let id = self.allocate_id();
            self.ids.push(id);
        }
    }

    /// Rebuild after an inconsistency and raise the pending-reset flag.
    pub fn reset_from_text(&mut self, text: &str) {
        self.rebuild(text);
        self.pending_reset = true;
    }

    /// Whether a fail-safe rebuild happened since the flag was last taken.
    pub fn pending_reset(&self) -> bool {
        self.pending_reset
    }

    /// Read and clear the pending-reset flag.
    pub fn take_pending_reset(&mut self) -> bool {
        std::mem::take(&mut self.pending_reset)
    }

    /// Number of lines. Never zero.
    pub fn line_count(&self) -> usize {
        self.starts.len()
    }

    /// Line-start offsets.
    pub fn starts(&self) -> &[usize] {
        &self.starts
    }

    /// Line ids, parallel to [`starts`](Self::starts).
    pub fn ids(&self) -> &[LineId] {
        &self.ids
    }

    /// `true` when `starts` and `ids` have the same length.
    pub fn is_aligned(&self) -> bool {
        self.starts.len() == self.ids.len()
    }

    /// Offset at which `line` starts.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.starts.get(line).copied()
    }

    /// Id of `line`.
    pub fn line_id(&self, line: usize) -> Option<LineId> {
        self.ids.get(line).copied()
    }

    /// Current index of the line with `id`.
    ///
    /// The reverse map is rebuilt on the first lookup after a newline was inserted or a general
    /// edit ran, then answers in O(1) until the next such edit. Character fast paths keep it.
    pub fn line_of_id(&self, id: LineId) -> Option<usize> {
        self.lines_by_id
            .get_or_init(|| {
                self.ids
                    .iter()
                    .enumerate()
                    .map(|(line, id)| (*id, line))
                    .collect()
            })
            .get(&id)
            .copied()
    }

    /// Offset of the end of `line`, excluding its newline.
    pub fn line_end(&self, line: usize, doc_len: usize) -> Option<usize> {
        if line >= self.line_count() {
            return None;
        }
        match self.starts.get(line + 1) {
            Some(next) => Some(next - 1),
            None => Some(doc_len),
        }
    }

    /// Length of `line` in characters, excluding its newline.
    pub fn line_len(&self, line: usize, doc_len: usize) -> Option<usize> {
        let start = self.line_start(line)?;
        let end = self.line_end(line, doc_len)?;
        Some(end.saturating_sub(start))
    }

    /// Line containing `offset`: the greatest `i` with `starts[i] <= offset`. O(log n).
    pub fn line_at_offset(&self, offset: usize) -> usize {
        self.starts
            .partition_point(|start| *start <= offset)
            .saturating_sub(1)
    }

    /// Convert an offset to `(line, column)`. The offset is clamped to `doc_len`.
    pub fn offset_to_position(&self, offset: usize, doc_len: usize) -> (usize, usize) {
        let offset = offset.min(doc_len);
        let line = self.line_at_offset(offset);
        (line, offset - self.starts[line])
    }

    /// Convert `(line, column)` to an offset. O(1).
    ///
    /// `line` is clamped to the last line and `column` to `[0, line_len]`.
    pub fn position_to_offset(&self, line: usize, column: usize, doc_len: usize) -> usize {
        let line = line.min(self.line_count() - 1);
        let start = self.starts[line];
        let len = self.line_len(line, doc_len).unwrap_or(0);
        start + column.min(len)
    }

    /// Fast path: a single `'\n'` was inserted at `offset`.
    ///
    /// The containing line keeps its id; the new line after it receives a fresh one.
    /// Returns `(split_line, new_id)`.
    pub fn insert_newline(&mut self, offset: usize) -> (usize, LineId) {
        self.lines_by_id.take();
        let line = self.line_at_offset(offset);
        for start in &mut self.starts[line + 1..] {
            *start += 1;
        }
        self.starts.insert(line + 1, offset + 1);

        let id = self.allocate_id();
        self.ids.insert(line + 1, id);
        (line, id)
    }

    /// Fast path: a single non-newline character was inserted at `offset`.
    ///
    /// Returns the line that grew.
    pub fn insert_char(&mut self, offset: usize) -> usize {
        let line = self.line_at_offset(offset);
        for start in &mut self.starts[line + 1..] {
            *start += 1;
        }
        line
    }

    /// Fast path: the single non-newline character at `offset` was deleted.
    ///
    /// Returns the line that shrank.
    pub fn delete_char(&mut self, offset: usize) -> usize {
        let line = self.line_at_offset(offset);
        for start in &mut self.starts[line + 1..] {
            *start -= 1;
        }
        line
    }

    /// General path: `deleted` was removed at `start` and `inserted` put in its place.
    ///
    /// `deleted` must be the exact text that occupied the range before the edit.
    pub fn apply_edit(
        &mut self,
        start: usize,
        deleted: &str,
        inserted: &str,
    ) -> Result<LineChange, IndexMismatch> {
        self.lines_by_id.take();
        if !self.is_aligned() {
            return Err(IndexMismatch::UnalignedArrays {
                starts: self.starts.len(),
                ids: self.ids.len(),
            });
        }

        let previous_count = self.line_count();
        let deleted_len = deleted.chars().count();
        let start_line = self.line_at_offset(start);
        let end_line = self.line_at_offset(start + deleted_len);

        let lines_removed = end_line - start_line;
        let newlines = deleted.matches('\n').count();
        if newlines != lines_removed {
            return Err(IndexMismatch::DeletedLines {
                newlines,
                spanned: lines_removed,
            });
        }

        let mut inserted_len = 0;
        let mut inner_starts = Vec::new();
        for (i, ch) in inserted.chars().enumerate() {
            inserted_len = i + 1;
            if ch == '\n' {
                inner_starts.push(start + i + 1);
            }
        }
        let lines_added = inner_starts.len();
        let delta = inserted_len as isize - deleted_len as isize;

        for line_start in &mut self.starts[end_line + 1..] {
            *line_start = line_start
                .checked_add_signed(delta)
                .ok_or(IndexMismatch::Ordering)?;
        }
        self.starts
            .splice(start_line + 1..end_line + 1, inner_starts);

        let reused = lines_removed.min(lines_added);
        let mut replacement: Vec<LineId> =
            self.ids[start_line + 1..start_line + 1 + reused].to_vec();
        for _ in reused..lines_added {
            replacement.push(self.allocate_id());
        }
        let dropped = self.ids[start_line + 1 + reused..end_line + 1].to_vec();
        self.ids.splice(start_line + 1..end_line + 1, replacement);

        let expected = previous_count + lines_added - lines_removed;
        if self.starts.len() != expected || self.ids.len() != expected {
            return Err(IndexMismatch::LineCount {
                expected,
                actual: self.starts.len().min(self.ids.len()),
            });
        }

        let window_end = (start_line + lines_added + 2).min(self.starts.len());
        let ordered = self.starts.first() == Some(&0)
            && self.starts[start_line..window_end]
                .windows(2)
                .all(|pair| pair[0] < pair[1]);
        if !ordered {
            return Err(IndexMismatch::Ordering);
        }

        Ok(LineChange {
            start_line,
            lines_removed,
            lines_added,
            touched: self.ids[start_line..=start_line + lines_added].to_vec(),
            dropped,
        })
    }

    /// Whether the line starts agree with a fresh scan of `text`. O(n); for diagnostics.
    pub fn matches_text(&self, text: &str) -> bool {
        let fresh = Self::from_text(text);
        self.starts == fresh.starts && self.is_aligned()
    }

    fn allocate_id(&mut self) -> LineId {
        let id = LineId(self.next_id);
        self.next_id += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_lines(count: usize) -> String {
        (0..count)
            .map(|i| format!("line {i}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_new_line_index() {
        let index = LineIndex::new();
        assert_eq!(index.line_count(), 1);
        assert_eq!(index.starts(), &[0]);
        assert_eq!(index.ids().len(), 1);
        assert_eq!(index.line_len(0, 0), Some(0));
    }

    #[test]
    fn test_from_text() {
        let index = LineIndex::from_text("Line 1\nLine 2\nLine 3");
        assert_eq!(index.line_count(), 3);
        assert_eq!(index.starts(), &[0, 7, 14]);
    }

    #[test]
    fn test_trailing_newline_adds_empty_line() {
        let index = LineIndex::from_text("a\n");
        assert_eq!(index.line_count(), 2);
        assert_eq!(index.line_len(1, 2), Some(0));
    }

    #[test]
    fn test_line_len_and_end() {
        let index = LineIndex::from_text("ABC\nDEFG\nH");
        assert_eq!(index.line_len(0, 10), Some(3));
        assert_eq!(index.line_len(1, 10), Some(4));
        assert_eq!(index.line_len(2, 10), Some(1));
        assert_eq!(index.line_end(1, 10), Some(8));
        assert_eq!(index.line_len(3, 10), None);
    }

    #[test]
    fn test_offset_to_position() {
        let index = LineIndex::from_text("ABC\nDEF\nGHI");
        assert_eq!(index.offset_to_position(0, 11), (0, 0));
        assert_eq!(index.offset_to_position(2, 11), (0, 2));
        assert_eq!(index.offset_to_position(3, 11), (0, 3));
        assert_eq!(index.offset_to_position(4, 11), (1, 0));
        assert_eq!(index.offset_to_position(8, 11), (2, 0));
        assert_eq!(index.offset_to_position(11, 11), (2, 3));
        assert_eq!(index.offset_to_position(500, 11), (2, 3));
    }

    #[test]
    fn test_position_to_offset_clamps() {
        let index = LineIndex::from_text("ABC\nDEF\nGHI");
        assert_eq!(index.position_to_offset(0, 2, 11), 2);
        assert_eq!(index.position_to_offset(1, 0, 11), 4);
        assert_eq!(index.position_to_offset(1, 99, 11), 7);
        assert_eq!(index.position_to_offset(99, 1, 11), 9);
    }

    #[test]
    fn test_offset_position_inverse() {
        let text = "fn main() {\n    let x = 1;\n\n}\n";
        let len = text.chars().count();
        let index = LineIndex::from_text(text);
        for offset in 0..=len {
            let (line, column) = index.offset_to_position(offset, len);
            assert_eq!(index.position_to_offset(line, column, len), offset);
        }
    }

    #[test]
    fn test_utf8_cjk() {
        let text = "你好\n世界";
        let index = LineIndex::from_text(text);
        assert_eq!(index.line_count(), 2);
        assert_eq!(index.offset_to_position(1, 5), (0, 1));
        assert_eq!(index.offset_to_position(3, 5), (1, 0));
    }

    #[test]
    fn test_insert_newline_fast_path() {
        let mut index = LineIndex::from_text("abc\ndef");
        let ids = index.ids().to_vec();

        let (line, new_id) = index.insert_newline(1);
        assert_eq!(line, 0);
        assert_eq!(index.starts(), &[0, 2, 5]);
        assert_eq!(index.ids(), &[ids[0], new_id, ids[1]]);
        assert!(index.matches_text("a\nbc\ndef"));
    }

    #[test]
    fn test_insert_and_delete_char_fast_paths() {
        let mut index = LineIndex::from_text("ab\ncd\nef");
        let ids = index.ids().to_vec();

        assert_eq!(index.insert_char(4), 1);
        assert_eq!(index.starts(), &[0, 3, 7]);
        assert!(index.matches_text("ab\ncXd\nef"));

        assert_eq!(index.delete_char(4), 1);
        assert_eq!(index.starts(), &[0, 3, 6]);
        assert_eq!(index.ids(), ids.as_slice());
    }

    #[test]
    fn test_general_multi_line_insert() {
        let mut index = LineIndex::from_text("one\ntwo\nthree");
        let ids = index.ids().to_vec();

        let change = index.apply_edit(5, "", "X\nY\nZ").unwrap();
        assert_eq!(change.start_line, 1);
        assert_eq!(change.lines_added, 2);
        assert_eq!(change.lines_removed, 0);
        assert!(change.dropped.is_empty());
        assert!(index.matches_text("one\ntX\nY\nZwo\nthree"));

        assert_eq!(index.line_id(0), Some(ids[0]));
        assert_eq!(index.line_id(1), Some(ids[1]));
        assert_eq!(index.line_id(4), Some(ids[2]));
        assert_eq!(change.touched.len(), 3);
    }

    #[test]
    fn test_general_multi_line_delete_drops_ids() {
        let mut index = LineIndex::from_text("a\nb\nc\nd");
        let ids = index.ids().to_vec();

        // Remove "b\nc\n": lines 1..=3 collapse into line 1.
        let change = index.apply_edit(2, "b\nc\n", "").unwrap();
        assert_eq!(change.lines_removed, 2);
        assert_eq!(change.dropped, vec![ids[2], ids[3]]);
        assert!(index.matches_text("a\nd"));
        assert_eq!(index.ids(), &[ids[0], ids[1]]);
    }

    #[test]
    fn test_general_replace_reuses_ids_inside_range() {
        let mut index = LineIndex::from_text("a\nb\nc\nd");
        let ids = index.ids().to_vec();

        // Replace "b\nc" with "x\ny\nz": one line removed, two added.
        let change = index.apply_edit(2, "b\nc", "x\ny\nz").unwrap();
        assert_eq!(change.lines_removed, 1);
        assert_eq!(change.lines_added, 2);
        assert!(change.dropped.is_empty());
        assert!(index.matches_text("a\nx\ny\nz\nd"));

        assert_eq!(index.line_id(0), Some(ids[0]));
        assert_eq!(index.line_id(1), Some(ids[1]));
        assert_eq!(index.line_id(2), Some(ids[2]));
        assert_eq!(index.line_id(4), Some(ids[3]));
        assert!(!ids.contains(&index.line_id(3).unwrap()));
    }

    #[test]
    fn test_edit_deep_inside_large_document_keeps_other_ids() {
        let mut index = LineIndex::from_text(&numbered_lines(10_000));
        let ids = index.ids().to_vec();
        let next_start = index.line_start(5_001).unwrap();

        let offset = index.line_start(5_000).unwrap() + 2;
        index.apply_edit(offset, "ne", "NE!").unwrap();

        assert_eq!(index.ids(), ids.as_slice());
        assert_eq!(index.line_start(5_001), Some(next_start + 1));
    }

    #[test]
    fn test_mismatched_deleted_text_is_reported() {
        let mut index = LineIndex::from_text("ab\ncd");
        let err = index.apply_edit(0, "ab\n\n", "").unwrap_err();
        assert!(matches!(err, IndexMismatch::DeletedLines { .. }));
    }

    #[test]
    fn test_reset_from_text_sets_pending_flag() {
        let mut index = LineIndex::from_text("a\nb");
        let old_ids = index.ids().to_vec();
        index.reset_from_text("a\nb\nc");

        assert!(index.pending_reset());
        assert!(index.take_pending_reset());
        assert!(!index.pending_reset());
        assert_eq!(index.line_count(), 3);
        assert!(index.ids().iter().all(|id| !old_ids.contains(id)));
    }

    #[test]
    fn test_line_of_id() {
        let mut index = LineIndex::from_text("a\nb\nc");
        let id_c = index.line_id(2).unwrap();
        index.insert_newline(0);
        assert_eq!(index.line_of_id(id_c), Some(3));
    }

    #[test]
    fn test_line_of_id_follows_every_edit_kind() {
        let mut index = LineIndex::from_text("zero
one
two
three");
        let ids = index.ids().to_vec();
        for (line, id) in ids.iter().enumerate() {
            assert_eq!(index.line_of_id(*id), Some(line));
        }

        index.insert_char(1);
        assert_eq!(index.line_of_id(ids[3]), Some(3));

        let (_, fresh) = index.insert_newline(2);
        assert_eq!(index.line_of_id(fresh), Some(1));
        assert_eq!(index.line_of_id(ids[3]), Some(4));

        // Text is now "zX\nero\none\ntwo\nthree".
        let change = index.apply_edit(7, "one\ntwo\n", "").unwrap();
        assert_eq!(change.dropped, vec![ids[2], ids[3]]);
        assert_eq!(index.line_of_id(ids[1]), Some(2));
        assert_eq!(index.line_of_id(ids[2]), None);
        assert_eq!(index.line_of_id(ids[3]), None);

        index.rebuild("fresh");
        assert_eq!(index.line_of_id(ids[0]), None);
        assert_eq!(index.line_of_id(index.ids()[0]), Some(0));
    }
}
