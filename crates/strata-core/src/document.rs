//! A single open document.
//!
//! [`Document`] owns the current [`BufferSnapshot`], the [`LineIndex`] derived from it, the
//! [`LineCache`], the [`CursorState`] and a revision counter. Every edit goes through
//! [`Document::apply_edit`], which keeps all of them consistent before returning: a reader never
//! observes a snapshot and an index that disagree.
//!
//! # Example
//!
//! ```rust
//! use strata_core::{Document, EditPath};
//!
//! let mut doc = Document::from_text("abc\ndef");
//! assert_eq!(doc.insert(1, "\n"), EditPath::NewlineInsert);
//! assert_eq!(doc.text(), "a\nbc\ndef");
//! assert_eq!(doc.line_index().starts(), &[0, 2, 5]);
//! assert_eq!(doc.offset_to_position(7), (2, 3));
//! ```

use crate::config::EditorConfig;
use crate::cursor::{Cursor, CursorState, TextView};
use crate::edit::{EditDescriptor, EditPath, FastEdit, ParseRequest, Point, classify};
use crate::error::DocumentError;
use crate::line_cache::{LineCache, LineData};
use crate::line_ending::{LineEnding, normalize_newlines};
use crate::line_index::{LineId, LineIndex};
use crate::storage::BufferSnapshot;
use std::ops::Range;
use tracing::{debug, trace, warn};

/// Document state: text, line structure, cursor and revision.
#[derive(Debug)]
pub struct Document {
    snapshot: BufferSnapshot,
    index: LineIndex,
    cache: LineCache,
    cursor: CursorState,
    revision: u64,
    line_ending: LineEnding,
    edits: Vec<EditDescriptor>,
    edits_overflowed: bool,
    config: EditorConfig,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document with the default configuration.
    pub fn new() -> Self {
        Self::with_config("", EditorConfig::default())
    }

    /// A document holding `text`, with the default configuration.
    pub fn from_text(text: &str) -> Self {
        Self::with_config(text, EditorConfig::default())
    }

    /// A document holding `text`.
    ///
    /// Newlines are normalized to LF; the detected ending is kept for
    /// [`text_for_saving`](Self::text_for_saving).
    pub fn with_config(text: &str, config: EditorConfig) -> Self {
        let line_ending = LineEnding::detect_in_text(text);
        let text = normalize_newlines(text);
        let snapshot = BufferSnapshot::new(&text);
        let index = LineIndex::from_text(&text);
        debug!(
            lines = index.line_count(),
            chars = snapshot.len(),
            ?line_ending,
            "document loaded"
        );

        Self {
            snapshot,
            index,
            cache: LineCache::new(config.line_cache_capacity),
            cursor: CursorState::new(),
            revision: 0,
            line_ending,
            edits: Vec::new(),
            edits_overflowed: false,
            config,
        }
    }

    /// Decode raw bytes from storage. The bytes must be UTF-8.
    pub fn from_bytes(bytes: Vec<u8>, config: EditorConfig) -> Result<Self, DocumentError> {
        let text = String::from_utf8(bytes)?;
        Ok(Self::with_config(&text, config))
    }

    /// Replace the whole content, as on reload.
    ///
    /// The line index is rebuilt with fresh ids, the cache is cleared, the cursor is reset and
    /// pending edit descriptors are dropped in favor of a full reparse. The revision still
    /// advances.
    pub fn reset(&mut self, text: &str) {
        self.line_ending = LineEnding::detect_in_text(text);
        let text = normalize_newlines(text);
        self.snapshot = BufferSnapshot::new(&text);
        self.index.rebuild(&text);
        self.cache.clear();
        self.cursor = CursorState::new();
        self.edits.clear();
        self.edits_overflowed = true;
        self.revision += 1;
        debug!(
            lines = self.index.line_count(),
            revision = self.revision,
            "document reset"
        );
    }

    /// Replace `deleted.chars().count()` characters at `start` with `inserted`.
    ///
    /// Only the length of `deleted` is used. Its content is not checked against the document:
    /// if it disagrees, the characters actually in the range are removed anyway and no error is
    /// reported. The range is clamped to the document. Inserted newlines are normalized to LF.
    pub fn apply_edit(&mut self, start: usize, deleted: &str, inserted: &str) -> EditPath {
        let len = self.snapshot.len();
        let start = start.min(len);
        let end = start.saturating_add(deleted.chars().count()).min(len);
        self.splice(start, end, inserted)
    }

    /// Insert `text` at `offset`.
    pub fn insert(&mut self, offset: usize, text: &str) -> EditPath {
        let offset = offset.min(self.snapshot.len());
        self.splice(offset, offset, text)
    }

    /// Delete `len` characters at `offset`.
    pub fn delete(&mut self, offset: usize, len: usize) -> EditPath {
        let start = offset.min(self.snapshot.len());
        let end = start.saturating_add(len).min(self.snapshot.len());
        self.splice(start, end, "")
    }

    /// Replace `range` with `text`.
    pub fn replace(&mut self, range: Range<usize>, text: &str) -> EditPath {
        let start = range.start.min(self.snapshot.len());
        let end = range.end.clamp(start, self.snapshot.len());
        self.splice(start, end, text)
    }

    /// Apply an edit from the input layer.
    ///
    /// The indices are authoritative; the points are recomputed from the line index, so a
    /// consistent descriptor is forwarded unchanged.
    pub fn apply_descriptor(&mut self, edit: &EditDescriptor) -> EditPath {
        self.replace(edit.start_index..edit.old_end_index, &edit.inserted_text)
    }

    /// Type `text` at the caret, replacing the selection if there is one.
    pub fn type_text(&mut self, text: &str) -> EditPath {
        let caret = self.cursor.position.offset;
        let (start, end) = self.cursor.selected_range().unwrap_or((caret, caret));
        let inserted = normalize_newlines(text);
        let path = self.replace(start..end, &inserted);
        let target = start.min(self.snapshot.len()) + inserted.chars().count();
        self.cursor_mut().move_to_offset(target, false);
        path
    }

    /// Delete the selection, or the character before the caret.
    pub fn backspace(&mut self) -> EditPath {
        let caret = self.cursor.position.offset;
        let (start, end) = match self.cursor.selected_range() {
            Some(range) => range,
            None => (caret.saturating_sub(1), caret),
        };
        let path = self.replace(start..end, "");
        self.cursor_mut().move_to_offset(start, false);
        path
    }

    /// Delete the selection, or the character after the caret.
    pub fn delete_forward(&mut self) -> EditPath {
        let caret = self.cursor.position.offset;
        let (start, end) = self
            .cursor
            .selected_range()
            .unwrap_or((caret, caret.saturating_add(1)));
        let path = self.replace(start..end, "");
        self.cursor_mut().move_to_offset(start, false);
        path
    }

    /// Replace the already clamped range `[start, end)` with `inserted`.
    fn splice(&mut self, start: usize, end: usize, inserted: &str) -> EditPath {
        let inserted = normalize_newlines(inserted);
        let removed = self.snapshot.text_range(start, end);
        if removed.is_empty() && inserted.is_empty() {
            return EditPath::Noop;
        }

        let removed_len = end - start;
        let inserted_len = inserted.chars().count();
        let start_position = self.point_at(start);
        let old_end_position = self.point_at(end);

        let snapshot = std::mem::take(&mut self.snapshot);
        self.snapshot = snapshot
            .into_deleted(start, removed_len)
            .into_inserted(start, &inserted);

        let path = match classify(&removed, &inserted) {
            Some(FastEdit::Newline) => {
                let (line, new_id) = self.index.insert_newline(start);
                if let Some((id, column)) = self.line_column(line, start) {
                    self.cache.split(id, column, new_id);
                }
                EditPath::NewlineInsert
            }
            Some(FastEdit::InsertChar(ch)) => {
                let line = self.index.insert_char(start);
                if let Some((id, column)) = self.line_column(line, start) {
                    self.cache.insert_char(id, column, ch);
                }
                EditPath::CharInsert
            }
            Some(FastEdit::DeleteChar(_)) => {
                let line = self.index.delete_char(start);
                if let Some((id, column)) = self.line_column(line, start) {
                    self.cache.remove_char(id, column);
                }
                EditPath::CharDelete
            }
            None => match self.index.apply_edit(start, &removed, &inserted) {
                Ok(change) => {
                    for id in change.touched.iter().chain(&change.dropped) {
                        self.cache.invalidate(*id);
                    }
                    EditPath::General
                }
                Err(mismatch) => {
                    warn!(
                        ?mismatch,
                        revision = self.revision,
                        "line index out of sync, rebuilding"
                    );
                    self.index.reset_from_text(&self.snapshot.text());
                    self.cache.clear();
                    EditPath::Rebuild
                }
            },
        };

        self.revision += 1;
        let new_end = start + inserted_len;
        let descriptor = EditDescriptor {
            start_index: start,
            old_end_index: end,
            new_end_index: new_end,
            inserted_text: inserted.into_owned(),
            start_position,
            old_end_position,
            new_end_position: self.point_at(new_end),
        };
        self.queue_edit(descriptor);
        self.cursor_mut().clamp();
        trace!(
            ?path,
            start,
            deleted = removed_len,
            inserted = inserted_len,
            revision = self.revision,
            "applied edit"
        );

        self.maybe_compact();
        path
    }

    fn queue_edit(&mut self, descriptor: EditDescriptor) {
        if self.edits_overflowed {
            return;
        }
        if self.edits.len() >= self.config.max_pending_edits {
            debug!(
                dropped = self.edits.len(),
                revision = self.revision,
                "edit queue full, falling back to a full reparse"
            );
            self.edits = Vec::new();
            self.edits_overflowed = true;
            return;
        }
        self.edits.push(descriptor);
    }

    fn maybe_compact(&mut self) {
        let pieces = self.snapshot.piece_count();
        let lines = self.index.line_count();
        if self.config.compaction.should_compact(pieces, lines) {
            self.snapshot = self.snapshot.compact();
            debug!(pieces, lines, revision = self.revision, "compacted piece list");
        }
    }

    fn line_column(&self, line: usize, offset: usize) -> Option<(LineId, usize)> {
        let id = self.index.line_id(line)?;
        let start = self.index.line_start(line)?;
        Some((id, offset.saturating_sub(start)))
    }

    fn point_at(&self, offset: usize) -> Point {
        let (row, column) = self.index.offset_to_position(offset, self.snapshot.len());
        Point::new(row, column)
    }

    fn load_line(&self, line: usize) -> Option<LineData> {
        let start = self.index.line_start(line)?;
        let end = self.index.line_end(line, self.snapshot.len())?;
        let has_newline = line + 1 < self.index.line_count();
        Some(LineData::new(
            self.snapshot.text_range(start, end),
            has_newline,
        ))
    }

    /// Number of lines. Always at least one.
    pub fn line_count(&self) -> usize {
        self.index.line_count()
    }

    /// Length in characters.
    pub fn len_chars(&self) -> usize {
        self.snapshot.len()
    }

    /// Returns `true` if the document is empty.
    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }

    /// Cached data of `line`, loading it into the cache on a miss.
    pub fn line_data(&mut self, line: usize) -> Option<&LineData> {
        let id = self.index.line_id(line)?;
        if self.cache.peek(id).is_none() {
            let data = self.load_line(line)?;
            self.cache.insert(id, data);
        }
        self.cache.get(id)
    }

    /// Text of `line` without its newline. Fills and touches the line cache.
    pub fn line_text(&mut self, line: usize) -> Option<&str> {
        self.line_data(line).map(|data| data.text.as_str())
    }

    /// Text of `line` without its newline. Never changes cache contents or recency.
    pub fn line_text_untracked(&self, line: usize) -> Option<String> {
        let id = self.index.line_id(line)?;
        match self.cache.peek(id) {
            Some(data) => Some(data.text.clone()),
            None => self.load_line(line).map(|data| data.text),
        }
    }

    /// Text of the line with `id`. A cache miss resolves the id through the index's reverse map.
    pub fn line_text_by_id(&mut self, id: LineId) -> Option<&str> {
        if self.cache.peek(id).is_some() {
            return self.cache.get(id).map(|data| data.text.as_str());
        }
        let line = self.index.line_of_id(id)?;
        self.line_text(line)
    }

    /// Length of `line` without its newline.
    pub fn line_len(&self, line: usize) -> Option<usize> {
        self.index.line_len(line, self.snapshot.len())
    }

    /// Length of the line with `id` without its newline.
    pub fn line_len_by_id(&self, id: LineId) -> Option<usize> {
        if let Some(data) = self.cache.peek(id) {
            return Some(data.text_len());
        }
        let line = self.index.line_of_id(id)?;
        self.line_len(line)
    }

    /// Stable id of `line`.
    pub fn line_id(&self, line: usize) -> Option<LineId> {
        self.index.line_id(line)
    }

    /// Current index of the line with `id`.
    pub fn line_index_of(&self, id: LineId) -> Option<usize> {
        self.index.line_of_id(id)
    }

    /// `(line, column)` of `offset`, clamped.
    pub fn offset_to_position(&self, offset: usize) -> (usize, usize) {
        self.index.offset_to_position(offset, self.snapshot.len())
    }

    /// Offset of `(line, column)`, clamped.
    pub fn position_to_offset(&self, line: usize, column: usize) -> usize {
        self.index.position_to_offset(line, column, self.snapshot.len())
    }

    /// Text in `[start, end)`, clamped.
    pub fn text_range(&self, start: usize, end: usize) -> String {
        self.snapshot.text_range(start, end)
    }

    /// The whole text, LF-normalized.
    pub fn text(&self) -> String {
        self.snapshot.text()
    }

    /// The whole text with the document's preferred line ending.
    pub fn text_for_saving(&self) -> String {
        self.line_ending.apply_to_text(&self.snapshot.text())
    }

    /// Line ending detected when the document was loaded.
    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Set the line ending used by [`text_for_saving`](Self::text_for_saving).
    pub fn set_line_ending(&mut self, line_ending: LineEnding) {
        self.line_ending = line_ending;
    }

    /// Current immutable snapshot. Clone it to hand it to another thread.
    pub fn snapshot(&self) -> &BufferSnapshot {
        &self.snapshot
    }

    /// The line index.
    pub fn line_index(&self) -> &LineIndex {
        &self.index
    }

    /// Number of lines currently held by the line cache.
    pub fn cached_lines(&self) -> usize {
        self.cache.len()
    }

    /// Configuration the document was opened with.
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Revision counter. Increments once per applied edit.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether work computed at `revision` is still valid.
    pub fn is_current(&self, revision: u64) -> bool {
        self.revision == revision
    }

    /// Edits applied since they were last drained, oldest first.
    ///
    /// At most [`EditorConfig::max_pending_edits`] are kept. Once that is exceeded the queue is
    /// emptied, stays empty and [`edits_overflowed`](Self::edits_overflowed) reports it until
    /// the next drain.
    pub fn pending_edits(&self) -> &[EditDescriptor] {
        &self.edits
    }

    /// Whether descriptors were dropped since the last drain, so the queue no longer describes
    /// every edit. Also set by [`reset`](Self::reset).
    pub fn edits_overflowed(&self) -> bool {
        self.edits_overflowed
    }

    /// Drain the pending edit descriptors and clear the overflow flag.
    pub fn take_edits(&mut self) -> Vec<EditDescriptor> {
        self.edits_overflowed = false;
        std::mem::take(&mut self.edits)
    }

    /// Package the current snapshot and pending edits for a background parser.
    pub fn parse_request(&mut self) -> ParseRequest {
        let full_reparse = self.edits_overflowed;
        ParseRequest {
            revision: self.revision,
            snapshot: self.snapshot.clone(),
            edits: self.take_edits(),
            full_reparse,
        }
    }

    /// Whether the line index was rebuilt from scratch since the flag was last taken.
    pub fn pending_reset(&self) -> bool {
        self.index.pending_reset()
    }

    /// Read and clear the pending reset flag.
    pub fn take_pending_reset(&mut self) -> bool {
        self.index.take_pending_reset()
    }

    /// Cursor state.
    pub fn cursor(&self) -> &CursorState {
        &self.cursor
    }

    /// Cursor engine bound to this document's text.
    pub fn cursor_mut(&mut self) -> Cursor<'_> {
        Cursor::new(
            &mut self.cursor,
            TextView::new(&self.snapshot, &self.index, self.config.word_scan_chunk),
        )
    }

    /// Read-only view used by cursor operations.
    pub fn text_view(&self) -> TextView<'_> {
        TextView::new(&self.snapshot, &self.index, self.config.word_scan_chunk)
    }
}

impl strata_viewport::RowSource for Document {
    fn row_count(&self) -> usize {
        self.line_count()
    }

    fn row_len(&self, row: usize) -> usize {
        self.line_len(row).unwrap_or(0)
    }

    fn row_id(&self, row: usize) -> u64 {
        self.line_id(row).map_or(0, LineId::get)
    }
}
