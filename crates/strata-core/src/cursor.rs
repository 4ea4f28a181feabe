//! Cursor and selection engine.
//!
//! [`CursorState`] is plain per-document data. [`Cursor`] pairs it with a read-only
//! [`TextView`] and implements every movement and selection operation on top of line index
//! queries. All operations are total: out-of-range input is clamped, never rejected.
//!
//! The cursor offset is the single source of truth; `line`/`column` are always re-derived from
//! the line index after a move.

use crate::line_index::LineIndex;
use crate::storage::BufferSnapshot;

/// A point in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorPosition {
    /// Character offset.
    pub offset: usize,
    /// Line containing `offset`.
    pub line: usize,
    /// Column of `offset` within `line`.
    pub column: usize,
}

/// A selection between an anchor (where it started) and a focus (where the caret is).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionRange {
    /// Fixed end.
    pub anchor: usize,
    /// Moving end.
    pub focus: usize,
}

impl SelectionRange {
    /// Create a new selection.
    pub fn new(anchor: usize, focus: usize) -> Self {
        Self { anchor, focus }
    }

    /// Returns `true` if `anchor == focus`.
    pub fn is_empty(&self) -> bool {
        self.anchor == self.focus
    }

    /// `(min, max)` of anchor and focus.
    pub fn normalized(&self) -> (usize, usize) {
        (self.anchor.min(self.focus), self.anchor.max(self.focus))
    }

    /// Number of selected characters.
    pub fn len(&self) -> usize {
        let (start, end) = self.normalized();
        end - start
    }
}

/// Cursor movement direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards the document start.
    Left,
    /// Towards the document end.
    Right,
    /// To the previous line.
    Up,
    /// To the next line.
    Down,
}

/// Per-document editing cursor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CursorState {
    /// Caret position.
    pub position: CursorPosition,
    /// Column vertical moves try to return to.
    pub preferred_column: usize,
    /// Live selections; empty when nothing is selected.
    pub selections: Vec<SelectionRange>,
    /// Whether the user has placed a caret yet.
    pub has_cursor: bool,
    /// Whether the caret should blink.
    pub is_blinking: bool,
}

impl CursorState {
    /// A cursor at offset 0 that has not been activated.
    pub fn new() -> Self {
        Self::default()
    }

    /// The primary selection, if any.
    pub fn selection(&self) -> Option<&SelectionRange> {
        self.selections.first()
    }

    /// The normalized primary selection, if it is non-empty.
    pub fn selected_range(&self) -> Option<(usize, usize)> {
        self.selection()
            .filter(|selection| !selection.is_empty())
            .map(SelectionRange::normalized)
    }
}

/// Read-only access to a document's text and line structure.
#[derive(Debug, Clone, Copy)]
pub struct TextView<'a> {
    snapshot: &'a BufferSnapshot,
    index: &'a LineIndex,
    scan_chunk: usize,
}

impl<'a> TextView<'a> {
    /// Create a view. `scan_chunk` bounds how many characters word scans read at a time.
    pub fn new(snapshot: &'a BufferSnapshot, index: &'a LineIndex, scan_chunk: usize) -> Self {
        Self {
            snapshot,
            index,
            scan_chunk: scan_chunk.max(1),
        }
    }

    /// Document length in characters.
    pub fn len(&self) -> usize {
        self.snapshot.len()
    }

    /// Returns `true` if the document is empty.
    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }

    /// Number of lines (at least one).
    pub fn line_count(&self) -> usize {
        self.index.line_count()
    }

    /// Start offset of `line`, clamped to the last line.
    pub fn line_start(&self, line: usize) -> usize {
        let line = line.min(self.line_count() - 1);
        self.index.line_start(line).unwrap_or(0)
    }

    /// Length of `line` without its newline, clamped to the last line.
    pub fn line_len(&self, line: usize) -> usize {
        let line = line.min(self.line_count() - 1);
        self.index.line_len(line, self.len()).unwrap_or(0)
    }

    /// Position of `offset`, clamped to the document.
    pub fn position_at(&self, offset: usize) -> CursorPosition {
        let offset = offset.min(self.len());
        let (line, column) = self.index.offset_to_position(offset, self.len());
        CursorPosition {
            offset,
            line,
            column,
        }
    }

    /// Offset of `(line, column)`, both clamped.
    pub fn offset_at(&self, line: usize, column: usize) -> usize {
        self.index.position_to_offset(line, column, self.len())
    }

    /// Text in `[start, end)`, clamped.
    pub fn text_range(&self, start: usize, end: usize) -> String {
        self.snapshot.text_range(start, end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Word,
    Whitespace,
    Punctuation,
}

fn char_class(ch: char) -> CharClass {
    if ch.is_alphanumeric() || ch == '_' {
        CharClass::Word
    } else if ch.is_whitespace() {
        CharClass::Whitespace
    } else {
        CharClass::Punctuation
    }
}

/// Walks characters around a position, reading the document one bounded chunk at a time.
struct ChunkScanner<'a> {
    text: TextView<'a>,
    chunk: Vec<char>,
    chunk_start: usize,
    pos: usize,
}

impl<'a> ChunkScanner<'a> {
    fn new(text: TextView<'a>, pos: usize) -> Self {
        Self {
            text,
            chunk: Vec::new(),
            chunk_start: 0,
            pos: pos.min(text.len()),
        }
    }

    fn covers(&self, offset: usize) -> bool {
        self.chunk_start <= offset && offset < self.chunk_start + self.chunk.len()
    }

    fn load(&mut self, start: usize, end: usize) {
        self.chunk_start = start;
        self.chunk = self.text.text_range(start, end).chars().collect();
    }

    fn after(&mut self) -> Option<char> {
        if self.pos >= self.text.len() {
            return None;
        }
        if !self.covers(self.pos) {
            self.load(self.pos, self.pos + self.text.scan_chunk);
        }
        self.chunk.get(self.pos - self.chunk_start).copied()
    }

    fn before(&mut self) -> Option<char> {
        let target = self.pos.checked_sub(1)?;
        if !self.covers(target) {
            self.load(self.pos.saturating_sub(self.text.scan_chunk), self.pos);
        }
        self.chunk.get(target - self.chunk_start).copied()
    }

    fn skip_forward_while(&mut self, mut keep: impl FnMut(char) -> bool) {
        while let Some(ch) = self.after() {
            if !keep(ch) {
                break;
            }
            self.pos += 1;
        }
    }

    fn skip_backward_while(&mut self, mut keep: impl FnMut(char) -> bool) {
        while let Some(ch) = self.before() {
            if !keep(ch) {
                break;
            }
            self.pos -= 1;
        }
    }
}

/// Offset of the next word boundary after `offset`: whitespace is skipped, then a run of one
/// character class is consumed.
pub fn next_word_boundary(text: TextView<'_>, offset: usize) -> usize {
    let mut scanner = ChunkScanner::new(text, offset);
    scanner.skip_forward_while(|ch| char_class(ch) == CharClass::Whitespace);
    if let Some(first) = scanner.after() {
        let class = char_class(first);
        scanner.skip_forward_while(|ch| char_class(ch) == class);
    }
    scanner.pos
}

/// Offset of the previous word boundary before `offset`. Mirror of [`next_word_boundary`].
pub fn prev_word_boundary(text: TextView<'_>, offset: usize) -> usize {
    let mut scanner = ChunkScanner::new(text, offset);
    scanner.skip_backward_while(|ch| char_class(ch) == CharClass::Whitespace);
    if let Some(first) = scanner.before() {
        let class = char_class(first);
        scanner.skip_backward_while(|ch| char_class(ch) == class);
    }
    scanner.pos
}

/// Movement and selection operations over a [`CursorState`].
pub struct Cursor<'a> {
    state: &'a mut CursorState,
    text: TextView<'a>,
}

impl<'a> Cursor<'a> {
    /// Bind a cursor state to the text it moves over.
    pub fn new(state: &'a mut CursorState, text: TextView<'a>) -> Self {
        Self { state, text }
    }

    /// Current state.
    pub fn state(&self) -> &CursorState {
        &*self.state
    }

    /// Move one step in `direction`.
    ///
    /// Horizontal moves step one character, or to the next word boundary when `wordwise`.
    /// Vertical moves project the preferred column onto the target line.
    pub fn move_by(&mut self, direction: Direction, wordwise: bool, extend: bool) {
        let origin = self.state.position.offset.min(self.text.len());
        match direction {
            Direction::Left => {
                let target = if wordwise {
                    prev_word_boundary(self.text, origin)
                } else {
                    origin.saturating_sub(1)
                };
                self.commit(origin, target, extend, true);
            }
            Direction::Right => {
                let target = if wordwise {
                    next_word_boundary(self.text, origin)
                } else {
                    (origin + 1).min(self.text.len())
                };
                self.commit(origin, target, extend, true);
            }
            Direction::Up | Direction::Down => {
                let line = self.text.position_at(origin).line;
                let target_line = if direction == Direction::Up {
                    line.saturating_sub(1)
                } else {
                    (line + 1).min(self.text.line_count() - 1)
                };
                let target = self
                    .text
                    .offset_at(target_line, self.state.preferred_column);
                self.commit(origin, target, extend, false);
            }
        }
    }

    /// Move to the start of the line, or of the document when `ctrl` is held.
    pub fn move_to_line_start(&mut self, ctrl: bool, extend: bool) {
        let origin = self.state.position.offset.min(self.text.len());
        let target = if ctrl {
            0
        } else {
            self.text.line_start(self.text.position_at(origin).line)
        };
        self.commit(origin, target, extend, true);
    }

    /// Move to the end of the line, or of the document when `ctrl` is held.
    pub fn move_to_line_end(&mut self, ctrl: bool, extend: bool) {
        let origin = self.state.position.offset.min(self.text.len());
        let target = if ctrl {
            self.text.len()
        } else {
            let line = self.text.position_at(origin).line;
            self.text.line_start(line) + self.text.line_len(line)
        };
        self.commit(origin, target, extend, true);
    }

    /// Move to offset 0.
    pub fn move_to_doc_start(&mut self, extend: bool) {
        let origin = self.state.position.offset.min(self.text.len());
        self.commit(origin, 0, extend, true);
    }

    /// Move to the document end.
    pub fn move_to_doc_end(&mut self, extend: bool) {
        let origin = self.state.position.offset.min(self.text.len());
        self.commit(origin, self.text.len(), extend, true);
    }

    /// Place the caret at `offset`.
    pub fn move_to_offset(&mut self, offset: usize, extend: bool) {
        let origin = self.state.position.offset.min(self.text.len());
        self.commit(origin, offset.min(self.text.len()), extend, true);
    }

    /// Place the caret from a pointer click. Line and column are clamped first.
    pub fn set_from_click(&mut self, line: usize, column: usize, extend: bool) {
        let origin = self.state.position.offset.min(self.text.len());
        let target = self.text.offset_at(line, column);
        self.commit(origin, target, extend, true);
    }

    /// Select `[anchor, focus]`; the caret goes to `focus`.
    pub fn set_selection(&mut self, anchor: usize, focus: usize) {
        let len = self.text.len();
        let range = SelectionRange::new(anchor.min(len), focus.min(len));
        self.select(range);
    }

    /// Drop every selection, leaving the caret where it is.
    pub fn clear_selection(&mut self) {
        self.state.selections.clear();
        self.activate();
    }

    /// Select the whole document.
    pub fn select_all(&mut self) {
        self.select(SelectionRange::new(0, self.text.len()));
    }

    /// Select the run of same-class characters around `offset`, without crossing a line break.
    pub fn select_word(&mut self, offset: usize) {
        let offset = offset.min(self.text.len());
        let mut scanner = ChunkScanner::new(self.text, offset);
        let after = scanner.after().filter(|ch| *ch != '\n');
        let before = scanner.before().filter(|ch| *ch != '\n');

        let seed = match (before, after) {
            (Some(b), Some(a))
                if char_class(a) == CharClass::Whitespace
                    && char_class(b) != CharClass::Whitespace =>
            {
                Some(b)
            }
            (_, Some(a)) => Some(a),
            (Some(b), None) => Some(b),
            (None, None) => None,
        };
        let Some(seed) = seed else {
            self.select(SelectionRange::new(offset, offset));
            return;
        };

        let class = char_class(seed);
        let same = |ch: char| ch != '\n' && char_class(ch) == class;
        scanner.skip_backward_while(same);
        let start = scanner.pos;
        scanner.pos = offset;
        scanner.skip_forward_while(same);
        let end = scanner.pos;

        self.select(SelectionRange::new(start, end));
    }

    /// Select line `index` including its newline. The index is clamped.
    pub fn select_line(&mut self, index: usize) {
        let line = index.min(self.text.line_count() - 1);
        let start = self.text.line_start(line);
        let end = if line + 1 < self.text.line_count() {
            self.text.line_start(line + 1)
        } else {
            self.text.len()
        };
        self.select(SelectionRange::new(start, end));
    }

    /// Re-clamp the caret and selections after the document changed.
    ///
    /// Does not activate the caret or touch the preferred column.
    pub fn clamp(&mut self) {
        let len = self.text.len();
        self.state.position = self.text.position_at(self.state.position.offset);
        for selection in &mut self.state.selections {
            selection.anchor = selection.anchor.min(len);
            selection.focus = selection.focus.min(len);
        }
    }

    fn select(&mut self, range: SelectionRange) {
        self.state.position = self.text.position_at(range.focus);
        self.state.preferred_column = self.state.position.column;
        self.state.selections = vec![range];
        self.activate();
    }

    /// Move the caret from `origin` to `target`.
    ///
    /// When extending, the anchor is the live selection's anchor if there is one, otherwise the
    /// pre-move offset. Never the new caret offset.
    fn commit(&mut self, origin: usize, target: usize, extend: bool, remember_column: bool) {
        let anchor = self
            .state
            .selection()
            .map(|selection| selection.anchor)
            .unwrap_or(origin);

        self.state.position = self.text.position_at(target);
        if remember_column {
            self.state.preferred_column = self.state.position.column;
        }
        if extend {
            self.state.selections = vec![SelectionRange::new(anchor, self.state.position.offset)];
        } else {
            self.state.selections.clear();
        }
        self.activate();
    }

    fn activate(&mut self) {
        self.state.has_cursor = true;
        self.state.is_blinking = true;
    }
}
