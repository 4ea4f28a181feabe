//! Piece-table text storage.
//!
//! A [`BufferSnapshot`] is an immutable document state: a read-only original buffer, an
//! append-only added buffer, and an ordered list of [`Piece`]s describing how to rebuild the
//! text. Every edit returns a new snapshot and leaves its input untouched.
//!
//! Buffers and the piece list are reference counted. Cloning a snapshot is O(1), and a clone can
//! be handed to a background reader (e.g. a parser) without any locking. The owned edit variants
//! ([`BufferSnapshot::into_inserted`], [`BufferSnapshot::into_deleted`]) append in place while
//! the snapshot is unshared and copy once when it is shared.
//!
//! All offsets and lengths are character offsets (Unicode scalar values).

use crate::error::SnapshotError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which buffer a [`Piece`] reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceSource {
    /// Read-only buffer holding the text the snapshot was created from.
    Original,
    /// Append-only buffer holding every inserted string.
    Added,
}

/// A contiguous span of one source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    /// Source buffer.
    pub source: PieceSource,
    /// Start position in the source buffer (byte offset).
    pub start: usize,
    /// Byte length of the span.
    pub byte_len: usize,
    /// Character length of the span.
    pub len: usize,
}

impl Piece {
    /// Create a new piece.
    pub fn new(source: PieceSource, start: usize, byte_len: usize, len: usize) -> Self {
        Self {
            source,
            start,
            byte_len,
            len,
        }
    }

    fn is_ascii(&self) -> bool {
        self.byte_len == self.len
    }

    /// Whether `next` continues this piece byte-for-byte in the added buffer.
    fn is_followed_by(&self, next: &Piece) -> bool {
        self.source == PieceSource::Added
            && next.source == PieceSource::Added
            && self.start + self.byte_len == next.start
    }
}

/// Immutable document text at one point in time.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "SnapshotParts", into = "SnapshotParts")]
pub struct BufferSnapshot {
    original: Arc<str>,
    added: Arc<String>,
    pieces: Arc<Vec<Piece>>,
    len: usize,
}

impl std::fmt::Debug for BufferSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferSnapshot")
            .field("len", &self.len)
            .field("pieces", &self.pieces.len())
            .field("original_bytes", &self.original.len())
            .field("added_bytes", &self.added.len())
            .finish()
    }
}

impl Default for BufferSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl BufferSnapshot {
    /// Create a snapshot whose original buffer is `text`.
    pub fn new(text: &str) -> Self {
        let len = text.chars().count();
        let pieces = if text.is_empty() {
            Vec::new()
        } else {
            vec![Piece::new(PieceSource::Original, 0, text.len(), len)]
        };

        Self {
            original: Arc::from(text),
            added: Arc::new(String::new()),
            pieces: Arc::new(pieces),
            len,
        }
    }

    /// Create an empty snapshot.
    pub fn empty() -> Self {
        Self::new("")
    }

    /// Rebuild a snapshot from its persisted parts, validating every piece.
    pub fn from_parts(
        original: String,
        added: String,
        pieces: Vec<Piece>,
    ) -> Result<Self, SnapshotError> {
        let mut len = 0;
        for (index, piece) in pieces.iter().enumerate() {
            if piece.len == 0 || piece.byte_len == 0 {
                return Err(SnapshotError::EmptyPiece { index });
            }

            let source = match piece.source {
                PieceSource::Original => original.as_str(),
                PieceSource::Added => added.as_str(),
            };
            let end = piece
                .start
                .checked_add(piece.byte_len)
                .filter(|end| *end <= source.len())
                .ok_or(SnapshotError::PieceOutOfBounds { index })?;
            let text = source
                .get(piece.start..end)
                .ok_or(SnapshotError::NotCharBoundary { index })?;

            let actual = text.chars().count();
            if actual != piece.len {
                return Err(SnapshotError::LengthMismatch {
                    index,
                    expected: piece.len,
                    actual,
                });
            }
            len += actual;
        }

        Ok(Self {
            original: Arc::from(original),
            added: Arc::new(added),
            pieces: Arc::new(pieces),
            len,
        })
    }

    /// Total character count.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the document is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total byte count.
    pub fn byte_len(&self) -> usize {
        self.pieces.iter().map(|p| p.byte_len).sum()
    }

    /// Number of pieces in the piece list.
    pub fn piece_count(&self) -> usize {
        self.pieces.len()
    }

    /// The piece list.
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    /// The original buffer.
    pub fn original(&self) -> &str {
        &self.original
    }

    /// The added buffer, including text no longer referenced by any piece.
    pub fn added(&self) -> &str {
        &self.added
    }

    /// Returns `true` if both snapshots share the same piece list allocation.
    pub fn shares_pieces_with(&self, other: &BufferSnapshot) -> bool {
        Arc::ptr_eq(&self.pieces, &other.pieces)
    }

    /// Insert `text` at `offset`, returning the new snapshot.
    ///
    /// `offset` is clamped to the document length.
    pub fn insert(&self, offset: usize, text: &str) -> Self {
        self.clone().into_inserted(offset, text)
    }

    /// Delete `len` characters starting at `offset`, returning the new snapshot.
    ///
    /// The range is clamped to the document.
    pub fn delete(&self, offset: usize, len: usize) -> Self {
        self.clone().into_deleted(offset, len)
    }

    /// Owned variant of [`insert`](Self::insert).
    pub fn into_inserted(mut self, offset: usize, text: &str) -> Self {
        if text.is_empty() {
            return self;
        }

        let offset = offset.min(self.len);
        let (index, within) = self.locate(offset);
        let split = (within > 0).then(|| self.split_piece(index, within));

        let added = Arc::make_mut(&mut self.added);
        let inserted = Piece::new(
            PieceSource::Added,
            added.len(),
            text.len(),
            text.chars().count(),
        );
        added.push_str(text);

        let pieces = Arc::make_mut(&mut self.pieces);
        match split {
            Some((left, right)) => {
                pieces.splice(index..=index, [left, inserted, right]);
            }
            None if index > 0 && pieces[index - 1].is_followed_by(&inserted) => {
                // Sequential typing keeps extending the same piece.
                let previous = &mut pieces[index - 1];
                previous.byte_len += inserted.byte_len;
                previous.len += inserted.len;
            }
            None => pieces.insert(index, inserted),
        }

        self.len += inserted.len;
        self
    }

    /// Owned variant of [`delete`](Self::delete).
    pub fn into_deleted(mut self, offset: usize, len: usize) -> Self {
        let start = offset.min(self.len);
        let end = start.saturating_add(len).min(self.len);
        if start == end {
            return self;
        }

        let (first, head) = self.locate(start);
        let (last, tail_from) = {
            let (index, within) = self.locate(end - 1);
            (index, within + 1)
        };

        let mut replacement = Vec::with_capacity(2);
        if head > 0 {
            replacement.push(self.split_piece(first, head).0);
        }
        if tail_from < self.pieces[last].len {
            replacement.push(self.split_piece(last, tail_from).1);
        }

        Arc::make_mut(&mut self.pieces).splice(first..=last, replacement);
        self.len -= end - start;
        self
    }

    /// Text in the character range `[start, end)`, clamped to the document.
    pub fn text_range(&self, start: usize, end: usize) -> String {
        let start = start.min(self.len);
        let end = end.min(self.len).max(start);
        let mut out = String::with_capacity(end - start);
        if start == end {
            return out;
        }

        let (mut index, mut within) = self.locate(start);
        let mut remaining = end - start;
        while remaining > 0 && index < self.pieces.len() {
            let piece = &self.pieces[index];
            let text = self.piece_text(piece);
            let take = (piece.len - within).min(remaining);
            let from = byte_index(text, piece.is_ascii(), within);
            let to = byte_index(text, piece.is_ascii(), within + take);
            out.push_str(&text[from..to]);

            remaining -= take;
            index += 1;
            within = 0;
        }

        out
    }

    /// The whole document text.
    pub fn text(&self) -> String {
        let mut out = String::with_capacity(self.byte_len());
        for piece in self.pieces.iter() {
            out.push_str(self.piece_text(piece));
        }
        out
    }

    /// The character at `offset`, if any.
    pub fn char_at(&self, offset: usize) -> Option<char> {
        if offset >= self.len {
            return None;
        }
        let (index, within) = self.locate(offset);
        let piece = self.pieces.get(index)?;
        let text = self.piece_text(piece);
        if piece.is_ascii() {
            text.as_bytes().get(within).map(|b| char::from(*b))
        } else {
            text.chars().nth(within)
        }
    }

    /// Rewrite the snapshot as a single original piece with an empty added buffer.
    ///
    /// The text is unchanged; piece count drops to at most one.
    pub fn compact(&self) -> Self {
        Self::new(&self.text())
    }

    fn piece_text(&self, piece: &Piece) -> &str {
        let source: &str = match piece.source {
            PieceSource::Original => &self.original,
            PieceSource::Added => self.added.as_str(),
        };
        &source[piece.start..piece.start + piece.byte_len]
    }

    /// Find the piece containing character `offset`.
    ///
    /// Returns `(piece_index, char_offset_in_piece)`. An offset on a piece boundary resolves to
    /// the start of the following piece; the document end resolves to `(piece_count, 0)`.
    fn locate(&self, offset: usize) -> (usize, usize) {
        let mut current = 0;
        for (index, piece) in self.pieces.iter().enumerate() {
            if offset < current + piece.len {
                return (index, offset - current);
            }
            current += piece.len;
        }
        (self.pieces.len(), 0)
    }

    /// Split piece `index` at `char_offset` (exclusive of both ends of the piece).
    fn split_piece(&self, index: usize, char_offset: usize) -> (Piece, Piece) {
        let piece = self.pieces[index];
        let text = self.piece_text(&piece);
        let byte_offset = byte_index(text, piece.is_ascii(), char_offset);

        let left = Piece::new(piece.source, piece.start, byte_offset, char_offset);
        let right = Piece::new(
            piece.source,
            piece.start + byte_offset,
            piece.byte_len - byte_offset,
            piece.len - char_offset,
        );
        (left, right)
    }
}

fn byte_index(text: &str, is_ascii: bool, char_index: usize) -> usize {
    if is_ascii {
        return char_index.min(text.len());
    }
    text.char_indices()
        .nth(char_index)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// Persisted form of a [`BufferSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotParts {
    /// Original buffer.
    pub original: String,
    /// Added buffer.
    pub added: String,
    /// Piece list.
    pub pieces: Vec<Piece>,
}

impl From<BufferSnapshot> for SnapshotParts {
    fn from(snapshot: BufferSnapshot) -> Self {
        Self {
            original: snapshot.original.to_string(),
            added: snapshot.added.as_str().to_string(),
            pieces: snapshot.pieces.as_ref().clone(),
        }
    }
}

impl TryFrom<SnapshotParts> for BufferSnapshot {
    type Error = SnapshotError;

    fn try_from(parts: SnapshotParts) -> Result<Self, Self::Error> {
        BufferSnapshot::from_parts(parts.original, parts.added, parts.pieces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_snapshot() {
        let snapshot = BufferSnapshot::new("Hello, World!");
        assert_eq!(snapshot.text(), "Hello, World!");
        assert_eq!(snapshot.len(), 13);
        assert_eq!(snapshot.piece_count(), 1);
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = BufferSnapshot::empty();
        assert_eq!(snapshot.text(), "");
        assert_eq!(snapshot.len(), 0);
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.piece_count(), 0);
    }

    #[test]
    fn test_insert_at_start() {
        let snapshot = BufferSnapshot::new("World").insert(0, "Hello, ");
        assert_eq!(snapshot.text(), "Hello, World");
    }

    #[test]
    fn test_insert_at_end() {
        let snapshot = BufferSnapshot::new("Hello").insert(5, ", World");
        assert_eq!(snapshot.text(), "Hello, World");
    }

    #[test]
    fn test_insert_in_middle_splits_piece() {
        let snapshot = BufferSnapshot::new("Hlo").insert(1, "el");
        assert_eq!(snapshot.text(), "Hello");
        assert_eq!(snapshot.piece_count(), 3);
    }

    #[test]
    fn test_insert_past_end_is_clamped() {
        let snapshot = BufferSnapshot::new("abc").insert(99, "d");
        assert_eq!(snapshot.text(), "abcd");
    }

    #[test]
    fn test_insert_into_empty() {
        let snapshot = BufferSnapshot::empty().insert(0, "x");
        assert_eq!(snapshot.text(), "x");
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_delete_at_start() {
        let snapshot = BufferSnapshot::new("Hello, World").delete(0, 7);
        assert_eq!(snapshot.text(), "World");
    }

    #[test]
    fn test_delete_at_end() {
        let snapshot = BufferSnapshot::new("Hello, World").delete(5, 7);
        assert_eq!(snapshot.text(), "Hello");
    }

    #[test]
    fn test_delete_in_middle() {
        let snapshot = BufferSnapshot::new("Hello, World").delete(5, 2);
        assert_eq!(snapshot.text(), "HelloWorld");
        assert_eq!(snapshot.len(), 10);
    }

    #[test]
    fn test_delete_across_pieces() {
        let snapshot = BufferSnapshot::new("ABC")
            .insert(1, "1")
            .insert(3, "2")
            .insert(5, "3");
        assert_eq!(snapshot.text(), "A1B2C3");

        let snapshot = snapshot.delete(1, 4);
        assert_eq!(snapshot.text(), "A3");
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn test_delete_is_clamped() {
        let snapshot = BufferSnapshot::new("abc");
        assert_eq!(snapshot.delete(2, 100).text(), "ab");
        assert_eq!(snapshot.delete(100, 1).text(), "abc");
        assert_eq!(snapshot.delete(1, 0).text(), "abc");
    }

    #[test]
    fn test_multiple_operations() {
        let snapshot = BufferSnapshot::new("Hello")
            .insert(5, " World")
            .insert(5, ",")
            .delete(0, 7)
            .insert(0, "Hi, ");
        assert_eq!(snapshot.text(), "Hi, World");
    }

    #[test]
    fn test_edits_never_mutate_input() {
        let before = BufferSnapshot::new("Hello");
        let after = before.insert(5, " World");
        let deleted = after.delete(0, 6);

        assert_eq!(before.text(), "Hello");
        assert_eq!(after.text(), "Hello World");
        assert_eq!(deleted.text(), "World");
        assert!(!before.shares_pieces_with(&after));
    }

    #[test]
    fn test_owned_edit_appends_in_place_when_unshared() {
        let snapshot = BufferSnapshot::new("abc").into_inserted(3, "d");
        assert_eq!(Arc::strong_count(&snapshot.added), 1);
        assert_eq!(Arc::strong_count(&snapshot.pieces), 1);

        let snapshot = snapshot.into_inserted(4, "e");
        assert_eq!(snapshot.added(), "de");
        assert_eq!(snapshot.text(), "abcde");
        assert_eq!(snapshot.piece_count(), 2);
    }

    #[test]
    fn test_clone_shares_until_edited() {
        let snapshot = BufferSnapshot::new("abc").insert(1, "x");
        let handed_out = snapshot.clone();
        assert!(snapshot.shares_pieces_with(&handed_out));

        let edited = snapshot.into_inserted(0, "y");
        assert_eq!(edited.text(), "yaxbc");
        assert_eq!(handed_out.text(), "axbc");
    }

    #[test]
    fn test_utf8_chinese() {
        let snapshot = BufferSnapshot::new("你好");
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.byte_len(), 6);

        let snapshot = snapshot.insert(1, "们");
        assert_eq!(snapshot.text(), "你们好");
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.char_at(1), Some('们'));
    }

    #[test]
    fn test_utf8_emoji() {
        let snapshot = BufferSnapshot::new("Hello 👋").insert(6, "World ");
        assert_eq!(snapshot.text(), "Hello World 👋");
        assert_eq!(snapshot.text_range(12, 13), "👋");
    }

    #[test]
    fn test_text_range() {
        let snapshot = BufferSnapshot::new("Hello, World!");
        assert_eq!(snapshot.text_range(0, 5), "Hello");
        assert_eq!(snapshot.text_range(7, 12), "World");
        assert_eq!(snapshot.text_range(0, 13), "Hello, World!");
        assert_eq!(snapshot.text_range(7, 100), "World!");
        assert_eq!(snapshot.text_range(9, 3), "");
    }

    #[test]
    fn test_text_range_spans_pieces() {
        let snapshot = BufferSnapshot::new("ace").insert(1, "b").insert(3, "d");
        assert_eq!(snapshot.text(), "abcde");
        assert_eq!(snapshot.text_range(1, 4), "bcd");
    }

    #[test]
    fn test_char_at() {
        let snapshot = BufferSnapshot::new("ab").insert(1, "é");
        assert_eq!(snapshot.char_at(0), Some('a'));
        assert_eq!(snapshot.char_at(1), Some('é'));
        assert_eq!(snapshot.char_at(2), Some('b'));
        assert_eq!(snapshot.char_at(3), None);
    }

    #[test]
    fn test_sequential_typing_merges_pieces() {
        let mut snapshot = BufferSnapshot::new("Hello");
        snapshot = snapshot.into_inserted(5, " ");
        snapshot = snapshot.into_inserted(6, "W");
        snapshot = snapshot.into_inserted(7, "o");
        assert_eq!(snapshot.text(), "Hello Wo");
        assert_eq!(snapshot.piece_count(), 2);
    }

    #[test]
    fn test_compact() {
        let snapshot = BufferSnapshot::new("ABC")
            .insert(1, "1")
            .insert(3, "2")
            .delete(0, 1);
        assert!(snapshot.piece_count() > 1);

        let compacted = snapshot.compact();
        assert_eq!(compacted.text(), snapshot.text());
        assert_eq!(compacted.piece_count(), 1);
        assert_eq!(compacted.added(), "");
    }

    #[test]
    fn test_from_parts_rejects_bad_pieces() {
        let out_of_bounds = vec![Piece::new(PieceSource::Original, 2, 5, 5)];
        assert_eq!(
            BufferSnapshot::from_parts("abc".into(), String::new(), out_of_bounds).unwrap_err(),
            SnapshotError::PieceOutOfBounds { index: 0 }
        );

        let empty = vec![Piece::new(PieceSource::Added, 0, 0, 0)];
        assert_eq!(
            BufferSnapshot::from_parts(String::new(), "x".into(), empty).unwrap_err(),
            SnapshotError::EmptyPiece { index: 0 }
        );

        let mid_char = vec![Piece::new(PieceSource::Original, 1, 1, 1)];
        assert_eq!(
            BufferSnapshot::from_parts("你".into(), String::new(), mid_char).unwrap_err(),
            SnapshotError::NotCharBoundary { index: 0 }
        );
    }

    #[test]
    fn test_parts_round_trip() {
        let snapshot = BufferSnapshot::new("fn main() {}")
            .insert(11, "\n    body();\n")
            .delete(0, 3);
        let parts = SnapshotParts::from(snapshot.clone());
        let restored = BufferSnapshot::try_from(parts).unwrap();
        assert_eq!(restored.text(), snapshot.text());
        assert_eq!(restored.pieces(), snapshot.pieces());
    }
}
