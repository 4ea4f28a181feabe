//! Document configuration.
//!
//! Plain data, deserializable from any serde format. Missing fields fall back to defaults.

use serde::{Deserialize, Serialize};

/// Default number of characters read per chunk when scanning for word boundaries.
pub const DEFAULT_WORD_SCAN_CHUNK: usize = 4096;

/// Default number of lines kept in the per-line text cache.
pub const DEFAULT_LINE_CACHE_CAPACITY: usize = 4096;

/// Default number of edit descriptors queued for a parser before the queue is dropped.
pub const DEFAULT_MAX_PENDING_EDITS: usize = 1024;

/// When the piece list is rewritten into a single piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompactionPolicy {
    /// Never compact below this many pieces.
    pub min_pieces: usize,
    /// Compact once pieces exceed this multiple of the line count.
    pub pieces_per_line: usize,
}

impl Default for CompactionPolicy {
    fn default() -> Self {
        Self {
            min_pieces: 512,
            pieces_per_line: 4,
        }
    }
}

impl CompactionPolicy {
    /// Whether a snapshot with `pieces` pieces over `lines` lines should be compacted.
    pub fn should_compact(&self, pieces: usize, lines: usize) -> bool {
        pieces > self.min_pieces.max(self.pieces_per_line.saturating_mul(lines))
    }
}

/// Per-document settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Characters read per chunk by word-wise cursor movement.
    pub word_scan_chunk: usize,
    /// Maximum number of cached [`LineData`](crate::LineData) entries.
    pub line_cache_capacity: usize,
    /// Piece-list compaction policy.
    pub compaction: CompactionPolicy,
    /// Edit descriptors kept between drains. Past this the queue is dropped and the next
    /// [`ParseRequest`](crate::ParseRequest) asks for a full reparse.
    pub max_pending_edits: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            word_scan_chunk: DEFAULT_WORD_SCAN_CHUNK,
            line_cache_capacity: DEFAULT_LINE_CACHE_CAPACITY,
            compaction: CompactionPolicy::default(),
            max_pending_edits: DEFAULT_MAX_PENDING_EDITS,
        }
    }
}
