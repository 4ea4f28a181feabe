//! Per-line text cache keyed by [`LineId`].
//!
//! Entries are filled lazily on read and patched in place by the single-keystroke fast paths.
//! General-path edits invalidate exactly the touched ids. The cache is bounded by an LRU cap so
//! huge files do not keep every line materialized.

use crate::line_index::LineId;
use lru::LruCache;
use std::num::NonZeroUsize;

/// Cached payload of one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineData {
    /// Line text without its newline.
    pub text: String,
    /// Text length plus one if the line ends with a newline (the last line never does).
    pub length: usize,
    text_len: usize,
}

impl LineData {
    /// Create a cache entry for a line's text.
    pub fn new(text: String, has_newline: bool) -> Self {
        let text_len = text.chars().count();
        Self {
            text,
            length: text_len + usize::from(has_newline),
            text_len,
        }
    }

    /// Length of [`text`](Self::text) in characters.
    pub fn text_len(&self) -> usize {
        self.text_len
    }

    /// Whether the line is terminated by a newline.
    pub fn has_newline(&self) -> bool {
        self.length > self.text_len
    }

    fn insert_char(&mut self, column: usize, ch: char) {
        let at = byte_at(&self.text, column);
        self.text.insert(at, ch);
        self.text_len += 1;
        self.length += 1;
    }

    fn remove_char(&mut self, column: usize) {
        if column >= self.text_len {
            return;
        }
        let at = byte_at(&self.text, column);
        self.text.remove(at);
        self.text_len -= 1;
        self.length -= 1;
    }

    fn split_off(&mut self, column: usize) -> LineData {
        let at = byte_at(&self.text, column);
        let suffix = LineData::new(self.text.split_off(at), self.has_newline());
        self.text_len = self.text.chars().count();
        self.length = self.text_len + 1;
        suffix
    }
}

fn byte_at(text: &str, column: usize) -> usize {
    text.char_indices()
        .nth(column)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// LRU-bounded map from [`LineId`] to [`LineData`].
pub struct LineCache {
    entries: LruCache<LineId, LineData>,
}

impl std::fmt::Debug for LineCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineCache")
            .field("len", &self.entries.len())
            .field("capacity", &self.entries.cap())
            .finish()
    }
}

impl LineCache {
    /// Create a cache holding at most `capacity` lines (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
        }
    }

    /// Look up a line, marking it most recently used.
    pub fn get(&mut self, id: LineId) -> Option<&LineData> {
        self.entries.get(&id)
    }

    /// Look up a line without touching recency.
    pub fn peek(&self, id: LineId) -> Option<&LineData> {
        self.entries.peek(&id)
    }

    /// Store a line, evicting the least recently used entry when full.
    pub fn insert(&mut self, id: LineId, data: LineData) {
        self.entries.put(id, data);
    }

    /// Drop a line's entry.
    pub fn invalidate(&mut self, id: LineId) {
        self.entries.pop(&id);
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cached lines.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of cached lines.
    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    /// Splice `ch` into a cached line. No-op on a miss.
    pub fn insert_char(&mut self, id: LineId, column: usize, ch: char) {
        if let Some(data) = self.entries.peek_mut(&id) {
            data.insert_char(column, ch);
        }
    }

    /// Remove the character at `column` from a cached line. No-op on a miss.
    pub fn remove_char(&mut self, id: LineId, column: usize) {
        if let Some(data) = self.entries.peek_mut(&id) {
            data.remove_char(column);
        }
    }

    /// Split a cached line at `column`; the suffix is cached under `new_id`. No-op on a miss.
    pub fn split(&mut self, id: LineId, column: usize, new_id: LineId) {
        if let Some(data) = self.entries.peek_mut(&id) {
            let suffix = data.split_off(column);
            self.entries.put(new_id, suffix);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_index::LineIndex;

    fn ids(count: usize) -> Vec<LineId> {
        let text = "\n".repeat(count.saturating_sub(1));
        LineIndex::from_text(&text).ids().to_vec()
    }

    #[test]
    fn test_line_data_length() {
        let data = LineData::new("abc".to_string(), true);
        assert_eq!(data.length, 4);
        assert_eq!(data.text_len(), 3);
        assert!(data.has_newline());

        let last = LineData::new("你好".to_string(), false);
        assert_eq!(last.length, 2);
        assert!(!last.has_newline());
    }

    #[test]
    fn test_get_and_peek() {
        let ids = ids(2);
        let mut cache = LineCache::new(8);
        cache.insert(ids[0], LineData::new("a".to_string(), true));

        assert_eq!(cache.peek(ids[0]).map(|d| d.text.as_str()), Some("a"));
        assert_eq!(cache.get(ids[0]).map(|d| d.length), Some(2));
        assert!(cache.get(ids[1]).is_none());
    }

    #[test]
    fn test_lru_eviction() {
        let ids = ids(3);
        let mut cache = LineCache::new(2);
        cache.insert(ids[0], LineData::new("a".to_string(), true));
        cache.insert(ids[1], LineData::new("b".to_string(), true));
        cache.get(ids[0]);
        cache.insert(ids[2], LineData::new("c".to_string(), false));

        assert_eq!(cache.len(), 2);
        assert!(cache.peek(ids[0]).is_some());
        assert!(cache.peek(ids[1]).is_none());
    }

    #[test]
    fn test_in_place_char_edits() {
        let ids = ids(1);
        let mut cache = LineCache::new(4);
        cache.insert(ids[0], LineData::new("héllo".to_string(), false));

        cache.insert_char(ids[0], 2, 'X');
        assert_eq!(cache.peek(ids[0]).unwrap().text, "héXllo");
        assert_eq!(cache.peek(ids[0]).unwrap().length, 6);

        cache.remove_char(ids[0], 1);
        assert_eq!(cache.peek(ids[0]).unwrap().text, "hXllo");
        assert_eq!(cache.peek(ids[0]).unwrap().length, 5);
    }

    #[test]
    fn test_split() {
        let ids = ids(2);
        let mut cache = LineCache::new(4);
        cache.insert(ids[0], LineData::new("abc".to_string(), false));

        cache.split(ids[0], 1, ids[1]);
        let prefix = cache.peek(ids[0]).unwrap();
        assert_eq!(prefix.text, "a");
        assert_eq!(prefix.length, 2);
        let suffix = cache.peek(ids[1]).unwrap();
        assert_eq!(suffix.text, "bc");
        assert_eq!(suffix.length, 2);
        assert!(!suffix.has_newline());
    }

    #[test]
    fn test_misses_are_no_ops() {
        let ids = ids(2);
        let mut cache = LineCache::new(4);
        cache.insert_char(ids[0], 0, 'x');
        cache.split(ids[0], 0, ids[1]);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        assert_eq!(LineCache::new(0).capacity(), 1);
    }
}
