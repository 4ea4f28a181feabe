#![warn(missing_docs)]
//! Strata Core - Headless Text Editing Kernel
//!
//! # Overview
//!
//! `strata-core` holds the in-memory state of open text documents: a piece-table text buffer,
//! an incrementally maintained line index with stable line ids, an edit applier with O(1)
//! keystroke fast paths, and a cursor/selection engine. It does not render; viewport
//! virtualization lives in `strata-viewport`, which [`Document`] feeds through
//! [`strata_viewport::RowSource`].
//!
//! All offsets are character (Unicode scalar value) offsets. Text is stored with LF newlines.
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Workspace (document arena)                 │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Document (edit applier + cursor engine)    │  ← Editing
//! ├─────────────────────────────────────────────┤
//! │  Line Index + LineData cache                │  ← Line Access
//! ├─────────────────────────────────────────────┤
//! │  Piece Table Snapshots                      │  ← Text Storage
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use strata_core::{Direction, Document};
//!
//! let mut doc = Document::from_text("fn main() {\n}\n");
//! doc.cursor_mut().set_from_click(0, 11, false);
//! doc.type_text("\n    println!(\"hi\");");
//!
//! assert_eq!(doc.line_count(), 4);
//! assert_eq!(doc.line_text(1), Some("    println!(\"hi\");"));
//!
//! doc.cursor_mut().move_by(Direction::Up, false, false);
//! assert_eq!(doc.cursor().position.line, 0);
//! ```
//!
//! # Background Parsing
//!
//! Snapshots are immutable and cheap to clone, so they cross thread boundaries without locks:
//!
//! ```rust
//! use strata_core::Document;
//!
//! let mut doc = Document::from_text("let x = 1;");
//! doc.insert(10, "\nlet y = 2;");
//! let request = doc.parse_request();
//! let revision = request.revision;
//!
//! let handle = std::thread::spawn(move || request.snapshot.text().lines().count());
//! doc.insert(0, "// header\n");
//!
//! assert_eq!(handle.join().unwrap(), 2);
//! assert!(!doc.is_current(revision));
//! ```
//!
//! # Module Description
//!
//! - [`storage`] - Piece table snapshots
//! - [`line_index`] - Line starts and stable line ids
//! - [`line_cache`] - LRU-bounded per-line text cache
//! - [`edit`] - Edit descriptors and fast-path classification
//! - [`document`] - Edit applier and document queries
//! - [`cursor`] - Cursor and selection engine
//! - [`workspace`] - Arena of open documents
//! - [`store`] - Storage collaborator

pub mod config;
pub mod cursor;
pub mod document;
pub mod edit;
pub mod error;
pub mod line_cache;
pub mod line_ending;
pub mod line_index;
pub mod storage;
pub mod store;
pub mod workspace;

pub use config::{CompactionPolicy, EditorConfig};
pub use cursor::{
    Cursor, CursorPosition, CursorState, Direction, SelectionRange, TextView, next_word_boundary,
    prev_word_boundary,
};
pub use document::Document;
pub use edit::{EditDescriptor, EditPath, ParseRequest, Point};
pub use error::{DocumentError, SnapshotError, StoreError, WorkspaceError};
pub use line_cache::{LineCache, LineData};
pub use line_ending::LineEnding;
pub use line_index::{IndexMismatch, LineChange, LineId, LineIndex};
pub use storage::{BufferSnapshot, Piece, PieceSource, SnapshotParts};
pub use store::{DocumentStore, FsStore};
pub use workspace::{DocumentId, Workspace};
