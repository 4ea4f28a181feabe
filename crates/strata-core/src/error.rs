//! Error types for the fallible outer surfaces.
//!
//! Editing, cursor movement and line queries never fail: out-of-range input is clamped and
//! index inconsistencies are repaired by a full rebuild. Only loading, persisting and document
//! handle lookups can return an error.

use crate::workspace::DocumentId;
use std::path::PathBuf;
use thiserror::Error;

/// A persisted snapshot failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    /// A piece has zero length.
    #[error("piece {index} is empty")]
    EmptyPiece {
        /// Position in the piece list.
        index: usize,
    },
    /// A piece extends past the end of its source buffer.
    #[error("piece {index} lies outside its source buffer")]
    PieceOutOfBounds {
        /// Position in the piece list.
        index: usize,
    },
    /// A piece starts or ends inside a UTF-8 sequence.
    #[error("piece {index} does not fall on character boundaries")]
    NotCharBoundary {
        /// Position in the piece list.
        index: usize,
    },
    /// A piece's recorded character length disagrees with its content.
    #[error("piece {index} records {expected} characters but spans {actual}")]
    LengthMismatch {
        /// Position in the piece list.
        index: usize,
        /// Recorded length.
        expected: usize,
        /// Length of the referenced text.
        actual: usize,
    },
}

/// Raw document bytes could not be turned into a document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The bytes are not valid UTF-8.
    #[error("document is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

/// The storage collaborator failed.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading a document failed.
    #[error("failed to load {}: {source}", .path.display())]
    Load {
        /// Document path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Writing a document back failed.
    #[error("failed to persist {}: {source}", .path.display())]
    Persist {
        /// Document path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Workspace-level errors.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// No document is open under this handle.
    #[error("document {0:?} is not open")]
    DocumentNotFound(DocumentId),
    /// A document is already open for this path.
    #[error("{} is already open", .0.display())]
    PathAlreadyOpen(PathBuf),
    /// The document has no path to persist to.
    #[error("document {0:?} has no path")]
    NoPath(DocumentId),
    /// Decoding the document failed.
    #[error(transparent)]
    Document(#[from] DocumentError),
    /// The storage collaborator failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
