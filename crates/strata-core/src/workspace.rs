//! Arena of open documents.
//!
//! Each open document gets an opaque [`DocumentId`] handle. Documents own their own line index
//! and cursor, so switching the active document only swaps which handle is current; nothing is
//! rebuilt.

use crate::config::EditorConfig;
use crate::document::Document;
use crate::error::{DocumentError, WorkspaceError};
use crate::store::DocumentStore;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Opaque identifier for an open document in a [`Workspace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentId(u64);

impl DocumentId {
    /// Get the underlying numeric id.
    pub fn get(self) -> u64 {
        self.0
    }
}

struct DocumentEntry {
    path: Option<PathBuf>,
    document: Document,
}

/// Open documents plus the active handle.
pub struct Workspace {
    next_id: u64,
    documents: BTreeMap<DocumentId, DocumentEntry>,
    by_path: HashMap<PathBuf, DocumentId>,
    active: Option<DocumentId>,
    config: EditorConfig,
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("documents", &self.documents.len())
            .field("active", &self.active)
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    /// Empty workspace with the default document configuration.
    pub fn new() -> Self {
        Self::with_config(EditorConfig::default())
    }

    /// Empty workspace; every document opened through it uses `config`.
    pub fn with_config(config: EditorConfig) -> Self {
        Self {
            next_id: 1,
            documents: BTreeMap::new(),
            by_path: HashMap::new(),
            active: None,
            config,
        }
    }

    /// Number of open documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns `true` if no document is open.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Open handles in creation order.
    pub fn ids(&self) -> impl Iterator<Item = DocumentId> + '_ {
        self.documents.keys().copied()
    }

    /// Open a document from text. `path` is optional; scratch documents have none.
    ///
    /// The first document opened becomes active.
    pub fn open_text(
        &mut self,
        path: Option<PathBuf>,
        text: &str,
    ) -> Result<DocumentId, WorkspaceError> {
        self.check_path(path.as_deref())?;
        let document = Document::with_config(text, self.config.clone());
        Ok(self.insert(path, document))
    }

    /// Open a document from raw UTF-8 bytes.
    pub fn open_bytes(
        &mut self,
        path: Option<PathBuf>,
        bytes: Vec<u8>,
    ) -> Result<DocumentId, WorkspaceError> {
        self.check_path(path.as_deref())?;
        let document = Document::from_bytes(bytes, self.config.clone())?;
        Ok(self.insert(path, document))
    }

    /// Load `path` through `store` and open it.
    pub fn open_path(
        &mut self,
        store: &dyn DocumentStore,
        path: impl Into<PathBuf>,
    ) -> Result<DocumentId, WorkspaceError> {
        let path = path.into();
        self.check_path(Some(&path))?;
        let bytes = store.load(&path)?;
        self.open_bytes(Some(path), bytes)
    }

    /// Write a document back through `store`, with its preferred line ending.
    pub fn save(&self, store: &dyn DocumentStore, id: DocumentId) -> Result<(), WorkspaceError> {
        let entry = self
            .documents
            .get(&id)
            .ok_or(WorkspaceError::DocumentNotFound(id))?;
        let path = entry.path.as_deref().ok_or(WorkspaceError::NoPath(id))?;
        store.persist(path, &entry.document.text_for_saving())?;
        debug!(id = id.get(), path = %path.display(), "document saved");
        Ok(())
    }

    /// Re-read a document from `store`, discarding in-memory state.
    pub fn reload(
        &mut self,
        store: &dyn DocumentStore,
        id: DocumentId,
    ) -> Result<(), WorkspaceError> {
        let entry = self
            .documents
            .get_mut(&id)
            .ok_or(WorkspaceError::DocumentNotFound(id))?;
        let path = entry.path.as_deref().ok_or(WorkspaceError::NoPath(id))?;
        let bytes = store.load(path)?;
        let text = String::from_utf8(bytes).map_err(DocumentError::from)?;
        entry.document.reset(&text);
        Ok(())
    }

    /// Close a document. If it was active, no document is active afterwards.
    pub fn close(&mut self, id: DocumentId) -> Result<Document, WorkspaceError> {
        let entry = self
            .documents
            .remove(&id)
            .ok_or(WorkspaceError::DocumentNotFound(id))?;
        if let Some(path) = &entry.path {
            self.by_path.remove(path);
        }
        if self.active == Some(id) {
            self.active = None;
        }
        debug!(id = id.get(), "document closed");
        Ok(entry.document)
    }

    /// Make `id` the active document.
    pub fn set_active(&mut self, id: DocumentId) -> Result<(), WorkspaceError> {
        if !self.documents.contains_key(&id) {
            return Err(WorkspaceError::DocumentNotFound(id));
        }
        if self.active != Some(id) {
            debug!(id = id.get(), "active document switched");
        }
        self.active = Some(id);
        Ok(())
    }

    /// Handle of the active document.
    pub fn active_id(&self) -> Option<DocumentId> {
        self.active
    }

    /// The active document.
    pub fn active(&self) -> Option<&Document> {
        self.active.and_then(|id| self.get(id))
    }

    /// The active document, mutably.
    pub fn active_mut(&mut self) -> Option<&mut Document> {
        let id = self.active?;
        self.get_mut(id)
    }

    /// Look up a document.
    pub fn get(&self, id: DocumentId) -> Option<&Document> {
        self.documents.get(&id).map(|entry| &entry.document)
    }

    /// Look up a document mutably.
    pub fn get_mut(&mut self, id: DocumentId) -> Option<&mut Document> {
        self.documents.get_mut(&id).map(|entry| &mut entry.document)
    }

    /// Path a document was opened from.
    pub fn path(&self, id: DocumentId) -> Option<&Path> {
        self.documents.get(&id)?.path.as_deref()
    }

    /// Handle of the document opened from `path`.
    pub fn id_for_path(&self, path: &Path) -> Option<DocumentId> {
        self.by_path.get(path).copied()
    }

    fn check_path(&self, path: Option<&Path>) -> Result<(), WorkspaceError> {
        match path {
            Some(path) if self.by_path.contains_key(path) => {
                Err(WorkspaceError::PathAlreadyOpen(path.to_path_buf()))
            }
            _ => Ok(()),
        }
    }

    fn insert(&mut self, path: Option<PathBuf>, document: Document) -> DocumentId {
        let id = DocumentId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);

        if let Some(path) = &path {
            self.by_path.insert(path.clone(), id);
        }
        debug!(
            id = id.get(),
            path = ?path,
            lines = document.line_count(),
            "document opened"
        );
        self.documents.insert(id, DocumentEntry { path, document });
        if self.active.is_none() {
            self.active = Some(id);
        }
        id
    }
}
