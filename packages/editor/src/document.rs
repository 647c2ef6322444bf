//! # Document Handle
//!
//! A Document is one treebank file and its editing session.
//! Documents can be:
//! - **Memory-backed**: Temporary, for testing or scripted edits
//! - **File-backed**: Loaded from and saved to a path
//!
//! ## Lifecycle
//!
//! ```text
//! Load → Parse → Forest → Edit (undo/redo) → Serialize → Save
//! ```

use crate::config::EditorConfig;
use crate::mutations::{Mutation, MutationOutcome};
use crate::session::EditSession;
use crate::EditorError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;
use treebank_common::FileSystem;
use treebank_parser::{ParseOptions, Serializer};

/// Editable treebank document
#[derive(Debug)]
pub struct Document {
    /// Path to source file (if any)
    pub path: PathBuf,

    /// Current version number (increments on each change that sticks)
    pub version: u64,

    session: EditSession,

    storage: DocumentStorage,
}

/// Storage backend for document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentStorage {
    /// In-memory only (for testing, temp docs)
    Memory,

    /// File-backed
    File { dirty: bool },
}

/// What one document-level edit did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MutationResult {
    pub version: u64,
    pub outcome: MutationOutcome,
}

impl Document {
    /// Create document from source text (memory-backed)
    pub fn from_source(path: PathBuf, source: &str, config: EditorConfig) -> Result<Self, EditorError> {
        let options = Self::parse_options(&config);
        Ok(Self {
            path,
            version: 0,
            session: EditSession::from_source_with_options(source, options, config)?,
            storage: DocumentStorage::Memory,
        })
    }

    /// Load document from file (file-backed)
    pub fn load(fs: &dyn FileSystem, path: &Path, config: EditorConfig) -> Result<Self, EditorError> {
        let source = fs.read_to_string(path)?;
        let mut doc = Self::from_source(path.to_path_buf(), &source, config)?;
        doc.storage = DocumentStorage::File { dirty: false };
        info!(path = %path.display(), roots = doc.session.forest().roots().len(), "loaded document");
        Ok(doc)
    }

    fn parse_options(config: &EditorConfig) -> ParseOptions {
        ParseOptions {
            dash_lemmata: config.dash_lemmata,
        }
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    /// Direct session access for multi-step actions; changes made this way
    /// are not counted until the caller closes the undo step
    pub fn session_mut(&mut self) -> &mut EditSession {
        &mut self.session
    }

    /// Apply a mutation as one undoable step
    pub fn apply(&mut self, mutation: &Mutation) -> Result<MutationResult, EditorError> {
        let outcome = self.session.perform(mutation)?;
        if outcome == MutationOutcome::Applied {
            self.changed();
        }
        Ok(MutationResult {
            version: self.version,
            outcome,
        })
    }

    pub fn undo(&mut self) -> Result<bool, EditorError> {
        let undone = self.session.undo()?;
        if undone {
            self.changed();
        }
        Ok(undone)
    }

    pub fn redo(&mut self) -> Result<bool, EditorError> {
        let redone = self.session.redo()?;
        if redone {
            self.changed();
        }
        Ok(redone)
    }

    fn changed(&mut self) {
        self.version += 1;
        if let DocumentStorage::File { dirty } = &mut self.storage {
            *dirty = true;
        }
    }

    /// Check if document has unsaved changes
    pub fn is_dirty(&self) -> bool {
        matches!(self.storage, DocumentStorage::File { dirty: true })
    }

    pub fn storage(&self) -> DocumentStorage {
        self.storage
    }

    /// Labeled-bracket text of the whole forest
    pub fn to_text(&self) -> String {
        Serializer::new().serialize(&self.session.forest().to_treebank())
    }

    pub fn to_compact_text(&self) -> String {
        Serializer::compact().serialize(&self.session.forest().to_treebank())
    }

    /// Save document to its path (if file-backed)
    pub fn save(&mut self, fs: &dyn FileSystem) -> Result<(), EditorError> {
        let text = self.to_text();
        match &mut self.storage {
            DocumentStorage::File { dirty } => {
                fs.write(&self.path, &text)?;
                *dirty = false;
                info!(path = %self.path.display(), version = self.version, "saved document");
                Ok(())
            }
            DocumentStorage::Memory => Err(EditorError::NotFileBacked),
        }
    }

    /// Write to another path; the document stays attached to its own path
    pub fn save_as(&self, fs: &dyn FileSystem, path: &Path) -> Result<(), EditorError> {
        fs.write(path, &self.to_text())?;
        Ok(())
    }
}
