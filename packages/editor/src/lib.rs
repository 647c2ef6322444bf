//! # Treebank Editor
//!
//! Editing engine for phrase-structure treebanks.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ parser: bracketed text → Treebank AST       │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: Forest + EditSession                │
//! │  - Tree model with stable node ids          │
//! │  - Guarded mutations, speculative rollback  │
//! │  - Per-root delta undo/redo                 │
//! │  - Selection and label configuration        │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ serializer: Forest → bracketed text         │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Explicit ids**: operations name the nodes they act on
//! 2. **Reject before mutating**: an illegal edit changes nothing
//! 3. **Token order is sacred**: structural edits that reorder text are rolled back
//! 4. **Undo by root**: each step stores only the root trees it changed
//!
//! ## Usage
//!
//! ```rust,ignore
//! use treebank_editor::{EditSession, EditorConfig, Mutation, NodeId};
//!
//! let mut session = EditSession::from_source(
//!     "(IP (NP-SBJ (D The) (N cat)) (VBD sat))",
//!     EditorConfig::default(),
//! )?;
//!
//! session.perform(&Mutation::Relabel {
//!     node: NodeId(4),
//!     label: "NS".into(),
//! })?;
//!
//! session.undo()?;
//! ```

pub mod checks;
mod config;
mod document;
mod errors;
mod forest;
mod label;
mod mutations;
mod operations;
mod selection;
mod session;
mod undo_stack;

pub use config::{
    BasesAndDashes, EditorConfig, LabelCycle, LabelOracle, LegalLabels, Permissive,
    DEFAULT_CONFIG_NAME,
};
pub use document::{Document, DocumentStorage, MutationResult};
pub use errors::EditorError;
pub use forest::{
    Forest, Metadata, Node, NodeId, NodeKind, NodeSnapshot, Parent, ScopeCheckpoint, SnapshotBody,
};
pub use label::{base_of, split_coindex, Coindex, CoindexKind, Label};
pub use mutations::{Mutation, MutationError, MutationOutcome, Side};
pub use selection::Selection;
pub use session::EditSession;
pub use undo_stack::{invert_and_apply, RemovedRoot, UndoDelta, UndoStack};
