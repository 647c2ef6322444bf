//! Error types for the editor

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Parse error: {0}")]
    Parse(#[from] treebank_parser::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] treebank_common::CommonError),

    #[error("Mutation error: {0}")]
    Mutation(#[from] crate::mutations::MutationError),

    #[error("Invalid config {path}: {message}")]
    Config { path: String, message: String },

    #[error("Document is not file-backed")]
    NotFileBacked,
}
