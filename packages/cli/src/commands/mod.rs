pub mod check;
pub mod edit;
pub mod fmt;
pub mod ids;

pub use check::{check, CheckArgs};
pub use edit::{edit, EditArgs};
pub use fmt::{fmt, FmtArgs};
pub use ids::{ids, IdsArgs};

use anyhow::{anyhow, Result};
use std::path::Path;
use treebank_common::{FileSystem, RealFileSystem};
use treebank_editor::EditorConfig;
use treebank_parser::{format_error, parse_with_options, ParseOptions, Treebank};

pub(crate) fn parse_options(config: &EditorConfig) -> ParseOptions {
    ParseOptions {
        dash_lemmata: config.dash_lemmata,
    }
}

/// Parse `source`, rendering a failure as a source report
pub(crate) fn parse_source(source: &str, path: &Path, config: &EditorConfig) -> Result<Treebank> {
    parse_with_options(source, parse_options(config)).map_err(|e| {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown");
        anyhow!("\n{}", format_error(source, file_name, &e))
    })
}

pub(crate) fn read_treebank(path: &Path, config: &EditorConfig) -> Result<Treebank> {
    let source = RealFileSystem.read_to_string(path)?;
    parse_source(&source, path, config)
}
