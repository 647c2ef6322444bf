use super::read_treebank;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;
use treebank_common::{FileSystem, RealFileSystem};
use treebank_editor::EditorConfig;
use treebank_parser::{Serializer, Treebank};

#[derive(Debug, Args)]
pub struct FmtArgs {
    /// Treebank file to format
    pub file: PathBuf,

    /// One line per tree instead of indented output
    #[arg(long)]
    pub compact: bool,

    /// Rewrite the file in place instead of printing
    #[arg(short, long)]
    pub write: bool,
}

pub fn fmt(args: FmtArgs, config: &EditorConfig) -> Result<()> {
    let treebank = read_treebank(&args.file, config)?;
    let output = render(&treebank, args.compact);

    if args.write {
        RealFileSystem.write(&args.file, &output)?;
        info!(path = %args.file.display(), roots = treebank.roots.len(), "formatted");
        eprintln!(
            "{} {} ({} trees)",
            "✓".green(),
            args.file.display(),
            treebank.roots.len()
        );
    } else {
        print!("{}", output);
    }
    Ok(())
}

fn render(treebank: &Treebank, compact: bool) -> String {
    let serializer = if compact {
        Serializer::compact()
    } else {
        Serializer::new()
    };
    serializer.serialize(treebank)
}
