mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{check, edit, fmt, ids, CheckArgs, EditArgs, FmtArgs, IdsArgs};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Treebank CLI - format, check and script edits of labeled-bracket corpora
#[derive(Parser, Debug)]
#[command(name = "treebank")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Corpus configuration (defaults to ./treebank.config.json if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a file and print it in canonical form
    Fmt(FmtArgs),

    /// Validate treebank files and report statistics
    Check(CheckArgs),

    /// Print trees with the node ids used by edit scripts
    Ids(IdsArgs),

    /// Run a JSON edit script against a file
    Edit(EditArgs),
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let config = config::load_config(&treebank_common::RealFileSystem, cli.config.as_deref(), &cwd)?;

    match cli.command {
        Command::Fmt(args) => fmt(args, &config),
        Command::Check(args) => check(args, &config),
        Command::Ids(args) => ids(args, &config),
        Command::Edit(args) => edit(args, config),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
