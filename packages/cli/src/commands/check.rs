use super::parse_source;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;
use treebank_common::{walk_children, FileSystem, RealFileSystem, Visitor};
use treebank_editor::{EditorConfig, Forest, LabelOracle};
use treebank_parser::{is_empty_category, Tree, Treebank};
use walkdir::WalkDir;

const EXTENSIONS: &[&str] = &["psd", "txt"];

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Treebank file or directory to check
    pub input: PathBuf,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub roots: usize,
    pub phrases: usize,
    pub leaves: usize,
    pub empty_categories: usize,
    pub words: usize,
}

impl Stats {
    fn add(&mut self, other: &Stats) {
        self.roots += other.roots;
        self.phrases += other.phrases;
        self.leaves += other.leaves;
        self.empty_categories += other.empty_categories;
        self.words += other.words;
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
    pub problems: Vec<String>,
    pub stats: Stats,
}

impl FileReport {
    fn is_clean(&self) -> bool {
        self.parse_error.is_none() && self.problems.is_empty()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    pub files: Vec<FileReport>,
    pub totals: Stats,
}

/// Counts nodes and flags labels the corpus configuration does not allow
struct Survey<'a> {
    oracle: &'a dyn LabelOracle,
    stats: Stats,
    problems: Vec<String>,
}

impl Visitor for Survey<'_> {
    fn visit_root(&mut self, root: &treebank_parser::Root) {
        self.stats.roots += 1;
        treebank_common::walk_root(self, root);
    }

    fn visit_phrase(&mut self, tree: &Tree, children: &[Tree]) {
        self.stats.phrases += 1;
        if !self.oracle.is_legal_phrasal_label(&tree.label) {
            self.problems
                .push(format!("illegal phrase label {} at {}", tree.label, tree.span.start));
        }
        walk_children(self, children);
    }

    fn visit_leaf(&mut self, tree: &Tree, token: &str, _lemma: Option<&str>) {
        self.stats.leaves += 1;
        if is_empty_category(token) {
            self.stats.empty_categories += 1;
        } else {
            self.stats.words += 1;
        }
        if !self.oracle.is_legal_terminal_label(&tree.label) {
            self.problems
                .push(format!("illegal leaf label {} at {}", tree.label, tree.span.start));
        }
    }
}

pub fn check(args: CheckArgs, config: &EditorConfig) -> Result<()> {
    let files = find_treebank_files(&args.input)?;
    let oracle = config.oracle();

    let reports: Vec<FileReport> = files
        .iter()
        .map(|path| check_file(&RealFileSystem, path, config, oracle.as_ref()))
        .collect();

    let mut totals = Stats::default();
    for report in &reports {
        totals.add(&report.stats);
    }
    let failed = reports.iter().filter(|r| !r.is_clean()).count();
    let report = CheckReport {
        files: reports,
        totals,
    };

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "text" => print_text(&report),
        other => return Err(anyhow!("Unknown format: {}. Use: text or json", other)),
    }

    if failed > 0 {
        return Err(anyhow!("{} of {} files have problems", failed, report.files.len()));
    }
    Ok(())
}

fn find_treebank_files(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        return Err(anyhow!("Input path does not exist: {}", input.display()));
    }

    let mut files: Vec<PathBuf> = WalkDir::new(input)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|s| s.to_str())
                .map_or(false, |ext| EXTENSIONS.contains(&ext))
        })
        .collect();
    files.sort();
    Ok(files)
}

fn check_file(
    fs: &dyn FileSystem,
    path: &Path,
    config: &EditorConfig,
    oracle: &dyn LabelOracle,
) -> FileReport {
    debug!(path = %path.display(), "checking");
    let mut report = FileReport {
        path: path.to_path_buf(),
        parse_error: None,
        problems: Vec::new(),
        stats: Stats::default(),
    };

    let treebank = match fs
        .read_to_string(path)
        .map_err(anyhow::Error::from)
        .and_then(|source| parse_source(&source, path, config))
    {
        Ok(treebank) => treebank,
        Err(e) => {
            report.parse_error = Some(e.to_string());
            return report;
        }
    };

    let (stats, problems) = survey(&treebank, oracle);
    report.stats = stats;
    report.problems = problems;
    report
        .problems
        .extend(Forest::from_treebank(&treebank).validate());
    report
}

fn survey(treebank: &Treebank, oracle: &dyn LabelOracle) -> (Stats, Vec<String>) {
    let mut survey = Survey {
        oracle,
        stats: Stats::default(),
        problems: Vec::new(),
    };
    survey.visit_treebank(treebank);
    (survey.stats, survey.problems)
}

fn print_text(report: &CheckReport) {
    for file in &report.files {
        if file.is_clean() {
            println!(
                "  {} {} ({} trees, {} words)",
                "✓".green(),
                file.path.display(),
                file.stats.roots,
                file.stats.words
            );
            continue;
        }

        println!("  {} {}", "✗".red(), file.path.display());
        if let Some(error) = &file.parse_error {
            println!("{}", error);
        }
        for problem in &file.problems {
            println!("      {} {}", "warning:".yellow(), problem);
        }
    }

    let totals = &report.totals;
    println!();
    println!("   Files checked: {}", report.files.len());
    println!(
        "   Trees: {}  Phrases: {}  Leaves: {}  Words: {}  Empty categories: {}",
        totals.roots, totals.phrases, totals.leaves, totals.words, totals.empty_categories
    );
}
