use super::read_treebank;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use treebank_editor::{EditorConfig, Forest, NodeId, NodeKind};

#[derive(Debug, Args)]
pub struct IdsArgs {
    /// Treebank file to list
    pub file: PathBuf,
}

pub fn ids(args: IdsArgs, config: &EditorConfig) -> Result<()> {
    let treebank = read_treebank(&args.file, config)?;
    let forest = Forest::from_treebank(&treebank);

    for line in id_lines(&forest) {
        println!("{}", line);
    }
    Ok(())
}

/// One line per node, indented by depth, id first
fn id_lines(forest: &Forest) -> Vec<String> {
    let mut lines = Vec::new();
    for &root in forest.roots() {
        push_lines(forest, root, 0, &mut lines);
        if let Some(metadata) = forest.get(root).and_then(|n| n.metadata.as_ref()) {
            for (key, value) in metadata {
                lines.push(format!("  ({} {})", key, value).dimmed().to_string());
            }
        }
        lines.push(String::new());
    }
    lines.pop();
    lines
}

fn push_lines(forest: &Forest, id: NodeId, depth: usize, lines: &mut Vec<String>) {
    let Some(node) = forest.get(id) else {
        return;
    };
    let indent = "  ".repeat(depth);
    let tag = format!("{:>5}", id.to_string());

    match &node.kind {
        NodeKind::Phrasal { children } => {
            lines.push(format!("{} {}{}", tag.cyan(), indent, node.label.bold()));
            for &child in children {
                push_lines(forest, child, depth + 1, lines);
            }
        }
        NodeKind::Terminal { token, lemma } => {
            let word = match lemma {
                Some(lemma) => format!("{} [{}]", token, lemma),
                None => token.clone(),
            };
            lines.push(format!("{} {}{} {}", tag.cyan(), indent, node.label, word));
        }
    }
}
