use anyhow::{anyhow, Context, Result};
use clap::Args;
use colored::Colorize;
use serde_json::Value;
use std::path::PathBuf;
use tracing::{info, warn};
use treebank_common::{FileSystem, RealFileSystem};
use treebank_editor::{Document, EditorConfig, Mutation, MutationOutcome, NodeId};

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Treebank file to edit
    pub file: PathBuf,

    /// JSON array of edit steps
    #[arg(short, long)]
    pub script: PathBuf,

    /// Write the result here instead of printing it
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Report rejected steps and carry on instead of stopping
    #[arg(long)]
    pub keep_going: bool,
}

/// One entry of an edit script
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Mutation(Mutation),
    Undo,
    Redo,
    Select(NodeId),
    ClearSelection,
}

/// Parse a script: session commands by `op`, everything else as a mutation
pub fn parse_script(text: &str) -> Result<Vec<Step>> {
    let values: Vec<Value> = serde_json::from_str(text).context("Script must be a JSON array")?;

    values
        .into_iter()
        .enumerate()
        .map(|(i, value)| {
            let op = value.get("op").and_then(Value::as_str).unwrap_or_default();
            let step = match op {
                "undo" => Step::Undo,
                "redo" => Step::Redo,
                "clear_selection" => Step::ClearSelection,
                "select" => {
                    let node = value
                        .get("node")
                        .and_then(Value::as_u64)
                        .ok_or_else(|| anyhow!("Step {}: select needs a numeric node", i + 1))?;
                    Step::Select(NodeId(node))
                }
                _ => Step::Mutation(
                    serde_json::from_value(value).with_context(|| format!("Step {}", i + 1))?,
                ),
            };
            Ok(step)
        })
        .collect()
}

#[derive(Debug, Default, PartialEq)]
pub struct EditSummary {
    pub applied: usize,
    pub rolled_back: usize,
    pub rejected: usize,
}

/// Run every step against `doc`; each mutation is its own undo step
pub fn run_script(doc: &mut Document, steps: &[Step], keep_going: bool) -> Result<EditSummary> {
    let mut summary = EditSummary::default();

    for (i, step) in steps.iter().enumerate() {
        let number = i + 1;
        match step {
            Step::Mutation(mutation) => match doc.apply(mutation) {
                Ok(result) if result.outcome == MutationOutcome::Applied => summary.applied += 1,
                Ok(_) => {
                    warn!(step = number, op = mutation.name(), "rolled back");
                    eprintln!(
                        "  {} step {} ({}) changed the token order and was undone",
                        "⚠".yellow(),
                        number,
                        mutation.name()
                    );
                    summary.rolled_back += 1;
                }
                Err(e) if keep_going => {
                    eprintln!("  {} step {} ({}): {}", "✗".red(), number, mutation.name(), e);
                    summary.rejected += 1;
                }
                Err(e) => return Err(anyhow!("Step {} ({}): {}", number, mutation.name(), e)),
            },
            Step::Undo => {
                if !doc.undo()? {
                    warn!(step = number, "nothing to undo");
                }
            }
            Step::Redo => {
                if !doc.redo()? {
                    warn!(step = number, "nothing to redo");
                }
            }
            Step::Select(node) => doc
                .session_mut()
                .select(*node)
                .with_context(|| format!("Step {}", number))?,
            Step::ClearSelection => doc.session_mut().clear_selection(),
        }
    }

    Ok(summary)
}

pub fn edit(args: EditArgs, config: EditorConfig) -> Result<()> {
    let fs = RealFileSystem;
    let script = fs.read_to_string(&args.script)?;
    let steps = parse_script(&script)?;

    let mut doc = Document::load(&fs, &args.file, config)?;
    let summary = run_script(&mut doc, &steps, args.keep_going)?;
    info!(?summary, version = doc.version, "script finished");

    match &args.output {
        Some(output) => {
            doc.save_as(&fs, output)?;
            eprintln!(
                "{} {} step(s) applied, {} rolled back, {} rejected → {}",
                "✓".green(),
                summary.applied,
                summary.rolled_back,
                summary.rejected,
                output.display()
            );
        }
        None => print!("{}", doc.to_text()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use treebank_editor::Parent;

    fn document(source: &str) -> Document {
        Document::from_source(PathBuf::from("t.psd"), source, EditorConfig::default()).unwrap()
    }

    #[test]
    fn test_parse_script() {
        let steps = parse_script(
            r#"[
                { "op": "select", "node": 3 },
                { "op": "move_node", "moved": 3, "target": "forest" },
                { "op": "undo" },
                { "op": "redo" },
                { "op": "clear_selection" }
            ]"#,
        )
        .unwrap();

        assert_eq!(
            steps,
            vec![
                Step::Select(NodeId(3)),
                Step::Mutation(Mutation::MoveNode {
                    moved: NodeId(3),
                    target: Parent::Forest,
                }),
                Step::Undo,
                Step::Redo,
                Step::ClearSelection,
            ]
        );
    }

    #[test]
    fn test_parse_script_names_bad_step() {
        let err = parse_script(r#"[{ "op": "undo" }, { "op": "fly", "node": 1 }]"#).unwrap_err();
        assert!(err.to_string().contains("Step 2"));
    }

    #[test]
    fn test_run_script() {
        // IP1 NP2 N3 VBD4
        let mut doc = document("(IP (NP (N cat)) (VBD sat))");
        let steps = parse_script(
            r#"[
                { "op": "relabel", "node": 2, "label": "NP-SBJ" },
                { "op": "relabel", "node": 4, "label": "VBP" },
                { "op": "undo" }
            ]"#,
        )
        .unwrap();

        let summary = run_script(&mut doc, &steps, false).unwrap();
        assert_eq!(summary.applied, 2);
        assert_eq!(doc.to_compact_text(), "( (IP (NP-SBJ (N cat)) (VBD sat)))\n");
    }

    #[test]
    fn test_rejected_step_stops_or_continues() {
        let steps = parse_script(
            r#"[
                { "op": "prune", "node": 4 },
                { "op": "relabel", "node": 4, "label": "VBP" }
            ]"#,
        )
        .unwrap();

        let mut doc = document("(IP (NP (N cat)) (VBD sat))");
        let err = run_script(&mut doc, &steps, false).unwrap_err();
        assert!(err.to_string().starts_with("Step 1 (prune)"));

        let mut doc = document("(IP (NP (N cat)) (VBD sat))");
        let summary = run_script(&mut doc, &steps, true).unwrap();
        assert_eq!(
            summary,
            EditSummary {
                applied: 1,
                rolled_back: 0,
                rejected: 1,
            }
        );
    }
}
