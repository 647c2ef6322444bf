use crate::ast::*;
use crate::parser::{ID_KEY, METADATA_KEY};

/// Serializer converts a treebank back to labeled-bracket text
///
/// Every root is written inside an unlabeled wrapper together with its
/// metadata, and roots are separated by one blank line. Pretty output keeps
/// phrases whose children are all leaves on one line and indents everything
/// else one level per depth.
pub struct Serializer {
    indent_string: String,
    compact: bool,
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer {
    pub fn new() -> Self {
        Self {
            indent_string: "  ".to_string(),
            compact: false,
        }
    }

    pub fn with_indent(indent: &str) -> Self {
        Self {
            indent_string: indent.to_string(),
            compact: false,
        }
    }

    /// Single-line output per root
    pub fn compact() -> Self {
        Self {
            indent_string: String::new(),
            compact: true,
        }
    }

    pub fn serialize(&self, treebank: &Treebank) -> String {
        let roots: Vec<String> = treebank.roots.iter().map(|r| self.serialize_root(r)).collect();
        let mut output = roots.join("\n\n");
        if !output.is_empty() {
            output.push('\n');
        }
        output
    }

    pub fn serialize_root(&self, root: &Root) -> String {
        let mut output = String::from("( ");
        self.write_tree(&root.tree, 1, &mut output);

        if let Some(id) = root.metadata.get(ID_KEY) {
            self.break_line(1, &mut output);
            output.push_str(&format!("({} {})", ID_KEY, id));
        }

        let mut entries = root.metadata.iter().filter(|(k, _)| k.as_str() != ID_KEY).peekable();
        if entries.peek().is_some() {
            self.break_line(1, &mut output);
            output.push('(');
            output.push_str(METADATA_KEY);
            for (key, value) in entries {
                self.break_line(2, &mut output);
                output.push_str(&format!("({} {})", key, value));
            }
            output.push(')');
        }

        output.push(')');
        output
    }

    /// Serialize one constituent without a wrapper
    pub fn serialize_tree(&self, tree: &Tree) -> String {
        let mut output = String::new();
        self.write_tree(tree, 0, &mut output);
        output
    }

    fn write_tree(&self, tree: &Tree, depth: usize, output: &mut String) {
        match &tree.body {
            TreeBody::Leaf { token, lemma } => {
                output.push('(');
                output.push_str(&tree.label);
                output.push(' ');
                output.push_str(token);
                if let Some(lemma) = lemma {
                    output.push('-');
                    output.push_str(lemma);
                }
                output.push(')');
            }
            TreeBody::Phrase(children) => {
                output.push('(');
                output.push_str(&tree.label);
                let inline = children.iter().all(Tree::is_leaf);
                for child in children {
                    if inline {
                        output.push(' ');
                    } else {
                        self.break_line(depth + 1, output);
                    }
                    self.write_tree(child, depth + 1, output);
                }
                output.push(')');
            }
        }
    }

    fn break_line(&self, depth: usize, output: &mut String) {
        if self.compact {
            output.push(' ');
        } else {
            output.push('\n');
            for _ in 0..depth {
                output.push_str(&self.indent_string);
            }
        }
    }
}

pub fn serialize(treebank: &Treebank) -> String {
    Serializer::new().serialize(treebank)
}
