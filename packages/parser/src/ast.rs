use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Byte range of a construct in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Span for nodes that were built in memory rather than parsed
    pub fn synthetic() -> Self {
        Self::default()
    }
}

/// A whole treebank file: an ordered sequence of root trees
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Treebank {
    pub roots: Vec<Root>,
}

impl Treebank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overt tokens of the whole file, in order
    pub fn tokens(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for root in &self.roots {
            root.tree.collect_tokens(&mut out);
        }
        out
    }
}

/// One annotated sentence, with the metadata carried by its wrapper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Root {
    pub tree: Tree,
    pub metadata: BTreeMap<String, String>,
    pub span: Span,
}

impl Root {
    pub fn new(tree: Tree) -> Self {
        let span = tree.span;
        Self {
            tree,
            metadata: BTreeMap::new(),
            span,
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A labeled constituent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub label: String,
    pub body: TreeBody,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeBody {
    Phrase(Vec<Tree>),
    Leaf {
        token: String,
        lemma: Option<String>,
    },
}

impl Tree {
    pub fn leaf(label: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            body: TreeBody::Leaf {
                token: token.into(),
                lemma: None,
            },
            span: Span::synthetic(),
        }
    }

    pub fn leaf_with_lemma(
        label: impl Into<String>,
        token: impl Into<String>,
        lemma: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            body: TreeBody::Leaf {
                token: token.into(),
                lemma: Some(lemma.into()),
            },
            span: Span::synthetic(),
        }
    }

    pub fn phrase(label: impl Into<String>, children: Vec<Tree>) -> Self {
        Self {
            label: label.into(),
            body: TreeBody::Phrase(children),
            span: Span::synthetic(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.body, TreeBody::Leaf { .. })
    }

    pub fn children(&self) -> &[Tree] {
        match &self.body {
            TreeBody::Phrase(children) => children,
            TreeBody::Leaf { .. } => &[],
        }
    }

    /// Number of constituents in this subtree, including itself
    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(Tree::node_count).sum::<usize>()
    }

    /// Overt tokens of this subtree, empty categories excluded
    pub fn tokens(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_tokens(&mut out);
        out
    }

    fn collect_tokens<'a>(&'a self, out: &mut Vec<&'a str>) {
        match &self.body {
            TreeBody::Leaf { token, .. } => {
                if !is_empty_category(token) {
                    out.push(token);
                }
            }
            TreeBody::Phrase(children) => {
                for child in children {
                    child.collect_tokens(out);
                }
            }
        }
    }
}

/// Whether a token is an empty category (trace, null element or comment)
/// rather than overt text.
pub fn is_empty_category(token: &str) -> bool {
    token.is_empty() || token == "0" || token.starts_with('*') || token.starts_with('{')
}

/// Split a dash-format `word-lemma` token.
///
/// Empty categories never carry lemmata, and an all-digit suffix is a
/// coindex rather than a lemma.
pub fn split_dash_lemma(token: &str) -> (String, Option<String>) {
    if is_empty_category(token) {
        return (token.to_string(), None);
    }
    match token.rfind('-') {
        Some(pos) if pos > 0 && pos + 1 < token.len() => {
            let lemma = &token[pos + 1..];
            if lemma.chars().all(|c| c.is_ascii_digit()) {
                (token.to_string(), None)
            } else {
                (token[..pos].to_string(), Some(lemma.to_string()))
            }
        }
        _ => (token.to_string(), None),
    }
}
