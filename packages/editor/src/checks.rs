//! # Invariant Checks
//!
//! Pure predicates over the forest consumed by the mutation guards.

use crate::config::EditorConfig;
use crate::forest::{Forest, NodeId, NodeKind};
use crate::label::{split_coindex, Coindex};
use crate::mutations::MutationError;
use std::cmp::Ordering;
use std::collections::HashSet;
use treebank_parser::is_empty_category;

/// Whether `node` may receive moved or wrapped material.
/// Terminals never can, nor can phrases whose base is a non-container.
pub fn can_be_move_target(forest: &Forest, config: &EditorConfig, node: NodeId) -> bool {
    match forest.get(node) {
        Some(n) => n.is_phrasal() && !config.is_non_container(&n.label),
        None => false,
    }
}

/// Whether moving `node` away would leave its parent with no children.
/// At the root level this means `node` is the only tree in the forest.
pub fn would_orphan_parent(forest: &Forest, node: NodeId) -> bool {
    forest.contains(node) && forest.siblings(node).len() == 1
}

/// Overt tokens of the given roots in the given order
pub fn token_sequence(forest: &Forest, scope: &[NodeId]) -> Vec<String> {
    scope.iter().flat_map(|&root| forest.tokens(root)).collect()
}

/// True when `a` is strictly below `b`
pub fn is_descendant_of(forest: &Forest, a: NodeId, b: NodeId) -> bool {
    forest.is_below(a, b)
}

/// Distinct nodes sharing a parent (root-level trees are sisters too)
pub fn are_sisters(forest: &Forest, a: NodeId, b: NodeId) -> bool {
    a != b && forest.contains(a) && forest.contains(b) && forest.parent(a) == forest.parent(b)
}

/// The contiguous run of sisters from `first` to `last`, in document
/// order whichever way round they are given.
pub fn sister_run(
    forest: &Forest,
    first: NodeId,
    last: NodeId,
) -> Result<Vec<NodeId>, MutationError> {
    forest.node(first)?;
    forest.node(last)?;
    if first == last {
        return Ok(vec![first]);
    }
    if !are_sisters(forest, first, last) {
        return Err(MutationError::NotSisters(first, last));
    }

    let (first, last) = in_document_order(forest, first, last);
    let siblings = forest.siblings(first);
    let (Some(lo), Some(hi)) = (
        siblings.iter().position(|&s| s == first),
        siblings.iter().position(|&s| s == last),
    ) else {
        return Err(MutationError::NotSisters(first, last));
    };
    Ok(siblings[lo..=hi].to_vec())
}

/// Order a pair by document position
pub fn in_document_order(forest: &Forest, a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    match forest.document_order(a, b) {
        Ordering::Greater => (b, a),
        _ => (a, b),
    }
}

/// Where a node's coindex is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexCarrier {
    Label,
    /// Trace leaves (`*T*-1`) carry the index on the token
    Token,
}

pub fn index_carrier(forest: &Forest, config: &EditorConfig, node: NodeId) -> IndexCarrier {
    match forest.get(node).map(|n| &n.kind) {
        Some(NodeKind::Terminal { token, .. }) if config.is_trace_token(token) => {
            IndexCarrier::Token
        }
        _ => IndexCarrier::Label,
    }
}

/// The coindex a node carries, read from the label or the trace token
pub fn index_of(forest: &Forest, config: &EditorConfig, node: NodeId) -> Option<Coindex> {
    let n = forest.get(node)?;
    match index_carrier(forest, config, node) {
        IndexCarrier::Token => n.token().and_then(|t| split_coindex(t).1),
        IndexCarrier::Label => split_coindex(&n.label).1,
    }
}

/// Every coindex under `root` that renumbering writes to: label indices
/// and empty-category token indices
fn indices_under(forest: &Forest, root: NodeId) -> impl Iterator<Item = u32> + '_ {
    forest
        .descendants(root)
        .into_iter()
        .filter_map(move |id| forest.get(id))
        .flat_map(|n| {
            let from_label = split_coindex(&n.label).1;
            let from_token = n
                .token()
                .filter(|t| is_empty_category(t))
                .and_then(|t| split_coindex(t).1);
            [from_label, from_token]
        })
        .flatten()
        .map(|c| c.index)
}

/// Highest coindex used anywhere in the tree under `root`, 0 when none.
pub fn max_index(forest: &Forest, root: NodeId) -> u32 {
    indices_under(forest, root).max().unwrap_or(0)
}

/// Whether the trees under `a` and `b` use a common coindex
pub fn share_an_index(forest: &Forest, a: NodeId, b: NodeId) -> bool {
    let seen: HashSet<u32> = indices_under(forest, a).collect();
    indices_under(forest, b).any(|i| seen.contains(&i))
}

/// The next unused coindex in the tree under `root`
pub fn fresh_index(forest: &Forest, root: NodeId) -> Result<u32, MutationError> {
    max_index(forest, root)
        .checked_add(1)
        .ok_or(MutationError::IndexOverflow(root))
}
