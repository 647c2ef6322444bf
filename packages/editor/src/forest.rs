//! # Tree Model
//!
//! The forest is an arena of nodes keyed by [`NodeId`] plus the ordered list
//! of root-level trees. Parent links are back-references only; a phrase owns
//! its children through its child id list.
//!
//! Structural primitives are O(1) apart from sibling-list splicing.
//! Snapshots and restores are O(subtree).

use crate::mutations::MutationError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use treebank_parser::ast::{is_empty_category, Root, Span, Tree, TreeBody, Treebank};

/// Stable node identity, never reused within a forest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub type Metadata = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Phrasal { children: Vec<NodeId> },
    Terminal { token: String, lemma: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    /// Only ever set on root-level nodes
    pub metadata: Option<Metadata>,
}

impl Node {
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, NodeKind::Terminal { .. })
    }

    pub fn is_phrasal(&self) -> bool {
        matches!(self.kind, NodeKind::Phrasal { .. })
    }

    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Phrasal { children } => children,
            NodeKind::Terminal { .. } => &[],
        }
    }

    pub fn token(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Terminal { token, .. } => Some(token),
            NodeKind::Phrasal { .. } => None,
        }
    }

    pub fn lemma(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Terminal { lemma, .. } => lemma.as_deref(),
            NodeKind::Phrasal { .. } => None,
        }
    }
}

/// Deep immutable copy of a subtree, ids included
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub label: String,
    pub body: SnapshotBody,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotBody {
    Phrasal(Vec<NodeSnapshot>),
    Terminal { token: String, lemma: Option<String> },
}

impl NodeSnapshot {
    pub fn node_count(&self) -> usize {
        match &self.body {
            SnapshotBody::Phrasal(children) => {
                1 + children.iter().map(NodeSnapshot::node_count).sum::<usize>()
            }
            SnapshotBody::Terminal { .. } => 1,
        }
    }

    fn max_id(&self) -> u64 {
        match &self.body {
            SnapshotBody::Phrasal(children) => children
                .iter()
                .map(NodeSnapshot::max_id)
                .fold(self.id.0, u64::max),
            SnapshotBody::Terminal { .. } => self.id.0,
        }
    }
}

/// Where a node lives: at the root level or under a phrase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parent {
    Forest,
    Node(NodeId),
}

/// Saved root order plus copies of the roots an operation may change
#[derive(Debug, Clone)]
pub struct ScopeCheckpoint {
    roots: Vec<NodeId>,
    snapshots: Vec<NodeSnapshot>,
}

impl ScopeCheckpoint {
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn scope(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.snapshots.iter().map(|s| s.id)
    }
}

#[derive(Debug, Clone)]
pub struct Forest {
    nodes: HashMap<NodeId, Node>,
    roots: Vec<NodeId>,
    next_id: u64,
}

impl Default for Forest {
    fn default() -> Self {
        Self::new()
    }
}

/// Structural equality: same nodes, same root order. The id counter is
/// bookkeeping and does not take part.
impl PartialEq for Forest {
    fn eq(&self, other: &Self) -> bool {
        self.roots == other.roots && self.nodes == other.nodes
    }
}

impl Eq for Forest {}

impl Forest {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            roots: Vec::new(),
            next_id: 1,
        }
    }

    /// Build a forest from parsed text. Ids are assigned in pre-order
    /// starting at 1.
    pub fn from_treebank(treebank: &Treebank) -> Self {
        let mut forest = Self::new();
        for root in &treebank.roots {
            let id = forest.load_tree(&root.tree, None);
            if !root.metadata.is_empty() {
                if let Some(node) = forest.nodes.get_mut(&id) {
                    node.metadata = Some(root.metadata.clone());
                }
            }
            forest.roots.push(id);
        }
        forest
    }

    fn load_tree(&mut self, tree: &Tree, parent: Option<NodeId>) -> NodeId {
        let id = self.alloc_id();
        let kind = match &tree.body {
            TreeBody::Leaf { token, lemma } => NodeKind::Terminal {
                token: token.clone(),
                lemma: lemma.clone(),
            },
            TreeBody::Phrase(_) => NodeKind::Phrasal {
                children: Vec::new(),
            },
        };
        self.nodes.insert(
            id,
            Node {
                id,
                label: tree.label.clone(),
                kind,
                parent,
                metadata: None,
            },
        );

        if let TreeBody::Phrase(children) = &tree.body {
            let child_ids: Vec<NodeId> = children
                .iter()
                .map(|child| self.load_tree(child, Some(id)))
                .collect();
            if let Some(Node {
                kind: NodeKind::Phrasal { children },
                ..
            }) = self.nodes.get_mut(&id)
            {
                *children = child_ids;
            }
        }
        id
    }

    pub fn to_treebank(&self) -> Treebank {
        Treebank {
            roots: self
                .roots
                .iter()
                .filter_map(|&id| self.root_to_ast(id))
                .collect(),
        }
    }

    pub fn root_to_ast(&self, id: NodeId) -> Option<Root> {
        let tree = self.tree_to_ast(id)?;
        let metadata = self.nodes.get(&id)?.metadata.clone().unwrap_or_default();
        Some(Root {
            tree,
            metadata,
            span: Span::synthetic(),
        })
    }

    pub fn tree_to_ast(&self, id: NodeId) -> Option<Tree> {
        let node = self.nodes.get(&id)?;
        let body = match &node.kind {
            NodeKind::Terminal { token, lemma } => TreeBody::Leaf {
                token: token.clone(),
                lemma: lemma.clone(),
            },
            NodeKind::Phrasal { children } => TreeBody::Phrase(
                children
                    .iter()
                    .filter_map(|&child| self.tree_to_ast(child))
                    .collect(),
            ),
        };
        Some(Tree {
            label: node.label.clone(),
            body,
            span: Span::synthetic(),
        })
    }

    fn alloc_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    // Queries

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, MutationError> {
        self.nodes.get(&id).ok_or(MutationError::NodeNotFound(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, MutationError> {
        self.nodes.get_mut(&id).ok_or(MutationError::NodeNotFound(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Number of nodes in the arena
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn label(&self, id: NodeId) -> Result<&str, MutationError> {
        Ok(&self.node(id)?.label)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(&id).map(Node::children).unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    pub fn is_root_level(&self, id: NodeId) -> bool {
        self.nodes.get(&id).map(|n| n.parent.is_none()).unwrap_or(false)
    }

    /// The sibling list `id` lives in: its parent's children or the roots
    pub fn siblings(&self, id: NodeId) -> &[NodeId] {
        match self.parent(id) {
            Some(parent) => self.children(parent),
            None => &self.roots,
        }
    }

    pub fn position_in_parent(&self, id: NodeId) -> Option<usize> {
        self.siblings(id).iter().position(|&s| s == id)
    }

    pub fn root_of(&self, id: NodeId) -> Result<NodeId, MutationError> {
        let mut current = self.node(id)?;
        let mut steps = 0;
        while let Some(parent) = current.parent {
            current = self.node(parent)?;
            steps += 1;
            if steps > self.nodes.len() {
                return Err(MutationError::CycleDetected);
            }
        }
        Ok(current.id)
    }

    pub fn index_in_forest(&self, root: NodeId) -> Option<usize> {
        self.roots.iter().position(|&r| r == root)
    }

    pub fn preceding_root(&self, root: NodeId) -> Option<NodeId> {
        match self.index_in_forest(root) {
            Some(pos) if pos > 0 => Some(self.roots[pos - 1]),
            _ => None,
        }
    }

    /// Ancestors from the root down to `id`, inclusive
    pub fn path(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current.and_then(|c| self.nodes.get(&c)) {
            path.push(node.id);
            current = node.parent;
            if path.len() > self.nodes.len() {
                break;
            }
        }
        path.reverse();
        path
    }

    fn order_key(&self, id: NodeId) -> Vec<usize> {
        self.path(id)
            .into_iter()
            .map(|n| self.position_in_parent(n).unwrap_or(usize::MAX))
            .collect()
    }

    /// Document (pre-)order: ancestors come before their descendants
    pub fn document_order(&self, a: NodeId, b: NodeId) -> Ordering {
        self.order_key(a).cmp(&self.order_key(b))
    }

    /// Pre-order ids of the subtree rooted at `id`, `id` included
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(&current) {
                out.push(current);
                stack.extend(node.children().iter().rev().copied());
            }
        }
        out
    }

    /// Overt tokens under `id` in order; empty categories are skipped
    pub fn tokens(&self, id: NodeId) -> Vec<String> {
        self.descendants(id)
            .into_iter()
            .filter_map(|n| self.nodes.get(&n).and_then(Node::token))
            .filter(|t| !is_empty_category(t))
            .map(str::to_string)
            .collect()
    }

    // Primitives

    /// New detached terminal; the caller attaches it
    pub fn create_terminal(
        &mut self,
        label: impl Into<String>,
        token: impl Into<String>,
        lemma: Option<String>,
    ) -> NodeId {
        let id = self.alloc_id();
        self.nodes.insert(
            id,
            Node {
                id,
                label: label.into(),
                kind: NodeKind::Terminal {
                    token: token.into(),
                    lemma,
                },
                parent: None,
                metadata: None,
            },
        );
        id
    }

    /// New phrase dominating `children`, placed where the first child was.
    /// The children keep the given order.
    pub fn create_phrasal(
        &mut self,
        label: impl Into<String>,
        children: &[NodeId],
    ) -> Result<NodeId, MutationError> {
        let Some(&first) = children.first() else {
            return Err(MutationError::MalformedInput(
                "a phrase needs at least one child".to_string(),
            ));
        };
        for &child in children {
            self.node(child)?;
        }

        let parent = self.parent(first);
        let attached = self.position_in_parent(first);
        let slot = attached.map(|pos| {
            let siblings = self.siblings(first);
            let earlier = children
                .iter()
                .filter(|&&c| {
                    self.parent(c) == parent
                        && siblings.iter().position(|&s| s == c).map(|p| p < pos) == Some(true)
                })
                .count();
            pos - earlier
        });

        let id = self.alloc_id();
        self.nodes.insert(
            id,
            Node {
                id,
                label: label.into(),
                kind: NodeKind::Phrasal {
                    children: Vec::new(),
                },
                parent: None,
                metadata: None,
            },
        );

        for &child in children {
            self.detach(child);
            self.attach(child, Parent::Node(id), usize::MAX);
        }

        if let Some(slot) = slot {
            let destination = match parent {
                Some(p) => Parent::Node(p),
                None => Parent::Forest,
            };
            self.attach(id, destination, slot);
        }
        Ok(id)
    }

    /// Move `node` under `parent` at `position` (clamped), rejecting cycles
    /// and terminal destinations.
    pub fn reparent(
        &mut self,
        node: NodeId,
        parent: Parent,
        position: usize,
    ) -> Result<(), MutationError> {
        self.node(node)?;
        if let Parent::Node(p) = parent {
            if !self.node(p)?.is_phrasal() {
                return Err(MutationError::NotATarget(p));
            }
            if p == node || self.is_below(p, node) {
                return Err(MutationError::CycleDetected);
            }
        }
        self.detach(node);
        self.attach(node, parent, position);
        Ok(())
    }

    /// Detach `node` and drop its whole subtree
    pub fn remove(&mut self, node: NodeId) -> Result<(), MutationError> {
        self.node(node)?;
        self.drop_subtree(node);
        Ok(())
    }

    pub fn clone_subtree(&self, id: NodeId) -> Result<NodeSnapshot, MutationError> {
        let node = self.node(id)?;
        let body = match &node.kind {
            NodeKind::Terminal { token, lemma } => SnapshotBody::Terminal {
                token: token.clone(),
                lemma: lemma.clone(),
            },
            NodeKind::Phrasal { children } => SnapshotBody::Phrasal(
                children
                    .iter()
                    .map(|&child| self.clone_subtree(child))
                    .collect::<Result<_, _>>()?,
            ),
        };
        Ok(NodeSnapshot {
            id,
            label: node.label.clone(),
            body,
            metadata: node.metadata.clone(),
        })
    }

    /// Replace the node at `snapshot.id` in place with the snapshot's
    /// content. A missing node is recreated detached.
    pub fn restore_from_snapshot(&mut self, snapshot: &NodeSnapshot) {
        let parent = self.parent(snapshot.id);
        if self.contains(snapshot.id) {
            self.purge_descendants(snapshot.id);
        }
        self.overwrite_from_snapshot(snapshot, parent);
    }

    pub(crate) fn is_below(&self, a: NodeId, b: NodeId) -> bool {
        let mut current = self.parent(a);
        let mut steps = 0;
        while let Some(p) = current {
            if p == b {
                return true;
            }
            current = self.parent(p);
            steps += 1;
            if steps > self.nodes.len() {
                return false;
            }
        }
        false
    }

    /// Unlink `node` from its sibling list, leaving it detached
    pub(crate) fn detach(&mut self, node: NodeId) {
        let parent = self.parent(node);
        match parent {
            Some(p) => {
                if let Some(Node {
                    kind: NodeKind::Phrasal { children },
                    ..
                }) = self.nodes.get_mut(&p)
                {
                    children.retain(|&c| c != node);
                }
            }
            None => self.roots.retain(|&r| r != node),
        }
        if let Some(n) = self.nodes.get_mut(&node) {
            n.parent = None;
        }
    }

    /// Link a detached node into a sibling list at `position` (clamped)
    pub(crate) fn attach(&mut self, node: NodeId, parent: Parent, position: usize) {
        match parent {
            Parent::Forest => {
                let position = position.min(self.roots.len());
                self.roots.insert(position, node);
                if let Some(n) = self.nodes.get_mut(&node) {
                    n.parent = None;
                }
            }
            Parent::Node(p) => {
                if let Some(Node {
                    kind: NodeKind::Phrasal { children },
                    ..
                }) = self.nodes.get_mut(&p)
                {
                    let position = position.min(children.len());
                    children.insert(position, node);
                }
                if let Some(n) = self.nodes.get_mut(&node) {
                    n.parent = Some(p);
                }
            }
        }
    }

    /// Put a detached root back right after `preceding`, or at the head
    pub(crate) fn insert_root_after(&mut self, node: NodeId, preceding: Option<NodeId>) {
        let position = preceding
            .and_then(|p| self.index_in_forest(p))
            .map(|pos| pos + 1)
            .unwrap_or(0);
        self.attach(node, Parent::Forest, position);
    }

    pub(crate) fn drop_subtree(&mut self, node: NodeId) {
        self.detach(node);
        for id in self.descendants(node) {
            self.nodes.remove(&id);
        }
    }

    /// Remove everything below `id` from the arena, keeping `id` itself
    pub(crate) fn purge_descendants(&mut self, id: NodeId) {
        let below: Vec<NodeId> = self.descendants(id).into_iter().skip(1).collect();
        for n in below {
            self.nodes.remove(&n);
        }
        if let Some(Node {
            kind: NodeKind::Phrasal { children },
            ..
        }) = self.nodes.get_mut(&id)
        {
            children.clear();
        }
    }

    /// Write the snapshot into the arena without purging first
    pub(crate) fn overwrite_from_snapshot(&mut self, snapshot: &NodeSnapshot, parent: Option<NodeId>) {
        self.next_id = self.next_id.max(snapshot.max_id() + 1);
        self.insert_snapshot(snapshot, parent);
    }

    fn insert_snapshot(&mut self, snapshot: &NodeSnapshot, parent: Option<NodeId>) {
        let kind = match &snapshot.body {
            SnapshotBody::Terminal { token, lemma } => NodeKind::Terminal {
                token: token.clone(),
                lemma: lemma.clone(),
            },
            SnapshotBody::Phrasal(children) => NodeKind::Phrasal {
                children: children.iter().map(|c| c.id).collect(),
            },
        };
        self.nodes.insert(
            snapshot.id,
            Node {
                id: snapshot.id,
                label: snapshot.label.clone(),
                kind,
                parent,
                metadata: snapshot.metadata.clone(),
            },
        );
        if let SnapshotBody::Phrasal(children) = &snapshot.body {
            for child in children {
                self.insert_snapshot(child, Some(snapshot.id));
            }
        }
    }

    // Scope checkpoints

    /// Save the root order and copies of `scope` roots before a speculative
    /// change.
    pub fn checkpoint(&self, scope: &[NodeId]) -> Result<ScopeCheckpoint, MutationError> {
        let mut seen = HashSet::new();
        let snapshots = scope
            .iter()
            .filter(|id| seen.insert(**id))
            .map(|&id| self.clone_subtree(id))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ScopeCheckpoint {
            roots: self.roots.clone(),
            snapshots,
        })
    }

    /// Swap the checkpointed roots back in, dropping roots created since
    pub fn rollback(&mut self, checkpoint: ScopeCheckpoint) {
        let keep: HashSet<NodeId> = checkpoint.roots.iter().copied().collect();
        let created: Vec<NodeId> = self
            .roots
            .iter()
            .copied()
            .filter(|r| !keep.contains(r))
            .collect();
        for root in created {
            self.drop_subtree(root);
        }

        for snapshot in &checkpoint.snapshots {
            if self.contains(snapshot.id) {
                self.purge_descendants(snapshot.id);
            }
        }
        for snapshot in &checkpoint.snapshots {
            self.insert_snapshot(snapshot, None);
        }

        self.roots = checkpoint
            .roots
            .into_iter()
            .filter(|r| self.nodes.contains_key(r))
            .collect();
    }

    // Label and content setters used by the mutation operations

    pub(crate) fn set_label(&mut self, id: NodeId, label: impl Into<String>) -> Result<(), MutationError> {
        self.node_mut(id)?.label = label.into();
        Ok(())
    }

    pub(crate) fn set_token(&mut self, id: NodeId, new_token: impl Into<String>) -> Result<(), MutationError> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Terminal { token, .. } => {
                *token = new_token.into();
                Ok(())
            }
            NodeKind::Phrasal { .. } => Err(MutationError::NotTerminal(id)),
        }
    }

    pub(crate) fn set_lemma(&mut self, id: NodeId, new_lemma: Option<String>) -> Result<(), MutationError> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Terminal { lemma, .. } => {
                *lemma = new_lemma;
                Ok(())
            }
            NodeKind::Phrasal { .. } => Err(MutationError::NotTerminal(id)),
        }
    }

    /// Structural audit: connectivity, non-degenerate phrases and unique
    /// ids. Returns one message per violation.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let mut seen: HashSet<NodeId> = HashSet::new();

        for &root in &self.roots {
            match self.nodes.get(&root) {
                None => problems.push(format!("root {} is not in the arena", root)),
                Some(node) if node.parent.is_some() => {
                    problems.push(format!("root {} has a parent", root))
                }
                Some(_) => {}
            }
            let mut stack = vec![root];
            while let Some(id) = stack.pop() {
                if !seen.insert(id) {
                    problems.push(format!("node {} is reachable twice", id));
                    continue;
                }
                let Some(node) = self.nodes.get(&id) else {
                    problems.push(format!("child {} is not in the arena", id));
                    continue;
                };
                if node.id != id {
                    problems.push(format!("node stored under {} claims id {}", id, node.id));
                }
                if id.0 >= self.next_id {
                    problems.push(format!("node {} is ahead of the id counter", id));
                }
                if node.metadata.is_some() && node.parent.is_some() {
                    problems.push(format!("nested node {} carries metadata", id));
                }
                if let NodeKind::Phrasal { children } = &node.kind {
                    if children.is_empty() {
                        problems.push(format!("phrase {} ({}) has no children", id, node.label));
                    }
                    for &child in children {
                        if self.parent(child) != Some(id) {
                            problems.push(format!("child {} does not point back to {}", child, id));
                        }
                        stack.push(child);
                    }
                }
            }
        }

        for id in self.nodes.keys() {
            if !seen.contains(id) {
                problems.push(format!("node {} is unreachable", id));
            }
        }
        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use treebank_parser::parse;

    fn forest(source: &str) -> Forest {
        Forest::from_treebank(&parse(source).unwrap())
    }

    fn find(forest: &Forest, label: &str) -> NodeId {
        forest
            .roots()
            .iter()
            .flat_map(|&r| forest.descendants(r))
            .find(|&id| forest.label(id).unwrap() == label)
            .unwrap()
    }

    #[test]
    fn test_preorder_ids() {
        let f = forest("( (IP (NP (N cat)) (VBD sat)) (ID s1))");

        assert_eq!(f.roots(), &[NodeId(1)]);
        assert_eq!(f.children(NodeId(1)), &[NodeId(2), NodeId(4)]);
        assert_eq!(f.label(NodeId(3)).unwrap(), "N");
        assert_eq!(
            f.get(NodeId(1)).unwrap().metadata.as_ref().unwrap().get("ID").unwrap(),
            "s1"
        );
        assert!(f.validate().is_empty());
    }

    #[test]
    fn test_ast_round_trip() {
        let treebank = parse("( (IP (NP-SBJ *con*) (VBD sat)) (ID s1))\n\n(IP (N x))").unwrap();
        let f = Forest::from_treebank(&treebank);
        let back = f.to_treebank();

        assert_eq!(back.roots.len(), 2);
        assert_eq!(back.roots[0].metadata, treebank.roots[0].metadata);
        assert_eq!(back.tokens(), treebank.tokens());
    }

    #[test]
    fn test_document_order() {
        let f = forest("(IP (NP (D the) (N cat)) (VBD sat)) (IP (N dog))");
        let np = find(&f, "NP");
        let d = find(&f, "D");
        let vbd = find(&f, "VBD");
        let dog = find(&f, "N");

        assert_eq!(f.document_order(np, d), Ordering::Less);
        assert_eq!(f.document_order(vbd, d), Ordering::Greater);
        assert_eq!(f.document_order(np, np), Ordering::Equal);
        assert_eq!(f.document_order(dog, vbd), Ordering::Less);
    }

    #[test]
    fn test_create_phrasal_takes_first_slot() {
        let mut f = forest("(IP (D the) (N cat) (VBD sat))");
        let d = find(&f, "D");
        let n = find(&f, "N");

        let np = f.create_phrasal("NP", &[d, n]).unwrap();

        assert_eq!(f.children(NodeId(1)), &[np, NodeId(4)]);
        assert_eq!(f.children(np), &[d, n]);
        assert_eq!(f.parent(d), Some(np));
        assert!(f.validate().is_empty());
    }

    #[test]
    fn test_reparent_rejects_cycle() {
        let mut f = forest("(IP (NP (N cat)) (VBD sat))");
        let ip = NodeId(1);
        let np = find(&f, "NP");

        assert_eq!(
            f.reparent(ip, Parent::Node(np), 0),
            Err(MutationError::CycleDetected)
        );
        let n = find(&f, "N");
        assert_eq!(
            f.reparent(np, Parent::Node(n), 0),
            Err(MutationError::NotATarget(n))
        );
    }

    #[test]
    fn test_snapshot_restore_in_place() {
        let mut f = forest("(IP (NP (N cat)) (VBD sat))");
        let before = f.clone();
        let snapshot = f.clone_subtree(NodeId(1)).unwrap();

        let np = find(&f, "NP");
        f.set_label(np, "NP-SBJ").unwrap();
        let extra = f.create_terminal("ADV", "now", None);
        f.attach(extra, Parent::Node(NodeId(1)), 0);

        f.restore_from_snapshot(&snapshot);
        assert_eq!(f, before);
        assert!(f.validate().is_empty());
    }

    #[test]
    fn test_checkpoint_rollback_drops_new_roots() {
        let mut f = forest("(IP (NP (N cat)) (VBD sat)) (IP (N dog))");
        let before = f.clone();
        let checkpoint = f.checkpoint(&[NodeId(1)]).unwrap();

        let np = find(&f, "NP");
        f.reparent(np, Parent::Forest, 0).unwrap();
        assert_eq!(f.roots().len(), 3);

        f.rollback(checkpoint);
        assert_eq!(f, before);
    }

    #[test]
    fn test_validate_reports_empty_phrase() {
        let mut f = forest("(IP (NP (N cat)) (VBD sat))");
        let n = find(&f, "N");
        f.remove(n).unwrap();

        let problems = f.validate();
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("no children"));
    }

    #[test]
    fn test_tokens_skip_empty_categories() {
        let f = forest("(IP (NP-SBJ *pro*) (VBD sat) (NP (N mat)) (CODE {COM:x}))");
        assert_eq!(f.tokens(NodeId(1)), vec!["sat", "mat"]);
    }
}
