//! # Tree Mutations
//!
//! Every editing operation as a plain value with explicit node ids. A
//! caller resolves a user action to one of these and hands it to
//! [`EditSession::apply`](crate::EditSession::apply) or
//! [`EditSession::perform`](crate::EditSession::perform).
//!
//! ## Failure semantics
//!
//! - An illegal operation returns `Err` before anything changes and
//!   records nothing for undo.
//! - Malformed user input (a bad split string) returns
//!   [`MutationError::MalformedInput`] with a reason.
//! - A structural change that passes its guards but alters the token
//!   sequence is reverted and reported as [`MutationOutcome::RolledBack`].

use crate::config::LabelCycle;
use crate::forest::{NodeId, Parent};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    /// Move a node under a new parent (or out to the root level)
    MoveNode { moved: NodeId, target: Parent },

    /// Move a run of sisters as a unit
    MoveRange {
        first: NodeId,
        last: NodeId,
        target: Parent,
    },

    /// Wrap one node or a run of sisters in a new phrase
    WrapInPhrase {
        first: NodeId,
        #[serde(default)]
        last: Option<NodeId>,
        #[serde(default)]
        label: Option<String>,
    },

    /// Remove an empty leaf or dissolve a phrase
    Prune { node: NodeId },

    /// Split a token at the marker in `split_text`
    SplitToken { node: NodeId, split_text: String },

    Relabel { node: NodeId, label: String },

    ToggleDashTag {
        node: NodeId,
        tag: String,
        #[serde(default)]
        legal_tags: Option<Vec<String>>,
    },

    /// Coindex a pair, cycle its link types, or strip a single node's index
    Coindex {
        primary: NodeId,
        #[serde(default)]
        secondary: Option<NodeId>,
    },

    /// Insert a new leaf next to `target`; with an antecedent the leaf is a
    /// coindexed trace
    InsertLeaf {
        target: NodeId,
        side: Side,
        #[serde(default)]
        antecedent: Option<NodeId>,
        #[serde(default)]
        label: Option<String>,
        #[serde(default)]
        token: Option<String>,
        #[serde(default)]
        lemma: Option<String>,
    },

    CycleLabel { node: NodeId, labels: LabelCycle },

    ClearDashTags { node: NodeId },

    SetLemma {
        node: NodeId,
        #[serde(default)]
        lemma: Option<String>,
    },

    SetToken { node: NodeId, token: String },

    SetMetadata {
        root: NodeId,
        key: String,
        #[serde(default)]
        value: Option<String>,
    },
}

impl Mutation {
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::MoveNode { .. } => "move_node",
            Mutation::MoveRange { .. } => "move_range",
            Mutation::WrapInPhrase { .. } => "wrap_in_phrase",
            Mutation::Prune { .. } => "prune",
            Mutation::SplitToken { .. } => "split_token",
            Mutation::Relabel { .. } => "relabel",
            Mutation::ToggleDashTag { .. } => "toggle_dash_tag",
            Mutation::Coindex { .. } => "coindex",
            Mutation::InsertLeaf { .. } => "insert_leaf",
            Mutation::CycleLabel { .. } => "cycle_label",
            Mutation::ClearDashTags { .. } => "clear_dash_tags",
            Mutation::SetLemma { .. } => "set_lemma",
            Mutation::SetToken { .. } => "set_token",
            Mutation::SetMetadata { .. } => "set_metadata",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Before,
    After,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationOutcome {
    Applied,
    /// The change broke token order and was reverted
    RolledBack,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MutationError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Node {0} cannot receive moved material")]
    NotATarget(NodeId),

    #[error("Node {0} is the only child of its parent")]
    OnlyChild(NodeId),

    #[error("Would create cycle")]
    CycleDetected,

    #[error("Node {0} is not on the outer edge below its new parent")]
    NotFromEdge(NodeId),

    #[error("Nodes {0} and {1} are not sisters")]
    NotSisters(NodeId, NodeId),

    #[error("Node {0} is not a terminal")]
    NotTerminal(NodeId),

    #[error("Node {0} is not a phrase")]
    NotPhrasal(NodeId),

    #[error("Node {0} is not a root-level tree")]
    NotRoot(NodeId),

    #[error("Node {0} is a root-level tree")]
    RootLevel(NodeId),

    #[error("Node {0} dominates overt text")]
    DominatesText(NodeId),

    #[error("Dissolving root {0} would drop its metadata")]
    WouldDropMetadata(NodeId),

    #[error("Nodes {0} and {1} are in different root trees")]
    DifferentRoots(NodeId, NodeId),

    #[error("Nodes {0} and {1} carry different indices")]
    IndexMismatch(NodeId, NodeId),

    #[error("Node {0} has no index")]
    NotIndexed(NodeId),

    #[error("No coindex left above the highest one in the tree of node {0}")]
    IndexOverflow(NodeId),

    #[error("Root trees {0} and {1} use the same coindex")]
    IndexClash(NodeId, NodeId),

    #[error("Illegal label: {0}")]
    IllegalLabel(String),

    #[error("Dash tag {tag} is not legal on node {node}")]
    IllegalDashTag { node: NodeId, tag: String },

    #[error("Token of node {0} is not an empty category")]
    NotEmptyCategory(NodeId),

    #[error("Malformed input: {0}")]
    MalformedInput(String),
}

impl MutationError {
    /// Errors caused by bad user-entered text rather than an illegal tree
    /// operation
    pub fn is_user_input_error(&self) -> bool {
        matches!(self, MutationError::MalformedInput(_))
    }
}
