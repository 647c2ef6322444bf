//! # Edit Session
//!
//! One annotator's editing context: the forest, the selection, the undo
//! history and the corpus configuration. Every operation runs against an
//! explicit session value; there is no ambient state.
//!
//! Operations run speculatively. The roots an operation may change are
//! checkpointed and a transaction is opened on the history. A rejected
//! operation, or a structural one that changes the order of overt tokens,
//! is rolled back from the checkpoint and the transaction is aborted.

use crate::checks::token_sequence;
use crate::config::{EditorConfig, LabelOracle};
use crate::errors::EditorError;
use crate::forest::{Forest, NodeId};
use crate::mutations::{Mutation, MutationError, MutationOutcome};
use crate::selection::Selection;
use crate::undo_stack::UndoStack;
use std::ops::Range;
use tracing::{debug, instrument, warn};
use treebank_parser::{parse_with_options, ParseOptions};

#[derive(Debug)]
pub struct EditSession {
    pub(crate) forest: Forest,
    pub(crate) selection: Selection,
    pub(crate) history: UndoStack,
    pub(crate) config: EditorConfig,
    pub(crate) oracle: Box<dyn LabelOracle>,
}

impl EditSession {
    pub fn new(forest: Forest, config: EditorConfig) -> Self {
        let oracle = config.oracle();
        Self {
            forest,
            selection: Selection::new(),
            history: UndoStack::new(),
            config,
            oracle,
        }
    }

    pub fn from_source(source: &str, config: EditorConfig) -> Result<Self, EditorError> {
        Self::from_source_with_options(source, ParseOptions::default(), config)
    }

    pub fn from_source_with_options(
        source: &str,
        options: ParseOptions,
        config: EditorConfig,
    ) -> Result<Self, EditorError> {
        let treebank = parse_with_options(source, options)?;
        Ok(Self::new(Forest::from_treebank(&treebank), config))
    }

    /// Replace the label oracle built from the configuration
    pub fn with_oracle(mut self, oracle: Box<dyn LabelOracle>) -> Self {
        self.oracle = oracle;
        self
    }

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn history(&self) -> &UndoStack {
        &self.history
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Start over with a new forest; history and selection are dropped
    pub fn reset(&mut self, forest: Forest) {
        self.forest = forest;
        self.selection.clear();
        self.history.clear();
    }

    pub fn select(&mut self, node: NodeId) -> Result<(), MutationError> {
        self.forest.node(node)?;
        self.selection.select(node);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Run one mutation without closing the undo step
    #[instrument(skip(self), fields(op = mutation.name()))]
    pub fn apply(&mut self, mutation: &Mutation) -> Result<MutationOutcome, MutationError> {
        let result = match mutation {
            Mutation::MoveNode { moved, target } => self.move_node(*moved, *target),
            Mutation::MoveRange {
                first,
                last,
                target,
            } => self.move_range(*first, *last, *target),
            Mutation::WrapInPhrase { first, last, label } => {
                self.wrap_in_phrase(*first, *last, label.as_deref())
            }
            Mutation::Prune { node } => self.prune(*node),
            Mutation::SplitToken { node, split_text } => self.split_token(*node, split_text),
            Mutation::Relabel { node, label } => self.relabel(*node, label),
            Mutation::ToggleDashTag {
                node,
                tag,
                legal_tags,
            } => self.toggle_dash_tag(*node, tag, legal_tags.as_deref()),
            Mutation::Coindex { primary, secondary } => self.coindex(*primary, *secondary),
            Mutation::InsertLeaf {
                target,
                side,
                antecedent,
                label,
                token,
                lemma,
            } => self.insert_leaf(
                *target,
                *side,
                *antecedent,
                label.as_deref(),
                token.as_deref(),
                lemma.as_deref(),
            ),
            Mutation::CycleLabel { node, labels } => self.cycle_label(*node, labels),
            Mutation::ClearDashTags { node } => self.clear_dash_tags(*node),
            Mutation::SetLemma { node, lemma } => self.set_lemma(*node, lemma.as_deref()),
            Mutation::SetToken { node, token } => self.set_token(*node, token),
            Mutation::SetMetadata { root, key, value } => {
                self.set_metadata(*root, key, value.as_deref())
            }
        };

        match &result {
            Ok(outcome) => debug!(?outcome, "mutation finished"),
            Err(e) => debug!(error = %e, "mutation rejected"),
        }
        result
    }

    /// Run one mutation as a complete user action
    pub fn perform(&mut self, mutation: &Mutation) -> Result<MutationOutcome, MutationError> {
        let outcome = self.apply(mutation)?;
        self.history.close_barrier();
        Ok(outcome)
    }

    /// Close the current undo step
    pub fn close_barrier(&mut self) -> bool {
        self.history.close_barrier()
    }

    #[instrument(skip(self))]
    pub fn undo(&mut self) -> Result<bool, MutationError> {
        self.selection.clear();
        self.history.undo(&mut self.forest)
    }

    #[instrument(skip(self))]
    pub fn redo(&mut self) -> Result<bool, MutationError> {
        self.selection.clear();
        self.history.redo(&mut self.forest)
    }

    /// Roots of the given nodes, for scoping a speculative run
    pub(crate) fn roots_of(&self, nodes: &[NodeId]) -> Result<Vec<NodeId>, MutationError> {
        let mut roots = Vec::with_capacity(nodes.len());
        for &node in nodes {
            let root = self.forest.root_of(node)?;
            if !roots.contains(&root) {
                roots.push(root);
            }
        }
        Ok(roots)
    }

    /// Run `op` against a checkpoint of the `scope` roots.
    ///
    /// With `keep_tokens` set, the overt tokens over the scope must be the
    /// same afterwards, otherwise the change is reverted and reported as
    /// [`MutationOutcome::RolledBack`].
    pub(crate) fn speculate<F>(
        &mut self,
        scope: &[NodeId],
        keep_tokens: bool,
        op: F,
    ) -> Result<MutationOutcome, MutationError>
    where
        F: FnOnce(&mut Self) -> Result<(), MutationError>,
    {
        let checkpoint = self.forest.checkpoint(scope)?;
        let selection = self.selection;

        let positions: Vec<usize> = scope
            .iter()
            .filter_map(|&r| self.forest.index_in_forest(r))
            .collect();
        let (Some(&lo), Some(&hi)) = (positions.iter().min(), positions.iter().max()) else {
            return Err(MutationError::MalformedInput(
                "operation touches no root tree".to_string(),
            ));
        };
        let before_roots = checkpoint.roots().to_vec();
        let tokens_before = keep_tokens.then(|| token_sequence(&self.forest, &before_roots[lo..=hi]));

        self.history.begin_transaction();
        if let Err(e) = op(self) {
            self.forest.rollback(checkpoint);
            self.history.abort_transaction();
            self.selection = selection;
            return Err(e);
        }

        if let Some(tokens_before) = tokens_before {
            let window = scope_window(before_roots.len(), self.forest.roots().len(), lo, hi);
            let tokens_after = window.map(|w| token_sequence(&self.forest, &self.forest.roots()[w]));
            if tokens_after.as_ref() != Some(&tokens_before) {
                warn!(
                    before = ?tokens_before,
                    after = ?tokens_after,
                    "token order changed, rolling back"
                );
                self.forest.rollback(checkpoint);
                self.history.abort_transaction();
                self.selection = selection;
                return Ok(MutationOutcome::RolledBack);
            }
        }

        self.history.commit_transaction();
        Ok(MutationOutcome::Applied)
    }
}

/// Where the old `lo..=hi` roots ended up. Roots outside the scope never
/// move, so the window is what lies between the unchanged prefix and
/// suffix.
fn scope_window(old_len: usize, new_len: usize, lo: usize, hi: usize) -> Option<Range<usize>> {
    let suffix = old_len.checked_sub(hi + 1)?;
    let end = new_len.checked_sub(suffix)?;
    (lo <= end).then_some(lo..end)
}
