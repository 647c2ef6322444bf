//! # Undo/Redo Stack
//!
//! Records per-action deltas instead of whole-document copies.
//!
//! ## Design
//!
//! - Before a root tree is first modified in an action, `touch` stores a
//!   snapshot of it. Later touches of the same root are no-ops.
//! - Root trees added or removed at the forest level are listed as
//!   `created` / `removed`, the latter with the id of the preceding root so
//!   the tree can go back where it was.
//! - `close_barrier` turns the in-progress delta into one undo step.
//! - Undo and redo share one algorithm: applying a delta returns its
//!   inverse, which is pushed onto the opposite stack.
//! - Transactions checkpoint the in-progress delta so a failed speculative
//!   step can discard what it recorded.
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut stack = UndoStack::new();
//!
//! stack.touch(&forest, leaf)?;
//! forest.set_label(leaf, "NP-SBJ")?;
//! stack.close_barrier();
//!
//! stack.undo(&mut forest)?;
//! stack.redo(&mut forest)?;
//! ```

use crate::forest::{Forest, NodeId, NodeSnapshot};
use crate::mutations::MutationError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

/// A root tree taken out of the forest, with the root it followed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovedRoot {
    pub snapshot: NodeSnapshot,
    pub preceding: Option<NodeId>,
}

/// Everything needed to reverse one editing step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoDelta {
    /// Root id to its state before the step
    pub touched: BTreeMap<NodeId, NodeSnapshot>,

    /// Roots added to the forest by the step
    pub created: Vec<NodeId>,

    /// Roots taken out of the forest by the step, in removal order
    pub removed: Vec<RemovedRoot>,
}

impl UndoDelta {
    pub fn is_empty(&self) -> bool {
        self.touched.is_empty() && self.created.is_empty() && self.removed.is_empty()
    }

    fn mentions(&self, root: NodeId) -> bool {
        self.touched.contains_key(&root)
            || self.created.contains(&root)
            || self.removed.iter().any(|r| r.snapshot.id == root)
    }
}

/// Apply `delta` to the forest and return the delta that reverses it.
///
/// Every copy needed for the inverse is taken before anything changes.
/// Created roots are deleted first so that their ids are free when
/// touched and removed trees come back.
pub fn invert_and_apply(forest: &mut Forest, delta: &UndoDelta) -> UndoDelta {
    let mut inverse = UndoDelta::default();
    let created: HashSet<NodeId> = delta.created.iter().copied().collect();

    for &id in delta.touched.keys() {
        match forest.clone_subtree(id) {
            Ok(current) => {
                inverse.touched.insert(id, current);
            }
            Err(_) => warn!(root = %id, "touched root missing while inverting delta"),
        }
    }

    // Removed roots may have been recorded after a created root; resolve
    // those anchors past the created roots before deleting them
    let anchors: Vec<Option<NodeId>> = delta
        .removed
        .iter()
        .map(|r| {
            let mut anchor = r.preceding;
            while let Some(a) = anchor {
                if !created.contains(&a) {
                    break;
                }
                anchor = forest.preceding_root(a);
            }
            anchor
        })
        .collect();

    let mut doomed: Vec<NodeId> = delta
        .created
        .iter()
        .copied()
        .filter(|&id| forest.contains(id))
        .collect();
    doomed.sort_by_key(|&id| forest.index_in_forest(id).unwrap_or(usize::MAX));
    // Doomed roots anchored on each other go back in order on reapply
    for &id in &doomed {
        match forest.clone_subtree(id) {
            Ok(snapshot) => inverse.removed.push(RemovedRoot {
                snapshot,
                preceding: forest.preceding_root(id),
            }),
            Err(_) => warn!(root = %id, "created root missing while inverting delta"),
        }
    }
    for &id in &doomed {
        let _ = forest.remove(id);
    }

    // Two phases so a node moved between touched roots is never purged
    // after it has been restored
    for &id in delta.touched.keys() {
        if forest.contains(id) {
            forest.purge_descendants(id);
        }
    }
    for (&id, snapshot) in &delta.touched {
        if forest.contains(id) {
            let parent = forest.parent(id);
            forest.overwrite_from_snapshot(snapshot, parent);
        } else {
            warn!(root = %id, "restoring touched root that no longer exists");
            forest.overwrite_from_snapshot(snapshot, None);
            forest.insert_root_after(id, None);
        }
    }

    // Reinsert removed roots; one may follow another removed root, so keep
    // placing until nothing changes
    let mut pending: Vec<(usize, &RemovedRoot)> = delta.removed.iter().enumerate().collect();
    loop {
        let before = pending.len();
        pending.retain(|&(i, record)| {
            let anchor = anchors[i];
            let ready = match anchor {
                None => true,
                Some(a) => forest.index_in_forest(a).is_some(),
            };
            if ready {
                if forest.contains(record.snapshot.id) {
                    let _ = forest.remove(record.snapshot.id);
                }
                forest.overwrite_from_snapshot(&record.snapshot, None);
                forest.insert_root_after(record.snapshot.id, anchor);
                inverse.created.push(record.snapshot.id);
            }
            !ready
        });
        if pending.is_empty() || pending.len() == before {
            break;
        }
    }
    for (_, record) in pending {
        warn!(root = %record.snapshot.id, "anchor for removed root is gone, inserting at head");
        forest.overwrite_from_snapshot(&record.snapshot, None);
        forest.insert_root_after(record.snapshot.id, None);
        inverse.created.push(record.snapshot.id);
    }

    inverse
}

/// Undo/redo history plus the delta of the action in progress
#[derive(Debug, Default)]
pub struct UndoStack {
    /// Applied steps (most recent last)
    undo_stack: Vec<UndoDelta>,

    /// Undone steps (most recent last)
    redo_stack: Vec<UndoDelta>,

    /// Changes recorded since the last barrier
    current: UndoDelta,

    /// Checkpoints of `current`, one per open transaction
    transactions: Vec<UndoDelta>,
}

impl UndoStack {
    /// Create an empty history. Every closed step is kept until `clear`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the root tree containing `node` unless this step already
    /// has a baseline for it
    pub fn touch(&mut self, forest: &Forest, node: NodeId) -> Result<(), MutationError> {
        let root = forest.root_of(node)?;
        if self.current.mentions(root) {
            return Ok(());
        }
        let snapshot = forest.clone_subtree(root)?;
        debug!(root = %root, nodes = snapshot.node_count(), "touched root");
        self.current.touched.insert(root, snapshot);
        Ok(())
    }

    /// Record a tree that was just added at the root level
    pub fn register_created_root(&mut self, root: NodeId) {
        if !self.current.created.contains(&root) {
            self.current.created.push(root);
        }
    }

    /// Record a root tree that is about to leave the root level. Call this
    /// while the tree is still in the forest.
    pub fn register_removed_root(&mut self, forest: &Forest, root: NodeId) -> Result<(), MutationError> {
        if !forest.is_root_level(root) {
            return Err(MutationError::NotRoot(root));
        }

        // Created and removed within one step: nothing to restore
        if let Some(pos) = self.current.created.iter().position(|&r| r == root) {
            self.current.created.remove(pos);
            return Ok(());
        }
        if self.current.removed.iter().any(|r| r.snapshot.id == root) {
            return Ok(());
        }

        // A baseline taken earlier in the step is the state to restore
        let snapshot = match self.current.touched.remove(&root) {
            Some(baseline) => baseline,
            None => forest.clone_subtree(root)?,
        };
        debug!(root = %root, "registered removed root");
        self.current.removed.push(RemovedRoot {
            snapshot,
            preceding: forest.preceding_root(root),
        });
        Ok(())
    }

    pub fn begin_transaction(&mut self) {
        self.transactions.push(self.current.clone());
    }

    /// Keep what the innermost transaction recorded
    pub fn commit_transaction(&mut self) {
        self.transactions.pop();
    }

    /// Discard what the innermost transaction recorded. The forest itself
    /// is not touched; callers revert their own changes.
    pub fn abort_transaction(&mut self) {
        if let Some(saved) = self.transactions.pop() {
            self.current = saved;
        }
    }

    pub fn in_transaction(&self) -> bool {
        !self.transactions.is_empty()
    }

    /// Close the current step. Returns whether an undo entry was pushed.
    pub fn close_barrier(&mut self) -> bool {
        if self.current.is_empty() {
            return false;
        }
        let delta = std::mem::take(&mut self.current);
        self.undo_stack.push(delta);

        // New forward edits invalidate the redo history
        self.redo_stack.clear();
        true
    }

    /// Undo the most recent step
    pub fn undo(&mut self, forest: &mut Forest) -> Result<bool, MutationError> {
        self.seal_pending();
        if let Some(delta) = self.undo_stack.pop() {
            let inverse = invert_and_apply(forest, &delta);
            self.redo_stack.push(inverse);
            Ok(true)
        } else {
            Ok(false) // Nothing to undo
        }
    }

    /// Redo the most recently undone step
    pub fn redo(&mut self, forest: &mut Forest) -> Result<bool, MutationError> {
        self.seal_pending();
        if let Some(delta) = self.redo_stack.pop() {
            let inverse = invert_and_apply(forest, &delta);
            self.undo_stack.push(inverse);
            Ok(true)
        } else {
            Ok(false) // Nothing to redo
        }
    }

    /// Changes recorded without a closing barrier become their own step
    /// so undo never skips them
    fn seal_pending(&mut self) {
        if !self.current.is_empty() {
            warn!("undo requested with an open step; closing it first");
            let delta = std::mem::take(&mut self.current);
            self.undo_stack.push(delta);
        }
        self.transactions.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    /// The step being recorded
    pub fn pending(&self) -> &UndoDelta {
        &self.current
    }

    /// Clear all undo/redo history and the step in progress
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.current = UndoDelta::default();
        self.transactions.clear();
    }
}
