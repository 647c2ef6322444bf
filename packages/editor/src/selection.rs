//! # Selection
//!
//! The annotator's current pick: a primary node and an optional secondary
//! node. A secondary is only ever set alongside a primary.

use crate::forest::NodeId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    primary: Option<NodeId>,
    secondary: Option<NodeId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn primary(&self) -> Option<NodeId> {
        self.primary
    }

    pub fn secondary(&self) -> Option<NodeId> {
        self.secondary
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_none()
    }

    /// Click semantics:
    /// - nothing selected: `node` becomes primary
    /// - clicking the primary deselects it and promotes the secondary
    /// - clicking the secondary deselects it
    /// - clicking anything else makes it the secondary
    pub fn select(&mut self, node: NodeId) {
        match (self.primary, self.secondary) {
            (None, _) => {
                self.primary = Some(node);
                self.secondary = None;
            }
            (Some(p), secondary) if p == node => {
                self.primary = secondary;
                self.secondary = None;
            }
            (Some(_), Some(s)) if s == node => self.secondary = None,
            (Some(_), _) => self.secondary = Some(node),
        }
    }

    /// Make `node` the only selected node
    pub fn select_only(&mut self, node: NodeId) {
        self.primary = Some(node);
        self.secondary = None;
    }

    /// Select a pair at once; `secondary` equal to `primary` is ignored
    pub fn select_pair(&mut self, primary: NodeId, secondary: NodeId) {
        self.primary = Some(primary);
        self.secondary = (secondary != primary).then_some(secondary);
    }

    pub fn clear(&mut self) {
        self.primary = None;
        self.secondary = None;
    }
}
