//! # Mutation Operations
//!
//! The editing operations on [`EditSession`]. Each one resolves the roots
//! it may change, checks its guards and then mutates inside
//! [`EditSession::speculate`]. Every root is touched (or registered as
//! created/removed) before its first change so undo has a baseline.

use crate::checks::{
    can_be_move_target, fresh_index, index_carrier, index_of, is_descendant_of, max_index,
    share_an_index, sister_run, would_orphan_parent, IndexCarrier,
};
use crate::config::LabelCycle;
use crate::forest::{NodeId, Parent};
use crate::label::{split_coindex, Coindex, CoindexKind, Label};
use crate::mutations::{MutationError, MutationOutcome, Side};
use crate::session::EditSession;
use std::cmp::Ordering;
use tracing::{debug, info};
use treebank_parser::is_empty_category;

/// Tokens, labels and metadata values become bare atoms in bracketed text
fn check_atom(text: &str, what: &str) -> Result<(), MutationError> {
    if text.is_empty() {
        return Err(MutationError::MalformedInput(format!("{} is empty", what)));
    }
    if text.chars().any(|c| c.is_whitespace() || c == '(' || c == ')') {
        return Err(MutationError::MalformedInput(format!(
            "{} '{}' contains whitespace or parentheses",
            what, text
        )));
    }
    Ok(())
}

fn as_parent(parent: Option<NodeId>) -> Parent {
    match parent {
        Some(p) => Parent::Node(p),
        None => Parent::Forest,
    }
}

impl EditSession {
    // Structural operations

    /// Move `moved` under `target`: up to an ancestor from an edge position,
    /// next to its new sisters by document order, or as a token merge when
    /// `moved` is a whole root tree. The selection is cleared whether or
    /// not the move goes through.
    pub fn move_node(&mut self, moved: NodeId, target: Parent) -> Result<MutationOutcome, MutationError> {
        let result = self.try_move_node(moved, target);
        self.selection.clear();
        result
    }

    fn try_move_node(&mut self, moved: NodeId, target: Parent) -> Result<MutationOutcome, MutationError> {
        let mut involved = vec![moved];
        if let Parent::Node(t) = target {
            involved.push(t);
        }
        let scope = self.roots_of(&involved)?;
        self.speculate(&scope, true, |s| s.move_node_inner(moved, target))
    }

    fn move_node_inner(&mut self, moved: NodeId, target: Parent) -> Result<(), MutationError> {
        self.forest.node(moved)?;
        if let Parent::Node(t) = target {
            self.forest.node(t)?;
            if !can_be_move_target(&self.forest, &self.config, t) {
                return Err(MutationError::NotATarget(t));
            }
        }
        if target == Parent::Forest && self.forest.is_root_level(moved) {
            return Err(MutationError::RootLevel(moved));
        }
        if would_orphan_parent(&self.forest, moved) {
            return Err(MutationError::OnlyChild(moved));
        }

        match target {
            Parent::Forest => {
                let slot = self.edge_slot(moved, Parent::Forest)?;
                self.history.touch(&self.forest, moved)?;
                self.forest.reparent(moved, Parent::Forest, slot)?;
                self.history.register_created_root(moved);
                debug!(node = %moved, "split out as a new root tree");
                Ok(())
            }
            Parent::Node(t) if t == moved || is_descendant_of(&self.forest, t, moved) => {
                Err(MutationError::CycleDetected)
            }
            Parent::Node(t) if self.forest.parent(moved) == Some(t) => {
                Err(MutationError::NotATarget(t))
            }
            Parent::Node(t) if is_descendant_of(&self.forest, moved, t) => {
                let slot = self.edge_slot(moved, target)?;
                self.history.touch(&self.forest, moved)?;
                self.forest.reparent(moved, target, slot)
            }
            Parent::Node(t) => {
                let append = self.forest.document_order(t, moved) == Ordering::Less;
                let position = if append { usize::MAX } else { 0 };

                if self.forest.is_root_level(moved) {
                    let receiver = self.forest.root_of(t)?;
                    let offset = max_index(&self.forest, receiver);
                    self.history.register_removed_root(&self.forest, moved)?;
                    self.history.touch(&self.forest, t)?;
                    self.shift_indices(moved, offset)?;
                    if self.forest.node_mut(moved)?.metadata.take().is_some() {
                        info!(root = %moved, "merged root tree loses its metadata");
                    }
                    debug!(donor = %moved, receiver = %receiver, offset, "merging root trees");
                } else {
                    let donor = self.forest.root_of(moved)?;
                    let receiver = self.forest.root_of(t)?;
                    self.history.touch(&self.forest, moved)?;
                    self.history.touch(&self.forest, t)?;
                    if donor != receiver {
                        let offset = max_index(&self.forest, receiver);
                        self.shift_indices(moved, offset)?;
                        debug!(node = %moved, %receiver, offset, "moved across root trees");
                    }
                }
                self.forest.reparent(moved, target, position)
            }
        }
    }

    /// Position in `ancestor`'s child list (or the root list) where `moved`
    /// lands when it is lifted out along the leading or trailing edge.
    fn edge_slot(&self, moved: NodeId, ancestor: Parent) -> Result<usize, MutationError> {
        let path = self.forest.path(moved);
        let start = match ancestor {
            Parent::Forest => 0,
            Parent::Node(a) => path
                .iter()
                .position(|&n| n == a)
                .map(|p| p + 1)
                .ok_or(MutationError::NotATarget(a))?,
        };
        let Some(&anchor) = path.get(start) else {
            return Err(MutationError::NotFromEdge(moved));
        };
        let below = &path[start + 1..];
        if below.is_empty() {
            return Err(MutationError::NotFromEdge(moved));
        }

        let leading = below
            .iter()
            .all(|&n| self.forest.position_in_parent(n) == Some(0));
        let trailing = below.iter().all(|&n| {
            self.forest.position_in_parent(n) == Some(self.forest.siblings(n).len() - 1)
        });
        let anchor_pos = self
            .forest
            .position_in_parent(anchor)
            .ok_or(MutationError::NodeNotFound(anchor))?;

        if leading {
            Ok(anchor_pos)
        } else if trailing {
            Ok(anchor_pos + 1)
        } else {
            Err(MutationError::NotFromEdge(moved))
        }
    }

    /// Add `offset` to every coindex in the subtree, labels and empty
    /// category tokens alike. Fails before writing anything when the
    /// highest index would overflow.
    fn shift_indices(&mut self, root: NodeId, offset: u32) -> Result<(), MutationError> {
        if offset == 0 {
            return Ok(());
        }
        if max_index(&self.forest, root).checked_add(offset).is_none() {
            return Err(MutationError::IndexOverflow(root));
        }
        for id in self.forest.descendants(root) {
            let node = self.forest.node(id)?;
            let mut label = Label::parse(&node.label);
            let token = node.token().map(str::to_string);

            if let Some(c) = label.coindex.as_mut() {
                c.index = c
                    .index
                    .checked_add(offset)
                    .ok_or(MutationError::IndexOverflow(root))?;
                self.forest.set_label(id, label.to_string())?;
            }
            if let Some(token) = token.filter(|t| is_empty_category(t)) {
                if let (base, Some(c)) = split_coindex(&token) {
                    let index = c
                        .index
                        .checked_add(offset)
                        .ok_or(MutationError::IndexOverflow(root))?;
                    let shifted = Coindex::new(index, c.kind);
                    self.forest.set_token(id, format!("{}{}", base, shifted))?;
                }
            }
        }
        Ok(())
    }

    /// Move a run of sisters as a unit. The run is wrapped in a scratch
    /// phrase, moved and then unwrapped again. Clears the selection like
    /// `move_node`.
    pub fn move_range(
        &mut self,
        first: NodeId,
        last: NodeId,
        target: Parent,
    ) -> Result<MutationOutcome, MutationError> {
        let result = self.try_move_range(first, last, target);
        self.selection.clear();
        result
    }

    fn try_move_range(
        &mut self,
        first: NodeId,
        last: NodeId,
        target: Parent,
    ) -> Result<MutationOutcome, MutationError> {
        let run = sister_run(&self.forest, first, last)?;
        if run.len() == 1 {
            return self.try_move_node(first, target);
        }

        let mut involved = run.clone();
        if let Parent::Node(t) = target {
            involved.push(t);
        }
        let scope = self.roots_of(&involved)?;

        self.speculate(&scope, true, |s| {
            if let Parent::Node(t) = target {
                s.forest.node(t)?;
                if !can_be_move_target(&s.forest, &s.config, t) {
                    return Err(MutationError::NotATarget(t));
                }
            }
            if s.forest.siblings(run[0]).len() == run.len() {
                return Err(MutationError::OnlyChild(run[0]));
            }

            let root_level = s.forest.is_root_level(run[0]);
            if root_level {
                if target == Parent::Forest {
                    return Err(MutationError::RootLevel(run[0]));
                }
                for &root in &run {
                    s.history.register_removed_root(&s.forest, root)?;
                }
                // Donors become part of another tree. Their indices are
                // spread apart here; the merge lifts them above the receiver's.
                let mut offset = 0;
                for &root in &run {
                    s.forest.node_mut(root)?.metadata = None;
                    s.shift_indices(root, offset)?;
                    offset = offset.max(max_index(&s.forest, root));
                }
            } else {
                s.history.touch(&s.forest, run[0])?;
            }

            let label = s.config.default_phrase_label.clone();
            let scratch = s.forest.create_phrasal(label, &run)?;
            if root_level {
                s.history.register_created_root(scratch);
            }

            s.move_node_inner(scratch, target)?;
            s.dissolve(scratch)?;
            Ok(())
        })
    }

    /// Put `node`'s children where it stands and drop it. Returns the
    /// promoted children.
    fn dissolve(&mut self, node: NodeId) -> Result<Vec<NodeId>, MutationError> {
        let children = self.forest.children(node).to_vec();
        let parent = self.forest.parent(node);
        let position = self
            .forest
            .position_in_parent(node)
            .ok_or(MutationError::NodeNotFound(node))?;

        if parent.is_none() {
            self.history.register_removed_root(&self.forest, node)?;
        }
        for (offset, &child) in children.iter().enumerate() {
            self.forest.reparent(child, as_parent(parent), position + offset)?;
            if parent.is_none() {
                self.history.register_created_root(child);
            }
        }
        self.forest.remove(node)?;
        Ok(children)
    }

    /// Wrap `first` (or the sisters from `first` to `last`) in a new phrase
    pub fn wrap_in_phrase(
        &mut self,
        first: NodeId,
        last: Option<NodeId>,
        label: Option<&str>,
    ) -> Result<MutationOutcome, MutationError> {
        let label = label
            .unwrap_or(self.config.default_phrase_label.as_str())
            .to_string();
        check_atom(&label, "label")?;
        if !self.oracle.is_legal_phrasal_label(&label) {
            return Err(MutationError::IllegalLabel(label));
        }

        let run = sister_run(&self.forest, first, last.unwrap_or(first))?;
        let scope = self.roots_of(&run)?;
        let mut wrapper = None;

        let outcome = self.speculate(&scope, true, |s| {
            let root_level = s.forest.is_root_level(run[0]);
            if root_level {
                let carriers: Vec<NodeId> = run
                    .iter()
                    .copied()
                    .filter(|&r| s.forest.get(r).map_or(false, |n| n.metadata.is_some()))
                    .collect();
                // Only the leading tree's metadata can travel to the wrapper
                if let Some(&stray) = carriers.iter().find(|&&r| r != run[0]) {
                    return Err(MutationError::WouldDropMetadata(stray));
                }
                for (i, &a) in run.iter().enumerate() {
                    if let Some(&b) = run[i + 1..].iter().find(|&&b| share_an_index(&s.forest, a, b)) {
                        return Err(MutationError::IndexClash(a, b));
                    }
                }
                for &root in &run {
                    s.history.register_removed_root(&s.forest, root)?;
                }

                let id = s.forest.create_phrasal(label, &run)?;
                if let Some(&carrier) = carriers.first() {
                    let metadata = s.forest.node_mut(carrier)?.metadata.take();
                    s.forest.node_mut(id)?.metadata = metadata;
                }
                s.history.register_created_root(id);
                wrapper = Some(id);
            } else {
                s.history.touch(&s.forest, run[0])?;
                wrapper = Some(s.forest.create_phrasal(label, &run)?);
            }
            Ok(())
        })?;

        if let (MutationOutcome::Applied, Some(id)) = (outcome, wrapper) {
            self.selection.select_only(id);
        }
        Ok(outcome)
    }

    /// Remove an empty-category leaf, or dissolve a phrase into its slot
    pub fn prune(&mut self, node: NodeId) -> Result<MutationOutcome, MutationError> {
        let scope = self.roots_of(&[node])?;
        let n = self.forest.node(node)?;

        if let Some(token) = n.token() {
            if !is_empty_category(token) {
                return Err(MutationError::DominatesText(node));
            }
            if would_orphan_parent(&self.forest, node) {
                return Err(MutationError::OnlyChild(node));
            }

            let outcome = self.speculate(&scope, false, |s| {
                if s.forest.is_root_level(node) {
                    s.history.register_removed_root(&s.forest, node)?;
                } else {
                    s.history.touch(&s.forest, node)?;
                }
                s.forest.remove(node)
            })?;
            self.selection.clear();
            return Ok(outcome);
        }

        if !can_be_move_target(&self.forest, &self.config, node) {
            return Err(MutationError::NotATarget(node));
        }

        let mut promoted = Vec::new();
        let outcome = self.speculate(&scope, true, |s| {
            // A dissolved root hands its metadata to its first tree
            let metadata = if s.forest.is_root_level(node) {
                s.forest.node(node)?.metadata.clone()
            } else {
                s.history.touch(&s.forest, node)?;
                None
            };
            promoted = s.dissolve(node)?;
            if let (Some(metadata), Some(&first)) = (metadata, promoted.first()) {
                s.forest.node_mut(first)?.metadata = Some(metadata);
            }
            Ok(())
        })?;

        match (outcome, promoted.first()) {
            (MutationOutcome::Applied, Some(&child)) => self.selection.select_only(child),
            _ => self.selection.clear(),
        }
        Ok(outcome)
    }

    // Token operations

    /// Split a token at the marker in `split_text` into two sister leaves
    pub fn split_token(&mut self, node: NodeId, split_text: &str) -> Result<MutationOutcome, MutationError> {
        let n = self.forest.node(node)?;
        let Some(token) = n.token() else {
            return Err(MutationError::NotTerminal(node));
        };
        if n.parent.is_none() {
            return Err(MutationError::RootLevel(node));
        }

        let marker = self.config.split_marker.as_str();
        let pieces: Vec<&str> = split_text.split(marker).collect();
        let [left, right] = pieces.as_slice() else {
            return Err(MutationError::MalformedInput(format!(
                "'{}' must contain exactly one '{}'",
                split_text, marker
            )));
        };
        if left.is_empty() || right.is_empty() {
            return Err(MutationError::MalformedInput(format!(
                "'{}' splits off an empty piece",
                split_text
            )));
        }
        if format!("{}{}", left, right) != token {
            return Err(MutationError::MalformedInput(format!(
                "'{}' does not spell the token '{}'",
                split_text, token
            )));
        }

        let (left_label, right_label) = match n.label.split_once('+') {
            Some((l, r)) if !l.is_empty() && !r.is_empty() => {
                for part in [l, r] {
                    if !self.oracle.is_legal_terminal_label(part) {
                        return Err(MutationError::IllegalLabel(part.to_string()));
                    }
                }
                (l.to_string(), r.to_string())
            }
            _ => (n.label.clone(), self.config.default_split_label.clone()),
        };
        let left_token = format!("{}{}", left, marker);
        let right_token = format!("{}{}", marker, right);
        let lemma = n.lemma().map(str::to_string);
        let scope = self.roots_of(&[node])?;

        let outcome = self.speculate(&scope, false, |s| {
            s.history.touch(&s.forest, node)?;
            s.forest.set_label(node, left_label)?;
            s.forest.set_token(node, left_token)?;

            let parent = s.forest.parent(node);
            let position = s
                .forest
                .position_in_parent(node)
                .ok_or(MutationError::NodeNotFound(node))?;
            let sister = s.forest.create_terminal(right_label, right_token, lemma);
            s.forest.reparent(sister, as_parent(parent), position + 1)
        })?;
        self.selection.clear();
        Ok(outcome)
    }

    /// New leaf beside `target`. With an antecedent the leaf is a trace
    /// coindexed with it.
    pub fn insert_leaf(
        &mut self,
        target: NodeId,
        side: Side,
        antecedent: Option<NodeId>,
        label: Option<&str>,
        token: Option<&str>,
        lemma: Option<&str>,
    ) -> Result<MutationOutcome, MutationError> {
        if self.forest.is_root_level(target) {
            return Err(MutationError::RootLevel(target));
        }
        let mut involved = vec![target];
        involved.extend(antecedent);
        let scope = self.roots_of(&involved)?;
        if scope.len() > 1 {
            if let Some(a) = antecedent {
                return Err(MutationError::DifferentRoots(target, a));
            }
        }

        // Trace shape from the antecedent's label
        let mut index = None;
        let (guess_label, guess_token) = match antecedent {
            Some(a) => {
                let parsed = Label::parse(self.forest.label(a)?);
                index = Some(match index_of(&self.forest, &self.config, a) {
                    Some(existing) => (existing.index, false),
                    None => (fresh_index(&self.forest, scope[0])?, true),
                });
                trace_shape(&parsed)
            }
            None => (
                self.config.default_leaf_label.clone(),
                self.config.default_leaf_token.clone(),
            ),
        };

        let label = label.map(str::to_string).unwrap_or(guess_label);
        let mut token = token.map(str::to_string).unwrap_or(guess_token);
        if let Some((i, _)) = index {
            if split_coindex(&token).1.is_none() {
                token = format!("{}{}", token, Coindex::gap(i));
            }
        }
        check_atom(&label, "label")?;
        check_atom(&token, "token")?;
        if !self.oracle.is_legal_terminal_label(&label) {
            return Err(MutationError::IllegalLabel(label));
        }

        let mut leaf = None;
        let outcome = self.speculate(&scope, false, |s| {
            s.history.touch(&s.forest, target)?;
            if let (Some(a), Some((i, true))) = (antecedent, index) {
                s.write_index(a, Some(Coindex::gap(i)))?;
            }

            let parent = s.forest.parent(target);
            let position = s
                .forest
                .position_in_parent(target)
                .ok_or(MutationError::NodeNotFound(target))?;
            let position = match side {
                Side::Before => position,
                Side::After => position + 1,
            };
            let id = s
                .forest
                .create_terminal(label, token, lemma.map(str::to_string));
            s.forest.reparent(id, as_parent(parent), position)?;
            leaf = Some(id);
            Ok(())
        })?;

        if let Some(id) = leaf {
            self.selection.select_only(id);
        }
        Ok(outcome)
    }

    /// Replace an empty-category token with real text
    pub fn set_token(&mut self, node: NodeId, token: &str) -> Result<MutationOutcome, MutationError> {
        let current = self
            .forest
            .node(node)?
            .token()
            .ok_or(MutationError::NotTerminal(node))?;
        if !is_empty_category(current) {
            return Err(MutationError::NotEmptyCategory(node));
        }
        check_atom(token, "token")?;

        let scope = self.roots_of(&[node])?;
        self.speculate(&scope, false, |s| {
            s.history.touch(&s.forest, node)?;
            s.forest.set_token(node, token)
        })
    }

    pub fn set_lemma(&mut self, node: NodeId, lemma: Option<&str>) -> Result<MutationOutcome, MutationError> {
        if !self.forest.node(node)?.is_terminal() {
            return Err(MutationError::NotTerminal(node));
        }
        if let Some(lemma) = lemma {
            check_atom(lemma, "lemma")?;
        }

        let scope = self.roots_of(&[node])?;
        self.speculate(&scope, false, |s| {
            s.history.touch(&s.forest, node)?;
            s.forest.set_lemma(node, lemma.map(str::to_string))
        })
    }

    // Label operations

    pub fn relabel(&mut self, node: NodeId, label: &str) -> Result<MutationOutcome, MutationError> {
        check_atom(label, "label")?;
        if !self.label_is_legal(node, label)? {
            return Err(MutationError::IllegalLabel(label.to_string()));
        }
        self.write_label(node, label.to_string())
    }

    /// Phrases take phrasal labels, terminals take terminal ones. A
    /// word-level conjunction phrase may also take a terminal label.
    fn label_is_legal(&self, node: NodeId, label: &str) -> Result<bool, MutationError> {
        let n = self.forest.node(node)?;
        if n.is_terminal() {
            return Ok(self.oracle.is_legal_terminal_label(label));
        }
        if self.oracle.is_legal_phrasal_label(label) {
            return Ok(true);
        }

        let children = n.children();
        let word_level = children
            .iter()
            .all(|&c| self.forest.get(c).map_or(false, |c| c.is_terminal()));
        let has_conjunction = children.iter().any(|&c| {
            self.forest
                .get(c)
                .map_or(false, |c| Label::parse(&c.label).base == self.config.conjunction_label)
        });
        Ok(word_level && has_conjunction && self.oracle.is_legal_terminal_label(label))
    }

    fn write_label(&mut self, node: NodeId, label: String) -> Result<MutationOutcome, MutationError> {
        let scope = self.roots_of(&[node])?;
        self.speculate(&scope, false, |s| {
            s.history.touch(&s.forest, node)?;
            s.forest.set_label(node, label)
        })
    }

    /// Add `tag` in its canonical place, or remove it when present
    pub fn toggle_dash_tag(
        &mut self,
        node: NodeId,
        tag: &str,
        legal_tags: Option<&[String]>,
    ) -> Result<MutationOutcome, MutationError> {
        let n = self.forest.node(node)?;
        let legal = match legal_tags {
            Some(tags) => tags,
            None if n.is_terminal() => &self.config.leaf_extensions[..],
            None if self.config.is_clause(&n.label) => &self.config.clause_extensions[..],
            None => &self.config.extensions[..],
        };
        if !legal.iter().any(|t| t == tag) {
            return Err(MutationError::IllegalDashTag {
                node,
                tag: tag.to_string(),
            });
        }

        let mut label = Label::parse(&n.label);
        label.toggle_dash_tag(tag, legal);
        self.write_label(node, label.to_string())
    }

    /// Next label from `labels`, keeping the coindex
    pub fn cycle_label(&mut self, node: NodeId, labels: &LabelCycle) -> Result<MutationOutcome, MutationError> {
        let current = self.forest.label(node)?;
        let next = labels.next_label(current).ok_or_else(|| {
            MutationError::MalformedInput("no labels to cycle through".to_string())
        })?;
        if !self.label_is_legal(node, &next)? {
            return Err(MutationError::IllegalLabel(next));
        }
        self.write_label(node, next)
    }

    /// Keep only the base category and the coindex
    pub fn clear_dash_tags(&mut self, node: NodeId) -> Result<MutationOutcome, MutationError> {
        let label = Label::parse(self.forest.label(node)?).without_dash_tags();
        self.write_label(node, label.to_string())
    }

    /// Coindex a pair or step it through its link types; with one node,
    /// strip its index.
    ///
    /// Pair states run `(-,-) -> (=,-) -> (-,=) -> (=,=) -> unindexed`.
    pub fn coindex(&mut self, primary: NodeId, secondary: Option<NodeId>) -> Result<MutationOutcome, MutationError> {
        self.forest.node(primary)?;
        let Some(secondary) = secondary.filter(|&s| s != primary) else {
            if index_of(&self.forest, &self.config, primary).is_none() {
                return Err(MutationError::NotIndexed(primary));
            }
            let scope = self.roots_of(&[primary])?;
            return self.speculate(&scope, false, |s| {
                s.history.touch(&s.forest, primary)?;
                s.write_index(primary, None)
            });
        };

        self.forest.node(secondary)?;
        let scope = self.roots_of(&[primary, secondary])?;
        if scope.len() > 1 {
            return Err(MutationError::DifferentRoots(primary, secondary));
        }

        let p = index_of(&self.forest, &self.config, primary);
        let q = index_of(&self.forest, &self.config, secondary);
        let (next_p, next_q) = match (p, q) {
            (None, None) => {
                let fresh = fresh_index(&self.forest, scope[0])?;
                (Some(Coindex::gap(fresh)), Some(Coindex::gap(fresh)))
            }
            (Some(i), None) => (Some(i), Some(i)),
            (None, Some(i)) => (Some(i), Some(i)),
            (Some(a), Some(b)) if a.index != b.index => {
                return Err(MutationError::IndexMismatch(primary, secondary));
            }
            (Some(a), Some(b)) => {
                use CoindexKind::{Equiv, Gap};
                let kinds = match (a.kind, b.kind) {
                    (Gap, Gap) => Some((Equiv, Gap)),
                    (Equiv, Gap) => Some((Gap, Equiv)),
                    (Gap, Equiv) => Some((Equiv, Equiv)),
                    (Equiv, Equiv) => None,
                };
                match kinds {
                    Some((x, y)) => (
                        Some(Coindex::new(a.index, x)),
                        Some(Coindex::new(a.index, y)),
                    ),
                    None => (None, None),
                }
            }
        };

        self.speculate(&scope, false, |s| {
            s.history.touch(&s.forest, primary)?;
            s.write_index(primary, next_p)?;
            s.write_index(secondary, next_q)
        })
    }

    /// Write a coindex where the node carries it: the token of a trace,
    /// otherwise the label
    fn write_index(&mut self, node: NodeId, index: Option<Coindex>) -> Result<(), MutationError> {
        match index_carrier(&self.forest, &self.config, node) {
            IndexCarrier::Token => {
                let token = self
                    .forest
                    .node(node)?
                    .token()
                    .ok_or(MutationError::NotTerminal(node))?;
                let (base, _) = split_coindex(token);
                let token = match index {
                    Some(c) => format!("{}{}", base, c),
                    None => base.to_string(),
                };
                self.forest.set_token(node, token)
            }
            IndexCarrier::Label => {
                let mut label = Label::parse(self.forest.label(node)?);
                label.coindex = index;
                self.forest.set_label(node, label.to_string())
            }
        }
    }

    // Metadata

    /// Set or remove (`None`) one metadata entry on a root tree
    pub fn set_metadata(
        &mut self,
        root: NodeId,
        key: &str,
        value: Option<&str>,
    ) -> Result<MutationOutcome, MutationError> {
        if self.forest.node(root)?.parent.is_some() {
            return Err(MutationError::NotRoot(root));
        }
        check_atom(key, "metadata key")?;
        if let Some(value) = value {
            check_atom(value, "metadata value")?;
        }

        self.speculate(&[root], false, |s| {
            s.history.touch(&s.forest, root)?;
            let node = s.forest.node_mut(root)?;
            let mut metadata = node.metadata.take().unwrap_or_default();
            match value {
                Some(v) => {
                    metadata.insert(key.to_string(), v.to_string());
                }
                None => {
                    metadata.remove(key);
                }
            }
            node.metadata = (!metadata.is_empty()).then_some(metadata);
            Ok(())
        })
    }
}

/// Label and token for a trace of an antecedent labelled `antecedent`
fn trace_shape(antecedent: &Label) -> (String, String) {
    let mut label = antecedent.clone();
    label.coindex = None;

    if label.base.len() > 1 && label.base.starts_with('W') {
        label.base.remove(0);
        return (label.to_string(), "*T*".to_string());
    }
    if label.has_dash_tag("CL") {
        label.dash_tags.retain(|t| t != "CL");
        if label.base.starts_with("PRO") {
            label.base = "NP".to_string();
        }
        return (label.to_string(), "*CL*".to_string());
    }
    (label.to_string(), "*ICH*".to_string())
}
