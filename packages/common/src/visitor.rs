use treebank_parser::ast::*;

/// Visitor pattern for traversing treebank ASTs immutably
///
/// Default implementations walk the entire tree. Override specific
/// visit_* methods to act on particular nodes.
pub trait Visitor: Sized {
    fn visit_treebank(&mut self, treebank: &Treebank) {
        walk_treebank(self, treebank);
    }

    fn visit_root(&mut self, root: &Root) {
        walk_root(self, root);
    }

    fn visit_metadata(&mut self, _key: &str, _value: &str) {
        // Leaf, nothing to walk
    }

    fn visit_phrase(&mut self, tree: &Tree, children: &[Tree]) {
        let _ = tree;
        walk_children(self, children);
    }

    fn visit_leaf(&mut self, _tree: &Tree, _token: &str, _lemma: Option<&str>) {
        // Leaf, nothing to walk
    }
}

pub fn walk_treebank<V: Visitor>(visitor: &mut V, treebank: &Treebank) {
    for root in &treebank.roots {
        visitor.visit_root(root);
    }
}

pub fn walk_root<V: Visitor>(visitor: &mut V, root: &Root) {
    for (key, value) in &root.metadata {
        visitor.visit_metadata(key, value);
    }
    walk_tree(visitor, &root.tree);
}

pub fn walk_tree<V: Visitor>(visitor: &mut V, tree: &Tree) {
    match &tree.body {
        TreeBody::Phrase(children) => visitor.visit_phrase(tree, children),
        TreeBody::Leaf { token, lemma } => visitor.visit_leaf(tree, token, lemma.as_deref()),
    }
}

pub fn walk_children<V: Visitor>(visitor: &mut V, children: &[Tree]) {
    for child in children {
        walk_tree(visitor, child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use treebank_parser::parse;

    #[derive(Default)]
    struct Counter {
        phrases: usize,
        leaves: usize,
        empty: usize,
        metadata: usize,
    }

    impl Visitor for Counter {
        fn visit_metadata(&mut self, _key: &str, _value: &str) {
            self.metadata += 1;
        }

        fn visit_phrase(&mut self, _tree: &Tree, children: &[Tree]) {
            self.phrases += 1;
            walk_children(self, children);
        }

        fn visit_leaf(&mut self, _tree: &Tree, token: &str, _lemma: Option<&str>) {
            self.leaves += 1;
            if is_empty_category(token) {
                self.empty += 1;
            }
        }
    }

    #[test]
    fn test_counts_every_node() {
        let treebank =
            parse("( (IP (NP-SBJ *con*) (VBD ran) (PP (P to) (NP (N town)))) (ID x))").unwrap();
        let mut counter = Counter::default();
        counter.visit_treebank(&treebank);

        assert_eq!(counter.phrases, 3);
        assert_eq!(counter.leaves, 4);
        assert_eq!(counter.empty, 1);
        assert_eq!(counter.metadata, 1);
    }
}
