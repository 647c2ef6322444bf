//! Mutation tests against whole sessions

use treebank_editor::{
    EditSession, EditorConfig, Forest, LabelCycle, Mutation, MutationError, MutationOutcome, NodeId,
    Parent, Side,
};
use treebank_parser::Serializer;

fn session(source: &str) -> EditSession {
    EditSession::from_source(source, EditorConfig::default()).unwrap()
}

fn text(session: &EditSession) -> String {
    Serializer::compact().serialize(&session.forest().to_treebank())
}

fn labels(forest: &Forest, ids: &[u64]) -> Vec<String> {
    ids.iter()
        .map(|&id| forest.label(NodeId(id)).unwrap().to_string())
        .collect()
}

fn all_tokens(forest: &Forest) -> Vec<String> {
    forest.roots().iter().flat_map(|&r| forest.tokens(r)).collect()
}

#[test]
fn test_wrap_then_prune_is_identity() {
    // IP1 NP-SBJ2 VB3 VB4
    let mut s = session("(IP (NP-SBJ The) (VB cat) (VB sat))");
    let original = s.forest().clone();

    let outcome = s
        .perform(&Mutation::WrapInPhrase {
            first: NodeId(2),
            last: Some(NodeId(3)),
            label: Some("NP".into()),
        })
        .unwrap();
    assert_eq!(outcome, MutationOutcome::Applied);
    assert_eq!(text(&s), "( (IP (NP (NP-SBJ The) (VB cat)) (VB sat)))\n");

    let wrapper = s.selection().primary().unwrap();
    assert_eq!(s.forest().label(wrapper).unwrap(), "NP");

    s.perform(&Mutation::Prune { node: wrapper }).unwrap();
    assert_eq!(s.forest(), &original);
    assert_eq!(s.forest().children(NodeId(1)), &[NodeId(2), NodeId(3), NodeId(4)]);
}

#[test]
fn test_wrap_then_prune_root_keeps_metadata() {
    // IP1 NP2 N3 VB4
    let mut s = session("( (IP (NP (N cats)) (VB sleep)) (ID s1))");
    let original = s.forest().clone();

    s.perform(&Mutation::WrapInPhrase {
        first: NodeId(1),
        last: None,
        label: Some("FRAG".into()),
    })
    .unwrap();
    assert_eq!(text(&s), "( (FRAG (IP (NP (N cats)) (VB sleep))) (ID s1))\n");

    let wrapper = s.selection().primary().unwrap();
    assert_eq!(
        s.perform(&Mutation::Prune { node: wrapper }),
        Ok(MutationOutcome::Applied)
    );
    assert_eq!(s.forest(), &original);
}

#[test]
fn test_wrap_accepts_run_in_either_order() {
    let mut s = session("(IP (D the) (N cat) (VBD sat))");

    s.perform(&Mutation::WrapInPhrase {
        first: NodeId(3),
        last: Some(NodeId(2)),
        label: Some("NP".into()),
    })
    .unwrap();
    assert_eq!(text(&s), "( (IP (NP (D the) (N cat)) (VBD sat)))\n");
}

#[test]
fn test_wrap_rejects_non_sisters() {
    // IP1 NP2 N3 VBD4
    let mut s = session("(IP (NP (N cat)) (VBD sat))");

    assert_eq!(
        s.perform(&Mutation::WrapInPhrase {
            first: NodeId(3),
            last: Some(NodeId(4)),
            label: None,
        }),
        Err(MutationError::NotSisters(NodeId(3), NodeId(4)))
    );
    assert!(!s.history().can_undo());
}

#[test]
fn test_wrap_whole_root_tree() {
    let mut s = session("( (NP (N cats)) (ID s1))\n\n(VP (VB sleep))");
    let original = s.forest().clone();

    s.perform(&Mutation::WrapInPhrase {
        first: NodeId(1),
        last: Some(NodeId(3)),
        label: Some("IP".into()),
    })
    .unwrap();

    assert_eq!(
        text(&s),
        "( (IP (NP (N cats)) (VP (VB sleep))) (ID s1))\n"
    );
    s.undo().unwrap();
    assert_eq!(s.forest(), &original);
}

#[test]
fn test_coindex_cycle_from_unindexed() {
    // IP1 NP2 N3 VB4 NP5 N6
    let mut s = session("(IP (NP (N a)) (VB b) (NP (N c)))");
    let step = Mutation::Coindex {
        primary: NodeId(2),
        secondary: Some(NodeId(5)),
    };

    let expected = [
        ["NP-1", "NP-1"],
        ["NP=1", "NP-1"],
        ["NP-1", "NP=1"],
        ["NP=1", "NP=1"],
        ["NP", "NP"],
    ];
    for pair in expected {
        s.perform(&step).unwrap();
        assert_eq!(labels(s.forest(), &[2, 5]), pair);
    }
}

#[test]
fn test_coindex_allocates_above_max() {
    // IP1 NP-SBJ-3 2 PRO3 VB4 NP5 N6 ADV7
    let mut s = session("(IP (NP-SBJ-3 (PRO it)) (VB b) (NP (N c)) (ADV *ICH*-7))");

    s.perform(&Mutation::Coindex {
        primary: NodeId(4),
        secondary: Some(NodeId(5)),
    })
    .unwrap();
    assert_eq!(labels(s.forest(), &[4, 5]), ["VB-8", "NP-8"]);
}

#[test]
fn test_coindex_at_the_top_of_the_index_range() {
    // IP1 NP-SBJ-4294967295 2 PRO3 VB4 NP5 N6
    let mut s = session("(IP (NP-SBJ-4294967295 (PRO it)) (VB b) (NP (N c)))");
    let original = s.forest().clone();

    assert_eq!(
        s.perform(&Mutation::Coindex {
            primary: NodeId(4),
            secondary: Some(NodeId(5)),
        }),
        Err(MutationError::IndexOverflow(NodeId(1)))
    );
    assert_eq!(
        s.perform(&Mutation::InsertLeaf {
            target: NodeId(4),
            side: Side::After,
            antecedent: Some(NodeId(5)),
            label: None,
            token: None,
            lemma: None,
        }),
        Err(MutationError::IndexOverflow(NodeId(1)))
    );
    assert_eq!(s.forest(), &original);
    assert!(!s.history().can_undo());
}

#[test]
fn test_coindex_propagates_and_strips() {
    // IP1 NP-SBJ=2 2 PRO3 VB4 NP5
    let mut s = session("(IP (NP-SBJ=2 (PRO it)) (VB b) (NP *T*))");

    s.perform(&Mutation::Coindex {
        primary: NodeId(2),
        secondary: Some(NodeId(5)),
    })
    .unwrap();
    assert_eq!(text(&s), "( (IP (NP-SBJ=2 (PRO it)) (VB b) (NP *T*=2)))\n");

    s.perform(&Mutation::Coindex {
        primary: NodeId(5),
        secondary: None,
    })
    .unwrap();
    assert_eq!(text(&s), "( (IP (NP-SBJ=2 (PRO it)) (VB b) (NP *T*)))\n");

    assert_eq!(
        s.perform(&Mutation::Coindex {
            primary: NodeId(4),
            secondary: None,
        }),
        Err(MutationError::NotIndexed(NodeId(4)))
    );
}

#[test]
fn test_coindex_rejections() {
    // IP1 NP-1 2 N3 NP-2 4 N5 | IP6 NP7 N8
    let mut s = session("(IP (NP-1 (N a)) (NP-2 (N b))) (IP (NP (N c)))");

    assert_eq!(
        s.perform(&Mutation::Coindex {
            primary: NodeId(2),
            secondary: Some(NodeId(4)),
        }),
        Err(MutationError::IndexMismatch(NodeId(2), NodeId(4)))
    );
    assert_eq!(
        s.perform(&Mutation::Coindex {
            primary: NodeId(2),
            secondary: Some(NodeId(7)),
        }),
        Err(MutationError::DifferentRoots(NodeId(2), NodeId(7)))
    );
    assert!(!s.history().can_undo());
}

#[test]
fn test_merge_renumbers_donor_indices() {
    // T1: IP1 NP-3 2 PRO3 VBD4 | T2: FRAG5 NP-1 6 N7 ADV8
    let mut s = session(
        "(IP (NP-3 (PRO it)) (VBD rained))\n(FRAG (NP-1 (N today)) (ADV *ICH*-1))",
    );
    let original = s.forest().clone();

    let outcome = s
        .perform(&Mutation::MoveNode {
            moved: NodeId(5),
            target: Parent::Node(NodeId(1)),
        })
        .unwrap();

    assert_eq!(outcome, MutationOutcome::Applied);
    assert_eq!(s.forest().roots(), &[NodeId(1)]);
    assert_eq!(
        text(&s),
        "( (IP (NP-3 (PRO it)) (VBD rained) (FRAG (NP-4 (N today)) (ADV *ICH*-4))))\n"
    );

    s.undo().unwrap();
    assert_eq!(s.forest(), &original);
}

#[test]
fn test_merge_rejects_index_overflow() {
    // T1: IP1 NP-SBJ-4294967295 2 PRO3 VB4 | T2: IP5 NP-1 6 N7
    let mut s = session("(IP (NP-SBJ-4294967295 (PRO it)) (VB b))\n(IP (NP-1 (N a)))");
    let original = s.forest().clone();

    assert_eq!(
        s.perform(&Mutation::MoveNode {
            moved: NodeId(5),
            target: Parent::Node(NodeId(1)),
        }),
        Err(MutationError::IndexOverflow(NodeId(5)))
    );
    assert_eq!(s.forest(), &original);
    assert!(!s.history().can_undo());
}

#[test]
fn test_move_between_trees_renumbers_indices() {
    // T1: IP1 NP-1 2 N3 VP4 VB5 | T2: IP6 NP-1 7 N8 VB9
    let mut s = session("(IP (NP-1 (N a)) (VP (VB b)))\n(IP (NP-1 (N c)) (VB d))");
    let original = s.forest().clone();

    let outcome = s
        .perform(&Mutation::MoveNode {
            moved: NodeId(7),
            target: Parent::Node(NodeId(1)),
        })
        .unwrap();

    assert_eq!(outcome, MutationOutcome::Applied);
    assert_eq!(
        text(&s),
        "( (IP (NP-1 (N a)) (VP (VB b)) (NP-2 (N c))))\n\n( (IP (VB d)))\n"
    );

    s.undo().unwrap();
    assert_eq!(s.forest(), &original);
}

#[test]
fn test_merge_out_of_order_rolls_back() {
    // Moving the second tree into the middle of the first reorders text
    // IP1 NP2 N3 VP4 VB5 | X6 N7
    let mut s = session("(IP (NP (N a)) (VP (VB b)))\n(X (N c))");
    let original = s.forest().clone();

    let outcome = s
        .perform(&Mutation::MoveNode {
            moved: NodeId(6),
            target: Parent::Node(NodeId(2)),
        })
        .unwrap();

    assert_eq!(outcome, MutationOutcome::RolledBack);
    assert_eq!(s.forest(), &original);
    assert!(!s.history().can_undo());
}

#[test]
fn test_split_out_to_root_level() {
    // IP1 NP2 N3 VBD4
    let mut s = session("(IP (NP (N cat)) (VBD sat))");
    let original = s.forest().clone();

    s.perform(&Mutation::MoveNode {
        moved: NodeId(2),
        target: Parent::Forest,
    })
    .unwrap();
    assert_eq!(s.forest().roots(), &[NodeId(2), NodeId(1)]);
    assert_eq!(all_tokens(s.forest()), ["cat", "sat"]);

    s.undo().unwrap();
    assert_eq!(s.forest(), &original);
    s.redo().unwrap();
    assert_eq!(s.forest().roots(), &[NodeId(2), NodeId(1)]);
}

#[test]
fn test_move_rejections() {
    // IP1 NP2 N3 VP4 VB5 NP6 D7 N8
    let mut s = session("(IP (NP (N cat)) (VP (VB saw) (NP (D a) (N dog))))");

    let cases = [
        (NodeId(4), Parent::Node(NodeId(3)), MutationError::NotATarget(NodeId(3))),
        (NodeId(3), Parent::Node(NodeId(4)), MutationError::OnlyChild(NodeId(3))),
        (NodeId(4), Parent::Node(NodeId(6)), MutationError::CycleDetected),
        (NodeId(1), Parent::Forest, MutationError::RootLevel(NodeId(1))),
    ];
    for (moved, target, expected) in cases {
        s.select(NodeId(2)).unwrap();
        assert_eq!(s.perform(&Mutation::MoveNode { moved, target }), Err(expected));
        assert!(s.selection().is_empty());
    }
    assert!(!s.history().can_undo());
}

#[test]
fn test_move_preserves_tokens() {
    // IP1 NP-SBJ2 PRO3 VP4 VB5 NP6 N7 PP8 P9 NP10 N11
    let mut s = session(
        "(IP (NP-SBJ (PRO I)) (VP (VB saw) (NP (N dogs))) (PP (P with) (NP (N hats))))",
    );
    let before = all_tokens(s.forest());

    // PP into VP: target precedes, so it becomes the last child
    s.perform(&Mutation::MoveNode {
        moved: NodeId(8),
        target: Parent::Node(NodeId(4)),
    })
    .unwrap();
    assert_eq!(s.forest().children(NodeId(4)), &[NodeId(5), NodeId(6), NodeId(8)]);
    assert_eq!(all_tokens(s.forest()), before);

    // and back up out of the VP from its trailing edge
    s.perform(&Mutation::MoveNode {
        moved: NodeId(8),
        target: Parent::Node(NodeId(1)),
    })
    .unwrap();
    assert_eq!(s.forest().children(NodeId(1)), &[NodeId(2), NodeId(4), NodeId(8)]);
    assert_eq!(all_tokens(s.forest()), before);
}

#[test]
fn test_move_range_into_preceding_sister() {
    // IP1 NP-SBJ2 PRO3 VP4 VB5 ADV6 ADV7
    let mut s = session("(IP (NP-SBJ (PRO I)) (VP (VB go)) (ADV now) (ADV quickly))");
    let original = s.forest().clone();

    s.perform(&Mutation::MoveRange {
        first: NodeId(7),
        last: NodeId(6),
        target: Parent::Node(NodeId(4)),
    })
    .unwrap();
    assert_eq!(
        text(&s),
        "( (IP (NP-SBJ (PRO I)) (VP (VB go) (ADV now) (ADV quickly))))\n"
    );
    assert!(s.forest().validate().is_empty());

    s.undo().unwrap();
    assert_eq!(s.forest(), &original);
}

#[test]
fn test_move_range_merges_root_trees() {
    // IP1 NP2 N3 | X4 N5 | Y6 N7
    let mut s = session("(IP (NP (N a)))\n(X (N b))\n(Y (N c))");
    let original = s.forest().clone();

    s.perform(&Mutation::MoveRange {
        first: NodeId(4),
        last: NodeId(6),
        target: Parent::Node(NodeId(1)),
    })
    .unwrap();
    assert_eq!(text(&s), "( (IP (NP (N a)) (X (N b)) (Y (N c))))\n");

    s.undo().unwrap();
    assert_eq!(s.forest(), &original);
    s.redo().unwrap();
    assert_eq!(text(&s), "( (IP (NP (N a)) (X (N b)) (Y (N c))))\n");
}

#[test]
fn test_move_range_merge_keeps_indices_apart() {
    // IP1 NP-1 2 N3 VB4 | FRAG5 NP-1 6 N7 | FRAG8 NP-1 9 N10
    let mut s = session("(IP (NP-1 (N a)) (VB x))\n(FRAG (NP-1 (N b)))\n(FRAG (NP-1 (N c)))");
    let original = s.forest().clone();

    s.perform(&Mutation::MoveRange {
        first: NodeId(5),
        last: NodeId(8),
        target: Parent::Node(NodeId(1)),
    })
    .unwrap();
    assert_eq!(
        text(&s),
        "( (IP (NP-1 (N a)) (VB x) (FRAG (NP-2 (N b))) (FRAG (NP-3 (N c)))))\n"
    );

    s.undo().unwrap();
    assert_eq!(s.forest(), &original);
}

#[test]
fn test_wrap_rejects_root_trees_sharing_an_index() {
    // FRAG1 NP-1 2 N3 | FRAG4 NP-1 5 N6
    let mut s = session("(FRAG (NP-1 (N b)))\n(FRAG (NP-1 (N c)))");

    assert_eq!(
        s.perform(&Mutation::WrapInPhrase {
            first: NodeId(1),
            last: Some(NodeId(4)),
            label: Some("IP".into()),
        }),
        Err(MutationError::IndexClash(NodeId(1), NodeId(4)))
    );
    assert!(!s.history().can_undo());
}

#[test]
fn test_move_range_whole_child_list_rejected() {
    let mut s = session("(IP (NP (D a) (N b)) (VB c))");

    assert_eq!(
        s.perform(&Mutation::MoveRange {
            first: NodeId(3),
            last: NodeId(4),
            target: Parent::Node(NodeId(1)),
        }),
        Err(MutationError::OnlyChild(NodeId(3)))
    );
}

#[test]
fn test_prune_leaves() {
    // IP1 NP-SBJ2 VB3 NP4 N5
    let mut s = session("(IP (NP-SBJ *pro*) (VB go) (NP (N *con*)))");

    assert_eq!(
        s.perform(&Mutation::Prune { node: NodeId(3) }),
        Err(MutationError::DominatesText(NodeId(3)))
    );
    assert_eq!(
        s.perform(&Mutation::Prune { node: NodeId(5) }),
        Err(MutationError::OnlyChild(NodeId(5)))
    );

    s.perform(&Mutation::Prune { node: NodeId(2) }).unwrap();
    assert_eq!(text(&s), "( (IP (VB go) (NP (N *con*))))\n");
}

#[test]
fn test_prune_root_tree_promotes_children() {
    // FRAG1 NP2 N3 VP4 VB5
    let mut s = session("(FRAG (NP (N a)) (VP (VB b)))");
    let original = s.forest().clone();

    s.perform(&Mutation::Prune { node: NodeId(1) }).unwrap();
    assert_eq!(s.forest().roots(), &[NodeId(2), NodeId(4)]);
    assert_eq!(s.selection().primary(), Some(NodeId(2)));

    s.undo().unwrap();
    assert_eq!(s.forest(), &original);
}

#[test]
fn test_prune_rejections() {
    let mut s = session("( (FRAG (N a) (CODE (X y))) (ID f1))");

    assert_eq!(
        s.perform(&Mutation::Prune { node: NodeId(3) }),
        Err(MutationError::NotATarget(NodeId(3)))
    );
    assert!(!s.history().can_undo());
}

#[test]
fn test_prune_root_hands_metadata_to_first_tree() {
    // FRAG1 NP2 N3 VP4 VB5
    let mut s = session("( (FRAG (NP (N a)) (VP (VB b))) (ID f1))");

    s.perform(&Mutation::Prune { node: NodeId(1) }).unwrap();
    assert_eq!(text(&s), "( (NP (N a)) (ID f1))\n\n( (VP (VB b)))\n");
}

#[test]
fn test_wrap_roots_keeps_only_leading_metadata() {
    let mut s = session("(NP (N cats))\n\n( (VP (VB sleep)) (ID s2))");

    assert_eq!(
        s.perform(&Mutation::WrapInPhrase {
            first: NodeId(1),
            last: Some(NodeId(3)),
            label: Some("IP".into()),
        }),
        Err(MutationError::WouldDropMetadata(NodeId(3)))
    );
}

#[test]
fn test_dash_tags() {
    // IP1 NP-2 2 N3 VB4
    let mut s = session("(IP (NP-2 (N a)) (VB go))");

    for tag in ["LFD", "SBJ"] {
        s.perform(&Mutation::ToggleDashTag {
            node: NodeId(2),
            tag: tag.into(),
            legal_tags: None,
        })
        .unwrap();
    }
    assert_eq!(s.forest().label(NodeId(2)).unwrap(), "NP-SBJ-LFD-2");

    s.perform(&Mutation::ToggleDashTag {
        node: NodeId(1),
        tag: "SPE".into(),
        legal_tags: None,
    })
    .unwrap();
    assert_eq!(s.forest().label(NodeId(1)).unwrap(), "IP-SPE");

    assert_eq!(
        s.perform(&Mutation::ToggleDashTag {
            node: NodeId(4),
            tag: "SBJ".into(),
            legal_tags: None,
        }),
        Err(MutationError::IllegalDashTag {
            node: NodeId(4),
            tag: "SBJ".into()
        })
    );

    s.perform(&Mutation::ClearDashTags { node: NodeId(2) }).unwrap();
    assert_eq!(s.forest().label(NodeId(2)).unwrap(), "NP-2");
}

#[test]
fn test_cycle_and_relabel() {
    // IP1 NP-SBJ-1 2 N3 VB4
    let mut s = session("(IP (NP-SBJ-1 (N a)) (VB go))");
    let cycle = LabelCycle::List(vec!["NP-SBJ".into(), "NP-OB1".into()]);

    s.perform(&Mutation::CycleLabel {
        node: NodeId(2),
        labels: cycle,
    })
    .unwrap();
    assert_eq!(s.forest().label(NodeId(2)).unwrap(), "NP-OB1-1");

    assert!(s
        .perform(&Mutation::Relabel {
            node: NodeId(4),
            label: "V B".into(),
        })
        .unwrap_err()
        .is_user_input_error());
}

#[test]
fn test_insert_leaf_defaults() {
    // IP1 VB2
    let mut s = session("(IP (VB go))");

    s.perform(&Mutation::InsertLeaf {
        target: NodeId(2),
        side: Side::Before,
        antecedent: None,
        label: None,
        token: None,
        lemma: None,
    })
    .unwrap();
    assert_eq!(text(&s), "( (IP (NP-SBJ *con*) (VB go)))\n");

    assert_eq!(
        s.perform(&Mutation::InsertLeaf {
            target: NodeId(1),
            side: Side::After,
            antecedent: None,
            label: None,
            token: None,
            lemma: None,
        }),
        Err(MutationError::RootLevel(NodeId(1)))
    );
}

#[test]
fn test_insert_clitic_trace() {
    // IP1 NP-CL2 PRO3 VB4
    let mut s = session("(IP (NP-CL (PRO-CL se)) (VB go))");

    s.perform(&Mutation::InsertLeaf {
        target: NodeId(4),
        side: Side::After,
        antecedent: Some(NodeId(3)),
        label: None,
        token: None,
        lemma: None,
    })
    .unwrap();
    assert_eq!(
        text(&s),
        "( (IP (NP-CL (PRO-CL-1 se)) (VB go) (NP *CL*-1)))\n"
    );
}

#[test]
fn test_split_keeps_lemma() {
    let options = treebank_parser::ParseOptions { dash_lemmata: true };
    let mut s = EditSession::from_source_with_options(
        "(IP (P+D zum-zu) (N Haus-haus))",
        options,
        EditorConfig::default(),
    )
    .unwrap();

    s.perform(&Mutation::SplitToken {
        node: NodeId(2),
        split_text: "zu@m".into(),
    })
    .unwrap();

    let left = s.forest().get(NodeId(2)).unwrap();
    assert_eq!(left.token(), Some("zu@"));
    assert_eq!(left.lemma(), Some("zu"));
    let right = s.forest().get(s.forest().children(NodeId(1))[1]).unwrap();
    assert_eq!(right.label, "D");
    assert_eq!(right.lemma(), Some("zu"));
}

#[test]
fn test_lemma_and_metadata() {
    // IP1 N2
    let mut s = session("(IP (N cats))");

    s.perform(&Mutation::SetLemma {
        node: NodeId(2),
        lemma: Some("cat".into()),
    })
    .unwrap();
    assert_eq!(text(&s), "( (IP (N cats-cat)))\n");

    assert_eq!(
        s.perform(&Mutation::SetLemma {
            node: NodeId(1),
            lemma: None,
        }),
        Err(MutationError::NotTerminal(NodeId(1)))
    );

    s.perform(&Mutation::SetMetadata {
        root: NodeId(1),
        key: "ID".into(),
        value: Some("c1".into()),
    })
    .unwrap();
    assert_eq!(text(&s), "( (IP (N cats-cat)) (ID c1))\n");
}
