//! Integration tests for editor crate

use std::path::{Path, PathBuf};
use treebank_common::{FileSystem, MockFileSystem};
use treebank_editor::{
    Document, EditorConfig, EditorError, Mutation, MutationError, MutationOutcome, NodeId,
};

#[test]
fn test_document_lifecycle() {
    let mut fs = MockFileSystem::new();
    fs.add_file(
        "corpus/tales.psd",
        "( (IP (NP-SBJ (D The) (N cat)) (VBD sat)) (ID t1))\n\n( (FRAG (ADV yes)) (ID t2))\n",
    );
    let path = Path::new("corpus/tales.psd");

    let mut doc = Document::load(&fs, path, EditorConfig::default()).unwrap();
    assert_eq!(doc.version, 0);
    assert!(!doc.is_dirty());
    assert_eq!(doc.session().forest().roots().len(), 2);

    // IP1 NP-SBJ2 D3 N4 VBD5 | FRAG6 ADV7
    let result = doc
        .apply(&Mutation::Relabel {
            node: NodeId(4),
            label: "NS".into(),
        })
        .unwrap();
    assert_eq!(result.version, 1);
    assert_eq!(result.outcome, MutationOutcome::Applied);
    assert!(doc.is_dirty());

    doc.save(&fs).unwrap();
    assert!(!doc.is_dirty());

    let saved = fs.contents(path).unwrap();
    assert!(saved.contains("(NS cat)"));
    assert!(saved.contains("(ID t2)"));

    // What was saved loads back to the same forest
    let reloaded = Document::load(&fs, path, EditorConfig::default()).unwrap();
    assert_eq!(reloaded.session().forest(), doc.session().forest());
}

#[test]
fn test_load_missing_file() {
    let fs = MockFileSystem::new();
    let result = Document::load(&fs, Path::new("nowhere.psd"), EditorConfig::default());
    assert!(matches!(result, Err(EditorError::Common(_))));
}

#[test]
fn test_load_reports_parse_errors() {
    let mut fs = MockFileSystem::new();
    fs.add_file("bad.psd", "( (IP (N cat)");

    let result = Document::load(&fs, Path::new("bad.psd"), EditorConfig::default());
    assert!(matches!(result, Err(EditorError::Parse(_))));
}

#[test]
fn test_config_loading() {
    let mut fs = MockFileSystem::new();
    fs.add_file(
        "corpus/treebank.config.json",
        r#"{ "defaultLeafToken": "*pro*", "clauseCategories": ["IP", "CP", "FRAG"] }"#,
    );

    let config = EditorConfig::load(&fs, Path::new("corpus")).unwrap();
    assert_eq!(config.default_leaf_token, "*pro*");
    assert!(config.is_clause("FRAG-SPE"));
    // Unlisted fields keep their defaults
    assert_eq!(config.default_leaf_label, "NP-SBJ");

    let fallback = EditorConfig::load(&fs, Path::new("elsewhere")).unwrap();
    assert_eq!(fallback, EditorConfig::default());

    let mut doc =
        Document::from_source(PathBuf::from("t.psd"), "(IP (VB go))", config).unwrap();
    doc.apply(&Mutation::InsertLeaf {
        target: NodeId(2),
        side: treebank_editor::Side::Before,
        antecedent: None,
        label: None,
        token: None,
        lemma: None,
    })
    .unwrap();
    assert_eq!(doc.to_compact_text(), "( (IP (NP-SBJ *pro*) (VB go)))\n");
}

#[test]
fn test_bad_config_names_the_file() {
    let mut fs = MockFileSystem::new();
    fs.add_file("corpus/treebank.config.json", r#"{ "splitMarker": 7 }"#);

    match EditorConfig::load(&fs, Path::new("corpus")) {
        Err(EditorError::Config { path, .. }) => {
            assert!(path.ends_with("treebank.config.json"))
        }
        other => panic!("expected config error, got {:?}", other),
    }
}

#[test]
fn test_legal_label_lists() {
    let config: EditorConfig = serde_json::from_str(
        r#"{
            "legalLeafLabels": { "bases": ["D", "N", "VBD"] },
            "legalPhraseLabels": { "bases": ["IP", "NP"], "dashTags": ["SBJ"] }
        }"#,
    )
    .unwrap();

    // IP1 NP2 D3 N4 VBD5
    let mut doc = Document::from_source(
        PathBuf::from("t.psd"),
        "(IP (NP (D the) (N cat)) (VBD sat))",
        config,
    )
    .unwrap();

    doc.apply(&Mutation::Relabel {
        node: NodeId(2),
        label: "NP-SBJ".into(),
    })
    .unwrap();
    assert!(matches!(
        doc.apply(&Mutation::Relabel {
            node: NodeId(2),
            label: "NP-OB1".into(),
        }),
        Err(EditorError::Mutation(MutationError::IllegalLabel(ref l))) if l == "NP-OB1"
    ));
    assert!(doc
        .apply(&Mutation::Relabel {
            node: NodeId(4),
            label: "ADJ".into(),
        })
        .is_err());
    // A coindex never makes a label illegal
    doc.apply(&Mutation::Relabel {
        node: NodeId(2),
        label: "NP-SBJ-1".into(),
    })
    .unwrap();
}

#[test]
fn test_json_mutation_script() {
    let script = r#"[
        { "op": "relabel", "node": 2, "label": "NP-SBJ" },
        { "op": "move_node", "moved": 7, "target": { "node": 1 } },
        { "op": "insert_leaf", "target": 2, "side": "before" },
        { "op": "set_metadata", "root": 1, "key": "ID", "value": "s9" }
    ]"#;
    let mutations: Vec<Mutation> = serde_json::from_str(script).unwrap();

    // IP1 NP2 D3 N4 VP5 VBD6 ADV7
    let mut doc = Document::from_source(
        PathBuf::from("t.psd"),
        "(IP (NP (D the) (N cat)) (VP (VBD sat) (ADV down)))",
        EditorConfig::default(),
    )
    .unwrap();

    for mutation in &mutations {
        doc.apply(mutation).unwrap();
    }

    assert_eq!(doc.version, 4);
    assert_eq!(
        doc.to_compact_text(),
        "( (IP (NP-SBJ *con*) (NP-SBJ (D the) (N cat)) (VP (VBD sat)) (ADV down)) (ID s9))\n"
    );
}

#[test]
fn test_dash_lemmata_documents() {
    let config = EditorConfig {
        dash_lemmata: true,
        ..EditorConfig::default()
    };
    let mut doc = Document::from_source(
        PathBuf::from("t.psd"),
        "(IP (NP (N cats-cat)) (VBD sat-sit))",
        config,
    )
    .unwrap();

    let forest = doc.session().forest();
    assert_eq!(forest.get(NodeId(3)).unwrap().token(), Some("cats"));
    assert_eq!(forest.get(NodeId(3)).unwrap().lemma(), Some("cat"));

    doc.apply(&Mutation::SetLemma {
        node: NodeId(4),
        lemma: None,
    })
    .unwrap();
    assert_eq!(doc.to_compact_text(), "( (IP (NP (N cats-cat)) (VBD sat)))\n");
}

#[test]
fn test_save_as_leaves_original_untouched() {
    let mut fs = MockFileSystem::new();
    fs.add_file("a.psd", "( (IP (N cat)))\n");

    let mut doc = Document::load(&fs, Path::new("a.psd"), EditorConfig::default()).unwrap();
    doc.apply(&Mutation::Relabel {
        node: NodeId(2),
        label: "NS".into(),
    })
    .unwrap();
    doc.save_as(&fs, Path::new("b.psd")).unwrap();

    assert_eq!(fs.read_to_string(Path::new("a.psd")).unwrap(), "( (IP (N cat)))\n");
    assert_eq!(fs.contents(Path::new("b.psd")).unwrap(), "( (IP (NS cat)))\n");
    assert!(doc.is_dirty());
}
