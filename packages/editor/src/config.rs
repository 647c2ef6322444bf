//! # Editor Configuration
//!
//! Corpus-specific settings: dash-tag orderings, clause categories, trace
//! conventions and optional label legality lists. Loaded from
//! `treebank.config.json`; every field has a default so a partial file is
//! enough.

use crate::errors::EditorError;
use crate::label::{base_of, Label};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use treebank_common::FileSystem;

pub const DEFAULT_CONFIG_NAME: &str = "treebank.config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Dash tags legal on terminals, in canonical order
    pub leaf_extensions: Vec<String>,

    /// Dash tags legal on clause categories, in canonical order
    pub clause_extensions: Vec<String>,

    /// Dash tags legal on other phrases, in canonical order
    pub extensions: Vec<String>,

    /// Bases whose phrases take `clause_extensions`
    pub clause_categories: Vec<String>,

    /// Phrasal bases that may not receive moved material or be pruned
    pub non_container_labels: Vec<String>,

    /// Empty categories that carry their coindex on the token
    pub trace_prefixes: Vec<String>,

    pub default_leaf_label: String,
    pub default_leaf_token: String,
    pub default_phrase_label: String,

    /// Label given to the right half of a split token with a simple label
    pub default_split_label: String,
    pub split_marker: String,

    /// Terminal label that makes a phrase a word-level conjunction
    pub conjunction_label: String,

    /// Read `word-lemma` tokens as a token plus a lemma
    pub dash_lemmata: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub legal_leaf_labels: Option<LegalLabels>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub legal_phrase_labels: Option<LegalLabels>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalLabels {
    pub bases: Vec<String>,
    #[serde(default)]
    pub dash_tags: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            leaf_extensions: Vec::new(),
            clause_extensions: strings(&["RSP", "LFD", "SBJ", "PRN", "SPE", "XXX"]),
            extensions: strings(&["SBJ", "RSP", "LFD", "PRN", "SPE", "XXX"]),
            clause_categories: strings(&["IP", "CP"]),
            non_container_labels: strings(&["CODE"]),
            trace_prefixes: strings(&["*T*", "*ICH*", "*CL*", "*EXP*"]),
            default_leaf_label: "NP-SBJ".to_string(),
            default_leaf_token: "*con*".to_string(),
            default_phrase_label: "XP".to_string(),
            default_split_label: "X".to_string(),
            split_marker: "@".to_string(),
            conjunction_label: "CONJ".to_string(),
            dash_lemmata: false,
            legal_leaf_labels: None,
            legal_phrase_labels: None,
        }
    }
}

impl EditorConfig {
    /// Load config from a directory, falling back to defaults
    pub fn load(fs: &dyn FileSystem, dir: &Path) -> Result<Self, EditorError> {
        let config_path = dir.join(DEFAULT_CONFIG_NAME);

        if fs.exists(&config_path) {
            Self::load_file(fs, &config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from an explicit path; the file must exist
    pub fn load_file(fs: &dyn FileSystem, path: &Path) -> Result<Self, EditorError> {
        let content = fs.read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| EditorError::Config {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    pub fn is_clause(&self, label: &str) -> bool {
        let base = base_of(label);
        self.clause_categories.iter().any(|c| c == base)
    }

    pub fn is_non_container(&self, label: &str) -> bool {
        let base = base_of(label);
        self.non_container_labels.iter().any(|c| c == base)
    }

    pub fn is_trace_token(&self, token: &str) -> bool {
        self.trace_prefixes.iter().any(|p| token.starts_with(p.as_str()))
    }

    /// Legality oracle described by this config
    pub fn oracle(&self) -> Box<dyn LabelOracle> {
        if self.legal_leaf_labels.is_none() && self.legal_phrase_labels.is_none() {
            Box::new(Permissive)
        } else {
            Box::new(BasesAndDashes {
                leaf: self.legal_leaf_labels.clone(),
                phrase: self.legal_phrase_labels.clone(),
            })
        }
    }
}

/// Predicates deciding which labels an annotator may assign
pub trait LabelOracle: fmt::Debug {
    fn is_legal_terminal_label(&self, label: &str) -> bool;
    fn is_legal_phrasal_label(&self, label: &str) -> bool;
}

/// Accepts every label
#[derive(Debug, Clone, Copy, Default)]
pub struct Permissive;

impl LabelOracle for Permissive {
    fn is_legal_terminal_label(&self, _label: &str) -> bool {
        true
    }

    fn is_legal_phrasal_label(&self, _label: &str) -> bool {
        true
    }
}

/// Legal when the base is listed and every dash tag is listed.
/// A numeric coindex is always allowed. An absent list accepts everything.
#[derive(Debug, Clone, Default)]
pub struct BasesAndDashes {
    pub leaf: Option<LegalLabels>,
    pub phrase: Option<LegalLabels>,
}

impl BasesAndDashes {
    fn check(legal: &Option<LegalLabels>, label: &str) -> bool {
        let Some(legal) = legal else {
            return true;
        };
        let parsed = Label::parse(label);
        legal.bases.iter().any(|b| *b == parsed.base)
            && parsed
                .dash_tags
                .iter()
                .all(|t| legal.dash_tags.iter().any(|d| d == t))
    }
}

impl LabelOracle for BasesAndDashes {
    fn is_legal_terminal_label(&self, label: &str) -> bool {
        Self::check(&self.leaf, label)
    }

    fn is_legal_phrasal_label(&self, label: &str) -> bool {
        Self::check(&self.phrase, label)
    }
}

/// Label choices for `cycle_label`
///
/// A plain list cycles through its entries. A map picks the list by the
/// node's base category and falls back to its first entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabelCycle {
    List(Vec<String>),
    ByBase(BTreeMap<String, Vec<String>>),
}

impl LabelCycle {
    /// The label that follows `current`, ignoring its coindex.
    /// `None` when there is nothing to choose from.
    pub fn next_label(&self, current: &str) -> Option<String> {
        let parsed = Label::parse(current);
        let category = parsed.category();

        let list = match self {
            LabelCycle::List(list) => list,
            LabelCycle::ByBase(map) => match map.get(&parsed.base) {
                Some(list) => list,
                None => map.values().next()?,
            },
        };

        let next = match list.iter().position(|l| *l == category) {
            Some(pos) => list.get(pos + 1).or_else(|| list.first()),
            None => list.first(),
        }?;

        let mut label = Label::parse(next);
        label.coindex = parsed.coindex;
        Some(label.to_string())
    }
}
