//! # Node Labels
//!
//! Labels follow the shape `BASE(-DASHTAG)*([-=]N)?`. The trailing numeric
//! suffix is a coindex: `-N` marks an ordinary gap link and `=N` an
//! equivalence link. Labels that begin with a dash (`-LRB-`, `-NONE-`) are
//! opaque and never split.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoindexKind {
    /// `-N`
    Gap,
    /// `=N`
    Equiv,
}

impl CoindexKind {
    pub fn marker(self) -> char {
        match self {
            CoindexKind::Gap => '-',
            CoindexKind::Equiv => '=',
        }
    }

    pub fn from_marker(c: char) -> Option<Self> {
        match c {
            '-' => Some(CoindexKind::Gap),
            '=' => Some(CoindexKind::Equiv),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coindex {
    pub index: u32,
    pub kind: CoindexKind,
}

impl Coindex {
    pub fn new(index: u32, kind: CoindexKind) -> Self {
        Self { index, kind }
    }

    pub fn gap(index: u32) -> Self {
        Self::new(index, CoindexKind::Gap)
    }

    pub fn equiv(index: u32) -> Self {
        Self::new(index, CoindexKind::Equiv)
    }
}

impl fmt::Display for Coindex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.marker(), self.index)
    }
}

/// Split a trailing coindex off a label or trace token.
///
/// `NP-SBJ-2` gives `("NP-SBJ", Some(-2))`, `*T*=1` gives `("*T*", Some(=1))`.
/// The index must be a positive integer without leading zeros, and the
/// marker cannot be the first character.
pub fn split_coindex(text: &str) -> (&str, Option<Coindex>) {
    let Some(pos) = text.rfind(['-', '=']) else {
        return (text, None);
    };
    let digits = &text[pos + 1..];
    if pos == 0
        || digits.is_empty()
        || digits.starts_with('0')
        || !digits.chars().all(|c| c.is_ascii_digit())
    {
        return (text, None);
    }

    let kind = text[pos..].chars().next().and_then(CoindexKind::from_marker);
    match (digits.parse::<u32>(), kind) {
        (Ok(index), Some(kind)) => (&text[..pos], Some(Coindex { index, kind })),
        _ => (text, None),
    }
}

/// Base category of a label, without dash tags or index
pub fn base_of(label: &str) -> &str {
    if label.starts_with('-') {
        return label;
    }
    let (body, _) = split_coindex(label);
    body.split('-').next().unwrap_or(body)
}

/// A parsed node label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub base: String,
    pub dash_tags: Vec<String>,
    pub coindex: Option<Coindex>,
}

impl Label {
    pub fn parse(text: &str) -> Self {
        if text.starts_with('-') {
            return Self {
                base: text.to_string(),
                dash_tags: Vec::new(),
                coindex: None,
            };
        }

        let (body, coindex) = split_coindex(text);
        let mut parts = body.split('-');
        let base = parts.next().unwrap_or_default().to_string();
        let dash_tags = parts.map(str::to_string).collect();

        Self {
            base,
            dash_tags,
            coindex,
        }
    }

    pub fn has_dash_tag(&self, tag: &str) -> bool {
        self.dash_tags.iter().any(|t| t == tag)
    }

    /// Remove `tag` if present, otherwise insert it according to `order`.
    ///
    /// A new tag goes in front of the first existing tag that ranks after it
    /// in `order`. Tags missing from `order` rank last, so unknown tags keep
    /// their place at the end.
    pub fn toggle_dash_tag(&mut self, tag: &str, order: &[String]) {
        if let Some(pos) = self.dash_tags.iter().position(|t| t == tag) {
            self.dash_tags.remove(pos);
            return;
        }

        let rank = |t: &str| order.iter().position(|o| o == t).unwrap_or(usize::MAX);
        let new_rank = rank(tag);
        let insert_at = self
            .dash_tags
            .iter()
            .position(|existing| rank(existing) > new_rank)
            .unwrap_or(self.dash_tags.len());
        self.dash_tags.insert(insert_at, tag.to_string());
    }

    /// Same base and coindex, no dash tags
    pub fn without_dash_tags(&self) -> Self {
        Self {
            base: self.base.clone(),
            dash_tags: Vec::new(),
            coindex: self.coindex,
        }
    }

    /// Label text without the coindex suffix
    pub fn category(&self) -> String {
        let mut out = self.base.clone();
        for tag in &self.dash_tags {
            out.push('-');
            out.push_str(tag);
        }
        out
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.category())?;
        if let Some(coindex) = self.coindex {
            write!(f, "{}", coindex)?;
        }
        Ok(())
    }
}
