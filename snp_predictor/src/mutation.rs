//! Protein-change notation parsing (`p.Arg175His`).
//!
//! Free-text VCF INFO fields carry the bare token, the curated clinical
//! database wraps it in parentheses (`NM_000546.6(TP53):c.524G>A (p.Arg175His)`).
//! Both forms go through the same pattern so training and serving can never
//! disagree about what a residue code or a position is.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static BARE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"p\.([A-Z][a-z]{2})(\d+)([A-Z][a-z]{2})").expect("valid protein-change pattern")
});

static WRAPPED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(p\.([A-Z][a-z]{2})(\d+)([A-Z][a-z]{2})\)").expect("valid protein-change pattern")
});

/// Whether the notation has to appear inside parentheses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Wrapping {
    /// `p.Arg175His` anywhere in the text, wrapped or not
    #[default]
    Optional,
    /// only `(p.Arg175His)`
    Required,
}

impl Wrapping {
    fn pattern(self) -> &'static Regex {
        match self {
            Wrapping::Optional => &BARE_RE,
            Wrapping::Required => &WRAPPED_RE,
        }
    }
}

/// A single amino-acid substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationNotation {
    pub original: String,
    /// 1-based residue position
    pub position: u32,
    pub new: String,
}

impl fmt::Display for MutationNotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p.{}{}{}", self.original, self.position, self.new)
    }
}

/// Extract the first substitution from `text`.
///
/// Residue codes are not checked against the amino-acid table here; that is
/// the feature extractor's job. Position 0, or one that does not fit a `u32`,
/// yields `None`.
pub fn parse(text: &str, wrapping: Wrapping) -> Option<MutationNotation> {
    let caps = wrapping.pattern().captures(text)?;
    let position: u32 = caps[2].parse().ok()?;
    if position == 0 {
        return None;
    }
    Some(MutationNotation {
        original: caps[1].to_string(),
        position,
        new: caps[3].to_string(),
    })
}
