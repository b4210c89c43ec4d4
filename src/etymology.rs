//! Best-effort extraction of etymology chains from dictionary markup.
//!
//! The parser reads the prose of the first "Etymology" section, splits it
//! into narrative branches on connective phrases, and picks out whitelisted
//! language names followed by a source word. It never fails: markup it does
//! not understand simply yields fewer nodes.

use crate::markup;
use crate::period::start_year;
use crate::reference::{LanguageProfile, RegionDescriptor, language_names_longest_first};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

static ETYMOLOGY_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^Etymology\s*\d*$").expect("valid heading regex"));

static PRIMARY_SPLIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(.*?)(?:reinforced by|later from|also from|influenced by|,?\s*both from)")
        .expect("valid primary regex")
});
static SECONDARY_SPLIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:reinforced by|later from|also from|influenced by)\s+(.*?)(?:,\s*both from|;|$)")
        .expect("valid secondary regex")
});
static SHARED_SPLIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)both from\s+(.*?)(?:\.|;|$)").expect("valid shared regex")
});

static NODE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    let names = language_names_longest_first()
        .into_iter()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(
        r"(?i)(?:\bfrom\s+)?\b({names})\s+([^\s,.;()]+)"
    ))
    .expect("valid node regex")
});

/// Tokens that follow a language name in prose without being a source word.
const CONNECTIVES: &[&str] = &[
    "a", "an", "and", "as", "compare", "cognate", "form", "from", "in", "is", "itself", "of",
    "or", "root", "stem", "term", "the", "to", "ultimately", "via", "with", "word",
];

const QUOTE_CHARS: &[char] = &['*', '"', '\'', '“', '”', '‘', '’'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchKind {
    Primary,
    Secondary,
    Shared,
}

impl BranchKind {
    pub fn label(&self) -> &'static str {
        match self {
            BranchKind::Primary => "Primary path",
            BranchKind::Secondary => "Secondary influence",
            BranchKind::Shared => "Common ancestry",
        }
    }
}

impl fmt::Display for BranchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtymologyNode {
    pub word: String,
    pub language: String,
    pub period: String,
    pub color: String,
    pub region: RegionDescriptor,
    pub branch: BranchKind,
}

impl EtymologyNode {
    fn new(word: String, language: &str, branch: BranchKind) -> Self {
        let profile = LanguageProfile::lookup(language);
        let language = if profile.is_known() {
            profile.name.to_string()
        } else {
            language.to_string()
        };
        Self {
            word,
            language,
            period: profile.period.to_string(),
            color: profile.color.to_string(),
            region: profile.region(),
            branch,
        }
    }

    pub fn start_year(&self) -> i32 {
        start_year(&self.period)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub kind: BranchKind,
    pub label: String,
    pub nodes: Vec<EtymologyNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EtymologyData {
    pub branches: Vec<Branch>,
    pub has_multiple_branches: bool,
}

impl EtymologyData {
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.branches.iter().map(|branch| branch.nodes.len()).sum()
    }
}

/// Parses the etymology chain out of a dictionary page.
pub fn parse_etymology(html: &str) -> EtymologyData {
    match etymology_text(html) {
        Some(text) => parse_etymology_text(&text),
        None => EtymologyData::default(),
    }
}

/// Prose of the first section titled `Etymology` (optionally numbered).
pub fn etymology_text(html: &str) -> Option<String> {
    let section = markup::sections(html).find(|section| ETYMOLOGY_HEADING.is_match(&section.title()))?;
    let text = section
        .paragraphs()
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() { None } else { Some(text) }
}

/// Splits etymology prose into branches and extracts their nodes.
pub fn parse_etymology_text(text: &str) -> EtymologyData {
    let content = markup::collapse_whitespace(text);
    if content.is_empty() {
        return EtymologyData::default();
    }

    let primary = PRIMARY_SPLIT
        .captures(&content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(&content);
    let secondary = SECONDARY_SPLIT
        .captures(&content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or_default();
    let shared = SHARED_SPLIT
        .captures(&content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or_default();

    let branches: Vec<Branch> = [
        (BranchKind::Primary, primary),
        (BranchKind::Secondary, secondary),
        (BranchKind::Shared, shared),
    ]
    .into_iter()
    .filter(|(_, text)| !text.trim().is_empty())
    .map(|(kind, text)| Branch {
        kind,
        label: kind.label().to_string(),
        nodes: extract_nodes(text, kind),
    })
    .filter(|branch| !branch.nodes.is_empty())
    .collect();

    debug!(
        branches = branches.len(),
        nodes = branches.iter().map(|b| b.nodes.len()).sum::<usize>(),
        "parsed etymology text"
    );

    EtymologyData {
        has_multiple_branches: branches.len() > 1,
        branches,
    }
}

/// Nodes for one branch, one per language, newest period first.
pub fn extract_nodes(text: &str, kind: BranchKind) -> Vec<EtymologyNode> {
    let mut seen = HashSet::new();
    let mut nodes = Vec::new();
    for caps in NODE_PATTERN.captures_iter(text) {
        let language = &caps[1];
        let word = caps[2].trim_matches(QUOTE_CHARS).trim();
        if word.is_empty() || is_connective(word) {
            continue;
        }
        let key = language.to_lowercase();
        if seen.contains(&key) {
            continue;
        }
        seen.insert(key);
        nodes.push(EtymologyNode::new(word.to_string(), language, kind));
    }
    nodes.sort_by_key(|node| std::cmp::Reverse(node.start_year()));
    nodes
}

fn is_connective(word: &str) -> bool {
    CONNECTIVES
        .iter()
        .any(|connective| connective.eq_ignore_ascii_case(word))
}
