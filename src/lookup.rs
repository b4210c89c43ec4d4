//! Search controller: fetch a dictionary page and assemble a [`WordEntry`].

use crate::atlas::MapEra;
use crate::error::{ExplorerError, Result};
use crate::etymology::{EtymologyData, EtymologyNode, parse_etymology};
use crate::markup;
use crate::reference::{MODERN_ENGLISH_COLOR, RegionDescriptor};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_DICTIONARY_URL: &str = "https://en.wiktionary.org/api/rest_v1/page/html";
pub const DEFAULT_USER_AGENT: &str = concat!(
    "etymology-explorer/",
    env!("CARGO_PKG_VERSION"),
    " (etymology lookup tool)"
);
pub const DEFINITION_UNAVAILABLE: &str = "Definition not available";
pub const MODERN_PERIOD: &str = "Modern English (1500-present)";

const DEFINITION_MIN_CHARS: usize = 20;
const DEFINITION_MAX_CHARS: usize = 300;
const DEFINITION_EXCLUDES: &[&str] = &["IPA", "vowel", "pronunciation", "Rhymes"];

const TITLE_ENCODE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

static ORDERED_LIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<ol\b[^>]*>(.*?)</ol\s*>").expect("valid list regex"));
static LIST_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<li\b[^>]*>(.*?)</li\s*>").expect("valid item regex"));
static NESTED_LIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<(?:ul|ol|dl)\b").expect("valid nested list regex"));
static NON_DEFINITION_SECTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:Etymology|Pronunciation)\b").expect("valid section regex")
});

#[derive(Debug, Clone)]
pub struct ExplorerConfig {
    pub dictionary_url: String,
    pub modern_map_url: String,
    pub historical_map_base: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub snapshot_cache_capacity: usize,
    pub cache_dir: Option<std::path::PathBuf>,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            dictionary_url: DEFAULT_DICTIONARY_URL.to_string(),
            modern_map_url: crate::atlas::DEFAULT_MODERN_MAP_URL.to_string(),
            historical_map_base: crate::atlas::DEFAULT_HISTORICAL_MAP_BASE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 20,
            snapshot_cache_capacity: 4,
            cache_dir: None,
        }
    }
}

impl ExplorerConfig {
    pub fn http_client(&self) -> Result<Client> {
        Ok(Client::builder()
            .user_agent(self.user_agent.clone())
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()?)
    }
}

/// Where dictionary pages come from.
#[async_trait]
pub trait DictionarySource: Send + Sync {
    async fn fetch_page(&self, word: &str) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct WiktionaryClient {
    client: Client,
    base_url: String,
}

impl WiktionaryClient {
    pub fn new(config: &ExplorerConfig) -> Result<Self> {
        Ok(Self {
            client: config.http_client()?,
            base_url: config.dictionary_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn page_url(&self, word: &str) -> String {
        format!(
            "{}/{}",
            self.base_url,
            utf8_percent_encode(word, TITLE_ENCODE)
        )
    }
}

#[async_trait]
impl DictionarySource for WiktionaryClient {
    async fn fetch_page(&self, word: &str) -> Result<String> {
        let url = self.page_url(word);
        info!(%url, "fetching dictionary page");
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ExplorerError::NotFound(word.to_string()));
        }
        if !status.is_success() {
            return Err(ExplorerError::Status {
                word: word.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}

/// A searched word and its etymology chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordEntry {
    pub word: String,
    pub language: String,
    pub meaning: String,
    pub period: String,
    pub color: String,
    pub region: RegionDescriptor,
    pub etymology: EtymologyData,
}

impl WordEntry {
    pub fn from_page(word: &str, html: &str) -> Self {
        Self {
            word: word.to_string(),
            language: "English".to_string(),
            meaning: extract_definition(html),
            period: MODERN_PERIOD.to_string(),
            color: MODERN_ENGLISH_COLOR.to_string(),
            region: RegionDescriptor {
                label: "Spoken in".to_string(),
                name: "English-speaking countries".to_string(),
                countries: vec!["United Kingdom".to_string()],
                polities: vec!["England".to_string()],
            },
            etymology: parse_etymology(html),
        }
    }

    pub fn node(&self, node: NodeRef) -> Option<&EtymologyNode> {
        self.etymology
            .branches
            .get(node.branch)?
            .nodes
            .get(node.node)
    }

    /// Period the map should depict for a selection.
    pub fn period_for(&self, selection: Option<NodeRef>) -> &str {
        selection
            .and_then(|node| self.node(node))
            .map(|node| node.period.as_str())
            .unwrap_or(&self.period)
    }

    /// Color and names to highlight for a selection on a map of `era`; the
    /// word itself when nothing (or nothing valid) is selected.
    pub fn highlight(&self, selection: Option<NodeRef>, era: MapEra) -> Highlight {
        match selection.and_then(|node| self.node(node)) {
            Some(node) => Highlight {
                color: node.color.clone(),
                names: node.region.match_names(era),
            },
            None => Highlight {
                color: self.color.clone(),
                names: self.region.match_names(era),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Highlight {
    pub color: String,
    pub names: Vec<String>,
}

/// Address of a node inside a [`WordEntry`], written `branch.node`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeRef {
    pub branch: usize,
    pub node: usize,
}

impl NodeRef {
    pub fn new(branch: usize, node: usize) -> Self {
        Self { branch, node }
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.branch, self.node)
    }
}

impl FromStr for NodeRef {
    type Err = ExplorerError;

    fn from_str(value: &str) -> Result<Self> {
        let invalid = || ExplorerError::InvalidNode(value.to_string());
        let (branch, node) = value.trim().split_once('.').ok_or_else(invalid)?;
        Ok(Self {
            branch: branch.parse().map_err(|_| invalid())?,
            node: node.parse().map_err(|_| invalid())?,
        })
    }
}

/// Picks a short definition from a dictionary page.
///
/// Definition list items outside the etymology and pronunciation sections
/// are tried first, then every paragraph of the page.
pub fn extract_definition(html: &str) -> String {
    let mut candidates = Vec::new();
    for section in markup::sections(html) {
        if NON_DEFINITION_SECTION.is_match(&section.title()) {
            continue;
        }
        candidates.extend(definition_items(section.body_html));
    }
    candidates.extend(markup::paragraphs(html));
    candidates
        .into_iter()
        .find(|text| is_definition_like(text))
        .unwrap_or_else(|| DEFINITION_UNAVAILABLE.to_string())
}

fn definition_items(html: &str) -> Vec<String> {
    ORDERED_LIST
        .captures_iter(html)
        .flat_map(|list| {
            LIST_ITEM
                .captures_iter(list.get(1).map(|m| m.as_str()).unwrap_or_default())
                .map(|item| {
                    let body = item.get(1).map(|m| m.as_str()).unwrap_or_default();
                    let own = NESTED_LIST
                        .find(body)
                        .map(|m| &body[..m.start()])
                        .unwrap_or(body);
                    markup::text_content(own)
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

fn is_definition_like(text: &str) -> bool {
    let text = text.trim();
    let length = text.chars().count();
    !text.is_empty()
        && !DEFINITION_EXCLUDES.iter().any(|marker| text.contains(marker))
        && length > DEFINITION_MIN_CHARS
        && length < DEFINITION_MAX_CHARS
}

/// One search per call; nothing is shared between searches.
#[derive(Clone)]
pub struct Explorer {
    dictionary: Arc<dyn DictionarySource>,
}

impl Explorer {
    pub fn new(dictionary: Arc<dyn DictionarySource>) -> Self {
        Self { dictionary }
    }

    pub fn from_config(config: &ExplorerConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(WiktionaryClient::new(config)?)))
    }

    pub async fn search(&self, term: &str) -> Result<WordEntry> {
        let term = term.trim();
        if term.is_empty() {
            return Err(ExplorerError::EmptyQuery);
        }
        let html = match self.dictionary.fetch_page(term).await {
            Ok(html) => html,
            Err(err) => {
                warn!(word = term, error = %err, "dictionary lookup failed");
                return Err(err);
            }
        };
        let entry = WordEntry::from_page(term, &html);
        info!(
            word = term,
            branches = entry.etymology.branches.len(),
            nodes = entry.etymology.node_count(),
            "assembled word entry"
        );
        Ok(entry)
    }
}
