use crate::atlas::MapEra;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExplorerError>;

#[derive(Debug, Error)]
pub enum ExplorerError {
    #[error("search term is empty")]
    EmptyQuery,

    #[error("word {0:?} not found on Wiktionary")]
    NotFound(String),

    #[error("dictionary request for {word:?} failed with status {status}")]
    Status { word: String, status: u16 },

    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("map snapshot {era} unavailable: {reason}")]
    MapUnavailable { era: MapEra, reason: String },

    #[error("invalid GeoJSON: {0}")]
    GeoJson(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid node reference {0:?} (expected `branch.node`)")]
    InvalidNode(String),
}

impl ExplorerError {
    /// Text shown to the user in place of a result.
    pub fn user_message(&self) -> String {
        match self {
            ExplorerError::NotFound(word) | ExplorerError::Status { word, .. } => {
                format!("Word \"{word}\" not found on Wiktionary. Try another word!")
            }
            ExplorerError::Http(_) => {
                "Error connecting to Wiktionary. Please try again.".to_string()
            }
            ExplorerError::EmptyQuery => "Enter a word to search for.".to_string(),
            other => other.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ExplorerError::NotFound(_) | ExplorerError::Status { .. }
        )
    }
}
