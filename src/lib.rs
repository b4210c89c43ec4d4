pub mod atlas;
pub mod error;
pub mod etymology;
pub mod lookup;
pub mod markup;
pub mod period;
pub mod reference;
pub mod render;
#[cfg(feature = "web")]
pub mod web;

pub use atlas::{HttpMapSource, LoadedMap, MapEra, MapSource, load_map};
pub use error::{ExplorerError, Result};
pub use etymology::{Branch, BranchKind, EtymologyData, EtymologyNode, parse_etymology};
pub use lookup::{
    DictionarySource, Explorer, ExplorerConfig, Highlight, NodeRef, WiktionaryClient, WordEntry,
};
pub use period::start_year;
pub use reference::{LanguageProfile, RegionDescriptor};
pub use render::{RenderedMap, render_map};

use serde::Serialize;

/// The map for one selection of a word entry.
#[derive(Debug, Clone, Serialize)]
pub struct MapView {
    pub requested_era: MapEra,
    pub era: MapEra,
    pub fell_back: bool,
    pub highlight: Highlight,
    pub rendered: RenderedMap,
}

impl MapView {
    pub fn caption(&self) -> String {
        if self.fell_back {
            format!(
                "{} (historical map for {} unavailable)",
                self.era.label(),
                self.requested_era.label().trim_start_matches("World in ")
            )
        } else {
            self.era.label().to_string()
        }
    }
}

/// Picks the snapshot for the selected node's period and highlights its
/// region; with no selection the word's own region is shown.
pub async fn map_for_selection(
    maps: &dyn MapSource,
    entry: &WordEntry,
    selection: Option<NodeRef>,
) -> Result<MapView> {
    let requested = MapEra::for_period(entry.period_for(selection));
    let loaded = load_map(maps, requested).await?;
    let highlight = entry.highlight(selection, loaded.era);
    let collection = loaded.collection.clone();
    let paint = highlight.clone();
    let rendered = tokio::task::spawn_blocking(move || render_map(&collection, &paint))
        .await
        .map_err(|err| ExplorerError::MapUnavailable {
            era: loaded.era,
            reason: err.to_string(),
        })?;
    Ok(MapView {
        requested_era: loaded.requested,
        era: loaded.era,
        fell_back: loaded.fell_back(),
        highlight,
        rendered,
    })
}
