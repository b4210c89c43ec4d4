//! World map snapshots keyed by era, and matching of map features against
//! region names.

use crate::error::{ExplorerError, Result};
use crate::lookup::ExplorerConfig;
use crate::period::start_year;
use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_MODERN_MAP_URL: &str =
    "https://raw.githubusercontent.com/datasets/geo-countries/master/data/countries.geojson";
pub const DEFAULT_HISTORICAL_MAP_BASE: &str =
    "https://raw.githubusercontent.com/aourednik/historical-basemaps/master/geojson";

const ZSTD_LEVEL: i32 = 3;

/// The eleven map snapshots, newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapEra {
    Modern,
    Year1279,
    Year1000,
    Year800,
    Year600,
    Year400,
    Year100,
    Bc1,
    Bc500,
    Bc1000,
    Bc2000,
}

/// Lowest year each snapshot covers; anything older uses [`MapEra::Bc2000`].
const ERA_THRESHOLDS: &[(i32, MapEra)] = &[
    (1500, MapEra::Modern),
    (1279, MapEra::Year1279),
    (1000, MapEra::Year1000),
    (800, MapEra::Year800),
    (600, MapEra::Year600),
    (400, MapEra::Year400),
    (100, MapEra::Year100),
    (-1, MapEra::Bc1),
    (-500, MapEra::Bc500),
    (-1000, MapEra::Bc1000),
];

impl MapEra {
    pub const ALL: [MapEra; 11] = [
        MapEra::Modern,
        MapEra::Year1279,
        MapEra::Year1000,
        MapEra::Year800,
        MapEra::Year600,
        MapEra::Year400,
        MapEra::Year100,
        MapEra::Bc1,
        MapEra::Bc500,
        MapEra::Bc1000,
        MapEra::Bc2000,
    ];

    pub fn for_year(year: i32) -> MapEra {
        ERA_THRESHOLDS
            .iter()
            .find(|(threshold, _)| year >= *threshold)
            .map(|(_, era)| *era)
            .unwrap_or(MapEra::Bc2000)
    }

    pub fn for_period(period: &str) -> MapEra {
        Self::for_year(start_year(period))
    }

    /// Identifier used by the historical-basemaps file names.
    pub fn slug(&self) -> &'static str {
        match self {
            MapEra::Modern => "modern",
            MapEra::Year1279 => "1279",
            MapEra::Year1000 => "1000",
            MapEra::Year800 => "800",
            MapEra::Year600 => "600",
            MapEra::Year400 => "400",
            MapEra::Year100 => "100",
            MapEra::Bc1 => "bc1",
            MapEra::Bc500 => "bc500",
            MapEra::Bc1000 => "bc1000",
            MapEra::Bc2000 => "bc2000",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MapEra::Modern => "Modern borders",
            MapEra::Year1279 => "World in 1279 AD",
            MapEra::Year1000 => "World in 1000 AD",
            MapEra::Year800 => "World in 800 AD",
            MapEra::Year600 => "World in 600 AD",
            MapEra::Year400 => "World in 400 AD",
            MapEra::Year100 => "World in 100 AD",
            MapEra::Bc1 => "World in 1 BC",
            MapEra::Bc500 => "World in 500 BC",
            MapEra::Bc1000 => "World in 1000 BC",
            MapEra::Bc2000 => "World in 2000 BC",
        }
    }

    pub fn is_modern(&self) -> bool {
        matches!(self, MapEra::Modern)
    }
}

impl fmt::Display for MapEra {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub coordinates: Value,
}

impl FeatureCollection {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl Feature {
    /// Display name from the usual GeoJSON name properties.
    pub fn name(&self) -> &str {
        let Some(properties) = &self.properties else {
            return "";
        };
        ["ADMIN", "name", "NAME"]
            .iter()
            .find_map(|key| properties.get(*key).and_then(Value::as_str))
            .unwrap_or("")
    }

    /// Lowercased values of every string property.
    pub fn string_properties(&self) -> Vec<String> {
        self.properties
            .iter()
            .flat_map(|properties| properties.values())
            .filter_map(Value::as_str)
            .map(str::to_lowercase)
            .collect()
    }
}

static SYNONYMS: &[(&str, &[&str])] = &[
    ("england", &["britannia", "great britain", "anglo-saxon"]),
    ("united kingdom", &["great britain", "britannia", "england"]),
    ("france", &["frankish", "francia", "franks"]),
    ("gaul", &["gallia", "gauls"]),
    ("germany", &["germania", "german"]),
    ("italy", &["italia"]),
    ("rome", &["roman"]),
    ("greece", &["hellas", "hellenic", "greek"]),
    ("persia", &["iran", "persian"]),
    ("iran", &["persia", "persian"]),
    ("ireland", &["hibernia", "irish"]),
    ("india", &["indian", "bharat"]),
    ("saudi arabia", &["arabia", "hejaz"]),
    ("arabia", &["arab", "hejaz"]),
    ("netherlands", &["holland", "frisia"]),
    ("ukraine", &["kievan rus", "scythia"]),
    ("spain", &["hispania", "iberia"]),
    ("portugal", &["lusitania"]),
    ("romania", &["dacia"]),
    ("denmark", &["danes", "danish"]),
    ("norway", &["norse", "norwegian"]),
    ("sweden", &["swedes", "svear"]),
];

/// The name plus its synonyms, lowercased.
pub fn name_variants(name: &str) -> Vec<String> {
    let key = name.trim().to_lowercase();
    let mut variants = vec![key.clone()];
    if let Some((_, synonyms)) = SYNONYMS.iter().find(|(name, _)| *name == key) {
        variants.extend(synonyms.iter().map(|s| s.to_string()));
    }
    variants
}

/// True when any string property of the feature contains one of `names`
/// or one of their synonyms as whole words.
pub fn feature_matches(feature: &Feature, names: &[String]) -> bool {
    let properties = feature.string_properties();
    if properties.is_empty() {
        return false;
    }
    names
        .iter()
        .filter(|name| !name.trim().is_empty())
        .flat_map(|name| name_variants(name))
        .any(|variant| properties.iter().any(|value| contains_words(value, &variant)))
}

/// `needle` occurs in `haystack` with no letter or digit on either side.
fn contains_words(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// Supplies parsed snapshots.
#[async_trait]
pub trait MapSource: Send + Sync {
    async fn fetch_snapshot(&self, era: MapEra) -> Result<Arc<FeatureCollection>>;
}

/// A snapshot plus what was asked for.
#[derive(Debug, Clone)]
pub struct LoadedMap {
    pub requested: MapEra,
    pub era: MapEra,
    pub collection: Arc<FeatureCollection>,
}

impl LoadedMap {
    pub fn fell_back(&self) -> bool {
        self.requested != self.era
    }
}

/// Loads the snapshot for `era`, falling back to the modern map when a
/// historical one cannot be loaded.
pub async fn load_map(source: &dyn MapSource, era: MapEra) -> Result<LoadedMap> {
    match source.fetch_snapshot(era).await {
        Ok(collection) => Ok(LoadedMap {
            requested: era,
            era,
            collection,
        }),
        Err(err) if !era.is_modern() => {
            warn!(%era, error = %err, "map snapshot unavailable, using modern map");
            let collection = source.fetch_snapshot(MapEra::Modern).await?;
            Ok(LoadedMap {
                requested: era,
                era: MapEra::Modern,
                collection,
            })
        }
        Err(err) => Err(err),
    }
}

/// Fetches snapshots over HTTP, keeping parsed copies in memory and
/// compressed copies on disk.
pub struct HttpMapSource {
    client: Client,
    modern_url: String,
    historical_base: String,
    memory: Mutex<LruCache<MapEra, Arc<FeatureCollection>>>,
    disk: Option<PathBuf>,
}

impl HttpMapSource {
    pub fn new(config: &ExplorerConfig) -> Result<Self> {
        Ok(Self::with_client(config.http_client()?, config))
    }

    pub fn with_client(client: Client, config: &ExplorerConfig) -> Self {
        let capacity = NonZeroUsize::new(config.snapshot_cache_capacity.max(1))
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            client,
            modern_url: config.modern_map_url.clone(),
            historical_base: config.historical_map_base.trim_end_matches('/').to_string(),
            memory: Mutex::new(LruCache::new(capacity)),
            disk: config.cache_dir.clone(),
        }
    }

    pub fn snapshot_url(&self, era: MapEra) -> String {
        match era {
            MapEra::Modern => self.modern_url.clone(),
            other => format!("{}/world_{}.geojson", self.historical_base, other.slug()),
        }
    }

    async fn download(&self, era: MapEra) -> Result<Vec<u8>> {
        let url = self.snapshot_url(era);
        info!(%era, %url, "downloading map snapshot");
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExplorerError::MapUnavailable {
                era,
                reason: format!("HTTP {status}"),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl MapSource for HttpMapSource {
    async fn fetch_snapshot(&self, era: MapEra) -> Result<Arc<FeatureCollection>> {
        let hit = self.memory.lock().get(&era).cloned();
        if let Some(hit) = hit {
            debug!(%era, "map snapshot served from memory");
            return Ok(hit);
        }

        let disk_path = self.disk.as_deref().map(|dir| disk_cache_path(dir, era));
        if let Some(path) = &disk_path {
            if let Some(bytes) = read_disk_cache(path.clone()).await {
                match parse_snapshot(era, bytes).await {
                    Ok(collection) => {
                        debug!(%era, "map snapshot served from disk");
                        return Ok(self.remember(era, collection));
                    }
                    Err(err) => {
                        warn!(%era, error = %err, "discarding unreadable cached map snapshot");
                        remove_disk_cache(path).await;
                    }
                }
            }
        }

        let bytes = self.download(era).await?;
        let keep = disk_path.as_ref().map(|_| bytes.clone());
        let collection = parse_snapshot(era, bytes).await?;
        if let (Some(path), Some(bytes)) = (disk_path, keep) {
            write_disk_cache(path, bytes).await;
        }
        Ok(self.remember(era, collection))
    }
}

impl HttpMapSource {
    fn remember(&self, era: MapEra, collection: FeatureCollection) -> Arc<FeatureCollection> {
        let collection = Arc::new(collection);
        self.memory.lock().put(era, collection.clone());
        collection
    }
}

async fn parse_snapshot(era: MapEra, bytes: Vec<u8>) -> Result<FeatureCollection> {
    tokio::task::spawn_blocking(move || FeatureCollection::from_slice(&bytes))
        .await
        .map_err(|err| ExplorerError::MapUnavailable {
            era,
            reason: err.to_string(),
        })?
}

fn disk_cache_path(dir: &Path, era: MapEra) -> PathBuf {
    dir.join(format!("{}.geojson.zst", era.slug()))
}

async fn read_disk_cache(path: PathBuf) -> Option<Vec<u8>> {
    let task = tokio::task::spawn_blocking(move || -> std::io::Result<Vec<u8>> {
        let compressed = std::fs::read(&path)?;
        zstd::decode_all(compressed.as_slice())
    });
    match task.await {
        Ok(Ok(bytes)) => Some(bytes),
        Ok(Err(err)) if err.kind() == std::io::ErrorKind::NotFound => None,
        Ok(Err(err)) => {
            warn!(error = %err, "failed to read cached map snapshot");
            None
        }
        Err(err) => {
            warn!(error = %err, "map cache reader panicked");
            None
        }
    }
}

async fn remove_disk_cache(path: &Path) {
    if let Err(err) = tokio::fs::remove_file(path).await {
        if err.kind() != std::io::ErrorKind::NotFound {
            warn!(error = %err, "failed to remove cached map snapshot");
        }
    }
}

async fn write_disk_cache(path: PathBuf, bytes: Vec<u8>) {
    let task = tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let compressed = zstd::encode_all(bytes.as_slice(), ZSTD_LEVEL)?;
        std::fs::write(&path, compressed)
    });
    match task.await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => warn!(error = %err, "failed to write map snapshot cache"),
        Err(err) => warn!(error = %err, "map cache writer panicked"),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::reference::LanguageProfile;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    pub(crate) fn sample_collection() -> FeatureCollection {
        serde_json::from_value(sample_geojson()).unwrap()
    }

    fn sample_geojson() -> Value {
        json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": { "ADMIN": "United Kingdom", "ISO_A3": "GBR" },
                    "geometry": { "type": "Polygon", "coordinates": [[[-5.0, 50.0], [1.0, 50.0], [1.0, 58.0], [-5.0, 58.0], [-5.0, 50.0]]] }
                },
                {
                    "type": "Feature",
                    "properties": { "ADMIN": "Germany", "ISO_A3": "DEU" },
                    "geometry": { "type": "MultiPolygon", "coordinates": [[[[6.0, 47.0], [15.0, 47.0], [15.0, 55.0], [6.0, 47.0]]]] }
                },
                {
                    "type": "Feature",
                    "properties": null,
                    "geometry": null
                }
            ]
        })
    }

    /// Serves the sample collection for the eras it is given.
    pub(crate) struct StubMaps {
        pub(crate) available: Vec<MapEra>,
    }

    #[async_trait]
    impl MapSource for StubMaps {
        async fn fetch_snapshot(&self, era: MapEra) -> Result<Arc<FeatureCollection>> {
            if self.available.contains(&era) {
                Ok(Arc::new(sample_collection()))
            } else {
                Err(ExplorerError::MapUnavailable {
                    era,
                    reason: "offline".to_string(),
                })
            }
        }
    }

    #[test]
    fn era_thresholds() {
        assert_eq!(MapEra::for_year(1500), MapEra::Modern);
        assert_eq!(MapEra::for_year(2024), MapEra::Modern);
        assert_eq!(MapEra::for_year(1499), MapEra::Year1279);
        assert_eq!(MapEra::for_year(1150), MapEra::Year1000);
        assert_eq!(MapEra::for_year(842), MapEra::Year800);
        assert_eq!(MapEra::for_year(450), MapEra::Year400);
        assert_eq!(MapEra::for_year(0), MapEra::Bc1);
        assert_eq!(MapEra::for_year(-500), MapEra::Bc500);
        assert_eq!(MapEra::for_year(-800), MapEra::Bc1000);
        assert_eq!(MapEra::for_year(-4500), MapEra::Bc2000);
        assert_eq!(MapEra::for_period("Modern English (1500-present)"), MapEra::Modern);
        assert_eq!(MapEra::ALL.len(), 11);
    }

    #[test]
    fn synonyms_extend_matching() {
        let feature: Feature = serde_json::from_value(json!({
            "properties": { "NAME": "Britannia", "SUBJECTO": "Roman Empire", "BORDERPRECISION": 1 },
            "geometry": null
        }))
        .unwrap();
        assert!(feature_matches(&feature, &["England".to_string()]));
        assert!(feature_matches(&feature, &["Roman Empire".to_string()]));
        assert!(!feature_matches(&feature, &["France".to_string()]));
        assert!(!feature_matches(&feature, &[String::new()]));
    }

    fn named_feature(name: &str) -> Feature {
        serde_json::from_value(json!({
            "properties": { "ADMIN": name },
            "geometry": null
        }))
        .unwrap()
    }

    #[test]
    fn synonyms_match_whole_words_only() {
        assert!(!feature_matches(&named_feature("Romania"), &["Rome".to_string()]));
        assert!(feature_matches(&named_feature("Roman Empire"), &["Rome".to_string()]));
        assert!(!feature_matches(&named_feature("Germanic tribes"), &["Germany".to_string()]));
        assert!(feature_matches(&named_feature("Kingdom of England"), &["England".to_string()]));
    }

    #[test]
    fn modern_map_uses_countries_only() {
        let latin = LanguageProfile::lookup("Latin").region();
        let romania = named_feature("Romania");
        assert!(!feature_matches(&romania, &latin.match_names(MapEra::Modern)));
        assert!(feature_matches(&named_feature("Italy"), &latin.match_names(MapEra::Modern)));
        assert!(feature_matches(
            &named_feature("Roman Empire"),
            &latin.match_names(MapEra::Year100)
        ));

        let arabic = LanguageProfile::lookup("Arabic").region();
        let emirates = named_feature("United Arab Emirates");
        assert!(!feature_matches(&emirates, &arabic.match_names(MapEra::Modern)));
        assert!(feature_matches(&named_feature("Saudi Arabia"), &arabic.match_names(MapEra::Modern)));
    }

    #[test]
    fn feature_names_prefer_admin() {
        let collection = sample_collection();
        assert_eq!(collection.features[0].name(), "United Kingdom");
        assert_eq!(collection.features[2].name(), "");
        assert!(!feature_matches(&collection.features[2], &["Germany".to_string()]));
    }

    #[tokio::test]
    async fn failed_historical_snapshot_falls_back_to_modern() {
        let maps = StubMaps {
            available: vec![MapEra::Modern],
        };
        let loaded = load_map(&maps, MapEra::Year800).await.unwrap();
        assert_eq!(loaded.requested, MapEra::Year800);
        assert_eq!(loaded.era, MapEra::Modern);
        assert!(loaded.fell_back());
        assert_eq!(loaded.collection.features.len(), 3);
    }

    #[tokio::test]
    async fn failed_modern_snapshot_is_an_error() {
        let maps = StubMaps {
            available: Vec::new(),
        };
        assert!(load_map(&maps, MapEra::Modern).await.is_err());
        assert!(load_map(&maps, MapEra::Bc500).await.is_err());
    }

    /// Answers every request on a local port with `body`.
    async fn serve_body(body: String) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let body = body.clone();
                tokio::spawn(async move {
                    let mut request = [0u8; 4096];
                    let _ = socket.read(&mut request).await;
                    let response = format!(
                        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        format!("http://{addr}/countries.geojson")
    }

    fn local_source(modern_url: String, cache_dir: &Path) -> HttpMapSource {
        let config = ExplorerConfig {
            modern_map_url: modern_url,
            cache_dir: Some(cache_dir.to_path_buf()),
            ..ExplorerConfig::default()
        };
        let client = Client::builder().no_proxy().build().unwrap();
        HttpMapSource::with_client(client, &config)
    }

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("etymology-maps-{tag}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[tokio::test]
    async fn invalid_download_is_not_cached() {
        let dir = scratch_dir("invalid-download");
        let cached = disk_cache_path(&dir, MapEra::Modern);

        let outage = serve_body("<html>temporarily unavailable</html>".to_string()).await;
        let err = local_source(outage, &dir)
            .fetch_snapshot(MapEra::Modern)
            .await
            .unwrap_err();
        assert!(matches!(err, ExplorerError::GeoJson(_)));
        assert!(!cached.exists());

        let healthy = serve_body(sample_geojson().to_string()).await;
        let collection = local_source(healthy, &dir)
            .fetch_snapshot(MapEra::Modern)
            .await
            .unwrap();
        assert_eq!(collection.features.len(), 3);
        assert!(cached.exists());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn unreadable_cache_entry_is_downloaded_again() {
        let dir = scratch_dir("unreadable-cache");
        std::fs::create_dir_all(&dir).unwrap();
        let cached = disk_cache_path(&dir, MapEra::Modern);
        let junk = zstd::encode_all(&b"<html>rate limited</html>"[..], ZSTD_LEVEL).unwrap();
        std::fs::write(&cached, junk).unwrap();

        let healthy = serve_body(sample_geojson().to_string()).await;
        let collection = local_source(healthy, &dir)
            .fetch_snapshot(MapEra::Modern)
            .await
            .unwrap();
        assert_eq!(collection.features.len(), 3);

        let stored = zstd::decode_all(std::fs::read(&cached).unwrap().as_slice()).unwrap();
        assert_eq!(FeatureCollection::from_slice(&stored).unwrap().features.len(), 3);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn snapshot_urls() {
        let source = HttpMapSource::new(&ExplorerConfig::default()).unwrap();
        assert_eq!(source.snapshot_url(MapEra::Modern), DEFAULT_MODERN_MAP_URL);
        assert_eq!(
            source.snapshot_url(MapEra::Bc500),
            format!("{DEFAULT_HISTORICAL_MAP_BASE}/world_bc500.geojson")
        );
    }

    #[tokio::test]
    async fn disk_cache_round_trips_compressed_bytes() {
        let dir = std::env::temp_dir().join(format!("etymology-explorer-{}", std::process::id()));
        let path = disk_cache_path(&dir, MapEra::Year400);
        write_disk_cache(path.clone(), b"{\"features\":[]}".to_vec()).await;
        let bytes = read_disk_cache(path).await.unwrap();
        assert_eq!(FeatureCollection::from_slice(&bytes).unwrap().features.len(), 0);
        let _ = std::fs::remove_dir_all(dir);
    }
}
