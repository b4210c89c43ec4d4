//! Static reference data for the languages the etymology parser recognizes.

use crate::atlas::MapEra;
use crate::period::UNKNOWN_PERIOD;
use once_cell::sync::Lazy;
use rapidfuzz::fuzz;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const DEFAULT_COLOR: &str = "#666";
pub const MODERN_ENGLISH_COLOR: &str = "#6b8e23";

/// Where a language was spoken, as shown next to a node and used for map
/// highlighting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionDescriptor {
    pub label: String,
    pub name: String,
    /// Present-day countries used on the modern map.
    pub countries: Vec<String>,
    /// Historical polities used on era snapshots.
    pub polities: Vec<String>,
}

impl RegionDescriptor {
    pub fn unknown() -> Self {
        Self {
            label: "Region".to_string(),
            name: "Unknown".to_string(),
            countries: vec!["Unknown".to_string()],
            polities: Vec::new(),
        }
    }

    /// Names to look for on a map of `era`. Polities only exist on the
    /// historical snapshots, so the modern map gets countries alone.
    pub fn match_names(&self, era: MapEra) -> Vec<String> {
        let mut names = self.countries.clone();
        if era.is_modern() {
            return names;
        }
        for polity in &self.polities {
            if !names.iter().any(|name| name.eq_ignore_ascii_case(polity)) {
                names.push(polity.clone());
            }
        }
        names
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LanguageProfile {
    pub name: &'static str,
    pub color: &'static str,
    pub period: &'static str,
    pub region_label: &'static str,
    pub region_name: &'static str,
    pub countries: &'static [&'static str],
    pub polities: &'static [&'static str],
}

const UNKNOWN_PROFILE: LanguageProfile = LanguageProfile {
    name: "Unknown",
    color: DEFAULT_COLOR,
    period: UNKNOWN_PERIOD,
    region_label: "Region",
    region_name: "Unknown",
    countries: &["Unknown"],
    polities: &[],
};

const HISTORICALLY: &str = "Historically spoken in";
const HYPOTHESIZED: &str = "Hypothesized region";

static PROFILES: &[LanguageProfile] = &[
    LanguageProfile {
        name: "Old English",
        color: "#8b7355",
        period: "450-1150 AD",
        region_label: HISTORICALLY,
        region_name: "Anglo-Saxon England",
        countries: &["United Kingdom"],
        polities: &["England", "Anglo-Saxons", "Wessex", "Mercia", "Northumbria"],
    },
    LanguageProfile {
        name: "Middle English",
        color: "#9b8365",
        period: "1150-1500 AD",
        region_label: HISTORICALLY,
        region_name: "Medieval England",
        countries: &["United Kingdom"],
        polities: &["England"],
    },
    LanguageProfile {
        name: "Proto-Germanic",
        color: "#6b8e23",
        period: "500 BC-500 AD",
        region_label: HYPOTHESIZED,
        region_name: "Northern Europe (approximate)",
        countries: &["Germany", "Denmark", "Netherlands", "Norway", "Sweden"],
        polities: &["Germanic", "Germania", "Scandinavia"],
    },
    LanguageProfile {
        name: "Proto-West Germanic",
        color: "#7b9e33",
        period: "100-500 AD",
        region_label: HYPOTHESIZED,
        region_name: "Western Germanic territories",
        countries: &["Germany", "Netherlands", "Belgium"],
        polities: &["Germanic", "Germania", "Saxons", "Frisians"],
    },
    LanguageProfile {
        name: "Proto-Indo-European",
        color: "#8b6914",
        period: "4500-2500 BC",
        region_label: "Hypothesized homeland",
        region_name: "Pontic-Caspian Steppe (one theory)",
        countries: &["Ukraine"],
        polities: &["Yamnaya", "Steppe", "Scythia"],
    },
    LanguageProfile {
        name: "Latin",
        color: "#9370db",
        period: "75 BC-500 AD",
        region_label: HISTORICALLY,
        region_name: "Ancient Rome and Roman Empire",
        countries: &["Italy"],
        polities: &["Roman Empire", "Roman Republic", "Rome"],
    },
    LanguageProfile {
        name: "Classical Latin",
        color: "#8360cb",
        period: "75 BC-200 AD",
        region_label: HISTORICALLY,
        region_name: "Roman Republic and Empire",
        countries: &["Italy"],
        polities: &["Roman Empire", "Roman Republic", "Rome"],
    },
    LanguageProfile {
        name: "Vulgar Latin",
        color: "#a380eb",
        period: "200-900 AD",
        region_label: HISTORICALLY,
        region_name: "Roman Empire territories",
        countries: &["Italy", "France", "Spain", "Portugal", "Romania"],
        polities: &["Roman Empire", "Western Roman Empire", "Rome"],
    },
    LanguageProfile {
        name: "Old French",
        color: "#4169e1",
        period: "842-1400 AD",
        region_label: HISTORICALLY,
        region_name: "Medieval France",
        countries: &["France"],
        polities: &["France", "Frankish", "Francia"],
    },
    LanguageProfile {
        name: "Anglo-Norman",
        color: "#6a5acd",
        period: "1066-1400 AD",
        region_label: HISTORICALLY,
        region_name: "Norman England and France",
        countries: &["United Kingdom", "France"],
        polities: &["England", "Normandy", "Angevin"],
    },
    LanguageProfile {
        name: "Middle French",
        color: "#5179f1",
        period: "1400-1600 AD",
        region_label: HISTORICALLY,
        region_name: "Late Medieval France",
        countries: &["France"],
        polities: &["France"],
    },
    LanguageProfile {
        name: "Ancient Greek",
        color: "#dd954f",
        period: "800 BC-600 AD",
        region_label: HISTORICALLY,
        region_name: "Ancient Greece and Hellenistic world",
        countries: &["Greece"],
        polities: &["Greek", "Hellenic", "Macedon", "Athens", "Sparta"],
    },
    LanguageProfile {
        name: "Greek",
        color: "#cd853f",
        period: "800 BC-present",
        region_label: "Spoken in",
        region_name: "Greece (ancient to modern)",
        countries: &["Greece"],
        polities: &["Greek", "Hellenic"],
    },
    LanguageProfile {
        name: "Old Norse",
        color: "#2e8b57",
        period: "700-1350 AD",
        region_label: HISTORICALLY,
        region_name: "Scandinavia and Norse settlements",
        countries: &["Norway", "Sweden", "Denmark", "Iceland"],
        polities: &["Norse", "Norway", "Sweden", "Denmark", "Danes", "Iceland"],
    },
    LanguageProfile {
        name: "Proto-Slavic",
        color: "#dc143c",
        period: "1500 BC-500 AD",
        region_label: HYPOTHESIZED,
        region_name: "Eastern Europe (approximate)",
        countries: &["Poland", "Ukraine"],
        polities: &["Slavs", "Slavic"],
    },
    LanguageProfile {
        name: "Sanskrit",
        color: "#ff8c00",
        period: "1500-500 BC",
        region_label: HISTORICALLY,
        region_name: "Ancient India",
        countries: &["India"],
        polities: &["India", "Vedic", "Maurya"],
    },
    LanguageProfile {
        name: "Arabic",
        color: "#228b22",
        period: "500 AD-present",
        region_label: "Originated in",
        region_name: "Arabian Peninsula (now widespread)",
        countries: &["Saudi Arabia"],
        polities: &["Arabia", "Arab", "Caliphate"],
    },
    LanguageProfile {
        name: "Persian",
        color: "#8b008b",
        period: "550 BC-present",
        region_label: HISTORICALLY,
        region_name: "Ancient Persia",
        countries: &["Iran"],
        polities: &["Persia", "Achaemenid", "Sasanian", "Parthia"],
    },
    LanguageProfile {
        name: "Old Irish",
        color: "#00ced1",
        period: "600-900 AD",
        region_label: HISTORICALLY,
        region_name: "Medieval Ireland",
        countries: &["Ireland"],
        polities: &["Ireland", "Irish"],
    },
    LanguageProfile {
        name: "Old High German",
        color: "#556b2f",
        period: "750-1050 AD",
        region_label: HISTORICALLY,
        region_name: "Early Medieval Germany",
        countries: &["Germany", "Austria", "Switzerland"],
        polities: &["East Francia", "Holy Roman Empire", "Bavaria", "Swabia"],
    },
    LanguageProfile {
        name: "Proto-Celtic",
        color: "#4682b4",
        period: "1300-800 BC",
        region_label: HYPOTHESIZED,
        region_name: "Central/Western Europe (approximate)",
        countries: &["Ireland", "United Kingdom", "France"],
        polities: &["Celts", "Celtic", "Hallstatt"],
    },
    LanguageProfile {
        name: "Gaulish",
        color: "#4a708b",
        period: "600 BC-500 AD",
        region_label: HISTORICALLY,
        region_name: "Ancient Gaul",
        countries: &["France", "Belgium"],
        polities: &["Gaul", "Gauls", "Celts"],
    },
    LanguageProfile {
        name: "Proto-Italic",
        color: "#ba55d3",
        period: "1500-500 BC",
        region_label: HYPOTHESIZED,
        region_name: "Ancient Italy",
        countries: &["Italy"],
        polities: &["Italic", "Latins", "Villanovan"],
    },
    LanguageProfile {
        name: "Proto-Balto-Slavic",
        color: "#b22222",
        period: "3000-1500 BC",
        region_label: HYPOTHESIZED,
        region_name: "Eastern Europe (approximate)",
        countries: &["Poland", "Lithuania", "Latvia"],
        polities: &["Balts", "Baltic"],
    },
    LanguageProfile {
        name: "Old Saxon",
        color: "#5f9ea0",
        period: "800-1100 AD",
        region_label: HISTORICALLY,
        region_name: "Early Medieval Saxony",
        countries: &["Germany", "Netherlands"],
        polities: &["Saxony", "Saxons"],
    },
    LanguageProfile {
        name: "Old Dutch",
        color: "#d2691e",
        period: "500-1150 AD",
        region_label: HISTORICALLY,
        region_name: "Medieval Low Countries",
        countries: &["Netherlands", "Belgium"],
        polities: &["Frisia", "Holland", "Flanders", "Utrecht"],
    },
    LanguageProfile {
        name: "Proto-Romance",
        color: "#9932cc",
        period: "200-900 AD",
        region_label: HYPOTHESIZED,
        region_name: "Former Roman Empire territories",
        countries: &["Italy", "France", "Spain", "Portugal"],
        polities: &["Roman Empire", "Western Roman Empire"],
    },
];

static PROFILE_INDEX: Lazy<HashMap<String, &'static LanguageProfile>> = Lazy::new(|| {
    PROFILES
        .iter()
        .map(|profile| (profile.name.to_lowercase(), profile))
        .collect()
});

impl LanguageProfile {
    /// Case-insensitive lookup that falls back to the placeholder profile.
    pub fn lookup(name: &str) -> LanguageProfile {
        Self::get(name).copied().unwrap_or(UNKNOWN_PROFILE)
    }

    pub fn get(name: &str) -> Option<&'static LanguageProfile> {
        PROFILE_INDEX.get(&name.trim().to_lowercase()).copied()
    }

    pub fn is_known(&self) -> bool {
        self.name != UNKNOWN_PROFILE.name
    }

    pub fn region(&self) -> RegionDescriptor {
        RegionDescriptor {
            label: self.region_label.to_string(),
            name: self.region_name.to_string(),
            countries: self.countries.iter().map(|c| c.to_string()).collect(),
            polities: self.polities.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Every language the parser recognizes, in table order.
pub fn known_languages() -> &'static [LanguageProfile] {
    PROFILES
}

/// Language names sorted longest first, so alternations prefer
/// `Vulgar Latin` over `Latin`.
pub fn language_names_longest_first() -> Vec<&'static str> {
    let mut names: Vec<_> = PROFILES.iter().map(|profile| profile.name).collect();
    names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    names
}

#[derive(Debug, Clone, Serialize)]
pub struct LanguageSuggestion {
    pub name: &'static str,
    pub score: f64,
}

/// Ranks known languages by similarity to `query`.
pub fn suggest_languages(query: &str, limit: usize) -> Vec<LanguageSuggestion> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() || limit == 0 {
        return Vec::new();
    }
    let mut scored: Vec<_> = PROFILES
        .iter()
        .map(|profile| {
            let candidate = profile.name.to_lowercase();
            let mut score = fuzz::ratio(needle.chars(), candidate.chars());
            if candidate.contains(&needle) {
                score = score.max(0.9);
            }
            LanguageSuggestion {
                name: profile.name,
                score,
            }
        })
        .collect();
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.name.cmp(b.name))
    });
    scored.truncate(limit);
    scored
}
