//! Relationship type → color lookup shared by every query and the legend.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Built-in colors, keyed by normalised relationship type
const BUILTIN_COLORS: &[(&str, &str)] = &[
    ("ownership", "#ef4444"),
    ("direct_ownership", "#ef4444"),
    ("indirect_ownership", "#f97316"),
    ("majority_shareholder", "#dc2626"),
    ("minority_shareholder", "#fb923c"),
    ("shareholder", "#f87171"),
    ("owner", "#dc2626"),
    ("subsidiary", "#f43f5e"),
    ("management", "#8b5cf6"),
    ("ceo", "#8b5cf6"),
    ("cfo", "#a78bfa"),
    ("director", "#c084fc"),
    ("board_member", "#d8b4fe"),
    ("employment", "#10b981"),
    ("employee", "#10b981"),
    ("consultant", "#34d399"),
    ("investment", "#3b82f6"),
    ("venture_capital", "#60a5fa"),
    ("private_equity", "#2563eb"),
    ("control", "#ec4899"),
    ("auditor", "#22d3ee"),
    ("multiple", "#000000"),
];

/// Lowercase, trimmed, spaces replaced by underscores
pub fn normalize_type(relationship_type: &str) -> String {
    relationship_type.trim().to_lowercase().replace(' ', "_")
}

/// One row of the legend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub relationship_type: String,
    pub color: String,
}

/// Explicit lookup table from relationship type to CSS color.
///
/// Built once per uploaded table and handed to both the query engine and the
/// legend, so one type never reads as two colors.
#[derive(Debug, Clone, Default)]
pub struct ColorPalette {
    colors: HashMap<String, String>,
    /// Registered types by normalised key, with the first spelling seen
    types: BTreeMap<String, String>,
}

impl ColorPalette {
    /// Built-in table with `overrides` layered on top
    pub fn new(overrides: &HashMap<String, String>) -> Self {
        let mut colors: HashMap<String, String> = BUILTIN_COLORS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        for (k, v) in overrides {
            colors.insert(normalize_type(k), v.clone());
        }

        Self {
            colors,
            types: BTreeMap::new(),
        }
    }

    /// Register the types present in the loaded table, pinning a color for each
    pub fn with_types<'a>(mut self, types: impl IntoIterator<Item = &'a str>) -> Self {
        for t in types {
            let key = normalize_type(t);
            if !self.colors.contains_key(&key) {
                let color = hashed_color(&key);
                self.colors.insert(key.clone(), color);
            }
            self.types.entry(key).or_insert_with(|| t.trim().to_string());
        }
        self
    }

    /// Color for a relationship type; unknown types get a stable hashed hue
    pub fn color_for(&self, relationship_type: &str) -> String {
        let key = normalize_type(relationship_type);
        self.colors
            .get(&key)
            .cloned()
            .unwrap_or_else(|| hashed_color(&key))
    }

    /// One row per registered type, sorted by normalised type
    pub fn legend(&self) -> Vec<LegendEntry> {
        self.types
            .iter()
            .map(|(key, shown)| LegendEntry {
                relationship_type: shown.clone(),
                color: self.color_for(key),
            })
            .collect()
    }
}

fn hashed_color(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    let hue = u16::from_be_bytes([digest[0], digest[1]]) % 360;
    format!("hsl({}, 70%, 50%)", hue)
}
