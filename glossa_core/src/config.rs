//! Application configuration shared by every dictionary.
//!
//! The registry treats [`AppConfig`] as an opaque snapshot: it only clones it
//! into each entry. Providers look up their own section under `dicts.all`.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Storage key the configuration is persisted under (sync area).
pub const CONFIG_KEY: &str = "config";

/// Schema version written by this build.
pub const CONFIG_VERSION: u32 = 5;

/// Default panel height for a dictionary, in pixels.
pub const DEFAULT_PREFERRED_HEIGHT: u32 = 240;

static DEFAULT_CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::build_default);

/// The global configuration object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Whether lookups are enabled at all
    #[serde(default = "default_true")]
    pub active: bool,

    #[serde(default)]
    pub dicts: DictsConfig,
}

/// Per-dictionary configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DictsConfig {
    /// Dictionaries shown in the panel, in display order
    #[serde(default)]
    pub selected: Vec<String>,

    /// Settings for every known dictionary, keyed by id
    #[serde(default)]
    pub all: BTreeMap<String, DictSettings>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictSettings {
    #[serde(default = "default_preferred_height")]
    pub preferred_height: u32,

    /// Search when the selection contains Chinese
    #[serde(default = "default_true")]
    pub select_when_chs: bool,

    /// Search when the selection contains English
    #[serde(default = "default_true")]
    pub select_when_eng: bool,

    /// Provider-owned options; never interpreted outside the provider
    #[serde(default)]
    pub options: Map<String, Value>,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

fn default_true() -> bool {
    true
}

fn default_preferred_height() -> u32 {
    DEFAULT_PREFERRED_HEIGHT
}

impl Default for DictSettings {
    fn default() -> Self {
        Self {
            preferred_height: DEFAULT_PREFERRED_HEIGHT,
            select_when_chs: true,
            select_when_eng: true,
            options: Map::new(),
        }
    }
}

impl DictSettings {
    pub fn with_options(mut self, options: Value) -> Self {
        if let Value::Object(map) = options {
            self.options = map;
        }
        self
    }

    pub fn option_bool(&self, name: &str, default: bool) -> bool {
        self.options
            .get(name)
            .and_then(|v| v.as_bool())
            .unwrap_or(default)
    }

    pub fn option_u64(&self, name: &str, default: u64) -> u64 {
        self.options
            .get(name)
            .and_then(|v| v.as_u64())
            .unwrap_or(default)
    }
}

impl AppConfig {
    /// The canonical default configuration.
    pub fn default_config() -> &'static AppConfig {
        &DEFAULT_CONFIG
    }

    fn build_default() -> Self {
        let mut all = BTreeMap::new();
        all.insert(
            "youdao".to_string(),
            DictSettings::default().with_options(json!({
                "basic": true,
                "phrase": true,
                "sentence": true,
            })),
        );
        all.insert(
            "urban".to_string(),
            DictSettings {
                preferred_height: 180,
                select_when_chs: false,
                ..DictSettings::default()
            }
            .with_options(json!({ "result_num": 4 })),
        );

        Self {
            version: CONFIG_VERSION,
            active: true,
            dicts: DictsConfig {
                selected: vec!["youdao".to_string(), "urban".to_string()],
                all,
            },
        }
    }

    /// Settings for one dictionary, falling back to defaults when absent.
    pub fn dict(&self, id: &str) -> DictSettings {
        self.dicts.all.get(id).cloned().unwrap_or_default()
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        DEFAULT_CONFIG.clone()
    }
}
