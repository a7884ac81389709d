// src/config.rs
use crate::core::ranking::DEFAULT_CANDIDATE_CAP;
use crate::error::ConfigError;
use crate::seed::DEFAULT_SEED_WORDS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Tunables of a `Dictionary`. Every field has a default, so a config file
/// only needs to name what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionaryConfig {
    /// Vocabulary bound. `None` (or 0) keeps every learned word.
    pub max_words: Option<usize>,
    /// How many trie candidates a single query may inspect.
    pub candidate_cap: usize,
    /// Suggestion-row size used by hosts that do not pass a limit.
    pub default_limit: usize,
    /// Successful learns between background saves. 0 disables batching;
    /// only `save`/`flush` then write.
    pub save_every: u32,
    pub seed: SeedConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub enabled: bool,
    /// Prefix used to decide whether the vocabulary is too small.
    pub probe_prefix: String,
    /// Seeding happens when the probe yields fewer results than this.
    pub min_results: usize,
    pub words: Vec<String>,
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self {
            max_words: Some(10_000),
            candidate_cap: DEFAULT_CANDIDATE_CAP,
            default_limit: 6,
            save_every: 8,
            seed: SeedConfig::default(),
        }
    }
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            probe_prefix: "a".to_string(),
            min_results: 2,
            words: DEFAULT_SEED_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}

impl DictionaryConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
