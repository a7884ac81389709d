// File: src/seed.rs
use crate::config::SeedConfig;
use crate::core::engine::Dictionary;
use tracing::info;

/// Vocabulary fed to a dictionary that has (almost) nothing learned yet.
pub const DEFAULT_SEED_WORDS: &[&str] = &["AnKeyboard", "Halo", "Apa", "Kabar", "Selamat", "Malam"];

/// Bootstraps usable predictions before the first real keystroke.
pub struct SeedLoader<'a> {
    config: &'a SeedConfig,
}

impl<'a> SeedLoader<'a> {
    pub fn new(config: &'a SeedConfig) -> Self {
        Self { config }
    }

    /// True when the probe prefix yields fewer predictions than required.
    pub fn is_sparse(&self, dictionary: &Dictionary) -> bool {
        let min = self.config.min_results;
        dictionary.predict(&self.config.probe_prefix, min).len() < min
    }

    /// Learns the seed list if seeding is enabled and the vocabulary is
    /// sparse. Returns the number of words fed through `learn`.
    pub fn seed_if_sparse(&self, dictionary: &Dictionary) -> usize {
        if !self.config.enabled || !self.is_sparse(dictionary) {
            return 0;
        }
        for word in &self.config.words {
            dictionary.learn(word);
        }
        info!(words = self.config.words.len(), "seeded default vocabulary");
        self.config.words.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DictionaryConfig;

    fn unseeded() -> Dictionary {
        Dictionary::new(DictionaryConfig::default())
    }

    #[test]
    fn test_seeds_empty_dictionary() {
        let dictionary = unseeded();
        let config = SeedConfig::default();
        assert_eq!(SeedLoader::new(&config).seed_if_sparse(&dictionary), DEFAULT_SEED_WORDS.len());
        assert_eq!(dictionary.predict("a", 5), vec!["Apa", "AnKeyboard"]);
        assert!(!SeedLoader::new(&config).is_sparse(&dictionary));
    }

    #[test]
    fn test_skips_populated_dictionary() {
        let dictionary = unseeded();
        dictionary.learn("alpha");
        dictionary.learn("atlas");
        let config = SeedConfig::default();
        assert_eq!(SeedLoader::new(&config).seed_if_sparse(&dictionary), 0);
        assert!(dictionary.get("halo").is_none());
    }

    #[test]
    fn test_disabled_seeding() {
        let dictionary = unseeded();
        let config = SeedConfig { enabled: false, ..SeedConfig::default() };
        assert_eq!(SeedLoader::new(&config).seed_if_sparse(&dictionary), 0);
        assert!(dictionary.is_empty());
    }
}
