use crate::config::DictionaryConfig;
use crate::core::ranking::{label_candidates, RankingEngine};
use crate::core::store::{sort_by_recency, WordStore};
use crate::core::trie::PrefixIndex;
use crate::core::types::{Candidate, Selection, WordEntry};
use crate::error::PersistError;
use crate::learning::{LearningEngine, Learned};
use crate::persistence::{load_lexicon, PersistentBackend, Persister, SnapshotWriter};
use crate::seed::SeedLoader;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::warn;

/// Everything guarded by the dictionary lock: the words, their index, and
/// the sequence counter used to stamp recency.
#[derive(Clone, Debug, Default)]
pub struct Lexicon {
    pub store: WordStore,
    pub index: PrefixIndex,
    pub sequence: u64,
}

struct Persistence {
    persister: Arc<Persister>,
    writer: Option<SnapshotWriter>,
    save_every: u64,
    learns: AtomicU64,
}

/// The learning dictionary. Construct one per input host and share it by
/// reference or `Arc`; every method takes `&self`.
pub struct Dictionary {
    lexicon: Arc<RwLock<Lexicon>>,
    learning_engine: LearningEngine,
    ranking_engine: RankingEngine,
    config: DictionaryConfig,
    persistence: Option<Persistence>,
}

impl Dictionary {
    /// An empty, memory-only dictionary. No seeding happens.
    pub fn new(config: DictionaryConfig) -> Self {
        Self::from_lexicon(config, Lexicon::default())
    }

    fn from_lexicon(config: DictionaryConfig, mut lexicon: Lexicon) -> Self {
        let learning_engine = LearningEngine::new(config.max_words);
        let ranking_engine = RankingEngine::new(config.candidate_cap);
        learning_engine.enforce_capacity(&mut lexicon);
        Self {
            lexicon: Arc::new(RwLock::new(lexicon)),
            learning_engine,
            ranking_engine,
            config,
            persistence: None,
        }
    }

    /// Loads the stored vocabulary (falling back to empty), starts the
    /// background writer, and seeds the default vocabulary if it is sparse.
    pub fn open(config: DictionaryConfig, backend: Arc<dyn PersistentBackend>) -> Self {
        let lexicon = load_lexicon(backend.as_ref());
        let mut dictionary = Self::from_lexicon(config, lexicon);

        let persister = Arc::new(Persister::new(backend));
        let writer = if dictionary.config.save_every > 0 {
            match SnapshotWriter::spawn(Arc::clone(&persister), Arc::clone(&dictionary.lexicon)) {
                Ok(writer) => Some(writer),
                Err(e) => {
                    warn!(error = %e, "cannot start dictionary writer, saving only on flush");
                    None
                }
            }
        } else {
            None
        };
        dictionary.persistence = Some(Persistence {
            persister,
            writer,
            save_every: u64::from(dictionary.config.save_every),
            learns: AtomicU64::new(0),
        });

        SeedLoader::new(&dictionary.config.seed).seed_if_sparse(&dictionary);
        dictionary
    }

    pub fn config(&self) -> &DictionaryConfig {
        &self.config
    }

    /// Learns one committed word. Empty or blank input is ignored.
    pub fn learn(&self, word: &str) {
        let learned = {
            let mut lexicon = self.write();
            self.learning_engine.learn(&mut lexicon, word)
        };
        if learned != Learned::Ignored {
            self.schedule_save();
        }
    }

    /// Up to `limit` display forms starting with `prefix`, best first. The
    /// word equal to the prefix itself is never returned.
    pub fn predict(&self, prefix: &str, limit: usize) -> Vec<String> {
        if limit == 0 || prefix.is_empty() {
            return vec![];
        }
        let gathered = {
            let lexicon = self.read();
            self.ranking_engine.gather(&lexicon, prefix)
        };
        self.ranking_engine.rank(gathered, limit)
    }

    /// `predict` with the leading entry flagged as the autocorrect candidate
    /// when it differs from the composed text.
    pub fn candidates(&self, composing: &str, limit: usize) -> Vec<Candidate> {
        label_candidates(composing, self.predict(composing, limit))
    }

    /// Handles the user picking a candidate. Plain suggestions are committed
    /// and learned; the autocorrect candidate only replaces the composing text.
    pub fn select(&self, candidate: &Candidate) -> Selection {
        if candidate.is_autocorrect {
            Selection::ReplaceComposing(candidate.text.clone())
        } else {
            self.learn(&candidate.text);
            Selection::Commit(candidate.text.clone())
        }
    }

    /// Case-insensitive lookup of a learned word.
    pub fn get(&self, word: &str) -> Option<WordEntry> {
        self.read().store.get(word).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies every entry out, oldest learn first.
    pub fn snapshot(&self) -> Vec<WordEntry> {
        let mut entries = self.read().store.cloned_entries();
        sort_by_recency(&mut entries);
        entries
    }

    /// Asks the background writer for a save without waiting for it.
    pub fn save(&self) -> Result<(), PersistError> {
        let persistence = self.persistence.as_ref().ok_or(PersistError::NoBackend)?;
        match &persistence.writer {
            Some(writer) => {
                writer.request();
                Ok(())
            }
            None => self.flush(),
        }
    }

    /// Writes the current state synchronously. Meant for shutdown.
    pub fn flush(&self) -> Result<(), PersistError> {
        let persistence = self.persistence.as_ref().ok_or(PersistError::NoBackend)?;
        persistence.persister.save(&self.lexicon)?;
        Ok(())
    }

    fn schedule_save(&self) {
        let Some(persistence) = &self.persistence else {
            return;
        };
        let Some(writer) = &persistence.writer else {
            return;
        };
        let learns = persistence.learns.fetch_add(1, Ordering::Relaxed) + 1;
        if learns % persistence.save_every == 0 {
            writer.request();
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Lexicon> {
        self.lexicon.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Lexicon> {
        self.lexicon.write().unwrap_or_else(PoisonError::into_inner)
    }
}
