// File: src/learning.rs
use crate::core::engine::Lexicon;
use crate::core::types::{fold, WordEntry, WordId};
use tracing::{debug, trace};

/// The single mutation path of the dictionary.
pub struct LearningEngine {
    frequency_increment: u64,
    max_words: Option<usize>,
}

/// Outcome of one `learn` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Learned {
    /// Empty or blank input.
    Ignored,
    /// A new entry was created and indexed.
    Added(WordId),
    /// An existing entry was reinforced.
    Reinforced(WordId),
}

impl LearningEngine {
    pub fn new(max_words: Option<usize>) -> Self {
        Self { frequency_increment: 1, max_words: max_words.filter(|&n| n > 0) }
    }

    pub fn max_words(&self) -> Option<usize> {
        self.max_words
    }

    /// Upserts `word` into the store, keeps the index in step, and stamps the
    /// entry with the next sequence number. Must run under the write lock.
    pub fn learn(&self, lexicon: &mut Lexicon, word: &str) -> Learned {
        let display = word.trim();
        if display.is_empty() {
            return Learned::Ignored;
        }
        let key = fold(display);

        let recency = next_recency(lexicon);

        if let Some(id) = lexicon.store.find(&key) {
            if let Some(rank) = lexicon.store.touch(id, display, self.frequency_increment, recency) {
                lexicon.index.promote(&key, rank);
            }
            trace!(word = %key, recency, "reinforced");
            return Learned::Reinforced(id);
        }

        let entry = WordEntry {
            word: key.clone(),
            display: display.to_string(),
            frequency: self.frequency_increment,
            recency,
        };
        let rank = entry.rank_key();
        let id = lexicon.store.insert(entry);
        lexicon.index.insert(&key, id, rank);
        trace!(word = %key, recency, "added");

        self.enforce_capacity(lexicon);
        Learned::Added(id)
    }

    /// Evicts the weakest entries until the store fits the configured bound.
    pub fn enforce_capacity(&self, lexicon: &mut Lexicon) {
        let Some(max) = self.max_words else {
            return;
        };
        while lexicon.store.len() > max {
            let Some(id) = lexicon.store.weakest() else {
                break;
            };
            if let Some(evicted) = lexicon.store.remove(id) {
                lexicon.index.remove(&evicted.word);
                debug!(
                    word = %evicted.word,
                    frequency = evicted.frequency,
                    recency = evicted.recency,
                    "evicted"
                );
            }
        }
    }
}

/// Advances the sequence counter. Once it is exhausted the store is
/// renumbered densely so recency keeps its order.
fn next_recency(lexicon: &mut Lexicon) -> u64 {
    if let Some(next) = lexicon.sequence.checked_add(1) {
        lexicon.sequence = next;
        return next;
    }
    let renumbered = lexicon.store.renumber_recency();
    for (word, rank) in &renumbered {
        lexicon.index.promote(word, *rank);
    }
    debug!(words = renumbered.len(), "recency counter exhausted, renumbered");
    lexicon.sequence = renumbered.len() as u64 + 1;
    lexicon.sequence
}
