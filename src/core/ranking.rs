// src/core/ranking.rs
use crate::core::engine::Lexicon;
use crate::core::types::{fold, Candidate, RankKey};
use std::cmp::Reverse;

/// Default number of trie candidates considered per query.
pub const DEFAULT_CANDIDATE_CAP: usize = 48;

/// A candidate pulled out of the lexicon, detached from the lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scored {
    pub rank: RankKey,
    pub word: String,
    pub display: String,
}

/// Turns a prefix into an ordered, bounded list of words.
///
/// Work is split in two so callers can hold the read lock only while
/// candidates are gathered: `gather` walks the index, `rank` sorts the
/// detached result.
pub struct RankingEngine {
    candidate_cap: usize,
}

impl Default for RankingEngine {
    fn default() -> Self {
        Self::new(DEFAULT_CANDIDATE_CAP)
    }
}

impl RankingEngine {
    pub fn new(candidate_cap: usize) -> Self {
        Self { candidate_cap: candidate_cap.max(1) }
    }

    /// Resolves `prefix` to candidates, dropping the word equal to the prefix.
    /// That word does not count against the cap.
    pub fn gather(&self, lexicon: &Lexicon, prefix: &str) -> Vec<Scored> {
        let prefix = fold(prefix);
        if prefix.is_empty() {
            return vec![];
        }
        let mut cap = self.candidate_cap;
        if lexicon.store.find(&prefix).is_some() {
            cap = cap.saturating_add(1);
        }
        lexicon
            .index
            .lookup(&prefix, cap)
            .into_iter()
            .filter_map(|id| lexicon.store.entry(id))
            .filter(|entry| entry.word != prefix)
            .take(self.candidate_cap)
            .map(|entry| Scored {
                rank: entry.rank_key(),
                word: entry.word.clone(),
                display: entry.display.clone(),
            })
            .collect()
    }

    /// Orders by frequency, then recency (both descending), then word, and
    /// keeps the first `limit` display forms.
    pub fn rank(&self, mut scored: Vec<Scored>, limit: usize) -> Vec<String> {
        scored.sort_by(|a, b| Reverse(a.rank).cmp(&Reverse(b.rank)).then_with(|| a.word.cmp(&b.word)));
        scored.truncate(limit);
        scored.into_iter().map(|s| s.display).collect()
    }

    pub fn predict(&self, lexicon: &Lexicon, prefix: &str, limit: usize) -> Vec<String> {
        if limit == 0 {
            return vec![];
        }
        self.rank(self.gather(lexicon, prefix), limit)
    }
}

/// Labels a prediction list for display. Only the leading entry can be the
/// autocorrect candidate, and only if it differs from what was typed.
pub fn label_candidates(composing: &str, predictions: Vec<String>) -> Vec<Candidate> {
    let typed = fold(composing);
    predictions
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            let is_autocorrect = i == 0 && fold(&text) != typed;
            Candidate { text, is_autocorrect }
        })
        .collect()
}
