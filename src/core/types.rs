// src/core/types.rs
use serde::{Deserialize, Serialize};

/// Slot index of a learned word inside the `WordStore`.
pub type WordId = usize;

/// Ordering key of a word: `(frequency, recency)`. Larger is better.
pub type RankKey = (u64, u64);

/// Everything the dictionary knows about one learned word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordEntry {
    /// Canonical lowercase form. This is the identity key.
    pub word: String,
    /// Casing as the user last typed it. Shown to the user, never compared.
    pub display: String,
    /// Number of times the word has been learned. Always at least 1.
    pub frequency: u64,
    /// Sequence number of the last learn of this word.
    pub recency: u64,
}

impl WordEntry {
    pub fn rank_key(&self) -> RankKey {
        (self.frequency, self.recency)
    }
}

/// One entry of the suggestion row handed to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub text: String,
    /// Set on the leading candidate when it differs from the composed text.
    pub is_autocorrect: bool,
}

/// What the host should do with the composing buffer after a candidate is picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Replace the composing text; the word is learned once it is committed.
    ReplaceComposing(String),
    /// Commit the text. The dictionary has already learned it.
    Commit(String),
}

/// Lowercase identity key for a word or prefix.
pub fn fold(text: &str) -> String {
    text.to_lowercase()
}
