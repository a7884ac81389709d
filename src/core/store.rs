// src/core/store.rs
use crate::core::types::{fold, RankKey, WordEntry, WordId};
use std::collections::{BTreeSet, HashMap};

/// Canonical table of learned words.
///
/// Entries sit in slots addressed by `WordId`; evicted slots are reused.
/// `by_rank` mirrors every live entry's rank key so the weakest word can be
/// found without a scan.
#[derive(Clone, Debug, Default)]
pub struct WordStore {
    slots: Vec<Option<WordEntry>>,
    free: Vec<WordId>,
    ids: HashMap<String, WordId>,
    by_rank: BTreeSet<(RankKey, WordId)>,
}

impl WordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Case-insensitive lookup of a word's id.
    pub fn find(&self, word: &str) -> Option<WordId> {
        self.ids.get(&fold(word)).copied()
    }

    pub fn get(&self, word: &str) -> Option<&WordEntry> {
        self.find(word).and_then(|id| self.entry(id))
    }

    pub fn entry(&self, id: WordId) -> Option<&WordEntry> {
        self.slots.get(id).and_then(Option::as_ref)
    }

    /// Iterates over all live entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (WordId, &WordEntry)> {
        self.slots.iter().enumerate().filter_map(|(id, slot)| slot.as_ref().map(|e| (id, e)))
    }

    /// Stores a brand-new entry. The caller guarantees `entry.word` is folded
    /// and not yet present.
    pub fn insert(&mut self, entry: WordEntry) -> WordId {
        let rank = entry.rank_key();
        let key = entry.word.clone();
        let id = match self.free.pop() {
            Some(id) => {
                self.slots[id] = Some(entry);
                id
            }
            None => {
                self.slots.push(Some(entry));
                self.slots.len() - 1
            }
        };
        self.ids.insert(key, id);
        self.by_rank.insert((rank, id));
        id
    }

    /// Records one more use of an existing entry and returns its new rank key.
    pub fn touch(&mut self, id: WordId, display: &str, increment: u64, recency: u64) -> Option<RankKey> {
        let entry = self.slots.get_mut(id)?.as_mut()?;
        let old = entry.rank_key();
        entry.frequency = entry.frequency.saturating_add(increment);
        entry.recency = recency;
        if entry.display != display {
            entry.display = display.to_string();
        }
        let new = entry.rank_key();
        self.by_rank.remove(&(old, id));
        self.by_rank.insert((new, id));
        Some(new)
    }

    /// The entry with the lowest `(frequency, recency)` pair.
    pub fn weakest(&self) -> Option<WordId> {
        self.by_rank.first().map(|&(_, id)| id)
    }

    pub fn remove(&mut self, id: WordId) -> Option<WordEntry> {
        let entry = self.slots.get_mut(id)?.take()?;
        self.ids.remove(&entry.word);
        self.by_rank.remove(&(entry.rank_key(), id));
        self.free.push(id);
        Some(entry)
    }

    /// Clones every live entry, in slot order.
    pub fn cloned_entries(&self) -> Vec<WordEntry> {
        self.iter().map(|(_, e)| e.clone()).collect()
    }

    /// Rewrites recencies as `1..=len`, keeping their order, and returns each
    /// word with its new rank key.
    pub fn renumber_recency(&mut self) -> Vec<(String, RankKey)> {
        let mut order: Vec<(u64, WordId)> = self.iter().map(|(id, e)| (e.recency, id)).collect();
        order.sort_unstable();

        let mut renumbered = Vec::with_capacity(order.len());
        for (recency, (_, id)) in (1u64..).zip(order) {
            let Some(entry) = self.slots[id].as_mut() else {
                continue;
            };
            let old = entry.rank_key();
            entry.recency = recency;
            let new = entry.rank_key();
            self.by_rank.remove(&(old, id));
            self.by_rank.insert((new, id));
            renumbered.push((entry.word.clone(), new));
        }
        renumbered
    }
}

/// Puts entries in learn order, oldest first.
pub fn sort_by_recency(entries: &mut [WordEntry]) {
    entries.sort_by(|a, b| a.recency.cmp(&b.recency).then_with(|| a.word.cmp(&b.word)));
}
