// --- File: src/core/trie.rs
use crate::core::types::{fold, RankKey, WordId};
use std::collections::{BinaryHeap, HashMap};

const NO_RANK: RankKey = (0, 0);

#[derive(Clone, Debug)]
struct IndexNode {
    children: HashMap<char, usize>,
    word_id: Option<WordId>,
    /// Rank key of the word ending here, `NO_RANK` when not a terminal.
    rank: RankKey,
    /// Largest rank key of any terminal in this subtree, this node included.
    best_in_subtree: RankKey,
}

impl IndexNode {
    fn new() -> Self {
        Self { children: HashMap::new(), word_id: None, rank: NO_RANK, best_in_subtree: NO_RANK }
    }
}

/// Pending work of a lookup. Ordered by rank key so the heap pops the most
/// promising subtree (or finished word) first; on equal keys a terminal wins.
#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct Frontier {
    key: RankKey,
    terminal: bool,
    slot: usize,
}

/// Character trie over lowercase word keys.
///
/// Nodes live in an arena; slots released by `remove` are recycled through a
/// free list. Every node caches the best rank key below it, which lets
/// `lookup` walk a subtree best-first and stop after a fixed number of words.
#[derive(Clone, Debug)]
pub struct PrefixIndex {
    nodes: Vec<IndexNode>,
    free: Vec<usize>,
    terminals: usize,
}

impl Default for PrefixIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl PrefixIndex {
    pub fn new() -> Self {
        Self { nodes: vec![IndexNode::new()], free: Vec::new(), terminals: 0 }
    }

    /// Number of words (terminal markers) in the index.
    pub fn len(&self) -> usize {
        self.terminals
    }

    pub fn is_empty(&self) -> bool {
        self.terminals == 0
    }

    /// Nodes currently reachable from the root, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Returns the id stored at the terminal for `word`, if any.
    pub fn get(&self, word: &str) -> Option<WordId> {
        let key = fold(word);
        self.descend(&key).and_then(|idx| self.nodes[idx].word_id)
    }

    /// Adds a terminal for `word` and records its rank key.
    /// Returns `true` when the terminal did not exist before.
    /// O(k) complexity where k is key length.
    pub fn insert(&mut self, word: &str, word_id: WordId, rank: RankKey) -> bool {
        let key = fold(word);
        if key.is_empty() {
            return false;
        }

        let mut node_idx = 0;
        let mut path = vec![0];
        for ch in key.chars() {
            let next_idx = match self.nodes[node_idx].children.get(&ch) {
                Some(&id) => id,
                None => {
                    let new_node = self.alloc();
                    self.nodes[node_idx].children.insert(ch, new_node);
                    new_node
                }
            };
            node_idx = next_idx;
            path.push(node_idx);
        }

        let node = &mut self.nodes[node_idx];
        let added = node.word_id.is_none();
        node.word_id = Some(word_id);
        let previous = std::mem::replace(&mut node.rank, rank);
        if added {
            self.terminals += 1;
        }

        if rank >= previous {
            self.raise(&path, rank);
        } else {
            self.recompute(&path);
        }
        added
    }

    /// Updates the rank key of an existing terminal. Returns `false` if `word`
    /// is not in the index.
    pub fn promote(&mut self, word: &str, rank: RankKey) -> bool {
        let key = fold(word);
        let Some(path) = self.path_to(&key) else {
            return false;
        };
        let Some(&last) = path.last() else {
            return false;
        };
        let node = &mut self.nodes[last];
        if node.word_id.is_none() {
            return false;
        }
        let previous = std::mem::replace(&mut node.rank, rank);
        if rank >= previous {
            self.raise(&path, rank);
        } else {
            self.recompute(&path);
        }
        true
    }

    /// Removes the terminal for `word`, pruning branches that no longer lead
    /// to any word. Returns the id that was stored there.
    pub fn remove(&mut self, word: &str) -> Option<WordId> {
        let key = fold(word);
        let mut path = self.path_to(&key)?;
        let last = *path.last()?;
        let word_id = self.nodes[last].word_id.take()?;
        self.nodes[last].rank = NO_RANK;
        self.terminals -= 1;

        let chars: Vec<char> = key.chars().collect();
        while path.len() > 1 {
            let idx = path[path.len() - 1];
            let node = &self.nodes[idx];
            if node.word_id.is_some() || !node.children.is_empty() {
                break;
            }
            let parent = path[path.len() - 2];
            self.nodes[parent].children.remove(&chars[path.len() - 2]);
            self.release(idx);
            path.pop();
        }

        self.recompute(&path);
        Some(word_id)
    }

    /// Collects up to `cap` ids of words starting with `prefix`, best rank key
    /// first. The prefix is lowercased; an empty prefix matches nothing.
    /// O(p + S log S) where p is the prefix length and S the nodes visited.
    pub fn lookup(&self, prefix: &str, cap: usize) -> Vec<WordId> {
        let prefix = fold(prefix);
        if prefix.is_empty() || cap == 0 {
            return vec![];
        }
        let Some(start) = self.descend(&prefix) else {
            return vec![];
        };

        let mut found = Vec::with_capacity(cap.min(self.terminals));
        let mut heap = BinaryHeap::new();
        heap.push(Frontier { key: self.nodes[start].best_in_subtree, terminal: false, slot: start });

        while let Some(item) = heap.pop() {
            if item.terminal {
                found.push(item.slot);
                if found.len() == cap {
                    break;
                }
                continue;
            }
            let node = &self.nodes[item.slot];
            if let Some(id) = node.word_id {
                heap.push(Frontier { key: node.rank, terminal: true, slot: id });
            }
            for &child_idx in node.children.values() {
                let key = self.nodes[child_idx].best_in_subtree;
                heap.push(Frontier { key, terminal: false, slot: child_idx });
            }
        }
        found
    }

    fn descend(&self, key: &str) -> Option<usize> {
        let mut node_idx = 0;
        for ch in key.chars() {
            node_idx = *self.nodes[node_idx].children.get(&ch)?;
        }
        Some(node_idx)
    }

    fn path_to(&self, key: &str) -> Option<Vec<usize>> {
        let mut path = Vec::with_capacity(key.len() + 1);
        let mut node_idx = 0;
        path.push(node_idx);
        for ch in key.chars() {
            node_idx = *self.nodes[node_idx].children.get(&ch)?;
            path.push(node_idx);
        }
        Some(path)
    }

    fn alloc(&mut self) -> usize {
        match self.free.pop() {
            Some(idx) => idx,
            None => {
                self.nodes.push(IndexNode::new());
                self.nodes.len() - 1
            }
        }
    }

    fn release(&mut self, idx: usize) {
        self.nodes[idx] = IndexNode::new();
        self.free.push(idx);
    }

    // A rank only grew: ancestors at or above it are already correct.
    fn raise(&mut self, path: &[usize], rank: RankKey) {
        for &idx in path.iter().rev() {
            if self.nodes[idx].best_in_subtree < rank {
                self.nodes[idx].best_in_subtree = rank;
            } else {
                break;
            }
        }
    }

    fn recompute(&mut self, path: &[usize]) {
        for &idx in path.iter().rev() {
            let node = &self.nodes[idx];
            let own = if node.word_id.is_some() { node.rank } else { NO_RANK };
            let best = node
                .children
                .values()
                .map(|&child_idx| self.nodes[child_idx].best_in_subtree)
                .fold(own, |acc, key| acc.max(key));
            if self.nodes[idx].best_in_subtree == best {
                break;
            }
            self.nodes[idx].best_in_subtree = best;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_of(words: &[(&str, RankKey)]) -> PrefixIndex {
        let mut index = PrefixIndex::new();
        for (id, (word, rank)) in words.iter().enumerate() {
            index.insert(word, id, *rank);
        }
        index
    }

    #[test]
    fn test_lookup_prefix() {
        let index = index_of(&[("cat", (1, 1)), ("car", (1, 2)), ("dog", (1, 3))]);
        let mut ids = index.lookup("ca", 10);
        ids.sort();
        assert_eq!(ids, vec![0, 1]);
        assert!(index.lookup("x", 10).is_empty());
        assert!(index.lookup("", 10).is_empty());
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let index = index_of(&[("cat", (1, 1))]);
        assert_eq!(index.lookup("CA", 10), vec![0]);
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut index = PrefixIndex::new();
        assert!(index.insert("cat", 0, (1, 1)));
        let nodes = index.node_count();
        assert!(!index.insert("cat", 0, (2, 2)));
        assert_eq!(index.len(), 1);
        assert_eq!(index.node_count(), nodes);
    }

    #[test]
    fn test_lookup_returns_best_ranked_first() {
        let index = index_of(&[
            ("apple", (1, 1)),
            ("apricot", (5, 2)),
            ("ape", (3, 3)),
            ("a", (9, 4)),
            ("apply", (3, 5)),
        ]);
        assert_eq!(index.lookup("a", 10), vec![3, 1, 4, 2, 0]);
    }

    #[test]
    fn test_lookup_cap_keeps_top_ranked() {
        let mut index = PrefixIndex::new();
        for i in 0..200u64 {
            index.insert(&format!("a{i}"), i as usize, (1, i + 1));
        }
        index.promote("a7", (50, 201));
        let ids = index.lookup("a", 5);
        assert_eq!(ids, vec![7, 199, 198, 197, 196]);
    }

    #[test]
    fn test_promote_unknown_word() {
        let mut index = index_of(&[("cat", (1, 1))]);
        assert!(!index.promote("ca", (2, 2)));
        assert!(!index.promote("dog", (2, 2)));
        assert!(index.promote("cat", (2, 2)));
    }

    #[test]
    fn test_remove_prunes_and_recycles() {
        let mut index = index_of(&[("car", (1, 1)), ("cart", (4, 2))]);
        let before = index.node_count();
        assert_eq!(index.remove("cart"), Some(1));
        assert_eq!(index.node_count(), before - 1);
        assert_eq!(index.lookup("ca", 10), vec![0]);
        assert_eq!(index.remove("cart"), None);

        index.insert("cab", 2, (1, 3));
        assert_eq!(index.node_count(), before);
    }

    #[test]
    fn test_remove_recomputes_subtree_rank() {
        let mut index = index_of(&[("bat", (1, 1)), ("ball", (8, 2)), ("cat", (2, 3))]);
        index.remove("ball");
        index.insert("bin", 3, (1, 4));
        assert_eq!(index.lookup("b", 10), vec![3, 0]);
    }

    #[test]
    fn test_remove_keeps_words_on_path() {
        let mut index = index_of(&[("car", (1, 1)), ("ca", (1, 2))]);
        index.remove("car");
        assert_eq!(index.get("ca"), Some(1));
        assert_eq!(index.get("car"), None);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_unicode_keys() {
        let index = index_of(&[("straße", (1, 1)), ("über", (1, 2))]);
        assert_eq!(index.lookup("STRA", 10), vec![0]);
        assert_eq!(index.lookup("Ü", 10), vec![1]);
    }
}
