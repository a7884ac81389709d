pub mod engine;
pub mod ranking;
pub mod store;
pub mod trie;
pub mod types;
