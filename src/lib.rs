// src/lib.rs

pub mod c_api;
pub mod config;
pub mod core;
pub mod error;
pub mod learning;
pub mod persistence;
pub mod seed;

pub use crate::config::DictionaryConfig;
pub use crate::core::engine::Dictionary;
pub use crate::core::types::{Candidate, Selection, WordEntry};
pub use crate::error::{ConfigError, PersistError};
pub use crate::persistence::{FileBackend, MemoryBackend, PersistentBackend};
