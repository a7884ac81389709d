// src/error.rs
use std::io;

/// Failure while reading or writing the persisted dictionary.
///
/// None of these ever reach `learn` or `predict`: a failed load falls back to
/// an empty dictionary and a failed background save is only logged.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid header (too short)")]
    InvalidHeader,

    #[error("invalid magic bytes (expected LKWD)")]
    InvalidMagic,

    #[error("unsupported version: {0}")]
    UnsupportedVersion(u8),

    #[error("serialization error: {0}")]
    Serialize(bincode::Error),

    #[error("deserialization error: {0}")]
    Deserialize(bincode::Error),

    #[error("dictionary has no persistence backend")]
    NoBackend,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}
