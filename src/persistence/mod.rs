//! Key-value persistence for leaderboard and profile records
//!
//! Records are plain serde JSON strings keyed by name, with no schema
//! versioning. Callers at the session boundary log failures and fall back
//! to defaults; nothing here ever reaches the simulation step.

pub mod file;
pub mod memory;

use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Leaderboard record key
pub const HIGH_SCORES_KEY: &str = "high_scores";
/// Profile record key
pub const PROFILE_KEY: &str = "profile";

/// Durable storage failure
#[derive(Debug)]
pub enum PersistenceError {
    /// Backing store could not be read or written
    Io { key: String, message: String },
    /// Stored text is not a valid record
    Parse { key: String, message: String },
    /// Record could not be serialized
    Encode { key: String, message: String },
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::Io { key, message } => {
                write!(f, "storage i/o failed for '{}': {}", key, message)
            }
            PersistenceError::Parse { key, message } => {
                write!(f, "stored record '{}' is malformed: {}", key, message)
            }
            PersistenceError::Encode { key, message } => {
                write!(f, "could not encode record '{}': {}", key, message)
            }
        }
    }
}

impl std::error::Error for PersistenceError {}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Simple string key-value store
pub trait Storage {
    /// Stored text for `key`, `None` when nothing was saved yet
    fn read(&self, key: &str) -> PersistenceResult<Option<String>>;
    fn write(&mut self, key: &str, value: &str) -> PersistenceResult<()>;
}

/// Read and decode a JSON record
pub fn load_json<T: DeserializeOwned>(
    storage: &impl Storage,
    key: &str,
) -> PersistenceResult<Option<T>> {
    let Some(text) = storage.read(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|err| PersistenceError::Parse {
            key: key.to_string(),
            message: err.to_string(),
        })
}

/// Encode and write a JSON record
pub fn save_json<T: Serialize>(
    storage: &mut impl Storage,
    key: &str,
    value: &T,
) -> PersistenceResult<()> {
    let text = serde_json::to_string(value).map_err(|err| PersistenceError::Encode {
        key: key.to_string(),
        message: err.to_string(),
    })?;
    storage.write(key, &text)
}
