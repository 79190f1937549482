//! In-memory storage for tests and the headless runner

use std::collections::HashMap;

use super::{PersistenceError, PersistenceResult, Storage};

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    records: HashMap<String, String>,
    /// Fail every operation, to exercise fallback paths
    pub unavailable: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage whose reads and writes all fail
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn check(&self, key: &str) -> PersistenceResult<()> {
        if self.unavailable {
            return Err(PersistenceError::Io {
                key: key.to_string(),
                message: "storage unavailable".to_string(),
            });
        }
        Ok(())
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> PersistenceResult<Option<String>> {
        self.check(key)?;
        Ok(self.records.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> PersistenceResult<()> {
        self.check(key)?;
        self.records.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
