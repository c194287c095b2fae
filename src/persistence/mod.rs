//! Best-score storage backends
//!
//! The only thing that survives between sessions is one non-negative
//! integer. Backends:
//! - `MemoryStore`: process-local, used by tests and as a fallback
//! - `FileStore`: JSON file, written via tmp → rename (native)
//! - `LocalStore`: browser LocalStorage (wasm32)

mod file;
#[cfg(target_arch = "wasm32")]
mod local;

pub use file::FileStore;
#[cfg(target_arch = "wasm32")]
pub use local::LocalStore;

use crate::error::StorageError;

/// Key the best score is stored under
pub const STORAGE_KEY: &str = "rolling_chain_best";

/// A place to keep the best score
pub trait ScoreStore {
    /// Stored value, or `None` when nothing has been written yet
    fn load(&self) -> Result<Option<u64>, StorageError>;

    fn store(&mut self, best: u64) -> Result<(), StorageError>;
}

/// In-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    value: Option<u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: u64) -> Self {
        Self { value: Some(value) }
    }
}

impl ScoreStore for MemoryStore {
    fn load(&self) -> Result<Option<u64>, StorageError> {
        Ok(self.value)
    }

    fn store(&mut self, best: u64) -> Result<(), StorageError> {
        self.value = Some(best);
        Ok(())
    }
}

/// Parse a stored value; anything but a non-negative integer is corrupt
pub(crate) fn decode(raw: &str) -> Result<u64, StorageError> {
    Ok(serde_json::from_str::<u64>(raw.trim())?)
}

pub(crate) fn encode(best: u64) -> Result<String, StorageError> {
    Ok(serde_json::to_string(&best)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert_eq!(store.load().unwrap(), None);
        store.store(1250).unwrap();
        assert_eq!(store.load().unwrap(), Some(1250));
        assert_eq!(MemoryStore::with_value(7).load().unwrap(), Some(7));
    }

    #[test]
    fn test_decode() {
        assert_eq!(decode("4200\n").unwrap(), 4200);
        assert!(matches!(decode("-3"), Err(StorageError::Corrupt(_))));
        assert!(matches!(decode("\"lots\""), Err(StorageError::Corrupt(_))));
        assert!(matches!(decode(""), Err(StorageError::Corrupt(_))));
        assert_eq!(encode(99).unwrap(), "99");
    }
}
