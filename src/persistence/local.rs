//! Browser LocalStorage backend

use super::{STORAGE_KEY, ScoreStore, decode, encode};
use crate::error::StorageError;

/// Best score kept in `window.localStorage` under `STORAGE_KEY`
#[derive(Debug, Clone, Default)]
pub struct LocalStore;

impl LocalStore {
    fn storage() -> Result<web_sys::Storage, StorageError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or(StorageError::Unavailable)
    }
}

impl ScoreStore for LocalStore {
    fn load(&self) -> Result<Option<u64>, StorageError> {
        let storage = Self::storage()?;
        match storage.get_item(STORAGE_KEY) {
            Ok(Some(raw)) => decode(&raw).map(Some),
            Ok(None) => Ok(None),
            Err(_) => Err(StorageError::Unavailable),
        }
    }

    fn store(&mut self, best: u64) -> Result<(), StorageError> {
        let storage = Self::storage()?;
        storage
            .set_item(STORAGE_KEY, &encode(best)?)
            .map_err(|_| StorageError::Unavailable)
    }
}
