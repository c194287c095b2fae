//! Best score tracking
//!
//! Read once at startup, written only when a level beats it. Storage
//! problems never stop play: they are logged and the in-memory value wins.

use crate::persistence::{MemoryStore, ScoreStore};

/// The persisted best score and the store it lives in
pub struct HighScore {
    best: u64,
    store: Box<dyn ScoreStore>,
}

impl HighScore {
    /// Load from `store`; a missing or corrupt value reads as 0
    pub fn load(store: Box<dyn ScoreStore>) -> Self {
        let best = match store.load() {
            Ok(Some(best)) => {
                log::info!("Loaded best score {best}");
                best
            }
            Ok(None) => {
                log::info!("No best score found, starting fresh");
                0
            }
            Err(e) => {
                log::warn!("Ignoring stored best score: {e}");
                0
            }
        };
        Self { best, store }
    }

    pub fn best(&self) -> u64 {
        self.best
    }

    /// Record `score`; persists and returns true only when it beats the best
    pub fn submit(&mut self, score: u64) -> bool {
        if score <= self.best {
            return false;
        }
        self.best = score;
        if let Err(e) = self.store.store(score) {
            log::warn!("Failed to persist best score {score}: {e}");
        } else {
            log::info!("New best score {score} saved");
        }
        true
    }
}

impl Default for HighScore {
    fn default() -> Self {
        Self::load(Box::new(MemoryStore::new()))
    }
}

impl std::fmt::Debug for HighScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HighScore").field("best", &self.best).finish()
    }
}
