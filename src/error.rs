//! Error types
//!
//! Only construction and storage can fail. Gameplay no-ops (firing on
//! cooldown, blocked spawns) are reported through `Option`/`bool` returns.

use thiserror::Error;

/// Invalid track geometry
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TrackError {
    #[error("track needs at least 4 control points, got {points}")]
    InvalidGeometry { points: usize },
}

/// Level configuration rejected at load time
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Track(#[from] TrackError),
    #[error("palette must hold 4 or 5 colors, got {count}")]
    PaletteSize { count: usize },
    #[error("palette lists {color} more than once")]
    DuplicateColor { color: String },
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f32 },
    #[error("initial chain length {initial} exceeds spawn threshold {threshold}")]
    InitialOverThreshold { initial: u32, threshold: u32 },
    #[error("failed to parse level: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Best-score storage failure (never fatal)
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable")]
    Unavailable,
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored value is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}
