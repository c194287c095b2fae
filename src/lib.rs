//! Rolling Chain - simulation core for a match-3 chain shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (track, chain, collisions, matches, scoring)
//! - `level`: Level configuration supplied by the driver
//! - `tuning`: Data-driven game balance
//! - `persistence`: Best-score storage backends
//! - `highscores`: Best-score load/save policy

pub mod error;
pub mod highscores;
pub mod level;
pub mod persistence;
pub mod sim;
pub mod tuning;

pub use error::{ConfigError, StorageError, TrackError};
pub use highscores::HighScore;
pub use level::LevelConfig;
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Largest frame time a driver should feed into the accumulator
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Marker defaults
    pub const MARKER_RADIUS: f32 = 16.0;
    pub const PROJECTILE_SPEED: f32 = 600.0;
    pub const FIRE_COOLDOWN: f32 = 0.25;
    /// Speed of the tail-ward portion while a gap closes (px/s)
    pub const SNAP_SPEED: f32 = 480.0;

    /// Flat weight added to every palette color when drawing a new color
    pub const BASE_COLOR_WEIGHT: u32 = 1;
    /// Maximum markers resident in the chain at once
    pub const CHAIN_CAPACITY: usize = 256;

    /// Arc-length table density
    pub const ARC_SAMPLES_PER_SEGMENT: usize = 256;
    /// Sample count used by `Track::closest_distance`
    pub const CLOSEST_SAMPLES: usize = 200;
}

/// Point at `t` on a cubic Bézier segment
#[inline]
pub fn cubic_point(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, t: f32) -> Vec2 {
    let mt = 1.0 - t;
    p0 * (mt * mt * mt) + p1 * (3.0 * mt * mt * t) + p2 * (3.0 * mt * t * t) + p3 * (t * t * t)
}

/// First derivative of a cubic Bézier segment at `t`
#[inline]
pub fn cubic_derivative(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, t: f32) -> Vec2 {
    let mt = 1.0 - t;
    (p1 - p0) * (3.0 * mt * mt) + (p2 - p1) * (6.0 * mt * t) + (p3 - p2) * (3.0 * t * t)
}
