//! Data-driven game balance
//!
//! Values shared by every level. Level-specific values (speed, spawn rate,
//! palette) live in `LevelConfig`.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Marker radius; chain neighbours sit `2 * radius` apart
    pub marker_radius: f32,
    /// Projectile speed (px/s)
    pub projectile_speed: f32,
    /// Seconds between shots
    pub fire_cooldown: f32,
    /// Speed of the tail-ward portion while a gap closes (px/s)
    pub snap_speed: f32,
    /// Flat weight every palette color gets in spawn draws
    pub base_color_weight: u32,
    /// Maximum resident markers
    pub chain_capacity: usize,
    /// Arc-length table density
    pub arc_samples_per_segment: usize,
    /// Sample count for nearest-distance queries
    pub closest_samples: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            marker_radius: MARKER_RADIUS,
            projectile_speed: PROJECTILE_SPEED,
            fire_cooldown: FIRE_COOLDOWN,
            snap_speed: SNAP_SPEED,
            base_color_weight: BASE_COLOR_WEIGHT,
            chain_capacity: CHAIN_CAPACITY,
            arc_samples_per_segment: ARC_SAMPLES_PER_SEGMENT,
            closest_samples: CLOSEST_SAMPLES,
        }
    }
}

impl Tuning {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("marker_radius", self.marker_radius),
            ("projectile_speed", self.projectile_speed),
            ("snap_speed", self.snap_speed),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        Ok(())
    }
}
