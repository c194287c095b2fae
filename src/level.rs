//! Level configuration
//!
//! Supplied by the driver at level start and treated as immutable. Loaded
//! from JSON or taken from the built-in demo level.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::sim::{Color, Track};
use crate::tuning::Tuning;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelConfig {
    pub name: String,
    /// Cubic Bézier control points, sink first
    pub control_points: Vec<Vec2>,
    /// 4 or 5 distinct colors
    pub palette: Vec<Color>,
    /// Chain rolling speed (px/s)
    pub chain_speed: f32,
    /// Spawn attempts per second
    pub spawn_rate: f32,
    /// Total markers the level spawns (initial chain included)
    pub spawn_threshold: u32,
    /// Markers laid at level start
    pub initial_length: u32,
    /// Launcher position
    pub shooter: Vec2,
    /// Playfield size; projectiles leaving `[0, bounds]` are discarded
    pub bounds: Vec2,
}

impl LevelConfig {
    /// Parse and validate a level from JSON
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let level: Self = serde_json::from_str(json)?;
        level.validate()?;
        Ok(level)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let count = self.palette.len();
        if !(4..=5).contains(&count) {
            return Err(ConfigError::PaletteSize { count });
        }
        for (i, color) in self.palette.iter().enumerate() {
            if self.palette[..i].contains(color) {
                return Err(ConfigError::DuplicateColor {
                    color: color.to_string(),
                });
            }
        }

        for (field, value) in [
            ("chain_speed", self.chain_speed),
            ("spawn_rate", self.spawn_rate),
            ("bounds.x", self.bounds.x),
            ("bounds.y", self.bounds.y),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositive { field, value });
            }
        }

        if self.initial_length > self.spawn_threshold {
            return Err(ConfigError::InitialOverThreshold {
                initial: self.initial_length,
                threshold: self.spawn_threshold,
            });
        }
        Ok(())
    }

    /// Build the level's track at the tuning's table density
    pub fn build_track(&self, tuning: &Tuning) -> Result<Track, ConfigError> {
        Ok(Track::with_resolution(
            self.control_points.clone(),
            tuning.arc_samples_per_segment,
        )?)
    }

    /// Whether `pos` lies inside the playfield, with `margin` of slack
    pub fn in_bounds(&self, pos: Vec2, margin: f32) -> bool {
        pos.x >= -margin
            && pos.y >= -margin
            && pos.x <= self.bounds.x + margin
            && pos.y <= self.bounds.y + margin
    }

    /// Built-in level: a three-segment loop around a centered launcher
    pub fn demo() -> Self {
        Self {
            name: "Demo".to_string(),
            control_points: vec![
                Vec2::new(400.0, 470.0),
                Vec2::new(200.0, 520.0),
                Vec2::new(60.0, 420.0),
                Vec2::new(80.0, 300.0),
                Vec2::new(100.0, 180.0),
                Vec2::new(300.0, 60.0),
                Vec2::new(500.0, 80.0),
                Vec2::new(700.0, 100.0),
                Vec2::new(760.0, 300.0),
                Vec2::new(700.0, 460.0),
            ],
            palette: vec![Color::Red, Color::Green, Color::Blue, Color::Yellow],
            chain_speed: 40.0,
            spawn_rate: 1.5,
            spawn_threshold: 60,
            initial_length: 12,
            shooter: Vec2::new(400.0, 300.0),
            bounds: Vec2::new(800.0, 600.0),
        }
    }
}
