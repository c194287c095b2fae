//! Game state and read-only views
//!
//! Everything a level session needs between ticks lives here.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::chain::Chain;
use super::marker::{Color, IdAllocator, Marker, MarkerId, MarkerStatus};
use super::score::Score;
use super::shooter::Shooter;
use super::spawner::Spawner;
use super::track::Track;
use crate::error::ConfigError;
use crate::level::LevelConfig;
use crate::tuning::Tuning;

/// Current phase of the level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Playing,
    /// Every marker cleared after the spawn budget ran out
    Won,
    /// A marker reached the sink
    Lost,
}

/// Feedback for the presentation layer, refilled every tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Spawned { id: MarkerId, color: Color },
    Fired { id: MarkerId, color: Color },
    Inserted { id: MarkerId, color: Color, pos: Vec2 },
    Exploded { id: MarkerId, color: Color, pos: Vec2 },
    RunCleared { size: usize, points: u64, multiplier: u32 },
    Cascade { multiplier: u32 },
    ProjectileLost { id: MarkerId },
    LevelWon { score: u64, new_best: Option<u64> },
    LevelLost { score: u64 },
}

/// A marker resolved to screen space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerView {
    pub id: MarkerId,
    pub color: Color,
    pub pos: Vec2,
    pub status: MarkerStatus,
}

/// HUD numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hud {
    pub score: u64,
    pub total: u64,
    pub best: u64,
    pub multiplier: u32,
    pub spawned: u32,
    pub threshold: u32,
    pub current: Color,
    pub reserve: Color,
}

/// Complete level session (deterministic for a given seed and input sequence)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub level: LevelConfig,
    pub tuning: Tuning,
    pub track: Track,
    pub chain: Chain,
    pub spawner: Spawner,
    pub shooter: Shooter,
    /// Markers in flight
    pub projectiles: Vec<Marker>,
    pub score: Score,
    pub phase: GamePhase,
    /// Simulated seconds since level start
    pub time: f32,
    /// Run seed for reproducibility
    pub seed: u64,
    /// Events produced by the last tick
    #[serde(skip)]
    pub events: Vec<GameEvent>,
    pub(crate) rng: Pcg32,
    pub(crate) ids: IdAllocator,
}

impl GameState {
    /// Validate the level, build its track and lay the opening chain
    pub fn new(level: LevelConfig, tuning: Tuning, seed: u64) -> Result<Self, ConfigError> {
        level.validate()?;
        tuning.validate()?;
        let track = level.build_track(&tuning)?;

        let first = level.palette[0];
        let mut state = Self {
            chain: Chain::new(tuning.marker_radius, level.chain_speed, tuning.snap_speed),
            spawner: Self::fresh_spawner(&level, &tuning),
            shooter: Shooter::new(level.shooter, first, first),
            projectiles: Vec::new(),
            score: Score::default(),
            phase: GamePhase::Playing,
            time: 0.0,
            seed,
            events: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            ids: IdAllocator::default(),
            track,
            level,
            tuning,
        };
        state.populate();

        log::info!(
            "Level '{}' ready: track {:.0}px, {} markers, seed {}",
            state.level.name,
            state.track.length(),
            state.chain.len(),
            seed
        );
        Ok(state)
    }

    /// Carry a previously persisted best score into this session
    pub fn with_best(mut self, best: u64) -> Self {
        self.score = Score::with_best(best.max(self.score.best()));
        self
    }

    /// Throw away the chain and projectiles and replay the level from the start
    pub fn restart(&mut self) {
        self.chain.clear();
        self.projectiles.clear();
        self.events.clear();
        self.score.reset_level();
        self.spawner = Self::fresh_spawner(&self.level, &self.tuning);
        self.phase = GamePhase::Playing;
        self.time = 0.0;
        self.populate();
        log::info!("Level '{}' restarted", self.level.name);
    }

    pub fn is_over(&self) -> bool {
        self.phase != GamePhase::Playing
    }

    /// Chain markers head → tail with resolved positions
    pub fn chain_view(&self) -> Vec<MarkerView> {
        self.chain
            .iter()
            .filter_map(|(_, m)| {
                Some(MarkerView {
                    id: m.id,
                    color: m.color,
                    pos: self.track.point_at(m.distance()?),
                    status: m.status,
                })
            })
            .collect()
    }

    /// Markers in flight
    pub fn projectile_view(&self) -> Vec<MarkerView> {
        self.projectiles
            .iter()
            .filter_map(|m| {
                Some(MarkerView {
                    id: m.id,
                    color: m.color,
                    pos: m.flight_pos()?,
                    status: m.status,
                })
            })
            .collect()
    }

    pub fn hud(&self) -> Hud {
        Hud {
            score: self.score.level(),
            total: self.score.total(),
            best: self.score.best(),
            multiplier: self.score.multiplier(),
            spawned: self.spawner.spawned(),
            threshold: self.spawner.threshold(),
            current: self.shooter.current,
            reserve: self.shooter.reserve,
        }
    }

    /// Track distance nearest to a screen point (cursor hover, aim guides)
    pub fn track_distance_near(&self, point: Vec2) -> f32 {
        self.track
            .closest_distance_with(point, self.tuning.closest_samples)
    }

    fn fresh_spawner(level: &LevelConfig, tuning: &Tuning) -> Spawner {
        Spawner::new(
            level.palette.clone(),
            tuning.base_color_weight,
            level.spawn_rate,
            level.spawn_threshold,
        )
    }

    /// Lay the opening chain and load the launcher
    fn populate(&mut self) {
        self.spawner.seed_chain(
            self.level.initial_length,
            &mut self.chain,
            &self.track,
            &mut self.rng,
            &mut self.ids,
        );

        let first = self.level.palette[0];
        self.shooter = Shooter::new(
            self.level.shooter,
            self.spawner.pick_color(&self.chain, &mut self.rng).unwrap_or(first),
            self.spawner.pick_color(&self.chain, &mut self.rng).unwrap_or(first),
        );
        self.shooter.refresh(&self.spawner, &self.chain, &mut self.rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_lays_opening_chain() {
        let state = GameState::new(LevelConfig::demo(), Tuning::default(), 1).unwrap();
        assert_eq!(state.chain.len(), 12);
        assert_eq!(state.spawner.spawned(), 12);
        assert_eq!(state.phase, GamePhase::Playing);
        let hud = state.hud();
        assert_eq!(hud.threshold, 60);
        assert_eq!(hud.multiplier, 1);
    }

    #[test]
    fn test_invalid_level_rejected() {
        let mut level = LevelConfig::demo();
        level.control_points.truncate(2);
        assert!(matches!(
            GameState::new(level, Tuning::default(), 1),
            Err(ConfigError::Track(_))
        ));
    }

    #[test]
    fn test_views_resolve_positions() {
        let state = GameState::new(LevelConfig::demo(), Tuning::default(), 5).unwrap();
        let view = state.chain_view();
        assert_eq!(view.len(), state.chain.len());
        let tail = view.last().unwrap();
        assert!(tail.pos.distance(state.track.tail()) < 0.5);
        assert!(state.projectile_view().is_empty());
    }

    #[test]
    fn test_same_seed_same_chain() {
        let a = GameState::new(LevelConfig::demo(), Tuning::default(), 77).unwrap();
        let b = GameState::new(LevelConfig::demo(), Tuning::default(), 77).unwrap();
        let colors = |s: &GameState| s.chain.iter().map(|(_, m)| m.color).collect::<Vec<_>>();
        assert_eq!(colors(&a), colors(&b));
        assert_eq!(a.shooter.current, b.shooter.current);
    }

    #[test]
    fn test_restart() {
        let mut state = GameState::new(LevelConfig::demo(), Tuning::default(), 3).unwrap();
        state.score.award_run(3);
        state.phase = GamePhase::Lost;
        state.restart();
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.score.level(), 0);
        assert_eq!(state.chain.len(), 12);
        assert_eq!(state.spawner.spawned(), 12);
    }

    #[test]
    fn test_with_best() {
        let state = GameState::new(LevelConfig::demo(), Tuning::default(), 3)
            .unwrap()
            .with_best(900);
        assert_eq!(state.hud().best, 900);
    }

    #[test]
    fn test_track_distance_near() {
        let state = GameState::new(LevelConfig::demo(), Tuning::default(), 3).unwrap();
        let d = state.track.length() * 0.4;
        let found = state.track_distance_near(state.track.point_at(d));
        assert!((found - d).abs() <= state.track.length() / state.tuning.closest_samples as f32);
    }
}
