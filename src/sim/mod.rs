//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only (injected, never global)
//! - Stable iteration order (chain order, then projectile launch order)
//! - No rendering or platform dependencies

pub mod chain;
pub mod collision;
pub mod marker;
pub mod score;
pub mod shooter;
pub mod spawner;
pub mod state;
pub mod tick;
pub mod track;

pub use chain::{Chain, ChainHandle, ChainMotion, ChainStep, GapStep, Junction, Removal};
pub use collision::{
    CollisionHit, MIN_RUN, Side, check_cascade, find_run, hole_reached, resolve_projectile_collision,
};
pub use marker::{Color, IdAllocator, Marker, MarkerId, MarkerStatus, Placement};
pub use score::{Score, run_points};
pub use shooter::Shooter;
pub use spawner::{Spawner, next_color, pick_weighted};
pub use state::{GameEvent, GamePhase, GameState, Hud, MarkerView};
pub use tick::{TickInput, tick};
pub use track::Track;
