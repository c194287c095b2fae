//! Per-step simulation
//!
//! Core game loop that advances a level session by one elapsed-time step.

use glam::Vec2;

use super::chain::{ChainHandle, ChainStep, Junction};
use super::collision::{CollisionHit, check_cascade, find_run, hole_reached, resolve_projectile_collision};
use super::marker::{Marker, MarkerStatus};
use super::state::{GameEvent, GamePhase, GameState};

/// Player intents for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Aim direction from the launcher (need not be normalized)
    pub aim: Option<Vec2>,
    /// Fire the loaded marker
    pub fire: bool,
    /// Swap the loaded and reserve colors
    pub swap: bool,
}

/// Advance the game state by `dt` seconds.
///
/// The driver is expected to clamp `dt` (see `consts::MAX_FRAME_DT`).
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    state.events.clear();
    if state.phase != GamePhase::Playing {
        return;
    }
    state.time += dt;
    state.chain.settle();

    // Launcher
    state.shooter.cool_down(dt);
    state.shooter.refresh(&state.spawner, &state.chain, &mut state.rng);
    if let Some(aim) = input.aim {
        state.shooter.aim(aim);
    }
    if input.swap {
        state.shooter.swap();
    }
    if input.fire {
        if let Some(shot) = state.shooter.fire(
            state.tuning.projectile_speed,
            state.tuning.fire_cooldown,
            &state.spawner,
            &state.chain,
            &mut state.rng,
            &mut state.ids,
        ) {
            state.events.push(GameEvent::Fired {
                id: shot.id,
                color: shot.color,
            });
            state.projectiles.push(shot);
        }
    }

    // Replenish at the tail
    let spawned = state.spawner.tick(
        dt,
        &mut state.chain,
        &state.track,
        state.tuning.chain_capacity,
        &mut state.rng,
        &mut state.ids,
    );
    for handle in spawned {
        if let Some(marker) = state.chain.get(handle) {
            state.events.push(GameEvent::Spawned {
                id: marker.id,
                color: marker.color,
            });
        }
    }

    // Chain locomotion
    if let ChainStep::Closed(junctions) = state.chain.update(dt) {
        resolve_closure(state, &junctions);
    }

    if hole_reached(&state.chain) {
        state.phase = GamePhase::Lost;
        state.projectiles.clear();
        let score = state.score.level();
        log::info!("Level '{}' lost with {} points", state.level.name, score);
        state.events.push(GameEvent::LevelLost { score });
        return;
    }

    step_projectiles(state, dt);

    if state.spawner.is_exhausted() && state.chain.is_empty() && state.projectiles.is_empty() {
        let score = state.score.level();
        let new_best = state.score.complete_level();
        state.phase = GamePhase::Won;
        log::info!("Level '{}' won with {} points", state.level.name, score);
        state.events.push(GameEvent::LevelWon { score, new_best });
    }
}

/// Move every projectile and splice the ones that hit the chain
fn step_projectiles(state: &mut GameState, dt: f32) {
    let margin = state.tuning.marker_radius;
    let flying = std::mem::take(&mut state.projectiles);

    for mut shot in flying {
        shot.advance_flight(dt);
        let Some(pos) = shot.flight_pos() else {
            continue;
        };

        if !state.level.in_bounds(pos, margin) {
            state.events.push(GameEvent::ProjectileLost { id: shot.id });
            continue;
        }

        match resolve_projectile_collision(pos, &state.chain, &state.track) {
            Some(hit) => land(state, shot, hit),
            None => state.projectiles.push(shot),
        }
    }
}

/// Insert a projectile where it struck and clear any run it completes
fn land(state: &mut GameState, shot: Marker, hit: CollisionHit) {
    let (id, color) = (shot.id, shot.color);
    let handle = state.chain.insert(hit.after, shot, hit.distance);
    state.chain.set_status(handle, MarkerStatus::JustInserted);

    let pos = state
        .chain
        .distance(handle)
        .map(|d| state.track.point_at(d))
        .unwrap_or_default();
    state.events.push(GameEvent::Inserted { id, color, pos });

    match find_run(&state.chain, handle) {
        Some(run) => clear_run(state, &run),
        None => state.score.on_no_match(),
    }
}

/// Gaps finished closing: cascade at every junction that completes a run.
///
/// Junctions are checked sink first; one emptied by an earlier cascade is skipped.
fn resolve_closure(state: &mut GameState, junctions: &[Junction]) {
    let mut cascaded = false;
    for j in junctions {
        if state.chain.next(j.front) != Some(j.back) {
            continue;
        }
        let Some(run) = check_cascade(&state.chain, Some(j.front), Some(j.back)) else {
            continue;
        };
        state.score.on_cascade();
        let multiplier = state.score.multiplier();
        log::debug!("Cascade x{multiplier}");
        state.events.push(GameEvent::Cascade { multiplier });
        clear_run(state, &run);
        cascaded = true;
    }
    if !cascaded {
        state.score.on_no_match();
    }
}

/// Score and remove a run; a removal that opens no gap ends the cascade
fn clear_run(state: &mut GameState, run: &[ChainHandle]) {
    let points = state.score.award_run(run.len());
    let multiplier = state.score.multiplier();
    log::debug!("Cleared run of {} for {points} points", run.len());
    state.events.push(GameEvent::RunCleared {
        size: run.len(),
        points,
        multiplier,
    });

    let removal = state.chain.remove_batch(run);
    for marker in &removal.removed {
        let pos = marker
            .distance()
            .map(|d| state.track.point_at(d))
            .unwrap_or_default();
        state.events.push(GameEvent::Exploded {
            id: marker.id,
            color: marker.color,
            pos,
        });
    }

    if removal.front.is_none() || removal.back.is_none() {
        state.score.on_no_match();
    }
}
