//! Collision detection and match resolution
//!
//! Maps a free-flying projectile onto the chain, and finds the runs that a
//! fresh insertion or a closed gap produces. Runs are only ever searched
//! around the marker that just changed neighbours.

use glam::Vec2;

use super::chain::{Chain, ChainHandle};
use super::track::Track;

/// Minimum run length that gets removed
pub const MIN_RUN: usize = 3;

/// Which side of the target a projectile lands on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Approached from the sink side: goes in front of the target
    Sink,
    /// Approached from the tail side: goes behind the target
    Tail,
}

/// A projectile touching the chain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionHit {
    /// Marker that was struck
    pub target: ChainHandle,
    pub side: Side,
    /// Track distance for the new marker (clamped to >= 0)
    pub distance: f32,
    /// Marker to insert after (`None` = new head)
    pub after: Option<ChainHandle>,
}

/// Find the chain marker a projectile at `pos` has struck.
///
/// The nearest marker whose track position lies within `2 * radius` wins.
pub fn resolve_projectile_collision(pos: Vec2, chain: &Chain, track: &Track) -> Option<CollisionHit> {
    let reach = chain.spacing();
    let reach_sq = reach * reach;

    let mut best: Option<(ChainHandle, f32, Vec2)> = None;
    for (handle, marker) in chain.iter() {
        let Some(distance) = marker.distance() else {
            continue;
        };
        let center = track.point_at(distance);
        let dist_sq = center.distance_squared(pos);
        if dist_sq > reach_sq {
            continue;
        }
        if best.is_none_or(|(_, best_sq, _)| dist_sq < best_sq) {
            best = Some((handle, dist_sq, center));
        }
    }

    let (target, _, center) = best?;
    let target_distance = chain.distance(target)?;
    let tangent = track.tangent_at(target_distance);

    if tangent.dot(pos - center) < 0.0 {
        Some(CollisionHit {
            target,
            side: Side::Sink,
            distance: (target_distance - reach).max(0.0),
            after: chain.prev(target),
        })
    } else {
        Some(CollisionHit {
            target,
            side: Side::Tail,
            distance: target_distance + reach,
            after: Some(target),
        })
    }
}

/// Defeat test: the lead marker has reached the sink
pub fn hole_reached(chain: &Chain) -> bool {
    chain
        .head()
        .and_then(|h| chain.distance(h))
        .is_some_and(|d| d <= 0.0)
}

/// Contiguous same-color run through `start`, head → tail, if at least `MIN_RUN` long
pub fn find_run(chain: &Chain, start: ChainHandle) -> Option<Vec<ChainHandle>> {
    let color = chain.color(start)?;

    let mut run = Vec::new();
    let mut cur = chain.prev(start);
    while let Some(h) = cur.filter(|&h| chain.color(h) == Some(color)) {
        run.push(h);
        cur = chain.prev(h);
    }
    run.reverse();
    run.push(start);

    let mut cur = chain.next(start);
    while let Some(h) = cur.filter(|&h| chain.color(h) == Some(color)) {
        run.push(h);
        cur = chain.next(h);
    }

    (run.len() >= MIN_RUN).then_some(run)
}

/// After a gap closes, test whether the two boundary markers complete a run
pub fn check_cascade(
    chain: &Chain,
    front: Option<ChainHandle>,
    back: Option<ChainHandle>,
) -> Option<Vec<ChainHandle>> {
    let (front, back) = (front?, back?);
    if chain.color(front)? != chain.color(back)? {
        return None;
    }
    find_run(chain, front)
}
