//! Marker replenishment: weighted color draws and timed injection at the tail

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::chain::{Chain, ChainHandle};
use super::marker::{Color, IdAllocator, Marker};
use super::track::Track;

/// Index chosen by `roll` in `[0, sum(weights))`, walking the cumulative weights
pub fn pick_weighted(weights: &[u32], roll: u32) -> Option<usize> {
    let mut acc = 0u32;
    for (i, &w) in weights.iter().enumerate() {
        acc += w;
        if roll < acc {
            return Some(i);
        }
    }
    None
}

/// Draw a palette color weighted by how often it already appears in the chain.
///
/// Every color gets `base_weight` on top of its count so colors that have
/// left the chain can still come back.
pub fn next_color<R: Rng + ?Sized>(
    chain: &Chain,
    palette: &[Color],
    base_weight: u32,
    rng: &mut R,
) -> Option<Color> {
    if palette.is_empty() {
        return None;
    }

    let weights: Vec<u32> = palette
        .iter()
        .map(|&c| chain.count_color(c) as u32 + base_weight)
        .collect();
    let total: u32 = weights.iter().sum();
    if total == 0 {
        return Some(palette[rng.random_range(0..palette.len())]);
    }

    let roll = rng.random_range(0..total);
    pick_weighted(&weights, roll).map(|i| palette[i])
}

/// Timed injection of new markers at the far end of the track
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spawner {
    palette: Vec<Color>,
    base_weight: u32,
    /// Seconds between spawn attempts
    interval: f32,
    accumulator: f32,
    spawned: u32,
    threshold: u32,
}

impl Spawner {
    pub fn new(palette: Vec<Color>, base_weight: u32, spawn_rate: f32, threshold: u32) -> Self {
        let interval = if spawn_rate > 0.0 {
            1.0 / spawn_rate
        } else {
            f32::INFINITY
        };
        Self {
            palette,
            base_weight,
            interval,
            accumulator: 0.0,
            spawned: 0,
            threshold,
        }
    }

    pub fn palette(&self) -> &[Color] {
        &self.palette
    }

    /// Markers spawned so far this level (initial chain included)
    pub fn spawned(&self) -> u32 {
        self.spawned
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// True once the level's marker budget is used up
    pub fn is_exhausted(&self) -> bool {
        self.spawned >= self.threshold
    }

    /// Weighted color draw against the current chain
    pub fn pick_color<R: Rng + ?Sized>(&self, chain: &Chain, rng: &mut R) -> Option<Color> {
        next_color(chain, &self.palette, self.base_weight, rng)
    }

    /// Accumulate `dt` and attempt one injection per elapsed interval.
    ///
    /// Attempts blocked by capacity or tail spacing are dropped, not deferred.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        chain: &mut Chain,
        track: &Track,
        capacity: usize,
        rng: &mut R,
        ids: &mut IdAllocator,
    ) -> Vec<ChainHandle> {
        let mut spawned = Vec::new();
        if self.is_exhausted() {
            self.accumulator = 0.0;
            return spawned;
        }

        self.accumulator += dt;
        while self.accumulator >= self.interval {
            self.accumulator -= self.interval;
            if self.is_exhausted() || chain.len() >= capacity {
                continue;
            }
            if let Some(handle) = self.inject(chain, track, rng, ids) {
                spawned.push(handle);
            }
        }
        spawned
    }

    /// Lay the level's opening chain, packed from the tail toward the sink
    pub fn seed_chain<R: Rng + ?Sized>(
        &mut self,
        count: u32,
        chain: &mut Chain,
        track: &Track,
        rng: &mut R,
        ids: &mut IdAllocator,
    ) -> Vec<ChainHandle> {
        let spacing = chain.spacing();
        let mut seeded = Vec::new();
        for i in 0..count {
            let distance = track.length() - i as f32 * spacing;
            if distance < spacing || self.is_exhausted() {
                log::warn!("Opening chain truncated to {i} markers");
                break;
            }
            let Some(color) = self.pick_color(chain, rng) else {
                break;
            };
            let after = chain.find_insertion_point(distance);
            let handle = chain.insert(after, Marker::resident(ids.next_id(), color, distance), distance);
            self.spawned += 1;
            seeded.push(handle);
        }
        seeded
    }

    fn inject<R: Rng + ?Sized>(
        &mut self,
        chain: &mut Chain,
        track: &Track,
        rng: &mut R,
        ids: &mut IdAllocator,
    ) -> Option<ChainHandle> {
        let distance = track.length();
        if let Some(tail) = chain.tail() {
            if chain.distance(tail)? > distance - chain.spacing() {
                return None;
            }
        }

        let color = self.pick_color(chain, rng)?;
        let after = chain.find_insertion_point(distance);
        let handle = chain.insert(after, Marker::resident(ids.next_id(), color, distance), distance);
        self.spawned += 1;
        log::trace!("Spawned {color} marker ({}/{})", self.spawned, self.threshold);
        Some(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const R: f32 = 10.0;
    const PALETTE: [Color; 4] = [Color::Red, Color::Green, Color::Blue, Color::Yellow];

    fn track(len: f32) -> Track {
        Track::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(len / 3.0, 0.0),
            Vec2::new(2.0 * len / 3.0, 0.0),
            Vec2::new(len, 0.0),
        ])
        .unwrap()
    }

    fn reds(n: usize) -> Chain {
        let mut chain = Chain::new(R, 50.0, 200.0);
        let mut ids = IdAllocator::default();
        for i in 0..n {
            let after = chain.tail();
            chain.insert(after, Marker::resident(ids.next_id(), Color::Red, 0.0), i as f32 * 20.0);
        }
        chain
    }

    #[test]
    fn test_pick_weighted_exact() {
        let weights = [3, 1, 0, 2];
        assert_eq!(pick_weighted(&weights, 0), Some(0));
        assert_eq!(pick_weighted(&weights, 2), Some(0));
        assert_eq!(pick_weighted(&weights, 3), Some(1));
        assert_eq!(pick_weighted(&weights, 4), Some(3));
        assert_eq!(pick_weighted(&weights, 5), Some(3));
        assert_eq!(pick_weighted(&weights, 6), None);
    }

    #[test]
    fn test_next_color_weights_follow_chain() {
        // 9 reds + base 1 => red weight 10 of 13
        let chain = reds(9);
        let mut rng = Pcg32::seed_from_u64(7);
        let draws = 13_000;
        let red = (0..draws)
            .filter(|_| next_color(&chain, &PALETTE, 1, &mut rng) == Some(Color::Red))
            .count();
        let share = red as f32 / draws as f32;
        assert!((share - 10.0 / 13.0).abs() < 0.02, "share={share}");
    }

    #[test]
    fn test_absent_colors_stay_selectable() {
        let chain = reds(20);
        let mut rng = Pcg32::seed_from_u64(3);
        let seen: std::collections::HashSet<Color> = (0..2000)
            .filter_map(|_| next_color(&chain, &PALETTE, 1, &mut rng))
            .collect();
        assert_eq!(seen.len(), PALETTE.len());
    }

    #[test]
    fn test_next_color_edge_cases() {
        let chain = Chain::new(R, 50.0, 200.0);
        let mut rng = Pcg32::seed_from_u64(1);
        assert_eq!(next_color(&chain, &[], 1, &mut rng), None);
        // Zero base weight on an empty chain still yields a color
        assert!(next_color(&chain, &PALETTE, 0, &mut rng).is_some());
    }

    #[test]
    fn test_spawns_at_tail_per_interval() {
        let track = track(400.0);
        let mut chain = Chain::new(R, 50.0, 200.0);
        let mut spawner = Spawner::new(PALETTE.to_vec(), 1, 2.0, 100);
        let mut rng = Pcg32::seed_from_u64(11);
        let mut ids = IdAllocator::default();

        assert!(spawner.tick(0.4, &mut chain, &track, 50, &mut rng, &mut ids).is_empty());
        let spawned = spawner.tick(0.2, &mut chain, &track, 50, &mut rng, &mut ids);
        assert_eq!(spawned.len(), 1);
        assert_eq!(chain.distance(spawned[0]), Some(track.length()));
        assert_eq!(spawner.spawned(), 1);
    }

    #[test]
    fn test_blocked_spawns_are_dropped() {
        let track = track(400.0);
        let mut chain = Chain::new(R, 50.0, 200.0);
        let mut spawner = Spawner::new(PALETTE.to_vec(), 1, 10.0, 100);
        let mut rng = Pcg32::seed_from_u64(5);
        let mut ids = IdAllocator::default();

        // Five intervals elapse but the tail stays occupied after the first spawn
        let spawned = spawner.tick(0.5, &mut chain, &track, 50, &mut rng, &mut ids);
        assert_eq!(spawned.len(), 1);

        // Nothing carried over: room appears but only one new interval elapses
        chain.advance(1.0);
        let spawned = spawner.tick(0.1, &mut chain, &track, 50, &mut rng, &mut ids);
        assert_eq!(spawned.len(), 1);
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn test_capacity_and_threshold() {
        let track = track(4000.0);
        let mut chain = Chain::new(R, 50.0, 200.0);
        let mut rng = Pcg32::seed_from_u64(5);
        let mut ids = IdAllocator::default();

        let mut spawner = Spawner::new(PALETTE.to_vec(), 1, 1.0, 100);
        spawner.seed_chain(3, &mut chain, &track, &mut rng, &mut ids);
        chain.advance(10.0);
        assert!(spawner.tick(1.0, &mut chain, &track, 3, &mut rng, &mut ids).is_empty());

        let mut spawner = Spawner::new(PALETTE.to_vec(), 1, 1.0, 2);
        let mut chain = Chain::new(R, 50.0, 200.0);
        for _ in 0..5 {
            spawner.tick(1.0, &mut chain, &track, 50, &mut rng, &mut ids);
            chain.advance(1.0);
        }
        assert_eq!(chain.len(), 2);
        assert!(spawner.is_exhausted());
    }

    #[test]
    fn test_seed_chain_packs_from_tail() {
        let track = track(400.0);
        let mut chain = Chain::new(R, 50.0, 200.0);
        let mut spawner = Spawner::new(PALETTE.to_vec(), 1, 1.0, 100);
        let mut rng = Pcg32::seed_from_u64(9);
        let mut ids = IdAllocator::default();

        let seeded = spawner.seed_chain(5, &mut chain, &track, &mut rng, &mut ids);
        assert_eq!(seeded.len(), 5);
        assert_eq!(spawner.spawned(), 5);
        let ds: Vec<f32> = chain.iter().map(|(h, _)| chain.distance(h).unwrap()).collect();
        let len = track.length();
        let expected: Vec<f32> = (0..5).rev().map(|i| len - i as f32 * 20.0).collect();
        for (d, e) in ds.iter().zip(&expected) {
            assert!((d - e).abs() < 1e-3);
        }
    }

    #[test]
    fn test_seed_chain_truncates_on_short_track() {
        let track = track(100.0);
        let mut chain = Chain::new(R, 50.0, 200.0);
        let mut spawner = Spawner::new(PALETTE.to_vec(), 1, 1.0, 100);
        let mut rng = Pcg32::seed_from_u64(9);
        let mut ids = IdAllocator::default();
        let seeded = spawner.seed_chain(20, &mut chain, &track, &mut rng, &mut ids);
        assert!(seeded.len() < 20);
        assert!(chain.iter().all(|(h, _)| chain.distance(h).unwrap() > 0.0));
    }
}
