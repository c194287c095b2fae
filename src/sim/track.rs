//! Track geometry: a chain of cubic Bézier segments parameterized by arc length
//!
//! Distance 0 is the sink (the first control point); distance `length()` is
//! the tail where new markers enter. Segments share endpoints, so a track with
//! N segments has `3N + 1` control points.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{ARC_SAMPLES_PER_SEGMENT, CLOSEST_SAMPLES};
use crate::error::TrackError;
use crate::{cubic_derivative, cubic_point};

/// Immutable curve with a precomputed arc-length table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    points: Vec<Vec2>,
    segments: usize,
    /// Cumulative length at uniform parameter samples (`table[i]` is the length at t = i / samples)
    table: Vec<f32>,
    length: f32,
}

impl Track {
    pub fn new(points: Vec<Vec2>) -> Result<Self, TrackError> {
        Self::with_resolution(points, ARC_SAMPLES_PER_SEGMENT)
    }

    /// Build a track with `samples_per_segment` chords per segment in the length table
    pub fn with_resolution(
        mut points: Vec<Vec2>,
        samples_per_segment: usize,
    ) -> Result<Self, TrackError> {
        if points.len() < 4 {
            return Err(TrackError::InvalidGeometry {
                points: points.len(),
            });
        }

        let segments = (points.len() - 1) / 3;
        let used = segments * 3 + 1;
        if used < points.len() {
            log::warn!(
                "Ignoring {} trailing control points that do not complete a segment",
                points.len() - used
            );
            points.truncate(used);
        }

        let samples = samples_per_segment.max(1) * segments;
        let mut table = Vec::with_capacity(samples + 1);
        table.push(0.0);

        let mut track = Self {
            points,
            segments,
            table: Vec::new(),
            length: 0.0,
        };

        let mut prev = track.eval(0.0);
        let mut total = 0.0;
        for i in 1..=samples {
            let p = track.eval(i as f32 / samples as f32);
            total += p.distance(prev);
            table.push(total);
            prev = p;
        }

        track.table = table;
        track.length = total;
        Ok(track)
    }

    /// Total arc length
    #[inline]
    pub fn length(&self) -> f32 {
        self.length
    }

    pub fn segment_count(&self) -> usize {
        self.segments
    }

    pub fn control_points(&self) -> &[Vec2] {
        &self.points
    }

    /// Position at distance 0
    pub fn sink(&self) -> Vec2 {
        self.points[0]
    }

    /// Position at distance `length()`
    pub fn tail(&self) -> Vec2 {
        self.points[self.points.len() - 1]
    }

    /// Position at `distance` along the track (clamped)
    pub fn point_at(&self, distance: f32) -> Vec2 {
        self.eval(self.param_at(distance))
    }

    /// Unit direction of travel toward increasing distance (clamped)
    pub fn tangent_at(&self, distance: f32) -> Vec2 {
        let t = self.param_at(distance);
        let (seg, local) = self.locate(t);
        let [p0, p1, p2, p3] = self.segment(seg);
        let d = cubic_derivative(p0, p1, p2, p3, local);
        if let Some(dir) = d.try_normalize() {
            return dir;
        }

        // Degenerate derivative (coincident handles): fall back to the nearest chord
        let samples = self.table.len() - 1;
        let i = ((t * samples as f32) as usize).min(samples - 1);
        let a = self.eval(i as f32 / samples as f32);
        let b = self.eval((i + 1) as f32 / samples as f32);
        (b - a).normalize_or(Vec2::X)
    }

    /// Approximate track distance nearest to `point`, using the default sample count
    pub fn closest_distance(&self, point: Vec2) -> f32 {
        self.closest_distance_with(point, CLOSEST_SAMPLES)
    }

    /// Approximate track distance nearest to `point` by uniform sampling.
    ///
    /// Returns the best of `samples + 1` evenly spaced distances, so the error
    /// is bounded by half the sample spacing. Raise `samples` for accuracy.
    pub fn closest_distance_with(&self, point: Vec2, samples: usize) -> f32 {
        let samples = samples.max(1);
        let step = self.length / samples as f32;

        let mut best = 0.0;
        let mut best_dist_sq = f32::INFINITY;
        for i in 0..=samples {
            let d = i as f32 * step;
            let dist_sq = self.point_at(d).distance_squared(point);
            if dist_sq < best_dist_sq {
                best_dist_sq = dist_sq;
                best = d;
            }
        }
        best
    }

    /// Cumulative length table (monotonic, starts at 0, ends at `length()`)
    pub fn length_table(&self) -> &[f32] {
        &self.table
    }

    /// Convert a distance into the global curve parameter t in [0, 1]
    fn param_at(&self, distance: f32) -> f32 {
        let samples = self.table.len() - 1;
        let d = distance.clamp(0.0, self.length);

        // Index of the last table entry <= d
        let upper = self.table.partition_point(|&len| len <= d);
        let i = upper.saturating_sub(1).min(samples - 1);

        let lo = self.table[i];
        let hi = self.table[i + 1];
        let frac = if hi > lo { ((d - lo) / (hi - lo)).clamp(0.0, 1.0) } else { 0.0 };
        (i as f32 + frac) / samples as f32
    }

    /// Map global t to (segment index, local t)
    fn locate(&self, t: f32) -> (usize, f32) {
        let scaled = t.clamp(0.0, 1.0) * self.segments as f32;
        let seg = (scaled as usize).min(self.segments - 1);
        (seg, scaled - seg as f32)
    }

    fn segment(&self, seg: usize) -> [Vec2; 4] {
        let base = seg * 3;
        [
            self.points[base],
            self.points[base + 1],
            self.points[base + 2],
            self.points[base + 3],
        ]
    }

    fn eval(&self, t: f32) -> Vec2 {
        let (seg, local) = self.locate(t);
        let [p0, p1, p2, p3] = self.segment(seg);
        cubic_point(p0, p1, p2, p3, local)
    }
}
