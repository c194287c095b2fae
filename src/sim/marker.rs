//! Markers: the colored pieces that roll along the track or fly as projectiles

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Stable marker identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarkerId(pub u32);

/// Allocator for marker identities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdAllocator {
    next: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    pub fn next_id(&mut self) -> MarkerId {
        let id = MarkerId(self.next);
        self.next += 1;
        id
    }
}

/// Marker palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Green,
    Blue,
    Yellow,
    Purple,
}

impl Color {
    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Green => "green",
            Color::Blue => "blue",
            Color::Yellow => "yellow",
            Color::Purple => "purple",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a marker lives: on the track (chain-resident) or in free flight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Placement {
    /// Distance along the track from the sink
    Resident { distance: f32 },
    /// Free-flying projectile
    Flying { pos: Vec2, vel: Vec2 },
}

/// Visual status, read by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MarkerStatus {
    #[default]
    Resting,
    /// Spliced into the chain during the current tick
    JustInserted,
    /// Removed as part of a run
    Exploding,
}

/// A single chain piece or projectile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Marker {
    pub id: MarkerId,
    pub color: Color,
    pub placement: Placement,
    pub status: MarkerStatus,
}

impl Marker {
    /// A marker resting on the track at `distance`
    pub fn resident(id: MarkerId, color: Color, distance: f32) -> Self {
        Self {
            id,
            color,
            placement: Placement::Resident { distance },
            status: MarkerStatus::Resting,
        }
    }

    /// A projectile at `pos` moving with `vel`
    pub fn flying(id: MarkerId, color: Color, pos: Vec2, vel: Vec2) -> Self {
        Self {
            id,
            color,
            placement: Placement::Flying { pos, vel },
            status: MarkerStatus::Resting,
        }
    }

    /// Track distance, if chain-resident
    pub fn distance(&self) -> Option<f32> {
        match self.placement {
            Placement::Resident { distance } => Some(distance),
            Placement::Flying { .. } => None,
        }
    }

    /// Free position, if flying
    pub fn flight_pos(&self) -> Option<Vec2> {
        match self.placement {
            Placement::Flying { pos, .. } => Some(pos),
            Placement::Resident { .. } => None,
        }
    }

    pub fn is_flying(&self) -> bool {
        matches!(self.placement, Placement::Flying { .. })
    }

    /// Integrate a flying marker; no-op when resident
    pub fn advance_flight(&mut self, dt: f32) {
        if let Placement::Flying { ref mut pos, vel } = self.placement {
            *pos += vel * dt;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placement_accessors_are_exclusive() {
        let m = Marker::resident(MarkerId(1), Color::Red, 42.0);
        assert_eq!(m.distance(), Some(42.0));
        assert_eq!(m.flight_pos(), None);
        assert!(!m.is_flying());

        let p = Marker::flying(MarkerId(2), Color::Blue, Vec2::new(1.0, 2.0), Vec2::X);
        assert_eq!(p.distance(), None);
        assert_eq!(p.flight_pos(), Some(Vec2::new(1.0, 2.0)));
    }

    #[test]
    fn test_advance_flight() {
        let mut p = Marker::flying(MarkerId(1), Color::Green, Vec2::ZERO, Vec2::new(100.0, -50.0));
        p.advance_flight(0.5);
        assert_eq!(p.flight_pos(), Some(Vec2::new(50.0, -25.0)));

        let mut r = Marker::resident(MarkerId(2), Color::Green, 10.0);
        r.advance_flight(1.0);
        assert_eq!(r.distance(), Some(10.0));
    }

    #[test]
    fn test_ids_are_unique() {
        let mut ids = IdAllocator::default();
        let a = ids.next_id();
        let b = ids.next_id();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn test_color_serde_lowercase() {
        let json = serde_json::to_string(&Color::Purple).unwrap();
        assert_eq!(json, "\"purple\"");
        let back: Color = serde_json::from_str("\"yellow\"").unwrap();
        assert_eq!(back, Color::Yellow);
    }
}
