//! The player's launcher

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::chain::Chain;
use super::marker::{Color, IdAllocator, Marker};
use super::spawner::{Spawner, next_color};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shooter {
    pub pos: Vec2,
    /// Unit aim direction
    pub aim: Vec2,
    /// Color loaded for the next shot
    pub current: Color,
    /// Color that will be loaded after it
    pub reserve: Color,
    /// Seconds until the next shot is allowed
    pub cooldown: f32,
}

impl Shooter {
    pub fn new(pos: Vec2, current: Color, reserve: Color) -> Self {
        Self {
            pos,
            aim: Vec2::Y,
            current,
            reserve,
            cooldown: 0.0,
        }
    }

    /// Point the launcher along `direction` (zero vectors are ignored)
    pub fn aim(&mut self, direction: Vec2) {
        if let Some(dir) = direction.try_normalize() {
            self.aim = dir;
        }
    }

    pub fn cool_down(&mut self, dt: f32) {
        self.cooldown = (self.cooldown - dt).max(0.0);
    }

    pub fn ready(&self) -> bool {
        self.cooldown <= 0.0
    }

    /// Launch the loaded color; `None` while cooling down
    pub fn fire<R: Rng + ?Sized>(
        &mut self,
        speed: f32,
        cooldown: f32,
        spawner: &Spawner,
        chain: &Chain,
        rng: &mut R,
        ids: &mut IdAllocator,
    ) -> Option<Marker> {
        if !self.ready() {
            return None;
        }

        let shot = Marker::flying(ids.next_id(), self.current, self.pos, self.aim * speed);
        self.current = self.reserve;
        if let Some(color) = spawner.pick_color(chain, rng) {
            self.reserve = color;
        }
        self.cooldown = cooldown;
        Some(shot)
    }

    /// Exchange current and reserve; false when they are the same color
    pub fn swap(&mut self) -> bool {
        if self.current == self.reserve {
            return false;
        }
        std::mem::swap(&mut self.current, &mut self.reserve);
        true
    }

    /// Re-draw loaded colors that no longer appear in a non-empty chain.
    ///
    /// Replacements are drawn only from colors still in the chain.
    pub fn refresh<R: Rng + ?Sized>(&mut self, spawner: &Spawner, chain: &Chain, rng: &mut R) {
        if chain.is_empty() {
            return;
        }
        for slot in [&mut self.current, &mut self.reserve] {
            if chain.count_color(*slot) == 0 {
                if let Some(color) = next_color(chain, spawner.palette(), 0, rng) {
                    *slot = color;
                }
            }
        }
    }
}
