use glam::Vec2;

use crate::constants::{ARENA_HEIGHT, ARENA_WIDTH, PROJECTILE_SPEED};
use crate::state::PlayerId;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projectile {
    pub position: Vec2,
    pub velocity: Vec2,
    pub owner: PlayerId,
    pub active: bool,
}

impl Projectile {
    /// Launches along `direction` at projectile speed. A zero direction
    /// produces an inactive projectile.
    pub fn fire(position: Vec2, direction: Vec2, owner: PlayerId) -> Self {
        let velocity = direction.normalize_or_zero() * PROJECTILE_SPEED;
        Self {
            position,
            velocity,
            owner,
            active: velocity != Vec2::ZERO,
        }
    }

    /// Rebuilds a live projectile exactly as it was described on the wire.
    pub fn from_parts(position: Vec2, velocity: Vec2, owner: PlayerId) -> Self {
        Self {
            position,
            velocity,
            owner,
            active: true,
        }
    }

    pub fn update(&mut self, dt: f32) {
        if !self.active {
            return;
        }
        self.position += self.velocity * dt;
        if self.is_off_screen() {
            self.active = false;
        }
    }

    pub fn is_off_screen(&self) -> bool {
        self.position.x < 0.0
            || self.position.x > ARENA_WIDTH
            || self.position.y < 0.0
            || self.position.y > ARENA_HEIGHT
    }
}
