use glam::Vec2;

use crate::constants::{
    ARENA_CENTER, ARENA_HEIGHT, ARENA_WIDTH, FRICTION, GRAVITY_STRENGTH, MAX_SPEED,
    MIN_GRAVITY_DISTANCE, ROTATION_SPEED, THRUST_ACCELERATION, VELOCITY_SNAP,
};

/// A player-controlled ship. Heading is in degrees, `0` points along +x and
/// angles grow clockwise in screen space (y down).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Craft {
    pub position: Vec2,
    pub heading: f32,
    pub velocity: Vec2,
    pub thrusting: bool,
}

impl Default for Craft {
    fn default() -> Self {
        Self::new(Vec2::ZERO, 0.0)
    }
}

impl Craft {
    pub fn new(position: Vec2, heading: f32) -> Self {
        Self {
            position,
            heading,
            velocity: Vec2::ZERO,
            thrusting: false,
        }
    }

    /// Unit vector along the current heading.
    pub fn forward(&self) -> Vec2 {
        Vec2::from_angle(self.heading.to_radians())
    }

    pub fn rotate_left(&mut self, dt: f32) {
        self.heading = (self.heading - ROTATION_SPEED * dt).rem_euclid(360.0);
    }

    pub fn rotate_right(&mut self, dt: f32) {
        self.heading = (self.heading + ROTATION_SPEED * dt).rem_euclid(360.0);
    }

    pub fn apply_thrust(&mut self, dt: f32) {
        self.thrusting = true;
        self.velocity += self.forward() * THRUST_ACCELERATION * dt;
        self.velocity = self.velocity.clamp_length_max(MAX_SPEED);
    }

    /// Gravity, friction, integration, then edge wrap. Does not touch
    /// `thrusting`, which belongs to the input layer.
    pub fn update(&mut self, dt: f32) {
        self.apply_gravity(dt);
        self.apply_friction();
        self.position += self.velocity * dt;
        self.wrap_around();
    }

    pub fn reset(&mut self, position: Vec2, heading: f32) {
        *self = Self::new(position, heading);
    }

    fn apply_gravity(&mut self, dt: f32) {
        let to_center = ARENA_CENTER - self.position;
        let distance = to_center.length();
        if distance < MIN_GRAVITY_DISTANCE {
            return;
        }
        let acceleration = GRAVITY_STRENGTH / distance;
        self.velocity += to_center / distance * acceleration * dt;
    }

    fn apply_friction(&mut self) {
        self.velocity *= FRICTION;
        if self.velocity.x.abs() < VELOCITY_SNAP {
            self.velocity.x = 0.0;
        }
        if self.velocity.y.abs() < VELOCITY_SNAP {
            self.velocity.y = 0.0;
        }
    }

    fn wrap_around(&mut self) {
        if self.position.x < 0.0 {
            self.position.x = ARENA_WIDTH;
        } else if self.position.x > ARENA_WIDTH {
            self.position.x = 0.0;
        }

        if self.position.y < 0.0 {
            self.position.y = ARENA_HEIGHT;
        } else if self.position.y > ARENA_HEIGHT {
            self.position.y = 0.0;
        }
    }
}
