use glam::Vec2;

pub const ARENA_WIDTH: f32 = 1024.0;
pub const ARENA_HEIGHT: f32 = 768.0;
pub const ARENA_CENTER: Vec2 = Vec2::new(ARENA_WIDTH / 2.0, ARENA_HEIGHT / 2.0);

// Craft
pub const ROTATION_SPEED: f32 = 180.0; // deg/s
pub const THRUST_ACCELERATION: f32 = 200.0; // px/s^2
pub const MAX_SPEED: f32 = 300.0; // px/s
pub const FRICTION: f32 = 0.98; // per step
pub const VELOCITY_SNAP: f32 = 0.1;
pub const CRAFT_RADIUS: f32 = 20.0;
pub const SPAWN_OFFSET: f32 = 40.0;

// Gravity well at the arena center, pull falls off as G / r
pub const GRAVITY_STRENGTH: f32 = 50_000.0;
pub const MIN_GRAVITY_DISTANCE: f32 = 10.0;

// Projectiles
pub const PROJECTILE_SPEED: f32 = 400.0;
pub const PROJECTILE_RADIUS: f32 = 2.0;
pub const MUZZLE_OFFSET: f32 = 15.0;

// Respawn
pub const RESPAWN_CENTER_CLEARANCE: f32 = 100.0;
pub const RESPAWN_EDGE_MARGIN: f32 = 50.0;

// Rules
pub const WIN_SCORE: u32 = 5;

// Timing
pub const SIM_TICK_RATE: u32 = 60;
pub const SYNC_RATE: u32 = 30;
pub const RECONNECT_INTERVAL_SECS: f32 = 2.0;
