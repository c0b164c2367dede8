use glam::Vec2;

use crate::constants::{
    ARENA_CENTER, ARENA_HEIGHT, ARENA_WIDTH, CRAFT_RADIUS, PROJECTILE_RADIUS,
    RESPAWN_CENTER_CLEARANCE, RESPAWN_EDGE_MARGIN, SIM_TICK_RATE,
};
use crate::rng::Rng;
use crate::state::{GameState, PlayerId};

use super::input::{InputFlags, apply_input};
use super::tick::FixedTimestep;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitEvent {
    pub shooter: PlayerId,
    pub target: PlayerId,
    /// Where the target was when it was hit, before respawn.
    pub position: Vec2,
}

/// Local gameplay for one seat: steers the local craft from input and
/// integrates the remote craft between snapshots.
pub struct Simulation {
    local: PlayerId,
    timestep: FixedTimestep,
    rng: Rng,
}

impl Simulation {
    pub fn new(local: PlayerId, rng: Rng) -> Self {
        Self {
            local,
            timestep: FixedTimestep::new(SIM_TICK_RATE),
            rng,
        }
    }

    pub fn local_player(&self) -> PlayerId {
        self.local
    }

    /// Runs as many fixed steps as `delta` covers. A fire request is
    /// consumed by the first step.
    pub fn update(&mut self, state: &mut GameState, input: InputFlags, delta: f32) -> Vec<HitEvent> {
        self.timestep.accumulate(delta);

        let mut input = input;
        let mut hits = Vec::new();
        while self.timestep.consume_tick() {
            if state.is_game_over() {
                self.timestep.reset();
                break;
            }
            let dt = self.timestep.dt();
            hits.extend(self.step(state, input, dt));
            input.remove(InputFlags::FIRE);
        }
        hits
    }

    pub fn step(&mut self, state: &mut GameState, input: InputFlags, dt: f32) -> Option<HitEvent> {
        apply_input(state, self.local, input, dt);

        state.update_projectiles(dt);
        state.remove_inactive_projectiles();
        state.craft_mut(self.local.other()).update(dt);

        let (shooter, target) = find_hit(state)?;
        Some(self.resolve_hit(state, shooter, target))
    }

    fn resolve_hit(&mut self, state: &mut GameState, shooter: PlayerId, target: PlayerId) -> HitEvent {
        let position = state.craft(target).position;

        state.remove_projectiles_of(shooter);
        state.increment_score(shooter);

        let (spawn, heading) = random_spawn_point(&mut self.rng);
        state.craft_mut(target).reset(spawn, heading);

        log::info!(
            "Player {} hit Player {}, score {}",
            shooter,
            target,
            state.score(shooter)
        );
        if let Some(winner) = state.winner() {
            log::info!("Player {} wins", winner);
        }

        HitEvent {
            shooter,
            target,
            position,
        }
    }
}

/// First live projectile touching a craft other than its owner's.
/// At most one hit is reported per step.
fn find_hit(state: &GameState) -> Option<(PlayerId, PlayerId)> {
    let reach = CRAFT_RADIUS + PROJECTILE_RADIUS;

    state
        .projectiles()
        .iter()
        .filter(|p| p.active)
        .find_map(|p| {
            let target = p.owner.other();
            let distance = p.position.distance(state.craft(target).position);
            (distance < reach).then_some((p.owner, target))
        })
}

/// Random point in the arena, pushed out to an edge if it lands on the well.
pub fn random_spawn_point(rng: &mut Rng) -> (Vec2, f32) {
    let mut position = Vec2::new(
        rng.below(ARENA_WIDTH as u32) as f32,
        rng.below(ARENA_HEIGHT as u32) as f32,
    );

    if position.distance(ARENA_CENTER) < RESPAWN_CENTER_CLEARANCE {
        if rng.coin() {
            position.x = if rng.coin() {
                RESPAWN_EDGE_MARGIN
            } else {
                ARENA_WIDTH - RESPAWN_EDGE_MARGIN
            };
        } else {
            position.y = if rng.coin() {
                RESPAWN_EDGE_MARGIN
            } else {
                ARENA_HEIGHT - RESPAWN_EDGE_MARGIN
            };
        }
    }

    let heading = rng.below(360) as f32;
    (position, heading)
}
