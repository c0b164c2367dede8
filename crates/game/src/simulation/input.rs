use bitflags::bitflags;

use crate::constants::MUZZLE_OFFSET;
use crate::physics::Projectile;
use crate::state::{GameState, PlayerId};

bitflags! {
    /// Controls sampled once per simulation step. `FIRE` is a one-shot
    /// request, the caller clears it after the first step that sees it.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct InputFlags: u8 {
        const ROTATE_LEFT = 1 << 0;
        const ROTATE_RIGHT = 1 << 1;
        const THRUST = 1 << 2;
        const FIRE = 1 << 3;
    }
}

/// Steers and integrates `player`'s craft, then fires if requested.
/// Returns true when a projectile was launched.
pub fn apply_input(state: &mut GameState, player: PlayerId, input: InputFlags, dt: f32) -> bool {
    let craft = state.craft_mut(player);

    if input.contains(InputFlags::ROTATE_LEFT) {
        craft.rotate_left(dt);
    }
    if input.contains(InputFlags::ROTATE_RIGHT) {
        craft.rotate_right(dt);
    }
    if input.contains(InputFlags::THRUST) {
        craft.apply_thrust(dt);
    } else {
        craft.thrusting = false;
    }
    craft.update(dt);

    if !input.contains(InputFlags::FIRE) {
        return false;
    }

    // One live projectile per player: a new shot replaces the old one.
    let direction = craft.forward();
    let muzzle = craft.position + direction * MUZZLE_OFFSET;
    state.remove_projectiles_of(player);
    state.add_projectile(Projectile::fire(muzzle, direction, player));
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thrust_flag_follows_input() {
        let mut state = GameState::new();
        apply_input(&mut state, PlayerId::One, InputFlags::THRUST, 1.0 / 60.0);
        assert!(state.craft(PlayerId::One).thrusting);

        apply_input(&mut state, PlayerId::One, InputFlags::empty(), 1.0 / 60.0);
        assert!(!state.craft(PlayerId::One).thrusting);
    }

    #[test]
    fn firing_replaces_previous_shot() {
        let mut state = GameState::new();
        assert!(apply_input(&mut state, PlayerId::Two, InputFlags::FIRE, 1.0 / 60.0));
        assert!(apply_input(&mut state, PlayerId::Two, InputFlags::FIRE, 1.0 / 60.0));

        assert_eq!(state.projectiles().len(), 1);
        assert_eq!(state.projectiles()[0].owner, PlayerId::Two);
    }

    #[test]
    fn input_only_moves_own_craft() {
        let mut state = GameState::new();
        let before = *state.craft(PlayerId::Two);
        apply_input(
            &mut state,
            PlayerId::One,
            InputFlags::ROTATE_LEFT | InputFlags::THRUST,
            1.0 / 60.0,
        );
        assert_eq!(*state.craft(PlayerId::Two), before);
    }
}
