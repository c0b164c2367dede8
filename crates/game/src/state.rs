use std::fmt;

use glam::Vec2;

use crate::constants::{ARENA_CENTER, SPAWN_OFFSET, WIN_SCORE};
use crate::physics::{Craft, Projectile};

/// Fixed seat of a player. Crafts, scores and projectile owners are keyed
/// by seat, never by handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerId {
    One,
    Two,
}

impl PlayerId {
    pub const ALL: [PlayerId; 2] = [PlayerId::One, PlayerId::Two];

    pub fn from_number(number: i64) -> Option<Self> {
        match number {
            1 => Some(PlayerId::One),
            2 => Some(PlayerId::Two),
            _ => None,
        }
    }

    pub fn number(self) -> u8 {
        match self {
            PlayerId::One => 1,
            PlayerId::Two => 2,
        }
    }

    pub fn index(self) -> usize {
        self.number() as usize - 1
    }

    pub fn other(self) -> Self {
        match self {
            PlayerId::One => PlayerId::Two,
            PlayerId::Two => PlayerId::One,
        }
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// One immutable instant of shared state, the unit exchanged between peers.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub crafts: [Craft; 2],
    pub projectiles: Vec<Projectile>,
    pub scores: [u32; 2],
    pub game_over: bool,
}

impl Snapshot {
    pub fn craft(&self, player: PlayerId) -> &Craft {
        &self.crafts[player.index()]
    }

    pub fn score(&self, player: PlayerId) -> u32 {
        self.scores[player.index()]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    crafts: [Craft; 2],
    projectiles: Vec<Projectile>,
    scores: [u32; 2],
    game_over: bool,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    pub fn new() -> Self {
        Self {
            crafts: Self::spawn_crafts(),
            projectiles: Vec::new(),
            scores: [0, 0],
            game_over: false,
        }
    }

    /// Both crafts start beside the well, facing away from each other.
    fn spawn_crafts() -> [Craft; 2] {
        [
            Craft::new(ARENA_CENTER - Vec2::new(SPAWN_OFFSET, 0.0), 180.0),
            Craft::new(ARENA_CENTER + Vec2::new(SPAWN_OFFSET, 0.0), 0.0),
        ]
    }

    pub fn craft(&self, player: PlayerId) -> &Craft {
        &self.crafts[player.index()]
    }

    pub fn craft_mut(&mut self, player: PlayerId) -> &mut Craft {
        &mut self.crafts[player.index()]
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn add_projectile(&mut self, projectile: Projectile) {
        self.projectiles.push(projectile);
    }

    /// Drops every projectile fired by `owner`.
    pub fn remove_projectiles_of(&mut self, owner: PlayerId) {
        self.projectiles.retain(|p| p.owner != owner);
    }

    /// Clear-then-add. Inactive entries are not carried over.
    pub fn replace_projectiles(&mut self, projectiles: impl IntoIterator<Item = Projectile>) {
        self.projectiles.clear();
        self.projectiles
            .extend(projectiles.into_iter().filter(|p| p.active));
    }

    /// Clear-then-add restricted to `owner`'s projectiles. Entries owned by
    /// anyone else in `projectiles` are ignored.
    pub fn replace_projectiles_of(
        &mut self,
        owner: PlayerId,
        projectiles: impl IntoIterator<Item = Projectile>,
    ) {
        self.remove_projectiles_of(owner);
        self.projectiles.extend(
            projectiles
                .into_iter()
                .filter(|p| p.active && p.owner == owner),
        );
    }

    pub fn update_projectiles(&mut self, dt: f32) {
        for projectile in &mut self.projectiles {
            projectile.update(dt);
        }
    }

    pub fn remove_inactive_projectiles(&mut self) {
        self.projectiles.retain(|p| p.active);
    }

    pub fn score(&self, player: PlayerId) -> u32 {
        self.scores[player.index()]
    }

    /// Overwrites a score. Reaching the winning score latches game over.
    pub fn set_score(&mut self, player: PlayerId, score: u32) {
        self.scores[player.index()] = score;
        self.check_game_over();
    }

    pub fn increment_score(&mut self, player: PlayerId) {
        self.scores[player.index()] += 1;
        self.check_game_over();
    }

    pub fn reset_scores(&mut self) {
        self.scores = [0, 0];
    }

    fn check_game_over(&mut self) {
        if self.has_winner() {
            self.game_over = true;
        }
    }

    pub fn has_winner(&self) -> bool {
        self.winner().is_some()
    }

    pub fn winner(&self) -> Option<PlayerId> {
        PlayerId::ALL
            .into_iter()
            .find(|&player| self.score(player) >= WIN_SCORE)
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn set_game_over(&mut self, game_over: bool) {
        self.game_over = game_over;
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            crafts: self.crafts,
            projectiles: self
                .projectiles
                .iter()
                .filter(|p| p.active)
                .copied()
                .collect(),
            scores: self.scores,
            game_over: self.game_over,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_ids() {
        assert_eq!(PlayerId::from_number(1), Some(PlayerId::One));
        assert_eq!(PlayerId::from_number(2), Some(PlayerId::Two));
        assert_eq!(PlayerId::from_number(3), None);
        assert_eq!(PlayerId::One.other(), PlayerId::Two);
        assert_eq!(PlayerId::Two.index(), 1);
    }

    #[test]
    fn initial_layout() {
        let state = GameState::new();
        assert_eq!(state.craft(PlayerId::One).heading, 180.0);
        assert_eq!(state.craft(PlayerId::Two).heading, 0.0);
        assert!(state.craft(PlayerId::One).position.x < state.craft(PlayerId::Two).position.x);
        assert!(!state.is_game_over());
    }

    #[test]
    fn winning_score_latches_game_over() {
        let mut state = GameState::new();
        for _ in 0..WIN_SCORE - 1 {
            state.increment_score(PlayerId::Two);
        }
        assert!(!state.is_game_over());

        state.increment_score(PlayerId::Two);
        assert!(state.is_game_over());
        assert_eq!(state.winner(), Some(PlayerId::Two));

        state.set_score(PlayerId::Two, 0);
        assert!(state.is_game_over());
    }

    #[test]
    fn snapshot_skips_inactive_projectiles() {
        let mut state = GameState::new();
        state.add_projectile(Projectile::fire(Vec2::new(5.0, 5.0), Vec2::X, PlayerId::One));
        state.add_projectile(Projectile::fire(Vec2::new(5.0, 5.0), Vec2::ZERO, PlayerId::Two));

        let snapshot = state.snapshot();
        assert_eq!(snapshot.projectiles.len(), 1);
        assert_eq!(snapshot.projectiles[0].owner, PlayerId::One);
    }

    #[test]
    fn replace_projectiles_of_keeps_other_owner() {
        let mut state = GameState::new();
        state.add_projectile(Projectile::from_parts(Vec2::ONE, Vec2::X, PlayerId::One));
        state.add_projectile(Projectile::from_parts(Vec2::ONE, Vec2::Y, PlayerId::Two));

        state.replace_projectiles_of(
            PlayerId::Two,
            [
                Projectile::from_parts(Vec2::new(7.0, 8.0), Vec2::Y, PlayerId::Two),
                Projectile::from_parts(Vec2::new(9.0, 9.0), Vec2::X, PlayerId::One),
            ],
        );

        let owners: Vec<_> = state.projectiles().iter().map(|p| p.owner).collect();
        assert_eq!(owners, vec![PlayerId::One, PlayerId::Two]);
        assert_eq!(state.projectiles()[0].position, Vec2::ONE);
        assert_eq!(state.projectiles()[1].position, Vec2::new(7.0, 8.0));
    }
}
