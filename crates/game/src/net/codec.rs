//! Text wire format for one snapshot per datagram:
//!
//! ```text
//! SC1:x,y,heading,vx,vy,thrust;SC2:...;PROJ:x,y,vx,vy,owner|...;SCORE:s1,s2;GAMEOVER:0|1;
//! ```
//!
//! Tags are looked up independently. A tag that is absent or structurally
//! malformed (too few craft parts, a projectile entry without exactly five
//! parts, fewer than two scores) leaves its destination untouched; a value
//! that fails to parse as a number rejects the whole line.

use std::fmt;

use glam::Vec2;

use crate::physics::{Craft, Projectile};
use crate::state::{GameState, PlayerId, Snapshot};

const TAG_CRAFT_ONE: &str = "SC1";
const TAG_CRAFT_TWO: &str = "SC2";
const TAG_PROJECTILES: &str = "PROJ";
const TAG_SCORE: &str = "SCORE";
const TAG_GAME_OVER: &str = "GAMEOVER";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("payload is not valid UTF-8")]
    NotUtf8,
    #[error("{tag}: invalid number {value:?}")]
    InvalidNumber { tag: &'static str, value: String },
    #[error("{tag}: unknown player id {value}")]
    InvalidOwner { tag: &'static str, value: i64 },
}

/// What a decoded line says. `None` means the line did not carry that field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotDelta {
    pub crafts: [Option<Craft>; 2],
    pub projectiles: Option<Vec<Projectile>>,
    pub scores: Option<[u32; 2]>,
    pub game_over: Option<bool>,
}

impl SnapshotDelta {
    pub fn craft(&self, player: PlayerId) -> Option<&Craft> {
        self.crafts[player.index()].as_ref()
    }

    /// Writes every carried field into `state`.
    pub fn apply_to(&self, state: &mut GameState) {
        for player in PlayerId::ALL {
            if let Some(craft) = self.craft(player) {
                *state.craft_mut(player) = *craft;
            }
        }
        if let Some(projectiles) = &self.projectiles {
            state.replace_projectiles(projectiles.iter().copied());
        }
        if let Some([one, two]) = self.scores {
            state.set_score(PlayerId::One, one);
            state.set_score(PlayerId::Two, two);
        }
        if let Some(game_over) = self.game_over {
            state.set_game_over(game_over);
        }
    }
}

/// Display adapter producing the wire line. Floats use the shortest
/// representation that parses back to the same bits.
pub struct WireSnapshot<'a>(pub &'a Snapshot);

impl fmt::Display for WireSnapshot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.0;

        for (tag, player) in [(TAG_CRAFT_ONE, PlayerId::One), (TAG_CRAFT_TWO, PlayerId::Two)] {
            let craft = snapshot.craft(player);
            write!(
                f,
                "{}:{},{},{},{},{},{};",
                tag,
                craft.position.x,
                craft.position.y,
                craft.heading,
                craft.velocity.x,
                craft.velocity.y,
                u8::from(craft.thrusting)
            )?;
        }

        write!(f, "{}:", TAG_PROJECTILES)?;
        for p in snapshot.projectiles.iter().filter(|p| p.active) {
            write!(
                f,
                "{},{},{},{},{}|",
                p.position.x,
                p.position.y,
                p.velocity.x,
                p.velocity.y,
                p.owner.number()
            )?;
        }
        f.write_str(";")?;

        write!(
            f,
            "{}:{},{};{}:{};",
            TAG_SCORE,
            snapshot.score(PlayerId::One),
            snapshot.score(PlayerId::Two),
            TAG_GAME_OVER,
            u8::from(snapshot.game_over)
        )
    }
}

pub fn encode(snapshot: &Snapshot) -> String {
    WireSnapshot(snapshot).to_string()
}

pub fn decode_bytes(payload: &[u8]) -> Result<SnapshotDelta, DecodeError> {
    let line = std::str::from_utf8(payload).map_err(|_| DecodeError::NotUtf8)?;
    decode(line)
}

pub fn decode(line: &str) -> Result<SnapshotDelta, DecodeError> {
    let mut delta = SnapshotDelta::default();

    let fields = line
        .trim_end_matches(['\r', '\n'])
        .split(';')
        .filter_map(|field| field.split_once(':'));

    for (tag, body) in fields {
        match tag.trim() {
            TAG_CRAFT_ONE => {
                if let Some(craft) = decode_craft(TAG_CRAFT_ONE, body)? {
                    delta.crafts[PlayerId::One.index()] = Some(craft);
                }
            }
            TAG_CRAFT_TWO => {
                if let Some(craft) = decode_craft(TAG_CRAFT_TWO, body)? {
                    delta.crafts[PlayerId::Two.index()] = Some(craft);
                }
            }
            TAG_PROJECTILES => {
                if let Some(projectiles) = decode_projectiles(body)? {
                    delta.projectiles = Some(projectiles);
                }
            }
            TAG_SCORE => {
                if let Some(scores) = decode_scores(body)? {
                    delta.scores = Some(scores);
                }
            }
            TAG_GAME_OVER => {
                let body = body.trim();
                if !body.is_empty() {
                    delta.game_over = Some(parse::<u8>(TAG_GAME_OVER, body)? == 1);
                }
            }
            _ => {}
        }
    }

    Ok(delta)
}

/// Six parts, or five for peers that predate the thrust flag.
fn decode_craft(tag: &'static str, body: &str) -> Result<Option<Craft>, DecodeError> {
    let parts: Vec<&str> = body.split(',').collect();
    if parts.len() < 5 {
        return Ok(None);
    }

    let thrusting = match parts.get(5) {
        Some(flag) => parse::<i64>(tag, flag)? == 1,
        None => false,
    };

    Ok(Some(Craft {
        position: Vec2::new(parse(tag, parts[0])?, parse(tag, parts[1])?),
        heading: parse(tag, parts[2])?,
        velocity: Vec2::new(parse(tag, parts[3])?, parse(tag, parts[4])?),
        thrusting,
    }))
}

/// `None` when any entry is not exactly five parts; the list is then left
/// as it was rather than partly replaced.
fn decode_projectiles(body: &str) -> Result<Option<Vec<Projectile>>, DecodeError> {
    let entries: Vec<Vec<&str>> = body
        .split('|')
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.split(',').collect())
        .collect();
    if entries.iter().any(|parts| parts.len() != 5) {
        return Ok(None);
    }

    let mut projectiles = Vec::with_capacity(entries.len());
    for parts in entries {
        let owner_number = parse::<i64>(TAG_PROJECTILES, parts[4])?;
        let owner = PlayerId::from_number(owner_number).ok_or(DecodeError::InvalidOwner {
            tag: TAG_PROJECTILES,
            value: owner_number,
        })?;

        projectiles.push(Projectile::from_parts(
            Vec2::new(
                parse(TAG_PROJECTILES, parts[0])?,
                parse(TAG_PROJECTILES, parts[1])?,
            ),
            Vec2::new(
                parse(TAG_PROJECTILES, parts[2])?,
                parse(TAG_PROJECTILES, parts[3])?,
            ),
            owner,
        ));
    }

    Ok(Some(projectiles))
}

fn decode_scores(body: &str) -> Result<Option<[u32; 2]>, DecodeError> {
    let mut parts = body.split(',');
    match (parts.next(), parts.next()) {
        (Some(one), Some(two)) => Ok(Some([parse(TAG_SCORE, one)?, parse(TAG_SCORE, two)?])),
        _ => Ok(None),
    }
}

fn parse<T: std::str::FromStr>(tag: &'static str, raw: &str) -> Result<T, DecodeError> {
    raw.trim().parse().map_err(|_| DecodeError::InvalidNumber {
        tag,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_snapshot() -> Snapshot {
        let mut state = GameState::new();
        {
            let craft = state.craft_mut(PlayerId::One);
            craft.position = Vec2::new(100.125, 200.0);
            craft.heading = 33.3;
            craft.velocity = Vec2::new(-1.5, 0.1);
            craft.thrusting = true;
        }
        state.craft_mut(PlayerId::Two).velocity = Vec2::new(1e-7, -250.75);
        state.add_projectile(Projectile::from_parts(
            Vec2::new(10.0, 20.0),
            Vec2::new(400.0, 0.0),
            PlayerId::One,
        ));
        state.add_projectile(Projectile::from_parts(
            Vec2::new(0.3, 767.9),
            Vec2::new(-282.84271, 282.84271),
            PlayerId::Two,
        ));
        state.set_score(PlayerId::One, 3);
        state.set_score(PlayerId::Two, 4);
        state.snapshot()
    }

    #[test]
    fn round_trip_is_exact() {
        let snapshot = sample_snapshot();
        let delta = decode(&encode(&snapshot)).unwrap();

        assert_eq!(delta.craft(PlayerId::One), Some(snapshot.craft(PlayerId::One)));
        assert_eq!(delta.craft(PlayerId::Two), Some(snapshot.craft(PlayerId::Two)));
        assert_eq!(delta.projectiles.as_ref(), Some(&snapshot.projectiles));
        assert_eq!(delta.scores, Some(snapshot.scores));
        assert_eq!(delta.game_over, Some(false));

        let mut state = GameState::new();
        delta.apply_to(&mut state);
        assert_eq!(state.snapshot(), snapshot);
    }

    fn assert_round_trip(snapshot: &Snapshot) {
        let line = encode(snapshot);
        let delta = decode(&line).unwrap();
        let mut state = GameState::new();
        state.add_projectile(Projectile::from_parts(Vec2::ONE, Vec2::X, PlayerId::One));
        delta.apply_to(&mut state);
        assert_eq!(&state.snapshot(), snapshot, "{line}");
    }

    #[test]
    fn round_trip_covers_varied_shapes() {
        assert_round_trip(&GameState::new().snapshot());

        let mut state = GameState::new();
        {
            let craft = state.craft_mut(PlayerId::One);
            craft.position = Vec2::new(f32::MAX, -f32::MAX);
            craft.heading = 359.9;
            craft.velocity = Vec2::new(f32::MIN_POSITIVE, -1e-45);
        }
        {
            let craft = state.craft_mut(PlayerId::Two);
            craft.position = Vec2::new(-0.000123, 1023.999);
            craft.heading = 0.1;
            craft.velocity = Vec2::new(-299.99997, 123456.79);
            craft.thrusting = true;
        }
        for (owner, x) in [(PlayerId::Two, -5.5), (PlayerId::One, 1e10), (PlayerId::Two, 0.7)] {
            state.add_projectile(Projectile::from_parts(
                Vec2::new(x, -x),
                Vec2::new(-x / 3.0, 1.0 / 3.0),
                owner,
            ));
        }
        state.set_score(PlayerId::One, 4);
        state.set_score(PlayerId::Two, crate::constants::WIN_SCORE);
        assert!(state.is_game_over());
        assert_round_trip(&state.snapshot());
    }

    #[test]
    fn encodes_expected_layout() {
        let mut state = GameState::new();
        *state.craft_mut(PlayerId::One) = Craft::new(Vec2::new(1.0, 2.0), 90.0);
        *state.craft_mut(PlayerId::Two) = Craft::new(Vec2::new(3.5, 4.0), 0.0);

        assert_eq!(
            encode(&state.snapshot()),
            "SC1:1,2,90,0,0,0;SC2:3.5,4,0,0,0,0;PROJ:;SCORE:0,0;GAMEOVER:0;"
        );
    }

    #[test]
    fn empty_projectile_field_clears_list() {
        let delta = decode("PROJ:;").unwrap();
        assert_eq!(delta.projectiles, Some(Vec::new()));
    }

    #[test]
    fn missing_projectile_tag_leaves_list_alone() {
        let delta = decode("SC1:1,2,3,4,5,0;SCORE:1,1;GAMEOVER:0;").unwrap();
        assert_eq!(delta.projectiles, None);

        let mut state = GameState::new();
        state.add_projectile(Projectile::from_parts(Vec2::ONE, Vec2::X, PlayerId::Two));
        delta.apply_to(&mut state);
        assert_eq!(state.projectiles().len(), 1);
    }

    #[test]
    fn legacy_craft_field_defaults_thrust_off() {
        let delta = decode("SC2:5,6,45,1,-1;").unwrap();
        let craft = delta.craft(PlayerId::Two).unwrap();
        assert_eq!(craft.position, Vec2::new(5.0, 6.0));
        assert_eq!(craft.heading, 45.0);
        assert!(!craft.thrusting);
        assert_eq!(delta.craft(PlayerId::One), None);
    }

    #[test]
    fn short_fields_are_skipped() {
        let delta = decode("SC1:1,2,3;PROJ:1,2,3|4,5,6,7,2|;SCORE:9;").unwrap();
        assert_eq!(delta.craft(PlayerId::One), None);
        assert_eq!(delta.projectiles, None);
        assert_eq!(delta.scores, None);
    }

    #[test]
    fn short_projectile_entry_keeps_whole_list() {
        let mut state = GameState::new();
        state.add_projectile(Projectile::from_parts(Vec2::ONE, Vec2::X, PlayerId::One));
        state.add_projectile(Projectile::from_parts(Vec2::ONE, Vec2::Y, PlayerId::Two));
        let before = state.clone();

        let delta = decode("PROJ:1,2,3|4,5,6,7,2|;").unwrap();
        delta.apply_to(&mut state);

        assert_eq!(state, before);
    }

    #[test]
    fn extra_projectile_parts_are_structural() {
        let delta = decode("PROJ:1,2,3,4,1,9|;").unwrap();
        assert_eq!(delta.projectiles, None);
    }

    #[test]
    fn unknown_tags_and_order_are_tolerated() {
        let delta = decode("VERSION:3;SCORE:2,1;SC1:1,1,0,0,0,1;").unwrap();
        assert_eq!(delta.scores, Some([2, 1]));
        assert!(delta.craft(PlayerId::One).unwrap().thrusting);
    }

    #[test]
    fn non_numeric_values_fail() {
        for line in [
            "SC1:1,x,0,0,0,0;",
            "SC2:1,2,3,4,5,yes;",
            "PROJ:1,2,3,4,one|;",
            "SCORE:1,two;",
            "GAMEOVER:maybe;",
        ] {
            assert!(
                matches!(decode(line), Err(DecodeError::InvalidNumber { .. })),
                "{line} should fail"
            );
        }
    }

    #[test]
    fn unknown_owner_fails() {
        assert_eq!(
            decode("PROJ:1,2,3,4,7|;"),
            Err(DecodeError::InvalidOwner {
                tag: TAG_PROJECTILES,
                value: 7
            })
        );
    }

    #[test]
    fn invalid_utf8_fails() {
        assert_eq!(decode_bytes(&[0xff, 0xfe]), Err(DecodeError::NotUtf8));
    }
}
