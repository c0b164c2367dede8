mod input;
mod rules;
mod tick;

pub use input::{InputFlags, apply_input};
pub use rules::{HitEvent, Simulation, random_spawn_point};
pub use tick::FixedTimestep;
