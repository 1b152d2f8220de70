mod player;
mod team;
mod game;

pub use player::{PlayerState, show_batter_mod, show_pitcher_mod, show_runner_mod};
pub use team::{Side, TeamState};
pub use game::GameState;

#[cfg(test)]
pub(crate) use game::test_support;
