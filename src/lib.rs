pub mod api;
pub mod parse;
pub mod roster;
pub mod sim;
pub mod replay;

pub use replay::{Replay, replay_game};
