use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;

use resim::api::{ChroniclerGameUpdate, EventuallyEvent};
use resim::roster::StaticRoster;
use resim::replay_game;

/// A recorded game: the archived updates, the feed, and the rosters as they
/// were at game time. Everything the reconstruction needs, no network.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordedGame {
    rosters: StaticRoster,
    updates: Vec<ChroniclerGameUpdate>,
    feed: Vec<EventuallyEvent>,
}

fn main() -> Result<()> {
    env_logger::init();

    let path = std::env::args().nth(1)
        .context("Usage: resim <recorded-game.json>")?;
    let file = File::open(&path)
        .with_context(|| format!("Couldn't open {}", path))?;
    let recorded: RecordedGame = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Couldn't parse {}", path))?;

    let emitted = replay_game(&recorded.updates, &recorded.feed, &recorded.rosters)?;
    println!("{} documents reconstructed", emitted.len());

    Ok(())
}
