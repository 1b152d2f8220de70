use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use uuid::Uuid;

/// A legacy item. `attr` carries the mod the item grants, if any.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerBat {
    pub id: String,
    pub name: String,
    pub attr: Option<String>,
}

/// The slice of an archived player record the reconstruction needs: name
/// plus every attribute list that can contribute a displayed mod.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChroniclerPlayer {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub perm_attr: Vec<String>,
    #[serde(default)]
    pub seas_attr: Vec<String>,
    #[serde(default)]
    pub game_attr: Vec<String>,
    #[serde(default)]
    pub item_attr: Vec<String>,
    #[serde(default)]
    pub bat: Option<PlayerBat>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRoster {
    pub nickname: String,
    pub lineup: Vec<ChroniclerPlayer>,
}

/// Directory lookup for teams and players at a point in time. The network
/// (or cache) behind this lives outside the crate; results must be
/// idempotent for the same inputs.
pub trait RosterSource {
    fn load_team(&self, team_id: Uuid, at: DateTime<Utc>) -> Result<TeamRoster>;
    fn load_player(&self, player_id: Uuid, at: DateTime<Utc>) -> Result<ChroniclerPlayer>;
}

/// A fully materialized roster set, e.g. deserialized from a recorded game
/// file. Lookups ignore the timestamp: the recording is assumed to hold the
/// rosters as they were during the game.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticRoster {
    pub teams: HashMap<Uuid, TeamRoster>,
    #[serde(default)]
    pub players: HashMap<Uuid, ChroniclerPlayer>,
}

impl RosterSource for StaticRoster {
    fn load_team(&self, team_id: Uuid, _at: DateTime<Utc>) -> Result<TeamRoster> {
        self.teams.get(&team_id)
            .cloned()
            .ok_or_else(|| anyhow!("No roster recorded for team {}", team_id))
    }

    fn load_player(&self, player_id: Uuid, _at: DateTime<Utc>) -> Result<ChroniclerPlayer> {
        if let Some(player) = self.players.get(&player_id) {
            return Ok(player.clone());
        }

        // Lineup players don't need to be recorded twice
        self.teams.values()
            .flat_map(|team| &team.lineup)
            .find(|player| player.id == player_id)
            .cloned()
            .ok_or_else(|| anyhow!("No roster recorded for player {}", player_id))
    }
}
