use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::with_prefix;
use uuid::Uuid;

/// Per-team half of the game document. Fields are PascalCase here because
/// they get camelCased by the "home"/"away" prefix on the parent.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "PascalCase")]
pub struct GameByTeam {
    pub odds: f64,
    pub outs: i64,
    pub team: Uuid,
    pub balls: i64,
    pub bases: i64,
    pub score: f64,
    pub batter: Option<Uuid>,
    pub pitcher: Option<Uuid>,
    pub strikes: i64,
    pub team_name: String,
    pub team_color: String,
    pub team_emoji: String,
    pub batter_mod: String,
    pub batter_name: String,
    pub pitcher_mod: String,
    pub pitcher_name: String,
    pub team_nickname: String,
    pub team_batter_count: i64,
    pub team_secondary_color: String,
}

/// The full game document, shaped exactly like the upstream archive's game
/// updates. Consumers compare these by equality, so field names and types
/// are part of the contract.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
// Can't use deny_unknown_fields here because of the prefixed sub-objects
#[serde(rename_all = "camelCase")]
pub struct GameUpdate {
    pub id: Uuid,
    pub day: i64,
    pub phase: i64,
    pub rules: Uuid,
    pub shame: bool,
    pub inning: i64,
    pub season: i64,
    pub weather: i64,
    pub outcomes: Vec<String>,
    pub finalized: bool,
    pub game_start: bool,
    pub play_count: i64,
    pub stadium_id: Option<Uuid>,
    pub statsheet: Uuid,
    pub at_bat_balls: i64,
    pub at_bat_strikes: i64,
    pub last_update: String,
    pub tournament: i64,
    pub repeat_count: i64,
    pub score_ledger: String,
    pub score_update: String,
    pub series_index: i64,
    pub series_length: i64,
    pub terminology: Uuid,
    pub top_of_inning: bool,
    pub game_complete: bool,
    pub is_postseason: bool,
    pub is_title_match: bool,
    pub base_runners: Vec<Uuid>,
    pub base_runner_names: Vec<String>,
    pub base_runner_mods: Vec<String>,
    pub bases_occupied: Vec<i64>,
    pub baserunner_count: i64,
    pub game_start_phase: i64,
    pub half_inning_outs: i64,
    pub new_inning_phase: i64,
    pub top_inning_score: f64,
    pub bottom_inning_score: f64,
    pub half_inning_score: f64,
    pub secret_baserunner: Option<Uuid>,

    #[serde(flatten, with = "prefix_home")]
    pub home: GameByTeam,

    #[serde(flatten, with = "prefix_away")]
    pub away: GameByTeam,
}

with_prefix!(prefix_home "home");
with_prefix!(prefix_away "away");

/// One archived observation of the game document. The ordered list of these
/// bootstraps the reconstruction, and individual ones serve as the
/// advancement oracle during replay.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChroniclerGameUpdate {
    pub timestamp: DateTime<Utc>,
    pub data: GameUpdate,
}
