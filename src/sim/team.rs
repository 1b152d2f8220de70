use anyhow::{Context, Result, ensure};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::api::{ChroniclerGameUpdate, GameByTeam, GameUpdate};
use crate::roster::RosterSource;
use crate::sim::PlayerState;

/// Which half of the prefixed document a team owns.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Away,
    Home,
}

impl Side {
    pub fn of<'a>(&self, update: &'a GameUpdate) -> &'a GameByTeam {
        match self {
            Side::Away => &update.away,
            Side::Home => &update.home,
        }
    }

    pub fn of_mut<'a>(&self, update: &'a mut GameUpdate) -> &'a mut GameByTeam {
        match self {
            Side::Away => &mut update.away,
            Side::Home => &mut update.home,
        }
    }
}

/// Early game updates are published with most fields blanked, and which
/// fields are populated varies by update. Config comes from the first
/// update that actually carries a value.
pub(crate) fn first_truthy<T>(
    updates: &[ChroniclerGameUpdate],
    f: impl Fn(&GameUpdate) -> Option<T>,
) -> Option<T> {
    updates.iter().find_map(|update| f(&update.data))
}

pub struct TeamState {
    pub nickname: String,
    pub pitcher: PlayerState,
    pub lineup: Vec<PlayerState>,
    pub batter_index: i64,
}

impl TeamState {
    pub fn from_updates(
        updates: &[ChroniclerGameUpdate],
        at: DateTime<Utc>,
        side: Side,
        roster: &dyn RosterSource,
    ) -> Result<TeamState> {
        let team_id = first_truthy(updates, |g| {
            let team = side.of(g).team;
            (!team.is_nil()).then_some(team)
        }).with_context(|| format!("No update has a team id for {:?}", side))?;
        let team = roster.load_team(team_id, at)?;

        let pitcher_id = first_truthy(updates, |g| side.of(g).pitcher);
        let pitcher_name = first_truthy(updates, |g| {
            let name = &side.of(g).pitcher_name;
            (!name.is_empty()).then(|| name.clone())
        });
        let (pitcher_id, pitcher_name) = match (pitcher_id, pitcher_name) {
            (Some(id), Some(name)) => (id, name),
            _ => anyhow::bail!("No update has a pitcher for {:?}", side),
        };
        let pitcher_mods: HashSet<String> = updates.iter()
            .map(|u| &side.of(&u.data).pitcher_mod)
            .filter(|m| !m.is_empty())
            .cloned()
            .collect();

        Ok(TeamState {
            nickname: team.nickname,
            pitcher: PlayerState {
                id: pitcher_id,
                name: pitcher_name,
                mods: pitcher_mods,
                // Pitchers may have legacy items but they're never displayed
                legacy_item: None,
            },
            lineup: team.lineup.iter().map(PlayerState::from_player).collect(),
            batter_index: -1,
        })
    }

    pub fn advance_batter(&mut self) {
        self.batter_index += 1;
        if self.batter_index >= self.lineup.len() as i64 {
            self.batter_index = 0;
        }
    }

    pub fn current_batter(&self) -> Result<&PlayerState> {
        ensure!(self.batter_index >= 0, "No batter has come up yet");
        Ok(&self.lineup[self.batter_index as usize])
    }
}
