use std::collections::HashSet;

use crate::roster::ChroniclerPlayer;

// Only one mod is ever displayed per slot; these are the precedence lists.
const PITCHER_MOD_ORDER: &[&str] = &["COFFEE_RALLY"];
const BATTER_MOD_ORDER: &[&str] = &["COFFEE_RALLY"];
const BASERUNNER_MOD_ORDER: &[&str] = &["BLASERUNNING", "COFFEE_RALLY"];

/// A player as the game document sees them. `mods` is the effective set
/// (all attribute lists plus the bat's attribute); it shrinks when a free
/// refill consumes `COFFEE_RALLY`, and nothing else about the player moves.
#[derive(Clone, Debug)]
pub struct PlayerState {
    pub id: uuid::Uuid,
    pub name: String,
    pub mods: HashSet<String>,
    pub legacy_item: Option<String>,
}

impl PlayerState {
    pub fn from_player(player: &ChroniclerPlayer) -> PlayerState {
        let mut mods: HashSet<String> = player.perm_attr.iter()
            .chain(&player.seas_attr)
            .chain(&player.game_attr)
            .chain(&player.item_attr)
            .cloned()
            .collect();

        // `bat` can be present but blank on players who don't have one
        let legacy_item = player.bat.as_ref()
            .filter(|bat| !bat.id.is_empty())
            .map(|bat| {
                if let Some(attr) = &bat.attr {
                    mods.insert(attr.clone());
                }
                bat.name.clone()
            });

        PlayerState {
            id: player.id,
            name: player.name.clone(),
            mods,
            legacy_item,
        }
    }
}

fn show_mod_from_list(mod_order: &[&str], player: &PlayerState) -> String {
    mod_order.iter()
        .find(|m| player.mods.contains(**m))
        .map(|m| m.to_string())
        .unwrap_or_default()
}

pub fn show_pitcher_mod(player: &PlayerState) -> String {
    show_mod_from_list(PITCHER_MOD_ORDER, player)
}

pub fn show_batter_mod(player: &PlayerState) -> String {
    show_mod_from_list(BATTER_MOD_ORDER, player)
}

pub fn show_runner_mod(player: &PlayerState) -> String {
    show_mod_from_list(BASERUNNER_MOD_ORDER, player)
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use crate::roster::{ChroniclerPlayer, PlayerBat};
    use super::*;

    fn player_with_bat() -> ChroniclerPlayer {
        ChroniclerPlayer {
            id: Uuid::from_u128(1),
            name: "Jessica Telephone".to_string(),
            perm_attr: vec!["ALTERNATE".to_string()],
            seas_attr: vec![],
            game_attr: vec!["COFFEE_RALLY".to_string()],
            item_attr: vec![],
            bat: Some(PlayerBat {
                id: "THE_IFFEY_JR".to_string(),
                name: "the Iffey Jr.".to_string(),
                attr: Some("FIREPROOF".to_string()),
            }),
        }
    }

    #[test]
    fn mods_union_includes_bat_attr() {
        let player = PlayerState::from_player(&player_with_bat());
        assert!(player.mods.contains("ALTERNATE"));
        assert!(player.mods.contains("COFFEE_RALLY"));
        assert!(player.mods.contains("FIREPROOF"));
        assert_eq!(player.legacy_item.as_deref(), Some("the Iffey Jr."));
    }

    #[test]
    fn blank_bat_is_no_item() {
        let mut raw = player_with_bat();
        raw.bat = Some(PlayerBat { id: String::new(), name: String::new(), attr: None });
        let player = PlayerState::from_player(&raw);
        assert_eq!(player.legacy_item, None);
    }

    #[test]
    fn runner_mod_order_prefers_blaserunning() {
        let mut player = PlayerState::from_player(&player_with_bat());
        player.mods.insert("BLASERUNNING".to_string());
        assert_eq!(show_runner_mod(&player), "BLASERUNNING");
        assert_eq!(show_batter_mod(&player), "COFFEE_RALLY");

        player.mods.remove("COFFEE_RALLY");
        assert_eq!(show_batter_mod(&player), "");
    }
}
