use anyhow::{ensure, Context, Result};
use log::{debug, info};
use std::collections::HashMap;

use crate::api::{ChroniclerGameUpdate, EventuallyEvent, GameUpdate};
use crate::roster::RosterSource;
use crate::sim::GameState;

/// Replays one game's feed against its archived documents. The driver knows
/// nothing about event semantics; it lines snapshots up with events by play
/// count, dispatches, and checks the result.
pub struct Replay<'r> {
    game: GameState,
    snapshots: HashMap<i64, GameUpdate>,
    roster: &'r dyn RosterSource,
}

impl<'r> Replay<'r> {
    pub fn new(updates: &[ChroniclerGameUpdate], roster: &'r dyn RosterSource) -> Result<Replay<'r>> {
        let game = GameState::new(updates, roster)?;
        // When play counts collide (PlayBall's deviating document), the
        // earlier archived update is the one the event must produce
        let mut snapshots = HashMap::new();
        for update in updates {
            snapshots.entry(update.data.play_count)
                .or_insert_with(|| update.data.clone());
        }

        Ok(Replay { game, snapshots, roster })
    }

    /// Applies one event and returns the document it produced. When the
    /// archive holds a document for this tick, the two must agree
    /// field-for-field.
    pub fn advance(&mut self, event: &EventuallyEvent) -> Result<GameUpdate> {
        // The document this event produces is the one archived under the
        // next play count
        let snapshot = self.snapshots.get(&(self.game.play_count() + 1));

        let produced = self.game.update(event, snapshot, self.roster)
            .with_context(|| format!("While processing event {} ({:?})", event.id, event.r#type))?;

        if let Some(snapshot) = snapshot {
            ensure!(&produced == snapshot,
                    "Document produced by event {} ({:?}) does not match the archived update at play {}",
                    event.id, event.r#type, produced.play_count);
            debug!("play {} matches the archive", produced.play_count);
        }

        Ok(produced)
    }

    pub fn game_update(&self) -> &GameUpdate {
        self.game.game_update()
    }
}

/// Reconstructs a whole game and returns every document it emitted.
pub fn replay_game(
    updates: &[ChroniclerGameUpdate],
    feed: &[EventuallyEvent],
    roster: &dyn RosterSource,
) -> Result<Vec<GameUpdate>> {
    let mut replay = Replay::new(updates, roster)?;

    let mut emitted = Vec::with_capacity(feed.len());
    for event in feed {
        emitted.push(replay.advance(event)?);
    }

    info!("Reconstructed {} documents from {} feed events", emitted.len(), feed.len());
    Ok(emitted)
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use crate::api::EventType;
    use crate::sim::test_support::{fixture_bootstrap, fixture_roster};
    use super::*;

    fn ev(ty: EventType, description: &str) -> EventuallyEvent {
        EventuallyEvent {
            id: Uuid::from_u128(0xE1),
            created: chrono::Utc::now(),
            r#type: ty,
            description: description.to_string(),
            player_tags: Vec::new(),
        }
    }

    #[test]
    fn play_counts_step_by_one_with_play_ball_emitting_its_own() {
        let roster = fixture_roster();
        let mut replay = Replay::new(&fixture_bootstrap(), &roster).unwrap();

        let feed = [
            ev(EventType::LetsGo, "Let's Go!"),
            ev(EventType::PlayBall, "Play ball!"),
            ev(EventType::HalfInning, "Top of 1, Fridays batting."),
            ev(EventType::BatterUp, "Jessica Telephone batting for the Fridays."),
        ];
        let mut expected_play = 1;
        for event in &feed {
            let produced = replay.advance(event).unwrap();
            assert_eq!(produced.play_count, expected_play);
            expected_play += 1;
        }
    }

    #[test]
    fn snapshot_equality_is_enforced() {
        let roster = fixture_roster();

        // The stock archive's play-1 document is exactly what LetsGo
        // produces, so the comparison passes
        let mut replay = Replay::new(&fixture_bootstrap(), &roster).unwrap();
        let produced = replay.advance(&ev(EventType::LetsGo, "Let's Go!")).unwrap();
        assert_eq!(&produced, replay.game_update());

        // Doctor one archived field and the same replay must abort
        let mut updates = fixture_bootstrap();
        updates[1].data.shame = true;
        let mut replay = Replay::new(&updates, &roster).unwrap();
        assert!(replay.advance(&ev(EventType::LetsGo, "Let's Go!")).is_err());
    }

    #[test]
    fn unknown_event_codes_fail_at_the_schema_edge() {
        let raw = serde_json::json!({
            "id": "00000000-0000-0000-0000-0000000000e1",
            "created": "2021-03-01T16:00:00Z",
            "type": 54,
            "description": "The Tigers are Partying!",
            "playerTags": [],
        });
        assert!(serde_json::from_value::<EventuallyEvent>(raw).is_err());
    }
}
