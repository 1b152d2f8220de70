use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_repr::{Deserialize_repr, Serialize_repr};
use uuid::Uuid;

/// Feed event types this reconstruction understands. The feed carries many
/// more; deserialization rejects any code not listed here, which aborts the
/// game before dispatch ever sees it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize_repr, Serialize_repr)]
#[repr(i64)]
pub enum EventType {
    LetsGo = 0,
    PlayBall = 1,
    HalfInning = 2,
    StolenBase = 4,
    Walk = 5,
    Strikeout = 6,
    FlyOut = 7,
    GroundOut = 8,
    HomeRun = 9,
    Hit = 10,
    GameEnd = 11,
    BatterUp = 12,
    Strike = 13,
    Ball = 14,
    FoulBall = 15,
    StrikeZapped = 25,
    MildPitch = 27,
    InningEnd = 28,
    CoffeeBean = 39,
    Blooddrain = 52,
    // Flavor text with no effect on the game state
    PeanutFlavorText = 73,
    SuperyummyText = 92,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventuallyEvent {
    pub id: Uuid,
    pub created: DateTime<Utc>,
    pub r#type: EventType,
    pub description: String,
    #[serde(default)]
    pub player_tags: Vec<Uuid>,
}
