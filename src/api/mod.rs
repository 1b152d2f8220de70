mod eventually_schema;
mod chronicler_schema;

pub use eventually_schema::{EventType, EventuallyEvent};
pub use chronicler_schema::{ChroniclerGameUpdate, GameByTeam, GameUpdate};
