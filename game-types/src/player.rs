use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Team {
    One,
    Two,
}

impl Team {
    pub fn other(&self) -> Team {
        match self {
            Team::One => Team::Two,
            Team::Two => Team::One,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Player {
    pub id: Uuid,
    pub name: String,
    pub emoji: String,
    pub score: i32,
    pub team: Team,
    pub joined_at: DateTime<Utc>,
    /// Updated only by this player's own heartbeat.
    pub last_seen: DateTime<Utc>,
}
