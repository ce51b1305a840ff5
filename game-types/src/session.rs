use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{Player, PlayerId, SessionId, Team, WordEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum SessionStatus {
    Waiting,  // Lobby, before the first round starts
    Playing,  // Rounds in progress, including breaks between rounds
    Finished, // All rounds complete; restart returns to Waiting
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum GameMode {
    FreeForAll,
    Teams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(deny_unknown_fields)]
pub struct SessionSettings {
    pub rounds: u32,
    pub round_time_seconds: u32,
    /// Free-form tag; anything unrecognized falls back to a mixed draw.
    pub difficulty: String,
    pub bonus_enabled: bool,
    pub mode: GameMode,
}

impl Default for SessionSettings {
    fn default() -> Self {
        SessionSettings {
            rounds: 3,
            round_time_seconds: 60,
            difficulty: "normal".to_string(),
            bonus_enabled: true,
            mode: GameMode::FreeForAll,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Submission {
    pub player_id: PlayerId,
    pub player_name: String,
    pub word: String,
    pub is_correct: bool,
    pub is_duplicate: bool,
    pub points: i32,
    pub timestamp: DateTime<Utc>,
}

/// Public view of an active round. Never carries word text; the count is the
/// only thing guessers learn about the secret set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RoundPublic {
    pub describer_id: PlayerId,
    pub word_count: u32,
    pub started_at: DateTime<Utc>,
    pub round_time_seconds: u32,
    pub guesses: Vec<Submission>,
}

/// Word set and guess log of a finished round, revealed to everyone on the
/// break screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RoundReveal {
    pub words: Vec<WordEntry>,
    pub guesses: Vec<Submission>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BreakPublic {
    pub ends_at: DateTime<Utc>,
    pub is_final: bool,
    pub reveal: RoundReveal,
}

/// Role-projected snapshot of a session. `words` is attached only when the
/// viewer is authorized to read the secret set and is omitted from the wire
/// otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SessionPublic {
    pub id: SessionId,
    pub host_id: PlayerId,
    pub status: SessionStatus,
    pub settings: SessionSettings,
    pub current_round: u32,
    pub playing_team: Option<Team>,
    pub describer_turn_index: u32,
    pub describer_id: Option<PlayerId>,
    pub players: Vec<Player>,
    pub round: Option<RoundPublic>,
    pub break_info: Option<BreakPublic>,
    pub countdown_ends_at: Option<DateTime<Utc>>,
    pub all_submissions: Vec<Submission>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub words: Option<Vec<WordEntry>>,
}
