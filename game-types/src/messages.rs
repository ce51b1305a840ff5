use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{
    CoordinatorError, Player, PlayerId, RoundPublic, RoundReveal, SessionId, SessionPublic,
    SessionSettings, Submission, WordEntry,
};

/// Closed command set accepted from clients. Commands are validated tagged
/// variants; unknown variants and unknown fields are rejected at decode time,
/// and no command can carry secret content such as a word list.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(deny_unknown_fields)]
pub enum ClientCommand {
    Identify {
        player_id: PlayerId,
    },
    CreateSession {
        name: String,
        #[serde(default)]
        emoji: Option<String>,
        #[serde(default)]
        settings: SessionSettings,
    },
    JoinSession {
        session_id: SessionId,
        name: String,
        #[serde(default)]
        emoji: Option<String>,
    },
    StartRound {
        describer_id: PlayerId,
    },
    SubmitGuess {
        text: String,
    },
    EndRound {
        #[serde(default)]
        next_describer_id: Option<PlayerId>,
    },
    SwitchTeam {
        target_id: PlayerId,
    },
    TransferHost {
        new_host_id: PlayerId,
    },
    KickPlayer {
        target_id: PlayerId,
    },
    LeaveSession,
    InitiateCountdown,
    SetRoundTiming {
        round_time_seconds: u32,
    },
    RestartSession,
    Heartbeat,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ServerMessage {
    Identified {
        player_id: PlayerId,
    },
    SessionCreated {
        session: SessionPublic,
    },
    SessionJoined {
        session: SessionPublic,
        player: Player,
        rejoined: bool,
    },
    /// Pushed to every subscriber after each committed mutation, projected
    /// for the receiving player's role.
    SessionUpdate {
        session: SessionPublic,
    },
    RoundStarted {
        round: RoundPublic,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        #[ts(optional)]
        words: Option<Vec<WordEntry>>,
    },
    RoundEnded {
        reveal: RoundReveal,
        is_final: bool,
        already_ended: bool,
    },
    GuessResolved {
        submission: Submission,
        word_count: u32,
        already_guessed: bool,
        bonus_words_added: u32,
    },
    CountdownStarted {
        ends_at: DateTime<Utc>,
    },
    HostChanged {
        new_host_id: PlayerId,
    },
    DescriberChanged {
        new_describer_id: PlayerId,
    },
    SessionLeft,
    Error {
        error: CoordinatorError,
    },
}
