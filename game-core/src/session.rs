use crate::guess::{GuessEngine, GuessEvaluation, GuessOutcome, BONUS_WORD_BATCH};
use crate::presence::{self, FailoverAction};
use crate::secret_store::{ReaderRole, SecretWordSet};
use crate::word_pool::WordPool;
use chrono::{DateTime, Duration, Utc};
use game_types::{
    BreakPublic, CoordinatorError, GameMode, Player, PlayerId, RoundPublic, RoundReveal,
    SessionId, SessionPublic, SessionSettings, SessionStatus, Submission, Team, WordEntry,
};
use rand::prelude::*;
use rand::rngs::StdRng;
use tracing::{info, warn};

/// Words generated at the start of every round.
pub const WORDS_PER_ROUND: usize = 16;
/// Break between rounds, in seconds.
pub const ROUND_BREAK_SECS: i64 = 10;
/// Break after the final round, in seconds.
pub const FINAL_BREAK_SECS: i64 = 20;
/// Length of the pre-round countdown, in seconds.
pub const COUNTDOWN_SECS: i64 = 3;
pub const SESSION_CODE_LEN: usize = 6;
/// Code alphabet without the visually ambiguous I, O, 0 and 1.
pub const SESSION_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const MIN_ROUND_TIME_SECS: u32 = 10;
pub const MAX_ROUND_TIME_SECS: u32 = 600;
pub const MAX_ROUNDS: u32 = 20;
pub const MAX_NAME_LEN: usize = 32;
const DEFAULT_EMOJI: &str = "🙂";

pub fn generate_session_code(rng: &mut impl Rng) -> String {
    (0..SESSION_CODE_LEN)
        .map(|_| SESSION_CODE_ALPHABET[rng.random_range(0..SESSION_CODE_ALPHABET.len())] as char)
        .collect()
}

pub fn is_valid_session_code(code: &str) -> bool {
    code.len() == SESSION_CODE_LEN && code.bytes().all(|b| SESSION_CODE_ALPHABET.contains(&b))
}

fn validate_name(name: &str) -> Result<String, CoordinatorError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoordinatorError::invalid_argument("name must not be empty"));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(CoordinatorError::invalid_argument(
            "name exceeds 32 characters",
        ));
    }
    Ok(trimmed.to_string())
}

fn emoji_or_default(emoji: Option<&str>) -> String {
    match emoji {
        Some(e) if !e.trim().is_empty() => e.trim().to_string(),
        _ => DEFAULT_EMOJI.to_string(),
    }
}

fn validate_settings(settings: &SessionSettings) -> Result<(), CoordinatorError> {
    if settings.rounds == 0 || settings.rounds > MAX_ROUNDS {
        return Err(CoordinatorError::invalid_argument(
            "rounds must be between 1 and 20",
        ));
    }
    if !(MIN_ROUND_TIME_SECS..=MAX_ROUND_TIME_SECS).contains(&settings.round_time_seconds) {
        return Err(CoordinatorError::invalid_argument(
            "round time must be between 10 and 600 seconds",
        ));
    }
    Ok(())
}

/// Private round record. The word list itself lives in the secret store; the
/// public projection carries only its count.
#[derive(Debug, Clone)]
struct RoundState {
    describer_id: PlayerId,
    started_at: DateTime<Utc>,
    round_time_seconds: u32,
    guesses: Vec<Submission>,
    /// Word-count level at which a bonus batch was last granted, 0 at start.
    last_bonus_at_word_count: usize,
}

impl RoundState {
    fn public(&self, word_count: usize) -> RoundPublic {
        RoundPublic {
            describer_id: self.describer_id,
            word_count: word_count as u32,
            started_at: self.started_at,
            round_time_seconds: self.round_time_seconds,
            guesses: self.guesses.clone(),
        }
    }

    fn expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.started_at + Duration::seconds(self.round_time_seconds as i64)
    }
}

#[derive(Debug, Clone)]
pub struct JoinOutcome {
    pub player: Player,
    /// True when an existing valid record was returned instead of a new one.
    pub rejoined: bool,
}

#[derive(Debug, Clone)]
pub struct RoundStarted {
    pub round: RoundPublic,
    /// Present only when the caller is the describer.
    pub words: Option<Vec<WordEntry>>,
}

#[derive(Debug, Clone)]
pub struct RoundEnded {
    /// True when the round was already gone; nothing changed.
    pub already_ended: bool,
    pub is_final: bool,
    pub reveal: Option<RoundReveal>,
}

#[derive(Debug, Clone)]
pub struct PlayerRemoved {
    pub removed: Player,
    pub session_empty: bool,
    pub new_host: Option<PlayerId>,
    pub new_describer: Option<PlayerId>,
}

#[derive(Debug, Clone)]
pub struct HostTransfer {
    pub previous: PlayerId,
    pub new_host: PlayerId,
    /// True when a non-host player claimed the role from an offline host.
    pub claimed: bool,
}

/// One session's complete authoritative state. Every mutation goes through
/// the methods below; the server wraps each instance in its own lock, so a
/// method always runs with exclusive access. Methods take `now` from the
/// caller rather than reading a clock, which keeps every timing rule
/// testable.
#[derive(Debug)]
pub struct SessionState {
    id: SessionId,
    host_id: PlayerId,
    status: SessionStatus,
    settings: SessionSettings,
    current_round: u32,
    playing_team: Option<Team>,
    describer_turn_index: u32,
    describer_id: Option<PlayerId>,
    /// Join order; role rotation and reassignment depend on it.
    players: Vec<Player>,
    round: Option<RoundState>,
    secret_words: Option<SecretWordSet>,
    break_info: Option<BreakPublic>,
    countdown_ends_at: Option<DateTime<Utc>>,
    all_submissions: Vec<Submission>,
    created_at: DateTime<Utc>,
    rng: StdRng,
}

impl SessionState {
    pub fn new(
        id: SessionId,
        host_id: PlayerId,
        host_name: &str,
        host_emoji: Option<&str>,
        settings: SessionSettings,
        now: DateTime<Utc>,
        rng: StdRng,
    ) -> Result<Self, CoordinatorError> {
        let name = validate_name(host_name)?;
        validate_settings(&settings)?;

        let host = Player {
            id: host_id,
            name,
            emoji: emoji_or_default(host_emoji),
            score: 0,
            team: Team::One,
            joined_at: now,
            last_seen: now,
        };

        info!("session {} created by {}", id, host_id);
        Ok(Self {
            id,
            host_id,
            status: SessionStatus::Waiting,
            settings,
            current_round: 0,
            playing_team: None,
            describer_turn_index: 0,
            describer_id: None,
            players: vec![host],
            round: None,
            secret_words: None,
            break_info: None,
            countdown_ends_at: None,
            all_submissions: Vec::new(),
            created_at: now,
            rng,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn host_id(&self) -> PlayerId {
        self.host_id
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn playing_team(&self) -> Option<Team> {
        self.playing_team
    }

    pub fn describer_id(&self) -> Option<PlayerId> {
        self.describer_id
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn has_player(&self, id: PlayerId) -> bool {
        self.players.iter().any(|p| p.id == id)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn word_count(&self) -> usize {
        self.secret_words.as_ref().map(|s| s.len()).unwrap_or(0)
    }

    /// Join, or re-join. An existing valid record is returned as-is so a
    /// reconnecting client never errors; a partial record with an empty name
    /// is repaired as a fresh join.
    pub fn join(
        &mut self,
        player_id: PlayerId,
        name: &str,
        emoji: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<JoinOutcome, CoordinatorError> {
        if let Some(existing) = self.players.iter_mut().find(|p| p.id == player_id) {
            if !existing.name.is_empty() {
                existing.last_seen = now;
                let player = existing.clone();
                info!("player {} rejoined session {}", player_id, self.id);
                return Ok(JoinOutcome {
                    player,
                    rejoined: true,
                });
            }
            let name = validate_name(name)?;
            existing.name = name;
            existing.emoji = emoji_or_default(emoji);
            existing.joined_at = now;
            existing.last_seen = now;
            let player = existing.clone();
            info!(
                "player {} joined session {}, repairing a partial record",
                player_id, self.id
            );
            return Ok(JoinOutcome {
                player,
                rejoined: false,
            });
        }

        let name = validate_name(name)?;
        let team = self.team_for_new_player();
        let player = Player {
            id: player_id,
            name,
            emoji: emoji_or_default(emoji),
            score: 0,
            team,
            joined_at: now,
            last_seen: now,
        };
        self.players.push(player.clone());
        info!(
            "player {} joined session {} on team {:?}",
            player_id, self.id, team
        );
        Ok(JoinOutcome {
            player,
            rejoined: false,
        })
    }

    // New players go to the smaller team; ties go to team 1. In free-for-all
    // everyone sits on team 1 and the field is display-only.
    fn team_for_new_player(&self) -> Team {
        match self.settings.mode {
            GameMode::FreeForAll => Team::One,
            GameMode::Teams => {
                let one = self.players.iter().filter(|p| p.team == Team::One).count();
                let two = self.players.iter().filter(|p| p.team == Team::Two).count();
                if two < one {
                    Team::Two
                } else {
                    Team::One
                }
            }
        }
    }

    fn ensure_enough_players(&self) -> Result<(), CoordinatorError> {
        match self.settings.mode {
            GameMode::FreeForAll => {
                if self.players.len() < 2 {
                    return Err(CoordinatorError::failed_precondition(
                        "at least 2 players are required to start",
                    ));
                }
            }
            GameMode::Teams => {
                let one = self.players.iter().filter(|p| p.team == Team::One).count();
                let two = self.players.iter().filter(|p| p.team == Team::Two).count();
                if one < 2 || two < 2 {
                    return Err(CoordinatorError::failed_precondition(
                        "team too small to start",
                    ));
                }
            }
        }
        Ok(())
    }

    /// Start a round with `describer_id` as the describer. The response
    /// carries the word list only when the caller is that describer; any
    /// other caller gets the count-only projection.
    pub fn start_round(
        &mut self,
        caller: PlayerId,
        describer_id: PlayerId,
        pool: &WordPool,
        now: DateTime<Utc>,
    ) -> Result<RoundStarted, CoordinatorError> {
        if self.status == SessionStatus::Finished {
            return Err(CoordinatorError::failed_precondition("session is finished"));
        }
        if self.round.is_some() {
            return Err(CoordinatorError::failed_precondition(
                "a round is already active",
            ));
        }
        if caller != self.host_id && caller != describer_id {
            return Err(CoordinatorError::permission_denied(
                "only the host or the nominated describer may start a round",
            ));
        }
        let Some(describer_team) = self
            .players
            .iter()
            .find(|p| p.id == describer_id)
            .map(|p| p.team)
        else {
            return Err(CoordinatorError::invalid_argument(
                "describer is not in the session",
            ));
        };
        self.ensure_enough_players()?;
        if self.settings.mode == GameMode::Teams {
            match self.playing_team {
                None => self.playing_team = Some(describer_team),
                Some(active) if active != describer_team => {
                    return Err(CoordinatorError::failed_precondition(
                        "describer must be on the playing team",
                    ));
                }
                Some(_) => {}
            }
        }

        let words = pool.generate(&self.settings.difficulty, WORDS_PER_ROUND, &mut self.rng);
        let store = SecretWordSet::new(self.id.clone(), words);
        let word_count = store.len();

        // The counter becomes 1 on the first round of a game. After that,
        // free-for-all advances it per round here; team mode advances it in
        // end_round when a team-1/team-2 cycle completes.
        if self.current_round == 0 {
            self.current_round = 1;
        } else if self.settings.mode == GameMode::FreeForAll {
            self.current_round += 1;
        }

        let round = RoundState {
            describer_id,
            started_at: now,
            round_time_seconds: self.settings.round_time_seconds,
            guesses: Vec::new(),
            last_bonus_at_word_count: 0,
        };
        let public = round.public(word_count);

        self.status = SessionStatus::Playing;
        self.describer_id = Some(describer_id);
        self.round = Some(round);
        self.secret_words = Some(store);
        self.break_info = None;
        self.countdown_ends_at = None;

        let words = match (&self.secret_words, caller == describer_id) {
            (Some(store), true) => Some(store.read_if_authorized(ReaderRole::Describer)?.to_vec()),
            _ => None,
        };

        info!(
            "round {} started in session {} with {} words, describer {}",
            self.current_round, self.id, word_count, describer_id
        );
        Ok(RoundStarted {
            round: public,
            words,
        })
    }

    /// Validate, score and record one guess. A fresh correct match credits
    /// the guesser and may trigger a bonus batch; a repeat of a credited
    /// word is recorded as a duplicate and never rescored.
    pub fn submit_guess(
        &mut self,
        caller: PlayerId,
        text: &str,
        pool: &WordPool,
        now: DateTime<Utc>,
    ) -> Result<GuessOutcome, CoordinatorError> {
        let normalized = GuessEngine::validate_text(text)?;

        let Some(player_index) = self.players.iter().position(|p| p.id == caller) else {
            return Err(CoordinatorError::permission_denied(
                "caller is not a player in this session",
            ));
        };
        if self.describer_id == Some(caller) {
            return Err(CoordinatorError::permission_denied(
                "the describer cannot guess",
            ));
        }
        if self.settings.mode == GameMode::Teams {
            if let Some(active) = self.playing_team {
                if self.players[player_index].team != active {
                    return Err(CoordinatorError::permission_denied(
                        "caller is not on the playing team",
                    ));
                }
            }
        }
        let Some(round) = self.round.as_mut() else {
            return Err(CoordinatorError::failed_precondition("no round is active"));
        };
        let Some(secret) = self.secret_words.as_mut() else {
            return Err(CoordinatorError::internal("round has no word set"));
        };

        let (is_correct, is_duplicate, points) =
            match GuessEngine::evaluate(&normalized, secret.entries(), &round.guesses) {
                GuessEvaluation::Correct { points } => (true, false, points),
                GuessEvaluation::AlreadyGuessed => (true, true, 0),
                GuessEvaluation::Miss => (false, false, 0),
            };

        let player = &mut self.players[player_index];
        if is_correct && !is_duplicate {
            player.score += points;
        }
        let submission = Submission {
            player_id: caller,
            player_name: player.name.clone(),
            word: normalized,
            is_correct,
            is_duplicate,
            points,
            timestamp: now,
        };
        round.guesses.push(submission.clone());
        self.all_submissions.push(submission.clone());

        let mut bonus_words_added = 0u32;
        let correct = GuessEngine::correct_count(&round.guesses);
        if GuessEngine::bonus_due(
            correct,
            secret.len(),
            round.last_bonus_at_word_count,
            self.settings.bonus_enabled,
        ) {
            // The grant level is the pre-append count, so the next grant
            // needs the count (and its 80% threshold) to climb further.
            let level = secret.len();
            // Over-draw so collisions with words already in the round still
            // leave a full batch of fresh ones.
            let drawn = pool.generate(
                &self.settings.difficulty,
                BONUS_WORD_BATCH + level,
                &mut self.rng,
            );
            let mut extra: Vec<WordEntry> = drawn
                .into_iter()
                .filter(|w| secret.entries().iter().all(|e| e.word != w.word))
                .collect();
            extra.truncate(BONUS_WORD_BATCH);
            bonus_words_added = secret.append(extra) as u32;
            round.last_bonus_at_word_count = level;
            info!(
                "bonus words added in session {}: {} -> {}",
                self.id,
                level,
                secret.len()
            );
        }

        let word_count = secret.len() as u32;
        Ok(GuessOutcome {
            submission,
            word_count,
            already_guessed: is_duplicate,
            bonus_words_added,
        })
    }

    fn is_player_connected(&self, id: PlayerId, now: DateTime<Utc>) -> bool {
        self.players
            .iter()
            .find(|p| p.id == id)
            .map(|p| presence::is_connected(now, p.last_seen))
            .unwrap_or(false)
    }

    fn authorize_round_end(
        &self,
        caller: PlayerId,
        round: &RoundState,
        now: DateTime<Utc>,
    ) -> Result<(), CoordinatorError> {
        // The live pointer and the round's original describer can diverge
        // after a mid-round handoff; either may end the round.
        if caller == self.host_id
            || self.describer_id == Some(caller)
            || caller == round.describer_id
        {
            return Ok(());
        }
        // Rescue: once the timer has run out with host and describer both
        // offline, any connected player may force the transition so the
        // game cannot wedge on a double-disconnect.
        let describer_connected = self
            .describer_id
            .map(|id| self.is_player_connected(id, now))
            .unwrap_or(false);
        if round.expired(now)
            && !self.is_player_connected(self.host_id, now)
            && !describer_connected
            && self.is_player_connected(caller, now)
        {
            warn!("round in session {} ended by rescue from {}", self.id, caller);
            return Ok(());
        }
        Err(CoordinatorError::permission_denied(
            "only the host or the describer may end the round",
        ))
    }

    /// End the active round, reveal its words, and set up the break. Ending
    /// an already-ended round is a no-op success; two callers racing the
    /// same timer expiry is an expected race, not an error.
    pub fn end_round(
        &mut self,
        caller: PlayerId,
        next_describer: Option<PlayerId>,
        now: DateTime<Utc>,
    ) -> Result<RoundEnded, CoordinatorError> {
        let already_ended = RoundEnded {
            already_ended: true,
            is_final: self.status == SessionStatus::Finished,
            reveal: None,
        };
        let Some(round) = self.round.as_ref() else {
            return Ok(already_ended);
        };
        self.authorize_round_end(caller, round, now)?;

        let ending_team = self.playing_team;
        let finishing_describer = round.describer_id;

        // Finality is computed here, never supplied by clients. A team game
        // only finishes when team 2 closes out the last cycle.
        let is_final = match self.settings.mode {
            GameMode::FreeForAll => self.current_round >= self.settings.rounds,
            GameMode::Teams => {
                ending_team == Some(Team::Two) && self.current_round >= self.settings.rounds
            }
        };
        let next_team = ending_team.map(|t| t.other());

        if let Some(candidate) = next_describer {
            let Some(player) = self.players.iter().find(|p| p.id == candidate) else {
                return Err(CoordinatorError::invalid_argument(
                    "next describer is not in the session",
                ));
            };
            if !is_final && self.settings.mode == GameMode::Teams {
                if let Some(team) = next_team {
                    if player.team != team {
                        return Err(CoordinatorError::invalid_argument(
                            "next describer must be on the next playing team",
                        ));
                    }
                }
            }
        }

        let Some(round) = self.round.take() else {
            return Ok(already_ended);
        };
        let words = match self.secret_words.take() {
            Some(set) => set.into_words(),
            None => Vec::new(),
        };
        let reveal = RoundReveal {
            words,
            guesses: round.guesses,
        };

        let break_secs = if is_final {
            FINAL_BREAK_SECS
        } else {
            ROUND_BREAK_SECS
        };
        self.break_info = Some(BreakPublic {
            ends_at: now + Duration::seconds(break_secs),
            is_final,
            reveal: reveal.clone(),
        });
        self.countdown_ends_at = None;

        if is_final {
            self.status = SessionStatus::Finished;
            self.describer_id = None;
            info!(
                "session {} finished after round {}",
                self.id, self.current_round
            );
            return Ok(RoundEnded {
                already_ended: false,
                is_final: true,
                reveal: Some(reveal),
            });
        }

        // Flip the active team; a team-2 finish completes the cycle, which
        // is when the visible round counter and the rotation index advance.
        if self.settings.mode == GameMode::Teams {
            self.playing_team = next_team;
            if ending_team == Some(Team::Two) {
                self.describer_turn_index += 1;
                self.current_round += 1;
            }
        }

        let chosen = match next_describer {
            Some(id) => Some(id),
            None => self.default_next_describer(finishing_describer),
        };
        self.describer_id = chosen;
        info!(
            "round ended in session {}, next describer {:?}",
            self.id, chosen
        );
        Ok(RoundEnded {
            already_ended: false,
            is_final: false,
            reveal: Some(reveal),
        })
    }

    // Rotation when the ender nominates nobody: team mode walks the next
    // playing team's roster by turn index; free-for-all walks join order
    // from the finishing describer.
    fn default_next_describer(&self, finishing_describer: PlayerId) -> Option<PlayerId> {
        match self.settings.mode {
            GameMode::Teams => {
                let team = self.playing_team?;
                let mut roster: Vec<&Player> =
                    self.players.iter().filter(|p| p.team == team).collect();
                if roster.is_empty() {
                    return None;
                }
                roster.sort_by_key(|p| (p.joined_at, p.id));
                let index = self.describer_turn_index as usize % roster.len();
                Some(roster[index].id)
            }
            GameMode::FreeForAll => {
                if self.players.is_empty() {
                    return None;
                }
                let next = match self
                    .players
                    .iter()
                    .position(|p| p.id == finishing_describer)
                {
                    Some(i) => (i + 1) % self.players.len(),
                    None => 0,
                };
                Some(self.players[next].id)
            }
        }
    }

    /// Toggle a player between teams. Self-service, or host for others;
    /// never mid-round and never for the current describer.
    pub fn switch_team(
        &mut self,
        caller: PlayerId,
        target: PlayerId,
    ) -> Result<Team, CoordinatorError> {
        if self.settings.mode != GameMode::Teams {
            return Err(CoordinatorError::failed_precondition(
                "session is not in team mode",
            ));
        }
        if caller != target && caller != self.host_id {
            return Err(CoordinatorError::permission_denied(
                "only the host may move another player",
            ));
        }
        if self.status == SessionStatus::Finished {
            return Err(CoordinatorError::failed_precondition("session is finished"));
        }
        if self.round.is_some() {
            return Err(CoordinatorError::failed_precondition(
                "cannot switch teams during a round",
            ));
        }
        if self.describer_id == Some(target) {
            return Err(CoordinatorError::failed_precondition(
                "the describer cannot switch teams",
            ));
        }
        let Some(player) = self.players.iter_mut().find(|p| p.id == target) else {
            return Err(CoordinatorError::not_found("player"));
        };
        player.team = player.team.other();
        let team = player.team;
        info!(
            "player {} switched to team {:?} in session {}",
            target, team, self.id
        );
        Ok(team)
    }

    /// Hand the host role over. The host may transfer to anyone present; a
    /// non-host may claim only for themselves, only once the host has been
    /// offline beyond the failover threshold, and only as the
    /// earliest-joined connected player, so concurrent claims resolve to a
    /// single winner.
    pub fn transfer_host(
        &mut self,
        caller: PlayerId,
        new_host: PlayerId,
        now: DateTime<Utc>,
    ) -> Result<HostTransfer, CoordinatorError> {
        if !self.has_player(new_host) {
            return Err(CoordinatorError::not_found("player"));
        }
        let previous = self.host_id;
        if caller == self.host_id {
            self.host_id = new_host;
            info!(
                "session {}: host transferred from {} to {}",
                self.id, previous, new_host
            );
            return Ok(HostTransfer {
                previous,
                new_host,
                claimed: false,
            });
        }

        let host_stale = self
            .players
            .iter()
            .find(|p| p.id == self.host_id)
            .map(|p| presence::is_role_failed(now, p.last_seen))
            .unwrap_or(true);
        if !host_stale {
            return Err(CoordinatorError::permission_denied(
                "only the host may transfer the host role",
            ));
        }
        if caller != new_host {
            return Err(CoordinatorError::permission_denied(
                "a host claim must be for yourself",
            ));
        }
        let earliest = presence::earliest_connected(&self.players, now).map(|p| p.id);
        if earliest != Some(caller) {
            return Err(CoordinatorError::permission_denied(
                "an earlier-joined connected player has precedence for the host claim",
            ));
        }
        self.host_id = new_host;
        warn!(
            "session {}: player {} claimed host from stale host {}",
            self.id, new_host, previous
        );
        Ok(HostTransfer {
            previous,
            new_host,
            claimed: true,
        })
    }

    pub fn kick_player(
        &mut self,
        caller: PlayerId,
        target: PlayerId,
    ) -> Result<PlayerRemoved, CoordinatorError> {
        if caller != self.host_id {
            return Err(CoordinatorError::permission_denied(
                "only the host may kick players",
            ));
        }
        self.remove_player(target)
    }

    pub fn leave_session(&mut self, caller: PlayerId) -> Result<PlayerRemoved, CoordinatorError> {
        self.remove_player(caller)
    }

    fn remove_player(&mut self, target: PlayerId) -> Result<PlayerRemoved, CoordinatorError> {
        let Some(index) = self.players.iter().position(|p| p.id == target) else {
            return Err(CoordinatorError::not_found("player"));
        };
        let removed = self.players.remove(index);
        info!("player {} removed from session {}", target, self.id);

        if self.players.is_empty() {
            return Ok(PlayerRemoved {
                removed,
                session_empty: true,
                new_host: None,
                new_describer: None,
            });
        }

        // Vacated roles go to the earliest-joined remaining player, so every
        // observer computes the same successor.
        let mut new_host = None;
        let mut new_describer = None;
        if let Some(successor) = self
            .players
            .iter()
            .min_by_key(|p| (p.joined_at, p.id))
            .map(|p| p.id)
        {
            if target == self.host_id {
                self.host_id = successor;
                new_host = Some(successor);
                info!("session {}: host reassigned to {}", self.id, successor);
            }
            if self.describer_id == Some(target) {
                self.describer_id = Some(successor);
                new_describer = Some(successor);
                info!("session {}: describer reassigned to {}", self.id, successor);
            }
        }

        Ok(PlayerRemoved {
            removed,
            session_empty: false,
            new_host,
            new_describer,
        })
    }

    /// Return a finished session to the lobby. Scores, the submission feed
    /// and all round state reset; the roster, team assignments, settings and
    /// host survive.
    pub fn restart_session(&mut self, caller: PlayerId) -> Result<(), CoordinatorError> {
        if caller != self.host_id {
            return Err(CoordinatorError::permission_denied(
                "only the host may restart the session",
            ));
        }
        if self.status != SessionStatus::Finished {
            return Err(CoordinatorError::failed_precondition(
                "session is not finished",
            ));
        }
        self.status = SessionStatus::Waiting;
        self.current_round = 0;
        self.playing_team = None;
        self.describer_turn_index = 0;
        self.describer_id = None;
        self.round = None;
        self.secret_words = None;
        self.break_info = None;
        self.countdown_ends_at = None;
        self.all_submissions.clear();
        for player in &mut self.players {
            player.score = 0;
        }
        info!("session {} restarted by host {}", self.id, caller);
        Ok(())
    }

    pub fn initiate_countdown(
        &mut self,
        caller: PlayerId,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, CoordinatorError> {
        if caller != self.host_id && self.describer_id != Some(caller) {
            return Err(CoordinatorError::permission_denied(
                "only the host or the describer may start the countdown",
            ));
        }
        if self.status == SessionStatus::Finished {
            return Err(CoordinatorError::failed_precondition("session is finished"));
        }
        if self.round.is_some() {
            return Err(CoordinatorError::failed_precondition(
                "a round is already active",
            ));
        }
        if let Some(ends_at) = self.countdown_ends_at {
            if now < ends_at {
                return Err(CoordinatorError::failed_precondition(
                    "countdown already running",
                ));
            }
        }
        let ends_at = now + Duration::seconds(COUNTDOWN_SECS);
        self.countdown_ends_at = Some(ends_at);
        info!("countdown started in session {}", self.id);
        Ok(ends_at)
    }

    pub fn set_round_timing(
        &mut self,
        caller: PlayerId,
        round_time_seconds: u32,
    ) -> Result<(), CoordinatorError> {
        if caller != self.host_id {
            return Err(CoordinatorError::permission_denied(
                "only the host may change round timing",
            ));
        }
        if !(MIN_ROUND_TIME_SECS..=MAX_ROUND_TIME_SECS).contains(&round_time_seconds) {
            return Err(CoordinatorError::invalid_argument(
                "round time must be between 10 and 600 seconds",
            ));
        }
        if self.round.is_some() {
            return Err(CoordinatorError::failed_precondition(
                "cannot change timing during a round",
            ));
        }
        self.settings.round_time_seconds = round_time_seconds;
        Ok(())
    }

    /// The one write a player may always make: their own liveness signal.
    pub fn heartbeat(
        &mut self,
        caller: PlayerId,
        now: DateTime<Utc>,
    ) -> Result<(), CoordinatorError> {
        let Some(player) = self.players.iter_mut().find(|p| p.id == caller) else {
            return Err(CoordinatorError::not_found("player"));
        };
        player.last_seen = now;
        Ok(())
    }

    /// Reassign roles held by players offline beyond the failover threshold.
    /// Run periodically by the server; the client-side host claim in
    /// `transfer_host` is the redundant path for the same condition.
    pub fn failover_sweep(&mut self, now: DateTime<Utc>) -> Vec<FailoverAction> {
        let mut actions = Vec::new();

        if let Some(host) = self.players.iter().find(|p| p.id == self.host_id) {
            if presence::is_role_failed(now, host.last_seen) {
                if let Some(successor) = presence::earliest_connected(&self.players, now) {
                    let previous = self.host_id;
                    let new_host = successor.id;
                    self.host_id = new_host;
                    warn!(
                        "session {}: host {} offline, reassigned to {}",
                        self.id, previous, new_host
                    );
                    actions.push(FailoverAction::HostReassigned { previous, new_host });
                }
            }
        }

        // Describer handoff keeps a round alive; the round record still
        // names the original describer for end-round authorization.
        if self.round.is_some() {
            if let Some(current) = self.describer_id {
                let failed = self
                    .players
                    .iter()
                    .find(|p| p.id == current)
                    .map(|p| presence::is_role_failed(now, p.last_seen))
                    .unwrap_or(true);
                if failed {
                    if let Some(new_describer) = self.next_describer_candidate(now) {
                        self.describer_id = Some(new_describer);
                        warn!(
                            "session {}: describer {} offline, reassigned to {}",
                            self.id, current, new_describer
                        );
                        actions.push(FailoverAction::DescriberReassigned {
                            previous: current,
                            new_describer,
                        });
                    }
                }
            }
        }

        actions
    }

    // Team mode prefers a connected member of the playing team, falling
    // back to any connected player.
    fn next_describer_candidate(&self, now: DateTime<Utc>) -> Option<PlayerId> {
        if self.settings.mode == GameMode::Teams {
            if let Some(team) = self.playing_team {
                let member = self
                    .players
                    .iter()
                    .filter(|p| p.team == team && presence::is_connected(now, p.last_seen))
                    .min_by_key(|p| (p.joined_at, p.id));
                if let Some(player) = member {
                    return Some(player.id);
                }
            }
        }
        presence::earliest_connected(&self.players, now).map(|p| p.id)
    }

    /// Resolve a caller's read role for the secret word set.
    pub fn reader_role(&self, caller: PlayerId) -> ReaderRole {
        let Some(player) = self.players.iter().find(|p| p.id == caller) else {
            return ReaderRole::Outsider;
        };
        if self.describer_id == Some(caller) {
            return ReaderRole::Describer;
        }
        if self.settings.mode == GameMode::Teams {
            if let Some(active) = self.playing_team {
                if player.team != active {
                    return ReaderRole::SpectatingTeam;
                }
            }
        }
        ReaderRole::ActiveGuesser
    }

    pub fn read_words(&self, caller: PlayerId) -> Result<&[WordEntry], CoordinatorError> {
        let role = self.reader_role(caller);
        match self.secret_words.as_ref() {
            Some(store) => store.read_if_authorized(role),
            None => Err(CoordinatorError::failed_precondition("no round is active")),
        }
    }

    /// Role-projected snapshot. `words` is attached only when the viewer's
    /// resolved role passes the store's authorization gate.
    pub fn snapshot(&self, viewer: Option<PlayerId>) -> SessionPublic {
        let word_count = self.word_count();
        let words = match (viewer, self.secret_words.as_ref()) {
            (Some(id), Some(store)) => store
                .read_if_authorized(self.reader_role(id))
                .ok()
                .map(|w| w.to_vec()),
            _ => None,
        };
        SessionPublic {
            id: self.id.clone(),
            host_id: self.host_id,
            status: self.status,
            settings: self.settings.clone(),
            current_round: self.current_round,
            playing_team: self.playing_team,
            describer_turn_index: self.describer_turn_index,
            describer_id: self.describer_id,
            players: self.players.clone(),
            round: self.round.as_ref().map(|r| r.public(word_count)),
            break_info: self.break_info.clone(),
            countdown_ends_at: self.countdown_ends_at,
            all_submissions: self.all_submissions.clone(),
            created_at: self.created_at,
            words,
        }
    }
}
