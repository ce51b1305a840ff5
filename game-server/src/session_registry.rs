use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::Mutex;
use tracing::info;

use crate::websocket::ConnectionManager;
use game_core::presence::FailoverAction;
use game_core::session::{
    HostTransfer, JoinOutcome, RoundEnded, RoundStarted, SessionState, generate_session_code,
};
use game_core::word_pool::WordPool;
use game_types::{
    CoordinatorError, PlayerId, ServerMessage, SessionId, SessionPublic, SessionSettings, Team,
};

/// Attempts at drawing an unused session code before giving up.
const CODE_ALLOCATION_ATTEMPTS: usize = 32;
/// Sessions older than this are swept regardless of player count.
pub const SESSION_MAX_AGE_HOURS: i64 = 72;

/// One session behind its own lock. Every mutating operation takes the lock
/// for its whole duration, which is what serializes commands within a session
/// while leaving other sessions untouched.
pub struct SessionHandle {
    state: Mutex<SessionState>,
}

impl SessionHandle {
    fn new(state: SessionState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }
}

/// The coordinator authority: owns every live session, applies commands to
/// the core state machine with the current wall clock, and fans role-projected
/// updates out to subscribed connections after each committed mutation.
pub struct SessionRegistry {
    sessions: DashMap<SessionId, Arc<SessionHandle>>,
    word_pool: Arc<WordPool>,
    connections: Arc<ConnectionManager>,
}

impl SessionRegistry {
    pub fn new(connections: Arc<ConnectionManager>, word_pool: Arc<WordPool>) -> Self {
        Self {
            sessions: DashMap::new(),
            word_pool,
            connections,
        }
    }

    fn handle(&self, code: &str) -> Result<Arc<SessionHandle>, CoordinatorError> {
        self.sessions
            .get(code)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| CoordinatorError::not_found("session"))
    }

    /// Every subscriber gets their own role-projected snapshot; words ride
    /// along only for viewers the secret store authorizes.
    async fn broadcast_update(&self, state: &SessionState) {
        let subscribers = self.connections.session_subscribers(state.id()).await;
        for (connection_id, viewer) in subscribers {
            let session = state.snapshot(viewer);
            let _ = self
                .connections
                .send_to_connection(connection_id, ServerMessage::SessionUpdate { session })
                .await;
        }
    }

    async fn broadcast_event(&self, code: &str, message: ServerMessage) {
        self.connections.send_to_session(code, message).await;
    }

    pub async fn create_session(
        &self,
        host_id: PlayerId,
        host_name: &str,
        host_emoji: Option<&str>,
        settings: SessionSettings,
    ) -> Result<SessionPublic, CoordinatorError> {
        let now = Utc::now();
        let mut rng = StdRng::from_os_rng();

        for _ in 0..CODE_ALLOCATION_ATTEMPTS {
            let code = generate_session_code(&mut rng);
            match self.sessions.entry(code.clone()) {
                Entry::Occupied(_) => continue,
                Entry::Vacant(vacant) => {
                    let state = SessionState::new(
                        code,
                        host_id,
                        host_name,
                        host_emoji,
                        settings,
                        now,
                        StdRng::from_os_rng(),
                    )?;
                    let snapshot = state.snapshot(Some(host_id));
                    vacant.insert(Arc::new(SessionHandle::new(state)));
                    return Ok(snapshot);
                }
            }
        }
        Err(CoordinatorError::internal(
            "session code allocation exhausted",
        ))
    }

    pub async fn join_session(
        &self,
        code: &str,
        player_id: PlayerId,
        name: &str,
        emoji: Option<&str>,
    ) -> Result<(SessionPublic, JoinOutcome), CoordinatorError> {
        let handle = self.handle(code)?;
        let mut state = handle.state.lock().await;
        let outcome = state.join(player_id, name, emoji, Utc::now())?;
        self.broadcast_update(&state).await;
        Ok((state.snapshot(Some(player_id)), outcome))
    }

    pub async fn start_round(
        &self,
        code: &str,
        caller: PlayerId,
        describer_id: PlayerId,
    ) -> Result<RoundStarted, CoordinatorError> {
        let handle = self.handle(code)?;
        let mut state = handle.state.lock().await;
        let started = state.start_round(caller, describer_id, &self.word_pool, Utc::now())?;

        let subscribers = self.connections.session_subscribers(code).await;
        for (connection_id, viewer) in subscribers {
            let words = viewer.and_then(|id| state.read_words(id).ok().map(|w| w.to_vec()));
            let _ = self
                .connections
                .send_to_connection(
                    connection_id,
                    ServerMessage::RoundStarted {
                        round: started.round.clone(),
                        words,
                    },
                )
                .await;
        }
        self.broadcast_update(&state).await;
        Ok(started)
    }

    pub async fn submit_guess(
        &self,
        code: &str,
        caller: PlayerId,
        text: &str,
    ) -> Result<game_core::guess::GuessOutcome, CoordinatorError> {
        let handle = self.handle(code)?;
        let mut state = handle.state.lock().await;
        let outcome = state.submit_guess(caller, text, &self.word_pool, Utc::now())?;

        self.broadcast_event(
            code,
            ServerMessage::GuessResolved {
                submission: outcome.submission.clone(),
                word_count: outcome.word_count,
                already_guessed: outcome.already_guessed,
                bonus_words_added: outcome.bonus_words_added,
            },
        )
        .await;
        self.broadcast_update(&state).await;
        Ok(outcome)
    }

    pub async fn end_round(
        &self,
        code: &str,
        caller: PlayerId,
        next_describer: Option<PlayerId>,
    ) -> Result<RoundEnded, CoordinatorError> {
        let handle = self.handle(code)?;
        let mut state = handle.state.lock().await;
        let ended = state.end_round(caller, next_describer, Utc::now())?;

        // The idempotent no-op changed nothing; only the caller hears about
        // it, via the returned result.
        if !ended.already_ended {
            if let Some(reveal) = &ended.reveal {
                self.broadcast_event(
                    code,
                    ServerMessage::RoundEnded {
                        reveal: reveal.clone(),
                        is_final: ended.is_final,
                        already_ended: false,
                    },
                )
                .await;
            }
            if let Some(new_describer_id) = state.describer_id() {
                self.broadcast_event(
                    code,
                    ServerMessage::DescriberChanged { new_describer_id },
                )
                .await;
            }
            self.broadcast_update(&state).await;
        }
        Ok(ended)
    }

    pub async fn switch_team(
        &self,
        code: &str,
        caller: PlayerId,
        target: PlayerId,
    ) -> Result<Team, CoordinatorError> {
        let handle = self.handle(code)?;
        let mut state = handle.state.lock().await;
        let team = state.switch_team(caller, target)?;
        self.broadcast_update(&state).await;
        Ok(team)
    }

    pub async fn transfer_host(
        &self,
        code: &str,
        caller: PlayerId,
        new_host: PlayerId,
    ) -> Result<HostTransfer, CoordinatorError> {
        let handle = self.handle(code)?;
        let mut state = handle.state.lock().await;
        let transfer = state.transfer_host(caller, new_host, Utc::now())?;
        self.broadcast_event(
            code,
            ServerMessage::HostChanged {
                new_host_id: transfer.new_host,
            },
        )
        .await;
        self.broadcast_update(&state).await;
        Ok(transfer)
    }

    pub async fn kick_player(
        &self,
        code: &str,
        caller: PlayerId,
        target: PlayerId,
    ) -> Result<(), CoordinatorError> {
        let handle = self.handle(code)?;
        let mut state = handle.state.lock().await;
        let removed = state.kick_player(caller, target)?;
        let _ = self
            .connections
            .send_to_player(target, ServerMessage::SessionLeft)
            .await;
        self.connections.detach_player(target).await;
        self.finish_removal(code, &state, removed.session_empty, removed.new_host, removed.new_describer)
            .await;
        Ok(())
    }

    pub async fn leave_session(
        &self,
        code: &str,
        caller: PlayerId,
    ) -> Result<(), CoordinatorError> {
        let handle = self.handle(code)?;
        let mut state = handle.state.lock().await;
        let removed = state.leave_session(caller)?;
        self.connections.detach_player(caller).await;
        self.finish_removal(code, &state, removed.session_empty, removed.new_host, removed.new_describer)
            .await;
        Ok(())
    }

    async fn finish_removal(
        &self,
        code: &str,
        state: &SessionState,
        session_empty: bool,
        new_host: Option<PlayerId>,
        new_describer: Option<PlayerId>,
    ) {
        if session_empty {
            self.sessions.remove(code);
            info!("session {} emptied and removed", code);
            return;
        }
        if let Some(new_host_id) = new_host {
            self.broadcast_event(code, ServerMessage::HostChanged { new_host_id })
                .await;
        }
        if let Some(new_describer_id) = new_describer {
            self.broadcast_event(code, ServerMessage::DescriberChanged { new_describer_id })
                .await;
        }
        self.broadcast_update(state).await;
    }

    pub async fn restart_session(
        &self,
        code: &str,
        caller: PlayerId,
    ) -> Result<(), CoordinatorError> {
        let handle = self.handle(code)?;
        let mut state = handle.state.lock().await;
        state.restart_session(caller)?;
        self.broadcast_update(&state).await;
        Ok(())
    }

    pub async fn initiate_countdown(
        &self,
        code: &str,
        caller: PlayerId,
    ) -> Result<DateTime<Utc>, CoordinatorError> {
        let handle = self.handle(code)?;
        let mut state = handle.state.lock().await;
        let ends_at = state.initiate_countdown(caller, Utc::now())?;
        self.broadcast_event(code, ServerMessage::CountdownStarted { ends_at })
            .await;
        self.broadcast_update(&state).await;
        Ok(ends_at)
    }

    pub async fn set_round_timing(
        &self,
        code: &str,
        caller: PlayerId,
        round_time_seconds: u32,
    ) -> Result<(), CoordinatorError> {
        let handle = self.handle(code)?;
        let mut state = handle.state.lock().await;
        state.set_round_timing(caller, round_time_seconds)?;
        self.broadcast_update(&state).await;
        Ok(())
    }

    /// Liveness write only; deliberately not broadcast, a heartbeat alone is
    /// not a state change worth waking every client for.
    pub async fn heartbeat(&self, code: &str, caller: PlayerId) -> Result<(), CoordinatorError> {
        let handle = self.handle(code)?;
        let mut state = handle.state.lock().await;
        state.heartbeat(caller, Utc::now())
    }

    /// Role-projected snapshot for the HTTP state endpoint.
    pub async fn snapshot(
        &self,
        code: &str,
        viewer: Option<PlayerId>,
    ) -> Result<SessionPublic, CoordinatorError> {
        let handle = self.handle(code)?;
        let state = handle.state.lock().await;
        Ok(state.snapshot(viewer))
    }

    /// Reassign roles abandoned past the failover threshold, session by
    /// session, announcing each handoff to the session's subscribers.
    pub async fn failover_sweep(&self, now: DateTime<Utc>) {
        let handles: Vec<(SessionId, Arc<SessionHandle>)> = self
            .sessions
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        for (code, handle) in handles {
            let mut state = handle.state.lock().await;
            let actions = state.failover_sweep(now);
            if actions.is_empty() {
                continue;
            }
            for action in &actions {
                let message = match action {
                    FailoverAction::HostReassigned { new_host, .. } => {
                        ServerMessage::HostChanged {
                            new_host_id: *new_host,
                        }
                    }
                    FailoverAction::DescriberReassigned { new_describer, .. } => {
                        ServerMessage::DescriberChanged {
                            new_describer_id: *new_describer,
                        }
                    }
                };
                self.broadcast_event(&code, message).await;
            }
            self.broadcast_update(&state).await;
        }
    }

    /// Drop sessions that emptied out or outlived the retention window.
    /// Handles are collected up front so no map guard is held across the
    /// session-lock await; `finish_removal` takes the map's write side while
    /// holding a session lock, and iterating here in the opposite order
    /// would deadlock the shard.
    pub async fn cleanup_sweep(&self, now: DateTime<Utc>) {
        let max_age = Duration::hours(SESSION_MAX_AGE_HOURS);
        let handles: Vec<(SessionId, Arc<SessionHandle>)> = self
            .sessions
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        for (code, handle) in handles {
            let expired = {
                let state = handle.state.lock().await;
                state.player_count() == 0
                    || now.signed_duration_since(state.created_at()) > max_age
            };
            if expired && self.sessions.remove(&code).is_some() {
                info!("cleanup removed session {}", code);
            }
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn session_exists(&self, code: &str) -> bool {
        self.sessions.contains_key(code)
    }
}
