use std::sync::Arc;

use tracing::info;

use crate::session_registry::SessionRegistry;
use crate::websocket::connection::{ConnectionId, ConnectionManager};
use game_types::{ClientCommand, CoordinatorError, PlayerId, ServerMessage};

/// Dispatches one connection's commands into the registry. Commands other
/// than `Identify` require a bound player id; anything else is answered with
/// `Unauthenticated` rather than guessed at.
#[derive(Clone)]
pub struct MessageHandler {
    connection_id: ConnectionId,
    connection_manager: Arc<ConnectionManager>,
    registry: Arc<SessionRegistry>,
}

impl MessageHandler {
    pub fn new(
        connection_id: ConnectionId,
        connection_manager: Arc<ConnectionManager>,
        registry: Arc<SessionRegistry>,
    ) -> Self {
        Self {
            connection_id,
            connection_manager,
            registry,
        }
    }

    pub async fn handle_command(&self, command: ClientCommand) -> Result<(), String> {
        self.connection_manager
            .update_activity(self.connection_id)
            .await;

        if let ClientCommand::Identify { player_id } = &command {
            return self.handle_identify(*player_id).await;
        }

        let Some((player_id, session_code)) = self.caller_identity().await else {
            return self
                .send_error(CoordinatorError::Unauthenticated)
                .await;
        };

        match command {
            ClientCommand::Identify { .. } => unreachable!("handled above"),
            ClientCommand::CreateSession {
                name,
                emoji,
                settings,
            } => {
                self.handle_create_session(player_id, &name, emoji.as_deref(), settings)
                    .await
            }
            ClientCommand::JoinSession {
                session_id,
                name,
                emoji,
            } => {
                self.handle_join_session(player_id, &session_id, &name, emoji.as_deref())
                    .await
            }
            // Everything below operates on the session the connection is
            // subscribed to.
            command => {
                let Some(code) = session_code else {
                    return self
                        .send_error(CoordinatorError::failed_precondition(
                            "not in a session",
                        ))
                        .await;
                };
                self.handle_session_command(player_id, &code, command).await
            }
        }
    }

    async fn handle_session_command(
        &self,
        player_id: PlayerId,
        code: &str,
        command: ClientCommand,
    ) -> Result<(), String> {
        let result = match command {
            ClientCommand::StartRound { describer_id } => self
                .registry
                .start_round(code, player_id, describer_id)
                .await
                .map(|_| ()),
            ClientCommand::SubmitGuess { text } => self
                .registry
                .submit_guess(code, player_id, &text)
                .await
                .map(|_| ()),
            ClientCommand::EndRound { next_describer_id } => {
                match self
                    .registry
                    .end_round(code, player_id, next_describer_id)
                    .await
                {
                    Ok(ended) if ended.already_ended => {
                        // Nothing was broadcast; tell the racing caller their
                        // end-round landed second and all is well.
                        return self
                            .send_message(ServerMessage::RoundEnded {
                                reveal: game_types::RoundReveal {
                                    words: Vec::new(),
                                    guesses: Vec::new(),
                                },
                                is_final: ended.is_final,
                                already_ended: true,
                            })
                            .await;
                    }
                    Ok(_) => Ok(()),
                    Err(error) => Err(error),
                }
            }
            ClientCommand::SwitchTeam { target_id } => self
                .registry
                .switch_team(code, player_id, target_id)
                .await
                .map(|_| ()),
            ClientCommand::TransferHost { new_host_id } => self
                .registry
                .transfer_host(code, player_id, new_host_id)
                .await
                .map(|_| ()),
            ClientCommand::KickPlayer { target_id } => {
                self.registry.kick_player(code, player_id, target_id).await
            }
            ClientCommand::LeaveSession => {
                match self.registry.leave_session(code, player_id).await {
                    Ok(()) => {
                        self.connection_manager
                            .set_connection_session(self.connection_id, None)
                            .await;
                        return self.send_message(ServerMessage::SessionLeft).await;
                    }
                    Err(error) => Err(error),
                }
            }
            ClientCommand::InitiateCountdown => self
                .registry
                .initiate_countdown(code, player_id)
                .await
                .map(|_| ()),
            ClientCommand::SetRoundTiming { round_time_seconds } => {
                self.registry
                    .set_round_timing(code, player_id, round_time_seconds)
                    .await
            }
            ClientCommand::RestartSession => {
                self.registry.restart_session(code, player_id).await
            }
            ClientCommand::Heartbeat => self.registry.heartbeat(code, player_id).await,
            ClientCommand::Identify { .. }
            | ClientCommand::CreateSession { .. }
            | ClientCommand::JoinSession { .. } => unreachable!("handled by handle_command"),
        };

        match result {
            Ok(()) => Ok(()),
            Err(error) => self.send_error(error).await,
        }
    }

    async fn handle_identify(&self, player_id: PlayerId) -> Result<(), String> {
        let displaced = self
            .connection_manager
            .identify_connection(self.connection_id, player_id)
            .await;
        if let Some(old) = displaced {
            info!(
                "player {} rebound from connection {} to {}",
                player_id, old, self.connection_id
            );
        }
        self.send_message(ServerMessage::Identified { player_id })
            .await
    }

    async fn handle_create_session(
        &self,
        player_id: PlayerId,
        name: &str,
        emoji: Option<&str>,
        settings: game_types::SessionSettings,
    ) -> Result<(), String> {
        match self
            .registry
            .create_session(player_id, name, emoji, settings)
            .await
        {
            Ok(session) => {
                self.connection_manager
                    .set_connection_session(self.connection_id, Some(session.id.clone()))
                    .await;
                self.send_message(ServerMessage::SessionCreated { session })
                    .await
            }
            Err(error) => self.send_error(error).await,
        }
    }

    async fn handle_join_session(
        &self,
        player_id: PlayerId,
        session_id: &str,
        name: &str,
        emoji: Option<&str>,
    ) -> Result<(), String> {
        match self
            .registry
            .join_session(session_id, player_id, name, emoji)
            .await
        {
            Ok((session, outcome)) => {
                self.connection_manager
                    .set_connection_session(self.connection_id, Some(session.id.clone()))
                    .await;
                self.send_message(ServerMessage::SessionJoined {
                    session,
                    player: outcome.player,
                    rejoined: outcome.rejoined,
                })
                .await
            }
            Err(error) => self.send_error(error).await,
        }
    }

    /// A dropped socket is not a leave: the player stays in the session and
    /// presence failover covers any role they held.
    pub async fn handle_disconnect(&self) {
        if let Some(connection) = self
            .connection_manager
            .get_connection(self.connection_id)
            .await
        {
            if let (Some(player_id), Some(code)) = (connection.player_id, connection.session_code) {
                info!(
                    "player {} disconnected from session {}; presence takes over",
                    player_id, code
                );
            }
        }
    }

    async fn caller_identity(&self) -> Option<(PlayerId, Option<String>)> {
        let connection = self
            .connection_manager
            .get_connection(self.connection_id)
            .await?;
        connection
            .player_id
            .map(|player_id| (player_id, connection.session_code))
    }

    async fn send_message(&self, message: ServerMessage) -> Result<(), String> {
        self.connection_manager
            .send_to_connection(self.connection_id, message)
            .await
    }

    async fn send_error(&self, error: CoordinatorError) -> Result<(), String> {
        self.send_message(ServerMessage::Error { error }).await
    }
}
