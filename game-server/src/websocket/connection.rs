use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use game_types::{PlayerId, ServerMessage, SessionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One live WebSocket client. A connection is anonymous until an `Identify`
/// command binds a player id to it; the session code tracks which session's
/// updates it receives.
#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    pub player_id: Option<PlayerId>,
    pub session_code: Option<SessionId>,
    pub connected_at: Instant,
    pub last_activity: Instant,
    pub sender: mpsc::UnboundedSender<ServerMessage>,
}

impl Connection {
    pub fn new(id: ConnectionId) -> (Self, mpsc::UnboundedReceiver<ServerMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let now = Instant::now();

        let connection = Self {
            id,
            player_id: None,
            session_code: None,
            connected_at: now,
            last_activity: now,
            sender,
        };

        (connection, receiver)
    }

    pub fn update_activity(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn send_message(&self, message: ServerMessage) -> Result<(), String> {
        self.sender
            .send(message)
            .map_err(|_| "Connection closed".to_string())
    }

    pub fn is_inactive(&self, timeout: Duration) -> bool {
        self.last_activity.elapsed() > timeout
    }
}

/// Registry of live connections and the player/session bindings used for
/// fan-out. Delivery is best-effort: a closed receiver just drops the
/// message, and presence timeouts take care of the rest.
pub struct ConnectionManager {
    connections: RwLock<HashMap<ConnectionId, Connection>>,
    player_to_connection: RwLock<HashMap<PlayerId, ConnectionId>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            player_to_connection: RwLock::new(HashMap::new()),
        }
    }

    pub async fn create_connection(
        &self,
        id: ConnectionId,
    ) -> mpsc::UnboundedReceiver<ServerMessage> {
        let (conn, receiver) = Connection::new(id);

        {
            let mut connections = self.connections.write().await;
            connections.insert(id, conn);
        }

        receiver
    }

    pub async fn remove_connection(&self, id: ConnectionId) {
        let player_id = {
            let mut connections = self.connections.write().await;
            connections.remove(&id).and_then(|conn| conn.player_id)
        };

        if let Some(player_id) = player_id {
            let mut player_to_connection = self.player_to_connection.write().await;
            // Only drop the mapping if it still points at this connection; a
            // reconnect may already have rebound the player elsewhere.
            if player_to_connection.get(&player_id) == Some(&id) {
                player_to_connection.remove(&player_id);
            }
        }
    }

    pub async fn get_connection(&self, id: ConnectionId) -> Option<Connection> {
        let connections = self.connections.read().await;
        connections.get(&id).cloned()
    }

    /// Bind a player id to a connection. A player reconnecting from a new
    /// socket takes the binding over; the displaced connection (if any) is
    /// returned unbound so its messages stop being addressed to the player.
    pub async fn identify_connection(
        &self,
        id: ConnectionId,
        player_id: PlayerId,
    ) -> Option<ConnectionId> {
        let mut connections = self.connections.write().await;
        let mut player_to_connection = self.player_to_connection.write().await;

        let displaced = match player_to_connection.get(&player_id).copied() {
            Some(existing) if existing != id => {
                if let Some(old) = connections.get_mut(&existing) {
                    old.player_id = None;
                    old.session_code = None;
                }
                Some(existing)
            }
            _ => None,
        };

        if let Some(connection) = connections.get_mut(&id) {
            connection.player_id = Some(player_id);
            player_to_connection.insert(player_id, id);
        }

        displaced
    }

    pub async fn update_activity(&self, id: ConnectionId) {
        let mut connections = self.connections.write().await;
        if let Some(connection) = connections.get_mut(&id) {
            connection.update_activity();
        }
    }

    pub async fn set_connection_session(&self, id: ConnectionId, session_code: Option<SessionId>) {
        let mut connections = self.connections.write().await;
        if let Some(connection) = connections.get_mut(&id) {
            connection.session_code = session_code;
        }
    }

    /// Unsubscribe a player's connection from whatever session it watches.
    /// Used when a player leaves or is kicked.
    pub async fn detach_player(&self, player_id: PlayerId) {
        let connection_id = {
            let player_to_connection = self.player_to_connection.read().await;
            player_to_connection.get(&player_id).copied()
        };
        if let Some(id) = connection_id {
            self.set_connection_session(id, None).await;
        }
    }

    pub async fn send_to_connection(
        &self,
        id: ConnectionId,
        message: ServerMessage,
    ) -> Result<(), String> {
        let connections = self.connections.read().await;
        if let Some(connection) = connections.get(&id) {
            connection.send_message(message)
        } else {
            Err("Connection not found".to_string())
        }
    }

    pub async fn send_to_player(
        &self,
        player_id: PlayerId,
        message: ServerMessage,
    ) -> Result<(), String> {
        let connection_id = {
            let player_to_connection = self.player_to_connection.read().await;
            player_to_connection.get(&player_id).copied()
        };

        if let Some(connection_id) = connection_id {
            self.send_to_connection(connection_id, message).await
        } else {
            Err("Player not connected".to_string())
        }
    }

    /// Broadcast one message to every connection watching a session.
    pub async fn send_to_session(&self, session_code: &str, message: ServerMessage) {
        let connections = self.connections.read().await;
        for connection in connections.values() {
            if connection.session_code.as_deref() == Some(session_code) {
                let _ = connection.send_message(message.clone());
            }
        }
    }

    /// Connections watching a session, with any bound player ids. The
    /// registry uses this for role-projected fan-out, where each viewer gets
    /// a different snapshot.
    pub async fn session_subscribers(
        &self,
        session_code: &str,
    ) -> Vec<(ConnectionId, Option<PlayerId>)> {
        let connections = self.connections.read().await;
        connections
            .values()
            .filter(|conn| conn.session_code.as_deref() == Some(session_code))
            .map(|conn| (conn.id, conn.player_id))
            .collect()
    }

    pub async fn cleanup_inactive_connections(&self, timeout: Duration) {
        let inactive_connections: Vec<ConnectionId> = {
            let connections = self.connections.read().await;
            connections
                .values()
                .filter(|conn| conn.is_inactive(timeout))
                .map(|conn| conn.id)
                .collect()
        };

        for connection_id in inactive_connections {
            tracing::info!("Removing inactive connection: {}", connection_id);
            self.remove_connection(connection_id).await;
        }
    }

    // Test helper methods
    pub async fn connection_count(&self) -> usize {
        let connections = self.connections.read().await;
        connections.len()
    }

    pub async fn player_connection_count(&self) -> usize {
        let player_connections = self.player_to_connection.read().await;
        player_connections.len()
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
