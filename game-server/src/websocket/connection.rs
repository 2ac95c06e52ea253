use game_types::{PlayerId, ServerMessage};
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

/// A websocket connection. Once authenticated it doubles as the player's id in the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn player_id(&self) -> PlayerId {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<PlayerId> for ConnectionId {
    fn from(id: PlayerId) -> Self {
        Self(id)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    pub username: Option<String>,
    pub last_activity: Instant,
    pub sender: mpsc::UnboundedSender<ServerMessage>,
}

impl Connection {
    pub fn new(id: ConnectionId) -> (Self, mpsc::UnboundedReceiver<ServerMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let connection = Self {
            id,
            username: None,
            last_activity: Instant::now(),
            sender,
        };

        (connection, receiver)
    }

    pub fn is_authenticated(&self) -> bool {
        self.username.is_some()
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

pub struct ConnectionManager {
    connections: RwLock<HashMap<ConnectionId, Connection>>,
    user_to_connection: RwLock<HashMap<String, ConnectionId>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            user_to_connection: RwLock::new(HashMap::new()),
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

    /// Drops the connection and hands it back so the caller can tell whether
    /// it was still seated in the game.
    pub async fn remove_connection(&self, id: ConnectionId) -> Option<Connection> {
        let removed = {
            let mut connections = self.connections.write().await;
            connections.remove(&id)
        };

        if let Some(username) = removed.as_ref().and_then(|c| c.username.as_ref()) {
            let mut user_to_connection = self.user_to_connection.write().await;
            if user_to_connection.get(username) == Some(&id) {
                user_to_connection.remove(username);
            }
        }

        removed
    }

    pub async fn get_connection(&self, id: ConnectionId) -> Option<Connection> {
        let connections = self.connections.read().await;
        connections.get(&id).cloned()
    }

    /// Binds a username to the connection. A connection already holding the
    /// same username is signed out and its id returned.
    pub async fn authenticate_connection(
        &self,
        id: ConnectionId,
        username: String,
    ) -> Result<Option<ConnectionId>, String> {
        let mut connections = self.connections.write().await;
        let mut user_to_connection = self.user_to_connection.write().await;

        match connections.get(&id) {
            None => return Err("Connection not found".to_string()),
            Some(connection) if connection.is_authenticated() => {
                return Err("Connection already authenticated".to_string());
            }
            Some(_) => {}
        }

        let replaced = user_to_connection
            .insert(username.clone(), id)
            .filter(|previous| *previous != id);
        if let Some(previous) = replaced {
            if let Some(old) = connections.get_mut(&previous) {
                old.username = None;
            }
        }

        if let Some(connection) = connections.get_mut(&id) {
            connection.username = Some(username);
        }

        Ok(replaced)
    }

    pub async fn update_activity(&self, id: ConnectionId) {
        let mut connections = self.connections.write().await;
        if let Some(connection) = connections.get_mut(&id) {
            connection.update_activity();
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

    /// Sends to every authenticated connection.
    pub async fn broadcast(&self, message: ServerMessage) {
        let connections = self.connections.read().await;
        for connection in connections.values().filter(|c| c.is_authenticated()) {
            let _ = connection.send_message(message.clone());
        }
    }

    pub async fn broadcast_except(&self, except_connection: ConnectionId, message: ServerMessage) {
        let connections = self.connections.read().await;
        for connection in connections.values() {
            if connection.id != except_connection && connection.is_authenticated() {
                let _ = connection.send_message(message.clone());
            }
        }
    }

    /// Removes connections idle for longer than `timeout` and returns them.
    pub async fn cleanup_inactive_connections(&self, timeout: Duration) -> Vec<Connection> {
        let inactive_connections: Vec<ConnectionId> = {
            let connections = self.connections.read().await;
            connections
                .values()
                .filter(|conn| conn.is_inactive(timeout))
                .map(|conn| conn.id)
                .collect()
        };

        let mut removed = Vec::new();
        for connection_id in inactive_connections {
            tracing::info!("Removing inactive connection: {}", connection_id);
            if let Some(connection) = self.remove_connection(connection_id).await {
                removed.push(connection);
            }
        }
        removed
    }

    #[cfg(test)]
    pub async fn connection_count(&self) -> usize {
        let connections = self.connections.read().await;
        connections.len()
    }

    #[cfg(test)]
    pub async fn user_connection_count(&self) -> usize {
        let user_connections = self.user_to_connection.read().await;
        user_connections.len()
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
