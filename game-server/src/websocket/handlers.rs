use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::auth::{AuthError, AuthService};
use crate::game_manager::GameManager;
use crate::websocket::connection::{ConnectionId, ConnectionManager};
use game_types::{ClientMessage, ConnectionError, GameError, ServerMessage};

#[derive(Clone)]
pub struct MessageHandler {
    connection_id: ConnectionId,
    connection_manager: Arc<ConnectionManager>,
    game_manager: Arc<GameManager>,
    auth_service: Arc<AuthService>,
}

impl MessageHandler {
    pub fn new(
        connection_id: ConnectionId,
        connection_manager: Arc<ConnectionManager>,
        game_manager: Arc<GameManager>,
        auth_service: Arc<AuthService>,
    ) -> Self {
        Self {
            connection_id,
            connection_manager,
            game_manager,
            auth_service,
        }
    }

    pub async fn handle_message(&self, message: ClientMessage) -> Result<(), String> {
        self.connection_manager
            .update_activity(self.connection_id)
            .await;

        if let ClientMessage::Authenticate { token } = message {
            return self.handle_authenticate(token).await;
        }
        if let ClientMessage::Heartbeat = message {
            return Ok(());
        }

        let Some(username) = self.username().await else {
            return self
                .send_error(&GameError::AuthenticationRequired.to_string())
                .await;
        };

        match message {
            ClientMessage::SubmitGuess { text } => {
                debug!("{} says: {}", username, text);
                self.game_manager.submit_guess(self.connection_id, text);
                Ok(())
            }
            ClientMessage::StartRound => self.handle_start_round(&username).await,
            ClientMessage::StartTimer { duration_seconds } => {
                self.handle_start_timer(duration_seconds).await
            }
            ClientMessage::Draw { stroke } => {
                self.relay(ServerMessage::Draw { stroke }).await;
                Ok(())
            }
            ClientMessage::UndoStroke { snapshot } => {
                self.relay(ServerMessage::UndoStroke { snapshot }).await;
                Ok(())
            }
            ClientMessage::RedoStroke { snapshot } => {
                self.relay(ServerMessage::RedoStroke { snapshot }).await;
                Ok(())
            }
            ClientMessage::ClearCanvas => {
                info!("{} cleared the canvas", username);
                self.connection_manager
                    .broadcast(ServerMessage::CanvasCleared)
                    .await;
                Ok(())
            }
            ClientMessage::Authenticate { .. } | ClientMessage::Heartbeat => Ok(()),
        }
    }

    /// Called once the socket is gone. Only a connection still holding its
    /// seat takes the player out of the game.
    pub async fn handle_disconnect(&self) {
        info!("Handling disconnect for connection {}", self.connection_id);

        if let Some(connection) = self
            .connection_manager
            .remove_connection(self.connection_id)
            .await
        {
            if connection.is_authenticated() {
                self.game_manager.leave(self.connection_id);
            }
        }
    }

    async fn handle_authenticate(&self, token: String) -> Result<(), String> {
        info!("Authenticating connection {}", self.connection_id);

        let username = match self.auth_service.validate_token(&token) {
            Ok(username) => username,
            Err(e) => {
                warn!(
                    "Authentication failed for connection {}: {}",
                    self.connection_id, e
                );
                let reason = match e {
                    AuthError::TokenExpired => ConnectionError::SessionExpired,
                    _ => ConnectionError::InvalidToken,
                };
                return self
                    .send_message(ServerMessage::AuthenticationFailed {
                        reason: reason.to_string(),
                    })
                    .await;
            }
        };

        match self
            .connection_manager
            .authenticate_connection(self.connection_id, username.clone())
            .await
        {
            Ok(replaced) => {
                if let Some(previous) = replaced {
                    info!("{} moved from connection {}", username, previous);
                    let _ = self
                        .connection_manager
                        .send_to_connection(
                            previous,
                            ServerMessage::Error {
                                message: "Signed in from another connection".to_string(),
                            },
                        )
                        .await;
                }

                self.send_message(ServerMessage::AuthenticationSuccess {
                    username: username.clone(),
                })
                .await?;
                self.game_manager.join(self.connection_id, username);
                Ok(())
            }
            Err(e) => {
                debug!("Rejected authentication on {}: {}", self.connection_id, e);
                self.send_message(ServerMessage::AuthenticationFailed {
                    reason: ConnectionError::AlreadyAuthenticated.to_string(),
                })
                .await
            }
        }
    }

    async fn handle_start_round(&self, username: &str) -> Result<(), String> {
        info!("{} asked to start a round", username);

        match self.game_manager.start_round().await {
            Ok(round_id) => {
                debug!("Round {} started on request", round_id);
                Ok(())
            }
            Err(e) => self.send_error(&e.to_string()).await,
        }
    }

    async fn handle_start_timer(&self, duration_seconds: u32) -> Result<(), String> {
        let duration = Duration::from_secs(duration_seconds as u64);
        match self.game_manager.start_timer(duration).await {
            Ok(()) => Ok(()),
            Err(e) => self.send_error(&e).await,
        }
    }

    /// Canvas traffic goes to everyone but its author.
    async fn relay(&self, message: ServerMessage) {
        self.connection_manager
            .broadcast_except(self.connection_id, message)
            .await;
    }

    async fn username(&self) -> Option<String> {
        self.connection_manager
            .get_connection(self.connection_id)
            .await
            .and_then(|connection| connection.username)
    }

    pub async fn send_message(&self, message: ServerMessage) -> Result<(), String> {
        self.connection_manager
            .send_to_connection(self.connection_id, message)
            .await
    }

    async fn send_error(&self, message: &str) -> Result<(), String> {
        self.send_message(ServerMessage::Error {
            message: message.to_string(),
        })
        .await
    }
}
