use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum GameError {
    NotEnoughPlayers { required: u32, connected: u32 },
    RoundAlreadyActive,
    AuthenticationRequired,
    SessionUnavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ConnectionError {
    InvalidToken,
    SessionExpired,
    AlreadyAuthenticated,
    InternalError { message: String },
}

impl std::fmt::Display for GameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameError::NotEnoughPlayers { required, connected } => write!(
                f,
                "Need at least {} players to start a round ({} connected)",
                required, connected
            ),
            GameError::RoundAlreadyActive => write!(f, "A round is already in progress"),
            GameError::AuthenticationRequired => write!(f, "Authentication required"),
            GameError::SessionUnavailable => write!(f, "Game session is not running"),
        }
    }
}

impl std::fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionError::InvalidToken => write!(f, "Invalid token"),
            ConnectionError::SessionExpired => write!(f, "Session expired"),
            ConnectionError::AlreadyAuthenticated => write!(f, "Connection already authenticated"),
            ConnectionError::InternalError { message } => write!(f, "Internal error: {}", message),
        }
    }
}
