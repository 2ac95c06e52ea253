use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::{GameSnapshot, PlayerScore};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ClientMessage {
    Authenticate { token: String },
    SubmitGuess { text: String },
    StartRound,
    StartTimer { duration_seconds: u32 },
    /// Canvas payloads are relayed untouched; the server never inspects strokes.
    Draw { stroke: Value },
    ClearCanvas,
    UndoStroke { snapshot: Option<Value> },
    RedoStroke { snapshot: Option<Value> },
    Heartbeat,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ServerMessage {
    AuthenticationSuccess { username: String },
    AuthenticationFailed { reason: String },
    GameSnapshot { snapshot: GameSnapshot },
    RoundStart {
        drawer_name: String,
        duration_seconds: u32,
        masked_word: String,
    },
    YourWord { word: String },
    Hint { index: u32, letter: String },
    RoundEnd {
        drawer_name: String,
        word: String,
        winner_name: Option<String>,
    },
    ScoreUpdate { players: Vec<PlayerScore> },
    GameOver {
        winner_name: String,
        ranking: Vec<PlayerScore>,
    },
    ChatMessage { username: String, text: String },
    PlayerJoined { username: String },
    PlayerLeft { username: String },
    TimerStarted { duration_seconds: u32 },
    TimerEnded,
    Draw { stroke: Value },
    CanvasCleared,
    UndoStroke { snapshot: Option<Value> },
    RedoStroke { snapshot: Option<Value> },
    Error { message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LoginResponse {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_wire_format() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"SubmitGuess":{"text":"gato"}}"#).unwrap();
        assert!(matches!(msg, ClientMessage::SubmitGuess { ref text } if text == "gato"));

        let msg: ClientMessage = serde_json::from_str(r#""StartRound""#).unwrap();
        assert!(matches!(msg, ClientMessage::StartRound));
    }

    #[test]
    fn test_round_end_without_winner_serializes_null() {
        let msg = ServerMessage::RoundEnd {
            drawer_name: "Ana".to_string(),
            word: "Casa".to_string(),
            winner_name: None,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["RoundEnd"]["winner_name"], Value::Null);
        assert_eq!(json["RoundEnd"]["word"], "Casa");
    }

    #[test]
    fn test_draw_payload_is_opaque() {
        let raw = r#"{"Draw":{"stroke":{"x":10,"y":12,"color":"black","lineWidth":6}}}"#;
        let msg: ClientMessage = serde_json::from_str(raw).unwrap();
        match msg {
            ClientMessage::Draw { stroke } => assert_eq!(stroke["lineWidth"], 6),
            other => panic!("Expected Draw, got {:?}", other),
        }
    }
}
