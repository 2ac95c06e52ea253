use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Public view of a player: what the roster and ranking broadcasts expose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PlayerScore {
    pub name: String,
    pub score: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum RoundPhase {
    Idle,
    Active,
    Resolving,
}

/// Snapshot of the single game in progress, served to clients that (re)connect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GameSnapshot {
    pub phase: RoundPhase,
    pub completed_rounds: u32,
    pub max_rounds: u32,
    pub drawer_name: Option<String>,
    pub masked_word: Option<String>,
    pub players: Vec<PlayerScore>,
}
