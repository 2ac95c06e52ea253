use std::time::Duration;

use anyhow::{Result, anyhow};

use crate::ScoreRules;

/// Fewest connected players a round can be played with: one drawer, one guesser.
pub const MIN_PLAYERS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    pub round_duration: Duration,
    pub max_rounds: u32,
    pub scoring: ScoreRules,
    /// Pause between a closed round and the next one.
    pub round_cooldown: Duration,
    /// Pause between game-over and the first round of the next game.
    pub game_cooldown: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            round_duration: Duration::from_secs(60),
            max_rounds: 8,
            scoring: ScoreRules::default(),
            round_cooldown: Duration::from_secs(3),
            game_cooldown: Duration::from_secs(10),
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_rounds == 0 {
            return Err(anyhow!("max_rounds must be at least 1"));
        }
        if self.round_duration.is_zero() {
            return Err(anyhow!("round_duration must be greater than zero"));
        }
        if self.scoring.base_points == 0 {
            return Err(anyhow!("base score must be greater than zero"));
        }
        Ok(())
    }

    /// The single hint of a round is revealed halfway through it.
    pub fn hint_delay(&self) -> Duration {
        self.round_duration / 2
    }
}
