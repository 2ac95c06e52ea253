use std::env;
use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use game_core::{GameConfig, ScoreRules};

pub const DEFAULT_JWT_SECRET: &str = "sketch-arena-dev-secret";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
    #[error("Invalid game settings: {0}")]
    InvalidGame(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub words_file: PathBuf,
    pub static_dir: Option<PathBuf>,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub connection_timeout: Duration,
    pub game: GameConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any key/value source; unset keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = GameConfig::default();
        let default_rules = ScoreRules::default();

        let scoring = ScoreRules {
            base_points: parse_or(&lookup, "BASE_SCORE", default_rules.base_points)?,
            speed_bonus_window: seconds_or(
                &lookup,
                "SPEED_BONUS_SECONDS",
                default_rules.speed_bonus_window,
            )?,
            speed_bonus_points: parse_or(
                &lookup,
                "SPEED_BONUS_POINTS",
                default_rules.speed_bonus_points,
            )?,
            streak_bonus_threshold: parse_or(
                &lookup,
                "STREAK_BONUS_THRESHOLD",
                default_rules.streak_bonus_threshold,
            )?,
            streak_bonus_points: parse_or(
                &lookup,
                "STREAK_BONUS_POINTS",
                default_rules.streak_bonus_points,
            )?,
        };

        let game = GameConfig {
            round_duration: seconds_or(&lookup, "ROUND_DURATION_SECONDS", defaults.round_duration)?,
            max_rounds: parse_or(&lookup, "MAX_ROUNDS", defaults.max_rounds)?,
            scoring,
            round_cooldown: seconds_or(&lookup, "ROUND_COOLDOWN_SECONDS", defaults.round_cooldown)?,
            game_cooldown: seconds_or(&lookup, "GAME_COOLDOWN_SECONDS", defaults.game_cooldown)?,
        };
        game.validate()
            .map_err(|e| ConfigError::InvalidGame(e.to_string()))?;

        Ok(Self {
            host: parse_or(&lookup, "HOST", IpAddr::from([127, 0, 0, 1]))?,
            port: parse_or(&lookup, "PORT", 3000)?,
            words_file: lookup("WORDS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./words/words.json")),
            static_dir: lookup("STATIC_DIR")
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from),
            jwt_secret: lookup("JWT_SECRET")
                .filter(|secret| !secret.is_empty())
                .unwrap_or_else(|| DEFAULT_JWT_SECRET.to_string()),
            token_ttl: seconds_or(&lookup, "TOKEN_TTL_SECONDS", Duration::from_secs(3600))?,
            connection_timeout: seconds_or(
                &lookup,
                "CONNECTION_TIMEOUT_SECONDS",
                Duration::from_secs(300),
            )?,
            game,
        })
    }

    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        None => Ok(default),
    }
}

fn seconds_or<F>(lookup: &F, name: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    parse_or(lookup, name, default.as_secs()).map(Duration::from_secs)
}
