use gambit_types::escrow::{MAX_PLATFORM_FEE_BPS, MAX_TOURNAMENT_PLAYERS};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use tracing::Level;

/// Configuration for the [crate::Engine], as read from YAML.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    pub min_stake: u64,
    pub max_stake: u64,

    pub min_entry_fee: u64,
    pub max_entry_fee: u64,
    #[serde(default = "default_max_tournament_players")]
    pub max_tournament_players: u32,

    pub platform_fee_bps: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("{field} must be > 0")]
    Zero { field: &'static str },
    #[error("{min_field} ({min}) exceeds {max_field} ({max})")]
    InvertedBounds {
        min_field: &'static str,
        min: u64,
        max_field: &'static str,
        max: u64,
    },
    #[error("platform_fee_bps must be <= 1000 (got {0})")]
    FeeTooHigh(u16),
    #[error("max_tournament_players must be >= 2 (got {0})")]
    TooFewPlayers(u32),
    #[error("max_tournament_players must be <= 1024 (got {0})")]
    TooManyPlayers(u32),
    #[error("invalid log level: {0}")]
    InvalidLogLevel(String),
}

/// Bounds enforced by the engine, after validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedConfig {
    pub min_stake: u64,
    pub max_stake: u64,
    pub min_entry_fee: u64,
    pub max_entry_fee: u64,
    pub max_tournament_players: u32,
    pub platform_fee_bps: u16,
    pub log_level: Level,
}

fn default_max_tournament_players() -> u32 {
    256
}

fn default_log_level() -> String {
    "info".to_string()
}

fn ordered(
    min_field: &'static str,
    min: u64,
    max_field: &'static str,
    max: u64,
) -> Result<(), ConfigError> {
    if min > max {
        return Err(ConfigError::InvertedBounds {
            min_field,
            min,
            max_field,
            max,
        });
    }
    Ok(())
}

impl Config {
    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        if self.min_stake == 0 {
            return Err(ConfigError::Zero { field: "min_stake" });
        }
        if self.min_entry_fee == 0 {
            return Err(ConfigError::Zero {
                field: "min_entry_fee",
            });
        }
        ordered("min_stake", self.min_stake, "max_stake", self.max_stake)?;
        ordered(
            "min_entry_fee",
            self.min_entry_fee,
            "max_entry_fee",
            self.max_entry_fee,
        )?;
        if self.max_tournament_players < 2 {
            return Err(ConfigError::TooFewPlayers(self.max_tournament_players));
        }
        if self.max_tournament_players as usize > MAX_TOURNAMENT_PLAYERS {
            return Err(ConfigError::TooManyPlayers(self.max_tournament_players));
        }
        if self.platform_fee_bps > MAX_PLATFORM_FEE_BPS {
            return Err(ConfigError::FeeTooHigh(self.platform_fee_bps));
        }
        let log_level = Level::from_str(&self.log_level)
            .map_err(|_| ConfigError::InvalidLogLevel(self.log_level.clone()))?;

        Ok(ValidatedConfig {
            min_stake: self.min_stake,
            max_stake: self.max_stake,
            min_entry_fee: self.min_entry_fee,
            max_entry_fee: self.max_entry_fee,
            max_tournament_players: self.max_tournament_players,
            platform_fee_bps: self.platform_fee_bps,
            log_level,
        })
    }
}
