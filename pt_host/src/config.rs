//! Host configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use poker_tally::{
    constants::{DEFAULT_BUY_IN, DEFAULT_MAX_COMMIT_RETRIES, DEFAULT_SEATS, DEFAULT_SMALL_BLIND},
    entities::{Chips, PlayerSetup},
    table::{SessionConfig, TableConfig},
};
use url::Url;

const DEFAULT_SHARE_BASE: &str = "http://localhost:8080/";

/// Complete host configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Seats at the table
    pub seats: usize,
    /// Chips per buy-in
    pub buy_in: Chips,
    /// Small blind; the big blind is twice this
    pub small_blind: Chips,
    /// Player names in seat order. Missing or blank names get defaults.
    pub players: Vec<String>,
    /// Page that share links point at
    pub share_base: Url,
    /// Extra commit attempts after losing a race
    pub commit_retries: usize,
}

/// CLI values that win over the environment
#[derive(Debug, Default)]
pub struct Overrides {
    pub seats: Option<usize>,
    pub buy_in: Option<Chips>,
    pub small_blind: Option<Chips>,
    pub players: Option<String>,
}

impl HostConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns error if a variable is present but unusable
    pub fn from_env(overrides: Overrides) -> Result<Self, ConfigError> {
        let seats = overrides
            .seats
            .unwrap_or_else(|| parse_env_or("TALLY_SEATS", DEFAULT_SEATS));
        let buy_in = overrides
            .buy_in
            .unwrap_or_else(|| parse_env_or("TALLY_BUY_IN", DEFAULT_BUY_IN));
        let small_blind = overrides
            .small_blind
            .unwrap_or_else(|| parse_env_or("TALLY_SMALL_BLIND", DEFAULT_SMALL_BLIND));

        let players = overrides
            .players
            .or_else(|| std::env::var("TALLY_PLAYERS").ok())
            .map(|names| split_names(&names))
            .unwrap_or_default();

        let share_base = std::env::var("TALLY_SHARE_BASE")
            .unwrap_or_else(|_| DEFAULT_SHARE_BASE.to_string());
        let share_base = Url::parse(&share_base).map_err(|e| ConfigError::Invalid {
            var: "TALLY_SHARE_BASE".to_string(),
            reason: e.to_string(),
        })?;

        let commit_retries = parse_env_or("TALLY_COMMIT_RETRIES", DEFAULT_MAX_COMMIT_RETRIES);

        Ok(HostConfig {
            seats,
            buy_in,
            small_blind,
            players,
            share_base,
            commit_retries,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.players.len() > self.seats {
            return Err(ConfigError::Invalid {
                var: "TALLY_PLAYERS".to_string(),
                reason: format!("{} names for {} seats", self.players.len(), self.seats),
            });
        }

        self.table_config(chrono::Utc::now())
            .map(|_| ())
            .map_err(|e| ConfigError::Invalid {
                var: "TALLY_SEATS/TALLY_BUY_IN/TALLY_SMALL_BLIND".to_string(),
                reason: e.client_message(),
            })
    }

    pub fn table_config(
        &self,
        now: chrono::DateTime<chrono::Utc>,
    ) -> poker_tally::TableResult<TableConfig> {
        TableConfig::new(self.seats, self.buy_in, self.small_blind, now)
    }

    /// One setup per seat, named from `players` where given.
    pub fn player_setups(&self) -> Vec<PlayerSetup> {
        (0..self.seats)
            .map(|seat| {
                let name = self.players.get(seat).map(String::as_str).unwrap_or("");
                PlayerSetup::new(seat, name, None)
            })
            .collect()
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            max_commit_retries: self.commit_retries,
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

fn split_names(names: &str) -> Vec<String> {
    names
        .split(',')
        .map(|name| name.trim().to_string())
        .collect()
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
