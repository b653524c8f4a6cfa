//! Table configuration models.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::game::{
    constants::{
        BUY_IN_TO_MAX_SMALL_BLIND, DEFAULT_BUY_IN, DEFAULT_MAX_COMMIT_RETRIES, DEFAULT_SEATS,
        DEFAULT_SMALL_BLIND, MAX_SEATS, MIN_SEATS, TABLE_TTL_HOURS,
    },
    entities::Chips,
    errors::{TableError, TableResult},
};

/// Table configuration. Fixed once the table is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Number of seats (2-10)
    pub seat_count: usize,

    /// Chips handed out per buy-in
    pub buy_in: Chips,

    pub small_blind: Chips,

    /// Always twice the small blind
    pub big_blind: Chips,

    pub created_at: DateTime<Utc>,

    /// The table is gone after this instant
    pub expires_at: DateTime<Utc>,
}

impl Default for TableConfig {
    fn default() -> Self {
        let created_at = Utc::now();
        Self {
            seat_count: DEFAULT_SEATS,
            buy_in: DEFAULT_BUY_IN,
            small_blind: DEFAULT_SMALL_BLIND,
            big_blind: DEFAULT_SMALL_BLIND * 2,
            created_at,
            expires_at: created_at + Duration::hours(TABLE_TTL_HOURS),
        }
    }
}

impl TableConfig {
    /// Build and validate a config for a table created at `now`.
    pub fn new(
        seat_count: usize,
        buy_in: Chips,
        small_blind: Chips,
        now: DateTime<Utc>,
    ) -> TableResult<Self> {
        let config = Self {
            seat_count,
            buy_in,
            small_blind,
            big_blind: small_blind.saturating_mul(2),
            created_at: now,
            expires_at: now + Duration::hours(TABLE_TTL_HOURS),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> TableResult<()> {
        if !(MIN_SEATS..=MAX_SEATS).contains(&self.seat_count) {
            return Err(TableError::InvalidConfig(format!(
                "Seat count must be between {MIN_SEATS} and {MAX_SEATS}"
            )));
        }

        if self.buy_in == 0 {
            return Err(TableError::InvalidConfig(
                "Buy-in must be positive".to_string(),
            ));
        }

        let starting_chips = self.seat_count as u64 * u64::from(self.buy_in);
        if starting_chips > u64::from(Chips::MAX) {
            return Err(TableError::InvalidConfig(format!(
                "{} seats of ${} exceed the ${} chip limit",
                self.seat_count,
                self.buy_in,
                Chips::MAX
            )));
        }

        if self.small_blind == 0 {
            return Err(TableError::InvalidConfig(
                "Small blind must be at least 1".to_string(),
            ));
        }

        if self.small_blind > self.max_small_blind() {
            return Err(TableError::InvalidConfig(format!(
                "Small blind can be at most ${} for a ${} buy-in",
                self.max_small_blind(),
                self.buy_in
            )));
        }

        if self.big_blind != self.small_blind * 2 {
            return Err(TableError::InvalidConfig(
                "Big blind must be twice the small blind".to_string(),
            ));
        }

        if self.expires_at <= self.created_at {
            return Err(TableError::InvalidConfig(
                "Expiry must come after creation".to_string(),
            ));
        }

        Ok(())
    }

    /// Largest small blind this buy-in allows, never below 1
    pub fn max_small_blind(&self) -> Chips {
        (self.buy_in / BUY_IN_TO_MAX_SMALL_BLIND).max(1)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// How a session talks to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Extra attempts after a commit loses to a concurrent writer
    pub max_commit_retries: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_commit_retries: DEFAULT_MAX_COMMIT_RETRIES,
        }
    }
}
