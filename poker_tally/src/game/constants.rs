//! Table-wide limits and defaults.

use super::entities::Chips;

/// Fewest seats a table can be created with.
pub const MIN_SEATS: usize = 2;

/// Most seats a table can be created with.
pub const MAX_SEATS: usize = 10;

/// Display names are cut to this many characters.
pub const MAX_NAME_LENGTH: usize = 8;

/// Tables are gone this many hours after creation.
pub const TABLE_TTL_HOURS: i64 = 24;

pub const DEFAULT_SEATS: usize = 6;
pub const DEFAULT_BUY_IN: Chips = 100;
pub const DEFAULT_SMALL_BLIND: Chips = 5;

/// The small blind may not exceed this fraction (1/N) of the buy-in.
pub const BUY_IN_TO_MAX_SMALL_BLIND: Chips = 20;

/// Seat colors handed out when a player doesn't pick one.
pub const DEFAULT_COLORS: [&str; MAX_SEATS] = [
    "#FF4444", "#00C853", "#2196F3", "#FF9800", "#9C27B0", "#E91E63", "#00BCD4", "#4CAF50",
    "#FFC107", "#F44336",
];

/// How many times a session recomputes an intent after losing a commit race.
pub const DEFAULT_MAX_COMMIT_RETRIES: usize = 3;
