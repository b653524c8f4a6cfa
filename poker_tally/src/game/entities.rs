use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

use super::constants;

/// Type alias for whole chips. All bets, stacks, and pots are represented
/// as whole chips; there is no fractional currency at the table.
pub type Chips = u32;

/// Type alias for seat positions. A seat index is fixed for the lifetime
/// of the table and doubles as the player's primary key.
pub type SeatIndex = usize;

/// Stable identifier for a player at a table.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct PlayerId(Uuid);

impl PlayerId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct PlayerName(String);

impl PlayerName {
    /// Whitespace is squashed to underscores and the name is cut to
    /// `MAX_NAME_LENGTH` characters.
    pub fn new(s: &str) -> Self {
        let name: String = s
            .trim()
            .chars()
            .map(|c| if c.is_whitespace() { '_' } else { c })
            .take(constants::MAX_NAME_LENGTH)
            .collect();
        Self(name)
    }

    /// Name used for a seat whose player didn't type one in.
    pub fn for_seat(seat: SeatIndex) -> Self {
        Self::new(&format!("Player{}", seat + 1))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for PlayerName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}

impl From<String> for PlayerName {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

/// Betting round within a hand. Rounds only ever move forward.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Round {
    #[default]
    PreFlop,
    Flop,
    Turn,
    River,
}

impl Round {
    /// The round after this one, or `None` on the river.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::PreFlop => Some(Self::Flop),
            Self::Flop => Some(Self::Turn),
            Self::Turn => Some(Self::River),
            Self::River => None,
        }
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::PreFlop => "pre-flop",
            Self::Flop => "flop",
            Self::Turn => "turn",
            Self::River => "river",
        };
        write!(f, "{repr}")
    }
}

/// What the table creator enters for each seat.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PlayerSetup {
    pub name: PlayerName,
    pub color: String,
}

impl PlayerSetup {
    /// Blank names fall back to `PlayerN`.
    pub fn new(seat: SeatIndex, name: &str, color: Option<&str>) -> Self {
        let name = PlayerName::new(name);
        let name = if name.is_empty() {
            PlayerName::for_seat(seat)
        } else {
            name
        };
        let color = color
            .map(str::to_string)
            .unwrap_or_else(|| default_color(seat).to_string());
        Self { name, color }
    }

    /// Setups for `n` seats with default names and colors.
    pub fn defaults(n: usize) -> Vec<Self> {
        (0..n).map(|seat| Self::new(seat, "", None)).collect()
    }
}

fn default_color(seat: SeatIndex) -> &'static str {
    constants::DEFAULT_COLORS[seat % constants::DEFAULT_COLORS.len()]
}

/// Financial and status record for one seat.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: PlayerName,
    pub color: String,
    pub chips: Chips,
    pub seat: SeatIndex,
    pub total_buy_in: Chips,
    pub buy_in_count: u32,
    /// Still in the current hand (hasn't folded, wasn't busted at the start).
    pub active: bool,
    pub is_dealer: bool,
    pub is_small_blind: bool,
    pub is_big_blind: bool,
    /// Chips put in during the current betting round. Resets every round;
    /// the chips themselves stay in the pot.
    pub last_bet: Chips,
    pub acted_this_round: bool,
    pub is_all_in: bool,
}

impl Player {
    /// A freshly seated player with one buy-in worth of chips.
    #[must_use]
    pub fn new(setup: PlayerSetup, seat: SeatIndex, buy_in: Chips) -> Self {
        Self {
            id: PlayerId::new(),
            name: setup.name,
            color: setup.color,
            chips: buy_in,
            seat,
            total_buy_in: buy_in,
            buy_in_count: 1,
            active: true,
            is_dealer: false,
            is_small_blind: false,
            is_big_blind: false,
            last_bet: 0,
            acted_this_round: false,
            is_all_in: false,
        }
    }

    /// Can still take a betting action this hand.
    #[must_use]
    pub fn is_contesting(&self) -> bool {
        self.active && self.chips > 0 && !self.is_all_in
    }

    /// Still has a claim on the pot.
    #[must_use]
    pub fn is_in_hand(&self) -> bool {
        self.active && (self.chips > 0 || self.is_all_in)
    }

    /// Move up to `amount` chips from the stack into the current round's bet.
    /// Returns what was actually moved.
    pub fn commit_chips(&mut self, amount: Chips) -> Chips {
        let moved = amount.min(self.chips);
        self.chips -= moved;
        self.last_bet += moved;
        if self.chips == 0 && self.active {
            self.is_all_in = true;
        }
        moved
    }

    pub fn clear_roles(&mut self) {
        self.is_dealer = false;
        self.is_small_blind = false;
        self.is_big_blind = false;
    }

    pub fn reset_round(&mut self) {
        self.last_bet = 0;
        self.acted_this_round = false;
    }

    /// Clear everything hand-scoped, leaving the stack and ledger alone.
    pub fn reset_hand(&mut self) {
        self.reset_round();
        self.clear_roles();
        self.is_all_in = false;
        self.active = self.chips > 0;
    }

    #[must_use]
    pub fn stats(&self) -> PlayerStats {
        PlayerStats {
            seat: self.seat,
            name: self.name.clone(),
            chips: self.chips,
            buy_in_count: self.buy_in_count,
            total_buy_in: self.total_buy_in,
        }
    }
}

/// Per-player buy-in ledger line.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PlayerStats {
    pub seat: SeatIndex,
    pub name: PlayerName,
    pub chips: Chips,
    pub buy_in_count: u32,
    pub total_buy_in: Chips,
}

impl PlayerStats {
    /// Chips won (positive) or lost (negative) relative to what was bought in.
    #[must_use]
    pub fn net(&self) -> i64 {
        i64::from(self.chips) - i64::from(self.total_buy_in)
    }
}

impl fmt::Display for PlayerStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:8} buy-ins: {} | total: ${} | net: {:+}",
            self.name,
            self.buy_in_count,
            self.total_buy_in,
            self.net()
        )
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Action {
    AllIn,
    Call,
    Check,
    Fold,
    /// Chips put in with this action, including whatever was owed to call.
    Raise(Chips),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::AllIn => "goes all-in",
            Self::Call => "calls",
            Self::Check => "checks",
            Self::Fold => "folds",
            Self::Raise(amount) => &format!("raises ${amount}"),
        };
        write!(f, "{repr}")
    }
}

/// One option offered to the seat to act.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ActionChoice {
    AllIn(Chips),
    Call(Chips),
    Check,
    Fold,
    Raise { min: Chips, max: Chips },
}

impl fmt::Display for ActionChoice {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::AllIn(chips) => format!("all-in (${chips})"),
            Self::Call(amount) => format!("call ${amount}"),
            Self::Check => "check".to_string(),
            Self::Fold => "fold".to_string(),
            Self::Raise { min, max } if min == max => format!("raise ${min}"),
            Self::Raise { min, max } => format!("raise (${min}-${max})"),
        };
        write!(f, "{repr}")
    }
}

/// Options available to the seat to act, in display order.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ActionChoices(pub Vec<ActionChoice>);

impl ActionChoices {
    /// Whether `action` is one of the offered choices. Raise amounts must
    /// fall inside the offered range.
    pub fn contains(&self, action: &Action) -> bool {
        self.0.iter().any(|choice| match (choice, action) {
            (ActionChoice::AllIn(_), Action::AllIn)
            | (ActionChoice::Call(_), Action::Call)
            | (ActionChoice::Check, Action::Check)
            | (ActionChoice::Fold, Action::Fold) => true,
            (ActionChoice::Raise { min, max }, Action::Raise(amount)) => {
                (*min..=*max).contains(amount)
            }
            _ => false,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ActionChoices {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = self
            .0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{repr}")
    }
}

/// Chips handed to one seat when the pot is split.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Award {
    pub seat: SeatIndex,
    pub amount: Chips,
}

impl Award {
    #[must_use]
    pub fn new(seat: SeatIndex, amount: Chips) -> Self {
        Self { seat, amount }
    }
}

/// The most recent betting action at the table.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct LastAction {
    pub seat: SeatIndex,
    pub action: Action,
    /// Chips that actually moved into the pot.
    pub amount: Chips,
    pub timestamp: DateTime<Utc>,
}

/// A player who may receive part of the pot at showdown.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct EligiblePlayer {
    pub seat: SeatIndex,
    pub name: PlayerName,
    pub chips: Chips,
}

/// What winner selection needs to know: how big the pot is and who can
/// be paid from it.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ShowdownRequest {
    pub pot: Chips,
    pub eligible: Vec<EligiblePlayer>,
}

impl ShowdownRequest {
    /// Even split of the pot between `seats`. Rounding leftovers are not
    /// assigned here; distribution credits them to the first award.
    pub fn even_split(&self, seats: &[SeatIndex]) -> Vec<Award> {
        if seats.is_empty() {
            return Vec::new();
        }
        let share = self.pot / seats.len() as Chips;
        seats.iter().map(|&seat| Award::new(seat, share)).collect()
    }
}

/// Things that happened while applying an intent, for narration.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum HandEvent {
    HandStarted {
        dealer: SeatIndex,
        small_blind: SeatIndex,
        big_blind: SeatIndex,
    },
    BlindPosted {
        seat: SeatIndex,
        amount: Chips,
    },
    Acted {
        seat: SeatIndex,
        action: Action,
        amount: Chips,
    },
    RoundAdvanced(Round),
    /// Everybody else folded.
    PotAwarded {
        seat: SeatIndex,
        amount: Chips,
    },
    ShowdownRequested {
        pot: Chips,
    },
    PotDistributed(Vec<Award>),
    BoughtIn {
        seat: SeatIndex,
        amount: Chips,
    },
}

impl fmt::Display for HandEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::HandStarted {
                dealer,
                small_blind,
                big_blind,
            } => format!(
                "hand started: dealer seat {dealer}, small blind seat {small_blind}, big blind seat {big_blind}"
            ),
            Self::BlindPosted { seat, amount } => format!("seat {seat} posts ${amount}"),
            Self::Acted {
                seat,
                action,
                amount,
            } => format!("seat {seat} {action} (${amount} in)"),
            Self::RoundAdvanced(round) => format!("on to the {round}"),
            Self::PotAwarded { seat, amount } => {
                format!("seat {seat} wins ${amount} (all other players folded)")
            }
            Self::ShowdownRequested { pot } => format!("showdown for ${pot}, pick the winners"),
            Self::PotDistributed(awards) => {
                let parts = awards
                    .iter()
                    .map(|award| format!("seat {} +${}", award.seat, award.amount))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("pot split: {parts}")
            }
            Self::BoughtIn { seat, amount } => format!("seat {seat} buys in for ${amount}"),
        };
        write!(f, "{repr}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // === Name Tests ===

    #[test]
    fn test_player_name_truncates_to_eight_chars() {
        let name = PlayerName::new("Maximilian");
        assert_eq!(name.as_str(), "Maximili");
    }

    #[test]
    fn test_player_name_replaces_whitespace() {
        let name = PlayerName::new(" big al ");
        assert_eq!(name.as_str(), "big_al");
    }

    #[test]
    fn test_player_name_counts_chars_not_bytes() {
        let name = PlayerName::new("ÅÅÅÅÅÅÅÅÅÅ");
        assert_eq!(name.as_str().chars().count(), 8);
    }

    #[test]
    fn test_blank_setup_gets_default_name_and_color() {
        let setup = PlayerSetup::new(2, "   ", None);
        assert_eq!(setup.name.as_str(), "Player3");
        assert_eq!(setup.color, constants::DEFAULT_COLORS[2]);
    }

    // === Round Tests ===

    #[test]
    fn test_round_order() {
        assert_eq!(Round::PreFlop.next(), Some(Round::Flop));
        assert_eq!(Round::Flop.next(), Some(Round::Turn));
        assert_eq!(Round::Turn.next(), Some(Round::River));
        assert_eq!(Round::River.next(), None);
        assert!(Round::PreFlop < Round::River);
    }

    #[test]
    fn test_round_serializes_kebab_case() {
        let json = serde_json::to_string(&Round::PreFlop).unwrap();
        assert_eq!(json, "\"pre-flop\"");
    }

    // === Player Tests ===

    #[test]
    fn test_commit_chips_caps_at_stack() {
        let mut player = Player::new(PlayerSetup::new(0, "alice", None), 0, 30);
        let moved = player.commit_chips(50);
        assert_eq!(moved, 30);
        assert_eq!(player.chips, 0);
        assert_eq!(player.last_bet, 30);
        assert!(player.is_all_in);
        assert!(player.is_in_hand());
        assert!(!player.is_contesting());
    }

    #[test]
    fn test_reset_hand_recomputes_active() {
        let mut player = Player::new(PlayerSetup::new(0, "bob", None), 0, 10);
        player.commit_chips(10);
        player.is_dealer = true;
        player.reset_hand();
        assert!(!player.active);
        assert!(!player.is_all_in);
        assert!(!player.is_dealer);
        assert_eq!(player.last_bet, 0);
    }

    #[test]
    fn test_stats_net() {
        let mut player = Player::new(PlayerSetup::new(0, "carol", None), 0, 100);
        player.chips = 40;
        assert_eq!(player.stats().net(), -60);
    }

    // === Choice Tests ===

    #[test]
    fn test_action_choices_contains_raise_in_range() {
        let choices = ActionChoices(vec![
            ActionChoice::Call(5),
            ActionChoice::Raise { min: 6, max: 95 },
            ActionChoice::Fold,
        ]);
        assert!(choices.contains(&Action::Call));
        assert!(choices.contains(&Action::Raise(6)));
        assert!(!choices.contains(&Action::Raise(5)));
        assert!(!choices.contains(&Action::Check));
    }

    #[test]
    fn test_even_split() {
        let request = ShowdownRequest {
            pot: 25,
            eligible: Vec::new(),
        };
        let awards = request.even_split(&[0, 2]);
        assert_eq!(awards, vec![Award::new(0, 12), Award::new(2, 12)]);
    }
}
