//! Table state and the hand lifecycle.
//!
//! Every mutation is an [`Intent`] fed through [`transition`], which works on
//! a copy of the snapshot and hands back the next state plus the events it
//! produced. A rejected intent leaves the caller's snapshot untouched.

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::entities::{
    Action, Award, Chips, EligiblePlayer, HandEvent, LastAction, Player, PlayerSetup,
    PlayerStats, Round, SeatIndex, ShowdownRequest,
};
use super::errors::{DistributionError, InvalidActionReason, TableError, TableResult};
use super::functional;
use super::states::{Betting, HandPhase, NotStarted, PhaseRules, ShowdownPending};
use crate::table::config::TableConfig;

/// Something a participant wants to happen at the table.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Intent {
    /// `dealer` only matters for the first hand of a table.
    StartHand { dealer: Option<SeatIndex> },
    Act { seat: SeatIndex, action: Action },
    BuyIn { seat: SeatIndex },
    DistributePot { awards: Vec<Award> },
}

/// Result of applying an intent.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub state: TableState,
    pub events: Vec<HandEvent>,
}

/// Canonical state of one table. The store versions it; everything else is
/// plain data.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TableState {
    pub config: TableConfig,
    /// Indexed by seat. Never reordered, grown, or shrunk.
    pub players: Vec<Player>,
    pub pot: Chips,
    pub round: Round,
    pub to_act: Option<SeatIndex>,
    /// Kept between hands so the button can move.
    pub dealer: Option<SeatIndex>,
    pub betting_round: u32,
    pub phase: HandPhase,
    pub last_action: Option<LastAction>,
    pub version: u64,
}

impl TableState {
    /// Seat one player per setup, each with a single buy-in.
    pub fn new(config: TableConfig, setups: Vec<PlayerSetup>) -> TableResult<Self> {
        config.validate()?;
        if setups.len() != config.seat_count {
            return Err(TableError::InvalidConfig(format!(
                "expected {} players, got {}",
                config.seat_count,
                setups.len()
            )));
        }
        let players = setups
            .into_iter()
            .enumerate()
            .map(|(seat, setup)| Player::new(setup, seat, config.buy_in))
            .collect();
        Ok(Self {
            config,
            players,
            pot: 0,
            round: Round::PreFlop,
            to_act: None,
            dealer: None,
            betting_round: 0,
            phase: HandPhase::default(),
            last_action: None,
            version: 0,
        })
    }

    /// Table with default names and colors for every seat.
    pub fn with_default_players(config: TableConfig) -> TableResult<Self> {
        let setups = PlayerSetup::defaults(config.seat_count);
        Self::new(config, setups)
    }

    pub fn hand_active(&self) -> bool {
        self.phase.hand_active()
    }

    pub fn player(&self, seat: SeatIndex) -> TableResult<&Player> {
        self.players
            .get(seat)
            .ok_or(TableError::InvalidAction(InvalidActionReason::InvalidSeat(
                seat,
            )))
    }

    pub(crate) fn player_mut(&mut self, seat: SeatIndex) -> TableResult<&mut Player> {
        self.players
            .get_mut(seat)
            .ok_or(TableError::InvalidAction(InvalidActionReason::InvalidSeat(
                seat,
            )))
    }

    /// Chips `seat` owes to stay in.
    pub fn to_call(&self, seat: SeatIndex) -> Chips {
        if seat >= self.players.len() {
            return 0;
        }
        functional::to_call(&self.players, seat)
    }

    /// Stacks plus pot. Always equals [`Self::total_bought_in`].
    pub fn chips_in_play(&self) -> u64 {
        functional::total_chips(&self.players) + u64::from(self.pot)
    }

    pub fn total_bought_in(&self) -> u64 {
        functional::total_bought_in(&self.players)
    }

    /// Seats sitting on zero chips.
    pub fn players_needing_buy_in(&self) -> Vec<SeatIndex> {
        self.players
            .iter()
            .filter(|p| p.chips == 0)
            .map(|p| p.seat)
            .collect()
    }

    pub fn stats(&self) -> Vec<PlayerStats> {
        self.players.iter().map(Player::stats).collect()
    }

    /// Pot and eligible players while winners are being picked.
    pub fn showdown_request(&self) -> Option<ShowdownRequest> {
        if !self.phase.is_showdown_pending() {
            return None;
        }
        let eligible = self
            .players
            .iter()
            .filter(|p| p.active || p.chips > 0)
            .map(|p| EligiblePlayer {
                seat: p.seat,
                name: p.name.clone(),
                chips: p.chips,
            })
            .collect();
        Some(ShowdownRequest {
            pot: self.pot,
            eligible,
        })
    }

    /// Apply `intent` to a copy of this state.
    pub fn apply(&self, intent: &Intent, now: DateTime<Utc>) -> TableResult<Transition> {
        transition(self, intent, now)
    }

    pub(crate) fn start_hand(
        &mut self,
        initial_dealer: Option<SeatIndex>,
        events: &mut Vec<HandEvent>,
    ) -> TableResult<()> {
        // The hint only matters until the button exists.
        if let (None, Some(seat)) = (self.dealer, initial_dealer) {
            self.player(seat)?;
        }
        let funded = functional::funded_count(&self.players);
        if funded < 2 {
            return Err(TableError::InsufficientPlayers { funded });
        }

        for player in &mut self.players {
            player.reset_hand();
        }

        let last_seat = self.players.len() - 1;
        let dealer = match (self.dealer, initial_dealer) {
            (Some(previous), _) => functional::next_funded_seat(&self.players, previous),
            (None, Some(seat)) if self.players[seat].chips > 0 => Some(seat),
            (None, Some(seat)) => functional::next_funded_seat(&self.players, seat),
            (None, None) => functional::next_funded_seat(&self.players, last_seat),
        }
        .ok_or(TableError::InsufficientPlayers { funded })?;

        let heads_up = funded == 2;
        let small_blind = if heads_up {
            dealer
        } else {
            functional::next_funded_seat(&self.players, dealer)
                .ok_or(TableError::InsufficientPlayers { funded })?
        };
        let big_blind = functional::next_funded_seat(&self.players, small_blind)
            .ok_or(TableError::InsufficientPlayers { funded })?;

        self.dealer = Some(dealer);
        self.players[dealer].is_dealer = true;
        self.players[small_blind].is_small_blind = true;
        self.players[big_blind].is_big_blind = true;
        self.round = Round::PreFlop;
        self.betting_round = 0;
        self.last_action = None;
        self.phase = Betting.into();

        info!(
            "Hand started: dealer {}, small blind {}, big blind {}",
            dealer, small_blind, big_blind
        );
        events.push(HandEvent::HandStarted {
            dealer,
            small_blind,
            big_blind,
        });

        self.post_blind(small_blind, self.config.small_blind, events);
        self.post_blind(big_blind, self.config.big_blind, events);

        let nominal = if heads_up {
            dealer
        } else {
            functional::next_funded_seat(&self.players, big_blind)
                .ok_or(TableError::InsufficientPlayers { funded })?
        };
        self.to_act = if self.players[nominal].is_contesting() {
            Some(nominal)
        } else {
            functional::next_contesting_seat(&self.players, nominal)
        };

        if self.to_act.is_none() || self.round_closed() {
            self.advance_round(events);
        }
        Ok(())
    }

    fn post_blind(&mut self, seat: SeatIndex, blind: Chips, events: &mut Vec<HandEvent>) {
        let player = &mut self.players[seat];
        let amount = player.commit_chips(blind);
        player.acted_this_round = true;
        self.pot += amount;
        events.push(HandEvent::BlindPosted { seat, amount });
    }

    /// Close the current betting round and move the hand along.
    pub(crate) fn advance_round(&mut self, events: &mut Vec<HandEvent>) {
        for player in &mut self.players {
            player.reset_round();
        }

        if functional::contesting_count(&self.players) < 2 {
            debug!("Fewer than two players can act, running out the board");
            while let Some(next) = self.round.next() {
                self.round = next;
                events.push(HandEvent::RoundAdvanced(next));
            }
            self.showdown(events);
            return;
        }

        match self.round.next() {
            Some(next) => {
                self.round = next;
                self.to_act = functional::first_contesting_seat(&self.players);
                debug!("Advanced to the {next}, seat {:?} to act", self.to_act);
                events.push(HandEvent::RoundAdvanced(next));
            }
            None => self.showdown(events),
        }
    }

    fn showdown(&mut self, events: &mut Vec<HandEvent>) {
        self.phase = ShowdownPending.into();
        self.to_act = None;
        info!("Showdown pending for ${}", self.pot);
        events.push(HandEvent::ShowdownRequested { pot: self.pot });
        if self.pot == 0 {
            self.end_hand();
        }
    }

    /// Back to between-hands. The pot must already be empty.
    pub(crate) fn end_hand(&mut self) {
        for player in &mut self.players {
            player.reset_hand();
        }
        self.pot = 0;
        self.round = Round::PreFlop;
        self.to_act = None;
        self.betting_round = 0;
        self.phase = NotStarted.into();
    }

    pub(crate) fn distribute_pot(
        &mut self,
        awards: &[Award],
        events: &mut Vec<HandEvent>,
    ) -> TableResult<()> {
        let Some(first) = awards.first() else {
            return Err(DistributionError::NoWinners.into());
        };

        let mut seen = HashSet::with_capacity(awards.len());
        for award in awards {
            if !seen.insert(award.seat) {
                return Err(DistributionError::DuplicateSeat(award.seat).into());
            }
            match self.players.get(award.seat) {
                Some(p) if p.active || p.chips > 0 => {}
                _ => return Err(DistributionError::IneligibleSeat(award.seat).into()),
            }
        }

        let total: u64 = awards.iter().map(|a| u64::from(a.amount)).sum();
        if total > u64::from(self.pot) {
            return Err(DistributionError::ExceedsPot {
                total,
                pot: self.pot,
            }
            .into());
        }

        // Bounded by the pot, so this fits.
        let remainder = self.pot - total as Chips;
        let mut paid = awards.to_vec();
        paid[0].amount += remainder;
        for award in &paid {
            self.players[award.seat].chips += award.amount;
        }

        info!(
            "Pot of ${} distributed, ${} remainder to seat {}",
            self.pot, remainder, first.seat
        );
        events.push(HandEvent::PotDistributed(paid));
        self.pot = 0;
        self.end_hand();
        Ok(())
    }

    pub(crate) fn buy_in(&mut self, seat: SeatIndex, events: &mut Vec<HandEvent>) -> TableResult<()> {
        let amount = self.config.buy_in;
        // Pot and stacks never exceed what was bought in, so capping this caps them.
        let table_total = self.total_bought_in() + u64::from(amount);
        let player = self.player_mut(seat)?;
        if player.chips > 0 {
            return Err(TableError::AlreadyFunded {
                seat,
                chips: player.chips,
            });
        }
        let limit = TableError::ChipLimit { max: Chips::MAX };
        if table_total > u64::from(Chips::MAX) {
            return Err(limit);
        }
        let total_buy_in = player.total_buy_in.checked_add(amount).ok_or(limit)?;
        player.chips = amount;
        player.total_buy_in = total_buy_in;
        player.buy_in_count += 1;
        player.active = true;
        info!("Seat {} bought in for ${}", seat, amount);
        events.push(HandEvent::BoughtIn { seat, amount });
        Ok(())
    }
}

/// Compute the state that follows `intent`, or say why it can't happen.
///
/// The returned state keeps the input's `version`; bumping it is the
/// store's job when the commit lands.
pub fn transition(
    state: &TableState,
    intent: &Intent,
    now: DateTime<Utc>,
) -> TableResult<Transition> {
    state.phase.admits(intent)?;

    let mut next = state.clone();
    let mut events = Vec::new();
    match intent {
        Intent::StartHand { dealer } => next.start_hand(*dealer, &mut events)?,
        Intent::Act { seat, action } => next.apply_action(*seat, action, now, &mut events)?,
        Intent::BuyIn { seat } => next.buy_in(*seat, &mut events)?,
        Intent::DistributePot { awards } => next.distribute_pot(awards, &mut events)?,
    }
    Ok(Transition {
        state: next,
        events,
    })
}
