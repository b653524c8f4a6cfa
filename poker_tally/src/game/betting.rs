//! Betting: validating and applying a single action, then deciding whose
//! turn it is, whether the round closed, or whether the hand is over.

use chrono::{DateTime, Utc};
use log::{debug, info};

use super::entities::{
    Action, ActionChoice, ActionChoices, Chips, HandEvent, LastAction, SeatIndex,
};
use super::errors::{InvalidActionReason, TableResult};
use super::functional;
use super::state_machine::TableState;

impl TableState {
    /// Smallest legal raise for someone facing `to_call`.
    pub fn min_raise(&self, to_call: Chips) -> Chips {
        if to_call == 0 {
            self.config.big_blind
        } else {
            to_call + 1
        }
    }

    /// Options for the seat to act, or `None` when nobody is acting.
    pub fn action_choices(&self) -> Option<ActionChoices> {
        let seat = self.to_act?;
        let player = self.players.get(seat)?;
        if !self.hand_active() || !player.is_contesting() {
            return None;
        }

        let to_call = self.to_call(seat);
        if to_call >= player.chips {
            return Some(ActionChoices(vec![
                ActionChoice::AllIn(player.chips),
                ActionChoice::Fold,
            ]));
        }

        let mut choices = Vec::with_capacity(4);
        if to_call == 0 {
            choices.push(ActionChoice::Check);
        } else {
            choices.push(ActionChoice::Call(to_call));
        }
        let min = self.min_raise(to_call);
        if min <= player.chips {
            choices.push(ActionChoice::Raise {
                min,
                max: player.chips,
            });
        }
        choices.push(ActionChoice::AllIn(player.chips));
        choices.push(ActionChoice::Fold);
        Some(ActionChoices(choices))
    }

    /// Every contesting player has acted and matched the highest bet.
    pub fn round_closed(&self) -> bool {
        let highest = functional::highest_bet(&self.players);
        self.players
            .iter()
            .filter(|p| p.is_contesting())
            .all(|p| p.acted_this_round && p.last_bet == highest)
    }

    fn validate_action(&self, seat: SeatIndex, action: &Action) -> TableResult<Chips> {
        let player = self.player(seat)?;
        if self.to_act != Some(seat) {
            return Err(InvalidActionReason::OutOfTurn.into());
        }
        if !player.is_contesting() {
            return Err(InvalidActionReason::CannotAct.into());
        }

        let to_call = self.to_call(seat);
        let commit = match action {
            Action::Fold => 0,
            Action::Check => {
                if to_call > 0 {
                    return Err(InvalidActionReason::CannotCheck { to_call }.into());
                }
                0
            }
            Action::Call => {
                if to_call == 0 {
                    return Err(InvalidActionReason::NothingToCall.into());
                }
                to_call.min(player.chips)
            }
            Action::Raise(amount) => {
                if *amount > player.chips {
                    return Err(InvalidActionReason::InsufficientChips {
                        chips: player.chips,
                    }
                    .into());
                }
                let min = self.min_raise(to_call);
                if *amount < min {
                    return Err(InvalidActionReason::RaiseTooSmall { min }.into());
                }
                *amount
            }
            Action::AllIn => player.chips,
        };
        Ok(commit)
    }

    pub(crate) fn apply_action(
        &mut self,
        seat: SeatIndex,
        action: &Action,
        now: DateTime<Utc>,
        events: &mut Vec<HandEvent>,
    ) -> TableResult<()> {
        let commit = self.validate_action(seat, action)?;
        let highest = functional::highest_bet(&self.players);

        let player = &mut self.players[seat];
        let moved = match action {
            Action::Fold => {
                player.active = false;
                0
            }
            _ => player.commit_chips(commit),
        };
        player.acted_this_round = true;
        let reopened = player.last_bet > highest;
        self.pot += moved;

        if reopened {
            for other in self.players.iter_mut().filter(|p| p.seat != seat) {
                if other.is_contesting() {
                    other.acted_this_round = false;
                }
            }
        }

        debug!("Seat {} {} (${} in)", seat, action, moved);
        self.last_action = Some(LastAction {
            seat,
            action: action.clone(),
            amount: moved,
            timestamp: now,
        });
        events.push(HandEvent::Acted {
            seat,
            action: action.clone(),
            amount: moved,
        });

        self.settle_after_action(seat, events);
        Ok(())
    }

    /// Decide what follows an accepted action.
    fn settle_after_action(&mut self, actor: SeatIndex, events: &mut Vec<HandEvent>) {
        if functional::in_hand_count(&self.players) == 1 {
            if let Some(winner) = self.players.iter().position(|p| p.is_in_hand()) {
                let amount = self.pot;
                self.players[winner].chips += amount;
                self.pot = 0;
                info!("Seat {} wins ${} uncontested", winner, amount);
                events.push(HandEvent::PotAwarded {
                    seat: winner,
                    amount,
                });
                self.end_hand();
                return;
            }
        }

        if functional::contesting_count(&self.players) == 0 || self.round_closed() {
            self.advance_round(events);
            return;
        }

        self.to_act = functional::next_contesting_seat(&self.players, actor);
        self.betting_round += 1;
        debug!("Seat {:?} to act", self.to_act);
    }
}
