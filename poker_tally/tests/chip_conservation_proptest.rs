/// Property-based tests for the betting engine using proptest
///
/// These drive tables through long random sequences of intents, legal or
/// not, and check the accounting and turn invariants after every step.
use chrono::Utc;
use poker_tally::{
    Intent, TableConfig, TableState,
    entities::{Action, ActionChoice, Award, Round},
};
use proptest::prelude::*;

// Strategy to generate a raw action; amounts may well be illegal
fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        Just(Action::Fold),
        Just(Action::Check),
        Just(Action::Call),
        Just(Action::AllIn),
        (0u32..150).prop_map(Action::Raise),
    ]
}

// One step of a random session: a seat hint, an action, and a split hint
fn step_strategy() -> impl Strategy<Value = (usize, Action, u8)> {
    (0usize..10, action_strategy(), any::<u8>())
}

fn new_table(seats: usize) -> TableState {
    let config = TableConfig::new(seats, 100, 2, Utc::now()).unwrap();
    TableState::with_default_players(config).unwrap()
}

/// Turn a random step into an intent that fits the current phase.
fn intent_for(state: &TableState, seat_hint: usize, action: Action, split: u8) -> Intent {
    if state.hand_active() {
        // Mostly act in turn, sometimes out of turn.
        let seat = match state.to_act {
            Some(seat) if seat_hint % 4 != 0 => seat,
            _ => seat_hint % state.players.len(),
        };
        return Intent::Act { seat, action };
    }

    if let Some(request) = state.showdown_request() {
        let first = request.eligible[seat_hint % request.eligible.len()].seat;
        let amount = request.pot / 255 * u32::from(split);
        return Intent::DistributePot {
            awards: vec![Award::new(first, amount)],
        };
    }

    let needing = state.players_needing_buy_in();
    if !needing.is_empty() && split % 2 == 0 {
        return Intent::BuyIn {
            seat: needing[seat_hint % needing.len()],
        };
    }
    Intent::StartHand {
        dealer: Some(seat_hint % state.players.len()),
    }
}

fn check_invariants(state: &TableState) -> Result<(), TestCaseError> {
    prop_assert_eq!(state.chips_in_play(), state.total_bought_in());

    let dealers = state.players.iter().filter(|p| p.is_dealer).count();
    let small_blinds = state.players.iter().filter(|p| p.is_small_blind).count();
    let big_blinds = state.players.iter().filter(|p| p.is_big_blind).count();
    prop_assert!(dealers <= 1 && small_blinds <= 1 && big_blinds <= 1);

    for player in &state.players {
        if player.is_all_in {
            prop_assert_eq!(player.chips, 0);
            prop_assert!(player.active);
        }
    }

    if state.hand_active() {
        let seat = state.to_act;
        prop_assert!(seat.is_some(), "betting with nobody to act");
        let player = &state.players[seat.unwrap_or_default()];
        prop_assert!(player.is_contesting(), "seat to act can't act");
        prop_assert!(!state.round_closed(), "closed round left open");
    } else {
        prop_assert!(state.to_act.is_none());
    }

    if !state.hand_active() && !state.phase.is_showdown_pending() {
        prop_assert_eq!(state.pot, 0);
        prop_assert_eq!(state.round, Round::PreFlop);
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn test_random_sessions_keep_invariants(
        seats in 2usize..=6,
        steps in prop::collection::vec(step_strategy(), 1..200),
    ) {
        let mut state = new_table(seats);

        for (seat_hint, action, split) in steps {
            let intent = intent_for(&state, seat_hint, action, split);
            let before = state.clone();

            match state.apply(&intent, Utc::now()) {
                Ok(transition) => {
                    // Rounds only move forward inside one hand.
                    if before.hand_active() && transition.state.hand_active() {
                        prop_assert!(transition.state.round >= before.round);
                    }
                    state = transition.state;
                }
                Err(_) => {
                    prop_assert_eq!(&state, &before);
                }
            }

            check_invariants(&state)?;
        }
    }

    #[test]
    fn test_choices_offered_are_accepted(
        seats in 2usize..=6,
        picks in prop::collection::vec(any::<u8>(), 1..120),
    ) {
        let mut state = new_table(seats);

        for pick in picks {
            let intent = match state.action_choices() {
                Some(choices) => {
                    let seat = state.to_act.unwrap_or_default();
                    let choice = &choices.0[usize::from(pick) % choices.0.len()];
                    let action = match choice {
                        ActionChoice::AllIn(_) => Action::AllIn,
                        ActionChoice::Call(_) => Action::Call,
                        ActionChoice::Check => Action::Check,
                        ActionChoice::Fold => Action::Fold,
                        ActionChoice::Raise { min, max } => {
                            Action::Raise(min + u32::from(pick) % (max - min + 1))
                        }
                    };
                    prop_assert!(choices.contains(&action));
                    Intent::Act { seat, action }
                }
                None => intent_for(&state, usize::from(pick), Action::Check, pick),
            };

            let is_betting = matches!(intent, Intent::Act { .. });
            match state.apply(&intent, Utc::now()) {
                Ok(transition) => state = transition.state,
                Err(err) => prop_assert!(!is_betting, "offered choice rejected: {}", err),
            }
            check_invariants(&state)?;
        }
    }
}
