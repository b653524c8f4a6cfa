//! Plain-text table view.

use std::fmt;

use super::entities::Player;
use super::state_machine::TableState;

fn badges(player: &Player) -> String {
    let mut badges = Vec::with_capacity(3);
    if player.is_dealer {
        badges.push("D");
    }
    if player.is_small_blind {
        badges.push("SB");
    }
    if player.is_big_blind {
        badges.push("BB");
    }
    badges.join(",")
}

fn status(player: &Player, hand_running: bool) -> &'static str {
    if player.is_all_in {
        "all-in"
    } else if player.chips == 0 {
        "needs buy-in"
    } else if hand_running && !player.active {
        "folded"
    } else {
        ""
    }
}

impl fmt::Display for TableState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hand_running = self.hand_active() || self.phase.is_showdown_pending();
        writeln!(
            f,
            "{} | {} | pot ${} | blinds ${}/${}",
            self.phase, self.round, self.pot, self.config.small_blind, self.config.big_blind
        )?;

        for player in &self.players {
            let pointer = if self.to_act == Some(player.seat) {
                "->"
            } else {
                "  "
            };
            writeln!(
                f,
                "{pointer} [{}] {:8} ${:>5} | bet ${:>4} | {:8} {}",
                player.seat,
                player.name,
                player.chips,
                player.last_bet,
                badges(player),
                status(player, hand_running),
            )?;
        }

        if let Some(last) = &self.last_action {
            writeln!(f, "last: seat {} {}", last.seat, last.action)?;
        }
        if let Some(choices) = self.action_choices() {
            write!(f, "options: {choices}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::game::state_machine::{Intent, TableState};
    use crate::table::config::TableConfig;
    use chrono::Utc;

    #[test]
    fn test_render_marks_seat_to_act_and_roles() {
        let config = TableConfig::new(3, 100, 5, Utc::now()).unwrap();
        let state = TableState::with_default_players(config).unwrap();
        let state = state
            .apply(&Intent::StartHand { dealer: Some(0) }, Utc::now())
            .unwrap()
            .state;
        let text = state.to_string();
        assert!(text.contains("pot $15"));
        assert!(text.contains("-> [0] Player1"));
        assert!(text.contains("SB"));
        assert!(text.contains("options: call $10"));
    }
}
