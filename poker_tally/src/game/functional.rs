//! Pure helpers over the seat vector. Nothing here mutates a player.

use super::entities::{Chips, Player, SeatIndex};

/// First seat after `from` (wrapping, `from` itself checked last) that
/// satisfies `pred`.
pub fn next_seat_where<P>(players: &[Player], from: SeatIndex, pred: P) -> Option<SeatIndex>
where
    P: Fn(&Player) -> bool,
{
    let n = players.len();
    (1..=n)
        .map(|offset| (from + offset) % n)
        .find(|&seat| pred(&players[seat]))
}

/// First seat from 0 upward that satisfies `pred`.
pub fn first_seat_where<P>(players: &[Player], pred: P) -> Option<SeatIndex>
where
    P: Fn(&Player) -> bool,
{
    players.iter().position(pred)
}

pub fn next_funded_seat(players: &[Player], from: SeatIndex) -> Option<SeatIndex> {
    next_seat_where(players, from, |p| p.chips > 0)
}

pub fn next_contesting_seat(players: &[Player], from: SeatIndex) -> Option<SeatIndex> {
    next_seat_where(players, from, Player::is_contesting)
}

pub fn first_contesting_seat(players: &[Player]) -> Option<SeatIndex> {
    first_seat_where(players, Player::is_contesting)
}

/// Highest current-round contribution among players still in the hand.
pub fn highest_bet(players: &[Player]) -> Chips {
    players
        .iter()
        .filter(|p| p.active)
        .map(|p| p.last_bet)
        .max()
        .unwrap_or(0)
}

/// Chips `seat` owes to match the highest contribution.
pub fn to_call(players: &[Player], seat: SeatIndex) -> Chips {
    highest_bet(players).saturating_sub(players[seat].last_bet)
}

pub fn funded_count(players: &[Player]) -> usize {
    players.iter().filter(|p| p.chips > 0).count()
}

pub fn contesting_count(players: &[Player]) -> usize {
    players.iter().filter(|p| p.is_contesting()).count()
}

pub fn in_hand_count(players: &[Player]) -> usize {
    players.iter().filter(|p| p.is_in_hand()).count()
}

/// Chips sitting in stacks. Widened so ten maxed stacks can't overflow.
pub fn total_chips(players: &[Player]) -> u64 {
    players.iter().map(|p| u64::from(p.chips)).sum()
}

pub fn total_bought_in(players: &[Player]) -> u64 {
    players.iter().map(|p| u64::from(p.total_buy_in)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::PlayerSetup;

    fn table(stacks: &[Chips]) -> Vec<Player> {
        stacks
            .iter()
            .enumerate()
            .map(|(seat, &chips)| {
                let mut player = Player::new(PlayerSetup::new(seat, "", None), seat, 100);
                player.chips = chips;
                player.active = chips > 0;
                player
            })
            .collect()
    }

    #[test]
    fn test_next_funded_seat_skips_busted_and_wraps() {
        let players = table(&[50, 0, 0, 80]);
        assert_eq!(next_funded_seat(&players, 0), Some(3));
        assert_eq!(next_funded_seat(&players, 3), Some(0));
    }

    #[test]
    fn test_next_seat_checks_origin_last() {
        let players = table(&[50, 0, 0]);
        assert_eq!(next_funded_seat(&players, 0), Some(0));
    }

    #[test]
    fn test_next_seat_none_when_nobody_matches() {
        let players = table(&[0, 0]);
        assert_eq!(next_funded_seat(&players, 1), None);
    }

    #[test]
    fn test_to_call_ignores_folded_players() {
        let mut players = table(&[100, 100, 100]);
        players[0].last_bet = 40;
        players[0].active = false;
        players[1].last_bet = 10;
        assert_eq!(highest_bet(&players), 10);
        assert_eq!(to_call(&players, 2), 10);
        assert_eq!(to_call(&players, 1), 0);
    }

    #[test]
    fn test_counts() {
        let mut players = table(&[100, 0, 100, 100]);
        players[2].chips = 0;
        players[2].is_all_in = true;
        assert_eq!(funded_count(&players), 2);
        assert_eq!(contesting_count(&players), 2);
        assert_eq!(in_hand_count(&players), 3);
        assert_eq!(first_contesting_seat(&players), Some(0));
    }
}
