// Board variants keyed by player count.
//
// Each variant fixes which goal corners are handed out, in seat order.
// Starting arms are the opposites, so seats never share an arm. Five players
// have no variant: there is no symmetric five-seat layout on a six-point star.

use halma_protocol::{Corner, GameType};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoardVariant {
    TwoPlayers,
    ThreePlayers,
    FourPlayers,
    SixPlayers,
}

impl BoardVariant {
    pub fn for_player_count(count: usize) -> Option<Self> {
        match count {
            2 => Some(BoardVariant::TwoPlayers),
            3 => Some(BoardVariant::ThreePlayers),
            4 => Some(BoardVariant::FourPlayers),
            6 => Some(BoardVariant::SixPlayers),
            _ => None,
        }
    }

    pub fn player_count(self) -> usize {
        self.goal_corners().len()
    }

    /// Goal corner per seat.
    pub fn goal_corners(self) -> &'static [Corner] {
        match self {
            BoardVariant::TwoPlayers => &[Corner(0), Corner(3)],
            BoardVariant::ThreePlayers => &[Corner(0), Corner(2), Corner(4)],
            BoardVariant::FourPlayers => &[Corner(0), Corner(1), Corner(3), Corner(4)],
            BoardVariant::SixPlayers => &[
                Corner(0),
                Corner(1),
                Corner(2),
                Corner(3),
                Corner(4),
                Corner(5),
            ],
        }
    }
}

impl From<GameType> for BoardVariant {
    fn from(game_type: GameType) -> Self {
        match game_type {
            GameType::TwoPlayers => BoardVariant::TwoPlayers,
            GameType::ThreePlayers => BoardVariant::ThreePlayers,
            GameType::FourPlayers => BoardVariant::FourPlayers,
            GameType::SixPlayers => BoardVariant::SixPlayers,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn starting_arms_never_collide() {
        for count in [2, 3, 4, 6] {
            let variant = BoardVariant::for_player_count(count).unwrap();
            assert_eq!(variant.player_count(), count);
            let starts: BTreeSet<_> = variant.goal_corners().iter().map(|c| c.opposite()).collect();
            assert_eq!(starts.len(), count);
        }
    }

    #[test]
    fn no_five_player_board() {
        assert_eq!(BoardVariant::for_player_count(5), None);
        assert_eq!(BoardVariant::for_player_count(1), None);
    }
}
