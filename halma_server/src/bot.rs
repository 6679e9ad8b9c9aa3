// Server-side players.
//
// A `BotStrategy` picks moves for a bot seat on the match worker thread. It
// sees only positions and a legal-destination oracle, never the board, so the
// worker keeps sole ownership of match state.
//
// `EasyBot` is greedy: it scores a destination by Chebyshev distance to the
// tip of its goal arm and takes the first minimum in enumeration order.
// `best_continuation` does the same for the follow-up jumps of the pawn it
// just moved.

use halma_board::geometry;
use halma_protocol::{Corner, Position};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BotMove {
    pub from: Position,
    pub to: Position,
}

pub trait BotStrategy: Send {
    /// Pick a move among every pawn's legal destinations. `None` passes.
    fn best_move(
        &mut self,
        corner: Corner,
        pawns: &[Position],
        legal: &dyn Fn(Position) -> Vec<Position>,
    ) -> Option<BotMove>;

    /// Pick a follow-up move for the pawn moved last, among `options`.
    fn best_continuation(&mut self, corner: Corner, options: &[Position]) -> Option<BotMove>;
}

/// Distance from `position` to the tip of `corner`'s arm.
pub fn goal_distance(corner: Corner, position: Position) -> u32 {
    geometry::tip(corner).chebyshev_distance(position)
}

#[derive(Debug, Default)]
pub struct EasyBot {
    last_move: Option<BotMove>,
}

impl EasyBot {
    fn closest(corner: Corner, candidates: impl Iterator<Item = BotMove>) -> Option<BotMove> {
        let mut best: Option<(u32, BotMove)> = None;
        for candidate in candidates {
            let distance = goal_distance(corner, candidate.to);
            if best.is_none_or(|(min, _)| distance < min) {
                best = Some((distance, candidate));
            }
        }
        best.map(|(_, m)| m)
    }
}

impl BotStrategy for EasyBot {
    fn best_move(
        &mut self,
        corner: Corner,
        pawns: &[Position],
        legal: &dyn Fn(Position) -> Vec<Position>,
    ) -> Option<BotMove> {
        let candidates = pawns
            .iter()
            .flat_map(|&from| legal(from).into_iter().map(move |to| BotMove { from, to }));
        self.last_move = Self::closest(corner, candidates);
        self.last_move
    }

    fn best_continuation(&mut self, corner: Corner, options: &[Position]) -> Option<BotMove> {
        let from = self.last_move?.to;
        let candidates = options.iter().map(|&to| BotMove { from, to });
        self.last_move = Self::closest(corner, candidates);
        self.last_move
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_of_equal_candidates_wins() {
        let mut bot = EasyBot::default();
        let from = Position::new(1, 5);
        let choice = bot.best_move(Corner(0), &[from], &|_| {
            vec![Position::new(0, 5), Position::new(1, 4)]
        });
        assert_eq!(
            choice,
            Some(BotMove {
                from,
                to: Position::new(0, 5),
            })
        );
        assert_eq!(goal_distance(Corner(0), Position::new(1, 4)), 1);
    }

    #[test]
    fn picks_the_pawn_that_gets_closest() {
        let mut bot = EasyBot::default();
        let far = Position::new(12, 12);
        let near = Position::new(6, 6);
        let choice = bot
            .best_move(Corner(0), &[far, near], &|p| vec![p.offset(-1, 0)])
            .unwrap();
        assert_eq!(choice.from, near);
    }

    #[test]
    fn no_legal_move_passes() {
        let mut bot = EasyBot::default();
        assert_eq!(
            bot.best_move(Corner(2), &[Position::new(8, 8)], &|_| Vec::new()),
            None
        );
        assert_eq!(bot.best_continuation(Corner(2), &[Position::new(8, 9)]), None);
    }

    #[test]
    fn continuation_starts_where_the_last_move_ended() {
        let mut bot = EasyBot::default();
        bot.best_move(Corner(3), &[Position::new(8, 8)], &|_| {
            vec![Position::new(10, 8)]
        });
        let next = bot
            .best_continuation(Corner(3), &[Position::new(10, 10), Position::new(12, 10)])
            .unwrap();
        assert_eq!(next.from, Position::new(10, 8));
        assert_eq!(next.to, Position::new(12, 10));
    }
}
