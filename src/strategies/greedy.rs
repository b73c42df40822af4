use super::Strategy;
use crate::error::{Error, Result};
use crate::game::{GameState, Move};

/// Legal move with the highest cell value; the first one in legal-move order
/// wins ties.
pub fn best_immediate(state: &GameState) -> Option<Move> {
    let mut best: Option<(Move, u32)> = None;
    for mv in state.legal_moves() {
        let value = state.cell_value(mv);
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((mv, value)),
        }
    }
    best.map(|(mv, _)| mv)
}

/// Always claims the biggest number in reach.
pub struct GreedyStrategy;

impl GreedyStrategy {
    pub fn create(_params: ()) -> Self {
        GreedyStrategy
    }
}

impl Strategy for GreedyStrategy {
    fn choose_action(&mut self, state: &GameState) -> Result<Move> {
        best_immediate(state).ok_or(Error::NoLegalMoves)
    }

    fn name(&self) -> &'static str {
        "Greedy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Board;

    #[test]
    fn picks_largest_reachable_value() {
        let state = GameState::new(Board::parse("1,2,3\n4,5,6\n7,8,9").unwrap());
        assert_eq!(best_immediate(&state), Some(Move::new(2, 2)));

        let state = state.apply(Move::new(0, 0)).unwrap();
        assert_eq!(best_immediate(&state), Some(Move::new(2, 0)));
    }

    #[test]
    fn ties_go_to_first_legal_move() {
        let state = GameState::new(Board::parse("4,1\n4,4").unwrap());
        assert_eq!(best_immediate(&state), Some(Move::new(0, 0)));
    }
}
