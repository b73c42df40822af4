//! Static evaluation of non-terminal positions for the minimax search.

use crate::game::{GameState, Side};

/// Weight of the legal-move-count term.
pub const MOBILITY_WEIGHT: f64 = 0.25;
/// Weight of the value still claimable around the last move.
pub const POTENTIAL_WEIGHT: f64 = 0.05;

/// Heuristic value of `state` for `root`. Positive favours `root`.
///
/// `eval = diff + MOBILITY_WEIGHT * (mine - theirs) + POTENTIAL_WEIGHT * potential`
///
/// Only the side to act has a known move count; the other side's count is
/// taken as zero. `potential` sums the unclaimed values in the row and the
/// column of the last move.
pub fn evaluate(state: &GameState, root: Side) -> f64 {
    let score_diff = state.differential(root) as f64;

    let mobility = state.legal_moves().len() as f64;
    let (mine, theirs) = if state.to_act() == root {
        (mobility, 0.0)
    } else {
        (0.0, mobility)
    };

    score_diff + MOBILITY_WEIGHT * (mine - theirs) + POTENTIAL_WEIGHT * row_col_potential(state)
}

/// Exact payoff of a finished game for `root`.
pub fn terminal_value(state: &GameState, root: Side) -> f64 {
    state.differential(root) as f64
}

/// Unclaimed value in the row plus the column of the last move.
pub fn row_col_potential(state: &GameState) -> f64 {
    match state.last_move() {
        None => 0.0,
        Some(last) => {
            let board = state.board();
            let row: u64 = board.row(last.row).iter().map(|&v| u64::from(v)).sum();
            let col: u64 = board.column(last.col).map(u64::from).sum();
            (row + col) as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Board, Move};

    fn opening() -> GameState {
        GameState::new(Board::parse("1,2,3\n4,5,6\n7,8,9").unwrap())
    }

    #[test]
    fn opening_position_counts_only_mobility() {
        let state = opening();
        assert!((evaluate(&state, Side::First) - 9.0 * MOBILITY_WEIGHT).abs() < 1e-9);
        assert!((evaluate(&state, Side::Second) + 9.0 * MOBILITY_WEIGHT).abs() < 1e-9);
    }

    #[test]
    fn combines_all_terms() {
        // P1 takes 5: P2 to act with 4 moves, row 1 leaves 4+6, column 1 leaves 2+8.
        let state = opening().apply(Move::new(1, 1)).unwrap();
        let expected = 5.0 - MOBILITY_WEIGHT * 4.0 + POTENTIAL_WEIGHT * 20.0;
        assert!((evaluate(&state, Side::First) - expected).abs() < 1e-9);
        assert!((row_col_potential(&state) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn is_a_pure_function_of_state() {
        let state = opening()
            .apply(Move::new(0, 2))
            .and_then(|s| s.apply(Move::new(2, 2)))
            .unwrap();
        let a = evaluate(&state, Side::Second);
        let b = evaluate(&state.clone(), Side::Second);
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn terminal_value_is_exact_differential() {
        let board = Board::parse("0,0\n0,0").unwrap();
        let state =
            GameState::from_parts(board, Some(Move::new(1, 1)), Side::First, [7, 3]).unwrap();
        assert_eq!(terminal_value(&state, Side::First), 4.0);
        assert_eq!(terminal_value(&state, Side::Second), -4.0);
    }
}
