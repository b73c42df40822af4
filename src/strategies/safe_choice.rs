//! One-ply scorer that weighs a cell's value against the best reply it
//! opens up for the opponent.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::Strategy;
use crate::error::{Error, Result};
use crate::game::{Board, GameState, Move};

/// Weights of the composite score
/// `alpha * value - beta * opp_best + gamma * ones + delta * a + epsilon * b`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafeChoiceParams {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub delta: f64,
    pub epsilon: f64,
}

impl Default for SafeChoiceParams {
    fn default() -> Self {
        SafeChoiceParams {
            alpha: 1.0,
            beta: 1.0,
            gamma: 0.15,
            delta: 0.05,
            epsilon: 0.05,
        }
    }
}

/// Largest value, its count, second largest value, its count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct TopTwo {
    top1: Option<u32>,
    cnt1: usize,
    top2: Option<u32>,
    cnt2: usize,
}

impl TopTwo {
    fn of<I: Iterator<Item = u32>>(values: I) -> Self {
        let mut summary = TopTwo::default();
        for v in values.filter(|&v| v != 0) {
            match summary.top1 {
                None => {
                    summary.top1 = Some(v);
                    summary.cnt1 = 1;
                }
                Some(t1) if v == t1 => summary.cnt1 += 1,
                Some(t1) if v > t1 => {
                    summary.top2 = summary.top1;
                    summary.cnt2 = summary.cnt1;
                    summary.top1 = Some(v);
                    summary.cnt1 = 1;
                }
                Some(_) => match summary.top2 {
                    Some(t2) if v == t2 => summary.cnt2 += 1,
                    Some(t2) if v < t2 => {}
                    _ => {
                        summary.top2 = Some(v);
                        summary.cnt2 = 1;
                    }
                },
            }
        }
        summary
    }

    /// +1 when the line's top value would be held by an even number of
    /// cells once the cell worth `value` is gone, -1 otherwise.
    fn parity_without(&self, value: u32) -> i32 {
        let top1 = match self.top1 {
            None => return 1,
            Some(t) => t,
        };
        let remaining = if value == top1 {
            if self.cnt1 > 1 {
                self.cnt1 - 1
            } else {
                self.cnt2
            }
        } else {
            self.cnt1
        };
        if remaining % 2 == 0 {
            1
        } else {
            -1
        }
    }
}

/// Best value the opponent could claim right after `mv`.
fn opponent_best_after(board: &Board, mv: Move) -> u32 {
    let side = board.side();
    let row_best = (0..side)
        .filter(|&c| c != mv.col)
        .map(|c| board.get(mv.row, c));
    let col_best = (0..side)
        .filter(|&r| r != mv.row)
        .map(|r| board.get(r, mv.col));
    row_best.chain(col_best).max().unwrap_or(0)
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    mv: Move,
    composite: f64,
    ones: i32,
    a: i32,
    b: i32,
}

impl Candidate {
    /// Composite score, then parity richness, then `a`, then `b`, then the
    /// top-left-most cell.
    fn cmp_key(&self, other: &Candidate) -> Ordering {
        self.composite
            .total_cmp(&other.composite)
            .then(self.ones.cmp(&other.ones))
            .then(self.a.cmp(&other.a))
            .then(self.b.cmp(&other.b))
            .then(other.mv.row.cmp(&self.mv.row))
            .then(other.mv.col.cmp(&self.mv.col))
    }
}

pub struct SafeChoiceStrategy {
    params: SafeChoiceParams,
}

impl SafeChoiceStrategy {
    pub fn create(params: SafeChoiceParams) -> Self {
        SafeChoiceStrategy { params }
    }

    fn score(&self, board: &Board, mv: Move) -> Candidate {
        let value = board.get(mv.row, mv.col);
        let a = TopTwo::of(board.row(mv.row).iter().copied()).parity_without(value);
        let b = TopTwo::of(board.column(mv.col)).parity_without(value);
        let ones = i32::from(a == 1) + i32::from(b == 1);
        let opp_best = opponent_best_after(board, mv);

        let p = &self.params;
        let composite = p.alpha * f64::from(value) - p.beta * f64::from(opp_best)
            + p.gamma * f64::from(ones)
            + p.delta * f64::from(a)
            + p.epsilon * f64::from(b);
        Candidate {
            mv,
            composite,
            ones,
            a,
            b,
        }
    }
}

impl Strategy for SafeChoiceStrategy {
    fn choose_action(&mut self, state: &GameState) -> Result<Move> {
        let board = state.board();
        state
            .legal_moves()
            .into_iter()
            .map(|mv| self.score(board, mv))
            .max_by(|x, y| x.cmp_key(y))
            .map(|c| c.mv)
            .ok_or(Error::NoLegalMoves)
    }

    fn name(&self) -> &'static str {
        "SafeChoice"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_two_counts_multiplicities() {
        let s = TopTwo::of([3, 9, 0, 9, 3, 1].into_iter());
        assert_eq!(s.top1, Some(9));
        assert_eq!(s.cnt1, 2);
        assert_eq!(s.top2, Some(3));
        assert_eq!(s.cnt2, 2);
        assert_eq!(TopTwo::of([0, 0].into_iter()).top1, None);
    }

    #[test]
    fn parity_of_top_value_after_removal() {
        let s = TopTwo::of([9, 9, 4].into_iter());
        // Taking one 9 leaves a single 9: odd.
        assert_eq!(s.parity_without(9), -1);
        // Taking the 4 leaves two 9s: even.
        assert_eq!(s.parity_without(4), 1);

        let lone = TopTwo::of([9, 4, 4].into_iter());
        // The lone 9 goes, the two 4s become the top.
        assert_eq!(lone.parity_without(9), 1);
        assert_eq!(TopTwo::default().parity_without(5), 1);
    }

    #[test]
    fn avoids_handing_over_a_big_reply() {
        // Taking the 9 opens the 5 beneath it; the 8 keeps the reply to 1.
        let board = Board::parse("9,1,1\n5,1,1\n1,1,8").unwrap();
        let state = GameState::new(board);
        let mut strategy = SafeChoiceStrategy::create(SafeChoiceParams::default());
        assert_eq!(strategy.choose_action(&state).unwrap(), Move::new(2, 2));
    }

    #[test]
    fn exact_ties_prefer_top_left() {
        let state = GameState::new(Board::parse("1,1\n1,1").unwrap());
        let mut strategy = SafeChoiceStrategy::create(SafeChoiceParams::default());
        assert_eq!(strategy.choose_action(&state).unwrap(), Move::new(0, 0));
    }
}
