use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Board, Move, Outcome, Score, Side, ValidMove};
use crate::error::{Error, Result};

/// Snapshot of a game: the board, the last claimed cell, whose turn it is
/// and both running scores.
///
/// States have value semantics. `apply` returns a successor and never
/// touches `self`, so search branches can share nothing.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameState {
    board: Board,
    last_move: Option<Move>,
    to_act: Side,
    scores: [Score; 2],
}

impl GameState {
    /// Opening position: `Side::First` to move, nothing claimed.
    pub fn new(board: Board) -> Self {
        GameState {
            board,
            last_move: None,
            to_act: Side::First,
            scores: [0, 0],
        }
    }

    /// Rebuilds a mid-game position, e.g. from an external game loop.
    /// `last_move` must point at a cell that is already taken.
    pub fn from_parts(
        board: Board,
        last_move: Option<Move>,
        to_act: Side,
        scores: [Score; 2],
    ) -> Result<Self> {
        if let Some(mv) = last_move {
            if !board.contains(mv.row, mv.col) || board.is_available(mv.row, mv.col) {
                return Err(Error::IllegalMove { mv });
            }
        }
        Ok(GameState {
            board,
            last_move,
            to_act,
            scores,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn last_move(&self) -> Option<Move> {
        self.last_move
    }

    pub fn to_act(&self) -> Side {
        self.to_act
    }

    pub fn scores(&self) -> [Score; 2] {
        self.scores
    }

    pub fn score(&self, side: Side) -> Score {
        self.scores[side.index()]
    }

    /// `side`'s score minus the other side's.
    pub fn differential(&self, side: Side) -> Score {
        self.score(side) - self.score(side.flip())
    }

    /// Claimed plus unclaimed value; constant over a game.
    pub fn total_value(&self) -> u64 {
        let claimed: Score = self.scores.iter().sum();
        claimed.max(0) as u64 + self.board.remaining_value()
    }

    pub fn cell_value(&self, mv: Move) -> u32 {
        self.board.get(mv.row, mv.col)
    }

    /// Writes the legal moves into `moves`, clearing it first. The row of the
    /// last move is listed left to right, then its column top to bottom.
    pub fn legal_moves_into(&self, moves: &mut Vec<Move>) {
        moves.clear();
        let side = self.board.side();
        match self.last_move {
            None => {
                for r in 0..side {
                    for c in 0..side {
                        if self.board.is_available(r, c) {
                            moves.push(Move::new(r, c));
                        }
                    }
                }
            }
            Some(last) => {
                for c in 0..side {
                    if self.board.is_available(last.row, c) {
                        moves.push(Move::new(last.row, c));
                    }
                }
                for r in 0..side {
                    if r != last.row && self.board.is_available(r, last.col) {
                        moves.push(Move::new(r, last.col));
                    }
                }
            }
        }
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        let mut moves = Vec::new();
        self.legal_moves_into(&mut moves);
        moves
    }

    pub fn is_legal(&self, mv: Move) -> bool {
        if !self.board.contains(mv.row, mv.col) || !self.board.is_available(mv.row, mv.col) {
            return false;
        }
        match self.last_move {
            None => true,
            Some(last) => last.shares_line(&mv),
        }
    }

    pub fn is_terminal(&self) -> bool {
        let side = self.board.side();
        match self.last_move {
            None => self.board.remaining_cells() == 0,
            Some(last) => {
                !(0..side).any(|c| self.board.is_available(last.row, c))
                    && !(0..side).any(|r| self.board.is_available(r, last.col))
            }
        }
    }

    /// Every legal move paired with a copy of this state.
    pub fn possible_moves(&self) -> Vec<ValidMove> {
        self.legal_moves()
            .into_iter()
            .map(|mv| ValidMove {
                valid_move: mv,
                valid_for: self.clone(),
            })
            .collect()
    }

    pub fn verify_move(&self, mv: Move) -> Option<ValidMove> {
        if !self.is_legal(mv) {
            return None;
        }
        Some(ValidMove {
            valid_move: mv,
            valid_for: self.clone(),
        })
    }

    /// Successor state after the side to act claims `mv`.
    pub fn apply(&self, mv: Move) -> Result<GameState> {
        self.verify_move(mv)
            .map(ValidMove::apply)
            .ok_or(Error::IllegalMove { mv })
    }

    /// In-place application for callers that own a scratch copy. The move
    /// must be legal.
    pub(crate) fn apply_mut(&mut self, mv: Move) {
        debug_assert!(self.is_legal(mv), "applying illegal move {}", mv);
        let value = self.board.take(mv.row, mv.col);
        self.scores[self.to_act.index()] += Score::from(value);
        self.last_move = Some(mv);
        self.to_act = self.to_act.flip();
    }

    /// Result by score, or `None` while moves remain.
    pub fn outcome(&self) -> Option<Outcome> {
        if !self.is_terminal() {
            return None;
        }
        Some(self.leader())
    }

    /// Who is ahead right now.
    pub fn leader(&self) -> Outcome {
        match self.differential(Side::First) {
            d if d > 0 => Outcome::Win(Side::First),
            d if d < 0 => Outcome::Win(Side::Second),
            _ => Outcome::Tie,
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Acting: {}, Scores: {} - {}",
            self.to_act, self.scores[0], self.scores[1]
        )?;
        if let Some(last) = self.last_move {
            write!(f, ", Last: {}", last)?;
        }
        writeln!(f)?;
        writeln!(f, "{}", self.board)
    }
}
