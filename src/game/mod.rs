use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod board;
pub mod state;

pub use self::board::Board;
pub use self::state::GameState;

pub type Score = i64;

/// One of the two seats at the table. `First` always opens the game.
#[derive(Clone, Copy, PartialOrd, PartialEq, Hash, Debug, Ord, Eq, Serialize, Deserialize)]
pub enum Side {
    First,
    Second,
}

impl Side {
    pub fn flip(self) -> Side {
        match self {
            Side::First => Side::Second,
            Side::Second => Side::First,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Side::First => 0,
            Side::Second => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match *self {
                Side::First => "P1",
                Side::Second => "P2",
            }
        )
    }
}

/// A cell coordinate, zero-based.
#[derive(Clone, Copy, PartialOrd, PartialEq, Hash, Debug, Ord, Eq, Serialize, Deserialize)]
pub struct Move {
    pub row: usize,
    pub col: usize,
}

impl Move {
    pub fn new(row: usize, col: usize) -> Self {
        Move { row, col }
    }

    /// True when `other` lies in this move's row or column.
    pub fn shares_line(&self, other: &Move) -> bool {
        self.row == other.row || self.col == other.col
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Parses `"row col"`, `"row,col"` or `"(row, col)"`.
impl FromStr for Move {
    type Err = ();

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut parts = input
            .split(|c: char| c == ',' || c == '(' || c == ')' || c.is_whitespace())
            .filter(|p| !p.is_empty())
            .map(usize::from_str);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(Ok(row)), Some(Ok(col)), None) => Ok(Move::new(row, col)),
            _ => Err(()),
        }
    }
}

/// A move that has been checked against the state it was generated from.
/// Applying it consumes the snapshot and yields the successor state.
#[derive(Hash, Clone, Debug)]
pub struct ValidMove {
    valid_move: Move,
    valid_for: GameState,
}

impl ValidMove {
    pub fn valid_move(&self) -> &Move {
        &self.valid_move
    }

    /// Value of the cell this move claims.
    pub fn value(&self) -> u32 {
        self.valid_for.board().get(self.valid_move.row, self.valid_move.col)
    }

    pub fn apply(mut self) -> GameState {
        self.valid_for.apply_mut(self.valid_move);
        self.valid_for
    }
}

/// Final result of a game, decided by the accumulated scores.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Outcome {
    Win(Side),
    Tie,
}

impl Outcome {
    pub fn winner(&self) -> Option<Side> {
        match *self {
            Outcome::Win(side) => Some(side),
            Outcome::Tie => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Outcome::Win(side) => write!(f, "{} wins", side),
            Outcome::Tie => write!(f, "tie"),
        }
    }
}
