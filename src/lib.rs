//! Row–column number-claiming game with search-based players.
//!
//! Two players alternately claim cells of a square matrix of non-negative
//! integers. After the first move each claim must share the row or the
//! column of the previous one. The game ends when the player to move has
//! nothing left to claim, and the larger sum wins.

pub mod config;
pub mod error;
pub mod game;
pub mod runner;
pub mod simulation;
pub mod strategies;

pub use config::{load_config, Config};
pub use error::{Error, Result};
pub use game::{Board, GameState, Move, Outcome, Score, Side};
pub use runner::{AiPlayer, GameRecord, HumanPlayer, Player, Runner};
pub use simulation::{summarize, MatchupReport, SimulationParams, StrategySummary, Tournament};
pub use strategies::{Strategy, StrategyKind};
