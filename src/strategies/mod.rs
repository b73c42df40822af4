use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Result;
use crate::game::{GameState, Move};

pub mod alphabeta;
pub mod evaluator;
pub mod greedy;
pub mod mcts;
pub mod random;
pub mod safe_choice;

pub use self::alphabeta::{AlphaBeta, AlphaBetaParams, SearchStats};
pub use self::greedy::GreedyStrategy;
pub use self::mcts::{Mcts, MctsParams, MctsReport};
pub use self::random::RandomStrategy;
pub use self::safe_choice::{SafeChoiceParams, SafeChoiceStrategy};

/// A move picker. Given a position with at least one legal move it returns
/// one of them; on a terminal position it fails with `Error::NoLegalMoves`.
///
/// Implementations work on private copies and never mutate `state`.
pub trait Strategy {
    fn choose_action(&mut self, state: &GameState) -> Result<Move>;

    fn name(&self) -> &'static str;
}

impl<S: Strategy + ?Sized> Strategy for Box<S> {
    fn choose_action(&mut self, state: &GameState) -> Result<Move> {
        (**self).choose_action(state)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Every strategy the crate can build by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    Random,
    Greedy,
    SafeChoice,
    Mcts,
    Minimax,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::Random,
        StrategyKind::Greedy,
        StrategyKind::SafeChoice,
        StrategyKind::Mcts,
        StrategyKind::Minimax,
    ];

    /// Builds a fresh instance. `seed` overrides any seed in `config` so
    /// batch runs can hand every instance its own reproducible stream.
    pub fn build(self, config: &Config, seed: Option<u64>) -> Box<dyn Strategy + Send> {
        match self {
            StrategyKind::Random => Box::new(RandomStrategy::create(seed)),
            StrategyKind::Greedy => Box::new(GreedyStrategy::create(())),
            StrategyKind::SafeChoice => Box::new(SafeChoiceStrategy::create(config.safe_choice.clone())),
            StrategyKind::Mcts => {
                let mut params = config.mcts.clone();
                if seed.is_some() {
                    params.seed = seed;
                }
                Box::new(Mcts::create(params))
            }
            StrategyKind::Minimax => Box::new(AlphaBeta::create(config.alphabeta.clone())),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match *self {
                StrategyKind::Random => "Random",
                StrategyKind::Greedy => "Greedy",
                StrategyKind::SafeChoice => "SafeChoice",
                StrategyKind::Mcts => "MCTS",
                StrategyKind::Minimax => "Minimax",
            }
        )
    }
}
