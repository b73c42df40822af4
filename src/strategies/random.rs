use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::Strategy;
use crate::error::{Error, Result};
use crate::game::{GameState, Move};

/// Uniform choice among the legal moves.
pub struct RandomStrategy {
    rng: ChaCha8Rng,
}

impl RandomStrategy {
    pub fn create(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        RandomStrategy { rng }
    }
}

impl Strategy for RandomStrategy {
    fn choose_action(&mut self, state: &GameState) -> Result<Move> {
        state
            .legal_moves()
            .choose(&mut self.rng)
            .copied()
            .ok_or(Error::NoLegalMoves)
    }

    fn name(&self) -> &'static str {
        "Random"
    }
}
