//! Depth-limited minimax with alpha-beta pruning.
//!
//! The depth for a decision is fixed before the search starts, from a node
//! budget and the estimated branching factor of the board. Small boards are
//! searched to the end of the game.

use std::f64::{INFINITY, NEG_INFINITY};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::evaluator::{evaluate, terminal_value};
use super::greedy::best_immediate;
use super::Strategy;
use crate::error::{Error, Result};
use crate::game::{GameState, Move, Side};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlphaBetaParams {
    /// Upper bound on `b^depth` for budget-derived depths.
    pub node_budget: u64,
    /// Never search deeper than this, except on exhaustively searched boards.
    pub depth_cap: usize,
    /// Boards with a side up to this are searched to the end of the game.
    pub exhaustive_max_side: usize,
    /// Disable to run a plain minimax with the same ordering.
    pub pruning: bool,
    /// Score root moves concurrently.
    pub parallel: bool,
}

impl Default for AlphaBetaParams {
    fn default() -> Self {
        AlphaBetaParams {
            node_budget: 60_000,
            depth_cap: 12,
            exhaustive_max_side: 4,
            pruning: true,
            parallel: false,
        }
    }
}

/// What the last decision cost.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub depth: usize,
    pub nodes: u64,
    pub fell_back: bool,
}

/// Search tree node. Children are generated on first visit, ordered by the
/// value of the cell each one claims, and kept until the decision returns.
#[derive(Debug, Clone)]
pub struct AlphaBetaNode {
    state: GameState,
    mv: Option<Move>,
    children: Option<Vec<AlphaBetaNode>>,
}

impl AlphaBetaNode {
    pub fn new(state: GameState) -> Self {
        AlphaBetaNode {
            state,
            mv: None,
            children: None,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Move that led here from the parent.
    pub fn mv(&self) -> Option<Move> {
        self.mv
    }

    pub fn is_expanded(&self) -> bool {
        self.children.is_some()
    }

    pub fn children(&mut self) -> &mut Vec<AlphaBetaNode> {
        let state = &self.state;
        self.children.get_or_insert_with(|| {
            let mut moves = state.possible_moves();
            // Stable: equal values keep legal-move order.
            moves.sort_by(|a, b| b.value().cmp(&a.value()));
            moves
                .into_iter()
                .map(|valid| {
                    let mv = *valid.valid_move();
                    AlphaBetaNode {
                        state: valid.apply(),
                        mv: Some(mv),
                        children: None,
                    }
                })
                .collect()
        })
    }
}

struct Search {
    root: Side,
    pruning: bool,
    nodes: u64,
}

impl Search {
    fn new(root: Side, pruning: bool) -> Self {
        Search {
            root,
            pruning,
            nodes: 0,
        }
    }

    fn alpha_beta(&mut self, node: &mut AlphaBetaNode, depth: usize, mut alpha: f64, mut beta: f64) -> f64 {
        self.nodes += 1;

        if node.state.is_terminal() {
            return terminal_value(&node.state, self.root);
        }
        if depth == 0 {
            return evaluate(&node.state, self.root);
        }

        let maximizing = node.state.to_act() == self.root;
        let children = node.children();
        if maximizing {
            let mut value = NEG_INFINITY;
            for child in children.iter_mut() {
                value = value.max(self.alpha_beta(child, depth - 1, alpha, beta));
                alpha = alpha.max(value);
                if self.pruning && alpha >= beta {
                    break;
                }
            }
            value
        } else {
            let mut value = INFINITY;
            for child in children.iter_mut() {
                value = value.min(self.alpha_beta(child, depth - 1, alpha, beta));
                beta = beta.min(value);
                if self.pruning && alpha >= beta {
                    break;
                }
            }
            value
        }
    }
}

/// First root move whose value is strictly greater than everything before
/// it. Moves whose value is not a number are skipped.
pub fn select_root(scored: &[(Move, f64)]) -> Option<Move> {
    let mut best: Option<(Move, f64)> = None;
    for &(mv, value) in scored {
        if value.is_nan() {
            continue;
        }
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((mv, value)),
        }
    }
    best.map(|(mv, _)| mv)
}

/// Effective branching factor assumed for a board of the given side.
pub fn branching_factor(side: usize) -> u64 {
    ((2 * side).saturating_sub(1) as u64).max(2)
}

pub struct AlphaBeta {
    params: AlphaBetaParams,
    last_stats: SearchStats,
    fallbacks: u64,
}

impl AlphaBeta {
    pub fn create(params: AlphaBetaParams) -> Self {
        AlphaBeta {
            params,
            last_stats: SearchStats::default(),
            fallbacks: 0,
        }
    }

    pub fn params(&self) -> &AlphaBetaParams {
        &self.params
    }

    pub fn last_stats(&self) -> SearchStats {
        self.last_stats
    }

    /// How many decisions had to fall back to the greedy move.
    pub fn fallback_count(&self) -> u64 {
        self.fallbacks
    }

    /// Depth used for `state`: the largest `d` with `b^d <= node_budget`,
    /// limited by the cap and the remaining cells, and at least one ply.
    /// Small boards get the remaining cell count instead.
    pub fn search_depth(&self, state: &GameState) -> usize {
        let side = state.board().side();
        let remaining = state.board().remaining_cells();
        if side <= self.params.exhaustive_max_side {
            return remaining.max(1);
        }

        let b = branching_factor(side);
        let mut depth = 0;
        let mut nodes: u64 = 1;
        while depth < self.params.depth_cap {
            match nodes.checked_mul(b) {
                Some(next) if next <= self.params.node_budget => {
                    nodes = next;
                    depth += 1;
                }
                _ => break,
            }
        }
        depth.min(remaining).max(1)
    }

    /// Minimax value of `state` for `root`, searched `depth` plies deep.
    pub fn evaluate_position(&self, state: &GameState, depth: usize, root: Side) -> f64 {
        let mut node = AlphaBetaNode::new(state.clone());
        Search::new(root, self.params.pruning).alpha_beta(&mut node, depth, NEG_INFINITY, INFINITY)
    }

    /// Searches `depth` plies (the root ply included) and returns the best
    /// root move.
    pub fn decide_at_depth(&mut self, state: &GameState, depth: usize) -> Result<Move> {
        if state.is_terminal() {
            return Err(Error::NoLegalMoves);
        }
        let depth = depth.max(1);
        let root_side = state.to_act();
        let mut root = AlphaBetaNode::new(state.clone());

        let (scored, nodes) = if self.params.parallel {
            self.score_root_parallel(&mut root, depth, root_side)
        } else {
            self.score_root(&mut root, depth, root_side)
        };

        let (mv, fell_back) = match select_root(&scored) {
            Some(mv) => (mv, false),
            None => {
                self.fallbacks += 1;
                let mv = best_immediate(state).ok_or(Error::NoLegalMoves)?;
                warn!(
                    fallbacks = self.fallbacks,
                    %mv,
                    "minimax produced no usable root value, falling back to greedy"
                );
                (mv, true)
            }
        };

        self.last_stats = SearchStats {
            depth,
            nodes,
            fell_back,
        };
        debug!(depth, nodes, %mv, "minimax decision");
        Ok(mv)
    }

    /// Sequential root loop. The running best is passed down as alpha, which
    /// only ever turns worse moves into upper bounds.
    fn score_root(&self, root: &mut AlphaBetaNode, depth: usize, root_side: Side) -> (Vec<(Move, f64)>, u64) {
        let mut search = Search::new(root_side, self.params.pruning);
        search.nodes += 1;
        let mut best = NEG_INFINITY;
        let mut scored = Vec::new();
        for child in root.children().iter_mut() {
            let alpha = if self.params.pruning { best } else { NEG_INFINITY };
            let value = search.alpha_beta(child, depth - 1, alpha, INFINITY);
            trace!(mv = ?child.mv, value, "root move scored");
            if value > best {
                best = value;
            }
            if let Some(mv) = child.mv {
                scored.push((mv, value));
            }
        }
        (scored, search.nodes)
    }

    /// Every root child gets a full window, so each value is exact and the
    /// pick matches the sequential loop.
    fn score_root_parallel(&self, root: &mut AlphaBetaNode, depth: usize, root_side: Side) -> (Vec<(Move, f64)>, u64) {
        let pruning = self.params.pruning;
        let results: Vec<(Option<Move>, f64, u64)> = root
            .children()
            .par_iter_mut()
            .map(|child| {
                let mut search = Search::new(root_side, pruning);
                let value = search.alpha_beta(child, depth - 1, NEG_INFINITY, INFINITY);
                (child.mv, value, search.nodes)
            })
            .collect();

        let nodes = 1 + results.iter().map(|r| r.2).sum::<u64>();
        let scored = results
            .into_iter()
            .filter_map(|(mv, value, _)| mv.map(|mv| (mv, value)))
            .collect();
        (scored, nodes)
    }
}

impl Strategy for AlphaBeta {
    fn choose_action(&mut self, state: &GameState) -> Result<Move> {
        let depth = self.search_depth(state);
        self.decide_at_depth(state, depth)
    }

    fn name(&self) -> &'static str {
        "Minimax"
    }
}
