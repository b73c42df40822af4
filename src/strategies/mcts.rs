//! Monte Carlo Tree Search with UCB1 selection.
//!
//! Each iteration runs the four classic phases:
//!
//! 1. **Selection**: descend from the root through fully expanded nodes,
//!    always into the child with the highest UCB1 score
//! 2. **Expansion**: add one untried move of the reached node as a new child
//! 3. **Simulation**: play the child's position out with an epsilon-greedy
//!    rollout and score it as the root side's normalised score differential
//! 4. **Backpropagation**: walk back to the root adding the outcome, signed
//!    for the side that moved into each node
//!
//! The search stops at `max_iterations` or `max_seconds`, whichever comes
//! first, and plays the most visited root child.

use std::f64::consts::SQRT_2;
use std::f64::INFINITY;
use std::time::{Duration, Instant};

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::Strategy;
use crate::error::{Error, Result};
use crate::game::{GameState, Move, Side};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MctsParams {
    pub max_iterations: u64,
    /// Wall-clock limit per decision.
    pub max_seconds: f64,
    /// UCB1 exploration constant `c`.
    pub exploration: f64,
    /// Probability of a uniformly random rollout step; otherwise greedy.
    pub epsilon: f64,
    /// Fixed seed for reproducible searches. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for MctsParams {
    fn default() -> Self {
        MctsParams {
            max_iterations: 100_000,
            max_seconds: 5.0,
            exploration: SQRT_2,
            epsilon: 0.5,
            seed: None,
        }
    }
}

impl MctsParams {
    /// Wall-clock budget; limits too large for a `Duration` saturate.
    pub fn time_limit(&self) -> Duration {
        Duration::try_from_secs_f64(self.max_seconds.max(0.0)).unwrap_or(Duration::MAX)
    }
}

/// Summary of the last search.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MctsReport {
    pub iterations: u64,
    pub elapsed: Duration,
    pub root_visits: u32,
    pub tree_size: usize,
}

/// Index into the node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

#[derive(Debug, Clone)]
pub struct MctsNode {
    state: GameState,
    mv: Option<Move>,
    /// Navigation only; the arena owns every node.
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Moves not expanded yet. Sorted by cell value, popped from the back.
    untried: Vec<Move>,
    visits: u32,
    value_sum: f64,
}

impl MctsNode {
    fn new<R: Rng>(state: GameState, mv: Option<Move>, parent: Option<NodeId>, rng: &mut R) -> Self {
        let mut untried = state.legal_moves();
        // Shuffle first so equal values are tried in a seeded random order.
        untried.shuffle(rng);
        untried.sort_by_key(|&m| state.cell_value(m));
        MctsNode {
            state,
            mv,
            parent,
            children: Vec::new(),
            untried,
            visits: 0,
            value_sum: 0.0,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn mv(&self) -> Option<Move> {
        self.mv
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn visits(&self) -> u32 {
        self.visits
    }

    /// Average outcome from the view of the side that moved into this node.
    pub fn mean_value(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.value_sum / f64::from(self.visits)
        }
    }

    pub fn is_fully_expanded(&self) -> bool {
        self.untried.is_empty()
    }

    pub fn is_terminal(&self) -> bool {
        self.untried.is_empty() && self.children.is_empty()
    }

    /// The side whose results this node accumulates.
    fn mover(&self) -> Side {
        self.state.to_act().flip()
    }
}

/// `mean + c * sqrt(ln(parent_visits) / child_visits)`; unvisited children
/// score infinity.
pub fn ucb1(mean: f64, child_visits: u32, parent_visits: u32, c: f64) -> f64 {
    if child_visits == 0 {
        return INFINITY;
    }
    mean + c * (f64::from(parent_visits).ln() / f64::from(child_visits)).sqrt()
}

/// Search tree stored in a flat arena; the root is always the first node.
#[derive(Debug)]
pub struct MctsTree {
    nodes: Vec<MctsNode>,
}

impl MctsTree {
    fn new(root: MctsNode) -> Self {
        MctsTree { nodes: vec![root] }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn get(&self, id: NodeId) -> &MctsNode {
        &self.nodes[id.0 as usize]
    }

    fn get_mut(&mut self, id: NodeId) -> &mut MctsNode {
        &mut self.nodes[id.0 as usize]
    }

    /// Node count, root included.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &MctsNode> + '_ {
        self.get(id).children.iter().map(move |&c| self.get(c))
    }

    /// Child with the highest UCB1 score; the first one wins ties.
    fn select_child(&self, id: NodeId, c: f64) -> Option<NodeId> {
        let parent_visits = self.get(id).visits;
        let mut best: Option<(NodeId, f64)> = None;
        for &child_id in &self.get(id).children {
            let child = self.get(child_id);
            let score = ucb1(child.mean_value(), child.visits, parent_visits, c);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((child_id, score)),
            }
            if score == INFINITY {
                break;
            }
        }
        best.map(|(child_id, _)| child_id)
    }

    /// Expands the highest-valued untried move of `id`.
    fn expand<R: Rng>(&mut self, id: NodeId, rng: &mut R) -> Option<NodeId> {
        let node = self.get_mut(id);
        let mv = node.untried.pop()?;
        let mut state = node.state.clone();
        state.apply_mut(mv);

        let child_id = NodeId(self.nodes.len() as u32);
        let child = MctsNode::new(state, Some(mv), Some(id), rng);
        self.nodes.push(child);
        self.get_mut(id).children.push(child_id);
        Some(child_id)
    }

    /// Adds `outcome` (from `root_side`'s view) to every node from `leaf`
    /// up to the root, negated where the other side moved.
    fn backpropagate(&mut self, leaf: NodeId, outcome: f64, root_side: Side) {
        let mut current = Some(leaf);
        while let Some(id) = current {
            let node = self.get_mut(id);
            node.visits += 1;
            node.value_sum += if node.mover() == root_side {
                outcome
            } else {
                -outcome
            };
            current = node.parent;
        }
    }

    /// Most visited root child; the earliest expanded wins ties.
    pub fn best_move(&self) -> Option<(Move, u32)> {
        let mut best: Option<(Move, u32)> = None;
        for child in self.children(self.root()) {
            let mv = match child.mv {
                Some(mv) => mv,
                None => continue,
            };
            match best {
                Some((_, visits)) if child.visits <= visits => {}
                _ => best = Some((mv, child.visits)),
            }
        }
        best
    }
}

/// Plays `state` to the end. Each step is uniformly random with probability
/// `epsilon` and otherwise takes the highest-valued legal cell.
pub fn rollout<R: Rng>(state: &GameState, epsilon: f64, rng: &mut R) -> GameState {
    let mut sim = state.clone();
    let mut moves = Vec::new();
    loop {
        sim.legal_moves_into(&mut moves);
        if moves.is_empty() {
            return sim;
        }
        let mv = if rng.gen::<f64>() < epsilon {
            moves[rng.gen_range(0..moves.len())]
        } else {
            let mut best = moves[0];
            for &mv in &moves[1..] {
                if sim.cell_value(mv) > sim.cell_value(best) {
                    best = mv;
                }
            }
            best
        };
        sim.apply_mut(mv);
    }
}

pub struct Mcts {
    params: MctsParams,
    rng: ChaCha8Rng,
    last_report: MctsReport,
}

impl Mcts {
    pub fn create(params: MctsParams) -> Self {
        let rng = match params.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Mcts {
            params,
            rng,
            last_report: MctsReport::default(),
        }
    }

    pub fn params(&self) -> &MctsParams {
        &self.params
    }

    pub fn last_report(&self) -> MctsReport {
        self.last_report
    }

    /// Builds a fresh tree for `state` and runs iterations until a budget
    /// runs out.
    pub fn search(&mut self, state: &GameState) -> Result<MctsTree> {
        let root_side = state.to_act();
        let total = state.total_value().max(1) as f64;
        let c = self.params.exploration;
        let epsilon = self.params.epsilon;
        let limit = self.params.time_limit();
        let start = Instant::now();

        let mut tree = MctsTree::new(MctsNode::new(state.clone(), None, None, &mut self.rng));
        let root = tree.root();
        let mut iterations: u64 = 0;

        while iterations < self.params.max_iterations && start.elapsed() < limit {
            let mut id = root;
            while tree.get(id).is_fully_expanded() && !tree.get(id).is_terminal() {
                match tree.select_child(id, c) {
                    Some(child) => id = child,
                    None => break,
                }
            }

            if !tree.get(id).is_fully_expanded() {
                if let Some(child) = tree.expand(id, &mut self.rng) {
                    id = child;
                }
            }

            let end = rollout(tree.get(id).state(), epsilon, &mut self.rng);
            let outcome = end.differential(root_side) as f64 / total;
            tree.backpropagate(id, outcome, root_side);
            iterations += 1;
            trace!(iterations, outcome, "mcts iteration");
        }

        let elapsed = start.elapsed();
        self.last_report = MctsReport {
            iterations,
            elapsed,
            root_visits: tree.get(root).visits,
            tree_size: tree.len(),
        };
        if iterations == 0 {
            return Err(Error::SearchBudgetExhausted {
                iterations,
                elapsed_ms: elapsed.as_millis(),
            });
        }
        Ok(tree)
    }
}

impl Strategy for Mcts {
    fn choose_action(&mut self, state: &GameState) -> Result<Move> {
        let moves = state.legal_moves();
        match moves.len() {
            0 => return Err(Error::NoLegalMoves),
            1 => {
                self.last_report = MctsReport::default();
                return Ok(moves[0]);
            }
            _ => {}
        }

        let tree = self.search(state)?;
        let (mv, visits) = tree.best_move().ok_or(Error::NoLegalMoves)?;
        debug!(
            iterations = self.last_report.iterations,
            elapsed_ms = self.last_report.elapsed.as_millis() as u64,
            tree_size = self.last_report.tree_size,
            %mv,
            visits,
            "mcts decision"
        );
        Ok(mv)
    }

    fn name(&self) -> &'static str {
        "MCTS"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Board, Score};

    fn seeded(iterations: u64, seed: u64) -> MctsParams {
        MctsParams {
            max_iterations: iterations,
            max_seconds: 30.0,
            seed: Some(seed),
            ..MctsParams::default()
        }
    }

    fn solve(state: &GameState) -> Score {
        let moves = state.legal_moves();
        if moves.is_empty() {
            return 0;
        }
        moves
            .into_iter()
            .map(|mv| Score::from(state.cell_value(mv)) - solve(&state.apply(mv).unwrap()))
            .max()
            .unwrap()
    }

    #[test]
    fn ucb1_prefers_less_visited_child_at_equal_mean() {
        let parent = 11;
        let rare = ucb1(0.3, 1, parent, SQRT_2);
        let common = ucb1(0.3, 10, parent, SQRT_2);
        assert!(rare > common);
        let expected = 0.3 + SQRT_2 * ((11f64).ln() / 1.0).sqrt();
        assert!((rare - expected).abs() < 1e-12);
        assert_eq!(ucb1(-1.0, 0, parent, SQRT_2), INFINITY);
    }

    #[test]
    fn untried_moves_pop_highest_value_first() {
        let state = GameState::new(Board::parse("1,2,3\n4,5,6\n7,8,9").unwrap());
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut tree = MctsTree::new(MctsNode::new(state, None, None, &mut rng));
        let root = tree.root();
        let first = tree.expand(root, &mut rng).unwrap();
        let second = tree.expand(root, &mut rng).unwrap();
        assert_eq!(tree.get(first).mv(), Some(Move::new(2, 2)));
        assert_eq!(tree.get(second).mv(), Some(Move::new(2, 1)));
        assert_eq!(tree.get(first).parent(), Some(root));
        assert!(!tree.get(root).is_fully_expanded());
    }

    #[test]
    fn backpropagation_alternates_sign() {
        let state = GameState::new(Board::parse("1,2\n3,4").unwrap());
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut tree = MctsTree::new(MctsNode::new(state, None, None, &mut rng));
        let root = tree.root();
        let child = tree.expand(root, &mut rng).unwrap();
        let grandchild = tree.expand(child, &mut rng).unwrap();

        tree.backpropagate(grandchild, 0.5, Side::First);

        // First moved into `child`, Second into `grandchild`.
        assert_eq!(tree.get(child).value_sum, 0.5);
        assert_eq!(tree.get(grandchild).value_sum, -0.5);
        assert_eq!(tree.get(root).value_sum, -0.5);
        for id in [root, child, grandchild] {
            assert_eq!(tree.get(id).visits(), 1);
        }
    }

    #[test]
    fn rollout_reaches_the_end_and_keeps_the_input() {
        let state = GameState::new(Board::parse("1,2,3\n4,5,6\n7,8,9").unwrap());
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for epsilon in [0.0, 0.5, 1.0] {
            let end = rollout(&state, epsilon, &mut rng);
            assert!(end.is_terminal());
            assert_eq!(end.total_value(), state.total_value());
        }
        assert_eq!(state.board().remaining_cells(), 9);
    }

    #[test]
    fn pure_greedy_rollout_is_deterministic() {
        let state = GameState::new(Board::parse("1,2,3\n4,5,6\n7,8,9").unwrap());
        let a = rollout(&state, 0.0, &mut ChaCha8Rng::seed_from_u64(1));
        let b = rollout(&state, 0.0, &mut ChaCha8Rng::seed_from_u64(2));
        assert_eq!(a, b);
        // 9, 8, 7, 4, 6, 5, 2, 3, 1 in turn.
        assert_eq!(a.score(Side::First), 9 + 7 + 6 + 2 + 1);
    }

    #[test]
    fn visits_add_up() {
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let state = GameState::new(Board::random(5, &mut rng));
        let mut mcts = Mcts::create(seeded(2_000, 9));
        let tree = mcts.search(&state).unwrap();
        let report = mcts.last_report();
        assert_eq!(report.iterations, 2_000);
        assert_eq!(report.root_visits, 2_000);
        let child_visits: u32 = tree.children(tree.root()).map(|c| c.visits()).sum();
        assert_eq!(child_visits, 2_000);
        // One expansion per iteration at most.
        assert_eq!(report.tree_size, tree.len());
        assert!(tree.len() > tree.children(tree.root()).count() && tree.len() <= 2_001);
        for child in tree.children(tree.root()) {
            assert!(child.mean_value() >= -1.0 && child.mean_value() <= 1.0);
        }
    }

    #[test]
    fn same_seed_same_decision() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let state = GameState::new(Board::random(6, &mut rng));
        let mut a = Mcts::create(seeded(1_500, 42));
        let mut b = Mcts::create(seeded(1_500, 42));
        assert_eq!(a.choose_action(&state).unwrap(), b.choose_action(&state).unwrap());
    }

    #[test]
    fn exhausted_budget_is_an_error() {
        let state = GameState::new(Board::parse("1,2\n3,4").unwrap());
        let mut mcts = Mcts::create(seeded(0, 1));
        assert!(matches!(
            mcts.choose_action(&state),
            Err(Error::SearchBudgetExhausted { iterations: 0, .. })
        ));

        let mut mcts = Mcts::create(MctsParams {
            max_seconds: 0.0,
            ..seeded(1_000, 1)
        });
        assert!(mcts.choose_action(&state).is_err());
    }

    #[test]
    fn unbounded_clock_falls_back_to_iterations() {
        assert_eq!(
            MctsParams {
                max_seconds: f64::INFINITY,
                ..MctsParams::default()
            }
            .time_limit(),
            Duration::MAX
        );

        let state = GameState::new(Board::parse("1,2,3\n4,5,6\n7,8,9").unwrap());
        for max_seconds in [f64::INFINITY, 1e20] {
            let mut mcts = Mcts::create(MctsParams {
                max_seconds,
                ..seeded(50, 3)
            });
            assert!(mcts.choose_action(&state).is_ok());
            assert_eq!(mcts.last_report().iterations, 50);
        }
    }

    #[test]
    fn single_move_needs_no_search() {
        let board = Board::parse("0,0,0\n0,0,4\n0,0,0").unwrap();
        let state = GameState::from_parts(board, Some(Move::new(1, 0)), Side::First, [0, 0]).unwrap();
        let mut mcts = Mcts::create(seeded(0, 1));
        assert_eq!(mcts.choose_action(&state).unwrap(), Move::new(1, 2));
    }

    #[test]
    fn respects_time_limit() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let state = GameState::new(Board::random(10, &mut rng));
        let mut mcts = Mcts::create(MctsParams {
            max_iterations: u64::MAX,
            max_seconds: 0.05,
            seed: Some(8),
            ..MctsParams::default()
        });
        let started = Instant::now();
        mcts.choose_action(&state).unwrap();
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(mcts.last_report().iterations > 0);
    }

    #[test]
    fn agrees_with_exhaustive_search_on_small_boards() {
        let mut rng = ChaCha8Rng::seed_from_u64(2025);
        let boards = 10;
        let mut optimal = 0;
        for i in 0..boards {
            let state = GameState::new(Board::random(3, &mut rng));
            let mut mcts = Mcts::create(seeded(20_000, i));
            let mv = mcts.choose_action(&state).unwrap();
            let gained = Score::from(state.cell_value(mv)) - solve(&state.apply(mv).unwrap());
            if gained == solve(&state) {
                optimal += 1;
            }
        }
        assert!(optimal >= 7, "only {} of {} boards played optimally", optimal, boards);
    }
}
