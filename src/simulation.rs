//! Batch tournaments between strategies.
//!
//! Every unordered pair of strategies plays the same set of random boards
//! twice, once with each strategy moving first, so first-mover advantage
//! cancels out. Boards are independent and are played in parallel.

use std::collections::BTreeMap;
use std::path::Path;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::game::{Board, Outcome, Side};
use crate::runner::{AiPlayer, Runner};
use crate::strategies::StrategyKind;

pub const GAMES_PER_BOARD: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    pub strategies: Vec<StrategyKind>,
    pub sizes: Vec<usize>,
    pub boards_per_size: usize,
    pub seed: u64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        SimulationParams {
            strategies: StrategyKind::ALL.to_vec(),
            sizes: vec![3, 5, 6, 8, 9],
            boards_per_size: 132,
            seed: 12345,
        }
    }
}

/// Results of one strategy pair on one board size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchupReport {
    pub board_size: usize,
    pub boards: usize,
    pub games_per_board: usize,
    pub total_games: usize,
    pub s1: StrategyKind,
    pub s2: StrategyKind,
    pub s1_wins_as_p1: usize,
    pub s1_wins_as_p2: usize,
    pub s2_wins_as_p1: usize,
    pub s2_wins_as_p2: usize,
    pub ties: usize,
    pub starter_wins: usize,
    pub s1_win_rate_as_p1: f64,
    pub s1_win_rate_as_p2: f64,
    pub s2_win_rate_as_p1: f64,
    pub s2_win_rate_as_p2: f64,
    pub s1_overall_win_rate: f64,
    pub s2_overall_win_rate: f64,
    pub tie_rate: f64,
    pub starter_win_rate: f64,
}

/// Raw win counts before rates are derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchupCounts {
    pub s1_wins_as_p1: usize,
    pub s1_wins_as_p2: usize,
    pub s2_wins_as_p1: usize,
    pub s2_wins_as_p2: usize,
    pub ties: usize,
}

impl MatchupCounts {
    /// Tallies the two games of one board: `s1_first` with S1 moving first,
    /// `s2_first` with S2 moving first.
    fn record(&mut self, s1_first: Outcome, s2_first: Outcome) {
        match s1_first {
            Outcome::Win(Side::First) => self.s1_wins_as_p1 += 1,
            Outcome::Win(Side::Second) => self.s2_wins_as_p2 += 1,
            Outcome::Tie => self.ties += 1,
        }
        match s2_first {
            Outcome::Win(Side::First) => self.s2_wins_as_p1 += 1,
            Outcome::Win(Side::Second) => self.s1_wins_as_p2 += 1,
            Outcome::Tie => self.ties += 1,
        }
    }

    fn merge(mut self, other: MatchupCounts) -> Self {
        self.s1_wins_as_p1 += other.s1_wins_as_p1;
        self.s1_wins_as_p2 += other.s1_wins_as_p2;
        self.s2_wins_as_p1 += other.s2_wins_as_p1;
        self.s2_wins_as_p2 += other.s2_wins_as_p2;
        self.ties += other.ties;
        self
    }
}

fn ratio(n: usize, d: usize) -> f64 {
    if d == 0 {
        0.0
    } else {
        n as f64 / d as f64
    }
}

impl MatchupReport {
    pub fn from_counts(
        board_size: usize,
        s1: StrategyKind,
        s2: StrategyKind,
        boards: usize,
        counts: MatchupCounts,
    ) -> Self {
        let total_games = boards * GAMES_PER_BOARD;
        let starter_wins = counts.s1_wins_as_p1 + counts.s2_wins_as_p1;
        let non_ties = total_games.saturating_sub(counts.ties).max(1);
        MatchupReport {
            board_size,
            boards,
            games_per_board: GAMES_PER_BOARD,
            total_games,
            s1,
            s2,
            s1_wins_as_p1: counts.s1_wins_as_p1,
            s1_wins_as_p2: counts.s1_wins_as_p2,
            s2_wins_as_p1: counts.s2_wins_as_p1,
            s2_wins_as_p2: counts.s2_wins_as_p2,
            ties: counts.ties,
            starter_wins,
            s1_win_rate_as_p1: ratio(counts.s1_wins_as_p1, boards),
            s1_win_rate_as_p2: ratio(counts.s1_wins_as_p2, boards),
            s2_win_rate_as_p1: ratio(counts.s2_wins_as_p1, boards),
            s2_win_rate_as_p2: ratio(counts.s2_wins_as_p2, boards),
            s1_overall_win_rate: ratio(counts.s1_wins_as_p1 + counts.s1_wins_as_p2, total_games),
            s2_overall_win_rate: ratio(counts.s2_wins_as_p1 + counts.s2_wins_as_p2, total_games),
            tie_rate: ratio(counts.ties, total_games),
            starter_win_rate: ratio(starter_wins, non_ties),
        }
    }
}

/// Per-strategy totals across every opponent and board size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategySummary {
    pub strategy: StrategyKind,
    pub wins_as_p1: usize,
    pub games_as_p1: usize,
    pub win_rate_as_p1: f64,
    pub wins_as_p2: usize,
    pub games_as_p2: usize,
    pub win_rate_as_p2: f64,
}

/// Aggregates reports per strategy, best win rate as P1 (then as P2) first.
pub fn summarize(reports: &[MatchupReport]) -> Vec<StrategySummary> {
    // (wins as P1, wins as P2, boards); each board is one game in each role.
    let mut totals: BTreeMap<StrategyKind, (usize, usize, usize)> = BTreeMap::new();
    for r in reports {
        let s1 = totals.entry(r.s1).or_default();
        s1.0 += r.s1_wins_as_p1;
        s1.1 += r.s1_wins_as_p2;
        s1.2 += r.boards;
        let s2 = totals.entry(r.s2).or_default();
        s2.0 += r.s2_wins_as_p1;
        s2.1 += r.s2_wins_as_p2;
        s2.2 += r.boards;
    }

    let mut summary: Vec<StrategySummary> = totals
        .into_iter()
        .map(|(strategy, (p1, p2, games))| StrategySummary {
            strategy,
            wins_as_p1: p1,
            games_as_p1: games,
            win_rate_as_p1: ratio(p1, games),
            wins_as_p2: p2,
            games_as_p2: games,
            win_rate_as_p2: ratio(p2, games),
        })
        .collect();
    summary.sort_by(|a, b| {
        b.win_rate_as_p1
            .total_cmp(&a.win_rate_as_p1)
            .then(b.win_rate_as_p2.total_cmp(&a.win_rate_as_p2))
    });
    summary
}

/// Writes `rows` as CSV with a header line, creating parent directories.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
    }
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush().map_err(|e| Error::io(path, e))?;
    Ok(())
}

/// Seed for one strategy instance in one game.
fn game_seed(base: u64, size: usize, board: usize, game: usize, role: usize) -> u64 {
    let mut x = base
        ^ (size as u64).rotate_left(48)
        ^ (board as u64).rotate_left(16)
        ^ ((game * 2 + role) as u64);
    // splitmix64 finaliser
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

/// Round-robin over every pair of configured strategies.
///
/// Runs are repeatable for a fixed `simulation.seed` as long as MCTS stops on
/// `mcts.max_iterations`; searches cut short by `mcts.max_seconds` depend on
/// machine speed.
pub struct Tournament {
    config: Config,
}

impl Tournament {
    pub fn new(config: Config) -> Self {
        Tournament { config }
    }

    pub fn params(&self) -> &SimulationParams {
        &self.config.simulation
    }

    /// The boards every pair plays on, per size, from the tournament seed.
    pub fn boards(&self) -> Vec<(usize, Vec<Board>)> {
        let params = self.params();
        let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
        params
            .sizes
            .iter()
            .map(|&size| {
                let boards = (0..params.boards_per_size)
                    .map(|_| Board::random(size, &mut rng))
                    .collect();
                (size, boards)
            })
            .collect()
    }

    fn play_game(&self, board: &Board, first: StrategyKind, second: StrategyKind, seeds: (u64, u64)) -> Result<Outcome> {
        let mut p1 = AiPlayer::new(first.build(&self.config, Some(seeds.0)));
        let mut p2 = AiPlayer::new(second.build(&self.config, Some(seeds.1)));
        Ok(Runner::play(board.clone(), &mut p1, &mut p2)?.outcome)
    }

    pub fn play_matchup(
        &self,
        size: usize,
        s1: StrategyKind,
        s2: StrategyKind,
        boards: &[Board],
    ) -> Result<MatchupReport> {
        let base = self.params().seed;
        let counts = boards
            .par_iter()
            .enumerate()
            .map(|(i, board)| -> Result<MatchupCounts> {
                let s1_first = self.play_game(
                    board,
                    s1,
                    s2,
                    (game_seed(base, size, i, 0, 0), game_seed(base, size, i, 0, 1)),
                )?;
                let s2_first = self.play_game(
                    board,
                    s2,
                    s1,
                    (game_seed(base, size, i, 1, 0), game_seed(base, size, i, 1, 1)),
                )?;
                let mut counts = MatchupCounts::default();
                counts.record(s1_first, s2_first);
                Ok(counts)
            })
            .try_reduce(MatchupCounts::default, |a, b| Ok(a.merge(b)))?;

        let report = MatchupReport::from_counts(size, s1, s2, boards.len(), counts);
        info!(
            size,
            %s1,
            %s2,
            s1_win_rate = report.s1_overall_win_rate,
            s2_win_rate = report.s2_overall_win_rate,
            tie_rate = report.tie_rate,
            "matchup finished"
        );
        Ok(report)
    }

    /// Plays every unordered strategy pair on every board size.
    pub fn run(&self) -> Result<Vec<MatchupReport>> {
        let strategies = &self.params().strategies;
        let mut reports = Vec::new();
        for (size, boards) in self.boards() {
            info!(size, boards = boards.len(), "board size started");
            for (i, &s1) in strategies.iter().enumerate() {
                for &s2 in &strategies[i + 1..] {
                    reports.push(self.play_matchup(size, s1, s2, &boards)?);
                }
            }
        }
        Ok(reports)
    }
}
