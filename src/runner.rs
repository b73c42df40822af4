use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::game::{Board, GameState, Move, Outcome, Score, Side};
use crate::strategies::Strategy;

/// Anything that can take a seat at the board.
pub trait Player {
    fn choose_move(&mut self, state: &GameState) -> Result<Move>;
    fn display_name(&self) -> &str;
    fn player_type(&self) -> &str;
    fn full_name(&self) -> String {
        format!("{} ({})", self.display_name(), self.player_type())
    }
}

/// Reads moves as `row col` or `row,col` lines, asking again until it gets
/// a legal one.
pub struct HumanPlayer<R, W> {
    name: String,
    input: R,
    output: W,
}

impl HumanPlayer<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio(name: &str) -> Self {
        HumanPlayer::new(name, io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> HumanPlayer<R, W> {
    pub fn new(name: &str, input: R, output: W) -> Self {
        HumanPlayer {
            name: String::from(name),
            input,
            output,
        }
    }

    fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{}", text).map_err(|e| Error::io("<output>", e))
    }
}

impl<R: BufRead, W: Write> Player for HumanPlayer<R, W> {
    fn display_name(&self) -> &str {
        self.name.as_str()
    }

    fn player_type(&self) -> &str {
        "Human"
    }

    fn choose_move(&mut self, state: &GameState) -> Result<Move> {
        let legal = state.legal_moves();
        if legal.is_empty() {
            return Err(Error::NoLegalMoves);
        }
        self.say(&format!("{}", state))?;
        let options: Vec<String> = legal.iter().map(|mv| mv.to_string()).collect();
        self.say(&format!("{} to move. Legal: {}", state.to_act(), options.join(" ")))?;

        loop {
            self.say("What is your move?")?;
            let mut line = String::new();
            let read = self
                .input
                .read_line(&mut line)
                .map_err(|e| Error::io("<input>", e))?;
            if read == 0 {
                return Err(Error::io(
                    "<input>",
                    io::Error::new(io::ErrorKind::UnexpectedEof, "input closed before a move was given"),
                ));
            }

            let mv: Move = match line.trim().parse() {
                Ok(mv) => mv,
                Err(()) => {
                    self.say("Could not read that; type a row and a column, e.g. `1 2`.")?;
                    continue;
                }
            };
            if !state.is_legal(mv) {
                self.say(&format!("{} is not a legal move.", mv))?;
                continue;
            }
            return Ok(mv);
        }
    }
}

/// A seat filled by a search strategy.
pub struct AiPlayer {
    name: String,
    strategy: Box<dyn Strategy + Send>,
}

impl AiPlayer {
    pub fn new(strategy: Box<dyn Strategy + Send>) -> Self {
        AiPlayer {
            name: strategy.name().to_string(),
            strategy,
        }
    }

    pub fn named(name: &str, strategy: Box<dyn Strategy + Send>) -> Self {
        AiPlayer {
            name: String::from(name),
            strategy,
        }
    }
}

impl Player for AiPlayer {
    fn display_name(&self) -> &str {
        self.name.as_str()
    }

    fn player_type(&self) -> &str {
        "Computer"
    }

    fn choose_move(&mut self, state: &GameState) -> Result<Move> {
        self.strategy.choose_action(state)
    }
}

/// Everything that happened in one game.
#[derive(Debug, Clone, Serialize)]
pub struct GameRecord {
    pub moves: Vec<Move>,
    pub final_state: GameState,
    pub outcome: Outcome,
}

impl GameRecord {
    pub fn score(&self, side: Side) -> Score {
        self.final_state.score(side)
    }

    /// Writes the record as pretty-printed JSON.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush().map_err(|e| Error::io(path, e))
    }
}

pub type Plr<'a> = &'a mut dyn Player;

pub struct Runner<'a> {
    state: GameState,
    players: (Plr<'a>, Plr<'a>),
    moves: Vec<Move>,
}

impl<'a> Runner<'a> {
    pub fn new(board: Board, first: Plr<'a>, second: Plr<'a>) -> Self {
        Runner {
            state: GameState::new(board),
            players: (first, second),
            moves: Vec::new(),
        }
    }

    fn init(&self) {
        debug!(
            first = %self.players.0.full_name(),
            second = %self.players.1.full_name(),
            side = self.state.board().side(),
            "starting game"
        );
    }

    fn step(&mut self) -> Result<()> {
        let player = match self.state.to_act() {
            Side::First => &mut self.players.0,
            Side::Second => &mut self.players.1,
        };
        let mv = player.choose_move(&self.state)?;
        self.state = self.state.apply(mv)?;
        debug!(
            player = %player.display_name(),
            %mv,
            p1 = self.state.score(Side::First),
            p2 = self.state.score(Side::Second),
            "move played"
        );
        self.moves.push(mv);
        Ok(())
    }

    fn game_loop(&mut self) -> Result<Outcome> {
        loop {
            if let Some(outcome) = self.state.outcome() {
                return Ok(outcome);
            }
            self.step()?;
        }
    }

    /// Plays `board` to the end with `first` moving first.
    pub fn play(board: Board, first: Plr<'a>, second: Plr<'a>) -> Result<GameRecord> {
        let mut runner = Runner::new(board, first, second);
        runner.init();
        let outcome = runner.game_loop()?;
        debug!(
            %outcome,
            p1 = runner.state.score(Side::First),
            p2 = runner.state.score(Side::Second),
            moves = runner.moves.len(),
            "game over"
        );
        Ok(GameRecord {
            moves: runner.moves,
            final_state: runner.state,
            outcome,
        })
    }
}
