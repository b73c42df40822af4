use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use rcgame::simulation::write_csv;
use rcgame::{
    load_config, summarize, AiPlayer, Board, Config, HumanPlayer, Player, Runner, Side, StrategyKind,
    Tournament,
};

#[derive(Parser, Debug)]
#[command(name = "rcgame", version, about = "Row-column number game with search-based players")]
struct Cli {
    /// TOML configuration file (defaults to $RCGAME_CONFIG, then ./rcgame.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play one game and print the result
    Play {
        /// Board file of comma-separated rows
        #[arg(long, conflicts_with = "size")]
        board: Option<PathBuf>,
        /// Side of a random board
        #[arg(long, default_value_t = 5)]
        size: usize,
        /// Seed for the random board and the strategies
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, value_enum, default_value_t = Seat::Human)]
        first: Seat,
        #[arg(long, value_enum, default_value_t = Seat::Minimax)]
        second: Seat,
        /// Write the finished game as JSON
        #[arg(long)]
        record: Option<PathBuf>,
    },
    /// Write a random board to a file
    Generate {
        #[arg(long)]
        size: usize,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        out: PathBuf,
    },
    /// Run a round-robin tournament and write CSV reports
    Simulate {
        #[arg(long, value_enum, value_delimiter = ',')]
        strategies: Vec<StrategyKind>,
        #[arg(long, value_delimiter = ',')]
        sizes: Vec<usize>,
        #[arg(long)]
        boards_per_size: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value = "results")]
        out_dir: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Seat {
    Human,
    Random,
    Greedy,
    SafeChoice,
    Mcts,
    Minimax,
}

impl Seat {
    fn strategy(self) -> Option<StrategyKind> {
        match self {
            Seat::Human => None,
            Seat::Random => Some(StrategyKind::Random),
            Seat::Greedy => Some(StrategyKind::Greedy),
            Seat::SafeChoice => Some(StrategyKind::SafeChoice),
            Seat::Mcts => Some(StrategyKind::Mcts),
            Seat::Minimax => Some(StrategyKind::Minimax),
        }
    }

    fn player(self, name: &str, config: &Config, seed: Option<u64>) -> Box<dyn Player> {
        match self.strategy() {
            Some(kind) => Box::new(AiPlayer::named(name, kind.build(config, seed))),
            None => Box::new(HumanPlayer::stdio(name)),
        }
    }
}

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}

fn rng_for(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

struct PlayArgs {
    board: Option<PathBuf>,
    size: usize,
    seed: Option<u64>,
    first: Seat,
    second: Seat,
    record: Option<PathBuf>,
}

fn play(config: &Config, args: PlayArgs) -> Result<()> {
    let PlayArgs {
        board,
        size,
        seed,
        first,
        second,
        record: record_path,
    } = args;
    let board = match board {
        Some(path) => Board::load(&path).with_context(|| format!("loading board {}", path.display()))?,
        None => Board::random(size, &mut rng_for(seed)),
    };
    println!("{}", board);

    let mut p1 = first.player("Player 1", config, seed);
    let mut p2 = second.player("Player 2", config, seed.map(|s| s.wrapping_add(1)));
    println!("Player 1 is {}", p1.full_name());
    println!("Player 2 is {}", p2.full_name());

    let record = Runner::play(board, p1.as_mut(), p2.as_mut())?;
    let moves: Vec<String> = record.moves.iter().map(|mv| mv.to_string()).collect();
    println!("Moves: {}", moves.join(" "));
    println!(
        "Final score: {} - {}",
        record.score(Side::First),
        record.score(Side::Second)
    );
    println!("Result: {}", record.outcome);
    if let Some(path) = record_path {
        record.save_json(&path)?;
        info!(path = %path.display(), "game record written");
    }
    Ok(())
}

fn generate(size: usize, seed: Option<u64>, out: PathBuf) -> Result<()> {
    if size == 0 {
        anyhow::bail!("board size must be greater than 0");
    }
    let board = Board::random(size, &mut rng_for(seed));
    board.save(&out)?;
    info!(size, path = %out.display(), "board written");
    print!("{}", board.to_text());
    Ok(())
}

fn simulate(config: Config, out_dir: PathBuf) -> Result<()> {
    config.validate()?;
    let tournament = Tournament::new(config);
    let reports = tournament.run()?;
    let summary = summarize(&reports);

    let results = out_dir.join("simulation_results.csv");
    let summary_path = out_dir.join("strategy_summary.csv");
    write_csv(&results, &reports)?;
    write_csv(&summary_path, &summary)?;
    info!(matchups = reports.len(), path = %results.display(), "results written");

    println!("{:<12} {:>10} {:>10}", "strategy", "win% P1", "win% P2");
    for row in &summary {
        println!(
            "{:<12} {:>9.1}% {:>9.1}%",
            row.strategy.to_string(),
            100.0 * row.win_rate_as_p1,
            100.0 * row.win_rate_as_p2
        );
    }
    println!("Summary written to {}", summary_path.display());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    init_tracing(&config.log_level)?;

    match cli.command {
        Command::Play {
            board,
            size,
            seed,
            first,
            second,
            record,
        } => play(
            &config,
            PlayArgs {
                board,
                size,
                seed,
                first,
                second,
                record,
            },
        ),
        Command::Generate { size, seed, out } => generate(size, seed, out),
        Command::Simulate {
            strategies,
            sizes,
            boards_per_size,
            seed,
            out_dir,
        } => {
            if !strategies.is_empty() {
                config.simulation.strategies = strategies;
            }
            if !sizes.is_empty() {
                config.simulation.sizes = sizes;
            }
            if let Some(n) = boards_per_size {
                config.simulation.boards_per_size = n;
            }
            if let Some(seed) = seed {
                config.simulation.seed = seed;
            }
            simulate(config, out_dir)
        }
    }
}
