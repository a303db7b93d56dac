use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{Parser, ValueEnum};

use othello_core::engine::config::EngineConfig;
use othello_core::engine::edge_table::EdgeTable;
use othello_core::engine::eval::WeightedEvaluator;
use othello_core::engine::search::AlphaBetaStrategy;
use othello_core::engine::{RandomStrategy, NO_MOVE};
use othello_core::logic::board::{Board, Player};
use othello_core::logic::game::{play, Strategy};

#[derive(Parser)]
#[command(name = "othello", about = "Play Othello against the Iago engine")]
struct Args {
    /// Who plays Black
    #[arg(long, value_enum, default_value = "human")]
    black: Kind,
    /// Who plays White
    #[arg(long, value_enum, default_value = "iago")]
    white: Kind,
    /// Search depth for the engine strategies
    #[arg(long, default_value_t = 3)]
    depth: u8,
    /// Edge-table cache file
    #[arg(long, default_value = "edge_table.txt")]
    table: PathBuf,
    /// Engine configuration as JSON
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Kind {
    Human,
    Iago,
    Weighted,
    Random,
}

/// Prompts on stdin until the user enters a legal square, so a typo never
/// aborts the game.
struct HumanStrategy {
    input: io::Stdin,
}

impl HumanStrategy {
    fn new() -> Self {
        Self { input: io::stdin() }
    }
}

impl Strategy for HumanStrategy {
    fn choose_move(&mut self, player: Player, board: &Board, _move_number: u32) -> usize {
        println!();
        println!("{board}");
        let mut legal = board.legal_moves(player);
        legal.sort_unstable();
        let legal_line: Vec<String> = legal.iter().map(ToString::to_string).collect();
        println!("Legal moves: {}", legal_line.join(" "));
        loop {
            print!("{player} to move: ");
            let _ = io::stdout().flush();
            let mut line = String::new();
            match self.input.lock().read_line(&mut line) {
                // End of input: hand back a square the driver will refuse.
                Ok(0) | Err(_) => return NO_MOVE,
                Ok(_) => {}
            }
            match line.trim().parse::<usize>() {
                Ok(mv) if board.is_legal(mv, player) => return mv,
                Ok(mv) => println!("{mv} is not a legal move."),
                Err(_) => println!("Enter a square number, e.g. 34."),
            }
        }
    }
}

fn build_strategy(
    kind: Kind,
    config: &Arc<EngineConfig>,
    table: &Arc<EdgeTable>,
) -> Box<dyn Strategy> {
    match kind {
        Kind::Human => Box::new(HumanStrategy::new()),
        Kind::Iago => Box::new(AlphaBetaStrategy::iago(config.clone(), table.clone())),
        Kind::Weighted => Box::new(AlphaBetaStrategy::new(config.clone(), WeightedEvaluator)),
        Kind::Random => Box::new(RandomStrategy::new()),
    }
}

fn load_config(args: &Args) -> EngineConfig {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path).unwrap_or_else(|err| {
                eprintln!("cannot read {}: {err}", path.display());
                process::exit(1);
            });
            EngineConfig::from_json(&text).unwrap_or_else(|err| {
                eprintln!("bad engine config {}: {err}", path.display());
                process::exit(1);
            })
        }
        None => EngineConfig::default(),
    };
    config.search_depth = args.depth;
    config
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let config = Arc::new(load_config(&args));
    let table = Arc::new(EdgeTable::load_or_build(&args.table));

    let mut black = build_strategy(args.black, &config, &table);
    let mut white = build_strategy(args.white, &config, &table);

    match play(black.as_mut(), white.as_mut()) {
        Ok(outcome) => {
            println!();
            println!("{}", outcome.board);
            println!();
            println!("Final score (Black - White): {}", outcome.score);
            match outcome.score.signum() {
                1 => println!("Black wins."),
                -1 => println!("White wins."),
                _ => println!("Draw."),
            }
        }
        Err(err) => {
            eprintln!("{err}");
            process::exit(1);
        }
    }
}
