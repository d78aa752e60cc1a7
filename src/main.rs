//! Plays a run of games on a board driven by a host automation process.
//!
//! The host speaks JSON lines over this process's stdin and stdout. Logs go to stderr.

mod bridge;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use boardpilot_core::error::{self, Error, ErrorKind};
use boardpilot_core::{MatchLoop, ProcessEngine, SessionConfigBuilder};

use crate::bridge::StdioBridge;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// UCI engine executable.
    #[arg(long, value_name = "FILE", value_hint = clap::ValueHint::ExecutablePath)]
    engine: PathBuf,

    /// Shortest time the engine may think about one move, in milliseconds.
    #[arg(long, default_value = "100")]
    movetime_min: u64,

    /// Longest time the engine may think about one move, in milliseconds.
    #[arg(long, default_value = "300")]
    movetime_max: u64,

    /// Stop after this many games, rematches included.
    #[arg(long, default_value = "5", value_parser = clap::value_parser!(u32).range(1..))]
    max_games: u32,

    /// Look for a new opponent after every game instead of offering rematches.
    #[arg(long)]
    only_one_game_per_opponent: bool,

    #[arg(long, default_value = "4")]
    threads: u32,

    /// Extra engine option as NAME=VALUE. May be repeated.
    #[arg(long = "option", value_name = "NAME=VALUE", value_parser = parse_engine_option)]
    options: Vec<(String, String)>,

    /// Width of one board cell in pixels.
    #[arg(long, default_value = "64", value_parser = clap::value_parser!(u32).range(1..))]
    cell_size: u32,

    /// Seconds to wait for matchmaking before ending the run.
    #[arg(long, default_value = "120")]
    seek_timeout: u64,

    /// Seconds to wait for a rematch to be accepted.
    #[arg(long, default_value = "22")]
    rematch_timeout: u64,

    /// Log filter, such as `info` or `boardpilot=debug`. Overrides RUST_LOG.
    #[arg(long)]
    log: Option<String>,

    /// Seed for every random choice, for reproducible runs.
    #[arg(long)]
    seed: Option<u64>,
}

fn parse_engine_option(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("`{raw}` is not NAME=VALUE"))?;
    if name.trim().is_empty() {
        return Err(format!("`{raw}` has no option name"));
    }
    Ok((name.trim().to_string(), value.trim().to_string()))
}

fn init_logging(directive: Option<&str>) -> error::Result<()> {
    let filter = match directive {
        Some(directive) => {
            EnvFilter::try_new(directive).map_err(|err| Error::new(ErrorKind::ConfigInvalid, err))?
        }
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let args = Args::parse();
    init_logging(args.log.as_deref())?;

    let builder = args.options.iter().fold(
        SessionConfigBuilder::new()
            .engine_path(args.engine)
            .threads(args.threads)
            .movetime_millis(args.movetime_min, args.movetime_max)
            .max_games(args.max_games)
            .only_one_game_per_opponent(args.only_one_game_per_opponent)
            .cell_size(args.cell_size)
            .seek_timeout(Duration::from_secs(args.seek_timeout))
            .rematch_timeout(Duration::from_secs(args.rematch_timeout)),
        |builder, (name, value)| builder.engine_option(name, value),
    );
    let config = builder.build()?;

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let engine = ProcessEngine::spawn(config.engine_path())?;
    let board = StdioBridge::new(tokio::io::stdin(), tokio::io::stdout(), config.geometry());
    let mut match_loop = MatchLoop::new(config, engine, board);

    match_loop.initialize().await?;
    let summary = match_loop.run(&mut rng).await?;
    for (index, outcome) in summary.outcomes.iter().enumerate() {
        info!(game = index + 1, %outcome, "result");
    }
    info!(
        games_played = summary.games_played,
        seek_timed_out = summary.seek_timed_out,
        "run complete"
    );

    match_loop.finish().await?;
    Ok(())
}
