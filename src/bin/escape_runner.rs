//! Headless Escape Runner
//!
//! Plays one session with the autopilot and prints the end-of-game report.

use std::path::PathBuf;

use clap::Parser;
use escape_room::core::config::{EscapeConfig, MapSize};
use escape_room::core::error::{EscapeError, Result};
use escape_room::pathfinding::PathAlgorithm;
use escape_room::session::{Autopilot, Outcome, Session, SessionReport};

/// Headless Escape Runner - autopilot sessions for batch evaluation
#[derive(Parser, Debug)]
#[command(name = "escape_runner")]
#[command(about = "Run the escape autopilot and output a session report")]
struct Args {
    /// TOML config file (defaults to built-in values)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Map size: small, medium or large
    #[arg(long)]
    size: Option<String>,

    /// Search algorithm: bfs or astar
    #[arg(long)]
    algorithm: Option<String>,

    /// Minimax depth for the guard
    #[arg(long)]
    depth: Option<i32>,

    /// Disable the guard
    #[arg(long)]
    no_guard: bool,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Enable debug logging (search statistics, belief updates)
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn parse_size(value: &str) -> Result<MapSize> {
    match value {
        "small" => Ok(MapSize::Small),
        "medium" => Ok(MapSize::Medium),
        "large" => Ok(MapSize::Large),
        other => Err(EscapeError::InvalidConfig(format!("unknown map size '{}'", other))),
    }
}

fn parse_algorithm(value: &str) -> Result<PathAlgorithm> {
    match value {
        "bfs" => Ok(PathAlgorithm::Bfs),
        "astar" | "a*" => Ok(PathAlgorithm::AStar),
        other => Err(EscapeError::InvalidConfig(format!("unknown algorithm '{}'", other))),
    }
}

fn build_config(args: &Args) -> Result<EscapeConfig> {
    let mut config = match &args.config {
        Some(path) => EscapeConfig::load(path)?,
        None => EscapeConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.map.seed = Some(seed);
    }
    if let Some(size) = &args.size {
        config.map.size = parse_size(size)?;
    }
    if let Some(algorithm) = &args.algorithm {
        config.pathfinding.algorithm = parse_algorithm(algorithm)?;
    }
    if let Some(depth) = args.depth {
        config.guard.depth = depth;
    }
    if args.no_guard {
        config.guard.enabled = false;
    }
    config.validate()?;
    Ok(config)
}

fn print_text(report: &SessionReport) {
    println!("Escape Result");
    println!("=============");
    match report.outcome {
        Outcome::Victory => println!("Outcome: VICTORY"),
        Outcome::Defeat { reason } => println!("Outcome: DEFEAT ({:?})", reason),
        Outcome::InProgress => println!("Outcome: unfinished (no reachable target)"),
    }
    println!("Seed: {}", report.seed);
    println!("Algorithm: {:?}", report.algorithm);
    println!("Turns: {}/{}", report.turns, report.max_turns);
    println!("Moves: {}", report.moves_made);
    println!("Health: {}/{}", report.health, report.max_health);
    println!("Keys: {}/{}", report.keys_collected, report.total_keys);
    println!("Rooms explored: {}/{}", report.rooms_visited, report.room_count);
    println!("Traps triggered: {}", report.traps_triggered);
    println!("Puzzles solved: {}", report.puzzles_solved);
    println!(
        "Guard: {} after {} moves (depth {})",
        report.guard.room, report.guard.moves_made, report.guard.depth
    );
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose { "escape_room=debug" } else { "escape_room=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = build_config(&args)?;
    let mut autopilot = Autopilot::new(&config);
    let mut session = Session::new(config)?;
    let report = autopilot.run(&mut session)?;

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => print_text(&report),
    }
    Ok(())
}
