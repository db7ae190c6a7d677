//! Escape Room - Entry Point
//!
//! Interactive text game: the player moves through the rooms, solves door
//! puzzles and plans routes while the guard hunts them. Pass a TOML config
//! path as the first argument to override the defaults.

use std::io::{self, Write};
use std::path::Path;

use escape_room::belief::RiskLevel;
use escape_room::core::config::EscapeConfig;
use escape_room::core::error::{EscapeError, Result};
use escape_room::core::types::{RoomId, Traversal};
use escape_room::pathfinding::PathResult;
use escape_room::session::{DefeatReason, Outcome, Session};

fn main() -> Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter("escape_room=info")
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => EscapeConfig::load(Path::new(&path))?,
        None => EscapeConfig::default(),
    };

    let mut session = Session::new(config)?;

    println!("\n=== ESCAPE ROOM ===");
    println!(
        "Collect all {} keys and reach the exit. Watch for traps and the guard.",
        session.total_keys()
    );
    println!("Seed: {}", session.seed());

    while !session.is_over() {
        println!("\n--- Turn {} ---", session.turn() + 1);
        display_status(&session)?;

        println!();
        println!("Actions:");
        println!("  1. Move to adjacent room");
        println!("  2. Solve puzzle (unlock doors here)");
        println!("  3. Find path to nearest key");
        println!("  4. Plan escape route");
        println!("  5. View belief state");
        println!("  6. View guard status");
        println!("  7. Quit");

        let choice = prompt("> ")?;
        let turn_taken = match choice.as_str() {
            "1" => action_move(&mut session)?,
            "2" => action_solve(&mut session)?,
            "3" => {
                action_find_key(&session)?;
                false
            }
            "4" => {
                action_plan_escape(&session)?;
                false
            }
            "5" => {
                action_view_beliefs(&session);
                false
            }
            "6" => {
                action_view_guard(&session)?;
                false
            }
            "7" | "q" | "quit" => break,
            "" => false,
            _ => {
                println!("Unknown action. Enter 1-7.");
                false
            }
        };

        if turn_taken && !session.is_over() {
            let report = session.end_turn()?;
            if report.guard_from != report.guard_to {
                println!("The guard moves from {} to {}.", report.guard_from, report.guard_to);
            }
            if report.captured {
                println!("The guard caught you!");
            } else if report.detected {
                println!("ALERT: the guard can see you!");
            }
        }
    }

    let report = session.report();
    println!("\n=== GAME OVER ===");
    match report.outcome {
        Outcome::Victory => println!("VICTORY! You escaped."),
        Outcome::Defeat { reason } => match reason {
            DefeatReason::Exhausted => println!("DEFEAT: your health reached 0."),
            DefeatReason::Captured => println!("DEFEAT: caught by the guard."),
            DefeatReason::OutOfTurns => {
                println!("DEFEAT: turn limit reached ({}).", report.max_turns)
            }
        },
        Outcome::InProgress => println!("You gave up."),
    }
    println!("Turns taken: {}", report.turns);
    println!("Moves made: {}", report.moves_made);
    println!("Final health: {}/{}", report.health, report.max_health);
    println!("Keys collected: {}/{}", report.keys_collected, report.total_keys);
    println!("Rooms explored: {}/{}", report.rooms_visited, report.room_count);
    println!("Traps triggered: {}", report.traps_triggered);
    println!("Puzzles solved: {}", report.puzzles_solved);
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn risk_label(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::High => "HIGH",
        RiskLevel::Medium => "MED",
        RiskLevel::Low => "LOW",
    }
}

fn display_status(session: &Session) -> Result<()> {
    let agent = session.agent();
    let room = session.world().room(agent.room)?;
    println!("Location: {} ({})", room.name, agent.room);
    println!("Health: {}/{}", agent.health, session.config().agent.health);
    println!("Keys: {}/{}", agent.keys.len(), session.total_keys());

    println!("Doors:");
    for neighbor in session.world().neighbors(agent.room, Traversal::IncludeLocked)? {
        let other = session.world().room(neighbor)?;
        let p = session.belief().probability(neighbor)?;
        let lock = if session.world().is_locked(agent.room, neighbor)? { " [LOCKED]" } else { "" };
        let seen = if agent.visited.contains(&neighbor) { "visited" } else { "new" };
        println!(
            "  -> {}: {} [{} risk, P={:.2}] {}{}",
            neighbor,
            other.name,
            risk_label(RiskLevel::from_probability(p)),
            p,
            seen,
            lock
        );
    }
    Ok(())
}

fn action_move(session: &mut Session) -> Result<bool> {
    let here = session.agent().room;
    let open = session.world().neighbors(here, Traversal::Unlocked)?;
    if open.is_empty() {
        println!("No open doors from here. Try solving a puzzle.");
        return Ok(false);
    }

    for (i, room) in open.iter().enumerate() {
        let name = &session.world().room(*room)?.name;
        println!("  {}. {} ({})", i + 1, name, room);
    }
    let choice = prompt("Choose room (or 'back'): ")?;
    let picked = choice
        .parse::<usize>()
        .ok()
        .and_then(|i| i.checked_sub(1))
        .and_then(|i| open.get(i));
    let Some(target) = picked else {
        if choice != "back" {
            println!("Invalid choice.");
        }
        return Ok(false);
    };

    let report = session.move_agent(*target)?;
    println!("Moved to {}.", report.to);
    if report.trap_triggered {
        println!(
            "TRAP! Lost {} health. Health: {}",
            report.damage,
            session.agent().health
        );
    }
    if let Some(key) = report.key {
        println!(
            "Found key #{}! Keys: {}/{}",
            key.0,
            session.agent().keys.len(),
            session.total_keys()
        );
    }
    Ok(true)
}

fn action_solve(session: &mut Session) -> Result<bool> {
    let reports = session.solve_puzzles_here()?;
    if reports.is_empty() {
        println!("No locked doors in this room.");
        return Ok(false);
    }
    for report in reports {
        println!(
            "Solved {:?} puzzle {:?} ({} nodes, {} backtracks); door to {} unlocked.",
            report.difficulty,
            report.solution,
            report.stats.nodes_expanded,
            report.stats.backtracks,
            report.door.1
        );
    }
    Ok(true)
}

fn print_route(session: &Session, route: &PathResult) -> Result<()> {
    let rooms: Vec<String> = route.path.iter().map(|room| room.0.to_string()).collect();
    println!("Path: {}", rooms.join(" -> "));
    println!("  Distance: {} rooms", route.hops());
    println!("  Estimated risk: {:.2}", session.belief().risk_of_path(&route.path)?);
    if route.crosses_locked() {
        println!("  Crosses {} locked door(s)", route.locked_doors.len());
    }
    Ok(())
}

fn route_or_hint(session: &Session, route: Result<PathResult>, what: &str) -> Result<()> {
    match route {
        Ok(route) => print_route(session, &route),
        Err(EscapeError::NoPath { .. }) => {
            println!(
                "No open path to the {}. You may need to solve puzzles to unlock doors.",
                what
            );
            Ok(())
        }
        Err(e) => Err(e),
    }
}

fn action_find_key(session: &Session) -> Result<()> {
    match session.nearest_key_route() {
        Ok(None) => {
            println!("All keys collected. Head for the exit!");
            Ok(())
        }
        Ok(Some(route)) => {
            if let Some(&room) = route.path.last() {
                println!("Nearest key: {}", session.world().room(room)?.name);
            }
            print_route(session, &route)
        }
        Err(e) => route_or_hint(session, Err(e), "nearest key"),
    }
}

fn action_plan_escape(session: &Session) -> Result<()> {
    route_or_hint(session, session.escape_route(), "exit")
}

fn action_view_beliefs(session: &Session) {
    let summary = session.belief().summary();
    println!("Verified safe: {:?}", ids(&summary.verified_safe));
    println!("Verified trapped: {:?}", ids(&summary.verified_trapped));
    println!("High risk:");
    for (room, p) in &summary.high_risk {
        println!("  {}: {:.2}", room, p);
    }
    println!("Medium risk:");
    for (room, p) in &summary.medium_risk {
        println!("  {}: {:.2}", room, p);
    }
    println!("Low risk rooms: {}", summary.low_risk_count);
}

fn ids(rooms: &[RoomId]) -> Vec<u32> {
    rooms.iter().map(|room| room.0).collect()
}

fn action_view_guard(session: &Session) -> Result<()> {
    let guard = session.guard();
    if !guard.is_enabled() {
        println!("The guard is off duty.");
        return Ok(());
    }
    let report = guard.report();
    println!("Guard location: {}", session.world().room(report.room)?.name);
    println!("Moves made: {}", report.moves_made);
    println!("Minimax depth: {}", report.depth);

    let agent = session.agent().room;
    if guard.detected(session.world(), agent)? {
        println!("ALERT: the guard can detect your location!");
    } else {
        match guard.distance_to(session.world(), agent)? {
            Some(distance) => println!("The guard is {} rooms away.", distance),
            None => println!("The guard has no open path to you."),
        }
    }
    Ok(())
}
