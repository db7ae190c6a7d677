//! Automated agent: plans toward keys, then the exit, one move per turn
//!
//! A route is planned for the current priority target and followed room by
//! room until it runs out, then the next target is planned. Planning goes
//! through locked doors at the puzzle cost; when the next door on the route
//! is locked, the autopilot solves its puzzle first.

use std::collections::VecDeque;

use crate::core::config::EscapeConfig;
use crate::core::error::{EscapeError, Result};
use crate::core::types::{RoomId, Traversal};
use crate::pathfinding::{PathAlgorithm, PathResult, PlanMode};
use crate::session::{MoveReport, Outcome, PuzzleReport, Session, SessionReport, TurnReport};

/// Result of one autopilot step
#[derive(Debug, Clone)]
pub enum Step {
    Moved {
        puzzles: Vec<PuzzleReport>,
        movement: MoveReport,
        /// `None` when the move itself ended the session
        turn: Option<TurnReport>,
    },
    Finished(Outcome),
    /// Nothing left to reach
    Stuck,
}

#[derive(Debug, Clone)]
pub struct Autopilot {
    algorithm: PathAlgorithm,
    risk_tolerance: f64,
    puzzle_cost: f64,
    /// Remaining rooms of the route being followed
    route: VecDeque<RoomId>,
}

impl Autopilot {
    pub fn new(config: &EscapeConfig) -> Self {
        Self {
            algorithm: config.pathfinding.algorithm,
            risk_tolerance: config.agent.risk_tolerance,
            puzzle_cost: config.pathfinding.puzzle_cost,
            route: VecDeque::new(),
        }
    }

    pub fn with_algorithm(mut self, algorithm: PathAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn algorithm(&self) -> PathAlgorithm {
        self.algorithm
    }

    fn mode(&self) -> PlanMode {
        PlanMode::ThroughLocked {
            puzzle_cost: self.puzzle_cost,
        }
    }

    /// Route to the current priority target
    ///
    /// Nearest uncollected key, then the exit once every key is held, then
    /// unvisited rooms (believed-safe ones first, lowest id first).
    pub fn next_route(&self, session: &Session) -> Result<Option<PathResult>> {
        match session.nearest_key_route_with(self.algorithm, self.mode()) {
            Ok(Some(route)) => return Ok(Some(route)),
            Ok(None) => {}
            Err(e) if e.is_recoverable() => {}
            Err(e) => return Err(e),
        }

        if session.keys_remaining() == 0 {
            if let Some(route) = self.try_route(session, session.exit())? {
                return Ok(Some(route));
            }
        }

        let mut unexplored: Vec<(bool, RoomId)> = Vec::new();
        for room in session.world().room_ids() {
            if session.agent().visited.contains(&room) {
                continue;
            }
            let risky = session.belief().probability(room)? >= self.risk_tolerance;
            unexplored.push((risky, room));
        }
        unexplored.sort();

        for (_, room) in unexplored {
            if let Some(route) = self.try_route(session, room)? {
                return Ok(Some(route));
            }
        }
        Ok(None)
    }

    fn try_route(&self, session: &Session, target: RoomId) -> Result<Option<PathResult>> {
        match session.plan_route_with(target, self.algorithm, self.mode()) {
            Ok(route) => Ok(Some(route)),
            Err(EscapeError::NoPath { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Take one move along the current route and let the guard respond
    pub fn step(&mut self, session: &mut Session) -> Result<Step> {
        let outcome = session.outcome();
        if outcome.is_over() {
            return Ok(Step::Finished(outcome));
        }

        let here = session.agent().room;
        let on_route = match self.route.front() {
            Some(&next) => session
                .world()
                .neighbors(here, Traversal::IncludeLocked)?
                .contains(&next),
            None => false,
        };
        if !on_route {
            self.route = match self.next_route(session)? {
                Some(route) => route.path.into_iter().skip(1).collect(),
                None => VecDeque::new(),
            };
        }

        let Some(next) = self.route.pop_front() else {
            tracing::info!(room = %here, "autopilot has no reachable target");
            return Ok(Step::Stuck);
        };

        let puzzles = if session.world().is_locked(here, next)? {
            session.solve_puzzles_here()?
        } else {
            Vec::new()
        };

        let movement = session.move_agent(next)?;
        let turn = if session.is_over() {
            None
        } else {
            Some(session.end_turn()?)
        };

        Ok(Step::Moved {
            puzzles,
            movement,
            turn,
        })
    }

    /// Play until the session ends or no target remains
    pub fn run(&mut self, session: &mut Session) -> Result<SessionReport> {
        loop {
            match self.step(session)? {
                Step::Moved { .. } => {}
                Step::Finished(outcome) => {
                    tracing::info!(?outcome, turns = session.turn(), "autopilot finished");
                    break;
                }
                Step::Stuck => break,
            }
        }
        Ok(session.report())
    }
}
