//! Game orchestration: one escape attempt from start to outcome
//!
//! A [`Session`] owns the world, the agent's belief, the pathfinder and the
//! guard, and enforces the turn structure: the agent acts (moves, solves
//! puzzles, plans), then `end_turn` lets the guard respond.

pub mod autopilot;

use std::collections::BTreeSet;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::adversary::{AdversaryController, GuardReport};
use crate::belief::{BeliefState, BeliefSummary};
use crate::core::config::EscapeConfig;
use crate::core::error::{EscapeError, Result};
use crate::core::types::{KeyId, RoomId, Traversal, Turn};
use crate::pathfinding::{PathAlgorithm, PathResult, Pathfinder, PlanMode};
use crate::puzzle::{Assignment, CspSolver, Difficulty, Puzzle, SolverStats};
use crate::world::{generate_map, GeneratedMap, WorldGraph};

pub use autopilot::{Autopilot, Step};

/// The agent's physical state
#[derive(Debug, Clone, Serialize)]
pub struct AgentState {
    pub room: RoomId,
    pub health: u32,
    pub keys: BTreeSet<KeyId>,
    pub visited: BTreeSet<RoomId>,
    pub moves_made: u32,
    pub traps_triggered: u32,
    pub puzzles_solved: u32,
}

impl AgentState {
    fn new(start: RoomId, health: u32) -> Self {
        Self {
            room: start,
            health,
            keys: BTreeSet::new(),
            visited: BTreeSet::from([start]),
            moves_made: 0,
            traps_triggered: 0,
            puzzles_solved: 0,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DefeatReason {
    Exhausted,
    Captured,
    OutOfTurns,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    InProgress,
    Victory,
    Defeat { reason: DefeatReason },
}

impl Outcome {
    pub fn is_over(self) -> bool {
        self != Outcome::InProgress
    }
}

/// What happened when the agent entered a room
#[derive(Debug, Clone, Serialize)]
pub struct MoveReport {
    pub from: RoomId,
    pub to: RoomId,
    pub trap_triggered: bool,
    pub damage: u32,
    pub key: Option<KeyId>,
    /// Posterior for the entered room (always 0 or 1)
    pub p_trap: f64,
    /// Neighbors whose estimate moved
    pub propagated: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PuzzleReport {
    pub door: (RoomId, RoomId),
    pub difficulty: Difficulty,
    pub solution: Assignment,
    pub stats: SolverStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct TurnReport {
    pub turn: Turn,
    pub guard_from: RoomId,
    pub guard_to: RoomId,
    pub detected: bool,
    pub captured: bool,
}

/// End-of-game statistics
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub seed: u64,
    pub outcome: Outcome,
    pub turns: Turn,
    pub max_turns: Turn,
    pub moves_made: u32,
    pub health: u32,
    pub max_health: u32,
    pub keys_collected: usize,
    pub total_keys: u32,
    pub rooms_visited: usize,
    pub room_count: usize,
    pub traps_triggered: u32,
    pub puzzles_solved: u32,
    pub algorithm: PathAlgorithm,
    pub guard: GuardReport,
    pub beliefs: BeliefSummary,
}

pub struct Session {
    config: EscapeConfig,
    seed: u64,
    rng: ChaCha8Rng,
    world: WorldGraph,
    belief: BeliefState,
    pathfinder: Pathfinder,
    guard: AdversaryController,
    agent: AgentState,
    exit: RoomId,
    total_keys: u32,
    turn: Turn,
    puzzles_encountered: u32,
    captured: bool,
}

impl Session {
    /// Generate a map and start a session; an unseeded config draws a random seed
    pub fn new(config: EscapeConfig) -> Result<Self> {
        config.validate()?;
        let seed = config.map.seed.unwrap_or_else(rand::random);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let map = generate_map(&config.map, &config.puzzle, &mut rng)?;
        Self::from_map(config, map, seed, rng)
    }

    /// Start a session on a prepared map
    pub fn from_map(
        config: EscapeConfig,
        map: GeneratedMap,
        seed: u64,
        rng: ChaCha8Rng,
    ) -> Result<Self> {
        config.validate()?;
        map.world.ensure(map.start)?;
        map.world.ensure(map.exit)?;

        let mut belief = BeliefState::new(&map.world, config.belief.clone())?;
        let pathfinder = Pathfinder::new(config.pathfinding.clone())?;
        map.world.ensure(map.guard_start)?;
        let guard = AdversaryController::new(config.guard.clone(), map.guard_start)?;

        // The agent stands in the start room, so its hazard state is known
        let start_trapped = map.world.is_trapped(map.start)?;
        belief.observe(map.start, start_trapped)?;
        belief.propagate(&map.world, map.start)?;

        tracing::info!(
            seed,
            rooms = map.world.room_count(),
            start = %map.start,
            exit = %map.exit,
            guard = %map.guard_start,
            keys = map.total_keys,
            "session started"
        );

        Ok(Self {
            agent: AgentState::new(map.start, config.agent.health),
            config,
            seed,
            rng,
            world: map.world,
            belief,
            pathfinder,
            guard,
            exit: map.exit,
            total_keys: map.total_keys,
            turn: 0,
            puzzles_encountered: 0,
            captured: false,
        })
    }

    pub fn config(&self) -> &EscapeConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn world(&self) -> &WorldGraph {
        &self.world
    }

    pub fn belief(&self) -> &BeliefState {
        &self.belief
    }

    pub fn guard(&self) -> &AdversaryController {
        &self.guard
    }

    pub fn agent(&self) -> &AgentState {
        &self.agent
    }

    pub fn turn(&self) -> Turn {
        self.turn
    }

    pub fn exit(&self) -> RoomId {
        self.exit
    }

    pub fn total_keys(&self) -> u32 {
        self.total_keys
    }

    pub fn keys_remaining(&self) -> u32 {
        self.total_keys.saturating_sub(self.agent.keys.len() as u32)
    }

    fn ensure_running(&self) -> Result<()> {
        if self.outcome().is_over() {
            Err(EscapeError::SessionOver)
        } else {
            Ok(())
        }
    }

    /// Move the agent through an open door into an adjacent room
    ///
    /// Entering a room reveals its hazard state: the belief is updated and
    /// propagated, a live trap deals damage, and any key is picked up.
    pub fn move_agent(&mut self, to: RoomId) -> Result<MoveReport> {
        self.ensure_running()?;
        let from = self.agent.room;
        if !self.world.neighbors(from, Traversal::Unlocked)?.contains(&to) {
            return Err(EscapeError::IllegalMove { from, to });
        }

        self.agent.room = to;
        self.agent.moves_made += 1;
        self.agent.visited.insert(to);

        let hazard = self.world.is_trapped(to)?;
        let trap_triggered = self.world.trigger_trap(to)?;
        let damage = if trap_triggered {
            self.config.agent.trap_damage.min(self.agent.health)
        } else {
            0
        };
        if trap_triggered {
            self.agent.health -= damage;
            self.agent.traps_triggered += 1;
            tracing::info!(room = %to, damage, health = self.agent.health, "trap triggered");
        }

        let p_trap = self.belief.observe(to, hazard)?;
        let propagated = self.belief.propagate(&self.world, to)?;

        let key = self.world.collect_key(to)?;
        if let Some(key) = key {
            self.agent.keys.insert(key);
            tracing::info!(
                room = %to,
                ?key,
                collected = self.agent.keys.len(),
                total = self.total_keys,
                "key collected"
            );
        }

        if self.guard.captured(to) {
            self.captured = true;
            tracing::info!(room = %to, "agent walked into the guard");
        }

        tracing::debug!(%from, %to, p_trap, propagated, "agent moved");
        Ok(MoveReport {
            from,
            to,
            trap_triggered,
            damage,
            key,
            p_trap,
            propagated,
        })
    }

    /// Solve the puzzle on every locked door of the current room and unlock it
    ///
    /// Doors generated without a puzzle get one at the configured difficulty.
    pub fn solve_puzzles_here(&mut self) -> Result<Vec<PuzzleReport>> {
        self.ensure_running()?;
        let room = self.agent.room;
        let doors: Vec<(RoomId, Option<Difficulty>)> = self
            .world
            .locked_doors_from(room)?
            .into_iter()
            .map(|door| (door.other(room), door.puzzle))
            .collect();

        let mut reports = Vec::with_capacity(doors.len());
        for (other, assigned) in doors {
            let encountered = self.puzzles_encountered;
            let difficulty =
                assigned.unwrap_or_else(|| self.config.puzzle.difficulty.resolve(encountered));
            let puzzle = Puzzle::generate(difficulty, &mut self.rng);
            self.puzzles_encountered += 1;

            let mut solver = CspSolver::new();
            let solution = solver.solve(&puzzle)?;
            self.world.unlock(room, other)?;
            self.agent.puzzles_solved += 1;
            tracing::info!(
                %room,
                %other,
                ?difficulty,
                nodes = solver.stats().nodes_expanded,
                "puzzle solved, door unlocked"
            );

            reports.push(PuzzleReport {
                door: (room, other),
                difficulty,
                solution,
                stats: solver.stats(),
            });
        }
        Ok(reports)
    }

    /// Route from the agent to `target` with the configured algorithm and lock policy
    pub fn plan_route(&self, target: RoomId) -> Result<PathResult> {
        self.plan_route_with(target, self.config.pathfinding.algorithm, self.pathfinder.mode())
    }

    pub fn plan_route_with(
        &self,
        target: RoomId,
        algorithm: PathAlgorithm,
        mode: PlanMode,
    ) -> Result<PathResult> {
        self.pathfinder.find_path_with(
            &self.world,
            &self.belief,
            self.agent.room,
            target,
            algorithm,
            mode,
        )
    }

    /// Route to the nearest uncollected key; `None` once every key is held
    pub fn nearest_key_route(&self) -> Result<Option<PathResult>> {
        self.nearest_key_route_with(self.config.pathfinding.algorithm, self.pathfinder.mode())
    }

    pub fn nearest_key_route_with(
        &self,
        algorithm: PathAlgorithm,
        mode: PlanMode,
    ) -> Result<Option<PathResult>> {
        let targets: Vec<RoomId> =
            self.world.key_rooms().into_iter().map(|(room, _)| room).collect();
        if targets.is_empty() {
            return Ok(None);
        }
        self.pathfinder
            .find_nearest_with(
                &self.world,
                &self.belief,
                self.agent.room,
                &targets,
                algorithm,
                mode,
            )
            .map(Some)
    }

    pub fn escape_route(&self) -> Result<PathResult> {
        self.plan_route(self.exit)
    }

    /// Close the agent's turn: the guard moves and detection is checked
    pub fn end_turn(&mut self) -> Result<TurnReport> {
        self.ensure_running()?;
        self.turn += 1;

        let guard_from = self.guard.room();
        let guard_to = self.guard.choose_move(&self.world, self.agent.room)?;
        let captured = self.guard.captured(self.agent.room);
        let detected =
            self.guard.is_enabled() && self.guard.detected(&self.world, self.agent.room)?;
        if captured {
            self.captured = true;
            tracing::info!(room = %self.agent.room, turn = self.turn, "agent captured");
        } else if detected {
            tracing::info!(
                guard = %guard_to,
                agent = %self.agent.room,
                "guard has spotted the agent"
            );
        }

        Ok(TurnReport {
            turn: self.turn,
            guard_from,
            guard_to,
            detected,
            captured,
        })
    }

    pub fn outcome(&self) -> Outcome {
        if !self.agent.is_alive() {
            return Outcome::Defeat {
                reason: DefeatReason::Exhausted,
            };
        }
        if self.keys_remaining() == 0 && self.agent.room == self.exit {
            return Outcome::Victory;
        }
        if self.captured {
            return Outcome::Defeat {
                reason: DefeatReason::Captured,
            };
        }
        if self.turn >= self.config.agent.max_turns {
            return Outcome::Defeat {
                reason: DefeatReason::OutOfTurns,
            };
        }
        Outcome::InProgress
    }

    pub fn is_over(&self) -> bool {
        self.outcome().is_over()
    }

    pub fn report(&self) -> SessionReport {
        SessionReport {
            seed: self.seed,
            outcome: self.outcome(),
            turns: self.turn,
            max_turns: self.config.agent.max_turns,
            moves_made: self.agent.moves_made,
            health: self.agent.health,
            max_health: self.config.agent.health,
            keys_collected: self.agent.keys.len(),
            total_keys: self.total_keys,
            rooms_visited: self.agent.visited.len(),
            room_count: self.world.room_count(),
            traps_triggered: self.agent.traps_triggered,
            puzzles_solved: self.agent.puzzles_solved,
            algorithm: self.config.pathfinding.algorithm,
            guard: self.guard.report(),
            beliefs: self.belief.summary(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::Room;

    /// Chain 0-1-2-3 with a key in 1, a trap in 2 and the exit at 3
    fn corridor() -> GeneratedMap {
        let mut world = WorldGraph::new();
        world.add_room(Room::new(RoomId(0), "Start"));
        world.add_room(Room::new(RoomId(1), "Vault").with_key(KeyId(0)));
        world.add_room(Room::new(RoomId(2), "Crypt").with_trap());
        world.add_room(Room::new(RoomId(3), "Exit").with_exit());
        for i in 0..3 {
            world.connect(RoomId(i), RoomId(i + 1), false).unwrap();
        }
        GeneratedMap {
            world,
            start: RoomId(0),
            exit: RoomId(3),
            guard_start: RoomId(3),
            total_keys: 1,
        }
    }

    fn peaceful() -> EscapeConfig {
        let mut config = EscapeConfig::default();
        config.guard.enabled = false;
        config
    }

    fn session(config: EscapeConfig) -> Session {
        Session::from_map(config, corridor(), 7, ChaCha8Rng::seed_from_u64(7)).unwrap()
    }

    #[test]
    fn test_start_room_is_verified() {
        let session = session(peaceful());
        assert!(session.belief().is_verified(RoomId(0)).unwrap());
        assert_eq!(session.belief().probability(RoomId(0)).unwrap(), 0.0);
        assert_eq!(session.outcome(), Outcome::InProgress);
    }

    #[test]
    fn test_move_collects_key_and_springs_trap() {
        let mut session = session(peaceful());

        let report = session.move_agent(RoomId(1)).unwrap();
        assert_eq!(report.key, Some(KeyId(0)));
        assert_eq!(session.keys_remaining(), 0);

        let report = session.move_agent(RoomId(2)).unwrap();
        assert!(report.trap_triggered);
        assert_eq!(report.damage, 20);
        assert_eq!(report.p_trap, 1.0);
        assert_eq!(session.agent().health, 80);

        session.move_agent(RoomId(3)).unwrap();
        assert_eq!(session.outcome(), Outcome::Victory);
        assert!(matches!(session.move_agent(RoomId(2)), Err(EscapeError::SessionOver)));
    }

    #[test]
    fn test_illegal_move() {
        let mut session = session(peaceful());
        assert!(matches!(
            session.move_agent(RoomId(2)),
            Err(EscapeError::IllegalMove { from: RoomId(0), to: RoomId(2) })
        ));
    }

    #[test]
    fn test_exit_without_keys_is_not_victory() {
        let mut map = corridor();
        map.world.connect(RoomId(0), RoomId(3), false).unwrap();
        let mut session =
            Session::from_map(peaceful(), map, 1, ChaCha8Rng::seed_from_u64(1)).unwrap();

        session.move_agent(RoomId(3)).unwrap();
        assert_eq!(session.outcome(), Outcome::InProgress);
    }

    #[test]
    fn test_solving_puzzle_unlocks_door() {
        let mut map = corridor();
        map.world.connect_with_puzzle(RoomId(0), RoomId(3), Difficulty::Hard).unwrap();
        let mut session =
            Session::from_map(peaceful(), map, 1, ChaCha8Rng::seed_from_u64(1)).unwrap();

        let blocked = session
            .plan_route_with(RoomId(3), PathAlgorithm::Bfs, PlanMode::Unlocked)
            .unwrap();
        assert_eq!(blocked.hops(), 3);

        let reports = session.solve_puzzles_here().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].difficulty, Difficulty::Hard);
        assert!(!session.world().is_locked(RoomId(0), RoomId(3)).unwrap());
        assert_eq!(session.agent().puzzles_solved, 1);
        assert!(session.solve_puzzles_here().unwrap().is_empty());
    }

    #[test]
    fn test_guard_capture_ends_session() {
        let mut session = session(EscapeConfig::default());
        session.move_agent(RoomId(1)).unwrap();
        session.move_agent(RoomId(2)).unwrap();

        // Guard at 3 steps onto the agent
        let report = session.end_turn().unwrap();
        assert!(report.captured);
        assert_eq!(
            session.outcome(),
            Outcome::Defeat {
                reason: DefeatReason::Captured
            }
        );
    }

    #[test]
    fn test_trap_damage_can_exhaust_the_agent() {
        let mut config = peaceful();
        config.agent.health = 20;
        let mut session = session(config);
        session.move_agent(RoomId(1)).unwrap();

        let report = session.move_agent(RoomId(2)).unwrap();
        assert_eq!(report.damage, 20);
        assert_eq!(session.agent().health, 0);
        assert_eq!(
            session.outcome(),
            Outcome::Defeat {
                reason: DefeatReason::Exhausted
            }
        );
        assert!(matches!(session.end_turn(), Err(EscapeError::SessionOver)));
    }

    #[test]
    fn test_guard_detects_without_capturing() {
        let mut config = EscapeConfig::default();
        config.guard.vision_range = 1;
        let mut map = corridor();
        map.guard_start = RoomId(2);
        let mut session =
            Session::from_map(config, map, 1, ChaCha8Rng::seed_from_u64(1)).unwrap();

        let report = session.end_turn().unwrap();
        assert_eq!(report.guard_from, RoomId(2));
        assert_eq!(report.guard_to, RoomId(1));
        assert!(report.detected);
        assert!(!report.captured);
        assert_eq!(session.outcome(), Outcome::InProgress);
    }

    #[test]
    fn test_walking_into_the_guard_is_capture() {
        let mut map = corridor();
        map.guard_start = RoomId(1);
        let config = EscapeConfig::default();
        let mut session =
            Session::from_map(config, map, 1, ChaCha8Rng::seed_from_u64(1)).unwrap();

        session.move_agent(RoomId(1)).unwrap();
        assert_eq!(session.turn(), 0);
        assert_eq!(
            session.outcome(),
            Outcome::Defeat {
                reason: DefeatReason::Captured
            }
        );
    }

    #[test]
    fn test_turn_limit() {
        let mut config = peaceful();
        config.agent.max_turns = 2;
        let mut session = session(config);
        session.end_turn().unwrap();
        session.end_turn().unwrap();
        assert_eq!(
            session.outcome(),
            Outcome::Defeat {
                reason: DefeatReason::OutOfTurns
            }
        );
        assert!(matches!(session.end_turn(), Err(EscapeError::SessionOver)));
    }

    #[test]
    fn test_generated_session_is_reproducible() {
        let mut config = EscapeConfig::default();
        config.map.seed = Some(99);
        let a = Session::new(config.clone()).unwrap();
        let b = Session::new(config).unwrap();
        assert_eq!(a.seed(), 99);
        assert_eq!(a.guard().room(), b.guard().room());
        assert_eq!(a.world().key_rooms(), b.world().key_rooms());
    }
}
