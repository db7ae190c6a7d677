//! Game configuration with documented defaults
//!
//! Every section deserializes from TOML with `#[serde(default)]`, so a config
//! file only needs the values it overrides. Each section validates itself;
//! the components that own a section call its `validate` at construction time.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::adversary::GuardTraversal;
use crate::core::error::{EscapeError, Result};
use crate::pathfinding::PathAlgorithm;
use crate::puzzle::DifficultySetting;

/// Map size presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapSize {
    Small,
    Medium,
    Large,
}

impl MapSize {
    pub fn room_count(self) -> u32 {
        match self {
            MapSize::Small => 6,
            MapSize::Medium => 12,
            MapSize::Large => 24,
        }
    }
}

impl Default for MapSize {
    fn default() -> Self {
        Self::Medium
    }
}

/// Map generation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub size: MapSize,
    /// Keys the agent must collect before the exit counts
    pub num_keys: u32,
    /// Hidden traps (rooms holding keys are skipped, so fewer may be placed)
    pub num_traps: u32,
    /// Chance that an extra (non-chain) door is generated locked
    pub lock_chance: f64,
    /// Fixed seed for reproducible maps; random when absent
    pub seed: Option<u64>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            size: MapSize::default(),
            num_keys: 3,
            num_traps: 4,
            lock_chance: 0.4,
            seed: None,
        }
    }
}

impl MapConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.lock_chance) {
            return Err(EscapeError::InvalidConfig(format!(
                "map.lock_chance ({}) must be within [0, 1]",
                self.lock_chance
            )));
        }
        // Start and exit never hold keys
        let interior = self.size.room_count().saturating_sub(2);
        if self.num_keys > interior {
            return Err(EscapeError::InvalidConfig(format!(
                "map.num_keys ({}) exceeds the {} interior rooms of a {:?} map",
                self.num_keys, interior, self.size
            )));
        }
        Ok(())
    }
}

/// Bayesian hazard belief parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BeliefConfig {
    /// Uniform prior that any room is trapped
    pub prior: f64,
    /// P(sensor says hazard | hazard) for noisy observations
    pub reliability: f64,
    /// Fraction a neighbor moves toward an observed room's posterior
    pub correlation: f64,
}

impl Default for BeliefConfig {
    fn default() -> Self {
        Self {
            prior: 0.2,
            reliability: 0.9,
            correlation: 0.3,
        }
    }
}

impl BeliefConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("belief.prior", self.prior),
            ("belief.reliability", self.reliability),
            ("belief.correlation", self.correlation),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(EscapeError::InvalidConfig(format!(
                    "{} ({}) must be within [0, 1]",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Guard (adversary) parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    pub enabled: bool,
    /// Minimax plies, counting the guard's own move
    pub depth: i32,
    /// Rooms within which the guard detects the agent
    pub vision_range: u32,
    pub traversal: GuardTraversal,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            depth: 3,
            vision_range: 3,
            traversal: GuardTraversal::default(),
        }
    }
}

impl GuardConfig {
    pub fn validate(&self) -> Result<()> {
        if self.depth < 1 {
            return Err(EscapeError::InvalidConfig(format!(
                "guard.depth ({}) must be a positive integer",
                self.depth
            )));
        }
        Ok(())
    }
}

/// Pathfinding parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathfindingConfig {
    pub algorithm: PathAlgorithm,
    /// Surcharge per unit of destination hazard probability
    pub risk_weight: f64,
    /// Added cost for crossing a locked door when planning through locks
    pub puzzle_cost: f64,
    /// Plan through locked doors instead of treating them as walls
    pub consider_locked: bool,
}

impl Default for PathfindingConfig {
    fn default() -> Self {
        Self {
            algorithm: PathAlgorithm::AStar,
            risk_weight: 10.0,
            puzzle_cost: 3.0,
            consider_locked: false,
        }
    }
}

impl PathfindingConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.risk_weight.is_finite() || self.risk_weight < 0.0 {
            return Err(EscapeError::InvalidConfig(format!(
                "pathfinding.risk_weight ({}) must be a non-negative number",
                self.risk_weight
            )));
        }
        if !self.puzzle_cost.is_finite() || self.puzzle_cost < 0.0 {
            return Err(EscapeError::InvalidConfig(format!(
                "pathfinding.puzzle_cost ({}) must be a non-negative number",
                self.puzzle_cost
            )));
        }
        Ok(())
    }
}

/// Agent and game-rule parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub health: u32,
    pub trap_damage: u32,
    pub max_turns: u32,
    /// Highest hazard probability the autopilot treats as safe to explore
    pub risk_tolerance: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            health: 100,
            trap_damage: 20,
            max_turns: 100,
            risk_tolerance: 0.3,
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.health == 0 {
            return Err(EscapeError::InvalidConfig("agent.health must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.risk_tolerance) {
            return Err(EscapeError::InvalidConfig(format!(
                "agent.risk_tolerance ({}) must be within [0, 1]",
                self.risk_tolerance
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PuzzleConfig {
    pub difficulty: DifficultySetting,
}

/// Complete configuration for one escape session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EscapeConfig {
    pub map: MapConfig,
    pub belief: BeliefConfig,
    pub guard: GuardConfig,
    pub pathfinding: PathfindingConfig,
    pub agent: AgentConfig,
    pub puzzle: PuzzleConfig,
}

impl EscapeConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: EscapeConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        tracing::debug!(path = %path.display(), "loaded escape config");
        Ok(config)
    }

    /// Validate every section for internal consistency
    pub fn validate(&self) -> Result<()> {
        self.map.validate()?;
        self.belief.validate()?;
        self.guard.validate()?;
        self.pathfinding.validate()?;
        self.agent.validate()?;
        Ok(())
    }
}
