//! Constraint-satisfaction puzzles guarding locked doors
//!
//! Puzzles are plain data: variables, integer domains and declarative
//! constraints. The orchestrator generates one when the agent works a locked
//! door and hands it to [`CspSolver`]; the world only sees the resulting unlock.

pub mod solver;

use std::collections::BTreeMap;
use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub use solver::{CspSolver, SolverStats};

/// A (possibly partial) variable assignment
pub type Assignment = BTreeMap<String, i32>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// Configured puzzle difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultySetting {
    Easy,
    Medium,
    Hard,
    /// First puzzle easy, the next two medium, hard afterwards
    Progressive,
}

impl Default for DifficultySetting {
    fn default() -> Self {
        Self::Progressive
    }
}

impl DifficultySetting {
    /// Difficulty of the next puzzle after `encountered` earlier ones
    pub fn resolve(self, encountered: u32) -> Difficulty {
        match self {
            DifficultySetting::Easy => Difficulty::Easy,
            DifficultySetting::Medium => Difficulty::Medium,
            DifficultySetting::Hard => Difficulty::Hard,
            DifficultySetting::Progressive => match encountered {
                0 => Difficulty::Easy,
                1 | 2 => Difficulty::Medium,
                _ => Difficulty::Hard,
            },
        }
    }
}

/// A declarative constraint over named variables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constraint {
    SumEquals { vars: Vec<String>, target: i32 },
    ProductEquals { vars: Vec<String>, target: i32 },
    AllDifferent(Vec<String>),
    LessThan(String, String),
    LessOrEqual(String, String),
}

impl Constraint {
    /// Check against a partial assignment
    ///
    /// Constraints whose variables are not all assigned yet are treated as
    /// satisfied, except all-different which checks the assigned subset.
    pub fn is_satisfied(&self, assignment: &Assignment) -> bool {
        match self {
            Constraint::SumEquals { vars, target } => {
                values(vars, assignment).map_or(true, |v| v.iter().sum::<i32>() == *target)
            }
            Constraint::ProductEquals { vars, target } => {
                values(vars, assignment).map_or(true, |v| v.iter().product::<i32>() == *target)
            }
            Constraint::AllDifferent(vars) => {
                let assigned: Vec<i32> =
                    vars.iter().filter_map(|v| assignment.get(v)).copied().collect();
                assigned
                    .iter()
                    .enumerate()
                    .all(|(i, value)| !assigned[i + 1..].contains(value))
            }
            Constraint::LessThan(a, b) => match (assignment.get(a), assignment.get(b)) {
                (Some(x), Some(y)) => x < y,
                _ => true,
            },
            Constraint::LessOrEqual(a, b) => match (assignment.get(a), assignment.get(b)) {
                (Some(x), Some(y)) => x <= y,
                _ => true,
            },
        }
    }
}

fn values(vars: &[String], assignment: &Assignment) -> Option<Vec<i32>> {
    vars.iter().map(|v| assignment.get(v).copied()).collect()
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::SumEquals { vars, target } => {
                write!(f, "{} = {}", vars.join(" + "), target)
            }
            Constraint::ProductEquals { vars, target } => {
                write!(f, "{} = {}", vars.join(" × "), target)
            }
            Constraint::AllDifferent(vars) => write!(f, "{} all different", vars.join(", ")),
            Constraint::LessThan(a, b) => write!(f, "{} < {}", a, b),
            Constraint::LessOrEqual(a, b) => write!(f, "{} ≤ {}", a, b),
        }
    }
}

/// A door puzzle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Puzzle {
    pub difficulty: Difficulty,
    pub variables: Vec<String>,
    pub domains: BTreeMap<String, Vec<i32>>,
    pub constraints: Vec<Constraint>,
}

// (W×X, Y+Z) targets with an all-different solution in 1..=6 and W ≤ X
const HARD_COMBINATIONS: [(i32, i32); 4] = [(12, 6), (10, 7), (15, 5), (20, 4)];

impl Puzzle {
    /// Build a puzzle whose every variable ranges over `1..=max`
    pub fn new(
        difficulty: Difficulty,
        variables: &[&str],
        max: i32,
        constraints: Vec<Constraint>,
    ) -> Self {
        let variables: Vec<String> = variables.iter().map(|v| v.to_string()).collect();
        let domains = variables.iter().map(|v| (v.clone(), (1..=max).collect())).collect();
        Self {
            difficulty,
            variables,
            domains,
            constraints,
        }
    }

    /// Generate a random puzzle of the given difficulty
    pub fn generate<R: Rng + ?Sized>(difficulty: Difficulty, rng: &mut R) -> Self {
        let names = |vars: &[&str]| -> Vec<String> { vars.iter().map(|v| v.to_string()).collect() };
        match difficulty {
            Difficulty::Easy => {
                let target = rng.gen_range(4..=7);
                Self::new(
                    difficulty,
                    &["X", "Y"],
                    4,
                    vec![
                        Constraint::SumEquals {
                            vars: names(&["X", "Y"]),
                            target,
                        },
                        Constraint::AllDifferent(names(&["X", "Y"])),
                    ],
                )
            }
            Difficulty::Medium => {
                let target = rng.gen_range(8..=12);
                Self::new(
                    difficulty,
                    &["A", "B", "C"],
                    5,
                    vec![
                        Constraint::SumEquals {
                            vars: names(&["A", "B", "C"]),
                            target,
                        },
                        Constraint::AllDifferent(names(&["A", "B", "C"])),
                        Constraint::LessThan("A".into(), "B".into()),
                    ],
                )
            }
            Difficulty::Hard => {
                let (product, sum) =
                    *HARD_COMBINATIONS.choose(rng).unwrap_or(&HARD_COMBINATIONS[0]);
                Self::new(
                    difficulty,
                    &["W", "X", "Y", "Z"],
                    6,
                    vec![
                        Constraint::ProductEquals {
                            vars: names(&["W", "X"]),
                            target: product,
                        },
                        Constraint::SumEquals {
                            vars: names(&["Y", "Z"]),
                            target: sum,
                        },
                        Constraint::AllDifferent(names(&["W", "X", "Y", "Z"])),
                        Constraint::LessOrEqual("W".into(), "X".into()),
                    ],
                )
            }
        }
    }

    /// Does the assignment satisfy every constraint so far?
    pub fn is_consistent(&self, assignment: &Assignment) -> bool {
        self.constraints.iter().all(|c| c.is_satisfied(assignment))
    }

    /// Check a complete candidate solution
    pub fn verify(&self, assignment: &Assignment) -> bool {
        if assignment.len() != self.variables.len() {
            return false;
        }
        let in_domain = self.variables.iter().all(|var| {
            match (assignment.get(var), self.domains.get(var)) {
                (Some(value), Some(domain)) => domain.contains(value),
                _ => false,
            }
        });
        in_domain && self.is_consistent(assignment)
    }

    pub fn description(&self) -> String {
        let mut lines = vec![format!(
            "[{:?} puzzle] Find {}",
            self.difficulty,
            self.variables.join(", ")
        )];
        for constraint in &self.constraints {
            lines.push(format!("  - {}", constraint));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_progressive_difficulty() {
        let setting = DifficultySetting::Progressive;
        assert_eq!(setting.resolve(0), Difficulty::Easy);
        assert_eq!(setting.resolve(1), Difficulty::Medium);
        assert_eq!(setting.resolve(2), Difficulty::Medium);
        assert_eq!(setting.resolve(3), Difficulty::Hard);
        assert_eq!(DifficultySetting::Easy.resolve(9), Difficulty::Easy);
    }

    #[test]
    fn test_partial_assignment_is_consistent() {
        let puzzle = Puzzle::new(
            Difficulty::Easy,
            &["X", "Y"],
            4,
            vec![Constraint::SumEquals {
                vars: vec!["X".into(), "Y".into()],
                target: 5,
            }],
        );
        let mut assignment = Assignment::new();
        assignment.insert("X".into(), 4);
        assert!(puzzle.is_consistent(&assignment));
        assignment.insert("Y".into(), 4);
        assert!(!puzzle.is_consistent(&assignment));
    }

    #[test]
    fn test_all_different_checks_assigned_subset() {
        let constraint = Constraint::AllDifferent(vec!["A".into(), "B".into(), "C".into()]);
        let mut assignment = Assignment::new();
        assignment.insert("A".into(), 2);
        assignment.insert("C".into(), 2);
        assert!(!constraint.is_satisfied(&assignment));
    }

    #[test]
    fn test_verify_rejects_out_of_domain() {
        let puzzle = Puzzle::new(Difficulty::Easy, &["X"], 4, vec![]);
        let mut assignment = Assignment::new();
        assignment.insert("X".into(), 9);
        assert!(!puzzle.verify(&assignment));
    }

    #[test]
    fn test_generated_shapes() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        assert_eq!(Puzzle::generate(Difficulty::Easy, &mut rng).variables.len(), 2);
        assert_eq!(Puzzle::generate(Difficulty::Medium, &mut rng).variables.len(), 3);
        let hard = Puzzle::generate(Difficulty::Hard, &mut rng);
        assert_eq!(hard.variables.len(), 4);
        assert!(hard.description().contains("W × X"));
    }
}
