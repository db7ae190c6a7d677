//! Backtracking CSP solver with minimum-remaining-values ordering

use serde::Serialize;

use crate::core::error::{EscapeError, Result};
use crate::puzzle::{Assignment, Puzzle};

/// Search statistics from the last solve
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SolverStats {
    pub nodes_expanded: u32,
    pub backtracks: u32,
}

#[derive(Debug, Default)]
pub struct CspSolver {
    stats: SolverStats,
}

impl CspSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> SolverStats {
        self.stats
    }

    /// Find a satisfying assignment, or `Unsatisfiable`
    pub fn solve(&mut self, puzzle: &Puzzle) -> Result<Assignment> {
        self.stats = SolverStats::default();
        let mut assignment = Assignment::new();
        let solved = self.backtrack(puzzle, &mut assignment);

        tracing::debug!(
            difficulty = ?puzzle.difficulty,
            nodes = self.stats.nodes_expanded,
            backtracks = self.stats.backtracks,
            solved,
            "csp search finished"
        );

        if solved {
            Ok(assignment)
        } else {
            Err(EscapeError::Unsatisfiable)
        }
    }

    fn backtrack(&mut self, puzzle: &Puzzle, assignment: &mut Assignment) -> bool {
        self.stats.nodes_expanded += 1;

        let Some(var) = select_unassigned(puzzle, assignment) else {
            return puzzle.is_consistent(assignment);
        };
        let domain = puzzle.domains.get(&var).cloned().unwrap_or_default();

        for value in domain {
            assignment.insert(var.clone(), value);
            if puzzle.is_consistent(assignment) && self.backtrack(puzzle, assignment) {
                return true;
            }
            self.stats.backtracks += 1;
            assignment.remove(&var);
        }

        false
    }
}

/// Unassigned variable with the fewest consistent values left
///
/// Ties go to the variable declared first.
fn select_unassigned(puzzle: &Puzzle, assignment: &Assignment) -> Option<String> {
    let mut best: Option<(usize, &String)> = None;
    for var in puzzle.variables.iter().filter(|v| !assignment.contains_key(*v)) {
        let remaining = remaining_values(puzzle, assignment, var);
        if best.map_or(true, |(count, _)| remaining < count) {
            best = Some((remaining, var));
        }
    }
    best.map(|(_, var)| var.clone())
}

fn remaining_values(puzzle: &Puzzle, assignment: &Assignment, var: &str) -> usize {
    let Some(domain) = puzzle.domains.get(var) else {
        return 0;
    };
    let mut probe = assignment.clone();
    domain
        .iter()
        .filter(|&&value| {
            probe.insert(var.to_string(), value);
            puzzle.is_consistent(&probe)
        })
        .count()
}
