//! Bayesian belief over hazard locations
//!
//! Each room carries P(trap) and a `verified` flag. Entering a room is ground
//! truth, so authoritative observations pin the probability to exactly 0 or 1
//! and freeze it. Noisy sensor readings go through the same Bayes update with
//! a finite reliability and leave the room unverified.
//!
//! Propagation models hazard clustering: after an observation, unverified
//! neighbors move a fixed fraction toward the observed room's posterior.

pub mod bayes;

use std::collections::BTreeMap;

use ahash::AHashMap;
use serde::Serialize;

use crate::core::config::BeliefConfig;
use crate::core::error::{EscapeError, Result};
use crate::core::types::{RoomId, Traversal};
use crate::world::WorldGraph;

pub use bayes::{posterior, Likelihood};

/// Hazard estimate for a single room
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RoomBelief {
    pub p_trap: f64,
    pub verified: bool,
}

/// Coarse risk bands used for display and autopilot decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_probability(p: f64) -> Self {
        if p > 0.6 {
            RiskLevel::High
        } else if p > 0.3 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

/// Snapshot of the belief state grouped by risk band
#[derive(Debug, Clone, Default, Serialize)]
pub struct BeliefSummary {
    pub verified_safe: Vec<RoomId>,
    pub verified_trapped: Vec<RoomId>,
    pub high_risk: Vec<(RoomId, f64)>,
    pub medium_risk: Vec<(RoomId, f64)>,
    pub low_risk_count: usize,
}

#[derive(Debug, Clone)]
pub struct BeliefState {
    config: BeliefConfig,
    beliefs: BTreeMap<RoomId, RoomBelief>,
    /// Posterior last propagated from each source room
    propagated: AHashMap<RoomId, f64>,
}

impl BeliefState {
    /// Uniform prior over every room of the world
    pub fn new(world: &WorldGraph, config: BeliefConfig) -> Result<Self> {
        Self::with_rooms(world.room_ids(), config)
    }

    /// Uniform prior over an explicit set of rooms
    pub fn with_rooms(
        rooms: impl IntoIterator<Item = RoomId>,
        config: BeliefConfig,
    ) -> Result<Self> {
        config.validate()?;
        let prior = RoomBelief {
            p_trap: config.prior,
            verified: false,
        };
        Ok(Self {
            beliefs: rooms.into_iter().map(|room| (room, prior)).collect(),
            propagated: AHashMap::new(),
            config,
        })
    }

    pub fn config(&self) -> &BeliefConfig {
        &self.config
    }

    fn belief(&self, room: RoomId) -> Result<&RoomBelief> {
        self.beliefs.get(&room).ok_or(EscapeError::UnknownRoom(room))
    }

    fn belief_mut(&mut self, room: RoomId) -> Result<&mut RoomBelief> {
        self.beliefs.get_mut(&room).ok_or(EscapeError::UnknownRoom(room))
    }

    /// Current P(trap) for a room
    pub fn probability(&self, room: RoomId) -> Result<f64> {
        Ok(self.belief(room)?.p_trap)
    }

    pub fn is_verified(&self, room: RoomId) -> Result<bool> {
        Ok(self.belief(room)?.verified)
    }

    pub fn room_belief(&self, room: RoomId) -> Result<RoomBelief> {
        self.belief(room).copied()
    }

    /// Override the estimate of an unverified room (e.g. hand-tuned priors)
    ///
    /// Values outside `[0, 1]` are rejected, never clamped. Verified rooms
    /// keep their pinned value.
    pub fn set_probability(&mut self, room: RoomId, p: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&p) {
            return Err(EscapeError::ProbabilityOutOfRange { room, value: p });
        }
        let belief = self.belief_mut(room)?;
        if !belief.verified {
            belief.p_trap = p;
        }
        Ok(())
    }

    /// Authoritative observation: the agent entered the room
    ///
    /// Returns the room's probability after the update. Verified rooms are
    /// left untouched.
    pub fn observe(&mut self, room: RoomId, hazard_present: bool) -> Result<f64> {
        let belief = *self.belief(room)?;
        if belief.verified {
            if (belief.p_trap == 1.0) != hazard_present {
                tracing::warn!(
                    %room,
                    hazard_present,
                    "observation contradicts verified belief; ignored"
                );
            }
            return Ok(belief.p_trap);
        }

        let likelihood = Likelihood::authoritative(hazard_present);
        let p = match posterior(belief.p_trap, likelihood) {
            // Certain evidence yields an exact 0 or 1
            Some(p) => p.round(),
            None => {
                // Prior ruled the truth out entirely; ground truth wins
                tracing::warn!(
                    %room,
                    prior = belief.p_trap,
                    hazard_present,
                    "evidence contradicts a certain prior"
                );
                if hazard_present {
                    1.0
                } else {
                    0.0
                }
            }
        };

        let belief = self.belief_mut(room)?;
        belief.p_trap = p;
        belief.verified = true;
        tracing::debug!(%room, hazard_present, p, "room verified");
        Ok(p)
    }

    /// Noisy observation using the configured sensor reliability
    ///
    /// Keeps the room unverified. Fails with `DegenerateEvidence` if the
    /// reading is impossible under the current belief.
    pub fn observe_noisy(&mut self, room: RoomId, hazard_indicated: bool) -> Result<f64> {
        let reliability = self.config.reliability;
        self.observe_with(room, Likelihood::sensor(reliability, hazard_indicated))
    }

    /// General Bayes update with caller-supplied likelihoods
    pub fn observe_with(&mut self, room: RoomId, likelihood: Likelihood) -> Result<f64> {
        let belief = *self.belief(room)?;
        if belief.verified {
            return Ok(belief.p_trap);
        }
        let p = posterior(belief.p_trap, likelihood).ok_or(EscapeError::DegenerateEvidence(room))?;
        if !(0.0..=1.0).contains(&p) {
            return Err(EscapeError::ProbabilityOutOfRange { room, value: p });
        }
        self.belief_mut(room)?.p_trap = p;
        tracing::debug!(%room, p, "belief updated from sensor");
        Ok(p)
    }

    /// Spread an observation to neighboring rooms
    ///
    /// Each unverified neighbor (through any door, locked or not) moves a
    /// `correlation` fraction toward the source's posterior. Repeating the
    /// call with unchanged evidence is a no-op. Returns how many rooms moved.
    pub fn propagate(&mut self, world: &WorldGraph, room: RoomId) -> Result<usize> {
        let source = self.belief(room)?.p_trap;
        if self.propagated.get(&room) == Some(&source) {
            return Ok(0);
        }

        let correlation = self.config.correlation;
        let mut moved = 0;
        for neighbor in world.neighbors(room, Traversal::IncludeLocked)? {
            let Some(belief) = self.beliefs.get_mut(&neighbor) else {
                continue;
            };
            if belief.verified {
                continue;
            }
            let updated = (belief.p_trap + correlation * (source - belief.p_trap)).clamp(0.0, 1.0);
            if updated != belief.p_trap {
                belief.p_trap = updated;
                moved += 1;
            }
        }

        self.propagated.insert(room, source);
        tracing::debug!(%room, source, moved, "belief propagated");
        Ok(moved)
    }

    /// Probability that at least one room on the path (after the first) is trapped
    ///
    /// `1 − ∏(1 − p_i)`; monotonic in every `p_i`.
    pub fn risk_of_path(&self, rooms: &[RoomId]) -> Result<f64> {
        let mut survive = 1.0;
        for &room in rooms.iter().skip(1) {
            survive *= 1.0 - self.probability(room)?;
        }
        Ok((1.0 - survive).clamp(0.0, 1.0))
    }

    pub fn risk_level(&self, room: RoomId) -> Result<RiskLevel> {
        Ok(RiskLevel::from_probability(self.probability(room)?))
    }

    /// Up to `n` rooms with the lowest P(trap); unknown rooms sort last
    pub fn safest(&self, rooms: &[RoomId], n: usize) -> Vec<RoomId> {
        let mut ranked: Vec<(RoomId, f64)> = rooms
            .iter()
            .map(|&room| (room, self.probability(room).unwrap_or(1.0)))
            .collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        ranked.into_iter().take(n).map(|(room, _)| room).collect()
    }

    /// Up to `n` rooms with the highest P(trap); unknown rooms sort last
    pub fn riskiest(&self, rooms: &[RoomId], n: usize) -> Vec<RoomId> {
        let mut ranked: Vec<(RoomId, f64)> = rooms
            .iter()
            .map(|&room| (room, self.probability(room).unwrap_or(0.0)))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.into_iter().take(n).map(|(room, _)| room).collect()
    }

    pub fn summary(&self) -> BeliefSummary {
        let mut summary = BeliefSummary::default();
        for (&room, belief) in &self.beliefs {
            if belief.verified {
                if belief.p_trap == 1.0 {
                    summary.verified_trapped.push(room);
                } else {
                    summary.verified_safe.push(room);
                }
                continue;
            }
            match RiskLevel::from_probability(belief.p_trap) {
                RiskLevel::High => summary.high_risk.push((room, belief.p_trap)),
                RiskLevel::Medium => summary.medium_risk.push((room, belief.p_trap)),
                RiskLevel::Low => summary.low_risk_count += 1,
            }
        }
        summary.high_risk.sort_by(|a, b| b.1.total_cmp(&a.1));
        summary.medium_risk.sort_by(|a, b| b.1.total_cmp(&a.1));
        summary
    }
}
