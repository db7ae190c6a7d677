//! Bayes' rule for a binary hazard hypothesis

/// Likelihood of a piece of evidence under each hypothesis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Likelihood {
    /// P(evidence | hazard)
    pub given_hazard: f64,
    /// P(evidence | clear)
    pub given_clear: f64,
}

impl Likelihood {
    pub fn new(given_hazard: f64, given_clear: f64) -> Self {
        Self {
            given_hazard,
            given_clear,
        }
    }

    /// Ground-truth evidence: entering a room reveals its hazard with certainty
    pub fn authoritative(hazard_present: bool) -> Self {
        if hazard_present {
            Self::new(1.0, 0.0)
        } else {
            Self::new(0.0, 1.0)
        }
    }

    /// A sensor that reports correctly with probability `reliability`
    pub fn sensor(reliability: f64, hazard_indicated: bool) -> Self {
        if hazard_indicated {
            Self::new(reliability, 1.0 - reliability)
        } else {
            Self::new(1.0 - reliability, reliability)
        }
    }

    /// Evidence that pins the posterior to 0 or 1 regardless of the prior
    pub fn is_certain(&self) -> bool {
        self.given_hazard == 0.0 || self.given_clear == 0.0
    }
}

/// Posterior P(hazard | evidence)
///
/// `posterior = L(e|hazard)·prior / (L(e|hazard)·prior + L(e|clear)·(1 − prior))`
///
/// Returns `None` when the evidence has zero probability under the prior
/// (the normalizing constant vanishes).
pub fn posterior(prior: f64, likelihood: Likelihood) -> Option<f64> {
    let weighted_hazard = likelihood.given_hazard * prior;
    let normalizer = weighted_hazard + likelihood.given_clear * (1.0 - prior);
    if normalizer <= 0.0 || !normalizer.is_finite() {
        return None;
    }
    Some(weighted_hazard / normalizer)
}
