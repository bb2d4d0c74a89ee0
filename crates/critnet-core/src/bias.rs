//! Bias-injection policies.
//!
//! A bias policy selects a subset of edges or nodes and applies an additive
//! perturbation. Three structured variants (edge weight, node firing
//! probability, Ising external field) plus the magnitude-matched uniform
//! control ("mimic") that perturbs *everything* by a calibrated shared delta.
//!
//! The mimic control exists to answer one question: does a structured
//! minority bias produce a distribution shape that a uniform shift of equal
//! mean cannot? If the two differ in skewness or variance at matched means,
//! that is the discriminating signal the comparison pipeline reports.
//!
//! Selections are drawn without replacement from a trial-scoped
//! [`RandomSource`], so a given seed reproduces the same selection. A
//! fraction that rounds to zero targets makes the policy a no-op; that is
//! surfaced with `log::warn!` because it silently invalidates any downstream
//! comparison against a supposedly-biased condition.

use log::{debug, warn};
use serde::Serialize;

use crate::error::ConfigError;
use crate::network::Network;
use crate::rng::{RandomSource, sample_indices};

// ---------------------------------------------------------------------------
// Conditions and selections
// ---------------------------------------------------------------------------

/// Perturbation regime of one simulation condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Condition {
    /// Unperturbed baseline.
    Classical,
    /// Structured minority bias, promoting propagation.
    QuantumPositive,
    /// Structured minority bias, suppressing propagation (veto).
    QuantumNegative,
    /// Uniform perturbation calibrated to match quantum-positive's mean.
    Mimic,
}

impl Condition {
    /// All four conditions in canonical run order. Mimic is last because its
    /// calibration target is the same trial's quantum-positive mean.
    pub const ALL: [Condition; 4] = [
        Condition::Classical,
        Condition::QuantumPositive,
        Condition::QuantumNegative,
        Condition::Mimic,
    ];
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Classical => write!(f, "classical"),
            Self::QuantumPositive => write!(f, "quantum_positive"),
            Self::QuantumNegative => write!(f, "quantum_negative"),
            Self::Mimic => write!(f, "mimic"),
        }
    }
}

/// An immutable record of which targets a policy perturbed and by how much.
#[derive(Debug, Clone, Serialize)]
pub struct BiasSelection {
    /// Edge or node indices, depending on the policy.
    pub targets: Vec<usize>,
    /// Signed additive strength applied to each target.
    pub strength: f64,
}

fn check_fraction(fraction: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&fraction) || fraction.is_nan() {
        return Err(ConfigError::InvalidFraction { fraction });
    }
    Ok(())
}

/// Round a selection fraction to a target count, warning when the policy
/// degenerates to a no-op.
fn selection_count(fraction: f64, total: usize, what: &str) -> usize {
    let count = (fraction * total as f64).round() as usize;
    if count == 0 && fraction > 0.0 {
        warn!("bias fraction {fraction} of {total} {what} rounds to zero targets; policy is a no-op");
    }
    count
}

// ---------------------------------------------------------------------------
// Edge-weight bias
// ---------------------------------------------------------------------------

/// Additive bias on a random subset of edge weights.
#[derive(Debug, Clone, Copy)]
pub struct EdgeBias {
    fraction: f64,
    delta: f64,
}

impl EdgeBias {
    /// Promote propagation: `+strength` on the selected edges.
    pub fn promote(fraction: f64, strength: f64) -> Result<Self, ConfigError> {
        check_fraction(fraction)?;
        Ok(Self {
            fraction,
            delta: strength,
        })
    }

    /// Veto propagation: `-strength` on the selected edges.
    pub fn veto(fraction: f64, strength: f64) -> Result<Self, ConfigError> {
        check_fraction(fraction)?;
        Ok(Self {
            fraction,
            delta: -strength,
        })
    }

    /// Select `round(fraction * E)` distinct edges and nudge their current
    /// weights. Does not reset the network first; callers reset between
    /// conditions.
    pub fn apply(&self, net: &mut Network, rng: &mut RandomSource) -> BiasSelection {
        let count = selection_count(self.fraction, net.n_edges(), "edges");
        let targets = sample_indices(rng, net.n_edges(), count);
        for &edge in &targets {
            net.nudge_edge(edge, self.delta);
        }
        BiasSelection {
            targets,
            strength: self.delta,
        }
    }
}

// ---------------------------------------------------------------------------
// Node firing-probability bias
// ---------------------------------------------------------------------------

/// Additive bias on per-node spontaneous firing probabilities.
///
/// Targets are either a uniform random subset or the top-degree hubs.
/// Probabilities are clamped to `[0, 1]` after the nudge; this clamp is the
/// one intentional silent correction in the crate.
#[derive(Debug, Clone, Copy)]
pub struct NodeFiringBias {
    fraction: f64,
    delta: f64,
    hub_targeted: bool,
}

impl NodeFiringBias {
    pub fn promote(fraction: f64, strength: f64) -> Result<Self, ConfigError> {
        check_fraction(fraction)?;
        Ok(Self {
            fraction,
            delta: strength,
            hub_targeted: false,
        })
    }

    pub fn veto(fraction: f64, strength: f64) -> Result<Self, ConfigError> {
        check_fraction(fraction)?;
        Ok(Self {
            fraction,
            delta: -strength,
            hub_targeted: false,
        })
    }

    /// Target the highest-degree nodes instead of a uniform random subset.
    pub fn hub_targeted(mut self) -> Self {
        self.hub_targeted = true;
        self
    }

    /// Nudge the selected nodes' probabilities in place.
    pub fn apply(
        &self,
        net: &Network,
        probabilities: &mut [f64],
        rng: &mut RandomSource,
    ) -> BiasSelection {
        let count = selection_count(self.fraction, net.n_nodes(), "nodes");
        let targets = if self.hub_targeted {
            net.hubs(count)
        } else {
            sample_indices(rng, net.n_nodes(), count)
        };
        for &node in &targets {
            probabilities[node] = (probabilities[node] + self.delta).clamp(0.0, 1.0);
        }
        BiasSelection {
            targets,
            strength: self.delta,
        }
    }
}

// ---------------------------------------------------------------------------
// Ising external-field bias
// ---------------------------------------------------------------------------

/// External-field vector builder for the activation sampler.
///
/// Structured modes put `±strength` on the selected nodes and zero elsewhere.
/// The mimic mode spreads the same total field magnitude across *all* nodes
/// with random signs, so the aggregate push matches while the structure does
/// not.
#[derive(Debug, Clone, Copy)]
pub struct IsingFieldBias {
    fraction: f64,
    strength: f64,
    hub_targeted: bool,
}

impl IsingFieldBias {
    pub fn new(fraction: f64, strength: f64) -> Result<Self, ConfigError> {
        check_fraction(fraction)?;
        Ok(Self {
            fraction,
            strength,
            hub_targeted: true,
        })
    }

    /// Select targets uniformly at random instead of by degree.
    pub fn uniform_targets(mut self) -> Self {
        self.hub_targeted = false;
        self
    }

    /// Field vector with `sign * strength` on the selected nodes.
    pub fn fields(
        &self,
        net: &Network,
        sign: f64,
        rng: &mut RandomSource,
    ) -> (Vec<f64>, BiasSelection) {
        let count = selection_count(self.fraction, net.n_nodes(), "nodes");
        let targets = if self.hub_targeted {
            net.hubs(count)
        } else {
            sample_indices(rng, net.n_nodes(), count)
        };
        let mut fields = vec![0.0; net.n_nodes()];
        let delta = sign * self.strength;
        for &node in &targets {
            fields[node] = delta;
        }
        (
            fields,
            BiasSelection {
                targets,
                strength: delta,
            },
        )
    }

    /// Random-sign field over all nodes, normalized so the summed absolute
    /// magnitude equals what the structured variant would apply.
    pub fn mimic_fields(&self, net: &Network, rng: &mut RandomSource) -> Vec<f64> {
        let count = selection_count(self.fraction, net.n_nodes(), "nodes");
        let total = self.strength * count as f64;
        let mut fields: Vec<f64> = (0..net.n_nodes())
            .map(|_| crate::rng::sample_normal(rng, 0.0, 1.0))
            .collect();
        let sum_abs: f64 = fields.iter().map(|h| h.abs()).sum();
        if sum_abs > 0.0 {
            for h in &mut fields {
                *h *= total / sum_abs;
            }
        }
        fields
    }
}

// ---------------------------------------------------------------------------
// Mimic calibration
// ---------------------------------------------------------------------------

/// Bounded fixed-point search parameters for the mimic condition. The
/// iteration cap, step size, and boost ceiling are explicit configuration,
/// not embedded constants.
#[derive(Debug, Clone, Copy)]
pub struct MimicCalibration {
    /// Boost increment per refinement step.
    pub step: f64,
    /// Ceiling on the uniform boost.
    pub max_boost: f64,
    /// Maximum number of refinement steps.
    pub max_iters: usize,
    /// Relative tolerance: the search stops once the measured mean is within
    /// `tolerance * target` below the target.
    pub tolerance: f64,
}

impl Default for MimicCalibration {
    fn default() -> Self {
        Self {
            step: 0.02,
            max_boost: 0.15,
            max_iters: 5,
            tolerance: 0.01,
        }
    }
}

/// Result of a mimic calibration run: the boost that was settled on and the
/// avalanche sizes measured at that boost.
#[derive(Debug, Clone)]
pub struct MimicOutcome {
    pub boost: f64,
    pub sizes: Vec<u64>,
    pub mean: f64,
}

/// Calibrate a uniform boost until the measured mean reaches `target_mean`
/// or the search budget runs out. `measure` is called with the candidate
/// boost and returns the avalanche sizes observed at that boost; callers
/// decide what "uniform boost" means for their state space (edge weights or
/// firing probabilities).
///
/// If `target_mean` is unreachable within `max_boost` this returns the best
/// effort rather than failing: a mimic that undershoots is still a valid
/// control, and the matched-mean t-test downstream will report the mismatch.
pub fn calibrate_mimic(
    cal: &MimicCalibration,
    target_mean: f64,
    mut measure: impl FnMut(f64) -> Vec<u64>,
) -> MimicOutcome {
    let mut boost = 0.0;
    let mut sizes = measure(boost);
    let mut mean = mean_of(&sizes);
    let goal = target_mean * (1.0 - cal.tolerance);
    for iter in 0..cal.max_iters {
        if mean >= goal || boost + cal.step > cal.max_boost {
            break;
        }
        boost += cal.step;
        sizes = measure(boost);
        mean = mean_of(&sizes);
        debug!("mimic calibration step {iter}: boost={boost:.3}, mean={mean:.2}, target={target_mean:.2}");
    }
    MimicOutcome { boost, sizes, mean }
}

fn mean_of(sizes: &[u64]) -> f64 {
    if sizes.is_empty() {
        return 0.0;
    }
    sizes.iter().sum::<u64>() as f64 / sizes.len() as f64
}
