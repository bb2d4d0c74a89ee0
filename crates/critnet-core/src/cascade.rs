//! Cascade propagation engine.
//!
//! Two propagation modes over the same weighted network, both deterministic
//! given a seed and the network state:
//!
//! - **Single-shot BFS** ([`SeedCascade`]): flood from one seed node across
//!   edges whose current weight exceeds the threshold; the avalanche size is
//!   the visited-node count.
//! - **Stepped stochastic** ([`SteppedCascade`]): advance a boolean
//!   activation mask over discrete steps. A node fires spontaneously with
//!   its firing probability, or by propagation when a neighbor was active on
//!   the previous step across a super-threshold edge. Refractory mode bars
//!   firing on consecutive steps. An optional epoch schedule alternates
//!   unbiased "coherent" sub-windows with biased "effect" sub-windows.
//!
//! Both modes are pure computations over already-validated state: the
//! threshold is checked once at construction, and a cascade that never
//! propagates is a valid small result, not an error.

use std::collections::VecDeque;

use rand::Rng;
use serde::Serialize;

use crate::error::ConfigError;
use crate::network::Network;
use crate::rng::RandomSource;

// ---------------------------------------------------------------------------
// Single-shot BFS cascades
// ---------------------------------------------------------------------------

/// BFS cascade runner with a fixed propagation threshold.
#[derive(Debug, Clone, Copy)]
pub struct SeedCascade {
    threshold: f64,
}

impl SeedCascade {
    pub fn new(threshold: f64) -> Result<Self, ConfigError> {
        if threshold <= 0.0 || threshold.is_nan() {
            return Err(ConfigError::InvalidThreshold { threshold });
        }
        Ok(Self { threshold })
    }

    #[inline]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Avalanche size from one seed: the number of nodes reached through
    /// super-threshold edges. A seed with no super-threshold neighbors
    /// yields size 1.
    pub fn size(&self, net: &Network, source: usize) -> u64 {
        let mut visited = vec![false; net.n_nodes()];
        let mut queue = VecDeque::new();
        queue.push_back(source as u32);
        let mut size = 0u64;

        while let Some(u) = queue.pop_front() {
            if visited[u as usize] {
                continue;
            }
            visited[u as usize] = true;
            size += 1;
            for &(v, edge) in net.neighbors(u as usize) {
                if !visited[v as usize] && net.weight(edge as usize) > self.threshold {
                    queue.push_back(v);
                }
            }
        }
        size
    }

    /// Per-step frontier lists for one cascade: element `t` holds the nodes
    /// first reached at BFS depth `t`. For callers that need the progression
    /// rather than just the final size.
    pub fn steps(&self, net: &Network, source: usize, max_steps: usize) -> Vec<Vec<u32>> {
        let mut visited = vec![false; net.n_nodes()];
        visited[source] = true;
        let mut frontier = vec![source as u32];
        let mut steps = vec![frontier.clone()];

        while !frontier.is_empty() && steps.len() < max_steps {
            let mut next = Vec::new();
            for &u in &frontier {
                for &(v, edge) in net.neighbors(u as usize) {
                    if !visited[v as usize] && net.weight(edge as usize) > self.threshold {
                        visited[v as usize] = true;
                        next.push(v);
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            steps.push(next.clone());
            frontier = next;
        }
        steps
    }

    /// Run one cascade from each of `n_seeds` distinct, randomly sampled
    /// seed nodes and collect the sizes.
    pub fn run_seed_batch(&self, net: &Network, n_seeds: usize, rng: &mut RandomSource) -> Vec<u64> {
        net.sample_nodes(n_seeds, rng)
            .into_iter()
            .map(|seed| self.size(net, seed))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Stepped stochastic cascades
// ---------------------------------------------------------------------------

/// Sub-window tag for epoch-structured traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// Unbiased build-up sub-window.
    Coherent,
    /// Biased sub-window.
    Effect,
}

/// Epoch structure: each epoch is `coherent_steps` unbiased steps followed
/// by `effect_steps` biased steps. Both lengths are independently
/// configurable.
#[derive(Debug, Clone, Copy)]
pub struct EpochSchedule {
    pub n_epochs: usize,
    pub coherent_steps: usize,
    pub effect_steps: usize,
}

impl EpochSchedule {
    pub fn new(
        n_epochs: usize,
        coherent_steps: usize,
        effect_steps: usize,
    ) -> Result<Self, ConfigError> {
        if coherent_steps + effect_steps == 0 {
            return Err(ConfigError::InvalidSchedule {
                coherent_steps,
                effect_steps,
            });
        }
        Ok(Self {
            n_epochs,
            coherent_steps,
            effect_steps,
        })
    }

    /// Total number of steps over all epochs.
    pub fn total_steps(&self) -> usize {
        self.n_epochs * (self.coherent_steps + self.effect_steps)
    }
}

/// Stepped-cascade parameters.
#[derive(Debug, Clone, Copy)]
pub struct SteppedConfig {
    /// Number of steps when no epoch schedule is set.
    pub n_steps: usize,
    /// Edge-weight propagation threshold.
    pub threshold: f64,
    /// A node cannot fire on consecutive steps when set.
    pub refractory: bool,
    /// Keep the full per-step activation masks (needed for flip-count
    /// extraction; costs `n_steps * n_nodes` bits).
    pub record_masks: bool,
    /// Optional epoch structure; overrides `n_steps`.
    pub epochs: Option<EpochSchedule>,
}

impl SteppedConfig {
    pub fn new(n_steps: usize, threshold: f64) -> Result<Self, ConfigError> {
        if threshold <= 0.0 || threshold.is_nan() {
            return Err(ConfigError::InvalidThreshold { threshold });
        }
        Ok(Self {
            n_steps,
            threshold,
            refractory: true,
            record_masks: false,
            epochs: None,
        })
    }

    pub fn with_epochs(mut self, schedule: EpochSchedule) -> Self {
        self.epochs = Some(schedule);
        self
    }

    pub fn with_masks(mut self) -> Self {
        self.record_masks = true;
        self
    }

    pub fn without_refractory(mut self) -> Self {
        self.refractory = false;
        self
    }
}

/// Per-node firing probabilities for a stepped run.
///
/// Epoch-structured runs use `baseline` during coherent sub-windows and
/// `biased` during effect sub-windows; the bias is therefore reset to the
/// classical baseline by construction, never by mutating state back.
/// Unstructured runs use `biased` throughout (equal to `baseline` for the
/// classical condition).
#[derive(Debug, Clone)]
pub struct FiringProbabilities {
    pub baseline: Vec<f64>,
    pub biased: Vec<f64>,
}

impl FiringProbabilities {
    /// Uniform unbiased probabilities for every node.
    pub fn uniform(n_nodes: usize, prob: f64) -> Self {
        Self {
            baseline: vec![prob; n_nodes],
            biased: vec![prob; n_nodes],
        }
    }
}

/// Output of a stepped run: per-step active-node counts, with phase and
/// epoch tags when epoch-structured, and optional full mask history.
#[derive(Debug, Clone)]
pub struct ActivityTrace {
    pub counts: Vec<u32>,
    pub phases: Option<Vec<Phase>>,
    pub epoch_index: Option<Vec<u32>>,
    pub masks: Option<Vec<Vec<bool>>>,
}

impl ActivityTrace {
    /// Counts restricted to one phase. Empty for unstructured traces.
    pub fn phase_counts(&self, phase: Phase) -> Vec<u32> {
        match &self.phases {
            Some(phases) => self
                .counts
                .iter()
                .zip(phases)
                .filter(|&(_, &p)| p == phase)
                .map(|(&c, _)| c)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Total activity summed over the trace.
    pub fn total_activity(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }
}

/// Discrete-time stochastic cascade runner.
#[derive(Debug, Clone)]
pub struct SteppedCascade {
    config: SteppedConfig,
}

impl SteppedCascade {
    pub fn new(config: SteppedConfig) -> Self {
        Self { config }
    }

    /// Advance the activation mask over the configured steps.
    pub fn run(
        &self,
        net: &Network,
        probs: &FiringProbabilities,
        rng: &mut RandomSource,
    ) -> ActivityTrace {
        let n = net.n_nodes();
        let cfg = &self.config;
        let total_steps = cfg.epochs.map_or(cfg.n_steps, |s| s.total_steps());

        let mut counts = Vec::with_capacity(total_steps);
        let mut phases = cfg.epochs.map(|_| Vec::with_capacity(total_steps));
        let mut epoch_index = cfg.epochs.map(|_| Vec::with_capacity(total_steps));
        let mut masks = cfg.record_masks.then(|| Vec::with_capacity(total_steps));

        let mut prev = vec![false; n];
        let mut active = vec![false; n];

        for step in 0..total_steps {
            let (phase, epoch) = match cfg.epochs {
                Some(s) => {
                    let len = s.coherent_steps + s.effect_steps;
                    let within = step % len;
                    let phase = if within < s.coherent_steps {
                        Phase::Coherent
                    } else {
                        Phase::Effect
                    };
                    (phase, (step / len) as u32)
                }
                None => (Phase::Effect, 0),
            };
            let node_probs = match phase {
                Phase::Coherent => &probs.baseline,
                Phase::Effect => &probs.biased,
            };

            // Spontaneous firing.
            for (i, slot) in active.iter_mut().enumerate() {
                *slot = rng.random::<f64>() < node_probs[i];
            }

            // Propagation from the previous step's active set.
            for (u, was_active) in prev.iter().enumerate() {
                if !was_active {
                    continue;
                }
                for &(v, edge) in net.neighbors(u) {
                    if net.weight(edge as usize) > cfg.threshold {
                        active[v as usize] = true;
                    }
                }
            }

            if cfg.refractory {
                for (slot, &was_active) in active.iter_mut().zip(&prev) {
                    *slot = *slot && !was_active;
                }
            }

            counts.push(active.iter().filter(|&&a| a).count() as u32);
            if let Some(phases) = phases.as_mut() {
                phases.push(phase);
            }
            if let Some(epoch_index) = epoch_index.as_mut() {
                epoch_index.push(epoch);
            }
            if let Some(masks) = masks.as_mut() {
                masks.push(active.clone());
            }

            std::mem::swap(&mut prev, &mut active);
        }

        ActivityTrace {
            counts,
            phases,
            epoch_index,
            masks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NetworkConfig;
    use crate::rng::source_from_seed;

    fn net(seed: u64) -> Network {
        Network::build(
            &NetworkConfig {
                n_nodes: 200,
                mean_degree: 8,
                ..Default::default()
            },
            seed,
        )
        .unwrap()
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        assert!(matches!(
            SeedCascade::new(0.0),
            Err(ConfigError::InvalidThreshold { .. })
        ));
        assert!(matches!(
            SteppedConfig::new(100, -1.0),
            Err(ConfigError::InvalidThreshold { .. })
        ));
    }

    #[test]
    fn test_isolated_seed_yields_size_one() {
        let net = net(1);
        // Threshold above every possible weight: nothing propagates.
        let cascade = SeedCascade::new(1e6).unwrap();
        assert_eq!(cascade.size(&net, 0), 1);
    }

    #[test]
    fn test_low_threshold_floods_component() {
        let net = net(2);
        // Threshold below every weight: BFS covers the whole connected
        // component, which for a ring lattice plus rewiring is everything.
        let cascade = SeedCascade::new(1e-6).unwrap();
        assert_eq!(cascade.size(&net, 0), net.n_nodes() as u64);
    }

    #[test]
    fn test_bfs_deterministic_given_state() {
        let net = net(3);
        let cascade = SeedCascade::new(1.05).unwrap();
        assert_eq!(cascade.size(&net, 17), cascade.size(&net, 17));
    }

    #[test]
    fn test_seed_batch_reproducible() {
        let net = net(4);
        let cascade = SeedCascade::new(1.05).unwrap();
        let a = cascade.run_seed_batch(&net, 30, &mut source_from_seed(8));
        let b = cascade.run_seed_batch(&net, 30, &mut source_from_seed(8));
        assert_eq!(a, b);
        assert_eq!(a.len(), 30);
    }

    #[test]
    fn test_steps_sum_to_size() {
        let net = net(5);
        let cascade = SeedCascade::new(1.05).unwrap();
        let steps = cascade.steps(&net, 0, 1000);
        let total: usize = steps.iter().map(Vec::len).sum();
        assert_eq!(total as u64, cascade.size(&net, 0));
    }

    #[test]
    fn test_stepped_trace_length() {
        let net = net(6);
        let config = SteppedConfig::new(50, 1.1).unwrap();
        let probs = FiringProbabilities::uniform(net.n_nodes(), 0.01);
        let trace = SteppedCascade::new(config).run(&net, &probs, &mut source_from_seed(1));
        assert_eq!(trace.counts.len(), 50);
        assert!(trace.phases.is_none());
        assert!(trace.masks.is_none());
    }

    #[test]
    fn test_epoch_tags() {
        let net = net(7);
        let schedule = EpochSchedule::new(3, 4, 2).unwrap();
        let config = SteppedConfig::new(0, 1.1).unwrap().with_epochs(schedule);
        let probs = FiringProbabilities::uniform(net.n_nodes(), 0.01);
        let trace = SteppedCascade::new(config).run(&net, &probs, &mut source_from_seed(2));
        assert_eq!(trace.counts.len(), 18);
        let phases = trace.phases.as_ref().unwrap();
        let epochs = trace.epoch_index.as_ref().unwrap();
        assert_eq!(phases[0], Phase::Coherent);
        assert_eq!(phases[3], Phase::Coherent);
        assert_eq!(phases[4], Phase::Effect);
        assert_eq!(phases[5], Phase::Effect);
        assert_eq!(epochs[5], 0);
        assert_eq!(epochs[6], 1);
        assert_eq!(trace.phase_counts(Phase::Effect).len(), 6);
    }

    #[test]
    fn test_refractory_blocks_consecutive_firing() {
        let net = net(8);
        // Firing probability 1: without refractory every node fires every
        // step; with refractory, activity alternates full-on/full-off.
        let config = SteppedConfig::new(6, 1e6).unwrap();
        let probs = FiringProbabilities::uniform(net.n_nodes(), 1.0);
        let trace = SteppedCascade::new(config).run(&net, &probs, &mut source_from_seed(3));
        let n = net.n_nodes() as u32;
        assert_eq!(trace.counts, vec![n, 0, n, 0, n, 0]);

        let config = SteppedConfig::new(6, 1e6).unwrap().without_refractory();
        let trace = SteppedCascade::new(config).run(&net, &probs, &mut source_from_seed(3));
        assert_eq!(trace.counts, vec![n; 6]);
    }

    #[test]
    fn test_mask_history_matches_counts() {
        let net = net(9);
        let config = SteppedConfig::new(20, 1.1).unwrap().with_masks();
        let probs = FiringProbabilities::uniform(net.n_nodes(), 0.05);
        let trace = SteppedCascade::new(config).run(&net, &probs, &mut source_from_seed(4));
        let masks = trace.masks.as_ref().unwrap();
        assert_eq!(masks.len(), 20);
        for (mask, &count) in masks.iter().zip(&trace.counts) {
            assert_eq!(mask.iter().filter(|&&a| a).count() as u32, count);
        }
    }

    #[test]
    fn test_zero_probability_trace_is_quiescent() {
        let net = net(10);
        let config = SteppedConfig::new(30, 1.1).unwrap();
        let probs = FiringProbabilities::uniform(net.n_nodes(), 0.0);
        let trace = SteppedCascade::new(config).run(&net, &probs, &mut source_from_seed(5));
        assert!(trace.counts.iter().all(|&c| c == 0));
        assert_eq!(trace.total_activity(), 0);
    }
}
