//! Monte-Carlo trial orchestration.
//!
//! Drives `n_trials` independent trials across the four perturbation
//! regimes. Each trial builds one fresh trial-seeded network, then for each
//! condition resets the weights to baseline, applies that condition's bias
//! policy, runs the cascade engine, extracts avalanche sizes, and records a
//! [`TrialResult`]. Aggregation into [`ConditionSummary`]s and pairwise
//! comparisons happens only after all trials complete.
//!
//! Two sequencing rules are load-bearing:
//!
//! - The mimic condition's calibration target is the *same trial's*
//!   quantum-positive mean, never a cross-trial average, so conditions run in
//!   canonical order and requesting mimic without quantum-positive is a
//!   configuration error.
//! - Every random stream is seeded `base_seed + trial * stride + offset`,
//!   one disjoint offset per purpose, so results are bit-reproducible
//!   regardless of execution order and trials stay independent if run in
//!   parallel.
//!
//! A trial whose cascade produces zero avalanches is recorded as a valid
//! zero-statistics result; skipping it would bias the aggregate.

use std::sync::Mutex;

use serde::Serialize;

use crate::analysis::{TTest, cohens_d, sample_entropy, size_stats, welch_t_test};
use crate::bias::{
    BiasSelection, Condition, EdgeBias, MimicCalibration, NodeFiringBias, calibrate_mimic,
};
use crate::cascade::{FiringProbabilities, Phase, SeedCascade, SteppedCascade, SteppedConfig};
use crate::error::ConfigError;
use crate::extract::{ExtractionMode, extract};
use crate::network::{Network, NetworkConfig};
use crate::powerlaw::{fit_mle, ks_statistic};
use crate::rng::source_from_seed;

// Per-purpose seed offsets within one trial. The stride keeps the streams of
// different trials and purposes disjoint.
const SEED_STRIDE: u64 = 8;
const OFFSET_NETWORK: u64 = 0;
const OFFSET_CLASSICAL: u64 = 1;
const OFFSET_POSITIVE: u64 = 2;
const OFFSET_NEGATIVE: u64 = 3;
const OFFSET_MIMIC: u64 = 4;

/// Which propagation mode the trials run and which bias state space the
/// policies act on.
#[derive(Debug, Clone)]
pub enum CascadeMode {
    /// Single-shot BFS cascades from `n_seeds` sampled seed nodes;
    /// bias acts on edge weights.
    SeedBatch { n_seeds: usize, threshold: f64 },
    /// Discrete-time stochastic cascades; bias acts on node firing
    /// probabilities.
    Stepped {
        config: SteppedConfig,
        base_firing_prob: f64,
        extraction: ExtractionMode,
        /// Target the highest-degree nodes instead of a random subset.
        hub_targeted: bool,
    },
}

/// Full Monte-Carlo configuration.
#[derive(Debug, Clone)]
pub struct TrialConfig {
    pub n_trials: usize,
    pub base_seed: u64,
    pub conditions: Vec<Condition>,
    pub network: NetworkConfig,
    pub mode: CascadeMode,
    pub bias_fraction: f64,
    pub bias_strength: f64,
    pub mimic: MimicCalibration,
    /// Cutoff for per-trial and pooled power-law fits.
    pub x_min: f64,
    /// An avalanche is "large" above this fraction of the node count.
    pub large_fraction_of_network: f64,
}

impl TrialConfig {
    /// BFS edge-bias setup with the conventions the comparison experiments
    /// use: all four conditions, x_min 5, large = half the network.
    pub fn seed_batch(n_trials: usize, base_seed: u64) -> Self {
        Self {
            n_trials,
            base_seed,
            conditions: Condition::ALL.to_vec(),
            network: NetworkConfig::default(),
            mode: CascadeMode::SeedBatch {
                n_seeds: 30,
                threshold: 1.05,
            },
            bias_fraction: 0.1,
            bias_strength: 0.05,
            mimic: MimicCalibration::default(),
            x_min: 5.0,
            large_fraction_of_network: 0.5,
        }
    }
}

/// Per-(trial, condition) scalar bundle. Immutable once computed.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TrialResult {
    pub trial: usize,
    pub condition: Condition,
    pub n_avalanches: usize,
    pub mean_size: f64,
    pub std_size: f64,
    pub skewness: f64,
    pub large_fraction: f64,
    pub alpha: f64,
    pub alpha_stderr: f64,
    /// Sample entropy of the coherent-phase activity series; NaN outside
    /// epoch-structured stepped runs.
    pub entropy_coherent: f64,
    /// Sample entropy of the effect-phase activity series; NaN outside
    /// epoch-structured stepped runs.
    pub entropy_effect: f64,
}

/// All per-trial results and pooled sizes for one condition.
#[derive(Debug, Clone, Serialize)]
pub struct ConditionSeries {
    pub condition: Condition,
    pub results: Vec<TrialResult>,
    /// Avalanche sizes pooled across trials.
    pub sizes: Vec<u64>,
}

impl ConditionSeries {
    pub fn means(&self) -> Vec<f64> {
        self.results.iter().map(|r| r.mean_size).collect()
    }

    pub fn skews(&self) -> Vec<f64> {
        self.results.iter().map(|r| r.skewness).collect()
    }

    pub fn large_fractions(&self) -> Vec<f64> {
        self.results.iter().map(|r| r.large_fraction).collect()
    }
}

/// Cross-trial aggregate for one condition.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ConditionSummary {
    pub condition: Condition,
    pub n_trials: usize,
    pub mean_size: f64,
    pub mean_size_std: f64,
    pub skewness: f64,
    pub skewness_std: f64,
    pub large_fraction: f64,
    /// MLE fit over the pooled sizes.
    pub alpha: f64,
    pub alpha_stderr: f64,
    pub ks: f64,
}

/// Pairwise condition comparison over per-trial means and skewnesses.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PairwiseComparison {
    pub a: Condition,
    pub b: Condition,
    pub mean_t: f64,
    pub mean_p: f64,
    pub mean_d: f64,
    pub skew_t: f64,
    pub skew_p: f64,
    pub skew_d: f64,
}

/// Flat row for CSV-oriented export collaborators.
#[derive(Debug, Clone, Serialize)]
pub struct TrialRecord {
    pub condition: String,
    pub trial: usize,
    pub n_avalanches: usize,
    pub mean_size: f64,
    pub std_size: f64,
    pub skewness: f64,
    pub large_fraction: f64,
    pub alpha: f64,
    pub alpha_stderr: f64,
    pub entropy_coherent: f64,
    pub entropy_effect: f64,
}

/// Everything the run produced: raw series per condition, aggregates, and
/// pairwise comparisons. Plain numeric containers only; rendering and file
/// export live in external collaborators.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub conditions: Vec<ConditionSeries>,
    pub summaries: Vec<ConditionSummary>,
    pub comparisons: Vec<PairwiseComparison>,
}

impl ComparisonReport {
    pub fn series(&self, condition: Condition) -> Option<&ConditionSeries> {
        self.conditions.iter().find(|s| s.condition == condition)
    }

    pub fn summary(&self, condition: Condition) -> Option<&ConditionSummary> {
        self.summaries.iter().find(|s| s.condition == condition)
    }

    pub fn comparison(&self, a: Condition, b: Condition) -> Option<&PairwiseComparison> {
        self.comparisons
            .iter()
            .find(|c| (c.a == a && c.b == b) || (c.a == b && c.b == a))
    }

    /// Flatten per-trial results to rows.
    pub fn records(&self) -> Vec<TrialRecord> {
        let mut records = Vec::new();
        for series in &self.conditions {
            for r in &series.results {
                records.push(TrialRecord {
                    condition: r.condition.to_string(),
                    trial: r.trial,
                    n_avalanches: r.n_avalanches,
                    mean_size: r.mean_size,
                    std_size: r.std_size,
                    skewness: r.skewness,
                    large_fraction: r.large_fraction,
                    alpha: r.alpha,
                    alpha_stderr: r.alpha_stderr,
                    entropy_coherent: r.entropy_coherent,
                    entropy_effect: r.entropy_effect,
                });
            }
        }
        records
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Monte-Carlo runner. Construction validates every configuration parameter;
/// [`TrialRunner::run`] is then infallible.
pub struct TrialRunner {
    config: TrialConfig,
}

/// One condition's output within a trial, kept until aggregation.
struct TrialOutput {
    condition: Condition,
    sizes: Vec<u64>,
    result: TrialResult,
}

impl TrialRunner {
    pub fn new(config: TrialConfig) -> Result<Self, ConfigError> {
        // Validate topology, fraction, and threshold up front via the same
        // constructors the run uses.
        if config.network.mean_degree == 0 || config.network.n_nodes <= config.network.mean_degree {
            return Err(ConfigError::InvalidTopology {
                n_nodes: config.network.n_nodes,
                mean_degree: config.network.mean_degree,
            });
        }
        EdgeBias::promote(config.bias_fraction, config.bias_strength)?;
        match &config.mode {
            CascadeMode::SeedBatch { threshold, .. } => {
                SeedCascade::new(*threshold)?;
            }
            CascadeMode::Stepped { .. } => {
                // SteppedConfig validated its threshold at construction.
            }
        }
        if config.conditions.contains(&Condition::Mimic)
            && !config.conditions.contains(&Condition::QuantumPositive)
        {
            return Err(ConfigError::MimicWithoutReference);
        }
        Ok(Self { config })
    }

    /// Run all trials sequentially and aggregate. Deterministic for a fixed
    /// `base_seed` and `n_trials`.
    pub fn run(&self) -> ComparisonReport {
        let outputs: Vec<Vec<TrialOutput>> =
            (0..self.config.n_trials).map(|t| self.run_trial(t)).collect();
        self.aggregate(outputs)
    }

    /// Run trials across `n_threads` worker threads. Trials are
    /// embarrassingly parallel (each owns its network and its seeded random
    /// sources) and aggregation folds results back in trial order, so the
    /// report is bit-identical to [`TrialRunner::run`] for any thread count.
    pub fn run_parallel(&self, n_threads: usize) -> ComparisonReport {
        let n_trials = self.config.n_trials;
        let n_threads = n_threads.max(1).min(n_trials.max(1));
        let collected: Mutex<Vec<(usize, Vec<TrialOutput>)>> =
            Mutex::new(Vec::with_capacity(n_trials));

        std::thread::scope(|s| {
            for worker in 0..n_threads {
                let collected = &collected;
                s.spawn(move || {
                    let mut local = Vec::new();
                    for trial in (worker..n_trials).step_by(n_threads) {
                        local.push((trial, self.run_trial(trial)));
                    }
                    collected.lock().unwrap().extend(local);
                });
            }
        });

        let mut outputs = collected.into_inner().unwrap();
        outputs.sort_by_key(|(trial, _)| *trial);
        self.aggregate(outputs.into_iter().map(|(_, o)| o).collect())
    }

    /// One full trial: a fresh seeded network, every requested condition in
    /// canonical order (quantum-positive before mimic).
    fn run_trial(&self, trial: usize) -> Vec<TrialOutput> {
        let cfg = &self.config;
        let conditions = self.ordered_conditions();
        let trial_base = cfg.base_seed + trial as u64 * SEED_STRIDE;
        let mut net = Network::build(&cfg.network, trial_base + OFFSET_NETWORK)
            .expect("validated at construction");

        let mut outputs = Vec::with_capacity(conditions.len());
        let mut positive_mean: Option<f64> = None;
        for condition in conditions {
            let (sizes, entropies) =
                self.run_condition(&mut net, condition, trial_base, positive_mean);
            if condition == Condition::QuantumPositive {
                positive_mean = Some(mean_of(&sizes));
            }
            let result = self.trial_result(trial, condition, &sizes, entropies, &net);
            outputs.push(TrialOutput {
                condition,
                sizes,
                result,
            });
        }
        outputs
    }

    fn ordered_conditions(&self) -> Vec<Condition> {
        Condition::ALL
            .into_iter()
            .filter(|c| self.config.conditions.contains(c))
            .collect()
    }

    fn aggregate(&self, outputs: Vec<Vec<TrialOutput>>) -> ComparisonReport {
        let conditions = self.ordered_conditions();
        let mut series: Vec<ConditionSeries> = conditions
            .iter()
            .map(|&condition| ConditionSeries {
                condition,
                results: Vec::with_capacity(self.config.n_trials),
                sizes: Vec::new(),
            })
            .collect();

        for trial_outputs in outputs {
            for (slot, output) in trial_outputs.into_iter().enumerate() {
                debug_assert_eq!(series[slot].condition, output.condition);
                series[slot].results.push(output.result);
                series[slot].sizes.extend_from_slice(&output.sizes);
            }
        }

        let summaries = series.iter().map(|s| self.summarize(s)).collect();
        let comparisons = pairwise(&series);

        ComparisonReport {
            conditions: series,
            summaries,
            comparisons,
        }
    }

    /// Produce this condition's avalanche sizes for one trial, plus the
    /// coherent/effect-phase entropies (NaN outside epoch-structured stepped
    /// runs). Weights are reset to baseline before each condition, so no
    /// bias carries over.
    fn run_condition(
        &self,
        net: &mut Network,
        condition: Condition,
        trial_base: u64,
        positive_mean: Option<f64>,
    ) -> (Vec<u64>, (f64, f64)) {
        let cfg = &self.config;
        let offset = match condition {
            Condition::Classical => OFFSET_CLASSICAL,
            Condition::QuantumPositive => OFFSET_POSITIVE,
            Condition::QuantumNegative => OFFSET_NEGATIVE,
            Condition::Mimic => OFFSET_MIMIC,
        };
        let seed = trial_base + offset;

        match &cfg.mode {
            CascadeMode::SeedBatch { n_seeds, threshold } => {
                let cascade = SeedCascade::new(*threshold).expect("validated at construction");
                net.reset_weights();
                let mut rng = source_from_seed(seed);
                match condition {
                    Condition::Classical => {}
                    Condition::QuantumPositive => {
                        let bias = EdgeBias::promote(cfg.bias_fraction, cfg.bias_strength)
                            .expect("validated at construction");
                        let _: BiasSelection = bias.apply(net, &mut rng);
                    }
                    Condition::QuantumNegative => {
                        let bias = EdgeBias::veto(cfg.bias_fraction, cfg.bias_strength)
                            .expect("validated at construction");
                        let _ = bias.apply(net, &mut rng);
                    }
                    Condition::Mimic => {
                        let target = positive_mean.expect("mimic ordered after quantum_positive");
                        let outcome = calibrate_mimic(&cfg.mimic, target, |boost| {
                            net.set_uniform_boost(boost);
                            // Same seed per probe so the search compares
                            // boosts on identical seed draws.
                            let mut probe_rng = source_from_seed(seed);
                            cascade.run_seed_batch(net, *n_seeds, &mut probe_rng)
                        });
                        return (outcome.sizes, (f64::NAN, f64::NAN));
                    }
                }
                (
                    cascade.run_seed_batch(net, *n_seeds, &mut rng),
                    (f64::NAN, f64::NAN),
                )
            }
            CascadeMode::Stepped {
                config,
                base_firing_prob,
                extraction,
                hub_targeted,
            } => {
                net.reset_weights();
                let mut stepped_config = *config;
                if matches!(extraction, ExtractionMode::FlipCount { .. }) {
                    stepped_config.record_masks = true;
                }
                let engine = SteppedCascade::new(stepped_config);
                let mut rng = source_from_seed(seed);
                let baseline = vec![*base_firing_prob; net.n_nodes()];
                let mut biased = baseline.clone();

                match condition {
                    Condition::Classical => {}
                    Condition::QuantumPositive | Condition::QuantumNegative => {
                        let bias = if condition == Condition::QuantumPositive {
                            NodeFiringBias::promote(cfg.bias_fraction, cfg.bias_strength)
                        } else {
                            NodeFiringBias::veto(cfg.bias_fraction, cfg.bias_strength)
                        }
                        .expect("validated at construction");
                        let bias = if *hub_targeted {
                            bias.hub_targeted()
                        } else {
                            bias
                        };
                        bias.apply(net, &mut biased, &mut rng);
                    }
                    Condition::Mimic => {
                        let target = positive_mean.expect("mimic ordered after quantum_positive");
                        let mimic_probs = |boost: f64| FiringProbabilities {
                            baseline: baseline.clone(),
                            biased: baseline
                                .iter()
                                .map(|p| (p + boost).clamp(0.0, 1.0))
                                .collect(),
                        };
                        let outcome = calibrate_mimic(&cfg.mimic, target, |boost| {
                            let mut probe_rng = source_from_seed(seed);
                            let trace = engine.run(net, &mimic_probs(boost), &mut probe_rng);
                            extract(&trace, *extraction, 0)
                        });
                        // Re-run the settled boost with the same seed to
                        // recover the trace the calibration measured.
                        let mut final_rng = source_from_seed(seed);
                        let trace = engine.run(net, &mimic_probs(outcome.boost), &mut final_rng);
                        let entropies = phase_entropies(&trace);
                        return (outcome.sizes, entropies);
                    }
                }

                let probs = FiringProbabilities { baseline, biased };
                let trace = engine.run(net, &probs, &mut rng);
                let sizes = extract(&trace, *extraction, 0);
                let entropies = phase_entropies(&trace);
                (sizes, entropies)
            }
        }
    }

    fn trial_result(
        &self,
        trial: usize,
        condition: Condition,
        sizes: &[u64],
        entropies: (f64, f64),
        net: &Network,
    ) -> TrialResult {
        let cfg = &self.config;
        let large_threshold = net.n_nodes() as f64 * cfg.large_fraction_of_network;
        let stats = size_stats(sizes, large_threshold);
        let fit = fit_mle(sizes, cfg.x_min);
        let (entropy_coherent, entropy_effect) = entropies;
        TrialResult {
            trial,
            condition,
            n_avalanches: sizes.len(),
            mean_size: stats.mean,
            std_size: stats.std_dev,
            skewness: stats.skewness,
            large_fraction: stats.large_fraction,
            alpha: fit.alpha,
            alpha_stderr: fit.stderr,
            entropy_coherent,
            entropy_effect,
        }
    }

    fn summarize(&self, series: &ConditionSeries) -> ConditionSummary {
        let means = series.means();
        let skews = series.skews();
        let larges = series.large_fractions();
        let fit = fit_mle(&series.sizes, self.config.x_min);
        let ks = ks_statistic(&series.sizes, fit.alpha, self.config.x_min);
        ConditionSummary {
            condition: series.condition,
            n_trials: series.results.len(),
            mean_size: mean_f64(&means),
            mean_size_std: std_f64(&means),
            skewness: mean_f64(&skews),
            skewness_std: std_f64(&skews),
            large_fraction: mean_f64(&larges),
            alpha: fit.alpha,
            alpha_stderr: fit.stderr,
            ks,
        }
    }
}

fn pairwise(series: &[ConditionSeries]) -> Vec<PairwiseComparison> {
    let mut comparisons = Vec::new();
    for i in 0..series.len() {
        for j in (i + 1)..series.len() {
            let (a, b) = (&series[i], &series[j]);
            let mean_test: TTest = welch_t_test(&a.means(), &b.means());
            let skew_test = welch_t_test(&a.skews(), &b.skews());
            comparisons.push(PairwiseComparison {
                a: a.condition,
                b: b.condition,
                mean_t: mean_test.t,
                mean_p: mean_test.p,
                mean_d: cohens_d(&a.means(), &b.means()),
                skew_t: skew_test.t,
                skew_p: skew_test.p,
                skew_d: cohens_d(&a.skews(), &b.skews()),
            });
        }
    }
    comparisons
}

/// Sample entropy of the coherent- and effect-phase activity series of an
/// epoch-structured trace; NaN for unstructured traces.
fn phase_entropies(trace: &crate::cascade::ActivityTrace) -> (f64, f64) {
    let entropy_of = |phase: Phase| {
        let series: Vec<f64> = trace
            .phase_counts(phase)
            .into_iter()
            .map(f64::from)
            .collect();
        if series.is_empty() {
            f64::NAN
        } else {
            sample_entropy(&series, 2, 0.2)
        }
    };
    (entropy_of(Phase::Coherent), entropy_of(Phase::Effect))
}

fn mean_of(sizes: &[u64]) -> f64 {
    if sizes.is_empty() {
        return 0.0;
    }
    sizes.iter().sum::<u64>() as f64 / sizes.len() as f64
}

fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = mean_f64(values);
    (values.iter().map(|&v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}
