//! Small-world network construction.
//!
//! Builds a Watts–Strogatz graph: a ring lattice where each node connects to
//! its `mean_degree / 2` nearest neighbors on each side, then each edge is
//! rewired with probability `rewire_prob` to a uniformly random far endpoint
//! (no self-loops, no duplicate edges).
//!
//! Every edge carries two weights:
//! - `baseline`: drawn once from Normal(weight_mean, weight_std) at build
//!   time, immutable for the network's lifetime;
//! - `current`: the working weight that bias policies perturb.
//!
//! `current` is always recomputed from `baseline` (via [`Network::reset_weights`]
//! or [`Network::set_uniform_boost`]) rather than patched back incrementally,
//! so one condition's bias can never leak into the next.

use std::collections::HashSet;

use rand::Rng;

use crate::error::ConfigError;
use crate::rng::{RandomSource, sample_normal};

/// Topology and weight-distribution parameters. The weight distribution is
/// configuration, not a constant, so sensitivity sweeps can vary it.
#[derive(Debug, Clone, Copy)]
pub struct NetworkConfig {
    /// Number of nodes.
    pub n_nodes: usize,
    /// Mean degree of the ring lattice (each node gets `mean_degree / 2`
    /// neighbors per side before rewiring).
    pub mean_degree: usize,
    /// Probability of rewiring each lattice edge.
    pub rewire_prob: f64,
    /// Mean of the Gaussian edge-weight distribution.
    pub weight_mean: f64,
    /// Standard deviation of the Gaussian edge-weight distribution.
    pub weight_std: f64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            n_nodes: 1000,
            mean_degree: 10,
            rewire_prob: 0.1,
            weight_mean: 1.0,
            weight_std: 0.12,
        }
    }
}

/// Undirected weighted small-world graph.
///
/// Edges are stored once as `(u, v)` pairs with parallel weight arrays;
/// the adjacency list stores `(neighbor, edge index)` for both endpoints.
#[derive(Debug, Clone)]
pub struct Network {
    n_nodes: usize,
    edges: Vec<(u32, u32)>,
    baseline: Vec<f64>,
    current: Vec<f64>,
    adjacency: Vec<Vec<(u32, u32)>>,
}

impl Network {
    /// Build a network from `config`, deterministically for a given `seed`:
    /// identical seed and parameters reproduce an identical edge set and
    /// identical weights.
    pub fn build(config: &NetworkConfig, seed: u64) -> Result<Self, ConfigError> {
        if config.mean_degree == 0 || config.n_nodes <= config.mean_degree {
            return Err(ConfigError::InvalidTopology {
                n_nodes: config.n_nodes,
                mean_degree: config.mean_degree,
            });
        }

        let mut rng = crate::rng::source_from_seed(seed);
        let n = config.n_nodes;
        let half_k = config.mean_degree / 2;

        // Ring lattice.
        let mut edges: Vec<(u32, u32)> = Vec::with_capacity(n * half_k);
        let mut edge_set: HashSet<(u32, u32)> = HashSet::with_capacity(n * half_k);
        for i in 0..n {
            for j in 1..=half_k {
                let key = ordered(i as u32, ((i + j) % n) as u32);
                if edge_set.insert(key) {
                    edges.push(key);
                }
            }
        }

        // Rewire: replace the far endpoint with a random node, keeping the
        // original edge when the draw would create a self-loop or duplicate.
        for idx in 0..edges.len() {
            if rng.random::<f64>() >= config.rewire_prob {
                continue;
            }
            let (u, v) = edges[idx];
            let target = rng.random_range(0..n) as u32;
            let candidate = ordered(u, target);
            if target == u || edge_set.contains(&candidate) {
                continue;
            }
            edge_set.remove(&(u, v));
            edge_set.insert(candidate);
            edges[idx] = candidate;
        }

        // Gaussian baseline weights, same seeded source.
        let baseline: Vec<f64> = edges
            .iter()
            .map(|_| sample_normal(&mut rng, config.weight_mean, config.weight_std))
            .collect();
        let current = baseline.clone();

        let mut adjacency = vec![Vec::new(); n];
        for (idx, &(u, v)) in edges.iter().enumerate() {
            adjacency[u as usize].push((v, idx as u32));
            adjacency[v as usize].push((u, idx as u32));
        }

        Ok(Self {
            n_nodes: n,
            edges,
            baseline,
            current,
            adjacency,
        })
    }

    /// Number of nodes.
    #[inline]
    pub fn n_nodes(&self) -> usize {
        self.n_nodes
    }

    /// Number of edges.
    #[inline]
    pub fn n_edges(&self) -> usize {
        self.edges.len()
    }

    /// Edge endpoint pairs, indexed by edge id.
    #[inline]
    pub fn edges(&self) -> &[(u32, u32)] {
        &self.edges
    }

    /// Current (possibly biased) weight of an edge.
    #[inline]
    pub fn weight(&self, edge: usize) -> f64 {
        self.current[edge]
    }

    /// Immutable baseline weight of an edge.
    #[inline]
    pub fn baseline_weight(&self, edge: usize) -> f64 {
        self.baseline[edge]
    }

    /// `(neighbor, edge index)` pairs for a node.
    #[inline]
    pub fn neighbors(&self, node: usize) -> &[(u32, u32)] {
        &self.adjacency[node]
    }

    /// Restore every current weight to its baseline.
    pub fn reset_weights(&mut self) {
        self.current.copy_from_slice(&self.baseline);
    }

    /// Add `delta` to one edge's current weight.
    #[inline]
    pub fn nudge_edge(&mut self, edge: usize, delta: f64) {
        self.current[edge] += delta;
    }

    /// Set every current weight to `baseline + delta` (the uniform mimic
    /// boost). Recomputed from baseline, so repeated calls do not compound.
    pub fn set_uniform_boost(&mut self, delta: f64) {
        for (cur, base) in self.current.iter_mut().zip(&self.baseline) {
            *cur = base + delta;
        }
    }

    /// Degree of every node.
    pub fn degrees(&self) -> Vec<usize> {
        self.adjacency.iter().map(Vec::len).collect()
    }

    /// The `k` highest-degree nodes, ties broken by node index for
    /// reproducibility.
    pub fn hubs(&self, k: usize) -> Vec<usize> {
        let mut by_degree: Vec<(usize, usize)> = self
            .degrees()
            .into_iter()
            .enumerate()
            .map(|(node, deg)| (deg, node))
            .collect();
        by_degree.sort_unstable_by(|a, b| b.cmp(a));
        by_degree
            .into_iter()
            .take(k)
            .map(|(_, node)| node)
            .collect()
    }

    /// Sample `k` distinct node indices.
    pub fn sample_nodes(&self, k: usize, rng: &mut RandomSource) -> Vec<usize> {
        crate::rng::sample_indices(rng, self.n_nodes, k)
    }
}

#[inline]
fn ordered(a: u32, b: u32) -> (u32, u32) {
    if a <= b { (a, b) } else { (b, a) }
}
