//! Avalanche extraction from activity traces.
//!
//! An avalanche is a contiguous run of above-baseline steps collapsed to a
//! single integer size. Three extraction modes, kept as explicit caller
//! choices because the two families target different critical exponents
//! (duration α ≈ 2.0, size α ≈ 1.5–1.6):
//!
//! - **Duration**: size = number of steps in the run.
//! - **SizeWeighted**: size = sum of per-step activity over the run.
//! - **FlipCount**: over consecutive state masks, a step is active when its
//!   Hamming flip count exceeds `mean_flips * (1 + relative_threshold)`;
//!   size = summed flip count of the run.
//!
//! A run still open at trace end is emitted as a (possibly truncated)
//! avalanche. All sizes are strictly positive; a quiescent trace yields an
//! empty list, never a zero.

use crate::cascade::ActivityTrace;

/// How to segment a trace into avalanche sizes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExtractionMode {
    /// Count of consecutive above-baseline steps.
    Duration,
    /// Sum of per-step activity over consecutive above-baseline steps.
    SizeWeighted,
    /// Sum of per-step state-flip counts over above-mean-flip runs.
    FlipCount { relative_threshold: f64 },
}

/// Extract avalanche sizes from a trace. `baseline` is the per-step activity
/// level that counts as quiescent for the duration/size modes. Flip-count
/// mode requires the trace to carry mask history; without it there are no
/// flips to segment and the result is empty.
pub fn extract(trace: &ActivityTrace, mode: ExtractionMode, baseline: u32) -> Vec<u64> {
    match mode {
        ExtractionMode::Duration | ExtractionMode::SizeWeighted => {
            extract_from_counts(&trace.counts, baseline, mode)
        }
        ExtractionMode::FlipCount { relative_threshold } => match &trace.masks {
            Some(masks) => extract_from_flips(&flip_counts(masks), relative_threshold),
            None => Vec::new(),
        },
    }
}

/// Segment a per-step activity series into avalanches.
pub fn extract_from_counts(counts: &[u32], baseline: u32, mode: ExtractionMode) -> Vec<u64> {
    let mut avalanches = Vec::new();
    let mut current = 0u64;
    let mut in_avalanche = false;

    for &c in counts {
        if c > baseline {
            in_avalanche = true;
            current += match mode {
                ExtractionMode::Duration => 1,
                _ => c as u64,
            };
        } else if in_avalanche {
            avalanches.push(current);
            current = 0;
            in_avalanche = false;
        }
    }
    if in_avalanche {
        avalanches.push(current);
    }
    avalanches
}

/// Hamming distance between consecutive activation masks. Length is
/// `masks.len() - 1` (empty for fewer than two masks).
pub fn flip_counts(masks: &[Vec<bool>]) -> Vec<u32> {
    masks
        .windows(2)
        .map(|w| w[0].iter().zip(&w[1]).filter(|(a, b)| a != b).count() as u32)
        .collect()
}

/// Segment per-step flip counts into avalanches: a step is active when its
/// flip count exceeds `mean_flips * (1 + relative_threshold)`; the avalanche
/// size is the summed flip count of the run.
pub fn extract_from_flips(flips: &[u32], relative_threshold: f64) -> Vec<u64> {
    if flips.is_empty() {
        return Vec::new();
    }
    let mean_flips = flips.iter().map(|&f| f as f64).sum::<f64>() / flips.len() as f64;
    let cut = mean_flips * (1.0 + relative_threshold);

    let mut avalanches = Vec::new();
    let mut current = 0u64;
    let mut in_avalanche = false;

    for &f in flips {
        if f as f64 > cut {
            in_avalanche = true;
            current += f as u64;
        } else if in_avalanche {
            avalanches.push(current);
            current = 0;
            in_avalanche = false;
        }
    }
    if in_avalanche {
        avalanches.push(current);
    }
    avalanches
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_mode_counts_steps() {
        let counts = [0, 3, 5, 0, 0, 2, 0, 7, 7, 7];
        let sizes = extract_from_counts(&counts, 0, ExtractionMode::Duration);
        assert_eq!(sizes, vec![2, 1, 3]);
    }

    #[test]
    fn test_size_weighted_sums_activity() {
        let counts = [0, 3, 5, 0, 0, 2, 0, 7, 7, 7];
        let sizes = extract_from_counts(&counts, 0, ExtractionMode::SizeWeighted);
        assert_eq!(sizes, vec![8, 2, 21]);
    }

    #[test]
    fn test_trailing_open_run_emitted() {
        let sizes = extract_from_counts(&[0, 0, 4, 4], 0, ExtractionMode::SizeWeighted);
        assert_eq!(sizes, vec![8]);
    }

    #[test]
    fn test_quiescent_trace_yields_empty() {
        let sizes = extract_from_counts(&[0, 0, 0], 0, ExtractionMode::Duration);
        assert!(sizes.is_empty());
    }

    #[test]
    fn test_baseline_threshold_applied() {
        // With baseline 2, only counts > 2 are active.
        let counts = [1, 2, 3, 4, 2, 1];
        let sizes = extract_from_counts(&counts, 2, ExtractionMode::SizeWeighted);
        assert_eq!(sizes, vec![7]);
    }

    #[test]
    fn test_conservation_size_weighted() {
        let counts = [0, 3, 5, 0, 2, 0, 9];
        let sizes = extract_from_counts(&counts, 0, ExtractionMode::SizeWeighted);
        let total_activity: u64 = counts.iter().map(|&c| c as u64).sum();
        assert!(sizes.iter().sum::<u64>() <= total_activity);
    }

    #[test]
    fn test_all_sizes_positive() {
        let counts = [0, 1, 0, 2, 0, 0, 3];
        for mode in [ExtractionMode::Duration, ExtractionMode::SizeWeighted] {
            let sizes = extract_from_counts(&counts, 0, mode);
            assert!(sizes.iter().all(|&s| s > 0));
        }
    }

    #[test]
    fn test_flip_counts_hamming() {
        let masks = vec![
            vec![false, false, true],
            vec![true, false, true],
            vec![true, true, false],
        ];
        assert_eq!(flip_counts(&masks), vec![1, 2]);
    }

    #[test]
    fn test_flip_extraction_sums_active_runs() {
        // Mean of [1, 1, 10, 10, 1] = 4.6; cut at 4.6 * 1.1 = 5.06.
        let flips = [1, 1, 10, 10, 1];
        let sizes = extract_from_flips(&flips, 0.1);
        assert_eq!(sizes, vec![20]);
    }

    #[test]
    fn test_flip_extraction_constant_series_is_quiet() {
        // Every step at the mean: nothing exceeds mean * (1 + t) for t > 0.
        let sizes = extract_from_flips(&[5, 5, 5, 5], 0.1);
        assert!(sizes.is_empty());
    }

    #[test]
    fn test_flip_mode_without_masks_is_empty() {
        let trace = ActivityTrace {
            counts: vec![1, 2, 3],
            phases: None,
            epoch_index: None,
            masks: None,
        };
        let sizes = extract(
            &trace,
            ExtractionMode::FlipCount {
                relative_threshold: 0.1,
            },
            0,
        );
        assert!(sizes.is_empty());
    }
}
