//! Summary statistics and cross-condition comparison.
//!
//! Per-run scalars (mean, population standard deviation, Fisher skewness,
//! large-event fraction, Shannon entropy, sample entropy) and the two-sample
//! machinery the Monte-Carlo pipeline aggregates with (Welch t-test, Cohen's
//! d effect size).
//!
//! Degenerate inputs follow the sentinel convention: a constant sample has
//! skewness 0 (not NaN), sample entropy on too few points is NaN (not a
//! panic), Cohen's d with zero pooled spread is 0. The Monte-Carlo loop
//! aggregates many trials of which some legitimately produce degenerate
//! statistics; dropping those trials would bias the aggregate toward the
//! trials that happened to produce data.

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};

// ---------------------------------------------------------------------------
// Per-sample summary statistics
// ---------------------------------------------------------------------------

/// Summary statistics of one sample of avalanche sizes (or any scalar
/// series).
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SampleStats {
    pub n: usize,
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    /// Fisher skewness `mean(((x - mean) / std)^3)`; 0 when std is 0.
    pub skewness: f64,
    /// Fraction of samples strictly above the large-event threshold.
    pub large_fraction: f64,
}

/// Compute summary statistics with a fixed large-event threshold.
pub fn sample_stats(values: &[f64], large_threshold: f64) -> SampleStats {
    let n = values.len();
    if n == 0 {
        return SampleStats {
            n: 0,
            mean: 0.0,
            std_dev: 0.0,
            skewness: 0.0,
            large_fraction: 0.0,
        };
    }
    let nf = n as f64;
    let mean = values.iter().sum::<f64>() / nf;
    let variance = values.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / nf;
    let std_dev = variance.sqrt();

    let skewness = if std_dev > 1e-12 {
        values
            .iter()
            .map(|&x| ((x - mean) / std_dev).powi(3))
            .sum::<f64>()
            / nf
    } else {
        0.0
    };

    let large = values.iter().filter(|&&x| x > large_threshold).count();

    SampleStats {
        n,
        mean,
        std_dev,
        skewness,
        large_fraction: large as f64 / nf,
    }
}

/// Convenience for integer avalanche sizes.
pub fn size_stats(sizes: &[u64], large_threshold: f64) -> SampleStats {
    let values: Vec<f64> = sizes.iter().map(|&s| s as f64).collect();
    sample_stats(&values, large_threshold)
}

// ---------------------------------------------------------------------------
// Entropy measures
// ---------------------------------------------------------------------------

/// Shannon entropy (bits) of an activity vector, treated as an unnormalized
/// distribution. An all-zero vector has zero entropy.
pub fn shannon_entropy(activity: &[f64]) -> f64 {
    let total: f64 = activity.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    activity
        .iter()
        .filter(|&&a| a > 0.0)
        .map(|&a| {
            let p = a / total;
            -p * p.log2()
        })
        .sum()
}

/// Sample entropy of a time series: `-ln(A / B)` where `A` and `B` count
/// template matches of length `m + 1` and `m` within tolerance
/// `r * std(series)`. Lower values mean a more predictable series.
///
/// Returns NaN when the series is shorter than `m + 2` points, the tolerance
/// is zero (constant series), or either match count is zero. All of these
/// are expected outcomes on short or frozen windows, handled by the caller.
pub fn sample_entropy(series: &[f64], m: usize, r: f64) -> f64 {
    let n = series.len();
    if n < m + 2 {
        return f64::NAN;
    }
    let mean = series.iter().sum::<f64>() / n as f64;
    let std = (series.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / n as f64).sqrt();
    let tolerance = r * std;
    if tolerance == 0.0 {
        return f64::NAN;
    }

    let count_matches = |template_len: usize| -> u64 {
        let mut count = 0u64;
        for i in 0..n - template_len {
            for j in (i + 1)..n - template_len {
                let within = (0..template_len)
                    .all(|k| (series[i + k] - series[j + k]).abs() <= tolerance);
                if within {
                    count += 1;
                }
            }
        }
        count
    };

    let a = count_matches(m + 1);
    let b = count_matches(m);
    if a == 0 || b == 0 {
        return f64::NAN;
    }
    -((a as f64 / b as f64).ln())
}

// ---------------------------------------------------------------------------
// Two-sample comparison
// ---------------------------------------------------------------------------

/// Two-sample test result.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TTest {
    pub t: f64,
    pub p: f64,
}

/// Welch's two-sample t-test (unequal variances), two-sided p-value via the
/// Student's t CDF. Returns NaN fields when either sample has fewer than two
/// points or both variances are zero.
pub fn welch_t_test(a: &[f64], b: &[f64]) -> TTest {
    let na = a.len() as f64;
    let nb = b.len() as f64;
    if a.len() < 2 || b.len() < 2 {
        return TTest {
            t: f64::NAN,
            p: f64::NAN,
        };
    }
    let mean_a = a.iter().sum::<f64>() / na;
    let mean_b = b.iter().sum::<f64>() / nb;
    let var_a = a.iter().map(|&x| (x - mean_a).powi(2)).sum::<f64>() / (na - 1.0);
    let var_b = b.iter().map(|&x| (x - mean_b).powi(2)).sum::<f64>() / (nb - 1.0);

    let se2 = var_a / na + var_b / nb;
    if se2 == 0.0 {
        return TTest {
            t: f64::NAN,
            p: f64::NAN,
        };
    }
    let t = (mean_a - mean_b) / se2.sqrt();

    // Welch–Satterthwaite degrees of freedom.
    let df = se2.powi(2)
        / ((var_a / na).powi(2) / (na - 1.0) + (var_b / nb).powi(2) / (nb - 1.0));
    let p = match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => 2.0 * (1.0 - dist.cdf(t.abs())),
        Err(_) => f64::NAN,
    };
    TTest { t, p }
}

/// Cohen's d effect size with pooled standard deviation; 0 when the pooled
/// spread is 0.
pub fn cohens_d(a: &[f64], b: &[f64]) -> f64 {
    let na = a.len() as f64;
    let nb = b.len() as f64;
    if a.len() < 2 || b.len() < 2 {
        return 0.0;
    }
    let mean_a = a.iter().sum::<f64>() / na;
    let mean_b = b.iter().sum::<f64>() / nb;
    let var_a = a.iter().map(|&x| (x - mean_a).powi(2)).sum::<f64>() / na;
    let var_b = b.iter().map(|&x| (x - mean_b).powi(2)).sum::<f64>() / nb;
    let pooled = (((na - 1.0) * var_a + (nb - 1.0) * var_b) / (na + nb - 2.0)).sqrt();
    if pooled > 0.0 {
        (mean_a - mean_b) / pooled
    } else {
        0.0
    }
}
