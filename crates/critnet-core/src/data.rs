//! Reference avalanche-size data.
//!
//! The comparison pipeline benchmarks fitted exponents against reference
//! size arrays: either recorded data loaded from CSV, or a synthetic
//! surrogate matching the neural-avalanche literature (size exponent
//! α ≈ 1.5, Beggs & Plenz 2003) when no recording is available.

use std::path::Path;

use crate::powerlaw::synthetic_powerlaw;
use crate::rng::RandomSource;

/// Synthetic power-law surrogate with literature-typical range, for use when
/// no recorded reference data is on hand.
pub fn synthetic_reference(
    n: usize,
    alpha: f64,
    x_min: f64,
    x_max: f64,
    rng: &mut RandomSource,
) -> Vec<u64> {
    synthetic_powerlaw(n, alpha, x_min, x_max, rng)
}

/// Load avalanche sizes from a CSV file with a `size` or `avalanche_size`
/// column. Rows that fail to parse are skipped.
pub fn load_sizes_csv(path: &Path) -> std::io::Result<Vec<u64>> {
    let content = std::fs::read_to_string(path)?;
    let mut lines = content.lines();

    let header = lines.next().unwrap_or("");
    let column = header
        .split(',')
        .position(|name| {
            let name = name.trim();
            name == "size" || name == "avalanche_size"
        })
        .ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "no `size` or `avalanche_size` column in header",
            )
        })?;

    let mut sizes = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(field) = line.split(',').nth(column) {
            if let Ok(size) = field.trim().parse::<u64>() {
                sizes.push(size);
            }
        }
    }
    Ok(sizes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::powerlaw::fit_mle;
    use crate::rng::source_from_seed;
    use std::io::Write;

    #[test]
    fn test_synthetic_reference_matches_literature_alpha() {
        let mut rng = source_from_seed(42);
        let sizes = synthetic_reference(5000, 1.5, 1.0, 5000.0, &mut rng);
        let fit = fit_mle(&sizes, 1.0);
        assert!((fit.alpha - 1.5).abs() < 0.15, "alpha = {}", fit.alpha);
    }

    #[test]
    fn test_load_sizes_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sizes.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "condition,avalanche_size").unwrap();
        writeln!(f, "classical,12").unwrap();
        writeln!(f, "classical,7").unwrap();
        writeln!(f, "quantum_positive,340").unwrap();
        drop(f);

        let sizes = load_sizes_csv(&path).unwrap();
        assert_eq!(sizes, vec![12, 7, 340]);
    }

    #[test]
    fn test_load_sizes_csv_missing_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "a,b\n1,2\n").unwrap();
        assert!(load_sizes_csv(&path).is_err());
    }

    #[test]
    fn test_load_sizes_csv_skips_bad_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixed.csv");
        std::fs::write(&path, "size\n5\nnot_a_number\n9\n\n").unwrap();
        let sizes = load_sizes_csv(&path).unwrap();
        assert_eq!(sizes, vec![5, 9]);
    }
}
