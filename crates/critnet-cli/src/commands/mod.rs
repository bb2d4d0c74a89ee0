pub mod fit;
pub mod reference;
pub mod run;
pub mod sweep;

use std::io::Write;
use std::path::Path;

/// Write `(condition, size)` rows for every pooled avalanche size.
pub fn write_sizes_csv(
    path: &Path,
    report: &critnet_core::ComparisonReport,
) -> std::io::Result<()> {
    let mut f = std::io::BufWriter::new(std::fs::File::create(path)?);
    writeln!(f, "condition,size")?;
    for series in &report.conditions {
        for &size in &series.sizes {
            writeln!(f, "{},{}", series.condition, size)?;
        }
    }
    Ok(())
}

/// Write one row per (trial, condition) with the full scalar bundle.
pub fn write_stats_csv(
    path: &Path,
    report: &critnet_core::ComparisonReport,
) -> std::io::Result<()> {
    let mut f = std::io::BufWriter::new(std::fs::File::create(path)?);
    writeln!(
        f,
        "condition,trial,n_avalanches,mean_size,std_size,skewness,large_fraction,alpha,alpha_stderr,entropy_coherent,entropy_effect"
    )?;
    for r in report.records() {
        writeln!(
            f,
            "{},{},{},{},{},{},{},{},{},{},{}",
            r.condition,
            r.trial,
            r.n_avalanches,
            r.mean_size,
            r.std_size,
            r.skewness,
            r.large_fraction,
            r.alpha,
            r.alpha_stderr,
            r.entropy_coherent,
            r.entropy_effect
        )?;
    }
    Ok(())
}

/// Parse a comma-separated list of floats, rejecting empty and malformed
/// entries with the offending text in the error.
pub fn parse_float_list(input: &str) -> std::io::Result<Vec<f64>> {
    input
        .split(',')
        .map(|s| {
            s.trim().parse::<f64>().map_err(|_| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("not a number: `{s}`"),
                )
            })
        })
        .collect()
}
