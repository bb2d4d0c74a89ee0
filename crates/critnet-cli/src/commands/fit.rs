//! `critnet fit` — power-law fit of a recorded size distribution.

use std::path::Path;

use critnet_core::{data, fit_loglog, fit_mle, ks_statistic};

pub fn execute(input: &Path, x_min: f64, bins: usize) -> std::io::Result<()> {
    let sizes = data::load_sizes_csv(input)?;
    println!("{} sizes loaded from {}", sizes.len(), input.display());

    let mle = fit_mle(&sizes, x_min);
    if mle.alpha.is_nan() {
        println!(
            "insufficient data: {} samples at or above x_min={x_min} (need {})",
            mle.n_tail,
            critnet_core::powerlaw::MIN_TAIL_SAMPLES
        );
        return Ok(());
    }

    let ks = ks_statistic(&sizes, mle.alpha, x_min);
    println!("MLE:        alpha = {:.3} +/- {:.3}  (n_tail = {})", mle.alpha, mle.stderr, mle.n_tail);
    println!("KS:         {ks:.4}");

    let regression = fit_loglog(&sizes, bins, x_min);
    if regression.alpha.is_nan() {
        println!("regression: too few occupied bins for a log-binned fit");
    } else {
        println!(
            "regression: alpha = {:.3} +/- {:.3}  ({} occupied bins)",
            regression.alpha,
            regression.stderr,
            regression.bin_centers.len()
        );
    }
    Ok(())
}
