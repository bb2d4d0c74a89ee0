//! `critnet sweep` — mean avalanche size as a function of bias strength.

use std::io::Write;
use std::path::PathBuf;

use critnet_core::{CascadeMode, Condition, TrialConfig, TrialRunner};

pub fn execute(
    strengths: &str,
    trials: usize,
    nodes: usize,
    fraction: f64,
    threshold: f64,
    seed: u64,
    output: Option<PathBuf>,
) -> std::io::Result<()> {
    let strengths = super::parse_float_list(strengths)?;

    println!("strength sweep: {trials} trials per point, {nodes} nodes, fraction {fraction}");
    println!();
    println!(
        "{:>10} {:>14} {:>14} {:>14}",
        "strength", "classical", "quantum(+)", "quantum(-)"
    );

    let mut rows = Vec::new();
    for &strength in &strengths {
        let mut config = TrialConfig::seed_batch(trials, seed);
        config.network.n_nodes = nodes;
        config.mode = CascadeMode::SeedBatch {
            n_seeds: 30,
            threshold,
        };
        config.bias_fraction = fraction;
        config.bias_strength = strength;
        // The sweep compares structured bias against baseline only.
        config.conditions = vec![
            Condition::Classical,
            Condition::QuantumPositive,
            Condition::QuantumNegative,
        ];

        let runner = TrialRunner::new(config)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;
        let report = runner.run();

        let classical = report.summary(Condition::Classical).unwrap().mean_size;
        let positive = report.summary(Condition::QuantumPositive).unwrap().mean_size;
        let negative = report.summary(Condition::QuantumNegative).unwrap().mean_size;
        println!("{strength:>10.3} {classical:>14.2} {positive:>14.2} {negative:>14.2}");
        rows.push((strength, classical, positive, negative));
    }

    if let Some(path) = output {
        let mut f = std::io::BufWriter::new(std::fs::File::create(&path)?);
        writeln!(f, "strength,classical_mean,quantum_positive_mean,quantum_negative_mean")?;
        for (strength, classical, positive, negative) in rows {
            writeln!(f, "{strength},{classical},{positive},{negative}")?;
        }
        println!();
        println!("sweep written: {}", path.display());
    }
    Ok(())
}
