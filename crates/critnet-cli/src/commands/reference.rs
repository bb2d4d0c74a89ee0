//! `critnet reference` — synthetic literature-matched surrogate data.

use std::io::Write;
use std::path::PathBuf;

use critnet_core::data::synthetic_reference;
use critnet_core::rng::source_from_seed;

pub fn execute(
    samples: usize,
    alpha: f64,
    max_size: f64,
    seed: u64,
    output: Option<PathBuf>,
) -> std::io::Result<()> {
    let mut rng = source_from_seed(seed);
    let sizes = synthetic_reference(samples, alpha, 1.0, max_size, &mut rng);

    match output {
        Some(path) => {
            let mut f = std::io::BufWriter::new(std::fs::File::create(&path)?);
            writeln!(f, "size")?;
            for size in &sizes {
                writeln!(f, "{size}")?;
            }
            println!(
                "{} surrogate sizes (alpha={alpha}) written: {}",
                sizes.len(),
                path.display()
            );
        }
        None => {
            let stdout = std::io::stdout();
            let mut f = stdout.lock();
            writeln!(f, "size")?;
            for size in &sizes {
                writeln!(f, "{size}")?;
            }
        }
    }
    Ok(())
}
