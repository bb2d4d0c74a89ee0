//! CLI for critnet — avalanche comparison experiments from the command line.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "critnet")]
#[command(about = "critnet — cascading avalanches on small-world networks")]
#[command(version = critnet_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the four-condition Monte-Carlo comparison
    /// (classical / quantum-positive / quantum-negative / mimic).
    Run {
        /// Number of independent trials
        #[arg(long, default_value = "50")]
        trials: usize,

        /// Nodes in each trial's network
        #[arg(long, default_value = "1000")]
        nodes: usize,

        /// Mean degree of the ring lattice
        #[arg(long, default_value = "10")]
        mean_degree: usize,

        /// Rewiring probability
        #[arg(long, default_value = "0.1")]
        rewire: f64,

        /// Standard deviation of the Gaussian edge weights
        #[arg(long, default_value = "0.12")]
        weight_std: f64,

        /// Propagation threshold
        #[arg(long, default_value = "1.05")]
        threshold: f64,

        /// Fraction of edges receiving the structured bias
        #[arg(long, default_value = "0.1")]
        fraction: f64,

        /// Additive bias strength
        #[arg(long, default_value = "0.05")]
        strength: f64,

        /// BFS cascades per trial
        #[arg(long, default_value = "30")]
        seeds_per_trial: usize,

        /// Master seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Write the full report as JSON
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write pooled avalanche sizes as CSV (condition,size)
        #[arg(long)]
        sizes_csv: Option<PathBuf>,

        /// Write per-trial statistics as CSV
        #[arg(long)]
        stats_csv: Option<PathBuf>,
    },

    /// Sweep bias strength and report mean avalanche size per strength.
    Sweep {
        /// Comma-separated strengths, e.g. "0.05,0.1,0.15,0.2,0.25"
        #[arg(long, default_value = "0.05,0.1,0.15,0.2,0.25")]
        strengths: String,

        /// Trials per strength
        #[arg(long, default_value = "20")]
        trials: usize,

        /// Nodes in each trial's network
        #[arg(long, default_value = "1000")]
        nodes: usize,

        /// Fraction of edges receiving the structured bias
        #[arg(long, default_value = "0.1")]
        fraction: f64,

        /// Propagation threshold
        #[arg(long, default_value = "1.05")]
        threshold: f64,

        /// Master seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Write sweep rows as CSV
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Fit a power law to a CSV of avalanche sizes
    /// (needs a `size` or `avalanche_size` column).
    Fit {
        /// Input CSV path
        input: PathBuf,

        /// Minimum size entering the fit
        #[arg(long, default_value = "5")]
        x_min: f64,

        /// Log-spaced bins for the regression fit
        #[arg(long, default_value = "20")]
        bins: usize,
    },

    /// Emit synthetic reference avalanche sizes (literature-matched
    /// power-law surrogate) as CSV.
    Reference {
        /// Number of samples
        #[arg(long, default_value = "5000")]
        samples: usize,

        /// Power-law exponent
        #[arg(long, default_value = "1.5")]
        alpha: f64,

        /// Largest size
        #[arg(long, default_value = "5000")]
        max_size: f64,

        /// Seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Output CSV path (stdout when omitted)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            trials,
            nodes,
            mean_degree,
            rewire,
            weight_std,
            threshold,
            fraction,
            strength,
            seeds_per_trial,
            seed,
            output,
            sizes_csv,
            stats_csv,
        } => commands::run::execute(commands::run::RunArgs {
            trials,
            nodes,
            mean_degree,
            rewire,
            weight_std,
            threshold,
            fraction,
            strength,
            seeds_per_trial,
            seed,
            output,
            sizes_csv,
            stats_csv,
        }),
        Commands::Sweep {
            strengths,
            trials,
            nodes,
            fraction,
            threshold,
            seed,
            output,
        } => commands::sweep::execute(&strengths, trials, nodes, fraction, threshold, seed, output),
        Commands::Fit { input, x_min, bins } => commands::fit::execute(&input, x_min, bins),
        Commands::Reference {
            samples,
            alpha,
            max_size,
            seed,
            output,
        } => commands::reference::execute(samples, alpha, max_size, seed, output),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
