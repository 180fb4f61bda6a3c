use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use tracing::info;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

use sieving_isd::lower_bound::{check_conjecture, lower_bound_grid};
use sieving_isd::{run_sweeps, write_series, Algorithm, EstimatorConfig};

/// Asymptotic time and memory exponents of NNS-based sieving ISD.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Optimise algorithm variants over a grid of weights
    ///
    /// Writes one result file per variant into the data directory and the
    /// runtime curves of all variants into the plots directory.
    Sweep {
        /// Variants to sweep (all optimised variants if omitted)
        algorithms: Vec<Algorithm>,

        /// JSON configuration file; flags override its values
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(long)]
        range_weights: Option<usize>,

        /// Optimizer restarts per weight
        #[arg(long)]
        iters: Option<usize>,

        #[arg(long)]
        prec: Option<f64>,

        #[arg(long)]
        seed: Option<u64>,

        /// Evaluate weights in parallel
        #[arg(long)]
        parallel: bool,

        #[arg(long)]
        data_dir: Option<PathBuf>,

        #[arg(long)]
        plots_dir: Option<PathBuf>,
    },

    /// Compare the sieving ISD lower bound with quantum Prange over all rates
    Conjecture {
        #[arg(long, default_value_t = 100)]
        range_rates: usize,

        #[arg(long, default_value_t = 1e-10)]
        prec: f64,

        #[arg(long, default_value = "plots")]
        plots_dir: PathBuf,
    },

    /// Tabulate the lower bound over (n, w) for one rate
    LowerBoundGrid {
        #[arg(long)]
        rate: f64,

        #[arg(long, default_value_t = 100)]
        range_n: usize,

        #[arg(long, default_value_t = 500)]
        range_w: usize,

        #[arg(long, default_value = "plots")]
        plots_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the results.
    let level = cli.verbose.tracing_level_filter();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!("warn,sieving_isd={level}")))
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE)
        .init();

    match cli.command {
        Commands::Sweep {
            algorithms,
            config,
            range_weights,
            iters,
            prec,
            seed,
            parallel,
            data_dir,
            plots_dir,
        } => {
            let mut cfg = match config {
                Some(path) => EstimatorConfig::from_json_file(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => EstimatorConfig::default(),
            };
            if let Some(v) = range_weights {
                cfg.range_weights = v;
            }
            if let Some(v) = iters {
                cfg.iters = v;
            }
            if let Some(v) = prec {
                cfg.prec = v;
            }
            if seed.is_some() {
                cfg.seed = seed;
            }
            cfg.parallel |= parallel;
            if let Some(v) = data_dir {
                cfg.data_dir = v;
            }
            if let Some(v) = plots_dir {
                cfg.plots_dir = v;
            }
            run_sweep(&algorithms, &cfg)
        }
        Commands::Conjecture {
            range_rates,
            prec,
            plots_dir,
        } => run_conjecture(range_rates, prec, plots_dir),
        Commands::LowerBoundGrid {
            rate,
            range_n,
            range_w,
            plots_dir,
        } => run_lower_bound_grid(rate, range_n, range_w, plots_dir),
    }
}

fn run_sweep(algorithms: &[Algorithm], config: &EstimatorConfig) -> Result<()> {
    let algorithms = if algorithms.is_empty() {
        Algorithm::OPTIMIZED.to_vec()
    } else {
        algorithms.to_vec()
    };

    let curves = run_sweeps(&algorithms, config)?;
    info!(dir = %config.data_dir.display(), "results written");

    for curve in &curves {
        if let Some(worst) = curve.worst_case() {
            println!(
                "{} worst-case complexity: {} (w = {})",
                curve.algorithm, worst.runtime, worst.weight
            );
        }
    }

    let series: Vec<(&str, Vec<(f64, f64)>)> = curves
        .iter()
        .map(|c| (c.algorithm.label(), c.runtime_series()))
        .collect();
    let name = format!(
        "NNS_w{}_i{}_p{:e}.txt",
        config.range_weights, config.iters, config.prec
    );
    let path = write_series(&config.plots_dir, &name, &series)?;
    info!(path = %path.display(), "runtime series written");
    Ok(())
}

fn run_conjecture(range_rates: usize, prec: f64, plots_dir: PathBuf) -> Result<()> {
    let report = check_conjecture(range_rates, prec)?;
    println!(
        "Number of violations = {} out of {}",
        report.violations(),
        range_rates
    );

    let series = [
        ("lower bound Quantum SievingISD", report.lower_bound_series()),
        ("quantum Prange", report.prange_series()),
    ];
    let path = write_series(&plots_dir, &format!("conjecture_r{range_rates}.txt"), &series)?;
    info!(path = %path.display(), "comparison series written");
    Ok(())
}

fn run_lower_bound_grid(rate: f64, range_n: usize, range_w: usize, plots_dir: PathBuf) -> Result<()> {
    let slices = lower_bound_grid(rate, range_n, range_w)?;
    let labels: Vec<String> = slices.iter().map(|s| s.label()).collect();
    let series: Vec<(&str, Vec<(f64, f64)>)> = labels
        .iter()
        .zip(&slices)
        .map(|(label, slice)| (label.as_str(), slice.points.clone()))
        .collect();
    let path = write_series(&plots_dir, &format!("lower_bound_k{rate}.txt"), &series)?;
    println!("{} slices written to {}", slices.len(), path.display());
    Ok(())
}
