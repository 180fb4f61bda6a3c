pub mod config;
pub mod entropy;
pub mod error;
pub mod lower_bound;
pub mod nns;
pub mod optimizer;
pub mod persistence;
pub mod scalar;
pub mod simplex;
pub mod sweep;
pub mod variants;


pub use config::EstimatorConfig;
pub use entropy::{binary_entropy, entropy_inverse, list_size, log_binomial, weight_from_rate};
pub use error::{EstimatorError, Result};
pub use lower_bound::{
    check_conjecture, check_conjecture_at, lower_bound_grid, optimize_lower_bound, quantum_prange,
    quantum_sieving_isd_lower_bound, BoundPoint, ConjectureReport, GridSlice, RateCheck,
};
pub use nns::{Cost, CostModel, Geometry, Memory, QuantumMemory, Wedge};
pub use optimizer::{optimize, validity, Constraint, Optimum, OptimizerConfig, Problem, StartConfig};
pub use persistence::{read_curve, read_results, results_file_name, write_results, write_series};
pub use sweep::{sweep_weights, SweepCurve, SweepPoint};
pub use variants::{Algorithm, Model};

/// Estimates every variant in `algorithms` over the weight grid of `config`
/// and writes one result file per variant into `config.data_dir`.
pub fn run_sweeps(algorithms: &[Algorithm], config: &EstimatorConfig) -> Result<Vec<SweepCurve>> {
    config.validate()?;
    let mut curves = Vec::with_capacity(algorithms.len());
    for &algorithm in algorithms {
        let curve = sweep_weights(algorithm, config)?;
        write_results(&config.data_dir, &curve, config.range_weights, config.iters, config.prec)?;
        curves.push(curve);
    }
    Ok(curves)
}
