//! Weight sweeps: optimise one variant for every weight of a grid.

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::config::EstimatorConfig;
use crate::error::Result;
use crate::nns::{CostModel, Geometry, Memory};
use crate::optimizer::{optimize, Optimum, OptimizerConfig};
use crate::variants::{Algorithm, Model, WalkKnobs};

/// Weights at or above this value are left out of a sweep.
pub const MAX_SWEEP_WEIGHT: f64 = 0.49;

/// Optimised costs of one variant at one weight.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub weight: f64,
    pub runtime: f64,
    pub memory: Memory,
    pub knobs: Vec<f64>,
}

/// Sweep points of one variant in increasing weight order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SweepCurve {
    pub algorithm: Algorithm,
    pub points: Vec<SweepPoint>,
}

impl SweepCurve {
    /// Point with the largest runtime exponent.
    pub fn worst_case(&self) -> Option<&SweepPoint> {
        self.points.iter().max_by(|a, b| a.runtime.total_cmp(&b.runtime))
    }

    pub fn runtime_series(&self) -> Vec<(f64, f64)> {
        self.points.iter().map(|p| (p.weight, p.runtime)).collect()
    }

    /// Classical memory exponent per weight.
    pub fn memory_series(&self) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .map(|p| (p.weight, p.memory.classical()))
            .collect()
    }
}

/// `(index, weight)` pairs `i / range_weights` for `i` in `1..range_weights / 2`,
/// without weights at or above [`MAX_SWEEP_WEIGHT`].
pub fn weight_grid(range_weights: usize) -> Vec<(usize, f64)> {
    (1..range_weights / 2)
        .map(|i| (i, i as f64 / range_weights as f64))
        .filter(|&(_, w)| w < MAX_SWEEP_WEIGHT)
        .collect()
}

/// Optimises `algorithm` on a fresh model at weight `weight`.
///
/// A failed optimisation is recorded with its sentinel knobs and the penalty
/// runtime rather than aborting the sweep.
pub fn evaluate_point(
    algorithm: Algorithm,
    weight: f64,
    optimizer: &OptimizerConfig,
    rng: &mut ChaCha20Rng,
) -> Result<SweepPoint> {
    let model = algorithm.model(Geometry::new(weight));

    let knobs = match model.problem() {
        None => Vec::new(),
        Some(problem) => match optimize(&problem, optimizer, rng)? {
            Optimum::Found { knobs, .. } => knobs,
            Optimum::NotFound { knobs } => {
                warn!(algorithm = %algorithm, weight, "no feasible optimum found");
                knobs
            }
        },
    };

    let runtime = model.runtime(&knobs)?.penalized();
    let memory = model.memory(&knobs)?;

    if let Model::Reusable(reusable) = &model {
        let k = WalkKnobs::parse(model.name(), &knobs)?;
        if reusable.reusable_walk_applies(&k)? {
            info!(weight, "reusable walk applied");
        }
    }

    info!(algorithm = %algorithm, weight, runtime, memory = memory.classical(), "sweep point");
    Ok(SweepPoint {
        weight,
        runtime,
        memory,
        knobs,
    })
}

/// Sweeps the weight grid of `config` for one variant.
///
/// Point `i` draws from its own ChaCha20 stream seeded with `seed + i`, so
/// sequential and parallel sweeps agree for a fixed seed.
#[instrument(skip(config), fields(range_weights = config.range_weights, iters = config.iters))]
pub fn sweep_weights(algorithm: Algorithm, config: &EstimatorConfig) -> Result<SweepCurve> {
    config.validate()?;
    let optimizer = config.optimizer_config();
    let seed = config.seed.unwrap_or_else(rand::random);
    let grid = weight_grid(config.range_weights);

    let run = |&(i, weight): &(usize, f64)| {
        let mut rng = ChaCha20Rng::seed_from_u64(seed.wrapping_add(i as u64));
        evaluate_point(algorithm, weight, &optimizer, &mut rng)
    };
    let points = if config.parallel {
        grid.par_iter().map(run).collect::<Result<Vec<_>>>()?
    } else {
        grid.iter().map(run).collect::<Result<Vec<_>>>()?
    };

    let curve = SweepCurve { algorithm, points };
    if let Some(worst) = curve.worst_case() {
        info!(
            algorithm = %algorithm,
            weight = worst.weight,
            runtime = worst.runtime,
            "worst-case complexity"
        );
    }
    Ok(curve)
}
