//! Constrained multi-start optimisation of a cost model's knobs.
//!
//! A [`Problem`] bundles the objective, the per-knob bounds and the named
//! constraints of one variant. [`optimize`] draws feasible random starts, runs
//! one bounded simplex search per start on the penalised objective, and keeps
//! the best result that converged and still satisfies every constraint.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::simplex::{self, SimplexOptions};

/// Knob value used to fill the start vector when no feasible start is found.
pub const START_SENTINEL: f64 = 100.0;

type KnobFn<'a> = Box<dyn Fn(&[f64]) -> Result<f64> + Send + Sync + 'a>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConstraintKind {
    /// Satisfied when `|g(x)| <= tol`.
    Equality,
    /// Satisfied when `g(x) >= -tol`.
    Inequality,
}

/// Named constraint `g(x) = 0` or `g(x) >= 0`.
pub struct Constraint<'a> {
    pub name: &'static str,
    pub kind: ConstraintKind,
    fun: KnobFn<'a>,
}

impl<'a> Constraint<'a> {
    pub fn inequality<F>(name: &'static str, fun: F) -> Self
    where
        F: Fn(&[f64]) -> Result<f64> + Send + Sync + 'a,
    {
        Self {
            name,
            kind: ConstraintKind::Inequality,
            fun: Box::new(fun),
        }
    }

    pub fn equality<F>(name: &'static str, fun: F) -> Self
    where
        F: Fn(&[f64]) -> Result<f64> + Send + Sync + 'a,
    {
        Self {
            name,
            kind: ConstraintKind::Equality,
            fun: Box::new(fun),
        }
    }

    pub fn evaluate(&self, x: &[f64]) -> Result<f64> {
        (self.fun)(x)
    }

    /// Amount by which `x` violates this constraint, zero when satisfied.
    pub fn violation(&self, x: &[f64]) -> Result<f64> {
        let g = self.evaluate(x)?;
        Ok(match self.kind {
            ConstraintKind::Equality => g.abs(),
            ConstraintKind::Inequality => (-g).max(0.0),
        })
    }
}

impl std::fmt::Debug for Constraint<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Constraint")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

/// True iff every constraint holds at `x` within `tol`.
pub fn validity(constraints: &[Constraint<'_>], x: &[f64], tol: f64) -> Result<bool> {
    for constraint in constraints {
        let g = constraint.evaluate(x)?;
        let ok = match constraint.kind {
            ConstraintKind::Equality => g.abs() <= tol,
            ConstraintKind::Inequality => g >= -tol,
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

/// How random starting points are drawn.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StartConfig {
    /// Each knob is drawn uniformly from `[0, range]`.
    pub range: f64,
    /// Draws before giving up and returning the sentinel start.
    pub attempts: usize,
    /// Constraint tolerance a start must meet.
    pub tolerance: f64,
}

impl Default for StartConfig {
    fn default() -> Self {
        Self {
            range: 0.009,
            attempts: 10_000,
            tolerance: 1e-7,
        }
    }
}

/// Parameters of the multi-start search.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Number of restarts.
    pub iters: usize,
    /// Convergence tolerance of each restart and of the final validity check.
    pub prec: f64,
    /// Initial "best so far"; results must beat it to be kept.
    pub min_val: f64,
    /// Iteration budget of each restart.
    pub max_iter: usize,
    pub start: StartConfig,
    /// Edge length of the initial simplex.
    pub initial_step: f64,
    /// Weight of the squared constraint violations added to the objective.
    pub penalty_weight: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            iters: 100,
            prec: 1e-10,
            min_val: 1000.0,
            max_iter: 2000,
            start: StartConfig::default(),
            initial_step: 0.02,
            penalty_weight: 1e4,
        }
    }
}

/// Objective, box and constraints of one variant's knob search.
pub struct Problem<'a> {
    objective: KnobFn<'a>,
    pub bounds: Vec<(f64, f64)>,
    pub constraints: Vec<Constraint<'a>>,
}

impl<'a> Problem<'a> {
    pub fn new<F>(objective: F, bounds: Vec<(f64, f64)>, constraints: Vec<Constraint<'a>>) -> Self
    where
        F: Fn(&[f64]) -> Result<f64> + Send + Sync + 'a,
    {
        Self {
            objective: Box::new(objective),
            bounds,
            constraints,
        }
    }

    pub fn dimension(&self) -> usize {
        self.bounds.len()
    }

    pub fn objective(&self, x: &[f64]) -> Result<f64> {
        (self.objective)(x)
    }

    pub fn is_valid(&self, x: &[f64], tol: f64) -> Result<bool> {
        validity(&self.constraints, x, tol)
    }

    /// Objective plus `weight` times the squared constraint violations.
    pub fn penalized_objective(&self, x: &[f64], weight: f64) -> Result<f64> {
        let mut value = self.objective(x)?;
        for constraint in &self.constraints {
            let v = constraint.violation(x)?;
            value += weight * v * v;
        }
        Ok(value)
    }

    /// Draws knobs uniformly from `[0, range]` until the constraints hold.
    ///
    /// Returns the all-[`START_SENTINEL`] vector when every attempt fails.
    pub fn random_start<R: Rng + ?Sized>(&self, rng: &mut R, config: &StartConfig) -> Result<Vec<f64>> {
        for _ in 0..config.attempts {
            let start: Vec<f64> = (0..self.dimension())
                .map(|_| rng.gen_range(0.0..=config.range))
                .collect();
            if self.is_valid(&start, config.tolerance)? {
                return Ok(start);
            }
        }
        debug!(attempts = config.attempts, "no feasible start found");
        Ok(vec![START_SENTINEL; self.dimension()])
    }
}

impl std::fmt::Debug for Problem<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Problem")
            .field("bounds", &self.bounds)
            .field("constraints", &self.constraints)
            .finish()
    }
}

/// Result of [`optimize`].
#[derive(Clone, Debug, PartialEq)]
pub enum Optimum {
    /// Best converged, valid restart.
    Found {
        knobs: Vec<f64>,
        value: f64,
        /// Restarts that improved on the best value so far.
        improvements: usize,
    },
    /// No restart converged to a valid point below `min_val`.
    NotFound { knobs: Vec<f64> },
}

impl Optimum {
    pub fn knobs(&self) -> &[f64] {
        match self {
            Optimum::Found { knobs, .. } | Optimum::NotFound { knobs } => knobs,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Optimum::Found { .. })
    }
}

/// Runs `config.iters` restarts and returns the best valid local optimum.
pub fn optimize<R: Rng + ?Sized>(problem: &Problem<'_>, config: &OptimizerConfig, rng: &mut R) -> Result<Optimum> {
    let options = SimplexOptions {
        initial_step: config.initial_step,
        tolerance: config.prec,
        max_iter: config.max_iter,
    };

    let mut min_val = config.min_val;
    let mut best: Option<Vec<f64>> = None;
    let mut improvements = 0;

    for restart in 0..config.iters {
        let start = problem.random_start(rng, &config.start)?;
        let local = simplex::minimize(
            |x| problem.penalized_objective(x, config.penalty_weight),
            &start,
            &problem.bounds,
            &options,
        )?;
        let value = problem.objective(&local.x)?;
        let accepted = local.success && value < min_val && problem.is_valid(&local.x, config.prec)?;

        debug!(
            restart,
            success = local.success,
            iterations = local.iterations,
            value,
            accepted,
            "restart finished"
        );

        if accepted {
            min_val = value;
            best = Some(local.x);
            improvements += 1;
        }
    }

    Ok(match best {
        Some(knobs) => Optimum::Found {
            knobs,
            value: min_val,
            improvements,
        },
        None => Optimum::NotFound {
            knobs: vec![START_SENTINEL; problem.dimension()],
        },
    })
}
