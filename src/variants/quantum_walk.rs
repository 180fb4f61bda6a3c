//! Alpha-RPC bucketing with a quantum walk inside each bucket.
//!
//! The walk runs on a Johnson graph whose vertices are subsets of size
//! `vertex_size` of an alpha-bucket. A second filtering layer with centers of
//! weight `v_beta` and overlap `beta` speeds up the update step. The
//! sparsified and reusable variants reuse everything here and only change
//! the search term.

use crate::entropy::log_binomial;
use crate::error::{EstimatorError, Result};
use crate::nns::{max_wedge, Cost, CostModel, Geometry, Memory, QuantumMemory, WEDGE_TOLERANCE};
use crate::optimizer::{Constraint, Problem};

use super::{bucketing_constraints, bucketing_feasible, sieve_runtime};

pub const WALK_KNOBS: &[&str] = &["v", "alpha", "vertex_size", "v_beta", "beta"];

const SNAP_ABS_TOLERANCE: f64 = 1e-5;
const SNAP_REL_TOLERANCE: f64 = 1e-9;

/// Knob vector of the walk variants.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WalkKnobs {
    pub v: f64,
    pub alpha: f64,
    pub vertex_size: f64,
    pub v_beta: f64,
    pub beta: f64,
}

impl WalkKnobs {
    pub fn parse(algorithm: &'static str, knobs: &[f64]) -> Result<Self> {
        match *knobs {
            [v, alpha, vertex_size, v_beta, beta] => Ok(Self {
                v,
                alpha,
                vertex_size,
                v_beta,
                beta,
            }),
            _ => Err(EstimatorError::KnobArity {
                algorithm,
                expected: WALK_KNOBS.len(),
                got: knobs.len(),
            }),
        }
    }

    /// Replaces `alpha` by `v` when the two are numerically equal.
    ///
    /// Runtime and memory evaluate the snapped knobs while callers keep the
    /// vector they passed in, so the reported optimum may carry `alpha != v`.
    pub fn snapped(self) -> Self {
        let scale = self.v.abs().max(self.alpha.abs());
        if (self.v - self.alpha).abs() <= (SNAP_REL_TOLERANCE * scale).max(SNAP_ABS_TOLERANCE) {
            Self {
                alpha: self.v,
                ..self
            }
        } else {
            self
        }
    }
}

/// Intermediate quantities of the bucket search shared by the walk variants.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WalkTerms {
    /// Probability that a bucket pair is a solution.
    pub probability: f64,
    /// Expected solutions in one alpha-bucket.
    pub solutions: f64,
    /// Beta-buckets a solution pair falls into together.
    pub d_beta: f64,
    /// Inverse probability that a vertex element lands in a given beta-bucket.
    pub codomain: f64,
}

impl WalkTerms {
    pub fn new(g: &Geometry, k: &WalkKnobs) -> Result<Self> {
        let probability = g.match_probability(k.v, k.alpha)?;
        let solutions = (2.0 * g.bucket_size(k.v, k.alpha) + probability).max(0.0);

        let e_max = g.wedge_size(k.v, k.alpha, None)?.overlap;
        let filter = log_binomial(k.alpha, k.beta) + log_binomial(k.v - k.alpha, k.v_beta - k.beta);
        let inner = max_wedge(k.v, k.alpha, k.v_beta, k.beta, Some(e_max), WEDGE_TOLERANCE)?;

        Ok(Self {
            probability,
            solutions,
            d_beta: filter - inner.log_size,
            codomain: log_binomial(k.v, k.v_beta) - filter,
        })
    }

    /// Vertex elements in one beta-bucket.
    pub fn beta_bucket_size(&self, vertex_size: f64) -> f64 {
        vertex_size - self.codomain
    }
}

/// Walk parameters in the setup/update/check framework.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct WalkParameters {
    setup: f64,
    update: f64,
    check: f64,
    delta: f64,
    epsilon: f64,
}

impl WalkParameters {
    pub(crate) fn new(vertex_size: f64, valid_beta_buckets: f64, beta_bucket_size: f64, epsilon: f64) -> Self {
        Self {
            setup: vertex_size + valid_beta_buckets,
            update: valid_beta_buckets.max((valid_beta_buckets + beta_bucket_size) / 2.0),
            check: 0.0,
            delta: -vertex_size,
            epsilon,
        }
    }

    /// `max(setup, extra - epsilon/2 + max(update - delta/2, check))`.
    pub(crate) fn cost(&self, extra: f64) -> f64 {
        let walk = extra - self.epsilon / 2.0 + (self.update - self.delta / 2.0).max(self.check);
        self.setup.max(walk)
    }
}

/// Feasibility of a walk knob vector.
pub(crate) fn walk_feasible(g: &Geometry, k: &WalkKnobs) -> Result<bool> {
    if !bucketing_feasible(g, k.v, k.alpha) || k.beta < 0.0 || k.vertex_size < 0.0 {
        return Ok(false);
    }
    if g.bucket_size(k.v, k.alpha) < k.vertex_size {
        return Ok(false);
    }
    if k.v < k.v_beta || k.v_beta < k.beta || k.alpha < k.beta || (k.v - k.alpha) < (k.v_beta - k.beta) {
        return Ok(false);
    }
    // the walk needs 1/p >= s^2
    Ok(2.0 * k.vertex_size <= -g.match_probability(k.v, k.alpha)?)
}

/// Runtime skeleton of the walk variants around a variant-specific search cost.
pub(crate) fn walk_runtime<F>(g: &Geometry, algorithm: &'static str, knobs: &[f64], search: F) -> Result<Cost>
where
    F: FnOnce(&WalkKnobs) -> Result<f64>,
{
    let k = WalkKnobs::parse(algorithm, knobs)?.snapped();
    if !walk_feasible(g, &k)? {
        return Ok(Cost::Infeasible);
    }
    let t = search(&k)?;
    Ok(Cost::Feasible(sieve_runtime(g, k.v, k.alpha, t)?))
}

/// Memory of the walk variants with quantum memory `quantum`.
pub(crate) fn walk_memory(g: &Geometry, k: &WalkKnobs, quantum: f64) -> Memory {
    Memory::Quantum(QuantumMemory {
        classical: g.list_size(),
        quantum,
        qracm: g.bucket_size(k.v, k.alpha),
        qraqm: quantum,
    })
}

/// Five-knob problem shared by all walk variants.
pub(crate) fn walk_problem<'a, M>(model: &'a M) -> Problem<'a>
where
    M: CostModel + Sync,
{
    let g = *model.geometry();
    let w = g.w();

    let mut constraints = bucketing_constraints(w);
    constraints.extend([
        Constraint::inequality("bucket_size >= vertex_size", move |x: &[f64]| {
            Ok(g.bucket_size(x[0], x[1]) - x[2])
        }),
        Constraint::inequality("v >= v_beta", |x: &[f64]| Ok(x[0] - x[3])),
        Constraint::inequality("v_beta >= beta", |x: &[f64]| Ok(x[3] - x[4])),
        Constraint::inequality("alpha >= beta", |x: &[f64]| Ok(x[1] - x[4])),
        Constraint::inequality("v - alpha >= v_beta - beta", |x: &[f64]| {
            Ok(x[0] - x[1] - (x[3] - x[4]))
        }),
        Constraint::inequality("1/p >= vertex_size^2", move |x: &[f64]| {
            Ok(-g.match_probability(x[0], x[1])? - 2.0 * x[2])
        }),
    ]);

    Problem::new(
        move |x: &[f64]| Ok(model.runtime(x)?.penalized()),
        vec![(0.0, 1.0), (0.0, w), (0.0, 1.0), (0.0, 1.0), (0.0, 1.0)],
        constraints,
    )
}

/// Quantum walk with a second layer of RPC filtering.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RpcQuantumWalk {
    geometry: Geometry,
}

impl RpcQuantumWalk {
    pub fn new(geometry: Geometry) -> Self {
        Self { geometry }
    }

    /// Cost of searching one alpha-bucket with the walk.
    pub fn time_bucket_search(&self, k: &WalkKnobs) -> Result<f64> {
        let terms = WalkTerms::new(&self.geometry, k)?;
        let epsilon = (2.0 * k.vertex_size + terms.probability).min(0.0);
        let walk = WalkParameters::new(
            k.vertex_size,
            terms.d_beta,
            terms.beta_bucket_size(k.vertex_size),
            epsilon,
        );
        Ok(terms.solutions + walk.cost(0.0))
    }
}

impl CostModel for RpcQuantumWalk {
    fn name(&self) -> &'static str {
        "RPC_quantum_walk"
    }

    fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    fn knob_names(&self) -> &'static [&'static str] {
        WALK_KNOBS
    }

    fn runtime(&self, knobs: &[f64]) -> Result<Cost> {
        walk_runtime(&self.geometry, self.name(), knobs, |k| self.time_bucket_search(k))
    }

    fn memory(&self, knobs: &[f64]) -> Result<Memory> {
        let k = WalkKnobs::parse(self.name(), knobs)?.snapped();
        let terms = WalkTerms::new(&self.geometry, &k)?;
        Ok(walk_memory(&self.geometry, &k, k.vertex_size + terms.d_beta))
    }

    fn problem(&self) -> Option<Problem<'_>> {
        Some(walk_problem(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn knobs(v: f64, alpha: f64, vertex_size: f64, v_beta: f64, beta: f64) -> WalkKnobs {
        WalkKnobs {
            v,
            alpha,
            vertex_size,
            v_beta,
            beta,
        }
    }

    #[test]
    fn test_terms() {
        let g = Geometry::new(0.3);
        let k = knobs(0.4, 0.1, 0.02, 0.05, 0.01);
        let terms = WalkTerms::new(&g, &k).unwrap();
        assert!((terms.solutions - 0.047_515_117_517_026_97).abs() < 1e-8);
        assert!((terms.d_beta - 0.000_339_853_941_383_055_9).abs() < 1e-8);
        assert!((terms.beta_bucket_size(k.vertex_size) - 0.019_426_634_044_961_144).abs() < 1e-9);
    }

    #[test]
    fn test_reference_values() {
        let qw = RpcQuantumWalk::new(Geometry::new(0.3));
        let cases = [
            ([0.4, 0.1, 0.02, 0.05, 0.01], 0.074_412_872_886_396_34, 0.083_471_974_518_425_83),
            ([0.4, 0.1, 0.01, 0.3, 0.08], 0.074_259_248_193_048_85, 0.083_318_349_825_078_35),
        ];
        for (raw, search, runtime) in cases {
            let k = WalkKnobs::parse("test", &raw).unwrap();
            assert!((qw.time_bucket_search(&k).unwrap() - search).abs() < 1e-8);
            let t = qw.runtime(&raw).unwrap().value().unwrap();
            assert!((t - runtime).abs() < 1e-8, "{raw:?}: {t}");
        }

        let qw = RpcQuantumWalk::new(Geometry::new(0.1));
        let k = knobs(0.2, 0.05, 0.001, 0.12, 0.0);
        assert!((qw.time_bucket_search(&k).unwrap() - 0.123_379_838_119_618_17).abs() < 1e-8);
        let t = qw.runtime(&[0.2, 0.05, 0.001, 0.12, 0.0]).unwrap().value().unwrap();
        assert!((t - 0.174_410_628_363_656_95).abs() < 1e-8);
    }

    #[test]
    fn test_infeasible_vertex_size() {
        let qw = RpcQuantumWalk::new(Geometry::new(0.3));
        // 2 * vertex_size exceeds -log p
        assert_eq!(qw.runtime(&[0.4, 0.1, 0.04, 0.2, 0.05]).unwrap(), Cost::Infeasible);
        assert_eq!(qw.runtime(&[0.4, 0.1, -0.01, 0.05, 0.01]).unwrap(), Cost::Infeasible);
        assert_eq!(qw.runtime(&[0.4, 0.1, 0.01, 0.05, 0.06]).unwrap(), Cost::Infeasible);
    }

    #[test]
    fn test_alpha_snapping() {
        let qw = RpcQuantumWalk::new(Geometry::new(0.3));
        let nearly = [0.003, 0.003 + 4e-6, 0.01, 0.001, 0.001];
        let exact = [0.003, 0.003, 0.01, 0.001, 0.001];

        // without snapping alpha > v would be rejected
        assert!(!walk_feasible(qw.geometry(), &WalkKnobs::parse("test", &nearly).unwrap()).unwrap());

        let t = qw.runtime(&nearly).unwrap();
        assert!(t.is_feasible());
        assert_eq!(t, qw.runtime(&exact).unwrap());
        assert_eq!(qw.memory(&nearly).unwrap(), qw.memory(&exact).unwrap());

        let far = WalkKnobs::parse("test", &[0.003, 0.0031, 0.01, 0.001, 0.001]).unwrap();
        assert_eq!(far.snapped(), far);
    }

    #[test]
    fn test_memory() {
        let g = Geometry::new(0.3);
        let memory = RpcQuantumWalk::new(g).memory(&[0.4, 0.1, 0.02, 0.05, 0.01]).unwrap();
        let Memory::Quantum(q) = memory else {
            panic!("quantum memory expected");
        };
        assert!((q.quantum - 0.020_339_853_941_383_056).abs() < 1e-8);
        assert_eq!(q.quantum, q.qraqm);
        assert!((q.qracm - 0.050_772_070_134_710_745).abs() < 1e-12);
        assert!((q.classical - 0.056_574_219_149_056_69).abs() < 1e-12);
    }

    #[test]
    fn test_problem_constraints() {
        let qw = RpcQuantumWalk::new(Geometry::new(0.3));
        let problem = qw.problem().unwrap();
        assert_eq!(problem.dimension(), 5);
        assert_eq!(problem.constraints.len(), 9);
        assert_eq!(problem.bounds[1], (0.0, 0.3));
        assert!(problem.is_valid(&[0.4, 0.1, 0.02, 0.05, 0.01], 1e-7).unwrap());
        assert!(!problem.is_valid(&[0.4, 0.1, 0.04, 0.2, 0.05], 1e-7).unwrap());
    }
}
