//! NNS algorithm variants and the tag used to select them.
//!
//! Every variant owns its [`Geometry`] and implements [`CostModel`]. The
//! classical RPC and Grover variants share the two-knob bucketing problem; the
//! three quantum-walk variants share the five-knob problem built in
//! [`quantum_walk`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::entropy::log_binomial;
use crate::error::{EstimatorError, Result};
use crate::nns::{Cost, CostModel, Geometry, Memory};
use crate::optimizer::{Constraint, Problem};

pub mod gjn;
pub mod grover;
pub mod quantum_walk;
pub mod reusable;
pub mod rpc;
pub mod sparsified;

pub use gjn::Gjn;
pub use grover::RpcGrover;
pub use quantum_walk::{RpcQuantumWalk, WalkKnobs, WalkTerms};
pub use reusable::RpcQuantumWalkReusable;
pub use rpc::Rpc;
pub use sparsified::RpcQuantumWalkSparsified;

/// Knob names of the two-knob bucketing variants.
pub const BUCKET_KNOBS: &[&str] = &["v", "alpha"];

/// Selects one of the supported algorithm variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    Gjn,
    Rpc,
    RpcGrover,
    RpcQuantumWalk,
    RpcQuantumWalkSparsified,
    RpcQuantumWalkReusable,
}

impl Algorithm {
    pub const ALL: [Algorithm; 6] = [
        Algorithm::Gjn,
        Algorithm::Rpc,
        Algorithm::RpcGrover,
        Algorithm::RpcQuantumWalk,
        Algorithm::RpcQuantumWalkSparsified,
        Algorithm::RpcQuantumWalkReusable,
    ];

    /// Variants swept when none is named explicitly.
    pub const OPTIMIZED: [Algorithm; 5] = [
        Algorithm::Rpc,
        Algorithm::RpcGrover,
        Algorithm::RpcQuantumWalk,
        Algorithm::RpcQuantumWalkSparsified,
        Algorithm::RpcQuantumWalkReusable,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Gjn => "GJN",
            Algorithm::Rpc => "RPC",
            Algorithm::RpcGrover => "RPC_Grover",
            Algorithm::RpcQuantumWalk => "RPC_quantum_walk",
            Algorithm::RpcQuantumWalkSparsified => "RPC_quantum_walk_sparsification",
            Algorithm::RpcQuantumWalkReusable => "RPC_quantum_walk_reusable",
        }
    }

    /// Legend label for plots.
    pub fn label(self) -> &'static str {
        match self {
            Algorithm::Gjn => "GJN",
            Algorithm::Rpc => "Classical",
            Algorithm::RpcGrover => "Grover",
            Algorithm::RpcQuantumWalk => "QW + LSF",
            Algorithm::RpcQuantumWalkSparsified => "QW + LSF + Spars.",
            Algorithm::RpcQuantumWalkReusable => "Reus. QW + LSF + Spars.",
        }
    }

    pub fn knob_names(self) -> &'static [&'static str] {
        match self {
            Algorithm::Gjn => &[],
            Algorithm::Rpc | Algorithm::RpcGrover => BUCKET_KNOBS,
            _ => quantum_walk::WALK_KNOBS,
        }
    }

    pub fn knob_arity(self) -> usize {
        self.knob_names().len()
    }

    /// Number of values in the flattened memory representation.
    pub fn memory_arity(self) -> usize {
        match self {
            Algorithm::Gjn | Algorithm::Rpc => 1,
            _ => 4,
        }
    }

    /// Builds the cost model of this variant for `geometry`.
    pub fn model(self, geometry: Geometry) -> Model {
        match self {
            Algorithm::Gjn => Model::Gjn(Gjn::new(geometry)),
            Algorithm::Rpc => Model::Rpc(Rpc::new(geometry)),
            Algorithm::RpcGrover => Model::Grover(RpcGrover::new(geometry)),
            Algorithm::RpcQuantumWalk => Model::QuantumWalk(RpcQuantumWalk::new(geometry)),
            Algorithm::RpcQuantumWalkSparsified => {
                Model::Sparsified(RpcQuantumWalkSparsified::new(geometry))
            }
            Algorithm::RpcQuantumWalkReusable => Model::Reusable(RpcQuantumWalkReusable::new(geometry)),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = EstimatorError;

    fn from_str(s: &str) -> Result<Self> {
        Algorithm::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| EstimatorError::UnknownAlgorithm(s.to_string()))
    }
}

/// Closed set of cost models, one per [`Algorithm`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Model {
    Gjn(Gjn),
    Rpc(Rpc),
    Grover(RpcGrover),
    QuantumWalk(RpcQuantumWalk),
    Sparsified(RpcQuantumWalkSparsified),
    Reusable(RpcQuantumWalkReusable),
}

macro_rules! dispatch {
    ($self:ident, $m:ident => $body:expr) => {
        match $self {
            Model::Gjn($m) => $body,
            Model::Rpc($m) => $body,
            Model::Grover($m) => $body,
            Model::QuantumWalk($m) => $body,
            Model::Sparsified($m) => $body,
            Model::Reusable($m) => $body,
        }
    };
}

impl Model {
    pub fn algorithm(&self) -> Algorithm {
        match self {
            Model::Gjn(_) => Algorithm::Gjn,
            Model::Rpc(_) => Algorithm::Rpc,
            Model::Grover(_) => Algorithm::RpcGrover,
            Model::QuantumWalk(_) => Algorithm::RpcQuantumWalk,
            Model::Sparsified(_) => Algorithm::RpcQuantumWalkSparsified,
            Model::Reusable(_) => Algorithm::RpcQuantumWalkReusable,
        }
    }
}

impl CostModel for Model {
    fn name(&self) -> &'static str {
        dispatch!(self, m => m.name())
    }

    fn geometry(&self) -> &Geometry {
        dispatch!(self, m => m.geometry())
    }

    fn knob_names(&self) -> &'static [&'static str] {
        dispatch!(self, m => m.knob_names())
    }

    fn runtime(&self, knobs: &[f64]) -> Result<Cost> {
        dispatch!(self, m => m.runtime(knobs))
    }

    fn memory(&self, knobs: &[f64]) -> Result<Memory> {
        dispatch!(self, m => m.memory(knobs))
    }

    fn problem(&self) -> Option<Problem<'_>> {
        dispatch!(self, m => m.problem())
    }
}

/// Splits a two-knob vector into `(v, alpha)`.
pub(crate) fn bucket_knobs(algorithm: &'static str, knobs: &[f64]) -> Result<(f64, f64)> {
    match *knobs {
        [v, alpha] => Ok((v, alpha)),
        _ => Err(EstimatorError::KnobArity {
            algorithm,
            expected: BUCKET_KNOBS.len(),
            got: knobs.len(),
        }),
    }
}

/// Feasibility of alpha-RPC bucketing with centers of weight `v`.
pub(crate) fn bucketing_feasible(g: &Geometry, v: f64, alpha: f64) -> bool {
    if v < alpha || g.w() < alpha || (g.n() - g.w()) < (v - alpha) {
        return false;
    }
    v <= 1.0 && alpha >= 0.0
}

/// Sieve cost when every bucket is searched at cost `search`:
/// repetitions plus the larger of bucketing and checking.
pub(crate) fn sieve_runtime(g: &Geometry, v: f64, alpha: f64, search: f64) -> Result<f64> {
    let list = g.list_size();
    let p = log_binomial(g.w(), alpha) + log_binomial(g.n() - g.w(), v - alpha);
    let d = g.wedge_size(v, alpha, None)?.log_size;
    let repetitions = p - d;
    Ok(repetitions + list.max(g.bucket_count(v, alpha) + search))
}

/// Two-knob problem shared by the classical and Grover variants.
pub(crate) fn bucketing_problem<'a, M>(model: &'a M) -> Problem<'a>
where
    M: CostModel + Sync,
{
    let w = model.geometry().w();
    Problem::new(
        move |x: &[f64]| Ok(model.runtime(x)?.penalized()),
        vec![(0.0, 1.0), (0.0, w)],
        bucketing_constraints(w),
    )
}

/// Constraints common to every alpha-RPC variant, over knobs `[v, alpha, ..]`.
pub(crate) fn bucketing_constraints<'a>(w: f64) -> Vec<Constraint<'a>> {
    vec![
        Constraint::inequality("v >= alpha", |x: &[f64]| Ok(x[0] - x[1])),
        Constraint::inequality("w >= alpha", move |x: &[f64]| Ok(w - x[1])),
        Constraint::inequality("1 - w >= v - alpha", move |x: &[f64]| {
            Ok((1.0 - w) - (x[0] - x[1]))
        }),
    ]
}
