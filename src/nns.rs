//! Shared geometry of the nearest-neighbour-search cost models.
//!
//! A sieving step takes a list of weight-`w` vectors of length `n` and looks
//! for pairs summing to weight `w`. Random-product-code style bucketing
//! attaches each vector to centers of weight `v` with which it shares exactly
//! `alpha` ones. All quantities below are base-2 exponents relative to `n`.

use serde::{Deserialize, Serialize};

use crate::entropy::{list_size, log_binomial};
use crate::error::{EstimatorError, Result};
use crate::optimizer::Problem;
use crate::scalar::{minimize_bounded, DEFAULT_MAX_EVALUATIONS};

/// Tolerance of the inner overlap maximisation.
pub const WEDGE_TOLERANCE: f64 = 1e-10;

/// Instance geometry `(n, w)`: normalised length and target weight fraction.
///
/// Immutable; sweeps build a fresh value per weight instead of mutating one.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    n: f64,
    w: f64,
}

/// Dominant overlap and log-size of a wedge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Wedge {
    /// Overlap `e*` that dominates the wedge.
    pub overlap: f64,
    /// Log-size of the wedge at `e*`.
    pub log_size: f64,
}

impl Geometry {
    /// Geometry with the conventional normalised length `n = 1`.
    pub fn new(w: f64) -> Self {
        Self { n: 1.0, w }
    }

    pub fn with_length(n: f64, w: f64) -> Self {
        Self { n, w }
    }

    pub fn n(&self) -> f64 {
        self.n
    }

    pub fn w(&self) -> f64 {
        self.w
    }

    /// Log-size of the input list, see [`list_size`].
    pub fn list_size(&self) -> f64 {
        list_size(self.n, self.w)
    }

    /// Expected number of buckets for centers of weight `v`.
    pub fn bucket_count(&self, v: f64, alpha: f64) -> f64 {
        log_binomial(self.n, v) - log_binomial(self.w, alpha) - log_binomial(self.n - self.w, v - alpha)
    }

    /// Expected number of list elements in an alpha-bucket of a weight-`v` center.
    pub fn bucket_size(&self, v: f64, alpha: f64) -> f64 {
        self.list_size() + log_binomial(v, alpha) + log_binomial(self.n - v, self.w - alpha)
            - log_binomial(self.n, self.w)
    }

    /// Wedge of pairs at overlap `overlap` (default `w/2`) inside an alpha-bucket.
    pub fn wedge_size(&self, v: f64, alpha: f64, overlap: Option<f64>) -> Result<Wedge> {
        max_wedge(self.n, self.w, v, alpha, overlap, WEDGE_TOLERANCE)
    }

    /// Probability that a pair drawn from an alpha-bucket sums to weight `w`.
    pub fn match_probability(&self, v: f64, alpha: f64) -> Result<f64> {
        let (n, w) = (self.n, self.w);
        Ok(log_binomial(w, w / 2.0) + log_binomial(n - w, w / 2.0)
            - log_binomial(v, alpha)
            - log_binomial(n - v, w - alpha)
            - log_binomial(w, alpha)
            - log_binomial(n - w, v - alpha)
            + self.wedge_size(v, alpha, None)?.log_size)
    }
}

/// Maximises the wedge log-size over the hidden overlap `e ∈ [0, min(t, alpha)]`,
/// where `t` is `overlap` or `w/2`.
///
/// Free-standing so the second filtering layer of the quantum walks can reuse
/// it on a different slice `(n, w, v, alpha) = (v, alpha, v_beta, beta)`.
pub fn max_wedge(n: f64, w: f64, v: f64, alpha: f64, overlap: Option<f64>, tol: f64) -> Result<Wedge> {
    let t = overlap.unwrap_or(w / 2.0);
    let component = |e: f64| {
        log_binomial(t, e) + 2.0 * log_binomial(w - t, alpha - e) + log_binomial(n - 2.0 * w + t, v - 2.0 * alpha + e)
    };
    let best = minimize_bounded(
        |e| Ok(-component(e).max(0.0)),
        0.0,
        t.min(alpha),
        tol,
        DEFAULT_MAX_EVALUATIONS,
    )?;
    Ok(Wedge {
        overlap: best.x,
        log_size: component(best.x),
    })
}

/// Outcome of evaluating a runtime formula.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Cost {
    Feasible(f64),
    Infeasible,
}

impl Cost {
    /// Penalty used in place of an infeasible runtime.
    pub const PENALTY: f64 = 100.0;

    pub fn is_feasible(&self) -> bool {
        matches!(self, Cost::Feasible(_))
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Cost::Feasible(v) => Some(*v),
            Cost::Infeasible => None,
        }
    }

    /// Numeric value with infeasibility mapped to `penalty`.
    pub fn or_penalty(&self, penalty: f64) -> f64 {
        self.value().unwrap_or(penalty)
    }

    /// Numeric value with infeasibility mapped to [`Cost::PENALTY`].
    pub fn penalized(&self) -> f64 {
        self.or_penalty(Self::PENALTY)
    }
}

/// Memory exponents of the quantum variants.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuantumMemory {
    /// Classical memory.
    pub classical: f64,
    /// Generic quantum memory (qubits).
    pub quantum: f64,
    /// Quantum-accessible classical memory.
    pub qracm: f64,
    /// Quantum-accessible quantum memory.
    pub qraqm: f64,
}

/// Memory exponent(s) of a variant at a knob vector.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Memory {
    Classical(f64),
    Quantum(QuantumMemory),
}

impl Memory {
    /// Classical memory component, present for every variant.
    pub fn classical(&self) -> f64 {
        match self {
            Memory::Classical(m) => *m,
            Memory::Quantum(q) => q.classical,
        }
    }

    /// Flattened representation used by the CSV rows.
    pub fn to_row(&self) -> Vec<f64> {
        match self {
            Memory::Classical(m) => vec![*m],
            Memory::Quantum(q) => vec![q.classical, q.quantum, q.qracm, q.qraqm],
        }
    }

    /// Inverse of [`Memory::to_row`]; the arity selects the representation.
    pub fn from_row(values: &[f64]) -> Option<Self> {
        match *values {
            [m] => Some(Memory::Classical(m)),
            [classical, quantum, qracm, qraqm] => Some(Memory::Quantum(QuantumMemory {
                classical,
                quantum,
                qracm,
                qraqm,
            })),
            _ => None,
        }
    }
}

/// Contract shared by every NNS algorithm variant.
pub trait CostModel {
    /// Name used on the command line and in file names.
    fn name(&self) -> &'static str;

    fn geometry(&self) -> &Geometry;

    /// Meaning of each knob, in order. Empty for parameter-free variants.
    fn knob_names(&self) -> &'static [&'static str];

    /// Runtime exponent at `knobs`.
    fn runtime(&self, knobs: &[f64]) -> Result<Cost>;

    /// Memory exponent(s) at `knobs`.
    fn memory(&self, knobs: &[f64]) -> Result<Memory>;

    /// Optimisation problem over the knobs, `None` when there is nothing to tune.
    fn problem(&self) -> Option<Problem<'_>>;

    /// Rejects knob vectors of the wrong length.
    fn check_arity(&self, knobs: &[f64]) -> Result<()> {
        let expected = self.knob_names().len();
        if knobs.len() != expected {
            return Err(EstimatorError::KnobArity {
                algorithm: self.name(),
                expected,
                got: knobs.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_quantities() {
        let g = Geometry::new(0.3);
        assert!((g.bucket_count(0.4, 0.1) - 0.005_802_149_014_345_725_5).abs() < 1e-9);
        assert!((g.bucket_size(0.4, 0.1) - 0.050_772_070_134_710_745).abs() < 1e-9);

        let wedge = g.wedge_size(0.4, 0.1, None).unwrap();
        assert!((wedge.overlap - 0.044_722_997_162_073_98).abs() < 1e-6);
        assert!((wedge.log_size - 0.961_891_492_822_639_2).abs() < 1e-8);

        let p = g.match_probability(0.4, 0.1).unwrap();
        assert!((p + 0.054_029_022_752_394_52).abs() < 1e-8);
    }

    #[test]
    fn test_wedge_with_zero_alpha() {
        let g = Geometry::new(0.3);
        let wedge = g.wedge_size(0.2, 0.0, None).unwrap();
        assert_eq!(wedge.overlap, 0.0);
    }

    #[test]
    fn test_wedge_rejects_negative_bracket() {
        let g = Geometry::new(0.3);
        assert!(g.wedge_size(0.2, -0.1, None).is_err());
    }

    #[test]
    fn test_cost_penalty() {
        assert_eq!(Cost::Infeasible.penalized(), 100.0);
        assert_eq!(Cost::Infeasible.or_penalty(1000.0), 1000.0);
        assert_eq!(Cost::Feasible(0.25).penalized(), 0.25);
        assert!(!Cost::Infeasible.is_feasible());
    }

    #[test]
    fn test_memory_rows() {
        let q = Memory::Quantum(QuantumMemory {
            classical: 0.1,
            quantum: 0.0,
            qracm: 0.05,
            qraqm: 0.0,
        });
        assert_eq!(q.to_row(), vec![0.1, 0.0, 0.05, 0.0]);
        assert_eq!(Memory::from_row(&q.to_row()), Some(q));
        assert_eq!(Memory::from_row(&[0.2]), Some(Memory::Classical(0.2)));
        assert_eq!(Memory::from_row(&[0.2, 0.3]), None);
        assert_eq!(q.classical(), 0.1);
    }
}
