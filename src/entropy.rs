//! Entropy and binomial approximations.
//!
//! Every quantity is a base-2 exponent relative to the code length, so
//! `log_binomial(a, b)` stands for `log2 C(an, bn) / n` as `n` grows.

use crate::error::{EstimatorError, Result};
use crate::scalar::find_root_bracketed;

/// Value returned by [`binary_entropy`] outside `[0, 1]`.
///
/// Large and negative so that every max/min built on top of it steers away
/// from the invalid region.
pub const ENTROPY_PENALTY: f64 = -1000.0;

/// Tolerance of the root finder behind [`entropy_inverse`].
const INVERSE_XTOL: f64 = 1e-15;

/// Binary entropy `H(x) = -x log2 x - (1-x) log2 (1-x)`.
pub fn binary_entropy(x: f64) -> f64 {
    if x < 0.0 || x > 1.0 {
        return ENTROPY_PENALTY;
    }
    if x == 0.0 || x == 1.0 {
        return 0.0;
    }
    -x * x.log2() - (1.0 - x) * (1.0 - x).log2()
}

/// `log2` of `C(a, b)` under the entropy approximation.
///
/// Degenerate and negative arguments are not guarded beyond `a <= 0`; the
/// cost formulas depend on that exact behaviour.
pub fn log_binomial(a: f64, b: f64) -> f64 {
    if a <= 0.0 {
        return 0.0;
    }
    a * binary_entropy(b / a)
}

/// Solves `H(x) = y` for the branch `x ∈ [0, 1/2]`.
pub fn entropy_inverse(y: f64) -> Result<f64> {
    if y == 1.0 {
        return Ok(0.5);
    }
    if !(0.0..=1.0).contains(&y) {
        return Err(EstimatorError::NoRoot { target: y });
    }
    if y == 0.0 {
        return Ok(0.0);
    }
    find_root_bracketed(|x| Ok(y - binary_entropy(x)), 0.0, 0.5, INVERSE_XTOL)
}

/// Relative weight on the Gilbert–Varshamov bound for a code of rate `k`.
pub fn weight_from_rate(k: f64) -> Result<f64> {
    entropy_inverse(1.0 - k)
}

/// Log-size of the input list for which the number of NNS solutions at
/// target weight `w` equals the list size.
pub fn list_size(n: f64, w: f64) -> f64 {
    log_binomial(n, w) - log_binomial(w, w / 2.0) - log_binomial(n - w, w / 2.0)
}
