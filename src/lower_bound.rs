//! Closed-form lower bound on quantum sieving-based ISD, compared against
//! quantum Prange.
//!
//! For a code of rate `k` at the GV weight, the sieving step works on a
//! sub-instance of length `n` and weight `w`. Assuming the NNS oracle runs in
//! time `N = list_size(n, w)`, the runtime is at least
//! `(N + H(w_isd) - (n - k) - (1 - n) H((w_isd - w) / (1 - n))) / 2`.
//! The claim checked here is that this bound, minimised over `(n, w)`,
//! always exceeds quantum Prange.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::entropy::{list_size, log_binomial, weight_from_rate};
use crate::error::Result;
use crate::scalar::{minimize_bounded, DEFAULT_MAX_EVALUATIONS};

/// Value of the bound outside its feasible region.
pub const LOWER_BOUND_SENTINEL: f64 = 1000.0;

/// Log-probability `p2` that a sieving solution is the decoding error.
pub fn success_probability_p2(k: f64, n: f64, w: f64) -> f64 {
    list_size(n, w) + (n - k) - log_binomial(n, w)
}

fn feasible(k: f64, w_isd: f64, n: f64, w: f64) -> bool {
    if 1.0 < n || w_isd < w {
        return false;
    }
    if n < w || (1.0 - n) < (w_isd - w) {
        return false;
    }
    // implied by p2 <= 0 but not sufficient for the bound on its own
    if log_binomial(n, w) < (n - k) {
        return false;
    }
    success_probability_p2(k, n, w) <= 0.0
}

fn bound(k: f64, w_isd: f64, n: f64, w: f64) -> f64 {
    if !feasible(k, w_isd, n, w) {
        return LOWER_BOUND_SENTINEL;
    }
    (list_size(n, w) + log_binomial(1.0, w_isd) - (n - k) - log_binomial(1.0 - n, w_isd - w)) / 2.0
}

/// Whether `(n, w)` is an admissible sub-instance for rate `k`.
pub fn lower_bound_feasible(k: f64, n: f64, w: f64) -> Result<bool> {
    Ok(feasible(k, weight_from_rate(k)?, n, w))
}

/// Lower bound on the runtime exponent, [`LOWER_BOUND_SENTINEL`] when infeasible.
pub fn quantum_sieving_isd_lower_bound(k: f64, n: f64, w: f64) -> Result<f64> {
    Ok(bound(k, weight_from_rate(k)?, n, w))
}

/// Runtime exponent of quantum Prange at rate `k`.
pub fn quantum_prange(k: f64) -> Result<f64> {
    let w_isd = weight_from_rate(k)?;
    Ok((log_binomial(1.0, w_isd) - log_binomial(1.0 - k, w_isd)) / 2.0)
}

/// Sub-instance `(n, w)` and the bound it attains.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundPoint {
    pub n: f64,
    pub w: f64,
    pub bound: f64,
}

fn best_weight(k: f64, w_isd: f64, n: f64, prec: f64) -> Result<BoundPoint> {
    let best = minimize_bounded(
        |w| Ok(bound(k, w_isd, n, w)),
        0.0,
        w_isd.min(n),
        prec,
        DEFAULT_MAX_EVALUATIONS,
    )?;
    Ok(BoundPoint {
        n,
        w: best.x,
        bound: bound(k, w_isd, n, best.x),
    })
}

/// Minimises the bound over `w ∈ [0, min(w_isd, n)]` for fixed `n`.
pub fn optimize_weight(k: f64, n: f64, prec: f64) -> Result<BoundPoint> {
    best_weight(k, weight_from_rate(k)?, n, prec)
}

/// Minimises the bound over `n ∈ [k, 1]`, with `w` optimised for each `n`.
pub fn optimize_lower_bound(k: f64, prec: f64) -> Result<BoundPoint> {
    let w_isd = weight_from_rate(k)?;
    let best_n = minimize_bounded(
        |n| Ok(best_weight(k, w_isd, n, prec)?.bound),
        k,
        1.0,
        prec,
        DEFAULT_MAX_EVALUATIONS,
    )?;
    let point = best_weight(k, w_isd, best_n.x, prec)?;
    debug!(k, n = point.n, w = point.w, bound = point.bound, "optimized lower bound");
    Ok(point)
}

/// Comparison of the optimised bound with quantum Prange at one rate.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RateCheck {
    pub rate: f64,
    pub optimum: BoundPoint,
    pub prange: f64,
}

impl RateCheck {
    pub fn lower_bound(&self) -> f64 {
        self.optimum.bound
    }

    /// The bound must strictly exceed quantum Prange; equality is a violation.
    pub fn holds(&self) -> bool {
        self.optimum.bound > self.prange
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConjectureReport {
    pub checks: Vec<RateCheck>,
}

impl ConjectureReport {
    pub fn violations(&self) -> usize {
        self.checks.iter().filter(|c| !c.holds()).count()
    }

    pub fn lower_bound_series(&self) -> Vec<(f64, f64)> {
        self.checks.iter().map(|c| (c.rate, c.lower_bound())).collect()
    }

    pub fn prange_series(&self) -> Vec<(f64, f64)> {
        self.checks.iter().map(|c| (c.rate, c.prange)).collect()
    }
}

/// Checks the claim at the given rates.
pub fn check_conjecture_at(rates: &[f64], prec: f64) -> Result<ConjectureReport> {
    let mut checks = Vec::with_capacity(rates.len());
    for &rate in rates {
        let check = RateCheck {
            rate,
            optimum: optimize_lower_bound(rate, prec)?,
            prange: quantum_prange(rate)?,
        };
        if !check.holds() {
            warn!(rate, lower_bound = check.lower_bound(), prange = check.prange, "conjecture violated");
        }
        checks.push(check);
    }
    Ok(ConjectureReport { checks })
}

/// Checks the claim at the rates `i / range_rates` for `i` in `1..range_rates`.
#[instrument]
pub fn check_conjecture(range_rates: usize, prec: f64) -> Result<ConjectureReport> {
    let rates: Vec<f64> = (1..range_rates).map(|i| i as f64 / range_rates as f64).collect();
    let report = check_conjecture_at(&rates, prec)?;
    info!(violations = report.violations(), out_of = range_rates, "conjecture check finished");
    Ok(report)
}

/// Feasible values of the bound for one sub-instance length.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridSlice {
    pub n: f64,
    /// `(w, bound)` pairs.
    pub points: Vec<(f64, f64)>,
}

impl GridSlice {
    pub fn label(&self) -> String {
        format!("n' = {}", self.n)
    }
}

/// Evaluates the bound on the grid `n = k + i / range_n < 1`, `w = j / range_w`,
/// keeping only feasible points and non-empty slices.
pub fn lower_bound_grid(k: f64, range_n: usize, range_w: usize) -> Result<Vec<GridSlice>> {
    let w_isd = weight_from_rate(k)?;
    let mut slices = Vec::new();
    for i in 0..range_n {
        let n = k + i as f64 / range_n as f64;
        if n >= 1.0 {
            continue;
        }
        let points: Vec<(f64, f64)> = (0..range_w)
            .map(|j| j as f64 / range_w as f64)
            .filter(|&w| feasible(k, w_isd, n, w))
            .map(|w| (w, bound(k, w_isd, n, w)))
            .collect();
        if !points.is_empty() {
            slices.push(GridSlice { n, points });
        }
    }
    Ok(slices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bound_reference_values() {
        let lb = quantum_sieving_isd_lower_bound(0.5, 0.7, 0.1).unwrap();
        assert!((lb - 0.151_246_418_852_332_42).abs() < 1e-9);
        assert!(lower_bound_feasible(0.5, 0.7, 0.1).unwrap());

        // p2 > 0
        assert_eq!(quantum_sieving_isd_lower_bound(0.5, 0.8, 0.05).unwrap(), LOWER_BOUND_SENTINEL);
        assert!((success_probability_p2(0.5, 0.8, 0.05) - 0.091_868_274_761_100_99).abs() < 1e-9);
        // n > 1
        assert!(!lower_bound_feasible(0.5, 1.1, 0.05).unwrap());
        // w above the GV weight
        assert!(!lower_bound_feasible(0.5, 0.7, 0.2).unwrap());
    }

    #[test]
    fn test_quantum_prange() {
        assert!((quantum_prange(0.5).unwrap() - 0.059_932_687_700_525_01).abs() < 1e-9);
        assert!((quantum_prange(0.1).unwrap() - 0.029_216_023_170_473_893).abs() < 1e-9);
    }

    #[test]
    fn test_optimized_bound() {
        let point = optimize_lower_bound(0.1, 1e-10).unwrap();
        assert!((point.bound - 0.032_605_198_002_437_275).abs() < 1e-6);
        assert!(point.n >= 0.1 && point.n <= 1.0);

        let point = optimize_lower_bound(0.5, 1e-10).unwrap();
        assert!((point.bound - 0.059_932_688_883_338_3).abs() < 1e-6);
        assert!(point.bound >= quantum_prange(0.5).unwrap() - 1e-6);
    }

    #[test]
    fn test_conjecture_holds_across_rates() {
        let rates = [0.1, 0.25, 0.44, 0.5, 0.75, 0.9];
        let report = check_conjecture_at(&rates, 1e-10).unwrap();
        assert_eq!(report.checks.len(), rates.len());
        assert_eq!(report.violations(), 0);

        // half rate: the bound clears Prange by about 1.2e-9
        let half = &report.checks[3];
        assert_eq!(half.rate, 0.5);
        assert!(half.holds());
        assert!((half.lower_bound() - 0.059_932_688_883_338_3).abs() < 1e-9);
        assert!((half.prange - 0.059_932_687_700_525_01).abs() < 1e-12);
    }

    #[test]
    fn test_optimize_weight_stays_in_range() {
        let point = optimize_weight(0.5, 0.7, 1e-8).unwrap();
        let w_isd = weight_from_rate(0.5).unwrap();
        assert!(point.w >= 0.0 && point.w <= w_isd.min(0.7));
        assert!(point.bound <= quantum_sieving_isd_lower_bound(0.5, 0.7, 0.1).unwrap());
    }

    #[test]
    fn test_conjecture_at_low_rate() {
        let report = check_conjecture_at(&[0.1], 1e-10).unwrap();
        assert_eq!(report.checks.len(), 1);
        assert!(report.checks[0].holds());
        assert_eq!(report.violations(), 0);
        assert_eq!(report.prange_series()[0].0, 0.1);
    }

    #[test]
    fn test_violation_counting() {
        let point = BoundPoint {
            n: 0.5,
            w: 0.1,
            bound: 0.05,
        };
        let report = ConjectureReport {
            checks: vec![
                RateCheck {
                    rate: 0.2,
                    optimum: point,
                    prange: 0.04,
                },
                RateCheck {
                    rate: 0.3,
                    optimum: point,
                    prange: 0.05,
                },
            ],
        };
        // equality counts as a violation
        assert_eq!(report.violations(), 1);
        assert_eq!(report.lower_bound_series(), vec![(0.2, 0.05), (0.3, 0.05)]);
    }

    #[test]
    fn test_grid() {
        let slices = lower_bound_grid(0.44, 10, 50).unwrap();
        assert_eq!(slices.len(), 5);
        assert_eq!(slices[0].n, 0.44);
        assert_eq!(slices[0].points.len(), 7);
        assert!(slices.iter().all(|s| s.n < 1.0));
        assert!(slices
            .iter()
            .flat_map(|s| &s.points)
            .all(|&(_, b)| b < LOWER_BOUND_SENTINEL));
        assert_eq!(slices[0].label(), "n' = 0.44");
    }
}
