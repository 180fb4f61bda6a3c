//! One-dimensional numerical routines.
//!
//! [`minimize_bounded`] is Brent's bounded minimisation (parabolic steps with a
//! golden-section fallback). The cost models use it for inner
//! sub-optimisations such as the dominant overlap of a wedge, and the
//! lower-bound driver for its nested searches. [`find_root_bracketed`] is
//! Brent's root finder and backs the entropy inverse.

use crate::error::{EstimatorError, Result};

/// Default evaluation budget of [`minimize_bounded`].
pub const DEFAULT_MAX_EVALUATIONS: usize = 500;

const GOLDEN_MEAN: f64 = 0.381_966_011_250_105_1; // (3 - sqrt 5) / 2
const MAX_ROOT_ITERATIONS: usize = 200;

/// Outcome of a bounded scalar minimisation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScalarMinimum {
    /// Abscissa of the minimum found.
    pub x: f64,
    /// Objective at `x`.
    pub fun: f64,
    /// Number of objective evaluations.
    pub evaluations: usize,
    /// False when the evaluation budget ran out first.
    pub converged: bool,
}

/// Minimises `f` over `[lower, upper]` to absolute tolerance `xtol`.
///
/// Fails with [`EstimatorError::InvalidBracket`] if `lower > upper`; errors
/// raised by `f` propagate unchanged.
pub fn minimize_bounded<F>(
    mut f: F,
    lower: f64,
    upper: f64,
    xtol: f64,
    max_evaluations: usize,
) -> Result<ScalarMinimum>
where
    F: FnMut(f64) -> Result<f64>,
{
    if lower > upper {
        return Err(EstimatorError::InvalidBracket { lower, upper });
    }

    let sqrt_eps = (2.2e-16_f64).sqrt();
    let (mut a, mut b) = (lower, upper);

    // xf: best point, nfc: second best, fulc: previous second best
    let mut fulc = a + GOLDEN_MEAN * (b - a);
    let mut nfc = fulc;
    let mut xf = fulc;
    let mut rat = 0.0_f64;
    let mut e = 0.0_f64;
    let mut fx = f(xf)?;
    let mut evaluations = 1;
    let mut ffulc = fx;
    let mut fnfc = fx;
    let mut xm = 0.5 * (a + b);
    let mut tol1 = sqrt_eps * xf.abs() + xtol / 3.0;
    let mut tol2 = 2.0 * tol1;
    let mut converged = true;

    while (xf - xm).abs() > tol2 - 0.5 * (b - a) {
        let mut golden = true;

        if e.abs() > tol1 {
            golden = false;
            let mut r = (xf - nfc) * (fx - ffulc);
            let mut q = (xf - fulc) * (fx - fnfc);
            let mut p = (xf - fulc) * q - (xf - nfc) * r;
            q = 2.0 * (q - r);
            if q > 0.0 {
                p = -p;
            }
            q = q.abs();
            r = e;
            e = rat;

            if p.abs() < (0.5 * q * r).abs() && p > q * (a - xf) && p < q * (b - xf) {
                rat = p / q;
                let x = xf + rat;
                if (x - a) < tol2 || (b - x) < tol2 {
                    rat = tol1 * sign_or_one(xm - xf);
                }
            } else {
                golden = true;
            }
        }

        if golden {
            e = if xf >= xm { a - xf } else { b - xf };
            rat = GOLDEN_MEAN * e;
        }

        let x = xf + sign_or_one(rat) * rat.abs().max(tol1);
        let fu = f(x)?;
        evaluations += 1;

        if fu <= fx {
            if x >= xf {
                a = xf;
            } else {
                b = xf;
            }
            fulc = nfc;
            ffulc = fnfc;
            nfc = xf;
            fnfc = fx;
            xf = x;
            fx = fu;
        } else {
            if x < xf {
                a = x;
            } else {
                b = x;
            }
            if fu <= fnfc || nfc == xf {
                fulc = nfc;
                ffulc = fnfc;
                nfc = x;
                fnfc = fu;
            } else if fu <= ffulc || fulc == xf || fulc == nfc {
                fulc = x;
                ffulc = fu;
            }
        }

        xm = 0.5 * (a + b);
        tol1 = sqrt_eps * xf.abs() + xtol / 3.0;
        tol2 = 2.0 * tol1;

        if evaluations >= max_evaluations {
            converged = false;
            break;
        }
    }

    Ok(ScalarMinimum {
        x: xf,
        fun: fx,
        evaluations,
        converged,
    })
}

/// `sign(v)`, with zero mapped to `+1`.
fn sign_or_one(v: f64) -> f64 {
    if v < 0.0 {
        -1.0
    } else {
        1.0
    }
}

/// Finds a root of `f` in `[lower, upper]`, which must bracket a sign change.
pub fn find_root_bracketed<F>(mut f: F, lower: f64, upper: f64, xtol: f64) -> Result<f64>
where
    F: FnMut(f64) -> Result<f64>,
{
    let mut a = lower;
    let mut b = upper;
    let mut fa = f(a)?;
    let mut fb = f(b)?;

    if fa == 0.0 {
        return Ok(a);
    }
    if fb == 0.0 {
        return Ok(b);
    }
    if (fa > 0.0) == (fb > 0.0) {
        return Err(EstimatorError::NoSignChange { lower, upper });
    }

    let mut c = b;
    let mut fc = fb;
    let mut d = 0.0_f64;
    let mut e = 0.0_f64;

    for _ in 0..MAX_ROOT_ITERATIONS {
        if (fb > 0.0) == (fc > 0.0) {
            c = a;
            fc = fa;
            d = b - a;
            e = d;
        }
        if fc.abs() < fb.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }

        let tol = 2.0 * f64::EPSILON * b.abs() + 0.5 * xtol;
        let m = 0.5 * (c - b);
        if m.abs() <= tol || fb == 0.0 {
            return Ok(b);
        }

        if e.abs() >= tol && fa.abs() > fb.abs() {
            // inverse quadratic interpolation, secant when only two points
            let s = fb / fa;
            let (mut p, mut q) = if a == c {
                (2.0 * m * s, 1.0 - s)
            } else {
                let q = fa / fc;
                let r = fb / fc;
                (
                    s * (2.0 * m * q * (q - r) - (b - a) * (r - 1.0)),
                    (q - 1.0) * (r - 1.0) * (s - 1.0),
                )
            };
            if p > 0.0 {
                q = -q;
            }
            p = p.abs();
            let min1 = 3.0 * m * q - (tol * q).abs();
            let min2 = (e * q).abs();
            if 2.0 * p < min1.min(min2) {
                e = d;
                d = p / q;
            } else {
                d = m;
                e = d;
            }
        } else {
            d = m;
            e = d;
        }

        a = b;
        fa = fb;
        b += if d.abs() > tol { d } else { tol.copysign(m) };
        fb = f(b)?;
    }

    Ok(b)
}
