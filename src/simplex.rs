//! Bound-constrained Nelder–Mead simplex search.
//!
//! One restart of the multi-start optimizer is one call to [`minimize`]. Every
//! trial point is clamped into the box before it is evaluated, and the
//! coefficients adapt to the dimension (Gao and Han, 2012), which keeps the
//! five-knob quantum-walk searches from stalling.
//!
//! Convergence is declared when the spread of objective values over the
//! simplex drops to the tolerance; the cost surfaces have long flat valleys
//! where the simplex would otherwise crawl without shrinking.

use crate::error::Result;

/// Result of a single local minimisation.
#[derive(Clone, Debug)]
pub struct LocalMinimum {
    /// Best vertex.
    pub x: Vec<f64>,
    /// Objective at `x`.
    pub fun: f64,
    /// Simplex iterations performed.
    pub iterations: usize,
    /// Whether the tolerance was met within the iteration budget.
    pub success: bool,
}

/// Knobs for [`minimize`].
#[derive(Clone, Copy, Debug)]
pub struct SimplexOptions {
    /// Edge length of the initial simplex along each axis.
    pub initial_step: f64,
    /// Objective spread at which the search stops.
    pub tolerance: f64,
    /// Iteration budget.
    pub max_iter: usize,
}

impl Default for SimplexOptions {
    fn default() -> Self {
        Self {
            initial_step: 0.02,
            tolerance: 1e-10,
            max_iter: 2000,
        }
    }
}

/// Clamps every coordinate of `x` into `bounds`.
pub fn clamp_to_bounds(x: &mut [f64], bounds: &[(f64, f64)]) {
    for (xi, &(lo, hi)) in x.iter_mut().zip(bounds) {
        *xi = xi.max(lo).min(hi);
    }
}

/// Minimises `f` from `start` inside the box `bounds`.
pub fn minimize<F>(
    mut f: F,
    start: &[f64],
    bounds: &[(f64, f64)],
    options: &SimplexOptions,
) -> Result<LocalMinimum>
where
    F: FnMut(&[f64]) -> Result<f64>,
{
    let dim = start.len();
    let d = dim.max(1) as f64;
    let reflection = 1.0;
    let expansion = 1.0 + 2.0 / d;
    let contraction = 0.75 - 1.0 / (2.0 * d);
    let shrink = 1.0 - 1.0 / d;

    let mut x0 = start.to_vec();
    clamp_to_bounds(&mut x0, bounds);

    let mut vertices = Vec::with_capacity(dim + 1);
    vertices.push(x0.clone());
    for i in 0..dim {
        let mut y = x0.clone();
        let hi = bounds.get(i).map_or(f64::INFINITY, |b| b.1);
        y[i] = if y[i] + options.initial_step <= hi {
            y[i] + options.initial_step
        } else {
            y[i] - options.initial_step
        };
        clamp_to_bounds(&mut y, bounds);
        vertices.push(y);
    }

    let mut values = Vec::with_capacity(dim + 1);
    for v in &vertices {
        values.push(f(v)?);
    }

    let mut iterations = 0;
    loop {
        sort_simplex(&mut vertices, &mut values);

        if values[dim] - values[0] <= options.tolerance {
            return Ok(LocalMinimum {
                x: vertices.swap_remove(0),
                fun: values[0],
                iterations,
                success: true,
            });
        }
        if iterations >= options.max_iter {
            return Ok(LocalMinimum {
                x: vertices.swap_remove(0),
                fun: values[0],
                iterations,
                success: false,
            });
        }
        iterations += 1;

        let centroid = centroid(&vertices[..dim]);
        let worst = &vertices[dim];

        let reflected = towards(&centroid, worst, -reflection, bounds);
        let f_reflected = f(&reflected)?;

        if f_reflected < values[0] {
            let expanded = towards(&centroid, &reflected, expansion, bounds);
            let f_expanded = f(&expanded)?;
            if f_expanded < f_reflected {
                vertices[dim] = expanded;
                values[dim] = f_expanded;
            } else {
                vertices[dim] = reflected;
                values[dim] = f_reflected;
            }
            continue;
        }

        if f_reflected < values[dim - 1] {
            vertices[dim] = reflected;
            values[dim] = f_reflected;
            continue;
        }

        if f_reflected < values[dim] {
            let outside = towards(&centroid, &reflected, contraction, bounds);
            let f_outside = f(&outside)?;
            if f_outside <= f_reflected {
                vertices[dim] = outside;
                values[dim] = f_outside;
                continue;
            }
        } else {
            let inside = towards(&centroid, worst, contraction, bounds);
            let f_inside = f(&inside)?;
            if f_inside < values[dim] {
                vertices[dim] = inside;
                values[dim] = f_inside;
                continue;
            }
        }

        // shrink towards the best vertex
        let best = vertices[0].clone();
        for i in 1..=dim {
            vertices[i] = towards(&best, &vertices[i], shrink, bounds);
            values[i] = f(&vertices[i])?;
        }
    }
}

fn sort_simplex(vertices: &mut Vec<Vec<f64>>, values: &mut Vec<f64>) {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&i, &j| values[i].total_cmp(&values[j]));
    *vertices = order.iter().map(|&i| vertices[i].clone()).collect();
    *values = order.iter().map(|&i| values[i]).collect();
}

fn centroid(vertices: &[Vec<f64>]) -> Vec<f64> {
    let n = vertices.len() as f64;
    let dim = vertices[0].len();
    (0..dim)
        .map(|j| vertices.iter().map(|v| v[j]).sum::<f64>() / n)
        .collect()
}

/// `origin + t * (target - origin)`, clamped into the box.
fn towards(origin: &[f64], target: &[f64], t: f64, bounds: &[(f64, f64)]) -> Vec<f64> {
    let mut y: Vec<f64> = origin
        .iter()
        .zip(target)
        .map(|(o, x)| o + t * (x - o))
        .collect();
    clamp_to_bounds(&mut y, bounds);
    y
}
