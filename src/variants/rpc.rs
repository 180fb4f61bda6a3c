//! Classical sieving with alpha-RPC bucketing.

use crate::entropy::log_binomial;
use crate::error::Result;
use crate::nns::{Cost, CostModel, Geometry, Memory};
use crate::optimizer::Problem;

use super::{bucket_knobs, bucketing_feasible, bucketing_problem, BUCKET_KNOBS};

/// Knobs: center weight `v` and bucket overlap `alpha`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rpc {
    geometry: Geometry,
}

impl Rpc {
    pub fn new(geometry: Geometry) -> Self {
        Self { geometry }
    }
}

impl CostModel for Rpc {
    fn name(&self) -> &'static str {
        "RPC"
    }

    fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    fn knob_names(&self) -> &'static [&'static str] {
        BUCKET_KNOBS
    }

    fn runtime(&self, knobs: &[f64]) -> Result<Cost> {
        let (v, alpha) = bucket_knobs(self.name(), knobs)?;
        let g = &self.geometry;
        if !bucketing_feasible(g, v, alpha) {
            return Ok(Cost::Infeasible);
        }

        let list = g.list_size();
        let p = log_binomial(g.w(), alpha) + log_binomial(g.n() - g.w(), v - alpha);
        let d = g.wedge_size(v, alpha, None)?.log_size;
        let f = log_binomial(g.n(), v);

        Ok(Cost::Feasible(list + p - d + (list + p - f).max(0.0)))
    }

    fn memory(&self, knobs: &[f64]) -> Result<Memory> {
        bucket_knobs(self.name(), knobs)?;
        Ok(Memory::Classical(self.geometry.list_size()))
    }

    fn problem(&self) -> Option<Problem<'_>> {
        Some(bucketing_problem(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_reference_values() {
        let rpc = Rpc::new(Geometry::new(0.3));
        let cases = [
            ([0.4, 0.1], 0.110_603_241_901_451_32),
            ([0.3, 0.08], 0.112_417_500_510_338_72),
            ([0.5, 0.15], 0.113_148_438_298_113_16),
        ];
        for (knobs, expected) in cases {
            let t = rpc.runtime(&knobs).unwrap().value().unwrap();
            assert!((t - expected).abs() < 1e-8, "{knobs:?}: {t} vs {expected}");
        }
    }

    #[test]
    fn test_infeasible_knobs() {
        let rpc = Rpc::new(Geometry::new(0.3));
        assert_eq!(rpc.runtime(&[0.1, 0.5]).unwrap(), Cost::Infeasible);
        assert_eq!(rpc.runtime(&[0.1, 0.5]).unwrap().penalized(), 100.0);
        // memory does not depend on the knobs
        assert_eq!(
            rpc.memory(&[0.1, 0.5]).unwrap(),
            Memory::Classical(Geometry::new(0.3).list_size())
        );
    }

    #[test]
    fn test_problem_shape() {
        let rpc = Rpc::new(Geometry::new(0.3));
        let problem = rpc.problem().unwrap();
        assert_eq!(problem.bounds, vec![(0.0, 1.0), (0.0, 0.3)]);
        assert_eq!(problem.constraints.len(), 3);
        assert!(problem.is_valid(&[0.4, 0.1], 1e-7).unwrap());
        assert!(!problem.is_valid(&[0.1, 0.2], 1e-7).unwrap());
        assert!(!problem.is_valid(&[0.95, 0.1], 1e-7).unwrap());
        assert_eq!(problem.objective(&[0.1, 0.5]).unwrap(), 100.0);
    }
}
