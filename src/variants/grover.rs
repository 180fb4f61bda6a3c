//! Alpha-RPC bucketing with a Grover search inside each bucket.

use crate::error::Result;
use crate::nns::{Cost, CostModel, Geometry, Memory, QuantumMemory};
use crate::optimizer::Problem;

use super::{bucket_knobs, bucketing_feasible, bucketing_problem, sieve_runtime, BUCKET_KNOBS};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RpcGrover {
    geometry: Geometry,
}

impl RpcGrover {
    pub fn new(geometry: Geometry) -> Self {
        Self { geometry }
    }

    /// Cost of a Grover search for matching pairs in one alpha-bucket.
    pub fn time_bucket_search(&self, v: f64, alpha: f64) -> Result<f64> {
        let size = self.geometry.bucket_size(v, alpha);
        let p = self.geometry.match_probability(v, alpha)?;
        Ok(0.0_f64.max(size).max(2.0 * size + p / 2.0))
    }
}

impl CostModel for RpcGrover {
    fn name(&self) -> &'static str {
        "RPC_Grover"
    }

    fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    fn knob_names(&self) -> &'static [&'static str] {
        BUCKET_KNOBS
    }

    fn runtime(&self, knobs: &[f64]) -> Result<Cost> {
        let (v, alpha) = bucket_knobs(self.name(), knobs)?;
        if !bucketing_feasible(&self.geometry, v, alpha) {
            return Ok(Cost::Infeasible);
        }
        let search = self.time_bucket_search(v, alpha)?;
        Ok(Cost::Feasible(sieve_runtime(&self.geometry, v, alpha, search)?))
    }

    fn memory(&self, knobs: &[f64]) -> Result<Memory> {
        let (v, alpha) = bucket_knobs(self.name(), knobs)?;
        Ok(Memory::Quantum(QuantumMemory {
            classical: self.geometry.list_size(),
            quantum: 0.0,
            qracm: self.geometry.bucket_size(v, alpha),
            qraqm: 0.0,
        }))
    }

    fn problem(&self) -> Option<Problem<'_>> {
        Some(bucketing_problem(self))
    }
}
