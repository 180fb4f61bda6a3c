//! Quantum walk over sparsified beta-buckets.
//!
//! Only one beta-bucket is kept per vertex, so the walk no longer stores the
//! valid beta-buckets; the price is paid in the marked-vertex fraction.

use crate::error::Result;
use crate::nns::{Cost, CostModel, Geometry, Memory};
use crate::optimizer::Problem;

use super::quantum_walk::{walk_memory, walk_problem, walk_runtime, WalkKnobs, WalkParameters, WalkTerms, WALK_KNOBS};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RpcQuantumWalkSparsified {
    geometry: Geometry,
}

impl RpcQuantumWalkSparsified {
    pub fn new(geometry: Geometry) -> Self {
        Self { geometry }
    }

    pub fn time_bucket_search(&self, k: &WalkKnobs) -> Result<f64> {
        let terms = WalkTerms::new(&self.geometry, k)?;
        let walk = sparsified_walk(k, &terms);
        Ok(terms.solutions + walk.cost(0.0))
    }
}

/// Walk parameters with a single beta-bucket per vertex.
pub(crate) fn sparsified_walk(k: &WalkKnobs, terms: &WalkTerms) -> WalkParameters {
    let epsilon = (-terms.d_beta).min(2.0 * k.vertex_size + terms.probability - terms.d_beta);
    WalkParameters::new(k.vertex_size, 0.0, terms.beta_bucket_size(k.vertex_size), epsilon)
}

impl CostModel for RpcQuantumWalkSparsified {
    fn name(&self) -> &'static str {
        "RPC_quantum_walk_sparsification"
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
        Ok(walk_memory(&self.geometry, &k, k.vertex_size))
    }

    fn problem(&self) -> Option<Problem<'_>> {
        Some(walk_problem(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variants::RpcQuantumWalk;

    #[test]
    fn test_reference_values() {
        let sp = RpcQuantumWalkSparsified::new(Geometry::new(0.3));
        let raw = [0.4, 0.1, 0.02, 0.05, 0.01];
        let k = WalkKnobs::parse("test", &raw).unwrap();
        assert!((sp.time_bucket_search(&k).unwrap() - 0.074_412_872_886_396_34).abs() < 1e-8);
        let t = sp.runtime(&raw).unwrap().value().unwrap();
        assert!((t - 0.083_471_974_518_425_83).abs() < 1e-8);

        let sp = RpcQuantumWalkSparsified::new(Geometry::new(0.1));
        let raw = [0.2, 0.05, 0.001, 0.12, 0.0];
        let k = WalkKnobs::parse("test", &raw).unwrap();
        assert!((sp.time_bucket_search(&k).unwrap() - 0.098_033_144_312_369_04).abs() < 1e-8);
        let t = sp.runtime(&raw).unwrap().value().unwrap();
        assert!((t - 0.149_063_934_556_407_82).abs() < 1e-8);
    }

    #[test]
    fn test_sparsification_never_hurts_here() {
        let g = Geometry::new(0.1);
        let raw = [0.2, 0.05, 0.001, 0.12, 0.0];
        let plain = RpcQuantumWalk::new(g).runtime(&raw).unwrap().penalized();
        let sparse = RpcQuantumWalkSparsified::new(g).runtime(&raw).unwrap().penalized();
        assert!(sparse < plain);
    }

    #[test]
    fn test_memory_holds_vertex_only() {
        let memory = RpcQuantumWalkSparsified::new(Geometry::new(0.3))
            .memory(&[0.4, 0.1, 0.02, 0.05, 0.01])
            .unwrap();
        let Memory::Quantum(q) = memory else {
            panic!("quantum memory expected");
        };
        assert_eq!(q.quantum, 0.02);
        assert_eq!(q.qraqm, 0.02);
    }
}
