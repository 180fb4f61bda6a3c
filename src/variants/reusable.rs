//! Sparsified quantum walk that is reused across the solutions of a bucket
//! when enough beta-buckets are available.

use crate::error::Result;
use crate::nns::{Cost, CostModel, Geometry, Memory};
use crate::optimizer::Problem;

use super::quantum_walk::{walk_memory, walk_problem, walk_runtime, WalkKnobs, WalkTerms, WALK_KNOBS};
use super::sparsified::sparsified_walk;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RpcQuantumWalkReusable {
    geometry: Geometry,
}

impl RpcQuantumWalkReusable {
    pub fn new(geometry: Geometry) -> Self {
        Self { geometry }
    }

    /// Whether the walk can be reused: the solutions per beta-bucket must be
    /// at most a quarter of the beta codomain.
    ///
    /// Evaluated on `k` as given. The sweep calls this with the unsnapped
    /// optimum, runtime with the snapped knobs.
    pub fn reusable_walk_applies(&self, k: &WalkKnobs) -> Result<bool> {
        let terms = WalkTerms::new(&self.geometry, k)?;
        Ok(Self::applies(&terms))
    }

    fn applies(terms: &WalkTerms) -> bool {
        (terms.solutions - terms.d_beta).max(0.0) <= terms.codomain / 4.0
    }

    pub fn time_bucket_search(&self, k: &WalkKnobs) -> Result<f64> {
        let terms = WalkTerms::new(&self.geometry, k)?;
        let walk = sparsified_walk(k, &terms);

        let per_beta_bucket = (terms.solutions - terms.d_beta).max(0.0);
        let repetitions = terms.solutions - per_beta_bucket;

        if Self::applies(&terms) {
            Ok(repetitions + walk.cost(per_beta_bucket))
        } else {
            Ok(repetitions + per_beta_bucket + walk.cost(0.0))
        }
    }
}

impl CostModel for RpcQuantumWalkReusable {
    fn name(&self) -> &'static str {
        "RPC_quantum_walk_reusable"
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
    use crate::variants::RpcQuantumWalkSparsified;

    #[test]
    fn test_condition() {
        let re = RpcQuantumWalkReusable::new(Geometry::new(0.3));
        let k = WalkKnobs::parse("test", &[0.4, 0.1, 0.02, 0.05, 0.01]).unwrap();
        assert!(!re.reusable_walk_applies(&k).unwrap());

        let re = RpcQuantumWalkReusable::new(Geometry::new(0.1));
        let k = WalkKnobs::parse("test", &[0.2, 0.05, 0.001, 0.12, 0.0]).unwrap();
        assert!(re.reusable_walk_applies(&k).unwrap());
    }

    #[test]
    fn test_reference_values() {
        let re = RpcQuantumWalkReusable::new(Geometry::new(0.3));
        let raw = [0.4, 0.1, 0.02, 0.05, 0.01];
        let k = WalkKnobs::parse("test", &raw).unwrap();
        assert!((re.time_bucket_search(&k).unwrap() - 0.074_412_872_886_396_34).abs() < 1e-8);
        let t = re.runtime(&raw).unwrap().value().unwrap();
        assert!((t - 0.083_471_974_518_425_83).abs() < 1e-8);

        let re = RpcQuantumWalkReusable::new(Geometry::new(0.1));
        let raw = [0.2, 0.05, 0.001, 0.12, 0.0];
        let k = WalkKnobs::parse("test", &raw).unwrap();
        assert!((re.time_bucket_search(&k).unwrap() - 0.098_033_144_312_369_04).abs() < 1e-8);
        let t = re.runtime(&raw).unwrap().value().unwrap();
        assert!((t - 0.149_063_934_556_407_82).abs() < 1e-8);
    }

    #[test]
    fn test_reuse_beats_sparsified() {
        let g = Geometry::new(0.04);
        let re = RpcQuantumWalkReusable::new(g);
        let sp = RpcQuantumWalkSparsified::new(g);
        let raw = [0.1, 0.02, 0.02, 0.06, 0.0];
        let k = WalkKnobs::parse("test", &raw).unwrap();
        assert!(re.reusable_walk_applies(&k).unwrap());

        // repetitions + max(setup, per_beta - eps/2 + max(update - delta/2, check))
        let terms = WalkTerms::new(&g, &k).unwrap();
        let s = k.vertex_size;
        let per_beta = (terms.solutions - terms.d_beta).max(0.0);
        let repetitions = terms.solutions - per_beta;
        let epsilon = (-terms.d_beta).min(2.0 * s + terms.probability - terms.d_beta);
        let update = (terms.beta_bucket_size(s) / 2.0).max(0.0);
        let expected = repetitions + s.max(per_beta - epsilon / 2.0 + (update + s / 2.0).max(0.0));

        let t = re.time_bucket_search(&k).unwrap();
        assert!((t - expected).abs() < 1e-12);
        assert!((t - 0.036_873_712_363_316_28).abs() < 1e-8);
        assert!(t < sp.time_bucket_search(&k).unwrap());

        let t = re.runtime(&raw).unwrap().value().unwrap();
        let t_sp = sp.runtime(&raw).unwrap().value().unwrap();
        assert!((t - 0.079_180_086_247_576_94).abs() < 1e-8);
        assert!((t_sp - 0.082_041_708_967_083_89).abs() < 1e-8);
        assert!(t < t_sp);
    }

    #[test]
    fn test_same_memory_as_sparsified() {
        let g = Geometry::new(0.2);
        let raw = [0.3, 0.08, 0.01, 0.1, 0.02];
        assert_eq!(
            RpcQuantumWalkReusable::new(g).memory(&raw).unwrap(),
            RpcQuantumWalkSparsified::new(g).memory(&raw).unwrap()
        );
    }
}
