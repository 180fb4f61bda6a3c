//! Classical GJN list matching, the parameter-free baseline.

use crate::entropy::log_binomial;
use crate::error::Result;
use crate::nns::{Cost, CostModel, Geometry, Memory};
use crate::optimizer::Problem;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Gjn {
    geometry: Geometry,
}

impl Gjn {
    pub fn new(geometry: Geometry) -> Self {
        Self { geometry }
    }

    fn exponent(&self) -> f64 {
        let w = self.geometry.w();
        self.geometry.list_size() + log_binomial(w, w / 2.0)
    }
}

impl CostModel for Gjn {
    fn name(&self) -> &'static str {
        "GJN"
    }

    fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    fn knob_names(&self) -> &'static [&'static str] {
        &[]
    }

    fn runtime(&self, knobs: &[f64]) -> Result<Cost> {
        self.check_arity(knobs)?;
        Ok(Cost::Feasible(self.exponent()))
    }

    fn memory(&self, knobs: &[f64]) -> Result<Memory> {
        self.check_arity(knobs)?;
        Ok(Memory::Classical(self.exponent()))
    }

    fn problem(&self) -> Option<Problem<'_>> {
        None
    }
}
