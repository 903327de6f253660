//! Correction stages: the unit a [`CorrectionTable`](crate::table::CorrectionTable) composes.
//!
//! [`CorrectionStage`] is the seam to the correction evaluator. [`BinnedStage`]
//! is the stock implementation driven by a [`ParameterPayload`]; hosts with their
//! own evaluator implement the trait directly.

use crate::payload::{Formula, ParameterPayload};
use jc_core::{Error, Result};

/// Inputs of a single-jet evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JetInputs {
    /// Transverse momentum entering this stage.
    pub pt: f64,
    /// Pseudorapidity.
    pub eta: f64,
    /// Catchment area.
    pub area: f64,
    /// Pileup density.
    pub rho: f64,
}

/// One multiplicative correction level.
pub trait CorrectionStage: Send + Sync {
    /// Level name.
    fn level(&self) -> &str;

    /// Multiplicative factor for `jet`. Must be deterministic.
    fn factor(&self, jet: &JetInputs) -> f64;
}

impl Formula {
    /// Evaluate at already-clamped `pt`.
    pub fn evaluate(&self, pt: f64, area: f64, rho: f64) -> f64 {
        match self {
            Formula::Constant { value } => *value,
            Formula::LogPolynomial { coeffs } => {
                let x = pt.ln();
                // Horner in ln(pt).
                coeffs.iter().rev().fold(0.0, |acc, c| acc * x + c)
            }
            Formula::AreaOffset { p0, p1, p2, min_factor } => {
                let offset = area * (p0 + p1 * rho) * (1.0 + p2 * pt.ln());
                (1.0 - offset / pt).max(*min_factor)
            }
            Formula::Nsc { n, s, c, d } => {
                let r = n * n.abs() / (pt * pt) + s * s * pt.powf(*d) + c * c;
                r.max(0.0).sqrt()
            }
            Formula::ScaleFactor { nominal, .. } => *nominal,
        }
    }
}

/// Payload-driven scale stage.
#[derive(Debug, Clone)]
pub struct BinnedStage {
    payload: ParameterPayload,
}

impl BinnedStage {
    /// Wrap a payload. Resolution and scale-factor formulas are rejected.
    pub fn new(payload: ParameterPayload) -> Result<Self> {
        payload.validate()?;
        if let Some(bad) = payload
            .records
            .iter()
            .find(|r| matches!(r.formula, Formula::Nsc { .. } | Formula::ScaleFactor { .. }))
        {
            return Err(Error::Validation(format!(
                "payload '{}' is not a scale correction: record with formula {:?}",
                payload.level, bad.formula
            )));
        }
        Ok(Self { payload })
    }
}

impl CorrectionStage for BinnedStage {
    fn level(&self) -> &str {
        &self.payload.level
    }

    fn factor(&self, jet: &JetInputs) -> f64 {
        match self.payload.find_record(jet.eta, jet.rho) {
            Some(record) => record.formula.evaluate(record.clamp_pt(jet.pt), jet.area, jet.rho),
            None => {
                tracing::debug!(level = %self.payload.level, eta = jet.eta, "jet outside payload bins");
                1.0
            }
        }
    }
}
