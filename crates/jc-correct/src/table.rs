//! Per-thread lookup tables.
//!
//! Tables are built once and never mutated; a registry holds one instance per
//! worker thread.

use crate::payload::{Formula, ParameterPayload};
use crate::stage::{BinnedStage, CorrectionStage, JetInputs};
use jc_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Ordered composition of scale stages yielding one multiplicative factor.
pub struct CorrectionTable {
    stages: Vec<Box<dyn CorrectionStage>>,
}

impl std::fmt::Debug for CorrectionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorrectionTable").field("levels", &self.levels()).finish()
    }
}

impl CorrectionTable {
    /// Compose `stages` in application order. At least one stage is required.
    pub fn new(stages: Vec<Box<dyn CorrectionStage>>) -> Result<Self> {
        if stages.is_empty() {
            return Err(Error::Initialization("correction table needs at least one stage".into()));
        }
        Ok(Self { stages })
    }

    /// Build from payloads, one [`BinnedStage`] each.
    pub fn from_payloads(payloads: &[ParameterPayload]) -> Result<Self> {
        let stages = payloads
            .iter()
            .map(|p| BinnedStage::new(p.clone()).map(|s| Box::new(s) as Box<dyn CorrectionStage>))
            .collect::<Result<Vec<_>>>()?;
        Self::new(stages)
    }

    /// Level names in application order.
    pub fn levels(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.level()).collect()
    }

    /// Total factor for a jet with uncorrected `pt`.
    ///
    /// Each stage sees the pt corrected by all previous stages; the result is the
    /// product of the stage factors.
    pub fn correction(&self, pt: f64, eta: f64, area: f64, rho: f64) -> f64 {
        let mut total = 1.0;
        for stage in &self.stages {
            let inputs = JetInputs { pt: pt * total, eta, area, rho };
            total *= stage.factor(&inputs);
        }
        total
    }
}

/// Binned relative pt resolution.
#[derive(Debug, Clone)]
pub struct ResolutionTable {
    payload: ParameterPayload,
}

impl ResolutionTable {
    /// Accepts `nsc` and `constant` records only.
    pub fn new(payload: ParameterPayload) -> Result<Self> {
        payload.validate()?;
        if let Some(bad) = payload
            .records
            .iter()
            .find(|r| !matches!(r.formula, Formula::Nsc { .. } | Formula::Constant { .. }))
        {
            return Err(Error::Validation(format!(
                "payload '{}' is not a resolution: record with formula {:?}",
                payload.level, bad.formula
            )));
        }
        Ok(Self { payload })
    }

    /// Relative resolution σ(pt)/pt; 0 outside the covered bins.
    pub fn resolution(&self, pt: f64, eta: f64, rho: f64) -> f64 {
        match self.payload.find_record(eta, rho) {
            Some(r) => r.formula.evaluate(r.clamp_pt(pt), 0.0, rho).max(0.0),
            None => 0.0,
        }
    }
}

/// Which edge of the scale-factor band a registry serves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SfVariation {
    /// Central value.
    #[default]
    Nominal,
    /// Lower edge.
    Down,
    /// Upper edge.
    Up,
}

#[derive(Debug, Clone)]
struct SfBin {
    eta: [f64; 2],
    rho: Option<[f64; 2]>,
    value: f64,
}

/// Binned data/simulation resolution scale factor for one variation.
#[derive(Debug, Clone)]
pub struct ScaleFactorTable {
    level: String,
    bins: Vec<SfBin>,
}

impl ScaleFactorTable {
    /// Resolve every record to the requested variation.
    pub fn new(payload: &ParameterPayload, variation: SfVariation) -> Result<Self> {
        payload.validate()?;
        let bins = payload
            .records
            .iter()
            .map(|r| {
                let value = match (&r.formula, variation) {
                    (Formula::ScaleFactor { nominal, .. }, SfVariation::Nominal) => *nominal,
                    (Formula::ScaleFactor { down, .. }, SfVariation::Down) => *down,
                    (Formula::ScaleFactor { up, .. }, SfVariation::Up) => *up,
                    (Formula::Constant { value }, _) => *value,
                    (other, _) => {
                        return Err(Error::Validation(format!(
                            "payload '{}' is not a scale factor: record with formula {:?}",
                            payload.level, other
                        )));
                    }
                };
                if !(value.is_finite() && value >= 0.0) {
                    return Err(Error::Validation(format!(
                        "payload '{}': scale factor must be finite and >= 0, got {}",
                        payload.level, value
                    )));
                }
                Ok(SfBin { eta: r.eta, rho: r.rho, value })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { level: payload.level.clone(), bins })
    }

    /// Level name.
    pub fn level(&self) -> &str {
        &self.level
    }

    /// Scale factor; 1 outside the covered (η, ρ) bins.
    ///
    /// Bins are selected on (η, ρ). A record pt range only bounds the formula, so
    /// a jet outside it gets the clamped-edge value, i.e. the bin value.
    pub fn scale_factor(&self, _pt: f64, eta: f64, rho: f64) -> f64 {
        self.bins
            .iter()
            .find(|b| eta >= b.eta[0] && eta < b.eta[1] && b.rho.is_none_or(|r| rho >= r[0] && rho < r[1]))
            .map_or(1.0, |b| b.value)
    }
}
