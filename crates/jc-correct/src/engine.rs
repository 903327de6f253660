//! Thread-indexed correction registry.
//!
//! The registry owns one [`CorrectionTable`] (and optionally one resolution /
//! scale-factor pair) per worker thread. It is built once, before parallel work
//! starts, and is read-only afterwards: rebuilding means constructing a new
//! engine. Worker `k` only ever reads slot `k`.

use std::path::{Path, PathBuf};

use jc_core::{Error, Jet, Result};
use serde::{Deserialize, Serialize};

use crate::payload::ParameterPayload;
use crate::stage::CorrectionStage;
use crate::table::{CorrectionTable, ResolutionTable, ScaleFactorTable, SfVariation};

/// Payload files for the energy-scale stages; at least one must be given.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JecSources {
    /// Pileup offset (L1FastJet).
    #[serde(default)]
    pub l1: Option<PathBuf>,
    /// Relative η-dependent correction (L2Relative).
    #[serde(default)]
    pub l2_relative: Option<PathBuf>,
    /// Residual data/simulation correction (L2L3Residual).
    #[serde(default)]
    pub l2l3_residual: Option<PathBuf>,
}

impl JecSources {
    /// Whether no stage is configured.
    pub fn is_empty(&self) -> bool {
        self.l1.is_none() && self.l2_relative.is_none() && self.l2l3_residual.is_none()
    }

    fn stages(&self) -> impl Iterator<Item = (&'static str, &Path)> {
        [
            ("L1FastJet", self.l1.as_deref()),
            ("L2Relative", self.l2_relative.as_deref()),
            ("L2L3Residual", self.l2l3_residual.as_deref()),
        ]
        .into_iter()
        .filter_map(|(name, p)| p.map(|p| (name, p)))
    }
}

/// Payload files for the resolution registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JerSources {
    /// Relative pt resolution.
    pub resolution: PathBuf,
    /// Data/simulation resolution scale factor.
    #[serde(default)]
    pub scale_factor: Option<PathBuf>,
    /// Scale-factor band edge.
    #[serde(default)]
    pub variation: SfVariation,
}

#[derive(Debug)]
struct ResolutionSlot {
    resolution: ResolutionTable,
    scale_factor: Option<ScaleFactorTable>,
}

fn load_stage(stage: &str, path: &Path) -> Result<ParameterPayload> {
    ParameterPayload::from_path(path).map_err(|e| {
        Error::Initialization(format!("cannot load {stage} payload {}: {e}", path.display()))
    })
}

/// Per-thread correction, resolution and scale-factor registry.
#[derive(Debug)]
pub struct CorrectionEngine {
    jec: Vec<CorrectionTable>,
    jer: Vec<ResolutionSlot>,
}

impl CorrectionEngine {
    /// Load the configured stage payloads and build `n_threads` correction tables.
    pub fn init_jec(sources: &JecSources, n_threads: usize) -> Result<Self> {
        if sources.is_empty() {
            return Err(Error::Initialization(
                "no energy-scale payloads supplied (need at least one of L1, L2Relative, L2L3Residual)"
                    .into(),
            ));
        }
        let payloads =
            sources.stages().map(|(stage, path)| load_stage(stage, path)).collect::<Result<Vec<_>>>()?;
        Self::from_payloads(&payloads, n_threads)
    }

    /// Build `n_threads` correction tables from already-parsed payloads, applied in order.
    pub fn from_payloads(payloads: &[ParameterPayload], n_threads: usize) -> Result<Self> {
        if payloads.is_empty() {
            return Err(Error::Initialization("no energy-scale payloads supplied".into()));
        }
        Self::from_stage_factory(n_threads, || CorrectionTable::from_payloads(payloads))
    }

    /// Build one table per thread from a caller-supplied constructor.
    ///
    /// This is the entry point for hosts that evaluate corrections with their own
    /// [`CorrectionStage`] implementations.
    pub fn from_stage_factory<F>(n_threads: usize, mut build: F) -> Result<Self>
    where
        F: FnMut() -> Result<CorrectionTable>,
    {
        if n_threads == 0 {
            return Err(Error::Initialization("thread count must be >= 1".into()));
        }
        let jec = (0..n_threads).map(|_| build()).collect::<Result<Vec<_>>>()?;
        tracing::info!(n_threads, levels = ?jec[0].levels(), "built jet energy correction registry");
        Ok(Self { jec, jer: Vec::new() })
    }

    /// Convenience wrapper over [`CorrectionEngine::from_stage_factory`] for boxed stages.
    pub fn from_stages<F>(n_threads: usize, mut stages: F) -> Result<Self>
    where
        F: FnMut() -> Vec<Box<dyn CorrectionStage>>,
    {
        Self::from_stage_factory(n_threads, || CorrectionTable::new(stages()))
    }

    /// Load resolution (and optional scale-factor) payloads and attach one pair per thread.
    pub fn with_jer(self, sources: &JerSources) -> Result<Self> {
        let resolution = load_stage("resolution", &sources.resolution)?;
        let scale_factor = match &sources.scale_factor {
            Some(path) => Some(load_stage("resolution scale factor", path)?),
            None => None,
        };
        self.with_jer_payloads(&resolution, scale_factor.as_ref(), sources.variation)
    }

    /// Attach resolution tables built from parsed payloads.
    pub fn with_jer_payloads(
        mut self,
        resolution: &ParameterPayload,
        scale_factor: Option<&ParameterPayload>,
        variation: SfVariation,
    ) -> Result<Self> {
        let jer = (0..self.jec.len())
            .map(|_| {
                Ok(ResolutionSlot {
                    resolution: ResolutionTable::new(resolution.clone())?,
                    scale_factor: scale_factor
                        .map(|sf| ScaleFactorTable::new(sf, variation))
                        .transpose()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        tracing::info!(
            n_threads = jer.len(),
            resolution = %resolution.level,
            scale_factor = scale_factor.map(|p| p.level.as_str()).unwrap_or("none"),
            ?variation,
            "built jet resolution registry"
        );
        self.jer = jer;
        Ok(self)
    }

    /// Number of per-thread slots.
    pub fn n_threads(&self) -> usize {
        self.jec.len()
    }

    /// Whether resolution tables were attached.
    pub fn has_resolution(&self) -> bool {
        !self.jer.is_empty()
    }

    /// Whether scale-factor tables were attached.
    pub fn has_scale_factor(&self) -> bool {
        self.jer.first().is_some_and(|s| s.scale_factor.is_some())
    }

    /// Level names of the correction tables.
    pub fn levels(&self) -> Vec<&str> {
        self.jec[0].levels()
    }

    /// Energy-scale correction factor for an uncorrected jet.
    ///
    /// # Panics
    ///
    /// If `thread_id >= self.n_threads()`.
    pub fn correction(&self, thread_id: usize, pt: f64, eta: f64, area: f64, rho: f64) -> f64 {
        self.jec[thread_id].correction(pt, eta, area, rho)
    }

    /// One correction factor per jet, in input order, evaluated on raw pt.
    pub fn corrections(&self, thread_id: usize, jets: &[Jet], rho: f64) -> Vec<f64> {
        let table = &self.jec[thread_id];
        jets.iter().map(|j| table.correction(j.raw_pt(), j.eta, j.area, rho)).collect()
    }

    /// Copies of `jets` with the correction re-applied on top of raw pt.
    ///
    /// Order is preserved; the result is not re-sorted by the new pt.
    pub fn corrected_jets(&self, thread_id: usize, jets: &[Jet], rho: f64) -> Vec<Jet> {
        let factors = self.corrections(thread_id, jets, rho);
        jets.iter()
            .zip(factors)
            .map(|(jet, factor)| {
                let mut out = *jet;
                out.pt = jet.raw_pt() * factor;
                out.raw_factor = if factor > 0.0 { 1.0 - 1.0 / factor } else { jet.raw_factor };
                out
            })
            .collect()
    }

    fn jer_slot(&self, thread_id: usize) -> Result<&ResolutionSlot> {
        if self.jer.is_empty() {
            return Err(Error::NotInitialized("jet resolution registry".into()));
        }
        Ok(&self.jer[thread_id])
    }

    /// Relative pt resolution.
    ///
    /// # Panics
    ///
    /// If resolution tables exist and `thread_id >= self.n_threads()`.
    pub fn resolution(&self, thread_id: usize, pt: f64, eta: f64, rho: f64) -> Result<f64> {
        Ok(self.jer_slot(thread_id)?.resolution.resolution(pt, eta, rho))
    }

    /// Data/simulation resolution scale factor.
    pub fn resolution_scale_factor(
        &self,
        thread_id: usize,
        pt: f64,
        eta: f64,
        rho: f64,
    ) -> Result<f64> {
        let slot = self.jer_slot(thread_id)?;
        let sf = slot
            .scale_factor
            .as_ref()
            .ok_or_else(|| Error::NotInitialized("jet resolution scale-factor registry".into()))?;
        Ok(sf.scale_factor(pt, eta, rho))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::JetInputs;
    use approx::assert_relative_eq;

    fn payload(json: &str) -> ParameterPayload {
        ParameterPayload::from_json_str(json).unwrap()
    }

    fn l2() -> ParameterPayload {
        payload(
            r#"{"level": "L2Relative", "records": [
                {"eta": [-5.0, 5.0], "pt": [10.0, 3000.0],
                 "formula": {"type": "log_polynomial", "coeffs": [1.2, -0.02]}}]}"#,
        )
    }

    fn res() -> ParameterPayload {
        payload(
            r#"{"level": "PtResolution", "records": [
                {"eta": [-5.0, 5.0], "formula": {"type": "nsc", "n": 1.0, "s": 0.9, "c": 0.05, "d": -1.0}}]}"#,
        )
    }

    fn sf() -> ParameterPayload {
        payload(
            r#"{"level": "SF", "records": [
                {"eta": [-5.0, 5.0], "formula": {"type": "scale_factor", "nominal": 1.15, "down": 1.1, "up": 1.2}}]}"#,
        )
    }

    #[test]
    fn test_zero_sources_is_fatal() {
        let err = CorrectionEngine::init_jec(&JecSources::default(), 4).unwrap_err();
        assert!(matches!(err, Error::Initialization(_)));
        assert!(matches!(CorrectionEngine::from_payloads(&[], 2), Err(Error::Initialization(_))));
    }

    #[test]
    fn test_missing_file_names_stage() {
        let sources = JecSources {
            l2_relative: Some(PathBuf::from("/nonexistent/jetcal/L2Relative.json")),
            ..Default::default()
        };
        let err = CorrectionEngine::init_jec(&sources, 1).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("L2Relative"), "{msg}");
    }

    #[test]
    fn test_zero_threads_rejected() {
        assert!(CorrectionEngine::from_payloads(&[l2()], 0).is_err());
    }

    #[test]
    fn test_slots_agree_and_repeat() {
        let engine = CorrectionEngine::from_payloads(&[l2()], 3).unwrap();
        assert_eq!(engine.n_threads(), 3);
        let a = engine.correction(0, 87.5, 0.4, 0.5, 21.0);
        for t in 0..3 {
            for _ in 0..10 {
                assert_eq!(engine.correction(t, 87.5, 0.4, 0.5, 21.0).to_bits(), a.to_bits());
            }
        }
        let x = 87.5f64.ln();
        assert_relative_eq!(a, 1.2 - 0.02 * x, epsilon = 1e-12);
    }

    #[test]
    fn test_corrected_jets_roundtrip_raw() {
        let engine = CorrectionEngine::from_payloads(&[l2()], 1).unwrap();
        let jets = [Jet::new(100.0, 0.0, 0.0).with_factors(0.2, 0.0), Jet::new(40.0, 1.0, 1.0)];
        let out = engine.corrected_jets(0, &jets, 15.0);
        let f = engine.corrections(0, &jets, 15.0);
        assert_relative_eq!(out[0].pt, 80.0 * f[0], epsilon = 1e-9);
        // raw pt is unchanged by the re-correction.
        assert_relative_eq!(out[0].raw_pt(), 80.0, epsilon = 1e-9);
        assert_relative_eq!(out[1].raw_pt(), 40.0, epsilon = 1e-9);
        assert_eq!(out[1].phi, 1.0);
    }

    #[test]
    fn test_resolution_not_initialized() {
        let engine = CorrectionEngine::from_payloads(&[l2()], 2).unwrap();
        assert!(!engine.has_resolution());
        assert!(matches!(engine.resolution(0, 50.0, 0.0, 10.0), Err(Error::NotInitialized(_))));
        assert!(matches!(
            engine.resolution_scale_factor(0, 50.0, 0.0, 10.0),
            Err(Error::NotInitialized(_))
        ));
    }

    #[test]
    fn test_resolution_without_sf() {
        let engine = CorrectionEngine::from_payloads(&[l2()], 2)
            .unwrap()
            .with_jer_payloads(&res(), None, SfVariation::Nominal)
            .unwrap();
        assert!(engine.has_resolution());
        assert!(!engine.has_scale_factor());
        let sigma = engine.resolution(1, 100.0, 0.0, 10.0).unwrap();
        assert_relative_eq!(sigma, (1.0f64 / 1e4 + 0.81 / 100.0 + 0.0025).sqrt(), epsilon = 1e-12);
        assert!(matches!(
            engine.resolution_scale_factor(1, 100.0, 0.0, 10.0),
            Err(Error::NotInitialized(_))
        ));
    }

    #[test]
    fn test_resolution_with_sf_variation() {
        let engine = CorrectionEngine::from_payloads(&[l2()], 2)
            .unwrap()
            .with_jer_payloads(&res(), Some(&sf()), SfVariation::Up)
            .unwrap();
        assert_eq!(engine.resolution_scale_factor(0, 100.0, 0.0, 10.0).unwrap(), 1.2);
    }

    #[test]
    fn test_custom_stages() {
        struct Halve;
        impl CorrectionStage for Halve {
            fn level(&self) -> &str {
                "halve"
            }
            fn factor(&self, _jet: &JetInputs) -> f64 {
                0.5
            }
        }
        let engine =
            CorrectionEngine::from_stages(2, || vec![Box::new(Halve) as Box<dyn CorrectionStage>, Box::new(Halve)])
                .unwrap();
        assert_eq!(engine.levels(), vec!["halve", "halve"]);
        assert_eq!(engine.correction(1, 50.0, 0.0, 0.5, 10.0), 0.25);
    }
}
