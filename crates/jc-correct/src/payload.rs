//! Calibration parameter payloads.
//!
//! A payload is one correction level (e.g. `L1FastJet`, `L2Relative`,
//! `PtResolution`, `ScaleFactor`) stored as a list of binned records. Each record
//! covers an η bin, optionally a ρ bin, and carries the formula evaluated inside it.
//!
//! ```json
//! {
//!   "level": "L2Relative",
//!   "records": [
//!     {"eta": [-1.3, 1.3], "pt": [10.0, 3000.0],
//!      "formula": {"type": "log_polynomial", "coeffs": [1.05, -0.01]}}
//!   ]
//! }
//! ```

use std::path::Path;

use jc_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// One correction level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterPayload {
    /// Level name, used in logs and error messages.
    pub level: String,
    /// Binned records; the first record whose bins contain a jet is used.
    pub records: Vec<ParameterRecord>,
}

/// One bin of a payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRecord {
    /// `[lo, hi)` in η.
    pub eta: [f64; 2],
    /// `[lo, hi)` in ρ; any ρ if absent.
    #[serde(default)]
    pub rho: Option<[f64; 2]>,
    /// pt range the formula is valid in; pt is clamped into it before evaluation.
    #[serde(default)]
    pub pt: Option<[f64; 2]>,
    /// Formula evaluated inside the bin.
    pub formula: Formula,
}

/// Closed set of parameterisations understood by the stock tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Formula {
    /// A single value.
    Constant {
        /// The value.
        value: f64,
    },
    /// `Σ cᵢ · ln(pt)ⁱ`.
    LogPolynomial {
        /// `c₀, c₁, …`; at least one.
        coeffs: Vec<f64>,
    },
    /// Pileup offset: `max(min_factor, 1 − area·(p0 + p1·ρ)·(1 + p2·ln pt)/pt)`.
    AreaOffset {
        /// Constant offset density.
        p0: f64,
        /// Slope in ρ.
        p1: f64,
        /// Logarithmic pt dependence.
        #[serde(default)]
        p2: f64,
        /// Lower bound of the factor.
        #[serde(default = "default_min_factor")]
        min_factor: f64,
    },
    /// Resolution `sqrt(N·|N|/pt² + S²·pt^d + C²)`.
    Nsc {
        /// Noise term.
        n: f64,
        /// Stochastic term.
        s: f64,
        /// Constant term.
        c: f64,
        /// Exponent of the stochastic term.
        d: f64,
    },
    /// Data/simulation resolution ratio with its systematic band.
    ScaleFactor {
        /// Central value.
        nominal: f64,
        /// Lower edge.
        down: f64,
        /// Upper edge.
        up: f64,
    },
}

fn default_min_factor() -> f64 {
    0.0001
}

impl ParameterRecord {
    /// Whether `(eta, rho)` falls into this record's bins.
    pub fn contains(&self, eta: f64, rho: f64) -> bool {
        let in_eta = eta >= self.eta[0] && eta < self.eta[1];
        let in_rho = self.rho.is_none_or(|r| rho >= r[0] && rho < r[1]);
        in_eta && in_rho
    }

    /// `pt` clamped into the record's validity range.
    pub fn clamp_pt(&self, pt: f64) -> f64 {
        match self.pt {
            Some([lo, hi]) => pt.clamp(lo, hi),
            None => pt,
        }
    }
}

impl ParameterPayload {
    /// Parse a payload from a JSON string and validate it.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let payload: ParameterPayload = serde_json::from_str(s)?;
        payload.validate()?;
        Ok(payload)
    }

    /// Read, parse and validate a payload file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// First record covering `(eta, rho)`.
    pub fn find_record(&self, eta: f64, rho: f64) -> Option<&ParameterRecord> {
        self.records.iter().find(|r| r.contains(eta, rho))
    }

    /// Structural checks: non-empty, ordered bins, usable formulas.
    pub fn validate(&self) -> Result<()> {
        if self.records.is_empty() {
            return Err(Error::Validation(format!("payload '{}' has no records", self.level)));
        }
        for (i, r) in self.records.iter().enumerate() {
            let ordered = |b: [f64; 2]| b[0].is_finite() && b[1].is_finite() && b[0] < b[1];
            if !ordered(r.eta) {
                return Err(Error::Validation(format!(
                    "payload '{}' record {}: eta bin {:?} is not increasing",
                    self.level, i, r.eta
                )));
            }
            if let Some(rho) = r.rho
                && !ordered(rho)
            {
                return Err(Error::Validation(format!(
                    "payload '{}' record {}: rho bin {:?} is not increasing",
                    self.level, i, rho
                )));
            }
            if let Some(pt) = r.pt
                && !(pt[0] > 0.0 && pt[0] <= pt[1])
            {
                return Err(Error::Validation(format!(
                    "payload '{}' record {}: pt range {:?} is invalid",
                    self.level, i, pt
                )));
            }
            if let Formula::LogPolynomial { coeffs } = &r.formula
                && coeffs.is_empty()
            {
                return Err(Error::Validation(format!(
                    "payload '{}' record {}: log_polynomial needs at least one coefficient",
                    self.level, i
                )));
            }
        }
        Ok(())
    }
}
