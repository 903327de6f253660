//! Per-event object model for jetcal
//!
//! Collections are plain ordered `Vec`s. Insertion order is the reconstruction
//! order and is part of the selector contract: nothing in jetcal re-sorts them.

use serde::{Deserialize, Serialize};

use crate::traits::Direction;

/// Sentinel for "no object found" in index outputs.
pub const NOT_FOUND: i32 = -1;

/// Reconstructed jet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Jet {
    /// Transverse momentum (GeV), fully corrected.
    pub pt: f64,
    /// Pseudorapidity.
    pub eta: f64,
    /// Azimuthal angle.
    pub phi: f64,
    /// Invariant mass (GeV).
    #[serde(default)]
    pub mass: f64,
    /// Effective catchment area.
    #[serde(default)]
    pub area: f64,
    /// Identification bitmask (tight = 2, tightLepVeto = 4).
    #[serde(default)]
    pub jet_id: i32,
    /// `1 - raw_pt / pt`.
    #[serde(default)]
    pub raw_factor: f64,
    /// Fraction of the raw pt attributed to muons.
    #[serde(default)]
    pub muon_subtr_factor: f64,
}

impl Jet {
    /// Jet with the given kinematics and neutral defaults for everything else.
    pub fn new(pt: f64, eta: f64, phi: f64) -> Self {
        Self {
            pt,
            eta,
            phi,
            mass: 0.0,
            area: 0.0,
            jet_id: 0,
            raw_factor: 0.0,
            muon_subtr_factor: 0.0,
        }
    }

    /// Set the identification bitmask.
    pub fn with_id(mut self, jet_id: i32) -> Self {
        self.jet_id = jet_id;
        self
    }

    /// Set the catchment area.
    pub fn with_area(mut self, area: f64) -> Self {
        self.area = area;
        self
    }

    /// Set the raw and muon-subtraction factors.
    pub fn with_factors(mut self, raw_factor: f64, muon_subtr_factor: f64) -> Self {
        self.raw_factor = raw_factor;
        self.muon_subtr_factor = muon_subtr_factor;
        self
    }

    /// Uncorrected transverse momentum.
    pub fn raw_pt(&self) -> f64 {
        self.pt * (1.0 - self.raw_factor)
    }

    /// Whether the identification bitmask reaches `min_id`.
    pub fn passes_id(&self, min_id: i32) -> bool {
        self.jet_id >= min_id
    }
}

/// Reconstructed electron or muon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lepton {
    /// Transverse momentum (GeV).
    pub pt: f64,
    /// Pseudorapidity.
    pub eta: f64,
    /// Azimuthal angle.
    pub phi: f64,
    /// Mass (GeV).
    #[serde(default)]
    pub mass: f64,
    /// Electric charge in units of e.
    pub charge: i32,
}

impl Lepton {
    /// Create a lepton.
    pub fn new(pt: f64, eta: f64, phi: f64, mass: f64, charge: i32) -> Self {
        Self { pt, eta, phi, mass, charge }
    }
}

/// Reconstructed photon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Photon {
    /// Transverse momentum (GeV).
    pub pt: f64,
    /// Pseudorapidity.
    pub eta: f64,
    /// Azimuthal angle.
    pub phi: f64,
    /// Index of the jet this photon was clustered into, [`NOT_FOUND`] if none.
    #[serde(default = "not_found")]
    pub jet_idx: i32,
}

fn not_found() -> i32 {
    NOT_FOUND
}

impl Photon {
    /// Photon with no jet association.
    pub fn new(pt: f64, eta: f64, phi: f64) -> Self {
        Self { pt, eta, phi, jet_idx: NOT_FOUND }
    }

    /// Set the associated jet index.
    pub fn with_jet_idx(mut self, jet_idx: i32) -> Self {
        self.jet_idx = jet_idx;
        self
    }
}

/// HLT trigger object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriggerObject {
    /// Pseudorapidity.
    pub eta: f64,
    /// Azimuthal angle.
    pub phi: f64,
    /// PDG-like particle id (11 electron, 13 muon, 22 photon).
    pub id: i32,
    /// Bitmask of passed trigger filters.
    #[serde(default)]
    pub filter_bits: i32,
}

impl TriggerObject {
    /// Create a trigger object.
    pub fn new(eta: f64, phi: f64, id: i32, filter_bits: i32) -> Self {
        Self { eta, phi, id, filter_bits }
    }
}

/// Generator-level jet (simulation only).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenJet {
    /// Transverse momentum (GeV).
    pub pt: f64,
    /// Pseudorapidity.
    pub eta: f64,
    /// Azimuthal angle.
    pub phi: f64,
}

/// Event-level scalars.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EventScalars {
    /// Pileup energy density.
    #[serde(default)]
    pub rho: f64,
    /// True number of pileup interactions (simulation).
    #[serde(default)]
    pub n_pu: f64,
    /// Number of reconstructed primary vertices.
    #[serde(default)]
    pub n_pv: u32,
    /// Run number.
    #[serde(default)]
    pub run: u32,
    /// Luminosity section.
    #[serde(default)]
    pub lumi: u32,
}

/// All objects of one collision event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event scalars.
    #[serde(flatten)]
    pub scalars: EventScalars,
    /// Jets in reconstruction order.
    #[serde(default)]
    pub jets: Vec<Jet>,
    /// Electrons.
    #[serde(default)]
    pub electrons: Vec<Lepton>,
    /// Muons.
    #[serde(default)]
    pub muons: Vec<Lepton>,
    /// Photons.
    #[serde(default)]
    pub photons: Vec<Photon>,
    /// Trigger objects.
    #[serde(default)]
    pub trigger_objects: Vec<TriggerObject>,
    /// Generator-level jets (empty for collision data).
    #[serde(default)]
    pub gen_jets: Vec<GenJet>,
}

macro_rules! impl_direction {
    ($($t:ty),*) => {
        $(
            impl Direction for $t {
                #[inline]
                fn eta(&self) -> f64 {
                    self.eta
                }

                #[inline]
                fn phi(&self) -> f64 {
                    self.phi
                }
            }
        )*
    };
}

impl_direction!(Jet, Lepton, Photon, TriggerObject, GenJet);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_pt() {
        let jet = Jet::new(100.0, 0.0, 0.0).with_factors(0.2, 0.0);
        assert!((jet.raw_pt() - 80.0).abs() < 1e-12);
    }

    #[test]
    fn test_passes_id() {
        let jet = Jet::new(30.0, 0.0, 0.0).with_id(6);
        assert!(jet.passes_id(4));
        assert!(!jet.with_id(2).passes_id(4));
    }

    #[test]
    fn test_event_from_json_defaults() {
        let ev: Event = serde_json::from_str(
            r#"{"run": 355100, "lumi": 12, "rho": 20.5,
                "jets": [{"pt": 50.0, "eta": 0.1, "phi": 1.0, "jet_id": 6}],
                "photons": [{"pt": 40.0, "eta": 0.2, "phi": -2.0}]}"#,
        )
        .unwrap();
        assert_eq!(ev.scalars.run, 355100);
        assert_eq!(ev.scalars.lumi, 12);
        assert_eq!(ev.jets.len(), 1);
        assert_eq!(ev.jets[0].area, 0.0);
        assert_eq!(ev.photons[0].jet_idx, NOT_FOUND);
        assert!(ev.muons.is_empty());
    }
}
