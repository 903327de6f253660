//! Per-channel selection thresholds.
//!
//! Defaults are the nominal calibration values. Every struct deserializes with
//! `#[serde(default)]` so a run config only needs to name what it overrides.

use serde::{Deserialize, Serialize};

/// Z boson pole mass (GeV).
pub const Z_MASS: f64 = 91.1876;

/// Jet identification threshold (tightLepVeto bit).
pub const TIGHT_JET_ID: i32 = 4;

/// Dijet tag/probe thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DijetCuts {
    /// Maximum |η| of the tag (barrel).
    pub tag_max_abs_eta: f64,
    /// Minimum pt of tag, probe and activity jets.
    pub min_pt: f64,
    /// Minimum jet id of tag, probe and activity jets.
    pub min_jet_id: i32,
    /// Minimum |Δφ| between tag and probe.
    pub min_back_to_back_dphi: f64,
}

impl Default for DijetCuts {
    fn default() -> Self {
        Self {
            tag_max_abs_eta: 1.3,
            min_pt: 12.0,
            min_jet_id: TIGHT_JET_ID,
            min_back_to_back_dphi: 2.7,
        }
    }
}

/// Multijet recoil and veto thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MultijetCuts {
    /// Jets above this pt take part in recoil and vetoes.
    pub min_pt: f64,
    /// Central/forward boundary in |η|.
    pub max_abs_eta: f64,
    /// |Δφ| to the leading jet separating "near" from recoil.
    pub near_dphi: f64,
    /// Minimum jet id for recoil jets.
    pub min_jet_id: i32,
}

impl Default for MultijetCuts {
    fn default() -> Self {
        Self { min_pt: 30.0, max_abs_eta: 2.5, near_dphi: 1.0, min_jet_id: TIGHT_JET_ID }
    }
}

/// Photon+jet thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PhotonJetCuts {
    /// Photon–trigger-object matching cone.
    pub trigger_match_dr: f64,
    /// Trigger object id of a photon.
    pub trigger_id: i32,
    /// Photon–jet overlap cone.
    pub overlap_dr: f64,
    /// Minimum pt of the secondary (activity) jet.
    pub activity_min_pt: f64,
    /// Minimum pt of a jet entering the MET recomputation.
    pub met_jet_min_pt: f64,
    /// Minimum pt of the photon tag.
    pub tag_min_pt: f64,
    /// Maximum |η| of the photon tag.
    pub tag_max_abs_eta: f64,
    /// Minimum pt of the probe jet.
    pub probe_min_pt: f64,
    /// Minimum |Δφ| between photon tag and probe jet.
    pub min_back_to_back_dphi: f64,
    /// Minimum jet id of the probe jet.
    pub min_jet_id: i32,
}

impl Default for PhotonJetCuts {
    fn default() -> Self {
        Self {
            trigger_match_dr: 0.3,
            trigger_id: 22,
            overlap_dr: 0.2,
            activity_min_pt: 30.0,
            met_jet_min_pt: 15.0,
            tag_min_pt: 15.0,
            tag_max_abs_eta: 1.3,
            probe_min_pt: 15.0,
            min_back_to_back_dphi: 2.7,
            min_jet_id: TIGHT_JET_ID,
        }
    }
}

/// Z(ℓℓ)+jet thresholds, shared by electrons and muons.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ZJetCuts {
    /// Pole mass the pair search aims for.
    pub z_mass: f64,
    /// Lepton–trigger-object matching cone.
    pub trigger_match_dr: f64,
    /// Lepton–jet cleaning cone.
    pub lepton_jet_dr: f64,
    /// Minimum muon-subtracted pt of a jet entering the MET recomputation.
    pub met_jet_min_pt: f64,
}

impl Default for ZJetCuts {
    fn default() -> Self {
        Self { z_mass: Z_MASS, trigger_match_dr: 0.3, lepton_jet_dr: 0.3, met_jet_min_pt: 15.0 }
    }
}

/// All channel thresholds of one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SelectionConfig {
    /// Dijet thresholds.
    pub dijet: DijetCuts,
    /// Multijet thresholds.
    pub multijet: MultijetCuts,
    /// Photon+jet thresholds.
    pub photonjet: PhotonJetCuts,
    /// Z+jet thresholds.
    pub zjet: ZJetCuts,
}
