//! Z(ee)+jet and Z(μμ)+jet selection.
//!
//! Both channels share the algorithm; the lepton flavour only decides which
//! trigger objects count as a match.

use jc_core::{Jet, Lepton, NOT_FOUND, TriggerObject};
use jc_core::geometry::{delta_r_between, overlaps_any};

use crate::config::ZJetCuts;
use crate::kinematics::FourVector;

/// Lepton species of a Z+jet channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeptonFlavor {
    /// Z → ee
    Electron,
    /// Z → μμ
    Muon,
}

impl LeptonFlavor {
    /// Trigger object particle id.
    pub fn trigger_id(self) -> i32 {
        match self {
            LeptonFlavor::Electron => 11,
            LeptonFlavor::Muon => 13,
        }
    }

    /// Filter bit that must be set on a matching trigger object.
    pub fn filter_bit(self) -> u32 {
        match self {
            LeptonFlavor::Electron => 0,
            LeptonFlavor::Muon => 3,
        }
    }
}

/// Selected opposite-charge lepton pair; `first` is the higher-pt lepton.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeptonPair {
    /// Leading lepton index, `-1` if no pair.
    pub first: i32,
    /// Subleading lepton index, `-1` if no pair.
    pub second: i32,
}

impl LeptonPair {
    /// No opposite-charge pair.
    pub const NONE: LeptonPair = LeptonPair { first: NOT_FOUND, second: NOT_FOUND };

    /// Whether a pair was found.
    pub fn is_found(&self) -> bool {
        self.first >= 0 && self.second >= 0
    }

    /// The selected leptons out of `leptons`; empty for [`LeptonPair::NONE`].
    pub fn leptons(&self, leptons: &[Lepton]) -> Vec<Lepton> {
        if !self.is_found() {
            return Vec::new();
        }
        vec![leptons[self.first as usize], leptons[self.second as usize]]
    }
}

/// Opposite-charge pair with invariant mass closest to `cuts.z_mass`.
///
/// The running best starts from a zero-mass baseline and is only replaced by a
/// strictly closer candidate, so the first-enumerated pair wins ties and pairs
/// further than `z_mass` from the pole are never selected.
pub fn find_lepton_pair(leptons: &[Lepton], cuts: &ZJetCuts) -> LeptonPair {
    let mut best: Option<(usize, usize)> = None;
    let mut best_mass = 0.0_f64;

    for (i, a) in leptons.iter().enumerate() {
        let va = FourVector::from_pt_eta_phi_m(a.pt, a.eta, a.phi, a.mass);
        for (j, b) in leptons.iter().enumerate().skip(i + 1) {
            if a.charge == b.charge {
                continue;
            }
            let vb = FourVector::from_pt_eta_phi_m(b.pt, b.eta, b.phi, b.mass);
            let m = (va + vb).mass();
            if (best_mass - cuts.z_mass).abs() > (m - cuts.z_mass).abs() {
                best_mass = m;
                best = Some((i, j));
            }
        }
    }

    let Some((i, j)) = best else {
        return LeptonPair::NONE;
    };
    let (first, second) = if leptons[i].pt < leptons[j].pt { (j, i) } else { (i, j) };
    LeptonPair { first: first as i32, second: second as i32 }
}

/// [`find_lepton_pair`] on electrons.
pub fn find_electron_idxs(electrons: &[Lepton], cuts: &ZJetCuts) -> LeptonPair {
    find_lepton_pair(electrons, cuts)
}

/// [`find_lepton_pair`] on muons.
pub fn find_muon_idxs(muons: &[Lepton], cuts: &ZJetCuts) -> LeptonPair {
    find_lepton_pair(muons, cuts)
}

/// One flag per lepton: matched to a trigger object of the right flavour and filter.
pub fn has_trigger_object(
    leptons: &[Lepton],
    trigger_objects: &[TriggerObject],
    flavor: LeptonFlavor,
    cuts: &ZJetCuts,
) -> Vec<bool> {
    let bit = 1_i32 << flavor.filter_bit();
    leptons
        .iter()
        .map(|l| {
            trigger_objects.iter().any(|t| {
                delta_r_between(l, t) < cuts.trigger_match_dr
                    && t.id == flavor.trigger_id()
                    && t.filter_bits & bit != 0
            })
        })
        .collect()
}

/// First two jets in input order separated by at least `lepton_jet_dr` from every lepton given.
pub fn find_jet_idxs(jets: &[Jet], leptons: &[Lepton], cuts: &ZJetCuts) -> (i32, i32) {
    let mut clean =
        jets.iter().enumerate().filter(|(_, j)| !overlaps_any(*j, leptons, cuts.lepton_jet_dr));
    let first = clean.next().map_or(NOT_FOUND, |(i, _)| i as i32);
    let second = clean.next().map_or(NOT_FOUND, |(i, _)| i as i32);
    (first, second)
}

/// One flag per jet: usable in the MET recomputation of a Z(μμ) event.
///
/// A jet fails if it overlaps a selected muon, or if its corrected pt minus the
/// muon energy it carries drops below `met_jet_min_pt`.
pub fn pass_mu_met(jets: &[Jet], muons: &[Lepton], cuts: &ZJetCuts) -> Vec<bool> {
    jets.iter()
        .map(|jet| {
            if overlaps_any(jet, muons, cuts.lepton_jet_dr) {
                return false;
            }
            let raw_pt = jet.raw_pt();
            let muon_subtracted_raw_pt = raw_pt * (1.0 - jet.muon_subtr_factor);
            let muon_pt = raw_pt - muon_subtracted_raw_pt;
            jet.pt - muon_pt >= cuts.met_jet_min_pt
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MUON_MASS: f64 = 0.105_658;

    fn mu(pt: f64, eta: f64, phi: f64, q: i32) -> Lepton {
        Lepton::new(pt, eta, phi, MUON_MASS, q)
    }

    #[test]
    fn test_pair_closest_to_pole() {
        let muons = [mu(50.0, 0.0, 0.0, 1), mu(45.0, 0.1, 3.0, -1), mu(10.0, 1.0, 1.0, -1)];
        let pair = find_muon_idxs(&muons, &ZJetCuts::default());
        assert_eq!(pair, LeptonPair { first: 0, second: 1 });
    }

    #[test]
    fn test_pair_leading_first() {
        let muons = [mu(30.0, 0.0, 0.0, 1), mu(60.0, 0.2, 3.0, -1)];
        let pair = find_muon_idxs(&muons, &ZJetCuts::default());
        assert_eq!(pair, LeptonPair { first: 1, second: 0 });
    }

    #[test]
    fn test_same_charge_only() {
        let muons = [mu(50.0, 0.0, 0.0, 1), mu(45.0, 0.1, 3.0, 1)];
        assert_eq!(find_muon_idxs(&muons, &ZJetCuts::default()), LeptonPair::NONE);
        assert_eq!(find_electron_idxs(&[], &ZJetCuts::default()), LeptonPair::NONE);
    }

    #[test]
    fn test_tie_keeps_first_enumerated() {
        // Pairs (0,1) and (0,2) have identical kinematics.
        let muons = [mu(50.0, 0.0, 0.0, 1), mu(45.0, 0.1, 3.0, -1), mu(45.0, 0.1, 3.0, -1)];
        let pair = find_muon_idxs(&muons, &ZJetCuts::default());
        assert_eq!(pair, LeptonPair { first: 0, second: 1 });
    }

    #[test]
    fn test_electron_trigger_bit() {
        let eles = [Lepton::new(40.0, 0.0, 0.0, 0.0, 1), Lepton::new(35.0, 1.0, 2.0, 0.0, -1)];
        let trig = [TriggerObject::new(0.0, 0.05, 11, 0b1), TriggerObject::new(1.0, 2.0, 11, 0b10)];
        let flags = has_trigger_object(&eles, &trig, LeptonFlavor::Electron, &ZJetCuts::default());
        assert_eq!(flags, vec![true, false]);
    }

    #[test]
    fn test_muon_trigger_bit_and_id() {
        let muons = [mu(40.0, 0.0, 0.0, 1), mu(35.0, 1.0, 2.0, -1)];
        let trig = [TriggerObject::new(0.0, 0.05, 13, 1 << 3), TriggerObject::new(1.0, 2.0, 11, 1 << 3)];
        let flags = has_trigger_object(&muons, &trig, LeptonFlavor::Muon, &ZJetCuts::default());
        assert_eq!(flags, vec![true, false]);
    }

    #[test]
    fn test_jets_cleaned_against_leptons() {
        let muons = [mu(50.0, 0.0, 0.0, 1), mu(45.0, 0.1, 3.0, -1)];
        let jets = [
            Jet::new(60.0, 0.05, 0.1),
            Jet::new(55.0, -1.0, 1.5),
            Jet::new(20.0, 0.1, 3.05),
            Jet::new(15.0, 2.0, -1.0),
        ];
        let pair = find_muon_idxs(&muons, &ZJetCuts::default());
        let selected = pair.leptons(&muons);
        assert_eq!(find_jet_idxs(&jets, &selected, &ZJetCuts::default()), (1, 3));
    }

    #[test]
    fn test_sentinel_pair_keeps_first_two_jets() {
        let jets = [Jet::new(60.0, 0.0, 0.0), Jet::new(55.0, 1.0, 1.5), Jet::new(20.0, 0.1, 3.0)];
        let selected = LeptonPair::NONE.leptons(&[]);
        assert!(selected.is_empty());
        assert_eq!(find_jet_idxs(&jets, &selected, &ZJetCuts::default()), (0, 1));
        assert_eq!(find_jet_idxs(&[], &selected, &ZJetCuts::default()), (NOT_FOUND, NOT_FOUND));
    }

    #[test]
    fn test_pass_mu_met() {
        let muons = [mu(50.0, 0.0, 0.0, 1)];
        let jets = [
            // overlaps the muon
            Jet::new(60.0, 0.1, 0.1),
            // raw 40, muon share 50% -> 20 GeV of muon, 40 - 20 = 20 >= 15
            Jet::new(40.0, 1.0, 2.0).with_factors(0.0, 0.5),
            // raw 24, muon share 50% -> 12 GeV of muon, 30 - 12 = 18 >= 15
            Jet::new(30.0, -1.0, 2.0).with_factors(0.2, 0.5),
            // raw 20, muon share 90% -> 18 GeV of muon, 20 - 18 = 2 < 15
            Jet::new(20.0, 2.0, -2.0).with_factors(0.0, 0.9),
        ];
        assert_eq!(pass_mu_met(&jets, &muons, &ZJetCuts::default()), vec![false, true, true, false]);
    }
}
