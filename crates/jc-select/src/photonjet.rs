//! Photon+jet balance selection.

use jc_core::{Jet, NOT_FOUND, Photon, TriggerObject};
use jc_core::geometry::{delta_r_between, overlaps_any};

use crate::config::PhotonJetCuts;

/// Probe and activity jet chosen by [`find_jet_idxs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhotonJetPair {
    /// First jet not overlapping any photon, `-1` if none.
    pub probe: i32,
    /// Next clean jet above the activity threshold, `-1` if none.
    pub activity: i32,
}

/// One flag per photon: matched to a photon trigger object.
pub fn has_trigger_object(
    photons: &[Photon],
    trigger_objects: &[TriggerObject],
    cuts: &PhotonJetCuts,
) -> Vec<bool> {
    photons
        .iter()
        .map(|ph| {
            trigger_objects.iter().any(|t| {
                delta_r_between(ph, t) < cuts.trigger_match_dr && t.id == cuts.trigger_id
            })
        })
        .collect()
}

/// Whether jet `idx` is spatially or by association part of some photon.
fn is_contaminated(idx: usize, jet: &Jet, photons: &[Photon], cuts: &PhotonJetCuts) -> bool {
    overlaps_any(jet, photons, cuts.overlap_dr)
        || photons.iter().any(|ph| ph.jet_idx >= 0 && ph.jet_idx as usize == idx)
}

/// Scan `jets` in order, skipping photon-contaminated ones.
pub fn find_jet_idxs(jets: &[Jet], photons: &[Photon], cuts: &PhotonJetCuts) -> PhotonJetPair {
    let mut pair = PhotonJetPair { probe: NOT_FOUND, activity: NOT_FOUND };
    for (i, jet) in jets.iter().enumerate() {
        if is_contaminated(i, jet, photons, cuts) {
            continue;
        }
        if pair.probe == NOT_FOUND {
            pair.probe = i as i32;
        } else if jet.pt > cuts.activity_min_pt {
            pair.activity = i as i32;
            break;
        }
    }
    pair
}

/// Jets entering the type-1 MET recomputation: away from the tag photon and above threshold.
pub fn met_jet_idxs(jets: &[Jet], tag: &Photon, cuts: &PhotonJetCuts) -> Vec<usize> {
    jets.iter()
        .enumerate()
        .filter(|(_, j)| delta_r_between(*j, tag) > cuts.overlap_dr && j.pt > cuts.met_jet_min_pt)
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_match_needs_photon_id() {
        let photons = [Photon::new(60.0, 0.5, 1.0), Photon::new(30.0, -1.0, -2.0)];
        let trig = [TriggerObject::new(0.55, 1.05, 22, 0), TriggerObject::new(-1.0, -2.0, 11, 0)];
        let flags = has_trigger_object(&photons, &trig, &PhotonJetCuts::default());
        assert_eq!(flags, vec![true, false]);
    }

    #[test]
    fn test_overlap_and_association_skip() {
        let photons = [Photon::new(80.0, 0.0, 0.0).with_jet_idx(1)];
        let jets = [
            Jet::new(78.0, 0.05, 0.05),
            Jet::new(50.0, 1.0, 3.0),
            Jet::new(45.0, -0.3, 3.0),
            Jet::new(20.0, 0.0, 1.5),
            Jet::new(35.0, 2.0, -1.5),
        ];
        let pair = find_jet_idxs(&jets, &photons, &PhotonJetCuts::default());
        assert_eq!(pair, PhotonJetPair { probe: 2, activity: 4 });
    }

    #[test]
    fn test_no_clean_jets() {
        let photons = [Photon::new(80.0, 0.0, 0.0)];
        let jets = [Jet::new(78.0, 0.05, 0.05)];
        let pair = find_jet_idxs(&jets, &photons, &PhotonJetCuts::default());
        assert_eq!(pair, PhotonJetPair { probe: NOT_FOUND, activity: NOT_FOUND });
    }

    #[test]
    fn test_met_jets() {
        let tag = Photon::new(80.0, 0.0, 0.0);
        let jets = [Jet::new(78.0, 0.05, 0.05), Jet::new(50.0, 0.0, 3.0), Jet::new(14.0, 1.0, 1.0)];
        assert_eq!(met_jet_idxs(&jets, &tag, &PhotonJetCuts::default()), vec![1]);
    }
}
