//! Dijet tag-and-probe selection.
//!
//! The two leading jets are assigned tag/probe roles at random so that repeated
//! calibration runs carry no pt-ordering bias. The tag must be central, both
//! jets must pass pt/id thresholds and be back-to-back in φ.

use rand::Rng;

use jc_core::{Jet, NOT_FOUND};
use jc_core::geometry::abs_delta_phi_between;

use crate::config::DijetCuts;
use crate::to_sentinel;

/// Outcome of [`find_tag_probe_idxs`]. Indices point into the input jets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DijetSelection {
    /// Tag jet index, `-1` if the event failed.
    pub tag: i32,
    /// Probe jet index, `-1` if the event failed.
    pub probe: i32,
    /// First additional jet above threshold, `-1` if none.
    pub activity: i32,
}

impl DijetSelection {
    /// All-sentinel result.
    pub const NONE: DijetSelection =
        DijetSelection { tag: NOT_FOUND, probe: NOT_FOUND, activity: NOT_FOUND };

    /// Whether a tag/probe pair was found.
    pub fn is_found(&self) -> bool {
        self.tag >= 0 && self.probe >= 0
    }
}

/// Pick tag, probe and activity jets among `jets`.
///
/// Draws exactly one bit from `rng` when at least two jets are present.
pub fn find_tag_probe_idxs<R: Rng + ?Sized>(
    jets: &[Jet],
    cuts: &DijetCuts,
    rng: &mut R,
) -> DijetSelection {
    if jets.len() < 2 {
        return DijetSelection::NONE;
    }

    let tag_idx: usize = rng.random_range(0..=1);
    let probe_idx = 1 - tag_idx;
    let tag = &jets[tag_idx];
    let probe = &jets[probe_idx];

    if tag.eta.abs() > cuts.tag_max_abs_eta
        || tag.pt < cuts.min_pt
        || !tag.passes_id(cuts.min_jet_id)
    {
        return DijetSelection::NONE;
    }

    if abs_delta_phi_between(probe, tag) <= cuts.min_back_to_back_dphi
        || probe.pt < cuts.min_pt
        || !probe.passes_id(cuts.min_jet_id)
    {
        return DijetSelection::NONE;
    }

    let activity = jets.iter().enumerate().position(|(i, j)| {
        i != tag_idx && i != probe_idx && j.pt >= cuts.min_pt && j.passes_id(cuts.min_jet_id)
    });

    DijetSelection { tag: tag_idx as i32, probe: probe_idx as i32, activity: to_sentinel(activity) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn jet(pt: f64, eta: f64, phi: f64) -> Jet {
        Jet::new(pt, eta, phi).with_id(6)
    }

    /// Draw until the rng assigns the tag to `want`, returning the selection.
    fn select_with_tag(jets: &[Jet], want: i32) -> DijetSelection {
        let cuts = DijetCuts::default();
        for seed in 0..64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut probe_rng = StdRng::seed_from_u64(seed);
            let drawn: usize = probe_rng.random_range(0..=1);
            if drawn as i32 == want {
                return find_tag_probe_idxs(jets, &cuts, &mut rng);
            }
        }
        unreachable!("no seed produced tag {want}");
    }

    #[test]
    fn test_back_to_back_pair() {
        let jets = [jet(100.0, 0.5, 0.0), jet(90.0, -0.8, 3.1)];
        let sel = find_tag_probe_idxs(&jets, &DijetCuts::default(), &mut StdRng::seed_from_u64(1));
        assert!(sel.is_found());
        assert_eq!(sel.tag + sel.probe, 1);
        assert_eq!(sel.activity, NOT_FOUND);
    }

    #[test]
    fn test_fewer_than_two_jets() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(find_tag_probe_idxs(&[], &DijetCuts::default(), &mut rng), DijetSelection::NONE);
        let one = [jet(50.0, 0.0, 0.0)];
        assert_eq!(find_tag_probe_idxs(&one, &DijetCuts::default(), &mut rng), DijetSelection::NONE);
    }

    #[test]
    fn test_forward_tag_rejected() {
        // Jet 1 is forward: only the draw that makes jet 0 the tag survives.
        let jets = [jet(100.0, 0.5, 0.0), jet(90.0, 2.0, 3.1)];
        assert_eq!(select_with_tag(&jets, 1), DijetSelection::NONE);
        let ok = select_with_tag(&jets, 0);
        assert_eq!((ok.tag, ok.probe), (0, 1));
    }

    #[test]
    fn test_not_back_to_back() {
        let jets = [jet(100.0, 0.5, 0.0), jet(90.0, -0.5, 2.0)];
        for seed in 0..8 {
            let sel =
                find_tag_probe_idxs(&jets, &DijetCuts::default(), &mut StdRng::seed_from_u64(seed));
            assert_eq!(sel, DijetSelection::NONE);
        }
    }

    #[test]
    fn test_loose_id_rejected() {
        let jets = [jet(100.0, 0.5, 0.0), Jet::new(90.0, -0.5, 3.1).with_id(2)];
        for seed in 0..8 {
            let sel =
                find_tag_probe_idxs(&jets, &DijetCuts::default(), &mut StdRng::seed_from_u64(seed));
            assert_eq!(sel, DijetSelection::NONE);
        }
    }

    #[test]
    fn test_activity_is_first_qualifying_jet() {
        let jets = [
            jet(100.0, 0.5, 0.0),
            jet(95.0, -0.5, 3.1),
            jet(11.0, 0.0, 1.0),
            Jet::new(40.0, 0.0, 1.0).with_id(2),
            jet(12.0, 3.0, 1.5),
            jet(20.0, 0.0, -1.5),
        ];
        let sel = find_tag_probe_idxs(&jets, &DijetCuts::default(), &mut StdRng::seed_from_u64(9));
        assert!(sel.is_found());
        assert_eq!(sel.activity, 4);
    }
}
