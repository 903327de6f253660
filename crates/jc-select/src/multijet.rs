//! Multijet balance: the leading jet recoils against a system of softer jets.
//!
//! The leading jet (index 0) is the implicit tag. Every other jet above the pt
//! threshold falls into exactly one region: forward (|η| ≥ max), near
//! (central, |Δφ| ≤ near_dphi to the leading jet) or recoil (central, away).

use jc_core::Jet;
use jc_core::geometry::abs_delta_phi_between;

use crate::config::MultijetCuts;

/// Outcome of [`select_multijet`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MultijetSelection {
    /// Recoil jet indices in input order (empty: no recoil candidates).
    pub recoil: Vec<usize>,
    /// `false` if a hard forward jet is present.
    pub pass_forward_veto: bool,
    /// `false` if a hard central jet is close in φ to the leading jet.
    pub pass_near_veto: bool,
}

impl MultijetSelection {
    /// Recoil system found and both vetoes passed.
    pub fn is_clean(&self) -> bool {
        !self.recoil.is_empty() && self.pass_forward_veto && self.pass_near_veto
    }
}

#[inline]
fn is_central_hard(jet: &Jet, cuts: &MultijetCuts) -> bool {
    jet.pt > cuts.min_pt && jet.eta.abs() < cuts.max_abs_eta
}

/// Indices of central, tightly identified jets recoiling against the leading jet.
pub fn find_recoil_jet_idxs(jets: &[Jet], cuts: &MultijetCuts) -> Vec<usize> {
    let Some(leading) = jets.first() else {
        return Vec::new();
    };
    jets.iter()
        .enumerate()
        .skip(1)
        .filter(|(_, j)| {
            is_central_hard(j, cuts)
                && j.passes_id(cuts.min_jet_id)
                && abs_delta_phi_between(*j, leading) > cuts.near_dphi
        })
        .map(|(i, _)| i)
        .collect()
}

/// `true` unless some non-leading jet with pt above threshold is forward.
pub fn multijet_veto_forward(jets: &[Jet], cuts: &MultijetCuts) -> bool {
    !jets.iter().skip(1).any(|j| j.pt > cuts.min_pt && j.eta.abs() >= cuts.max_abs_eta)
}

/// `true` unless some non-leading central hard jet is within `near_dphi` of the leading jet.
pub fn multijet_veto_near(jets: &[Jet], cuts: &MultijetCuts) -> bool {
    let Some(leading) = jets.first() else {
        return true;
    };
    !jets
        .iter()
        .skip(1)
        .any(|j| is_central_hard(j, cuts) && abs_delta_phi_between(j, leading) <= cuts.near_dphi)
}

/// Run recoil search and both vetoes.
pub fn select_multijet(jets: &[Jet], cuts: &MultijetCuts) -> MultijetSelection {
    MultijetSelection {
        recoil: find_recoil_jet_idxs(jets, cuts),
        pass_forward_veto: multijet_veto_forward(jets, cuts),
        pass_near_veto: multijet_veto_near(jets, cuts),
    }
}
