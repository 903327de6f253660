//! Jet energy resolution smearing.
//!
//! Two branches:
//! - a generator-matched jet is scaled deterministically towards its generator pt;
//! - an unmatched jet is broadened stochastically by `sigma * sqrt(sf^2 - 1)`.
//!
//! The matched branch takes priority whenever a match exists.

use jc_core::geometry::delta_r_between;
use jc_core::{GenJet, Jet};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

/// Stochastic smearing factor `1 + z * sigma * sqrt(max(0, sf^2 - 1))`, `z ~ N(0, 1)`.
///
/// `z` is drawn on every call, including when `sf < 1` makes the result exactly
/// `1.0`, so the draw count per jet is fixed. The factor is clamped at 0.
pub fn smear<R: Rng + ?Sized>(sigma: f64, sf: f64, rng: &mut R) -> f64 {
    let z: f64 = StandardNormal.sample(rng);
    let width = sigma * (sf * sf - 1.0).max(0.0).sqrt();
    (1.0 + z * width).max(0.0)
}

/// Scaling factor for a jet matched to a generator jet of pt `gen_pt`.
#[inline]
pub fn scale_to_gen(jet_pt: f64, gen_pt: f64, sf: f64) -> f64 {
    (1.0 + (sf - 1.0) * (jet_pt - gen_pt) / jet_pt).max(0.0)
}

/// Smearing factor with generator-match priority.
///
/// With `Some(gen_pt)` the deterministic [`scale_to_gen`] result is returned and no
/// random number is drawn; otherwise falls back to [`smear`].
pub fn smear_hybrid<R: Rng + ?Sized>(
    jet_pt: f64,
    sigma: f64,
    sf: f64,
    gen_pt: Option<f64>,
    rng: &mut R,
) -> f64 {
    match gen_pt {
        Some(gen_pt) if jet_pt > 0.0 => scale_to_gen(jet_pt, gen_pt, sf),
        _ => smear(sigma, sf, rng),
    }
}

/// First generator jet within `cone / 2` in ΔR and `3 * sigma * pt` in pt.
pub fn match_gen_jet<'a>(jet: &Jet, sigma: f64, gen_jets: &'a [GenJet], cone: f64) -> Option<&'a GenJet> {
    let max_dpt = 3.0 * sigma * jet.pt;
    gen_jets
        .iter()
        .find(|g| delta_r_between(jet, *g) < 0.5 * cone && (jet.pt - g.pt).abs() < max_dpt)
}
