//! Angular matching primitives.
//!
//! Every selector decides "same object" / "well separated" with these two
//! functions, so they are kept branch-light and allocation-free.

use std::f64::consts::{PI, TAU};

use crate::traits::Direction;

/// Signed azimuthal difference `phi_a - phi_b`, wrapped into `(-π, π]`.
#[inline]
pub fn delta_phi(phi_a: f64, phi_b: f64) -> f64 {
    let mut d = (phi_a - phi_b) % TAU;
    if d > PI {
        d -= TAU;
    } else if d <= -PI {
        d += TAU;
    }
    d
}

/// Distance in (η, wrapped-φ) space: `sqrt(Δη² + Δφ²)`.
#[inline]
pub fn delta_r(eta_a: f64, eta_b: f64, phi_a: f64, phi_b: f64) -> f64 {
    let deta = eta_a - eta_b;
    let dphi = delta_phi(phi_a, phi_b);
    (deta * deta + dphi * dphi).sqrt()
}

/// [`delta_r`] between two objects.
#[inline]
pub fn delta_r_between(a: &impl Direction, b: &impl Direction) -> f64 {
    delta_r(a.eta(), b.eta(), a.phi(), b.phi())
}

/// Absolute azimuthal separation between two objects.
#[inline]
pub fn abs_delta_phi_between(a: &impl Direction, b: &impl Direction) -> f64 {
    delta_phi(a.phi(), b.phi()).abs()
}

/// Whether `obj` lies strictly within `max_dr` of any element of `others`.
#[inline]
pub fn overlaps_any<D: Direction>(obj: &impl Direction, others: &[D], max_dr: f64) -> bool {
    others.iter().any(|o| delta_r_between(obj, o) < max_dr)
}
