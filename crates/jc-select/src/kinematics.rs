//! Minimal four-vector arithmetic for invariant-mass reconstruction.

use std::ops::Add;

/// Cartesian four-momentum `(px, py, pz, E)`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FourVector {
    /// x momentum (GeV).
    pub px: f64,
    /// y momentum (GeV).
    pub py: f64,
    /// z momentum (GeV).
    pub pz: f64,
    /// Energy (GeV).
    pub e: f64,
}

impl FourVector {
    /// Build from collider coordinates `(pt, η, φ, m)`.
    pub fn from_pt_eta_phi_m(pt: f64, eta: f64, phi: f64, mass: f64) -> Self {
        let px = pt * phi.cos();
        let py = pt * phi.sin();
        let pz = pt * eta.sinh();
        let p2 = px * px + py * py + pz * pz;
        Self { px, py, pz, e: (p2 + mass * mass).sqrt() }
    }

    /// Invariant mass; spacelike vectors report 0.
    pub fn mass(&self) -> f64 {
        let m2 = self.e * self.e - (self.px * self.px + self.py * self.py + self.pz * self.pz);
        m2.max(0.0).sqrt()
    }

    /// Transverse momentum.
    pub fn pt(&self) -> f64 {
        self.px.hypot(self.py)
    }
}

impl Add for FourVector {
    type Output = FourVector;

    fn add(self, rhs: FourVector) -> FourVector {
        FourVector {
            px: self.px + rhs.px,
            py: self.py + rhs.py,
            pz: self.pz + rhs.pz,
            e: self.e + rhs.e,
        }
    }
}
