//! Core traits for jetcal

/// Anything with a direction in (η, φ) space.
///
/// Every reconstructed object implements this so that overlap checks
/// can be written once, independent of the object species.
pub trait Direction {
    /// Pseudorapidity.
    fn eta(&self) -> f64;

    /// Azimuthal angle in radians.
    fn phi(&self) -> f64;
}

impl Direction for (f64, f64) {
    fn eta(&self) -> f64 {
        self.0
    }

    fn phi(&self) -> f64 {
        self.1
    }
}

impl<T: Direction + ?Sized> Direction for &T {
    fn eta(&self) -> f64 {
        (**self).eta()
    }

    fn phi(&self) -> f64 {
        (**self).phi()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tuple_direction() {
        let d = (1.5, -0.25);
        assert_eq!(d.eta(), 1.5);
        assert_eq!(d.phi(), -0.25);
        let r = &d;
        assert_eq!(Direction::eta(&r), 1.5);
    }
}
