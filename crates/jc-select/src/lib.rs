//! # jc-select
//!
//! Per-channel object selection for jet energy calibration events.
//!
//! Each selector is a pure function of one event's object collections (plus an
//! explicit random source for the dijet tag assignment). "Nothing found" is a
//! normal outcome, encoded as `-1` indices or empty index vectors.
//!
//! ```
//! use jc_core::Jet;
//! use jc_select::config::MultijetCuts;
//! use jc_select::multijet::select_multijet;
//!
//! let jets = [
//!     Jet::new(300.0, 0.1, 0.0).with_id(6),
//!     Jet::new(120.0, -0.4, 2.9).with_id(6),
//!     Jet::new(90.0, 1.1, -2.6).with_id(6),
//! ];
//! let sel = select_multijet(&jets, &MultijetCuts::default());
//! assert_eq!(sel.recoil, vec![1, 2]);
//! assert!(sel.is_clean());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod dijet;
pub mod kinematics;
pub mod multijet;
pub mod photonjet;
pub mod zjet;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use config::SelectionConfig;
pub use jc_core::geometry;
pub use jc_core::geometry::{delta_phi, delta_r};

/// Calibration channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Two back-to-back jets.
    Dijet,
    /// Leading jet against a recoil system.
    Multijet,
    /// Photon against a jet.
    Photonjet,
    /// Z → ee against a jet.
    Zee,
    /// Z → μμ against a jet.
    Zmm,
}

impl Channel {
    /// Lower-case channel name.
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Dijet => "dijet",
            Channel::Multijet => "multijet",
            Channel::Photonjet => "photonjet",
            Channel::Zee => "zee",
            Channel::Zmm => "zmm",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = jc_core::Error;

    fn from_str(s: &str) -> jc_core::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dijet" => Ok(Channel::Dijet),
            "multijet" => Ok(Channel::Multijet),
            "photonjet" | "gammajet" => Ok(Channel::Photonjet),
            "zee" => Ok(Channel::Zee),
            "zmm" | "zmumu" => Ok(Channel::Zmm),
            other => Err(jc_core::Error::Validation(format!("unknown channel '{other}'"))),
        }
    }
}

/// `Some(i)` → `i`, `None` → `-1`.
#[inline]
pub(crate) fn to_sentinel(idx: Option<usize>) -> i32 {
    idx.map_or(jc_core::NOT_FOUND, |i| i as i32)
}

/// Inverse of the sentinel encoding.
#[inline]
pub fn found(idx: i32) -> Option<usize> {
    usize::try_from(idx).ok()
}
