//! # jc-core
//!
//! Shared building blocks for jetcal:
//! - the per-event object model (jets, leptons, photons, trigger objects, scalars)
//! - the [`Direction`] trait and the Δφ / ΔR matching metric in [`geometry`]
//! - the common [`Error`] / [`Result`] types

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod geometry;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::Direction;
pub use types::{Event, EventScalars, GenJet, Jet, Lepton, NOT_FOUND, Photon, TriggerObject};
