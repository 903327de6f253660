//! Event mask providers: certified luminosity sections and detector veto maps.

#![warn(missing_docs)]

pub mod lumi;
pub mod vetomap;

pub use lumi::LumiMask;
pub use vetomap::VetoMap;
