//! # jc-correct
//!
//! Jet energy scale and resolution corrections.
//!
//! [`CorrectionEngine`] owns one set of tables per worker thread. It is built
//! once from parameter payloads before parallel work starts and is read-only
//! afterwards; worker `k` queries slot `k`.
//!
//! ```
//! use jc_correct::{CorrectionEngine, ParameterPayload};
//!
//! let l2 = ParameterPayload::from_json_str(
//!     r#"{"level": "L2Relative", "records": [
//!         {"eta": [-5.0, 5.0], "formula": {"type": "constant", "value": 1.05}}]}"#,
//! )
//! .unwrap();
//! let engine = CorrectionEngine::from_payloads(&[l2], 4).unwrap();
//! assert_eq!(engine.correction(2, 50.0, 0.3, 0.5, 20.0), 1.05);
//! ```

#![warn(missing_docs)]

pub mod engine;
pub mod payload;
pub mod rng;
pub mod smear;
pub mod stage;
pub mod table;

pub use engine::{CorrectionEngine, JecSources, JerSources};
pub use payload::{Formula, ParameterPayload, ParameterRecord};
pub use rng::{event_stream, stream_rng};
pub use smear::{match_gen_jet, smear, smear_hybrid};
pub use stage::{BinnedStage, CorrectionStage, JetInputs};
pub use table::{CorrectionTable, ResolutionTable, ScaleFactorTable, SfVariation};
