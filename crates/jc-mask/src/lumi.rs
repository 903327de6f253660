//! Certified run / luminosity-section mask ("golden JSON").
//!
//! ```json
//! {"355100": [[1, 40], [52, 120]], "355101": [[1, 9]]}
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use jc_core::{Error, Result};

/// Inclusive luminosity-section ranges per run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LumiMask {
    runs: BTreeMap<u32, Vec<[u32; 2]>>,
}

impl LumiMask {
    /// Parse a golden JSON document.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let raw: HashMap<String, Vec<[u32; 2]>> = serde_json::from_str(s)?;
        let mut runs = BTreeMap::new();
        for (key, mut ranges) in raw {
            let run: u32 = key
                .trim()
                .parse()
                .map_err(|_| Error::Validation(format!("lumi mask: run key '{key}' is not a run number")))?;
            if let Some(bad) = ranges.iter().find(|r| r[0] > r[1]) {
                return Err(Error::Validation(format!(
                    "lumi mask: run {run} has inverted range [{}, {}]",
                    bad[0], bad[1]
                )));
            }
            ranges.sort_unstable();
            runs.insert(run, ranges);
        }
        tracing::debug!(n_runs = runs.len(), "loaded luminosity mask");
        Ok(Self { runs })
    }

    /// Read and parse a golden JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Whether `lumi` of `run` lies in a certified range. Unknown runs are not good.
    pub fn is_good_lumi(&self, run: u32, lumi: u32) -> bool {
        self.runs
            .get(&run)
            .is_some_and(|ranges| ranges.iter().any(|&[lo, hi]| lumi >= lo && lumi <= hi))
    }

    /// Number of runs with at least one entry.
    pub fn n_runs(&self) -> usize {
        self.runs.len()
    }

    /// Whether the mask has no runs.
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}
