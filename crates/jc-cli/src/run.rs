//! Run configuration for `jetcal select` / `jetcal correct`.

use anyhow::Result;
use jc_correct::{JecSources, JerSources};
use jc_select::{Channel, SelectionConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// Calibration channel to select.
    pub channel: Channel,

    /// Simulation input: enables resolution smearing and skips the luminosity mask.
    #[serde(default)]
    pub is_mc: bool,

    /// Threads (0 = auto). Results do not depend on it.
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Base seed of the per-event random streams.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Energy-scale payloads to re-apply on top of raw jet pt.
    #[serde(default)]
    pub jec: Option<JecSources>,

    /// Resolution payloads (simulation only). Requires `jec`.
    #[serde(default)]
    pub jer: Option<JerSources>,

    /// Jet clustering cone used for generator-jet matching.
    #[serde(default = "default_cone")]
    pub jet_cone: f64,

    /// Golden JSON (collision data only).
    #[serde(default)]
    pub lumi_mask: Option<PathBuf>,

    /// Detector veto map.
    #[serde(default)]
    pub veto_map: Option<PathBuf>,

    /// Per-channel thresholds; only overrides need to be given.
    #[serde(default)]
    pub cuts: SelectionConfig,
}

fn default_threads() -> usize {
    1
}

fn default_seed() -> u64 {
    42
}

fn default_cone() -> f64 {
    0.4
}

impl RunConfig {
    /// Make every relative input path relative to `base` (the config file's directory).
    pub fn resolve_paths(&mut self, base: &Path) {
        let fix = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        if let Some(jec) = &mut self.jec {
            for p in [&mut jec.l1, &mut jec.l2_relative, &mut jec.l2l3_residual].into_iter().flatten() {
                fix(p);
            }
        }
        if let Some(jer) = &mut self.jer {
            fix(&mut jer.resolution);
            if let Some(p) = &mut jer.scale_factor {
                fix(p);
            }
        }
        for p in [&mut self.lumi_mask, &mut self.veto_map].into_iter().flatten() {
            fix(p);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.jer.is_some() && self.jec.is_none() {
            anyhow::bail!("jer requires jec: resolution tables share the correction registry");
        }
        if !(self.jet_cone > 0.0) {
            anyhow::bail!("jet_cone must be > 0, got {}", self.jet_cone);
        }
        Ok(())
    }

    /// Thread count with 0 resolved to the available parallelism.
    pub fn effective_threads(&self) -> usize {
        if self.threads == 0 {
            std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
        } else {
            self.threads
        }
    }
}

pub fn read_run_config(path: &Path) -> Result<RunConfig> {
    let bytes = std::fs::read(path)?;
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("").to_ascii_lowercase();
    let mut cfg: RunConfig = if ext == "json" {
        serde_json::from_slice(&bytes)?
    } else {
        // Default: YAML (serde_yaml_ng).
        serde_yaml_ng::from_slice(&bytes)?
    };
    if let Some(dir) = path.parent() {
        cfg.resolve_paths(dir);
    }
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_defaults() {
        let cfg: RunConfig = serde_yaml_ng::from_str("channel: zmm\n").unwrap();
        assert_eq!(cfg.channel, Channel::Zmm);
        assert!(!cfg.is_mc);
        assert_eq!(cfg.threads, 1);
        assert_eq!(cfg.seed, 42);
        assert!(cfg.jec.is_none());
        assert_eq!(cfg.cuts, SelectionConfig::default());
    }

    #[test]
    fn test_resolve_paths() {
        let mut cfg: RunConfig = serde_json::from_str(
            r#"{"channel": "dijet",
                "jec": {"l2_relative": "jec/L2Relative.json"},
                "veto_map": "/abs/vetomap.json"}"#,
        )
        .unwrap();
        cfg.resolve_paths(Path::new("/data/run"));
        let jec = cfg.jec.as_ref().unwrap();
        assert_eq!(jec.l2_relative.as_deref(), Some(Path::new("/data/run/jec/L2Relative.json")));
        assert_eq!(cfg.veto_map.as_deref(), Some(Path::new("/abs/vetomap.json")));
    }

    #[test]
    fn test_jer_without_jec_rejected() {
        let cfg: RunConfig = serde_json::from_str(
            r#"{"channel": "dijet", "is_mc": true, "jer": {"resolution": "res.json"}}"#,
        )
        .unwrap();
        assert!(cfg.validate().is_err());
    }
}
