//! Detector (η, φ) veto map.
//!
//! Binning follows the histogram convention of one underflow and one overflow
//! bin per axis: axis bin 0 is underflow, `1..=n` are in range, `n + 1` is
//! overflow, and the global bin is `(nx + 2) * iy + ix`. Flow bins are never
//! filled from the file, so they are good.
//!
//! ```json
//! {"name": "jetvetomap",
//!  "eta_edges": [-5.0, 0.0, 5.0],
//!  "phi_edges": [-3.1416, 0.0, 3.1416],
//!  "contents": [[0.0, 100.0], [0.0, 0.0]]}
//! ```
//!
//! `contents[i][j]` is η bin `i`, φ bin `j`.

use std::path::Path;

use jc_core::{Direction, Error, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct VetoMapFile {
    #[serde(default = "default_name")]
    name: String,
    eta_edges: Vec<f64>,
    phi_edges: Vec<f64>,
    contents: Vec<Vec<f64>>,
}

fn default_name() -> String {
    "jetvetomap".to_string()
}

/// 2D veto map; content `> 0` marks a vetoed region.
#[derive(Debug, Clone, PartialEq)]
pub struct VetoMap {
    name: String,
    eta_edges: Vec<f64>,
    phi_edges: Vec<f64>,
    /// `(nx + 2) * (ny + 2)` bins including flow.
    bins: Vec<f64>,
}

fn check_edges(map: &str, axis: &str, edges: &[f64]) -> Result<()> {
    if edges.len() < 2 {
        return Err(Error::Validation(format!("veto map '{map}': {axis} axis needs at least two edges")));
    }
    if edges.iter().any(|e| !e.is_finite()) || edges.windows(2).any(|w| w[0] >= w[1]) {
        return Err(Error::Validation(format!("veto map '{map}': {axis} edges must be finite and strictly increasing")));
    }
    Ok(())
}

/// Axis bin of `x`: 0 underflow, `1..=n` in range, `n + 1` overflow (NaN included).
fn axis_bin(edges: &[f64], x: f64) -> usize {
    let n = edges.len() - 1;
    if x < edges[0] {
        0
    } else if !(x < edges[n]) {
        n + 1
    } else {
        // first edge strictly greater than x
        edges.partition_point(|&e| e <= x)
    }
}

impl VetoMap {
    /// Build from edges and in-range contents (`contents[eta_bin][phi_bin]`).
    pub fn new(
        name: impl Into<String>,
        eta_edges: Vec<f64>,
        phi_edges: Vec<f64>,
        contents: Vec<Vec<f64>>,
    ) -> Result<Self> {
        let name = name.into();
        check_edges(&name, "eta", &eta_edges)?;
        check_edges(&name, "phi", &phi_edges)?;
        let nx = eta_edges.len() - 1;
        let ny = phi_edges.len() - 1;
        if contents.len() != nx || contents.iter().any(|row| row.len() != ny) {
            return Err(Error::Validation(format!(
                "veto map '{name}': contents must be {nx} x {ny} to match the edges"
            )));
        }
        let mut bins = vec![0.0; (nx + 2) * (ny + 2)];
        for (i, row) in contents.iter().enumerate() {
            for (j, &c) in row.iter().enumerate() {
                bins[(nx + 2) * (j + 1) + (i + 1)] = c;
            }
        }
        let n_bad = bins.iter().filter(|&&c| c > 0.0).count();
        tracing::debug!(name = %name, nx, ny, n_bad, "loaded veto map");
        Ok(Self { name, eta_edges, phi_edges, bins })
    }

    /// Parse the JSON form.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let file: VetoMapFile = serde_json::from_str(s)?;
        Self::new(file.name, file.eta_edges, file.phi_edges, file.contents)
    }

    /// Read and parse a JSON veto map.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Map name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Global bin index of `(eta, phi)`, flow bins included.
    pub fn find_bin(&self, eta: f64, phi: f64) -> usize {
        let nx = self.eta_edges.len() - 1;
        let ix = axis_bin(&self.eta_edges, eta);
        let iy = axis_bin(&self.phi_edges, phi);
        (nx + 2) * iy + ix
    }

    /// Content of a global bin.
    pub fn bin_content(&self, bin: usize) -> f64 {
        self.bins.get(bin).copied().unwrap_or(0.0)
    }

    /// Whether `(eta, phi)` is outside every vetoed region.
    pub fn is_good(&self, eta: f64, phi: f64) -> bool {
        self.bin_content(self.find_bin(eta, phi)) <= 0.0
    }

    /// One flag per object, in input order.
    pub fn pass_flags<D: Direction>(&self, objects: &[D]) -> Vec<bool> {
        objects.iter().map(|o| self.is_good(o.eta(), o.phi())).collect()
    }
}
