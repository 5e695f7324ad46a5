use polars::frame::DataFrame;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Column names of the model inputs, in the order the ensemble was trained on.
pub const FEATURE_COLUMNS: [&str; 4] = ["Hydro_Delta", "Weight_Delta", "Charge_Delta", "Position"];

pub const LABEL_COLUMN: &str = "Label";

/// Anything in the pipeline that can be materialised as a table.
pub trait Dataset {
    fn load(&self) -> Result<DataFrame>;
}

/// Physicochemical change caused by one substitution.
///
/// Deltas are always `new - original`. Flipping that convention silently
/// inverts what the trained ensemble has learned.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub hydro_delta: f64,
    pub weight_delta: f64,
    pub charge_delta: f64,
    pub position: u32,
}

impl FeatureVector {
    /// Row layout expected by the classifier, see [`FEATURE_COLUMNS`].
    pub fn to_array(&self) -> [f64; 4] {
        [
            self.hydro_delta,
            self.weight_delta,
            self.charge_delta,
            self.position as f64,
        ]
    }

    pub fn deltas(&self) -> Deltas {
        Deltas {
            hydro: self.hydro_delta,
            weight: self.weight_delta,
            charge: self.charge_delta,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabeledExample {
    pub features: FeatureVector,
    /// true = pathogenic
    pub label: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Deltas {
    pub hydro: f64,
    pub weight: f64,
    pub charge: f64,
}

/// One variant the scan flagged as pathogenic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub mutation: String,
    pub probability: f64,
    pub deltas: Deltas,
    pub position: u32,
    /// Identifier column of the uploaded row ("ID" in a VCF)
    pub gene: String,
}

/// Response body of a scan, as consumed by the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResponse {
    pub status: String,
    pub count: usize,
    pub results: Vec<ScanResult>,
}

impl ScanResponse {
    pub fn success(results: Vec<ScanResult>) -> Self {
        ScanResponse {
            status: "success".to_string(),
            count: results.len(),
            results,
        }
    }
}
