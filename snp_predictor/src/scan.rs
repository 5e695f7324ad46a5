//! Serving side: score an uploaded variant file.
//!
//! Meta lines (`##...`) and blank lines are removed, the rest is read as a
//! tab-separated table whose header is the first remaining line (`#CHROM ...`
//! in a VCF). Rows without a usable substitution are skipped and counted.

use serde::Serialize;
use tracing::{debug, info};

use crate::classifier::{is_pathogenic, PathogenicityModel};
use crate::config::ScanConfig;
use crate::error::{PredictorError, Result};
use crate::features::try_extract;
use crate::helper_functions::{read_tsv_bytes, require_columns};
use crate::models::{Deltas, ScanResponse, ScanResult};
use crate::mutation::Wrapping;

const UPLOAD_SOURCE: &str = "uploaded variant file";
const UNKNOWN_IDENTIFIER: &str = "Unknown";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanReport {
    pub rows_scanned: usize,
    pub rows_without_features: usize,
    pub rows_at_or_below_threshold: usize,
    pub results: Vec<ScanResult>,
}

impl ScanReport {
    pub fn into_response(self) -> ScanResponse {
        ScanResponse::success(self.results)
    }
}

fn strip_meta_lines(content: &[u8]) -> Result<Vec<u8>> {
    let text = std::str::from_utf8(content)
        .map_err(|e| PredictorError::MalformedUpload(format!("not UTF-8 text: {}", e)))?;

    let mut table = String::with_capacity(text.len());
    for line in text.lines() {
        if line.starts_with("##") || line.trim().is_empty() {
            continue;
        }
        table.push_str(line);
        table.push('\n');
    }
    if table.is_empty() {
        return Err(PredictorError::MalformedUpload("no header line found".to_string()));
    }
    Ok(table.into_bytes())
}

/// Score every row of `content` and keep those strictly above `threshold`.
///
/// The notation column is required. The identifier column is optional; rows
/// without one are reported as `"Unknown"`.
pub fn scan<M: PathogenicityModel + ?Sized>(
    content: &[u8],
    model: &M,
    config: &ScanConfig,
    threshold: f64,
) -> Result<ScanReport> {
    let table = strip_meta_lines(content)?;
    let df = read_tsv_bytes(table).map_err(|e| PredictorError::MalformedUpload(e.to_string()))?;
    require_columns(&df, &[config.notation_column.as_str()], UPLOAD_SOURCE)?;

    let notations = df.column(&config.notation_column)?.str()?;
    let identifiers = match df.column(&config.identifier_column) {
        Ok(column) => Some(column.str()?),
        Err(_) => {
            debug!("No {} column in upload", config.identifier_column);
            None
        }
    };

    let mut report = ScanReport::default();
    for (i, text) in notations.into_iter().enumerate() {
        report.rows_scanned += 1;
        let Some(Ok(extraction)) = text.map(|t| try_extract(t, config.wrapping)) else {
            report.rows_without_features += 1;
            continue;
        };

        let probability = model.predict_proba(&extraction.features);
        if !is_pathogenic(probability, threshold) {
            report.rows_at_or_below_threshold += 1;
            continue;
        }

        let gene = identifiers
            .and_then(|ids| ids.get(i))
            .unwrap_or(UNKNOWN_IDENTIFIER)
            .to_string();
        report.results.push(ScanResult {
            mutation: extraction.notation.to_string(),
            probability,
            deltas: extraction.features.deltas(),
            position: extraction.features.position,
            gene,
        });
    }

    info!(
        "Scanned {} rows: {} pathogenic, {} at or below {}, {} without a usable substitution",
        report.rows_scanned,
        report.results.len(),
        report.rows_at_or_below_threshold,
        threshold,
        report.rows_without_features
    );
    Ok(report)
}

/// Score of a single notation, whatever side of the threshold it falls on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    pub mutation: String,
    pub deltas: Deltas,
    pub position: u32,
    pub probability: f64,
    pub pathogenic: bool,
}

pub fn explain<M: PathogenicityModel + ?Sized>(
    text: &str,
    model: &M,
    wrapping: Wrapping,
    threshold: f64,
) -> Option<Explanation> {
    let extraction = try_extract(text, wrapping).ok()?;
    let probability = model.predict_proba(&extraction.features);
    Some(Explanation {
        mutation: extraction.notation.to_string(),
        deltas: extraction.features.deltas(),
        position: extraction.features.position,
        probability,
        pathogenic: is_pathogenic(probability, threshold),
    })
}
