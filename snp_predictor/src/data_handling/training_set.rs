use std::path::{Path, PathBuf};

use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::data_handling::clinvar::SIGNIFICANCE_COLUMN;
use crate::error::Result;
use crate::features::{try_extract, ExtractionTally, SkipReason};
use crate::helper_functions::{dataframe_to_csv, read_csv_as_text, require_columns};
use crate::models::{Dataset, FEATURE_COLUMNS, LABEL_COLUMN};
use crate::mutation::Wrapping;

/// Output of the cleaning pass.
pub struct CleanedVariants {
    pub path: PathBuf,
    pub change_column: String,
}

impl Dataset for CleanedVariants {
    fn load(&self) -> Result<DataFrame> {
        info!("Reading cleaned variants from {}", self.path.display());
        let df = match read_csv_as_text(&self.path) {
            Ok(df) => df,
            Err(e) => {
                error!("Failed to read cleaned variants CSV: {}", e);
                return Err(e.into());
            }
        };
        require_columns(&df, &[self.change_column.as_str(), SIGNIFICANCE_COLUMN], "cleaned variants")?;
        debug!("Loaded {} rows", df.height());
        Ok(df)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrainingSetReport {
    pub rows_in: usize,
    pub rows_kept: usize,
    pub extraction: ExtractionTally,
    pub pathogenic: usize,
    pub benign: usize,
}

/// Binary label from free-text clinical significance.
///
/// Anything mentioning "pathogenic" (any case) is positive; everything else,
/// including missing text, counts as benign.
// TODO: confirm with curators whether unrecognised significance text should be dropped instead of labelled benign
pub fn label_from_significance(significance: Option<&str>) -> bool {
    significance
        .map(|s| s.to_lowercase().contains("pathogenic"))
        .unwrap_or(false)
}

/// Append `Hydro_Delta, Weight_Delta, Charge_Delta, Position, Label` and drop
/// every row whose change text yields no feature vector.
pub fn add_feature_columns(
    df: &DataFrame,
    change_column: &str,
    wrapping: Wrapping,
) -> Result<(DataFrame, TrainingSetReport)> {
    require_columns(df, &[change_column, SIGNIFICANCE_COLUMN], "cleaned variants")?;
    let changes = df.column(change_column)?.str()?;
    let significance = df.column(SIGNIFICANCE_COLUMN)?.str()?;

    let mut report = TrainingSetReport { rows_in: df.height(), ..Default::default() };
    let mut keep = Vec::with_capacity(df.height());
    let mut hydro = Vec::new();
    let mut weight = Vec::new();
    let mut charge = Vec::new();
    let mut position: Vec<i64> = Vec::new();
    let mut label: Vec<i32> = Vec::new();

    for (change, sig) in changes.into_iter().zip(significance.into_iter()) {
        let outcome = match change {
            Some(text) => try_extract(text, wrapping),
            None => Err(SkipReason::NoNotation),
        };
        report.extraction.record(&outcome);

        match outcome {
            Ok(extraction) => {
                let fv = extraction.features;
                keep.push(true);
                hydro.push(fv.hydro_delta);
                weight.push(fv.weight_delta);
                charge.push(fv.charge_delta);
                position.push(i64::from(fv.position));
                if label_from_significance(sig) {
                    report.pathogenic += 1;
                    label.push(1);
                } else {
                    report.benign += 1;
                    label.push(0);
                }
            }
            Err(_) => keep.push(false),
        }
    }

    let mask = Series::new(PlSmallStr::from("keep"), keep);
    let mut out = df.filter(mask.bool()?)?;
    let [hydro_col, weight_col, charge_col, position_col] = FEATURE_COLUMNS;
    out.with_column(Series::new(PlSmallStr::from(hydro_col), hydro))?;
    out.with_column(Series::new(PlSmallStr::from(weight_col), weight))?;
    out.with_column(Series::new(PlSmallStr::from(charge_col), charge))?;
    out.with_column(Series::new(PlSmallStr::from(position_col), position))?;
    out.with_column(Series::new(PlSmallStr::from(LABEL_COLUMN), label))?;

    report.rows_kept = out.height();
    Ok((out, report))
}

/// Feature pass: cleaned variants CSV in, model-ready training table out.
pub fn build_training_set(
    input: &Path,
    output: &Path,
    change_column: &str,
    wrapping: Wrapping,
) -> Result<TrainingSetReport> {
    let cleaned = CleanedVariants {
        path: input.to_path_buf(),
        change_column: change_column.to_string(),
    }
    .load()?;

    info!("Extracting physicochemical delta features from {} rows", cleaned.height());
    let (mut training, report) = add_feature_columns(&cleaned, change_column, wrapping)?;
    info!(
        "Dropped {} rows without a usable substitution ({} no notation, {} unknown residue)",
        report.extraction.dropped(),
        report.extraction.no_notation,
        report.extraction.unknown_residue
    );

    dataframe_to_csv(&mut training, output, true)?;
    info!(
        "Success! {} mutations ready for training ({} pathogenic, {} benign) -> {}",
        report.rows_kept,
        report.pathogenic,
        report.benign,
        output.display()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    fn cleaned_frame() -> DataFrame {
        df![
            "#AlleleID" => &["1", "3", "5", "6", "7"],
            "ProteinChange" => &[
                "NM_000546.6(TP53):c.524G>A (p.Arg175His)",
                "NM_000059.4(BRCA2):c.1289A>G (p.Asn430Ser)",
                "NM_000527.5(LDLR):c.1A>G (p.Met1Val)",
                "NM_000546.6(TP53):c.637C>T (p.Arg213Ter)",
                "NC_000017.11:g.7676154G>C",
            ],
            "ClinicalSignificance" => &["Pathogenic", "Likely benign", "Likely pathogenic", "Pathogenic", "Benign"]
        ]
        .unwrap()
    }

    #[test]
    fn label_matches_substring_case_insensitively() {
        assert!(label_from_significance(Some("Pathogenic")));
        assert!(label_from_significance(Some("Likely pathogenic")));
        assert!(label_from_significance(Some("PATHOGENIC/Likely pathogenic")));
        assert!(!label_from_significance(Some("Benign")));
        assert!(!label_from_significance(Some("Likely benign")));
        assert!(!label_from_significance(Some("Uncertain significance")));
        assert!(!label_from_significance(None));
    }

    #[test]
    fn rows_without_substitution_are_dropped_and_counted() {
        let (out, report) = add_feature_columns(&cleaned_frame(), "ProteinChange", Wrapping::Required).unwrap();

        assert_eq!(report.rows_in, 5);
        assert_eq!(report.rows_kept, 3);
        assert_eq!(report.extraction.unknown_residue, 1);
        assert_eq!(report.extraction.no_notation, 1);
        assert_eq!(report.pathogenic, 2);
        assert_eq!(report.benign, 1);

        let ids: Vec<&str> = out.column("#AlleleID").unwrap().str().unwrap().into_no_null_iter().collect();
        assert_eq!(ids, vec!["1", "3", "5"]);

        let position: Vec<i64> = out.column("Position").unwrap().i64().unwrap().into_no_null_iter().collect();
        assert_eq!(position, vec![175, 430, 1]);
        let labels: Vec<i32> = out.column("Label").unwrap().i32().unwrap().into_no_null_iter().collect();
        assert_eq!(labels, vec![1, 0, 1]);

        let hydro = out.column("Hydro_Delta").unwrap().f64().unwrap().get(0).unwrap();
        assert!((hydro - 1.3).abs() < 1e-9);
    }

    #[test]
    fn training_table_round_trips_through_csv() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("filtered.csv");
        let output = dir.path().join("training_ready.csv");
        dataframe_to_csv(&mut cleaned_frame(), &input, true).unwrap();

        let report = build_training_set(&input, &output, "ProteinChange", Wrapping::Required).unwrap();
        assert_eq!(report.rows_kept, 3);

        let header = std::fs::read_to_string(&output).unwrap().lines().next().unwrap().to_string();
        assert_eq!(
            header,
            "#AlleleID,ProteinChange,ClinicalSignificance,Hydro_Delta,Weight_Delta,Charge_Delta,Position,Label"
        );
    }

    #[test]
    fn missing_change_column_is_fatal() {
        let df = df!["ClinicalSignificance" => &["Benign"]].unwrap();
        assert!(add_feature_columns(&df, "ProteinChange", Wrapping::Required).is_err());
    }
}
