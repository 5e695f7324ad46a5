use std::path::PathBuf;

use polars::prelude::*;
use tracing::{error, info, warn};

use crate::error::Result;
use crate::helper_functions::{read_csv, require_columns};
use crate::models::{Dataset, FeatureVector, LabeledExample, FEATURE_COLUMNS, LABEL_COLUMN};

/// Model-ready table written by the feature pass.
pub struct TrainingTable {
    pub path: PathBuf,
}

impl Dataset for TrainingTable {
    fn load(&self) -> Result<DataFrame> {
        info!("Reading training table from {}", self.path.display());
        let df = match read_csv(&self.path) {
            Ok(df) => df,
            Err(e) => {
                error!("Failed to read training table CSV: {}", e);
                return Err(e.into());
            }
        };
        let mut required = FEATURE_COLUMNS.to_vec();
        required.push(LABEL_COLUMN);
        require_columns(&df, &required, "training table")?;
        Ok(df)
    }
}

/// Convert the feature and label columns into examples.
///
/// Rows with a null in any of the five columns, or a position that is not a
/// positive integer, are skipped rather than partially filled.
pub fn labeled_examples(df: &DataFrame) -> Result<Vec<LabeledExample>> {
    let mut required = FEATURE_COLUMNS.to_vec();
    required.push(LABEL_COLUMN);
    require_columns(df, &required, "training table")?;

    let [hydro_col, weight_col, charge_col, position_col] = FEATURE_COLUMNS;
    let hydro = df.column(hydro_col)?.cast(&DataType::Float64)?;
    let weight = df.column(weight_col)?.cast(&DataType::Float64)?;
    let charge = df.column(charge_col)?.cast(&DataType::Float64)?;
    let position = df.column(position_col)?.cast(&DataType::Float64)?;
    let label = df.column(LABEL_COLUMN)?.cast(&DataType::Int64)?;

    let (hydro, weight, charge, position, label) =
        (hydro.f64()?, weight.f64()?, charge.f64()?, position.f64()?, label.i64()?);

    let mut examples = Vec::with_capacity(df.height());
    let mut skipped = 0usize;
    for i in 0..df.height() {
        let row = (hydro.get(i), weight.get(i), charge.get(i), position.get(i), label.get(i));
        let (Some(h), Some(w), Some(c), Some(p), Some(l)) = row else {
            skipped += 1;
            continue;
        };
        if p < 1.0 || p.fract() != 0.0 || p > f64::from(u32::MAX) {
            skipped += 1;
            continue;
        }
        examples.push(LabeledExample {
            features: FeatureVector {
                hydro_delta: h,
                weight_delta: w,
                charge_delta: c,
                position: p as u32,
            },
            label: l != 0,
        });
    }

    if skipped > 0 {
        warn!("Skipped {} incomplete training rows", skipped);
    }
    Ok(examples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    #[test]
    fn complete_rows_become_examples() {
        let df = df![
            "Hydro_Delta" => &[Some(1.3), Some(-0.5), None],
            "Weight_Delta" => &[Some(-19.0), Some(3.0), Some(1.0)],
            "Charge_Delta" => &[Some(0.0), Some(-1.0), Some(0.0)],
            "Position" => &[Some(175i64), Some(12), Some(3)],
            "Label" => &[Some(1i64), Some(0), Some(1)]
        ]
        .unwrap();

        let examples = labeled_examples(&df).unwrap();
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0].features.position, 175);
        assert!(examples[0].label);
        assert_eq!(examples[1].features.charge_delta, -1.0);
        assert!(!examples[1].label);
    }

    #[test]
    fn non_positive_positions_are_skipped() {
        let df = df![
            "Hydro_Delta" => &[0.1, 0.2],
            "Weight_Delta" => &[1.0, 2.0],
            "Charge_Delta" => &[0.0, 0.0],
            "Position" => &[0i64, 4],
            "Label" => &[0i64, 1]
        ]
        .unwrap();
        let examples = labeled_examples(&df).unwrap();
        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0].features.position, 4);
    }

    #[test]
    fn missing_label_column_is_a_schema_error() {
        let df = df![
            "Hydro_Delta" => &[0.1],
            "Weight_Delta" => &[1.0],
            "Charge_Delta" => &[0.0],
            "Position" => &[4i64]
        ]
        .unwrap();
        assert!(labeled_examples(&df).is_err());
    }
}
