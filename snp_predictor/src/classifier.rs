use std::path::Path;

use linfa::DatasetBase;
use log::{info, warn};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::analysis::roc::roc_auc;
use crate::analysis::ClassificationReport;
use crate::config::{PipelineConfig, TrainingConfig};
use crate::data_handling::training_table::{labeled_examples, TrainingTable};
use crate::error::{PredictorError, Result};
use crate::gbdt::{BoostingParams, GradientBoostedTrees};
use crate::models::{Dataset, FeatureVector, LabeledExample, FEATURE_COLUMNS};

/// Anything that scores a feature vector with a pathogenicity probability.
pub trait PathogenicityModel {
    fn predict_proba(&self, features: &FeatureVector) -> f64;
}

/// Strictly above: a probability equal to the threshold is benign.
pub fn is_pathogenic(probability: f64, threshold: f64) -> bool {
    probability > threshold
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Persisted classifier: the ensemble plus the feature layout it expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    feature_names: Vec<String>,
    /// Threshold the held-out report was computed with
    threshold: f64,
    ensemble: GradientBoostedTrees,
}

impl TrainedModel {
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn feature_importance(&self) -> Vec<FeatureImportance> {
        self.feature_names
            .iter()
            .zip(self.ensemble.feature_importance())
            .map(|(name, importance)| FeatureImportance { feature: name.clone(), importance })
            .collect()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!("Saved model ({} trees) to {}", self.ensemble.n_trees(), path.display());
        Ok(())
    }

    /// Load an artifact written by [`TrainedModel::save`].
    ///
    /// Fails with `ArtifactLoad` when the file is missing or unreadable, or
    /// when it was trained on a different feature layout.
    pub fn load(path: &Path) -> Result<Self> {
        let artifact_error = |reason: String| PredictorError::ArtifactLoad { path: path.to_path_buf(), reason };

        let json = std::fs::read_to_string(path).map_err(|e| artifact_error(e.to_string()))?;
        let model: TrainedModel =
            serde_json::from_str(&json).map_err(|e| artifact_error(format!("not a model artifact: {}", e)))?;

        if model.feature_names.iter().map(String::as_str).ne(FEATURE_COLUMNS) {
            return Err(artifact_error(format!(
                "trained on features {:?}, expected {:?}",
                model.feature_names, FEATURE_COLUMNS
            )));
        }
        if model.ensemble.n_features() != FEATURE_COLUMNS.len() || !model.ensemble.is_well_formed() {
            return Err(artifact_error("ensemble is inconsistent with its feature layout".to_string()));
        }

        info!("Loaded model from {}", path.display());
        Ok(model)
    }
}

impl PathogenicityModel for TrainedModel {
    fn predict_proba(&self, features: &FeatureVector) -> f64 {
        self.ensemble.predict_proba(&features.to_array())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingSummary {
    pub n_train: usize,
    pub n_test: usize,
    pub threshold: f64,
    pub report: ClassificationReport,
    pub feature_importance: Vec<FeatureImportance>,
}

impl TrainingSummary {
    pub fn save_json(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!("Evaluation report written to {}", path.display());
        Ok(())
    }
}

fn boosting_params(config: &TrainingConfig) -> BoostingParams {
    BoostingParams {
        n_estimators: config.n_estimators,
        learning_rate: config.learning_rate,
        max_depth: config.max_depth,
        min_samples_leaf: config.min_samples_leaf,
    }
}

/// Score `records` and compare the thresholded calls against `targets`.
pub fn evaluate(
    model: &TrainedModel,
    records: ArrayView2<f64>,
    targets: ArrayView1<bool>,
    threshold: f64,
) -> ClassificationReport {
    let probabilities: Vec<f64> = records
        .rows()
        .into_iter()
        .map(|row| model.ensemble.predict_proba(&row.to_vec()))
        .collect();
    let predicted: Vec<bool> = probabilities.iter().map(|&p| is_pathogenic(p, threshold)).collect();
    let actual = targets.to_vec();

    ClassificationReport::new(&actual, &predicted, roc_auc(&actual, &probabilities))
}

fn unsplittable(n: usize, test_fraction: f64) -> PredictorError {
    PredictorError::InvalidInput(format!(
        "{} labelled examples cannot be split with test_fraction {}",
        n, test_fraction
    ))
}

/// Seeded shuffle, hold out `test_fraction` of the rows, fit on the rest and
/// evaluate on the held-out part.
///
/// The training side gets `ceil(n * (1 - test_fraction))` rows.
pub fn train(
    examples: &[LabeledExample],
    config: &TrainingConfig,
    threshold: f64,
) -> Result<(TrainedModel, TrainingSummary)> {
    let n = examples.len();
    if n < 2 || !(config.test_fraction > 0.0 && config.test_fraction < 1.0) {
        return Err(unsplittable(n, config.test_fraction));
    }

    let mut x = Array2::<f64>::zeros((n, FEATURE_COLUMNS.len()));
    for (i, example) in examples.iter().enumerate() {
        for (j, value) in example.features.to_array().into_iter().enumerate() {
            x[[i, j]] = value;
        }
    }
    let y: Array1<bool> = examples.iter().map(|e| e.label).collect();

    let mut rng = StdRng::seed_from_u64(config.seed);
    let shuffled = DatasetBase::new(x, y).shuffle(&mut rng);
    let (ds_train, ds_test) = shuffled.split_with_ratio(1.0 - config.test_fraction as f32);
    let (n_train, n_test) = (ds_train.targets.len(), ds_test.targets.len());
    if n_train == 0 || n_test == 0 {
        return Err(unsplittable(n, config.test_fraction));
    }

    let positives = ds_train.targets.iter().filter(|&&l| l).count();
    if positives == 0 || positives == ds_train.targets.len() {
        warn!("Training split contains a single class; the model will predict it everywhere");
    }

    let ensemble =
        GradientBoostedTrees::fit(ds_train.records.view(), ds_train.targets.view(), &boosting_params(config))?;
    let model = TrainedModel {
        feature_names: FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect(),
        threshold,
        ensemble,
    };

    let report = evaluate(&model, ds_test.records.view(), ds_test.targets.view(), threshold);
    info!("Held-out evaluation on {} variants:\n{}", n_test, report);

    let summary = TrainingSummary {
        n_train,
        n_test,
        threshold,
        report,
        feature_importance: model.feature_importance(),
    };
    for fi in &summary.feature_importance {
        info!("{:<15} importance = {:>8.4}", fi.feature, fi.importance);
    }
    Ok((model, summary))
}

/// Training table CSV in, model artifact out.
pub fn train_from_table(input: &Path, model_path: &Path, config: &PipelineConfig) -> Result<TrainingSummary> {
    let df = TrainingTable { path: input.to_path_buf() }.load()?;
    let examples = labeled_examples(&df)?;
    if examples.is_empty() {
        return Err(PredictorError::InvalidInput(format!(
            "no usable training rows in {}",
            input.display()
        )));
    }

    let (model, summary) = train(&examples, &config.training, config.threshold)?;
    model.save(model_path)?;
    Ok(summary)
}
