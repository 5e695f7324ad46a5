//! Pipeline configuration.
//!
//! Every field has a default, so a config file only needs to name what it
//! overrides. The decision threshold lives here once and is shared by model
//! evaluation and scanning.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{PredictorError, Result};
use crate::helper_functions::project_root;
use crate::mutation::Wrapping;

pub const CONFIG_FILE_NAME: &str = "snp_predictor.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// A variant is called pathogenic when its probability is strictly above this
    pub threshold: f64,
    pub cleaning: CleaningConfig,
    pub features: FeatureConfig,
    pub training: TrainingConfig,
    pub scan: ScanConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            threshold: 0.5,
            cleaning: CleaningConfig::default(),
            features: FeatureConfig::default(),
            training: TrainingConfig::default(),
            scan: ScanConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Rows read per chunk of the raw database
    pub chunk_size: usize,
    pub assembly: String,
    pub variant_type: String,
    pub accepted_significance: Vec<String>,
    /// Free-text change column of the raw database
    pub change_column: String,
    /// Name the change column is written under
    pub canonical_change_column: String,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        CleaningConfig {
            chunk_size: 100_000,
            assembly: "GRCh38".to_string(),
            variant_type: "single nucleotide variant".to_string(),
            accepted_significance: vec![
                "Pathogenic".to_string(),
                "Benign".to_string(),
                "Likely pathogenic".to_string(),
                "Likely benign".to_string(),
            ],
            change_column: "Name".to_string(),
            canonical_change_column: "ProteinChange".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    pub wrapping: Wrapping,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        FeatureConfig { wrapping: Wrapping::Required }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub test_fraction: f64,
    pub seed: u64,
    pub n_estimators: usize,
    pub max_depth: usize,
    pub learning_rate: f64,
    pub min_samples_leaf: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            test_fraction: 0.2,
            seed: 42,
            n_estimators: 100,
            max_depth: 6,
            learning_rate: 0.1,
            min_samples_leaf: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub notation_column: String,
    pub identifier_column: String,
    pub wrapping: Wrapping,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            notation_column: "INFO".to_string(),
            identifier_column: "ID".to_string(),
            wrapping: Wrapping::Optional,
        }
    }
}

impl PipelineConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Explicit path first, then `<project root>/snp_predictor.json`, then defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        Self::discover_in(explicit, &project_root())
    }

    fn discover_in(explicit: Option<&Path>, root: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            info!("Reading configuration from {}", path.display());
            return Self::from_path(path);
        }
        let candidate = root.join(CONFIG_FILE_NAME);
        if candidate.exists() {
            info!("Reading configuration from {}", candidate.display());
            return Self::from_path(&candidate);
        }
        info!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(invalid(format!("threshold must be in [0, 1], got {}", self.threshold)));
        }
        if self.cleaning.chunk_size == 0 {
            return Err(invalid("cleaning.chunk_size must be > 0".to_string()));
        }
        let t = &self.training;
        if !(t.test_fraction > 0.0 && t.test_fraction < 1.0) {
            return Err(invalid(format!(
                "training.test_fraction must be in (0, 1), got {}",
                t.test_fraction
            )));
        }
        if t.n_estimators == 0 || t.max_depth == 0 {
            return Err(invalid("training.n_estimators and training.max_depth must be > 0".to_string()));
        }
        if t.learning_rate <= 0.0 {
            return Err(invalid(format!("training.learning_rate must be > 0, got {}", t.learning_rate)));
        }
        Ok(())
    }
}

fn invalid(msg: String) -> PredictorError {
    PredictorError::InvalidInput(msg)
}

/// Write the default configuration as pretty JSON, returning the path written.
pub fn write_default_config(path: Option<&Path>) -> Result<PathBuf> {
    write_default_config_in(path, &project_root())
}

fn write_default_config_in(path: Option<&Path>, root: &Path) -> Result<PathBuf> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => root.join(CONFIG_FILE_NAME),
    };
    std::fs::write(&path, serde_json::to_string_pretty(&PipelineConfig::default())?)?;
    Ok(path)
}
