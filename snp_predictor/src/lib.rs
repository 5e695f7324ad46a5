//! Missense variant pathogenicity prediction.
//!
//! Batch side: [`data_handling`] cleans a ClinVar variant summary and turns it
//! into a training table, [`classifier`] fits and persists a boosted-tree
//! model. Serving side: [`scan`] scores uploaded variant files with a loaded
//! model.

pub mod amino_acids;
pub mod analysis;
pub mod classifier;
pub mod config;
pub mod data_handling;
pub mod error;
pub mod features;
pub mod gbdt;
pub mod helper_functions;
pub mod models;
pub mod mutation;
pub mod scan;

pub use error::{PredictorError, Result};
