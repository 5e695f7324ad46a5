use serde::Serialize;

use crate::amino_acids;
use crate::models::FeatureVector;
use crate::mutation::{self, MutationNotation, Wrapping};

/// Why a row produced no feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No protein-change notation in the text
    NoNotation,
    /// A residue code outside the 20-entry table (e.g. `Ter`)
    UnknownResidue,
}

/// Parsed substitution together with its physicochemical deltas.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub notation: MutationNotation,
    pub features: FeatureVector,
}

pub fn try_extract(text: &str, wrapping: Wrapping) -> Result<Extraction, SkipReason> {
    let notation = mutation::parse(text, wrapping).ok_or(SkipReason::NoNotation)?;

    let (Some(original), Some(new)) = (
        amino_acids::lookup(&notation.original),
        amino_acids::lookup(&notation.new),
    ) else {
        return Err(SkipReason::UnknownResidue);
    };

    let features = FeatureVector {
        hydro_delta: new.hydropathy - original.hydropathy,
        weight_delta: new.weight - original.weight,
        charge_delta: f64::from(new.charge - original.charge),
        position: notation.position,
    };

    Ok(Extraction { notation, features })
}

/// Feature vector for the first substitution in `text`, all-or-nothing.
pub fn extract(text: &str, wrapping: Wrapping) -> Option<FeatureVector> {
    try_extract(text, wrapping).ok().map(|e| e.features)
}

/// Running count of extraction outcomes over a batch of rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionTally {
    pub extracted: usize,
    pub no_notation: usize,
    pub unknown_residue: usize,
}

impl ExtractionTally {
    pub fn record(&mut self, outcome: &Result<Extraction, SkipReason>) {
        match outcome {
            Ok(_) => self.extracted += 1,
            Err(SkipReason::NoNotation) => self.no_notation += 1,
            Err(SkipReason::UnknownResidue) => self.unknown_residue += 1,
        }
    }

    pub fn dropped(&self) -> usize {
        self.no_notation + self.unknown_residue
    }
}
