//! Reference physicochemical properties of the 20 standard amino acids.
//!
//! Kyte-Doolittle hydropathy, average residue mass in Daltons and formal
//! side-chain charge at physiological pH. Training and serving read the same
//! table, any edit here changes what every feature means.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AminoAcidProperties {
    pub code: &'static str,
    pub hydropathy: f64,
    pub weight: f64,
    pub charge: i8,
}

const fn aa(code: &'static str, hydropathy: f64, weight: f64, charge: i8) -> AminoAcidProperties {
    AminoAcidProperties { code, hydropathy, weight, charge }
}

pub const AMINO_ACIDS: [AminoAcidProperties; 20] = [
    aa("Ala", 1.8, 89.1, 0),
    aa("Arg", -4.5, 174.2, 1),
    aa("Asn", -3.5, 132.1, 0),
    aa("Asp", -3.5, 133.1, -1),
    aa("Cys", 2.5, 121.2, 0),
    aa("Gln", -3.5, 146.1, 0),
    aa("Glu", -3.5, 147.1, -1),
    aa("Gly", -0.4, 75.1, 0),
    aa("His", -3.2, 155.2, 1),
    aa("Ile", 4.5, 131.2, 0),
    aa("Leu", 3.8, 131.2, 0),
    aa("Lys", -3.9, 146.2, 1),
    aa("Met", 1.9, 149.2, 0),
    aa("Phe", 2.8, 165.2, 0),
    aa("Pro", -1.6, 115.1, 0),
    aa("Ser", -0.8, 105.1, 0),
    aa("Thr", -0.7, 119.1, 0),
    aa("Trp", -0.9, 204.2, 0),
    aa("Tyr", -1.3, 181.2, 0),
    aa("Val", 4.2, 117.1, 0),
];

/// Look up a three-letter residue code (case-sensitive, e.g. "Arg").
pub fn lookup(code: &str) -> Option<&'static AminoAcidProperties> {
    AMINO_ACIDS.iter().find(|props| props.code == code)
}
