// src/data_handling/clinvar.rs
// -----------------------------------------------------------------------------
// Cleaning pass over the ClinVar `variant_summary.txt.gz` dump.
// The dump is far larger than memory, so it is streamed in fixed-size row
// chunks; each surviving chunk is appended to the output CSV and flushed, which
// makes a chunk boundary the unit of durability.
// -----------------------------------------------------------------------------

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use csv::StringRecord;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::CleaningConfig;
use crate::error::{PredictorError, Result};
use crate::helper_functions::open_read_maybe_gz;

pub const ALLELE_ID_COLUMN: &str = "#AlleleID";
pub const TYPE_COLUMN: &str = "Type";
pub const GENE_SYMBOL_COLUMN: &str = "GeneSymbol";
pub const SIGNIFICANCE_COLUMN: &str = "ClinicalSignificance";
pub const RS_ID_COLUMN: &str = "RS# (dbSNP)";
pub const ASSEMBLY_COLUMN: &str = "Assembly";

const SOURCE_NAME: &str = "variant summary";

/// Positions of the retained columns in the raw header.
struct ColumnIndex {
    allele_id: usize,
    variant_type: usize,
    change: usize,
    gene_symbol: usize,
    significance: usize,
    rs_id: usize,
    assembly: usize,
}

impl ColumnIndex {
    fn from_header(header: &StringRecord, change_column: &str) -> Result<Self> {
        let find = |name: &str| {
            header
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| PredictorError::schema(name, SOURCE_NAME))
        };
        Ok(ColumnIndex {
            allele_id: find(ALLELE_ID_COLUMN)?,
            variant_type: find(TYPE_COLUMN)?,
            change: find(change_column)?,
            gene_symbol: find(GENE_SYMBOL_COLUMN)?,
            significance: find(SIGNIFICANCE_COLUMN)?,
            rs_id: find(RS_ID_COLUMN)?,
            assembly: find(ASSEMBLY_COLUMN)?,
        })
    }

    /// Output column order.
    fn project<'r>(&self, record: &'r StringRecord) -> [&'r str; 7] {
        let field = |i: usize| record.get(i).unwrap_or("");
        [
            field(self.allele_id),
            field(self.variant_type),
            field(self.change),
            field(self.gene_symbol),
            field(self.significance),
            field(self.rs_id),
            field(self.assembly),
        ]
    }
}

/// Row counts of one cleaning run; rows are attributed to the first filter they fail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleaningReport {
    pub chunks: usize,
    pub rows_read: usize,
    pub rows_kept: usize,
    pub wrong_assembly: usize,
    pub wrong_type: usize,
    pub unaccepted_significance: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowVerdict {
    Keep,
    WrongAssembly,
    WrongType,
    UnacceptedSignificance,
}

fn judge(fields: &[&str; 7], config: &CleaningConfig) -> RowVerdict {
    let [_, variant_type, _, _, significance, _, assembly] = *fields;
    if assembly != config.assembly {
        RowVerdict::WrongAssembly
    } else if variant_type != config.variant_type {
        RowVerdict::WrongType
    } else if !config.accepted_significance.iter().any(|s| s == significance) {
        RowVerdict::UnacceptedSignificance
    } else {
        RowVerdict::Keep
    }
}

/// Stream `input` (gzip or plain TSV) into a filtered CSV at `output`.
///
/// The output is truncated first, so re-running on the same input gives a
/// byte-identical file.
pub fn clean_variant_summary(input: &Path, output: &Path, config: &CleaningConfig) -> Result<CleaningReport> {
    if config.chunk_size == 0 {
        return Err(PredictorError::InvalidInput("chunk_size must be > 0".to_string()));
    }
    info!("Reading variant summary from {}", input.display());

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .from_reader(open_read_maybe_gz(input)?);

    let columns = ColumnIndex::from_header(reader.headers()?, &config.change_column)?;

    let mut writer = csv::Writer::from_writer(BufWriter::new(File::create(output)?));
    writer.write_record([
        ALLELE_ID_COLUMN,
        TYPE_COLUMN,
        config.canonical_change_column.as_str(),
        GENE_SYMBOL_COLUMN,
        SIGNIFICANCE_COLUMN,
        RS_ID_COLUMN,
        ASSEMBLY_COLUMN,
    ])?;
    writer.flush()?;

    let mut report = CleaningReport::default();
    let mut records = reader.into_records();

    loop {
        let chunk: Vec<StringRecord> = records
            .by_ref()
            .take(config.chunk_size)
            .collect::<std::result::Result<_, _>>()?;
        if chunk.is_empty() {
            break;
        }

        let mut kept_in_chunk = 0usize;
        for record in &chunk {
            let fields = columns.project(record);
            match judge(&fields, config) {
                RowVerdict::Keep => {
                    writer.write_record(fields)?;
                    kept_in_chunk += 1;
                }
                RowVerdict::WrongAssembly => report.wrong_assembly += 1,
                RowVerdict::WrongType => report.wrong_type += 1,
                RowVerdict::UnacceptedSignificance => report.unaccepted_significance += 1,
            }
        }
        writer.flush()?;

        report.chunks += 1;
        report.rows_read += chunk.len();
        report.rows_kept += kept_in_chunk;
        info!(
            "Processed chunk {}: kept {} of {} rows ({} saved so far)",
            report.chunks,
            kept_in_chunk,
            chunk.len(),
            report.rows_kept
        );
    }

    writer.into_inner().map_err(|e| e.into_error())?.flush()?;

    debug!("Cleaning report: {:?}", report);
    info!("Done! Cleaned data saved to {}", output.display());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;

    const HEADER: &str = "#AlleleID\tType\tName\tGeneID\tGeneSymbol\tClinicalSignificance\tRS# (dbSNP)\tAssembly";

    fn summary_rows() -> Vec<&'static str> {
        vec![
            "1\tsingle nucleotide variant\tNM_000546.6(TP53):c.524G>A (p.Arg175His)\t7157\tTP53\tPathogenic\t28934578\tGRCh38",
            "1\tsingle nucleotide variant\tNM_000546.6(TP53):c.524G>A (p.Arg175His)\t7157\tTP53\tPathogenic\t28934578\tGRCh37",
            "2\tDeletion\tNM_007294.4(BRCA1):c.68_69del (p.Glu23fs)\t672\tBRCA1\tPathogenic\t80357914\tGRCh38",
            "3\tsingle nucleotide variant\tNM_000059.4(BRCA2):c.1289A>G (p.Asn430Ser)\t675\tBRCA2\tLikely benign\t144848\tGRCh38",
            "4\tsingle nucleotide variant\tNM_000410.4(HFE):c.845G>A (p.Cys282Tyr)\t3077\tHFE\tConflicting interpretations of pathogenicity\t1800562\tGRCh38",
            "5\tsingle nucleotide variant\tNM_000527.5(LDLR):c.1A>G (p.Met1Val)\t3949\tLDLR\tLikely pathogenic\t-1\tGRCh38",
            "6\tsingle nucleotide variant\tNM_000546.6(TP53):c.743G>A (p.Arg248Gln)\t7157\tTP53\tBenign\t11540652\tGRCh38",
        ]
    }

    fn write_gz(path: &Path, lines: &[&str]) {
        let mut enc = GzEncoder::new(File::create(path).unwrap(), Compression::default());
        writeln!(enc, "{HEADER}").unwrap();
        for line in lines {
            writeln!(enc, "{line}").unwrap();
        }
        enc.finish().unwrap();
    }

    fn small_chunks() -> CleaningConfig {
        CleaningConfig { chunk_size: 2, ..CleaningConfig::default() }
    }

    #[test]
    fn keeps_only_grch38_snvs_with_clear_labels() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("variant_summary.txt.gz");
        let output = dir.path().join("filtered.csv");
        write_gz(&input, &summary_rows());

        let report = clean_variant_summary(&input, &output, &small_chunks()).unwrap();

        assert_eq!(report.chunks, 4);
        assert_eq!(report.rows_read, 7);
        assert_eq!(report.rows_kept, 4);
        assert_eq!(report.wrong_assembly, 1);
        assert_eq!(report.wrong_type, 1);
        assert_eq!(report.unaccepted_significance, 1);

        let written = std::fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(
            lines[0],
            "#AlleleID,Type,ProteinChange,GeneSymbol,ClinicalSignificance,RS# (dbSNP),Assembly"
        );
        assert_eq!(lines.len(), 5, "header appears once, followed by kept rows");
        assert!(lines[1].starts_with("1,single nucleotide variant,NM_000546.6(TP53):c.524G>A (p.Arg175His),TP53,Pathogenic"));
        assert!(lines[2].starts_with("3,"));
        assert!(lines[3].starts_with("5,"));
        assert!(lines[4].starts_with("6,"));
    }

    #[test]
    fn rerun_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("variant_summary.txt.gz");
        let output = dir.path().join("filtered.csv");
        write_gz(&input, &summary_rows());

        clean_variant_summary(&input, &output, &small_chunks()).unwrap();
        let first = std::fs::read(&output).unwrap();
        clean_variant_summary(&input, &output, &small_chunks()).unwrap();
        let second = std::fs::read(&output).unwrap();
        assert_eq!(first, second);

        let one_chunk = CleaningConfig { chunk_size: 1000, ..CleaningConfig::default() };
        clean_variant_summary(&input, &output, &one_chunk).unwrap();
        assert_eq!(std::fs::read(&output).unwrap(), first);
    }

    #[test]
    fn plain_text_input_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("variant_summary.txt");
        let output = dir.path().join("filtered.csv");
        let mut body = format!("{HEADER}\n");
        for line in summary_rows() {
            body.push_str(line);
            body.push('\n');
        }
        std::fs::write(&input, body).unwrap();

        let report = clean_variant_summary(&input, &output, &CleaningConfig::default()).unwrap();
        assert_eq!(report.chunks, 1);
        assert_eq!(report.rows_kept, 4);
    }

    #[test]
    fn missing_column_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.txt");
        std::fs::write(&input, "#AlleleID\tType\tName\n1\tsingle nucleotide variant\tx\n").unwrap();
        let err = clean_variant_summary(&input, &dir.path().join("out.csv"), &CleaningConfig::default())
            .unwrap_err();
        assert!(matches!(err, PredictorError::Schema { ref column, .. } if column == "GeneSymbol"));
    }

    #[test]
    fn empty_database_still_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("empty.txt.gz");
        let output = dir.path().join("filtered.csv");
        write_gz(&input, &[]);

        let report = clean_variant_summary(&input, &output, &CleaningConfig::default()).unwrap();
        assert_eq!(report, CleaningReport::default());
        assert_eq!(std::fs::read_to_string(&output).unwrap().lines().count(), 1);
    }
}
