use std::fs::File;
use std::io::Write;
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;

use snp_predictor::classifier::{train_from_table, PathogenicityModel, TrainedModel};
use snp_predictor::config::{PipelineConfig, TrainingConfig};
use snp_predictor::data_handling::clinvar::clean_variant_summary;
use snp_predictor::data_handling::training_set::build_training_set;
use snp_predictor::features::extract;
use snp_predictor::mutation::Wrapping;
use snp_predictor::scan::scan;

const HEADER: &str = "#AlleleID\tType\tName\tGeneID\tGeneSymbol\tClinicalSignificance\tRS# (dbSNP)\tAssembly";

const SUBSTITUTIONS: [(&str, &str); 5] = [
    ("Arg", "His"),
    ("Gly", "Asp"),
    ("Leu", "Pro"),
    ("Ala", "Val"),
    ("Ser", "Phe"),
];

/// Benign variants sit early in the protein, pathogenic ones late; the
/// substitution mix is identical in both classes so only position separates them.
fn variant_summary_rows() -> Vec<String> {
    let mut rows = Vec::new();
    for i in 0..60usize {
        let pathogenic = i % 2 == 0;
        let (from, to) = SUBSTITUTIONS[(i / 2) % SUBSTITUTIONS.len()];
        let position = if pathogenic { 600 + 10 * i } else { 5 + 4 * i };
        let significance = if pathogenic { "Pathogenic" } else { "Benign" };
        rows.push(format!(
            "{id}\tsingle nucleotide variant\tNM_000001.1(GENE{id}):c.{pos}A>G (p.{from}{pos}{to})\t{id}\tGENE{id}\t{significance}\t{id}\tGRCh38",
            id = i + 1,
            pos = position,
        ));
    }
    // filtered out by the cleaning pass
    rows.push("900\tsingle nucleotide variant\tNM_000001.1(X):c.1A>G (p.Arg5His)\t1\tX\tPathogenic\t1\tGRCh37".into());
    rows.push("901\tDeletion\tNM_000001.1(X):c.1del (p.Arg5fs)\t1\tX\tBenign\t1\tGRCh38".into());
    rows.push("902\tsingle nucleotide variant\tNM_000001.1(X):c.1A>G (p.Arg5His)\t1\tX\tUncertain significance\t1\tGRCh38".into());
    // kept by cleaning, dropped by the feature pass
    rows.push("903\tsingle nucleotide variant\tNC_000001.11:g.100A>G\t1\tX\tBenign\t1\tGRCh38".into());
    rows.push("904\tsingle nucleotide variant\tNM_000001.1(X):c.1A>T (p.Lys10Ter)\t1\tX\tPathogenic\t1\tGRCh38".into());
    rows
}

fn write_gz(path: &Path, rows: &[String]) {
    let mut enc = GzEncoder::new(File::create(path).unwrap(), Compression::default());
    writeln!(enc, "{HEADER}").unwrap();
    for row in rows {
        writeln!(enc, "{row}").unwrap();
    }
    enc.finish().unwrap();
}

#[test]
fn clean_features_train_load_scan() {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("variant_summary.txt.gz");
    let filtered = dir.path().join("filtered_mutations.csv");
    let training = dir.path().join("training_ready.csv");
    let model_path = dir.path().join("snp_model.json");
    write_gz(&raw, &variant_summary_rows());

    let config = PipelineConfig {
        training: TrainingConfig { n_estimators: 30, max_depth: 3, ..TrainingConfig::default() },
        ..PipelineConfig::default()
    };
    let mut cleaning = config.cleaning.clone();
    cleaning.chunk_size = 16;

    let cleaned = clean_variant_summary(&raw, &filtered, &cleaning).unwrap();
    assert_eq!(cleaned.rows_read, 65);
    assert_eq!(cleaned.rows_kept, 62);
    assert_eq!(cleaned.chunks, 5);

    let features = build_training_set(
        &filtered,
        &training,
        &config.cleaning.canonical_change_column,
        config.features.wrapping,
    )
    .unwrap();
    assert_eq!(features.rows_in, 62);
    assert_eq!(features.rows_kept, 60);
    assert_eq!(features.extraction.no_notation, 1);
    assert_eq!(features.extraction.unknown_residue, 1);
    assert_eq!(features.pathogenic, 30);
    assert_eq!(features.benign, 30);

    let summary = train_from_table(&training, &model_path, &config).unwrap();
    assert_eq!(summary.n_train + summary.n_test, 60);
    assert!((11..=12).contains(&summary.n_test));
    assert_eq!(summary.report.accuracy, 1.0);

    let model = TrainedModel::load(&model_path).unwrap();
    let late = extract("p.Arg900His", Wrapping::Optional).unwrap();
    let early = extract("p.Arg175His", Wrapping::Optional).unwrap();
    assert!(model.predict_proba(&late) > 0.5);
    assert!(model.predict_proba(&early) < 0.5);

    let vcf = "##fileformat=VCFv4.2\n\
               #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
               17\t100\tEARLY\tG\tA\t.\tPASS\tp.Arg175His\n\
               17\t200\tLATE\tG\tA\t.\tPASS\tp.Arg900His\n\
               17\t300\tNONE\tG\tA\t.\tPASS\tintergenic\n";
    let report = scan(vcf.as_bytes(), &model, &config.scan, config.threshold).unwrap();
    assert_eq!(report.rows_scanned, 3);
    assert_eq!(report.rows_without_features, 1);
    assert_eq!(report.rows_at_or_below_threshold, 1);

    let response = report.into_response();
    assert_eq!(response.count, 1);
    assert_eq!(response.results[0].gene, "LATE");
    assert_eq!(response.results[0].mutation, "p.Arg900His");
    assert_eq!(response.results[0].position, 900);
}

#[test]
fn cleaning_twice_gives_identical_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("variant_summary.txt.gz");
    let first = dir.path().join("first.csv");
    write_gz(&raw, &variant_summary_rows());

    let cleaning = PipelineConfig::default().cleaning;
    clean_variant_summary(&raw, &first, &cleaning).unwrap();
    let before = std::fs::read(&first).unwrap();
    clean_variant_summary(&raw, &first, &cleaning).unwrap();
    assert_eq!(before, std::fs::read(&first).unwrap());
}
