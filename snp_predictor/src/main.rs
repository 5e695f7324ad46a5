use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use snp_predictor::classifier::{train_from_table, TrainedModel};
use snp_predictor::config::{write_default_config, PipelineConfig};
use snp_predictor::data_handling::clinvar::clean_variant_summary;
use snp_predictor::data_handling::training_set::build_training_set;
use snp_predictor::helper_functions::{open_read_maybe_gz, read_all};
use snp_predictor::scan::{explain, scan};

/// Missense variant pathogenicity predictor
#[derive(Parser)]
#[command(name = "snp_predictor")]
#[command(about = "Build training data from ClinVar, train a boosted-tree classifier and scan variant files", long_about = None)]
struct Cli {
    /// JSON configuration file (defaults to <project root>/snp_predictor.json when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Filter the raw variant summary down to accepted missense candidates
    Clean {
        #[arg(long, default_value = "variant_summary.txt.gz")]
        input: PathBuf,
        #[arg(long, default_value = "filtered_mutations.csv")]
        output: PathBuf,
    },
    /// Add physicochemical delta features and labels to the cleaned table
    Features {
        #[arg(long, default_value = "filtered_mutations.csv")]
        input: PathBuf,
        #[arg(long, default_value = "training_ready.csv")]
        output: PathBuf,
    },
    /// Fit the classifier and report held-out performance
    Train {
        #[arg(long, default_value = "training_ready.csv")]
        input: PathBuf,
        #[arg(long, default_value = "snp_model.json")]
        model: PathBuf,
        /// Also write the evaluation report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Score a tab-separated variant file and print the pathogenic calls as JSON
    Scan {
        #[arg(long, default_value = "snp_model.json")]
        model: PathBuf,
        #[arg(long)]
        vcf: PathBuf,
    },
    /// Show deltas and probability for a single notation such as p.Arg175His
    Explain {
        #[arg(long, default_value = "snp_model.json")]
        model: PathBuf,
        mutation: String,
    },
    /// Write the default configuration file
    InitConfig {
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let load_config = || PipelineConfig::discover(cli.config.as_deref()).context("failed to load configuration");

    match &cli.command {
        Command::InitConfig { path } => {
            let written = write_default_config(path.as_deref()).context("failed to write default configuration")?;
            info!("Default configuration written to {}", written.display());
        }
        Command::Clean { input, output } => {
            let config = load_config()?;
            info!("Cleaning {}", input.display());
            let report = clean_variant_summary(input, output, &config.cleaning)
                .with_context(|| format!("cleaning pass over {} failed", input.display()))?;
            info!("{}", serde_json::to_string(&report)?);
        }
        Command::Features { input, output } => {
            let config = load_config()?;
            let report = build_training_set(
                input,
                output,
                &config.cleaning.canonical_change_column,
                config.features.wrapping,
            )
            .with_context(|| format!("feature pass over {} failed", input.display()))?;
            info!("{}", serde_json::to_string(&report)?);
        }
        Command::Train { input, model, report } => {
            let config = load_config()?;
            let summary = train_from_table(input, model, &config)
                .with_context(|| format!("training on {} failed", input.display()))?;
            info!(
                "Accuracy {:.3}, ROC AUC {:.3} on {} held-out variants",
                summary.report.accuracy, summary.report.roc_auc, summary.n_test
            );
            if let Some(path) = report {
                summary.save_json(path)?;
            }
        }
        Command::Scan { model, vcf } => {
            let config = load_config()?;
            let model = load_model(model, config.threshold)?;
            let content = read_all(open_read_maybe_gz(vcf)?)
                .with_context(|| format!("failed to read {}", vcf.display()))?;
            let report = scan(&content, &model, &config.scan, config.threshold)?;
            println!("{}", serde_json::to_string_pretty(&report.into_response())?);
        }
        Command::Explain { model, mutation } => {
            let config = load_config()?;
            let model = load_model(model, config.threshold)?;
            match explain(mutation, &model, config.scan.wrapping, config.threshold) {
                Some(explanation) => println!("{}", serde_json::to_string_pretty(&explanation)?),
                None => bail!("no scorable substitution in {:?}", mutation),
            }
        }
    }

    Ok(())
}

fn load_model(path: &Path, threshold: f64) -> anyhow::Result<TrainedModel> {
    let model = TrainedModel::load(path)?;
    if model.threshold() != threshold {
        warn!(
            "Model was evaluated at threshold {}, scanning with configured threshold {}",
            model.threshold(),
            threshold
        );
    }
    Ok(model)
}
