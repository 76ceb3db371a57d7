use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use tracing::info;

use integrity_signals::IntegrityScorer;
use vdatabase::{ClassifierConfig, IndexBackend, IndexConfig, TrainingCorpus};

use event_mapping::{ConfidenceMapping, EventMapper, FilingForm};
use input::CaseFile;
use output::{print_json, ResultFormatter};
use pipeline::PipelineOrchestrator;

mod event_mapping;
mod input;
mod output;
mod pipeline;

#[derive(Parser, Debug)]
#[command(author, version, about = "Scores insider trades against disclosure timing", long_about = None)]
struct Args {
    /// Index backend (qdrant or memory); overrides INDEX_BACKEND
    #[arg(long, global = true)]
    backend: Option<IndexBackend>,

    /// Sentence encoder config; overrides ENCODER_CONFIG_PATH
    #[arg(long, global = true)]
    encoder_config: Option<PathBuf>,

    /// Training corpus JSON; defaults to the bundled corpus
    #[arg(long, global = true)]
    corpus: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replace the index contents with the training corpus
    RebuildIndex {
        #[arg(long)]
        json: bool,
    },
    /// Classify one disclosure
    Classify(ClassifyArgs),
    /// Classify a case's filings and score every insider trade
    Score {
        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        json: bool,
    },
}

#[derive(ClapArgs, Debug)]
struct ClassifyArgs {
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    text: Option<String>,

    #[arg(long)]
    file: Option<PathBuf>,

    /// Filing form (8-K, 10-Q, 10-K); non-annual text is truncated
    #[arg(long, default_value = "8-K")]
    form: FilingForm,

    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    info!("Starting insider integrity scoring");

    let mut index_config = IndexConfig::from_env_with_backend(args.backend)?;
    if let Some(path) = &args.encoder_config {
        index_config = index_config.with_encoder_config(path.to_string_lossy());
    }
    let classifier_config = ClassifierConfig::from_env()?;
    let mapper = EventMapper::new(ConfidenceMapping::from_env()?);
    let corpus = match &args.corpus {
        Some(path) => TrainingCorpus::from_path(path)?,
        None => TrainingCorpus::bundled()?,
    };

    let orchestrator = PipelineOrchestrator::open(
        index_config,
        classifier_config,
        mapper,
        IntegrityScorer::with_default_config(),
    )
    .await?;

    let outcome = run(&orchestrator, &corpus, args.command).await;
    orchestrator.close();
    outcome
}

async fn run(orchestrator: &PipelineOrchestrator, corpus: &TrainingCorpus, command: Command) -> Result<()> {
    let formatter = ResultFormatter::new();

    match command {
        Command::RebuildIndex { json } => {
            let report = orchestrator.rebuild_index(corpus).await?;
            if json {
                print_json(&report)?;
            } else {
                formatter.display_rebuild(&report);
            }
        }
        Command::Classify(classify) => {
            orchestrator.prepare(corpus).await?;
            let text = match (classify.text, classify.file) {
                (Some(text), _) => text,
                (None, Some(path)) => fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                (None, None) => bail!("Either --text or --file is required"),
            };
            let classification = orchestrator.classify_text(&text, classify.form).await;
            if classify.json {
                print_json(&classification)?;
            } else {
                formatter.display_classification(&classification);
            }
        }
        Command::Score { input, json } => {
            orchestrator.prepare(corpus).await?;
            let case = CaseFile::load(&input)?;
            let report = orchestrator.score_case(&case).await;
            if json {
                print_json(&report)?;
            } else {
                formatter.display_case_report(&report);
            }
        }
    }

    Ok(())
}
