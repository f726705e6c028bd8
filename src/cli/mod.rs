// ============================================================
// Layer 1 - CLI / Presentation Layer
// ============================================================
// Parses arguments with clap, wires the concrete collaborators
// into the use cases and prints the outcome. Nothing here knows
// how a pipeline is fitted.
//
//   `train`   → TrainUseCase   (CSV source, PricePipeline, ArtifactStore)
//   `predict` → PredictUseCase (CSV source, ArtifactStore)
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use commands::{Commands, PathArgs, PredictArgs, TrainArgs};

use crate::application::config::Config;
use crate::application::predict_use_case::PredictUseCase;
use crate::application::train_use_case::TrainUseCase;
use crate::data::loader::CsvDatasetSource;
use crate::infra::artifact_store::ArtifactStore;
use crate::ml::pipeline::PricePipeline;

#[derive(Parser, Debug)]
#[command(
    name = "regression-model",
    version,
    about = "Train a house sale price regression pipeline and score files with it."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => run_train(args),
            Commands::Predict(args) => run_predict(args),
        }
    }
}

fn load_config(paths: &PathArgs) -> Result<Config> {
    Config::load(&paths.config, &paths.version_file)
        .with_context(|| format!("loading configuration from '{}'", paths.config.display()))
}

fn collaborators(config: &Config, paths: &PathArgs) -> (CsvDatasetSource, ArtifactStore) {
    let source = CsvDatasetSource::new(&paths.data_dir)
        .with_renames(config.app.rename_columns.clone());
    let store = ArtifactStore::new(
        &paths.model_dir,
        &config.app.package_name,
        &config.app.pipeline_save_file,
    );
    (source, store)
}

fn run_train(args: TrainArgs) -> Result<()> {
    let config = load_config(&args.paths)?;
    let (source, store) = collaborators(&config, &args.paths);

    tracing::info!(
        "Training {} v{} on '{}'",
        config.app.package_name,
        config.version,
        config.app.training_data_file
    );

    let use_case = TrainUseCase::new(config, source, store, |c: &Config| {
        PricePipeline::new(c.model.pipeline_settings())
    });
    let stored = use_case.execute().context("training run failed")?;

    println!("Training complete. Pipeline saved to {}", stored.display());
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    let config = load_config(&args.paths)?;
    let (source, store) = collaborators(&config, &args.paths);
    let input = args
        .input
        .unwrap_or_else(|| config.app.test_data_file.clone());

    let use_case = PredictUseCase::new(config, source, store);
    let prices = use_case
        .predict(&input)
        .with_context(|| format!("scoring '{input}'"))?;

    println!("row,predicted_price");
    for (row, price) in prices.iter().enumerate() {
        println!("{row},{price:.2}");
    }
    Ok(())
}
