// ============================================================
// Layer 1 - CLI Commands and Arguments
// ============================================================
// Two subcommands, `train` and `predict`, sharing the flags that
// say where configuration, data and artifacts live. Everything
// about the model itself comes from config.toml, not from flags.

use std::path::PathBuf;

use clap::{Args, Subcommand};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fit the pipeline on the training file and store it under the current version
    Train(TrainArgs),

    /// Score a CSV file with the stored pipeline for the current version
    Predict(PredictArgs),
}

/// Locations shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct PathArgs {
    /// TOML file with the [app] and [model] tables
    #[arg(long, default_value = "config.toml")]
    pub config: PathBuf,

    /// File holding the package version artifacts are stored under
    #[arg(long, default_value = "VERSION")]
    pub version_file: PathBuf,

    /// Directory dataset file names are resolved against
    #[arg(long, default_value = "datasets")]
    pub data_dir: PathBuf,

    /// Directory fitted pipelines are written to
    #[arg(long, default_value = "trained_models")]
    pub model_dir: PathBuf,
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    #[command(flatten)]
    pub paths: PathArgs,
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    #[command(flatten)]
    pub paths: PathArgs,

    /// File to score, relative to --data-dir (defaults to test_data_file)
    #[arg(long)]
    pub input: Option<String>,
}
