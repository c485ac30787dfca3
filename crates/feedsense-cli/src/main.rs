mod classify;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use feedsense_sentiment::ModelBundle;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "feedsense-cli")]
#[command(about = "Classify customer feedback sentiment from the command line")]
struct Cli {
    /// Path to the classifier artifact (overrides `FEEDSENSE_MODEL_PATH`)
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    /// Path to the vectorizer artifact (overrides `FEEDSENSE_VECTORIZER_PATH`)
    #[arg(long, global = true)]
    vectorizer: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Predict the sentiment of a single piece of feedback
    Predict {
        /// Feedback text to classify
        text: String,
    },
    /// Classify every row of a CSV file with a `feedback` column
    Batch {
        /// CSV file to read
        #[arg(long)]
        input: PathBuf,

        /// Where to write the annotated CSV (stdout when omitted)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Show metadata about the loaded model artifacts
    Inspect,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let config = feedsense_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    // Reject blank input before paying for the model load.
    if let Commands::Predict { text } = &cli.command {
        classify::validate_text(text)?;
    }

    let model_path = cli.model.unwrap_or(config.model_path);
    let vectorizer_path = cli.vectorizer.unwrap_or(config.vectorizer_path);
    let bundle = ModelBundle::load(&model_path, &vectorizer_path)
        .context("failed to load the model or vectorizer")?;

    match cli.command {
        Commands::Predict { text } => {
            println!("{}", classify::predict_line(&bundle, &text)?);
        }
        Commands::Batch { input, output } => {
            classify::run_batch(&bundle, &input, output.as_deref(), config.max_batch_rows)?;
        }
        Commands::Inspect => {
            println!("{}", serde_json::to_string_pretty(bundle.info())?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests;
