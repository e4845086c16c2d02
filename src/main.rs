//! Diet Predictor - Main Entry Point
//!
//! Trains per-nutrient models or serves predictions from them.

use clap::Parser;
use diet_predictor::cli::{cmd_inspect, cmd_serve, cmd_train, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "diet_predictor=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train { data, model_dir, targets, seed } => {
            cmd_train(data, model_dir, &targets, seed)?;
        }
        Commands::Serve { host, port, model_dir, index_path } => {
            cmd_serve(host, port, model_dir, index_path).await?;
        }
        Commands::Inspect { data } => {
            cmd_inspect(&data)?;
        }
    }

    Ok(())
}
