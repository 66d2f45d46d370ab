use ai_query_server::{config, logging, server};
use anyhow::Result;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (before logging setup)
    let config = match config::load().await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let log_level = match logging::init(&config.server.logs.level) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    info!("Starting AI query server with log level: {}", log_level);
    info!(
        model_dir = %config.model.directory.display(),
        max_length = config.generation.max_length,
        "Configuration loaded successfully"
    );

    // Returns an error before binding if the model cannot be loaded.
    server::run(config).await?;

    Ok(())
}
