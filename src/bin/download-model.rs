use ai_query_server::{
    config, logging,
    download::{self, DownloadOutcome},
};
use anyhow::Result;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = match config::load().await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    logging::init(&config.server.logs.level)?;

    info!(
        repo = %config.model.repo_id,
        directory = %config.model.directory.display(),
        "Preparing local model directory"
    );

    match download::ensure_model(&config.model).await? {
        DownloadOutcome::AlreadyPresent => {
            println!("Model and tokenizer already exist locally.");
        }
        DownloadOutcome::Downloaded { files } => {
            println!(
                "Model and tokenizer downloaded and saved locally ({} files).",
                files.len()
            );
        }
    }

    Ok(())
}
