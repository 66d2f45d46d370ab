//! One-shot fetch of the model artifacts into the local model directory.

use std::path::{Path, PathBuf};

use hf_hub::api::tokio::{ApiBuilder, ApiRepo};
use hf_hub::{Repo, RepoType};
use tracing::{info, warn};

use crate::config::ModelConfig;
use crate::{Error, Result};

/// Files the server cannot start without.
pub const REQUIRED_FILES: &[&str] = &["config.json", "model.safetensors", "tokenizer.json"];

/// Files copied when the repository has them.
pub const OPTIONAL_FILES: &[&str] = &[
    "generation_config.json",
    "tokenizer_config.json",
    "vocab.json",
    "merges.txt",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    AlreadyPresent,
    Downloaded { files: Vec<PathBuf> },
}

/// Downloads `config.repo_id` into `config.directory` unless the directory
/// already exists. A failed download removes the directory so a rerun retries.
pub async fn ensure_model(config: &ModelConfig) -> Result<DownloadOutcome> {
    ensure_model_with(config, |config, dir| async move { fetch_into(&config, &dir).await }).await
}

/// [`ensure_model`] with the fetch step supplied by the caller. `fetch`
/// receives the model config and the freshly created directory.
pub async fn ensure_model_with<F, Fut>(config: &ModelConfig, fetch: F) -> Result<DownloadOutcome>
where
    F: FnOnce(ModelConfig, PathBuf) -> Fut,
    Fut: Future<Output = Result<Vec<PathBuf>>>,
{
    let dir = &config.directory;
    if dir.exists() {
        info!(directory = %dir.display(), "Model and tokenizer already exist locally");
        return Ok(DownloadOutcome::AlreadyPresent);
    }

    tokio::fs::create_dir_all(dir).await?;

    match fetch(config.clone(), dir.clone()).await {
        Ok(files) => {
            info!(
                directory = %dir.display(),
                files = files.len(),
                "Model and tokenizer downloaded and saved locally"
            );
            Ok(DownloadOutcome::Downloaded { files })
        }
        Err(e) => {
            if let Err(cleanup) = tokio::fs::remove_dir_all(dir).await {
                warn!(
                    "Failed to remove partial model directory {}: {}",
                    dir.display(),
                    cleanup
                );
            }
            Err(e)
        }
    }
}

async fn fetch_into(config: &ModelConfig, dir: &Path) -> Result<Vec<PathBuf>> {
    let api = ApiBuilder::new().with_progress(true).build()?;
    let repo = api.repo(Repo::with_revision(
        config.repo_id.clone(),
        RepoType::Model,
        config.revision.clone(),
    ));
    info!(repo = %config.repo_id, revision = %config.revision, "Downloading model");

    let mut files = Vec::new();
    for name in REQUIRED_FILES {
        let path = fetch_file(&repo, name, dir)
            .await
            .map_err(|e| Error::download(format!("{name}: {e}")))?;
        files.push(path);
    }
    for name in OPTIONAL_FILES {
        match fetch_file(&repo, name, dir).await {
            Ok(path) => files.push(path),
            Err(e) => warn!("Skipping optional file {}: {}", name, e),
        }
    }

    Ok(files)
}

async fn fetch_file(repo: &ApiRepo, name: &str, dir: &Path) -> Result<PathBuf> {
    let cached = repo.get(name).await?;
    let target = dir.join(name);
    tokio::fs::copy(&cached, &target).await?;
    Ok(target)
}
